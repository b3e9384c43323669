use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Example config, printed by `skillshelf config --example`
pub const EXAMPLE_CONFIG: &str = r#"
[skills]
directories = ["~/skills"]  # Or set SKILLSHELF_SKILLS_DIR
include_personal = false     # ~/.skillshelf/skills
include_project = false      # ./.skillshelf/skills

[logging]
level = "warn"     # trace, debug, info, warn, error
format = "pretty"  # or "json"
"#;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SkillsConfig {
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub include_personal: bool,
    #[serde(default)]
    pub include_project: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the global config path: ~/.skillshelf/skillshelf.toml
    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".skillshelf").join("skillshelf.toml"))
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.skillshelf/skillshelf.toml (optional)
    /// 2. Local override: ./skillshelf.toml (workspace, optional)
    /// 3. Explicit `--config` file (required when given)
    /// 4. Environment variables (highest priority)
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        let mut config_builder = config::Config::builder();

        // Layer 1: Global config
        if let Some(global) = Self::global_config_path() {
            config_builder = config_builder.add_source(config::File::from(global).required(false));
        }

        // Layer 2: Local workspace config
        config_builder =
            config_builder.add_source(config::File::with_name("skillshelf").required(false));

        // Layer 3: Explicit file from the command line
        if let Some(path) = explicit {
            config_builder = config_builder.add_source(config::File::from(path).required(true));
        }

        // Layer 4: Environment variables with SKILLSHELF__ prefix
        config_builder = config_builder.add_source(
            config::Environment::with_prefix("SKILLSHELF")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("skills.directories")
                .try_parsing(true),
        );

        // Layer 5: Convenience env var overrides (highest priority)
        if let Ok(dir) = env::var("SKILLSHELF_SKILLS_DIR") {
            config_builder = config_builder.set_override("skills.directories", vec![dir])?;
        }

        if let Ok(level) = env::var("SKILLSHELF_LOG_LEVEL") {
            config_builder = config_builder.set_override("logging.level", level)?;
        }

        let config: Self = config_builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Configured skills directories with `~` expanded
    pub fn skill_directories(&self) -> Vec<PathBuf> {
        self.skills
            .directories
            .iter()
            .map(|dir| expand_tilde(dir))
            .collect()
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(dir: &str) -> PathBuf {
    if dir == "~" || dir.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(dir.trim_start_matches('~').trim_start_matches('/'));
        }
    }
    PathBuf::from(dir)
}
