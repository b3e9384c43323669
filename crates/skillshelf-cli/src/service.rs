use crate::cli::Commands;
use crate::config::{Config, EXAMPLE_CONFIG};
use anyhow::{Context, Result};
use serde::Serialize;
use skillshelf_logging::LogFormat;
use skillshelf_skills::skill::strip_frontmatter;
use skillshelf_skills::{Skill, SkillError, SkillsRegistry};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Index entry printed by `list --json`
#[derive(Debug, Serialize)]
pub struct SkillSummary {
    pub slug: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub path: PathBuf,
    pub attachments: Vec<String>,
}

impl From<&Skill> for SkillSummary {
    fn from(skill: &Skill) -> Self {
        Self {
            slug: skill.slug().to_string(),
            name: skill.name().to_string(),
            description: skill.description().to_string(),
            license: skill.license().map(str::to_string),
            version: skill.version().map(str::to_string),
            author: skill.author().map(str::to_string),
            path: skill.path().to_path_buf(),
            attachments: skill.attachment_paths().map(str::to_string).collect(),
        }
    }
}

/// A document that could not be read during `check`
#[derive(Debug)]
pub struct CheckFailure {
    pub slug: String,
    pub section: String,
    pub error: SkillError,
}

/// Front end over a skills registry
pub struct ShelfService {
    config: Config,
    directories: Vec<PathBuf>,
}

impl ShelfService {
    /// Create a service; explicit roots replace the configured directories
    pub fn new(config: Config, roots: Vec<PathBuf>) -> Self {
        let directories = if roots.is_empty() {
            config.skill_directories()
        } else {
            roots
        };
        Self {
            config,
            directories,
        }
    }

    /// Initialize logging from config
    pub fn init_logging(&self) -> Result<()> {
        skillshelf_logging::init_logging(
            &self.config.logging.level,
            LogFormat::from_name(&self.config.logging.format),
        )
    }

    /// Scan the configured directories (Phase 1: Discovery)
    pub fn build_registry(&self) -> Result<SkillsRegistry> {
        let mut builder = SkillsRegistry::builder().add_directories(self.directories.clone());

        if self.config.skills.include_project {
            builder = builder.with_project_skills();
        }
        if self.config.skills.include_personal {
            builder = builder.with_personal_skills();
        }

        if builder.directories().is_empty() {
            anyhow::bail!(
                "No skills directories configured; pass --root DIR or set SKILLSHELF_SKILLS_DIR"
            );
        }

        let registry = builder.build().context("Failed to build skills registry")?;
        info!(
            "Registry ready: {} skills from {} directories",
            registry.len(),
            registry.directories().len()
        );
        Ok(registry)
    }

    /// Run one command
    pub async fn run(self, command: Commands) -> Result<ExitCode> {
        match command {
            Commands::List { json } => list(&self.build_registry()?, json)?,
            Commands::Show { slug } => show(&self.build_registry()?, &slug)?,
            Commands::Read {
                slug,
                path,
                no_frontmatter,
            } => {
                let registry = self.build_registry()?;
                let content = registry
                    .load(&slug, path.as_deref())
                    .with_context(|| format!("Failed to load '{slug}'"))?;
                if no_frontmatter && path.is_none() {
                    print!("{}", strip_frontmatter(content.as_str()));
                } else {
                    print!("{}", content.as_str());
                }
            }
            Commands::Prompt { compact } => {
                let registry = self.build_registry()?;
                if compact {
                    println!("{}", registry.generate_skills_list());
                } else {
                    print!("{}", registry.generate_system_prompt().trim_start());
                }
            }
            Commands::Check => {
                let registry = self.build_registry()?;
                let total = registry
                    .skills()
                    .iter()
                    .map(|s| 1 + s.attachments().count())
                    .sum::<usize>();
                let failures = check_all(Arc::new(registry)).await;
                for failure in &failures {
                    println!(
                        "FAIL {}/{}: {}",
                        failure.slug, failure.section, failure.error
                    );
                }
                println!("{} documents checked, {} failed", total, failures.len());
                if !failures.is_empty() {
                    return Ok(ExitCode::FAILURE);
                }
            }
            Commands::Config { example } => self.print_config(example),
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_config(&self, example: bool) {
        if example {
            println!("{}", EXAMPLE_CONFIG.trim());
            return;
        }

        println!("skills directories:");
        for dir in &self.directories {
            println!("  {}", dir.display());
        }
        println!("include personal: {}", self.config.skills.include_personal);
        println!("include project: {}", self.config.skills.include_project);
        println!("log level: {}", self.config.logging.level);
        println!("log format: {}", self.config.logging.format);
    }
}

fn list(registry: &SkillsRegistry, json: bool) -> Result<()> {
    if json {
        let summaries: Vec<SkillSummary> = registry.skills().into_iter().map(Into::into).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No skills found");
        return Ok(());
    }

    for skill in registry.skills() {
        let version = skill
            .version()
            .map(|v| format!(" v{v}"))
            .unwrap_or_default();
        println!("{}{}", skill.slug(), version);
        println!("    {}", skill.description());
    }
    Ok(())
}

fn show(registry: &SkillsRegistry, slug: &str) -> Result<()> {
    let skill = registry.skill(slug)?;

    println!("{}", skill.slug());
    println!("  Name: {}", skill.name());
    println!("  Description: {}", skill.description());
    if let Some(license) = skill.license() {
        println!("  License: {license}");
    }
    if let Some(version) = skill.version() {
        println!("  Version: {version}");
    }
    if let Some(author) = skill.author() {
        println!("  Author: {author}");
    }
    println!("  Path: {}", skill.path().display());

    let attachments: Vec<_> = skill.attachment_paths().collect();
    if attachments.is_empty() {
        println!("  Attachments: none");
    } else {
        println!("  Attachments:");
        for path in attachments {
            println!("    {path}");
        }
    }
    Ok(())
}

/// Read every section of every skill concurrently, collecting failures
pub async fn check_all(registry: Arc<SkillsRegistry>) -> Vec<CheckFailure> {
    let mut tasks = JoinSet::new();

    for slug in registry.slugs() {
        let slug = slug.to_string();
        let registry = Arc::clone(&registry);

        tasks.spawn_blocking(move || {
            let mut failures = Vec::new();
            let Some(skill) = registry.get(&slug) else {
                return failures;
            };

            if let Err(error) = skill.load_body() {
                failures.push(CheckFailure {
                    slug: slug.clone(),
                    section: skill.body().relative_path().to_string(),
                    error,
                });
            }
            for section in skill.attachments() {
                if let Err(error) = section.read() {
                    failures.push(CheckFailure {
                        slug: slug.clone(),
                        section: section.relative_path().to_string(),
                        error,
                    });
                }
            }
            failures
        });
    }

    let mut failures = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(batch) => failures.extend(batch),
            Err(e) => error!("Check task failed: {}", e),
        }
    }

    failures.sort_by(|a, b| (&a.slug, &a.section).cmp(&(&b.slug, &b.section)));
    failures
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn corpus() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        write(
            root.path(),
            "ai-coding-principles/SKILL.md",
            "---\nname: ai-coding-principles\ndescription: Principles\nlicense: MIT\n---\n# Body\n",
        );
        write(
            root.path(),
            "ai-coding-principles/rules/error-never-swallow.md",
            "# Rule\n",
        );
        write(
            root.path(),
            "ai-coding-principles/metadata.json",
            r#"{"version": "1.2.0", "author": "docs-team"}"#,
        );
        root
    }

    #[test]
    fn test_roots_replace_configured_directories() {
        let config: Config = toml::from_str("[skills]\ndirectories = [\"configured\"]\n").unwrap();

        let service = ShelfService::new(config.clone(), Vec::new());
        assert_eq!(service.directories, vec![PathBuf::from("configured")]);

        let service = ShelfService::new(config, vec![PathBuf::from("explicit")]);
        assert_eq!(service.directories, vec![PathBuf::from("explicit")]);
    }

    #[test]
    fn test_no_directories_is_error() {
        let service = ShelfService::new(Config::default(), Vec::new());
        assert!(service.build_registry().is_err());
    }

    #[test]
    fn test_summary_from_skill() {
        let root = corpus();
        let service = ShelfService::new(Config::default(), vec![root.path().to_path_buf()]);
        let registry = service.build_registry().unwrap();

        let summary = SkillSummary::from(registry.get("ai-coding-principles").unwrap());
        assert_eq!(summary.license.as_deref(), Some("MIT"));
        assert_eq!(summary.version.as_deref(), Some("1.2.0"));
        assert_eq!(summary.author.as_deref(), Some("docs-team"));
        assert_eq!(
            summary.attachments,
            vec!["metadata.json", "rules/error-never-swallow.md"]
        );

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["slug"], "ai-coding-principles");
        assert_eq!(json["attachments"][1], "rules/error-never-swallow.md");
    }

    #[tokio::test]
    async fn test_check_all_passes_on_clean_corpus() {
        let root = corpus();
        let registry = SkillsRegistry::builder()
            .add_directory(root.path())
            .build()
            .unwrap();

        let failures = check_all(Arc::new(registry)).await;
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_check_all_reports_missing_files() {
        let root = corpus();
        let registry = SkillsRegistry::builder()
            .add_directory(root.path())
            .build()
            .unwrap();

        fs::remove_file(root.path().join("ai-coding-principles/rules/error-never-swallow.md"))
            .unwrap();

        let failures = check_all(Arc::new(registry)).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].slug, "ai-coding-principles");
        assert_eq!(failures[0].section, "rules/error-never-swallow.md");
        assert!(matches!(failures[0].error, SkillError::Read { .. }));
    }
}
