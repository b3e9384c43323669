//! Skill definition and parsing
//!
//! Each skill is a folder containing SKILL.md with YAML frontmatter. Every
//! other file in the folder is an attachment (references, rules, metadata.json).

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::{Result, SkillError};
use crate::section::{Section, SectionContent, SectionKind};

/// File name of the body document
pub const SKILL_FILE: &str = "SKILL.md";
/// Optional sidecar carrying version/author
pub const METADATA_FILE: &str = "metadata.json";

/// Maximum allowed name length (agent-skills header convention)
const MAX_NAME_LENGTH: usize = 64;
/// Maximum allowed description length (agent-skills header convention)
const MAX_DESCRIPTION_LENGTH: usize = 1024;
/// Frontmatter longer than this is treated as unterminated
const MAX_HEADER_LINES: usize = 512;
/// Attachment walk stops descending below this depth
const MAX_ATTACHMENT_DEPTH: usize = 8;

#[allow(clippy::expect_used)]
static FRONTMATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\x{FEFF}?---[ \t]*\r?\n[\s\S]*?\r?\n---[ \t]*(?:\r?\n|$)")
        .expect("valid frontmatter regex")
});

#[allow(clippy::expect_used)]
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid skill name regex"));

/// Skill metadata extracted from YAML frontmatter
#[derive(Debug, Clone, Deserialize)]
pub struct SkillMetadata {
    /// Skill name (lowercase letters/numbers/hyphens by convention)
    #[serde(default)]
    pub name: String,
    /// Skill description (describes WHAT and WHEN)
    #[serde(default)]
    pub description: String,
    /// License tag
    #[serde(default, deserialize_with = "loose_string")]
    pub license: Option<String>,
    /// Top-level version, used by some authors instead of `metadata.version`
    #[serde(default, deserialize_with = "loose_string")]
    pub version: Option<String>,
    /// Nested `metadata:` block
    #[serde(default)]
    pub metadata: Option<HeaderExtras>,
}

/// Free-form `metadata:` block of the frontmatter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderExtras {
    /// Author or maintaining team
    #[serde(default, deserialize_with = "loose_string")]
    pub author: Option<String>,
    /// Version string
    #[serde(default, deserialize_with = "loose_string")]
    pub version: Option<String>,
}

/// Contents of `metadata.json`; unknown fields are ignored
#[derive(Debug, Default, Deserialize)]
struct Sidecar {
    #[serde(default)]
    version: Option<serde_json::Value>,
    #[serde(default)]
    author: Option<serde_json::Value>,
}

/// Accept strings, numbers and booleans for free-form fields like `version: 1.0`
fn loose_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn json_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Object(map) => map
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    }
}

/// An indexed skill: header metadata plus its (not yet loaded) sections
#[derive(Debug)]
pub struct Skill {
    slug: String,
    metadata: SkillMetadata,
    version: Option<String>,
    author: Option<String>,
    /// Full path to skill directory
    path: PathBuf,
    body: Section,
    /// Attachments keyed by `/`-separated path relative to `path`
    attachments: BTreeMap<String, Section>,
}

impl Skill {
    /// Index a skill directory (Phase 1: Discovery)
    ///
    /// Reads only the frontmatter of SKILL.md and walks the directory for
    /// attachments. Returns `Ok(None)` when the directory has no SKILL.md.
    pub fn metadata_from_dir(dir: &Path) -> Result<Option<Self>> {
        let skill_file = dir.join(SKILL_FILE);

        if !skill_file.is_file() {
            return Ok(None);
        }

        let slug = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SkillError::Invalid {
                path: skill_file.clone(),
                reason: "directory name is not valid UTF-8".into(),
            })?
            .to_string();

        let header = read_frontmatter(&skill_file)?;
        let metadata = parse_metadata(&header).map_err(|reason| SkillError::Invalid {
            path: skill_file.clone(),
            reason,
        })?;

        validate_metadata(&slug, &metadata).map_err(|reason| SkillError::Invalid {
            path: skill_file.clone(),
            reason,
        })?;

        let attachments: BTreeMap<String, Section> = discover_attachments(dir)?
            .into_iter()
            .map(|rel| {
                let section = Section::new(rel.clone(), dir.join(&rel), SectionKind::Attachment);
                (rel, section)
            })
            .collect();

        let sidecar = if attachments.contains_key(METADATA_FILE) {
            read_sidecar(&dir.join(METADATA_FILE))
        } else {
            Sidecar::default()
        };

        let extras = metadata.metadata.clone().unwrap_or_default();
        let version = extras
            .version
            .or_else(|| metadata.version.clone())
            .or_else(|| sidecar.version.and_then(json_to_string));
        let author = extras
            .author
            .or_else(|| sidecar.author.and_then(json_to_string));

        Ok(Some(Self {
            slug,
            metadata,
            version,
            author,
            body: Section::new(SKILL_FILE, skill_file, SectionKind::Body),
            path: dir.to_path_buf(),
            attachments,
        }))
    }

    /// Directory name; unique within a registry
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Declared name from the header
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Get the skill description
    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    /// License tag, if declared
    pub fn license(&self) -> Option<&str> {
        self.metadata.license.as_deref()
    }

    /// Version from the header, or from metadata.json
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Author from the header, or from metadata.json
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Skill directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The SKILL.md section
    pub fn body(&self) -> &Section {
        &self.body
    }

    /// Attachment paths in sorted order
    pub fn attachment_paths(&self) -> impl Iterator<Item = &str> {
        self.attachments.keys().map(String::as_str)
    }

    /// Attachment sections in path order
    pub fn attachments(&self) -> impl Iterator<Item = &Section> {
        self.attachments.values()
    }

    /// Look up a discovered attachment
    pub fn attachment(&self, relative_path: &str) -> Option<&Section> {
        self.attachments.get(&normalize_relative_path(relative_path))
    }

    /// Load the full SKILL.md (Phase 2: Activation)
    pub fn load_body(&self) -> Result<SectionContent> {
        self.body.read()
    }

    /// Load an attachment that was discovered at index time (Phase 3)
    pub fn load_attachment(&self, relative_path: &str) -> Result<SectionContent> {
        self.attachment(relative_path)
            .ok_or_else(|| SkillError::AttachmentNotFound {
                slug: self.slug.clone(),
                path: relative_path.to_string(),
            })?
            .read()
    }

    /// Generate a concise summary for LLM system prompt
    /// Format: "- {slug}: {description}"
    pub fn to_summary(&self) -> String {
        format!("- {}: {}", self.slug, self.metadata.description)
    }
}

/// Canonical form used for attachment keys: `/` separators, no leading `./`
pub fn normalize_relative_path(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    normalized
}

/// Strip the frontmatter block from a SKILL.md, returning the instructions
pub fn strip_frontmatter(content: &str) -> &str {
    match FRONTMATTER_RE.find(content) {
        Some(m) => &content[m.end()..],
        None => content,
    }
}

/// Read only the lines between the opening and closing `---`
fn read_frontmatter(skill_file: &Path) -> Result<String> {
    let invalid = |reason: &str| SkillError::Invalid {
        path: skill_file.to_path_buf(),
        reason: reason.to_string(),
    };
    let read_err = |source: std::io::Error| SkillError::Read {
        path: skill_file.to_path_buf(),
        source,
    };

    let file = File::open(skill_file).map_err(read_err)?;
    let mut lines = BufReader::new(file).lines();

    let first = lines
        .next()
        .transpose()
        .map_err(read_err)?
        .ok_or_else(|| invalid("file is empty"))?;
    if first.trim_start_matches('\u{feff}').trim_end() != "---" {
        return Err(invalid("No valid YAML frontmatter found"));
    }

    let mut header = String::new();
    for line in lines.take(MAX_HEADER_LINES) {
        let line = line.map_err(read_err)?;
        if line.trim_end() == "---" {
            return Ok(header);
        }
        header.push_str(&line);
        header.push('\n');
    }

    Err(invalid("YAML frontmatter is not terminated"))
}

fn parse_metadata(yaml: &str) -> std::result::Result<SkillMetadata, String> {
    serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse YAML frontmatter: {e}"))
}

fn read_sidecar(path: &Path) -> Sidecar {
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Sidecar>(&raw).map_err(|e| e.to_string()));

    match parsed {
        Ok(sidecar) => sidecar,
        Err(e) => {
            warn!("Ignoring unreadable {:?}: {}", path, e);
            Sidecar::default()
        }
    }
}

/// Validate skill metadata.
///
/// Missing name or description rejects the skill; convention breaches only warn.
fn validate_metadata(slug: &str, metadata: &SkillMetadata) -> std::result::Result<(), String> {
    if metadata.name.trim().is_empty() {
        return Err("Skill name cannot be empty".into());
    }

    if metadata.description.trim().is_empty() {
        return Err("Skill description cannot be empty".into());
    }

    if metadata.name.len() > MAX_NAME_LENGTH {
        warn!(
            "Skill name '{}' exceeds {} characters (was {})",
            metadata.name,
            MAX_NAME_LENGTH,
            metadata.name.len()
        );
    }

    if !NAME_RE.is_match(&metadata.name) {
        warn!(
            "Skill name '{}' should contain only lowercase letters, numbers, and hyphens",
            metadata.name
        );
    }

    if metadata.name != slug {
        debug!(
            "Skill name '{}' differs from its directory '{}'; the directory wins",
            metadata.name, slug
        );
    }

    if metadata.description.len() > MAX_DESCRIPTION_LENGTH {
        warn!(
            "Skill '{}' description exceeds {} characters (was {})",
            metadata.name,
            MAX_DESCRIPTION_LENGTH,
            metadata.description.len()
        );
    }

    Ok(())
}

/// Walk the skill directory and collect every attachment path.
///
/// Skips the root SKILL.md, hidden entries and symlinks.
fn discover_attachments(dir: &Path) -> Result<Vec<String>> {
    let mut found = Vec::new();
    walk(dir, "", 0, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, prefix: &str, depth: usize, found: &mut Vec<String>) -> Result<()> {
    if depth > MAX_ATTACHMENT_DEPTH {
        debug!("Not descending past {:?}", dir);
        return Ok(());
    }

    let entries = fs::read_dir(dir).map_err(|source| SkillError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry?;
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            debug!("Skipping non UTF-8 entry {:?}", entry.path());
            continue;
        };

        if file_name.starts_with('.') {
            continue;
        }

        let relative = if prefix.is_empty() {
            file_name
        } else {
            format!("{prefix}/{file_name}")
        };

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&entry.path(), &relative, depth + 1, found)?;
        } else if file_type.is_file() {
            if depth == 0 && relative == SKILL_FILE {
                continue;
            }
            found.push(relative);
        }
    }

    Ok(())
}
