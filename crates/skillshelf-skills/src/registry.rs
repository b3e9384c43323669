//! Skills registry for managing multiple skills
//!
//! Implements progressive disclosure architecture:
//! - Phase 1: Scan directories and load metadata only
//! - Phase 2: Load full skill content on demand
//! - Phase 3: Load referenced attachments on demand
//!
//! The registry is built once by [`RegistryBuilder`] and never mutated
//! afterwards. Section text is cached in write-once cells, so a registry can
//! be shared across threads behind an `Arc` without locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, SkillError};
use crate::section::SectionContent;
use crate::skill::Skill;

/// Collects skills directories, then scans them into a [`SkillsRegistry`]
#[derive(Debug, Default, Clone)]
pub struct RegistryBuilder {
    /// Skills directories to scan, in registration order
    directories: Vec<PathBuf>,
}

impl RegistryBuilder {
    /// Create a builder with no directories
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a skills directory to scan
    pub fn add_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directories.push(dir.into());
        self
    }

    /// Add several skills directories
    pub fn add_directories<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.directories.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Add personal skills directory: ~/.skillshelf/skills/
    pub fn with_personal_skills(self) -> Self {
        if let Some(home) = dirs::home_dir() {
            self.add_directory(home.join(".skillshelf").join("skills"))
        } else {
            warn!("Could not find home directory for personal skills");
            self
        }
    }

    /// Add project skills directory: ./.skillshelf/skills/
    pub fn with_project_skills(self) -> Self {
        self.add_directory(PathBuf::from(".skillshelf/skills"))
    }

    /// Directories registered so far
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Scan all configured directories and build the index (Phase 1: Discovery)
    ///
    /// Invalid skills are logged and left out. A slug found in two directories
    /// aborts the build with [`SkillError::DuplicateSlug`].
    pub fn build(self) -> Result<SkillsRegistry> {
        info!(
            "Starting skills discovery in {} directories",
            self.directories.len()
        );

        let mut skills = HashMap::new();
        let mut scanned: Vec<PathBuf> = Vec::new();

        for dir in &self.directories {
            // One directory may be spelled several ways (relative, absolute, `..`)
            let key = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.clone());
            if scanned.contains(&key) {
                debug!("Skills directory listed twice: {:?}", dir);
                continue;
            }
            scanned.push(key);

            if !dir.exists() {
                debug!("Skills directory does not exist: {:?}", dir);
                continue;
            }

            if !dir.is_dir() {
                warn!("Skills path is not a directory: {:?}", dir);
                continue;
            }

            scan_directory(dir, &mut skills)?;
        }

        info!("Discovered {} skills", skills.len());
        Ok(SkillsRegistry {
            skills,
            directories: self.directories,
        })
    }
}

/// Scan a single directory for skills
fn scan_directory(dir: &Path, skills: &mut HashMap<String, Skill>) -> Result<()> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            paths.push(path);
        }
    }
    // Stable order keeps duplicate reports deterministic
    paths.sort();

    for path in paths {
        match Skill::metadata_from_dir(&path) {
            Ok(Some(skill)) => {
                if let Some(existing) = skills.get(skill.slug()) {
                    return Err(SkillError::DuplicateSlug {
                        slug: skill.slug().to_string(),
                        first: existing.path().to_path_buf(),
                        second: path,
                    });
                }
                debug!(
                    "Discovered skill: {} at {:?} ({} attachments)",
                    skill.slug(),
                    path,
                    skill.attachments().count()
                );
                skills.insert(skill.slug().to_string(), skill);
            }
            Ok(None) => {
                debug!("Skipping {:?}: no SKILL.md", path);
            }
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
            }
        }
    }

    Ok(())
}

/// Skills registry holding every discovered skill
#[derive(Debug, Default)]
pub struct SkillsRegistry {
    /// All discovered skills keyed by slug
    skills: HashMap<String, Skill>,
    /// Directories the registry was built from
    directories: Vec<PathBuf>,
}

impl SkillsRegistry {
    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Get a skill by slug
    pub fn get(&self, slug: &str) -> Option<&Skill> {
        self.skills.get(slug)
    }

    /// Look up a skill, failing with `SkillNotFound`
    pub fn skill(&self, slug: &str) -> Result<&Skill> {
        self.skills
            .get(slug)
            .ok_or_else(|| SkillError::SkillNotFound {
                slug: slug.to_string(),
            })
    }

    /// Load a skill's body, or one of its attachments when `attachment` is set
    pub fn load(&self, slug: &str, attachment: Option<&str>) -> Result<SectionContent> {
        let skill = self.skill(slug)?;
        match attachment {
            None => skill.load_body(),
            Some(path) => skill.load_attachment(path),
        }
    }

    /// Load full SKILL.md content for a skill (Phase 2: Activation)
    pub fn load_body(&self, slug: &str) -> Result<SectionContent> {
        self.load(slug, None)
    }

    /// Load a discovered attachment (Phase 3: Execution)
    pub fn load_attachment(&self, slug: &str, path: &str) -> Result<SectionContent> {
        self.load(slug, Some(path))
    }

    /// All skills sorted by slug
    pub fn skills(&self) -> Vec<&Skill> {
        let mut sorted: Vec<_> = self.skills.values().collect();
        sorted.sort_by_key(|s| s.slug());
        sorted
    }

    /// Get all skill slugs, sorted
    pub fn slugs(&self) -> Vec<&str> {
        let mut slugs: Vec<_> = self.skills.keys().map(String::as_str).collect();
        slugs.sort_unstable();
        slugs
    }

    /// Directories the registry was built from
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Get number of skills
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Generate skills list for LLM system prompt
    /// Format:
    /// Available skills (use /{skill-name} to activate):
    /// - skill-name: Description of what this skill does and when to use it
    /// - another-skill: Another description...
    pub fn generate_system_prompt(&self) -> String {
        if self.skills.is_empty() {
            return String::new();
        }

        let mut prompt = String::from("\n\nAvailable skills (use /{skill-name} to activate):\n");

        for skill in self.skills() {
            prompt.push_str(&skill.to_summary());
            prompt.push('\n');
        }

        prompt
    }

    /// Generate a concise skills list for embedding in tool descriptions
    pub fn generate_skills_list(&self) -> String {
        if self.skills.is_empty() {
            return "No skills available".to_string();
        }

        self.skills()
            .iter()
            .map(|skill| format!("{}: {}", skill.slug(), skill.description()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
