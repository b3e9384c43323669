//! Sections: the individual documents inside a skill
//!
//! A section knows where its file lives but does not touch the disk until its
//! content is first requested. The text is then kept for the lifetime of the
//! registry.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::{Result, SkillError};

/// Role of a section within its skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// The skill's SKILL.md
    Body,
    /// Any other file under the skill directory (references, rules, sidecars)
    Attachment,
}

/// A single document of a skill with lazily cached content
#[derive(Debug)]
pub struct Section {
    relative_path: String,
    path: PathBuf,
    kind: SectionKind,
    content: OnceLock<Arc<str>>,
}

impl Section {
    pub(crate) fn new(relative_path: impl Into<String>, path: PathBuf, kind: SectionKind) -> Self {
        Self {
            relative_path: relative_path.into(),
            path,
            kind,
            content: OnceLock::new(),
        }
    }

    /// Path relative to the skill directory, always `/`-separated
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Absolute (or root-relative) path on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Body or attachment
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    /// Whether the content has already been read
    pub fn is_loaded(&self) -> bool {
        self.content.get().is_some()
    }

    /// Read the section, serving later calls from the cache.
    ///
    /// Failed reads are not cached.
    pub fn read(&self) -> Result<SectionContent> {
        if let Some(text) = self.content.get() {
            return Ok(self.content_of(Arc::clone(text)));
        }

        let text: Arc<str> = fs::read_to_string(&self.path)
            .map_err(|source| SkillError::Read {
                path: self.path.clone(),
                source,
            })?
            .into();
        debug!("Loaded {:?} ({} bytes)", self.path, text.len());

        // A concurrent reader may have won the race; keep whichever landed first.
        let cached = self.content.get_or_init(|| text);
        Ok(self.content_of(Arc::clone(cached)))
    }

    fn content_of(&self, text: Arc<str>) -> SectionContent {
        SectionContent {
            kind: self.kind,
            relative_path: self.relative_path.clone(),
            text,
        }
    }
}

/// Loaded text of a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionContent {
    /// Body or attachment
    pub kind: SectionKind,
    /// Path relative to the skill directory
    pub relative_path: String,
    /// Raw file content
    pub text: Arc<str>,
}

impl SectionContent {
    /// Borrow the text
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("note.md");
        fs::write(&file, "# Note\n").unwrap();

        let section = Section::new("note.md", file.clone(), SectionKind::Attachment);
        assert!(!section.is_loaded());

        let first = section.read().unwrap();
        assert!(section.is_loaded());
        assert_eq!(first.as_str(), "# Note\n");
        assert_eq!(first.kind, SectionKind::Attachment);

        // Cached content survives the file disappearing
        fs::remove_file(&file).unwrap();
        let second = section.read().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_read_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let section = Section::new(
            "SKILL.md",
            dir.path().join("SKILL.md"),
            SectionKind::Body,
        );

        let err = section.read().unwrap_err();
        assert!(matches!(err, SkillError::Read { .. }));
        assert!(!section.is_loaded());
    }
}
