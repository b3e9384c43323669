//! Error types for skill discovery and loading

use std::path::PathBuf;
use thiserror::Error;

/// Skills registry errors
#[derive(Debug, Error)]
pub enum SkillError {
    /// SKILL.md header is missing, malformed, or lacks required fields.
    ///
    /// Raised per skill during discovery; the skill is left out of the index.
    #[error("Invalid skill at {path:?}: {reason}")]
    Invalid {
        /// Path of the offending SKILL.md
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The same slug was discovered under two skills directories
    #[error("Duplicate skill '{slug}' found at {first:?} and {second:?}")]
    DuplicateSlug {
        /// Conflicting slug
        slug: String,
        /// Directory registered first
        first: PathBuf,
        /// Directory that collided with it
        second: PathBuf,
    },

    /// No skill with this slug is indexed
    #[error("Skill '{slug}' not found")]
    SkillNotFound {
        /// Requested slug
        slug: String,
    },

    /// The attachment path was not discovered when the skill was indexed
    #[error("Attachment '{path}' not found in skill '{slug}'")]
    AttachmentNotFound {
        /// Skill slug
        slug: String,
        /// Requested relative path
        path: String,
    },

    /// An indexed file could not be read
    #[error("Failed to read {path:?}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O error while scanning a skills directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SkillError {
    /// True for both flavours of lookup miss (unknown slug or attachment)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SkillError::SkillNotFound { .. } | SkillError::AttachmentNotFound { .. }
        )
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, SkillError>;
