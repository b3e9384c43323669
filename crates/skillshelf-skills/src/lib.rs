//! `Skillshelf` Skills System
//!
//! Read-only registry over a corpus of Markdown skills, implementing the
//! progressive disclosure pattern used by AI coding agents.
//!
//! ## Features
//!
//! - Progressive disclosure: load skill metadata at startup, full content on demand
//! - YAML frontmatter support for skill metadata (name, description, license, version)
//! - Multiple skills directories (personal, project, explicit roots)
//! - Attachments (references, rules, metadata.json) discovered at index time;
//!   only discovered paths can ever be read
//! - Immutable after construction, safe to share across threads
//!
//! ## Architecture
//!
//! Phase 1 (Discovery): At startup, load only the frontmatter of each SKILL.md
//! Phase 2 (Activation): When a task matches, load the full SKILL.md content
//! Phase 3 (Execution): Load referenced attachments as needed
//!
//! ```no_run
//! use skillshelf_skills::SkillsRegistry;
//!
//! # fn main() -> skillshelf_skills::Result<()> {
//! let registry = SkillsRegistry::builder().add_directory("skills").build()?;
//! let body = registry.load_body("ai-coding-principles")?;
//! let rule = registry.load_attachment("ai-coding-principles", "rules/error-never-swallow.md")?;
//! println!("{}\n{}", body.as_str(), rule.as_str());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod error;
pub mod registry;
pub mod section;
pub mod skill;

pub use error::{Result, SkillError};
pub use registry::{RegistryBuilder, SkillsRegistry};
pub use section::{Section, SectionContent, SectionKind};
pub use skill::Skill;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        RegistryBuilder, SectionContent, SectionKind, Skill, SkillError, SkillsRegistry,
    };
}
