use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Browse a corpus of Markdown skills the way an agent would: index first,
/// bodies and attachments on demand.
#[derive(Debug, Parser)]
#[command(name = "skillshelf", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a skillshelf.toml config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Skills directory to scan (repeatable; replaces configured directories)
    #[arg(short, long = "root", global = true, value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List indexed skills with their descriptions
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a skill's metadata and attachments
    Show {
        /// Skill slug (directory name)
        slug: String,
    },
    /// Print a skill's SKILL.md, or one of its attachments
    Read {
        /// Skill slug (directory name)
        slug: String,
        /// Attachment path relative to the skill directory
        path: Option<String>,
        /// Drop the YAML frontmatter from SKILL.md
        #[arg(long)]
        no_frontmatter: bool,
    },
    /// Print the skills index as a system prompt block
    Prompt {
        /// Single comma-separated line instead of one skill per line
        #[arg(long)]
        compact: bool,
    },
    /// Read every indexed document and report failures
    Check,
    /// Show the effective configuration
    Config {
        /// Print an example config file instead
        #[arg(long)]
        example: bool,
    },
}
