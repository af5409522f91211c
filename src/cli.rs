// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use shahquery::session::StalePolicy;

/// shahquery - search typeahead and results client
///
/// Talks to a search backend exposing /suggest, /search and /document.
#[derive(Parser, Debug)]
#[command(name = "shahquery")]
#[command(
    author,
    version,
    about,
    long_about = None,
    after_help = "Quickstart:\n  shahquery suggest \"mach\"\n  shahquery search \"machine learning\"\n  shahquery open doc-42\n\nHeadless host:\n  shahquery drive < events.jsonl"
)]
pub struct Cli {
    /// Search backend base URL (default http://127.0.0.1:8000)
    #[arg(long, global = true, value_name = "URL")]
    pub backend: Option<String>,

    /// Per-request timeout in milliseconds (0 waits indefinitely)
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Output format (text or json)
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Debug-level logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only errors on stderr
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Handling of suggestion responses for superseded queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StaleArg {
    /// Drop them
    Discard,
    /// Apply them in arrival order
    Apply,
}

impl From<StaleArg> for StalePolicy {
    fn from(arg: StaleArg) -> Self {
        match arg {
            StaleArg::Discard => StalePolicy::Discard,
            StaleArg::Apply => StalePolicy::Apply,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch suggestions for a partial query
    Suggest {
        /// Partial query text
        query: String,
    },

    /// Run a search and print scored results with snippets
    #[command(visible_alias = "s")]
    Search {
        /// Query text
        query: String,
    },

    /// Show the full content of one document
    Open {
        /// Document identifier from a search result
        doc_id: String,
    },

    /// Headless session driven by JSON lines on stdin
    Drive {
        /// Quiet period before suggestions are fetched
        #[arg(long, value_name = "MS")]
        debounce_ms: Option<u64>,

        /// What to do with suggestion responses for superseded queries
        #[arg(long, value_enum)]
        stale: Option<StaleArg>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
