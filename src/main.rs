//! shahquery - search typeahead and results client
//!
//! Suggestions while typing, scored results with highlighted snippets, and
//! full documents, all served by a remote search backend.

mod cli;
mod commands;
mod driver;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::debug;

use cli::{Cli, Commands, OutputFormat};
use commands::Output;
use shahquery::config::{Config, ConfigOutputFormat};
use shahquery::logging::{self, Verbosity};
use shahquery::HttpBackend;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet), cli.no_color);

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "shahquery", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load();
    let format = cli.format.unwrap_or(match config.output_format() {
        Some(ConfigOutputFormat::Json) => OutputFormat::Json,
        _ => OutputFormat::Text,
    });
    let use_color = !cli.no_color && format == OutputFormat::Text && std::io::stdout().is_terminal();
    if !use_color {
        colored::control::set_override(false);
    }

    let base_url = config.merge_backend_url(cli.backend.as_deref());
    let backend = HttpBackend::new(&base_url, config.merge_timeout(cli.timeout_ms))
        .with_context(|| format!("invalid backend URL '{}'", base_url))?;
    let out = Output {
        format,
        compact: cli.compact,
        use_color,
        backend_url: backend.base_url(),
    };
    debug!(backend = backend.base_url(), ?format, "starting");

    match cli.command {
        Commands::Suggest { query } => {
            let settings = config.session_settings(None, None);
            commands::suggest(&backend, settings, &query, out).await?;
        }
        Commands::Search { query } => {
            commands::search(&backend, &query, out).await?;
        }
        Commands::Open { doc_id } => {
            commands::open(&backend, &doc_id, out).await?;
        }
        Commands::Drive { debounce_ms, stale } => {
            let settings = config.session_settings(debounce_ms, stale.map(Into::into));
            let backend = Arc::new(backend.clone());
            driver::run(backend, settings).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
