///
/// This module implements the CLI interface for wiki-sync: command parsing,
/// argument validation and the async entrypoint used by `main` and the tests.
///
/// All reconciliation logic lives in the [`wiki-sync-core`] crate. This module
/// only loads credentials and settings, builds the [`HttpGateway`] and hands
/// over to [`synchronise`] or [`prune`].
///
/// ## How To Use
/// - From the shell: `wiki-sync sync '<json>'` or `wiki-sync sync --content-file docs.json`.
/// - Programmatically: call [`run`] with a constructed [`Cli`].
///
/// [`wiki-sync-core`]: ../../wiki_sync_core/
use crate::gateway::HttpGateway;
use crate::load_config::{load_content, load_credentials, load_sync_config};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wiki_sync_core::path::ingest;
use wiki_sync_core::synchronise::{prune, synchronise};

/// CLI for wiki-sync: push generated developer documentation into the wiki.
#[derive(Parser)]
#[clap(
    name = "wiki-sync",
    version,
    about = "Synchronise generated developer documentation into the wiki category tree"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace all articles below the docs root with the given pages
    Sync {
        /// Path to the JSON credentials file ({"token": …, "url": …})
        #[clap(long)]
        credentials: Option<PathBuf>,
        /// Path to an optional YAML file overriding sync settings
        #[clap(long)]
        config: Option<PathBuf>,
        /// JSON mapping of file path to {metadata, content}
        #[clap(conflicts_with = "content_file")]
        content: Option<String>,
        /// Read the JSON mapping from a file instead
        #[clap(long)]
        content_file: Option<PathBuf>,
    },
    /// Delete every article and category below a category
    Prune {
        #[clap(long)]
        credentials: Option<PathBuf>,
        #[clap(long)]
        config: Option<PathBuf>,
        /// Category whose descendants are removed; defaults to the docs root
        #[clap(long)]
        root: Option<i64>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync {
            credentials,
            config,
            content,
            content_file,
        } => {
            let config = load_sync_config(config.as_deref())?;
            config.trace_loaded();
            let input = load_content(content.as_deref(), content_file.as_deref())?;
            let entries = ingest(&input, &config.category_marker)?;
            let gateway = HttpGateway::new(&load_credentials(credentials.as_deref())?);

            tracing::info!(command = "sync", files = entries.len(), "Starting synchronisation process");
            match synchronise(&gateway, &config, &entries).await {
                Ok(report) => {
                    tracing::info!(
                        command = "sync",
                        deleted = report.deleted_articles.len(),
                        articles = report.articles.len(),
                        categories_created = report.created_categories,
                        category_pages = report.category_pages.len(),
                        skipped = report.skipped.len(),
                        "Synchronisation complete"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    Err(e.into())
                }
            }
        }
        Commands::Prune {
            credentials,
            config,
            root,
        } => {
            let config = load_sync_config(config.as_deref())?;
            config.trace_loaded();
            let root = root.unwrap_or(config.root_category_id);
            let gateway = HttpGateway::new(&load_credentials(credentials.as_deref())?);

            tracing::info!(command = "prune", root, "Starting prune");
            match prune(&gateway, &config, root).await {
                Ok(report) => {
                    tracing::info!(
                        command = "prune",
                        articles = report.deleted_articles.len(),
                        categories = report.deleted_categories.len(),
                        "Prune complete"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "prune", error = %e, "Prune failed");
                    Err(e.into())
                }
            }
        }
    }
}
