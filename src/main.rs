//! CLI entry point for the knowledge base.
//!
//! Provides commands for building the index, searching it, answering
//! questions from it and refreshing it with newly fetched articles.

use anyhow::{Context, Result};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use knowbase::display::{THEME, create_hits_table, create_stats_table, with_spinner};
use knowbase::retrieval::{JsonFileSource, RetrievalCoordinator, is_empty_context};
use knowbase::vector::{EmbeddingProvider, create_provider};
use knowbase::{Settings, logging};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Question answering over local documents and fetched articles
#[derive(Parser)]
#[command(
    name = "knowbase",
    version = env!("CARGO_PKG_VERSION"),
    about = "Retrieval-augmented knowledge base",
    long_about = "Index documents and articles, search them semantically and answer questions from them.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show progress logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Set up .knowbase directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Build the index from the configured sources
    Index {
        /// Rebuild even if a saved index exists
        #[arg(short, long)]
        force: bool,
    },

    /// Rank indexed chunks against a query
    #[command(after_help = "Examples:\n  knowbase search \"drag reduction system\"\n  knowbase search \"tyre compounds\" --limit 5 --json")]
    Search {
        query: String,

        /// Number of hits (defaults to retrieval.top_k)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print hits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a question from the knowledge base
    Ask {
        question: String,

        /// Also print the retrieved context
        #[arg(long)]
        show_context: bool,
    },

    /// Store new articles from an inbox file and rebuild the index
    Refresh {
        /// JSON array of articles (defaults to paths.inbox)
        #[arg(short, long)]
        inbox: Option<PathBuf>,

        /// Leave the inbox file in place after a successful refresh
        #[arg(long)]
        keep: bool,
    },

    /// Show index and document statistics
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let settings = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {}",
                config_path.display(),
                e
            );
            std::process::exit(1);
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };

    logging::init(&settings.logging, cli.verbose);

    if let Err(e) = run(cli.command, settings) {
        eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
        std::process::exit(1);
    }
}

fn run(command: Commands, settings: Settings) -> Result<()> {
    match command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("Could not create configuration")?;
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Created configuration file at: {}",
                    path.display()
                ))
            );
            println!("Edit this file to customize your settings.");
            Ok(())
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }

        Commands::Index { force } => {
            let start = Instant::now();
            if force {
                let embedder = load_embedder(&settings)?;
                let coordinator = RetrievalCoordinator::for_rebuild(&settings, embedder);
                let count = with_spinner("Rebuilding index...", || coordinator.rebuild())?;
                println!(
                    "{}",
                    THEME.success_with_icon(&format!(
                        "Rebuilt index with {count} chunks in {:.2?}",
                        start.elapsed()
                    ))
                );
            } else {
                let coordinator = open_coordinator(&settings)?;
                let count = coordinator.index().entry_count();
                println!(
                    "{}",
                    THEME.success_with_icon(&format!(
                        "Index ready with {count} chunks ({:.2?})",
                        start.elapsed()
                    ))
                );
            }
            Ok(())
        }

        Commands::Search { query, limit, json } => {
            let coordinator = open_coordinator(&settings)?;
            let k = limit.unwrap_or(settings.retrieval.top_k);
            let hits = coordinator.search_with_source_info(&query, k)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else if hits.is_empty() {
                println!("{}", THEME.warning_with_icon("No matching chunks"));
            } else {
                println!("{}", create_hits_table(&hits));
                for hit in &hits {
                    println!(
                        "  {} {} {}",
                        THEME.score(hit.score),
                        THEME.source_type(hit.source_type()),
                        THEME.apply(&THEME.source, &hit.chunk.source)
                    );
                }
            }
            Ok(())
        }

        Commands::Ask {
            question,
            show_context,
        } => {
            let coordinator = open_coordinator(&settings)?;
            if show_context {
                let context = coordinator.retrieve_context(&question, settings.retrieval.top_k);
                println!("{}", THEME.apply(&THEME.header, "Context"));
                if is_empty_context(&context) {
                    println!("{}", THEME.warning_with_icon(&context));
                } else {
                    println!("{}", THEME.apply(&THEME.dim, context));
                }
            }
            println!("{}", coordinator.answer(&question));
            Ok(())
        }

        Commands::Refresh { inbox, keep } => {
            let coordinator = open_coordinator(&settings)?;
            let inbox = inbox.unwrap_or_else(|| settings.resolve_path(&settings.paths.inbox));
            let source = JsonFileSource::new(&inbox).draining(!keep);

            let updated = with_spinner("Refreshing knowledge base...", || {
                coordinator.try_refresh(&source)
            })?;
            if updated {
                println!(
                    "{}",
                    THEME.success_with_icon(&format!(
                        "Index rebuilt with {} chunks",
                        coordinator.index().entry_count()
                    ))
                );
            } else {
                println!(
                    "{}",
                    THEME.warning_with_icon(&format!("No new articles in {}", inbox.display()))
                );
            }
            Ok(())
        }

        Commands::Stats { json } => {
            let coordinator = open_coordinator(&settings)?;
            let stats = coordinator.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{}", create_stats_table(&stats));
            }
            Ok(())
        }
    }
}

fn load_embedder(settings: &Settings) -> Result<Arc<dyn EmbeddingProvider>> {
    with_spinner("Loading embedding model...", || {
        create_provider(&settings.embedding)
    })
    .context("Could not initialize the embedding provider")
}

/// Loads the embedding provider and brings up a ready coordinator.
fn open_coordinator(settings: &Settings) -> Result<RetrievalCoordinator> {
    let embedder = load_embedder(settings)?;

    Ok(with_spinner("Loading knowledge base...", || {
        RetrievalCoordinator::from_settings(settings, embedder)
    }))
}
