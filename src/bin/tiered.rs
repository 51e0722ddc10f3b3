//! CLI binary for tiered search.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tier_search::{Query, SearchConfig, SearchIndex, TierExecution, TieredSearch};
use tracing_subscriber::EnvFilter;

/// Tiered relevance search over a RediSearch index.
#[derive(Debug, Parser)]
#[command(name = "tiered", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RediSearch server URL (overrides the config file).
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Index name (overrides the config file).
    #[arg(long)]
    index: Option<String>,

    /// Per-call deadline in seconds (overrides the config file).
    #[arg(long)]
    timeout: Option<u64>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Run a tiered search and print the ranked page as JSON.
    Search {
        /// Free-text query.
        text: String,

        /// Maximum number of results.
        #[arg(short, long, default_value_t = tier_search::types::DEFAULT_LIMIT)]
        limit: usize,

        /// Accepted for compatibility; not applied to the ranking.
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Restrict to documents tagged with this language.
        #[arg(long)]
        language: Option<String>,

        /// Restrict to documents tagged with this category.
        #[arg(long)]
        category: Option<String>,

        /// Query all tiers at once instead of one after another.
        #[arg(long)]
        concurrent: bool,
    },

    /// Print completions for a prefix.
    Suggest {
        prefix: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Check that the index server answers.
    Ping,

    /// Print the number of indexed documents.
    Count,
}

impl Cli {
    /// Load the config file (or defaults) and apply command-line overrides.
    fn search_config(&self) -> anyhow::Result<SearchConfig> {
        let mut config = match self.config {
            Some(ref path) => SearchConfig::from_file(path)?,
            None => SearchConfig::default(),
        };
        if let Some(ref url) = self.redis_url {
            config.redis_url = url.clone();
        }
        if let Some(ref index) = self.index {
            config.index_name = index.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Command::Search {
            concurrent: true, ..
        } = self.command
        {
            config.tier_execution = TierExecution::Concurrent;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tiered=info,tier_search=info,redis=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.search_config()?;
    let engine = TieredSearch::connect(config).await?;

    match cli.command {
        Command::Search {
            text,
            limit,
            offset,
            language,
            category,
            concurrent: _,
        } => {
            let mut query = Query::new(text)
                .with_limit(limit)
                .with_offset(offset);
            if let Some(language) = language {
                query = query.with_language(language);
            }
            if let Some(category) = category {
                query = query.with_category(category);
            }
            let response = engine.search(&query).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Suggest { prefix, limit } => {
            let suggestions = engine.suggest(&prefix, limit).await?;
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
        Command::Ping => {
            engine.ping().await?;
            tracing::info!(index = engine.index().name(), "index reachable");
            println!("PONG");
        }
        Command::Count => {
            let count = engine.document_count().await?;
            println!("{count}");
        }
    }

    Ok(())
}
