//! # rankfeed CLI
//!
//! ```bash
//! rankfeed serve                      # scheduler + HTTP server
//! rankfeed serve --bind 0.0.0.0:8080
//! rankfeed fetch --page 2             # one refresh, print a page
//! rankfeed --config ./config/rankfeed.toml fetch --json
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `rankfeed=info`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rankfeed::config;
use rankfeed::fetch::HttpFetcher;
use rankfeed::pipeline::Refresher;
use rankfeed::server::{self, PageView};
use rankfeed::snapshot::SnapshotStore;

/// Fetch a ranked listing on a schedule and serve it in pages.
#[derive(Parser)]
#[command(name = "rankfeed", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it is absent.
    #[arg(long, global = true, default_value = "./config/rankfeed.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the background refresh and the HTTP server.
    Serve {
        /// Override `[server].bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run the refresh pipeline once and print a page of the result.
    Fetch {
        /// Page to print (1-indexed).
        #[arg(long, default_value_t = 1)]
        page: i64,

        /// Print the page as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rankfeed=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            server::run_server(&cfg).await?;
        }
        Commands::Fetch { page, json } => {
            run_fetch(&cfg, page, json).await?;
        }
    }

    Ok(())
}

async fn run_fetch(cfg: &config::Config, page: i64, json: bool) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(&cfg.source)?);
    let refresher = Refresher::from_config(fetcher, Arc::new(SnapshotStore::new()), cfg);

    let snapshot = refresher
        .refresh()
        .await
        .with_context(|| format!("refresh from {} failed", cfg.source.url))?
        .into_snapshot();
    let view = PageView::build(&snapshot, page, cfg.pages.page_size);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if view.items.is_empty() {
        println!("No items on page {} ({} pages).", view.page, view.total_pages);
        return Ok(());
    }

    println!("{:>4}  {:>6}  TITLE", "#", "SCORE");
    for (i, item) in view.items.iter().enumerate() {
        println!("{:>4}  {:>6}  {}", view.offset + i + 1, item.score, item.title);
        println!("{:>14}{}", "", item.link);
    }
    println!(
        "\npage {}/{} · {} items · generated {}",
        view.page, view.total_pages, view.total_items, view.generated_at
    );

    Ok(())
}
