//! `armory` command line: one-shot scrapes and config inspection.

use std::sync::Arc;

use anyhow::{Context, Result};
use armory_client::{ChromiumDriver, FetchConfig, Fetcher, Scraper, ZoneExtractor};
use armory_core::{AppConfig, CacheStore};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "armory", version, about = "Scrape character equipment from the armory")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape one character and print the result as JSON.
    Scrape {
        /// Character name.
        character: String,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Print the effective configuration as JSON.
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Scrape { character, pretty } => scrape(&config, &character, pretty).await,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn scrape(config: &AppConfig, character: &str, pretty: bool) -> Result<()> {
    let cache = Arc::new(CacheStore::new(config.cache_ttl(), config.cache_capacity));
    let fetcher = Fetcher::new(Arc::new(ChromiumDriver::new()), FetchConfig::from_config(config));
    let scraper = Scraper::new(cache, fetcher, Arc::new(ZoneExtractor::new()));

    let scrape = scraper.scrape(character).await.with_context(|| format!("failed to scrape {character}"))?;
    let json = if pretty {
        serde_json::to_string_pretty(scrape.result.as_ref())?
    } else {
        serde_json::to_string(scrape.result.as_ref())?
    };
    println!("{json}");
    Ok(())
}
