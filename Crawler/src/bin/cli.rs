//! Stock watcher CLI
//!
//! Local execution entry point. The HTTP trigger lives in
//! `stockwatch-server`; for AWS Lambda, use `stockwatch-lambda`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use stockwatch::{
    config::load_config,
    error::Result,
    models::region,
    pipeline,
    services::{self, ShopFetcher},
    storage::{LocalStorage, RecordStore},
};

/// Gashapon stock watcher
#[derive(Parser, Debug)]
#[command(
    name = "stockwatch",
    version,
    about = "Watches gashapon shop stock by prefecture"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Storage directory (overrides `storage.data_dir`)
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one crawl pass over every registered watch
    Crawl,

    /// Fetch and print shops for one product in one region
    Check {
        /// Region name, e.g. 東京都
        #[arg(short, long)]
        region: String,

        /// Product code, e.g. 4570117912345
        #[arg(short, long)]
        product: String,
    },

    /// List every supported region and its code
    Regions,

    /// Manage watches
    #[command(subcommand)]
    Watch(WatchCommand),

    /// Validate configuration
    Validate,
}

#[derive(Subcommand, Debug)]
enum WatchCommand {
    /// Register a watch
    Add {
        /// Subscriber push address (LINE user id)
        #[arg(short, long)]
        address: String,

        /// Region name or a fragment of one, e.g. 東京
        #[arg(short, long)]
        region: String,

        /// Product page URL carrying `product_code=` or `jan_code=`
        #[arg(short, long)]
        url: String,
    },

    /// List a subscriber's watches
    List {
        #[arg(short, long)]
        address: String,
    },

    /// Delete a subscriber's watch
    Remove {
        #[arg(short, long)]
        address: String,

        /// Watch id as shown by `watch list`
        #[arg(long)]
        id: String,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            init_logging(cli.verbose, "info");
            log::error!("Config validation failed: {e}");
            return Err(e);
        }
    };
    init_logging(cli.verbose, &config.logging.level);

    if let Some(dir) = cli.storage_dir {
        config.storage.data_dir = dir;
    }
    let store = Arc::new(RecordStore::new(LocalStorage::new(&config.storage.data_dir)));

    match cli.command {
        Command::Crawl => {
            log::info!("Storage directory: {}", config.storage.data_dir.display());
            let summary = pipeline::run_crawl_pass(&config, store).await?;
            log::info!(
                "Crawl complete in {}s",
                (summary.finished_at - summary.started_at).num_seconds()
            );
        }

        Command::Check { region, product } => {
            let fetcher = ShopFetcher::new(&config)?;
            let extraction = fetcher.lookup(&product, &region).await?;
            match &extraction.layout {
                Some(layout) => println!("Layout: {layout}"),
                None => println!("Layout: none matched"),
            }
            println!("Found {} shops", extraction.shops.len());
            for shop in &extraction.shops {
                println!("・{}\n  {}", shop.name, shop.address);
            }
        }

        Command::Regions => {
            for (name, code) in region::REGIONS {
                println!("{code} {name}");
            }
        }

        Command::Watch(WatchCommand::Add {
            address,
            region,
            url,
        }) => {
            let watch = services::register_watch(store.as_ref(), &address, &region, &url).await?;
            println!("{} {} {}", watch.id, watch.region, watch.product_code);
        }

        Command::Watch(WatchCommand::List { address }) => {
            let watches = services::list_watches(store.as_ref(), &address).await?;
            if watches.is_empty() {
                println!("No watches registered for {address}");
            }
            for watch in watches {
                println!(
                    "{} {} {} {}",
                    watch.id, watch.region, watch.product_code, watch.product_url
                );
            }
        }

        Command::Watch(WatchCommand::Remove { address, id }) => {
            if services::remove_watch(store.as_ref(), &address, &id).await? {
                println!("Removed {id}");
            } else {
                log::warn!("No watch {id} registered for {address}");
            }
        }

        Command::Validate => {
            log::info!(
                "✓ Config OK ({} shop layouts, endpoint {})",
                config.extraction.layouts.len(),
                config.crawler.endpoint
            );
            if config.notify.channel_access_token.is_none() {
                log::warn!("LINE_CHANNEL_ACCESS_TOKEN not set; messages will be skipped");
            }
            if config.server.cron_secret.is_none() {
                log::warn!("CRON_SECRET not set; the trigger endpoint would be open");
            }
        }
    }

    Ok(())
}
