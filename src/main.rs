// src/main.rs
use anyhow::Context;
use clap::{Parser, Subcommand};
use inventory_feed::{
    cache, catalog,
    config::load_config,
    utils::setup_logging,
    webhooks::{AppState, InventoryServer},
};
use log::info;

#[derive(Parser, Debug)]
#[command(
    name = "inventory-feed",
    about = "Cached vehicle inventory feed with an on-demand revalidation webhook"
)]
struct Cli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API and the revalidation webhook (default).
    Serve,
    /// Fetch the feed once and print a summary.
    Fetch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging().context("failed to initialize logging")?;
    let cli = Cli::parse();

    let config = load_config().context("invalid configuration")?;
    let feed_cache = cache::from_config(&config).context("failed to build feed cache")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let bind = cli.bind.unwrap_or_else(|| config.bind_addr.clone());
            let state = AppState::new(feed_cache, &config);
            InventoryServer::new(&bind, state).start().await
        }
        Command::Fetch => {
            let records = feed_cache
                .get_vehicles()
                .await
                .context("failed to load inventory feed")?;
            let makes = catalog::manufacturers(&records);
            info!(
                "Feed OK: {} vehicles across {} manufacturers",
                records.len(),
                makes.len()
            );
            for make in makes {
                let count = catalog::by_manufacturer(&records, &make.slug).len();
                println!("{:<24} {:>4}  /vehicles/{}", make.name, count, make.slug);
            }
            Ok(())
        }
    }
}
