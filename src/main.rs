use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chainfolio::actions::BalanceActions;
use chainfolio::api::HttpBalanceApi;
use chainfolio::assets::AssetRegistry;
use chainfolio::config::{default_config_path, Config};
use chainfolio::models::{AssetId, Blockchain};
use chainfolio::notifications::TracingNotifier;

#[derive(Parser)]
#[command(name = "chainfolio")]
#[command(about = "Crypto portfolio balances from a local backend")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch balances and print the aggregated portfolio
    Balances {
        /// Only refresh this chain
        #[arg(long)]
        chain: Option<Blockchain>,

        /// Ask the backend to bypass its caches
        #[arg(long)]
        ignore_cache: bool,
    },
    /// Show where an asset is held
    Breakdown {
        asset: String,

        #[arg(long)]
        ignore_cache: bool,
    },
    /// Show the assets held at a location
    Location {
        location: String,

        #[arg(long)]
        ignore_cache: bool,
    },
    /// List tracked accounts with their balances
    Accounts {
        #[arg(long)]
        chain: Option<Blockchain>,
    },
    /// Show current configuration
    Config,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_actions(config: &Config) -> Result<BalanceActions> {
    let api = HttpBalanceApi::from_config(&config.backend);
    let assets = AssetRegistry::from_config(&config.assets)?;
    Ok(BalanceActions::new(
        Arc::new(api),
        Arc::new(assets),
        Arc::new(TracingNotifier),
        config.settings.clone(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command {
        Command::Config => {
            println!("Config file: {}", config_path.display());
            print_json(&config)?;
        }
        Command::Balances {
            chain,
            ignore_cache,
        } => {
            let actions = build_actions(&config)?;
            match chain {
                Some(chain) => {
                    actions
                        .fetch_blockchain_balances(Some(chain), ignore_cache)
                        .await
                }
                None => actions.fetch_all(ignore_cache).await,
            }
            actions.refresh_prices(ignore_cache).await;

            let statuses = actions.statuses().snapshot();
            let output = actions.view(|view| {
                json!({
                    "currency": config.settings.currency_symbol,
                    "assets": view.aggregated_balances(),
                    "liabilities": view.liabilities(),
                    "blockchains": view.blockchain_totals(&statuses),
                    "locations": view.by_location(),
                    "nft_value": view.nf_total_value(false),
                })
            });
            print_json(&output)?;
        }
        Command::Breakdown {
            asset,
            ignore_cache,
        } => {
            let actions = build_actions(&config)?;
            actions.fetch_all(ignore_cache).await;
            actions.refresh_prices(ignore_cache).await;
            let asset = AssetId::from(asset);
            let rows = actions.view(|view| view.asset_breakdown(&asset));
            print_json(&rows)?;
        }
        Command::Location {
            location,
            ignore_cache,
        } => {
            let actions = build_actions(&config)?;
            actions.fetch_all(ignore_cache).await;
            actions.refresh_prices(ignore_cache).await;
            let rows = actions.view(|view| view.location_breakdown(&location));
            print_json(&rows)?;
        }
        Command::Accounts { chain } => {
            let actions = build_actions(&config)?;
            actions.fetch_blockchain_balances(chain, false).await;
            let output = actions.view(|view| match chain {
                Some(chain) => json!(view.chain_accounts(chain)),
                None => json!(view.accounts()),
            });
            print_json(&output)?;
        }
    }

    Ok(())
}
