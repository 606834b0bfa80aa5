use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shop_matcher::catalog::demo::{self, DEFAULT_CENTER};
use shop_matcher::catalog::store::{load_catalog, save_catalog, CatalogDocument};
use shop_matcher::catalog::{Catalog, CatalogHandle, GeoPoint};
use shop_matcher::config::{Config, ConfigOverrides};
use shop_matcher::cost::fee::{quote_fee, FeeRequest};
use shop_matcher::engine::{FulfillmentEngine, FulfillmentRequest};
use shop_matcher::output::csv::combinations_to_csv;
use shop_matcher::output::json::render_json;
use shop_matcher::output::table::{render_combinations_table, render_quote_table};
use shop_matcher::pricing::OverlapPricing;
use shop_matcher::search::SearchStrategy;
use shop_matcher::server::run_server;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "shop-matcher",
    about = "Find and rank shop combinations that can fulfil a medicine list"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// JSON catalog file; overrides `[catalog].path`.
    #[arg(long)]
    catalog: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    /// Search deadline in milliseconds, 0 disables it.
    #[arg(long = "timeout-ms")]
    timeout_ms: Option<u64>,
    #[arg(long)]
    overlap: Option<OverlapPricing>,
    #[arg(long)]
    strategy: Option<SearchStrategy>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rank every shop combination that covers the given items.
    Match {
        #[arg(long, value_delimiter = ',', required = true)]
        items: Vec<String>,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = 0.0)]
        demand: f64,
        #[arg(long = "lowest-cost")]
        lowest_cost: bool,
        #[arg(long)]
        top: Option<usize>,
    },
    /// Quote the tiered delivery fee for a single order.
    Quote {
        #[arg(long = "cart-value")]
        cart_value: f64,
        #[arg(long = "distance-m")]
        distance_m: u64,
        #[arg(long, default_value_t = 0)]
        items: u32,
    },
    /// Generate a seeded demo catalog.
    DemoCatalog {
        #[arg(long, default_value_t = 6)]
        shops: usize,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        catalog_path: cli.catalog.clone(),
        timeout_ms: cli.timeout_ms,
        overlap: cli.overlap,
        strategy: cli.strategy,
    });

    match &cli.command {
        Commands::Config { init, show } => {
            handle_config_command(*init, *show, &config, &config_path)
        }
        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let bind = format!("{host}:{port}");
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
            let catalog = resolve_catalog(&config)?;
            run_server(config, CatalogHandle::new(catalog), addr).await
        }
        Commands::Quote {
            cart_value,
            distance_m,
            items,
        } => {
            let quote = quote_fee(
                &config.delivery_fee,
                &FeeRequest {
                    cart_value: *cart_value,
                    delivery_distance: *distance_m,
                    item_count: *items,
                    time: None,
                },
            )?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_quote_table(&quote)),
                OutputFormat::Json => println!("{}", render_json(&quote)?),
                OutputFormat::Csv => {
                    warn!("CSV output for quotes not implemented, using JSON");
                    println!("{}", render_json(&quote)?);
                }
            }
            Ok(())
        }
        Commands::DemoCatalog { shops, seed, out } => {
            let catalog = demo::generate(*shops, *seed, DEFAULT_CENTER)?;
            match out {
                Some(path) => {
                    save_catalog(path, &catalog)?;
                    println!(
                        "Wrote {} shops stocking {} salts to {}",
                        catalog.len(),
                        catalog.stocked_items().len(),
                        path.display()
                    );
                }
                None => println!(
                    "{}",
                    render_json(&CatalogDocument::from(&catalog))?
                ),
            }
            Ok(())
        }
        Commands::Match {
            items,
            lat,
            lon,
            demand,
            lowest_cost,
            top,
        } => {
            let catalog = resolve_catalog(&config)?;
            let user_location = GeoPoint::new(*lat, *lon)?;
            let request = FulfillmentRequest {
                demand_factor: *demand,
                prefer_convenience: !*lowest_cost,
                ..FulfillmentRequest::new(items.iter().cloned(), user_location)
            };
            let engine = FulfillmentEngine::new(config.engine_settings());
            let mut response = tokio::task::spawn_blocking(move || engine.run(&catalog, &request))
                .await
                .context("search worker failed")??;
            if let Some(top) = top {
                response.ranked_combinations.truncate(*top);
            }
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_combinations_table(&response.ranked_combinations));
                    println!(
                        "{} combinations from {} shops in {} ms",
                        response.summary.candidates,
                        response.summary.catalog_suppliers,
                        response.summary.elapsed_ms
                    );
                }
                OutputFormat::Json => println!("{}", render_json(&response)?),
                OutputFormat::Csv => {
                    print!("{}", combinations_to_csv(&response.ranked_combinations)?)
                }
            }
            Ok(())
        }
    }
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn resolve_catalog(config: &Config) -> Result<Catalog> {
    match config.resolved_catalog_path() {
        Some(path) => {
            let catalog = load_catalog(&path)?;
            info!(path = %path.display(), suppliers = catalog.len(), "catalog loaded");
            Ok(catalog)
        }
        None => {
            let catalog = demo::generate(
                config.catalog.demo_shops,
                config.catalog.demo_seed,
                DEFAULT_CENTER,
            )?;
            info!(
                suppliers = catalog.len(),
                seed = config.catalog.demo_seed,
                "no catalog configured, using demo catalog"
            );
            Ok(catalog)
        }
    }
}
