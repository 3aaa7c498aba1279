#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fire map server binary.
//!
//! ```text
//! fire_map_server [--config fire_map.toml] [serve]
//! fire_map_server counts --start 2022-04-20 --end 2022-04-25
//! fire_map_server points --start 2022-04-20 --end 2022-04-25
//! fire_map_server encode-boundaries --out boroughs.msgpack
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fire_map_dashboard::binder;
use fire_map_database_models::DateRange;
use fire_map_server::config::Config;
use fire_map_server::{ServerError, load_boundaries, open_store, run_server};
use fire_map_server_models::ApiCounts;

#[derive(Parser)]
#[command(
    name = "fire_map_server",
    about = "Alaska fire point dashboard server"
)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Print per-borough fire point counts as JSON
    Counts {
        /// First day (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: String,
        /// Last day (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: String,
    },
    /// Print fire points as a GeoJSON FeatureCollection
    Points {
        /// First day (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: String,
        /// Last day (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: String,
    },
    /// Write the encoded borough boundaries to a file
    EncodeBoundaries {
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
}

#[actix_web::main]
async fn main() {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        log::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(cli.config.as_deref()).map_err(ServerError::from)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await?,
        Commands::Counts { start, end } => {
            let range = DateRange::parse(Some(&start), Some(&end))?;
            config.calendar.bounds().check_range(&range)?;
            let boundaries = load_boundaries(&config)?;
            let store = open_store(&config, &boundaries).await?;
            let rows = store.counts_by_borough(&range).await?;
            let counts = ApiCounts {
                range,
                rows: binder::bind_counts(&rows),
            };
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
        Commands::Points { start, end } => {
            let range = DateRange::parse(Some(&start), Some(&end))?;
            config.calendar.bounds().check_range(&range)?;
            let boundaries = load_boundaries(&config)?;
            let store = open_store(&config, &boundaries).await?;
            let rows = store.points_in_range(&range).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&binder::bind_points(&rows))?
            );
        }
        Commands::EncodeBoundaries { out } => {
            let boundaries = load_boundaries(&config)?;
            let bytes = boundaries.encode()?;
            std::fs::write(&out, &bytes)?;
            log::info!(
                "Wrote {} boroughs ({} bytes) to {}",
                boundaries.boroughs().len(),
                bytes.len(),
                out.display()
            );
        }
    }

    Ok(())
}
