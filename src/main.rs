//! location-intel: business-density analytics for a point on the map.
//!
//! Single-binary Tokio application that:
//! 1. Aggregates nearby businesses from Overpass into per-category counts
//! 2. Searches for one business type around a point
//! 3. Resolves place names and nearby streets through Nominatim
//! 4. Ranks nearby streets by the businesses on them
//!
//! Results are printed to stdout as JSON; logs go to stderr.

mod config;

use std::path::PathBuf;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use analytics::LocationService;

/// Location intelligence from OpenStreetMap data
#[derive(Parser)]
#[command(name = "location-intel", about = "Business density analytics from OpenStreetMap")]
struct Cli {
    /// TOML config file (defaults to ./config.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fail with a non-zero exit instead of printing fallback results.
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct Point {
    /// Latitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Longitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    lng: f64,

    /// Search radius in kilometres, used for density.
    #[arg(long, default_value_t = 1.0)]
    radius: f64,
}

#[derive(Subcommand)]
enum Command {
    /// Business counts and density around a point.
    Analytics {
        #[command(flatten)]
        point: Point,
    },
    /// Businesses of one OSM amenity/shop type around a point.
    Search {
        #[command(flatten)]
        point: Point,

        /// OSM tag value, e.g. `cafe` or `fuel`.
        #[arg(long = "type")]
        business_type: String,
    },
    /// Places matching a free-text query.
    Locate { query: String },
    /// Nearby streets ranked by business count.
    Streets {
        #[command(flatten)]
        point: Point,
    },
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn print_result<T: Serialize>(command: &str, result: &T) -> anyhow::Result<()> {
    let envelope = json!({
        "generated_at": now_iso(),
        "command": command,
        "result": result,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&envelope).context("serializing result")?
    );
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::load_config(cli.config.as_deref()).context("loading configuration")?;

    info!(
        "Overpass: {} | Nominatim: {} | cache: {} entries, {}s",
        cfg.overpass.endpoint,
        cfg.nominatim.endpoint,
        cfg.cache.max_entries,
        cfg.cache.max_age_secs
    );

    let service = LocationService::from_config(&cfg).context("building HTTP client")?;

    match cli.command {
        Command::Analytics { point } => {
            let result = if cli.strict {
                service
                    .analytics()
                    .try_fetch_location_analytics(point.lat, point.lng, point.radius)
                    .await?
            } else {
                service
                    .fetch_location_analytics(point.lat, point.lng, point.radius)
                    .await
            };
            info!(
                "{} businesses around ({},{})",
                result.total_businesses, point.lat, point.lng
            );
            print_result("analytics", &result)
        }
        Command::Search {
            point,
            business_type,
        } => {
            let result = if cli.strict {
                service
                    .analytics()
                    .try_search_businesses_by_type(point.lat, point.lng, point.radius, &business_type)
                    .await?
            } else {
                service
                    .search_businesses_by_type(point.lat, point.lng, point.radius, &business_type)
                    .await
            };
            info!("{} {:?} businesses found", result.len(), business_type);
            print_result("search", &result)
        }
        Command::Locate { query } => {
            let result = if cli.strict {
                service.nominatim().search_location(&query).await?
            } else {
                service.search_location_or_empty(&query).await
            };
            print_result("locate", &result)
        }
        Command::Streets { point } => {
            let result = if cli.strict {
                service
                    .try_best_streets(point.lat, point.lng, point.radius)
                    .await?
            } else {
                service.best_streets(point.lat, point.lng, point.radius).await
            };
            print_result("streets", &result)
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging on stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "location_intel=info,analytics=info,geodata_client=warn".into()
            }),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "location-intel",
            "search",
            "--lat",
            "-33.8688",
            "--lng",
            "151.2093",
            "--type",
            "cafe",
            "--strict",
        ])
        .expect("arguments should parse");

        assert!(cli.strict);
        match cli.command {
            Command::Search {
                point,
                business_type,
            } => {
                assert_eq!(point.lat, -33.8688);
                assert_eq!(point.radius, 1.0);
                assert_eq!(business_type, "cafe");
            }
            _ => panic!("expected search subcommand"),
        }
    }
}
