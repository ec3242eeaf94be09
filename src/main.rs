use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use noflame::location::IpGeolocation;
use noflame::{
    Aggregator, Coordinate, DashboardView, HttpLookups, LocationProvider, MapSettings,
    NoFlameConfig, logging, web,
};

/// Local weather and wildfire risk for where you are
#[derive(Parser, Debug)]
#[command(name = "noflame", version)]
#[command(about = "Local weather and wildfire risk dashboard", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for noflame
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline once and print the dashboard
    Show {
        /// Latitude in decimal degrees
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in decimal degrees
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,

        /// Locate via the public IP address
        #[arg(long, conflicts_with_all = ["lat", "lng"])]
        ip: bool,

        /// Print the dashboard as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the dashboard API
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn location_provider(
    config: &NoFlameConfig,
    lat: Option<f64>,
    lng: Option<f64>,
    ip: bool,
) -> Result<LocationProvider> {
    if let (Some(lat), Some(lng)) = (lat, lng) {
        return Ok(LocationProvider::fixed(Coordinate::new(lat, lng)?));
    }
    if ip {
        let geo = IpGeolocation::new_with_base_url(
            &config.location.ip_base_url,
            Duration::from_secs(config.location.timeout_seconds.into()),
        )?;
        return Ok(LocationProvider::new(Some(Box::new(geo))));
    }
    Ok(LocationProvider::from_config(&config.location)?)
}

async fn show(
    config: &NoFlameConfig,
    provider: LocationProvider,
    json: bool,
) -> Result<()> {
    let lookups = HttpLookups::from_config(config)?;
    let mut aggregator = Aggregator::new(lookups);

    let state = aggregator.run(provider).await;
    debug!("Pipeline phases: {:?}", aggregator.history());

    let view = DashboardView::from_state(&state, &MapSettings::from(&config.map));
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&view).with_context(|| "Failed to encode dashboard")?
        );
    } else {
        println!("{view}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = NoFlameConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;
    info!("NoFlame {}", noflame::VERSION);

    match cli.command {
        Some(Command::Show { lat, lng, ip, json }) => {
            let provider = location_provider(&config, lat, lng, ip)?;
            show(&config, provider, json).await
        }
        Some(Command::Serve { port }) => web::run(&config, port.unwrap_or(config.server.port)).await,
        None => {
            let provider = LocationProvider::from_config(&config.location)?;
            show(&config, provider, false).await
        }
    }
}
