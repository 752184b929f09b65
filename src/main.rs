mod attack;
mod colors;
mod config;
mod geo;
mod help;
mod map;
mod settings;
mod terminal;

use clap::{Parser, Subcommand};
use config::{FeedConfig, MapConfig};
use settings::Settings;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "threatmap")]
#[command(version = "0.2.0")]
#[command(about = "Terminal attack map: live threat feed on a pannable world map", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive attack map
    Map {
        /// WebSocket attack feed URL (omit to run the built-in simulator)
        #[arg(short, long)]
        url: Option<String>,

        /// GeoJSON FeatureCollection URL for country boundaries
        #[arg(short, long)]
        boundaries: Option<String>,

        /// Path to a GeoLite2-City.mmdb database
        #[arg(long)]
        geoip: Option<PathBuf>,

        /// Simulator seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Mean simulated events per tick
        #[arg(short, long)]
        rate: Option<f64>,

        /// Frame delay in seconds
        #[arg(short, long, default_value = "0.05")]
        time: f32,

        /// Use the light terminal palette
        #[arg(short, long)]
        light: bool,
    },

    /// Fetch a boundaries dataset, validate it, and print a summary
    Fetch {
        /// GeoJSON FeatureCollection URL
        url: String,
    },
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load();

    match cli.command {
        Commands::Map {
            url,
            boundaries,
            geoip,
            seed,
            rate,
            time,
            light,
        } => {
            let map_config = MapConfig {
                boundaries_url: boundaries.or(settings.map.boundaries_url),
                geoip_db: geoip.or(settings.map.geoip_db),
                time_step: time,
                light: light || settings.map.light.unwrap_or(false),
            };
            let feed_config = FeedConfig {
                url: url.or(settings.feed.url),
                seed: seed.or(settings.feed.seed),
                rate: rate.or(settings.feed.rate).unwrap_or(1.0),
            };
            map::run(&map_config, &feed_config)?;
        }

        Commands::Fetch { url } => {
            let store = geo::boundaries::BoundaryStore::load(Some(&url));
            if let Some(reason) = store.fallback_reason() {
                eprintln!("fetch failed: {reason}");
                std::process::exit(1);
            }
            println!("{}: {} countries", store.source(), store.features().len());
            for feature in store.features() {
                println!(
                    "  {}  {} ({} ring{})",
                    feature.code,
                    feature.name,
                    feature.rings().len(),
                    if feature.rings().len() == 1 { "" } else { "s" }
                );
            }
        }
    }

    Ok(())
}
