//! Living map renderer.
//!
//! Opens a window and renders the generated city, the roaming vehicles, and
//! the data cube. The camera follows the route the host writes to
//! `--route-file`; clicks on a cube lot face print a navigation request as
//! JSON on stdout.

use bevy::prelude::*;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use map_core::MapConfig;
use map_events::parse_dataset;
use map_viz::route_watcher::RouteSource;
use map_viz::{LivingMapPlugin, MapSettings};

/// Command line arguments for the renderer
#[derive(Parser, Debug)]
#[command(name = "map-viz")]
#[command(about = "Renderer for the living map background")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// TOML configuration file (defaults to living_map.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// File the host writes its current route to
    #[arg(long)]
    route_file: Option<PathBuf>,

    /// Route to frame at startup
    #[arg(long)]
    route: Option<String>,

    /// Parking-lot dataset (JSON array) for the data cube
    #[arg(long)]
    dataset: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match MapConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Could not load {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => MapConfig::load_or_default(),
    };

    let dataset = args.dataset.as_ref().and_then(|path| {
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| parse_dataset(&json).map_err(|e| e.to_string()));
        match parsed {
            Ok(records) => Some(records),
            Err(e) => {
                eprintln!(
                    "Warning: Could not load dataset {}: {}. Cube shows no data.",
                    path.display(),
                    e
                );
                None
            }
        }
    });

    let settings = MapSettings {
        seed: args.seed,
        config,
        dataset,
        initial_route: args.route,
    };
    let route_source = match args.route_file {
        Some(path) => RouteSource::new(path),
        None => RouteSource::default(),
    };

    App::new()
        .insert_resource(route_source)
        .add_plugins(LivingMapPlugin { settings })
        .run();
}
