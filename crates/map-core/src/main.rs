//! Living Map (headless)
//!
//! Builds a scene, runs it through the frame scheduler with the headless
//! backend, and writes periodic JSON snapshots.

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use map_core::output::{self, SnapshotGenerator};
use map_core::{FrameScheduler, FsAssetLoader, HeadlessBackend, MapConfig, SceneBuilder};
use map_events::{parse_dataset, ParkingLotRecord};

/// Command line arguments for the headless runner
#[derive(Parser, Debug)]
#[command(name = "living_map")]
#[command(about = "Headless runner for the living map background")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 1000)]
    ticks: u64,

    /// TOML configuration file (defaults to living_map.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial navigation route, e.g. "signup" or "login"
    #[arg(long)]
    route: Option<String>,

    /// Route to switch to part way through the run
    #[arg(long, requires = "switch_tick")]
    switch_route: Option<String>,

    /// Tick at which --switch-route takes effect
    #[arg(long)]
    switch_tick: Option<u64>,

    /// Interval between scene snapshots (in ticks, 0 disables)
    #[arg(long, default_value_t = 100)]
    snapshot_interval: u64,

    /// Output directory
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Parking-lot dataset (JSON array) for the data cube
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Also write the generated world as world.json
    #[arg(long)]
    output_initial_state: bool,
}

fn main() {
    let args = Args::parse();

    println!("Living Map");
    println!("==========");
    println!("Seed: {}", args.seed);
    println!("Ticks: {}", args.ticks);
    println!("Snapshot interval: {}", args.snapshot_interval);
    println!();

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

    let mut builder = SceneBuilder::new(config.clone(), args.seed);
    if let Some(records) = args.dataset.as_ref().and_then(|p| load_dataset(p)) {
        println!("Loaded {} parking lots for the data cube", records.len());
        builder = builder.with_dataset(records);
    }

    let loader = FsAssetLoader::new(&config.assets.root);
    let mut scheduler = FrameScheduler::new(config.scheduler.clone(), HeadlessBackend::new());
    if let Some(route) = &args.route {
        scheduler.set_route(route);
    }

    println!("Building scene...");
    if let Err(e) = scheduler.start(&builder, &loader) {
        eprintln!("Scene construction failed: {}", e);
        println!("Showing static fallback background.");
        std::process::exit(1);
    }

    if let Some(scene) = scheduler.scene() {
        println!("  {} obstacles", scene.world.obstacles.len());
        println!("  {} parking lots", scene.world.parking_locations.len());
        println!("  {} props", scene.world.props.len());
        println!("  {} agents", scene.sim.navigation.agents().len());
        println!(
            "  {} assets ({} fallbacks)",
            scene.assets.len(),
            scene.assets.fallback_count()
        );

        if args.output_initial_state {
            match output::write_world(&scene.world, &args.output) {
                Ok(path) => println!("  Wrote {}", path.display()),
                Err(e) => eprintln!("  Warning: Could not write world state: {}", e),
            }
        }
    }

    let mut generator = SnapshotGenerator::new(args.snapshot_interval);
    write_snapshot(&scheduler, &mut generator, &args.output);

    println!();
    println!("Starting simulation...");
    println!();

    let dt = config.scheduler.fixed_dt;
    for tick in 1..=args.ticks {
        if args.switch_tick == Some(tick) {
            if let Some(route) = &args.switch_route {
                println!("Tick {}: navigating to '{}'", tick, route);
                scheduler.set_route(route);
            }
        }

        if let Err(e) = scheduler.frame(dt) {
            eprintln!("Frame failed at tick {}: {}", tick, e);
            break;
        }

        if tick % 100 == 0 {
            if let Some(scene) = scheduler.scene() {
                let camera = scene.sim.camera.state();
                println!(
                    "Tick {}: {} arrivals, camera x {:.1} -> {:.1}",
                    tick,
                    scene.sim.navigation.total_arrivals(),
                    camera.focus.x,
                    camera.target_focus_x
                );
            }
        }

        if generator.should_snapshot(tick) {
            write_snapshot(&scheduler, &mut generator, &args.output);
        }
    }

    println!();
    if let Some(scene) = scheduler.scene() {
        println!(
            "Simulation complete: {} ticks, {} arrivals.",
            scene.current_tick(),
            scene.sim.navigation.total_arrivals()
        );
    }
    println!("Generated {} snapshots.", generator.snapshot_count());

    scheduler.stop();
    let backend = scheduler.backend();
    println!(
        "Released resources: {} acquired, {} outstanding.",
        backend.acquired,
        backend.outstanding()
    );
}

fn load_dataset(path: &Path) -> Option<Vec<ParkingLotRecord>> {
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
}

fn write_snapshot(
    scheduler: &FrameScheduler<HeadlessBackend>,
    generator: &mut SnapshotGenerator,
    dir: &Path,
) {
    let sequence = generator.next_sequence();
    if let Some(snapshot) = scheduler.snapshot(sequence) {
        if let Err(e) = output::write_snapshot_to_dir(&snapshot, dir) {
            eprintln!("Warning: Could not write snapshot at tick {}: {}", snapshot.tick, e);
        }
    }
}
