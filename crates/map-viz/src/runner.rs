//! Map runner: owns the frame scheduler inside the Bevy app.
//!
//! Starts the scene on launch, feeds Bevy's frame time into the scheduler,
//! forwards window resizes, and tears everything down when the app exits.
//! If construction fails the window keeps a plain background.

use bevy::app::AppExit;
use bevy::prelude::*;
use bevy::window::WindowResized;

use map_core::{FrameScheduler, FsAssetLoader, MapConfig, SceneBuilder};
use map_events::{LifecyclePhase, ParkingLotRecord};

use crate::backend::BevyBackend;

/// Background while the scene runs.
pub const SKY_COLOR: Color = Color::srgb(0.62, 0.72, 0.82);
/// Static background shown when the scene could not be built.
pub const FALLBACK_BACKGROUND: Color = Color::srgb(0.93, 0.94, 0.96);

/// Plugin for driving the scene through its lifecycle.
pub struct MapRunnerPlugin;

impl Plugin for MapRunnerPlugin {
    fn build(&self, app: &mut App) {
        // MapSettings should be inserted by main.rs before adding this plugin
        // If not present, initialize with defaults
        if !app.world().contains_resource::<MapSettings>() {
            app.init_resource::<MapSettings>();
        }
        let runner = MapRunner::new(&app.world().resource::<MapSettings>().config);

        app.insert_resource(runner)
            .insert_resource(ClearColor(SKY_COLOR))
            .configure_sets(
                Update,
                (MapSet::Simulate, MapSet::Spawn, MapSet::Present).chain(),
            )
            .add_systems(Startup, start_scene)
            .add_systems(
                Update,
                (handle_window_resize, drive_frames)
                    .chain()
                    .in_set(MapSet::Simulate),
            )
            .add_systems(Last, stop_on_exit);
    }
}

/// Ordering of the per-frame work.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapSet {
    /// Advance the scheduler.
    Simulate,
    /// Turn queued backend requests into entities.
    Spawn,
    /// Copy the latest frame onto transforms.
    Present,
}

/// Everything needed to build a scene.
#[derive(Resource, Clone, Debug)]
pub struct MapSettings {
    pub seed: u64,
    pub config: MapConfig,
    /// Records for the data cube faces.
    pub dataset: Option<Vec<ParkingLotRecord>>,
    /// Route to frame before the first frame.
    pub initial_route: Option<String>,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            config: MapConfig::default(),
            dataset: None,
            initial_route: None,
        }
    }
}

impl MapSettings {
    pub fn builder(&self) -> SceneBuilder {
        let builder = SceneBuilder::new(self.config.clone(), self.seed);
        match &self.dataset {
            Some(records) => builder.with_dataset(records.clone()),
            None => builder,
        }
    }
}

/// The scheduler, held as a resource so systems can reach the scene.
#[derive(Resource)]
pub struct MapRunner {
    pub scheduler: FrameScheduler<BevyBackend>,
}

impl MapRunner {
    pub fn new(config: &MapConfig) -> Self {
        Self {
            scheduler: FrameScheduler::new(config.scheduler.clone(), BevyBackend::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.phase() == LifecyclePhase::Running
    }

    /// Build and start the scene. Returns false if the fallback background
    /// should be shown instead.
    pub fn start(&mut self, settings: &MapSettings) -> bool {
        if let Some(route) = &settings.initial_route {
            self.scheduler.set_route(route);
        }

        let loader = FsAssetLoader::new(&settings.config.assets.root);
        match self.scheduler.start(&settings.builder(), &loader) {
            Ok(()) => {
                if let Some(scene) = self.scheduler.scene() {
                    tracing::info!(
                        "Scene running: {} obstacles, {} lots, {} vehicles, {} asset fallbacks",
                        scene.world.obstacles.len(),
                        scene.world.parking_locations.len(),
                        scene.sim.navigation.agents().len(),
                        scene.assets.fallback_count()
                    );
                }
                true
            }
            Err(e) => {
                tracing::error!("Scene construction failed: {}", e);
                false
            }
        }
    }
}

fn start_scene(
    settings: Res<MapSettings>,
    mut runner: ResMut<MapRunner>,
    mut clear_color: ResMut<ClearColor>,
) {
    if !runner.start(&settings) {
        tracing::warn!("Showing static fallback background");
        clear_color.0 = FALLBACK_BACKGROUND;
    }
}

fn handle_window_resize(mut events: EventReader<WindowResized>, mut runner: ResMut<MapRunner>) {
    // Only the newest size matters.
    if let Some(event) = events.read().last() {
        runner
            .scheduler
            .on_resize(event.width.round() as u32, event.height.round() as u32);
    }
}

fn drive_frames(time: Res<Time>, mut runner: ResMut<MapRunner>) {
    if !runner.is_running() {
        return;
    }
    if let Err(e) = runner.scheduler.frame(time.delta_seconds()) {
        tracing::error!("Frame failed: {}", e);
    }
}

pub(crate) fn stop_on_exit(mut exits: EventReader<AppExit>, mut runner: ResMut<MapRunner>) {
    if exits.read().next().is_some() {
        tracing::info!("Application exiting, tearing down scene");
        runner.scheduler.stop();
    }
}
