//! Scene
//!
//! The single context object for a running map: the immutable world, the
//! mutable simulation state, the data cube, loaded assets, and the arena that
//! owns every render resource.

pub mod arena;

pub use arena::{ResourceArena, ResourceEntry, ResourceHandle, ResourceKind};

use bevy_ecs::prelude::*;
use map_events::{
    generate_snapshot_id, LifecyclePhase, ParkingLotRecord, SceneSnapshot, WorldData,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::assets::{AssetCatalog, AssetLoader};
use crate::config::MapConfig;
use crate::cube::DataCube;
use crate::error::{InvalidWorldError, SceneError};
use crate::sampler::SpatialSampler;
use crate::scheduler::Viewport;
use crate::setup::{build_world, spawn_agents};
use crate::systems::{
    CameraTransitionController, NavigationSystem, SimulationState, SteeringParams, StepReport,
};
use crate::SimRng;

#[derive(Resource, Debug)]
pub struct Scene {
    pub world: WorldData,
    pub sim: SimulationState,
    pub cube: DataCube,
    pub assets: AssetCatalog,
    pub resources: ResourceArena,
}

impl Scene {
    /// One fixed simulation step, then the cube spin.
    pub fn tick(&mut self) -> Result<StepReport, InvalidWorldError> {
        let report = self.sim.advance(&self.world)?;
        self.cube.advance_spin();
        Ok(report)
    }

    pub fn current_tick(&self) -> u64 {
        self.sim.tick
    }

    /// Release every registered resource. Safe to call more than once.
    pub fn teardown(&mut self) -> Vec<ResourceEntry> {
        self.resources.drain()
    }

    pub fn snapshot(&self, sequence: u64, phase: LifecyclePhase, viewport: Viewport) -> SceneSnapshot {
        let parking = &self.world.parking_locations;
        SceneSnapshot {
            snapshot_id: generate_snapshot_id(sequence),
            tick: self.sim.tick,
            phase,
            agents: self
                .sim
                .navigation
                .agents()
                .iter()
                .map(|a| a.snapshot(parking))
                .collect(),
            camera: self.sim.camera.snapshot(),
            viewport: (viewport.width, viewport.height),
        }
    }
}

/// Everything needed to construct a [`Scene`].
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    pub config: MapConfig,
    pub seed: u64,
    pub dataset: Option<Vec<ParkingLotRecord>>,
}

impl SceneBuilder {
    pub fn new(config: MapConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            dataset: None,
        }
    }

    pub fn with_dataset(mut self, dataset: Vec<ParkingLotRecord>) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Build the world, spawn agents, and load assets.
    ///
    /// The world and agents share one seeded random stream, so the same seed
    /// and config always yield the same scene.
    pub fn build(&self, loader: &dyn AssetLoader) -> Result<Scene, SceneError> {
        let config = &self.config;
        config.validate()?;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let world = build_world(&mut rng, &config.world)?;

        let sampler = SpatialSampler::from_config(&config.world);
        let agents = spawn_agents(&mut rng, &config.navigation, &sampler)?;
        let navigation = NavigationSystem::new(
            agents,
            SteeringParams::from(&config.navigation),
            &world.parking_locations,
        )?;
        let camera = CameraTransitionController::new(config.camera.clone());

        let mut resources = ResourceArena::new();
        let assets = AssetCatalog::load_all(&config.assets, loader, &mut resources);
        let cube = DataCube::new(&config.world, self.dataset.as_deref());

        tracing::info!("Scene built with seed {}", self.seed);

        Ok(Scene {
            world,
            sim: SimulationState::new(navigation, camera, SimRng(rng)),
            cube,
            assets,
            resources,
        })
    }
}
