//! Living Map Engine
//!
//! Procedural city generation, steering agents that roam between parking
//! lots, camera framing driven by navigation context, and a frame scheduler
//! that owns the scene lifecycle. Rendering is pluggable through
//! [`scheduler::RenderBackend`].

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod assets;
pub mod backend;
pub mod components;
pub mod config;
pub mod cube;
pub mod error;
pub mod lifecycle;
pub mod output;
pub mod sampler;
pub mod scene;
pub mod scheduler;
pub mod setup;
pub mod systems;

pub use components::*;

pub use assets::{AssetCatalog, AssetLoader, Fallback, FsAssetLoader, NullAssetLoader};
pub use backend::HeadlessBackend;
pub use config::{default_config_toml, ConfigError, MapConfig};
pub use cube::DataCube;
pub use error::{AssetLoadError, BackendError, InvalidWorldError, PlacementError, SceneError};
pub use sampler::{sample, PlacementArea, SpatialSampler, DEFAULT_MAX_ATTEMPTS};
pub use scene::{ResourceArena, ResourceHandle, ResourceKind, Scene, SceneBuilder};
pub use scheduler::{FrameReport, FrameScheduler, FrameView, Projection, RenderBackend, Viewport};
pub use setup::{build_world, spawn_agents, world_to_json};
pub use systems::{
    tick, CameraTransitionController, NavigationSystem, SimulationState, SteeringParams,
    StepReport,
};

/// Seeded random number generator resource
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub SmallRng);
