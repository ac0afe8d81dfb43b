//! Error Types
//!
//! Construction-time failures are fatal and propagate to the caller of
//! `start()`/`build()`. Asset failures are recoverable and never leave the
//! asset catalogue.

use map_events::LifecyclePhase;
use thiserror::Error;

use crate::config::ConfigError;

/// The sampler could not place an item.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    /// The bounds are not a positive finite half-width.
    #[error("invalid placement bounds half-width {0}")]
    InvalidBounds(f32),
    /// The reserved central zone covers the whole placement area.
    #[error("exclusion half-extent {exclusion} leaves no room inside bounds {bounds}")]
    DegenerateExclusion { exclusion: f32, bounds: f32 },
    /// Every draw for one item landed inside the reserved zone.
    #[error("placed {placed} of {requested} items; gave up after {attempts} attempts")]
    RetriesExhausted {
        requested: usize,
        placed: usize,
        attempts: u32,
    },
}

/// The world cannot support navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidWorldError {
    #[error("world has no parking locations; navigation needs at least one")]
    NoParkingLocations,
}

/// A texture, font, or image could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetLoadError {
    #[error("asset '{key}' not found at {path}")]
    NotFound { key: String, path: String },
    #[error("asset '{key}' could not be read: {reason}")]
    Unreadable { key: String, reason: String },
    #[error("asset '{key}' is empty")]
    Empty { key: String },
}

/// The renderer could not create its resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render backend failed: {0}")]
pub struct BackendError(pub String);

/// Everything that can stop a scene from running.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    InvalidWorld(#[from] InvalidWorldError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// A stop request arrived while the scene was being constructed.
    #[error("scene construction was cancelled")]
    Cancelled,
    #[error("cannot {action} while the scene is {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: LifecyclePhase,
    },
}

impl SceneError {
    /// Returns true for errors raised while building the world.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            SceneError::Placement(_) | SceneError::InvalidWorld(_) | SceneError::Config(_)
        )
    }
}
