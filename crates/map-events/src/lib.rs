//! Shared data types and serialization for the living map.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod context;
pub mod dataset;
pub mod geometry;
pub mod snapshot;
pub mod world;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

pub use context::RouteContext;
pub use geometry::{Point2D, Point3D};

pub use dataset::{
    decorate_faces, parse_dataset, CubeFace, FaceContent, NavigationRequest, ParkingLotRecord,
};

pub use world::{
    GroundRect, LotLayout, Obstacle, ParkingLocation, Prop, PropKind, StallLine, WorldData,
};

pub use snapshot::{
    generate_snapshot_id, AgentSnapshot, CameraSnapshot, LifecyclePhase, SceneSnapshot,
};
