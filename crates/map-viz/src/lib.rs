//! Visualization layer: Bevy renderer for the living map.

pub mod backend;
pub mod camera;
pub mod picking;
pub mod plugin;
pub mod route_watcher;
pub mod runner;
pub mod vehicles;
pub mod world;

pub use backend::BevyBackend;
pub use plugin::LivingMapPlugin;
pub use runner::{MapRunner, MapSet, MapSettings};
