//! Scene Components
//!
//! Plain data owned by the scene: agents and the camera.

pub mod agent;
pub mod camera;

pub use agent::Agent;
pub use camera::CameraState;
