//! Camera Components

use map_events::Point3D;

use crate::config::CameraConfig;

/// Where the camera sits and what it looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Point3D,
    pub focus: Point3D,
    /// Desired `focus.x`; the controller eases toward it.
    pub target_focus_x: f32,
}

impl CameraState {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            position: config.initial_position,
            focus: config.initial_focus,
            target_focus_x: config.initial_focus.x,
        }
    }

    /// Remaining horizontal distance to the target.
    pub fn remaining(&self) -> f32 {
        (self.target_focus_x - self.focus.x).abs()
    }
}
