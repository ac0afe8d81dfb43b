//! Snapshot Types
//!
//! Serialization structs capturing the moving parts of a scene at one tick,
//! used for headless output, debugging, and tests.

use serde::{Deserialize, Serialize};

use crate::{Point2D, Point3D, RouteContext};

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// Where the scene is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Nothing built yet.
    #[default]
    Idle,
    /// World construction (including asset loads) in progress.
    Constructing,
    /// Frame loop running.
    Running,
    /// Torn down.
    Stopped,
    /// Construction failed; a static fallback is shown.
    Failed,
}

impl LifecyclePhase {
    pub fn is_running(self) -> bool {
        matches!(self, LifecyclePhase::Running)
    }
}

/// One agent at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: u32,
    pub position: Point2D,
    pub heading: f32,
    pub speed: f32,
    /// Parking location currently targeted.
    #[serde(default)]
    pub target: Option<u32>,
    /// Number of arrivals so far.
    #[serde(default)]
    pub arrivals: u32,
}

/// Camera state at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSnapshot {
    pub position: Point3D,
    pub focus: Point3D,
    pub target_focus_x: f32,
    #[serde(default)]
    pub context: RouteContext,
}

/// Complete moving state of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub snapshot_id: String,
    pub tick: u64,
    pub phase: LifecyclePhase,
    pub agents: Vec<AgentSnapshot>,
    pub camera: CameraSnapshot,
    /// Viewport size as `(width, height)`.
    #[serde(default)]
    pub viewport: (u32, u32),
}

impl SceneSnapshot {
    /// Serializes the snapshot as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Returns true if every agent coordinate and heading is finite.
    pub fn all_finite(&self) -> bool {
        self.agents
            .iter()
            .all(|a| a.position.is_finite() && a.heading.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SceneSnapshot {
        SceneSnapshot {
            snapshot_id: generate_snapshot_id(7),
            tick: 420,
            phase: LifecyclePhase::Running,
            agents: vec![AgentSnapshot {
                agent_id: 0,
                position: Point2D::new(12.0, -40.0),
                heading: 0.5,
                speed: 0.3,
                target: Some(2),
                arrivals: 1,
            }],
            camera: CameraSnapshot {
                position: Point3D::new(250.0, 400.0, 600.0),
                focus: Point3D::new(250.0, 0.0, 0.0),
                target_focus_x: -250.0,
                context: RouteContext::Signup,
            },
            viewport: (1280, 720),
        }
    }

    #[test]
    fn test_snapshot_id_format() {
        assert_eq!(generate_snapshot_id(7), "snap_000007");
        assert_eq!(generate_snapshot_id(123456), "snap_123456");
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let snapshot = sample();
        let json = snapshot.to_json().unwrap();
        assert!(json.contains(r#""phase": "running""#));
        assert!(json.contains(r#""context": "signup""#));

        let parsed: SceneSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_all_finite() {
        let mut snapshot = sample();
        assert!(snapshot.all_finite());

        snapshot.agents[0].heading = f32::NAN;
        assert!(!snapshot.all_finite());
    }
}
