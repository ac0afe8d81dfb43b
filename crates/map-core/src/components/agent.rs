//! Agent Components
//!
//! Vehicles that roam the map between parking lots.

use map_events::{AgentSnapshot, ParkingLocation, Point2D};

/// A steering agent.
///
/// `target` is an index into the world's parking locations; the agent never
/// owns the location it is heading to.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: u32,
    pub position: Point2D,
    /// Facing angle, `atan2(dir.z, dir.x)` of the last movement.
    pub heading: f32,
    pub target: Option<usize>,
    /// Distance covered per tick; fixed at spawn.
    pub speed: f32,
    /// Completed trips.
    pub arrivals: u32,
}

impl Agent {
    pub fn new(id: u32, position: Point2D, heading: f32, speed: f32) -> Self {
        Self {
            id,
            position,
            heading,
            target: None,
            speed,
            arrivals: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.target.is_none()
    }

    /// Resolves the target index against the parking list.
    pub fn target_location<'a>(
        &self,
        parking_locations: &'a [ParkingLocation],
    ) -> Option<&'a ParkingLocation> {
        self.target.and_then(|i| parking_locations.get(i))
    }

    pub fn snapshot(&self, parking_locations: &[ParkingLocation]) -> AgentSnapshot {
        AgentSnapshot {
            agent_id: self.id,
            position: self.position,
            heading: self.heading,
            speed: self.speed,
            target: self.target_location(parking_locations).map(|p| p.id),
            arrivals: self.arrivals,
        }
    }
}
