//! World Types
//!
//! Static scene content produced once at build time: obstacles, parking
//! locations, traffic props, and the presentational layout of each lot.
//!
//! Nothing in here moves after the world is built.

use serde::{Deserialize, Serialize};

use crate::Point2D;

/// Static circular exclusion zone. Agents are pushed away from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub z: f32,
    pub radius: f32,
}

impl Obstacle {
    pub fn new(x: f32, z: f32, radius: f32) -> Self {
        Self { x, z, radius }
    }

    /// Center of the obstacle on the ground plane.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.x, self.z)
    }
}

/// A target point agents navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParkingLocation {
    pub id: u32,
    pub x: f32,
    pub z: f32,
}

impl ParkingLocation {
    pub fn new(id: u32, x: f32, z: f32) -> Self {
        Self { id, x, z }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.z)
    }
}

/// Kind of roadside prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKind {
    TrafficLight,
    StopSign,
    YieldSign,
}

impl PropKind {
    /// Returns all prop variants.
    pub fn all() -> &'static [PropKind] {
        &[PropKind::TrafficLight, PropKind::StopSign, PropKind::YieldSign]
    }

    /// Returns true for the sign variants.
    pub fn is_sign(self) -> bool {
        matches!(self, PropKind::StopSign | PropKind::YieldSign)
    }
}

/// A decorative prop placed on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub kind: PropKind,
    pub x: f32,
    pub z: f32,
    /// Rotation around the vertical axis, in radians.
    pub rotation: f32,
}

/// Axis-aligned rectangle on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundRect {
    pub center: Point2D,
    pub width: f32,
    pub depth: f32,
}

impl GroundRect {
    pub fn contains(&self, point: Point2D) -> bool {
        (point.x - self.center.x).abs() <= self.width / 2.0
            && (point.z - self.center.z).abs() <= self.depth / 2.0
    }
}

/// A painted line segment on the asphalt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StallLine {
    pub start: Point2D,
    pub end: Point2D,
}

/// Presentational layout of one parking lot. Not part of the navigable data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotLayout {
    /// The parking location this layout decorates.
    pub location_id: u32,
    pub asphalt: GroundRect,
    pub stall_lines: Vec<StallLine>,
    /// Foot of the sign pole.
    pub sign_post: Point2D,
    pub sign_height: f32,
}

/// Everything the world builder produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldData {
    pub obstacles: Vec<Obstacle>,
    pub parking_locations: Vec<ParkingLocation>,
    #[serde(default)]
    pub props: Vec<Prop>,
    #[serde(default)]
    pub lot_layouts: Vec<LotLayout>,
}

impl WorldData {
    /// Looks up a parking location by id.
    pub fn parking_location(&self, id: u32) -> Option<&ParkingLocation> {
        self.parking_locations.iter().find(|p| p.id == id)
    }

    /// Layout belonging to a parking location.
    pub fn layout_for(&self, id: u32) -> Option<&LotLayout> {
        self.lot_layouts.iter().find(|l| l.location_id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty() && self.parking_locations.is_empty() && self.props.is_empty()
    }

    /// Serializes the world as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
