//! Data Cube
//!
//! A slowly spinning cube hovering over the map center. The four side faces
//! show parking lots from the dataset; top and bottom carry branding.
//! Clicking a lot face produces a [`NavigationRequest`] for the host.

use std::f32::consts::TAU;

use map_events::{decorate_faces, CubeFace, FaceContent, NavigationRequest, ParkingLotRecord, Point3D};

use crate::config::WorldConfig;

const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct DataCube {
    pub center: Point3D,
    pub half_size: f32,
    /// Rotation about the vertical axis, radians in `[0, TAU)`.
    pub rotation: f32,
    pub spin_per_tick: f32,
    faces: Vec<(CubeFace, FaceContent)>,
}

impl DataCube {
    pub fn new(config: &WorldConfig, dataset: Option<&[ParkingLotRecord]>) -> Self {
        Self {
            center: Point3D::new(0.0, config.cube_height, 0.0),
            half_size: config.cube_half_size,
            rotation: 0.0,
            spin_per_tick: config.cube_spin_per_tick,
            faces: decorate_faces(dataset),
        }
    }

    pub fn faces(&self) -> &[(CubeFace, FaceContent)] {
        &self.faces
    }

    pub fn face_content(&self, face: CubeFace) -> Option<&FaceContent> {
        self.faces.iter().find(|(f, _)| *f == face).map(|(_, c)| c)
    }

    pub fn advance_spin(&mut self) {
        self.rotation = (self.rotation + self.spin_per_tick).rem_euclid(TAU);
    }

    /// Into the cube's local frame: centered and un-spun.
    fn to_local(&self, v: Point3D) -> [f32; 3] {
        let (s, c) = self.rotation.sin_cos();
        [c * v.x - s * v.z, v.y, s * v.x + c * v.z]
    }

    /// The face a ray enters first, or `None` if it misses or starts inside.
    ///
    /// Uses the slab test against the cube in its local frame, so the spin is
    /// accounted for.
    pub fn pick_face(&self, origin: Point3D, direction: Point3D) -> Option<CubeFace> {
        let o = self.to_local(Point3D::new(
            origin.x - self.center.x,
            origin.y - self.center.y,
            origin.z - self.center.z,
        ));
        let d = self.to_local(direction);
        let h = self.half_size;

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut entry: Option<(usize, bool)> = None;

        for axis in 0..3 {
            if d[axis].abs() < PARALLEL_EPSILON {
                if o[axis] < -h || o[axis] > h {
                    return None;
                }
                continue;
            }

            let t_neg = (-h - o[axis]) / d[axis];
            let t_pos = (h - o[axis]) / d[axis];
            // Moving toward +axis enters through the negative face.
            let (near, far, positive_face) = if d[axis] > 0.0 {
                (t_neg, t_pos, false)
            } else {
                (t_pos, t_neg, true)
            };

            if near > t_enter {
                t_enter = near;
                entry = Some((axis, positive_face));
            }
            t_exit = t_exit.min(far);
            if t_enter > t_exit {
                return None;
            }
        }

        if t_enter < 0.0 || !t_enter.is_finite() {
            return None;
        }

        entry.map(|(axis, positive)| match (axis, positive) {
            (0, true) => CubeFace::Right,
            (0, false) => CubeFace::Left,
            (1, true) => CubeFace::Top,
            (1, false) => CubeFace::Bottom,
            (_, true) => CubeFace::Front,
            (_, false) => CubeFace::Back,
        })
    }

    /// Navigation request for a lot face; other faces select nothing.
    pub fn select(&self, face: CubeFace) -> Option<NavigationRequest> {
        let target = self.face_content(face)?.lot_id()?;
        let request = NavigationRequest::new(target);
        tracing::info!("Cube face {:?} selected: {}", face, request);
        Some(request)
    }

    pub fn pick(&self, origin: Point3D, direction: Point3D) -> Option<NavigationRequest> {
        self.pick_face(origin, direction)
            .and_then(|face| self.select(face))
    }
}
