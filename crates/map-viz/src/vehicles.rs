//! Vehicle rendering: copies agent poses and the cube spin from the latest
//! frame onto entity transforms.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::backend::VehiclePose;
use crate::runner::{MapRunner, MapSet};
use crate::world::{ground_point, DataCubeRoot};

/// Plugin for vehicle and cube motion.
pub struct VehiclePlugin;

impl Plugin for VehiclePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (sync_vehicles, spin_data_cube).in_set(MapSet::Present),
        );
    }
}

/// Links a rendered vehicle to its agent.
#[derive(Component, Debug, Clone, Copy)]
pub struct VehicleMarker {
    pub agent_id: u32,
}

/// Rotation that points a vehicle's local +x along `heading`.
///
/// Headings are measured from +x toward +z on the ground plane.
pub fn heading_rotation(heading: f32) -> Quat {
    Quat::from_rotation_y(-heading)
}

pub fn vehicle_transform(pose: &VehiclePose, current: &Transform) -> Transform {
    Transform {
        translation: ground_point(pose.position, current.translation.y),
        rotation: heading_rotation(pose.heading),
        scale: current.scale,
    }
}

fn sync_vehicles(runner: Res<MapRunner>, mut vehicles: Query<(&VehicleMarker, &mut Transform)>) {
    let Some(frame) = runner.scheduler.backend().latest_frame() else {
        return;
    };
    let poses: HashMap<u32, &VehiclePose> =
        frame.vehicles.iter().map(|p| (p.agent_id, p)).collect();

    for (marker, mut transform) in &mut vehicles {
        if let Some(pose) = poses.get(&marker.agent_id) {
            *transform = vehicle_transform(pose, &transform);
        }
    }
}

fn spin_data_cube(runner: Res<MapRunner>, mut cubes: Query<&mut Transform, With<DataCubeRoot>>) {
    let Some(frame) = runner.scheduler.backend().latest_frame() else {
        return;
    };
    for mut transform in &mut cubes {
        transform.rotation = Quat::from_rotation_y(frame.cube_rotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_events::Point2D;
    use std::f32::consts::FRAC_PI_2;

    fn heading_direction(heading: f32) -> Point2D {
        Point2D::new(heading.cos(), heading.sin())
    }

    #[test]
    fn test_heading_rotation_matches_direction() {
        for heading in [0.0, FRAC_PI_2, 2.0, -2.7] {
            let forward = heading_rotation(heading) * Vec3::X;
            let expected = heading_direction(heading);
            assert!((forward.x - expected.x).abs() < 1e-5, "heading {}", heading);
            assert!((forward.z - expected.z).abs() < 1e-5, "heading {}", heading);
            assert!(forward.y.abs() < 1e-5);
        }
    }

    #[test]
    fn test_vehicle_transform_keeps_height() {
        let current = Transform::from_xyz(0.0, 1.75, 0.0);
        let pose = VehiclePose {
            agent_id: 3,
            position: Point2D::new(120.0, -40.0),
            heading: 0.0,
        };
        let next = vehicle_transform(&pose, &current);
        assert_eq!(next.translation, Vec3::new(120.0, 1.75, -40.0));
    }
}
