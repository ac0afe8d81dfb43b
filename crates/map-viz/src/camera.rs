//! Camera system: follows the transition controller and applies the
//! scheduler's projection.

use bevy::prelude::*;
use bevy::render::camera::Projection as CameraProjection;

use map_core::{CameraState, Projection};

use crate::route_watcher::RouteChanged;
use crate::runner::{MapRunner, MapSet};
use crate::world::to_vec3;

/// Plugin for camera placement.
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera).add_systems(
            Update,
            (
                handle_route_keys.before(MapSet::Simulate),
                (apply_camera_state, apply_projection).in_set(MapSet::Present),
            ),
        );
    }
}

/// Marker component for the main camera.
#[derive(Component)]
pub struct MainCamera;

/// Camera transform for a controller state: at `position`, looking at `focus`.
pub fn camera_transform(state: &CameraState) -> Transform {
    Transform::from_translation(to_vec3(state.position)).looking_at(to_vec3(state.focus), Vec3::Y)
}

pub fn perspective(projection: &Projection) -> PerspectiveProjection {
    PerspectiveProjection {
        fov: projection.fov_degrees.to_radians(),
        aspect_ratio: projection.aspect,
        near: projection.near,
        far: projection.far,
    }
}

fn setup_camera(mut commands: Commands, runner: Res<MapRunner>) {
    let projection = runner.scheduler.projection();
    let transform = runner
        .scheduler
        .scene()
        .map(|scene| camera_transform(scene.sim.camera.state()))
        .unwrap_or_else(|| Transform::from_xyz(0.0, 400.0, 600.0).looking_at(Vec3::ZERO, Vec3::Y));

    commands.spawn((
        Camera3dBundle {
            transform,
            projection: CameraProjection::Perspective(perspective(projection)),
            ..default()
        },
        MainCamera,
    ));
}

fn apply_camera_state(
    runner: Res<MapRunner>,
    mut cameras: Query<&mut Transform, With<MainCamera>>,
) {
    let Some(frame) = runner.scheduler.backend().latest_frame() else {
        return;
    };
    for mut transform in &mut cameras {
        *transform = camera_transform(&frame.camera);
    }
}

/// True when the camera's projection differs from `wanted`, aspect included.
pub fn projection_outdated(current: &CameraProjection, wanted: &PerspectiveProjection) -> bool {
    match current {
        CameraProjection::Perspective(current) => {
            current.fov != wanted.fov
                || current.aspect_ratio != wanted.aspect_ratio
                || current.near != wanted.near
                || current.far != wanted.far
        }
        _ => true,
    }
}

fn apply_projection(
    runner: Res<MapRunner>,
    mut cameras: Query<&mut CameraProjection, With<MainCamera>>,
) {
    let Some(projection) = runner.scheduler.backend().projection() else {
        return;
    };
    let wanted = perspective(projection);
    for mut camera_projection in &mut cameras {
        if projection_outdated(&camera_projection, &wanted) {
            *camera_projection = CameraProjection::Perspective(wanted.clone());
        }
    }
}

/// Keyboard shortcuts for switching the framed route without a host app.
fn handle_route_keys(keys: Res<ButtonInput<KeyCode>>, mut routes: EventWriter<RouteChanged>) {
    let route = if keys.just_pressed(KeyCode::KeyS) {
        "signup"
    } else if keys.just_pressed(KeyCode::KeyL) {
        "login"
    } else if keys.just_pressed(KeyCode::KeyH) {
        "/"
    } else {
        return;
    };
    routes.send(RouteChanged {
        route: route.to_string(),
    });
}
