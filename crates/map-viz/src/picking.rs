//! Data cube picking: a click on a lot face asks the host to navigate there.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use map_events::{NavigationRequest, Point3D};

use crate::camera::MainCamera;
use crate::runner::{MapRunner, MapSet};

/// Plugin for cube face selection.
pub struct PickingPlugin;

impl Plugin for PickingPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<NavigationRequested>().add_systems(
            Update,
            (pick_on_click, report_navigation)
                .chain()
                .after(MapSet::Present),
        );
    }
}

/// A lot face was clicked.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequested(pub NavigationRequest);

/// Picking ray in scene coordinates.
pub fn ray_points(ray: Ray3d) -> (Point3D, Point3D) {
    let direction = *ray.direction;
    (
        Point3D::new(ray.origin.x, ray.origin.y, ray.origin.z),
        Point3D::new(direction.x, direction.y, direction.z),
    )
}

fn pick_on_click(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    runner: Res<MapRunner>,
    mut requests: EventWriter<NavigationRequested>,
) {
    if !buttons.just_pressed(MouseButton::Left) || !runner.is_running() {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.get_single() else {
        return;
    };
    let Some(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };
    let Some(scene) = runner.scheduler.scene() else {
        return;
    };

    let (origin, direction) = ray_points(ray);
    if let Some(request) = scene.cube.pick(origin, direction) {
        requests.send(NavigationRequested(request));
    }
}

/// Hands navigation requests to the host as one JSON line on stdout.
fn report_navigation(mut requests: EventReader<NavigationRequested>) {
    for NavigationRequested(request) in requests.read() {
        tracing::info!("Navigation requested: {}", request);
        match serde_json::to_string(request) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Could not encode navigation request: {}", e),
        }
    }
}
