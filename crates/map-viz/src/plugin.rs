//! Main visualization plugin that ties all systems together.

use bevy::prelude::*;

use crate::camera::CameraPlugin;
use crate::picking::PickingPlugin;
use crate::route_watcher::RouteWatcherPlugin;
use crate::runner::{MapRunnerPlugin, MapSettings};
use crate::vehicles::VehiclePlugin;
use crate::world::WorldPlugin;

/// Main plugin for the living map.
///
/// Sets up the window and asset root from the settings, then adds the
/// runner and the rendering sub-plugins.
pub struct LivingMapPlugin {
    pub settings: MapSettings,
}

impl Plugin for LivingMapPlugin {
    fn build(&self, app: &mut App) {
        let scheduler = &self.settings.config.scheduler;
        app.add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Living Map".into(),
                        resolution: (
                            scheduler.initial_width as f32,
                            scheduler.initial_height as f32,
                        )
                            .into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: self.settings.config.assets.root.clone(),
                    ..default()
                }),
        )
        .insert_resource(self.settings.clone())
        .add_plugins((
            MapRunnerPlugin,
            WorldPlugin,
            VehiclePlugin,
            CameraPlugin,
            RouteWatcherPlugin,
            PickingPlugin,
        ));
    }
}
