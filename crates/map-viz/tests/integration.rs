//! Integration tests for the renderer's non-graphical parts: the Bevy
//! backend under the scheduler, route files, and the route watcher plugin
//! in a windowless app.

use std::fs;
use std::path::Path;
use std::time::Duration;

use bevy::app::AppExit;
use bevy::render::texture::ImageLoader;
use bevy::window::WindowResized;
use map_core::assets::fallback_color;
use map_core::{
    FrameScheduler, MapConfig, NullAssetLoader, ResourceHandle, ResourceKind, SceneBuilder,
};
use map_events::{fixtures, LifecyclePhase, RouteContext};
use map_viz::backend::Drawable;
use map_viz::route_watcher::{read_route, RouteSource, RouteWatcherPlugin};
use map_viz::runner::MapRunnerPlugin;
use map_viz::world::{srgba, MaterialCache, SceneEntities, WorldPlugin};
use map_viz::{BevyBackend, MapRunner, MapSettings};

use bevy::prelude::*;

const DT: f32 = 1.0 / 60.0;

fn started() -> FrameScheduler<BevyBackend> {
    let mut scheduler = FrameScheduler::new(MapConfig::default().scheduler, BevyBackend::new());
    let builder =
        SceneBuilder::new(MapConfig::default(), 42).with_dataset(fixtures::sample_dataset());
    scheduler.start(&builder, &NullAssetLoader).unwrap();
    scheduler
}

#[test]
fn test_backend_spawns_and_releases_everything() {
    let mut scheduler = started();
    let spawns = scheduler.backend_mut().take_spawns();
    assert!(!spawns.is_empty());

    let cube = spawns
        .iter()
        .find_map(|s| match &s.drawable {
            Drawable::Cube { faces, .. } => Some(faces.clone()),
            _ => None,
        })
        .expect("cube is queued");
    assert_eq!(cube[0].1.lot_id(), Some("lot-harbor"));

    scheduler.stop();
    let released: Vec<ResourceHandle> = scheduler.backend_mut().take_releases();
    for spawn in &spawns {
        assert!(released.contains(&spawn.handle), "{:?} not released", spawn);
    }
}

#[test]
fn test_frames_reach_backend() {
    let mut scheduler = started();
    assert!(scheduler.backend().latest_frame().is_none());

    for _ in 0..10 {
        scheduler.frame(DT).unwrap();
    }
    let agents = scheduler.scene().unwrap().sim.navigation.agents().len();
    let frame = scheduler.backend().latest_frame().unwrap();
    assert_eq!(frame.tick, 10);
    assert_eq!(frame.vehicles.len(), agents);
    assert!(frame.vehicles.iter().all(|v| v.position.is_finite()));

    scheduler.stop();
    assert!(scheduler.backend().latest_frame().is_none());
}

#[test]
fn test_resize_reaches_backend() {
    let mut scheduler = started();
    scheduler.on_resize(1600, 400);
    let projection = scheduler.backend().projection().unwrap();
    assert!((projection.aspect - 4.0).abs() < 1e-6);
    assert_eq!(scheduler.backend().viewport().unwrap().width, 1600);
}

#[test]
fn test_failed_start_queues_nothing() {
    let mut settings = MapSettings::default();
    settings.config.world.parking_lot_count = 0;
    let mut runner = MapRunner::new(&settings.config);

    assert!(!runner.start(&settings));
    assert_eq!(runner.scheduler.phase(), LifecyclePhase::Failed);
    assert_eq!(runner.scheduler.backend().pending_spawns(), 0);
}

#[test]
fn test_read_route() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("route.txt");

    assert_eq!(read_route(&path), None);

    fs::write(&path, "\n   signup  \nlogin\n").unwrap();
    assert_eq!(read_route(&path).as_deref(), Some("signup"));

    fs::write(&path, "  \n").unwrap();
    assert_eq!(read_route(&path), None);
}

#[test]
fn test_route_file_drives_camera_in_app() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("route.txt");
    fs::write(&path, "/signup\n").unwrap();

    let settings = MapSettings::default();
    let mut runner = MapRunner::new(&settings.config);
    assert!(runner.start(&settings));

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(runner)
        .insert_resource(RouteSource::new(&path))
        .add_plugins(RouteWatcherPlugin);
    app.update();

    let runner = app.world().resource::<MapRunner>();
    let camera = &runner.scheduler.scene().unwrap().sim.camera;
    assert_eq!(camera.context(), RouteContext::Signup);
    assert_eq!(
        app.world().resource::<RouteSource>().last_route.as_deref(),
        Some("/signup")
    );
}

/// Windowless app running the scene and world spawning against `asset_root`.
fn world_app(settings: MapSettings, asset_root: &Path) -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        AssetPlugin {
            file_path: asset_root.display().to_string(),
            ..default()
        },
    ))
    .init_asset::<Mesh>()
    .init_asset::<Image>()
    .init_asset::<StandardMaterial>()
    .init_asset_loader::<ImageLoader>() // no RenderDevice here, so CompressedImageFormats::NONE
    .add_event::<WindowResized>()
    .insert_resource(settings)
    .add_plugins((MapRunnerPlugin, WorldPlugin));
    app
}

#[test]
fn test_materials_are_scene_resources() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = MapSettings::default();
    settings.config.assets.root = dir.path().display().to_string();
    let mut app = world_app(settings, dir.path());
    app.update();

    let cached = app.world().resource::<MaterialCache>().len();
    assert!(cached > 0);
    let runner = app.world().resource::<MapRunner>();
    let arena = &runner.scheduler.scene().unwrap().resources;
    assert_eq!(arena.count_by_kind(ResourceKind::Material), cached);
    let ground = app.world().resource::<MaterialCache>().handle("ground").unwrap();
    assert!(arena.is_live(ground));

    app.world_mut().send_event(AppExit::Success);
    app.update();

    assert!(app.world().resource::<MaterialCache>().is_empty());
    assert!(app.world().resource::<SceneEntities>().by_handle.is_empty());
    assert_eq!(
        app.world().resource::<MapRunner>().scheduler.phase(),
        LifecyclePhase::Stopped
    );
}

#[test]
fn test_corrupt_texture_gets_fallback_color() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("asphalt.png"), b"not really a png").unwrap();

    let mut settings = MapSettings::default();
    settings.config.assets.root = dir.path().display().to_string();
    settings.config.assets.textures.clear();
    settings.config.assets.fonts.clear();
    settings
        .config
        .assets
        .textures
        .insert("asphalt".into(), "asphalt.png".into());
    let mut app = world_app(settings, dir.path());
    app.update();
    assert_eq!(app.world().resource::<MaterialCache>().pending_textures(), 1);

    for _ in 0..400 {
        if app.world().resource::<MaterialCache>().pending_textures() == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
        app.update();
    }
    assert_eq!(app.world().resource::<MaterialCache>().pending_textures(), 0);

    let handle = app
        .world()
        .resource::<MaterialCache>()
        .get("asphalt")
        .unwrap()
        .clone();
    let material = app
        .world()
        .resource::<Assets<StandardMaterial>>()
        .get(&handle)
        .unwrap();
    assert!(material.base_color_texture.is_none());
    assert_eq!(material.base_color, srgba(fallback_color("asphalt")));
}
