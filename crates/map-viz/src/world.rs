//! World rendering: ground, buildings, parking lots, props, and the data cube.
//!
//! Turns the backend's spawn queue into entities and despawns whatever the
//! scheduler released.

use bevy::asset::LoadState;
use bevy::prelude::*;
use std::collections::HashMap;

use map_core::assets::{fallback_color, AssetCatalog};
use map_core::{ResourceArena, ResourceHandle, ResourceKind};
use map_events::{CubeFace, FaceContent, Point2D, Point3D, PropKind, StallLine};

use crate::backend::{surface_for, Drawable, SpawnRequest, Surface};
use crate::runner::{stop_on_exit, MapRunner, MapSet};

/// Height of buildings relative to their footprint radius.
const BUILDING_HEIGHT_FACTOR: f32 = 2.5;
const STALL_LINE_WIDTH: f32 = 0.4;
const PAINT_HEIGHT: f32 = 0.25;
const ASPHALT_HEIGHT: f32 = 0.2;
const POLE_RADIUS: f32 = 0.3;
const SIGN_PANEL: f32 = 4.0;
const VEHICLE_SIZE: (f32, f32, f32) = (9.0, 3.5, 4.5);
/// Gap between the cube body and its face panels.
const PANEL_OFFSET: f32 = 0.05;

/// Plugin for world rendering.
pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneEntities>()
            .init_resource::<MaterialCache>()
            .insert_resource(AmbientLight {
                color: Color::WHITE,
                brightness: 300.0,
            })
            .add_systems(Startup, spawn_lighting)
            .add_systems(Update, spawn_pending.in_set(MapSet::Spawn))
            .add_systems(
                Update,
                (fallback_failed_textures, despawn_released).in_set(MapSet::Present),
            )
            .add_systems(Last, despawn_released.after(stop_on_exit));
    }
}

/// Entities spawned for each scene resource.
#[derive(Resource, Default, Debug)]
pub struct SceneEntities {
    pub by_handle: HashMap<ResourceHandle, Entity>,
}

/// Shared materials, keyed by what they show. Each one is registered in the
/// scene's resource arena and dropped when its handle is released.
#[derive(Resource, Default)]
pub struct MaterialCache {
    by_key: HashMap<String, CachedMaterial>,
    /// Textured materials whose image has not finished loading.
    pending: Vec<PendingTexture>,
}

struct CachedMaterial {
    handle: ResourceHandle,
    material: Handle<StandardMaterial>,
}

struct PendingTexture {
    key: String,
    image: Handle<Image>,
    material: Handle<StandardMaterial>,
}

impl MaterialCache {
    fn get_or_add(
        &mut self,
        key: &str,
        surface: Surface,
        arena: &mut ResourceArena,
        materials: &mut Assets<StandardMaterial>,
        asset_server: &AssetServer,
    ) -> Handle<StandardMaterial> {
        if let Some(cached) = self.by_key.get(key) {
            return cached.material.clone();
        }

        let material = match surface {
            Surface::Texture(path) => {
                let image: Handle<Image> = asset_server.load(path);
                let material = materials.add(StandardMaterial {
                    base_color_texture: Some(image.clone()),
                    perceptual_roughness: 0.9,
                    ..default()
                });
                self.pending.push(PendingTexture {
                    key: key.to_string(),
                    image,
                    material: material.clone(),
                });
                material
            }
            Surface::Color(color) => materials.add(solid_material(color)),
        };
        let handle = arena.register(ResourceKind::Material, format!("material-{}", key));
        self.by_key.insert(
            key.to_string(),
            CachedMaterial {
                handle,
                material: material.clone(),
            },
        );
        material
    }

    /// Forget the material registered under `handle`. Returns false if the
    /// handle is not a cached material.
    fn release(&mut self, handle: ResourceHandle) -> bool {
        let Some(key) = self
            .by_key
            .iter()
            .find(|(_, cached)| cached.handle == handle)
            .map(|(key, _)| key.clone())
        else {
            return false;
        };
        self.by_key.remove(&key);
        self.pending.retain(|p| p.key != key);
        true
    }

    pub fn get(&self, key: &str) -> Option<&Handle<StandardMaterial>> {
        self.by_key.get(key).map(|cached| &cached.material)
    }

    pub fn handle(&self, key: &str) -> Option<ResourceHandle> {
        self.by_key.get(key).map(|cached| cached.handle)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn pending_textures(&self) -> usize {
        self.pending.len()
    }
}

/// Marks an entity that belongs to the generated scene.
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneEntity {
    pub handle: ResourceHandle,
}

/// Root of the data cube; its rotation follows the cube spin.
#[derive(Component, Debug)]
pub struct DataCubeRoot;

/// One labelled side of the data cube.
#[derive(Component, Debug, Clone, Copy)]
pub struct CubeFacePanel {
    pub face: CubeFace,
}

pub fn srgba(color: [u8; 4]) -> Color {
    Color::srgba_u8(color[0], color[1], color[2], color[3])
}

fn solid_material(color: [u8; 4]) -> StandardMaterial {
    StandardMaterial {
        base_color: srgba(color),
        perceptual_roughness: 0.9,
        ..default()
    }
}

/// Ground-plane point lifted to height `y`.
pub fn ground_point(point: Point2D, y: f32) -> Vec3 {
    Vec3::new(point.x, y, point.z)
}

pub fn to_vec3(point: Point3D) -> Vec3 {
    Vec3::new(point.x, point.y, point.z)
}

/// Transform and length of a thin box lying along a painted line.
pub fn stall_line_transform(line: &StallLine) -> (Transform, f32) {
    let dx = line.end.x - line.start.x;
    let dz = line.end.z - line.start.z;
    let length = (dx * dx + dz * dz).sqrt();
    let mid = Point2D::new(line.start.x + dx / 2.0, line.start.z + dz / 2.0);
    let transform = Transform::from_translation(ground_point(mid, PAINT_HEIGHT))
        .with_rotation(Quat::from_rotation_y(-dz.atan2(dx)));
    (transform, length)
}

/// Center offset and box size of the panel on one cube face.
pub fn face_panel(face: CubeFace, half_size: f32) -> (Vec3, Vec3) {
    let (nx, ny, nz) = face.normal();
    let normal = Vec3::new(nx, ny, nz);
    let side = half_size * 2.0 * 0.9;
    let thin = 0.1;
    let size = Vec3::new(
        if nx != 0.0 { thin } else { side },
        if ny != 0.0 { thin } else { side },
        if nz != 0.0 { thin } else { side },
    );
    (normal * (half_size + PANEL_OFFSET), size)
}

fn face_surface(catalog: &AssetCatalog, content: &FaceContent) -> (String, Surface) {
    match content {
        FaceContent::Lot { record } => (
            format!("lot:{}", record.id),
            Surface::Color(fallback_color(&record.id)),
        ),
        FaceContent::NoData => ("no-data".into(), Surface::Color([200, 200, 205, 255])),
        FaceContent::Brand => ("logo".into(), surface_for(catalog, "logo")),
    }
}

fn spawn_lighting(mut commands: Commands) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_xyz(300.0, 600.0, 200.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
}

fn spawn_pending(
    mut commands: Commands,
    mut runner: ResMut<MapRunner>,
    mut entities: ResMut<SceneEntities>,
    mut cache: ResMut<MaterialCache>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    asset_server: Res<AssetServer>,
) {
    let requests = runner.scheduler.backend_mut().take_spawns();
    if requests.is_empty() {
        return;
    }
    let Some(scene) = runner.scheduler.scene_mut() else {
        return;
    };

    let mut ctx = SpawnContext {
        catalog: &scene.assets,
        arena: &mut scene.resources,
        cache: &mut cache,
        meshes: &mut meshes,
        materials: &mut materials,
        asset_server: &asset_server,
    };
    for request in &requests {
        let entity = spawn_drawable(&mut commands, &mut ctx, request);
        entities.by_handle.insert(request.handle, entity);
    }
    tracing::info!("Spawned {} scene objects", requests.len());
}

struct SpawnContext<'a> {
    catalog: &'a AssetCatalog,
    arena: &'a mut ResourceArena,
    cache: &'a mut MaterialCache,
    meshes: &'a mut Assets<Mesh>,
    materials: &'a mut Assets<StandardMaterial>,
    asset_server: &'a AssetServer,
}

impl SpawnContext<'_> {
    fn material(&mut self, key: &str, surface: Surface) -> Handle<StandardMaterial> {
        self.cache
            .get_or_add(key, surface, self.arena, self.materials, self.asset_server)
    }

    fn catalog_material(&mut self, key: &str) -> Handle<StandardMaterial> {
        let surface = surface_for(self.catalog, key);
        self.material(key, surface)
    }

    fn pbr(&mut self, mesh: Mesh, material: Handle<StandardMaterial>, transform: Transform) -> PbrBundle {
        PbrBundle {
            mesh: self.meshes.add(mesh),
            material,
            transform,
            ..default()
        }
    }
}

fn spawn_drawable(commands: &mut Commands, ctx: &mut SpawnContext<'_>, request: &SpawnRequest) -> Entity {
    let marker = SceneEntity {
        handle: request.handle,
    };

    match &request.drawable {
        Drawable::Ground { half_width } => {
            let material = ctx.material("ground", Surface::Color([196, 202, 190, 255]));
            let size = half_width * 2.0;
            let bundle = ctx.pbr(
                Plane3d::default().mesh().size(size, size).into(),
                material,
                Transform::IDENTITY,
            );
            commands.spawn((bundle, marker)).id()
        }
        Drawable::Obstacle(obstacle) => {
            let material = ctx.material("building", Surface::Color([218, 220, 226, 255]));
            let height = obstacle.radius * BUILDING_HEIGHT_FACTOR;
            let side = obstacle.radius * 2.0;
            let bundle = ctx.pbr(
                Cuboid::new(side, height, side).into(),
                material,
                Transform::from_translation(ground_point(obstacle.center(), height / 2.0)),
            );
            commands.spawn((bundle, marker)).id()
        }
        Drawable::Asphalt(rect) => {
            let material = ctx.catalog_material("asphalt");
            let bundle = ctx.pbr(
                Cuboid::new(rect.width, ASPHALT_HEIGHT, rect.depth).into(),
                material,
                Transform::from_translation(ground_point(rect.center, ASPHALT_HEIGHT / 2.0)),
            );
            commands.spawn((bundle, marker)).id()
        }
        Drawable::StallLine(line) => {
            let material = ctx.material("paint", Surface::Color([245, 245, 240, 255]));
            let (transform, length) = stall_line_transform(line);
            let bundle = ctx.pbr(
                Cuboid::new(length, 0.05, STALL_LINE_WIDTH).into(),
                material,
                transform,
            );
            commands.spawn((bundle, marker)).id()
        }
        Drawable::ParkingSign { foot, height } => {
            spawn_sign(commands, ctx, marker, *foot, *height, 0.0, "parking_sign")
        }
        Drawable::Prop(prop) => {
            let foot = Point2D::new(prop.x, prop.z);
            match prop.kind {
                PropKind::StopSign => {
                    spawn_sign(commands, ctx, marker, foot, 10.0, prop.rotation, "stop_sign")
                }
                PropKind::YieldSign => {
                    spawn_sign(commands, ctx, marker, foot, 10.0, prop.rotation, "yield_sign")
                }
                PropKind::TrafficLight => {
                    let material = ctx.material("traffic-light", Surface::Color([40, 42, 48, 255]));
                    let bundle = ctx.pbr(
                        Cuboid::new(1.2, 14.0, 1.2).into(),
                        material,
                        Transform::from_translation(ground_point(foot, 7.0))
                            .with_rotation(Quat::from_rotation_y(prop.rotation)),
                    );
                    commands.spawn((bundle, marker)).id()
                }
            }
        }
        Drawable::Vehicle { agent_id } => {
            let key = format!("vehicle-{}", agent_id);
            let material = ctx.material(&key, Surface::Color(fallback_color(&key)));
            let (length, height, width) = VEHICLE_SIZE;
            let bundle = ctx.pbr(
                Cuboid::new(length, height, width).into(),
                material,
                Transform::from_xyz(0.0, height / 2.0, 0.0),
            );
            commands
                .spawn((
                    bundle,
                    marker,
                    crate::vehicles::VehicleMarker {
                        agent_id: *agent_id,
                    },
                ))
                .id()
        }
        Drawable::Cube {
            center,
            half_size,
            faces,
        } => {
            let body_material = ctx.material("cube", Surface::Color([52, 58, 72, 255]));
            let size = half_size * 2.0;
            let body = ctx.pbr(
                Cuboid::new(size, size, size).into(),
                body_material,
                Transform::from_translation(to_vec3(*center)),
            );

            let panels: Vec<(CubeFace, PbrBundle)> = faces
                .iter()
                .map(|(face, content)| {
                    let (key, surface) = face_surface(ctx.catalog, content);
                    let material = ctx.material(&key, surface);
                    let (offset, panel_size) = face_panel(*face, *half_size);
                    let bundle = ctx.pbr(
                        Cuboid::new(panel_size.x, panel_size.y, panel_size.z).into(),
                        material,
                        Transform::from_translation(offset),
                    );
                    (*face, bundle)
                })
                .collect();

            commands
                .spawn((body, marker, DataCubeRoot))
                .with_children(|parent| {
                    for (face, bundle) in panels {
                        parent.spawn((bundle, CubeFacePanel { face }));
                    }
                })
                .id()
        }
    }
}

fn spawn_sign(
    commands: &mut Commands,
    ctx: &mut SpawnContext<'_>,
    marker: SceneEntity,
    foot: Point2D,
    height: f32,
    rotation: f32,
    texture_key: &str,
) -> Entity {
    let pole_material = ctx.material("pole", Surface::Color([120, 124, 130, 255]));
    let panel_material = ctx.catalog_material(texture_key);

    let pole = ctx.pbr(
        Cylinder::new(POLE_RADIUS, height).into(),
        pole_material,
        Transform::from_translation(ground_point(foot, height / 2.0))
            .with_rotation(Quat::from_rotation_y(rotation)),
    );
    let panel = ctx.pbr(
        Cuboid::new(SIGN_PANEL, SIGN_PANEL, 0.2).into(),
        panel_material,
        Transform::from_xyz(0.0, height / 2.0, POLE_RADIUS + 0.1),
    );

    commands
        .spawn((pole, marker))
        .with_children(|parent| {
            parent.spawn(panel);
        })
        .id()
}

/// Swap textures that failed to load or decode for the key's fallback colour.
fn fallback_failed_textures(
    asset_server: Res<AssetServer>,
    mut cache: ResMut<MaterialCache>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if cache.pending.is_empty() {
        return;
    }
    cache.pending.retain(|texture| match asset_server.load_state(&texture.image) {
        LoadState::Failed(error) => {
            let color = fallback_color(&texture.key);
            tracing::warn!(
                "Texture '{}' failed to load ({}); using fallback colour {:?}",
                texture.key,
                error,
                color
            );
            if let Some(material) = materials.get_mut(&texture.material) {
                *material = solid_material(color);
            }
            false
        }
        LoadState::Loaded => false,
        _ => true,
    });
}

fn despawn_released(
    mut commands: Commands,
    mut runner: ResMut<MapRunner>,
    mut entities: ResMut<SceneEntities>,
    mut cache: ResMut<MaterialCache>,
) {
    let released = runner.scheduler.backend_mut().take_releases();
    if released.is_empty() {
        return;
    }

    let mut despawned = 0;
    let mut dropped_materials = 0;
    for handle in released {
        if let Some(entity) = entities.by_handle.remove(&handle) {
            commands.entity(entity).despawn_recursive();
            despawned += 1;
        } else if cache.release(handle) {
            dropped_materials += 1;
        }
    }
    tracing::info!(
        "Despawned {} scene objects, dropped {} materials",
        despawned,
        dropped_materials
    );
}
