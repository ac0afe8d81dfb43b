//! Bevy render backend.
//!
//! The scheduler calls the backend outside of any Bevy system, so the backend
//! cannot touch the ECS directly. Instead it records what should exist
//! (spawn requests), what should go away (released handles), and the latest
//! frame. Bevy systems in [`crate::world`] and [`crate::vehicles`] drain
//! those queues every update.

use std::path::PathBuf;

use map_core::assets::{fallback_color, AssetCatalog, Fallback};
use map_core::scene::ResourceEntry;
use map_core::{
    BackendError, CameraState, FrameView, Projection, RenderBackend, ResourceHandle,
    ResourceKind, Scene, Viewport,
};
use map_events::{
    CubeFace, FaceContent, GroundRect, Obstacle, Point2D, Point3D, Prop, StallLine, WorldData,
};

/// Margin added around the outermost world content for the ground plane.
const GROUND_MARGIN: f32 = 100.0;

/// Something the world systems know how to turn into meshes.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Ground { half_width: f32 },
    Obstacle(Obstacle),
    Asphalt(GroundRect),
    StallLine(StallLine),
    ParkingSign { foot: Point2D, height: f32 },
    Prop(Prop),
    Vehicle { agent_id: u32 },
    Cube {
        center: Point3D,
        half_size: f32,
        faces: Vec<(CubeFace, FaceContent)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub handle: ResourceHandle,
    pub drawable: Drawable,
}

/// Where a material gets its colour from.
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    /// Loaded texture, relative to the asset root.
    Texture(PathBuf),
    /// RGBA colour.
    Color([u8; 4]),
}

/// Material source for a catalogue key, falling back to a solid colour.
pub fn surface_for(catalog: &AssetCatalog, key: &str) -> Surface {
    match catalog.get(key).map(|entry| (entry, entry.fallback())) {
        Some((entry, None)) => Surface::Texture(entry.path.clone()),
        Some((_, Some(Fallback::SolidColor(color)))) => Surface::Color(color),
        Some((_, Some(Fallback::PlaceholderGlyph(_)))) | None => {
            Surface::Color(fallback_color(key))
        }
    }
}

/// Half width of a ground plane that covers every placed object.
pub fn ground_half_width(world: &WorldData) -> f32 {
    let obstacles = world
        .obstacles
        .iter()
        .map(|o| o.x.abs().max(o.z.abs()) + o.radius);
    let lots = world
        .parking_locations
        .iter()
        .map(|p| p.x.abs().max(p.z.abs()));
    let props = world.props.iter().map(|p| p.x.abs().max(p.z.abs()));

    obstacles.chain(lots).chain(props).fold(0.0, f32::max) + GROUND_MARGIN
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehiclePose {
    pub agent_id: u32,
    pub position: Point2D,
    pub heading: f32,
}

/// Everything the presentation systems need from the most recent frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub tick: u64,
    pub vehicles: Vec<VehiclePose>,
    pub camera: CameraState,
    pub cube_rotation: f32,
}

#[derive(Debug, Default)]
pub struct BevyBackend {
    spawns: Vec<SpawnRequest>,
    releases: Vec<ResourceHandle>,
    viewport: Option<Viewport>,
    projection: Option<Projection>,
    frame: Option<FrameState>,
}

impl BevyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn requests recorded since the last call.
    pub fn take_spawns(&mut self) -> Vec<SpawnRequest> {
        std::mem::take(&mut self.spawns)
    }

    /// Handles released since the last call.
    pub fn take_releases(&mut self) -> Vec<ResourceHandle> {
        std::mem::take(&mut self.releases)
    }

    pub fn pending_spawns(&self) -> usize {
        self.spawns.len()
    }

    pub fn latest_frame(&self) -> Option<&FrameState> {
        self.frame.as_ref()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    fn queue(&mut self, scene: &mut Scene, label: String, drawable: Drawable) {
        let handle = scene.resources.register(ResourceKind::Geometry, label);
        self.spawns.push(SpawnRequest { handle, drawable });
    }
}

impl RenderBackend for BevyBackend {
    fn acquire(&mut self, scene: &mut Scene) -> Result<(), BackendError> {
        scene.resources.register(ResourceKind::RenderTarget, "window");
        scene.resources.register(ResourceKind::Listener, "resize");
        scene.resources.register(ResourceKind::Listener, "pointer");

        let world = scene.world.clone();
        let half_width = ground_half_width(&world);
        if !half_width.is_finite() {
            return Err(BackendError(format!(
                "ground extent is not finite ({})",
                half_width
            )));
        }
        self.queue(scene, "ground".into(), Drawable::Ground { half_width });

        for (i, obstacle) in world.obstacles.iter().enumerate() {
            self.queue(scene, format!("obstacle-{}", i), Drawable::Obstacle(*obstacle));
        }
        for layout in &world.lot_layouts {
            let id = layout.location_id;
            self.queue(scene, format!("asphalt-{}", id), Drawable::Asphalt(layout.asphalt));
            for (i, line) in layout.stall_lines.iter().enumerate() {
                self.queue(scene, format!("stall-{}-{}", id, i), Drawable::StallLine(*line));
            }
            self.queue(
                scene,
                format!("parking-sign-{}", id),
                Drawable::ParkingSign {
                    foot: layout.sign_post,
                    height: layout.sign_height,
                },
            );
        }
        for (i, prop) in world.props.iter().enumerate() {
            self.queue(scene, format!("prop-{}", i), Drawable::Prop(*prop));
        }

        let agent_ids: Vec<u32> = scene.sim.navigation.agents().iter().map(|a| a.id).collect();
        for agent_id in agent_ids {
            self.queue(
                scene,
                format!("vehicle-{}", agent_id),
                Drawable::Vehicle { agent_id },
            );
        }

        let cube = Drawable::Cube {
            center: scene.cube.center,
            half_size: scene.cube.half_size,
            faces: scene.cube.faces().to_vec(),
        };
        self.queue(scene, "data-cube".into(), cube);

        tracing::info!("Queued {} scene objects for spawning", self.spawns.len());
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport, projection: &Projection) {
        self.viewport = Some(viewport);
        self.projection = Some(*projection);
    }

    fn render(&mut self, frame: &FrameView<'_>) {
        let vehicles = frame
            .agents
            .iter()
            .map(|a| VehiclePose {
                agent_id: a.id,
                position: a.position,
                heading: a.heading,
            })
            .collect();
        self.frame = Some(FrameState {
            tick: frame.tick,
            vehicles,
            camera: *frame.camera,
            cube_rotation: frame.cube.rotation,
        });
    }

    fn release(&mut self, resources: &[ResourceEntry]) {
        // Anything never spawned must not be spawned after teardown.
        self.spawns
            .retain(|s| !resources.iter().any(|r| r.handle == s.handle));
        self.releases.extend(resources.iter().map(|r| r.handle));
        self.frame = None;
    }
}
