//! Headless Render Backend
//!
//! Registers the same resources a real renderer would, but draws nothing.
//! Records every call so the scheduler's behavior can be checked without a
//! window.

use map_events::PropKind;

use crate::error::BackendError;
use crate::scene::{ResourceArena, ResourceEntry, ResourceKind, Scene};
use crate::scheduler::{FrameView, Projection, RenderBackend, Viewport};

#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    /// Fail `acquire` after registering this many resources.
    pub fail_after: Option<usize>,
    pub acquired: usize,
    pub released: usize,
    pub frames_rendered: u64,
    pub resizes: Vec<Viewport>,
    pub last_aspect: Option<f32>,
    pub last_tick: Option<u64>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `acquire` fails part way through.
    pub fn failing_after(count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Self::default()
        }
    }

    /// Acquired but not yet released.
    pub fn outstanding(&self) -> usize {
        self.acquired.saturating_sub(self.released)
    }

    fn register(
        &mut self,
        arena: &mut ResourceArena,
        kind: ResourceKind,
        label: String,
    ) -> Result<(), BackendError> {
        if self.fail_after == Some(self.acquired) {
            return Err(BackendError(format!(
                "could not create {:?} '{}'",
                kind, label
            )));
        }
        arena.register(kind, label);
        self.acquired += 1;
        Ok(())
    }
}

impl RenderBackend for HeadlessBackend {
    fn acquire(&mut self, scene: &mut Scene) -> Result<(), BackendError> {
        let world = &scene.world;
        let arena = &mut scene.resources;
        self.register(arena, ResourceKind::RenderTarget, "frame".into())?;
        self.register(arena, ResourceKind::Listener, "resize".into())?;
        self.register(arena, ResourceKind::Listener, "pointer".into())?;
        self.register(arena, ResourceKind::Geometry, "ground".into())?;

        for (i, _) in world.obstacles.iter().enumerate() {
            self.register(arena, ResourceKind::Geometry, format!("obstacle-{}", i))?;
        }
        for lot in &world.parking_locations {
            self.register(arena, ResourceKind::Geometry, format!("lot-{}", lot.id))?;
        }
        for (i, prop) in world.props.iter().enumerate() {
            let label = match prop.kind {
                PropKind::TrafficLight => format!("traffic-light-{}", i),
                PropKind::StopSign | PropKind::YieldSign => format!("sign-{}", i),
            };
            self.register(arena, ResourceKind::Geometry, label)?;
        }
        for agent in scene.sim.navigation.agents() {
            self.register(arena, ResourceKind::Geometry, format!("vehicle-{}", agent.id))?;
        }
        self.register(arena, ResourceKind::Geometry, "cube".into())?;

        for name in ["asphalt", "paint", "obstacle", "vehicle", "cube"] {
            self.register(arena, ResourceKind::Material, name.into())?;
        }
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport, projection: &Projection) {
        self.resizes.push(viewport);
        self.last_aspect = Some(projection.aspect);
    }

    fn render(&mut self, frame: &FrameView<'_>) {
        self.frames_rendered += 1;
        self.last_tick = Some(frame.tick);
    }

    fn release(&mut self, resources: &[ResourceEntry]) {
        self.released += resources
            .iter()
            .filter(|r| r.kind != ResourceKind::Texture && r.kind != ResourceKind::Font)
            .count();
    }
}
