//! Frame Scheduler
//!
//! Drives a [`Scene`] through its lifecycle: construction, fixed-step
//! simulation, rendering through a [`RenderBackend`], resize, and teardown.
//! The scheduler never touches simulation internals; it calls
//! [`Scene::tick`] and hands the result to the backend.

use map_events::{LifecyclePhase, RouteContext, SceneSnapshot, WorldData};

use crate::assets::AssetLoader;
use crate::components::{Agent, CameraState};
use crate::config::SchedulerConfig;
use crate::cube::DataCube;
use crate::error::{BackendError, SceneError};
use crate::lifecycle::{Lifecycle, ResizeDisposition, StopDisposition};
use crate::scene::{ResourceEntry, Scene, SceneBuilder};
use crate::systems::StepReport;

/// Drawable area in pixels. Both sides are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn new(config: &SchedulerConfig, viewport: Viewport) -> Self {
        Self {
            fov_degrees: config.fov_degrees,
            aspect: viewport.aspect(),
            near: config.near,
            far: config.far,
        }
    }
}

/// Turns variable frame times into whole simulation steps.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStepClock {
    step: f32,
    max_steps: u32,
    accumulator: f32,
}

impl FixedStepClock {
    pub fn new(step: f32, max_steps: u32) -> Self {
        Self {
            step,
            max_steps: max_steps.max(1),
            accumulator: 0.0,
        }
    }

    /// Add `elapsed` seconds and return how many steps to run.
    ///
    /// At most `max_steps` are returned; time beyond that is dropped so a
    /// long stall does not trigger a burst of catch-up steps.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        if !(elapsed > 0.0) || !elapsed.is_finite() {
            return 0;
        }
        self.accumulator += elapsed;

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_steps {
            self.accumulator = self.accumulator.min(self.step);
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Read-only view of the scene handed to the backend each frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub tick: u64,
    pub world: &'a WorldData,
    pub agents: &'a [Agent],
    pub camera: &'a CameraState,
    pub cube: &'a DataCube,
    pub projection: &'a Projection,
    pub viewport: Viewport,
}

/// A renderer the scheduler can drive.
///
/// Everything created in `acquire` must be registered in `scene.resources` so
/// that teardown can hand it back through `release`.
pub trait RenderBackend {
    fn acquire(&mut self, scene: &mut Scene) -> Result<(), BackendError>;
    fn resize(&mut self, viewport: Viewport, projection: &Projection);
    fn render(&mut self, frame: &FrameView<'_>);
    fn release(&mut self, resources: &[ResourceEntry]);
}

/// Outcome of one `frame` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub steps: u32,
    pub agents: StepReport,
}

impl FrameReport {
    fn accumulate(&mut self, step: StepReport) {
        self.steps += 1;
        self.agents.assigned += step.assigned;
        self.agents.moved += step.moved;
        self.agents.arrived += step.arrived;
        self.agents.blocked += step.blocked;
    }
}

pub struct FrameScheduler<B: RenderBackend> {
    config: SchedulerConfig,
    backend: B,
    lifecycle: Lifecycle,
    clock: FixedStepClock,
    viewport: Viewport,
    projection: Projection,
    scene: Option<Scene>,
    pending_context: Option<RouteContext>,
    frames: u64,
}

impl<B: RenderBackend> FrameScheduler<B> {
    pub fn new(config: SchedulerConfig, backend: B) -> Self {
        let viewport = Viewport::new(config.initial_width, config.initial_height);
        let projection = Projection::new(&config, viewport);
        let clock = FixedStepClock::new(config.fixed_dt, config.max_steps_per_frame);
        Self {
            config,
            backend,
            lifecycle: Lifecycle::new(),
            clock,
            viewport,
            projection,
            scene: None,
            pending_context: None,
            frames: 0,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.lifecycle.phase()
    }

    pub fn failure(&self) -> Option<&str> {
        self.lifecycle.failure()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Construct and start in one go.
    pub fn start(
        &mut self,
        builder: &SceneBuilder,
        loader: &dyn AssetLoader,
    ) -> Result<(), SceneError> {
        self.begin_start()?;
        self.complete_start(builder, loader)
    }

    /// First half of a start: enter `Constructing`.
    pub fn begin_start(&mut self) -> Result<(), SceneError> {
        self.lifecycle.begin_construction()?;
        tracing::info!("Scene construction started");
        Ok(())
    }

    /// Second half of a start: build the scene and hand it to the backend.
    ///
    /// On any failure every resource acquired so far is released and the
    /// scheduler is left in `Failed`. A stop that arrived after
    /// [`begin_start`](Self::begin_start) tears the finished scene down and
    /// returns [`SceneError::Cancelled`].
    pub fn complete_start(
        &mut self,
        builder: &SceneBuilder,
        loader: &dyn AssetLoader,
    ) -> Result<(), SceneError> {
        if self.lifecycle.phase() != LifecyclePhase::Constructing {
            return Err(SceneError::InvalidTransition {
                action: "complete start",
                phase: self.lifecycle.phase(),
            });
        }

        let mut scene = match builder.build(loader) {
            Ok(scene) => scene,
            Err(e) => {
                tracing::error!("Scene construction failed: {}", e);
                self.lifecycle.fail(e.to_string());
                return Err(e);
            }
        };

        if let Err(e) = self.backend.acquire(&mut scene) {
            tracing::error!("{}", e);
            self.release_scene(&mut scene);
            self.lifecycle.fail(e.to_string());
            return Err(e.into());
        }

        match self.lifecycle.finish_construction() {
            Ok(queued) => {
                if let Some(viewport) = queued {
                    self.viewport = viewport;
                }
                self.projection = Projection::new(&self.config, self.viewport);
                self.backend.resize(self.viewport, &self.projection);

                if let Some(context) = self.pending_context.take() {
                    scene.sim.camera.apply_context(context);
                }

                self.clock.reset();
                self.frames = 0;
                tracing::info!(
                    "Scene running: {} agents, {} resources",
                    scene.sim.navigation.agents().len(),
                    scene.resources.live_count()
                );
                self.scene = Some(scene);
                Ok(())
            }
            Err(e) => {
                tracing::info!("Scene construction cancelled by stop request");
                self.release_scene(&mut scene);
                Err(e)
            }
        }
    }

    fn release_scene(&mut self, scene: &mut Scene) {
        let released = scene.teardown();
        self.backend.release(&released);
        tracing::info!("Released {} render resources", released.len());
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        let viewport = Viewport::new(width, height);
        match self.lifecycle.request_resize(viewport) {
            ResizeDisposition::Store => {
                self.viewport = viewport;
                self.projection = Projection::new(&self.config, viewport);
            }
            ResizeDisposition::Queued => {
                tracing::debug!("Resize to {}x{} queued until construction ends", width, height);
            }
            ResizeDisposition::Apply => {
                self.viewport = viewport;
                self.projection.aspect = viewport.aspect();
                self.backend.resize(viewport, &self.projection);
            }
            ResizeDisposition::Ignored => {}
        }
    }

    /// Feed a navigation context to the camera. Before the scene is running
    /// the context is kept and applied on start.
    pub fn set_context(&mut self, context: RouteContext) {
        match self.scene.as_mut() {
            Some(scene) if self.lifecycle.phase().is_running() => {
                scene.sim.camera.apply_context(context)
            }
            _ => self.pending_context = Some(context),
        }
    }

    pub fn set_route(&mut self, route: &str) {
        self.set_context(RouteContext::from_route(route));
    }

    /// Run the fixed steps covered by `elapsed` seconds, then render.
    pub fn frame(&mut self, elapsed: f32) -> Result<FrameReport, SceneError> {
        let phase = self.lifecycle.phase();
        let scene = match self.scene.as_mut() {
            Some(scene) if phase.is_running() => scene,
            _ => {
                return Err(SceneError::InvalidTransition {
                    action: "render a frame",
                    phase,
                })
            }
        };

        let mut report = FrameReport::default();
        for _ in 0..self.clock.advance(elapsed) {
            report.accumulate(scene.tick()?);
        }

        let view = FrameView {
            tick: scene.current_tick(),
            world: &scene.world,
            agents: scene.sim.navigation.agents(),
            camera: scene.sim.camera.state(),
            cube: &scene.cube,
            projection: &self.projection,
            viewport: self.viewport,
        };
        self.backend.render(&view);
        self.frames += 1;
        Ok(report)
    }

    /// Stop the scene. Idempotent; safe in any phase.
    pub fn stop(&mut self) {
        match self.lifecycle.request_stop() {
            StopDisposition::Teardown => {
                if let Some(mut scene) = self.scene.take() {
                    self.release_scene(&mut scene);
                }
                tracing::info!("Scene stopped after {} frames", self.frames);
            }
            StopDisposition::CancelConstruction => {
                tracing::info!("Stop requested during construction");
            }
            StopDisposition::AlreadyInactive => {}
        }
    }

    pub fn snapshot(&self, sequence: u64) -> Option<SceneSnapshot> {
        self.scene
            .as_ref()
            .map(|scene| scene.snapshot(sequence, self.lifecycle.phase(), self.viewport))
    }
}

impl<B: RenderBackend> Drop for FrameScheduler<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
