//! Camera Transition Controller
//!
//! Eases the camera framing toward a horizontal offset picked from the
//! application's navigation context. Each update covers a fixed fraction of
//! the remaining distance on the x axis; y and z are left alone.

use map_events::{CameraSnapshot, RouteContext};

use crate::components::CameraState;
use crate::config::CameraConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransitionController {
    state: CameraState,
    config: CameraConfig,
    context: RouteContext,
}

impl CameraTransitionController {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            state: CameraState::from_config(&config),
            config,
            context: RouteContext::default(),
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn context(&self) -> RouteContext {
        self.context
    }

    pub fn target_offset(&self) -> f32 {
        self.state.target_focus_x
    }

    /// Retarget the framing. Non-finite targets are ignored.
    pub fn set_target_offset(&mut self, x: f32) {
        if !x.is_finite() {
            tracing::warn!("Ignoring non-finite camera target {}", x);
            return;
        }
        self.state.target_focus_x = x;
    }

    /// Retarget from a navigation context.
    pub fn apply_context(&mut self, context: RouteContext) {
        if context != self.context {
            tracing::info!("Camera context {} -> {}", self.context, context);
        }
        self.context = context;
        self.set_target_offset(self.config.offset_for(context));
    }

    /// Shorthand for `apply_context(RouteContext::from_route(route))`.
    pub fn apply_route(&mut self, route: &str) {
        self.apply_context(RouteContext::from_route(route));
    }

    /// Advance one tick. Returns `true` if the camera moved.
    pub fn update(&mut self) -> bool {
        let delta = self.state.target_focus_x - self.state.focus.x;
        if delta.abs() <= self.config.threshold {
            return false;
        }

        let step = delta * self.config.lerp_factor;
        self.state.focus.x += step;
        self.state.position.x += step;
        true
    }

    pub fn is_settled(&self) -> bool {
        self.state.remaining() <= self.config.threshold
    }

    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            position: self.state.position,
            focus: self.state.focus,
            target_focus_x: self.state.target_focus_x,
            context: self.context,
        }
    }
}
