//! Simulation Systems
//!
//! Steering, camera framing, and the per-tick update that drives both.

pub mod camera;
pub mod navigation;

pub use camera::CameraTransitionController;
pub use navigation::{
    repulsion, steer_agent, steering_direction, NavigationSystem, SteerOutcome, SteeringParams,
    StepReport,
};

use map_events::WorldData;

use crate::error::InvalidWorldError;
use crate::SimRng;

/// Everything that changes from one tick to the next.
///
/// The world itself is immutable once built and is passed in by reference.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub tick: u64,
    pub navigation: NavigationSystem,
    pub camera: CameraTransitionController,
    pub rng: SimRng,
}

impl SimulationState {
    pub fn new(
        navigation: NavigationSystem,
        camera: CameraTransitionController,
        rng: SimRng,
    ) -> Self {
        Self {
            tick: 0,
            navigation,
            camera,
            rng,
        }
    }

    /// Advance one tick in place: camera first, then agents.
    pub fn advance(&mut self, world: &WorldData) -> Result<StepReport, InvalidWorldError> {
        self.camera.update();
        let report = self.navigation.step(
            &world.obstacles,
            &world.parking_locations,
            &mut self.rng.0,
        )?;
        self.tick += 1;
        Ok(report)
    }
}

/// Pure form of [`SimulationState::advance`]: consumes the state and returns
/// the next one.
pub fn tick(
    mut state: SimulationState,
    world: &WorldData,
) -> Result<(SimulationState, StepReport), InvalidWorldError> {
    let report = state.advance(world)?;
    Ok((state, report))
}
