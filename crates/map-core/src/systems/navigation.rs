//! Navigation System
//!
//! Per-tick steering of the agent pool: every agent seeks its parking target
//! while obstacles inside its view distance push it away. Seek and repulsion
//! are summed before normalization, so a nearby obstacle bends the path
//! instead of replacing the goal.

use map_events::{Obstacle, ParkingLocation, Point2D};
use rand::Rng;

use crate::components::Agent;
use crate::config::NavigationConfig;
use crate::error::InvalidWorldError;

/// Tuning for the steering rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringParams {
    /// Targets closer than this count as reached.
    pub arrival_radius: f32,
    /// Obstacles farther than this are ignored.
    pub view_distance: f32,
    /// Repulsion at zero distance.
    pub avoidance_gain: f32,
    /// Steering vectors shorter than this are treated as zero.
    pub epsilon: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self::from(&NavigationConfig::default())
    }
}

impl From<&NavigationConfig> for SteeringParams {
    fn from(config: &NavigationConfig) -> Self {
        Self {
            arrival_radius: config.arrival_radius,
            view_distance: config.view_distance,
            avoidance_gain: config.avoidance_gain,
            epsilon: config.direction_epsilon.max(f32::EPSILON),
        }
    }
}

/// What happened to one agent during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteerOutcome {
    /// The agent advanced along its steering direction.
    Moved,
    /// The agent reached its target; the target was cleared.
    Arrived,
    /// Seek and repulsion cancelled out; the agent held position.
    Blocked,
}

/// Totals for one tick over the whole pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub assigned: usize,
    pub moved: usize,
    pub arrived: usize,
    pub blocked: usize,
}

impl StepReport {
    fn record(&mut self, outcome: SteerOutcome) {
        match outcome {
            SteerOutcome::Moved => self.moved += 1,
            SteerOutcome::Arrived => self.arrived += 1,
            SteerOutcome::Blocked => self.blocked += 1,
        }
    }
}

/// Repulsion from one obstacle, or `None` when it is out of view.
///
/// The push points away from the obstacle center with magnitude
/// `gain * (view - d) / view`. When the agent sits on the center the away
/// direction is undefined; the agent then sidesteps along the perpendicular of
/// `seek`, which keeps the push finite and bounded by `gain`.
pub fn repulsion(
    position: Point2D,
    obstacle: &Obstacle,
    seek: Point2D,
    params: &SteeringParams,
) -> Option<Point2D> {
    let offset = position - obstacle.center();
    let distance = offset.length();
    if !(distance < params.view_distance) {
        return None;
    }

    let strength = (params.view_distance - distance) / params.view_distance * params.avoidance_gain;
    let away = offset
        .normalize_or_none(params.epsilon)
        .or_else(|| seek.perpendicular().normalize_or_none(params.epsilon))
        .unwrap_or(Point2D::new(1.0, 0.0));

    Some(away * strength)
}

/// Combined, normalized steering direction from `position` toward `target`.
///
/// Returns `None` when the target coincides with the position or when the
/// forces cancel.
pub fn steering_direction(
    position: Point2D,
    target: Point2D,
    obstacles: &[Obstacle],
    params: &SteeringParams,
) -> Option<Point2D> {
    let seek = (target - position).normalize_or_none(params.epsilon)?;

    let mut combined = seek;
    for obstacle in obstacles {
        if let Some(push) = repulsion(position, obstacle, seek, params) {
            combined += push;
        }
    }

    combined.normalize_or_none(params.epsilon)
}

/// Advance one agent by one tick.
///
/// Returns the outcome and whether a new target was assigned.
pub fn steer_agent<R: Rng + ?Sized>(
    agent: &mut Agent,
    obstacles: &[Obstacle],
    parking_locations: &[ParkingLocation],
    params: &SteeringParams,
    rng: &mut R,
) -> (SteerOutcome, bool) {
    let mut assigned = false;
    if agent.target_location(parking_locations).is_none() {
        let index = rng.gen_range(0..parking_locations.len());
        agent.target = Some(index);
        assigned = true;
        tracing::debug!(
            "Agent {} heading to parking location {}",
            agent.id,
            parking_locations[index].id
        );
    }

    let Some(target) = agent.target_location(parking_locations).map(|p| p.position()) else {
        return (SteerOutcome::Blocked, assigned);
    };

    if agent.position.distance(target) < params.arrival_radius {
        agent.target = None;
        agent.arrivals += 1;
        tracing::debug!("Agent {} arrived (trip {})", agent.id, agent.arrivals);
        return (SteerOutcome::Arrived, assigned);
    }

    match steering_direction(agent.position, target, obstacles, params) {
        Some(dir) => {
            agent.position += dir * agent.speed;
            agent.heading = dir.angle();
            (SteerOutcome::Moved, assigned)
        }
        None => (SteerOutcome::Blocked, assigned),
    }
}

/// Owns the agent pool and steers it every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSystem {
    agents: Vec<Agent>,
    params: SteeringParams,
}

impl NavigationSystem {
    /// Fails when there is nowhere to drive to.
    pub fn new(
        agents: Vec<Agent>,
        params: SteeringParams,
        parking_locations: &[ParkingLocation],
    ) -> Result<Self, InvalidWorldError> {
        if parking_locations.is_empty() {
            return Err(InvalidWorldError::NoParkingLocations);
        }
        Ok(Self { agents, params })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: u32) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn params(&self) -> &SteeringParams {
        &self.params
    }

    /// Total arrivals over the whole pool.
    pub fn total_arrivals(&self) -> u64 {
        self.agents.iter().map(|a| a.arrivals as u64).sum()
    }

    /// Steer every agent once, in pool order.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        obstacles: &[Obstacle],
        parking_locations: &[ParkingLocation],
        rng: &mut R,
    ) -> Result<StepReport, InvalidWorldError> {
        if parking_locations.is_empty() {
            return Err(InvalidWorldError::NoParkingLocations);
        }

        let mut report = StepReport::default();
        for agent in &mut self.agents {
            let (outcome, assigned) =
                steer_agent(agent, obstacles, parking_locations, &self.params, rng);
            if assigned {
                report.assigned += 1;
            }
            report.record(outcome);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn params() -> SteeringParams {
        SteeringParams::default()
    }

    #[test]
    fn test_default_params_match_config() {
        let p = params();
        assert_eq!(p.arrival_radius, 10.0);
        assert_eq!(p.view_distance, 100.0);
        assert_eq!(p.avoidance_gain, 2.0);
    }

    #[test]
    fn test_repulsion_out_of_view() {
        let obstacle = Obstacle::new(100.0, 0.0, 5.0);
        let push = repulsion(Point2D::ZERO, &obstacle, Point2D::new(1.0, 0.0), &params());
        assert!(push.is_none());
    }

    #[test]
    fn test_repulsion_points_away_and_scales() {
        let obstacle = Obstacle::new(50.0, 0.0, 5.0);
        let push = repulsion(Point2D::ZERO, &obstacle, Point2D::new(1.0, 0.0), &params()).unwrap();

        // (100 - 50) / 100 * 2.0 = 1.0, pointing toward -x.
        assert!((push.x + 1.0).abs() < 1e-6);
        assert!(push.z.abs() < 1e-6);
    }

    #[test]
    fn test_repulsion_on_obstacle_center_is_bounded() {
        let obstacle = Obstacle::new(10.0, 10.0, 5.0);
        let seek = Point2D::new(0.0, 1.0);
        let push = repulsion(Point2D::new(10.0, 10.0), &obstacle, seek, &params()).unwrap();

        assert!(push.is_finite());
        assert!((push.length() - 2.0).abs() < 1e-5);
        // Sidesteps perpendicular to the seek direction.
        assert!((push.x * seek.x + push.z * seek.z).abs() < 1e-5);
    }

    #[test]
    fn test_seek_without_obstacles() {
        let dir = steering_direction(
            Point2D::ZERO,
            Point2D::new(0.0, 300.0),
            &[],
            &params(),
        )
        .unwrap();
        assert_eq!(dir, Point2D::new(0.0, 1.0));
    }

    #[test]
    fn test_forces_are_summed_not_replaced() {
        // Obstacle dead ahead slows the approach but lateral offset bends it.
        let obstacles = [Obstacle::new(40.0, 5.0, 5.0)];
        let dir = steering_direction(
            Point2D::ZERO,
            Point2D::new(500.0, 0.0),
            &obstacles,
            &params(),
        )
        .unwrap();

        assert!(dir.z < 0.0, "should bend away from the obstacle");
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cancelling_forces_block() {
        // Obstacle straight ahead at distance 50 pushes back with exactly 1.0.
        let obstacles = [Obstacle::new(50.0, 0.0, 5.0)];
        let dir = steering_direction(
            Point2D::ZERO,
            Point2D::new(500.0, 0.0),
            &obstacles,
            &params(),
        );
        assert!(dir.is_none());
    }

    #[test]
    fn test_steer_moves_by_speed_and_sets_heading() {
        let lots = [ParkingLocation::new(0, 0.0, 400.0)];
        let mut agent = Agent::new(0, Point2D::new(0.0, 300.0), 0.0, 0.5);
        let mut rng = SmallRng::seed_from_u64(1);

        let (outcome, assigned) = steer_agent(&mut agent, &[], &lots, &params(), &mut rng);

        assert_eq!(outcome, SteerOutcome::Moved);
        assert!(assigned);
        assert!((agent.position.z - 300.5).abs() < 1e-4);
        assert!((agent.heading - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_arrival_clears_target_then_reassigns() {
        let lots = [ParkingLocation::new(0, 300.0, 300.0)];
        let mut agent = Agent::new(0, Point2D::new(305.0, 300.0), 1.0, 0.3);
        agent.target = Some(0);
        let mut rng = SmallRng::seed_from_u64(1);

        let (outcome, assigned) = steer_agent(&mut agent, &[], &lots, &params(), &mut rng);
        assert_eq!(outcome, SteerOutcome::Arrived);
        assert!(!assigned);
        assert!(agent.target.is_none());
        assert_eq!(agent.arrivals, 1);
        // Movement skipped on the arrival tick.
        assert_eq!(agent.position, Point2D::new(305.0, 300.0));
        assert_eq!(agent.heading, 1.0);

        let (_, assigned) = steer_agent(&mut agent, &[], &lots, &params(), &mut rng);
        assert!(assigned);
    }

    #[test]
    fn test_stale_target_is_reassigned() {
        let lots = [ParkingLocation::new(0, 300.0, 300.0)];
        let mut agent = Agent::new(0, Point2D::new(-300.0, 300.0), 0.0, 0.3);
        agent.target = Some(9);
        let mut rng = SmallRng::seed_from_u64(1);

        let (_, assigned) = steer_agent(&mut agent, &[], &lots, &params(), &mut rng);
        assert!(assigned);
        assert_eq!(agent.target, Some(0));
    }

    #[test]
    fn test_system_requires_parking() {
        let err = NavigationSystem::new(Vec::new(), params(), &[]).unwrap_err();
        assert_eq!(err, InvalidWorldError::NoParkingLocations);
    }

    #[test]
    fn test_step_with_empty_parking_fails() {
        let lots = [ParkingLocation::new(0, 300.0, 300.0)];
        let mut system = NavigationSystem::new(Vec::new(), params(), &lots).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(system.step(&[], &[], &mut rng).is_err());
    }

    #[test]
    fn test_step_report() {
        let lots = [ParkingLocation::new(0, 300.0, 300.0)];
        let agents = vec![
            Agent::new(0, Point2D::new(-300.0, 300.0), 0.0, 0.3),
            Agent::new(1, Point2D::new(300.0, 302.0), 0.0, 0.3),
        ];
        let mut system = NavigationSystem::new(agents, params(), &lots).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);

        let report = system.step(&[], &lots, &mut rng).unwrap();
        assert_eq!(report.assigned, 2);
        assert_eq!(report.moved, 1);
        assert_eq!(report.arrived, 1);
        assert_eq!(system.total_arrivals(), 1);
        assert!(system.agent(1).unwrap().is_idle());
    }
}
