//! Agent Spawning
//!
//! Creates the fixed pool of vehicles with randomized speeds, spread over the
//! ground plane outside the reserved zone.

use rand::Rng;
use std::f32::consts::TAU;

use crate::components::Agent;
use crate::config::NavigationConfig;
use crate::error::PlacementError;
use crate::sampler::SpatialSampler;

/// Spawn `config.agent_count` idle agents.
pub fn spawn_agents<R: Rng + ?Sized>(
    rng: &mut R,
    config: &NavigationConfig,
    sampler: &SpatialSampler,
) -> Result<Vec<Agent>, PlacementError> {
    let positions = sampler.sample(rng, config.agent_count)?;

    let agents: Vec<Agent> = positions
        .into_iter()
        .enumerate()
        .map(|(index, position)| {
            let speed = generate_speed(rng, config);
            let heading = rng.gen_range(0.0..TAU);
            Agent::new(index as u32, position, heading, speed)
        })
        .collect();

    tracing::info!("Spawned {} agents", agents.len());
    Ok(agents)
}

/// Per-agent speed so vehicles don't move in lockstep.
fn generate_speed<R: Rng + ?Sized>(rng: &mut R, config: &NavigationConfig) -> f32 {
    if config.max_speed <= config.min_speed {
        config.min_speed
    } else {
        rng.gen_range(config.min_speed..=config.max_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::PlacementArea;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn sampler() -> SpatialSampler {
        SpatialSampler::new(PlacementArea::new(800.0, 250.0), 1000)
    }

    #[test]
    fn test_spawn_pool() {
        let mut rng = SmallRng::seed_from_u64(42);
        let config = NavigationConfig::default();
        let agents = spawn_agents(&mut rng, &config, &sampler()).unwrap();

        assert_eq!(agents.len(), 5);
        for (i, agent) in agents.iter().enumerate() {
            assert_eq!(agent.id, i as u32);
            assert!(agent.is_idle());
            assert!(agent.speed >= 0.2 && agent.speed <= 0.5);
            assert!(sampler().area().accepts(agent.position));
        }
    }

    #[test]
    fn test_speeds_vary() {
        let mut rng = SmallRng::seed_from_u64(8);
        let config = NavigationConfig {
            agent_count: 20,
            ..NavigationConfig::default()
        };
        let agents = spawn_agents(&mut rng, &config, &sampler()).unwrap();
        let first = agents[0].speed;
        assert!(agents.iter().any(|a| a.speed != first));
    }

    #[test]
    fn test_fixed_speed_when_range_collapses() {
        let mut rng = SmallRng::seed_from_u64(8);
        let config = NavigationConfig {
            min_speed: 0.4,
            max_speed: 0.4,
            ..NavigationConfig::default()
        };
        let agents = spawn_agents(&mut rng, &config, &sampler()).unwrap();
        assert!(agents.iter().all(|a| a.speed == 0.4));
    }
}
