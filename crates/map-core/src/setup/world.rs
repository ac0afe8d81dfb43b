//! World Setup
//!
//! Populates the ground plane with obstacles, parking lots, and traffic props.

use map_events::{
    GroundRect, LotLayout, Obstacle, ParkingLocation, Point2D, Prop, PropKind, StallLine,
    WorldData,
};
use rand::Rng;
use std::f32::consts::TAU;

use crate::config::WorldConfig;
use crate::error::PlacementError;
use crate::sampler::SpatialSampler;

/// Share of the lot depth covered by the painted stall lines.
const STALL_LINE_DEPTH: f32 = 0.6;

/// Build the static world. Any placement failure aborts the whole build.
pub fn build_world<R: Rng + ?Sized>(
    rng: &mut R,
    config: &WorldConfig,
) -> Result<WorldData, PlacementError> {
    let sampler = SpatialSampler::from_config(config);

    let obstacles = sampler
        .sample(rng, config.obstacle_count)?
        .into_iter()
        .map(|p| {
            let radius = rng.gen_range(config.obstacle_radius_min..=config.obstacle_radius_max);
            Obstacle::new(p.x, p.z, radius)
        })
        .collect::<Vec<_>>();

    let anchors = sampler.sample(rng, config.parking_lot_count)?;
    let mut parking_locations = Vec::with_capacity(anchors.len());
    let mut lot_layouts = Vec::with_capacity(anchors.len());
    for (index, anchor) in anchors.into_iter().enumerate() {
        let id = index as u32;
        parking_locations.push(ParkingLocation::new(id, anchor.x, anchor.z));
        lot_layouts.push(lot_layout(id, anchor, config));
    }

    let props = sampler
        .sample(rng, config.prop_count)?
        .into_iter()
        .map(|p| Prop {
            kind: choose_prop_kind(rng),
            x: p.x,
            z: p.z,
            rotation: rng.gen_range(0.0..TAU),
        })
        .collect::<Vec<_>>();

    tracing::info!(
        "Built world: {} obstacles, {} parking lots, {} props",
        obstacles.len(),
        parking_locations.len(),
        props.len()
    );

    Ok(WorldData {
        obstacles,
        parking_locations,
        props,
        lot_layouts,
    })
}

/// Half the props are traffic lights; the rest are split between stop and
/// yield signs.
fn choose_prop_kind<R: Rng + ?Sized>(rng: &mut R) -> PropKind {
    if rng.gen_bool(0.5) {
        PropKind::TrafficLight
    } else if rng.gen_bool(0.5) {
        PropKind::StopSign
    } else {
        PropKind::YieldSign
    }
}

/// Fixed local layout around a lot anchor: asphalt, evenly spaced stall
/// dividers running from the back edge, and a sign at the front-left corner.
pub fn lot_layout(location_id: u32, anchor: Point2D, config: &WorldConfig) -> LotLayout {
    let width = config.lot_width;
    let depth = config.lot_depth;
    let back = anchor.z - depth / 2.0;
    let left = anchor.x - width / 2.0;

    let stalls = config.stalls_per_lot.max(1);
    let spacing = width / stalls as f32;
    let stall_lines = (0..=stalls)
        .map(|i| {
            let x = left + spacing * i as f32;
            StallLine {
                start: Point2D::new(x, back),
                end: Point2D::new(x, back + depth * STALL_LINE_DEPTH),
            }
        })
        .collect();

    LotLayout {
        location_id,
        asphalt: GroundRect {
            center: anchor,
            width,
            depth,
        },
        stall_lines,
        sign_post: Point2D::new(left, anchor.z + depth / 2.0),
        sign_height: config.sign_height,
    }
}

/// Output the world as JSON for verification
pub fn world_to_json(world: &WorldData) -> String {
    world.to_json().unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::PlacementArea;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_world_creation() {
        let mut rng = SmallRng::seed_from_u64(42);
        let config = WorldConfig::default();
        let world = build_world(&mut rng, &config).unwrap();

        assert_eq!(world.obstacles.len(), config.obstacle_count);
        assert_eq!(world.parking_locations.len(), config.parking_lot_count);
        assert_eq!(world.props.len(), config.prop_count);
        assert_eq!(world.lot_layouts.len(), config.parking_lot_count);
    }

    #[test]
    fn test_everything_outside_reserved_zone() {
        let mut rng = SmallRng::seed_from_u64(7);
        let config = WorldConfig::default();
        let world = build_world(&mut rng, &config).unwrap();
        let area = PlacementArea::new(config.bounds_half_width, config.exclusion_half_extent);

        for o in &world.obstacles {
            assert!(area.accepts(o.center()));
            assert!(o.radius >= config.obstacle_radius_min);
            assert!(o.radius <= config.obstacle_radius_max);
        }
        for p in &world.parking_locations {
            assert!(area.accepts(p.position()));
        }
        for p in &world.props {
            assert!(area.accepts(Point2D::new(p.x, p.z)));
        }
    }

    #[test]
    fn test_parking_ids_are_sequential_and_have_layouts() {
        let mut rng = SmallRng::seed_from_u64(11);
        let world = build_world(&mut rng, &WorldConfig::default()).unwrap();

        for (i, lot) in world.parking_locations.iter().enumerate() {
            assert_eq!(lot.id, i as u32);
            let layout = world.layout_for(lot.id).unwrap();
            assert_eq!(layout.asphalt.center, lot.position());
        }
    }

    #[test]
    fn test_lot_layout_shape() {
        let config = WorldConfig {
            lot_width: 60.0,
            lot_depth: 40.0,
            stalls_per_lot: 6,
            ..WorldConfig::default()
        };
        let layout = lot_layout(3, Point2D::new(400.0, 300.0), &config);

        assert_eq!(layout.location_id, 3);
        assert_eq!(layout.stall_lines.len(), 7);
        assert_eq!(layout.stall_lines[0].start, Point2D::new(370.0, 280.0));
        assert_eq!(layout.stall_lines[6].start.x, 430.0);
        for line in &layout.stall_lines {
            assert!(layout.asphalt.contains(line.start));
            assert!(layout.asphalt.contains(line.end));
        }
        assert_eq!(layout.sign_post, Point2D::new(370.0, 320.0));
    }

    #[test]
    fn test_props_use_every_kind() {
        let mut rng = SmallRng::seed_from_u64(5);
        let config = WorldConfig {
            prop_count: 200,
            ..WorldConfig::default()
        };
        let world = build_world(&mut rng, &config).unwrap();

        for kind in PropKind::all() {
            assert!(world.props.iter().any(|p| p.kind == *kind), "missing {:?}", kind);
        }
    }

    #[test]
    fn test_degenerate_zone_aborts_build() {
        let mut rng = SmallRng::seed_from_u64(1);
        let config = WorldConfig {
            bounds_half_width: 100.0,
            exclusion_half_extent: 150.0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            build_world(&mut rng, &config),
            Err(PlacementError::DegenerateExclusion { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_world() {
        let config = WorldConfig::default();
        let a = build_world(&mut SmallRng::seed_from_u64(2024), &config).unwrap();
        let b = build_world(&mut SmallRng::seed_from_u64(2024), &config).unwrap();
        assert_eq!(a, b);
        assert!(world_to_json(&a).contains("parking_locations"));
    }
}
