//! Spatial Sampler
//!
//! Rejection sampling of point-like items on the square ground plane, keeping
//! the central zone (reserved for the logo centerpiece) clear.

use map_events::Point2D;
use rand::Rng;

use crate::config::{WorldConfig, MAX_BOUNDS_HALF_WIDTH};
use crate::error::PlacementError;

/// Draw budget per item when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

/// The square placement area and the square reserved at its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementArea {
    pub bounds_half_width: f32,
    pub exclusion_half_extent: f32,
}

impl PlacementArea {
    pub fn new(bounds_half_width: f32, exclusion_half_extent: f32) -> Self {
        Self {
            bounds_half_width,
            exclusion_half_extent,
        }
    }

    /// True when the point lies inside the reserved central zone.
    pub fn is_excluded(&self, point: Point2D) -> bool {
        point.x.abs() < self.exclusion_half_extent && point.z.abs() < self.exclusion_half_extent
    }

    /// True when the point lies within the bounds (edges included).
    pub fn contains(&self, point: Point2D) -> bool {
        point.x.abs() <= self.bounds_half_width && point.z.abs() <= self.bounds_half_width
    }

    /// True when the point is a legal placement.
    pub fn accepts(&self, point: Point2D) -> bool {
        self.contains(point) && !self.is_excluded(point)
    }

    fn check(&self) -> Result<(), PlacementError> {
        let bounds = self.bounds_half_width;
        if !(bounds > 0.0 && bounds <= MAX_BOUNDS_HALF_WIDTH) {
            return Err(PlacementError::InvalidBounds(bounds));
        }
        if self.exclusion_half_extent.is_nan() || self.exclusion_half_extent >= bounds {
            return Err(PlacementError::DegenerateExclusion {
                exclusion: self.exclusion_half_extent,
                bounds,
            });
        }
        Ok(())
    }
}

/// Places points uniformly inside a [`PlacementArea`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialSampler {
    area: PlacementArea,
    max_attempts: u32,
}

impl SpatialSampler {
    pub fn new(area: PlacementArea, max_attempts: u32) -> Self {
        Self {
            area,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(
            PlacementArea::new(config.bounds_half_width, config.exclusion_half_extent),
            config.max_placement_attempts,
        )
    }

    pub fn area(&self) -> PlacementArea {
        self.area
    }

    /// Draws `count` points. Each point gets at most `max_attempts` draws.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
    ) -> Result<Vec<Point2D>, PlacementError> {
        self.area.check()?;

        let mut points = Vec::with_capacity(count);
        for placed in 0..count {
            match self.draw(rng) {
                Some(point) => points.push(point),
                None => {
                    return Err(PlacementError::RetriesExhausted {
                        requested: count,
                        placed,
                        attempts: self.max_attempts,
                    })
                }
            }
        }
        Ok(points)
    }

    /// Draws a single point.
    pub fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Point2D, PlacementError> {
        self.area.check()?;
        self.draw(rng).ok_or(PlacementError::RetriesExhausted {
            requested: 1,
            placed: 0,
            attempts: self.max_attempts,
        })
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Point2D> {
        let b = self.area.bounds_half_width;
        (0..self.max_attempts)
            .map(|_| Point2D::new(rng.gen_range(-b..=b), rng.gen_range(-b..=b)))
            .find(|p| !self.area.is_excluded(*p))
    }
}

/// One-shot form of [`SpatialSampler::sample`].
pub fn sample<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    bounds_half_width: f32,
    exclusion_half_extent: f32,
    max_attempts: u32,
) -> Result<Vec<Point2D>, PlacementError> {
    SpatialSampler::new(
        PlacementArea::new(bounds_half_width, exclusion_half_extent),
        max_attempts,
    )
    .sample(rng, count)
}
