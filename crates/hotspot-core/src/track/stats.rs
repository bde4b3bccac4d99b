use serde::{Deserialize, Serialize};

use crate::consts::{DELTA_POINTS_CAP, DELTA_POINTS_WEIGHT, MOVEMENT_POINTS_CAP};
use crate::detection::Region;

/// Summary of how much a track moved and how textured it was.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMovementStatistics {
    /// Sum of centroid displacements between consecutive frames.
    pub movement: f64,
    /// Largest centroid displacement from the first frame.
    pub max_offset: f64,
    pub average_mass: f64,
    pub median_mass: f64,
    /// Square root of the mean per-frame pixel variance.
    pub delta_std: f64,
    /// Each term is capped on its own so one outlier cannot dominate.
    pub score: f64,
}

impl TrackMovementStatistics {
    /// Statistics for a frame-ordered region sequence. Tracks of zero or
    /// one frame get the all-zero record.
    pub fn from_regions(regions: &[Region]) -> Self {
        if regions.len() <= 1 {
            return Self::default();
        }

        let origin = &regions[0];
        let movement: f64 = regions.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
        let max_offset = regions
            .iter()
            .map(|r| r.distance_to(origin))
            .fold(0.0f64, f64::max);

        let n = regions.len() as f64;
        let mean_variance = regions.iter().map(|r| r.pixel_variance as f64).sum::<f64>() / n;
        let delta_std = mean_variance.max(0.0).sqrt();

        let average_mass = regions.iter().map(|r| r.mass as f64).sum::<f64>() / n;
        let median_mass = median_mass(regions);

        let movement_points = (movement.sqrt() + max_offset).min(MOVEMENT_POINTS_CAP);
        let delta_points = (DELTA_POINTS_WEIGHT * delta_std).min(DELTA_POINTS_CAP);

        Self {
            movement,
            max_offset,
            average_mass,
            median_mass,
            delta_std,
            score: movement_points + delta_points,
        }
    }
}

fn median_mass(regions: &[Region]) -> f64 {
    let mut masses: Vec<usize> = regions.iter().map(|r| r.mass).collect();
    masses.sort_unstable();
    let mid = masses.len() / 2;
    if masses.len() % 2 == 0 {
        (masses[mid - 1] + masses[mid]) as f64 / 2.0
    } else {
        masses[mid] as f64
    }
}
