use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::components::Labeling;

/// Axis-aligned bounding box in full-frame pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl BoundingBox {
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// One detected component in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub frame_index: usize,
    pub bbox: BoundingBox,
    /// Number of foreground pixels.
    pub mass: usize,
    /// Variance of the filtered values under the component.
    pub pixel_variance: f32,
    /// Mean (x, y) position of the component's pixels.
    pub centroid: (f64, f64),
}

impl Region {
    pub fn distance_to(&self, other: &Region) -> f64 {
        let dx = self.centroid.0 - other.centroid.0;
        let dy = self.centroid.1 - other.centroid.1;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Default)]
struct Accumulator {
    min_row: usize,
    max_row: usize,
    min_col: usize,
    max_col: usize,
    mass: usize,
    sum_x: f64,
    sum_y: f64,
    sum_v: f64,
    sum_v2: f64,
}

/// Collect one `Region` per label, ordered by label.
pub fn extract_regions(labeling: &Labeling, filtered: &Array2<f32>, frame_index: usize) -> Vec<Region> {
    let mut acc: Vec<Option<Accumulator>> = (0..labeling.count).map(|_| None).collect();

    for ((row, col), &lbl) in labeling.labels.indexed_iter() {
        if lbl == 0 {
            continue;
        }
        let value = filtered[[row, col]] as f64;
        let entry = acc[(lbl - 1) as usize].get_or_insert_with(|| Accumulator {
            min_row: row,
            max_row: row,
            min_col: col,
            max_col: col,
            ..Default::default()
        });
        entry.min_row = entry.min_row.min(row);
        entry.max_row = entry.max_row.max(row);
        entry.min_col = entry.min_col.min(col);
        entry.max_col = entry.max_col.max(col);
        entry.mass += 1;
        entry.sum_x += col as f64;
        entry.sum_y += row as f64;
        entry.sum_v += value;
        entry.sum_v2 += value * value;
    }

    acc.into_iter()
        .flatten()
        .map(|a| {
            let n = a.mass as f64;
            let mean = a.sum_v / n;
            let variance = (a.sum_v2 / n - mean * mean).max(0.0);
            Region {
                frame_index,
                bbox: BoundingBox {
                    x: a.min_col,
                    y: a.min_row,
                    width: a.max_col - a.min_col + 1,
                    height: a.max_row - a.min_row + 1,
                },
                mass: a.mass,
                pixel_variance: variance as f32,
                centroid: (a.sum_x / n, a.sum_y / n),
            }
        })
        .collect()
}
