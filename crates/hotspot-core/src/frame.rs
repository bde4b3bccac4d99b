use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{HotspotError, Result};

/// A single thermal frame.
/// Pixel values are raw sensor intensities as f32.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Position of the frame within its clip.
    pub index: usize,
}

impl Frame {
    pub fn new(data: Array2<f32>, index: usize) -> Self {
        Self { data, index }
    }
}

/// Summary statistics of one raw (unfiltered) frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameStats {
    pub min: f32,
    pub max: f32,
    pub median: f32,
    pub mean: f32,
}

impl FrameStats {
    pub fn from_array(data: &Array2<f32>) -> Self {
        if data.is_empty() {
            return Self::default();
        }
        let mut values: Vec<f32> = data.iter().copied().collect();
        let min = values.iter().copied().fold(f32::INFINITY, f32::min);
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mean = (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32;
        let median = crate::stack::percentile::median(&mut values);
        Self {
            min,
            max,
            median,
            mean,
        }
    }
}

/// Interior rectangle of a frame with an identical margin on all four sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl CropRect {
    /// Build the interior rectangle that discards `edge` pixels on every side.
    pub fn from_edge(frame_width: usize, frame_height: usize, edge: usize) -> Result<Self> {
        if frame_width <= 2 * edge || frame_height <= 2 * edge {
            return Err(HotspotError::InvalidDimensions {
                width: frame_width as u32,
                height: frame_height as u32,
            });
        }
        Ok(Self {
            x: edge,
            y: edge,
            width: frame_width - 2 * edge,
            height: frame_height - 2 * edge,
        })
    }

    pub fn right(&self) -> usize {
        self.x + self.width
    }

    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    /// View of `data` restricted to this rectangle.
    pub fn subimage<'a, T>(&self, data: &'a Array2<T>) -> ArrayView2<'a, T> {
        data.slice(s![self.y..self.bottom(), self.x..self.right()])
    }

    /// Place `inner` back into a zero-filled array of the full frame size.
    pub fn embed<T: Clone + Default>(
        &self,
        inner: &Array2<T>,
        frame_height: usize,
        frame_width: usize,
    ) -> Array2<T> {
        let mut full = Array2::<T>::default((frame_height, frame_width));
        full.slice_mut(s![self.y..self.bottom(), self.x..self.right()])
            .assign(inner);
        full
    }
}
