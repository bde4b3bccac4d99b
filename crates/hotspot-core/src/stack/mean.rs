use ndarray::{Array2, Zip};

use crate::error::{HotspotError, Result};
use crate::frame::Frame;

/// Per-pixel arithmetic mean of `frames`.
///
/// Accumulates in f64: thermal intensities sit in the thousands and
/// preview windows can span dozens of frames.
pub fn mean_stack(frames: &[Frame]) -> Result<Array2<f32>> {
    let first = frames.first().ok_or(HotspotError::EmptySequence)?;
    let mut sum = Array2::<f64>::zeros(first.data.dim());

    for frame in frames {
        Zip::from(&mut sum)
            .and(&frame.data)
            .for_each(|acc, &v| *acc += v as f64);
    }

    let n = frames.len() as f64;
    Ok(sum.mapv(|v| (v / n) as f32))
}
