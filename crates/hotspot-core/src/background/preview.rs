use ndarray::Array2;
use tracing::error;

use crate::error::{HotspotError, Result};
use crate::frame::Frame;
use crate::stack::mean::mean_stack;

/// Background from the motion-trigger preview window at the start of a clip.
///
/// Averages the first `preview_secs * fps - ignore_frames` frames and rounds
/// to whole sensor counts. Returns the background and its mean value.
pub fn preview_background(
    frames: &[Frame],
    preview_secs: u32,
    frames_per_second: u32,
    ignore_frames: usize,
) -> Result<(Array2<f32>, f32)> {
    if frames.is_empty() {
        return Err(HotspotError::EmptySequence);
    }

    let declared = (preview_secs as usize * frames_per_second as usize).saturating_sub(ignore_frames);
    let count = if declared >= frames.len() {
        error!(
            preview_frames = declared,
            total_frames = frames.len(),
            "Video consists entirely of preview"
        );
        frames.len()
    } else {
        declared.max(1)
    };

    let background = mean_stack(&frames[..count])?.mapv(f32::round_ties_even);
    let mean_value = background.mean().unwrap_or(0.0);
    Ok((background, mean_value))
}
