use ndarray::{Array2, Zip};

use crate::background::BackgroundModel;
use crate::consts::NO_BACKGROUND_OFFSET;
use crate::stack::percentile::median;

/// Remove the static scene from a raw thermal frame.
///
/// Dispatches on the background model:
/// - disabled: subtract the frame median plus a fixed offset, clip at zero;
/// - preview: zero pixels colder than `temp_thresh`, then subtract the
///   background and the frame's average drift from the preview mean;
/// - static: subtract the background, clip, then detrend by the result's
///   own median and clip again.
pub fn filter_frame(thermal: &Array2<f32>, model: &BackgroundModel, temp_thresh: f32) -> Array2<f32> {
    match model {
        BackgroundModel::Disabled => filter_without_background(thermal),
        BackgroundModel::Static(background) => filter_static_background(thermal, background),
        BackgroundModel::Preview { image, mean_value } => {
            filter_preview_background(thermal, image, *mean_value, temp_thresh)
        }
    }
}

pub fn filter_without_background(thermal: &Array2<f32>) -> Array2<f32> {
    let level = frame_median(thermal) + NO_BACKGROUND_OFFSET;
    thermal.mapv(|v| (v - level).max(0.0))
}

pub fn filter_static_background(thermal: &Array2<f32>, background: &Array2<f32>) -> Array2<f32> {
    let mut filtered = Zip::from(thermal)
        .and(background)
        .map_collect(|&t, &b| (t - b).max(0.0));
    let level = frame_median(&filtered);
    filtered.mapv_inplace(|v| (v - level).max(0.0));
    filtered
}

pub fn filter_preview_background(
    thermal: &Array2<f32>,
    background: &Array2<f32>,
    background_mean: f32,
    temp_thresh: f32,
) -> Array2<f32> {
    let frame_mean = thermal.mean().unwrap_or(0.0);
    let avg_change = (frame_mean - background_mean).round_ties_even();
    Zip::from(thermal).and(background).map_collect(|&t, &b| {
        let t = if t < temp_thresh { 0.0 } else { t };
        t - b - avg_change
    })
}

fn frame_median(data: &Array2<f32>) -> f32 {
    let mut values: Vec<f32> = data.iter().copied().collect();
    median(&mut values)
}
