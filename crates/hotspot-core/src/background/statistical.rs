use ndarray::{Array2, Zip};
use rayon::prelude::*;
use tracing::debug;

use crate::consts::BACKGROUND_PERCENTILE;
use crate::detection::filtered::filter_static_background;
use crate::error::{HotspotError, Result};
use crate::frame::Frame;
use crate::pipeline::config::TrackingConfig;
use crate::stack::percentile::{percentile, percentile_stack};

use super::BackgroundAnalysis;

/// Estimate the background as the per-pixel low percentile of the whole clip.
///
/// Returns the background (or `None` when the scene is not static) together
/// with the clip-wide analysis. Every frame must be resident.
pub fn statistical_background(
    frames: &[Frame],
    config: &TrackingConfig,
) -> Result<(Option<Array2<f32>>, BackgroundAnalysis)> {
    if frames.is_empty() {
        return Err(HotspotError::EmptySequence);
    }

    let background = percentile_stack(frames, BACKGROUND_PERCENTILE)?;

    let filtered: Vec<Array2<f32>> = frames
        .par_iter()
        .map(|f| filter_static_background(&f.data, &background))
        .collect();

    let mut filtered_values: Vec<f32> = filtered.iter().flat_map(|f| f.iter().copied()).collect();
    let background_deviation = mean_abs(filtered_values.iter().copied());
    let raw_threshold = percentile(&mut filtered_values, config.threshold_percentile);
    let threshold = clamp_threshold(raw_threshold, config.min_threshold, config.max_threshold);

    let (min_temp, max_temp, mean_temp) = clip_temperature_range(frames);

    let analysis = BackgroundAnalysis {
        threshold,
        average_delta: average_delta(frames),
        min_temp,
        max_temp,
        mean_temp,
        background_deviation,
        is_static: background_deviation < config.static_background_threshold,
    };

    debug!(
        raw_threshold,
        threshold,
        deviation = background_deviation,
        is_static = analysis.is_static,
        "Background analysis"
    );

    let background = analysis.is_static.then_some(background);
    Ok((background, analysis))
}

/// Clamp a threshold into `[min_threshold, max_threshold]`.
///
/// The upper bound wins if the bounds are inverted.
pub fn clamp_threshold(threshold: f32, min_threshold: f32, max_threshold: f32) -> f32 {
    let mut t = threshold;
    if t < min_threshold {
        t = min_threshold;
    }
    if t > max_threshold {
        t = max_threshold;
    }
    t
}

/// Mean absolute difference between consecutive frames.
pub fn average_delta(frames: &[Frame]) -> f32 {
    if frames.len() < 2 {
        return 0.0;
    }
    let total: f64 = frames
        .par_windows(2)
        .map(|pair| {
            let mut sum = 0.0f64;
            Zip::from(&pair[1].data)
                .and(&pair[0].data)
                .for_each(|&b, &a| sum += (b - a).abs() as f64);
            sum
        })
        .sum();
    let count = (frames.len() - 1) * frames[0].data.len();
    if count == 0 {
        0.0
    } else {
        (total / count as f64) as f32
    }
}

fn clip_temperature_range(frames: &[Frame]) -> (f32, f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for frame in frames {
        for &v in frame.data.iter() {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
        }
        count += frame.data.len();
    }
    if count == 0 {
        return (0.0, 0.0, 0.0);
    }
    (min, max, (sum / count as f64) as f32)
}

fn mean_abs(values: impl ExactSizeIterator<Item = f32>) -> f32 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = values.map(|v| v.abs() as f64).sum();
    (sum / n as f64) as f32
}
