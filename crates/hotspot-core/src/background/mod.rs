//! Stage 1 of clip processing: batch-consume every frame of a clip and
//! produce the reference scene model used by per-frame detection.

pub mod preview;
pub mod statistical;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::frame::Frame;
use crate::pipeline::config::{BackgroundCalc, TrackingConfig};

pub use statistical::{clamp_threshold, statistical_background};

/// Clip-wide statistics gathered while estimating the background.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundAnalysis {
    /// Clamped percentile of the background-subtracted clip.
    pub threshold: f32,
    /// Mean absolute difference between consecutive frames.
    pub average_delta: f32,
    pub min_temp: f32,
    pub max_temp: f32,
    pub mean_temp: f32,
    /// Mean absolute background-subtracted value.
    pub background_deviation: f32,
    pub is_static: bool,
}

/// Reference scene subtracted from each frame before detection.
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundModel {
    /// No usable background; frames are detrended by their own median.
    Disabled,
    /// Statistical background of a static scene.
    Static(Array2<f32>),
    /// Mean of the preview window and its average value.
    Preview { image: Array2<f32>, mean_value: f32 },
}

impl BackgroundModel {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    pub fn image(&self) -> Option<&Array2<f32>> {
        match self {
            Self::Disabled => None,
            Self::Static(image) | Self::Preview { image, .. } => Some(image),
        }
    }
}

/// Output of stage 1: the model, the clip analysis and the active threshold.
#[derive(Clone, Debug)]
pub struct BackgroundEstimate {
    pub model: BackgroundModel,
    pub analysis: BackgroundAnalysis,
    /// Threshold subtracted from blurred filtered frames during detection.
    pub threshold: f32,
}

/// Estimate the background of a whole clip with the configured strategy.
///
/// The statistical analysis always runs. A non-static scene disables
/// background subtraction whichever strategy is selected.
pub fn estimate_background(
    frames: &[Frame],
    preview_secs: u32,
    frames_per_second: u32,
    config: &TrackingConfig,
) -> Result<BackgroundEstimate> {
    let (static_background, analysis) = statistical_background(frames, config)?;

    let statistical = |background: Option<Array2<f32>>, analysis: BackgroundAnalysis| {
        let threshold = analysis.threshold;
        BackgroundEstimate {
            model: background.map_or(BackgroundModel::Disabled, BackgroundModel::Static),
            analysis,
            threshold,
        }
    };

    match config.background_calc {
        BackgroundCalc::Statistical => Ok(statistical(static_background, analysis)),
        BackgroundCalc::PreviewWindow if preview_secs == 0 => {
            info!("No preview secs defined for clip - using statistical background measurement");
            Ok(statistical(static_background, analysis))
        }
        BackgroundCalc::PreviewWindow if !analysis.is_static => {
            info!(
                deviation = analysis.background_deviation,
                "Scene is not static - background subtraction disabled"
            );
            Ok(statistical(None, analysis))
        }
        BackgroundCalc::PreviewWindow => {
            let (image, mean_value) = preview::preview_background(
                frames,
                preview_secs,
                frames_per_second,
                config.ignore_frames,
            )?;
            Ok(BackgroundEstimate {
                model: BackgroundModel::Preview { image, mean_value },
                analysis,
                threshold: config.delta_thresh,
            })
        }
    }
}
