use ndarray::Array2;

use crate::background::BackgroundModel;
use crate::frame::{CropRect, Frame, FrameStats};
use crate::pipeline::config::TrackingConfig;

use super::components::{label_components, Labeling};
use super::filtered::filter_frame;
use super::morphology::dilate_square;
use super::region::{extract_regions, Region};
use super::threshold::blur_and_threshold;

/// Per-frame detection result.
#[derive(Clone, Debug)]
pub struct DetectionResult {
    pub frame_index: usize,
    /// Background-subtracted frame (full size).
    pub filtered: Array2<f32>,
    /// Component labels in full-frame coordinates; the edge band is 0.
    pub labels: Array2<u32>,
    pub regions: Vec<Region>,
    /// Statistics of the raw frame.
    pub stats: FrameStats,
}

/// Stage 2 of clip processing: a pure `(Frame, BackgroundModel) -> DetectionResult`
/// transform. Holds only borrowed, immutable state so frames can be
/// processed in any order or in parallel.
pub struct FrameDetector<'a> {
    model: &'a BackgroundModel,
    threshold: f32,
    crop: CropRect,
    config: &'a TrackingConfig,
}

impl<'a> FrameDetector<'a> {
    pub fn new(
        model: &'a BackgroundModel,
        threshold: f32,
        crop: CropRect,
        config: &'a TrackingConfig,
    ) -> Self {
        Self {
            model,
            threshold,
            crop,
            config,
        }
    }

    /// Detect foreground components in a single frame.
    ///
    /// Pipeline: background filter -> crop edges -> blur + threshold ->
    /// optional dilation -> connected components -> re-embed -> regions.
    pub fn detect(&self, frame: &Frame) -> DetectionResult {
        let (h, w) = frame.data.dim();

        let filtered = filter_frame(&frame.data, self.model, self.config.temp_thresh);

        // Edge pixels of the sensor are unreliable.
        let edgeless = self.crop.subimage(&filtered);

        let mut mask = blur_and_threshold(edgeless, self.threshold);

        // Dilation groups pixels that are near each other into one component.
        if self.config.dilation_pixels > 0 {
            mask = dilate_square(&mask, self.config.dilation_pixels);
        }

        let small = label_components(&mask);
        let labeling = Labeling {
            labels: self.crop.embed(&small.labels, h, w),
            count: small.count,
        };
        let regions = extract_regions(&labeling, &filtered, frame.index);

        DetectionResult {
            frame_index: frame.index,
            stats: FrameStats::from_array(&frame.data),
            filtered,
            labels: labeling.labels,
            regions,
        }
    }
}
