//! One processed recording: background, per-frame detections, optional
//! motion fields and the assembled tracks.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::background::{estimate_background, BackgroundAnalysis, BackgroundModel};
use crate::detection::{DetectionResult, FrameDetector};
use crate::error::{HotspotError, Result};
use crate::flow::{generate_flow, FlowField};
use crate::frame::{CropRect, Frame, FrameStats};
use crate::io::metadata::TrackMeta;
use crate::io::{ClipHeader, FrameSource};
use crate::pipeline::config::TrackingConfig;
use crate::track::{Track, TrackAssembler};

pub struct Clip {
    pub source_file: PathBuf,
    pub header: ClipHeader,
    pub start_time: DateTime<Utc>,
    pub crop: CropRect,
    pub background: BackgroundModel,
    pub analysis: BackgroundAnalysis,
    /// Threshold that was active during detection.
    pub threshold: f32,
    pub frame_stats: Vec<FrameStats>,
    pub detections: Vec<DetectionResult>,
    /// One field per consecutive frame pair once computed.
    pub flow: Option<Vec<FlowField>>,
    pub tracks: Vec<Track>,
}

impl Clip {
    /// Decode every frame of `source` and run the full pipeline on it.
    pub fn from_source(
        source_file: &Path,
        source: &dyn FrameSource,
        config: &TrackingConfig,
    ) -> Result<Self> {
        let frames = source.read_all()?;
        Self::process(source_file, source.header().clone(), frames, config)
    }

    /// Run background estimation, detection, flow and track assembly.
    pub fn process(
        source_file: &Path,
        header: ClipHeader,
        frames: Vec<Frame>,
        config: &TrackingConfig,
    ) -> Result<Self> {
        if frames.is_empty() {
            return Err(HotspotError::EmptySequence);
        }

        let crop = CropRect::from_edge(
            header.width as usize,
            header.height as usize,
            config.edge_pixels,
        )?;

        // Stage 1: whole-clip background.
        let estimate = estimate_background(
            &frames,
            header.preview_secs,
            header.frames_per_second,
            config,
        )?;
        info!(
            file = %source_file.display(),
            background = ?config.background_calc,
            enabled = estimate.model.is_enabled(),
            threshold = estimate.threshold,
            "Background estimated"
        );

        // Stage 2: independent per-frame detection.
        let detector = FrameDetector::new(&estimate.model, estimate.threshold, crop, config);
        let detections: Vec<DetectionResult> =
            frames.par_iter().map(|f| detector.detect(f)).collect();
        drop(frames);

        let frame_stats = detections.iter().map(|d| d.stats).collect();

        let mut clip = Self {
            source_file: source_file.to_path_buf(),
            start_time: header.start_time()?,
            header,
            crop,
            background: estimate.model,
            analysis: estimate.analysis,
            threshold: estimate.threshold,
            frame_stats,
            detections,
            flow: None,
            tracks: Vec::new(),
        };

        clip.generate_optical_flow(config);
        clip.assemble_tracks(config.max_match_distance)?;
        Ok(clip)
    }

    pub fn frame_count(&self) -> usize {
        self.detections.len()
    }

    pub fn frames_per_second(&self) -> f64 {
        self.header.frames_per_second as f64
    }

    /// Compute motion fields between consecutive filtered frames. Does
    /// nothing if they already exist.
    pub fn generate_optical_flow(&mut self, config: &TrackingConfig) {
        if self.flow.is_some() {
            return;
        }
        let filtered: Vec<Array2<f32>> =
            self.detections.iter().map(|d| d.filtered.clone()).collect();
        let fields = generate_flow(&filtered, config);
        debug!(fields = fields.len(), "Optical flow generated");
        self.flow = Some(fields);
    }

    fn assemble_tracks(&mut self, max_match_distance: f64) -> Result<()> {
        let mut assembler = TrackAssembler::new(max_match_distance);
        for detection in &self.detections {
            assembler.update(detection.frame_index, &detection.regions)?;
        }
        self.tracks = assembler.finish();
        Ok(())
    }

    /// Keep only tracks overlapping a declared sub-track in time, labelling
    /// each with the sub-track it overlaps most.
    ///
    /// Ties go to the sub-track declared first.
    pub fn label_tracks(&mut self, declared: &[TrackMeta]) {
        let fps = self.frames_per_second();
        self.tracks.retain_mut(|track| {
            let start = track.start_s(fps);
            let end = track.end_s(fps);
            let mut best: Option<(&TrackMeta, f64)> = None;
            for meta in declared {
                let overlap = meta.overlap_secs(start, end);
                if overlap > 0.0 && best.map_or(true, |(_, b)| overlap > b) {
                    best = Some((meta, overlap));
                }
            }
            match best {
                Some((meta, _)) => {
                    track.tag = Some(meta.tag.clone());
                    track.confidence = Some(meta.confidence);
                    true
                }
                None => false,
            }
        });
    }

    /// Absolute start and end time of a track.
    pub fn start_and_end_time_absolute(&self, track: &Track) -> (DateTime<Utc>, DateTime<Utc>) {
        let fps = self.frames_per_second();
        (
            self.start_time + seconds(track.start_s(fps)),
            self.start_time + seconds(track.end_s(fps)),
        )
    }

    pub fn frame_min(&self) -> Vec<f32> {
        self.frame_stats.iter().map(|s| s.min).collect()
    }

    pub fn frame_max(&self) -> Vec<f32> {
        self.frame_stats.iter().map(|s| s.max).collect()
    }

    pub fn frame_median(&self) -> Vec<f32> {
        self.frame_stats.iter().map(|s| s.median).collect()
    }

    pub fn frame_mean(&self) -> Vec<f32> {
        self.frame_stats.iter().map(|s| s.mean).collect()
    }
}

fn seconds(secs: f64) -> Duration {
    Duration::microseconds((secs * 1_000_000.0).round() as i64)
}
