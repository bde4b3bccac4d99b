use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Top-level run configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root folder searched recursively for clips.
    pub source_folder: PathBuf,
    /// Folder receiving the track store and per-clip artifacts.
    pub tracks_folder: PathBuf,
    /// Worker processes; 0 runs every job inline.
    #[serde(default)]
    pub worker_count: usize,
    /// Rayon threads each worker process may use.
    #[serde(default = "default_threads_per_worker")]
    pub threads_per_worker: usize,
    /// Sub-track tags that are never exported.
    #[serde(default = "default_excluded_tags")]
    pub excluded_tags: Vec<String>,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_folder: PathBuf::from("clips"),
            tracks_folder: PathBuf::from("tracks"),
            worker_count: 0,
            threads_per_worker: DEFAULT_THREADS_PER_WORKER,
            excluded_tags: default_excluded_tags(),
            tracking: TrackingConfig::default(),
            load: LoadConfig::default(),
        }
    }
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.tracks_folder.join(DATABASE_FILE_NAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.tracks_folder.join(LOCK_FILE_NAME)
    }
}

fn default_threads_per_worker() -> usize {
    DEFAULT_THREADS_PER_WORKER
}

fn default_excluded_tags() -> Vec<String> {
    ["untagged", "unidentified", "part", "poor tracking"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// How the reference scene is estimated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundCalc {
    /// Per-pixel low percentile over the whole clip.
    #[default]
    Statistical,
    /// Mean of the motion-trigger preview frames.
    PreviewWindow,
}

impl fmt::Display for BackgroundCalc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statistical => write!(f, "Statistical"),
            Self::PreviewWindow => write!(f, "Preview Window"),
        }
    }
}

/// Detection and tracking parameters applied to each clip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Margin discarded on every side of the frame.
    #[serde(default = "default_edge_pixels")]
    pub edge_pixels: usize,
    /// Trailing preview frames left out of the preview background.
    #[serde(default = "default_ignore_frames")]
    pub ignore_frames: usize,
    /// Fixed threshold used with a preview background.
    #[serde(default = "default_delta_thresh")]
    pub delta_thresh: f32,
    /// Pixels below this are zeroed before preview background subtraction.
    #[serde(default = "default_temp_thresh")]
    pub temp_thresh: f32,
    /// Percentile of the filtered clip used as the statistical threshold.
    #[serde(default = "default_threshold_percentile")]
    pub threshold_percentile: f64,
    #[serde(default = "default_min_threshold")]
    pub min_threshold: f32,
    #[serde(default = "default_max_threshold")]
    pub max_threshold: f32,
    /// Mean absolute filtered value below which the scene counts as static.
    #[serde(default = "default_static_background_threshold")]
    pub static_background_threshold: f32,
    /// Dilation radius merging nearby foreground pixels; 0 disables.
    #[serde(default = "default_dilation_pixels")]
    pub dilation_pixels: usize,
    /// Flow vectors shorter than this (pixels per frame) are zeroed.
    #[serde(default = "default_flow_threshold")]
    pub flow_threshold: f32,
    #[serde(default)]
    pub high_quality_optical_flow: bool,
    #[serde(default)]
    pub background_calc: BackgroundCalc,
    #[serde(default = "default_min_tag_confidence")]
    pub min_tag_confidence: f64,
    /// Largest centroid jump (pixels) that still continues a track.
    #[serde(default = "default_max_match_distance")]
    pub max_match_distance: f64,
    #[serde(default = "default_true")]
    pub enable_track_output: bool,
}

fn default_edge_pixels() -> usize {
    DEFAULT_EDGE_PIXELS
}
fn default_ignore_frames() -> usize {
    DEFAULT_IGNORE_FRAMES
}
fn default_delta_thresh() -> f32 {
    DEFAULT_DELTA_THRESH
}
fn default_temp_thresh() -> f32 {
    DEFAULT_TEMP_THRESH
}
fn default_threshold_percentile() -> f64 {
    DEFAULT_THRESHOLD_PERCENTILE
}
fn default_min_threshold() -> f32 {
    DEFAULT_MIN_THRESHOLD
}
fn default_max_threshold() -> f32 {
    DEFAULT_MAX_THRESHOLD
}
fn default_static_background_threshold() -> f32 {
    DEFAULT_STATIC_BACKGROUND_THRESHOLD
}
fn default_dilation_pixels() -> usize {
    DEFAULT_DILATION_PIXELS
}
fn default_flow_threshold() -> f32 {
    DEFAULT_FLOW_THRESHOLD
}
fn default_min_tag_confidence() -> f64 {
    DEFAULT_MIN_TAG_CONFIDENCE
}
fn default_max_match_distance() -> f64 {
    DEFAULT_MAX_MATCH_DISTANCE
}
fn default_true() -> bool {
    true
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            edge_pixels: DEFAULT_EDGE_PIXELS,
            ignore_frames: DEFAULT_IGNORE_FRAMES,
            delta_thresh: DEFAULT_DELTA_THRESH,
            temp_thresh: DEFAULT_TEMP_THRESH,
            threshold_percentile: DEFAULT_THRESHOLD_PERCENTILE,
            min_threshold: DEFAULT_MIN_THRESHOLD,
            max_threshold: DEFAULT_MAX_THRESHOLD,
            static_background_threshold: DEFAULT_STATIC_BACKGROUND_THRESHOLD,
            dilation_pixels: DEFAULT_DILATION_PIXELS,
            flow_threshold: DEFAULT_FLOW_THRESHOLD,
            high_quality_optical_flow: false,
            background_calc: BackgroundCalc::default(),
            min_tag_confidence: DEFAULT_MIN_TAG_CONFIDENCE,
            max_match_distance: DEFAULT_MAX_MATCH_DISTANCE,
            enable_track_output: true,
        }
    }
}

/// Source discovery and output options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Gzip the track store document.
    #[serde(default)]
    pub enable_compression: bool,
    /// Write a still PNG preview per clip into its bucket folder.
    #[serde(default)]
    pub preview: bool,
    /// Extension (without dot) of clip containers to process.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
}

fn default_source_extension() -> String {
    DEFAULT_SOURCE_EXTENSION.to_string()
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            enable_compression: false,
            preview: false,
            source_extension: default_source_extension(),
        }
    }
}
