//! Structured output of the batch: one record per visited clip.

pub mod database;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::background::BackgroundAnalysis;
use crate::clip::Clip;
use crate::detection::Region;
use crate::error::Result;
use crate::track::{Track, TrackMovementStatistics};

pub use database::TrackDatabase;

/// Narrow write contract used by the scheduler.
pub trait TrackStore {
    /// Create (or replace) the record for a clip.
    fn create_clip(&mut self, clip: ClipRecord) -> Result<()>;

    /// Append a track to an existing clip record.
    fn add_track(&mut self, clip_id: &str, track: TrackRecord) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipRecord {
    pub clip_id: String,
    pub source_file: String,
    pub device_name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub frames_per_second: u32,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
    pub background_analysis: Option<BackgroundAnalysis>,
    pub frame_min: Vec<f32>,
    pub frame_max: Vec<f32>,
    pub frame_median: Vec<f32>,
    pub frame_mean: Vec<f32>,
    pub tracks: Vec<TrackRecord>,
}

impl ClipRecord {
    /// Record for a processed clip, without its tracks.
    pub fn from_clip(clip_id: &str, clip: &Clip) -> Self {
        Self {
            clip_id: clip_id.to_string(),
            source_file: clip.source_file.display().to_string(),
            device_name: clip.header.device_name.clone(),
            start_time: Some(clip.start_time),
            frames_per_second: clip.header.frames_per_second,
            width: clip.header.width,
            height: clip.header.height,
            frame_count: clip.frame_count(),
            background_analysis: Some(clip.analysis.clone()),
            frame_min: clip.frame_min(),
            frame_max: clip.frame_max(),
            frame_median: clip.frame_median(),
            frame_mean: clip.frame_mean(),
            tracks: Vec::new(),
        }
    }

    /// Record for a clip that was visited but not decoded.
    pub fn placeholder(clip_id: &str, source_file: &str) -> Self {
        Self {
            clip_id: clip_id.to_string(),
            source_file: source_file.to_string(),
            device_name: String::new(),
            start_time: None,
            frames_per_second: 0,
            width: 0,
            height: 0,
            frame_count: 0,
            background_analysis: None,
            frame_min: Vec::new(),
            frame_max: Vec::new(),
            frame_median: Vec::new(),
            frame_mean: Vec::new(),
            tracks: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub track_id: u32,
    pub tag: Option<String>,
    pub confidence: Option<f64>,
    pub start_s: f64,
    pub end_s: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub statistics: TrackMovementStatistics,
    pub regions: Vec<Region>,
}

impl TrackRecord {
    pub fn from_track(clip: &Clip, track: &Track) -> Self {
        let fps = clip.frames_per_second();
        let (start_time, end_time) = clip.start_and_end_time_absolute(track);
        Self {
            track_id: track.id,
            tag: track.tag.clone(),
            confidence: track.confidence,
            start_s: track.start_s(fps),
            end_s: track.end_s(fps),
            start_time,
            end_time,
            statistics: track.movement_statistics(),
            regions: track.regions().to_vec(),
        }
    }
}
