//! Sidecar metadata declaring the tagged sub-tracks of a clip.
//!
//! The sidecar lives next to the clip as `<base>.txt` and holds JSON:
//!
//! ```json
//! {"tracks": [{"start_s": 1.0, "end_s": 4.5, "tag": "cat", "confidence": 0.9}]}
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::METADATA_EXTENSION;
use crate::error::{HotspotError, Result};

/// One declared sub-track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackMeta {
    pub start_s: f64,
    pub end_s: f64,
    pub tag: String,
    pub confidence: f64,
}

impl TrackMeta {
    /// Confident enough and not in the excluded set.
    pub fn is_valid(&self, min_confidence: f64, excluded_tags: &[String]) -> bool {
        self.confidence >= min_confidence && !excluded_tags.iter().any(|t| t == &self.tag)
    }

    /// Seconds shared between this sub-track and `[start_s, end_s)`.
    pub fn overlap_secs(&self, start_s: f64, end_s: f64) -> f64 {
        (self.end_s.min(end_s) - self.start_s.max(start_s)).max(0.0)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.tag.trim().is_empty() {
            return Err("track tag is empty".into());
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "confidence {} for tag {:?} is outside [0, 1]",
                self.confidence, self.tag
            ));
        }
        if !self.start_s.is_finite() || !self.end_s.is_finite() || self.end_s < self.start_s {
            return Err(format!(
                "track {:?} has invalid span {}..{}",
                self.tag, self.start_s, self.end_s
            ));
        }
        Ok(())
    }
}

/// Parsed and validated sidecar contents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipMetadata {
    #[serde(default)]
    pub tracks: Vec<TrackMeta>,
}

impl ClipMetadata {
    /// Parse sidecar JSON, rejecting any schema or range violation.
    pub fn from_json(path: &Path, text: &str) -> Result<Self> {
        let metadata: ClipMetadata =
            serde_json::from_str(text).map_err(|e| HotspotError::InvalidMetadata {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        for track in &metadata.tracks {
            track
                .validate()
                .map_err(|reason| HotspotError::InvalidMetadata {
                    path: path.to_path_buf(),
                    reason,
                })?;
        }
        Ok(metadata)
    }

    /// Load the sidecar belonging to `clip_path`.
    pub fn load_for_clip(clip_path: &Path) -> Result<Self> {
        let path = metadata_path(clip_path);
        if !path.is_file() {
            return Err(HotspotError::MissingMetadata(path));
        }
        let text = std::fs::read_to_string(&path)?;
        Self::from_json(&path, &text)
    }

    /// Sub-tracks that survive the confidence and exclusion filters.
    pub fn valid_tracks(&self, min_confidence: f64, excluded_tags: &[String]) -> Vec<TrackMeta> {
        self.tracks
            .iter()
            .filter(|t| t.is_valid(min_confidence, excluded_tags))
            .cloned()
            .collect()
    }
}

/// Sidecar path for a clip: same folder and stem, `.txt` extension.
pub fn metadata_path(clip_path: &Path) -> PathBuf {
    clip_path.with_extension(METADATA_EXTENSION)
}
