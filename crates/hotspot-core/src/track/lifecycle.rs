use serde::{Deserialize, Serialize};

use crate::detection::Region;
use crate::error::{HotspotError, Result};

use super::stats::TrackMovementStatistics;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    Open,
    Closed,
}

/// A frame-contiguous trajectory of one detected component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: u32,
    pub state: TrackState,
    regions: Vec<Region>,
    /// Label taken from the sidecar sub-track this track was matched to.
    pub tag: Option<String>,
    pub confidence: Option<f64>,
}

impl Track {
    pub fn new(id: u32, first: Region) -> Self {
        Self {
            id,
            state: TrackState::Open,
            regions: vec![first],
            tag: None,
            confidence: None,
        }
    }

    /// Append the region for the frame directly after the current last one.
    pub fn add_region(&mut self, region: Region) -> Result<()> {
        let last = self.end_frame();
        if region.frame_index != last + 1 {
            return Err(HotspotError::NonContiguousTrack {
                last,
                got: region.frame_index,
            });
        }
        self.regions.push(region);
        Ok(())
    }

    pub fn close(&mut self) {
        self.state = TrackState::Closed;
    }

    pub fn is_open(&self) -> bool {
        self.state == TrackState::Open
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn last_region(&self) -> &Region {
        // A track always holds at least the region it was created with.
        &self.regions[self.regions.len() - 1]
    }

    pub fn start_frame(&self) -> usize {
        self.regions[0].frame_index
    }

    pub fn end_frame(&self) -> usize {
        self.last_region().frame_index
    }

    pub fn frame_count(&self) -> usize {
        self.regions.len()
    }

    /// Start offset into the clip in seconds.
    pub fn start_s(&self, fps: f64) -> f64 {
        self.start_frame() as f64 / fps
    }

    /// End offset in seconds; covers the whole last frame.
    pub fn end_s(&self, fps: f64) -> f64 {
        (self.end_frame() + 1) as f64 / fps
    }

    pub fn movement_statistics(&self) -> TrackMovementStatistics {
        TrackMovementStatistics::from_regions(&self.regions)
    }
}
