use tracing::debug;

use crate::detection::Region;
use crate::error::Result;

use super::lifecycle::Track;

/// Links per-frame regions into tracks.
///
/// For every frame, (open track, region) pairs are eligible when the
/// region's box overlaps the track's last box or the centroids are within
/// `max_distance`. Pairs are claimed greedily by ascending centroid distance,
/// ties broken by lower track id and then lower region index. A track that
/// loses its region to a nearer track closes; regions left over start new
/// tracks. Any gap in frame indices closes every open track.
pub struct TrackAssembler {
    max_distance: f64,
    tracks: Vec<Track>,
    next_id: u32,
    last_frame: Option<usize>,
}

struct Candidate {
    distance: f64,
    track_id: u32,
    track_pos: usize,
    region_index: usize,
}

impl TrackAssembler {
    pub fn new(max_distance: f64) -> Self {
        Self {
            max_distance,
            tracks: Vec::new(),
            next_id: 1,
            last_frame: None,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Feed the regions detected in `frame_index`. Frames must arrive in
    /// increasing order.
    pub fn update(&mut self, frame_index: usize, regions: &[Region]) -> Result<()> {
        if let Some(last) = self.last_frame {
            if frame_index != last + 1 {
                debug!(last, frame_index, "frame gap, closing open tracks");
                self.close_open();
            }
        }
        self.last_frame = Some(frame_index);

        let mut candidates = Vec::new();
        for (track_pos, track) in self.tracks.iter().enumerate() {
            if !track.is_open() {
                continue;
            }
            let last = track.last_region();
            for (region_index, region) in regions.iter().enumerate() {
                let distance = last.distance_to(region);
                if distance <= self.max_distance || last.bbox.overlaps(&region.bbox) {
                    candidates.push(Candidate {
                        distance,
                        track_id: track.id,
                        track_pos,
                        region_index,
                    });
                }
            }
        }
        candidates.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.track_id.cmp(&b.track_id))
                .then(a.region_index.cmp(&b.region_index))
        });

        let mut track_taken = vec![false; self.tracks.len()];
        let mut region_taken = vec![false; regions.len()];
        for c in candidates {
            if track_taken[c.track_pos] || region_taken[c.region_index] {
                continue;
            }
            let mut region = regions[c.region_index].clone();
            region.frame_index = frame_index;
            self.tracks[c.track_pos].add_region(region)?;
            track_taken[c.track_pos] = true;
            region_taken[c.region_index] = true;
        }

        for (track, taken) in self.tracks.iter_mut().zip(&track_taken) {
            if track.is_open() && !taken {
                track.close();
            }
        }

        for (region, taken) in regions.iter().zip(&region_taken) {
            if !taken {
                let mut region = region.clone();
                region.frame_index = frame_index;
                self.tracks.push(Track::new(self.next_id, region));
                self.next_id += 1;
            }
        }

        Ok(())
    }

    /// Close every remaining track and hand them over in id order.
    pub fn finish(mut self) -> Vec<Track> {
        self.close_open();
        self.tracks
    }

    fn close_open(&mut self) {
        for track in self.tracks.iter_mut().filter(|t| t.is_open()) {
            track.close();
        }
    }
}
