use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, warn};

use crate::clip::Clip;
use crate::consts::DEFAULT_BUCKET_COUNT;
use crate::error::{HotspotError, Result};
use crate::io::metadata::ClipMetadata;
use crate::io::ThermalReader;
use crate::pipeline::config::Config;
use crate::preview::write_preview;
use crate::store::{ClipRecord, TrackDatabase, TrackRecord, TrackStore};

use super::lock::StoreLock;
use super::protocol::{JobReport, JobStatus, SkipReason};
use super::shard::distributed_folder;

/// Per-worker context: the run configuration plus the shared store lock.
pub struct ClipLoader {
    config: Config,
    lock: StoreLock,
}

impl ClipLoader {
    pub fn new(config: Config, lock: StoreLock) -> Self {
        Self { config, lock }
    }

    /// Run one file end to end. Never fails: errors become the report status.
    pub fn process_file(&self, path: &Path) -> JobReport {
        let started = Instant::now();
        let status = match self.try_process(path) {
            Ok(status) => status,
            Err(e) => classify_error(path, e),
        };
        JobReport {
            path: path.to_path_buf(),
            status,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn try_process(&self, path: &Path) -> Result<JobStatus> {
        let started = Instant::now();
        let base = base_name(path)?;
        let clip_id = self.clip_id(path);

        let bucket_dir = self
            .config
            .tracks_folder
            .join(distributed_folder(&base, DEFAULT_BUCKET_COUNT));
        fs::create_dir_all(&bucket_dir)?;
        purge_previews(&bucket_dir, &base)?;

        let metadata = ClipMetadata::load_for_clip(path)?;
        let valid = metadata.valid_tracks(
            self.config.tracking.min_tag_confidence,
            &self.config.excluded_tags,
        );
        if valid.is_empty() {
            if self.config.tracking.enable_track_output {
                let record = ClipRecord::placeholder(&clip_id, &path.display().to_string());
                self.export(record, Vec::new())?;
            }
            return Err(HotspotError::NoValidTracks(path.to_path_buf()));
        }

        let reader = ThermalReader::open(path)?;
        let mut clip = Clip::from_source(path, &reader, &self.config.tracking)?;
        clip.label_tracks(&valid);

        if self.config.tracking.enable_track_output {
            let record = ClipRecord::from_clip(&clip_id, &clip);
            let tracks = clip
                .tracks
                .iter()
                .map(|t| TrackRecord::from_track(&clip, t))
                .collect();
            self.export(record, tracks)?;
        }

        if self.config.load.preview {
            write_preview(&clip, &bucket_dir.join(format!("{base}-preview.png")))?;
        }

        let frames = clip.frame_count();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            file = %path.display(),
            tracks = clip.tracks.len(),
            frames,
            ms_per_frame = elapsed_ms / frames.max(1) as f64,
            "Tracks exported"
        );

        Ok(JobStatus::Processed {
            tracks: clip.tracks.len(),
            frames,
        })
    }

    /// Write one clip and its tracks as a single locked unit.
    fn export(&self, record: ClipRecord, tracks: Vec<TrackRecord>) -> Result<()> {
        let _guard = self.lock.acquire()?;
        let mut database = TrackDatabase::open(
            &self.config.database_path(),
            self.config.load.enable_compression,
        )?;
        let clip_id = record.clip_id.clone();
        database.create_clip(record)?;
        for track in tracks {
            database.add_track(&clip_id, track)?;
        }
        database.commit()
    }

    /// Source path relative to the source folder, without extension.
    fn clip_id(&self, path: &Path) -> String {
        let relative = path
            .strip_prefix(&self.config.source_folder)
            .unwrap_or(path)
            .with_extension("");
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn base_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| HotspotError::InvalidClip(format!("{} has no file name", path.display())))
}

/// Remove `<base>*-preview.png` files left by earlier runs.
fn purge_previews(bucket_dir: &Path, base: &str) -> Result<()> {
    let stale: Vec<PathBuf> = fs::read_dir(bucket_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(base) && n.ends_with("-preview.png"))
                .unwrap_or(false)
        })
        .collect();
    for path in stale {
        fs::remove_file(&path)?;
    }
    Ok(())
}

fn classify_error(path: &Path, e: HotspotError) -> JobStatus {
    let file = path.display();
    match e {
        HotspotError::MissingMetadata(ref meta) => {
            warn!(file = %file, metadata = %meta.display(), "No meta data found, skipping");
            JobStatus::Skipped(SkipReason::MissingMetadata)
        }
        HotspotError::InvalidMetadata { ref reason, .. } => {
            warn!(file = %file, reason = %reason, "Invalid meta data, skipping");
            JobStatus::Skipped(SkipReason::InvalidMetadata)
        }
        HotspotError::NoValidTracks(_) => {
            warn!(file = %file, "No valid track data found, skipping");
            JobStatus::Skipped(SkipReason::NoValidTracks)
        }
        HotspotError::InvalidClip(_)
        | HotspotError::InvalidDimensions { .. }
        | HotspotError::EmptySequence
        | HotspotError::FrameIndexOutOfRange { .. } => {
            warn!(file = %file, error = %e, "Could not decode clip, skipping");
            JobStatus::Skipped(SkipReason::DecodeFailure)
        }
        HotspotError::Lock(_) => {
            error!(file = %file, error = %e, "Store lock failed");
            JobStatus::Fatal(e.to_string())
        }
        _ => {
            error!(file = %file, error = %e, "Failed to process clip");
            JobStatus::Failed(e.to_string())
        }
    }
}
