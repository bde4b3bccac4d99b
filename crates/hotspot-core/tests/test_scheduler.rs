mod common;

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tempfile::{tempdir, TempDir};

use hotspot_core::error::HotspotError;
use hotspot_core::pipeline::config::Config;
use hotspot_core::scheduler::{
    discover_sources, distributed_folder, serve, JobReport, JobScheduler, JobStatus, SkipReason,
    StoreLock, WorkerRequest,
};
use hotspot_core::store::TrackDatabase;

use common::{moving_block_frames, sidecar, write_bare_header, write_clip, write_sidecar};

struct Batch {
    _dir: TempDir,
    config: Config,
}

/// Source folder with one good clip, one without a sidecar, one whose
/// sub-tracks are all filtered out and one corrupt container.
fn batch() -> Batch {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clips");
    let nested = source.join("site-a");
    std::fs::create_dir_all(&nested).unwrap();

    let planes = moving_block_frames((32, 32), 10, (6, 12), (1, 0), 4, 150.0);

    let walk = write_clip(&nested, "walk.thv", &planes, 0);
    write_sidecar(&walk, &sidecar(&[("cat", 0.9)]));

    write_clip(&source, "nometa.thv", &planes, 0);

    let filtered = write_clip(&source, "filtered.thv", &planes, 0);
    write_sidecar(&filtered, &sidecar(&[("unidentified", 0.95), ("cat", 0.5)]));

    let broken = source.join("broken.thv");
    std::fs::write(&broken, b"not a thermal clip").unwrap();
    write_sidecar(&broken, &sidecar(&[("cat", 0.9)]));

    // Not a clip; must be ignored by discovery.
    std::fs::write(source.join("notes.md"), b"ignored").unwrap();

    let config = Config {
        source_folder: source,
        tracks_folder: dir.path().join("tracks"),
        ..Config::default()
    };
    Batch { _dir: dir, config }
}

fn status_of<'a>(summary: &'a hotspot_core::scheduler::RunSummary, name: &str) -> &'a JobStatus {
    &summary
        .reports
        .iter()
        .find(|r| r.path.file_name().and_then(|n| n.to_str()) == Some(name))
        .unwrap_or_else(|| panic!("no report for {name}"))
        .status
}

fn bucket_dir(config: &Config, base: &str) -> PathBuf {
    config.tracks_folder.join(distributed_folder(base, 256))
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[test]
fn test_discovery_is_recursive_sorted_and_filtered() {
    let batch = batch();
    let files = discover_sources(&batch.config.source_folder, "thv").unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.strip_prefix(&batch.config.source_folder).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("broken.thv"),
            PathBuf::from("filtered.thv"),
            PathBuf::from("nometa.thv"),
            Path::new("site-a").join("walk.thv"),
        ]
    );
}

#[test]
fn test_unreadable_source_root_aborts_before_jobs() {
    let dir = tempdir().unwrap();
    let config = Config {
        source_folder: dir.path().join("missing"),
        tracks_folder: dir.path().join("tracks"),
        ..Config::default()
    };
    assert!(JobScheduler::new(config.clone()).run().is_err());
    assert!(!config.database_path().exists());
}

// ---------------------------------------------------------------------------
// Inline batch
// ---------------------------------------------------------------------------

#[test]
fn test_inline_batch_statuses() {
    let batch = batch();
    let summary = JobScheduler::new(batch.config.clone()).run().unwrap();

    assert_eq!(summary.reports.len(), 4);
    assert_eq!(summary.processed(), 1);
    assert_eq!(summary.skipped(), 3);
    assert_eq!(summary.failed(), 0);
    assert!(matches!(
        status_of(&summary, "walk.thv"),
        JobStatus::Processed { tracks: 1, frames: 10 }
    ));
    assert_eq!(
        status_of(&summary, "nometa.thv"),
        &JobStatus::Skipped(SkipReason::MissingMetadata)
    );
    assert_eq!(
        status_of(&summary, "filtered.thv"),
        &JobStatus::Skipped(SkipReason::NoValidTracks)
    );
    assert_eq!(
        status_of(&summary, "broken.thv"),
        &JobStatus::Skipped(SkipReason::DecodeFailure)
    );
}

#[test]
fn test_store_contents_after_batch() {
    let batch = batch();
    JobScheduler::new(batch.config.clone()).run().unwrap();

    let db = TrackDatabase::open(&batch.config.database_path(), false).unwrap();
    let ids: Vec<_> = db.clips().keys().cloned().collect();
    assert_eq!(ids, vec!["filtered".to_string(), "site-a/walk".to_string()]);

    let walk = db.clip("site-a/walk").unwrap();
    assert_eq!(walk.frame_count, 10);
    assert_eq!(walk.frame_min.len(), 10);
    assert_eq!(walk.tracks.len(), 1);
    assert_eq!(walk.tracks[0].tag.as_deref(), Some("cat"));
    assert_eq!(walk.tracks[0].regions.len(), 10);

    // Filtered sub-tracks leave only a placeholder.
    let filtered = db.clip("filtered").unwrap();
    assert!(filtered.tracks.is_empty());
    assert!(filtered.start_time.is_none());
}

fn single_clip_config(dir: &Path) -> Config {
    Config {
        source_folder: dir.join("clips"),
        tracks_folder: dir.join("tracks"),
        ..Config::default()
    }
}

#[test]
fn test_only_valid_sub_tracks_label_exported_tracks() {
    let dir = tempdir().unwrap();
    let config = single_clip_config(dir.path());
    std::fs::create_dir_all(&config.source_folder).unwrap();

    // The walk spans 0 .. 10/9 s. The excluded and unconfident sub-tracks
    // overlap it for longer than the valid one does.
    let planes = moving_block_frames((32, 32), 10, (6, 12), (1, 0), 4, 150.0);
    let clip = write_clip(&config.source_folder, "mixed.thv", &planes, 0);
    write_sidecar(
        &clip,
        r#"{"tracks": [
            {"start_s": 0.0, "end_s": 10.0, "tag": "unidentified", "confidence": 0.95},
            {"start_s": 0.0, "end_s": 10.0, "tag": "possum", "confidence": 0.5},
            {"start_s": 0.0, "end_s": 0.3, "tag": "cat", "confidence": 0.9}
        ]}"#,
    );

    let summary = JobScheduler::new(config.clone()).run().unwrap();
    assert_eq!(summary.processed(), 1);

    let db = TrackDatabase::open(&config.database_path(), false).unwrap();
    let tracks = &db.clip("mixed").unwrap().tracks;
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].tag.as_deref(), Some("cat"));
    assert_eq!(tracks[0].confidence, Some(0.9));
}

#[test]
fn test_corrupt_header_is_skipped_without_stopping_batch() {
    let dir = tempdir().unwrap();
    let config = single_clip_config(dir.path());
    std::fs::create_dir_all(&config.source_folder).unwrap();

    let huge = config.source_folder.join("huge.thv");
    write_bare_header(&huge, 1 << 31, 1 << 31, 2);
    write_sidecar(&huge, &sidecar(&[("cat", 0.9)]));

    let planes = moving_block_frames((32, 32), 10, (6, 12), (1, 0), 4, 150.0);
    let walk = write_clip(&config.source_folder, "walk.thv", &planes, 0);
    write_sidecar(&walk, &sidecar(&[("cat", 0.9)]));

    let summary = JobScheduler::new(config.clone()).run().unwrap();
    assert_eq!(
        status_of(&summary, "huge.thv"),
        &JobStatus::Skipped(SkipReason::DecodeFailure)
    );
    assert!(matches!(
        status_of(&summary, "walk.thv"),
        JobStatus::Processed { tracks: 1, .. }
    ));
}

#[test]
fn test_track_output_disabled_writes_nothing() {
    let mut batch = batch();
    batch.config.tracking.enable_track_output = false;
    let summary = JobScheduler::new(batch.config.clone()).run().unwrap();
    assert_eq!(summary.processed(), 1);
    assert!(!batch.config.database_path().exists());
}

#[test]
fn test_rerun_produces_identical_store() {
    let batch = batch();
    JobScheduler::new(batch.config.clone()).run().unwrap();
    let first = std::fs::read(batch.config.database_path()).unwrap();
    JobScheduler::new(batch.config.clone()).run().unwrap();
    let second = std::fs::read(batch.config.database_path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_job_order_does_not_change_store() {
    let batch = batch();
    let mut files = discover_sources(&batch.config.source_folder, "thv").unwrap();
    JobScheduler::new(batch.config.clone())
        .run_files(files.clone())
        .unwrap();
    let forward = std::fs::read(batch.config.database_path()).unwrap();

    std::fs::remove_file(batch.config.database_path()).unwrap();
    files.reverse();
    JobScheduler::new(batch.config.clone()).run_files(files).unwrap();
    let reversed = std::fs::read(batch.config.database_path()).unwrap();
    assert_eq!(forward, reversed);
}

#[test]
fn test_preview_written_and_stale_previews_purged() {
    let mut batch = batch();
    batch.config.load.preview = true;
    let bucket = bucket_dir(&batch.config, "walk");
    std::fs::create_dir_all(&bucket).unwrap();
    let stale = bucket.join("walk-7-preview.png");
    std::fs::write(&stale, b"old").unwrap();

    JobScheduler::new(batch.config.clone()).run().unwrap();

    assert!(!stale.exists());
    let preview = bucket.join("walk-preview.png");
    assert!(preview.exists());
    let img = image::open(&preview).unwrap();
    assert_eq!((img.width(), img.height()), (32, 32));
}

#[test]
fn test_bucket_folders_created_per_file() {
    let batch = batch();
    JobScheduler::new(batch.config.clone()).run().unwrap();
    for base in ["walk", "nometa", "filtered", "broken"] {
        assert!(bucket_dir(&batch.config, base).is_dir(), "{base}");
    }
}

#[test]
fn test_compressed_store() {
    let mut batch = batch();
    batch.config.load.enable_compression = true;
    JobScheduler::new(batch.config.clone()).run().unwrap();
    let bytes = std::fs::read(batch.config.database_path()).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    let db = TrackDatabase::open(&batch.config.database_path(), true).unwrap();
    assert_eq!(db.clips().len(), 2);
}

#[test]
fn test_cancelled_batch_stops_before_jobs() {
    let batch = batch();
    let cancel = Arc::new(AtomicBool::new(true));
    let result = JobScheduler::new(batch.config.clone())
        .with_cancel_flag(cancel)
        .run();
    assert!(matches!(result, Err(HotspotError::Interrupted)));
    assert!(!batch.config.database_path().exists());
}

// ---------------------------------------------------------------------------
// Worker protocol
// ---------------------------------------------------------------------------

fn request_lines(requests: &[WorkerRequest]) -> Cursor<Vec<u8>> {
    let mut text = String::new();
    for request in requests {
        text.push_str(&serde_json::to_string(request).unwrap());
        text.push('\n');
    }
    Cursor::new(text.into_bytes())
}

#[test]
fn test_worker_answers_each_job_with_one_report() {
    let batch = batch();
    let source = &batch.config.source_folder;
    let requests = [
        WorkerRequest::Configure {
            config: Box::new(batch.config.clone()),
        },
        WorkerRequest::Process {
            path: source.join("site-a").join("walk.thv"),
        },
        WorkerRequest::Process {
            path: source.join("nometa.thv"),
        },
    ];
    let lock = StoreLock::open(&batch.config.lock_path()).unwrap();
    let mut output = Vec::new();
    serve(request_lines(&requests), &mut output, lock).unwrap();

    let reports: Vec<JobReport> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(reports.len(), 2);
    assert!(matches!(reports[0].status, JobStatus::Processed { tracks: 1, .. }));
    assert_eq!(
        reports[1].status,
        JobStatus::Skipped(SkipReason::MissingMetadata)
    );

    let db = TrackDatabase::open(&batch.config.database_path(), false).unwrap();
    assert!(db.clip("site-a/walk").is_some());
}

#[test]
fn test_worker_with_closed_input_exits_cleanly() {
    let dir = tempdir().unwrap();
    let lock = StoreLock::open(&dir.path().join("dataset.lock")).unwrap();
    let mut output = Vec::new();
    serve(Cursor::new(Vec::new()), &mut output, lock).unwrap();
    assert!(output.is_empty());
}

#[test]
fn test_worker_rejects_job_before_configure() {
    let dir = tempdir().unwrap();
    let lock = StoreLock::open(&dir.path().join("dataset.lock")).unwrap();
    let requests = [WorkerRequest::Process {
        path: dir.path().join("clip.thv"),
    }];
    let mut output = Vec::new();
    assert!(matches!(
        serve(request_lines(&requests), &mut output, lock),
        Err(HotspotError::Worker(_))
    ));
}
