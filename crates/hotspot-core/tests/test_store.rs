use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tempfile::tempdir;

use hotspot_core::error::HotspotError;
use hotspot_core::scheduler::{distributed_folder, StoreLock};
use hotspot_core::store::{ClipRecord, TrackDatabase, TrackRecord, TrackStore};
use hotspot_core::track::TrackMovementStatistics;

fn track_record(track_id: u32) -> TrackRecord {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    TrackRecord {
        track_id,
        tag: Some("cat".into()),
        confidence: Some(0.9),
        start_s: 0.0,
        end_s: 1.0,
        start_time: start,
        end_time: start + chrono::Duration::seconds(1),
        statistics: TrackMovementStatistics::default(),
        regions: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Track database
// ---------------------------------------------------------------------------

#[test]
fn test_commit_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dataset.json");

    let mut db = TrackDatabase::open(&path, false).unwrap();
    db.create_clip(ClipRecord::placeholder("b/clip2", "clips/b/clip2.thv"))
        .unwrap();
    db.create_clip(ClipRecord::placeholder("a/clip1", "clips/a/clip1.thv"))
        .unwrap();
    db.add_track("a/clip1", track_record(1)).unwrap();
    db.commit().unwrap();

    let reloaded = TrackDatabase::open(&path, false).unwrap();
    let ids: Vec<_> = reloaded.clips().keys().cloned().collect();
    assert_eq!(ids, vec!["a/clip1".to_string(), "b/clip2".to_string()]);
    assert_eq!(reloaded.clip("a/clip1").unwrap().tracks.len(), 1);
    assert!(reloaded.clip("b/clip2").unwrap().tracks.is_empty());
}

#[test]
fn test_uncommitted_changes_are_not_visible() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dataset.json");
    let mut db = TrackDatabase::open(&path, false).unwrap();
    db.create_clip(ClipRecord::placeholder("clip", "clip.thv")).unwrap();
    drop(db);
    assert!(!path.exists());
}

#[test]
fn test_add_track_to_unknown_clip_fails() {
    let dir = tempdir().unwrap();
    let mut db = TrackDatabase::open(&dir.path().join("dataset.json"), false).unwrap();
    assert!(matches!(
        db.add_track("missing", track_record(1)),
        Err(HotspotError::Store(_))
    ));
}

#[test]
fn test_create_clip_replaces_previous_record() {
    let dir = tempdir().unwrap();
    let mut db = TrackDatabase::open(&dir.path().join("dataset.json"), false).unwrap();
    db.create_clip(ClipRecord::placeholder("clip", "clip.thv")).unwrap();
    db.add_track("clip", track_record(1)).unwrap();
    db.create_clip(ClipRecord::placeholder("clip", "clip.thv")).unwrap();
    assert!(db.clip("clip").unwrap().tracks.is_empty());
}

#[test]
fn test_compressed_store_is_gzip_and_reloads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dataset.json");
    let mut db = TrackDatabase::open(&path, true).unwrap();
    db.create_clip(ClipRecord::placeholder("clip", "clip.thv")).unwrap();
    db.add_track("clip", track_record(7)).unwrap();
    db.commit().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    // Readers detect compression regardless of their own setting.
    let reloaded = TrackDatabase::open(&path, false).unwrap();
    assert_eq!(reloaded.clip("clip").unwrap().tracks[0].track_id, 7);
}

// ---------------------------------------------------------------------------
// Store lock
// ---------------------------------------------------------------------------

#[test]
fn test_lock_serialises_threads() {
    let dir = tempdir().unwrap();
    let lock = StoreLock::open(&dir.path().join("dataset.lock")).unwrap();
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lock = lock.clone();
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            thread::spawn(move || {
                for _ in 0..5 {
                    let _guard = lock.acquire().unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(1));
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
}

#[test]
fn test_lock_creates_parent_folder() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("dataset.lock");
    let lock = StoreLock::open(&path).unwrap();
    drop(lock.acquire().unwrap());
    assert!(path.exists());
}

// ---------------------------------------------------------------------------
// Sharding
// ---------------------------------------------------------------------------

#[test]
fn test_bucket_is_deterministic() {
    let name = "20240102-030405.123456";
    let first = distributed_folder(name, 256);
    for _ in 0..10 {
        assert_eq!(distributed_folder(name, 256), first);
    }
}

#[test]
fn test_bucket_matches_polynomial_hash() {
    // Unbounded hash*31 + byte, reduced modulo 256 at the end.
    let name = "a-fairly-long-clip-name-that-overflows-u64-arithmetic";
    let mut expected: u128 = 0;
    for b in name.bytes() {
        expected = (expected * 31 + b as u128) % (1u128 << 64);
    }
    assert_eq!(distributed_folder(name, 256), format!("{:02x}", expected % 256));
}

#[test]
fn test_bucket_names_are_two_hex_digits() {
    for name in ["a", "clip", "xyz", "0000"] {
        let bucket = distributed_folder(name, 256);
        assert_eq!(bucket.len(), 2);
        assert!(bucket.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
