use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HotspotError, Result};

use super::{ClipRecord, TrackRecord, TrackStore};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    clips: BTreeMap<String, ClipRecord>,
}

/// JSON document store, keyed and ordered by clip id.
///
/// Mutations stay in memory until [`TrackDatabase::commit`]. Concurrent
/// writers must hold the store lock from `open` through `commit`.
pub struct TrackDatabase {
    path: PathBuf,
    compress: bool,
    document: StoreDocument,
}

impl TrackDatabase {
    /// Load the database at `path`, or start an empty one if it does not
    /// exist yet. `compress` controls how the next commit is written.
    pub fn open(path: &Path, compress: bool) -> Result<Self> {
        let document = if path.exists() {
            load_document(path)?
        } else {
            StoreDocument {
                version: STORE_VERSION,
                clips: BTreeMap::new(),
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            compress,
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clips(&self) -> &BTreeMap<String, ClipRecord> {
        &self.document.clips
    }

    pub fn clip(&self, clip_id: &str) -> Option<&ClipRecord> {
        self.document.clips.get(clip_id)
    }

    /// Write the document to a temporary file and move it over the
    /// database.
    pub fn commit(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let file = File::create(&tmp_path)?;
        let writer = BufWriter::new(file);
        if self.compress {
            let mut encoder = GzEncoder::new(writer, Compression::default());
            serde_json::to_writer(&mut encoder, &self.document)?;
            encoder.finish()?.flush()?;
        } else {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, &self.document)?;
            writer.flush()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        debug!(
            path = %self.path.display(),
            clips = self.document.clips.len(),
            "Track store committed"
        );
        Ok(())
    }
}

impl TrackStore for TrackDatabase {
    fn create_clip(&mut self, clip: ClipRecord) -> Result<()> {
        self.document.clips.insert(clip.clip_id.clone(), clip);
        Ok(())
    }

    fn add_track(&mut self, clip_id: &str, track: TrackRecord) -> Result<()> {
        let clip = self
            .document
            .clips
            .get_mut(clip_id)
            .ok_or_else(|| HotspotError::Store(format!("unknown clip id {clip_id:?}")))?;
        clip.tracks.push(track);
        Ok(())
    }
}

fn load_document(path: &Path) -> Result<StoreDocument> {
    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;

    let document: StoreDocument = if bytes.starts_with(&GZIP_MAGIC) {
        let mut text = Vec::new();
        GzDecoder::new(bytes.as_slice()).read_to_end(&mut text)?;
        serde_json::from_slice(&text)?
    } else {
        serde_json::from_slice(&bytes)?
    };

    if document.version != STORE_VERSION {
        return Err(HotspotError::Store(format!(
            "{} has unsupported version {}",
            path.display(),
            document.version
        )));
    }
    Ok(document)
}
