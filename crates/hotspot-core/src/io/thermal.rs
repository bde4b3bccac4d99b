use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use memmap2::Mmap;
use ndarray::Array2;

use crate::error::{HotspotError, Result};
use crate::frame::Frame;

use super::FrameSource;

pub const THERMAL_HEADER_SIZE: usize = 64;
pub const THERMAL_MAGIC: &[u8; 8] = b"THERMVID";
pub const THERMAL_VERSION: u16 = 1;
pub const DEVICE_NAME_LEN: usize = 24;

/// Bytes per stored sample (u16, little-endian).
const BYTES_PER_SAMPLE: usize = 2;

/// Thermal clip container header (64 bytes).
#[derive(Clone, Debug, PartialEq)]
pub struct ClipHeader {
    pub version: u16,
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub frames_per_second: u32,
    /// Capture start, microseconds since the Unix epoch.
    pub timestamp_us: u64,
    /// Length of the motion-trigger preview window at the start of the clip.
    pub preview_secs: u32,
    pub device_name: String,
}

impl ClipHeader {
    /// Total bytes per frame. Fails if the declared size does not fit in memory.
    pub fn frame_byte_size(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_SAMPLE))
            .ok_or_else(|| {
                HotspotError::InvalidClip(format!(
                    "Frame size {}x{} overflows",
                    self.width, self.height
                ))
            })
    }

    /// Header plus every frame, in bytes.
    pub fn file_byte_size(&self) -> Result<usize> {
        self.frame_byte_size()?
            .checked_mul(self.frame_count as usize)
            .and_then(|n| n.checked_add(THERMAL_HEADER_SIZE))
            .ok_or_else(|| {
                HotspotError::InvalidClip(format!(
                    "Clip size for {} frames of {}x{} overflows",
                    self.frame_count, self.width, self.height
                ))
            })
    }

    /// Capture start as an absolute UTC time.
    pub fn start_time(&self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.timestamp_us as i64).ok_or_else(|| {
            HotspotError::InvalidClip(format!("timestamp {} out of range", self.timestamp_us))
        })
    }
}

/// Memory-mapped thermal clip reader.
pub struct ThermalReader {
    mmap: Mmap,
    pub header: ClipHeader,
}

impl ThermalReader {
    /// Open a clip container and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and the file is not modified
        // while the reader is alive.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < THERMAL_HEADER_SIZE {
            return Err(HotspotError::InvalidClip(
                "File too small for clip header".into(),
            ));
        }

        if &mmap[0..8] != THERMAL_MAGIC {
            return Err(HotspotError::InvalidClip("Missing THERMVID magic".into()));
        }

        let header = parse_header(&mmap[..THERMAL_HEADER_SIZE])?;

        let expected_data_size = header.file_byte_size()?;
        if mmap.len() < expected_data_size {
            return Err(HotspotError::InvalidClip(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected_data_size,
                mmap.len()
            )));
        }

        Ok(Self { mmap, header })
    }

    /// Get the raw bytes for a single frame (zero-copy from mmap).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.header.frame_count as usize;
        if index >= count {
            return Err(HotspotError::FrameIndexOutOfRange {
                index,
                total: count,
            });
        }
        // `open` checked that every frame lies inside the mapping.
        let frame_size = self.header.frame_byte_size()?;
        let offset = THERMAL_HEADER_SIZE + index * frame_size;
        Ok(&self.mmap[offset..offset + frame_size])
    }
}

impl FrameSource for ThermalReader {
    fn header(&self) -> &ClipHeader {
        &self.header
    }

    fn read_frame(&self, index: usize) -> Result<Frame> {
        let raw = self.frame_raw(index)?;
        let h = self.header.height as usize;
        let w = self.header.width as usize;
        let data = Array2::from_shape_fn((h, w), |(row, col)| {
            let idx = (row * w + col) * BYTES_PER_SAMPLE;
            u16::from_le_bytes([raw[idx], raw[idx + 1]]) as f32
        });
        Ok(Frame::new(data, index))
    }
}

fn parse_header(buf: &[u8]) -> Result<ClipHeader> {
    let mut cursor = std::io::Cursor::new(&buf[8..]); // skip magic

    let version = cursor.read_u16::<LittleEndian>()?;
    let _reserved = cursor.read_u16::<LittleEndian>()?;
    let width = cursor.read_u32::<LittleEndian>()?;
    let height = cursor.read_u32::<LittleEndian>()?;
    let frame_count = cursor.read_u32::<LittleEndian>()?;
    let frames_per_second = cursor.read_u32::<LittleEndian>()?;
    let timestamp_us = cursor.read_u64::<LittleEndian>()?;
    let preview_secs = cursor.read_u32::<LittleEndian>()?;

    let device_name = read_fixed_string(&buf[40..40 + DEVICE_NAME_LEN]);

    if version != THERMAL_VERSION {
        return Err(HotspotError::InvalidClip(format!(
            "Unsupported container version {version}"
        )));
    }

    if width == 0 || height == 0 {
        return Err(HotspotError::InvalidDimensions { width, height });
    }

    if frames_per_second == 0 {
        return Err(HotspotError::InvalidClip("Frame rate must be > 0".into()));
    }

    Ok(ClipHeader {
        version,
        width,
        height,
        frame_count,
        frames_per_second,
        timestamp_us,
        preview_secs,
        device_name,
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}
