use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use ndarray::Array2;

use crate::error::{HotspotError, Result};
use crate::io::thermal::{ClipHeader, DEVICE_NAME_LEN, THERMAL_HEADER_SIZE, THERMAL_MAGIC};

/// Byte offset of the frame count field inside the header.
const FRAME_COUNT_OFFSET: u64 = 20;

/// Writes a thermal clip container frame by frame.
///
/// The header's frame count is patched on `finalize`, so callers do not
/// need to know the clip length up front.
pub struct ThermalWriter {
    writer: BufWriter<File>,
    header: ClipHeader,
    frames_written: u32,
}

impl ThermalWriter {
    /// Create a new container and write the header.
    pub fn create(path: &Path, header: &ClipHeader) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        write_header(&mut writer, header)?;
        Ok(Self {
            writer,
            header: header.clone(),
            frames_written: 0,
        })
    }

    /// Append one frame. Values are rounded and clamped to the u16 range.
    pub fn write_frame(&mut self, data: &Array2<f32>) -> Result<()> {
        let (h, w) = data.dim();
        if h != self.header.height as usize || w != self.header.width as usize {
            return Err(HotspotError::InvalidDimensions {
                width: w as u32,
                height: h as u32,
            });
        }
        let mut buf = Vec::with_capacity(self.header.frame_byte_size()?);
        for &v in data.iter() {
            let sample = v.round().clamp(0.0, u16::MAX as f32) as u16;
            buf.extend_from_slice(&sample.to_le_bytes());
        }
        self.writer.write_all(&buf)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Flush, patch the frame count and close the file.
    pub fn finalize(mut self) -> Result<()> {
        self.writer.flush()?;
        let mut file = self
            .writer
            .into_inner()
            .map_err(|e| HotspotError::Io(e.into_error()))?;
        file.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))?;
        file.write_all(&self.frames_written.to_le_bytes())?;
        file.flush()?;
        Ok(())
    }
}

fn write_header(w: &mut impl Write, header: &ClipHeader) -> Result<()> {
    w.write_all(THERMAL_MAGIC)?;
    w.write_all(&header.version.to_le_bytes())?;
    // Reserved
    w.write_all(&0u16.to_le_bytes())?;
    w.write_all(&header.width.to_le_bytes())?;
    w.write_all(&header.height.to_le_bytes())?;
    w.write_all(&header.frame_count.to_le_bytes())?;
    w.write_all(&header.frames_per_second.to_le_bytes())?;
    w.write_all(&header.timestamp_us.to_le_bytes())?;
    w.write_all(&header.preview_secs.to_le_bytes())?;
    write_fixed_string(w, &header.device_name, DEVICE_NAME_LEN)?;

    debug_assert_eq!(8 + 2 + 2 + 4 + 4 + 4 + 4 + 8 + 4 + DEVICE_NAME_LEN, THERMAL_HEADER_SIZE);
    Ok(())
}

fn write_fixed_string(w: &mut impl Write, s: &str, len: usize) -> Result<()> {
    let bytes = s.as_bytes();
    let to_write = bytes.len().min(len);
    w.write_all(&bytes[..to_write])?;
    w.write_all(&vec![0u8; len - to_write])?;
    Ok(())
}
