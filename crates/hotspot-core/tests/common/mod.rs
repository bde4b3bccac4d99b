#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ndarray::Array2;

use hotspot_core::detection::{BoundingBox, Region};
use hotspot_core::frame::Frame;
use hotspot_core::io::thermal::THERMAL_VERSION;
use hotspot_core::io::thermal_writer::ThermalWriter;
use hotspot_core::io::ClipHeader;

/// Ambient sensor level of the synthetic scenes.
pub const SCENE_LEVEL: f32 = 3000.0;

/// 2020-09-13T12:26:40Z
pub const CAPTURE_START_US: u64 = 1_600_000_000_000_000;

pub fn clip_header(width: u32, height: u32, frame_count: u32, preview_secs: u32) -> ClipHeader {
    ClipHeader {
        version: THERMAL_VERSION,
        width,
        height,
        frame_count,
        frames_per_second: 9,
        timestamp_us: CAPTURE_START_US,
        preview_secs,
        device_name: "test-cam".into(),
    }
}

/// Flat scene with a `size`x`size` block `heat` counts above ambient whose
/// top-left corner moves by `step` pixels per frame.
pub fn moving_block_frames(
    dim: (usize, usize),
    count: usize,
    start: (usize, usize),
    step: (usize, usize),
    size: usize,
    heat: f32,
) -> Vec<Array2<f32>> {
    (0..count)
        .map(|i| {
            let x0 = start.0 + i * step.0;
            let y0 = start.1 + i * step.1;
            Array2::from_shape_fn(dim, |(r, c)| {
                if (y0..y0 + size).contains(&r) && (x0..x0 + size).contains(&c) {
                    SCENE_LEVEL + heat
                } else {
                    SCENE_LEVEL
                }
            })
        })
        .collect()
}

pub fn to_frames(planes: Vec<Array2<f32>>) -> Vec<Frame> {
    planes
        .into_iter()
        .enumerate()
        .map(|(i, data)| Frame::new(data, i))
        .collect()
}

/// Write a clip container under `dir` and return its path.
pub fn write_clip(dir: &Path, name: &str, planes: &[Array2<f32>], preview_secs: u32) -> PathBuf {
    let (h, w) = planes[0].dim();
    let path = dir.join(name);
    let header = clip_header(w as u32, h as u32, 0, preview_secs);
    let mut writer = ThermalWriter::create(&path, &header).expect("create clip");
    for plane in planes {
        writer.write_frame(plane).expect("write frame");
    }
    writer.finalize().expect("finalize clip");
    path
}

/// Write the `<base>.txt` sidecar next to a clip.
pub fn write_sidecar(clip_path: &Path, json: &str) {
    std::fs::write(clip_path.with_extension("txt"), json).expect("write sidecar");
}

pub fn sidecar(tracks: &[(&str, f64)]) -> String {
    let entries: Vec<String> = tracks
        .iter()
        .map(|(tag, confidence)| {
            format!(
                r#"{{"start_s": 0.0, "end_s": 10.0, "tag": "{tag}", "confidence": {confidence}}}"#
            )
        })
        .collect();
    format!(r#"{{"tracks": [{}]}}"#, entries.join(", "))
}

/// A 3x3 region centred on `(x, y)`.
pub fn region_at(frame_index: usize, x: f64, y: f64) -> Region {
    Region {
        frame_index,
        bbox: BoundingBox {
            x: (x as usize).saturating_sub(1),
            y: (y as usize).saturating_sub(1),
            width: 3,
            height: 3,
        },
        mass: 9,
        pixel_variance: 0.0,
        centroid: (x, y),
    }
}

/// Header-only container declaring the given geometry, with no frame data.
pub fn write_bare_header(path: &Path, width: u32, height: u32, frame_count: u32) {
    use hotspot_core::io::thermal::{THERMAL_HEADER_SIZE, THERMAL_MAGIC};

    let mut buf = Vec::with_capacity(THERMAL_HEADER_SIZE);
    buf.extend_from_slice(THERMAL_MAGIC);
    buf.extend_from_slice(&THERMAL_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&width.to_le_bytes());
    buf.extend_from_slice(&height.to_le_bytes());
    buf.extend_from_slice(&frame_count.to_le_bytes());
    buf.extend_from_slice(&9u32.to_le_bytes());
    buf.extend_from_slice(&CAPTURE_START_US.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.resize(THERMAL_HEADER_SIZE, 0);
    std::fs::write(path, buf).expect("write header");
}
