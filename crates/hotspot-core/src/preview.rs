use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use ndarray::Array2;

use crate::clip::Clip;
use crate::detection::BoundingBox;
use crate::error::Result;

const TRACK_COLOURS: [[u8; 3]; 6] = [
    [255, 64, 64],
    [64, 255, 64],
    [64, 128, 255],
    [255, 255, 64],
    [255, 64, 255],
    [64, 255, 255],
];

/// Max projection of the filtered frames, scaled to 8 bits.
pub fn max_projection(clip: &Clip) -> Array2<f32> {
    let dim = clip
        .detections
        .first()
        .map(|d| d.filtered.dim())
        .unwrap_or((clip.header.height as usize, clip.header.width as usize));
    let mut projection = Array2::<f32>::zeros(dim);
    for detection in &clip.detections {
        projection.zip_mut_with(&detection.filtered, |p, &v| *p = p.max(v));
    }
    projection
}

/// Write a still PNG of the clip with every track's boxes outlined.
pub fn write_preview(clip: &Clip, path: &Path) -> Result<()> {
    let projection = max_projection(clip);
    let (h, w) = projection.dim();
    let peak = projection.iter().copied().fold(0.0f32, f32::max);
    let scale = if peak > 0.0 { 255.0 / peak } else { 0.0 };

    let mut img = RgbImage::new(w as u32, h as u32);
    for ((row, col), &v) in projection.indexed_iter() {
        let g = (v.max(0.0) * scale).round().min(255.0) as u8;
        img.put_pixel(col as u32, row as u32, Rgb([g, g, g]));
    }

    for (i, track) in clip.tracks.iter().enumerate() {
        let colour = Rgb(TRACK_COLOURS[i % TRACK_COLOURS.len()]);
        for region in track.regions() {
            outline(&mut img, &region.bbox, colour);
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

fn outline(img: &mut RgbImage, bbox: &BoundingBox, colour: Rgb<u8>) {
    if bbox.width == 0 || bbox.height == 0 {
        return;
    }
    let (w, h) = (img.width() as usize, img.height() as usize);
    let right = (bbox.right() - 1).min(w.saturating_sub(1));
    let bottom = (bbox.bottom() - 1).min(h.saturating_sub(1));
    if bbox.x >= w || bbox.y >= h {
        return;
    }
    for x in bbox.x..=right {
        img.put_pixel(x as u32, bbox.y as u32, colour);
        img.put_pixel(x as u32, bottom as u32, colour);
    }
    for y in bbox.y..=bottom {
        img.put_pixel(bbox.x as u32, y as u32, colour);
        img.put_pixel(right as u32, y as u32, colour);
    }
}
