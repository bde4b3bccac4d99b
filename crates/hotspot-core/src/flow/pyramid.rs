//! Gaussian pyramids with arbitrary scale steps.

use ndarray::Array2;

use crate::consts::{MIN_PYRAMID_SIDE, PYRAMID_BLUR_SIGMA};
use crate::filters::gaussian_blur::gaussian_blur_array;

/// Build a pyramid of at most `levels` images, each `scale_step` times the
/// size of the previous one.
///
/// Index 0 is the original and the last entry is the coarsest. Levels that
/// would fall below `MIN_PYRAMID_SIDE` pixels on either axis are skipped.
pub fn build_pyramid(data: &Array2<f32>, levels: usize, scale_step: f32) -> Vec<Array2<f32>> {
    let mut pyramid = Vec::with_capacity(levels.max(1));
    pyramid.push(data.clone());

    let (h0, w0) = data.dim();
    let mut scale = 1.0f32;
    for _ in 1..levels {
        scale *= scale_step;
        let new_h = (h0 as f32 * scale).round() as usize;
        let new_w = (w0 as f32 * scale).round() as usize;
        if new_h < MIN_PYRAMID_SIDE || new_w < MIN_PYRAMID_SIDE {
            break;
        }
        let previous = &pyramid[pyramid.len() - 1];
        let blurred = gaussian_blur_array(previous.view(), PYRAMID_BLUR_SIGMA);
        pyramid.push(resize_bilinear(&blurred, new_h, new_w));
    }

    pyramid
}

/// Resample `data` to `(new_h, new_w)` with bilinear interpolation.
pub fn resize_bilinear(data: &Array2<f32>, new_h: usize, new_w: usize) -> Array2<f32> {
    let (h, w) = data.dim();
    if (h, w) == (new_h, new_w) {
        return data.clone();
    }
    let sy = h as f32 / new_h as f32;
    let sx = w as f32 / new_w as f32;
    Array2::from_shape_fn((new_h, new_w), |(r, c)| {
        // Pixel centres map onto pixel centres.
        let y = (r as f32 + 0.5) * sy - 0.5;
        let x = (c as f32 + 0.5) * sx - 0.5;
        sample_bilinear(data, x, y)
    })
}

/// Bilinear sample at `(x, y)`, replicating edge pixels outside the image.
pub fn sample_bilinear(data: &Array2<f32>, x: f32, y: f32) -> f32 {
    let (h, w) = data.dim();
    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let top = data[[y0, x0]] * (1.0 - fx) + data[[y0, x1]] * fx;
    let bottom = data[[y1, x0]] * (1.0 - fx) + data[[y1, x1]] * fx;
    top * (1.0 - fy) + bottom * fy
}
