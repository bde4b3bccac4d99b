use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Apply Gaussian blur using separable 1D convolution with a `3 * sigma` radius.
pub fn gaussian_blur_array(data: ArrayView2<f32>, sigma: f32) -> Array2<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    let kernel = make_gaussian_kernel(radius, sigma);
    separable_convolve(data, &kernel)
}

/// Apply a `size x size` Gaussian blur, deriving sigma from the kernel size.
///
/// Sigma follows the usual rule for an unspecified deviation:
/// `0.3 * ((size - 1) / 2 - 1) + 0.8`, i.e. 1.1 for a 5x5 kernel.
pub fn gaussian_blur_sized(data: ArrayView2<f32>, size: usize) -> Array2<f32> {
    let size = size.max(1) | 1;
    let radius = size / 2;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let kernel = make_gaussian_kernel(radius, sigma);
    separable_convolve(data, &kernel)
}

fn make_gaussian_kernel(radius: usize, sigma: f32) -> Vec<f32> {
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

fn separable_convolve(data: ArrayView2<f32>, kernel: &[f32]) -> Array2<f32> {
    let row_pass = convolve_axis(data, kernel, Axis(1));
    convolve_axis(row_pass.view(), kernel, Axis(0))
}

/// Mirror an out-of-range index about the edge sample without repeating it
/// (`dcb|abcd|cba`).
fn reflect_101(index: isize, len: isize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let i = index.rem_euclid(period);
    (if i < len { i } else { period - i }) as usize
}

/// Convolve every line along `axis`, mirroring samples past the border.
fn convolve_axis(data: ArrayView2<f32>, kernel: &[f32], axis: Axis) -> Array2<f32> {
    let (h, w) = data.dim();
    if h == 0 || w == 0 {
        return Array2::zeros((h, w));
    }
    let radius = kernel.len() as isize / 2;
    let len = data.len_of(axis) as isize;

    let sample = |row: usize, col: usize| -> f32 {
        let mut sum = 0.0f32;
        for (ki, &kv) in kernel.iter().enumerate() {
            let offset = ki as isize - radius;
            let (r, c) = if axis == Axis(1) {
                (row, reflect_101(col as isize + offset, len))
            } else {
                (reflect_101(row as isize + offset, len), col)
            };
            sum += data[[r, c]] * kv;
        }
        sum
    };

    let mut result = Array2::<f32>::zeros((h, w));
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, mut out)| {
                for col in 0..w {
                    out[col] = sample(row, col);
                }
            });
    } else {
        for row in 0..h {
            for col in 0..w {
                result[[row, col]] = sample(row, col);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_preserves_constant() {
        let data = Array2::from_elem((9, 7), 12.5f32);
        let blurred = gaussian_blur_sized(data.view(), 5);
        for v in blurred.iter() {
            assert!((v - 12.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_blur_spreads_impulse_symmetrically() {
        let mut data = Array2::<f32>::zeros((9, 9));
        data[[4, 4]] = 1.0;
        let blurred = gaussian_blur_sized(data.view(), 5);
        assert!(blurred[[4, 4]] < 1.0);
        assert!((blurred[[4, 3]] - blurred[[4, 5]]).abs() < 1e-6);
        assert!((blurred[[3, 4]] - blurred[[5, 4]]).abs() < 1e-6);
        assert_eq!(blurred[[0, 0]], 0.0);
        let total: f32 = blurred.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_reflect_101_indices() {
        let mapped: Vec<_> = (-3..8).map(|i| reflect_101(i, 5)).collect();
        assert_eq!(mapped, vec![3, 2, 1, 0, 1, 2, 3, 4, 3, 2, 1]);
        assert_eq!(reflect_101(-2, 1), 0);
    }

    #[test]
    fn test_border_mirrors_without_repeating_edge() {
        // Sample 1 is seen twice by the border pixel: at offset +1 and,
        // mirrored, at offset -1. The edge sample itself is not repeated.
        let mut data = Array2::<f32>::zeros((1, 7));
        data[[0, 1]] = 1.0;
        let blurred = gaussian_blur_sized(data.view(), 5);
        let k1 = (-1.0f32 / (2.0 * 1.1 * 1.1)).exp();
        let k2 = (-4.0f32 / (2.0 * 1.1 * 1.1)).exp();
        let k1 = k1 / (1.0 + 2.0 * k1 + 2.0 * k2);
        assert!((blurred[[0, 0]] - 2.0 * k1).abs() < 1e-5);
    }
}
