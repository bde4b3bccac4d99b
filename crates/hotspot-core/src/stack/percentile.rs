use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{HotspotError, Result};
use crate::frame::Frame;

/// Compute the `q`-th percentile at each pixel position across all frames.
///
/// Uses linear interpolation between the two nearest ranks and
/// `select_nth_unstable` for O(n) selection without a full sort.
/// Parallelizes at the row level for images >= 256x256.
pub fn percentile_stack(frames: &[Frame], q: f64) -> Result<Array2<f32>> {
    if frames.is_empty() {
        return Err(HotspotError::EmptySequence);
    }

    let (h, w) = frames[0].data.dim();
    let n = frames.len();

    if h * w >= PARALLEL_PIXEL_THRESHOLD && n > 1 {
        // Row-parallel: each row allocates its own pixel_values
        let rows: Vec<Vec<f32>> = (0..h)
            .into_par_iter()
            .map(|row| {
                let mut pixel_values = vec![0.0f32; n];
                let mut row_result = vec![0.0f32; w];
                for (col, result) in row_result.iter_mut().enumerate() {
                    for (i, frame) in frames.iter().enumerate() {
                        pixel_values[i] = frame.data[[row, col]];
                    }
                    *result = percentile(&mut pixel_values, q);
                }
                row_result
            })
            .collect();

        let mut result = Array2::<f32>::zeros((h, w));
        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, val) in row_data.into_iter().enumerate() {
                result[[row, col]] = val;
            }
        }
        Ok(result)
    } else {
        let mut result = Array2::<f32>::zeros((h, w));
        let mut pixel_values = vec![0.0f32; n];

        for row in 0..h {
            for col in 0..w {
                for (i, frame) in frames.iter().enumerate() {
                    pixel_values[i] = frame.data[[row, col]];
                }
                result[[row, col]] = percentile(&mut pixel_values, q);
            }
        }
        Ok(result)
    }
}

/// Linearly interpolated percentile of `values` (reorders the slice).
///
/// `q` is in [0, 100]. Returns 0.0 for an empty slice.
pub fn percentile(values: &mut [f32], q: f64) -> f32 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return values[0];
    }

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;

    let (_, lo_val, upper) = values.select_nth_unstable_by(lo, |a, b| a.total_cmp(b));
    let lo_val = *lo_val;
    if frac == 0.0 || upper.is_empty() {
        return lo_val;
    }
    // Everything above `lo` is in `upper`; its minimum is the next rank.
    let hi_val = upper.iter().copied().fold(f32::INFINITY, f32::min);
    (lo_val as f64 + (hi_val - lo_val) as f64 * frac) as f32
}

/// Median of `values` (reorders the slice). Even counts average the middle pair.
pub fn median(values: &mut [f32]) -> f32 {
    percentile(values, 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates_between_ranks() {
        let mut values: Vec<f32> = (0..10).map(|v| v as f32).collect();
        assert!((percentile(&mut values, 10.0) - 0.9).abs() < 1e-6);
        assert!((percentile(&mut values, 100.0) - 9.0).abs() < 1e-6);
        assert!((percentile(&mut values, 0.0) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_median_even_and_odd() {
        let mut odd = vec![5.0f32, 1.0, 3.0];
        assert_eq!(median(&mut odd), 3.0);
        let mut even = vec![4.0f32, 1.0, 3.0, 2.0];
        assert_eq!(median(&mut even), 2.5);
    }

    #[test]
    fn test_percentile_empty_is_zero() {
        let mut empty: Vec<f32> = Vec::new();
        assert_eq!(percentile(&mut empty, 50.0), 0.0);
    }
}
