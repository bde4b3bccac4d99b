use ndarray::{Array2, ArrayView2};

use crate::consts::DETECTION_BLUR_KERNEL_SIZE;
use crate::filters::gaussian_blur::gaussian_blur_sized;

/// Blur a filtered frame, subtract `threshold` and mark any positive residual
/// as foreground.
pub fn blur_and_threshold(data: ArrayView2<f32>, threshold: f32) -> Array2<bool> {
    let blurred = gaussian_blur_sized(data, DETECTION_BLUR_KERNEL_SIZE);
    blurred.mapv(|v| v - threshold > 0.0)
}
