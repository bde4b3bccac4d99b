use ndarray::Array2;

/// Binary dilation with a `(2 * radius + 1)` square kernel.
///
/// A square structuring element is separable, so the mask is dilated
/// along rows and then along columns. Out-of-bounds pixels are background.
pub fn dilate_square(mask: &Array2<bool>, radius: usize) -> Array2<bool> {
    if radius == 0 {
        return mask.clone();
    }
    let horizontal = dilate_pass(mask, radius, true);
    dilate_pass(&horizontal, radius, false)
}

fn dilate_pass(mask: &Array2<bool>, radius: usize, along_rows: bool) -> Array2<bool> {
    let (h, w) = mask.dim();
    let mut result = Array2::from_elem((h, w), false);

    for row in 0..h {
        for col in 0..w {
            let (pos, len) = if along_rows { (col, w) } else { (row, h) };
            let lo = pos.saturating_sub(radius);
            let hi = (pos + radius).min(len - 1);
            let any_true = (lo..=hi).any(|p| {
                if along_rows {
                    mask[[row, p]]
                } else {
                    mask[[p, col]]
                }
            });
            result[[row, col]] = any_true;
        }
    }

    result
}
