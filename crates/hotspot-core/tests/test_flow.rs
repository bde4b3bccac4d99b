use ndarray::Array2;

use hotspot_core::flow::{compute_flow, generate_flow, FlowField, FlowParams};
use hotspot_core::pipeline::config::TrackingConfig;

fn gaussian_blob(dim: (usize, usize), cx: f32, cy: f32, sigma: f32) -> Array2<f32> {
    Array2::from_shape_fn(dim, |(r, c)| {
        let dx = c as f32 - cx;
        let dy = r as f32 - cy;
        (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp()
    })
}

#[test]
fn test_shifted_blob_gives_rightward_flow() {
    let prev = gaussian_blob((32, 32), 15.0, 16.0, 3.0);
    let next = gaussian_blob((32, 32), 16.0, 16.0, 3.0);
    let flow = compute_flow(&prev, &next, None, &FlowParams::for_quality(false));

    let mut sum_u = 0.0f32;
    let mut sum_v = 0.0f32;
    let mut n = 0usize;
    for ((r, c), &v) in prev.indexed_iter() {
        if v > 0.3 {
            sum_u += flow.u[[r, c]];
            sum_v += flow.v[[r, c]];
            n += 1;
        }
    }
    let mean_u = sum_u / n as f32;
    let mean_v = sum_v / n as f32;
    assert!(mean_u > 0.25, "mean u = {mean_u}");
    assert!(mean_v.abs() < 0.1, "mean v = {mean_v}");
}

#[test]
fn test_flat_frames_have_zero_flow() {
    let frames = vec![Array2::from_elem((16, 16), 80.0f32); 4];
    let fields = generate_flow(&frames, &TrackingConfig::default());
    assert_eq!(fields.len(), 3);
    for field in &fields {
        assert!(field.u.iter().all(|&x| x == 0.0));
        assert!(field.v.iter().all(|&x| x == 0.0));
    }
}

#[test]
fn test_single_frame_has_no_flow() {
    let frames = vec![Array2::from_elem((16, 16), 80.0f32)];
    assert!(generate_flow(&frames, &TrackingConfig::default()).is_empty());
}

#[test]
fn test_threshold_zeroes_short_vectors() {
    let mut field = FlowField::zeros((1, 3));
    field.u[[0, 0]] = 0.1;
    field.u[[0, 1]] = 0.5;
    field.v[[0, 2]] = -0.3;
    field.apply_threshold(0.2);
    assert_eq!(field.u[[0, 0]], 0.0);
    assert_eq!(field.u[[0, 1]], 0.5);
    assert_eq!(field.v[[0, 2]], -0.3);
}

#[test]
fn test_resize_scales_vectors() {
    let mut field = FlowField::zeros((8, 8));
    field.u.fill(1.0);
    field.v.fill(-2.0);
    let resized = field.resized(16, 4);
    assert!(resized.u.iter().all(|&x| (x - 0.5).abs() < 1e-6));
    assert!(resized.v.iter().all(|&y| (y + 4.0).abs() < 1e-6));
}

#[test]
fn test_quality_switch_uses_more_scales() {
    let fast = FlowParams::for_quality(false);
    let hq = FlowParams::for_quality(true);
    assert!(hq.scales > fast.scales);
    assert!(hq.warps > fast.warps);
    assert!(hq.scale_step > fast.scale_step);
}
