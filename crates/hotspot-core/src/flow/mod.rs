pub mod pyramid;
pub mod variational;

use ndarray::{Array2, Zip};

use crate::consts::*;
use crate::pipeline::config::TrackingConfig;

use pyramid::{build_pyramid, resize_bilinear};
use variational::refine_level;

/// Dense per-pixel motion between two consecutive frames, in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField {
    pub u: Array2<f32>,
    pub v: Array2<f32>,
}

impl FlowField {
    pub fn zeros(dim: (usize, usize)) -> Self {
        Self {
            u: Array2::zeros(dim),
            v: Array2::zeros(dim),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.u.dim()
    }

    /// Resample to a new grid, scaling the vectors with it.
    pub fn resized(&self, new_h: usize, new_w: usize) -> Self {
        let (h, w) = self.dim();
        if (h, w) == (new_h, new_w) {
            return self.clone();
        }
        let sx = new_w as f32 / w.max(1) as f32;
        let sy = new_h as f32 / h.max(1) as f32;
        Self {
            u: resize_bilinear(&self.u, new_h, new_w).mapv(|x| x * sx),
            v: resize_bilinear(&self.v, new_h, new_w).mapv(|y| y * sy),
        }
    }

    /// Zero every vector whose magnitude is below `threshold`.
    pub fn apply_threshold(&mut self, threshold: f32) {
        Zip::from(&mut self.u).and(&mut self.v).for_each(|u, v| {
            if (*u * *u + *v * *v).sqrt() < threshold {
                *u = 0.0;
                *v = 0.0;
            }
        });
    }
}

/// Solver settings for one quality level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowParams {
    pub scales: usize,
    pub warps: usize,
    pub scale_step: f32,
    pub iterations: usize,
    pub smoothness: f32,
}

impl FlowParams {
    pub fn for_quality(high_quality: bool) -> Self {
        if high_quality {
            Self {
                scales: HQ_FLOW_SCALES,
                warps: HQ_FLOW_WARPS,
                scale_step: HQ_FLOW_SCALE_STEP,
                iterations: HQ_FLOW_ITERATIONS,
                smoothness: FLOW_SMOOTHNESS,
            }
        } else {
            Self {
                scales: FAST_FLOW_SCALES,
                warps: FAST_FLOW_WARPS,
                scale_step: FAST_FLOW_SCALE_STEP,
                iterations: FAST_FLOW_ITERATIONS,
                smoothness: FLOW_SMOOTHNESS,
            }
        }
    }
}

/// Map a filtered frame onto the [0, 1] intensity range the solver expects.
pub fn flow_input(filtered: &Array2<f32>) -> Array2<f32> {
    filtered.mapv(|x| (x / 2.0).clamp(0.0, 255.0) / 255.0)
}

/// Coarse-to-fine flow from `prev` to `next`, optionally seeded with an
/// earlier estimate.
pub fn compute_flow(
    prev: &Array2<f32>,
    next: &Array2<f32>,
    initial: Option<&FlowField>,
    params: &FlowParams,
) -> FlowField {
    let prev_pyramid = build_pyramid(prev, params.scales, params.scale_step);
    let next_pyramid = build_pyramid(next, params.scales, params.scale_step);
    let levels = prev_pyramid.len().min(next_pyramid.len());

    let (ch, cw) = prev_pyramid[levels - 1].dim();
    let mut flow = match initial {
        Some(seed) if seed.dim() == prev.dim() => seed.resized(ch, cw),
        _ => FlowField::zeros((ch, cw)),
    };

    for level in (0..levels).rev() {
        let (h, w) = prev_pyramid[level].dim();
        flow = flow.resized(h, w);
        refine_level(
            &prev_pyramid[level],
            &next_pyramid[level],
            &mut flow,
            params.warps,
            params.iterations,
            params.smoothness,
        );
    }

    flow
}

/// Flow between each consecutive pair of filtered frames.
///
/// Returns `frames.len() - 1` fields (none for fewer than two frames). Each
/// pair is seeded with the raw estimate of the previous pair before the
/// magnitude floor is applied.
pub fn generate_flow(filtered: &[Array2<f32>], config: &TrackingConfig) -> Vec<FlowField> {
    let params = FlowParams::for_quality(config.high_quality_optical_flow);
    let inputs: Vec<Array2<f32>> = filtered.iter().map(flow_input).collect();

    let mut fields = Vec::with_capacity(inputs.len().saturating_sub(1));
    let mut seed: Option<FlowField> = None;
    for pair in inputs.windows(2) {
        let flow = compute_flow(&pair[0], &pair[1], seed.as_ref(), &params);
        let mut thresholded = flow.clone();
        thresholded.apply_threshold(config.flow_threshold);
        fields.push(thresholded);
        seed = Some(flow);
    }
    fields
}
