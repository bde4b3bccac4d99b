//! Horn–Schunck variational flow with iterative warping.
//!
//! Each warp linearises brightness constancy around the current estimate
//! and runs Jacobi iterations on the smoothness-regularised energy.

use ndarray::{Array2, Zip};

use super::pyramid::sample_bilinear;
use super::FlowField;

/// Refine `flow` between `prev` and `next` at a single pyramid level.
pub fn refine_level(
    prev: &Array2<f32>,
    next: &Array2<f32>,
    flow: &mut FlowField,
    warps: usize,
    iterations: usize,
    smoothness: f32,
) {
    let alpha2 = smoothness * smoothness;

    for _ in 0..warps {
        let warped = warp(next, flow);
        let average = Zip::from(prev).and(&warped).map_collect(|&a, &b| 0.5 * (a + b));
        let (ix, iy) = gradients(&average);
        let it = &warped - prev;

        let u0 = flow.u.clone();
        let v0 = flow.v.clone();

        for _ in 0..iterations {
            let u_bar = local_average(&flow.u);
            let v_bar = local_average(&flow.v);

            Zip::indexed(&mut flow.u)
                .and(&mut flow.v)
                .and(&u_bar)
                .and(&v_bar)
                .for_each(|(r, c), u, v, &ub, &vb| {
                    let gx = ix[[r, c]];
                    let gy = iy[[r, c]];
                    let residual = it[[r, c]] + gx * (ub - u0[[r, c]]) + gy * (vb - v0[[r, c]]);
                    let step = residual / (alpha2 + gx * gx + gy * gy);
                    *u = ub - gx * step;
                    *v = vb - gy * step;
                });
        }
    }
}

/// Sample `next` at positions displaced by `flow`.
fn warp(next: &Array2<f32>, flow: &FlowField) -> Array2<f32> {
    Array2::from_shape_fn(next.dim(), |(r, c)| {
        sample_bilinear(
            next,
            c as f32 + flow.u[[r, c]],
            r as f32 + flow.v[[r, c]],
        )
    })
}

/// Central-difference gradients with replicated borders.
fn gradients(data: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (h, w) = data.dim();
    let ix = Array2::from_shape_fn((h, w), |(r, c)| {
        let left = data[[r, c.saturating_sub(1)]];
        let right = data[[r, (c + 1).min(w - 1)]];
        0.5 * (right - left)
    });
    let iy = Array2::from_shape_fn((h, w), |(r, c)| {
        let up = data[[r.saturating_sub(1), c]];
        let down = data[[(r + 1).min(h - 1), c]];
        0.5 * (down - up)
    });
    (ix, iy)
}

/// Weighted neighbourhood mean (1/6 edge neighbours, 1/12 corners).
fn local_average(data: &Array2<f32>) -> Array2<f32> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(r, c)| {
        let up = r.saturating_sub(1);
        let down = (r + 1).min(h - 1);
        let left = c.saturating_sub(1);
        let right = (c + 1).min(w - 1);
        let edges = data[[up, c]] + data[[down, c]] + data[[r, left]] + data[[r, right]];
        let corners =
            data[[up, left]] + data[[up, right]] + data[[down, left]] + data[[down, right]];
        edges / 6.0 + corners / 12.0
    })
}
