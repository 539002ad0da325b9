use ndarray::{s, Array2, ArrayView2, Zip};
use tracing::debug;

use crate::config::TransformConfig;
use crate::geometry::Vertex;
use crate::grid::{par_rows, Grid};
use crate::mask::{bounding_box_indices, mask_in_window};

/// Normalised 1D gaussian kernel of `2 * radius + 1` taps.
fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f64> {
    let r = radius as isize;
    let kernel: Vec<f64> = (-r..=r)
        .map(|i| {
            let d = i as f64;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.into_iter().map(|w| w / sum).collect()
}

#[inline]
fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Weighted sums of values and of weights along one axis, with edges
/// clamped to the nearest cell.
fn blur_pass(
    values: &Array2<f64>,
    weights: &Array2<f64>,
    kernel: &[f64],
    along_rows: bool,
) -> (Array2<f64>, Array2<f64>) {
    let (rows, cols) = values.dim();
    let radius = (kernel.len() / 2) as isize;

    let pass = |source: &Array2<f64>| {
        par_rows((rows, cols), |r| {
            (0..cols)
                .map(|c| {
                    kernel
                        .iter()
                        .enumerate()
                        .map(|(k, w)| {
                            let offset = k as isize - radius;
                            let (rr, cc) = if along_rows {
                                (r, clamp_index(c as isize + offset, cols))
                            } else {
                                (clamp_index(r as isize + offset, rows), c)
                            };
                            w * source[[rr, cc]]
                        })
                        .sum()
                })
                .collect()
        })
    };

    (pass(values), pass(weights))
}

/// Gaussian blur that skips missing cells.
///
/// Each output cell is the weighted mean of the non-missing cells under the
/// kernel; edges repeat the nearest cell. Missing cells stay missing.
pub fn gaussian_filter(heights: ArrayView2<f64>, config: &TransformConfig) -> Array2<f64> {
    let kernel = gaussian_kernel(config.gaussian_sigma, config.gaussian_radius());
    let values = heights.mapv(|h| if h.is_nan() { 0.0 } else { h });
    let weights = heights.mapv(|h| if h.is_nan() { 0.0 } else { 1.0 });

    let (values, weights) = blur_pass(&values, &weights, &kernel, true);
    let (values, weights) = blur_pass(&values, &weights, &kernel, false);

    let mut out = Array2::from_elem(heights.dim(), f64::NAN);
    Zip::from(&mut out)
        .and(&heights)
        .and(&values)
        .and(&weights)
        .for_each(|o, &h, &v, &w| {
            if !h.is_nan() && w > 0.0 {
                *o = v / w;
            }
        });
    out
}

/// Blur the heights between two rings.
///
/// The blur runs over the bounding-box window of `outer`. Cells inside
/// `outer` but not inside `inner` take the blurred value; every other cell
/// keeps its height.
pub fn smooth_area(grid: &Grid, inner: &[Vertex], outer: &[Vertex], config: &TransformConfig) -> Array2<f64> {
    let window = bounding_box_indices(grid.x(), grid.y(), outer);
    let mut out = grid.heights().clone();
    if window.is_empty() {
        return out;
    }

    let mut cut = out.slice_mut(s![window.min_y..window.max_y, window.min_x..window.max_x]);
    let blurred = gaussian_filter(cut.view(), config);
    let inner_mask = mask_in_window(grid.x(), grid.y(), inner, window);
    let outer_mask = mask_in_window(grid.x(), grid.y(), outer, window);

    let mut changed = 0usize;
    Zip::from(&mut cut)
        .and(&blurred)
        .and(&inner_mask)
        .and(&outer_mask)
        .for_each(|h, &b, &i, &o| {
            if i != o {
                *h = b;
                changed += 1;
            }
        });
    debug!(changed, "annulus smoothed");
    out
}
