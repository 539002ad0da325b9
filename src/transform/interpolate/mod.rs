//! Filling missing cells from the surrounding data.

mod clough_tocher;
mod triangulation;

use ndarray::{Array2, ArrayView1, ArrayView2};
use rstar::primitives::GeomWithData;
use rstar::RTree;
use tracing::{debug, info};

use self::clough_tocher::CloughTocher;
use self::triangulation::{LinearSurface, Surface, Triangulation};
use crate::grid::{par_rows, Grid};

/// Scattered data interpolation used to fill missing cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    /// Value of the closest non-missing cell.
    Nearest,
    /// Barycentric blend over a Delaunay triangulation of the samples.
    Linear,
    /// Clough-Tocher cubic over the same triangulation.
    Cubic,
}

type Sample = GeomWithData<[f64; 2], f64>;

/// Fill every missing cell of the grid from its non-missing cells.
///
/// A grid with no missing cell, or with nothing but missing cells, comes
/// back unchanged. With `Linear` and `Cubic`, cells outside the convex hull
/// of the samples stay missing.
pub fn interpolate_missing(grid: &Grid, mode: InterpolationMode) -> Array2<f64> {
    info!(?mode, missing = grid.missing_count(), "interpolating missing cells");
    fill_missing(grid.x().view(), grid.y().view(), grid.heights().view(), mode)
}

/// Same as [`interpolate_missing`] on a window given by its axes.
pub fn fill_missing(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    heights: ArrayView2<f64>,
    mode: InterpolationMode,
) -> Array2<f64> {
    let mut points = Vec::new();
    let mut values = Vec::new();
    let mut missing = Vec::new();
    for ((r, c), &h) in heights.indexed_iter() {
        if h.is_nan() {
            missing.push((r, c));
        } else {
            points.push([x[c], y[r]]);
            values.push(h);
        }
    }

    let mut out = heights.to_owned();
    if missing.is_empty() || points.is_empty() {
        debug!(missing = missing.len(), samples = points.len(), "nothing to interpolate");
        return out;
    }

    match mode {
        InterpolationMode::Nearest => {
            let tree = RTree::bulk_load(
                points
                    .into_iter()
                    .zip(values)
                    .map(|(p, v)| Sample::new(p, v))
                    .collect(),
            );
            let filled = par_rows(out.dim(), |r| {
                (0..x.len())
                    .map(|c| {
                        let h = heights[[r, c]];
                        if !h.is_nan() {
                            return h;
                        }
                        tree.nearest_neighbor(&[x[c], y[r]])
                            .map(|sample| sample.data)
                            .unwrap_or(f64::NAN)
                    })
                    .collect()
            });
            out = filled;
        }
        InterpolationMode::Linear | InterpolationMode::Cubic => {
            let Some(triangulation) = Triangulation::new(points, values) else {
                debug!("samples span no triangle, nothing interpolated");
                return out;
            };
            if mode == InterpolationMode::Linear {
                rasterize(&LinearSurface::new(triangulation), x, y, &mut out);
            } else {
                rasterize(&CloughTocher::new(triangulation), x, y, &mut out);
            }
        }
    }
    out
}

/// Index range of the axis values within `[min, max]`.
fn axis_range(axis: &ArrayView1<f64>, min: f64, max: f64) -> std::ops::Range<usize> {
    let start = axis.iter().take_while(|v| **v < min).count();
    let end = start + axis.iter().skip(start).take_while(|v| **v <= max).count();
    start..end
}

/// Evaluate the surface at every missing cell covered by a triangle.
fn rasterize<S: Surface>(surface: &S, x: ArrayView1<f64>, y: ArrayView1<f64>, out: &mut Array2<f64>) {
    const TOLERANCE: f64 = -1e-10;
    let triangulation = surface.triangulation();
    let mut done = Array2::from_elem(out.dim(), false);

    for t in 0..triangulation.triangles().len() {
        let corners = triangulation.corners(t);
        let min_x = corners.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p[1]).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p[1]).fold(f64::NEG_INFINITY, f64::max);

        for r in axis_range(&y, min_y, max_y) {
            for c in axis_range(&x, min_x, max_x) {
                if done[[r, c]] || !out[[r, c]].is_nan() {
                    continue;
                }
                let p = [x[c], y[r]];
                let Some(bary) = triangulation.barycentric(t, p) else {
                    continue;
                };
                if bary.iter().all(|l| *l >= TOLERANCE) {
                    out[[r, c]] = surface.value(t, bary, p);
                    done[[r, c]] = true;
                }
            }
        }
    }
}
