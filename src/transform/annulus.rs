//! Re-interpolation of the band between a polygon and its buffer ring.

use ndarray::{s, Array2, Zip};
use tracing::debug;

use super::interpolate::{fill_missing, InterpolationMode};
use super::smooth::smooth_area;
use crate::config::TransformConfig;
use crate::geometry::Vertex;
use crate::grid::Grid;
use crate::mask::{bounding_box_indices, mask_in_window};

/// How the band around a polygon is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnulusInterpolation {
    /// Clear the band and interpolate it linearly from the cells around it.
    Linear,
    /// Clear the band and interpolate it with a cubic surface.
    Cubic,
    /// Blend the band with a gaussian blur.
    Smooth,
}

/// Rebuild the heights between `inner` and `outer`.
///
/// `outer` is expected to enclose `inner`, typically its buffer ring.
///
/// With `Linear` and `Cubic` the band is cleared and every missing cell of
/// the window (the bounding box of `outer` grown by one cell) is
/// interpolated, so cells already missing inside `inner` or in the window
/// corners outside `outer` are filled too. Other non-missing cells keep
/// their heights. `Smooth` only rewrites the band.
pub fn interpolate_annulus(
    grid: &Grid,
    inner: &[Vertex],
    outer: &[Vertex],
    kind: AnnulusInterpolation,
    config: &TransformConfig,
) -> Array2<f64> {
    let mode = match kind {
        AnnulusInterpolation::Smooth => return smooth_area(grid, inner, outer, config),
        AnnulusInterpolation::Linear => InterpolationMode::Linear,
        AnnulusInterpolation::Cubic => InterpolationMode::Cubic,
    };

    // One extra cell on every side gives the band data to interpolate from.
    let window = bounding_box_indices(grid.x(), grid.y(), outer).expanded(1, grid.shape());
    let mut out = grid.heights().clone();
    if window.is_empty() {
        return out;
    }

    let inner_mask = mask_in_window(grid.x(), grid.y(), inner, window);
    let outer_mask = mask_in_window(grid.x(), grid.y(), outer, window);
    let mut cut = out
        .slice(s![window.min_y..window.max_y, window.min_x..window.max_x])
        .to_owned();
    Zip::from(&mut cut)
        .and(&inner_mask)
        .and(&outer_mask)
        .for_each(|h, &i, &o| {
            if i != o {
                *h = f64::NAN;
            }
        });

    let x = grid.x().slice(s![window.min_x..window.max_x]);
    let y = grid.y().slice(s![window.min_y..window.max_y]);
    let filled = fill_missing(x, y, cut.view(), mode);
    out.slice_mut(s![window.min_y..window.max_y, window.min_x..window.max_x])
        .assign(&filled);
    debug!(?kind, rows = window.shape().0, cols = window.shape().1, "annulus interpolated");
    out
}
