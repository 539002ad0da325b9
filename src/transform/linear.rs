use ndarray::{s, Array2, Zip};
use tracing::debug;

use super::Selection;
use crate::filter::ResolvedFilter;
use crate::geometry::Vertex;
use crate::grid::Grid;
use crate::stats::nan_max_min;

/// Map `value` from `[old_min, old_max]` onto `[new_min, new_max]`.
///
/// Bounds are sorted before use. A single-valued source range maps to the
/// middle of the target range and a single-valued target range maps
/// everything to it.
pub fn interpolate_value(value: f64, old_min: f64, old_max: f64, new_min: f64, new_max: f64) -> f64 {
    let (old_min, old_max) = (old_min.min(old_max), old_min.max(old_max));
    let (new_min, new_max) = (new_min.min(new_max), new_min.max(new_max));

    if old_min == old_max {
        return (new_min + new_max) / 2.0;
    }
    if new_min == new_max {
        return new_max;
    }
    (value - old_min) * (new_max - new_min) / (old_max - old_min) + new_min
}

/// Remap the non-missing cells selected by `mask` linearly between ranges.
pub fn linear_rescale(
    heights: &Array2<f64>,
    mask: &Array2<bool>,
    old_min: f64,
    old_max: f64,
    new_min: f64,
    new_max: f64,
) -> Array2<f64> {
    let mut out = heights.clone();
    Zip::from(&mut out).and(mask).for_each(|h, &selected| {
        if selected && !h.is_nan() {
            *h = interpolate_value(*h, old_min, old_max, new_min, new_max);
        }
    });
    out
}

/// Stretch the heights inside a polygon onto `[new_min, new_max]`.
///
/// The source range is the current range of the selected cells. Nothing
/// changes when the selection holds no data.
pub fn rescale_inside(
    grid: &Grid,
    vertices: &[Vertex],
    filters: &[ResolvedFilter],
    new_min: f64,
    new_max: f64,
) -> Array2<f64> {
    let selection = Selection::new(grid, vertices, filters);
    let mut out = grid.heights().clone();
    if selection.window.is_empty() {
        return out;
    }

    let window = selection.window;
    let mut cut = out.slice_mut(s![window.min_y..window.max_y, window.min_x..window.max_x]);
    let Some((old_max, old_min)) = nan_max_min(&cut.to_owned(), &selection.mask) else {
        debug!("no data selected, heights left unchanged");
        return out;
    };

    let rescaled = linear_rescale(&cut.to_owned(), &selection.mask, old_min, old_max, new_min, new_max);
    cut.assign(&rescaled);
    debug!(old_min, old_max, new_min, new_max, "heights rescaled");
    out
}
