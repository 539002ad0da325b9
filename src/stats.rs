use ndarray::{Array2, Zip};

use crate::geometry::Vertex;
use crate::grid::Grid;
use crate::mask;

/// `(max, min)` over the non-missing cells selected by `mask`.
///
/// Returns `None` when the mask selects no non-missing cell.
pub fn nan_max_min(heights: &Array2<f64>, mask: &Array2<bool>) -> Option<(f64, f64)> {
    let mut extremes: Option<(f64, f64)> = None;
    Zip::from(heights).and(mask).for_each(|&h, &selected| {
        if !selected || h.is_nan() {
            return;
        }
        extremes = Some(match extremes {
            Some((max, min)) => (max.max(h), min.min(h)),
            None => (h, h),
        });
    });
    extremes
}

/// Highest and lowest heights strictly inside a polygon, as `(max, min)`.
///
/// This is a preview query and fails softly: a non-planar polygon, fewer
/// than 3 vertices, an empty selection or a selection of missing cells all
/// give `(NaN, NaN)`.
pub fn min_max_inside(grid: &Grid, vertices: &[Vertex], is_planar: bool) -> (f64, f64) {
    if !is_planar || vertices.len() < 3 {
        return (f64::NAN, f64::NAN);
    }
    let mask = mask::mask(grid.x(), grid.y(), vertices);
    nan_max_min(grid.heights(), &mask).unwrap_or((f64::NAN, f64::NAN))
}
