use ndarray::{s, Array2, Zip};
use tracing::debug;

use super::Selection;
use crate::filter::ResolvedFilter;
use crate::geometry::Vertex;
use crate::grid::Grid;
use crate::mask;

/// Mark the cells inside a polygon that pass every filter as missing.
pub fn fill_nan_inside(grid: &Grid, vertices: &[Vertex], filters: &[ResolvedFilter]) -> Array2<f64> {
    let selection = Selection::new(grid, vertices, filters);
    let mut out = grid.heights().clone();
    if selection.window.is_empty() {
        return out;
    }

    let window = selection.window;
    let mut cut = out.slice_mut(s![window.min_y..window.max_y, window.min_x..window.max_x]);
    Zip::from(&mut cut).and(&selection.mask).for_each(|h, &selected| {
        if selected {
            *h = f64::NAN;
        }
    });
    out
}

/// Mark the cells inside any of the polygons as missing.
///
/// Polygons with fewer than 3 vertices select nothing.
pub fn fill_nan_in_polygons<'a, I>(grid: &Grid, polygons: I) -> Array2<f64>
where
    I: IntoIterator<Item = &'a [Vertex]>,
{
    let mut out = grid.heights().clone();
    let mut count = 0;
    for vertices in polygons {
        if vertices.len() < 3 {
            continue;
        }
        let inside = mask::mask(grid.x(), grid.y(), vertices);
        Zip::from(&mut out).and(&inside).for_each(|h, &inside| {
            if inside {
                *h = f64::NAN;
            }
        });
        count += 1;
    }
    debug!(polygons = count, "filled polygons with missing values");
    out
}
