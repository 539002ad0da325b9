use ndarray::{Array2, Zip};

use crate::error::MapTransformationError;
use crate::grid::Grid;

fn ensure_co_registered(a: &Grid, b: &Grid) -> Result<(), MapTransformationError> {
    if a.is_co_registered(b) {
        Ok(())
    } else {
        Err(MapTransformationError::NotCoRegistered)
    }
}

/// Fill the missing cells of `base` with the cells of `overlay`.
pub fn merge(base: &Grid, overlay: &Grid) -> Result<Array2<f64>, MapTransformationError> {
    ensure_co_registered(base, overlay)?;
    Ok(Zip::from(base.heights())
        .and(overlay.heights())
        .map_collect(|&b, &o| if b.is_nan() { o } else { b }))
}

/// Cell by cell `a - b`; missing where either side is missing.
pub fn subtract(a: &Grid, b: &Grid) -> Result<Array2<f64>, MapTransformationError> {
    ensure_co_registered(a, b)?;
    Ok(Zip::from(a.heights())
        .and(b.heights())
        .map_collect(|&x, &y| if x.is_nan() || y.is_nan() { f64::NAN } else { x - y }))
}

/// Clear the cells of `base` where `marker` holds a value. Cells missing in
/// `marker` keep their height, so applying a grid to itself clears it.
pub fn replace_with_nan_from(base: &Grid, marker: &Grid) -> Result<Array2<f64>, MapTransformationError> {
    ensure_co_registered(base, marker)?;
    Ok(Zip::from(base.heights())
        .and(marker.heights())
        .map_collect(|&b, &m| if m.is_nan() { b } else { f64::NAN }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn grid(heights: Array2<f64>) -> Grid {
        let (rows, cols) = heights.dim();
        let x = Array1::from_iter((0..cols).map(|i| i as f64));
        let y = Array1::from_iter((0..rows).map(|i| i as f64));
        Grid::new(x, y, heights).unwrap()
    }

    #[test]
    fn test_merge_fills_only_missing() {
        let base = grid(array![[1.0, f64::NAN], [f64::NAN, 4.0]]);
        let overlay = grid(array![[9.0, 2.0], [f64::NAN, 9.0]]);
        let out = merge(&base, &overlay).unwrap();
        assert_eq!(out[[0, 0]], 1.0);
        assert_eq!(out[[0, 1]], 2.0);
        assert!(out[[1, 0]].is_nan());
        assert_eq!(out[[1, 1]], 4.0);
    }

    #[test]
    fn test_self_merge_is_identity() {
        let g = grid(array![[1.0, f64::NAN], [3.0, 4.0]]);
        let out = merge(&g, &g).unwrap();
        assert_eq!(out[[0, 0]], 1.0);
        assert!(out[[0, 1]].is_nan());
        assert_eq!(out[[1, 1]], 4.0);
    }

    #[test]
    fn test_subtract_self() {
        let g = grid(array![[1.5, f64::NAN], [3.0, -4.0]]);
        let out = subtract(&g, &g).unwrap();
        assert_eq!(out[[0, 0]], 0.0);
        assert!(out[[0, 1]].is_nan());
        assert_eq!(out[[1, 0]], 0.0);
        assert_eq!(out[[1, 1]], 0.0);
    }

    #[test]
    fn test_replace_with_self_clears_everything() {
        let g = grid(array![[1.0, 2.0], [3.0, f64::NAN]]);
        let out = replace_with_nan_from(&g, &g).unwrap();
        assert!(out.iter().all(|h| h.is_nan()));
        assert_eq!(g.heights()[[0, 0]], 1.0);
    }

    #[test]
    fn test_replace_keeps_cells_missing_in_marker() {
        let base = grid(array![[1.0, 2.0]]);
        let marker = grid(array![[0.0, f64::NAN]]);
        let out = replace_with_nan_from(&base, &marker).unwrap();
        assert!(out[[0, 0]].is_nan());
        assert_eq!(out[[0, 1]], 2.0);
    }

    #[test]
    fn test_mismatched_grids_are_rejected() {
        let a = grid(Array2::zeros((2, 3)));
        let b = grid(Array2::zeros((3, 2)));
        let shifted = Grid::new(array![0.5, 1.5, 2.5], array![0.0, 1.0], Array2::zeros((2, 3))).unwrap();

        for other in [&b, &shifted] {
            assert_eq!(merge(&a, other).unwrap_err().code(), 1);
            assert_eq!(subtract(&a, other).unwrap_err().code(), 1);
            assert_eq!(replace_with_nan_from(&a, other).unwrap_err().code(), 1);
        }
        assert!(a.heights().iter().all(|h| *h == 0.0));
    }
}
