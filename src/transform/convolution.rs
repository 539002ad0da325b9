use ndarray::Array2;
use tracing::debug;

use crate::error::MapTransformationError;
use crate::grid::par_rows;

/// Smallest accepted kernel distance.
pub const MIN_KERNEL_DISTANCE: usize = 3;

/// Summed-area table of the missing cells, with one leading row and column
/// of zeros.
fn missing_table(heights: &Array2<f64>) -> Array2<usize> {
    let (rows, cols) = heights.dim();
    let mut table = Array2::zeros((rows + 1, cols + 1));
    for r in 0..rows {
        let mut row_sum = 0;
        for c in 0..cols {
            row_sum += usize::from(heights[[r, c]].is_nan());
            table[[r + 1, c + 1]] = table[[r, c + 1]] + row_sum;
        }
    }
    table
}

/// Clear cells surrounded by too many missing cells.
///
/// For every non-missing cell, the fraction of missing cells among the other
/// grid cells within `kernel_distance` (Chebyshev) is computed. The cell is
/// cleared when that fraction is positive and reaches
/// `nan_fraction_threshold`. Fractions are taken from the input, so clearing
/// one cell does not affect its neighbours.
pub fn convolution_fill(
    heights: &Array2<f64>,
    kernel_distance: usize,
    nan_fraction_threshold: f64,
) -> Result<Array2<f64>, MapTransformationError> {
    if kernel_distance < MIN_KERNEL_DISTANCE {
        return Err(MapTransformationError::KernelTooSmall(kernel_distance));
    }
    if !(0.0..=1.0).contains(&nan_fraction_threshold) {
        return Err(MapTransformationError::InvalidThreshold(nan_fraction_threshold));
    }

    let (rows, cols) = heights.dim();
    let missing = heights.iter().filter(|h| h.is_nan()).count();
    if missing == 0 || missing == heights.len() {
        debug!(missing, "no pivot cells to clear");
        return Ok(heights.clone());
    }

    let table = missing_table(heights);
    let d = kernel_distance;
    let out = par_rows((rows, cols), |r| {
        let (top, bottom) = (r.saturating_sub(d), (r + d + 1).min(rows));
        (0..cols)
            .map(|c| {
                let h = heights[[r, c]];
                if h.is_nan() {
                    return h;
                }
                let (left, right) = (c.saturating_sub(d), (c + d + 1).min(cols));
                let neighbours = (bottom - top) * (right - left) - 1;
                if neighbours == 0 {
                    return h;
                }
                let missing = table[[bottom, right]] + table[[top, left]]
                    - table[[top, right]]
                    - table[[bottom, left]];
                let fraction = missing as f64 / neighbours as f64;
                if fraction > 0.0 && fraction >= nan_fraction_threshold {
                    f64::NAN
                } else {
                    h
                }
            })
            .collect()
    });

    debug!(
        cleared = out.iter().filter(|h| h.is_nan()).count() - missing,
        "convolution fill applied"
    );
    Ok(out)
}
