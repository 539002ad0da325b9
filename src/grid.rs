use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::error::GridError;

/// Height map sampled on a regular, axis aligned lattice.
///
/// `heights[[row, col]]` is the height at `(x[col], y[row])`. Missing cells
/// hold `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    x: Array1<f64>,
    y: Array1<f64>,
    heights: Array2<f64>,
}

impl Grid {
    pub fn new(x: Array1<f64>, y: Array1<f64>, heights: Array2<f64>) -> Result<Self, GridError> {
        let (rows, cols) = heights.dim();
        if rows != y.len() || cols != x.len() {
            return Err(GridError::ShapeMismatch {
                rows,
                cols,
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        if rows == 0 || cols == 0 {
            return Err(GridError::Empty);
        }
        if !is_ascending(&x) {
            return Err(GridError::NotAscending("x"));
        }
        if !is_ascending(&y) {
            return Err(GridError::NotAscending("y"));
        }
        Ok(Self { x, y, heights })
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn heights(&self) -> &Array2<f64> {
        &self.heights
    }

    /// `(rows, cols)`, that is `(y.len(), x.len())`.
    pub fn shape(&self) -> (usize, usize) {
        self.heights.dim()
    }

    /// Same axes with a new height matrix. The matrix must keep the shape.
    pub fn with_heights(&self, heights: Array2<f64>) -> Result<Self, GridError> {
        let (rows, cols) = heights.dim();
        if heights.dim() != self.shape() {
            return Err(GridError::ShapeMismatch {
                rows,
                cols,
                x_len: self.x.len(),
                y_len: self.y.len(),
            });
        }
        Ok(Self {
            x: self.x.clone(),
            y: self.y.clone(),
            heights,
        })
    }

    /// Both grids sample the same points.
    pub fn is_co_registered(&self, other: &Grid) -> bool {
        self.x == other.x && self.y == other.y
    }

    pub fn missing_count(&self) -> usize {
        self.heights.iter().filter(|h| h.is_nan()).count()
    }
}

/// Build a `(rows, cols)` matrix whose rows are computed in parallel.
pub(crate) fn par_rows<T, F>(shape: (usize, usize), row: F) -> Array2<T>
where
    T: Send + Clone,
    F: Fn(usize) -> Vec<T> + Sync + Send,
{
    let rows: Vec<Vec<T>> = (0..shape.0).into_par_iter().map(row).collect();
    Array2::from_shape_fn(shape, |(r, c)| rows[r][c].clone())
}

fn is_ascending(axis: &Array1<f64>) -> bool {
    axis.iter().zip(axis.iter().skip(1)).all(|(a, b)| a < b)
}
