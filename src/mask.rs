//! Point-in-polygon masks over a coordinate grid.

use geo::{Contains, Coord, LineString, Polygon as GeoPolygon};
use ndarray::{s, Array1, Array2};

use crate::geometry::{bounds, Vertex};
use crate::grid::par_rows;

/// Half-open index window `[min, max)` on both axes of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBoxIndices {
    pub min_x: usize,
    pub max_x: usize,
    pub min_y: usize,
    pub max_y: usize,
}

impl BoundingBoxIndices {
    /// Window covering a whole `(rows, cols)` grid.
    pub fn full(shape: (usize, usize)) -> Self {
        Self {
            min_x: 0,
            max_x: shape.1,
            min_y: 0,
            max_y: shape.0,
        }
    }

    /// `(rows, cols)` of the window.
    pub fn shape(&self) -> (usize, usize) {
        (
            self.max_y.saturating_sub(self.min_y),
            self.max_x.saturating_sub(self.min_x),
        )
    }

    pub fn is_empty(&self) -> bool {
        let (rows, cols) = self.shape();
        rows == 0 || cols == 0
    }

    /// Grow the window by `cells` on every side, clamped to a `(rows, cols)` grid.
    pub fn expanded(&self, cells: usize, shape: (usize, usize)) -> Self {
        Self {
            min_x: self.min_x.saturating_sub(cells),
            max_x: (self.max_x + cells).min(shape.1),
            min_y: self.min_y.saturating_sub(cells),
            max_y: (self.max_y + cells).min(shape.0),
        }
    }
}

/// First index whose coordinate is not below `bound`.
fn search_sorted(axis: &Array1<f64>, bound: f64) -> usize {
    match axis.as_slice() {
        Some(values) => values.partition_point(|v| *v < bound),
        None => axis.iter().take_while(|v| **v < bound).count(),
    }
}

/// Index window of the ring's bounding box on ascending axes.
///
/// Both ends use left insertion points, so a grid coordinate equal to the
/// maximum of the ring falls outside the window. Those points lie on the
/// boundary and are never inside the polygon.
pub fn bounding_box_indices(x: &Array1<f64>, y: &Array1<f64>, ring: &[Vertex]) -> BoundingBoxIndices {
    match bounds(ring) {
        Some((min_x, min_y, max_x, max_y)) => BoundingBoxIndices {
            min_x: search_sorted(x, min_x),
            max_x: search_sorted(x, max_x),
            min_y: search_sorted(y, min_y),
            max_y: search_sorted(y, max_y),
        },
        None => BoundingBoxIndices {
            min_x: 0,
            max_x: 0,
            min_y: 0,
            max_y: 0,
        },
    }
}

fn to_geo(vertices: &[Vertex]) -> GeoPolygon<f64> {
    let coords: Vec<Coord<f64>> = vertices
        .iter()
        .map(|v| Coord { x: v[0], y: v[1] })
        .collect();
    GeoPolygon::new(LineString::from(coords), vec![])
}

/// Grid points strictly inside the polygon, restricted to `window`.
///
/// The result has the shape of the window. Points on the boundary are not
/// inside. Fewer than 3 vertices select nothing.
pub fn mask_in_window(
    x: &Array1<f64>,
    y: &Array1<f64>,
    vertices: &[Vertex],
    window: BoundingBoxIndices,
) -> Array2<bool> {
    let shape = window.shape();
    if vertices.len() < 3 || window.is_empty() {
        return Array2::from_elem(shape, false);
    }

    let polygon = to_geo(vertices);
    par_rows(shape, |r| {
        let py = y[window.min_y + r];
        (0..shape.1)
            .map(|c| {
                let px = x[window.min_x + c];
                polygon.contains(&Coord { x: px, y: py })
            })
            .collect()
    })
}

/// Grid points strictly inside the polygon, over the whole grid.
pub fn mask(x: &Array1<f64>, y: &Array1<f64>, vertices: &[Vertex]) -> Array2<bool> {
    let shape = (y.len(), x.len());
    let window = bounding_box_indices(x, y, vertices);
    let mut full = Array2::from_elem(shape, false);
    if window.is_empty() {
        return full;
    }

    let inner = mask_in_window(x, y, vertices, window);
    full.slice_mut(s![window.min_y..window.max_y, window.min_x..window.max_x])
        .assign(&inner);
    full
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: usize) -> Array1<f64> {
        Array1::from_iter((0..n).map(|i| i as f64))
    }

    fn square(min: f64, max: f64) -> Vec<Vertex> {
        vec![
            [min, min, 0.5],
            [max, min, 0.5],
            [max, max, 0.5],
            [min, max, 0.5],
        ]
    }

    #[test]
    fn test_bounding_box_indices_left_insertion() {
        let x = axis(10);
        let y = axis(10);
        let bbox = bounding_box_indices(&x, &y, &square(1.5, 4.0));
        assert_eq!(
            bbox,
            BoundingBoxIndices {
                min_x: 2,
                max_x: 4,
                min_y: 2,
                max_y: 4
            }
        );
    }

    #[test]
    fn test_mask_excludes_boundary() {
        let x = axis(5);
        let y = axis(5);
        let mask = mask(&x, &y, &square(1.0, 3.0));

        let inside: Vec<(usize, usize)> = mask
            .indexed_iter()
            .filter(|(_, v)| **v)
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(inside, vec![(2, 2)], "only the centre point is strictly inside");
    }

    #[test]
    fn test_mask_follows_concave_outline() {
        let x = axis(6);
        let y = axis(6);
        let l_shape = vec![
            [0.5, 0.5, 0.5],
            [4.5, 0.5, 0.5],
            [4.5, 2.5, 0.5],
            [2.5, 2.5, 0.5],
            [2.5, 4.5, 0.5],
            [0.5, 4.5, 0.5],
        ];
        let mask = mask(&x, &y, &l_shape);
        assert!(mask[[1, 4]], "arm along x");
        assert!(mask[[4, 1]], "arm along y");
        assert!(!mask[[4, 4]], "notch of the L");
        assert_eq!(mask.iter().filter(|v| **v).count(), 12);
    }

    #[test]
    fn test_degenerate_polygon_selects_nothing() {
        let x = axis(4);
        let y = axis(4);
        let line = vec![[0.0, 0.0, 0.5], [3.0, 3.0, 0.5]];
        assert!(!mask(&x, &y, &line).iter().any(|v| *v));
    }

    #[test]
    fn test_window_mask_matches_full_mask() {
        let x = axis(8);
        let y = axis(8);
        let ring = square(0.5, 5.5);
        let window = bounding_box_indices(&x, &y, &ring);
        let windowed = mask_in_window(&x, &y, &ring, window);
        let full = mask(&x, &y, &ring);
        assert_eq!(
            windowed,
            full.slice(s![window.min_y..window.max_y, window.min_x..window.max_x])
        );
    }

    #[test]
    fn test_expanded_window_is_clamped() {
        let bbox = BoundingBoxIndices {
            min_x: 0,
            max_x: 3,
            min_y: 2,
            max_y: 5,
        };
        let grown = bbox.expanded(1, (5, 4));
        assert_eq!(
            grown,
            BoundingBoxIndices {
                min_x: 0,
                max_x: 4,
                min_y: 1,
                max_y: 5
            }
        );
    }
}
