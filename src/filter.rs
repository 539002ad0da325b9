//! Filters narrowing the cells touched by a polygon transformation.

use ndarray::{s, Array2, Zip};

use crate::error::ModelTransformationError;
use crate::geometry::Vertex;
use crate::grid::Grid;
use crate::mask::{mask_in_window, BoundingBoxIndices};
use crate::polygon::{Polygon, PolygonId};

/// A condition a cell must meet to be transformed.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Keep cells with height `<=` the limit. The limit itself passes.
    HeightLessThan(f64),
    /// Keep cells with height `>=` the limit. The limit itself passes.
    HeightGreaterThan(f64),
    /// Keep cells strictly inside another polygon.
    IsIn(PolygonId),
    /// Keep cells not strictly inside another polygon.
    IsNotIn(PolygonId),
}

/// Filter whose polygon reference has been looked up and checked.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedFilter {
    HeightLessThan(f64),
    HeightGreaterThan(f64),
    IsIn(Vec<Vertex>),
    IsNotIn(Vec<Vertex>),
}

impl Filter {
    /// Look up the polygon a filter refers to.
    ///
    /// The polygon must exist (code 6), have at least 3 vertices (code 7)
    /// and be simple (code 8).
    pub fn resolve<'a, F>(&self, lookup: F) -> Result<ResolvedFilter, ModelTransformationError>
    where
        F: Fn(&PolygonId) -> Option<&'a Polygon>,
    {
        let polygon_vertices = |id: &PolygonId| {
            let polygon = lookup(id).ok_or(ModelTransformationError::FilterPolygonNotFound)?;
            if polygon.point_count() < 3 {
                return Err(ModelTransformationError::FilterPolygonNotEnoughVertices);
            }
            if !polygon.is_planar() {
                return Err(ModelTransformationError::FilterPolygonNotPlanar);
            }
            Ok(polygon.vertices().to_vec())
        };

        Ok(match self {
            Filter::HeightLessThan(limit) => ResolvedFilter::HeightLessThan(*limit),
            Filter::HeightGreaterThan(limit) => ResolvedFilter::HeightGreaterThan(*limit),
            Filter::IsIn(id) => ResolvedFilter::IsIn(polygon_vertices(id)?),
            Filter::IsNotIn(id) => ResolvedFilter::IsNotIn(polygon_vertices(id)?),
        })
    }
}

impl ResolvedFilter {
    /// Clear the cells of `mask` (shaped like `window`) that fail this filter.
    pub fn restrict(&self, grid: &Grid, window: BoundingBoxIndices, mask: &mut Array2<bool>) {
        let heights = grid
            .heights()
            .slice(s![window.min_y..window.max_y, window.min_x..window.max_x]);

        match self {
            ResolvedFilter::HeightLessThan(limit) => {
                Zip::from(mask).and(&heights).for_each(|keep, &h| {
                    if h > *limit {
                        *keep = false;
                    }
                });
            }
            ResolvedFilter::HeightGreaterThan(limit) => {
                Zip::from(mask).and(&heights).for_each(|keep, &h| {
                    if h < *limit {
                        *keep = false;
                    }
                });
            }
            ResolvedFilter::IsIn(vertices) => {
                let inside = mask_in_window(grid.x(), grid.y(), vertices, window);
                Zip::from(mask).and(&inside).for_each(|keep, &inside| *keep &= inside);
            }
            ResolvedFilter::IsNotIn(vertices) => {
                let inside = mask_in_window(grid.x(), grid.y(), vertices, window);
                Zip::from(mask).and(&inside).for_each(|keep, &inside| *keep &= !inside);
            }
        }
    }
}

/// Cells of `window` passing every filter. No filters keep every cell.
pub fn combined_mask(filters: &[ResolvedFilter], grid: &Grid, window: BoundingBoxIndices) -> Array2<bool> {
    let mut mask = Array2::from_elem(window.shape(), true);
    for filter in filters {
        filter.restrict(grid, window, &mut mask);
    }
    mask
}
