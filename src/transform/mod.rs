//! Height transformations. Every operator reads its inputs and returns a new
//! height matrix.

pub mod annulus;
pub mod combine;
pub mod convolution;
pub mod fill;
pub mod interpolate;
pub mod linear;
pub mod smooth;

pub use annulus::{interpolate_annulus, AnnulusInterpolation};
pub use combine::{merge, replace_with_nan_from, subtract};
pub use convolution::convolution_fill;
pub use fill::{fill_nan_in_polygons, fill_nan_inside};
pub use interpolate::{interpolate_missing, InterpolationMode};
pub use linear::{interpolate_value, linear_rescale, rescale_inside};
pub use smooth::{gaussian_filter, smooth_area};

use ndarray::{Array2, Zip};

use crate::filter::{combined_mask, ResolvedFilter};
use crate::geometry::Vertex;
use crate::grid::Grid;
use crate::mask::{bounding_box_indices, mask_in_window, BoundingBoxIndices};

/// Cells selected by a polygon and its filters, inside the polygon's
/// bounding-box window.
pub(crate) struct Selection {
    pub window: BoundingBoxIndices,
    pub mask: Array2<bool>,
}

impl Selection {
    pub fn new(grid: &Grid, vertices: &[Vertex], filters: &[ResolvedFilter]) -> Self {
        let window = bounding_box_indices(grid.x(), grid.y(), vertices);
        let mut mask = mask_in_window(grid.x(), grid.y(), vertices, window);
        let filtered = combined_mask(filters, grid, window);
        Zip::from(&mut mask).and(&filtered).for_each(|keep, &pass| *keep &= pass);
        Self { window, mask }
    }
}
