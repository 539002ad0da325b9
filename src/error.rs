use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the engine reports. Each variant wraps a typed error that
/// carries its own numeric `code()` for the caller's error dialogs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Polygon(#[from] PolygonError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    ModelTransformation(#[from] ModelTransformationError),

    #[error(transparent)]
    MapTransformation(#[from] MapTransformationError),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Rejections raised while editing a polygon. A rejected edit leaves the
/// polygon exactly as it was.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolygonError {
    #[error("point already exists in the polygon")]
    RepeatedPoint,

    #[error("new line intersects the polygon")]
    LineIntersection,

    #[error("polygon needs at least 3 points, it has {0}")]
    NotEnoughPoints(usize),

    #[error("buffer distance must be greater than zero, got {0}")]
    InvalidBufferDistance(f64),
}

/// Hard failures of scene queries such as the min/max height preview.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    #[error("Polygon is not planar.")]
    PolygonNotPlanar,

    #[error("Polygon must have at least 3 vertices.")]
    NotEnoughVertices,

    #[error("Model does not support height queries. Try using a 2D map model.")]
    UnsupportedModel,

    #[error("Model not found in the scene.")]
    ModelNotFound,

    #[error("Polygon not found in the scene.")]
    PolygonNotFound,
}

impl SceneError {
    pub fn code(&self) -> u8 {
        match self {
            SceneError::PolygonNotPlanar => 1,
            SceneError::NotEnoughVertices => 2,
            SceneError::UnsupportedModel => 3,
            SceneError::ModelNotFound => 4,
            SceneError::PolygonNotFound => 5,
        }
    }
}

/// Failures of transformations that rewrite the cells inside one polygon.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ModelTransformationError {
    #[error("The polygon used doesnt have at least 3 vertices.")]
    NotEnoughVertices,

    #[error("Polygon used is not planar.")]
    PolygonNotPlanar,

    #[error("Can not use that model for transforming points. Try using a 2D map model.")]
    UnsupportedModel,

    #[error("Polygon to use in a filter not found or selected.")]
    FilterPolygonNotFound,

    #[error("Polygon used in a filter does not have at least 3 vertices.")]
    FilterPolygonNotEnoughVertices,

    #[error("Polygon used in filter is not simple/planar.")]
    FilterPolygonNotPlanar,

    #[error("Max height selected is lower than the min height selected.")]
    InvalidHeightRange,

    #[error("Model not found in program.")]
    ModelNotFound,

    #[error("Polygon not found in program.")]
    PolygonNotFound,
}

impl ModelTransformationError {
    pub fn code(&self) -> u8 {
        match self {
            ModelTransformationError::NotEnoughVertices => 2,
            ModelTransformationError::PolygonNotPlanar => 3,
            ModelTransformationError::UnsupportedModel => 4,
            ModelTransformationError::FilterPolygonNotFound => 6,
            ModelTransformationError::FilterPolygonNotEnoughVertices => 7,
            ModelTransformationError::FilterPolygonNotPlanar => 8,
            ModelTransformationError::InvalidHeightRange => 9,
            ModelTransformationError::ModelNotFound => 12,
            ModelTransformationError::PolygonNotFound => 13,
        }
    }
}

/// Failures of transformations that operate on whole maps.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum MapTransformationError {
    #[error("Model not found in the scene.")]
    ModelNotFound,

    #[error("Maps do not share the same coordinates and shape.")]
    NotCoRegistered,

    #[error("One polygon used in the transformation is not planar.")]
    PolygonNotPlanar,

    #[error("Kernel distance must be at least 3, got {0}.")]
    KernelTooSmall(usize),

    #[error("Missing value fraction must be between 0 and 1, got {0}.")]
    InvalidThreshold(f64),

    #[error("Model does not support height transformations. Try using a 2D map model.")]
    UnsupportedModel,
}

impl MapTransformationError {
    pub fn code(&self) -> u8 {
        match self {
            MapTransformationError::ModelNotFound | MapTransformationError::NotCoRegistered => 1,
            MapTransformationError::PolygonNotPlanar => 2,
            MapTransformationError::KernelTooSmall(_) => 3,
            MapTransformationError::InvalidThreshold(_) => 4,
            MapTransformationError::UnsupportedModel => 5,
        }
    }
}

/// Failures of the interpolations applied around a polygon.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum InterpolationError {
    #[error("Not enough points in the polygon to do the interpolation.")]
    NotEnoughVertices,

    #[error("Distance of interpolation must be greater than zero, got {0}.")]
    InvalidDistance(f64),

    #[error("Model not found in the scene.")]
    ModelNotFound,

    #[error("Polygon not found in the scene.")]
    PolygonNotFound,

    #[error("Polygon used is not planar.")]
    PolygonNotPlanar,

    #[error("Model does not support interpolation. Try using a 2D map model.")]
    UnsupportedModel,
}

impl InterpolationError {
    pub fn code(&self) -> u8 {
        match self {
            InterpolationError::NotEnoughVertices => 1,
            InterpolationError::InvalidDistance(_) => 2,
            InterpolationError::ModelNotFound => 4,
            InterpolationError::PolygonNotFound => 5,
            InterpolationError::PolygonNotPlanar => 6,
            InterpolationError::UnsupportedModel => 7,
        }
    }
}

/// Structural problems in grid data handed over by the loaders.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("height matrix is {rows}x{cols} but axes are {y_len} (y) by {x_len} (x)")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        x_len: usize,
        y_len: usize,
    },

    #[error("{0} axis must be strictly ascending")]
    NotAscending(&'static str),

    #[error("grid has no cells")]
    Empty,
}
