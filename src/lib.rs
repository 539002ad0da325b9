pub mod config;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod grid;
pub mod mask;
pub mod polygon;
pub mod scene;
pub mod stats;
pub mod transform;

pub use config::TransformConfig;
pub use dispatcher::{PreparedTransformation, Transformation, TransformationDispatcher, TransformationOutput};
pub use error::{
    Error, GridError, InterpolationError, MapTransformationError, ModelTransformationError, PolygonError, Result,
    SceneError,
};
pub use filter::Filter;
pub use geometry::{Vertex, PLANE_HEIGHT};
pub use grid::Grid;
pub use polygon::{ParameterValue, Polygon, PolygonId};
pub use scene::{Model, ModelId, ModelKind, Scene};
pub use transform::{AnnulusInterpolation, InterpolationMode};
