//! Validation and execution of transformation requests.
//!
//! Every request goes through the same ordered checks before any numeric
//! work starts: the target model, then the polygon (existence, vertex count,
//! planarity), then the model kind, then filters and parameters. A request
//! that passes is snapshotted into a [`PreparedTransformation`] which owns
//! everything it needs and can run on another thread.

use std::sync::Arc;

use ndarray::Array2;
use tracing::{debug, info};

use crate::config::TransformConfig;
use crate::error::{InterpolationError, MapTransformationError, ModelTransformationError, Result};
use crate::filter::{Filter, ResolvedFilter};
use crate::geometry::Vertex;
use crate::grid::Grid;
use crate::polygon::{Polygon, PolygonId};
use crate::scene::{Model, ModelId, Scene};
use crate::transform::{self, AnnulusInterpolation, InterpolationMode};

/// A transformation request built by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformation {
    /// Stretch the heights inside a polygon onto a new range.
    LinearRescale {
        model: ModelId,
        polygon: PolygonId,
        min_height: f64,
        max_height: f64,
        filters: Vec<Filter>,
    },
    /// Mark the cells inside a polygon as missing.
    FillNan {
        model: ModelId,
        polygon: PolygonId,
        filters: Vec<Filter>,
    },
    /// Rebuild the band between a polygon and its buffer at `distance`.
    Interpolate {
        model: ModelId,
        polygon: PolygonId,
        distance: f64,
        kind: AnnulusInterpolation,
    },
    /// Fill every missing cell of a map.
    InterpolateMissing { model: ModelId, mode: InterpolationMode },
    /// Fill the missing cells of `base` from `overlay`.
    Merge { base: ModelId, overlay: ModelId },
    /// Replace `model` by `model - subtrahend`.
    Subtract { model: ModelId, subtrahend: ModelId },
    /// Clear the cells of `model` where `marker` holds a value.
    ReplaceWithNan { model: ModelId, marker: ModelId },
    /// Clear cells surrounded by too many missing cells.
    ConvolutionFill {
        model: ModelId,
        kernel_distance: usize,
        nan_fraction_threshold: f64,
    },
    /// Mark the cells inside every polygon of the scene as missing.
    FillNanInPolygons { model: ModelId },
}

impl Transformation {
    /// Model whose heights are replaced by the result.
    pub fn target(&self) -> &ModelId {
        match self {
            Transformation::LinearRescale { model, .. }
            | Transformation::FillNan { model, .. }
            | Transformation::Interpolate { model, .. }
            | Transformation::InterpolateMissing { model, .. }
            | Transformation::Subtract { model, .. }
            | Transformation::ReplaceWithNan { model, .. }
            | Transformation::ConvolutionFill { model, .. }
            | Transformation::FillNanInPolygons { model } => model,
            Transformation::Merge { base, .. } => base,
        }
    }
}

/// New heights for a model.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformationOutput {
    pub model: ModelId,
    pub heights: Array2<f64>,
}

/// Validated work, detached from the scene.
#[derive(Debug, Clone)]
enum Operation {
    Rescale {
        vertices: Vec<Vertex>,
        filters: Vec<ResolvedFilter>,
        min_height: f64,
        max_height: f64,
    },
    FillNan {
        vertices: Vec<Vertex>,
        filters: Vec<ResolvedFilter>,
    },
    Annulus {
        inner: Vec<Vertex>,
        outer: Vec<Vertex>,
        kind: AnnulusInterpolation,
    },
    InterpolateMissing(InterpolationMode),
    Merge(Arc<Grid>),
    Subtract(Arc<Grid>),
    ReplaceWithNan(Arc<Grid>),
    ConvolutionFill {
        kernel_distance: usize,
        nan_fraction_threshold: f64,
    },
    FillNanInPolygons(Vec<Vec<Vertex>>),
}

/// A transformation that passed validation. Owns its inputs, so it can be
/// executed after the scene has moved on, or on another thread.
#[derive(Debug, Clone)]
pub struct PreparedTransformation {
    model: ModelId,
    grid: Arc<Grid>,
    operation: Operation,
    config: TransformConfig,
}

impl PreparedTransformation {
    pub fn model(&self) -> &ModelId {
        &self.model
    }

    /// Run the transformation and return the new heights of the model.
    pub fn execute(self) -> Result<TransformationOutput> {
        let grid = self.grid.as_ref();
        let heights = match &self.operation {
            Operation::Rescale {
                vertices,
                filters,
                min_height,
                max_height,
            } => transform::rescale_inside(grid, vertices, filters, *min_height, *max_height),
            Operation::FillNan { vertices, filters } => transform::fill_nan_inside(grid, vertices, filters),
            Operation::Annulus { inner, outer, kind } => {
                transform::interpolate_annulus(grid, inner, outer, *kind, &self.config)
            }
            Operation::InterpolateMissing(mode) => transform::interpolate_missing(grid, *mode),
            Operation::Merge(overlay) => transform::merge(grid, overlay)?,
            Operation::Subtract(subtrahend) => transform::subtract(grid, subtrahend)?,
            Operation::ReplaceWithNan(marker) => transform::replace_with_nan_from(grid, marker)?,
            Operation::ConvolutionFill {
                kernel_distance,
                nan_fraction_threshold,
            } => transform::convolution_fill(grid.heights(), *kernel_distance, *nan_fraction_threshold)?,
            Operation::FillNanInPolygons(polygons) => {
                transform::fill_nan_in_polygons(grid, polygons.iter().map(Vec::as_slice))
            }
        };
        info!(model = %self.model, "transformation executed");
        Ok(TransformationOutput {
            model: self.model,
            heights,
        })
    }

    /// Execute on the rayon pool and hand the result to `callback` there.
    ///
    /// There is no cancellation: once spawned the work runs to completion.
    pub fn spawn<F>(self, callback: F)
    where
        F: FnOnce(Result<TransformationOutput>) + Send + 'static,
    {
        debug!(model = %self.model, "transformation spawned");
        rayon::spawn(move || callback(self.execute()));
    }
}

/// Checks a request against a scene and runs it.
pub struct TransformationDispatcher<'s> {
    scene: &'s Scene,
}

impl<'s> TransformationDispatcher<'s> {
    pub fn new(scene: &'s Scene) -> Self {
        Self { scene }
    }

    /// Validate and execute in place.
    pub fn run(&self, request: &Transformation) -> Result<TransformationOutput> {
        self.prepare(request)?.execute()
    }

    /// Validate a request and snapshot its inputs.
    pub fn prepare(&self, request: &Transformation) -> Result<PreparedTransformation> {
        debug!(model = %request.target(), ?request, "validating transformation");
        match request {
            Transformation::LinearRescale {
                model,
                polygon,
                min_height,
                max_height,
                filters,
            } => {
                let (target, polygon) = self.model_and_polygon(model, polygon)?;
                let filters = self.resolve_filters(filters)?;
                if min_height > max_height {
                    return Err(ModelTransformationError::InvalidHeightRange.into());
                }
                Ok(self.snapshot(
                    target,
                    Operation::Rescale {
                        vertices: polygon.vertices().to_vec(),
                        filters,
                        min_height: *min_height,
                        max_height: *max_height,
                    },
                ))
            }
            Transformation::FillNan { model, polygon, filters } => {
                let (target, polygon) = self.model_and_polygon(model, polygon)?;
                let filters = self.resolve_filters(filters)?;
                Ok(self.snapshot(
                    target,
                    Operation::FillNan {
                        vertices: polygon.vertices().to_vec(),
                        filters,
                    },
                ))
            }
            Transformation::Interpolate {
                model,
                polygon,
                distance,
                kind,
            } => {
                let target = self.scene.model(model).ok_or(InterpolationError::ModelNotFound)?;
                let polygon = self.scene.polygon(polygon).ok_or(InterpolationError::PolygonNotFound)?;
                if polygon.point_count() < 3 {
                    return Err(InterpolationError::NotEnoughVertices.into());
                }
                if !polygon.is_planar() {
                    return Err(InterpolationError::PolygonNotPlanar.into());
                }
                if !target.kind().supports_height_edits() {
                    return Err(InterpolationError::UnsupportedModel.into());
                }
                if !(*distance > 0.0) {
                    return Err(InterpolationError::InvalidDistance(*distance).into());
                }
                let outer = polygon.exterior_buffer(*distance)?;
                Ok(self.snapshot(
                    target,
                    Operation::Annulus {
                        inner: polygon.vertices().to_vec(),
                        outer,
                        kind: *kind,
                    },
                ))
            }
            Transformation::InterpolateMissing { model, mode } => {
                let target = self.map_model(model)?;
                Ok(self.snapshot(target, Operation::InterpolateMissing(*mode)))
            }
            Transformation::Merge { base, overlay } => {
                let (target, other) = self.co_registered_pair(base, overlay)?;
                Ok(self.snapshot(target, Operation::Merge(other)))
            }
            Transformation::Subtract { model, subtrahend } => {
                let (target, other) = self.co_registered_pair(model, subtrahend)?;
                Ok(self.snapshot(target, Operation::Subtract(other)))
            }
            Transformation::ReplaceWithNan { model, marker } => {
                let (target, other) = self.co_registered_pair(model, marker)?;
                Ok(self.snapshot(target, Operation::ReplaceWithNan(other)))
            }
            Transformation::ConvolutionFill {
                model,
                kernel_distance,
                nan_fraction_threshold,
            } => {
                let target = self.map_model(model)?;
                if *kernel_distance < transform::convolution::MIN_KERNEL_DISTANCE {
                    return Err(MapTransformationError::KernelTooSmall(*kernel_distance).into());
                }
                if !(0.0..=1.0).contains(nan_fraction_threshold) {
                    return Err(MapTransformationError::InvalidThreshold(*nan_fraction_threshold).into());
                }
                Ok(self.snapshot(
                    target,
                    Operation::ConvolutionFill {
                        kernel_distance: *kernel_distance,
                        nan_fraction_threshold: *nan_fraction_threshold,
                    },
                ))
            }
            Transformation::FillNanInPolygons { model } => {
                let target = self.map_model(model)?;
                let mut polygons = Vec::new();
                for polygon in self.scene.polygons() {
                    if polygon.point_count() < 3 {
                        continue;
                    }
                    if !polygon.is_planar() {
                        return Err(MapTransformationError::PolygonNotPlanar.into());
                    }
                    polygons.push(polygon.vertices().to_vec());
                }
                Ok(self.snapshot(target, Operation::FillNanInPolygons(polygons)))
            }
        }
    }

    fn snapshot(&self, target: &Model, operation: Operation) -> PreparedTransformation {
        PreparedTransformation {
            model: target.id().clone(),
            grid: target.shared_grid(),
            operation,
            config: self.scene.config().clone(),
        }
    }

    /// Checks shared by the transformations bounded by one polygon.
    fn model_and_polygon(
        &self,
        model: &ModelId,
        polygon: &PolygonId,
    ) -> std::result::Result<(&'s Model, &'s Polygon), ModelTransformationError> {
        let target = self.scene.model(model).ok_or(ModelTransformationError::ModelNotFound)?;
        let polygon = self
            .scene
            .polygon(polygon)
            .ok_or(ModelTransformationError::PolygonNotFound)?;
        if polygon.point_count() < 3 {
            return Err(ModelTransformationError::NotEnoughVertices);
        }
        if !polygon.is_planar() {
            return Err(ModelTransformationError::PolygonNotPlanar);
        }
        if !target.kind().supports_height_edits() {
            return Err(ModelTransformationError::UnsupportedModel);
        }
        Ok((target, polygon))
    }

    fn resolve_filters(&self, filters: &[Filter]) -> std::result::Result<Vec<ResolvedFilter>, ModelTransformationError> {
        filters
            .iter()
            .map(|filter| filter.resolve(|id| self.scene.polygon(id)))
            .collect()
    }

    fn map_model(&self, model: &ModelId) -> std::result::Result<&'s Model, MapTransformationError> {
        let target = self.scene.model(model).ok_or(MapTransformationError::ModelNotFound)?;
        if !target.kind().supports_height_edits() {
            return Err(MapTransformationError::UnsupportedModel);
        }
        Ok(target)
    }

    fn co_registered_pair(
        &self,
        model: &ModelId,
        other: &ModelId,
    ) -> std::result::Result<(&'s Model, Arc<Grid>), MapTransformationError> {
        let target = self.map_model(model)?;
        let other = self.scene.model(other).ok_or(MapTransformationError::ModelNotFound)?;
        if !target.grid().is_co_registered(other.grid()) {
            return Err(MapTransformationError::NotCoRegistered);
        }
        Ok((target, other.shared_grid()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::scene::ModelKind;
    use ndarray::Array1;
    use std::sync::mpsc;

    fn scene() -> Scene {
        let axis = Array1::from_iter((0..10).map(|i| i as f64));
        let heights = Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as f64);
        let grid = Grid::new(axis.clone(), axis, heights).unwrap();
        let mut scene = Scene::default();
        scene.add_model(ModelId::from("map"), "map", ModelKind::Map2d, grid.clone());
        scene.add_model(ModelId::from("mesh"), "mesh", ModelKind::Map3d, grid);
        scene
    }

    fn draw(scene: &mut Scene, points: &[(f64, f64)]) -> PolygonId {
        let id = scene.create_polygon();
        scene.set_active_polygon(&id).unwrap();
        for &(x, y) in points {
            scene.add_vertex_to_active_polygon(x, y, 0.5).unwrap();
        }
        id
    }

    fn rescale(model: &str, polygon: &PolygonId, filters: Vec<Filter>) -> Transformation {
        Transformation::LinearRescale {
            model: ModelId::from(model),
            polygon: polygon.clone(),
            min_height: 0.0,
            max_height: 1.0,
            filters,
        }
    }

    fn code(err: Error) -> u8 {
        match err {
            Error::ModelTransformation(e) => e.code(),
            Error::MapTransformation(e) => e.code(),
            Error::Interpolation(e) => e.code(),
            Error::Scene(e) => e.code(),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_model_transformation_check_order() {
        let mut scene = scene();
        let square = draw(&mut scene, &[(0.5, 0.5), (3.5, 0.5), (3.5, 3.5), (0.5, 3.5)]);
        let line = draw(&mut scene, &[(0.5, 0.5), (3.5, 0.5)]);
        let bow = draw(&mut scene, &[(0.0, 0.0), (1.0, 0.0), (1.0, -1.0), (2.0, -0.5)]);
        let dispatcher = TransformationDispatcher::new(&scene);

        let err = dispatcher.prepare(&rescale("nope", &line, vec![])).unwrap_err();
        assert_eq!(code(err), 12);
        let err = dispatcher
            .prepare(&rescale("map", &PolygonId::from("nope"), vec![]))
            .unwrap_err();
        assert_eq!(code(err), 13);
        assert_eq!(code(dispatcher.prepare(&rescale("mesh", &line, vec![])).unwrap_err()), 2);
        assert_eq!(code(dispatcher.prepare(&rescale("mesh", &bow, vec![])).unwrap_err()), 3);
        assert_eq!(code(dispatcher.prepare(&rescale("mesh", &square, vec![])).unwrap_err()), 4);

        let filters = vec![Filter::IsIn(PolygonId::from("nope"))];
        assert_eq!(code(dispatcher.prepare(&rescale("map", &square, filters)).unwrap_err()), 6);
        let filters = vec![Filter::IsIn(line.clone())];
        assert_eq!(code(dispatcher.prepare(&rescale("map", &square, filters)).unwrap_err()), 7);
        let filters = vec![Filter::IsNotIn(bow.clone())];
        assert_eq!(code(dispatcher.prepare(&rescale("map", &square, filters)).unwrap_err()), 8);

        let inverted = Transformation::LinearRescale {
            model: ModelId::from("map"),
            polygon: square.clone(),
            min_height: 5.0,
            max_height: 1.0,
            filters: vec![],
        };
        assert_eq!(code(dispatcher.prepare(&inverted).unwrap_err()), 9);
    }

    #[test]
    fn test_failed_request_leaves_scene_untouched() {
        let mut scene = scene();
        let bow = draw(&mut scene, &[(0.0, 0.0), (1.0, 0.0), (1.0, -1.0), (2.0, -0.5)]);
        let before = scene.heights(&ModelId::from("map")).unwrap().clone();

        assert!(scene.apply_transformation(&rescale("map", &bow, vec![])).is_err());
        assert_eq!(scene.heights(&ModelId::from("map")).unwrap(), &before);
    }

    #[test]
    fn test_rescale_is_committed() {
        let mut scene = scene();
        let square = draw(&mut scene, &[(0.5, 0.5), (2.5, 0.5), (2.5, 2.5), (0.5, 2.5)]);
        scene.apply_transformation(&rescale("map", &square, vec![])).unwrap();

        let heights = scene.heights(&ModelId::from("map")).unwrap();
        assert_eq!(heights[[1, 1]], 0.0);
        assert_eq!(heights[[2, 2]], 1.0);
        assert_eq!(heights[[5, 5]], 55.0);
    }

    #[test]
    fn test_interpolation_checks() {
        let mut scene = scene();
        let square = draw(&mut scene, &[(3.5, 3.5), (5.5, 3.5), (5.5, 5.5), (3.5, 5.5)]);
        let line = draw(&mut scene, &[(0.5, 0.5), (3.5, 0.5)]);
        let bow = draw(&mut scene, &[(0.0, 0.0), (1.0, 0.0), (1.0, -1.0), (2.0, -0.5)]);
        let dispatcher = TransformationDispatcher::new(&scene);
        let request = |model: &str, polygon: &PolygonId, distance: f64| Transformation::Interpolate {
            model: ModelId::from(model),
            polygon: polygon.clone(),
            distance,
            kind: AnnulusInterpolation::Linear,
        };

        assert_eq!(code(dispatcher.prepare(&request("nope", &square, 1.0)).unwrap_err()), 4);
        assert_eq!(
            code(dispatcher.prepare(&request("map", &PolygonId::from("nope"), 1.0)).unwrap_err()),
            5
        );
        assert_eq!(code(dispatcher.prepare(&request("map", &line, 1.0)).unwrap_err()), 1);
        assert_eq!(code(dispatcher.prepare(&request("map", &bow, 1.0)).unwrap_err()), 6);
        assert_eq!(code(dispatcher.prepare(&request("mesh", &square, 1.0)).unwrap_err()), 7);
        assert_eq!(code(dispatcher.prepare(&request("map", &square, 0.0)).unwrap_err()), 2);

        let output = dispatcher.run(&request("map", &square, 1.5)).unwrap();
        let linear = |r: usize, c: usize| (r * 10 + c) as f64;
        assert!((output.heights[[3, 3]] - linear(3, 3)).abs() < 1e-9);
        assert!((output.heights[[6, 4]] - linear(6, 4)).abs() < 1e-9);
    }

    #[test]
    fn test_map_transformation_checks() {
        let mut scene = scene();
        let axis = Array1::from_iter((0..5).map(|i| i as f64));
        let small = Grid::new(axis.clone(), axis, Array2::zeros((5, 5))).unwrap();
        scene.add_model(ModelId::from("small"), "small", ModelKind::Map2d, small);
        let dispatcher = TransformationDispatcher::new(&scene);

        let merge = |base: &str, overlay: &str| Transformation::Merge {
            base: ModelId::from(base),
            overlay: ModelId::from(overlay),
        };
        assert_eq!(code(dispatcher.prepare(&merge("nope", "map")).unwrap_err()), 1);
        assert_eq!(code(dispatcher.prepare(&merge("map", "nope")).unwrap_err()), 1);
        assert_eq!(code(dispatcher.prepare(&merge("map", "small")).unwrap_err()), 1);
        assert_eq!(code(dispatcher.prepare(&merge("mesh", "map")).unwrap_err()), 5);
        assert!(dispatcher.prepare(&merge("map", "mesh")).is_ok());

        let convolution = |kernel_distance: usize, nan_fraction_threshold: f64| Transformation::ConvolutionFill {
            model: ModelId::from("map"),
            kernel_distance,
            nan_fraction_threshold,
        };
        assert_eq!(code(dispatcher.prepare(&convolution(2, 0.5)).unwrap_err()), 3);
        assert_eq!(code(dispatcher.prepare(&convolution(3, -0.1)).unwrap_err()), 4);
        assert!(dispatcher.prepare(&convolution(3, 1.0)).is_ok());
    }

    #[test]
    fn test_fill_nan_in_polygons_requires_planar_polygons() {
        let mut scene = scene();
        draw(&mut scene, &[(0.5, 0.5), (2.5, 0.5), (2.5, 2.5), (0.5, 2.5)]);
        draw(&mut scene, &[(7.0, 7.0)]);
        let request = Transformation::FillNanInPolygons {
            model: ModelId::from("map"),
        };

        scene.apply_transformation(&request).unwrap();
        let heights = scene.heights(&ModelId::from("map")).unwrap();
        assert_eq!(heights.iter().filter(|h| h.is_nan()).count(), 4);

        draw(&mut scene, &[(4.0, 4.0), (5.0, 4.0), (5.0, 3.0), (6.0, 3.5)]);
        let err = scene.apply_transformation(&request).unwrap_err();
        assert_eq!(code(err), 2);
    }

    #[test]
    fn test_spawned_transformation_reports_back() {
        let scene = scene();
        let prepared = TransformationDispatcher::new(&scene)
            .prepare(&Transformation::Subtract {
                model: ModelId::from("map"),
                subtrahend: ModelId::from("map"),
            })
            .unwrap();

        let (tx, rx) = mpsc::channel();
        prepared.spawn(move |result| {
            tx.send(result).unwrap();
        });
        let output = rx.recv().unwrap().unwrap();
        assert_eq!(output.model, ModelId::from("map"));
        assert!(output.heights.iter().all(|&h| h == 0.0));
    }
}
