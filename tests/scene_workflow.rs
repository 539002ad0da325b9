use std::sync::mpsc;

use ndarray::{Array1, Array2};
use terrain_edit::{
    AnnulusInterpolation, Error, Filter, Grid, InterpolationMode, MapTransformationError, ModelId, ModelKind,
    ModelTransformationError, PolygonId, Scene, SceneError, Transformation, TransformationDispatcher,
};

fn slope(size: usize) -> Grid {
    let axis = Array1::from_iter((0..size).map(|i| i as f64));
    let heights = Array2::from_shape_fn((size, size), |(r, c)| 1000.0 + (r * size + c) as f64);
    Grid::new(axis.clone(), axis, heights).unwrap()
}

fn scene_with_map() -> (Scene, ModelId) {
    let mut scene = Scene::default();
    let id = ModelId::from("dem");
    scene.add_model(id.clone(), "dem", ModelKind::Map2d, slope(12));
    (scene, id)
}

fn draw(scene: &mut Scene, points: &[(f64, f64)]) -> PolygonId {
    let id = scene.create_polygon();
    scene.set_active_polygon(&id).unwrap();
    for &(x, y) in points {
        scene.add_vertex_to_active_polygon(x, y, 0.5).unwrap();
    }
    id
}

fn square(min: f64, max: f64) -> Vec<(f64, f64)> {
    vec![(min, min), (max, min), (max, max), (min, max)]
}

#[test]
fn test_polygon_ids_are_generated_in_order() {
    let mut scene = Scene::default();
    let first = scene.create_polygon();
    let second = scene.create_polygon();
    assert_eq!(first, PolygonId::from("Polygon 0"));
    assert_eq!(second, PolygonId::from("Polygon 1"));

    scene.delete_polygon(&first);
    assert!(scene.polygon(&first).is_none());
    assert_eq!(scene.polygons().len(), 1);
}

#[test]
fn test_min_max_preview_then_rescale() {
    let (mut scene, dem) = scene_with_map();
    let area = draw(&mut scene, &square(1.5, 4.5));

    let (max, min) = scene.min_max_height(&dem, &area).unwrap();
    assert_eq!((max, min), (1000.0 + 52.0, 1000.0 + 26.0));

    scene
        .apply_transformation(&Transformation::LinearRescale {
            model: dem.clone(),
            polygon: area.clone(),
            min_height: 0.0,
            max_height: 24.0,
            filters: vec![],
        })
        .unwrap();

    let heights = scene.heights(&dem).unwrap();
    assert_eq!(heights[[2, 2]], 0.0);
    assert_eq!(heights[[4, 4]], 24.0);
    assert_eq!(heights[[3, 3]], 12.0);
    assert_eq!(heights[[0, 0]], 1000.0);
    assert_eq!(scene.min_max_height(&dem, &area).unwrap(), (24.0, 0.0));
}

#[test]
fn test_filters_restrict_the_rescale() {
    let (mut scene, dem) = scene_with_map();
    let area = draw(&mut scene, &square(0.5, 10.5));
    let hole = draw(&mut scene, &square(2.5, 5.5));

    scene
        .apply_transformation(&Transformation::FillNan {
            model: dem.clone(),
            polygon: area,
            filters: vec![Filter::IsNotIn(hole.clone()), Filter::HeightGreaterThan(1060.0)],
        })
        .unwrap();

    let heights = scene.heights(&dem).unwrap();
    assert_eq!(heights[[4, 4]], 1000.0 + 52.0, "inside the excluded polygon");
    assert_eq!(heights[[1, 1]], 1000.0 + 13.0, "below the height limit");
    assert!(heights[[6, 6]].is_nan());
    assert_eq!(heights[[11, 11]], 1000.0 + 143.0, "outside the polygon");
}

#[test]
fn test_errors_leave_the_scene_untouched() {
    let (mut scene, dem) = scene_with_map();
    let area = draw(&mut scene, &square(1.5, 4.5));
    scene.add_model(ModelId::from("mesh"), "mesh", ModelKind::Map3d, slope(12));
    scene.add_model(ModelId::from("small"), "small", ModelKind::Map2d, slope(5));
    let before = scene.heights(&dem).unwrap().clone();

    let attempts = [
        Transformation::LinearRescale {
            model: dem.clone(),
            polygon: area.clone(),
            min_height: 3.0,
            max_height: 1.0,
            filters: vec![],
        },
        Transformation::LinearRescale {
            model: ModelId::from("mesh"),
            polygon: area.clone(),
            min_height: 0.0,
            max_height: 1.0,
            filters: vec![],
        },
        Transformation::FillNan {
            model: dem.clone(),
            polygon: area.clone(),
            filters: vec![Filter::IsIn(PolygonId::from("missing"))],
        },
        Transformation::Merge {
            base: dem.clone(),
            overlay: ModelId::from("small"),
        },
        Transformation::ConvolutionFill {
            model: dem.clone(),
            kernel_distance: 1,
            nan_fraction_threshold: 0.5,
        },
        Transformation::Interpolate {
            model: dem.clone(),
            polygon: area.clone(),
            distance: -1.0,
            kind: AnnulusInterpolation::Smooth,
        },
    ];
    let expected = [
        Error::ModelTransformation(ModelTransformationError::InvalidHeightRange),
        Error::ModelTransformation(ModelTransformationError::UnsupportedModel),
        Error::ModelTransformation(ModelTransformationError::FilterPolygonNotFound),
        Error::MapTransformation(MapTransformationError::NotCoRegistered),
        Error::MapTransformation(MapTransformationError::KernelTooSmall(1)),
    ];

    for (request, expected) in attempts.iter().zip(expected.iter()) {
        assert_eq!(&scene.apply_transformation(request).unwrap_err(), expected);
    }
    let err = scene.apply_transformation(&attempts[5]).unwrap_err();
    assert!(matches!(err, Error::Interpolation(e) if e.code() == 2));
    assert_eq!(scene.heights(&dem).unwrap(), &before);
}

#[test]
fn test_min_max_hard_errors() {
    let (mut scene, dem) = scene_with_map();
    scene.add_model(ModelId::from("mesh"), "mesh", ModelKind::Map3d, slope(12));
    let line = draw(&mut scene, &[(1.0, 1.0), (3.0, 1.0)]);
    let area = draw(&mut scene, &square(1.5, 4.5));

    assert_eq!(scene.min_max_height(&dem, &line), Err(SceneError::NotEnoughVertices));
    assert_eq!(scene.min_max_height(&ModelId::from("mesh"), &area).unwrap_err().code(), 3);
    assert_eq!(
        scene.min_max_height(&ModelId::from("nope"), &area),
        Err(SceneError::ModelNotFound)
    );
}

#[test]
fn test_hole_punch_and_repair() {
    let (mut scene, dem) = scene_with_map();
    let original = scene.heights(&dem).unwrap().clone();
    draw(&mut scene, &square(3.5, 6.5));
    draw(&mut scene, &[(8.5, 8.5), (10.5, 8.5), (9.5, 10.5)]);

    scene
        .apply_transformation(&Transformation::FillNanInPolygons { model: dem.clone() })
        .unwrap();
    let punched = scene.heights(&dem).unwrap().iter().filter(|h| h.is_nan()).count();
    assert_eq!(punched, 9 + 2);

    scene
        .apply_transformation(&Transformation::InterpolateMissing {
            model: dem.clone(),
            mode: InterpolationMode::Linear,
        })
        .unwrap();
    let repaired = scene.heights(&dem).unwrap();
    for (a, b) in repaired.iter().zip(original.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn test_smooth_band_keeps_polygon_interior() {
    let (mut scene, dem) = scene_with_map();
    let area = draw(&mut scene, &square(4.5, 6.5));
    let before = scene.heights(&dem).unwrap().clone();

    scene
        .apply_transformation(&Transformation::Interpolate {
            model: dem.clone(),
            polygon: area,
            distance: 2.0,
            kind: AnnulusInterpolation::Smooth,
        })
        .unwrap();
    let after = scene.heights(&dem).unwrap();
    assert_eq!(after[[5, 5]], before[[5, 5]]);
    assert_eq!(after[[0, 0]], before[[0, 0]]);
}

#[test]
fn test_prepared_transformation_runs_on_the_pool() {
    let (mut scene, dem) = scene_with_map();
    let area = draw(&mut scene, &square(1.5, 4.5));
    let prepared = TransformationDispatcher::new(&scene)
        .prepare(&Transformation::FillNan {
            model: dem.clone(),
            polygon: area,
            filters: vec![],
        })
        .unwrap();

    let (tx, rx) = mpsc::channel();
    prepared.spawn(move |result| {
        tx.send(result).unwrap();
    });
    let output = rx.recv().unwrap().unwrap();
    assert_eq!(output.model, dem);
    assert_eq!(scene.heights(&dem).unwrap().iter().filter(|h| h.is_nan()).count(), 0);

    scene.commit(output).unwrap();
    assert_eq!(scene.heights(&dem).unwrap().iter().filter(|h| h.is_nan()).count(), 9);
}
