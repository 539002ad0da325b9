//! Models and polygons being edited, and the entry point that commits
//! transformation results.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::config::TransformConfig;
use crate::dispatcher::{Transformation, TransformationDispatcher, TransformationOutput};
use crate::error::{Error, PolygonError, Result, SceneError};
use crate::geometry::Vertex;
use crate::grid::Grid;
use crate::polygon::{ParameterValue, Polygon, PolygonId};
use crate::stats;

/// Identifier of a model inside a scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub String);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        ModelId(value.to_string())
    }
}

/// How a model is displayed, which decides the edits it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Height map seen from above. Accepts height edits.
    Map2d,
    /// Terrain mesh seen in perspective. Read only.
    Map3d,
}

impl ModelKind {
    pub fn supports_height_edits(&self) -> bool {
        matches!(self, ModelKind::Map2d)
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    id: ModelId,
    name: String,
    kind: ModelKind,
    grid: Arc<Grid>,
}

impl Model {
    pub fn id(&self) -> &ModelId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Shared handle on the grid, for work that outlives a scene borrow.
    pub fn shared_grid(&self) -> Arc<Grid> {
        Arc::clone(&self.grid)
    }
}

/// Owner of the models and polygons being edited.
#[derive(Debug, Default)]
pub struct Scene {
    models: BTreeMap<ModelId, Model>,
    polygons: Vec<Polygon>,
    active_polygon: Option<PolygonId>,
    next_polygon: usize,
    config: TransformConfig,
}

impl Scene {
    pub fn new(config: TransformConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Add a model, replacing any model with the same id.
    pub fn add_model(&mut self, id: ModelId, name: impl Into<String>, kind: ModelKind, grid: Grid) -> Option<Model> {
        let (rows, cols) = grid.shape();
        info!(model = %id, rows, cols, ?kind, "model added");
        let model = Model {
            id: id.clone(),
            name: name.into(),
            kind,
            grid: Arc::new(grid),
        };
        self.models.insert(id, model)
    }

    pub fn remove_model(&mut self, id: &ModelId) -> Option<Model> {
        self.models.remove(id)
    }

    pub fn model(&self, id: &ModelId) -> Option<&Model> {
        self.models.get(id)
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Create an empty polygon with a fresh id.
    pub fn create_polygon(&mut self) -> PolygonId {
        let id = self.fresh_polygon_id();
        self.polygons.push(Polygon::new(id.clone()));
        debug!(polygon = %id, "polygon created");
        id
    }

    /// Add a polygon from a vertex list. Nothing is added if the vertices
    /// repeat or the open boundary crosses itself.
    pub fn import_polygon(
        &mut self,
        vertices: Vec<Vertex>,
        parameters: BTreeMap<String, ParameterValue>,
    ) -> std::result::Result<PolygonId, PolygonError> {
        let id = self.fresh_polygon_id();
        match Polygon::from_vertices(id.clone(), vertices, parameters) {
            Ok(polygon) => {
                info!(polygon = %id, points = polygon.point_count(), planar = polygon.is_planar(), "polygon imported");
                self.polygons.push(polygon);
                Ok(id)
            }
            Err(err) => {
                warn!(%err, "polygon import rejected");
                Err(err)
            }
        }
    }

    pub fn delete_polygon(&mut self, id: &PolygonId) -> Option<Polygon> {
        let index = self.polygons.iter().position(|p| p.id() == id)?;
        if self.active_polygon.as_ref() == Some(id) {
            self.active_polygon = None;
        }
        Some(self.polygons.remove(index))
    }

    pub fn polygon(&self, id: &PolygonId) -> Option<&Polygon> {
        self.polygons.iter().find(|p| p.id() == id)
    }

    pub fn polygon_mut(&mut self, id: &PolygonId) -> Option<&mut Polygon> {
        self.polygons.iter_mut().find(|p| p.id() == id)
    }

    /// Polygons in creation order.
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn set_active_polygon(&mut self, id: &PolygonId) -> std::result::Result<(), SceneError> {
        if self.polygon(id).is_none() {
            return Err(SceneError::PolygonNotFound);
        }
        self.active_polygon = Some(id.clone());
        Ok(())
    }

    pub fn active_polygon(&self) -> Option<&PolygonId> {
        self.active_polygon.as_ref()
    }

    fn active_polygon_mut(&mut self) -> std::result::Result<&mut Polygon, SceneError> {
        let id = self.active_polygon.clone().ok_or(SceneError::PolygonNotFound)?;
        self.polygon_mut(&id).ok_or(SceneError::PolygonNotFound)
    }

    pub fn add_vertex_to_active_polygon(&mut self, x: f64, y: f64, z: f64) -> Result<()> {
        self.active_polygon_mut()?.add_vertex(x, y, z)?;
        Ok(())
    }

    pub fn remove_last_vertex_from_active_polygon(&mut self) -> std::result::Result<(), SceneError> {
        self.active_polygon_mut()?.remove_last_vertex();
        Ok(())
    }

    pub fn is_polygon_planar(&self, id: &PolygonId) -> std::result::Result<bool, SceneError> {
        self.polygon(id).map(Polygon::is_planar).ok_or(SceneError::PolygonNotFound)
    }

    pub fn polygon_points(&self, id: &PolygonId) -> std::result::Result<&[Vertex], SceneError> {
        self.polygon(id).map(Polygon::vertices).ok_or(SceneError::PolygonNotFound)
    }

    /// Highest and lowest heights inside a polygon, as `(max, min)`.
    ///
    /// Bad references, a polygon that is not usable, or a model that is not
    /// a 2D map are errors. An empty or all-missing selection is not: it
    /// gives `(NaN, NaN)`.
    pub fn min_max_height(&self, model: &ModelId, polygon: &PolygonId) -> std::result::Result<(f64, f64), SceneError> {
        let model = self.model(model).ok_or(SceneError::ModelNotFound)?;
        let polygon = self.polygon(polygon).ok_or(SceneError::PolygonNotFound)?;
        if polygon.point_count() < 3 {
            return Err(SceneError::NotEnoughVertices);
        }
        if !polygon.is_planar() {
            return Err(SceneError::PolygonNotPlanar);
        }
        if !model.kind.supports_height_edits() {
            return Err(SceneError::UnsupportedModel);
        }
        Ok(stats::min_max_inside(model.grid(), polygon.vertices(), polygon.is_planar()))
    }

    /// Validate and run a transformation, then store its result.
    ///
    /// On error the scene is left as it was.
    pub fn apply_transformation(&mut self, request: &Transformation) -> Result<()> {
        let output = TransformationDispatcher::new(self).run(request)?;
        self.commit(output)
    }

    /// Store the heights computed by a transformation in its target model.
    pub fn commit(&mut self, output: TransformationOutput) -> Result<()> {
        let TransformationOutput { model, heights } = output;
        let target = self
            .models
            .get_mut(&model)
            .ok_or(Error::Scene(SceneError::ModelNotFound))?;
        let grid = target.grid.with_heights(heights)?;
        target.grid = Arc::new(grid);
        info!(model = %model, "transformation committed");
        Ok(())
    }

    /// Heights of a model, if it exists.
    pub fn heights(&self, model: &ModelId) -> Option<&Array2<f64>> {
        self.model(model).map(|m| m.grid().heights())
    }

    fn fresh_polygon_id(&mut self) -> PolygonId {
        loop {
            let id = PolygonId(format!("Polygon {}", self.next_polygon));
            self.next_polygon += 1;
            if self.polygon(&id).is_none() {
                return id;
            }
        }
    }
}
