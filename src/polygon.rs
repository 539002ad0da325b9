//! Polygons drawn over the terrain.
//!
//! A polygon keeps its boundary simple while it is being drawn: a vertex that
//! would repeat an existing one or make the open chain cross itself is
//! rejected. Only the closing edge (last vertex back to the first) may cross
//! the rest of the chain, in which case the polygon is flagged as not planar.

use std::collections::BTreeMap;
use std::fmt;

use geo::{Area, Buffer, Coord, LineString, Polygon as GeoPolygon};
use ndarray::Array2;
use tracing::debug;

use crate::error::PolygonError;
use crate::geometry::{self, edge_is_clear, project, Vertex, PLANE_HEIGHT};
use crate::grid::Grid;
use crate::mask;

/// Identifier of a polygon inside a scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolygonId(pub String);

impl fmt::Display for PolygonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PolygonId {
    fn from(value: &str) -> Self {
        PolygonId(value.to_string())
    }
}

/// Value stored in the parameter table of a polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

#[derive(Debug, Clone)]
pub struct Polygon {
    id: PolygonId,
    name: String,
    vertices: Vec<Vertex>,
    is_planar: bool,
    parameters: BTreeMap<String, ParameterValue>,
}

impl Polygon {
    /// Empty polygon named after its id.
    pub fn new(id: PolygonId) -> Self {
        let name = id.0.clone();
        Self {
            id,
            name,
            vertices: Vec::new(),
            is_planar: true,
            parameters: BTreeMap::new(),
        }
    }

    /// Build a polygon from an imported vertex list.
    ///
    /// The whole import fails if two vertices repeat or the open chain
    /// crosses itself. A crossing closing edge is accepted and only clears
    /// the planar flag.
    pub fn from_vertices(
        id: PolygonId,
        vertices: Vec<Vertex>,
        parameters: BTreeMap<String, ParameterValue>,
    ) -> Result<Self, PolygonError> {
        for (i, v) in vertices.iter().enumerate() {
            if vertices[..i].contains(v) {
                return Err(PolygonError::RepeatedPoint);
            }
        }

        let projected: Vec<[f64; 2]> = vertices.iter().map(project).collect();
        if !geometry::is_simple(&projected, false) {
            return Err(PolygonError::LineIntersection);
        }

        let mut polygon = Polygon::new(id);
        polygon.vertices = vertices;
        polygon.parameters = parameters;
        polygon.recompute_planarity();
        Ok(polygon)
    }

    pub fn id(&self) -> &PolygonId {
        &self.id
    }

    pub fn set_id(&mut self, id: PolygonId) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn point_count(&self) -> usize {
        self.vertices.len()
    }

    /// The closed boundary is simple.
    pub fn is_planar(&self) -> bool {
        self.is_planar
    }

    /// Append a vertex at the end of the boundary.
    pub fn add_vertex(&mut self, x: f64, y: f64, z: f64) -> Result<(), PolygonError> {
        let vertex = [x, y, z];
        if self.vertices.contains(&vertex) {
            return Err(PolygonError::RepeatedPoint);
        }

        let new = [x, y];
        let count = self.vertices.len();

        if count >= 2 {
            let last = project(&self.vertices[count - 1]);
            let before_last = project(&self.vertices[count - 2]);
            if !edge_is_clear(last, new, Some(before_last), None, self.open_edges()) {
                return Err(PolygonError::LineIntersection);
            }

            let first = project(&self.vertices[0]);
            let second = project(&self.vertices[1]);
            let closing_is_clear = edge_is_clear(
                new,
                first,
                Some(last),
                Some(second),
                self.open_edges().chain(std::iter::once((last, new))),
            );
            self.is_planar = closing_is_clear;
        }

        self.vertices.push(vertex);
        debug!(polygon = %self.id, points = self.vertices.len(), planar = self.is_planar, "vertex added");
        Ok(())
    }

    /// Append a vertex at the 2D drawing height.
    pub fn add_point(&mut self, x: f64, y: f64) -> Result<(), PolygonError> {
        self.add_vertex(x, y, PLANE_HEIGHT)
    }

    /// Drop the last vertex. Does nothing on an empty polygon.
    ///
    /// Planarity is recomputed over the whole closed boundary, since removing
    /// a vertex can cure a crossing closing edge.
    pub fn remove_last_vertex(&mut self) {
        if self.vertices.pop().is_some() {
            self.recompute_planarity();
            debug!(polygon = %self.id, points = self.vertices.len(), planar = self.is_planar, "vertex removed");
        }
    }

    /// Exterior ring of the round buffer of this polygon at `distance`.
    ///
    /// The returned ring is open (its first vertex is not repeated at the end)
    /// and every vertex sits at the 2D drawing height.
    pub fn exterior_buffer(&self, distance: f64) -> Result<Vec<Vertex>, PolygonError> {
        if self.vertices.len() < 3 {
            return Err(PolygonError::NotEnoughPoints(self.vertices.len()));
        }
        if !(distance > 0.0) {
            return Err(PolygonError::InvalidBufferDistance(distance));
        }

        let buffered = self.to_geo().buffer(distance);
        let outer = buffered
            .0
            .iter()
            .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
            .ok_or(PolygonError::NotEnoughPoints(self.vertices.len()))?;

        let mut ring: Vec<Vertex> = outer
            .exterior()
            .coords()
            .map(|c| [c.x, c.y, PLANE_HEIGHT])
            .collect();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        Ok(ring)
    }

    /// Cells of `grid` strictly inside this polygon.
    pub fn contains_mask(&self, grid: &Grid) -> Array2<bool> {
        mask::mask(grid.x(), grid.y(), &self.vertices)
    }

    pub fn parameter(&self, key: &str) -> Option<&ParameterValue> {
        self.parameters.get(key)
    }

    pub fn set_parameter(&mut self, key: impl Into<String>, value: ParameterValue) {
        self.parameters.insert(key.into(), value);
    }

    pub fn remove_parameter(&mut self, key: &str) -> Option<ParameterValue> {
        self.parameters.remove(key)
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&String, &ParameterValue)> {
        self.parameters.iter()
    }

    fn open_edges(&self) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
        self.vertices
            .windows(2)
            .map(|pair| (project(&pair[0]), project(&pair[1])))
    }

    fn recompute_planarity(&mut self) {
        let projected: Vec<[f64; 2]> = self.vertices.iter().map(project).collect();
        self.is_planar = projected.len() < 3 || geometry::is_simple(&projected, true);
    }

    fn to_geo(&self) -> GeoPolygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .vertices
            .iter()
            .map(|v| Coord { x: v[0], y: v[1] })
            .collect();
        GeoPolygon::new(LineString::from(coords), vec![])
    }
}
