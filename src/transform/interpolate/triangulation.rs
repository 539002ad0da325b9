use delaunator::{next_halfedge, Point, EMPTY};

/// Delaunay triangulation of scattered height samples.
pub(crate) struct Triangulation {
    points: Vec<[f64; 2]>,
    values: Vec<f64>,
    triangles: Vec<[usize; 3]>,
    halfedges: Vec<usize>,
    flat: Vec<usize>,
}

impl Triangulation {
    /// `None` when the samples span no triangle, e.g. fewer than 3 of them
    /// or all collinear.
    pub fn new(points: Vec<[f64; 2]>, values: Vec<f64>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let delaunator_points: Vec<Point> = points.iter().map(|p| Point { x: p[0], y: p[1] }).collect();
        let triangulation = delaunator::triangulate(&delaunator_points);
        if triangulation.triangles.is_empty() {
            return None;
        }

        let triangles = triangulation
            .triangles
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        Some(Self {
            points,
            values,
            triangles,
            halfedges: triangulation.halfedges,
            flat: triangulation.triangles,
        })
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn corners(&self, triangle: usize) -> [[f64; 2]; 3] {
        let [a, b, c] = self.triangles[triangle];
        [self.points[a], self.points[b], self.points[c]]
    }

    /// Barycentric coordinates of `p` in a triangle; `None` for a
    /// degenerate triangle.
    pub fn barycentric(&self, triangle: usize, p: [f64; 2]) -> Option<[f64; 3]> {
        let [a, b, c] = self.corners(triangle);
        let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
        if det == 0.0 {
            return None;
        }
        let l0 = ((b[1] - c[1]) * (p[0] - c[0]) + (c[0] - b[0]) * (p[1] - c[1])) / det;
        let l1 = ((c[1] - a[1]) * (p[0] - c[0]) + (a[0] - c[0]) * (p[1] - c[1])) / det;
        Some([l0, l1, 1.0 - l0 - l1])
    }

    /// Samples sharing an edge with each sample.
    pub fn neighbours(&self) -> Vec<Vec<usize>> {
        let mut neighbours = vec![Vec::new(); self.points.len()];
        for edge in 0..self.flat.len() {
            let opposite = self.halfedges[edge];
            if opposite != EMPTY && opposite < edge {
                continue;
            }
            let from = self.flat[edge];
            let to = self.flat[next_halfedge(edge)];
            neighbours[from].push(to);
            neighbours[to].push(from);
        }
        neighbours
    }
}

/// Height surface defined piecewise over the triangles of a triangulation.
pub(crate) trait Surface: Sync {
    fn triangulation(&self) -> &Triangulation;

    /// Height at `p`, lying in `triangle` with barycentric coordinates `bary`.
    fn value(&self, triangle: usize, bary: [f64; 3], p: [f64; 2]) -> f64;
}

/// Barycentric blend of the corner samples.
pub(crate) struct LinearSurface {
    triangulation: Triangulation,
}

impl LinearSurface {
    pub fn new(triangulation: Triangulation) -> Self {
        Self { triangulation }
    }
}

impl Surface for LinearSurface {
    fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    fn value(&self, triangle: usize, bary: [f64; 3], _p: [f64; 2]) -> f64 {
        let [a, b, c] = self.triangulation.triangles()[triangle];
        let values = self.triangulation.values();
        bary[0] * values[a] + bary[1] * values[b] + bary[2] * values[c]
    }
}
