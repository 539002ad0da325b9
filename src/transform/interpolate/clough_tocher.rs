//! Piecewise cubic, C1 continuous surface over a triangulation.
//!
//! Each triangle is split at its centroid into three cubic Bézier patches.
//! Vertex gradients come from a least-squares plane through the neighbouring
//! samples. The cross-boundary derivative along every edge varies linearly,
//! which keeps adjacent triangles C1 continuous.

use super::triangulation::{Surface, Triangulation};

pub(crate) struct CloughTocher {
    triangulation: Triangulation,
    gradients: Vec<[f64; 2]>,
}

fn dot(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

fn sub(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

/// Gradient of the least-squares plane through `origin` fitted to its
/// neighbours. Zero when the neighbours do not span the plane.
fn estimate_gradient(triangulation: &Triangulation, origin: usize, neighbours: &[usize]) -> [f64; 2] {
    let points = triangulation.points();
    let values = triangulation.values();
    let (mut sxx, mut sxy, mut syy, mut sxf, mut syf) = (0.0, 0.0, 0.0, 0.0, 0.0);

    for &n in neighbours {
        let [dx, dy] = sub(points[n], points[origin]);
        let df = values[n] - values[origin];
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
        sxf += dx * df;
        syf += dy * df;
    }

    let det = sxx * syy - sxy * sxy;
    if det.abs() <= 1e-12 * sxx * syy {
        return [0.0, 0.0];
    }
    [(sxf * syy - syf * sxy) / det, (syf * sxx - sxf * sxy) / det]
}

impl CloughTocher {
    pub fn new(triangulation: Triangulation) -> Self {
        let neighbours = triangulation.neighbours();
        let gradients = neighbours
            .iter()
            .enumerate()
            .map(|(i, n)| estimate_gradient(&triangulation, i, n))
            .collect();
        Self {
            triangulation,
            gradients,
        }
    }

    /// Patch of the sub-triangle `(P_i, P_j, C)` evaluated at local
    /// barycentric coordinates `(u, v, w)`.
    fn patch(&self, triangle: usize, i: usize, j: usize, k: usize, (u, v, w): (f64, f64, f64)) -> f64 {
        let corners = self.triangulation.corners(triangle);
        let ids = self.triangulation.triangles()[triangle];
        let values = self.triangulation.values();
        let f = |m: usize| values[ids[m]];
        let g = |m: usize| self.gradients[ids[m]];
        let p = |m: usize| corners[m];

        let centroid = [
            (corners[0][0] + corners[1][0] + corners[2][0]) / 3.0,
            (corners[0][1] + corners[1][1] + corners[2][1]) / 3.0,
        ];

        // Control points next to each vertex.
        let edge_point = |a: usize, b: usize| f(a) + dot(g(a), sub(p(b), p(a))) / 3.0;
        let centre_point = |a: usize| f(a) + dot(g(a), sub(centroid, p(a))) / 3.0;

        // Inner control point of the edge a-b, from a linear cross-boundary derivative.
        let inner_point = |a: usize, b: usize| {
            let e = sub(p(b), p(a));
            let h = sub(centroid, p(a));
            let mut n = [-e[1], e[0]];
            if dot(n, h) < 0.0 {
                n = [e[1], -e[0]];
            }
            let det = e[0] * h[1] - e[1] * h[0];
            let alpha = (n[0] * h[1] - n[1] * h[0]) / det;
            let beta = (e[0] * n[1] - e[1] * n[0]) / det;
            let (au, av, aw) = (-(alpha + beta), alpha, beta);

            let eab = edge_point(a, b);
            let eba = edge_point(b, a);
            let c0 = au * f(a) + av * eab + aw * centre_point(a);
            let c2 = au * eba + av * f(b) + aw * centre_point(b);
            ((c0 + c2) / 2.0 - au * eab - av * eba) / aw
        };

        let near_centre = |a: usize| {
            let before = (a + 2) % 3;
            let after = (a + 1) % 3;
            (inner_point(before, a) + centre_point(a) + inner_point(a, after)) / 3.0
        };

        let qi = near_centre(i);
        let qj = near_centre(j);
        let qk = near_centre(k);
        let centre = (qi + qj + qk) / 3.0;

        f(i) * u * u * u
            + f(j) * v * v * v
            + centre * w * w * w
            + 3.0 * edge_point(i, j) * u * u * v
            + 3.0 * edge_point(j, i) * u * v * v
            + 3.0 * centre_point(i) * u * u * w
            + 3.0 * centre_point(j) * v * v * w
            + 3.0 * qi * u * w * w
            + 3.0 * qj * v * w * w
            + 6.0 * inner_point(i, j) * u * v * w
    }
}

impl Surface for CloughTocher {
    fn triangulation(&self) -> &Triangulation {
        &self.triangulation
    }

    fn value(&self, triangle: usize, bary: [f64; 3], _p: [f64; 2]) -> f64 {
        let k = (0..3)
            .min_by(|&a, &b| bary[a].total_cmp(&bary[b]))
            .unwrap_or(0);
        let i = (k + 1) % 3;
        let j = (k + 2) % 3;
        let local = (bary[i] - bary[k], bary[j] - bary[k], 3.0 * bary[k]);
        self.patch(triangle, i, j, k, local)
    }
}
