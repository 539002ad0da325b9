//! Planar predicates on polygon vertices.
//!
//! Vertices are stored as `[x, y, z]`; every predicate here works on the
//! projection to the xy plane and ignores z.

/// Polygon vertex, `[x, y, z]`.
pub type Vertex = [f64; 3];

/// Height used for vertices drawn in 2D mode.
pub const PLANE_HEIGHT: f64 = 0.5;

/// Drop the z component of a vertex.
#[inline]
pub fn project(vertex: &Vertex) -> [f64; 2] {
    [vertex[0], vertex[1]]
}

/// Axis aligned bounds of the projected vertices as `(min_x, min_y, max_x, max_y)`.
pub fn bounds(vertices: &[Vertex]) -> Option<(f64, f64, f64, f64)> {
    let first = vertices.first()?;
    let mut min_x = first[0];
    let mut max_x = first[0];
    let mut min_y = first[1];
    let mut max_y = first[1];

    for v in &vertices[1..] {
        min_x = min_x.min(v[0]);
        max_x = max_x.max(v[0]);
        min_y = min_y.min(v[1]);
        max_y = max_y.max(v[1]);
    }

    Some((min_x, min_y, max_x, max_y))
}

/// Twice the signed area of the triangle `(a, b, c)`; positive when counter-clockwise.
#[inline]
fn orientation(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// `p` is collinear with `a`-`b` and lies inside their bounding box.
#[inline]
fn within_segment(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> bool {
    p[0] >= a[0].min(b[0])
        && p[0] <= a[0].max(b[0])
        && p[1] >= a[1].min(b[1])
        && p[1] <= a[1].max(b[1])
}

/// Closed segments `a`-`b` and `c`-`d` share at least one point.
pub fn segments_touch(a: [f64; 2], b: [f64; 2], c: [f64; 2], d: [f64; 2]) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    if ((o1 > 0.0 && o2 < 0.0) || (o1 < 0.0 && o2 > 0.0))
        && ((o3 > 0.0 && o4 < 0.0) || (o3 < 0.0 && o4 > 0.0))
    {
        return true;
    }

    (o1 == 0.0 && within_segment(a, b, c))
        || (o2 == 0.0 && within_segment(a, b, d))
        || (o3 == 0.0 && within_segment(c, d, a))
        || (o4 == 0.0 && within_segment(c, d, b))
}

/// Two edges `prev`-`shared` and `shared`-`next` fold back over each other.
#[inline]
fn folds_back(prev: [f64; 2], shared: [f64; 2], next: [f64; 2]) -> bool {
    if orientation(prev, shared, next) != 0.0 {
        return false;
    }
    let dot = (prev[0] - shared[0]) * (next[0] - shared[0])
        + (prev[1] - shared[1]) * (next[1] - shared[1]);
    dot > 0.0
}

/// Edge `a`-`b` is compatible with a simple chain whose edges are `edges`.
///
/// `before` is the vertex preceding `a` along the chain and `after` the vertex
/// following `b`, if those neighbours exist. Edges sharing `a` or `b` are only
/// rejected when they fold back over the new edge.
pub(crate) fn edge_is_clear(
    a: [f64; 2],
    b: [f64; 2],
    before: Option<[f64; 2]>,
    after: Option<[f64; 2]>,
    edges: impl Iterator<Item = ([f64; 2], [f64; 2])>,
) -> bool {
    if before.is_some_and(|p| folds_back(p, a, b)) || after.is_some_and(|n| folds_back(a, b, n)) {
        return false;
    }

    for (c, d) in edges {
        let adjacent_at_a = before.is_some() && (c == a || d == a);
        let adjacent_at_b = after.is_some() && (c == b || d == b);
        if adjacent_at_a || adjacent_at_b {
            continue;
        }
        if segments_touch(a, b, c, d) {
            return false;
        }
    }
    true
}

/// The chain through `points` has no two edges meeting outside their shared
/// endpoints. With `closed` the edge from the last point back to the first is
/// part of the chain.
pub fn is_simple(points: &[[f64; 2]], closed: bool) -> bool {
    let n = points.len();
    if n < 3 {
        return true;
    }
    let edge_count = if closed { n } else { n - 1 };
    let edge = |i: usize| (points[i], points[(i + 1) % n]);

    for i in 0..edge_count {
        let (a, b) = edge(i);
        for j in (i + 1)..edge_count {
            let (c, d) = edge(j);
            let consecutive = j == i + 1;
            let wraps = closed && i == 0 && j == edge_count - 1;

            if consecutive {
                if folds_back(a, b, d) {
                    return false;
                }
            } else if wraps {
                if folds_back(c, a, b) {
                    return false;
                }
            } else if segments_touch(a, b, c, d) {
                return false;
            }
        }
    }
    true
}
