//! Polygon triangulation
//!
//! The topology builder consumes triangulators through the [`Triangulator`]
//! trait, so a host can plug in its own tessellator. Two implementations are
//! provided: a fan for convex polygons and ear clipping for general simple
//! polygons.

use crate::point::*;
use tracing::debug;

/// Split a polygon into triangles.
pub trait Triangulator {
    /// Triangulate the polygon given by its ordered corner positions.
    ///
    /// Returned triangles index into `positions` and keep the polygon's
    /// winding. `None` means the polygon could not be triangulated.
    fn triangulate(&self, positions: &[Point3f]) -> Option<Vec<[usize; 3]>>;
}

/// Fan triangulation around the first corner. Correct for convex polygons.
#[derive(Debug, Clone, Copy, Default)]
pub struct FanTriangulator;

impl Triangulator for FanTriangulator {
    fn triangulate(&self, positions: &[Point3f]) -> Option<Vec<[usize; 3]>> {
        if positions.len() < 3 {
            return None;
        }
        Some(fan(&(0..positions.len()).collect::<Vec<_>>()))
    }
}

/// Ear clipping on the plane of the polygon's Newell normal.
///
/// Falls back to a fan over the remaining corners if no ear can be found,
/// which happens for self-intersecting or badly non-planar input.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarClipTriangulator;

impl Triangulator for EarClipTriangulator {
    fn triangulate(&self, positions: &[Point3f]) -> Option<Vec<[usize; 3]>> {
        let n = positions.len();
        if n < 3 {
            return None;
        }
        if n == 3 {
            return Some(vec![[0, 1, 2]]);
        }

        let points: Vec<Point3d> = positions.iter().map(|p| p.cast::<f64>()).collect();
        // Area-like quantities scale with the squared polygon size
        let tolerance = f64::EPSILON * longest_side_squared(&points);
        let normal = newell_normal(&points, tolerance)?;

        let mut remaining: Vec<usize> = (0..n).collect();
        let mut triangles = Vec::with_capacity(n - 2);

        while remaining.len() > 3 {
            let len = remaining.len();
            let ear = (0..len).find(|&i| {
                let prev = remaining[(i + len - 1) % len];
                let curr = remaining[i];
                let next = remaining[(i + 1) % len];
                is_ear(&points, &remaining, [prev, curr, next], &normal, tolerance)
            });

            match ear {
                Some(i) => {
                    let prev = remaining[(i + len - 1) % len];
                    let next = remaining[(i + 1) % len];
                    triangles.push([prev, remaining[i], next]);
                    remaining.remove(i);
                }
                None => {
                    debug!(
                        "Ear clipping stuck with {} corners remaining, using fan",
                        remaining.len()
                    );
                    break;
                }
            }
        }

        triangles.extend(fan(&remaining));
        Some(triangles)
    }
}

fn fan(corners: &[usize]) -> Vec<[usize; 3]> {
    (1..corners.len().saturating_sub(1))
        .map(|i| [corners[0], corners[i], corners[i + 1]])
        .collect()
}

fn longest_side_squared(points: &[Point3d]) -> f64 {
    (0..points.len())
        .map(|i| (points[(i + 1) % points.len()] - points[i]).norm_squared())
        .fold(0.0, f64::max)
}

/// Newell's method; `None` for polygons with no area relative to their size.
fn newell_normal(points: &[Point3d], tolerance: f64) -> Option<Vector3d> {
    let mut normal = Vector3d::zeros();
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    let len = normal.norm();
    if len > tolerance {
        Some(normal / len)
    } else {
        None
    }
}

fn is_ear(
    points: &[Point3d],
    remaining: &[usize],
    [prev, curr, next]: [usize; 3],
    normal: &Vector3d,
    tolerance: f64,
) -> bool {
    let a = points[prev];
    let b = points[curr];
    let c = points[next];

    // Reflex or degenerate corner
    if (b - a).cross(&(c - b)).dot(normal) <= tolerance {
        return false;
    }

    remaining
        .iter()
        .filter(|&&idx| idx != prev && idx != curr && idx != next)
        .all(|&idx| !point_in_triangle(&points[idx], &a, &b, &c, normal))
}

/// Containment test projected onto the plane of `normal` by dropping its dominant axis.
fn point_in_triangle(
    p: &Point3d,
    a: &Point3d,
    b: &Point3d,
    c: &Point3d,
    normal: &Vector3d,
) -> bool {
    let abs = normal.abs();
    let project = |q: &Point3d| -> (f64, f64) {
        if abs.z >= abs.x && abs.z >= abs.y {
            (q.x, q.y)
        } else if abs.y >= abs.x {
            (q.x, q.z)
        } else {
            (q.y, q.z)
        }
    };

    let (p, a, b, c) = (project(p), project(a), project(b), project(c));
    let sign = |p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)| -> f64 {
        (p1.0 - p3.0) * (p2.1 - p3.1) - (p2.0 - p3.0) * (p1.1 - p3.1)
    };

    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_neg && has_pos)
}
