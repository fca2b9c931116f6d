//! Closed 2-D polygons and the tolerance-aware predicates the layout and
//! collision layers are built on.
//!
//! Every predicate takes an explicit tolerance `eps`:
//! - points within `eps` of a boundary count as on it (and therefore inside),
//! - two polygons must interpenetrate by more than `eps` to overlap, so
//!   polygons that merely share an edge or a corner never do.

use crate::error::{Error, Result};
use glam::{Affine2, Vec2};

/// A closed chain of points. The last point connects back to the first.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    points: Vec<Vec2>,
}

impl Polygon {
    /// Creates a polygon from at least three points.
    ///
    /// ### Errors
    /// [`Error::DegeneratePolygon`] if fewer than three points are given.
    pub fn new(points: Vec<Vec2>) -> Result<Self> {
        if points.len() < 3 {
            return Err(Error::DegeneratePolygon(points.len()));
        }
        Ok(Self { points })
    }

    /// Axis-aligned rectangle, counter-clockwise from `min`.
    pub fn rect(min: Vec2, max: Vec2) -> Self {
        Self {
            points: vec![min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
        }
    }

    pub fn square(center: Vec2, half_size: f32) -> Self {
        Self::rect(center - Vec2::splat(half_size), center + Vec2::splat(half_size))
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn transformed(&self, transform: &Affine2) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| transform.transform_point2(*p))
                .collect(),
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f32 {
        0.5 * self.edges().map(|(a, b)| a.perp_dot(b)).sum::<f32>()
    }

    /// Vertex average. Inside the polygon whenever it is convex.
    pub fn centroid(&self) -> Vec2 {
        self.points.iter().copied().sum::<Vec2>() / self.points.len() as f32
    }

    /// A point strictly inside the polygon, convex or not.
    ///
    /// Casts a ray inward from every edge midpoint, halves each free
    /// stretch and keeps the candidate deepest inside. Falls back to
    /// [`Polygon::centroid`] for a polygon without area.
    pub fn interior_point(&self) -> Vec2 {
        let area = self.signed_area();
        let mut best = (self.centroid(), 0.0);
        if area.abs() <= f32::EPSILON {
            return best.0;
        }
        let winding = area.signum();
        for (a, b) in self.edges() {
            let len = a.distance(b);
            if len <= f32::EPSILON {
                continue;
            }
            let inward = (b - a).perp() / len * winding;
            let mid = (a + b) * 0.5;
            let Some(reach) = self.ray_reach(mid, inward) else {
                continue;
            };
            let candidate = mid + inward * (reach / 2.0);
            let depth = self.boundary_distance(candidate);
            if depth > best.1 && self.winds_around(candidate) {
                best = (candidate, depth);
            }
        }
        best.0
    }

    /// Distance along unit `dir` from `origin` to the nearest edge ahead.
    fn ray_reach(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        self.edges()
            .filter_map(|(q1, q2)| {
                let s = q2 - q1;
                let denom = dir.perp_dot(s);
                if denom.abs() <= f32::EPSILON * s.length() {
                    return None;
                }
                let qp = q1 - origin;
                let t = qp.perp_dot(s) / denom;
                let u = qp.perp_dot(dir) / denom;
                (t > 1e-6 && (0.0..=1.0).contains(&u)).then_some(t)
            })
            .min_by(f32::total_cmp)
    }

    /// Returns `(min, max)` of the axis-aligned bounding box.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        self.points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        )
    }

    pub fn is_convex(&self) -> bool {
        let n = self.points.len();
        let mut sign = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let c = self.points[(i + 2) % n];
            let turn = (b - a).perp_dot(c - b);
            if turn.abs() <= f32::EPSILON {
                continue;
            }
            if sign == 0.0 {
                sign = turn.signum();
            } else if turn.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Even-odd test without tolerance.
    pub fn winds_around(&self, p: Vec2) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Closest point to `p` on the polygon's boundary.
    pub fn closest_boundary_point(&self, p: Vec2) -> Vec2 {
        let mut best = self.points[0];
        let mut best_d2 = f32::INFINITY;
        for (a, b) in self.edges() {
            let q = closest_on_segment(a, b, p);
            let d2 = q.distance_squared(p);
            if d2 < best_d2 {
                best_d2 = d2;
                best = q;
            }
        }
        best
    }

    pub fn boundary_distance(&self, p: Vec2) -> f32 {
        self.closest_boundary_point(p).distance(p)
    }

    /// `true` if `p` is inside or within `eps` of the boundary.
    pub fn contains_point(&self, p: Vec2, eps: f32) -> bool {
        self.winds_around(p) || self.boundary_distance(p) <= eps
    }

    /// `true` if `p` is inside and farther than `eps` from the boundary.
    pub fn strictly_contains_point(&self, p: Vec2, eps: f32) -> bool {
        self.winds_around(p) && self.boundary_distance(p) > eps
    }

    /// `true` if every point of `other` is contained within `eps` and no
    /// edge of `other` properly crosses an edge of `self`.
    pub fn contains(&self, other: &Polygon, eps: f32) -> bool {
        other.points.iter().all(|p| self.contains_point(*p, eps)) && !edges_cross(self, other, eps)
    }

    /// `true` if the interiors of both polygons intersect by more than
    /// `eps`. Symmetric in its two arguments.
    ///
    /// Convex pairs use the separating axis test. Any other pair falls back
    /// to proper edge crossings plus deep containment of a vertex or of an
    /// interior point, evaluated in both directions.
    pub fn overlaps(&self, other: &Polygon, eps: f32) -> bool {
        if self.is_convex() && other.is_convex() {
            return !has_separating_axis(self, other, eps) && !has_separating_axis(other, self, eps);
        }
        loose_overlap(self, other, eps) || loose_overlap(other, self, eps)
    }
}

pub fn closest_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Proper crossing of two segments: the intersection lies farther than
/// `eps` from every endpoint. Parallel segments never cross.
pub fn segments_cross(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2, eps: f32) -> bool {
    let r = p2 - p1;
    let s = q2 - q1;
    let (r_len, s_len) = (r.length(), s.length());
    if r_len <= f32::EPSILON || s_len <= f32::EPSILON {
        return false;
    }
    let denom = r.perp_dot(s);
    if denom.abs() <= f32::EPSILON * r_len * s_len {
        return false;
    }
    let qp = q1 - p1;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    let dt = eps / r_len;
    let du = eps / s_len;
    t > dt && t < 1.0 - dt && u > du && u < 1.0 - du
}

fn edges_cross(a: &Polygon, b: &Polygon, eps: f32) -> bool {
    a.edges()
        .any(|(p1, p2)| b.edges().any(|(q1, q2)| segments_cross(p1, p2, q1, q2, eps)))
}

fn project(poly: &Polygon, axis: Vec2) -> (f32, f32) {
    poly.points
        .iter()
        .map(|p| p.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}

fn has_separating_axis(edges_of: &Polygon, other: &Polygon, eps: f32) -> bool {
    for (p, q) in edges_of.edges() {
        let axis = (q - p).perp();
        let len = axis.length();
        if len <= f32::EPSILON {
            continue;
        }
        let axis = axis / len;
        let (a_min, a_max) = project(edges_of, axis);
        let (b_min, b_max) = project(other, axis);
        if a_max - b_min <= eps || b_max - a_min <= eps {
            return true;
        }
    }
    false
}

fn loose_overlap(a: &Polygon, b: &Polygon, eps: f32) -> bool {
    edges_cross(a, b, eps)
        || a.points.iter().any(|p| b.strictly_contains_point(*p, eps))
        || b.strictly_contains_point(a.interior_point(), eps)
}
