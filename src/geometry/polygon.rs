// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Convex planar boundary polygons and plane splitting

use super::transform::Transform;
use crate::utils::math::newell_normal;
use nalgebra::{Point3, Vector3};

/// Identifier of the logical boundary face a polygon belongs to
pub type FaceId = u32;

/// Oriented supporting plane `normal · p = w`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePlane {
    pub normal: Vector3<f64>,
    pub w: f64,
}

impl SurfacePlane {
    /// Plane through `points` using Newell's method; `None` when they enclose no area
    pub fn from_points(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let normal = newell_normal(points);
        let length = normal.norm();
        if !(length > 1e-14) {
            return None;
        }
        let normal = normal / length;
        let centroid = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / points.len() as f64;
        Some(Self {
            normal,
            w: normal.dot(&centroid),
        })
    }

    pub fn distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.w
    }

    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            w: -self.w,
        }
    }

    /// Same oriented plane within an angular and a linear tolerance
    pub fn coincides(&self, other: &SurfacePlane, tolerance: f64) -> bool {
        self.normal.dot(&other.normal) > 1.0 - 1e-9 && (self.w - other.w).abs() <= tolerance
    }
}

/// A convex planar polygon with counter-clockwise winding seen from outside
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point3<f64>>,
    pub plane: SurfacePlane,
    pub face: FaceId,
}

impl Polygon {
    /// Polygon with a plane computed from its vertices, `None` when degenerate
    pub fn new(vertices: Vec<Point3<f64>>, face: FaceId) -> Option<Self> {
        let plane = SurfacePlane::from_points(&vertices)?;
        Some(Self { vertices, plane, face })
    }

    pub fn with_plane(vertices: Vec<Point3<f64>>, plane: SurfacePlane, face: FaceId) -> Self {
        Self { vertices, plane, face }
    }

    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane = self.plane.flipped();
    }

    pub fn area(&self) -> f64 {
        newell_normal(&self.vertices).norm() * 0.5
    }

    pub fn centroid(&self) -> Point3<f64> {
        let sum = self.vertices.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.vertices.len() as f64)
    }

    /// Signed volume contribution of this polygon (divergence theorem)
    pub fn signed_volume(&self) -> f64 {
        let v0 = self.vertices[0].coords;
        self.vertices[1..]
            .windows(2)
            .map(|pair| v0.dot(&pair[0].coords.cross(&pair[1].coords)) / 6.0)
            .sum()
    }

    /// Edges as consecutive vertex pairs, closing back to the first
    pub fn edges(&self) -> impl Iterator<Item = (&Point3<f64>, &Point3<f64>)> {
        let n = self.vertices.len();
        (0..n).map(move |i| (&self.vertices[i], &self.vertices[(i + 1) % n]))
    }

    /// Fan triangles `(v0, vi, vi+1)`
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        let v0 = self.vertices[0];
        self.vertices[1..].windows(2).map(move |pair| [v0, pair[0], pair[1]])
    }

    pub fn transformed(&self, transform: &Transform) -> Self {
        let mut vertices: Vec<_> = self.vertices.iter().map(|v| transform.apply_point(v)).collect();
        if transform.is_orientation_reversing() {
            vertices.reverse();
        }
        let normal = transform.apply_vector(&self.plane.normal).normalize();
        let w = normal.dot(&vertices[0].coords);
        Self {
            vertices,
            plane: SurfacePlane { normal, w },
            face: self.face,
        }
    }
}

/// Output buckets of [`split_polygon`]
#[derive(Debug, Default)]
pub(crate) struct SplitBuckets {
    pub coplanar_front: Vec<Polygon>,
    pub coplanar_back: Vec<Polygon>,
    pub front: Vec<Polygon>,
    pub back: Vec<Polygon>,
}

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

/// Classify `polygon` against `plane` and split it when it spans the plane
///
/// Split pieces keep the plane of the polygon they came from.
pub(crate) fn split_polygon(plane: &SurfacePlane, polygon: Polygon, epsilon: f64, out: &mut SplitBuckets) {
    let mut polygon_type = COPLANAR;
    let types: Vec<u8> = polygon
        .vertices
        .iter()
        .map(|v| {
            let t = plane.distance(v);
            let kind = if t < -epsilon {
                BACK
            } else if t > epsilon {
                FRONT
            } else {
                COPLANAR
            };
            polygon_type |= kind;
            kind
        })
        .collect();

    match polygon_type {
        COPLANAR => {
            if plane.normal.dot(&polygon.plane.normal) > 0.0 {
                out.coplanar_front.push(polygon);
            } else {
                out.coplanar_back.push(polygon);
            }
        }
        FRONT => out.front.push(polygon),
        BACK => out.back.push(polygon),
        _ => {
            let n = polygon.vertices.len();
            let mut f = Vec::with_capacity(n + 1);
            let mut b = Vec::with_capacity(n + 1);
            for i in 0..n {
                let j = (i + 1) % n;
                let (ti, tj) = (types[i], types[j]);
                let (vi, vj) = (polygon.vertices[i], polygon.vertices[j]);
                if ti != BACK {
                    f.push(vi);
                }
                if ti != FRONT {
                    b.push(vi);
                }
                if (ti | tj) == SPANNING {
                    let t = (plane.w - plane.normal.dot(&vi.coords)) / plane.normal.dot(&(vj - vi));
                    let v = vi + (vj - vi) * t;
                    f.push(v);
                    b.push(v);
                }
            }
            if f.len() >= 3 {
                out.front.push(Polygon::with_plane(f, polygon.plane, polygon.face));
            }
            if b.len() >= 3 {
                out.back.push(Polygon::with_plane(b, polygon.plane, polygon.face));
            }
        }
    }
}
