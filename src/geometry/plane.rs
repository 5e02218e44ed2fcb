// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Construction planes: an origin plus an orthonormal in-plane basis

use super::transform::{Transform, Transformable};
use crate::error::{ModelingError, ModelingResult};
use nalgebra::{Point2, Point3, Vector2, Vector3};

const BASIS_TOLERANCE: f64 = 1e-9;

/// A local 2D frame embedded in 3D space
///
/// Planes are immutable; every move produces a new plane. The normal is
/// always `x_dir × y_dir`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    origin: Point3<f64>,
    x_dir: Vector3<f64>,
    y_dir: Vector3<f64>,
    normal: Vector3<f64>,
}

impl Plane {
    /// Build a plane from an origin and two orthonormal axes
    ///
    /// Zero-length, non-unit or non-orthogonal axes are rejected, never
    /// normalized.
    pub fn new(origin: Point3<f64>, x_dir: Vector3<f64>, y_dir: Vector3<f64>) -> ModelingResult<Self> {
        let reject = |reason: String| ModelingError::InvalidPlane {
            operation: "plane_at",
            reason,
        };

        if !origin.coords.iter().chain(x_dir.iter()).chain(y_dir.iter()).all(|c| c.is_finite()) {
            return Err(reject("non-finite component".into()));
        }
        for (name, axis) in [("x", &x_dir), ("y", &y_dir)] {
            let length = axis.norm();
            if length < BASIS_TOLERANCE {
                return Err(reject(format!("{name} axis has zero length")));
            }
            if (length - 1.0).abs() > BASIS_TOLERANCE {
                return Err(reject(format!("{name} axis has length {length}, expected 1")));
            }
        }
        let dot = x_dir.dot(&y_dir);
        if dot.abs() > BASIS_TOLERANCE {
            return Err(reject(format!("axes are not orthogonal (x·y = {dot})")));
        }

        Ok(Self {
            origin,
            x_dir,
            y_dir,
            normal: x_dir.cross(&y_dir),
        })
    }

    fn from_trusted(origin: Point3<f64>, x_dir: Vector3<f64>, y_dir: Vector3<f64>) -> Self {
        Self {
            origin,
            x_dir,
            y_dir,
            normal: x_dir.cross(&y_dir),
        }
    }

    /// World XY plane, normal +Z
    pub fn xy() -> Self {
        Self::from_trusted(Point3::origin(), Vector3::x(), Vector3::y())
    }

    /// World YZ plane, normal +X
    pub fn yz() -> Self {
        Self::from_trusted(Point3::origin(), Vector3::y(), Vector3::z())
    }

    /// World ZX plane, normal +Y
    pub fn zx() -> Self {
        Self::from_trusted(Point3::origin(), Vector3::z(), Vector3::x())
    }

    /// World XZ plane, normal -Y
    pub fn xz() -> Self {
        Self::from_trusted(Point3::origin(), Vector3::x(), Vector3::z())
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn x_dir(&self) -> Vector3<f64> {
        self.x_dir
    }

    pub fn y_dir(&self) -> Vector3<f64> {
        self.y_dir
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// Same basis, new origin
    pub fn with_origin(&self, origin: Point3<f64>) -> Self {
        Self { origin, ..*self }
    }

    /// Move along the normal
    pub fn offset(&self, distance: f64) -> Self {
        self.with_origin(self.origin + self.normal * distance)
    }

    /// Move the origin by local in-plane coordinates
    pub fn shifted(&self, du: f64, dv: f64) -> Self {
        self.with_origin(self.to_world(Point2::new(du, dv)))
    }

    /// Rotate the basis about a world axis through the plane origin
    pub fn rotated(&self, axis: Vector3<f64>, angle_deg: f64) -> ModelingResult<Self> {
        self.rotate(self.origin, axis, angle_deg)
    }

    /// Local coordinates to world
    pub fn to_world(&self, p: Point2<f64>) -> Point3<f64> {
        self.origin + self.x_dir * p.x + self.y_dir * p.y
    }

    /// Local direction to world
    pub fn to_world_vector(&self, v: Vector2<f64>) -> Vector3<f64> {
        self.x_dir * v.x + self.y_dir * v.y
    }

    /// Orthogonal projection of a world point into local coordinates
    pub fn to_local(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.x_dir), d.dot(&self.y_dir))
    }

    /// Signed distance of a world point along the normal
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.normal)
    }

    /// True when both planes span the same geometric plane
    pub fn is_coplanar(&self, other: &Plane, tolerance: f64) -> bool {
        self.normal.cross(&other.normal).norm() < 1e-9 && self.signed_distance(&other.origin).abs() < tolerance
    }
}

impl Transformable for Plane {
    fn transformed(&self, transform: &Transform) -> Self {
        let x_dir = transform.apply_vector(&self.x_dir);
        let y_dir = transform.apply_vector(&self.y_dir);
        Self::from_trusted(transform.apply_point(&self.origin), x_dir, y_dir)
    }
}
