// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rigid transforms and mirrors

use super::plane::Plane;
use crate::error::{ModelingError, ModelingResult};
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Unit, Vector3};

/// Affine transform restricted to rotations, translations and reflections
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn translation(offset: Vector3<f64>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&offset),
        }
    }

    /// Rotation by `angle_deg` about the axis through `pivot`
    pub fn rotation(pivot: Point3<f64>, axis: Vector3<f64>, angle_deg: f64) -> ModelingResult<Self> {
        if !angle_deg.is_finite() {
            return Err(ModelingError::invalid_parameter("rotate", "angle must be finite"));
        }
        let axis = Unit::try_new(axis, 1e-12)
            .ok_or_else(|| ModelingError::invalid_parameter("rotate", "rotation axis has zero length"))?;
        let rotation = Rotation3::from_axis_angle(&axis, angle_deg.to_radians()).to_homogeneous();
        let matrix = Matrix4::new_translation(&pivot.coords)
            * rotation
            * Matrix4::new_translation(&-pivot.coords);
        Ok(Self { matrix })
    }

    /// Reflection through a plane
    pub fn mirror(plane: &Plane) -> Self {
        let n = plane.normal();
        let linear: Matrix3<f64> = Matrix3::identity() - 2.0 * n * n.transpose();
        let shift = 2.0 * n.dot(&plane.origin().coords) * n;
        let mut matrix = linear.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&shift);
        Self { matrix }
    }

    /// `self` followed by `next`
    pub fn then(&self, next: &Transform) -> Self {
        Self {
            matrix: next.matrix * self.matrix,
        }
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    pub fn apply_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.matrix.transform_point(p)
    }

    pub fn apply_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.matrix.transform_vector(v)
    }

    /// Reflections flip the winding of every polygon they touch
    pub fn is_orientation_reversing(&self) -> bool {
        self.matrix.fixed_view::<3, 3>(0, 0).determinant() < 0.0
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Pure placement operations shared by solids, wires and planes
pub trait Transformable: Sized {
    fn transformed(&self, transform: &Transform) -> Self;

    fn translate(&self, offset: Vector3<f64>) -> Self {
        self.transformed(&Transform::translation(offset))
    }

    fn rotate(&self, pivot: Point3<f64>, axis: Vector3<f64>, angle_deg: f64) -> ModelingResult<Self> {
        Ok(self.transformed(&Transform::rotation(pivot, axis, angle_deg)?))
    }

    fn mirror(&self, plane: &Plane) -> Self {
        self.transformed(&Transform::mirror(plane))
    }
}
