// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Indexed triangle mesh, the hand-off format for viewers and analytics

use super::{BoundingBox, FaceId};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }
}

/// Three vertex indices, counter-clockwise seen from outside
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
    /// Logical boundary face the triangle was cut from
    pub face: FaceId,
}

impl Triangle {
    pub fn new(indices: [usize; 3], face: FaceId) -> Self {
        Self { indices, face }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().map(|v| &v.position))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Triangles of one logical face
    pub fn face_triangles(&self, face: FaceId) -> impl Iterator<Item = &Triangle> {
        self.triangles.iter().filter(move |t| t.face == face)
    }

    /// Append another mesh as a separate component
    ///
    /// Face ids of `other` are shifted past the largest id already present so
    /// the two boundaries stay distinguishable.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        let face_offset = self.triangles.iter().map(|t| t.face + 1).max().unwrap_or(0);
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(other.triangles.iter().map(|t| {
            Triangle::new(t.indices.map(|i| i + offset), t.face + face_offset)
        }));
    }

    /// Area-weighted vertex normals
    pub fn recompute_normals(&mut self) {
        let mut sums = vec![Vector3::zeros(); self.vertices.len()];
        for triangle in &self.triangles {
            let [a, b, c] = triangle.indices.map(|i| self.vertices[i].position);
            // |cross| is twice the area
            let weighted = (b - a).cross(&(c - a));
            for &i in &triangle.indices {
                sums[i] += weighted;
            }
        }
        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            vertex.normal = sum.try_normalize(1e-12).unwrap_or_else(Vector3::z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    fn cube_mesh(size: f64) -> Mesh {
        Primitive::cuboid(Vector3::new(size, size, size), [false; 3])
            .to_solid()
            .unwrap()
            .to_mesh()
    }

    #[test]
    fn test_recompute_normals() {
        let mesh = cube_mesh(10.0);
        assert!(mesh.vertices.iter().all(|v| (v.normal.norm() - 1.0).abs() < 1e-9));
        // Corner normals point diagonally outward
        let corner = mesh
            .vertices
            .iter()
            .find(|v| (v.position - Point3::new(10.0, 10.0, 10.0)).norm() < 1e-9)
            .unwrap();
        assert!(corner.normal.x > 0.0 && corner.normal.y > 0.0 && corner.normal.z > 0.0);
    }

    #[test]
    fn test_triangles_keep_faces() {
        let mesh = cube_mesh(1.0);
        for face in 0..6 {
            assert_eq!(mesh.face_triangles(face).count(), 2);
        }
    }

    #[test]
    fn test_merge_offsets_indices_and_faces() {
        let cube = cube_mesh(1.0);
        let mut twice = cube.clone();
        twice.merge(&cube);
        assert_eq!(twice.vertex_count(), 2 * cube.vertex_count());
        let last = twice.triangles.last().unwrap();
        assert!(last.indices.iter().all(|&i| i >= cube.vertex_count()));
        assert!(last.face >= 6);
    }
}
