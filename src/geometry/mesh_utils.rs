// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh validation utilities

use super::Mesh;
use ahash::AHashMap;
use serde::Serialize;

/// How often every edge of a mesh is used, in each direction
struct EdgeCensus {
    /// Keyed by `(low, high)` vertex index; value is (low→high, high→low) uses
    uses: AHashMap<(usize, usize), (u32, u32)>,
}

impl EdgeCensus {
    fn of(mesh: &Mesh) -> Self {
        let mut uses: AHashMap<(usize, usize), (u32, u32)> = AHashMap::new();
        for triangle in &mesh.triangles {
            let [a, b, c] = triangle.indices;
            for (from, to) in [(a, b), (b, c), (c, a)] {
                let entry = uses.entry((from.min(to), from.max(to))).or_insert((0, 0));
                if from < to {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
        }
        Self { uses }
    }

    fn totals(&self) -> impl Iterator<Item = u32> + '_ {
        self.uses.values().map(|(forward, backward)| forward + backward)
    }

    fn manifold(&self) -> bool {
        self.totals().all(|count| count <= 2)
    }

    fn closed(&self) -> bool {
        self.totals().all(|count| count == 2)
    }

    /// Each edge is walked once in each direction
    fn consistent(&self) -> bool {
        self.uses.values().all(|&uses| uses == (1, 1))
    }
}

/// Each edge shared by at most 2 triangles
pub fn is_manifold(mesh: &Mesh) -> bool {
    EdgeCensus::of(mesh).manifold()
}

/// Each edge shared by exactly 2 triangles
pub fn is_closed(mesh: &Mesh) -> bool {
    EdgeCensus::of(mesh).closed()
}

pub fn has_consistent_winding(mesh: &Mesh) -> bool {
    EdgeCensus::of(mesh).consistent()
}

#[derive(Debug, Clone, Serialize)]
pub struct MeshValidation {
    pub is_manifold: bool,
    pub is_closed: bool,
    pub has_valid_winding: bool,
    pub edge_count: usize,
    pub boundary_edge_count: usize,
}

impl MeshValidation {
    pub fn is_valid(&self) -> bool {
        self.is_manifold && self.is_closed && self.has_valid_winding
    }
}

/// Validate mesh and return a detailed report
pub fn validate_mesh(mesh: &Mesh) -> MeshValidation {
    let census = EdgeCensus::of(mesh);
    MeshValidation {
        is_manifold: census.manifold(),
        is_closed: census.closed(),
        has_valid_winding: census.consistent(),
        edge_count: census.uses.len(),
        boundary_edge_count: census.totals().filter(|&count| count == 1).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Mesh, Primitive, Triangle, Vertex};
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_closed_box_is_valid() {
        let mesh = Primitive::cuboid(Vector3::new(1.0, 2.0, 3.0), [false; 3])
            .to_solid()
            .unwrap()
            .to_mesh();
        let report = validate_mesh(&mesh);
        assert!(report.is_valid());
        assert_eq!(report.edge_count, 18);
        assert_eq!(report.boundary_edge_count, 0);
    }

    #[test]
    fn test_single_triangle_is_open() {
        let mut mesh = Mesh::new();
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            mesh.add_vertex(Vertex::new(Point3::new(p[0], p[1], p[2]), Vector3::z()));
        }
        mesh.add_triangle(Triangle::new([0, 1, 2], 0));
        assert!(is_manifold(&mesh));
        assert!(!is_closed(&mesh));
        assert_eq!(validate_mesh(&mesh).boundary_edge_count, 3);
    }
}
