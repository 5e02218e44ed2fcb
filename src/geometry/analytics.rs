// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use super::mesh_utils::is_closed;
use super::Mesh;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurements of one solid, in model units
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryStats {
    pub volume: f64,
    pub surface_area: f64,
    /// `[min_x, min_y, min_z, max_x, max_y, max_z]`
    pub bbox: [f64; 6],
    /// Center of mass of the enclosed volume
    pub centroid: [f64; 3],
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Logical boundary faces
    pub face_count: usize,
    /// Disconnected shells
    pub shell_count: usize,
    /// Every edge shared by exactly 2 triangles
    pub is_watertight: bool,
}

impl GeometryStats {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.bbox[3] - self.bbox[0],
            self.bbox[4] - self.bbox[1],
            self.bbox[5] - self.bbox[2],
        ]
    }

    pub fn print(&self) {
        println!("{self}");
    }
}

impl fmt::Display for GeometryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [sx, sy, sz] = self.size();
        let [cx, cy, cz] = self.centroid;
        writeln!(f, "volume        {:>14.4} mm³", self.volume)?;
        writeln!(f, "surface area  {:>14.4} mm²", self.surface_area)?;
        writeln!(f, "size          {sx:.3} × {sy:.3} × {sz:.3} mm")?;
        writeln!(f, "centroid      ({cx:.3}, {cy:.3}, {cz:.3})")?;
        writeln!(
            f,
            "topology      {} faces, {} shells, {}",
            self.face_count,
            self.shell_count,
            if self.is_watertight { "watertight" } else { "open" }
        )?;
        write!(f, "mesh          {} vertices, {} triangles", self.vertex_count, self.triangle_count)
    }
}

/// Volume, area and centroid of a triangle mesh
///
/// Face and shell counts are left at zero; [`crate::Solid::stats`] fills them in.
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    if mesh.vertices.is_empty() || mesh.triangles.is_empty() {
        return GeometryStats::empty();
    }

    let (mut volume, mut surface_area, mut moment) = (0.0, 0.0, Vector3::zeros());
    for triangle in &mesh.triangles {
        let [a, b, c] = triangle.indices.map(|i| mesh.vertices[i].position.coords);
        // Signed volume of the tetrahedron spanned with the origin
        let tetra = a.dot(&b.cross(&c)) / 6.0;
        volume += tetra;
        moment += (a + b + c) * (tetra / 4.0);
        surface_area += (b - a).cross(&(c - a)).norm() / 2.0;
    }

    let bbox = mesh.bounding_box();
    let centroid = if volume.abs() > f64::EPSILON {
        moment / volume
    } else {
        bbox.center().coords
    };

    GeometryStats {
        volume,
        surface_area,
        bbox: [bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z],
        centroid: [centroid.x, centroid.y, centroid.z],
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
        face_count: 0,
        shell_count: 0,
        is_watertight: is_closed(mesh),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    #[test]
    fn test_analyze_cube() {
        let solid = Primitive::cuboid(Vector3::new(10.0, 10.0, 10.0), [true; 3])
            .to_solid()
            .unwrap();
        let stats = solid.stats();

        assert!((stats.volume - 1000.0).abs() < 1e-9);
        assert!((stats.surface_area - 600.0).abs() < 1e-9);
        assert_eq!(stats.vertex_count, 8);
        assert_eq!(stats.triangle_count, 12);
        assert_eq!(stats.face_count, 6);
        assert_eq!(stats.shell_count, 1);
        assert!(stats.is_watertight);

        // Centroid should be at the origin for a centered cube
        assert!(stats.centroid.iter().all(|c| c.abs() < 1e-9));
    }

    #[test]
    fn test_analyze_sphere() {
        let stats = Primitive::sphere(5.0, 48).to_solid().unwrap().stats();

        let expected_volume = 4.0 / 3.0 * std::f64::consts::PI * 5.0_f64.powi(3);
        let expected_area = 4.0 * std::f64::consts::PI * 5.0_f64.powi(2);

        assert!(
            (stats.volume - expected_volume).abs() < expected_volume * 0.02,
            "Volume {} not close to expected {}",
            stats.volume,
            expected_volume
        );
        assert!(
            (stats.surface_area - expected_area).abs() < expected_area * 0.02,
            "Surface area {} not close to expected {}",
            stats.surface_area,
            expected_area
        );
        assert!(stats.is_watertight);
    }

    #[test]
    fn test_display_summary() {
        let stats = Primitive::cuboid(Vector3::new(1.0, 2.0, 3.0), [false; 3]).to_solid().unwrap().stats();
        let text = stats.to_string();
        assert!(text.contains("1.000 × 2.000 × 3.000"));
        assert!(text.contains("6 faces, 1 shells, watertight"));
    }

    #[test]
    fn test_empty_mesh() {
        let stats = analyze(&Mesh::new());
        assert_eq!(stats.volume, 0.0);
        assert!(!stats.is_watertight);
    }
}
