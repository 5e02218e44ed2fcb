// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Solid: a closed, outward-oriented polygonal boundary

use super::analytics::{analyze, GeometryStats};
use super::polygon::{FaceId, Polygon};
use super::repair::{connected_components, is_two_manifold, weld};
use super::transform::{Transform, Transformable};
use super::{BoundingBox, Mesh, Triangle, Vertex};
use crate::config::ToleranceConfig;
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeMap, BTreeSet};

/// A watertight boundary representation built from convex planar polygons
///
/// Polygons sharing a [`FaceId`] form one logical boundary face. Operations
/// never mutate a solid; they return a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    polygons: Vec<Polygon>,
    labels: BTreeMap<FaceId, String>,
}

impl Solid {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self {
            polygons,
            labels: BTreeMap::new(),
        }
    }

    pub(crate) fn with_labels(mut self, labels: BTreeMap<FaceId, String>) -> Self {
        let faces = self.face_ids();
        self.labels = labels.into_iter().filter(|(face, _)| faces.contains(face)).collect();
        self
    }

    pub(crate) fn into_parts(self) -> (Vec<Polygon>, BTreeMap<FaceId, String>) {
        (self.polygons, self.labels)
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn face_ids(&self) -> BTreeSet<FaceId> {
        self.polygons.iter().map(|p| p.face).collect()
    }

    pub fn face_count(&self) -> usize {
        self.face_ids().len()
    }

    /// Boundary tag attached to a face, if any
    pub fn label(&self, face: FaceId) -> Option<&str> {
        self.labels.get(&face).map(String::as_str)
    }

    pub(crate) fn labels(&self) -> &BTreeMap<FaceId, String> {
        &self.labels
    }

    /// Attach a boundary tag to the given faces, replacing any previous tag
    pub fn labelled(&self, faces: impl IntoIterator<Item = FaceId>, label: &str) -> Self {
        let mut result = self.clone();
        for face in faces {
            result.labels.insert(face, label.to_string());
        }
        result
    }

    /// Renumber faces so they start at `offset`, keeping their labels
    pub(crate) fn with_face_offset(&self, offset: FaceId) -> Self {
        Self {
            polygons: self
                .polygons
                .iter()
                .map(|p| Polygon {
                    face: p.face + offset,
                    ..p.clone()
                })
                .collect(),
            labels: self.labels.iter().map(|(f, l)| (f + offset, l.clone())).collect(),
        }
    }

    /// One past the largest face id in use
    pub(crate) fn next_face_id(&self) -> FaceId {
        self.polygons.iter().map(|p| p.face + 1).max().unwrap_or(0)
    }

    pub fn volume(&self) -> f64 {
        self.polygons.iter().map(Polygon::signed_volume).sum()
    }

    pub fn surface_area(&self) -> f64 {
        self.polygons.iter().map(Polygon::area).sum()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.polygons.iter().flat_map(|p| p.vertices.iter()))
    }

    /// Center of mass of the enclosed volume
    pub fn centroid(&self) -> Point3<f64> {
        let mut weighted = Vector3::zeros();
        let mut total = 0.0;
        for polygon in &self.polygons {
            for [a, b, c] in polygon.triangles() {
                let v = a.coords.dot(&b.coords.cross(&c.coords)) / 6.0;
                weighted += (a.coords + b.coords + c.coords) * (v / 4.0);
                total += v;
            }
        }
        if total.abs() < f64::EPSILON {
            return self.bounding_box().center();
        }
        Point3::from(weighted / total)
    }

    /// Welding distance under the default tolerance policy
    pub(crate) fn weld_tolerance(&self) -> f64 {
        ToleranceConfig::default().weld_for(self.bounding_box().diagonal())
    }

    /// Every boundary edge is matched by exactly one oppositely oriented edge
    pub fn is_watertight(&self) -> bool {
        self.is_watertight_within(self.weld_tolerance())
    }

    /// [`Solid::is_watertight`] with vertices welded at `tolerance`
    pub fn is_watertight_within(&self, tolerance: f64) -> bool {
        if self.is_empty() {
            return true;
        }
        is_two_manifold(&weld(&self.polygons, tolerance).loops)
    }

    /// Number of disconnected shells
    pub fn shell_count(&self) -> usize {
        self.shell_count_within(self.weld_tolerance())
    }

    pub fn shell_count_within(&self, tolerance: f64) -> usize {
        if self.is_empty() {
            return 0;
        }
        connected_components(&weld(&self.polygons, tolerance))
    }

    /// Volume, area and bounding box agree within `tolerance` (relative for volume and area)
    pub fn is_congruent(&self, other: &Solid, tolerance: f64) -> bool {
        let relative = |a: f64, b: f64| (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0);
        relative(self.volume(), other.volume())
            && relative(self.surface_area(), other.surface_area())
            && self.bounding_box().approx_eq(&other.bounding_box(), tolerance.max(1e-9) * 10.0)
    }

    /// Indexed triangle mesh with welded vertices and smoothed normals
    pub fn to_mesh(&self) -> Mesh {
        self.to_mesh_within(self.weld_tolerance())
    }

    pub fn to_mesh_within(&self, tolerance: f64) -> Mesh {
        let indexed = weld(&self.polygons, tolerance);
        let mut mesh = Mesh::with_capacity(indexed.points.len(), self.polygons.len() * 2);
        for p in &indexed.points {
            mesh.add_vertex(Vertex::new(*p, Vector3::zeros()));
        }
        for (ring, &source) in indexed.loops.iter().zip(&indexed.source) {
            let face = self.polygons[source].face;
            for k in 1..ring.len().saturating_sub(1) {
                let tri = [ring[0], ring[k], ring[k + 1]];
                if tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2] {
                    mesh.add_triangle(Triangle::new(tri, face));
                }
            }
        }
        mesh.recompute_normals();
        mesh
    }

    pub fn stats(&self) -> GeometryStats {
        self.stats_within(self.weld_tolerance())
    }

    pub fn stats_within(&self, tolerance: f64) -> GeometryStats {
        let mut stats = analyze(&self.to_mesh_within(tolerance));
        stats.face_count = self.face_count();
        stats.shell_count = self.shell_count_within(tolerance);
        stats
    }
}

impl Transformable for Solid {
    fn transformed(&self, transform: &Transform) -> Self {
        Self {
            polygons: self.polygons.iter().map(|p| p.transformed(transform)).collect(),
            labels: self.labels.clone(),
        }
    }
}
