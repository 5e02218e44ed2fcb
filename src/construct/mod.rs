// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Promotion of profiles into solids
//!
//! Every constructor emits convex planar polygons tagged with logical face
//! ids, then runs them through the same repair and closure checks the
//! boolean engine uses. Caps are tagged `"start"` and `"end"`, lateral faces
//! `"side"`.

mod extrude;
mod loft;
mod revolve;
mod sweep;

pub use extrude::{extrude, extrude_region};
pub use loft::{loft, loft_with};
pub use revolve::revolve;
pub use sweep::sweep;

use crate::config::ModelingConfig;
use crate::error::{ModelingError, ModelingResult};
use crate::geometry::{finish, BoundingBox, FaceId, Polygon, Solid, SurfacePlane};
use crate::sketch::{Segment, Wire};
use nalgebra::Point3;
use std::collections::BTreeMap;
use tracing::debug;

/// Boundary polygons collected while a constructor runs
pub(crate) struct SolidBuilder {
    operation: &'static str,
    polygons: Vec<Polygon>,
    labels: BTreeMap<FaceId, String>,
    next_face: FaceId,
}

impl SolidBuilder {
    pub(crate) fn new(operation: &'static str) -> Self {
        Self {
            operation,
            polygons: Vec::new(),
            labels: BTreeMap::new(),
            next_face: 0,
        }
    }

    /// Allocate a new logical face carrying `label`
    pub(crate) fn face(&mut self, label: &str) -> FaceId {
        let id = self.next_face;
        self.next_face += 1;
        self.labels.insert(id, label.to_string());
        id
    }

    /// Add a convex planar polygon, skipping it when it collapses
    pub(crate) fn polygon(&mut self, vertices: &[Point3<f64>], face: FaceId) {
        let mut ring: Vec<Point3<f64>> = Vec::with_capacity(vertices.len());
        for p in vertices {
            if ring.last().map_or(true, |last| (p - last).norm() > 1e-12) {
                ring.push(*p);
            }
        }
        while ring.len() > 1 && (ring[0] - ring[ring.len() - 1]).norm() <= 1e-12 {
            ring.pop();
        }
        if let Some(polygon) = Polygon::new(ring, face) {
            self.polygons.push(polygon);
        }
    }

    /// Add a quad, split into two triangles when it is twisted
    pub(crate) fn quad(&mut self, corners: [Point3<f64>; 4], face: FaceId) {
        let [a, b, c, d] = corners;
        let scale = corners
            .iter()
            .map(|p| (p - a).norm())
            .fold(0.0, f64::max);
        let planar = SurfacePlane::from_points(&corners)
            .map_or(false, |plane| corners.iter().all(|p| plane.distance(p).abs() <= 1e-10 * (1.0 + scale)));
        if planar {
            self.polygon(&corners, face);
        } else {
            self.polygon(&[a, b, c], face);
            self.polygon(&[a, c, d], face);
        }
    }

    /// Close the boundary into a validated solid with positive volume
    pub(crate) fn build(self, config: &ModelingConfig) -> ModelingResult<Solid> {
        let mut polygons = self.polygons;
        let volume: f64 = polygons.iter().map(Polygon::signed_volume).sum();
        if volume < 0.0 {
            for polygon in &mut polygons {
                polygon.flip();
            }
        }

        let bbox = BoundingBox::from_points(polygons.iter().flat_map(|p| p.vertices.iter()));
        let epsilon = config.tolerance.epsilon_for(bbox.diagonal());
        let count = polygons.len();
        let solid = finish(self.operation, polygons, self.labels, epsilon, config)?;
        if solid.is_empty() {
            return Err(ModelingError::degenerate(
                self.operation,
                bbox.center(),
                "construction encloses no volume",
            ));
        }
        debug!(
            operation = self.operation,
            polygons = count,
            faces = solid.face_count(),
            volume = solid.volume(),
            "constructed"
        );
        Ok(solid)
    }
}

fn same_circle(a: &Segment, b: &Segment) -> bool {
    match (a, b) {
        (
            Segment::Arc {
                start: sa,
                center: ca,
                ccw: wa,
                ..
            },
            Segment::Arc {
                start: sb,
                center: cb,
                ccw: wb,
                ..
            },
        ) => {
            let (ra, rb) = ((sa - ca).norm(), (sb - cb).norm());
            wa == wb && (ca - cb).norm() <= 1e-9 * (1.0 + ra) && (ra - rb).abs() <= 1e-9 * (1.0 + ra)
        }
        _ => false,
    }
}

/// Lateral face group of every physical edge of `wire`
///
/// Consecutive arcs on the same circle share one group, so a circle drawn as
/// two half arcs becomes a single cylindrical face.
pub(crate) fn edge_groups(wire: &Wire) -> Vec<usize> {
    let edges: Vec<&Segment> = wire.physical_edges().collect();
    let mut groups = Vec::with_capacity(edges.len());
    let mut current = 0;
    for (i, edge) in edges.iter().enumerate() {
        if i > 0 && !same_circle(edges[i - 1], edge) {
            current += 1;
        }
        groups.push(current);
    }
    let n = edges.len();
    if wire.is_closed() && current > 0 && same_circle(edges[n - 1], edges[0]) {
        for group in groups.iter_mut().filter(|g| **g == current) {
            *group = 0;
        }
    }
    groups
}

/// Allocate one labelled face per group and map every edge to it
pub(crate) fn group_faces(builder: &mut SolidBuilder, groups: &[usize], label: &str) -> Vec<FaceId> {
    let count = groups.iter().copied().max().map_or(0, |m| m + 1);
    let faces: Vec<FaceId> = (0..count).map(|_| builder.face(label)).collect();
    groups.iter().map(|&g| faces[g]).collect()
}
