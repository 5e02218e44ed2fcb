// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Hollowing a solid to a wall thickness
//!
//! Every face plane is moved along its normal and each welded vertex is
//! re-solved against the planes meeting there in the least-squares sense.
//! The moved boundary is either the cavity (inward) or the new outer skin
//! (outward); the opened faces are pushed clear so the cavity breaks
//! through them.

use crate::config::ModelingConfig;
use crate::error::{ModelingError, ModelingResult};
use crate::geometry::repair::{weld, IndexedPolygons};
use crate::geometry::{finish, perform_boolean_operation, BooleanOp, FaceId, Polygon, Solid};
use crate::select::FaceSet;
use crate::utils::math::newell_normal;
use nalgebra::{DMatrix, DVector, Point3, Vector3};
use std::collections::BTreeMap;
use tracing::debug;

const OP: &str = "shell";

/// Hollow `solid`, opening the faces in `open`
///
/// A negative `thickness` removes material inward, leaving walls of
/// `|thickness|` inside the original boundary. A positive one grows the
/// walls outward and keeps the original boundary as the cavity. Cavity
/// faces are tagged `"inner"`.
pub fn shell(solid: &Solid, open: &FaceSet, thickness: f64, config: &ModelingConfig) -> ModelingResult<Solid> {
    if !thickness.is_finite() || thickness == 0.0 {
        return Err(ModelingError::invalid_parameter(
            OP,
            format!("thickness must be finite and non-zero, got {thickness}"),
        ));
    }
    let existing = solid.face_ids();
    if let Some(missing) = open.iter().find(|f| !existing.contains(f)) {
        return Err(ModelingError::invalid_parameter(
            OP,
            format!("face {missing} is not part of the solid"),
        ));
    }

    let diagonal = solid.bounding_box().diagonal();
    let offsets = VertexOffsets::new(solid, config.tolerance.weld_for(diagonal));
    let depth = thickness.abs();
    let opened = |face: FaceId| open.contains(face);

    let inner = |labels: BTreeMap<FaceId, String>, delta: &dyn Fn(FaceId) -> f64| {
        offsets.apply(delta, labels, config)
    };
    let cavity_labels: BTreeMap<FaceId, String> = existing.iter().map(|&f| (f, "inner".to_string())).collect();
    let (outer, cavity) = if thickness < 0.0 {
        let cavity = inner(cavity_labels, &|f| if opened(f) { depth } else { -depth })?;
        (solid.clone(), cavity)
    } else {
        let skin = inner(solid.labels().clone(), &|f| if opened(f) { 0.0 } else { depth })?;
        let cavity = inner(cavity_labels, &|f| if opened(f) { depth } else { 0.0 })?;
        (skin, cavity)
    };

    let result = perform_boolean_operation(&outer, &cavity, BooleanOp::Subtract, config)?;
    if result.is_empty() {
        return Err(ModelingError::infeasible(
            OP,
            format!("a wall of {depth} leaves no material"),
        ));
    }
    debug!(thickness, open = open.len(), volume = result.volume(), "shelled");
    Ok(result)
}

/// Welded boundary of a solid with the distinct planes meeting at each vertex
struct VertexOffsets<'a> {
    solid: &'a Solid,
    mesh: IndexedPolygons,
    planes: Vec<Vec<(Vector3<f64>, FaceId)>>,
}

impl<'a> VertexOffsets<'a> {
    fn new(solid: &'a Solid, tolerance: f64) -> Self {
        let mesh = weld(solid.polygons(), tolerance);
        let mut planes: Vec<Vec<(Vector3<f64>, FaceId)>> = vec![Vec::new(); mesh.points.len()];
        for (ring, &source) in mesh.loops.iter().zip(&mesh.source) {
            let polygon = &solid.polygons()[source];
            for &i in ring {
                let seen = planes[i]
                    .iter()
                    .any(|(n, _)| n.dot(&polygon.plane.normal) > 1.0 - 1e-9);
                if !seen {
                    planes[i].push((polygon.plane.normal, polygon.face));
                }
            }
        }
        Self { solid, mesh, planes }
    }

    /// Boundary with every face moved `delta(face)` along its outward normal
    fn apply(
        &self,
        delta: &dyn Fn(FaceId) -> f64,
        labels: BTreeMap<FaceId, String>,
        config: &ModelingConfig,
    ) -> ModelingResult<Solid> {
        let moved = self
            .mesh
            .points
            .iter()
            .zip(&self.planes)
            .map(|(p, planes)| {
                let a = DMatrix::from_fn(planes.len(), 3, |r, c| planes[r].0[c]);
                let b = DVector::from_fn(planes.len(), |r, _| delta(planes[r].1));
                let step = a
                    .svd(true, true)
                    .solve(&b, 1e-9)
                    .map_err(|e| ModelingError::degenerate(OP, *p, format!("vertex offset failed: {e}")))?;
                Ok(p + Vector3::new(step[0], step[1], step[2]))
            })
            .collect::<ModelingResult<Vec<Point3<f64>>>>()?;

        let mut polygons = Vec::with_capacity(self.mesh.loops.len());
        for (ring, &source) in self.mesh.loops.iter().zip(&self.mesh.source) {
            let original = &self.solid.polygons()[source];
            let vertices: Vec<Point3<f64>> = ring.iter().map(|&i| moved[i]).collect();
            let facing = newell_normal(&vertices).dot(&original.plane.normal);
            if facing <= 2.0 * original.area() * 1e-9 {
                return Err(ModelingError::infeasible(
                    OP,
                    format!(
                        "offset turns the face at ({:.4}, {:.4}, {:.4}) inside out",
                        original.centroid().x,
                        original.centroid().y,
                        original.centroid().z
                    ),
                ));
            }
            polygons.extend(planar_pieces(vertices, original.face));
        }

        let bbox_diagonal = crate::geometry::BoundingBox::from_points(moved.iter()).diagonal();
        let epsilon = config.tolerance.epsilon_for(bbox_diagonal);
        finish(OP, polygons, labels, epsilon, config)
    }
}

/// One polygon when the moved vertices stay planar, a triangle fan otherwise
fn planar_pieces(vertices: Vec<Point3<f64>>, face: FaceId) -> Vec<Polygon> {
    let Some(polygon) = Polygon::new(vertices.clone(), face) else {
        return Vec::new();
    };
    let scale = polygon.area().sqrt();
    if vertices.iter().all(|v| polygon.plane.distance(v).abs() <= 1e-10 * (1.0 + scale)) {
        return vec![polygon];
    }
    (1..vertices.len() - 1)
        .filter_map(|k| Polygon::new(vec![vertices[0], vertices[k], vertices[k + 1]], face))
        .collect()
}
