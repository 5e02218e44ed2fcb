// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operations on solids
//!
//! The BSP result is welded, T-junctions are repaired and the boundary is
//! checked for closure before a solid is handed back. Coplanar neighbouring
//! faces are merged so flush unions do not leave seams in the topology.

use super::bsp;
use super::polygon::{FaceId, Polygon};
use super::repair::{non_manifold_edges, open_edges, repair, IndexedPolygons};
use super::Solid;
use crate::config::ModelingConfig;
use crate::error::{ModelingError, ModelingResult};
use ahash::AHashMap;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
}

impl BooleanOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Subtract => "subtract",
            Self::Intersect => "intersect",
        }
    }
}

/// Perform boolean operation between two solids
pub fn perform_boolean_operation(
    a: &Solid,
    b: &Solid,
    op: BooleanOp,
    config: &ModelingConfig,
) -> ModelingResult<Solid> {
    let bbox_a = a.bounding_box();
    let bbox_b = b.bounding_box();
    let diagonal = bbox_a.union(&bbox_b).diagonal();
    let epsilon = config.tolerance.epsilon_for(diagonal);

    if bbox_a.is_disjoint(&bbox_b, epsilon) {
        debug!(op = op.name(), "operands do not overlap");
        return Ok(match op {
            BooleanOp::Union if a.is_empty() => b.clone(),
            BooleanOp::Union if b.is_empty() => a.clone(),
            BooleanOp::Union => concatenate(a, b),
            BooleanOp::Subtract => a.clone(),
            BooleanOp::Intersect => Solid::empty(),
        });
    }

    let offset = a.next_face_id();
    let (polygons_a, mut labels) = a.clone().into_parts();
    let (polygons_b, labels_b) = b.with_face_offset(offset).into_parts();
    labels.extend(labels_b);
    let (count_a, count_b) = (polygons_a.len(), polygons_b.len());

    let polygons = match op {
        BooleanOp::Union => bsp::union(polygons_a, polygons_b, epsilon),
        BooleanOp::Subtract => bsp::difference(polygons_a, polygons_b, epsilon),
        BooleanOp::Intersect => bsp::intersection(polygons_a, polygons_b, epsilon),
    };
    debug!(
        op = op.name(),
        a = count_a,
        b = count_b,
        raw = polygons.len(),
        epsilon,
        "boolean"
    );

    finish(op.name(), polygons, labels, epsilon, config)
}

/// Two solids whose boxes do not touch, as one solid with two shells
fn concatenate(a: &Solid, b: &Solid) -> Solid {
    let offset = a.next_face_id();
    let (mut polygons, mut labels) = a.clone().into_parts();
    let (polygons_b, labels_b) = b.with_face_offset(offset).into_parts();
    polygons.extend(polygons_b);
    labels.extend(labels_b);
    Solid::from_polygons(polygons).with_labels(labels)
}

/// Repair and validate a raw polygon soup into a solid
pub(crate) fn finish(
    operation: &'static str,
    polygons: Vec<Polygon>,
    labels: BTreeMap<FaceId, String>,
    epsilon: f64,
    config: &ModelingConfig,
) -> ModelingResult<Solid> {
    if polygons.is_empty() {
        return Ok(Solid::empty());
    }

    let weld = epsilon * config.tolerance.weld_factor;
    let (polygons, indexed) = repair(polygons, weld);
    if polygons.is_empty() {
        return Ok(Solid::empty());
    }

    let open = open_edges(&indexed.loops);
    if let Some(&(i, j)) = open.first() {
        let location = nalgebra::center(&indexed.points[i], &indexed.points[j]);
        warn!(operation, open = open.len(), "result is not closed");
        return Err(ModelingError::degenerate(
            operation,
            location,
            format!("{} open boundary edges in the result", open.len()),
        ));
    }

    let solid = Solid::from_polygons(polygons).with_labels(labels);
    let volume = solid.volume();
    let diagonal = solid.bounding_box().diagonal();
    if volume.abs() <= epsilon * diagonal * diagonal {
        // Faces touching without overlap enclose nothing
        debug!(operation, volume, "result has no volume");
        return Ok(Solid::empty());
    }
    let shared = non_manifold_edges(&indexed.loops);
    if let Some(&(i, j)) = shared.first() {
        let location = nalgebra::center(&indexed.points[i], &indexed.points[j]);
        warn!(operation, edges = shared.len(), "result is not manifold");
        return Err(ModelingError::degenerate(
            operation,
            location,
            format!("{} edges are shared by more than two faces", shared.len()),
        ));
    }
    if volume < 0.0 {
        warn!(operation, volume, "result is inside out");
        return Err(ModelingError::degenerate(
            operation,
            solid.centroid(),
            format!("result encloses negative volume {volume:.6}"),
        ));
    }

    let solid = if config.clean_coplanar {
        merge_coplanar_faces(solid, &indexed, weld)
    } else {
        solid
    };
    Ok(renumber(solid))
}

fn find(parent: &mut AHashMap<FaceId, FaceId>, face: FaceId) -> FaceId {
    let mut root = face;
    while let Some(&next) = parent.get(&root) {
        if next == root {
            break;
        }
        root = next;
    }
    parent.insert(face, root);
    root
}

/// Give adjacent faces lying on one plane a single face id
///
/// Only faces made of a single plane take part, so tessellated curved
/// faces keep their identity. The merged face keeps the lowest id and the
/// first label found in id order.
fn merge_coplanar_faces(solid: Solid, indexed: &IndexedPolygons, tolerance: f64) -> Solid {
    let (mut polygons, labels) = solid.into_parts();

    let mut planar: AHashMap<FaceId, bool> = AHashMap::new();
    let mut reference: AHashMap<FaceId, usize> = AHashMap::new();
    for (index, polygon) in polygons.iter().enumerate() {
        let first = *reference.entry(polygon.face).or_insert(index);
        let same = polygons[first].plane.coincides(&polygon.plane, tolerance);
        let entry = planar.entry(polygon.face).or_insert(true);
        *entry &= same;
    }

    let mut edge_owner: AHashMap<(usize, usize), Vec<usize>> = AHashMap::new();
    for (ring, &source) in indexed.loops.iter().zip(&indexed.source) {
        let n = ring.len();
        for k in 0..n {
            let (a, b) = (ring[k], ring[(k + 1) % n]);
            edge_owner.entry((a.min(b), a.max(b))).or_default().push(source);
        }
    }

    let mut parent: AHashMap<FaceId, FaceId> = AHashMap::new();
    let mut merged = 0usize;
    let mut pairs: Vec<(usize, usize)> = edge_owner
        .values()
        .filter(|owners| owners.len() == 2)
        .map(|owners| (owners[0].min(owners[1]), owners[0].max(owners[1])))
        .collect();
    pairs.sort_unstable();
    pairs.dedup();
    for (p, q) in pairs {
        let (fp, fq) = (polygons[p].face, polygons[q].face);
        if fp == fq || !planar[&fp] || !planar[&fq] {
            continue;
        }
        if !polygons[p].plane.coincides(&polygons[q].plane, tolerance) {
            continue;
        }
        let (rp, rq) = (find(&mut parent, fp), find(&mut parent, fq));
        if rp != rq {
            let (keep, drop) = (rp.min(rq), rp.max(rq));
            parent.insert(drop, keep);
            merged += 1;
        }
    }

    if merged == 0 {
        return Solid::from_polygons(polygons).with_labels(labels);
    }
    debug!(merged, "merged coplanar faces");

    let mut merged_labels = BTreeMap::new();
    for (face, label) in labels {
        let root = find(&mut parent, face);
        merged_labels.entry(root).or_insert(label);
    }
    for polygon in &mut polygons {
        polygon.face = find(&mut parent, polygon.face);
    }
    Solid::from_polygons(polygons).with_labels(merged_labels)
}

/// Compact face ids to `0..n` in ascending order
fn renumber(solid: Solid) -> Solid {
    let (mut polygons, labels) = solid.into_parts();
    let mut ids: Vec<FaceId> = polygons.iter().map(|p| p.face).collect();
    ids.sort_unstable();
    ids.dedup();
    let index = |face: FaceId| ids.binary_search(&face).ok().map(|i| i as FaceId);
    for polygon in &mut polygons {
        if let Some(id) = index(polygon.face) {
            polygon.face = id;
        }
    }
    // Faces that lost every polygon drop their labels
    let labels = labels
        .into_iter()
        .filter_map(|(face, label)| index(face).map(|id| (id, label)))
        .collect();
    Solid::from_polygons(polygons).with_labels(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Primitive, Transformable};
    use nalgebra::Vector3;

    fn cube(size: f64) -> Solid {
        Primitive::cuboid(Vector3::new(size, size, size), [false; 3])
            .to_solid()
            .unwrap()
    }

    #[test]
    fn test_overlapping_cubes() {
        let config = ModelingConfig::default();
        let a = cube(2.0);
        let b = cube(2.0).translate(Vector3::new(1.0, 1.0, 1.0));

        let union = perform_boolean_operation(&a, &b, BooleanOp::Union, &config).unwrap();
        assert!((union.volume() - 15.0).abs() < 1e-9);
        assert!(union.is_watertight());

        let difference = perform_boolean_operation(&a, &b, BooleanOp::Subtract, &config).unwrap();
        assert!((difference.volume() - 7.0).abs() < 1e-9);

        let common = perform_boolean_operation(&a, &b, BooleanOp::Intersect, &config).unwrap();
        assert!((common.volume() - 1.0).abs() < 1e-9);
        assert_eq!(common.face_count(), 6);
    }

    #[test]
    fn test_flush_union_merges_faces() {
        let config = ModelingConfig::default();
        let a = cube(1.0);
        let b = cube(1.0).translate(Vector3::new(1.0, 0.0, 0.0));
        let union = perform_boolean_operation(&a, &b, BooleanOp::Union, &config).unwrap();
        assert!((union.volume() - 2.0).abs() < 1e-9);
        assert_eq!(union.face_count(), 6);
        assert!(union.is_watertight());
    }

    #[test]
    fn test_disjoint_quick_paths() {
        let config = ModelingConfig::default();
        let a = cube(1.0);
        let b = cube(1.0).translate(Vector3::new(5.0, 0.0, 0.0));
        let union = perform_boolean_operation(&a, &b, BooleanOp::Union, &config).unwrap();
        assert_eq!(union.shell_count(), 2);
        assert_eq!(union.face_count(), 12);
        assert!(perform_boolean_operation(&a, &b, BooleanOp::Intersect, &config)
            .unwrap()
            .is_empty());
        let kept = perform_boolean_operation(&a, &b, BooleanOp::Subtract, &config).unwrap();
        assert_eq!(kept, a);
    }

    #[test]
    fn test_labels_survive() {
        let config = ModelingConfig::default();
        let a = cube(2.0).labelled([1], "top");
        let b = cube(1.0).translate(Vector3::new(0.5, 0.5, -0.5));
        let result = perform_boolean_operation(&a, &b, BooleanOp::Subtract, &config).unwrap();
        let tagged: Vec<_> = result
            .face_ids()
            .into_iter()
            .filter(|&f| result.label(f) == Some("top"))
            .collect();
        assert_eq!(tagged.len(), 1);
    }

    #[test]
    fn test_edge_contact_is_degenerate() {
        let config = ModelingConfig::default();
        let a = cube(1.0);
        let b = cube(1.0).translate(Vector3::new(1.0, 1.0, 0.0));
        let err = perform_boolean_operation(&a, &b, BooleanOp::Union, &config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Kernel);
        assert_eq!(err.operation(), "union");

        // Two opposite quarters cut from a block leave cubes joined along the center line
        let block = Primitive::cuboid(Vector3::new(2.0, 2.0, 1.0), [false; 3]).to_solid().unwrap();
        let first = perform_boolean_operation(&block, &a, BooleanOp::Subtract, &config).unwrap();
        let err = perform_boolean_operation(&first, &b, BooleanOp::Subtract, &config).unwrap_err();
        assert!(matches!(err, ModelingError::DegenerateGeometry { .. }));
    }
}
