// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary selection by geometric predicate
//!
//! Predicates describe geometry, never identities: they are evaluated
//! against whatever solid they are given, so the same predicate keeps
//! working after a boolean renumbers every face. Combinators filter in
//! order, so `MaxAlong` inside `And` picks the extreme among what the left
//! side kept.

use crate::error::{ModelingError, ModelingResult};
use crate::geometry::{Edge, FaceId, Solid, Topology};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;
use std::fmt;

/// Directions closer than this (radians) count as parallel
const ANGULAR_TOLERANCE: f64 = 1e-6;

/// Predicate over the faces of a solid
#[derive(Debug, Clone, PartialEq)]
pub enum FacePredicate {
    /// Planar faces whose normal is parallel or anti-parallel to the axis
    NormalParallelTo(Vector3<f64>),
    /// Planar faces whose outward normal is within `tolerance_deg` of `direction`
    NormalEquals { direction: Vector3<f64>, tolerance_deg: f64 },
    /// Planar faces whose normal is perpendicular to the axis
    NormalPerpendicularTo(Vector3<f64>),
    /// The face whose centroid is closest to the point
    NearestToPoint(Point3<f64>),
    /// Faces whose centroid is furthest along the direction
    MaxAlong(Vector3<f64>),
    MinAlong(Vector3<f64>),
    /// Faces carrying a boundary tag
    Tagged(String),
    And(Box<FacePredicate>, Box<FacePredicate>),
    Or(Box<FacePredicate>, Box<FacePredicate>),
    Not(Box<FacePredicate>),
}

/// Predicate over the edges of a solid
#[derive(Debug, Clone, PartialEq)]
pub enum EdgePredicate {
    /// Straight edges parallel to the axis
    ParallelTo(Vector3<f64>),
    /// Straight edges perpendicular to the axis
    PerpendicularTo(Vector3<f64>),
    /// The edge whose polyline passes closest to the point
    NearestToPoint(Point3<f64>),
    /// Edges bounding any face the predicate selects
    OfFace(Box<FacePredicate>),
    /// Edges whose center is furthest along the direction
    MaxAlong(Vector3<f64>),
    MinAlong(Vector3<f64>),
    And(Box<EdgePredicate>, Box<EdgePredicate>),
    Or(Box<EdgePredicate>, Box<EdgePredicate>),
    Not(Box<EdgePredicate>),
}

fn unit(operation: &'static str, v: &Vector3<f64>) -> ModelingResult<Vector3<f64>> {
    v.try_normalize(1e-12)
        .ok_or_else(|| ModelingError::invalid_parameter(operation, "selector direction has zero length"))
}

/// Keys within `tolerance` of the extreme value
fn extremes<T: Copy + Ord>(keyed: impl Iterator<Item = (T, f64)>, tolerance: f64, max: bool) -> BTreeSet<T> {
    let keyed: Vec<(T, f64)> = keyed.map(|(k, v)| (k, if max { v } else { -v })).collect();
    let best = keyed.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    keyed
        .into_iter()
        .filter(|(_, v)| *v >= best - tolerance)
        .map(|(k, _)| k)
        .collect()
}

impl FacePredicate {
    pub fn normal_parallel_to(axis: Vector3<f64>) -> Self {
        Self::NormalParallelTo(axis)
    }

    pub fn normal_equals(direction: Vector3<f64>, tolerance_deg: f64) -> Self {
        Self::NormalEquals {
            direction,
            tolerance_deg,
        }
    }

    pub fn nearest_to_point(point: Point3<f64>) -> Self {
        Self::NearestToPoint(point)
    }

    pub fn tagged(label: impl Into<String>) -> Self {
        Self::Tagged(label.into())
    }

    pub fn and(self, other: FacePredicate) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: FacePredicate) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Faces among `candidates` the predicate keeps
    pub(crate) fn filter(
        &self,
        topology: &Topology,
        candidates: &BTreeSet<FaceId>,
        tolerance: f64,
    ) -> ModelingResult<BTreeSet<FaceId>> {
        const OP: &str = "select_faces";
        let faces = || topology.faces().iter().filter(|f| candidates.contains(&f.id));
        let by_normal = |test: &dyn Fn(&Vector3<f64>) -> bool| -> BTreeSet<FaceId> {
            faces()
                .filter(|f| f.normal.as_ref().map_or(false, |n| test(n)))
                .map(|f| f.id)
                .collect()
        };

        Ok(match self {
            Self::NormalParallelTo(axis) => {
                let axis = unit(OP, axis)?;
                by_normal(&|n| n.cross(&axis).norm() <= ANGULAR_TOLERANCE)
            }
            Self::NormalEquals {
                direction,
                tolerance_deg,
            } => {
                let direction = unit(OP, direction)?;
                if !(tolerance_deg.is_finite() && *tolerance_deg >= 0.0) {
                    return Err(ModelingError::invalid_parameter(
                        OP,
                        format!("angular tolerance must be non-negative, got {tolerance_deg}"),
                    ));
                }
                let limit = tolerance_deg.to_radians().max(ANGULAR_TOLERANCE);
                by_normal(&|n| n.dot(&direction).clamp(-1.0, 1.0).acos() <= limit)
            }
            Self::NormalPerpendicularTo(axis) => {
                let axis = unit(OP, axis)?;
                by_normal(&|n| n.dot(&axis).abs() <= ANGULAR_TOLERANCE)
            }
            Self::NearestToPoint(point) => faces()
                .map(|f| (f.id, (f.centroid - point).norm()))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id)
                .into_iter()
                .collect(),
            Self::MaxAlong(direction) | Self::MinAlong(direction) => {
                let direction = unit(OP, direction)?;
                let keyed = faces().map(|f| (f.id, f.centroid.coords.dot(&direction)));
                extremes(keyed, tolerance, matches!(self, Self::MaxAlong(_)))
            }
            Self::Tagged(label) => faces()
                .filter(|f| f.label.as_deref() == Some(label.as_str()))
                .map(|f| f.id)
                .collect(),
            Self::And(a, b) => {
                let kept = a.filter(topology, candidates, tolerance)?;
                b.filter(topology, &kept, tolerance)?
            }
            Self::Or(a, b) => {
                let mut kept = a.filter(topology, candidates, tolerance)?;
                kept.extend(b.filter(topology, candidates, tolerance)?);
                kept
            }
            Self::Not(inner) => {
                let excluded = inner.filter(topology, candidates, tolerance)?;
                candidates.difference(&excluded).copied().collect()
            }
        })
    }
}

impl EdgePredicate {
    pub fn parallel_to_axis(axis: Vector3<f64>) -> Self {
        Self::ParallelTo(axis)
    }

    pub fn nearest_to_point(point: Point3<f64>) -> Self {
        Self::NearestToPoint(point)
    }

    pub fn of_face(face: FacePredicate) -> Self {
        Self::OfFace(Box::new(face))
    }

    pub fn and(self, other: EdgePredicate) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: EdgePredicate) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Indices into `topology.edges()` among `candidates` the predicate keeps
    pub(crate) fn filter(
        &self,
        topology: &Topology,
        candidates: &BTreeSet<usize>,
        tolerance: f64,
    ) -> ModelingResult<BTreeSet<usize>> {
        const OP: &str = "select_edges";
        let edges = || {
            topology
                .edges()
                .iter()
                .enumerate()
                .filter(|(i, _)| candidates.contains(i))
        };
        let by_direction = |test: &dyn Fn(&Vector3<f64>) -> bool| -> BTreeSet<usize> {
            edges()
                .filter(|(_, e)| e.direction().map_or(false, |d| test(&d)))
                .map(|(i, _)| i)
                .collect()
        };

        Ok(match self {
            Self::ParallelTo(axis) => {
                let axis = unit(OP, axis)?;
                by_direction(&|d| d.cross(&axis).norm() <= ANGULAR_TOLERANCE)
            }
            Self::PerpendicularTo(axis) => {
                let axis = unit(OP, axis)?;
                by_direction(&|d| d.dot(&axis).abs() <= ANGULAR_TOLERANCE)
            }
            Self::NearestToPoint(point) => edges()
                .map(|(i, e)| (i, e.distance_to(point), (center(e) - point).norm()))
                .min_by(|a, b| {
                    if (a.1 - b.1).abs() <= tolerance {
                        a.2.total_cmp(&b.2)
                    } else {
                        a.1.total_cmp(&b.1)
                    }
                })
                .map(|(i, ..)| i)
                .into_iter()
                .collect(),
            Self::OfFace(face) => {
                let all: BTreeSet<FaceId> = topology.faces().iter().map(|f| f.id).collect();
                let faces = face.filter(topology, &all, tolerance)?;
                edges()
                    .filter(|(_, e)| e.faces.iter().any(|f| faces.contains(f)))
                    .map(|(i, _)| i)
                    .collect()
            }
            Self::MaxAlong(direction) | Self::MinAlong(direction) => {
                let direction = unit(OP, direction)?;
                let keyed = edges().map(|(i, e)| (i, center(e).coords.dot(&direction)));
                extremes(keyed, tolerance, matches!(self, Self::MaxAlong(_)))
            }
            Self::And(a, b) => {
                let kept = a.filter(topology, candidates, tolerance)?;
                b.filter(topology, &kept, tolerance)?
            }
            Self::Or(a, b) => {
                let mut kept = a.filter(topology, candidates, tolerance)?;
                kept.extend(b.filter(topology, candidates, tolerance)?);
                kept
            }
            Self::Not(inner) => {
                let excluded = inner.filter(topology, candidates, tolerance)?;
                candidates.difference(&excluded).copied().collect()
            }
        })
    }
}

/// Midpoint of an open edge, center of a closed loop
fn center(edge: &Edge) -> Point3<f64> {
    if edge.closed {
        let sum = edge.points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / edge.points.len() as f64)
    } else {
        edge.midpoint()
    }
}

fn fmt_vector(f: &mut fmt::Formatter<'_>, v: &Vector3<f64>) -> fmt::Result {
    write!(f, "({}, {}, {})", v.x, v.y, v.z)
}

impl fmt::Display for FacePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormalParallelTo(v) => {
                write!(f, "normal_parallel_to")?;
                fmt_vector(f, v)
            }
            Self::NormalEquals {
                direction,
                tolerance_deg,
            } => {
                write!(f, "normal_equals")?;
                fmt_vector(f, direction)?;
                write!(f, "±{tolerance_deg}°")
            }
            Self::NormalPerpendicularTo(v) => {
                write!(f, "normal_perpendicular_to")?;
                fmt_vector(f, v)
            }
            Self::NearestToPoint(p) => {
                write!(f, "nearest_to_point")?;
                fmt_vector(f, &p.coords)
            }
            Self::MaxAlong(v) => {
                write!(f, "max_along")?;
                fmt_vector(f, v)
            }
            Self::MinAlong(v) => {
                write!(f, "min_along")?;
                fmt_vector(f, v)
            }
            Self::Tagged(label) => write!(f, "tagged({label})"),
            Self::And(a, b) => write!(f, "({a} and {b})"),
            Self::Or(a, b) => write!(f, "({a} or {b})"),
            Self::Not(a) => write!(f, "not {a}"),
        }
    }
}

impl fmt::Display for EdgePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParallelTo(v) => {
                write!(f, "parallel_to")?;
                fmt_vector(f, v)
            }
            Self::PerpendicularTo(v) => {
                write!(f, "perpendicular_to")?;
                fmt_vector(f, v)
            }
            Self::NearestToPoint(p) => {
                write!(f, "nearest_to_point")?;
                fmt_vector(f, &p.coords)
            }
            Self::OfFace(face) => write!(f, "of_face({face})"),
            Self::MaxAlong(v) => {
                write!(f, "max_along")?;
                fmt_vector(f, v)
            }
            Self::MinAlong(v) => {
                write!(f, "min_along")?;
                fmt_vector(f, v)
            }
            Self::And(a, b) => write!(f, "({a} and {b})"),
            Self::Or(a, b) => write!(f, "({a} or {b})"),
            Self::Not(a) => write!(f, "not {a}"),
        }
    }
}

/// Selected faces of one solid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceSet {
    ids: BTreeSet<FaceId>,
}

impl FaceSet {
    pub fn ids(&self) -> &BTreeSet<FaceId> {
        &self.ids
    }

    pub fn contains(&self, face: FaceId) -> bool {
        self.ids.contains(&face)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.ids.iter().copied()
    }
}

/// Selected edges of one solid, with their geometry
#[derive(Debug, Clone)]
pub struct EdgeSet {
    edges: Vec<Edge>,
}

impl EdgeSet {
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }
}

/// Faces of `topology` matching `predicate`; an empty match is an error
pub fn select_faces(topology: &Topology, predicate: &FacePredicate, tolerance: f64) -> ModelingResult<FaceSet> {
    let all: BTreeSet<FaceId> = topology.faces().iter().map(|f| f.id).collect();
    let ids = predicate.filter(topology, &all, tolerance)?;
    if ids.is_empty() {
        return Err(ModelingError::EmptySelection {
            operation: "select_faces",
            selector: predicate.to_string(),
            target: "faces",
        });
    }
    Ok(FaceSet { ids })
}

/// Edges of `topology` matching `predicate`; an empty match is an error
pub fn select_edges(topology: &Topology, predicate: &EdgePredicate, tolerance: f64) -> ModelingResult<EdgeSet> {
    let all: BTreeSet<usize> = (0..topology.edges().len()).collect();
    let kept = predicate.filter(topology, &all, tolerance)?;
    if kept.is_empty() {
        return Err(ModelingError::EmptySelection {
            operation: "select_edges",
            selector: predicate.to_string(),
            target: "edges",
        });
    }
    Ok(EdgeSet {
        edges: kept.into_iter().map(|i| topology.edges()[i].clone()).collect(),
    })
}

impl Solid {
    /// Attach `label` to every face `predicate` selects
    pub fn tag_faces(&self, predicate: &FacePredicate, label: &str) -> ModelingResult<Solid> {
        let tolerance = self.weld_tolerance();
        let faces = select_faces(&Topology::of(self, tolerance), predicate, tolerance)?;
        Ok(self.labelled(faces.iter(), label))
    }
}
