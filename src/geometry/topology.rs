// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face and edge view of a solid's boundary
//!
//! A face is the set of polygons sharing a face id. An edge is a chain of
//! mesh edges separating two different faces; polygon edges inside a face
//! are not edges of the solid.

use super::polygon::FaceId;
use super::repair::weld;
use super::Solid;
use crate::utils::math::{newell_normal, point_segment_distance};
use ahash::AHashMap;
use nalgebra::{Point3, Unit, Vector3};
use std::collections::BTreeMap;

/// A logical boundary face
#[derive(Debug, Clone)]
pub struct Face {
    pub id: FaceId,
    pub label: Option<String>,
    pub area: f64,
    pub centroid: Point3<f64>,
    /// Outward normal when the whole face lies on one plane
    pub normal: Option<Vector3<f64>>,
}

impl Face {
    pub fn is_planar(&self) -> bool {
        self.normal.is_some()
    }
}

/// A boundary edge between two faces
#[derive(Debug, Clone)]
pub struct Edge {
    /// The face the polyline runs counter-clockwise around, then its neighbour
    pub faces: [FaceId; 2],
    pub points: Vec<Point3<f64>>,
    pub closed: bool,
    pub straight: bool,
    pub length: f64,
}

impl Edge {
    pub fn start(&self) -> Point3<f64> {
        self.points[0]
    }

    pub fn end(&self) -> Point3<f64> {
        if self.closed {
            self.points[0]
        } else {
            self.points[self.points.len() - 1]
        }
    }

    /// Unit direction of a straight edge
    pub fn direction(&self) -> Option<Vector3<f64>> {
        if !self.straight {
            return None;
        }
        (self.end() - self.start()).try_normalize(1e-12)
    }

    /// Point halfway along the polyline
    pub fn midpoint(&self) -> Point3<f64> {
        let half = self.length / 2.0;
        let mut walked = 0.0;
        for (a, b) in self.segments() {
            let step = (b - a).norm();
            if walked + step >= half && step > 0.0 {
                return a + (b - a) * ((half - walked) / step);
            }
            walked += step;
        }
        self.start()
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point3<f64>, Point3<f64>)> + '_ {
        let n = self.points.len();
        let count = if self.closed { n } else { n.saturating_sub(1) };
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Shortest distance from `p` to the polyline
    pub fn distance_to(&self, p: &Point3<f64>) -> f64 {
        self.segments()
            .map(|(a, b)| point_segment_distance(p, &a, &b).0)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn touches(&self, face: FaceId) -> bool {
        self.faces.contains(&face)
    }

    /// Center, unit axis and radius when the edge is a closed circle
    pub fn as_circle(&self, tolerance: f64) -> Option<(Point3<f64>, Unit<Vector3<f64>>, f64)> {
        if !self.closed || self.points.len() < 6 {
            return None;
        }
        let sum = self.points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        let center = Point3::from(sum / self.points.len() as f64);
        let axis = Unit::try_new(newell_normal(&self.points), 1e-12)?;
        let radius = self.points.iter().map(|p| (p - center).norm()).sum::<f64>()
            / self.points.len() as f64;
        let round = self.points.iter().all(|p| {
            ((p - center).norm() - radius).abs() <= tolerance.max(radius * 1e-6)
                && (p - center).dot(&*axis).abs() <= tolerance.max(radius * 1e-6)
        });
        round.then_some((center, axis, radius))
    }
}

/// Snapshot of a solid's faces and edges
#[derive(Debug, Clone, Default)]
pub struct Topology {
    faces: Vec<Face>,
    edges: Vec<Edge>,
}

impl Topology {
    /// Extract faces and edges, welding vertices within `tolerance`
    pub fn of(solid: &Solid, tolerance: f64) -> Self {
        let polygons = solid.polygons();
        if polygons.is_empty() {
            return Self::default();
        }

        let mut grouped: BTreeMap<FaceId, Vec<usize>> = BTreeMap::new();
        for (index, polygon) in polygons.iter().enumerate() {
            grouped.entry(polygon.face).or_default().push(index);
        }

        let faces = grouped
            .iter()
            .map(|(&id, members)| {
                let mut area = 0.0;
                let mut weighted = Vector3::zeros();
                for &i in members {
                    for [a, b, c] in polygons[i].triangles() {
                        let t = (b - a).cross(&(c - a)).norm() / 2.0;
                        area += t;
                        weighted += (a.coords + b.coords + c.coords) * (t / 3.0);
                    }
                }
                let first = &polygons[members[0]].plane;
                let planar = members
                    .iter()
                    .all(|&i| polygons[i].plane.coincides(first, tolerance));
                let centroid = if area > 0.0 {
                    Point3::from(weighted / area)
                } else {
                    polygons[members[0]].centroid()
                };
                Face {
                    id,
                    label: solid.label(id).map(str::to_string),
                    area,
                    centroid,
                    normal: planar.then_some(first.normal),
                }
            })
            .collect::<Vec<_>>();

        let planar: AHashMap<FaceId, bool> = faces.iter().map(|f| (f.id, f.is_planar())).collect();
        let edges = extract_edges(solid, tolerance, &planar);
        Self { faces, edges }
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.iter().find(|f| f.id == id)
    }

    /// Edges bounding a face
    pub fn edges_of(&self, face: FaceId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.touches(face))
    }

    /// Edges with an end point within `tolerance` of `p`
    pub fn edges_at<'a>(&'a self, p: &'a Point3<f64>, tolerance: f64) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| {
            !e.closed && ((e.start() - p).norm() <= tolerance || (e.end() - p).norm() <= tolerance)
        })
    }
}

fn extract_edges(solid: &Solid, tolerance: f64, planar: &AHashMap<FaceId, bool>) -> Vec<Edge> {
    let polygons = solid.polygons();
    let mesh = weld(polygons, tolerance);

    // directed edge -> face owning it
    let mut directed: AHashMap<(usize, usize), FaceId> = AHashMap::new();
    for (ring, &source) in mesh.loops.iter().zip(&mesh.source) {
        let n = ring.len();
        for k in 0..n {
            let (a, b) = (ring[k], ring[(k + 1) % n]);
            if a != b {
                directed.entry((a, b)).or_insert(polygons[source].face);
            }
        }
    }

    // Segments per face pair, oriented as they run around the lower face id
    let mut by_pair: BTreeMap<(FaceId, FaceId), Vec<(usize, usize)>> = BTreeMap::new();
    for (&(a, b), &face) in &directed {
        let Some(&other) = directed.get(&(b, a)) else {
            continue;
        };
        if face < other {
            by_pair.entry((face, other)).or_default().push((a, b));
        }
    }

    let mut edges = Vec::new();
    for ((f, g), mut segments) in by_pair {
        segments.sort_unstable();
        let both_planar = planar.get(&f).copied().unwrap_or(false) && planar.get(&g).copied().unwrap_or(false);
        for (chain, closed) in chain_segments(&segments) {
            let points: Vec<Point3<f64>> = chain.iter().map(|&i| mesh.points[i]).collect();
            if both_planar && !closed {
                for piece in split_at_corners(&points) {
                    edges.push(make_edge([f, g], piece, false, tolerance));
                }
            } else {
                edges.push(make_edge([f, g], points, closed, tolerance));
            }
        }
    }
    edges
}

/// Link directed segments into maximal chains
fn chain_segments(segments: &[(usize, usize)]) -> Vec<(Vec<usize>, bool)> {
    let mut next: AHashMap<usize, usize> = AHashMap::new();
    let mut has_incoming: AHashMap<usize, bool> = AHashMap::new();
    for &(a, b) in segments {
        next.entry(a).or_insert(b);
        has_incoming.insert(b, true);
    }

    let mut used: AHashMap<usize, bool> = AHashMap::new();
    let mut chains = Vec::new();

    let mut starts: Vec<usize> = segments
        .iter()
        .map(|&(a, _)| a)
        .filter(|a| !has_incoming.contains_key(a))
        .collect();
    starts.dedup();
    for start in starts {
        let mut chain = vec![start];
        let mut current = start;
        while let Some(&to) = next.get(&current) {
            if used.insert(current, true).is_some() {
                break;
            }
            chain.push(to);
            current = to;
        }
        chains.push((chain, false));
    }

    for &(a, _) in segments {
        if used.contains_key(&a) {
            continue;
        }
        let mut chain = vec![a];
        let mut current = a;
        let mut closed = false;
        while let Some(&to) = next.get(&current) {
            used.insert(current, true);
            if to == a {
                closed = true;
                break;
            }
            if used.contains_key(&to) {
                chain.push(to);
                break;
            }
            chain.push(to);
            current = to;
        }
        chains.push((chain, closed));
    }
    chains
}

/// Split an open polyline wherever it turns
fn split_at_corners(points: &[Point3<f64>]) -> Vec<Vec<Point3<f64>>> {
    let mut pieces = Vec::new();
    let mut current = vec![points[0]];
    for i in 1..points.len() {
        current.push(points[i]);
        if i + 1 < points.len() {
            let incoming = (points[i] - points[i - 1]).normalize();
            let outgoing = (points[i + 1] - points[i]).normalize();
            if incoming.dot(&outgoing) < 1.0 - 1e-6 {
                pieces.push(std::mem::replace(&mut current, vec![points[i]]));
            }
        }
    }
    pieces.push(current);
    pieces
}

fn make_edge(faces: [FaceId; 2], points: Vec<Point3<f64>>, closed: bool, tolerance: f64) -> Edge {
    let n = points.len();
    let count = if closed { n } else { n.saturating_sub(1) };
    let length = (0..count).map(|i| (points[(i + 1) % n] - points[i]).norm()).sum();
    let straight = !closed && {
        let (a, b) = (points[0], points[n - 1]);
        points
            .iter()
            .all(|p| point_segment_distance(p, &a, &b).0 <= tolerance)
    };
    // Collinear interior points carry no shape
    let points = if straight { vec![points[0], points[n - 1]] } else { points };
    Edge {
        faces,
        points,
        closed,
        straight,
        length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    #[test]
    fn test_box_topology() {
        let solid = Primitive::cuboid(Vector3::new(1.0, 2.0, 3.0), [false; 3])
            .to_solid()
            .unwrap();
        let topology = Topology::of(&solid, 1e-9);
        assert_eq!(topology.faces().len(), 6);
        assert_eq!(topology.edges().len(), 12);
        assert!(topology.edges().iter().all(|e| e.straight && !e.closed));
        let total: f64 = topology.edges().iter().map(|e| e.length).sum();
        assert!((total - 4.0 * 6.0).abs() < 1e-9);
        assert!(topology.faces().iter().all(Face::is_planar));
        let corner = Point3::new(0.0, 0.0, 0.0);
        assert_eq!(topology.edges_at(&corner, 1e-9).count(), 3);
    }

    #[test]
    fn test_cylinder_rims_are_circles() {
        let solid = Primitive::cylinder(2.0, 5.0, 48).to_solid().unwrap();
        let topology = Topology::of(&solid, 1e-9);
        assert_eq!(topology.faces().len(), 3);
        assert_eq!(topology.edges().len(), 2);
        for edge in topology.edges() {
            assert!(edge.closed);
            let (center, axis, radius) = edge.as_circle(1e-9).unwrap();
            assert!((radius - 2.0).abs() < 1e-9);
            assert!(axis.z.abs() > 0.999);
            assert!(center.x.abs() < 1e-9 && center.y.abs() < 1e-9);
        }
        let lateral = topology.faces().iter().find(|f| f.id == 0).unwrap();
        assert!(!lateral.is_planar());
    }

    #[test]
    fn test_edge_midpoint() {
        let edge = make_edge(
            [0, 1],
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0)],
            false,
            1e-9,
        );
        assert!(edge.straight);
        assert!((edge.midpoint() - Point3::new(2.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((edge.direction().unwrap() - Vector3::x()).norm() < 1e-12);
    }
}
