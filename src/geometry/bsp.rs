// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! BSP tree used by the boolean engine
//!
//! Nodes live in a flat arena so building, clipping and inverting never
//! recurse; deep trees from finely tessellated solids stay off the stack.

use super::polygon::{split_polygon, Polygon, SplitBuckets, SurfacePlane};

#[derive(Debug, Clone, Default)]
struct BspNode {
    plane: Option<SurfacePlane>,
    front: Option<usize>,
    back: Option<usize>,
    polygons: Vec<Polygon>,
}

/// Binary space partition over a polygon set
#[derive(Debug, Clone)]
pub(crate) struct BspTree {
    nodes: Vec<BspNode>,
    epsilon: f64,
}

impl BspTree {
    pub fn new(polygons: Vec<Polygon>, epsilon: f64) -> Self {
        let mut tree = Self {
            nodes: vec![BspNode::default()],
            epsilon,
        };
        tree.build(polygons);
        tree
    }

    fn child(&mut self, index: usize, front: bool) -> usize {
        let existing = if front {
            self.nodes[index].front
        } else {
            self.nodes[index].back
        };
        if let Some(child) = existing {
            return child;
        }
        let child = self.nodes.len();
        self.nodes.push(BspNode::default());
        if front {
            self.nodes[index].front = Some(child);
        } else {
            self.nodes[index].back = Some(child);
        }
        child
    }

    /// Insert polygons, extending the existing partition
    pub fn build(&mut self, polygons: Vec<Polygon>) {
        let mut pending = vec![(0usize, polygons)];
        while let Some((index, polygons)) = pending.pop() {
            let Some(first) = polygons.first() else {
                continue;
            };
            let plane = *self.nodes[index].plane.get_or_insert(first.plane);

            let mut out = SplitBuckets::default();
            for polygon in polygons {
                split_polygon(&plane, polygon, self.epsilon, &mut out);
            }
            let node = &mut self.nodes[index];
            node.polygons.append(&mut out.coplanar_front);
            node.polygons.append(&mut out.coplanar_back);

            if !out.front.is_empty() {
                let child = self.child(index, true);
                pending.push((child, out.front));
            }
            if !out.back.is_empty() {
                let child = self.child(index, false);
                pending.push((child, out.back));
            }
        }
    }

    /// Remove the parts of `polygons` that lie inside this tree's solid
    pub fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let mut kept = Vec::new();
        let mut pending = vec![(0usize, polygons)];
        while let Some((index, polygons)) = pending.pop() {
            let node = &self.nodes[index];
            let Some(plane) = node.plane else {
                kept.extend(polygons);
                continue;
            };

            let mut out = SplitBuckets::default();
            for polygon in polygons {
                split_polygon(&plane, polygon, self.epsilon, &mut out);
            }
            let mut front = out.front;
            front.append(&mut out.coplanar_front);
            let mut back = out.back;
            back.append(&mut out.coplanar_back);

            match node.front {
                Some(child) => pending.push((child, front)),
                None => kept.extend(front),
            }
            if let Some(child) = node.back {
                pending.push((child, back));
            }
        }
        kept
    }

    /// Clip every polygon of this tree against `other`
    pub fn clip_to(&mut self, other: &BspTree) {
        for node in &mut self.nodes {
            let polygons = std::mem::take(&mut node.polygons);
            node.polygons = other.clip_polygons(polygons);
        }
    }

    /// Swap inside and outside
    pub fn invert(&mut self) {
        for node in &mut self.nodes {
            for polygon in &mut node.polygons {
                polygon.flip();
            }
            if let Some(plane) = node.plane.as_mut() {
                *plane = plane.flipped();
            }
            std::mem::swap(&mut node.front, &mut node.back);
        }
    }

    pub fn into_polygons(self) -> Vec<Polygon> {
        self.nodes.into_iter().flat_map(|node| node.polygons).collect()
    }
}

/// A ∪ B
pub(crate) fn union(a: Vec<Polygon>, b: Vec<Polygon>, epsilon: f64) -> Vec<Polygon> {
    let mut a = BspTree::new(a, epsilon);
    let mut b = BspTree::new(b, epsilon);
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.into_polygons());
    a.into_polygons()
}

/// A − B
pub(crate) fn difference(a: Vec<Polygon>, b: Vec<Polygon>, epsilon: f64) -> Vec<Polygon> {
    let mut a = BspTree::new(a, epsilon);
    let mut b = BspTree::new(b, epsilon);
    a.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    b.invert();
    b.clip_to(&a);
    b.invert();
    a.build(b.into_polygons());
    a.invert();
    a.into_polygons()
}

/// A ∩ B
pub(crate) fn intersection(a: Vec<Polygon>, b: Vec<Polygon>, epsilon: f64) -> Vec<Polygon> {
    let mut a = BspTree::new(a, epsilon);
    let mut b = BspTree::new(b, epsilon);
    a.invert();
    b.clip_to(&a);
    b.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    a.build(b.into_polygons());
    a.invert();
    a.into_polygons()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn cube_polygons(min: [f64; 3], size: f64) -> Vec<Polygon> {
        let [x0, y0, z0] = min;
        let (x1, y1, z1) = (x0 + size, y0 + size, z0 + size);
        let p = |x, y, z| Point3::new(x, y, z);
        let quads = [
            [p(x0, y0, z0), p(x0, y1, z0), p(x1, y1, z0), p(x1, y0, z0)],
            [p(x0, y0, z1), p(x1, y0, z1), p(x1, y1, z1), p(x0, y1, z1)],
            [p(x0, y0, z0), p(x1, y0, z0), p(x1, y0, z1), p(x0, y0, z1)],
            [p(x0, y1, z0), p(x0, y1, z1), p(x1, y1, z1), p(x1, y1, z0)],
            [p(x0, y0, z0), p(x0, y0, z1), p(x0, y1, z1), p(x0, y1, z0)],
            [p(x1, y0, z0), p(x1, y1, z0), p(x1, y1, z1), p(x1, y0, z1)],
        ];
        quads
            .iter()
            .enumerate()
            .filter_map(|(i, q)| Polygon::new(q.to_vec(), i as u32))
            .collect()
    }

    fn volume(polygons: &[Polygon]) -> f64 {
        polygons.iter().map(Polygon::signed_volume).sum()
    }

    #[test]
    fn test_overlapping_cubes() {
        let a = cube_polygons([0.0, 0.0, 0.0], 2.0);
        let b = cube_polygons([1.0, 1.0, 1.0], 2.0);
        let eps = 1e-9;
        assert!((volume(&union(a.clone(), b.clone(), eps)) - 15.0).abs() < 1e-9);
        assert!((volume(&difference(a.clone(), b.clone(), eps)) - 7.0).abs() < 1e-9);
        assert!((volume(&intersection(a, b, eps)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_self_difference_is_empty() {
        let a = cube_polygons([0.0, 0.0, 0.0], 2.0);
        assert!(difference(a.clone(), a, 1e-9).is_empty());
    }

    #[test]
    fn test_self_intersection_is_identity() {
        let a = cube_polygons([0.0, 0.0, 0.0], 2.0);
        let result = intersection(a.clone(), a, 1e-9);
        assert!((volume(&result) - 8.0).abs() < 1e-9);
    }
}
