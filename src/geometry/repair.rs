// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Welding, T-junction repair and closure checks for polygon soups

use super::polygon::Polygon;
use crate::utils::math::point_segment_distance;
use ahash::AHashMap;
use nalgebra::Point3;
use tracing::debug;

/// Polygons sharing a welded vertex table
#[derive(Debug, Clone, Default)]
pub(crate) struct IndexedPolygons {
    pub points: Vec<Point3<f64>>,
    pub loops: Vec<Vec<usize>>,
    /// Index of the source polygon each loop came from
    pub source: Vec<usize>,
}

type Cell = (i64, i64, i64);

fn cell_of(p: &Point3<f64>, size: f64) -> Cell {
    (
        (p.x / size).floor() as i64,
        (p.y / size).floor() as i64,
        (p.z / size).floor() as i64,
    )
}

/// Merge vertices closer than `tolerance`; the first vertex seen wins
pub(crate) fn weld(polygons: &[Polygon], tolerance: f64) -> IndexedPolygons {
    let mut grid: AHashMap<Cell, Vec<usize>> = AHashMap::new();
    let mut indexed = IndexedPolygons::default();
    let cell_size = tolerance * 2.0;

    for (source, polygon) in polygons.iter().enumerate() {
        let mut ring = Vec::with_capacity(polygon.vertices.len());
        for p in &polygon.vertices {
            let (cx, cy, cz) = cell_of(p, cell_size);
            let mut found = None;
            'search: for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        if let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) {
                            if let Some(&hit) = bucket
                                .iter()
                                .find(|&&i| (indexed.points[i] - p).norm() <= tolerance)
                            {
                                found = Some(hit);
                                break 'search;
                            }
                        }
                    }
                }
            }
            let index = found.unwrap_or_else(|| {
                let index = indexed.points.len();
                indexed.points.push(*p);
                grid.entry((cx, cy, cz)).or_default().push(index);
                index
            });
            ring.push(index);
        }
        indexed.loops.push(ring);
        indexed.source.push(source);
    }

    indexed
}

/// Insert welded vertices that lie on the interior of another loop's edge
///
/// Returns the number of insertions.
pub(crate) fn insert_t_junctions(mesh: &mut IndexedPolygons, tolerance: f64) -> usize {
    let mut order: Vec<usize> = (0..mesh.points.len()).collect();
    order.sort_by(|&a, &b| mesh.points[a].x.total_cmp(&mesh.points[b].x));
    let xs: Vec<f64> = order.iter().map(|&i| mesh.points[i].x).collect();

    let mut inserted = 0;
    for ring in &mut mesh.loops {
        let mut rebuilt = Vec::with_capacity(ring.len());
        let n = ring.len();
        for k in 0..n {
            let (a, b) = (ring[k], ring[(k + 1) % n]);
            rebuilt.push(a);
            let (pa, pb) = (mesh.points[a], mesh.points[b]);
            let length = (pb - pa).norm();
            if length <= tolerance * 2.0 {
                continue;
            }
            let lo = pa.x.min(pb.x) - tolerance;
            let hi = pa.x.max(pb.x) + tolerance;
            let (ylo, yhi) = (pa.y.min(pb.y) - tolerance, pa.y.max(pb.y) + tolerance);
            let (zlo, zhi) = (pa.z.min(pb.z) - tolerance, pa.z.max(pb.z) + tolerance);

            let start = xs.partition_point(|&x| x < lo);
            let mut on_edge: Vec<(f64, usize)> = Vec::new();
            for &candidate in order[start..].iter().take_while(|&&i| mesh.points[i].x <= hi) {
                if candidate == a || candidate == b {
                    continue;
                }
                let p = mesh.points[candidate];
                if p.y < ylo || p.y > yhi || p.z < zlo || p.z > zhi {
                    continue;
                }
                let (distance, t) = point_segment_distance(&p, &pa, &pb);
                if distance <= tolerance && t * length > tolerance && (1.0 - t) * length > tolerance {
                    on_edge.push((t, candidate));
                }
            }
            on_edge.sort_by(|x, y| x.0.total_cmp(&y.0));
            on_edge.dedup_by_key(|entry| entry.1);
            inserted += on_edge.len();
            rebuilt.extend(on_edge.into_iter().map(|(_, index)| index));
        }
        *ring = rebuilt;
    }

    if inserted > 0 {
        debug!(inserted, "repaired T-junctions");
    }
    inserted
}

/// Drop repeated vertices and zero-width spikes; returns false when the loop collapsed
pub(crate) fn simplify_loop(ring: &mut Vec<usize>) -> bool {
    loop {
        let before = ring.len();
        ring.dedup();
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        let n = ring.len();
        if n < 3 {
            return false;
        }
        if let Some(i) = (0..n).find(|&i| ring[(i + n - 1) % n] == ring[(i + 1) % n]) {
            // a -> b -> a: drop the spike tip and one copy of its base
            let next = (i + 1) % n;
            let (first, second) = if i > next { (i, next) } else { (next, i) };
            ring.remove(first);
            ring.remove(second);
        }
        if ring.len() == before {
            return ring.len() >= 3;
        }
    }
}

/// Uses of every undirected edge, as (low → high, high → low) counts
fn edge_uses(loops: &[Vec<usize>]) -> AHashMap<(usize, usize), (u32, u32)> {
    let mut uses: AHashMap<(usize, usize), (u32, u32)> = AHashMap::new();
    for ring in loops {
        let n = ring.len();
        for k in 0..n {
            let (a, b) = (ring[k], ring[(k + 1) % n]);
            if a < b {
                uses.entry((a, b)).or_insert((0, 0)).0 += 1;
            } else {
                uses.entry((b, a)).or_insert((0, 0)).1 += 1;
            }
        }
    }
    uses
}

fn sorted_edges(
    uses: AHashMap<(usize, usize), (u32, u32)>,
    keep: impl Fn(u32, u32) -> bool,
) -> Vec<(usize, usize)> {
    let mut edges: Vec<(usize, usize)> = uses
        .into_iter()
        .filter(|&(_, (forward, backward))| keep(forward, backward))
        .map(|(edge, _)| edge)
        .collect();
    edges.sort_unstable();
    edges
}

/// Directed edges whose reverse does not occur equally often
pub(crate) fn open_edges(loops: &[Vec<usize>]) -> Vec<(usize, usize)> {
    sorted_edges(edge_uses(loops), |forward, backward| forward != backward)
}

/// Balanced edges shared by more than one pair of faces
pub(crate) fn non_manifold_edges(loops: &[Vec<usize>]) -> Vec<(usize, usize)> {
    sorted_edges(edge_uses(loops), |forward, backward| forward == backward && forward != 1)
}

/// Every edge is used exactly once in each direction
pub(crate) fn is_two_manifold(loops: &[Vec<usize>]) -> bool {
    edge_uses(loops).values().all(|&uses| uses == (1, 1))
}

/// Number of edge-connected shells
pub(crate) fn connected_components(mesh: &IndexedPolygons) -> usize {
    let mut parent: Vec<usize> = (0..mesh.loops.len()).collect();
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut owner: AHashMap<(usize, usize), usize> = AHashMap::new();
    for (index, ring) in mesh.loops.iter().enumerate() {
        let n = ring.len();
        for k in 0..n {
            let (a, b) = (ring[k], ring[(k + 1) % n]);
            let key = (a.min(b), a.max(b));
            if let Some(&other) = owner.get(&key) {
                let (ra, rb) = (find(&mut parent, index), find(&mut parent, other));
                if ra != rb {
                    parent[ra] = rb;
                }
            } else {
                owner.insert(key, index);
            }
        }
    }

    (0..mesh.loops.len())
        .filter(|&i| find(&mut parent, i) == i)
        .count()
}

/// Weld, repair T-junctions and rebuild clean polygons
///
/// Returns the cleaned polygons together with the welded index structure
/// they were rebuilt from.
pub(crate) fn repair(polygons: Vec<Polygon>, tolerance: f64) -> (Vec<Polygon>, IndexedPolygons) {
    let mut mesh = weld(&polygons, tolerance);
    insert_t_junctions(&mut mesh, tolerance);

    let mut cleaned = Vec::with_capacity(polygons.len());
    let mut kept = IndexedPolygons {
        points: mesh.points.clone(),
        ..IndexedPolygons::default()
    };
    let mut dropped = 0usize;
    for (mut ring, source) in mesh.loops.into_iter().zip(mesh.source) {
        if !simplify_loop(&mut ring) {
            dropped += 1;
            continue;
        }
        let original = &polygons[source];
        let vertices: Vec<Point3<f64>> = ring.iter().map(|&i| mesh.points[i]).collect();
        // Welding moves vertices by less than the tolerance, so the source plane still holds
        cleaned.push(Polygon::with_plane(vertices, original.plane, original.face));
        kept.loops.push(ring);
        kept.source.push(cleaned.len() - 1);
    }

    if dropped > 0 {
        debug!(dropped, "dropped collapsed polygons");
    }
    (cleaned, kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(points: [[f64; 3]; 4], face: u32) -> Polygon {
        Polygon::new(points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect(), face).unwrap()
    }

    #[test]
    fn test_weld_merges_close_points() {
        let a = quad([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]], 0);
        let b = quad([[1.0 + 1e-9, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 1.0, 0.0], [1.0, 1.0 - 1e-9, 0.0]], 1);
        let mesh = weld(&[a, b], 1e-6);
        assert_eq!(mesh.points.len(), 6);
        assert_eq!(mesh.loops[1][0], mesh.loops[0][1]);
    }

    #[test]
    fn test_t_junction_inserted() {
        // Two small quads on top of one long edge
        let long = quad([[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 0.0, 1.0], [0.0, 0.0, 1.0]], 0);
        let left = quad([[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]], 1);
        let right = quad([[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [2.0, 1.0, 0.0], [2.0, 0.0, 0.0]], 2);
        let mut mesh = weld(&[long, left, right], 1e-9);
        assert_eq!(insert_t_junctions(&mut mesh, 1e-9), 1);
        assert_eq!(mesh.loops[0].len(), 5);
    }

    #[test]
    fn test_simplify_spike() {
        let mut ring = vec![0, 1, 2, 1];
        assert!(!simplify_loop(&mut ring));
        let mut ring = vec![0, 1, 1, 2, 3, 0];
        assert!(simplify_loop(&mut ring));
        assert_eq!(ring, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_open_edges_of_lone_quad() {
        let open = open_edges(&[vec![0, 1, 2, 3]]);
        assert_eq!(open.len(), 4);
        assert!(open_edges(&[vec![0, 1, 2], vec![0, 2, 1]]).is_empty());
    }

    #[test]
    fn test_edge_shared_by_four_faces() {
        // Two tetrahedra-like fans meeting only along edge 0-1
        let loops = vec![vec![0, 1, 2], vec![1, 0, 3], vec![0, 1, 4], vec![1, 0, 5]];
        assert!(open_edges(&loops).iter().all(|&edge| edge != (0, 1)));
        assert_eq!(non_manifold_edges(&loops), vec![(0, 1)]);
        assert!(!is_two_manifold(&loops));
        assert!(is_two_manifold(&[vec![0, 1, 2], vec![0, 2, 1]]));
    }
}
