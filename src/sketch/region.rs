// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planar regions: an outer wire with optional holes

use super::wire::Wire;
use crate::config::TessellationConfig;
use crate::error::{ModelingError, ModelingResult};
use crate::geometry::Plane;
use crate::utils::math::{segments_cross_2d, signed_area_2d};
use nalgebra::Point2;

/// Outline points labelled with the index of the edge leaving them
pub(crate) type Outline = Vec<(Point2<f64>, usize)>;

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    outer: Wire,
    holes: Vec<Wire>,
}

fn contains(polygon: &[Point2<f64>], p: &Point2<f64>) -> bool {
    let mut inside = false;
    let n = polygon.len();
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[(i + 1) % n]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }
    inside
}

fn loops_cross(a: &[Point2<f64>], b: &[Point2<f64>]) -> bool {
    let (n, m) = (a.len(), b.len());
    (0..n).any(|i| {
        (0..m).any(|j| segments_cross_2d(&a[i], &a[(i + 1) % n], &b[j], &b[(j + 1) % m], 1e-12))
    })
}

impl Region {
    pub fn new(outer: Wire) -> ModelingResult<Self> {
        outer.require_closed("region")?;
        Ok(Self {
            outer,
            holes: Vec::new(),
        })
    }

    /// Ring between two concentric circles
    pub fn annulus(plane: Plane, center: Point2<f64>, outer_radius: f64, inner_radius: f64) -> ModelingResult<Self> {
        if !(inner_radius < outer_radius) {
            return Err(ModelingError::invalid_parameter(
                "annulus",
                format!("inner radius {inner_radius} must be smaller than outer radius {outer_radius}"),
            ));
        }
        Self::new(Wire::circle(plane, center, outer_radius)?)?
            .with_hole(Wire::circle(plane, center, inner_radius)?)
    }

    /// Add a hole; it must be closed, coplanar and strictly inside the outer wire
    pub fn with_hole(mut self, hole: Wire) -> ModelingResult<Self> {
        const OP: &str = "region";
        hole.require_closed(OP)?;
        let tess = TessellationConfig::default();
        let plane = self.outer.plane();
        let scale = self
            .outer
            .points(&tess)
            .iter()
            .map(|p| p.coords.norm())
            .fold(1.0, f64::max);
        if !plane.is_coplanar(hole.plane(), 1e-9 * scale) {
            return Err(ModelingError::malformed_wire(OP, "hole is not in the plane of the outer wire"));
        }

        let outer = self.outer.points(&tess);
        let local = self.localize(&hole, &tess);
        if !local.iter().all(|p| contains(&outer, p)) || loops_cross(&outer, &local) {
            return Err(ModelingError::malformed_wire(OP, "hole is not inside the outer wire"));
        }
        for existing in &self.holes {
            let other = self.localize(existing, &tess);
            if loops_cross(&other, &local) || contains(&other, &local[0]) || contains(&local, &other[0]) {
                return Err(ModelingError::malformed_wire(OP, "holes overlap"));
            }
        }
        self.holes.push(hole);
        Ok(self)
    }

    fn localize(&self, wire: &Wire, tessellation: &TessellationConfig) -> Vec<Point2<f64>> {
        wire.world_points(tessellation)
            .iter()
            .map(|p| self.outer.plane().to_local(p))
            .collect()
    }

    pub fn plane(&self) -> &Plane {
        self.outer.plane()
    }

    pub fn outer(&self) -> &Wire {
        &self.outer
    }

    pub fn holes(&self) -> &[Wire] {
        &self.holes
    }

    /// Outer wire counter-clockwise and holes clockwise, judged in the outer plane's frame
    pub(crate) fn oriented(&self, tessellation: &TessellationConfig) -> (Wire, Vec<Wire>) {
        let oriented = |wire: &Wire, ccw: bool| {
            if (wire.signed_area(tessellation) > 0.0) == ccw {
                wire.clone()
            } else {
                wire.reversed()
            }
        };
        let holes = self
            .holes
            .iter()
            .map(|hole| {
                // The hole's own plane may face the other way
                let same_side = hole.plane().normal().dot(&self.plane().normal()) > 0.0;
                oriented(hole, !same_side)
            })
            .collect();
        (oriented(&self.outer, true), holes)
    }

    /// Oriented loops with every point in the outer plane's frame
    pub(crate) fn loops(&self, tessellation: &TessellationConfig) -> (Outline, Vec<Outline>) {
        let (outer, holes) = self.oriented(tessellation);
        let holes = holes
            .iter()
            .map(|hole| {
                hole.outline(tessellation)
                    .into_iter()
                    .map(|(p, edge)| (self.plane().to_local(&hole.plane().to_world(p)), edge))
                    .collect()
            })
            .collect();
        (outer.outline(tessellation), holes)
    }

    pub fn area(&self, tessellation: &TessellationConfig) -> f64 {
        let (outer, holes) = self.loops(tessellation);
        let points = |outline: &Outline| outline.iter().map(|(p, _)| *p).collect::<Vec<_>>();
        signed_area_2d(&points(&outer)) + holes.iter().map(|h| signed_area_2d(&points(h))).sum::<f64>()
    }

    /// Counter-clockwise triangles over the outer and hole points, in that order
    pub fn triangulate(&self, tessellation: &TessellationConfig) -> ModelingResult<(Vec<Point2<f64>>, Vec<[usize; 3]>)> {
        let (outer, holes) = self.loops(tessellation);
        let mut points: Vec<Point2<f64>> = outer.iter().map(|(p, _)| *p).collect();
        let mut hole_starts = Vec::with_capacity(holes.len());
        for hole in &holes {
            hole_starts.push(points.len());
            points.extend(hole.iter().map(|(p, _)| *p));
        }

        let triangles = triangulate_points(&points, &hole_starts)?;
        Ok((points, triangles))
    }
}

/// Ear-clip a loop (plus holes starting at `hole_starts`) into counter-clockwise triangles
pub(crate) fn triangulate_points(points: &[Point2<f64>], hole_starts: &[usize]) -> ModelingResult<Vec<[usize; 3]>> {
    let flat: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcutr::earcut(&flat, hole_starts, 2).map_err(|e| {
        ModelingError::malformed_wire("triangulate", format!("region could not be triangulated: {e:?}"))
    })?;

    Ok(indices
        .chunks_exact(3)
        .filter_map(|t| {
            let (a, b, c) = (t[0], t[1], t[2]);
            let turn = (points[b] - points[a]).perp(&(points[c] - points[a]));
            if turn > 0.0 {
                Some([a, b, c])
            } else if turn < 0.0 {
                Some([a, c, b])
            } else {
                None
            }
        })
        .collect())
}
