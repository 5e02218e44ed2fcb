// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rounding and bevelling of solid edges
//!
//! A convex edge loses a cutter swept along it, a concave edge gains a
//! filler. The tool's cross-section is bounded by the blend surface on one
//! side and by the two faces, pushed out by a small margin, on the other.
//! Every selected edge is checked against the unmodified solid before any
//! tool is cut.

use super::skin;
use crate::config::{ModelingConfig, TessellationConfig};
use crate::error::{require_positive, ModelingError, ModelingResult};
use crate::geometry::{perform_boolean_operation, BooleanOp, Edge, FaceId, Solid, Topology};
use crate::select::EdgeSet;
use nalgebra::{Point3, Unit, Vector3};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Blend {
    Round(f64),
    Bevel(f64),
}

impl Blend {
    fn operation(&self) -> &'static str {
        match self {
            Self::Round(_) => "fillet",
            Self::Bevel(_) => "chamfer",
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Round(r) => format!("radius {r}"),
            Self::Bevel(d) => format!("distance {d}"),
        }
    }

    /// Distance from the edge to where the blend meets each face
    fn setback(&self, opening: f64) -> f64 {
        match *self {
            Self::Round(r) => r * (opening / 2.0).tan(),
            Self::Bevel(d) => d,
        }
    }
}

/// Local geometry of a corner between two planar faces
#[derive(Debug, Clone, Copy)]
struct Corner {
    apex: Point3<f64>,
    normals: [Vector3<f64>; 2],
    convex: bool,
}

impl Corner {
    /// Angle between the face normals; zero for coplanar faces
    fn opening(&self) -> f64 {
        self.normals[0].dot(&self.normals[1]).clamp(-1.0, 1.0).acos()
    }

    /// Cross-section loop of the tool and which of its edges lie on the blend
    fn section(&self, blend: Blend, margin: f64, tessellation: &TessellationConfig) -> (Vec<Point3<f64>>, Vec<bool>) {
        let [n1, n2] = self.normals;
        let k = n1.dot(&n2);
        let opening = self.opening();
        let sigma = if self.convex { 1.0 } else { -1.0 };
        let setback = blend.setback(opening);
        let bisector = (n1 + n2) / (1.0 + k);
        let e1 = (n1 * k - n2) * (sigma / opening.sin());
        let e2 = (n2 * k - n1) * (sigma / opening.sin());
        let p = self.apex;
        let t1 = p + e1 * setback;
        let t2 = p + e2 * setback;

        let mut ring = vec![p + bisector * (sigma * margin), t1 + n1 * (sigma * margin), t1];
        let mut flags = vec![false, false];
        if let Blend::Round(radius) = blend {
            let center = p - bisector * (sigma * radius);
            let w = (n2 - n1 * k) / opening.sin();
            let steps = tessellation.segments_for_angle(opening);
            for i in 1..steps {
                let t = opening * i as f64 / steps as f64;
                ring.push(center + (n1 * t.cos() + w * t.sin()) * (sigma * radius));
                flags.push(true);
            }
        }
        flags.push(true);
        ring.extend([t2, t2 + n2 * (sigma * margin)]);
        flags.extend([false, false]);
        (ring, flags)
    }
}

/// Round the selected edges with `radius`
pub fn fillet(solid: &Solid, edges: &EdgeSet, radius: f64, config: &ModelingConfig) -> ModelingResult<Solid> {
    require_positive("fillet", "radius", radius)?;
    blend_edges(solid, edges, Blend::Round(radius), config)
}

/// Bevel the selected edges, cutting back `distance` along each face
pub fn chamfer(solid: &Solid, edges: &EdgeSet, distance: f64, config: &ModelingConfig) -> ModelingResult<Solid> {
    require_positive("chamfer", "distance", distance)?;
    blend_edges(solid, edges, Blend::Bevel(distance), config)
}

/// Planned tool for one edge
enum Tool {
    Straight {
        corner: Corner,
        direction: Vector3<f64>,
        length: f64,
    },
    Rim {
        corner: Corner,
        center: Point3<f64>,
        axis: Unit<Vector3<f64>>,
        points: Vec<Point3<f64>>,
    },
}

fn blend_edges(solid: &Solid, edges: &EdgeSet, blend: Blend, config: &ModelingConfig) -> ModelingResult<Solid> {
    let operation = blend.operation();
    let diagonal = solid.bounding_box().diagonal();
    let tolerance = config.tolerance.weld_for(diagonal);
    let topology = Topology::of(solid, tolerance);

    let tools = edges
        .iter()
        .map(|edge| plan(solid, &topology, edge, blend, tolerance))
        .collect::<ModelingResult<Vec<_>>>()?;

    let mut cutters = Vec::new();
    let mut fillers = Vec::new();
    for tool in &tools {
        let (corner, body) = build_tool(tool, blend, diagonal, config)?;
        if corner.convex {
            cutters.push(body);
        } else {
            fillers.push(body);
        }
    }
    debug!(operation, cutters = cutters.len(), fillers = fillers.len(), "edge blend");

    let mut result = solid.clone();
    if let Some(cutter) = combine(cutters, config)? {
        result = perform_boolean_operation(&result, &cutter, BooleanOp::Subtract, config)?;
    }
    if let Some(filler) = combine(fillers, config)? {
        result = perform_boolean_operation(&result, &filler, BooleanOp::Union, config)?;
    }
    Ok(result)
}

fn combine(bodies: Vec<Solid>, config: &ModelingConfig) -> ModelingResult<Option<Solid>> {
    let mut bodies = bodies.into_iter();
    let Some(mut combined) = bodies.next() else {
        return Ok(None);
    };
    for body in bodies {
        combined = perform_boolean_operation(&combined, &body, BooleanOp::Union, config)?;
    }
    Ok(Some(combined))
}

fn point_text(p: &Point3<f64>) -> String {
    format!("({:.4}, {:.4}, {:.4})", p.x, p.y, p.z)
}

/// Check an edge against the material around it and describe its tool
fn plan(solid: &Solid, topology: &Topology, edge: &Edge, blend: Blend, tolerance: f64) -> ModelingResult<Tool> {
    let operation = blend.operation();
    let unsupported = |detail: String| ModelingError::Unsupported { operation, detail };
    let normal_of = |face: FaceId| topology.face(face).and_then(|f| f.normal);
    let midpoint = edge.midpoint();

    if edge.straight {
        let (Some(n1), Some(n2)) = (normal_of(edge.faces[0]), normal_of(edge.faces[1])) else {
            return Err(unsupported(format!(
                "edge at {} borders a curved face",
                point_text(&midpoint)
            )));
        };
        let Some(direction) = edge.direction() else {
            return Err(unsupported(format!("edge at {} has no length", point_text(&midpoint))));
        };
        let corner = corner_of(edge.start(), n1, n2, direction, operation)?;
        let setback = blend.setback(corner.opening());
        for end in [edge.start(), edge.end()] {
            let shortest = topology
                .edges_at(&end, tolerance)
                .filter(|other| !same_edge(other, edge, tolerance))
                .map(|other| other.length)
                .fold(f64::INFINITY, f64::min);
            if setback > shortest / 2.0 + tolerance {
                return Err(ModelingError::infeasible(
                    operation,
                    format!(
                        "{} needs a setback of {setback:.4} but the shortest edge meeting {} is {shortest:.4} long (limit {:.4})",
                        blend.describe(),
                        point_text(&end),
                        shortest / 2.0
                    ),
                ));
            }
        }
        return Ok(Tool::Straight {
            corner,
            direction,
            length: edge.length,
        });
    }

    let Some((center, axis, radius)) = edge.as_circle(tolerance) else {
        return Err(unsupported(format!(
            "curved edge at {} is not a circular rim",
            point_text(&midpoint)
        )));
    };
    let (cap, side) = match (normal_of(edge.faces[0]), normal_of(edge.faces[1])) {
        (Some(n), None) if n.cross(&*axis).norm() < 1e-6 => (0, 1),
        (None, Some(n)) if n.cross(&*axis).norm() < 1e-6 => (1, 0),
        _ => {
            return Err(unsupported(format!(
                "rim at {} does not join a flat cap to a cylindrical face",
                point_text(&center)
            )))
        }
    };

    // Radial outward direction of the side face at the first rim point
    let (p0, p1) = (edge.points[0], edge.points[1]);
    let facet = solid
        .polygons()
        .iter()
        .filter(|poly| poly.face == edge.faces[side])
        .find(|poly| {
            let near = |q: &Point3<f64>| poly.vertices.iter().any(|v| (v - q).norm() <= tolerance);
            near(&p0) && near(&p1)
        })
        .map(|poly| poly.plane.normal)
        .ok_or_else(|| unsupported(format!("rim at {} has no side facet", point_text(&center))))?;
    let radial = {
        let r = p0 - center;
        (r - axis.into_inner() * r.dot(&*axis)).normalize()
    };
    let outward = if facet.dot(&radial) >= 0.0 { radial } else { -radial };
    let cap_normal = normal_of(edge.faces[cap]).unwrap_or_else(|| axis.into_inner());

    let mut normals = [cap_normal, outward];
    if cap == 1 {
        normals.swap(0, 1);
    }
    let corner = corner_of(p0, normals[0], normals[1], p1 - p0, operation)?;
    let corner = Corner {
        normals: [cap_normal, outward],
        ..corner
    };

    let setback = blend.setback(corner.opening());
    if setback > radius + tolerance {
        return Err(ModelingError::infeasible(
            operation,
            format!(
                "{} needs a setback of {setback:.4} but the rim at {} has radius {radius:.4}",
                blend.describe(),
                point_text(&center)
            ),
        ));
    }
    let heights = solid
        .polygons()
        .iter()
        .filter(|poly| poly.face == edge.faces[side])
        .flat_map(|poly| poly.vertices.iter())
        .map(|v| (v - center).dot(&*axis));
    let (low, high) = heights.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), h| (lo.min(h), hi.max(h)));
    let extent = high - low;
    if setback > extent / 2.0 + tolerance {
        return Err(ModelingError::infeasible(
            operation,
            format!(
                "{} needs a setback of {setback:.4} but the face below the rim at {} is {extent:.4} tall (limit {:.4})",
                blend.describe(),
                point_text(&center),
                extent / 2.0
            ),
        ));
    }

    Ok(Tool::Rim {
        corner,
        center,
        axis,
        points: edge.points.clone(),
    })
}

/// Corner at `apex` where `direction` runs counter-clockwise around the first face
fn corner_of(
    apex: Point3<f64>,
    n1: Vector3<f64>,
    n2: Vector3<f64>,
    direction: Vector3<f64>,
    operation: &'static str,
) -> ModelingResult<Corner> {
    let turn = n1.cross(&n2);
    if turn.norm() < 1e-9 {
        return Err(ModelingError::Unsupported {
            operation,
            detail: format!("faces meet without a crease at {}", point_text(&apex)),
        });
    }
    Ok(Corner {
        apex,
        normals: [n1, n2],
        convex: turn.dot(&direction) > 0.0,
    })
}

fn same_edge(a: &Edge, b: &Edge, tolerance: f64) -> bool {
    let close = |p: Point3<f64>, q: Point3<f64>| (p - q).norm() <= tolerance;
    a.faces == b.faces && close(a.start(), b.start()) && close(a.end(), b.end())
}

/// Cutter or filler solid for one planned edge
fn build_tool(tool: &Tool, blend: Blend, diagonal: f64, config: &ModelingConfig) -> ModelingResult<(Corner, Solid)> {
    let operation = blend.operation();
    let tess = &config.tessellation;
    match tool {
        Tool::Straight {
            corner,
            direction,
            length,
        } => {
            let setback = blend.setback(corner.opening());
            let margin = (0.25 * setback).max(config.tolerance.epsilon_for(diagonal) * 100.0);
            let (section, flags) = corner.section(blend, margin, tess);
            // Cutters run past both ends; fillers stop flush with them
            let overrun = if corner.convex { margin } else { 0.0 };
            let start: Vec<Point3<f64>> = section.iter().map(|p| p - direction * overrun).collect();
            let end: Vec<Point3<f64>> = section.iter().map(|p| p + direction * (length + overrun)).collect();
            Ok((*corner, skin(operation, vec![start, end], &flags, false, operation, config)?))
        }
        Tool::Rim {
            corner,
            center,
            axis,
            points,
        } => {
            let setback = blend.setback(corner.opening());
            let margin = (0.25 * setback).max(config.tolerance.epsilon_for(diagonal) * 100.0);
            let (section, flags) = corner.section(blend, margin, tess);
            let a = axis.into_inner();
            let radial = |p: &Point3<f64>| {
                let r = p - center;
                (r - a * r.dot(&a)).normalize()
            };
            let u0 = radial(&points[0]);
            let flat: Vec<(f64, f64)> = section
                .iter()
                .map(|p| ((p - center).dot(&u0), (p - center).dot(&a)))
                .collect();
            let rings: Vec<Vec<Point3<f64>>> = points
                .iter()
                .map(|p| {
                    let u = radial(p);
                    flat.iter().map(|&(rho, h)| center + u * rho + a * h).collect()
                })
                .collect();
            Ok((*corner, skin(operation, rings, &flags, true, operation, config)?))
        }
    }
}
