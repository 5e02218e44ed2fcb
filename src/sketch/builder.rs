// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cursor-based profile builder
//!
//! Every call consumes the builder and returns the next one, so a profile
//! reads as one chained expression. Calls that can fail on their own
//! arguments return a `Result`; problems that only show once the path is
//! complete are reported by [`ProfileBuilder::close`] or [`ProfileBuilder::wire`].

use super::segment::Segment;
use super::wire::{Wire, WireEdge, POINT_TOLERANCE};
use crate::config::TessellationConfig;
use crate::error::{ModelingError, ModelingResult};
use crate::geometry::Plane;
use crate::utils::math::any_perpendicular;
use nalgebra::{Point2, Vector2};

#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    plane: Plane,
    current: Point2<f64>,
    edges: Vec<WireEdge>,
    tessellation: TessellationConfig,
    deferred: Option<ModelingError>,
}

fn left_of(v: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v.y, v.x)
}

impl ProfileBuilder {
    /// Start at the plane origin
    pub fn new(plane: Plane) -> Self {
        Self {
            plane,
            current: Point2::origin(),
            edges: Vec::new(),
            tessellation: TessellationConfig::default(),
            deferred: None,
        }
    }

    /// Tessellation used for the self-intersection check on close
    pub fn with_tessellation(mut self, tessellation: TessellationConfig) -> Self {
        self.tessellation = tessellation;
        self
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn current_point(&self) -> Point2<f64> {
        self.current
    }

    /// Move the cursor without drawing
    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        self.current = Point2::new(x, y);
        self
    }

    fn push(mut self, segment: Segment) -> Self {
        self.current = segment.end();
        self.edges.push(WireEdge {
            segment,
            construction: false,
        });
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        let end = Point2::new(x, y);
        if (end - self.current).norm() <= POINT_TOLERANCE {
            self.deferred.get_or_insert_with(|| {
                ModelingError::malformed_wire("line_to", format!("zero-length line at ({x}, {y})"))
            });
            return self;
        }
        let start = self.current;
        self.push(Segment::Line { start, end })
    }

    pub fn line_relative(self, dx: f64, dy: f64) -> Self {
        let current = self.current;
        self.line_to(current.x + dx, current.y + dy)
    }

    /// Horizontal line by `dx`
    pub fn hline(self, dx: f64) -> Self {
        self.line_relative(dx, 0.0)
    }

    /// Vertical line by `dy`
    pub fn vline(self, dy: f64) -> Self {
        self.line_relative(0.0, dy)
    }

    fn last_tangent(&self, operation: &'static str) -> ModelingResult<Vector2<f64>> {
        self.edges
            .last()
            .map(|e| e.segment.end_tangent())
            .filter(|t| t.norm() > 0.5)
            .ok_or_else(|| ModelingError::malformed_wire(operation, "no previous edge to be tangent to"))
    }

    /// Arc leaving the previous edge tangentially and ending at `(x, y)`
    pub fn arc_tangent_to_point(self, x: f64, y: f64) -> ModelingResult<Self> {
        const OP: &str = "arc_tangent_to_point";
        let tangent = self.last_tangent(OP)?;
        let end = Point2::new(x, y);
        let chord = end - self.current;
        let normal = left_of(&tangent);
        let side = chord.dot(&normal);
        if side.abs() <= POINT_TOLERANCE * chord.norm().max(1.0) {
            return Err(ModelingError::malformed_wire(
                OP,
                format!("({x}, {y}) lies on the tangent line; a tangent arc cannot reach it"),
            ));
        }
        // Center on the normal, equidistant from both ends
        let radius = chord.norm_squared() / (2.0 * side);
        let start = self.current;
        Ok(self.push(Segment::Arc {
            start,
            end,
            center: start + normal * radius,
            ccw: side > 0.0,
        }))
    }

    /// Arc of the given radius to `(x, y)`
    ///
    /// A positive radius bends counter-clockwise (center left of the chord),
    /// a negative one clockwise. The shorter arc is drawn.
    pub fn arc_by_radius_to_point(self, x: f64, y: f64, radius: f64) -> ModelingResult<Self> {
        const OP: &str = "arc_by_radius_to_point";
        let end = Point2::new(x, y);
        let chord = end - self.current;
        let half = chord.norm() / 2.0;
        if !radius.is_finite() || half <= POINT_TOLERANCE {
            return Err(ModelingError::malformed_wire(OP, "arc needs distinct end points and a finite radius"));
        }
        if radius.abs() < half - POINT_TOLERANCE {
            return Err(ModelingError::malformed_wire(
                OP,
                format!("radius {} is smaller than half the chord {half}", radius.abs()),
            ));
        }
        let rise = (radius * radius - half * half).max(0.0).sqrt();
        let direction = chord / chord.norm();
        let mid = self.current + chord / 2.0;
        let ccw = radius > 0.0;
        let center = if ccw {
            mid + left_of(&direction) * rise
        } else {
            mid - left_of(&direction) * rise
        };
        let start = self.current;
        Ok(self.push(Segment::Arc { start, end, center, ccw }))
    }

    /// Arc from the cursor through `via` to `end`
    pub fn three_point_arc(self, via: Point2<f64>, end: Point2<f64>) -> ModelingResult<Self> {
        const OP: &str = "three_point_arc";
        let a = self.current;
        let (b, c) = (via, end);
        let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
        let scale = (b - a).norm().max((c - a).norm()).max(1.0);
        if d.abs() <= 1e-12 * scale * scale {
            return Err(ModelingError::malformed_wire(OP, "the three points are collinear"));
        }
        let sq = |p: &Point2<f64>| p.coords.norm_squared();
        let center = Point2::new(
            (sq(&a) * (b.y - c.y) + sq(&b) * (c.y - a.y) + sq(&c) * (a.y - b.y)) / d,
            (sq(&a) * (c.x - b.x) + sq(&b) * (a.x - c.x) + sq(&c) * (b.x - a.x)) / d,
        );
        let turn = (b - a).perp(&(c - a));
        Ok(self.push(Segment::Arc {
            start: a,
            end: c,
            center,
            ccw: turn > 0.0,
        }))
    }

    /// Bezier from the cursor; `points` are the remaining control points, the last one is the end
    pub fn bezier_through(self, points: &[Point2<f64>]) -> ModelingResult<Self> {
        if points.len() < 2 {
            return Err(ModelingError::malformed_wire(
                "bezier_through",
                "a bezier needs at least one control point and an end point",
            ));
        }
        let mut control = Vec::with_capacity(points.len() + 1);
        control.push(self.current);
        control.extend_from_slice(points);
        Ok(self.push(Segment::Bezier { points: control }))
    }

    /// Mark the most recent edge as reference-only
    pub fn as_construction(mut self) -> Self {
        if let Some(edge) = self.edges.last_mut() {
            edge.construction = true;
        }
        self
    }

    fn physical(&self, operation: &'static str) -> ModelingResult<Vec<&WireEdge>> {
        if let Some(error) = &self.deferred {
            return Err(error.clone());
        }
        let physical: Vec<&WireEdge> = self.edges.iter().filter(|e| !e.construction).collect();
        if physical.is_empty() {
            return Err(ModelingError::malformed_wire(operation, "profile has no physical edges"));
        }
        for pair in physical.windows(2) {
            let gap = (pair[1].segment.start() - pair[0].segment.end()).norm();
            if gap > POINT_TOLERANCE {
                let at = self.plane.to_world(pair[1].segment.start());
                return Err(ModelingError::malformed_wire(
                    operation,
                    format!(
                        "physical edges are not connected near ({:.4}, {:.4}, {:.4})",
                        at.x, at.y, at.z
                    ),
                ));
            }
        }
        Ok(physical)
    }

    /// Connect the cursor back to the start of the first physical edge
    pub fn close(self) -> ModelingResult<Wire> {
        let physical = self.physical("close")?;
        let start = physical[0].segment.start();
        let end = physical[physical.len() - 1].segment.end();

        let mut edges = self.edges.clone();
        if (end - start).norm() > POINT_TOLERANCE {
            edges.push(WireEdge {
                segment: Segment::Line { start: end, end: start },
                construction: false,
            });
        }

        let wire = Wire::from_edges(self.plane, edges, true);
        wire.check_simple("close", &self.tessellation)?;
        Ok(wire)
    }

    /// The path as an open wire, for sweep rails
    pub fn wire(self) -> ModelingResult<Wire> {
        self.physical("wire")?;
        let wire = Wire::from_edges(self.plane, self.edges, false);
        wire.check_simple("wire", &self.tessellation)?;
        Ok(wire)
    }
}

/// Builder on a plane through `origin` facing `normal`
///
/// The in-plane x axis is chosen perpendicular to `normal`.
pub fn builder_facing(origin: nalgebra::Point3<f64>, normal: nalgebra::Vector3<f64>) -> ModelingResult<ProfileBuilder> {
    let normal = normal
        .try_normalize(1e-12)
        .ok_or_else(|| ModelingError::invalid_parameter("builder_facing", "normal has zero length"))?;
    let x = any_perpendicular(&normal).into_inner();
    let y = normal.cross(&x);
    Ok(ProfileBuilder::new(Plane::new(origin, x, y)?))
}
