// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Wires: ordered edge sequences on a plane

use super::segment::Segment;
use crate::config::TessellationConfig;
use crate::error::{require_positive, ModelingError, ModelingResult};
use crate::geometry::{Plane, Transform, Transformable};
use crate::utils::math::{segments_cross_2d, signed_area_2d};
use nalgebra::{Point2, Point3, Vector2};
use std::f64::consts::PI;

/// Distance below which two local points are the same point
pub(crate) const POINT_TOLERANCE: f64 = 1e-9;

/// An edge of a wire; construction edges are references only
#[derive(Debug, Clone, PartialEq)]
pub struct WireEdge {
    pub segment: Segment,
    pub construction: bool,
}

/// An ordered sequence of edges in a plane's local frame
///
/// A closed wire's physical edges form one loop. Construction edges travel
/// with the wire but never become boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    plane: Plane,
    edges: Vec<WireEdge>,
    closed: bool,
}

impl Wire {
    pub(crate) fn from_edges(plane: Plane, edges: Vec<WireEdge>, closed: bool) -> Self {
        Self { plane, edges, closed }
    }

    fn closed_from_segments(plane: Plane, segments: Vec<Segment>) -> Self {
        let edges = segments
            .into_iter()
            .map(|segment| WireEdge {
                segment,
                construction: false,
            })
            .collect();
        Self::from_edges(plane, edges, true)
    }

    /// Axis-aligned rectangle, centered on the plane origin or with a corner there
    pub fn rectangle(plane: Plane, width: f64, height: f64, centered: bool) -> ModelingResult<Self> {
        require_positive("rectangle", "width", width)?;
        require_positive("rectangle", "height", height)?;
        let (x0, y0) = if centered {
            (-width / 2.0, -height / 2.0)
        } else {
            (0.0, 0.0)
        };
        Self::polygon(
            plane,
            &[
                Point2::new(x0, y0),
                Point2::new(x0 + width, y0),
                Point2::new(x0 + width, y0 + height),
                Point2::new(x0, y0 + height),
            ],
        )
    }

    /// Full circle made of two half arcs
    pub fn circle(plane: Plane, center: Point2<f64>, radius: f64) -> ModelingResult<Self> {
        require_positive("circle", "radius", radius)?;
        let right = center + Vector2::new(radius, 0.0);
        let left = center - Vector2::new(radius, 0.0);
        Ok(Self::closed_from_segments(
            plane,
            vec![
                Segment::Arc {
                    start: right,
                    end: left,
                    center,
                    ccw: true,
                },
                Segment::Arc {
                    start: left,
                    end: right,
                    center,
                    ccw: true,
                },
            ],
        ))
    }

    /// Closed polyline through `points`
    pub fn polygon(plane: Plane, points: &[Point2<f64>]) -> ModelingResult<Self> {
        if points.len() < 3 {
            return Err(ModelingError::malformed_wire(
                "polygon",
                format!("a polygon needs at least 3 points, got {}", points.len()),
            ));
        }
        let segments = (0..points.len())
            .map(|i| Segment::Line {
                start: points[i],
                end: points[(i + 1) % points.len()],
            })
            .collect();
        let wire = Self::closed_from_segments(plane, segments);
        wire.check_simple("polygon", &TessellationConfig::default())?;
        Ok(wire)
    }

    /// Regular polygon centered on the plane origin with a corner on +x
    ///
    /// With `circumscribed` the polygon wraps a circle of `diameter`,
    /// otherwise its corners lie on that circle.
    pub fn regular_polygon(plane: Plane, sides: usize, diameter: f64, circumscribed: bool) -> ModelingResult<Self> {
        require_positive("regular_polygon", "diameter", diameter)?;
        if sides < 3 {
            return Err(ModelingError::invalid_parameter(
                "regular_polygon",
                format!("a polygon needs at least 3 sides, got {sides}"),
            ));
        }
        let mut radius = diameter / 2.0;
        if circumscribed {
            radius /= (PI / sides as f64).cos();
        }
        let points: Vec<Point2<f64>> = (0..sides)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / sides as f64;
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Self::polygon(plane, &points)
    }

    /// Stadium along x: `length` end to end, `width` across
    pub fn slot(plane: Plane, length: f64, width: f64) -> ModelingResult<Self> {
        require_positive("slot", "length", length)?;
        require_positive("slot", "width", width)?;
        if length <= width {
            return Err(ModelingError::invalid_parameter(
                "slot",
                format!("length {length} must exceed width {width}"),
            ));
        }
        let r = width / 2.0;
        let half = length / 2.0 - r;
        let p = Point2::new;
        Ok(Self::closed_from_segments(
            plane,
            vec![
                Segment::Line {
                    start: p(-half, -r),
                    end: p(half, -r),
                },
                Segment::Arc {
                    start: p(half, -r),
                    end: p(half, r),
                    center: p(half, 0.0),
                    ccw: true,
                },
                Segment::Line {
                    start: p(half, r),
                    end: p(-half, r),
                },
                Segment::Arc {
                    start: p(-half, r),
                    end: p(-half, -r),
                    center: p(-half, 0.0),
                    ccw: true,
                },
            ],
        ))
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn edges(&self) -> &[WireEdge] {
        &self.edges
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Edges that become boundary
    pub fn physical_edges(&self) -> impl Iterator<Item = &Segment> {
        self.edges.iter().filter(|e| !e.construction).map(|e| &e.segment)
    }

    /// Reference-only edges
    pub fn construction_edges(&self) -> impl Iterator<Item = &Segment> {
        self.edges.iter().filter(|e| e.construction).map(|e| &e.segment)
    }

    pub fn start_point(&self) -> Option<Point2<f64>> {
        self.physical_edges().next().map(Segment::start)
    }

    pub fn end_point(&self) -> Option<Point2<f64>> {
        self.physical_edges().last().map(Segment::end)
    }

    /// Fail unless the wire is closed
    pub fn require_closed(&self, operation: &'static str) -> ModelingResult<()> {
        if self.closed {
            Ok(())
        } else {
            Err(ModelingError::NonManifoldResult {
                operation,
                detail: "wire is open; close it before building a solid from it".into(),
            })
        }
    }

    /// Tessellated physical edges; each entry holds one edge's points, both ends included
    pub fn sampled_edges(&self, tessellation: &TessellationConfig) -> Vec<Vec<Point2<f64>>> {
        self.physical_edges().map(|s| s.sample(tessellation)).collect()
    }

    /// Tessellated outline in local coordinates
    ///
    /// Points carry the index of the physical edge that starts at them. A
    /// closed wire does not repeat its first point.
    pub fn outline(&self, tessellation: &TessellationConfig) -> Vec<(Point2<f64>, usize)> {
        let mut outline: Vec<(Point2<f64>, usize)> = Vec::new();
        for (index, points) in self.sampled_edges(tessellation).into_iter().enumerate() {
            for p in points {
                match outline.last_mut() {
                    Some(last) if (last.0 - p).norm() <= POINT_TOLERANCE => last.1 = index,
                    _ => outline.push((p, index)),
                }
            }
        }
        // The final point of each edge was relabelled by the next edge's start;
        // the last edge's end is the loop start.
        if self.closed && outline.len() > 1 {
            let (first, _) = outline[0];
            if (outline[outline.len() - 1].0 - first).norm() <= POINT_TOLERANCE {
                outline.pop();
            }
        }
        outline
    }

    pub fn points(&self, tessellation: &TessellationConfig) -> Vec<Point2<f64>> {
        self.outline(tessellation).into_iter().map(|(p, _)| p).collect()
    }

    pub fn world_points(&self, tessellation: &TessellationConfig) -> Vec<Point3<f64>> {
        self.points(tessellation).into_iter().map(|p| self.plane.to_world(p)).collect()
    }

    /// Signed enclosed area, positive when counter-clockwise in the plane
    pub fn signed_area(&self, tessellation: &TessellationConfig) -> f64 {
        signed_area_2d(&self.points(tessellation))
    }

    /// Reject wires whose tessellation crosses itself
    pub fn check_simple(&self, operation: &'static str, tessellation: &TessellationConfig) -> ModelingResult<()> {
        let points = self.points(tessellation);
        let n = points.len();
        let count = if self.closed { n } else { n.saturating_sub(1) };
        if self.closed && n < 3 {
            return Err(ModelingError::malformed_wire(operation, "closed wire encloses no area"));
        }
        let scale = points.iter().map(|p| p.coords.norm()).fold(1.0, f64::max);
        let eps = 1e-12 * scale * scale;
        for i in 0..count {
            for j in (i + 2)..count {
                if self.closed && i == 0 && j == count - 1 {
                    continue;
                }
                let (a0, a1) = (points[i], points[(i + 1) % n]);
                let (b0, b1) = (points[j], points[(j + 1) % n]);
                if segments_cross_2d(&a0, &a1, &b0, &b1, eps) {
                    let hit = self.plane.to_world(a0);
                    return Err(ModelingError::malformed_wire(
                        operation,
                        format!(
                            "wire crosses itself near ({:.4}, {:.4}, {:.4})",
                            hit.x, hit.y, hit.z
                        ),
                    ));
                }
            }
        }
        if self.closed && self.signed_area(tessellation).abs() <= eps {
            return Err(ModelingError::malformed_wire(operation, "closed wire encloses no area"));
        }
        Ok(())
    }

    /// Same wire with its edges traversed backwards
    pub fn reversed(&self) -> Self {
        Self {
            plane: self.plane,
            edges: self
                .edges
                .iter()
                .rev()
                .map(|e| WireEdge {
                    segment: e.segment.reversed(),
                    construction: e.construction,
                })
                .collect(),
            closed: self.closed,
        }
    }

    /// Same local geometry on another plane
    pub fn on_plane(&self, plane: Plane) -> Self {
        Self { plane, ..self.clone() }
    }
}

impl Transformable for Wire {
    fn transformed(&self, transform: &Transform) -> Self {
        self.on_plane(self.plane.transformed(transform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_rectangle_area_and_orientation() {
        let wire = Wire::rectangle(Plane::xy(), 4.0, 2.0, true).unwrap();
        let tess = TessellationConfig::default();
        assert!(wire.is_closed());
        assert_relative_eq!(wire.signed_area(&tess), 8.0, epsilon = 1e-12);
        assert_eq!(wire.points(&tess).len(), 4);
        assert_relative_eq!(wire.reversed().signed_area(&tess), -8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_circle_tessellation() {
        let tess = TessellationConfig::default();
        let wire = Wire::circle(Plane::xy(), Point2::origin(), 1.0).unwrap();
        let outline = wire.outline(&tess);
        assert_eq!(outline.len(), 120);
        assert_eq!(outline[0].1, 0);
        assert_eq!(outline[60].1, 1);
        let exact = PI;
        assert!((wire.signed_area(&tess) - exact).abs() / exact < 0.001);
    }

    #[test]
    fn test_self_intersection_rejected() {
        let bow_tie = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(matches!(
            Wire::polygon(Plane::xy(), &bow_tie),
            Err(ModelingError::MalformedWire { .. })
        ));
    }

    #[test]
    fn test_slot_area() {
        let tess = TessellationConfig::default();
        let wire = Wire::slot(Plane::xy(), 10.0, 2.0).unwrap();
        let exact = 8.0 * 2.0 + PI;
        assert!((wire.signed_area(&tess) - exact).abs() / exact < 0.001);
    }

    #[test]
    fn test_transform_moves_plane() {
        let wire = Wire::rectangle(Plane::xy(), 1.0, 1.0, false).unwrap();
        let moved = wire.translate(Vector3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(moved.plane().origin(), Point3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(moved.world_points(&TessellationConfig::default())[2], Point3::new(1.0, 1.0, 3.0));
    }

    #[test]
    fn test_open_wire_rejected() {
        let wire = Wire::from_edges(
            Plane::xy(),
            vec![WireEdge {
                segment: Segment::Line {
                    start: Point2::origin(),
                    end: Point2::new(1.0, 0.0),
                },
                construction: false,
            }],
            false,
        );
        assert!(matches!(
            wire.require_closed("extrude"),
            Err(ModelingError::NonManifoldResult { .. })
        ));
    }
}
