// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 3D rails for sweeps

use super::wire::Wire;
use crate::config::TessellationConfig;
use crate::error::{require_positive, ModelingError, ModelingResult};
use nalgebra::{Point3, Vector3};
use std::f64::consts::TAU;

/// A polyline in world space
///
/// Every point records the rail segment of the edge leaving it, so the
/// faces a sweep generates follow the rail's own edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Path3 {
    points: Vec<Point3<f64>>,
    segments: Vec<usize>,
    closed: bool,
}

impl Path3 {
    fn build(
        operation: &'static str,
        labelled: impl IntoIterator<Item = (Point3<f64>, usize)>,
        closed: bool,
    ) -> ModelingResult<Self> {
        let mut points: Vec<Point3<f64>> = Vec::new();
        let mut segments = Vec::new();
        for (p, segment) in labelled {
            if !p.coords.iter().all(|c| c.is_finite()) {
                return Err(ModelingError::invalid_parameter(operation, "path point is not finite"));
            }
            if let Some(last) = points.last() {
                if (p - last).norm() <= 1e-9 {
                    if let Some(label) = segments.last_mut() {
                        *label = segment;
                    }
                    continue;
                }
            }
            points.push(p);
            segments.push(segment);
        }
        if closed && points.len() > 2 && (points[0] - points[points.len() - 1]).norm() <= 1e-9 {
            points.pop();
            segments.pop();
        }
        let needed = if closed { 3 } else { 2 };
        if points.len() < needed {
            return Err(ModelingError::malformed_wire(
                operation,
                format!("path needs at least {needed} distinct points, got {}", points.len()),
            ));
        }
        Ok(Self {
            points,
            segments,
            closed,
        })
    }

    /// Rail following a wire's physical edges in world space
    pub fn from_wire(wire: &Wire, tessellation: &TessellationConfig) -> ModelingResult<Self> {
        let plane = wire.plane();
        let labelled = wire
            .outline(tessellation)
            .into_iter()
            .map(|(p, edge)| (plane.to_world(p), edge));
        Self::build("path_from_wire", labelled, wire.is_closed())
    }

    /// Straight legs through `points`, possibly non-planar
    pub fn polyline(points: &[Point3<f64>], closed: bool) -> ModelingResult<Self> {
        Self::build(
            "polyline",
            points.iter().copied().enumerate().map(|(i, p)| (p, i)),
            closed,
        )
    }

    /// Right-handed helix around +Z starting on +X
    pub fn helix(radius: f64, pitch: f64, height: f64, tessellation: &TessellationConfig) -> ModelingResult<Self> {
        require_positive("helix", "radius", radius)?;
        require_positive("helix", "pitch", pitch)?;
        require_positive("helix", "height", height)?;
        let turns = height / pitch;
        let steps = tessellation.segments_for_angle(TAU) * (turns.ceil() as usize).max(1);
        let labelled = (0..=steps).map(|i| {
            let t = i as f64 / steps as f64;
            let angle = TAU * turns * t;
            (
                Point3::new(radius * angle.cos(), radius * angle.sin(), height * t),
                0,
            )
        });
        Self::build("helix", labelled, false)
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Rail segment of the leg leaving point `i`
    pub fn segment_of(&self, i: usize) -> usize {
        self.segments[i]
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of straight legs
    pub fn leg_count(&self) -> usize {
        if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        }
    }

    /// Unit direction of leg `i`
    pub fn leg_direction(&self, i: usize) -> Vector3<f64> {
        let n = self.points.len();
        (self.points[(i + 1) % n] - self.points[i]).normalize()
    }

    pub fn length(&self) -> f64 {
        (0..self.leg_count())
            .map(|i| (self.points[(i + 1) % self.points.len()] - self.points[i]).norm())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;
    use crate::sketch::ProfileBuilder;

    #[test]
    fn test_polyline_drops_duplicates() {
        let path = Path3::polyline(
            &[
                Point3::origin(),
                Point3::origin(),
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(5.0, 0.0, 5.0),
            ],
            false,
        )
        .unwrap();
        assert_eq!(path.points().len(), 3);
        assert_eq!(path.leg_count(), 2);
        assert!((path.length() - 10.0).abs() < 1e-12);
        assert_eq!(path.segment_of(0), 1);
    }

    #[test]
    fn test_helix_length() {
        let tess = TessellationConfig::default();
        let path = Path3::helix(10.0, 5.0, 10.0, &tess).unwrap();
        let exact = 2.0 * (TAU * 10.0f64).hypot(5.0);
        assert!((path.length() - exact).abs() / exact < 0.001);
        assert!((path.points().last().unwrap().z - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_wire_in_world() {
        let wire = ProfileBuilder::new(Plane::xz())
            .line_to(0.0, 10.0)
            .line_to(10.0, 10.0)
            .wire()
            .unwrap();
        let path = Path3::from_wire(&wire, &TessellationConfig::default()).unwrap();
        assert_eq!(path.points().len(), 3);
        // xz plane: local y is world z
        assert!((path.points()[1] - Point3::new(0.0, 0.0, 10.0)).norm() < 1e-12);
        assert_eq!(path.segment_of(1), 1);
    }

    #[test]
    fn test_too_short() {
        assert!(Path3::polyline(&[Point3::origin()], false).is_err());
    }
}
