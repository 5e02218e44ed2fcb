// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planar curve segments in a plane's local coordinates

use crate::config::TessellationConfig;
use nalgebra::{Point2, Vector2};
use std::f64::consts::TAU;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Line {
        start: Point2<f64>,
        end: Point2<f64>,
    },
    /// Circular arc around `center`; equal end points make a full circle
    Arc {
        start: Point2<f64>,
        end: Point2<f64>,
        center: Point2<f64>,
        ccw: bool,
    },
    /// Bezier curve of any degree; the first and last control points are the end points
    Bezier { points: Vec<Point2<f64>> },
}

fn perp(v: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v.y, v.x)
}

impl Segment {
    pub fn start(&self) -> Point2<f64> {
        match self {
            Self::Line { start, .. } | Self::Arc { start, .. } => *start,
            Self::Bezier { points } => points[0],
        }
    }

    pub fn end(&self) -> Point2<f64> {
        match self {
            Self::Line { end, .. } | Self::Arc { end, .. } => *end,
            Self::Bezier { points } => points[points.len() - 1],
        }
    }

    /// Signed angle swept by an arc, positive counter-clockwise
    pub fn sweep_angle(&self) -> Option<f64> {
        let Self::Arc {
            start,
            end,
            center,
            ccw,
        } = self
        else {
            return None;
        };
        let a0 = (start.y - center.y).atan2(start.x - center.x);
        let a1 = (end.y - center.y).atan2(end.x - center.x);
        let sweep = (a1 - a0).rem_euclid(TAU);
        let full = sweep < 1e-12 || TAU - sweep < 1e-12;
        Some(match (full, *ccw) {
            (true, true) => TAU,
            (true, false) => -TAU,
            (false, true) => sweep,
            (false, false) => sweep - TAU,
        })
    }

    /// Unit tangent at the start, pointing along the direction of travel
    pub fn start_tangent(&self) -> Vector2<f64> {
        let v = match self {
            Self::Line { start, end } => end - start,
            Self::Arc {
                start, center, ccw, ..
            } => {
                let radial = perp(&(start - center));
                if *ccw {
                    radial
                } else {
                    -radial
                }
            }
            Self::Bezier { points } => points
                .iter()
                .skip(1)
                .map(|p| p - points[0])
                .find(|v| v.norm() > 1e-12)
                .unwrap_or_else(Vector2::zeros),
        };
        v.try_normalize(1e-15).unwrap_or_else(Vector2::zeros)
    }

    /// Unit tangent at the end, pointing along the direction of travel
    pub fn end_tangent(&self) -> Vector2<f64> {
        let v = match self {
            Self::Line { start, end } => end - start,
            Self::Arc {
                end, center, ccw, ..
            } => {
                let radial = perp(&(end - center));
                if *ccw {
                    radial
                } else {
                    -radial
                }
            }
            Self::Bezier { points } => {
                let last = points[points.len() - 1];
                points
                    .iter()
                    .rev()
                    .skip(1)
                    .map(|p| last - p)
                    .find(|v| v.norm() > 1e-12)
                    .unwrap_or_else(Vector2::zeros)
            }
        };
        v.try_normalize(1e-15).unwrap_or_else(Vector2::zeros)
    }

    /// Points along the segment, both end points included
    pub fn sample(&self, tessellation: &TessellationConfig) -> Vec<Point2<f64>> {
        match self {
            Self::Line { start, end } => vec![*start, *end],
            Self::Arc { start, center, .. } => {
                let sweep = self.sweep_angle().unwrap_or(0.0);
                let radius = (start - center).norm();
                let a0 = (start.y - center.y).atan2(start.x - center.x);
                let n = tessellation.segments_for_angle(sweep);
                let mut points: Vec<Point2<f64>> = (0..n)
                    .map(|i| {
                        let angle = a0 + sweep * i as f64 / n as f64;
                        center + Vector2::new(angle.cos(), angle.sin()) * radius
                    })
                    .collect();
                points[0] = *start;
                points.push(self.end());
                points
            }
            Self::Bezier { points } => {
                let n = tessellation.bezier_segments.max(1);
                (0..=n)
                    .map(|i| de_casteljau(points, i as f64 / n as f64))
                    .collect()
            }
        }
    }

    pub fn length(&self, tessellation: &TessellationConfig) -> f64 {
        match self {
            Self::Line { start, end } => (end - start).norm(),
            Self::Arc { start, center, .. } => {
                (start - center).norm() * self.sweep_angle().unwrap_or(0.0).abs()
            }
            Self::Bezier { .. } => self
                .sample(tessellation)
                .windows(2)
                .map(|pair| (pair[1] - pair[0]).norm())
                .sum(),
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Self::Line { start, end } => Self::Line {
                start: *end,
                end: *start,
            },
            Self::Arc {
                start,
                end,
                center,
                ccw,
            } => Self::Arc {
                start: *end,
                end: *start,
                center: *center,
                ccw: !ccw,
            },
            Self::Bezier { points } => Self::Bezier {
                points: points.iter().rev().copied().collect(),
            },
        }
    }
}

/// Evaluate a bezier curve at `t`
pub fn de_casteljau(control: &[Point2<f64>], t: f64) -> Point2<f64> {
    let mut points = control.to_vec();
    for level in (1..points.len()).rev() {
        for i in 0..level {
            points[i] = points[i] + (points[i + 1] - points[i]) * t;
        }
    }
    points[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_quarter_arc() {
        let arc = Segment::Arc {
            start: Point2::new(1.0, 0.0),
            end: Point2::new(0.0, 1.0),
            center: Point2::origin(),
            ccw: true,
        };
        assert_relative_eq!(arc.sweep_angle().unwrap(), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(arc.length(&TessellationConfig::default()), FRAC_PI_2, epsilon = 1e-12);
        let points = arc.sample(&TessellationConfig::default());
        assert_eq!(points.len(), 31);
        assert!(points.iter().all(|p| (p.coords.norm() - 1.0).abs() < 1e-12));
        assert_relative_eq!(arc.end_tangent(), Vector2::new(-1.0, 0.0), epsilon = 1e-12);

        let clockwise = arc.reversed();
        assert_relative_eq!(clockwise.sweep_angle().unwrap(), -FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_full_circle() {
        let circle = Segment::Arc {
            start: Point2::new(2.0, 0.0),
            end: Point2::new(2.0, 0.0),
            center: Point2::origin(),
            ccw: true,
        };
        assert_relative_eq!(circle.length(&TessellationConfig::default()), 4.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_bezier_ends_and_midpoint() {
        let curve = Segment::Bezier {
            points: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 2.0), Point2::new(2.0, 0.0)],
        };
        let points = curve.sample(&TessellationConfig::default());
        assert_relative_eq!(points[0], Point2::new(0.0, 0.0));
        assert_relative_eq!(*points.last().unwrap(), Point2::new(2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(de_casteljau(&[Point2::new(0.0, 0.0), Point2::new(1.0, 2.0), Point2::new(2.0, 0.0)], 0.5), Point2::new(1.0, 1.0), epsilon = 1e-12);
    }
}
