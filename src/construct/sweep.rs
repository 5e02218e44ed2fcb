// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sweeping a closed profile along a 3D rail
//!
//! The profile is carried by parallel transport: at every rail vertex it is
//! rotated by the smallest rotation taking the incoming leg direction to the
//! outgoing one, so it never spins about the rail. Consecutive legs meet on
//! the mitre plane bisecting their directions, which keeps every lateral
//! face of a straight leg planar.

use super::{edge_groups, SolidBuilder};
use crate::config::ModelingConfig;
use crate::error::{ModelingError, ModelingResult};
use crate::geometry::{FaceId, Solid};
use crate::sketch::{Path3, Region, Wire};
use crate::utils::math::newell_normal;
use nalgebra::{Point3, Rotation3, Vector3};
use std::collections::BTreeMap;

/// Sweep a closed `profile` along `path`
///
/// The profile stays where it is drawn for the start of the rail; it need
/// not sit on the rail, but its plane must not contain the first leg.
/// Closed rails are supported when they bring the profile back without a
/// twist, which holds for every planar loop.
pub fn sweep(profile: &Wire, path: &Path3, config: &ModelingConfig) -> ModelingResult<Solid> {
    const OP: &str = "sweep";
    profile.require_closed(OP)?;
    let tess = &config.tessellation;
    profile.check_simple(OP, tess)?;

    let points = path.points();
    let legs = path.leg_count();
    let directions: Vec<Vector3<f64>> = (0..legs).map(|k| path.leg_direction(k)).collect();

    let plane = *profile.plane();
    let facing = plane.normal().dot(&directions[0]);
    if facing.abs() < 1e-9 {
        return Err(ModelingError::invalid_parameter(
            OP,
            "profile plane contains the first rail direction",
        ));
    }

    // Smallest rotation at each joint; joint k sits between legs k-1 and k
    let turn = |from: &Vector3<f64>, to: &Vector3<f64>, at: &Point3<f64>| -> ModelingResult<Rotation3<f64>> {
        if from.dot(to) < -1.0 + 1e-9 {
            return Err(ModelingError::malformed_wire(
                OP,
                format!("rail folds back on itself at ({:.4}, {:.4}, {:.4})", at.x, at.y, at.z),
            ));
        }
        Ok(Rotation3::rotation_between(from, to).unwrap_or_else(Rotation3::identity))
    };
    let mut frames = vec![Rotation3::identity()];
    for k in 1..legs {
        let step = turn(&directions[k - 1], &directions[k], &points[k])?;
        frames.push(step * frames[k - 1]);
    }
    if path.is_closed() {
        let step = turn(&directions[legs - 1], &directions[0], &points[0])?;
        let residual = (step * frames[legs - 1]).angle();
        if residual > 1e-6 {
            return Err(ModelingError::Unsupported {
                operation: OP,
                detail: format!(
                    "closed rail would twist the profile by {:.3} degrees before it closes",
                    residual.to_degrees()
                ),
            });
        }
    }

    // Profile loop counter-clockwise about the first leg
    let outline = profile.outline(tess);
    let groups = edge_groups(profile);
    let mut loop_points: Vec<Point3<f64>> = outline.iter().map(|(p, _)| plane.to_world(*p)).collect();
    let mut loop_groups: Vec<usize> = outline.iter().map(|(_, edge)| groups[*edge]).collect();
    if newell_normal(&loop_points).dot(&directions[0]) < 0.0 {
        let n = loop_groups.len();
        loop_groups = (0..n).map(|k| loop_groups[(2 * n - 2 - k) % n]).collect();
        loop_points.reverse();
    }
    let offsets: Vec<Vector3<f64>> = loop_points.iter().map(|p| p - points[0]).collect();

    // Profile point `j` carried along leg `k`: a line through `base` along the leg
    let base = |k: usize, j: usize| -> Point3<f64> { points[k] + frames[k] * offsets[j] };
    let mitre = |k: usize, j: usize| -> Point3<f64> {
        let previous = (k + legs - 1) % legs;
        let (incoming, outgoing) = (directions[previous], directions[k]);
        let normal = (incoming + outgoing).normalize();
        let start = base(previous, j);
        let s = normal.dot(&(points[k] - start)) / normal.dot(&incoming);
        start + incoming * s
    };

    let n = offsets.len();
    let rings: Vec<Vec<Point3<f64>>> = if path.is_closed() {
        (0..legs).map(|k| (0..n).map(|j| mitre(k, j)).collect()).collect()
    } else {
        let mut rings = vec![loop_points.clone()];
        rings.extend((1..legs).map(|k| (0..n).map(|j| mitre(k, j)).collect::<Vec<_>>()));
        rings.push((0..n).map(|j| points[legs] + frames[legs - 1] * offsets[j]).collect());
        rings
    };

    let mut builder = SolidBuilder::new(OP);
    let mut side_faces: BTreeMap<(usize, usize), FaceId> = BTreeMap::new();
    for k in 0..legs {
        let (a, b) = (&rings[k], &rings[(k + 1) % rings.len()]);
        let segment = path.segment_of(k);
        for i in 0..n {
            let advance = (b[i] - a[i]).dot(&directions[k]);
            if advance <= 1e-9 {
                let at = a[i];
                return Err(ModelingError::malformed_wire(
                    OP,
                    format!(
                        "profile is too large for the rail bend near ({:.4}, {:.4}, {:.4})",
                        at.x, at.y, at.z
                    ),
                ));
            }
            let face = *side_faces
                .entry((loop_groups[i], segment))
                .or_insert_with(|| builder.face("side"));
            let j = (i + 1) % n;
            builder.quad([a[i], a[j], b[j], b[i]], face);
        }
    }

    if !path.is_closed() {
        let start = builder.face("start");
        let end = builder.face("end");
        let (cap, triangles) = Region::new(profile.clone())?.triangulate(tess)?;
        let last = frames[legs - 1];
        // Local ccw triangles face along the profile normal
        let forward = facing > 0.0;
        for t in &triangles {
            let [a, b, c] = t.map(|i| plane.to_world(cap[i]));
            let moved = |p: Point3<f64>| points[legs] + last * (p - points[0]);
            if forward {
                builder.polygon(&[a, c, b], start);
                builder.polygon(&[moved(a), moved(b), moved(c)], end);
            } else {
                builder.polygon(&[a, b, c], start);
                builder.polygon(&[moved(a), moved(c), moved(b)], end);
            }
        }
    }

    builder.build(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;
    use crate::sketch::builder_facing;
    use approx::assert_relative_eq;
    use nalgebra::Point2;
    use std::f64::consts::PI;

    fn square_profile() -> Wire {
        Wire::rectangle(Plane::xy(), 2.0, 2.0, true).unwrap()
    }

    #[test]
    fn test_straight_sweep_is_a_prism() {
        let config = ModelingConfig::default();
        let path = Path3::polyline(&[Point3::origin(), Point3::new(0.0, 0.0, 5.0)], false).unwrap();
        let solid = sweep(&square_profile(), &path, &config).unwrap();
        assert_relative_eq!(solid.volume(), 20.0, epsilon = 1e-9);
        assert_eq!(solid.face_count(), 6);
    }

    #[test]
    fn test_mitred_elbow() {
        let config = ModelingConfig::default();
        let path = Path3::polyline(
            &[
                Point3::origin(),
                Point3::new(0.0, 0.0, 10.0),
                Point3::new(10.0, 0.0, 10.0),
            ],
            false,
        )
        .unwrap();
        let solid = sweep(&square_profile(), &path, &config).unwrap();
        // A mitred prism keeps area times centerline length
        assert_relative_eq!(solid.volume(), 80.0, epsilon = 1e-8);
        assert!(solid.is_watertight());
        println!("elbow faces: {}", solid.face_count());
        // The two faces in the bend plane merge across the mitre
        assert_eq!(solid.face_count(), 8);
    }

    #[test]
    fn test_closed_square_rail() {
        let config = ModelingConfig::default();
        let path = Path3::polyline(
            &[
                Point3::origin(),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(10.0, 10.0, 0.0),
                Point3::new(0.0, 10.0, 0.0),
            ],
            true,
        )
        .unwrap();
        let profile = Wire::circle(Plane::yz(), Point2::origin(), 1.0).unwrap();
        let area = profile.signed_area(&config.tessellation).abs();
        let solid = sweep(&profile, &path, &config).unwrap();
        assert_relative_eq!(solid.volume(), area * 40.0, max_relative = 1e-9);
        assert!(solid.is_watertight());
        assert!(solid.face_ids().iter().all(|f| solid.label(*f) == Some("side")));
    }

    #[test]
    fn test_helix_tube() {
        let config = ModelingConfig::default();
        let path = Path3::helix(5.0, 4.0, 8.0, &config.tessellation).unwrap();
        let profile = builder_facing(path.points()[0], path.leg_direction(0))
            .unwrap()
            .move_to(0.5, 0.0)
            .three_point_arc(Point2::new(0.0, 0.5), Point2::new(-0.5, 0.0))
            .unwrap()
            .three_point_arc(Point2::new(0.0, -0.5), Point2::new(0.5, 0.0))
            .unwrap()
            .close()
            .unwrap();
        let solid = sweep(&profile, &path, &config).unwrap();
        let expected = PI * 0.25 * path.length();
        println!("helix tube {:.4} vs {:.4}", solid.volume(), expected);
        assert!((solid.volume() - expected).abs() / expected < 0.01);
        assert!(solid.is_watertight());
    }

    #[test]
    fn test_fold_back_rejected() {
        let config = ModelingConfig::default();
        let path = Path3::polyline(
            &[
                Point3::origin(),
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(0.0, 0.0, 2.0),
            ],
            false,
        )
        .unwrap();
        let err = sweep(&square_profile(), &path, &config).unwrap_err();
        assert!(matches!(err, ModelingError::MalformedWire { .. }));
    }

    #[test]
    fn test_profile_along_rail_rejected() {
        let config = ModelingConfig::default();
        let path = Path3::polyline(&[Point3::origin(), Point3::new(5.0, 0.0, 0.0)], false).unwrap();
        assert!(sweep(&square_profile(), &path, &config).is_err());
    }
}
