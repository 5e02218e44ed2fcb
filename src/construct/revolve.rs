// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Revolution of a profile about an axis in its plane

use super::{edge_groups, group_faces, SolidBuilder};
use crate::config::ModelingConfig;
use crate::error::{ModelingError, ModelingResult};
use crate::geometry::Solid;
use crate::sketch::{Region, Wire};
use nalgebra::{Point3, Rotation3, Unit, Vector3};

/// Revolve a closed wire by `angle_deg` about the axis through `axis_point`
///
/// The axis must lie in the wire's plane and the wire may touch it but not
/// cross it; both are checked before any geometry is built. The angle must
/// be in `(0, 360]`. Partial revolutions get `"start"` and `"end"` caps.
pub fn revolve(
    wire: &Wire,
    angle_deg: f64,
    axis_point: Point3<f64>,
    axis_direction: Vector3<f64>,
    config: &ModelingConfig,
) -> ModelingResult<Solid> {
    const OP: &str = "revolve";
    wire.require_closed(OP)?;
    if !(angle_deg.is_finite() && angle_deg > 0.0 && angle_deg <= 360.0 + 1e-9) {
        return Err(ModelingError::invalid_parameter(
            OP,
            format!("angle must be in (0, 360] degrees, got {angle_deg}"),
        ));
    }
    if !(axis_direction.norm() > 1e-12) || !axis_point.coords.iter().all(|c| c.is_finite()) {
        return Err(ModelingError::invalid_parameter(OP, "axis has zero length"));
    }
    let axis = Unit::new_normalize(axis_direction);

    let tess = &config.tessellation;
    wire.check_simple(OP, tess)?;
    let wire = if wire.signed_area(tess) < 0.0 {
        wire.reversed()
    } else {
        wire.clone()
    };
    let plane = *wire.plane();

    let outline = wire.outline(tess);
    let world: Vec<Point3<f64>> = outline.iter().map(|(p, _)| plane.to_world(*p)).collect();
    let scale = world
        .iter()
        .map(|p| (p - axis_point).norm())
        .fold(0.0, f64::max);
    let tolerance = 1e-9 * (1.0 + scale);

    if axis.dot(&plane.normal()).abs() > 1e-9 || plane.signed_distance(&axis_point).abs() > tolerance {
        return Err(ModelingError::PreconditionViolation {
            operation: OP,
            detail: "axis does not lie in the profile plane".into(),
        });
    }

    // Signed distance from the axis within the plane
    let across = plane.normal().cross(&*axis);
    let offsets: Vec<f64> = world.iter().map(|p| (p - axis_point).dot(&across)).collect();
    let above = offsets.iter().any(|&s| s > tolerance);
    let below = offsets.iter().position(|&s| s < -tolerance);
    if let (true, Some(i)) = (above, below) {
        let p = world[i];
        return Err(ModelingError::PreconditionViolation {
            operation: OP,
            detail: format!(
                "profile crosses the axis; ({:.4}, {:.4}, {:.4}) is on the far side",
                p.x, p.y, p.z
            ),
        });
    }

    // Points on the axis are snapped so every ring shares them exactly
    let snap = |p: Point3<f64>| -> Point3<f64> {
        if ((p - axis_point).dot(&across)).abs() <= tolerance {
            axis_point + axis.into_inner() * (p - axis_point).dot(&*axis)
        } else {
            p
        }
    };
    let profile: Vec<Point3<f64>> = world.iter().map(|p| snap(*p)).collect();

    let angle = angle_deg.to_radians();
    let full = angle_deg >= 360.0 - 1e-9;
    let steps = tess.segments_for_angle(angle);
    let rotate = |p: &Point3<f64>, k: usize| -> Point3<f64> {
        let rotation = Rotation3::from_axis_angle(&axis, angle * k as f64 / steps as f64);
        axis_point + rotation * (p - axis_point)
    };
    let ring_count = if full { steps } else { steps + 1 };
    let rings: Vec<Vec<Point3<f64>>> = (0..ring_count)
        .map(|k| profile.iter().map(|p| rotate(p, k)).collect())
        .collect();

    let mut builder = SolidBuilder::new(OP);
    let faces = group_faces(&mut builder, &edge_groups(&wire), "side");

    let n = outline.len();
    for k in 0..steps {
        let (current, next) = (&rings[k], &rings[(k + 1) % ring_count]);
        for i in 0..n {
            let j = (i + 1) % n;
            builder.quad([current[i], current[j], next[j], next[i]], faces[outline[i].1]);
        }
    }

    if !full {
        let start = builder.face("start");
        let end = builder.face("end");
        let (points, triangles) = Region::new(wire.clone())?.triangulate(tess)?;
        let cap: Vec<Point3<f64>> = points.iter().map(|p| snap(plane.to_world(*p))).collect();
        for t in &triangles {
            let [a, b, c] = t.map(|i| cap[i]);
            builder.polygon(&[a, c, b], start);
            builder.polygon(&[rotate(&a, steps), rotate(&b, steps), rotate(&c, steps)], end);
        }
    }

    builder.build(config)
}
