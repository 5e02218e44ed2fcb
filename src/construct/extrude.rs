// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Linear extrusion along a profile plane's normal

use super::{edge_groups, group_faces, SolidBuilder};
use crate::config::ModelingConfig;
use crate::error::{ModelingError, ModelingResult};
use crate::geometry::Solid;
use crate::sketch::{Region, Wire};
use nalgebra::{Point2, Point3};

/// Extrude a closed wire by `distance` along its plane normal
///
/// With `symmetric` the solid spans `distance / 2` on each side of the
/// plane. A negative distance extrudes against the normal. An open wire is
/// rejected rather than closed implicitly.
pub fn extrude(wire: &Wire, distance: f64, symmetric: bool, config: &ModelingConfig) -> ModelingResult<Solid> {
    wire.require_closed("extrude")?;
    extrude_region(&Region::new(wire.clone())?, distance, symmetric, config)
}

/// Extrude a region with holes; each hole becomes a through bore
pub fn extrude_region(region: &Region, distance: f64, symmetric: bool, config: &ModelingConfig) -> ModelingResult<Solid> {
    const OP: &str = "extrude";
    if !distance.is_finite() || distance == 0.0 {
        return Err(ModelingError::invalid_parameter(
            OP,
            format!("distance must be finite and non-zero, got {distance}"),
        ));
    }

    let tess = &config.tessellation;
    region.outer().check_simple(OP, tess)?;
    for hole in region.holes() {
        hole.check_simple(OP, tess)?;
    }

    let plane = *region.plane();
    let normal = plane.normal();
    let (z0, z1) = if symmetric {
        (-distance / 2.0, distance / 2.0)
    } else {
        (0.0, distance)
    };
    let (lo, hi) = (z0.min(z1), z0.max(z1));
    let lift = |p: Point2<f64>, z: f64| -> Point3<f64> { plane.to_world(p) + normal * z };

    let mut builder = SolidBuilder::new(OP);
    let start = builder.face("start");
    let end = builder.face("end");
    let (bottom, top) = if z0 <= z1 { (start, end) } else { (end, start) };

    let (points, triangles) = region.triangulate(tess)?;
    for t in &triangles {
        let [a, b, c] = t.map(|i| points[i]);
        builder.polygon(&[lift(a, lo), lift(c, lo), lift(b, lo)], bottom);
        builder.polygon(&[lift(a, hi), lift(b, hi), lift(c, hi)], top);
    }

    // Outer loop is ccw and holes cw, so (edge × normal) points out of the material
    let (outer, holes) = region.oriented(tess);
    for wire in std::iter::once(&outer).chain(holes.iter()) {
        let faces = group_faces(&mut builder, &edge_groups(wire), "side");
        let outline: Vec<(Point2<f64>, usize)> = wire
            .outline(tess)
            .into_iter()
            .map(|(p, edge)| (plane.to_local(&wire.plane().to_world(p)), edge))
            .collect();
        let n = outline.len();
        for i in 0..n {
            let (p, edge) = outline[i];
            let (q, _) = outline[(i + 1) % n];
            builder.quad([lift(p, lo), lift(q, lo), lift(q, hi), lift(p, hi)], faces[edge]);
        }
    }

    builder.build(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;
    use crate::sketch::ProfileBuilder;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::PI;

    #[test]
    fn test_extrude_rectangle() {
        let config = ModelingConfig::default();
        let wire = Wire::rectangle(Plane::xy(), 4.0, 2.0, false).unwrap();
        let solid = extrude(&wire, 3.0, false, &config).unwrap();
        assert_relative_eq!(solid.volume(), 24.0, epsilon = 1e-9);
        assert_eq!(solid.face_count(), 6);
        assert!(solid.is_watertight());

        let bbox = solid.bounding_box();
        assert_relative_eq!(bbox.min.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.z, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_symmetric_and_negative() {
        let config = ModelingConfig::default();
        let wire = Wire::rectangle(Plane::xy(), 2.0, 2.0, true).unwrap();

        let symmetric = extrude(&wire, 4.0, true, &config).unwrap();
        let bbox = symmetric.bounding_box();
        assert_relative_eq!(bbox.min.z, -2.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.z, 2.0, epsilon = 1e-12);

        let down = extrude(&wire, -1.0, false, &config).unwrap();
        assert_relative_eq!(down.volume(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(down.bounding_box().min.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_caps_are_tagged() {
        let config = ModelingConfig::default();
        let wire = Wire::rectangle(Plane::xy(), 2.0, 2.0, true).unwrap();
        let solid = extrude(&wire, 1.0, false, &config).unwrap();
        let tagged = |label: &str| solid.face_ids().into_iter().filter(|f| solid.label(*f) == Some(label)).count();
        assert_eq!(tagged("start"), 1);
        assert_eq!(tagged("end"), 1);
        assert_eq!(tagged("side"), 4);

        let end = solid
            .polygons()
            .iter()
            .find(|p| solid.label(p.face) == Some("end"))
            .unwrap();
        assert_relative_eq!(end.plane.normal, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_washer_volume() {
        let config = ModelingConfig::default();
        let region = Region::annulus(Plane::xy(), Point2::origin(), 17.0, 16.0).unwrap();
        let washer = extrude_region(&region, 1.0, false, &config).unwrap();
        let exact = PI * (17.0 * 17.0 - 16.0 * 16.0);
        assert!((washer.volume() - exact).abs() / exact < 0.005);
        assert!(washer.is_watertight());
        // two caps, one outer and one bore cylinder
        assert_eq!(washer.face_count(), 4);
    }

    #[test]
    fn test_open_wire_is_non_manifold() {
        let config = ModelingConfig::default();
        let wire = ProfileBuilder::new(Plane::xy())
            .line_to(5.0, 0.0)
            .line_to(5.0, 5.0)
            .wire()
            .unwrap();
        let err = extrude(&wire, 1.0, false, &config).unwrap_err();
        assert!(matches!(err, ModelingError::NonManifoldResult { .. }));
    }

    #[test]
    fn test_concave_profile() {
        let config = ModelingConfig::default();
        let wire = ProfileBuilder::new(Plane::xy())
            .line_to(4.0, 0.0)
            .line_to(4.0, 4.0)
            .line_to(3.0, 4.0)
            .line_to(3.0, 1.0)
            .line_to(0.0, 1.0)
            .close()
            .unwrap();
        let solid = extrude(&wire, 2.0, false, &config).unwrap();
        assert_relative_eq!(solid.volume(), 14.0, epsilon = 1e-9);
        assert!(solid.is_watertight());
    }

    #[test]
    fn test_zero_distance_rejected() {
        let config = ModelingConfig::default();
        let wire = Wire::rectangle(Plane::xy(), 1.0, 1.0, true).unwrap();
        assert!(extrude(&wire, 0.0, false, &config).is_err());
    }
}
