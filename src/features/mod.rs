// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Local feature operations: fillet, chamfer and shell
//!
//! Features never clamp. A radius, distance or wall thickness that does not
//! fit the material around the selection fails with
//! [`crate::ModelingError::InfeasibleFeature`] before any geometry is built.

mod fillet;
mod shell;

pub use fillet::{chamfer, fillet};
pub use shell::shell;

use crate::config::ModelingConfig;
use crate::construct::SolidBuilder;
use crate::error::ModelingResult;
use crate::geometry::{FaceId, Solid};
use crate::sketch::triangulate_points;
use crate::utils::math::{any_perpendicular, newell_normal};
use nalgebra::{Point2, Point3, Vector3};

fn centroid(ring: &[Point3<f64>]) -> Point3<f64> {
    let sum = ring.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / ring.len() as f64)
}

/// Solid through a sequence of congruent section rings
///
/// Section edge `i` runs from point `i` to point `i + 1`; edges flagged in
/// `blend` share one face tagged `label`. Open sequences are capped at both
/// ends, closed ones wrap from the last ring back to the first.
pub(crate) fn skin(
    operation: &'static str,
    mut rings: Vec<Vec<Point3<f64>>>,
    blend: &[bool],
    closed: bool,
    label: &str,
    config: &ModelingConfig,
) -> ModelingResult<Solid> {
    let n = rings[0].len();
    let mut blend = blend.to_vec();
    let advance = centroid(&rings[1]) - centroid(&rings[0]);
    if newell_normal(&rings[0]).dot(&advance) < 0.0 {
        for ring in &mut rings {
            ring.reverse();
        }
        blend = (0..n).map(|i| blend[(2 * n - 2 - i) % n]).collect();
    }

    let mut builder = SolidBuilder::new(operation);
    let surface = builder.face(label);
    let faces: Vec<FaceId> = blend
        .iter()
        .map(|&b| if b { surface } else { builder.face("tool") })
        .collect();

    let count = rings.len();
    let spans = if closed { count } else { count - 1 };
    for k in 0..spans {
        let (a, b) = (&rings[k], &rings[(k + 1) % count]);
        for i in 0..n {
            let j = (i + 1) % n;
            builder.quad([a[i], a[j], b[j], b[i]], faces[i]);
        }
    }

    if !closed {
        let normal = newell_normal(&rings[0]).normalize();
        let x = any_perpendicular(&normal).into_inner();
        let y = normal.cross(&x);
        let origin = rings[0][0];
        let flat: Vec<Point2<f64>> = rings[0]
            .iter()
            .map(|p| Point2::new((p - origin).dot(&x), (p - origin).dot(&y)))
            .collect();
        let start = builder.face("tool");
        let end = builder.face("tool");
        let last = &rings[count - 1];
        for [a, b, c] in triangulate_points(&flat, &[])? {
            builder.polygon(&[rings[0][a], rings[0][c], rings[0][b]], start);
            builder.polygon(&[last[a], last[b], last[c]], end);
        }
    }

    builder.build(config)
}
