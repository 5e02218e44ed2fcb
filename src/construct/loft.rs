// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Lofting between closed sections on distinct planes
//!
//! Sections may have different edge and vertex counts. Each one is
//! parameterised by normalised arc length from an aligned start point and
//! resampled at the union of every section's corner parameters, so corners
//! survive and circle-to-polygon blends stay ruled between matching points.

use super::{edge_groups, SolidBuilder};
use crate::config::{ModelingConfig, TessellationConfig};
use crate::error::{ModelingError, ModelingResult};
use crate::geometry::{FaceId, Plane, Solid};
use crate::sketch::{triangulate_points, Wire};
use crate::utils::math::newell_normal;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;

/// Parameters closer than this are the same correspondence point
const PARAMETER_TOLERANCE: f64 = 1e-9;

struct Section {
    plane: Plane,
    points: Vec<Point3<f64>>,
    /// Face group of the edge leaving each point
    groups: Vec<usize>,
}

impl Section {
    fn new(wire: &Wire, tessellation: &TessellationConfig) -> Self {
        let plane = *wire.plane();
        let groups = edge_groups(wire);
        let (points, groups) = wire
            .outline(tessellation)
            .into_iter()
            .map(|(p, edge)| (plane.to_world(p), groups[edge]))
            .unzip();
        Self { plane, points, groups }
    }

    fn centroid(&self) -> Point3<f64> {
        let sum = self.points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.points.len() as f64)
    }

    fn reverse(&mut self) {
        let n = self.points.len();
        let groups = (0..n).map(|k| self.groups[(2 * n - 2 - k) % n]).collect();
        self.points.reverse();
        self.groups = groups;
    }

    /// Restart the loop where a ray from its centroid along `reference` leaves it
    ///
    /// The crossing becomes a vertex when it falls inside an edge, so a
    /// circle following a square starts on the square's edge midpoint rather
    /// than twisting towards a corner.
    fn align_start(&mut self, reference: &Vector3<f64>) {
        let n = self.points.len();
        let centroid = self.centroid();
        let origin = self.plane.to_local(&centroid);
        let ray = self.plane.to_local(&(centroid + reference)) - origin;

        let mut hit: Option<(f64, usize, f64)> = None;
        if ray.norm() > 1e-9 {
            let ray = ray.normalize();
            for i in 0..n {
                let a = self.plane.to_local(&self.points[i]) - origin;
                let b = self.plane.to_local(&self.points[(i + 1) % n]) - origin;
                let edge = b - a;
                let denominator = ray.perp(&edge);
                if denominator.abs() < 1e-15 {
                    continue;
                }
                let s = a.perp(&edge) / denominator;
                let u = a.perp(&ray) / denominator;
                if s > 0.0 && (-1e-12..=1.0 + 1e-12).contains(&u) && hit.map_or(true, |(best, ..)| s < best) {
                    hit = Some((s, i, u));
                }
            }
        }

        let start = match hit {
            Some((_, i, u)) if u <= PARAMETER_TOLERANCE => i,
            Some((_, i, u)) if u >= 1.0 - PARAMETER_TOLERANCE => (i + 1) % n,
            Some((_, i, u)) => {
                let p = self.points[i] + (self.points[(i + 1) % n] - self.points[i]) * u;
                self.points.insert(i + 1, p);
                self.groups.insert(i + 1, self.groups[i]);
                i + 1
            }
            None => {
                let score = |p: &Point3<f64>| (p - centroid).normalize().dot(reference);
                (0..n).fold(0, |best, i| {
                    if score(&self.points[i]) > score(&self.points[best]) + 1e-12 {
                        i
                    } else {
                        best
                    }
                })
            }
        };
        self.points.rotate_left(start);
        self.groups.rotate_left(start);
    }

    fn start_direction(&self) -> Vector3<f64> {
        (self.points[0] - self.centroid()).normalize()
    }

    /// Normalised arc-length parameter of every point
    fn parameters(&self) -> Vec<f64> {
        let n = self.points.len();
        let mut lengths = Vec::with_capacity(n);
        let mut total = 0.0;
        for i in 0..n {
            lengths.push(total);
            total += (self.points[(i + 1) % n] - self.points[i]).norm();
        }
        lengths.into_iter().map(|l| l / total).collect()
    }

    /// Points and edge groups at each of `targets`
    fn resample(&self, targets: &[f64]) -> (Vec<Point3<f64>>, Vec<usize>) {
        let own = self.parameters();
        let n = self.points.len();
        targets
            .iter()
            .map(|&t| {
                let mut i = own.partition_point(|&s| s <= t + PARAMETER_TOLERANCE).saturating_sub(1);
                let next = if i + 1 < n { own[i + 1] } else { 1.0 };
                let mut u = (t - own[i]) / (next - own[i]);
                if u >= 1.0 - PARAMETER_TOLERANCE {
                    i = (i + 1) % n;
                    u = 0.0;
                }
                let point = if u <= PARAMETER_TOLERANCE {
                    self.points[i]
                } else {
                    self.points[i] + (self.points[(i + 1) % n] - self.points[i]) * u
                };
                (point, self.groups[i])
            })
            .unzip()
    }
}

/// Uniform Catmull-Rom point between `p1` and `p2`
fn catmull_rom(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>, u: f64) -> Point3<f64> {
    let (u2, u3) = (u * u, u * u * u);
    let v = p1.coords * 2.0
        + (p2.coords - p0.coords) * u
        + (p0.coords * 2.0 - p1.coords * 5.0 + p2.coords * 4.0 - p3.coords) * u2
        + (p1.coords * 3.0 - p0.coords - p2.coords * 3.0 + p3.coords) * u3;
    Point3::from(v * 0.5)
}

/// Smooth loft through `wires` in order
pub fn loft(wires: &[Wire], config: &ModelingConfig) -> ModelingResult<Solid> {
    loft_with(wires, false, config)
}

/// Loft with ruled (straight) or smooth transitions
///
/// Smooth transitions interpolate corresponding points through every
/// section with Catmull-Rom splines, inserting `loft.span_subdivisions`
/// rings per span. With two sections both modes coincide.
pub fn loft_with(wires: &[Wire], ruled: bool, config: &ModelingConfig) -> ModelingResult<Solid> {
    const OP: &str = "loft";
    if wires.len() < 2 {
        return Err(ModelingError::invalid_parameter(
            OP,
            format!("at least two sections are required, got {}", wires.len()),
        ));
    }
    let tess = &config.tessellation;
    for wire in wires {
        wire.require_closed(OP)?;
        wire.check_simple(OP, tess)?;
    }

    let mut sections: Vec<Section> = wires.iter().map(|w| Section::new(w, tess)).collect();
    let scale = sections
        .iter()
        .flat_map(|s| s.points.iter())
        .map(|p| p.coords.norm())
        .fold(1.0, f64::max);
    for (k, pair) in sections.windows(2).enumerate() {
        if pair[0].plane.is_coplanar(&pair[1].plane, 1e-9 * scale) {
            return Err(ModelingError::invalid_parameter(
                OP,
                format!("sections {k} and {} lie on the same plane", k + 1),
            ));
        }
    }

    // Orient every loop counter-clockwise about the local loft direction
    let count = sections.len();
    let directions: Vec<Vector3<f64>> = (0..count)
        .map(|k| {
            let (a, b) = if k + 1 < count { (k, k + 1) } else { (k - 1, k) };
            sections[b].centroid() - sections[a].centroid()
        })
        .collect();
    for (section, direction) in sections.iter_mut().zip(&directions) {
        if newell_normal(&section.points).dot(direction) < 0.0 {
            section.reverse();
        }
    }
    for k in 1..count {
        let reference = sections[k - 1].start_direction();
        sections[k].align_start(&reference);
    }

    let mut targets: Vec<f64> = sections.iter().flat_map(Section::parameters).collect();
    targets.sort_by(f64::total_cmp);
    targets.dedup_by(|b, a| (*b - *a).abs() <= PARAMETER_TOLERANCE);
    let resampled: Vec<(Vec<Point3<f64>>, Vec<usize>)> = sections.iter().map(|s| s.resample(&targets)).collect();

    // Rings in order, with the span each gap between rings belongs to
    let mut rings: Vec<Vec<Point3<f64>>> = vec![resampled[0].0.clone()];
    let mut spans: Vec<usize> = Vec::new();
    let subdivisions = if ruled || count < 3 { 0 } else { config.loft.span_subdivisions };
    for span in 0..count - 1 {
        let at = |k: isize| -> Vec<Point3<f64>> {
            let last = count as isize - 1;
            if k < 0 {
                // Reflect the first section through the second
                resampled[0].0.iter().zip(&resampled[1].0).map(|(a, b)| a + (a - b)).collect()
            } else if k > last {
                let (a, b) = (&resampled[last as usize].0, &resampled[last as usize - 1].0);
                a.iter().zip(b).map(|(a, b)| a + (a - b)).collect()
            } else {
                resampled[k as usize].0.clone()
            }
        };
        let s = span as isize;
        let (p0, p1, p2, p3) = (at(s - 1), at(s), at(s + 1), at(s + 2));
        for j in 1..=subdivisions {
            let u = j as f64 / (subdivisions + 1) as f64;
            rings.push((0..targets.len()).map(|i| catmull_rom(&p0[i], &p1[i], &p2[i], &p3[i], u)).collect());
            spans.push(span);
        }
        rings.push(p2);
        spans.push(span);
    }

    let mut builder = SolidBuilder::new(OP);
    let start = builder.face("start");
    let end = builder.face("end");
    let mut side_faces: BTreeMap<(usize, usize, usize), FaceId> = BTreeMap::new();

    let n = targets.len();
    for (gap, &span) in spans.iter().enumerate() {
        let (a, b) = (&rings[gap], &rings[gap + 1]);
        for i in 0..n {
            let j = (i + 1) % n;
            let key = (span, resampled[span].1[i], resampled[span + 1].1[i]);
            let face = match side_faces.get(&key) {
                Some(&face) => face,
                None => {
                    let face = builder.face("side");
                    side_faces.insert(key, face);
                    face
                }
            };
            builder.quad([a[i], a[j], b[j], b[i]], face);
        }
    }

    for (section, ring, direction, face, backwards) in [
        (&sections[0], &rings[0], &directions[0], start, true),
        (&sections[count - 1], &rings[rings.len() - 1], &directions[count - 1], end, false),
    ] {
        let local: Vec<_> = ring.iter().map(|p| section.plane.to_local(p)).collect();
        // Local ccw triangles face along the section's own normal
        let facing = section.plane.normal().dot(direction) >= 0.0;
        let flip = facing == backwards;
        for t in triangulate_points(&local, &[])? {
            let [a, b, c] = t.map(|i| ring[i]);
            if flip {
                builder.polygon(&[a, c, b], face);
            } else {
                builder.polygon(&[a, b, c], face);
            }
        }
    }

    builder.build(config)
}
