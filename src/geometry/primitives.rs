// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator

use super::polygon::{FaceId, Polygon};
use super::Solid;
use crate::error::{require_positive, ModelingError, ModelingResult};
use nalgebra::{Point3, Vector3};
use std::f64::consts::{PI, TAU};

/// Solids built directly, without a profile
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Cuboid {
        size: Vector3<f64>,
        centered: [bool; 3],
    },
    Cylinder {
        radius: f64,
        height: f64,
        segments: usize,
    },
    Cone {
        radius_bottom: f64,
        radius_top: f64,
        height: f64,
        segments: usize,
    },
    Sphere {
        radius: f64,
        segments: usize,
    },
    PolygonPrism {
        sides: usize,
        diameter: f64,
        circumscribed: bool,
        height: f64,
    },
}

impl Primitive {
    /// Box of `size`; each flag centers that axis on the origin, otherwise it starts at 0
    pub fn cuboid(size: Vector3<f64>, centered: [bool; 3]) -> Self {
        Self::Cuboid { size, centered }
    }

    /// Cylinder along +Z with its base on the XY plane
    pub fn cylinder(radius: f64, height: f64, segments: usize) -> Self {
        Self::Cylinder {
            radius,
            height,
            segments,
        }
    }

    pub fn cone(radius_bottom: f64, radius_top: f64, height: f64, segments: usize) -> Self {
        Self::Cone {
            radius_bottom,
            radius_top,
            height,
            segments,
        }
    }

    /// Sphere centered on the origin
    pub fn sphere(radius: f64, segments: usize) -> Self {
        Self::Sphere { radius, segments }
    }

    /// Regular polygon prism along +Z
    ///
    /// With `circumscribed` the polygon wraps a circle of `diameter`,
    /// otherwise its corners lie on that circle.
    pub fn polygon_prism(sides: usize, diameter: f64, circumscribed: bool, height: f64) -> Self {
        Self::PolygonPrism {
            sides,
            diameter,
            circumscribed,
            height,
        }
    }

    pub fn to_solid(&self) -> ModelingResult<Solid> {
        match *self {
            Self::Cuboid { size, centered } => {
                require_positive("box", "length", size.x)?;
                require_positive("box", "width", size.y)?;
                require_positive("box", "height", size.z)?;
                Ok(generate_cuboid(size, centered))
            }
            Self::Cylinder {
                radius,
                height,
                segments,
            } => {
                require_positive("cylinder", "radius", radius)?;
                require_positive("cylinder", "height", height)?;
                Ok(generate_frustum(radius, radius, height, segments.max(3), false))
            }
            Self::Cone {
                radius_bottom,
                radius_top,
                height,
                segments,
            } => {
                require_positive("cone", "height", height)?;
                if !(radius_bottom >= 0.0 && radius_top >= 0.0) || radius_bottom + radius_top <= 0.0 {
                    return Err(ModelingError::invalid_parameter(
                        "cone",
                        format!("radii must be non-negative and not both zero, got {radius_bottom} and {radius_top}"),
                    ));
                }
                Ok(generate_frustum(radius_bottom, radius_top, height, segments.max(3), false))
            }
            Self::Sphere { radius, segments } => {
                require_positive("sphere", "radius", radius)?;
                Ok(generate_sphere(radius, segments.max(4)))
            }
            Self::PolygonPrism {
                sides,
                diameter,
                circumscribed,
                height,
            } => {
                require_positive("polygon_prism", "diameter", diameter)?;
                require_positive("polygon_prism", "height", height)?;
                if sides < 3 {
                    return Err(ModelingError::invalid_parameter(
                        "polygon_prism",
                        format!("a polygon needs at least 3 sides, got {sides}"),
                    ));
                }
                let mut radius = diameter / 2.0;
                if circumscribed {
                    radius /= (PI / sides as f64).cos();
                }
                Ok(generate_frustum(radius, radius, height, sides, true))
            }
        }
    }
}

fn generate_cuboid(size: Vector3<f64>, centered: [bool; 3]) -> Solid {
    let span = |axis: usize| {
        if centered[axis] {
            (-size[axis] / 2.0, size[axis] / 2.0)
        } else {
            (0.0, size[axis])
        }
    };
    let (x0, x1) = span(0);
    let (y0, y1) = span(1);
    let (z0, z1) = span(2);
    let p = Point3::new;

    // -Z, +Z, -Y, +Y, -X, +X
    let quads = [
        [p(x0, y0, z0), p(x0, y1, z0), p(x1, y1, z0), p(x1, y0, z0)],
        [p(x0, y0, z1), p(x1, y0, z1), p(x1, y1, z1), p(x0, y1, z1)],
        [p(x0, y0, z0), p(x1, y0, z0), p(x1, y0, z1), p(x0, y0, z1)],
        [p(x0, y1, z0), p(x0, y1, z1), p(x1, y1, z1), p(x1, y1, z0)],
        [p(x0, y0, z0), p(x0, y0, z1), p(x0, y1, z1), p(x0, y1, z0)],
        [p(x1, y0, z0), p(x1, y1, z0), p(x1, y1, z1), p(x1, y0, z1)],
    ];
    Solid::from_polygons(
        quads
            .iter()
            .enumerate()
            .filter_map(|(face, quad)| Polygon::new(quad.to_vec(), face as FaceId))
            .collect(),
    )
}

/// Ring-to-ring solid along +Z; `faceted` gives every side its own face
fn generate_frustum(r0: f64, r1: f64, height: f64, segments: usize, faceted: bool) -> Solid {
    let ring = |radius: f64, z: f64| -> Vec<Point3<f64>> {
        (0..segments)
            .map(|i| {
                let angle = TAU * i as f64 / segments as f64;
                Point3::new(radius * angle.cos(), radius * angle.sin(), z)
            })
            .collect()
    };
    let bottom = ring(r0, 0.0);
    let top = ring(r1, height);
    let (bottom_face, top_face) = if faceted {
        (segments as FaceId, segments as FaceId + 1)
    } else {
        (1, 2)
    };

    let mut polygons = Vec::with_capacity(segments + 2);
    for i in 0..segments {
        let j = (i + 1) % segments;
        let side = if faceted { i as FaceId } else { 0 };
        let mut quad = vec![bottom[i], bottom[j]];
        if r1 > 0.0 {
            quad.extend([top[j], top[i]]);
        } else {
            quad.push(top[i]);
        }
        if r0 == 0.0 {
            quad.remove(0);
        }
        polygons.extend(Polygon::new(quad, side));
    }
    if r0 > 0.0 {
        polygons.extend(Polygon::new(bottom.into_iter().rev().collect(), bottom_face));
    }
    if r1 > 0.0 {
        polygons.extend(Polygon::new(top, top_face));
    }
    Solid::from_polygons(polygons)
}

fn generate_sphere(radius: f64, segments: usize) -> Solid {
    let stacks = (segments / 2).max(2);
    let point = |stack: usize, slice: usize| {
        if stack == 0 {
            return Point3::new(0.0, 0.0, radius);
        }
        if stack == stacks {
            return Point3::new(0.0, 0.0, -radius);
        }
        let phi = PI * stack as f64 / stacks as f64;
        let theta = TAU * (slice % segments) as f64 / segments as f64;
        Point3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        )
    };

    let mut polygons = Vec::with_capacity(stacks * segments);
    for stack in 0..stacks {
        for slice in 0..segments {
            // south then east keeps the winding counter-clockwise from outside
            let a = point(stack, slice);
            let b = point(stack + 1, slice);
            let c = point(stack + 1, slice + 1);
            let d = point(stack, slice + 1);
            let patch = if stack == 0 {
                vec![a, b, c]
            } else if stack + 1 == stacks {
                vec![a, b, d]
            } else {
                vec![a, b, c, d]
            };
            polygons.extend(Polygon::new(patch, 0));
        }
    }
    Solid::from_polygons(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_volume_and_placement() {
        let solid = Primitive::cuboid(Vector3::new(10.0, 20.0, 30.0), [true, true, false])
            .to_solid()
            .unwrap();
        assert!((solid.volume() - 6000.0).abs() < 1e-9);
        let bbox = solid.bounding_box();
        assert!((bbox.min - Point3::new(-5.0, -10.0, 0.0)).norm() < 1e-12);
        assert!(solid.is_watertight());
    }

    #[test]
    fn test_cylinder_volume() {
        let solid = Primitive::cylinder(5.0, 10.0, 120).to_solid().unwrap();
        let exact = PI * 25.0 * 10.0;
        assert!((solid.volume() - exact).abs() / exact < 0.005);
        assert!(solid.is_watertight());
        assert_eq!(solid.face_count(), 3);
    }

    #[test]
    fn test_cone_apex() {
        let solid = Primitive::cone(3.0, 0.0, 6.0, 64).to_solid().unwrap();
        let exact = PI * 9.0 * 6.0 / 3.0;
        assert!((solid.volume() - exact).abs() / exact < 0.01);
        assert!(solid.is_watertight());
    }

    #[test]
    fn test_sphere_volume() {
        let solid = Primitive::sphere(5.0, 64).to_solid().unwrap();
        let exact = 4.0 / 3.0 * PI * 125.0;
        assert!((solid.volume() - exact).abs() / exact < 0.01);
        assert!(solid.is_watertight());
    }

    #[test]
    fn test_polygon_prism_circumscribed() {
        // A square around a circle of diameter 10 has side 10
        let solid = Primitive::polygon_prism(4, 10.0, true, 2.0).to_solid().unwrap();
        assert!((solid.volume() - 200.0).abs() < 1e-9);
        assert_eq!(solid.face_count(), 6);
        let inscribed = Primitive::polygon_prism(4, 10.0, false, 2.0).to_solid().unwrap();
        assert!((inscribed.volume() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(Primitive::cuboid(Vector3::new(0.0, 1.0, 1.0), [false; 3]).to_solid().is_err());
        assert!(Primitive::polygon_prism(2, 10.0, false, 1.0).to_solid().is_err());
        assert!(Primitive::cone(0.0, 0.0, 1.0, 16).to_solid().is_err());
    }
}
