// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel API: every configuration-dependent modeling operation
//!
//! A [`Kernel`] owns the [`ModelingConfig`] its operations run with. It holds
//! no other state, so one kernel may be shared by any number of concurrent
//! construction pipelines.

use crate::config::ModelingConfig;
use crate::construct;
use crate::error::ModelingResult;
use crate::features;
use crate::geometry::{perform_boolean_operation, BooleanOp, GeometryStats, Mesh, Primitive, Solid, Topology};
use crate::select::{self, EdgePredicate, EdgeSet, FacePredicate, FaceSet};
use crate::sketch::{Path3, Region, Wire};
use nalgebra::{Point3, Vector3};
use std::f64::consts::TAU;

/// Main kernel for solid construction
#[derive(Debug, Clone, Default)]
pub struct Kernel {
    config: ModelingConfig,
}

impl Kernel {
    /// Create a kernel with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ModelingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelingConfig {
        &self.config
    }

    fn circle_segments(&self) -> usize {
        self.config.tessellation.segments_for_angle(TAU)
    }

    /// Linear tolerance used when reading faces and edges of `solid`
    pub fn tolerance_for(&self, solid: &Solid) -> f64 {
        self.config.tolerance.weld_for(solid.bounding_box().diagonal())
    }

    /// Closed two-manifold boundary, welded with the configured tolerance
    pub fn is_watertight(&self, solid: &Solid) -> bool {
        solid.is_watertight_within(self.tolerance_for(solid))
    }

    pub fn shell_count(&self, solid: &Solid) -> usize {
        solid.shell_count_within(self.tolerance_for(solid))
    }

    pub fn to_mesh(&self, solid: &Solid) -> Mesh {
        solid.to_mesh_within(self.tolerance_for(solid))
    }

    pub fn stats(&self, solid: &Solid) -> GeometryStats {
        solid.stats_within(self.tolerance_for(solid))
    }

    // Constructors

    pub fn extrude(&self, wire: &Wire, distance: f64, symmetric: bool) -> ModelingResult<Solid> {
        construct::extrude(wire, distance, symmetric, &self.config)
    }

    pub fn extrude_region(&self, region: &Region, distance: f64, symmetric: bool) -> ModelingResult<Solid> {
        construct::extrude_region(region, distance, symmetric, &self.config)
    }

    pub fn revolve(
        &self,
        wire: &Wire,
        angle_deg: f64,
        axis_point: Point3<f64>,
        axis_direction: Vector3<f64>,
    ) -> ModelingResult<Solid> {
        construct::revolve(wire, angle_deg, axis_point, axis_direction, &self.config)
    }

    pub fn loft(&self, wires: &[Wire]) -> ModelingResult<Solid> {
        construct::loft(wires, &self.config)
    }

    pub fn loft_with(&self, wires: &[Wire], ruled: bool) -> ModelingResult<Solid> {
        construct::loft_with(wires, ruled, &self.config)
    }

    pub fn sweep(&self, profile: &Wire, path: &Path3) -> ModelingResult<Solid> {
        construct::sweep(profile, path, &self.config)
    }

    // Primitives

    /// Box of `length × width × height`; each flag centers that axis on the origin
    pub fn box_(&self, length: f64, width: f64, height: f64, centered: [bool; 3]) -> ModelingResult<Solid> {
        Primitive::cuboid(Vector3::new(length, width, height), centered).to_solid()
    }

    pub fn cylinder(&self, radius: f64, height: f64) -> ModelingResult<Solid> {
        Primitive::cylinder(radius, height, self.circle_segments()).to_solid()
    }

    pub fn cone(&self, radius_bottom: f64, radius_top: f64, height: f64) -> ModelingResult<Solid> {
        Primitive::cone(radius_bottom, radius_top, height, self.circle_segments()).to_solid()
    }

    pub fn sphere(&self, radius: f64) -> ModelingResult<Solid> {
        Primitive::sphere(radius, self.circle_segments()).to_solid()
    }

    pub fn polygon_prism(&self, sides: usize, diameter: f64, circumscribed: bool, height: f64) -> ModelingResult<Solid> {
        Primitive::polygon_prism(sides, diameter, circumscribed, height).to_solid()
    }

    // Booleans

    pub fn union(&self, a: &Solid, b: &Solid) -> ModelingResult<Solid> {
        perform_boolean_operation(a, b, BooleanOp::Union, &self.config)
    }

    pub fn subtract(&self, a: &Solid, b: &Solid) -> ModelingResult<Solid> {
        perform_boolean_operation(a, b, BooleanOp::Subtract, &self.config)
    }

    pub fn intersect(&self, a: &Solid, b: &Solid) -> ModelingResult<Solid> {
        perform_boolean_operation(a, b, BooleanOp::Intersect, &self.config)
    }

    /// Union of every solid, left to right; intermediate results are dropped as soon as they are superseded
    pub fn union_all<'a>(&self, solids: impl IntoIterator<Item = &'a Solid>) -> ModelingResult<Solid> {
        solids
            .into_iter()
            .try_fold(Solid::empty(), |acc, solid| self.union(&acc, solid))
    }

    /// Subtract every tool from `base` in turn
    pub fn subtract_all<'a>(&self, base: &Solid, tools: impl IntoIterator<Item = &'a Solid>) -> ModelingResult<Solid> {
        tools
            .into_iter()
            .try_fold(base.clone(), |acc, tool| self.subtract(&acc, tool))
    }

    // Selection

    pub fn topology(&self, solid: &Solid) -> Topology {
        Topology::of(solid, self.tolerance_for(solid))
    }

    pub fn select_faces(&self, solid: &Solid, predicate: &FacePredicate) -> ModelingResult<FaceSet> {
        let tolerance = self.tolerance_for(solid);
        select::select_faces(&Topology::of(solid, tolerance), predicate, tolerance)
    }

    pub fn select_edges(&self, solid: &Solid, predicate: &EdgePredicate) -> ModelingResult<EdgeSet> {
        let tolerance = self.tolerance_for(solid);
        select::select_edges(&Topology::of(solid, tolerance), predicate, tolerance)
    }

    // Features

    pub fn fillet(&self, solid: &Solid, edges: &EdgeSet, radius: f64) -> ModelingResult<Solid> {
        features::fillet(solid, edges, radius, &self.config)
    }

    pub fn chamfer(&self, solid: &Solid, edges: &EdgeSet, distance: f64) -> ModelingResult<Solid> {
        features::chamfer(solid, edges, distance, &self.config)
    }

    pub fn shell(&self, solid: &Solid, open: &FaceSet, thickness: f64) -> ModelingResult<Solid> {
        features::shell(solid, open, thickness, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_basic_pipeline() {
        let kernel = Kernel::new();
        let block = kernel.box_(10.0, 10.0, 10.0, [true, true, false]).unwrap();
        let bore = kernel.cylinder(2.0, 20.0).unwrap();
        let drilled = kernel.subtract(&block, &bore).unwrap();
        assert!(drilled.volume() < block.volume());
        assert!(drilled.is_watertight());
        let top = kernel
            .select_faces(&drilled, &FacePredicate::normal_equals(Vector3::z(), 1.0))
            .unwrap();
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn test_union_all_and_empty() {
        let kernel = Kernel::new();
        assert!(kernel.union_all(std::iter::empty()).unwrap().is_empty());
        let a = kernel.box_(1.0, 1.0, 1.0, [false; 3]).unwrap();
        let b = kernel.box_(1.0, 1.0, 2.0, [false; 3]).unwrap();
        let both = kernel.union_all([&a, &b]).unwrap();
        assert!((both.volume() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_closure_uses_configured_tolerance() {
        use crate::config::ModelingConfig;
        use crate::geometry::Transform;

        let kernel = Kernel::new();
        let cube = kernel.box_(1.0, 1.0, 1.0, [false; 3]).unwrap();
        // Lift the lid by 1e-5, past the default weld distance
        let lift = Transform::translation(Vector3::new(0.0, 0.0, 1e-5));
        let polygons = cube
            .polygons()
            .iter()
            .map(|p| if p.plane.normal.z > 0.5 { p.transformed(&lift) } else { p.clone() })
            .collect();
        let gapped = Solid::from_polygons(polygons);

        assert!(!kernel.is_watertight(&gapped));
        assert!(!gapped.is_watertight());

        let mut config = ModelingConfig::default();
        config.tolerance.relative = 1e-5;
        let coarse = Kernel::with_config(config);
        assert!(coarse.is_watertight(&gapped));
        assert_eq!(coarse.shell_count(&gapped), 1);
        assert!(coarse.stats(&gapped).is_watertight);
    }
}
