// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - solid representation and operations

pub mod analytics;
mod bbox;
mod boolean;
pub(crate) mod bsp;
mod mesh;
pub mod mesh_utils;
mod plane;
mod polygon;
mod primitives;
pub(crate) mod repair;
mod solid;
mod topology;
mod transform;

pub use analytics::GeometryStats;
pub use bbox::BoundingBox;
pub use boolean::{perform_boolean_operation, BooleanOp};
pub(crate) use boolean::finish;
pub use mesh::{Mesh, Triangle, Vertex};
pub use plane::Plane;
pub use polygon::{FaceId, Polygon, SurfacePlane};
pub use primitives::Primitive;
pub use solid::Solid;
pub use topology::{Edge, Face, Topology};
pub use transform::{Transform, Transformable};
