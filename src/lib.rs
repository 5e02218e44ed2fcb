// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Partforge
//!
//! Parametric solid construction for printable parts: 2D profiles on
//! construction planes, promotion to solids (extrude, revolve, loft, sweep),
//! robust booleans over a polygonal boundary representation, boundary
//! selection, and edge dressing (fillet, chamfer, shell).
//!
//! ```no_run
//! use partforge::{EdgePredicate, Kernel};
//! use nalgebra::Vector3;
//!
//! let kernel = Kernel::new();
//! let plate = kernel.box_(40.0, 40.0, 5.0, [true, true, false])?;
//! let corners = kernel.select_edges(&plate, &EdgePredicate::parallel_to_axis(Vector3::z()))?;
//! let rounded = kernel.fillet(&plate, &corners, 3.0)?;
//! println!("volume {:.2}", rounded.volume());
//! # Ok::<(), partforge::ModelingError>(())
//! ```

pub mod cli;
pub mod config;
pub mod construct;
pub mod error;
pub mod features;
pub mod geometry;
pub mod kernel;
pub mod parts;
pub mod scene;
pub mod select;
pub mod sketch;
pub mod utils;

pub use config::ModelingConfig;
pub use error::{ErrorKind, ModelingError, ModelingResult};
pub use geometry::{BoundingBox, GeometryStats, Mesh, Plane, Primitive, Solid, Topology, Transform, Transformable};
pub use kernel::Kernel;
pub use parts::PartGenerator;
pub use scene::{DisplayMeta, NullSink, Scene, SceneSink, StatsSink};
pub use select::{EdgePredicate, EdgeSet, FacePredicate, FaceSet};
pub use sketch::{Path3, ProfileBuilder, Region, Wire};
