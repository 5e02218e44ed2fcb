// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 2D profiles on construction planes and 3D sweep rails

mod builder;
mod path;
mod region;
mod segment;
mod wire;

pub use builder::{builder_facing, ProfileBuilder};
pub use path::Path3;
pub use region::Region;
pub(crate) use region::triangulate_points;
pub use segment::{de_casteljau, Segment};
pub use wire::{Wire, WireEdge};
