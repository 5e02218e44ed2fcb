// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

use super::{defaults_of, resolve_params, PartGenerator};
use crate::geometry::Plane;
use crate::kernel::Kernel;
use crate::scene::{DisplayMeta, Scene};
use crate::sketch::Region;
use anyhow::{Context, Result};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WasherParams {
    pub outer_diameter: f64,
    pub inner_diameter: f64,
    pub thickness: f64,
}

impl Default for WasherParams {
    fn default() -> Self {
        Self {
            outer_diameter: 34.0,
            inner_diameter: 32.0,
            thickness: 1.0,
        }
    }
}

/// Flat ring spacer
#[derive(Debug, Clone, Copy, Default)]
pub struct Washer;

impl Washer {
    pub fn generate(&self, kernel: &Kernel, params: &WasherParams) -> Result<Scene> {
        let ring = Region::annulus(
            Plane::xy(),
            Point2::origin(),
            params.outer_diameter / 2.0,
            params.inner_diameter / 2.0,
        )?;
        let washer = kernel.extrude_region(&ring, params.thickness, false)?;
        Ok(Scene::new().with_item(
            "washer",
            washer,
            Default::default(),
            DisplayMeta::colored([0.75, 0.75, 0.8]),
        ))
    }
}

impl PartGenerator for Washer {
    fn name(&self) -> &'static str {
        "washer"
    }

    fn describe(&self) -> &'static str {
        "Flat ring extruded from an annulus"
    }

    fn defaults(&self) -> Value {
        defaults_of::<WasherParams>()
    }

    fn build(&self, kernel: &Kernel, overrides: &[(String, String)]) -> Result<Scene> {
        let params: WasherParams = resolve_params(overrides).context("washer")?;
        self.generate(kernel, &params)
            .with_context(|| format!("washer {params:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_default_washer_volume() {
        let scene = Washer.build(&Kernel::new(), &[]).unwrap();
        let washer = &scene.get("washer").unwrap().solid;
        let expected = PI * (17.0f64.powi(2) - 16.0f64.powi(2));
        assert!((washer.volume() - expected).abs() / expected < 0.005);
        assert!(washer.is_watertight());
    }

    #[test]
    fn test_inverted_diameters_fail_with_context() {
        let overrides = [("inner_diameter".to_string(), "40".to_string())];
        let err = Washer.build(&Kernel::new(), &overrides).unwrap_err();
        assert!(format!("{err:#}").contains("washer"));
    }
}
