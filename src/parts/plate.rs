// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

use super::{defaults_of, resolve_params, PartGenerator};
use crate::geometry::{Solid, Transformable};
use crate::kernel::Kernel;
use crate::scene::{DisplayMeta, Scene};
use crate::select::EdgePredicate;
use anyhow::{bail, Context, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateParams {
    pub length: f64,
    pub width: f64,
    pub thickness: f64,
    pub corner_radius: f64,
    /// Zero leaves the plate undrilled
    pub hole_diameter: f64,
    /// Distance from each side to the hole centers
    pub hole_inset: f64,
}

impl Default for PlateParams {
    fn default() -> Self {
        Self {
            length: 40.0,
            width: 40.0,
            thickness: 5.0,
            corner_radius: 3.0,
            hole_diameter: 3.2,
            hole_inset: 5.0,
        }
    }
}

impl PlateParams {
    fn validate(&self) -> Result<()> {
        if self.hole_diameter < 0.0 {
            bail!("hole_diameter must not be negative");
        }
        if self.hole_diameter > 0.0 {
            let edge_clearance = self.hole_inset - self.hole_diameter / 2.0;
            if edge_clearance <= 0.0 {
                bail!("holes of diameter {} break through the sides at inset {}", self.hole_diameter, self.hole_inset);
            }
            if 2.0 * self.hole_inset + self.hole_diameter >= self.length.min(self.width) {
                bail!("holes at inset {} overlap on a {}×{} plate", self.hole_inset, self.length, self.width);
            }
        }
        Ok(())
    }
}

/// Mounting plate with rounded corners and a hole near each corner
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundedPlate;

impl RoundedPlate {
    pub fn generate(&self, kernel: &Kernel, params: &PlateParams) -> Result<Scene> {
        params.validate()?;
        let blank = kernel.box_(params.length, params.width, params.thickness, [true, true, false])?;
        let corners = kernel.select_edges(&blank, &EdgePredicate::parallel_to_axis(Vector3::z()))?;
        let mut plate = kernel.fillet(&blank, &corners, params.corner_radius)?;

        if params.hole_diameter > 0.0 {
            let bore = kernel.cylinder(params.hole_diameter / 2.0, params.thickness + 2.0)?;
            let (dx, dy) = (
                params.length / 2.0 - params.hole_inset,
                params.width / 2.0 - params.hole_inset,
            );
            let bores: Vec<Solid> = [(dx, dy), (-dx, dy), (-dx, -dy), (dx, -dy)]
                .into_iter()
                .map(|(x, y)| bore.translate(Vector3::new(x, y, -1.0)))
                .collect();
            plate = kernel.subtract_all(&plate, &bores)?;
        }
        debug!(volume = plate.volume(), faces = plate.face_count(), "rounded plate");
        Ok(Scene::new().with_item("plate", plate, Default::default(), DisplayMeta::colored([0.55, 0.6, 0.7])))
    }
}

impl PartGenerator for RoundedPlate {
    fn name(&self) -> &'static str {
        "rounded_plate"
    }

    fn describe(&self) -> &'static str {
        "Plate with filleted vertical corners and four mounting holes"
    }

    fn defaults(&self) -> Value {
        defaults_of::<PlateParams>()
    }

    fn build(&self, kernel: &Kernel, overrides: &[(String, String)]) -> Result<Scene> {
        let params: PlateParams = resolve_params(overrides).context("rounded_plate")?;
        self.generate(kernel, &params)
            .with_context(|| format!("rounded_plate {params:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_undrilled_plate_volume() {
        let params = PlateParams {
            hole_diameter: 0.0,
            ..PlateParams::default()
        };
        let scene = RoundedPlate.generate(&Kernel::new(), &params).unwrap();
        let plate = &scene.get("plate").unwrap().solid;
        let expected = 40.0 * 40.0 * 5.0 - 4.0 * 9.0 * (1.0 - PI / 4.0) * 5.0;
        assert!((plate.volume() - expected).abs() / expected < 1e-4, "volume {}", plate.volume());
        assert!(plate.is_watertight());
    }

    #[test]
    fn test_drilled_plate() {
        let scene = RoundedPlate.build(&Kernel::new(), &[]).unwrap();
        let plate = &scene.get("plate").unwrap().solid;
        assert!(plate.is_watertight());
        assert_eq!(plate.shell_count(), 1);
        let holes = 4.0 * PI * 1.6 * 1.6 * 5.0;
        let undrilled = 40.0 * 40.0 * 5.0 - 4.0 * 9.0 * (1.0 - PI / 4.0) * 5.0;
        assert!((plate.volume() - (undrilled - holes)).abs() < 1.0);
    }

    #[test]
    fn test_oversized_fillet_reports_params() {
        let overrides = [("corner_radius".to_string(), "25".to_string())];
        let err = RoundedPlate.build(&Kernel::new(), &overrides).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("rounded_plate"));
        assert!(message.contains("corner_radius: 25.0"));
    }
}
