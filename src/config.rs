// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Modeling configuration: tolerance policy and tessellation density

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file looked up by [`ModelingConfig::load`]
pub const CONFIG_FILE: &str = "partforge.toml";

/// Coincident-boundary tolerance policy
///
/// The effective linear epsilon of an operation is
/// `max(relative * bbox_diagonal, minimum)`, where the diagonal is taken over
/// every input of that operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    pub relative: f64,
    pub minimum: f64,
    /// Vertex welding distance as a multiple of the linear epsilon
    pub weld_factor: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            relative: 1e-7,
            minimum: 1e-9,
            weld_factor: 2.0,
        }
    }
}

impl ToleranceConfig {
    /// Linear epsilon for a model of the given bounding-box diagonal
    pub fn epsilon_for(&self, diagonal: f64) -> f64 {
        (self.relative * diagonal).max(self.minimum)
    }

    /// Welding distance for a model of the given bounding-box diagonal
    pub fn weld_for(&self, diagonal: f64) -> f64 {
        self.epsilon_for(diagonal) * self.weld_factor
    }
}

/// How finely curves are turned into polygons
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationConfig {
    /// Maximum angle subtended by one chord of an arc, in degrees
    pub angular_step_deg: f64,
    /// Chords per bezier edge
    pub bezier_segments: usize,
    /// Minimum number of chords for a full circle
    pub min_circle_segments: usize,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            angular_step_deg: 3.0,
            bezier_segments: 24,
            min_circle_segments: 12,
        }
    }
}

impl TessellationConfig {
    /// Number of chords used for an arc sweeping `angle` radians
    pub fn segments_for_angle(&self, angle: f64) -> usize {
        let full = (360.0 / self.angular_step_deg - 1e-9)
            .ceil()
            .max(self.min_circle_segments as f64);
        let fraction = (angle.abs() / std::f64::consts::TAU).min(1.0);
        ((full * fraction - 1e-9).ceil() as usize).max(1)
    }
}

/// Loft interpolation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoftConfig {
    /// Rings inserted between consecutive sections when lofting smoothly
    pub span_subdivisions: usize,
}

impl Default for LoftConfig {
    fn default() -> Self {
        Self {
            span_subdivisions: 8,
        }
    }
}

/// Configuration carried by a [`crate::Kernel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelingConfig {
    pub tolerance: ToleranceConfig,
    pub tessellation: TessellationConfig,
    pub loft: LoftConfig,
    /// Merge coplanar neighbouring faces after each boolean
    pub clean_coplanar: bool,
}

impl Default for ModelingConfig {
    fn default() -> Self {
        Self {
            tolerance: ToleranceConfig::default(),
            tessellation: TessellationConfig::default(),
            loft: LoftConfig::default(),
            clean_coplanar: true,
        }
    }
}

impl ModelingConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: ModelingConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        if let Ok(step) = std::env::var("PARTFORGE_ANGULAR_STEP") {
            config.tessellation.angular_step_deg = step
                .parse()
                .with_context(|| format!("PARTFORGE_ANGULAR_STEP is not a number: {step}"))?;
        }

        if let Ok(relative) = std::env::var("PARTFORGE_TOLERANCE") {
            config.tolerance.relative = relative
                .parse()
                .with_context(|| format!("PARTFORGE_TOLERANCE is not a number: {relative}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Reject settings that would make every operation meaningless
    pub fn validate(&self) -> Result<()> {
        let step = self.tessellation.angular_step_deg;
        if !(step > 0.0 && step <= 45.0) {
            bail!("angular_step_deg must be in (0, 45], got {step}");
        }
        if self.tessellation.bezier_segments == 0 {
            bail!("bezier_segments must be at least 1");
        }
        if self.tessellation.min_circle_segments < 3 {
            bail!("min_circle_segments must be at least 3");
        }
        let tol = &self.tolerance;
        if !(tol.relative > 0.0 && tol.relative < 1e-2) {
            bail!("tolerance.relative must be in (0, 0.01), got {}", tol.relative);
        }
        if !(tol.minimum > 0.0) || !(tol.weld_factor >= 1.0) {
            bail!("tolerance.minimum must be positive and weld_factor at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ModelingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_segments_for_angle() {
        let tess = TessellationConfig::default();
        assert_eq!(tess.segments_for_angle(std::f64::consts::TAU), 120);
        assert_eq!(tess.segments_for_angle(std::f64::consts::FRAC_PI_2), 30);
        assert_eq!(tess.segments_for_angle(1e-6), 1);
    }

    #[test]
    fn test_epsilon_floor() {
        let tol = ToleranceConfig::default();
        assert_eq!(tol.epsilon_for(0.0), tol.minimum);
        assert!((tol.epsilon_for(100.0) - 1e-5).abs() < 1e-12);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ModelingConfig = toml::from_str("[tessellation]\nangular_step_deg = 6.0\n").unwrap();
        assert_eq!(config.tessellation.angular_step_deg, 6.0);
        assert_eq!(config.tolerance, ToleranceConfig::default());
    }

    #[test]
    fn test_rejects_bad_step() {
        let mut config = ModelingConfig::default();
        config.tessellation.angular_step_deg = 0.0;
        assert!(config.validate().is_err());
    }
}
