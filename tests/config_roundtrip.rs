// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Configuration persistence and its effect on tessellation

use anyhow::Result;
use partforge::{Kernel, ModelingConfig};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_config_save_and_load() -> Result<()> {
    let mut config = ModelingConfig::default();
    config.tessellation.angular_step_deg = 10.0;
    config.tolerance.relative = 1e-6;
    config.clean_coplanar = false;

    let file = NamedTempFile::new()?;
    config.save(file.path())?;
    let text = std::fs::read_to_string(file.path())?;
    println!("{text}");

    let loaded = ModelingConfig::from_file(file.path())?;
    assert_eq!(loaded, config);
    Ok(())
}

#[test]
fn test_partial_file_uses_defaults() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "[tessellation]\nangular_step_deg = 6.0")?;

    let loaded = ModelingConfig::from_file(file.path())?;
    assert_eq!(loaded.tessellation.angular_step_deg, 6.0);
    assert_eq!(loaded.tolerance, ModelingConfig::default().tolerance);
    assert!(loaded.clean_coplanar);
    Ok(())
}

#[test]
fn test_invalid_file_is_rejected() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "[tessellation]\nangular_step_deg = 0.0")?;
    let err = ModelingConfig::from_file(file.path()).unwrap_err();
    println!("{err:#}");
    assert!(format!("{err:#}").contains("angular_step_deg"));

    let mut garbage = NamedTempFile::new()?;
    writeln!(garbage, "tolerance = [")?;
    assert!(ModelingConfig::from_file(garbage.path()).is_err());
    Ok(())
}

#[test]
fn test_coarser_tessellation_changes_circles() -> Result<()> {
    let fine = Kernel::new();
    let mut config = ModelingConfig::default();
    config.tessellation.angular_step_deg = 30.0;
    let coarse = Kernel::with_config(config);

    let a = fine.cylinder(10.0, 1.0)?;
    let b = coarse.cylinder(10.0, 1.0)?;
    println!("fine {:.4}, coarse {:.4}", a.volume(), b.volume());
    // 12 chords inscribe 3/π of the disc
    assert!((b.volume() - 300.0).abs() < 1e-9);
    assert!(a.volume() > b.volume());
    Ok(())
}
