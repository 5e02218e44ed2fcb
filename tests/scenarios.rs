// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end part scenarios

use anyhow::Result;
use nalgebra::{Point2, Point3, Vector3};
use partforge::parts::{
    self, parse_overrides, DovetailTray, PartGenerator, PlateParams, RoundedPlate, TrayParams, Washer,
};
use partforge::{
    EdgePredicate, FacePredicate, Kernel, NullSink, Path3, Plane, ProfileBuilder, Region, Scene, SceneSink, StatsSink,
    Transformable, Wire,
};
use std::f64::consts::PI;

#[test]
fn test_washer_volume() -> Result<()> {
    let kernel = Kernel::new();
    let ring = Region::annulus(Plane::xy(), Point2::origin(), 17.0, 16.0)?;
    let washer = kernel.extrude_region(&ring, 1.0, false)?;
    let expected = PI * (17.0f64.powi(2) - 16.0f64.powi(2));

    println!("washer: {:.4} mm³ (expected {:.2})", washer.volume(), expected);
    assert!((washer.volume() - 103.67).abs() / 103.67 < 0.005);
    assert!((washer.volume() - expected).abs() / expected < 0.005);
    assert!(washer.is_watertight());

    let scene = Washer.build(&kernel, &[])?;
    assert!(scene.get("washer").is_some_and(|item| item.solid.is_congruent(&washer, 1e-9)));
    Ok(())
}

#[test]
fn test_rounded_plate_volume() -> Result<()> {
    let kernel = Kernel::new();
    let blank = kernel.box_(40.0, 40.0, 5.0, [true, true, false])?;
    let corners = kernel.select_edges(&blank, &EdgePredicate::parallel_to_axis(Vector3::z()))?;
    let plate = kernel.fillet(&blank, &corners, 3.0)?;

    // 120 chords per circle keep the rounded corners within 1e-4 of the analytic value
    let expected = 40.0 * 40.0 * 5.0 - 4.0 * 9.0 * (1.0 - PI / 4.0) * 5.0;
    println!("plate: {:.4} mm³ (expected {expected:.2}), {} faces", plate.volume(), plate.face_count());
    assert!((plate.volume() - expected).abs() / expected < 1e-4);
    assert!(plate.is_watertight());
    assert_eq!(plate.face_count(), 10);

    let params = PlateParams {
        hole_diameter: 0.0,
        ..PlateParams::default()
    };
    let scene = RoundedPlate.generate(&kernel, &params)?;
    let generated = &scene.items()[0].solid;
    assert!(generated.is_congruent(&plate, 1e-9));
    Ok(())
}

#[test]
fn test_tray_dovetails_across_wall_thicknesses() -> Result<()> {
    let kernel = Kernel::new();
    let mut volumes = Vec::new();
    for wall in [0.2, 0.8, 2.4] {
        let overrides = parse_overrides(&[format!("wall={wall}")])?;
        let scene = DovetailTray.build(&kernel, &overrides)?;
        let tray = &scene.get("tray").expect("tray item").solid;
        println!(
            "wall {wall}: volume {:.3}, {} faces, {} polygons, {} shells",
            tray.volume(),
            tray.face_count(),
            tray.polygon_count(),
            tray.shell_count()
        );
        assert!(tray.is_watertight(), "wall {wall} is not watertight");
        assert_eq!(tray.shell_count(), 1, "wall {wall} split into several solids");
        volumes.push(tray.volume());
    }
    assert!(volumes.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

#[test]
fn test_tray_cavity_is_open() -> Result<()> {
    let kernel = Kernel::new();
    let params = TrayParams::default();
    let scene = DovetailTray.generate(&kernel, &params)?;
    let tray = &scene.items()[0].solid;
    let floor = kernel.select_faces(
        tray,
        &FacePredicate::tagged("inner").and(FacePredicate::normal_equals(Vector3::z(), 1.0)),
    )?;
    assert_eq!(floor.len(), 1);
    let topology = kernel.topology(tray);
    let face = floor.iter().next().and_then(|f| topology.face(f)).expect("floor face");
    println!("floor area {:.3} at z = {:.3}", face.area, face.centroid.z);
    assert!((face.centroid.z - params.wall).abs() < 1e-9);
    let inside = (params.length - 2.0 * params.wall) * (params.width - 2.0 * params.wall);
    assert!((face.area - inside).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_every_part_builds_into_a_sink() -> Result<()> {
    let kernel = Kernel::new();
    let mut stats = StatsSink::new();
    for part in parts::catalog() {
        let scene = part.build(&kernel, &[])?;
        assert!(!scene.is_empty(), "{} produced nothing", part.name());
        scene.emit(&mut stats)?;
        scene.emit(&mut NullSink)?;
    }
    println!("{}", stats.to_json()?);
    assert_eq!(stats.items.len(), 3);
    assert!(stats.items.iter().all(|item| item.stats.is_watertight));
    Ok(())
}

#[test]
fn test_bad_override_names_the_generator() -> Result<()> {
    let kernel = Kernel::new();
    let err = DovetailTray
        .build(&kernel, &parse_overrides(&["wall=25".to_string()])?)
        .unwrap_err();
    let message = format!("{err:#}");
    println!("{message}");
    assert!(message.contains("dovetail_tray"));
    assert!(message.contains("wall: 25.0"));
    Ok(())
}

/// A small pipe bracket touching every constructor
#[test]
fn test_mixed_construction_pipeline() -> Result<()> {
    let kernel = Kernel::new();

    let outline = ProfileBuilder::new(Plane::xy())
        .move_to(0.0, 0.0)
        .line_to(30.0, 0.0)
        .line_to(30.0, 10.0)
        .three_point_arc(Point2::new(15.0, 16.0), Point2::new(0.0, 10.0))?
        .close()?;
    let base = kernel.extrude(&outline, 6.0, false)?;

    // Ring of radii 3 to 4.5 standing on the base around the bore
    let collar_profile = Wire::rectangle(Plane::xz().with_origin(Point3::new(15.0, 5.0, 6.0)), 1.5, 4.0, false)?
        .translate(Vector3::new(3.0, 0.0, 0.0));
    let collar = kernel.revolve(&collar_profile, 360.0, Point3::new(15.0, 5.0, 6.0), Vector3::z())?;

    let rib_path = Path3::polyline(&[Point3::new(2.0, 2.0, 6.0), Point3::new(2.0, 2.0, 9.0), Point3::new(8.0, 2.0, 9.0)], false)?;
    let rib_section = Wire::rectangle(Plane::xy().with_origin(Point3::new(2.0, 2.0, 6.0)), 1.0, 1.0, true)?;
    let rib = kernel.sweep(&rib_section, &rib_path)?;

    let boss = kernel.loft(&[
        Wire::circle(Plane::xy().offset(6.0), Point2::new(26.0, 4.0), 2.5)?,
        Wire::circle(Plane::xy().offset(9.0), Point2::new(26.0, 4.0), 1.5)?,
    ])?;

    let body = kernel.union_all([&base, &collar, &rib, &boss])?;
    let bore = kernel.cylinder(2.5, 20.0)?.translate(Vector3::new(15.0, 5.0, -1.0));
    let part = kernel.subtract(&body, &bore)?;

    println!(
        "bracket: {:.3} mm³, {} faces, {} shells",
        part.volume(),
        part.face_count(),
        part.shell_count()
    );
    assert!(part.is_watertight());
    assert_eq!(part.shell_count(), 1);
    assert!(part.volume() > base.volume());
    assert!(part.volume() < base.volume() + collar.volume() + rib.volume() + boss.volume());

    let scene = Scene::new().with("bracket", part);
    let mut sink = StatsSink::new();
    sink.emit(&scene)?;
    assert_eq!(sink.items[0].name, "bracket");
    Ok(())
}
