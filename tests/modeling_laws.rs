// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Algebraic laws of placement and booleans

use anyhow::{bail, Result};
use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use partforge::{ErrorKind, Kernel, ModelingError, Plane, Solid, Transform, Transformable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn cuboid(kernel: &Kernel, size: [f64; 3], at: [f64; 3]) -> Result<Solid> {
    Ok(kernel
        .box_(size[0], size[1], size[2], [false; 3])?
        .translate(Vector3::new(at[0], at[1], at[2])))
}

#[test]
fn test_translate_round_trip() -> Result<()> {
    let kernel = Kernel::new();
    let part = kernel.subtract(&cuboid(&kernel, [10.0, 6.0, 4.0], [0.0; 3])?, &kernel.cylinder(2.0, 10.0)?)?;
    let offset = Vector3::new(12.5, -3.25, 7.0);
    let back = part.translate(offset).translate(-offset);

    println!("volume {:.6} -> {:.6}", part.volume(), back.volume());
    assert!(back.is_congruent(&part, 1e-9));
    assert_relative_eq!(back.bounding_box().min, part.bounding_box().min, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_mirror_is_an_involution() -> Result<()> {
    let kernel = Kernel::new();
    let part = cuboid(&kernel, [3.0, 2.0, 1.0], [1.0, 0.5, 0.0])?;
    let plane = Plane::yz().with_origin(Point3::new(-2.0, 0.0, 0.0));
    let once = part.mirror(&plane);
    let twice = once.mirror(&plane);

    println!("mirrored bbox {:?}", once.bounding_box());
    assert_relative_eq!(once.volume(), part.volume(), epsilon = 1e-9);
    assert!(once.volume() > 0.0, "mirroring must keep outward orientation");
    assert!(once.is_watertight());
    assert_relative_eq!(once.bounding_box().max.x, -5.0, epsilon = 1e-9);
    assert!(twice.is_congruent(&part, 1e-9));
    Ok(())
}

#[test]
fn test_full_rotation_is_identity() -> Result<()> {
    let kernel = Kernel::new();
    let part = cuboid(&kernel, [4.0, 1.0, 1.0], [2.0, 0.0, 0.0])?;
    let turned = part.rotate(Point3::origin(), Vector3::z(), 360.0)?;
    assert!(turned.is_congruent(&part, 1e-9));

    let quarter = part.rotate(Point3::origin(), Vector3::z(), 90.0)?;
    let bbox = quarter.bounding_box();
    println!("quarter turn bbox {:?}", bbox);
    assert_relative_eq!(bbox.min.x, -1.0, epsilon = 1e-9);
    assert_relative_eq!(bbox.max.y, 6.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_transform_composition() -> Result<()> {
    let kernel = Kernel::new();
    let part = cuboid(&kernel, [1.0, 1.0, 1.0], [0.0; 3])?;
    let shift = Transform::translation(Vector3::new(5.0, 0.0, 0.0));
    let turn = Transform::rotation(Point3::origin(), Vector3::z(), 90.0)?;
    let combined = part.transformed(&shift.then(&turn));
    let stepwise = part.transformed(&shift).transformed(&turn);
    assert!(combined.is_congruent(&stepwise, 1e-9));
    assert_relative_eq!(combined.bounding_box().min.y, 5.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_boolean_identities() -> Result<()> {
    let kernel = Kernel::new();
    let a = cuboid(&kernel, [4.0, 4.0, 4.0], [0.0; 3])?;
    let b = kernel.sphere(2.5)?.translate(Vector3::new(4.0, 2.0, 2.0));
    let empty = Solid::empty();

    let ab = kernel.union(&a, &b)?;
    let ba = kernel.union(&b, &a)?;
    println!("union {:.4} / {:.4}", ab.volume(), ba.volume());
    assert!(ab.is_congruent(&ba, 1e-6));

    let iab = kernel.intersect(&a, &b)?;
    let iba = kernel.intersect(&b, &a)?;
    assert!(iab.is_congruent(&iba, 1e-6));

    assert!(kernel.union(&a, &a)?.is_congruent(&a, 1e-9));
    assert!(kernel.intersect(&a, &a)?.is_congruent(&a, 1e-9));
    assert!(kernel.subtract(&a, &a)?.is_empty());
    assert!(kernel.union(&a, &empty)?.is_congruent(&a, 1e-12));
    assert!(kernel.intersect(&a, &empty)?.is_empty());
    assert!(kernel.subtract(&a, &empty)?.is_congruent(&a, 1e-12));

    // |A ∪ B| + |A ∩ B| = |A| + |B|
    assert_relative_eq!(
        ab.volume() + iab.volume(),
        a.volume() + b.volume(),
        max_relative = 1e-6
    );
    // A − B and A ∩ B partition A
    let diff = kernel.subtract(&a, &b)?;
    assert_relative_eq!(diff.volume() + iab.volume(), a.volume(), max_relative = 1e-6);
    for solid in [&ab, &iab, &diff] {
        assert!(solid.is_watertight());
    }
    Ok(())
}

#[test]
fn test_flush_union_merges_faces() -> Result<()> {
    let kernel = Kernel::new();
    let left = cuboid(&kernel, [1.0, 1.0, 1.0], [0.0; 3])?;
    let right = cuboid(&kernel, [1.0, 1.0, 1.0], [1.0, 0.0, 0.0])?;
    let bar = kernel.union(&left, &right)?;

    println!("flush union: {} faces, {} polygons", bar.face_count(), bar.polygon_count());
    assert_relative_eq!(bar.volume(), 2.0, epsilon = 1e-9);
    assert!(bar.is_watertight());
    assert_eq!(bar.face_count(), 6);
    assert_eq!(bar.shell_count(), 1);
    Ok(())
}

#[test]
fn test_disjoint_union_keeps_both_shells() -> Result<()> {
    let kernel = Kernel::new();
    let a = cuboid(&kernel, [1.0, 1.0, 1.0], [0.0; 3])?;
    let b = cuboid(&kernel, [1.0, 1.0, 1.0], [3.0, 0.0, 0.0])?;
    let both = kernel.union(&a, &b)?;
    assert_relative_eq!(both.volume(), 2.0, epsilon = 1e-9);
    assert_eq!(both.shell_count(), 2);
    assert!(kernel.intersect(&a, &b)?.is_empty());
    Ok(())
}

#[test]
fn test_edge_touching_union_is_rejected() -> Result<()> {
    let kernel = Kernel::new();
    let a = cuboid(&kernel, [1.0, 1.0, 1.0], [0.0; 3])?;
    let b = cuboid(&kernel, [1.0, 1.0, 1.0], [1.0, 1.0, 0.0])?;

    let err = kernel.union(&a, &b).unwrap_err();
    println!("{err}");
    assert_eq!(err.kind(), ErrorKind::Kernel);
    assert_eq!(err.operation(), "union");
    assert!(err.to_string().contains("union"));
    let ModelingError::DegenerateGeometry { location, .. } = &err else {
        bail!("expected a degenerate geometry error, got {err}");
    };
    // The boxes share only the vertical edge at x = y = 1
    assert_relative_eq!(location.x, 1.0, epsilon = 1e-9);
    assert_relative_eq!(location.y, 1.0, epsilon = 1e-9);
    assert!((0.0..=1.0).contains(&location.z));
    Ok(())
}

#[test]
fn test_diagonal_cutouts_are_rejected() -> Result<()> {
    let kernel = Kernel::new();
    let block = cuboid(&kernel, [2.0, 2.0, 1.0], [0.0; 3])?;
    let near = cuboid(&kernel, [1.0, 1.0, 1.0], [0.0; 3])?;
    let far = cuboid(&kernel, [1.0, 1.0, 1.0], [1.0, 1.0, 0.0])?;

    let notched = kernel.subtract(&block, &near)?;
    assert!(notched.is_watertight());
    let err = kernel.subtract(&notched, &far).unwrap_err();
    println!("{err}");
    assert_eq!(err.kind(), ErrorKind::Kernel);
    assert_eq!(err.operation(), "subtract");
    Ok(())
}

#[test]
fn test_randomized_volume_monotonicity() -> Result<()> {
    let kernel = Kernel::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for round in 0..24 {
        let mut random_box = |rng: &mut StdRng| -> Result<Solid> {
            let size = [rng.gen_range(0.5..4.0), rng.gen_range(0.5..4.0), rng.gen_range(0.5..4.0)];
            let at = [rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0)];
            cuboid(&kernel, size, at)
        };
        let a = random_box(&mut rng)?;
        let b = random_box(&mut rng)?;
        let (va, vb) = (a.volume(), b.volume());
        let slack = 1e-9 * (va + vb);

        let union = kernel.union(&a, &b)?;
        let inter = kernel.intersect(&a, &b)?;
        let diff = kernel.subtract(&a, &b)?;
        println!(
            "round {round}: |A|={va:.3} |B|={vb:.3} ∪={:.3} ∩={:.3} −={:.3}",
            union.volume(),
            inter.volume(),
            diff.volume()
        );

        assert!(union.volume() + slack >= va.max(vb));
        assert!(union.volume() <= va + vb + slack);
        assert!(inter.volume() <= va.min(vb) + slack);
        assert!(diff.volume() <= va + slack);
        assert_relative_eq!(union.volume() + inter.volume(), va + vb, max_relative = 1e-7);
        assert!(union.is_watertight());
    }
    Ok(())
}
