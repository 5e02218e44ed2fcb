// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Interlocking storage tray
//!
//! The `+X` and `+Y` walls carry dovetail tabs; the `-X` and `-Y` walls carry
//! bosses with matching sockets, so trays of equal size lock side by side.

use super::{defaults_of, resolve_params, PartGenerator};
use crate::geometry::{Plane, Solid, Transformable};
use crate::kernel::Kernel;
use crate::scene::{DisplayMeta, Scene};
use crate::select::FacePredicate;
use crate::sketch::Wire;
use anyhow::{bail, Context, Result};
use nalgebra::{Point2, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Material left between a socket and the wall, and beside each socket
const BOSS_MARGIN: f64 = 1.0;
/// How far sockets run past the boss face
const SOCKET_OVERRUN: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayParams {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub wall: f64,
    /// Width of a tab where it leaves the wall
    pub dovetail_width: f64,
    pub dovetail_depth: f64,
    /// Widening of each tab flank from root to tip
    pub dovetail_flare: f64,
    pub per_side: u64,
}

impl Default for TrayParams {
    fn default() -> Self {
        Self {
            length: 60.0,
            width: 40.0,
            height: 15.0,
            wall: 0.8,
            dovetail_width: 8.0,
            dovetail_depth: 3.0,
            dovetail_flare: 1.5,
            per_side: 2,
        }
    }
}

impl TrayParams {
    fn boss_width(&self) -> f64 {
        self.dovetail_width + 2.0 * (self.dovetail_flare + BOSS_MARGIN)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
            ("wall", self.wall),
            ("dovetail_width", self.dovetail_width),
            ("dovetail_depth", self.dovetail_depth),
        ] {
            if !(value > 0.0) {
                bail!("{name} must be positive, got {value}");
            }
        }
        if self.dovetail_flare < 0.0 {
            bail!("dovetail_flare must not be negative");
        }
        if self.per_side == 0 {
            bail!("per_side must be at least 1");
        }
        let spacing = self.length.min(self.width) / (self.per_side + 1) as f64;
        if self.boss_width() >= spacing {
            bail!(
                "{} dovetails of width {:.2} do not fit along a {} side",
                self.per_side,
                self.boss_width(),
                self.length.min(self.width)
            );
        }
        if self.half_width_at(-SOCKET_OVERRUN) <= 0.0 {
            bail!("dovetail flare {} closes the socket mouth", self.dovetail_flare);
        }
        Ok(())
    }

    /// Half width of the dovetail at `s` from its root
    fn half_width_at(&self, s: f64) -> f64 {
        self.dovetail_width / 2.0 + self.dovetail_flare * s / self.dovetail_depth
    }
}

/// One wall of the tray, seen from outside
#[derive(Debug, Clone, Copy)]
struct Side {
    /// Where the wall's outer face starts, at along = 0
    origin: Point2<f64>,
    outward: Vector2<f64>,
    span: f64,
}

impl Side {
    fn along(&self) -> Vector2<f64> {
        Vector2::new(-self.outward.y, self.outward.x)
    }

    /// Trapezoid across the wall centered at `t` along it, running from depth `s0` to `s1`
    fn trapezoid(&self, t: f64, (s0, h0): (f64, f64), (s1, h1): (f64, f64)) -> Vec<Point2<f64>> {
        let base = self.origin + self.along() * t;
        vec![
            base + self.outward * s0 - self.along() * h0,
            base + self.outward * s1 - self.along() * h1,
            base + self.outward * s1 + self.along() * h1,
            base + self.outward * s0 + self.along() * h0,
        ]
    }

    fn stations(&self, count: u64) -> impl Iterator<Item = f64> + '_ {
        (1..=count).map(move |i| self.span * i as f64 / (count + 1) as f64)
    }
}

/// Open-top box with dovetail tabs and sockets
#[derive(Debug, Clone, Copy, Default)]
pub struct DovetailTray;

impl DovetailTray {
    pub fn generate(&self, kernel: &Kernel, params: &TrayParams) -> Result<Scene> {
        params.validate()?;
        let (l, w, h) = (params.length, params.width, params.height);

        let blank = kernel.box_(l, w, h, [false; 3])?;
        let top = kernel.select_faces(&blank, &FacePredicate::normal_equals(Vector3::z(), 1.0))?;
        let mut tray = kernel.shell(&blank, &top, -params.wall)?;

        let prism = |outline: Vec<Point2<f64>>, z0: f64, height: f64| -> Result<Solid> {
            let wire = Wire::polygon(Plane::xy(), &outline)?;
            Ok(kernel
                .extrude(&wire, height, false)?
                .translate(Vector3::new(0.0, 0.0, z0)))
        };

        // Tabs and bosses sink halfway into the wall so they never meet it flush
        let root = -params.wall / 2.0;
        let depth = params.dovetail_depth;
        let tab_sides = [
            Side { origin: Point2::new(l, 0.0), outward: Vector2::x(), span: w },
            Side { origin: Point2::new(l, w), outward: Vector2::y(), span: l },
        ];
        let socket_sides = [
            Side { origin: Point2::new(0.0, w), outward: -Vector2::x(), span: w },
            Side { origin: Point2::origin(), outward: -Vector2::y(), span: l },
        ];

        let mut additions = Vec::new();
        for side in &tab_sides {
            for t in side.stations(params.per_side) {
                let outline = side.trapezoid(t, (root, params.half_width_at(root)), (depth, params.half_width_at(depth)));
                additions.push(prism(outline, 0.0, h)?);
            }
        }
        let boss_half = params.boss_width() / 2.0;
        let boss_depth = depth + BOSS_MARGIN;
        let mut sockets = Vec::new();
        for side in &socket_sides {
            for t in side.stations(params.per_side) {
                additions.push(prism(side.trapezoid(t, (root, boss_half), (boss_depth, boss_half)), 0.0, h)?);
                // Widest at the back of the socket, narrowest at the mouth
                let back = (BOSS_MARGIN, params.half_width_at(depth));
                let mouth = boss_depth + SOCKET_OVERRUN;
                let mouth = (mouth, params.half_width_at(-SOCKET_OVERRUN));
                sockets.push(prism(side.trapezoid(t, back, mouth), -1.0, h + 2.0)?);
            }
        }

        for addition in &additions {
            tray = kernel.union(&tray, addition)?;
        }
        tray = kernel.subtract_all(&tray, &sockets)?;
        debug!(
            wall = params.wall,
            volume = tray.volume(),
            polygons = tray.polygon_count(),
            "dovetail tray"
        );
        Ok(Scene::new().with_item("tray", tray, Default::default(), DisplayMeta::colored([0.35, 0.6, 0.45])))
    }
}

impl PartGenerator for DovetailTray {
    fn name(&self) -> &'static str {
        "dovetail_tray"
    }

    fn describe(&self) -> &'static str {
        "Open tray with dovetail tabs and sockets for side-by-side locking"
    }

    fn defaults(&self) -> Value {
        defaults_of::<TrayParams>()
    }

    fn build(&self, kernel: &Kernel, overrides: &[(String, String)]) -> Result<Scene> {
        let params: TrayParams = resolve_params(overrides).context("dovetail_tray")?;
        self.generate(kernel, &params)
            .with_context(|| format!("dovetail_tray {params:?}"))
    }
}
