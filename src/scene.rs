// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scenes: the ordered output of a part generator
//!
//! A generator returns a [`Scene`]; whoever called it decides where the
//! scene goes by handing it an explicit [`SceneSink`].

use crate::geometry::{GeometryStats, Solid, Transform, Transformable};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// How a viewer should draw an item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMeta {
    /// Linear RGB in `0..=1`
    pub color: [f32; 3],
    pub opacity: f32,
}

impl Default for DisplayMeta {
    fn default() -> Self {
        Self {
            color: [0.8, 0.8, 0.8],
            opacity: 1.0,
        }
    }
}

impl DisplayMeta {
    pub fn colored(color: [f32; 3]) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SceneItem {
    pub name: String,
    pub solid: Solid,
    /// Placement applied when the item is shown, not baked into the solid
    pub transform: Transform,
    pub display: DisplayMeta,
}

impl SceneItem {
    /// The solid moved to where it is shown
    pub fn placed(&self) -> Solid {
        self.solid.transformed(&self.transform)
    }
}

/// Ordered list of named solids
#[derive(Debug, Clone, Default)]
pub struct Scene {
    items: Vec<SceneItem>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a solid shown where it is, with default display settings
    pub fn with(self, name: impl Into<String>, solid: Solid) -> Self {
        self.with_item(name, solid, Transform::identity(), DisplayMeta::default())
    }

    pub fn with_item(
        mut self,
        name: impl Into<String>,
        solid: Solid,
        transform: Transform,
        display: DisplayMeta,
    ) -> Self {
        self.items.push(SceneItem {
            name: name.into(),
            solid,
            transform,
            display,
        });
        self
    }

    pub fn items(&self) -> &[SceneItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SceneItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn total_volume(&self) -> f64 {
        self.items.iter().map(|item| item.solid.volume()).sum()
    }

    /// Hand the scene to a sink
    pub fn emit(&self, sink: &mut dyn SceneSink) -> Result<()> {
        info!(items = self.items.len(), sink = sink.name(), "emitting scene");
        sink.emit(self)
    }
}

/// Destination for finished scenes
pub trait SceneSink {
    fn name(&self) -> &'static str;

    fn emit(&mut self, scene: &Scene) -> Result<()>;
}

/// Discards every scene
#[derive(Debug, Default)]
pub struct NullSink;

impl SceneSink for NullSink {
    fn name(&self) -> &'static str {
        "null"
    }

    fn emit(&mut self, _scene: &Scene) -> Result<()> {
        Ok(())
    }
}

/// Measurements of one emitted item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStats {
    pub name: String,
    pub display: DisplayMeta,
    pub stats: GeometryStats,
}

/// Collects geometry statistics for every emitted item
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StatsSink {
    pub items: Vec<ItemStats>,
}

impl StatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize scene statistics")
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)
            .with_context(|| format!("Failed to write scene statistics: {:?}", path.as_ref()))
    }
}

impl SceneSink for StatsSink {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn emit(&mut self, scene: &Scene) -> Result<()> {
        for item in scene.items() {
            self.items.push(ItemStats {
                name: item.name.clone(),
                display: item.display,
                stats: item.placed().stats(),
            });
        }
        Ok(())
    }
}
