// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Runs part generators and collects what they produced

use crate::kernel::Kernel;
use crate::parts::PartGenerator;
use crate::scene::StatsSink;
use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Outcome of building one part
#[derive(Debug, Serialize)]
pub struct BuildResult {
    pub part: String,
    pub stats: StatsSink,
    #[serde(with = "millis")]
    pub duration: Duration,
}

/// Runner for executing part generators
#[derive(Debug, Clone, Default)]
pub struct Runner {
    kernel: Kernel,
}

impl Runner {
    pub fn new(kernel: Kernel) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Build one part and measure every item of its scene
    pub fn build(&self, part: &dyn PartGenerator, overrides: &[(String, String)]) -> Result<BuildResult> {
        let start = Instant::now();
        let scene = part.build(&self.kernel, overrides)?;
        let mut stats = StatsSink::new();
        scene.emit(&mut stats)?;
        Ok(BuildResult {
            part: part.name().to_string(),
            stats,
            duration: start.elapsed(),
        })
    }

    /// Build every part with its defaults in parallel; `on_done` runs once per finished part
    pub fn batch<F>(&self, parts: &[Box<dyn PartGenerator>], on_done: F) -> Vec<(String, Result<BuildResult>)>
    where
        F: Fn(&str) + Sync,
    {
        parts
            .par_iter()
            .map(|part| {
                let result = self.build(part.as_ref(), &[]);
                on_done(part.name());
                (part.name().to_string(), result)
            })
            .collect()
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64() * 1e3)
    }
}
