// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Parameter-driven part generators
//!
//! Running a generator means resolving its parameters (defaults plus
//! `key=value` overrides) and calling it with a [`Kernel`]; the result is a
//! [`Scene`]. Failures carry the generator name and the resolved
//! parameters.

mod plate;
mod tray;
mod washer;

pub use plate::{PlateParams, RoundedPlate};
pub use tray::{DovetailTray, TrayParams};
pub use washer::{Washer, WasherParams};

use crate::kernel::Kernel;
use crate::scene::Scene;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A named part script
pub trait PartGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    fn describe(&self) -> &'static str;

    /// Default parameters as a JSON object
    fn defaults(&self) -> Value;

    /// Build the part with `overrides` applied on top of the defaults
    fn build(&self, kernel: &Kernel, overrides: &[(String, String)]) -> Result<Scene>;
}

/// Every generator shipped with the crate
pub fn catalog() -> Vec<Box<dyn PartGenerator>> {
    vec![Box::new(Washer), Box::new(RoundedPlate), Box::new(DovetailTray)]
}

pub fn find(name: &str) -> Option<Box<dyn PartGenerator>> {
    catalog().into_iter().find(|part| part.name() == name)
}

/// Split `key=value` arguments
pub fn parse_overrides(args: &[String]) -> Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| {
            let (key, value) = arg
                .split_once('=')
                .with_context(|| format!("override `{arg}` is not of the form key=value"))?;
            let key = key.trim();
            if key.is_empty() {
                bail!("override `{arg}` has an empty key");
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Defaults of `P` with `overrides` applied, type-checked against the defaults
pub fn resolve_params<P>(overrides: &[(String, String)]) -> Result<P>
where
    P: Default + Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(P::default()).context("Failed to serialize default parameters")?;
    let fields = value
        .as_object_mut()
        .context("parameters must be a struct")?;
    for (key, raw) in overrides {
        let slot = fields
            .get_mut(key)
            .with_context(|| format!("unknown parameter `{key}`"))?;
        *slot = match slot {
            Value::Number(n) if n.is_u64() => Value::from(
                raw.parse::<u64>()
                    .with_context(|| format!("parameter `{key}` expects a whole number, got `{raw}`"))?,
            ),
            Value::Number(_) => {
                let number = raw
                    .parse::<f64>()
                    .with_context(|| format!("parameter `{key}` expects a number, got `{raw}`"))?;
                if !number.is_finite() {
                    bail!("parameter `{key}` must be finite, got `{raw}`");
                }
                Value::from(number)
            }
            Value::Bool(_) => Value::from(
                raw.parse::<bool>()
                    .with_context(|| format!("parameter `{key}` expects true or false, got `{raw}`"))?,
            ),
            _ => Value::from(raw.clone()),
        };
    }
    serde_json::from_value(value).context("Failed to apply parameter overrides")
}

/// Serialize defaults for listing; parameters are plain structs so this cannot fail in practice
pub(crate) fn defaults_of<P: Default + Serialize>() -> Value {
    serde_json::to_value(P::default()).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let parsed = parse_overrides(&["wall=0.2".to_string(), " count = 3".to_string()]).unwrap();
        assert_eq!(parsed[0], ("wall".to_string(), "0.2".to_string()));
        assert_eq!(parsed[1], ("count".to_string(), "3".to_string()));
        assert!(parse_overrides(&["wall".to_string()]).is_err());
        assert!(parse_overrides(&["=1".to_string()]).is_err());
    }

    #[test]
    fn test_resolve_checks_types() {
        let params: TrayParams = resolve_params(&[("wall".into(), "2.4".into()), ("per_side".into(), "1".into())]).unwrap();
        assert_eq!(params.wall, 2.4);
        assert_eq!(params.per_side, 1);
        assert!(resolve_params::<TrayParams>(&[("per_side".into(), "1.5".into())]).is_err());
        assert!(resolve_params::<TrayParams>(&[("colour".into(), "red".into())]).is_err());
    }

    #[test]
    fn test_catalog_names_unique() {
        let names: Vec<_> = catalog().iter().map(|p| p.name()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names.len(), sorted.len());
        assert!(find("washer").is_some());
        assert!(find("gearbox").is_none());
    }
}
