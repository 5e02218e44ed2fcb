// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Typed modeling failures
//!
//! Every failure names the operation that raised it. Nothing here is retried
//! or silently corrected: construction is deterministic, so the same inputs
//! always reproduce the same error.

use nalgebra::Point3;
use thiserror::Error;

/// Result alias used throughout the modeling core
pub type ModelingResult<T> = Result<T, ModelingError>;

/// Broad classes of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller's input is malformed (bad wire, empty selection, infeasible feature)
    Authoring,
    /// The kernel could not combine otherwise valid inputs
    Kernel,
    /// An operation precondition was checked and rejected up front
    Precondition,
}

/// Errors raised by plane, profile, solid, boolean and feature operations
#[derive(Debug, Clone, Error)]
pub enum ModelingError {
    #[error("{operation}: invalid plane basis ({reason})")]
    InvalidPlane {
        operation: &'static str,
        reason: String,
    },

    #[error("{operation}: invalid parameter: {detail}")]
    InvalidParameter {
        operation: &'static str,
        detail: String,
    },

    #[error("{operation}: malformed wire: {detail}")]
    MalformedWire {
        operation: &'static str,
        detail: String,
    },

    #[error("{operation}: non-manifold result: {detail}")]
    NonManifoldResult {
        operation: &'static str,
        detail: String,
    },

    #[error("{operation}: selector `{selector}` matched no {target}")]
    EmptySelection {
        operation: &'static str,
        selector: String,
        target: &'static str,
    },

    #[error("{operation}: infeasible feature: {detail}")]
    InfeasibleFeature {
        operation: &'static str,
        detail: String,
    },

    #[error("{operation}: unsupported: {detail}")]
    Unsupported {
        operation: &'static str,
        detail: String,
    },

    #[error("{operation}: precondition violated: {detail}")]
    PreconditionViolation {
        operation: &'static str,
        detail: String,
    },

    #[error(
        "{operation}: degenerate geometry near ({:.4}, {:.4}, {:.4}): {detail}",
        .location.x,
        .location.y,
        .location.z
    )]
    DegenerateGeometry {
        operation: &'static str,
        location: Point3<f64>,
        detail: String,
    },
}

impl ModelingError {
    /// Which class of failure this is
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DegenerateGeometry { .. } => ErrorKind::Kernel,
            Self::PreconditionViolation { .. } => ErrorKind::Precondition,
            _ => ErrorKind::Authoring,
        }
    }

    /// Name of the operation that failed
    pub fn operation(&self) -> &'static str {
        match self {
            Self::InvalidPlane { operation, .. }
            | Self::InvalidParameter { operation, .. }
            | Self::MalformedWire { operation, .. }
            | Self::NonManifoldResult { operation, .. }
            | Self::EmptySelection { operation, .. }
            | Self::InfeasibleFeature { operation, .. }
            | Self::Unsupported { operation, .. }
            | Self::PreconditionViolation { operation, .. }
            | Self::DegenerateGeometry { operation, .. } => operation,
        }
    }

    pub(crate) fn invalid_parameter(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidParameter {
            operation,
            detail: detail.into(),
        }
    }

    pub(crate) fn malformed_wire(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedWire {
            operation,
            detail: detail.into(),
        }
    }

    pub(crate) fn infeasible(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::InfeasibleFeature {
            operation,
            detail: detail.into(),
        }
    }

    pub(crate) fn degenerate(
        operation: &'static str,
        location: Point3<f64>,
        detail: impl Into<String>,
    ) -> Self {
        Self::DegenerateGeometry {
            operation,
            location,
            detail: detail.into(),
        }
    }
}

/// Reject non-finite or non-positive dimensions
pub(crate) fn require_positive(operation: &'static str, name: &str, value: f64) -> ModelingResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ModelingError::invalid_parameter(
            operation,
            format!("{name} must be positive and finite, got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let degenerate = ModelingError::degenerate("union", Point3::new(1.0, 2.0, 3.0), "open edge");
        assert_eq!(degenerate.kind(), ErrorKind::Kernel);
        assert_eq!(degenerate.operation(), "union");
        assert!(degenerate.to_string().contains("(1.0000, 2.0000, 3.0000)"));

        let axis = ModelingError::PreconditionViolation {
            operation: "revolve",
            detail: "profile crosses the axis".into(),
        };
        assert_eq!(axis.kind(), ErrorKind::Precondition);

        let fillet = ModelingError::infeasible("fillet", "radius 6 exceeds 5");
        assert_eq!(fillet.kind(), ErrorKind::Authoring);
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive("box", "length", 2.0).is_ok());
        assert!(require_positive("box", "length", 0.0).is_err());
        assert!(require_positive("box", "length", f64::NAN).is_err());
    }
}
