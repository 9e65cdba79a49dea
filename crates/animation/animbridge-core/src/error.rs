//! Error types for controller-graph conversion.
//!
//! Only conditions that must abort an import or export call live here. Everything
//! recoverable is recorded in [`crate::diagnostics::Diagnostics`] instead.

use crate::control_vars::ControllerClass;

/// Fatal conversion error.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConvertError {
    /// A curve path matches no known channel template (export).
    #[error("Malformed channel path: {path}")]
    MalformedChannelPath { path: String },

    /// A property controller names a variable with no table entry (import).
    #[error("Unmapped controlled variable {variable} for {class:?} on '{target}'")]
    UnmappedControlledVariable {
        class: ControllerClass,
        variable: u32,
        target: String,
    },

    /// A block or controller references an interpolator missing from the graph.
    #[error("Interpolator {index} referenced by '{owner}' does not exist")]
    DanglingInterpolator { owner: String, index: u32 },

    /// A controller chain references a controller missing from the graph.
    #[error("Controller {index} referenced by '{owner}' does not exist")]
    DanglingController { owner: String, index: u32 },

    /// A timeline name cannot be parsed with the animation naming scheme.
    #[error("Invalid timeline name: {name}")]
    InvalidTimelineName { name: String },
}

impl ConvertError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedChannelPath { .. } | Self::InvalidTimelineName { .. } => "naming",
            Self::UnmappedControlledVariable { .. } => "table",
            Self::DanglingInterpolator { .. } | Self::DanglingController { .. } => "graph",
        }
    }
}

/// Conversion result type
pub type Result<T> = core::result::Result<T, ConvertError>;
