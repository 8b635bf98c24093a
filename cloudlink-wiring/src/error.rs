//! Error types for the capability layer.
//!
//! The public capability API reports accepted/rejected as `bool`; these
//! errors carry the reason into the log before it is collapsed.

use std::fmt;
use thiserror::Error;

/// Result type for capability operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// The kind of capability being registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Variable,
    Function,
    Subscription,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Variable => "variable",
            Self::Function => "function",
            Self::Subscription => "subscription",
        })
    }
}

/// Errors that can occur in capability operations.
#[derive(Debug, Error)]
pub enum CloudError {
    /// Built without the `cloud` feature.
    #[error("cloud support is not compiled in")]
    CloudDisabled,

    /// The connection engine refused the registration.
    #[error("{kind} '{name}' rejected by the connection engine")]
    Rejected { kind: CapabilityKind, name: String },

    /// The name cannot cross the C-string boundary.
    #[error("invalid {kind} name {name:?}")]
    InvalidName { kind: CapabilityKind, name: String },

    /// Configuration values out of range.
    #[error("invalid config: {0}")]
    Config(String),

    /// Configuration file is not valid TOML.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloudError {
    pub(crate) fn rejected(kind: CapabilityKind, name: &str) -> Self {
        Self::Rejected {
            kind,
            name: name.to_string(),
        }
    }
}
