//! Core type definitions for the cloudlink device layer.
//!
//! This crate defines the plain value types that cross every boundary of the
//! capability layer:
//! - Variable kinds and the values read back from registered variables
//! - Publish flags and their composition
//! - Subscription scopes, system modes and time-sync snapshots
//!
//! Nothing here talks to the connection engine; see `cloudlink-protocol` for
//! the collaborator contract and `cloudlink-wiring` for the device facade.

mod flags;
mod system;
mod variable;

pub use flags::{NO_ACK, PRIVATE, PUBLIC, PublishFlag, PublishFlags, WITH_ACK};
pub use system::{ConnectionProperty, FeatureState, SubscriptionScope, SyncInfo, SystemMode};
pub use variable::{
    MAX_FUNCTION_NAME_LEN, MAX_VARIABLE_NAME_LEN, VariableKind, VariableValue,
};

/// Default time-to-live for published events, in seconds.
pub const DEFAULT_EVENT_TTL: u32 = 60;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing type values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown publish flag: {0}")]
    UnknownFlag(String),

    #[error("unknown system mode: {0}")]
    UnknownMode(String),

    #[error("unknown variable kind tag: {0}")]
    UnknownKind(u8),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
