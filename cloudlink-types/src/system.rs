//! System-level values the capability layer consults or reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the device manages its cloud connection at boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemMode {
    /// Connects at boot and keeps the connection alive.
    #[default]
    Automatic,
    /// Does not connect at boot; the application calls `connect()`.
    SemiAutomatic,
    /// The application drives connection and processing entirely.
    Manual,
    /// Recovery mode with only system capabilities available.
    SafeMode,
}

impl SystemMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::SemiAutomatic => "semi_automatic",
            Self::Manual => "manual",
            Self::SafeMode => "safe_mode",
        }
    }
}

impl fmt::Display for SystemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "automatic" => Ok(Self::Automatic),
            "semi_automatic" | "semi-automatic" => Ok(Self::SemiAutomatic),
            "manual" => Ok(Self::Manual),
            "safe_mode" | "safe-mode" => Ok(Self::SafeMode),
            other => Err(crate::Error::UnknownMode(other.to_string())),
        }
    }
}

/// Whether an optional system feature (e.g. the system thread) is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    #[default]
    Disabled,
    Enabled,
}

impl FeatureState {
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// Delivery breadth requested for a subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionScope {
    /// Public events from any device.
    #[default]
    AllDevices,
    /// Events from devices owned by the same account.
    MyDevices,
}

/// Connection tuning properties understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionProperty {
    /// Keep-alive ping interval, in milliseconds.
    Ping,
}

/// Snapshot of the last successful time synchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncInfo {
    /// System tick (milliseconds since boot) at which the sync completed.
    pub tick: u32,
    /// Unix timestamp (seconds) received from the cloud; zero if never synced.
    pub timestamp: i64,
}

impl SyncInfo {
    #[must_use]
    pub const fn new(tick: u32, timestamp: i64) -> Self {
        Self { tick, timestamp }
    }

    /// Returns true if a sync has ever completed.
    #[must_use]
    pub const fn has_synced(&self) -> bool {
        self.timestamp != 0
    }

    /// Returns the sync wall-clock time, if any.
    #[must_use]
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        if self.has_synced() {
            DateTime::from_timestamp(self.timestamp, 0)
        } else {
            None
        }
    }
}
