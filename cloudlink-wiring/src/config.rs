//! Facade configuration, optionally read from a `[cloud]` TOML table.
//!
//! ```toml
//! [cloud]
//! mode = "semi_automatic"
//! threading = "disabled"
//! default_ttl = 60
//! connect_poll_interval_ms = 10
//! connect_timeout_ms = 30000
//! ```

use crate::error::{CloudError, CloudResult};
use cloudlink_types::{DEFAULT_EVENT_TTL, FeatureState, SystemMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Configuration for the cloud facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// System operating mode.
    pub mode: SystemMode,
    /// Whether system services run on their own thread.
    pub threading: FeatureState,
    /// TTL applied to publishes that do not set one (seconds).
    pub default_ttl: u32,
    /// Delay between connected-predicate polls during a blocking connect.
    pub connect_poll_interval_ms: u64,
    /// Upper bound on a blocking connect. `None` waits indefinitely.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            mode: SystemMode::default(),
            threading: FeatureState::default(),
            default_ttl: DEFAULT_EVENT_TTL,
            connect_poll_interval_ms: 10,
            connect_timeout_ms: None,
        }
    }
}

#[derive(Deserialize, Default)]
struct CloudFile {
    #[serde(default)]
    cloud: CloudConfig,
}

impl CloudConfig {
    /// Parses a `[cloud]` table. Missing keys take their defaults.
    pub fn from_toml_str(toml_str: &str) -> CloudResult<Self> {
        let file: CloudFile = toml::from_str(toml_str)?;
        file.cloud.validate()?;
        Ok(file.cloud)
    }

    /// Reads configuration from `path`, falling back to defaults with a
    /// warning when the file is missing or invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No cloud config at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::read(path) {
            Ok(config) => {
                info!("Loaded cloud config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to load cloud config {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> CloudResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Rejects values the facade cannot honour.
    pub fn validate(&self) -> CloudResult<()> {
        if self.default_ttl == 0 {
            return Err(CloudError::Config("default_ttl must be at least 1 second".into()));
        }
        if self.connect_timeout_ms == Some(0) {
            return Err(CloudError::Config(
                "connect_timeout_ms must be positive; omit it to wait indefinitely".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn connect_poll_interval(&self) -> Duration {
        Duration::from_millis(self.connect_poll_interval_ms)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}
