//! The `Cloud` facade and the plumbing shared by its capability modules.

use crate::config::CloudConfig;
use crate::error::{CapabilityKind, CloudError, CloudResult};
use crate::policy::{ConnectPolicy, SystemConnectPolicy};
use cloudlink_protocol::ProtocolFacade;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// True when the crate was built with cloud support.
#[must_use]
pub const fn cloud_enabled() -> bool {
    cfg!(feature = "cloud")
}

/// Evaluates `f` when cloud support is compiled in, otherwise `fallback`.
pub(crate) fn cloud_call<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    if cloud_enabled() { f() } else { fallback }
}

/// Application-facing handle to the cloud connection.
///
/// Every method delegates to the injected [`ProtocolFacade`]. The facade
/// itself keeps no registry; names, addresses and contexts live in the
/// engine.
pub struct Cloud {
    pub(crate) engine: Arc<dyn ProtocolFacade>,
    pub(crate) policy: Arc<dyn ConnectPolicy>,
    pub(crate) config: CloudConfig,
}

impl Cloud {
    /// Creates a facade whose connect behaviour follows the configured
    /// system mode and threading state.
    pub fn new(engine: Arc<dyn ProtocolFacade>, config: CloudConfig) -> Self {
        let policy = Arc::new(SystemConnectPolicy::new(config.mode, config.threading));
        Self::with_policy(engine, config, policy)
    }

    /// Creates a facade with an explicit connect policy.
    pub fn with_policy(
        engine: Arc<dyn ProtocolFacade>,
        config: CloudConfig,
        policy: Arc<dyn ConnectPolicy>,
    ) -> Self {
        Self {
            engine,
            policy,
            config,
        }
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// The engine this facade delegates to.
    pub fn engine(&self) -> &Arc<dyn ProtocolFacade> {
        &self.engine
    }

    /// Logs the outcome of a registration and collapses it to a flag.
    pub(crate) fn report(kind: CapabilityKind, name: &str, result: CloudResult<()>) -> bool {
        match result {
            Ok(()) => {
                debug!(capability = %kind, name, "registered");
                true
            }
            Err(e) => {
                warn!(capability = %kind, name, error = %e, "registration failed");
                false
            }
        }
    }

    /// Common preconditions for any registration.
    pub(crate) fn check_registration(kind: CapabilityKind, name: &str) -> CloudResult<()> {
        if !cloud_enabled() {
            return Err(CloudError::CloudDisabled);
        }
        if name.contains('\0') {
            return Err(CloudError::InvalidName {
                kind,
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cloud")
            .field("config", &self.config)
            .field("blocks_on_connect", &self.policy.blocks_on_connect())
            .finish_non_exhaustive()
    }
}
