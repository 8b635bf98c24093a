//! Whether `connect()` waits for the connection to come up.

use cloudlink_types::{FeatureState, SystemMode};

/// Decides if a connect request blocks the caller until connected.
pub trait ConnectPolicy: Send + Sync {
    fn blocks_on_connect(&self) -> bool;
}

/// The system rule: connect blocks only in semi-automatic mode with the
/// system thread disabled. Every other combination is fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemConnectPolicy {
    pub mode: SystemMode,
    pub threading: FeatureState,
}

impl SystemConnectPolicy {
    #[must_use]
    pub const fn new(mode: SystemMode, threading: FeatureState) -> Self {
        Self { mode, threading }
    }
}

impl ConnectPolicy for SystemConnectPolicy {
    fn blocks_on_connect(&self) -> bool {
        matches!(self.threading, FeatureState::Disabled)
            && matches!(self.mode, SystemMode::SemiAutomatic)
    }
}

impl<F> ConnectPolicy for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn blocks_on_connect(&self) -> bool {
        self()
    }
}
