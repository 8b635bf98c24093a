//! Connection control, time synchronization and device identity.

use crate::cloud::{Cloud, cloud_call};
use cloudlink_types::{ConnectionProperty, SyncInfo};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

impl Cloud {
    pub fn connected(&self) -> bool {
        self.engine.is_cloud_connected()
    }

    pub fn disconnected(&self) -> bool {
        !self.connected()
    }

    /// Asks the engine to connect.
    ///
    /// Returns immediately unless the connect policy blocks, in which case
    /// the engine is ticked until connected (or the configured timeout
    /// elapses).
    pub fn connect(&self) {
        info!("cloud connect requested");
        self.engine.request_connect();
        if self.policy.blocks_on_connect() {
            self.wait_until_connected();
        }
    }

    /// Clears the connect intent. Never blocks.
    pub fn disconnect(&self) {
        info!("cloud disconnect requested");
        self.engine.request_disconnect();
    }

    /// Runs one step of system processing: a watchdog check-in followed by
    /// an engine tick.
    pub fn process(&self) {
        trace!("processing cloud events");
        self.engine.application_checkin();
        self.engine.tick();
    }

    /// Ticks the engine until connected. Gives up with a warning once the
    /// configured timeout elapses; callers observe that through `connected()`.
    fn wait_until_connected(&self) {
        let interval = self.config.connect_poll_interval();
        let timeout = self.config.connect_timeout();
        let start = Instant::now();
        while !self.connected() {
            if timeout.is_some_and(|limit| start.elapsed() >= limit) {
                warn!(elapsed_ms = start.elapsed().as_millis() as u64, "gave up waiting for cloud connection");
                return;
            }
            self.engine.tick();
            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "cloud connected");
    }

    /// Requests a time synchronization. False if the request was not
    /// accepted (for example while disconnected).
    pub fn sync_time(&self) -> bool {
        cloud_call(false, || self.engine.request_time_sync())
    }

    /// True while a sync request is outstanding on a live connection.
    pub fn sync_time_pending(&self) -> bool {
        self.connected() && cloud_call(false, || self.engine.is_time_sync_pending())
    }

    /// True once no sync is outstanding, or the connection has dropped.
    pub fn sync_time_done(&self) -> bool {
        !cloud_call(false, || self.engine.is_time_sync_pending()) || self.disconnected()
    }

    /// Tick count of the last completed synchronization.
    pub fn time_synced_last(&self) -> u32 {
        self.last_sync().tick
    }

    /// Tick count and Unix timestamp of the last completed synchronization.
    /// Both are zero until the first sync completes.
    pub fn time_synced_last_with_timestamp(&self) -> (u32, i64) {
        let info = self.last_sync();
        (info.tick, info.timestamp)
    }

    pub fn last_sync(&self) -> SyncInfo {
        cloud_call(SyncInfo::default(), || self.engine.last_sync_info())
    }

    pub fn device_id(&self) -> String {
        self.engine.device_id()
    }

    /// Sets the keep-alive ping interval. False if the engine does not
    /// support it.
    pub fn keep_alive(&self, interval: Duration) -> bool {
        let ms = u32::try_from(interval.as_millis()).unwrap_or(u32::MAX);
        cloud_call(false, || {
            self.engine
                .set_connection_property(ConnectionProperty::Ping, ms)
        })
    }
}
