//! The connection engine as seen from the capability layer.

use crate::ffi::{CloudFunctionFn, Context, EventHandlerFn, VariableExtra};
use crate::future::PublishFuture;
use cloudlink_types::{ConnectionProperty, PublishFlags, SubscriptionScope, SyncInfo, VariableKind};
use std::ffi::c_void;

/// The engine that owns the cloud session, its capability tables and the
/// network I/O.
///
/// Registration methods return `true` iff the engine accepted and retained
/// the registration. On `false` the engine holds no reference to the
/// address or context it was given, so the caller may reclaim it.
pub trait ProtocolFacade: Send + Sync {
    /// Registers a read-only variable.
    ///
    /// # Safety
    /// `address` must stay valid and readable for the rest of the process,
    /// and must match `kind` (or the expectations of `extra.update`).
    unsafe fn register_variable(
        &self,
        name: &str,
        address: *const c_void,
        kind: VariableKind,
        extra: Option<VariableExtra>,
    ) -> bool;

    /// Registers a remotely invocable function.
    ///
    /// # Safety
    /// `trampoline` must be sound to call with `context` for the rest of the
    /// process, from whichever thread the engine invokes it on.
    unsafe fn register_function(
        &self,
        trampoline: CloudFunctionFn,
        context: Context,
        name: &str,
    ) -> bool;

    /// Publishes an event. Never blocks; the outcome resolves later.
    fn publish_event(
        &self,
        name: &str,
        data: Option<&str>,
        ttl: u32,
        flags: PublishFlags,
    ) -> PublishFuture;

    /// Subscribes to events whose name starts with `name`.
    ///
    /// # Safety
    /// Same contract as [`ProtocolFacade::register_function`].
    unsafe fn subscribe(
        &self,
        name: &str,
        trampoline: EventHandlerFn,
        context: Context,
        scope: SubscriptionScope,
        device_id: Option<&str>,
    ) -> bool;

    /// Cancels every active subscription.
    fn unsubscribe_all(&self, context: Context);

    fn is_cloud_connected(&self) -> bool;

    /// Sets the connect intent. Never blocks.
    fn request_connect(&self);

    /// Clears the connect intent. Never blocks.
    fn request_disconnect(&self);

    /// Advances the engine's internal processing by one step.
    fn tick(&self);

    /// Signals application liveness to the system watchdog.
    fn application_checkin(&self) {}

    /// Requests a time synchronization; true if the request was accepted.
    fn request_time_sync(&self) -> bool;

    fn is_time_sync_pending(&self) -> bool;

    fn last_sync_info(&self) -> SyncInfo;

    fn device_id(&self) -> String;

    /// Sets a connection tuning property; false if unsupported.
    fn set_connection_property(&self, property: ConnectionProperty, value: u32) -> bool {
        let _ = (property, value);
        false
    }
}
