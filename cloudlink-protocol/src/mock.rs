//! An in-process engine for testing.
//!
//! [`MockEngine`] keeps capability tables in memory, simulates the connect
//! intent/connected transition across ticks, and lets tests invoke
//! registered functions, read variables and deliver events the way the real
//! engine would. It never holds its internal lock while calling user code.

use crate::facade::ProtocolFacade;
use crate::ffi::{self, CloudFunctionFn, Context, EventHandlerFn, VariableExtra};
use crate::future::{PublishFuture, PublishPromise};
use cloudlink_types::{
    ConnectionProperty, MAX_FUNCTION_NAME_LEN, MAX_VARIABLE_NAME_LEN, PublishFlags,
    SubscriptionScope, SyncInfo, VariableKind, VariableValue,
};
use std::collections::HashMap;
use std::ffi::{CString, c_void};
use std::ptr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Default number of concurrent subscriptions the mock accepts.
pub const DEFAULT_SUBSCRIPTION_LIMIT: usize = 4;

/// How the mock answers publishes made while connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Resolve successfully right away.
    #[default]
    Accept,
    /// Resolve as failed right away.
    Reject,
    /// Keep the future pending until [`MockEngine::resolve_deferred`].
    Defer,
}

/// A publish as it reached the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub name: String,
    pub data: Option<String>,
    pub ttl: u32,
    pub flags: PublishFlags,
}

/// A subscription as recorded by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub prefix: String,
    pub scope: SubscriptionScope,
    pub device_id: Option<String>,
}

#[derive(Clone, Copy)]
struct VariableRecord {
    address: Context,
    kind: VariableKind,
    extra: Option<VariableExtra>,
}

#[derive(Clone, Copy)]
struct FunctionRecord {
    trampoline: CloudFunctionFn,
    context: Context,
}

#[derive(Clone)]
struct SubscriptionRecord {
    info: SubscriptionInfo,
    trampoline: EventHandlerFn,
    context: Context,
}

struct MockState {
    device_id: String,
    variables: HashMap<String, VariableRecord>,
    functions: HashMap<String, FunctionRecord>,
    subscriptions: Vec<SubscriptionRecord>,
    subscription_limit: usize,
    published: Vec<PublishedEvent>,
    publish_outcome: PublishOutcome,
    deferred: Vec<PublishPromise>,
    connect_intent: bool,
    connected: bool,
    connect_after_ticks: Option<u32>,
    ticks_until_connected: Option<u32>,
    ticks: u32,
    checkins: u32,
    unsubscribe_calls: u32,
    sync_pending: bool,
    sync_requests: u32,
    last_sync: SyncInfo,
    keep_alive_ms: Option<u32>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            device_id: "0123456789abcdef01234567".to_string(),
            variables: HashMap::new(),
            functions: HashMap::new(),
            subscriptions: Vec::new(),
            subscription_limit: DEFAULT_SUBSCRIPTION_LIMIT,
            published: Vec::new(),
            publish_outcome: PublishOutcome::default(),
            deferred: Vec::new(),
            connect_intent: false,
            connected: false,
            connect_after_ticks: Some(1),
            ticks_until_connected: None,
            ticks: 0,
            checkins: 0,
            unsubscribe_calls: 0,
            sync_pending: false,
            sync_requests: 0,
            last_sync: SyncInfo::default(),
            keep_alive_ms: None,
        }
    }
}

/// In-memory [`ProtocolFacade`] implementation.
#[derive(Default)]
pub struct MockEngine {
    state: Mutex<MockState>,
}

impl MockEngine {
    /// Creates a disconnected engine that connects one tick after a connect
    /// request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine reporting the given device ID.
    pub fn with_device_id(device_id: impl Into<String>) -> Self {
        let engine = Self::default();
        engine.lock().device_id = device_id.into();
        engine
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Scripting ────────────────────────────────────────────────

    /// Sets how many ticks a connect request takes to complete. `Some(0)`
    /// connects inside `request_connect`; `None` never connects.
    pub fn set_connect_after_ticks(&self, ticks: Option<u32>) {
        self.lock().connect_after_ticks = ticks;
    }

    /// Forces the connected state, bypassing the connect intent.
    pub fn set_connected(&self, connected: bool) {
        let mut state = self.lock();
        state.connected = connected;
        state.ticks_until_connected = None;
    }

    pub fn set_publish_outcome(&self, outcome: PublishOutcome) {
        self.lock().publish_outcome = outcome;
    }

    /// Resolves every deferred publish. Returns how many were pending.
    pub fn resolve_deferred(&self, success: bool) -> usize {
        let deferred = std::mem::take(&mut self.lock().deferred);
        let count = deferred.len();
        for promise in deferred {
            promise.resolve(success);
        }
        count
    }

    pub fn set_subscription_limit(&self, limit: usize) {
        self.lock().subscription_limit = limit;
    }

    /// Overrides the engine's "sync in flight" flag.
    pub fn set_time_sync_pending(&self, pending: bool) {
        self.lock().sync_pending = pending;
    }

    /// Completes the in-flight sync at the current tick.
    pub fn complete_time_sync(&self, timestamp: i64) {
        let mut state = self.lock();
        state.sync_pending = false;
        state.last_sync = SyncInfo::new(state.ticks, timestamp);
    }

    /// Completes the in-flight sync with the host's wall clock.
    pub fn complete_time_sync_now(&self) {
        self.complete_time_sync(chrono::Utc::now().timestamp());
    }

    // ── Inspection ───────────────────────────────────────────────

    pub fn connect_requested(&self) -> bool {
        self.lock().connect_intent
    }

    pub fn tick_count(&self) -> u32 {
        self.lock().ticks
    }

    pub fn checkin_count(&self) -> u32 {
        self.lock().checkins
    }

    pub fn unsubscribe_calls(&self) -> u32 {
        self.lock().unsubscribe_calls
    }

    pub fn sync_requests(&self) -> u32 {
        self.lock().sync_requests
    }

    pub fn keep_alive_ms(&self) -> Option<u32> {
        self.lock().keep_alive_ms
    }

    /// Every publish that reached the engine, in order.
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.lock().published.clone()
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        self.lock()
            .subscriptions
            .iter()
            .map(|s| s.info.clone())
            .collect()
    }

    pub fn variable_kind(&self, name: &str) -> Option<VariableKind> {
        self.lock().variables.get(name).map(|v| v.kind)
    }

    /// Returns true if the variable was registered with an accessor.
    pub fn variable_has_accessor(&self, name: &str) -> Option<bool> {
        self.lock().variables.get(name).map(|v| v.extra.is_some())
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.lock().functions.contains_key(name)
    }

    // ── Invocation ───────────────────────────────────────────────

    /// Reads a variable the way a cloud query would.
    pub fn read_variable(&self, name: &str) -> Option<VariableValue> {
        let record = *self.lock().variables.get(name)?;
        // SAFETY: `register_variable` callers guarantee the address stays
        // valid and matches the kind for the rest of the process.
        Some(unsafe { ffi::read_variable(record.address.as_ptr(), record.kind, record.extra) })
    }

    /// Invokes a function the way a cloud call would. `None` if unknown or
    /// if the argument cannot be passed as a C string.
    pub fn call_function(&self, name: &str, arg: &str) -> Option<i32> {
        let record = *self.lock().functions.get(name)?;
        let arg = CString::new(arg).ok()?;
        trace!(function = name, "invoking cloud function");
        // SAFETY: `register_function` callers guarantee the trampoline is
        // sound to call with this context.
        Some(unsafe { (record.trampoline)(record.context.as_ptr(), arg.as_ptr(), ptr::null_mut()) })
    }

    /// Delivers an event to every subscription whose prefix matches.
    /// Returns the number of handlers invoked.
    pub fn deliver_event(&self, name: &str, data: Option<&str>) -> usize {
        let matching: Vec<SubscriptionRecord> = self
            .lock()
            .subscriptions
            .iter()
            .filter(|s| name.starts_with(&s.info.prefix))
            .cloned()
            .collect();
        if matching.is_empty() {
            return 0;
        }
        let Ok(c_name) = CString::new(name) else {
            return 0;
        };
        let c_data = match data.map(CString::new) {
            Some(Ok(d)) => Some(d),
            Some(Err(_)) => return 0,
            None => None,
        };
        let data_ptr = c_data.as_ref().map_or(ptr::null(), |d| d.as_ptr());
        for record in &matching {
            // SAFETY: `subscribe` callers guarantee the trampoline is sound
            // to call with this context.
            unsafe {
                (record.trampoline)(record.context.as_ptr().cast_const(), c_name.as_ptr(), data_ptr)
            };
        }
        matching.len()
    }
}

fn valid_name(name: &str, max: usize) -> bool {
    !name.is_empty() && name.len() <= max
}

impl ProtocolFacade for MockEngine {
    unsafe fn register_variable(
        &self,
        name: &str,
        address: *const c_void,
        kind: VariableKind,
        extra: Option<VariableExtra>,
    ) -> bool {
        if address.is_null() || !valid_name(name, MAX_VARIABLE_NAME_LEN) {
            return false;
        }
        let mut state = self.lock();
        if state.variables.contains_key(name) {
            debug!(variable = name, "duplicate variable name");
            return false;
        }
        state.variables.insert(
            name.to_string(),
            VariableRecord {
                address: Context::new(address.cast_mut()),
                kind,
                extra,
            },
        );
        true
    }

    unsafe fn register_function(
        &self,
        trampoline: CloudFunctionFn,
        context: Context,
        name: &str,
    ) -> bool {
        if !valid_name(name, MAX_FUNCTION_NAME_LEN) {
            return false;
        }
        let mut state = self.lock();
        if state.functions.contains_key(name) {
            debug!(function = name, "duplicate function name");
            return false;
        }
        state
            .functions
            .insert(name.to_string(), FunctionRecord { trampoline, context });
        true
    }

    fn publish_event(
        &self,
        name: &str,
        data: Option<&str>,
        ttl: u32,
        flags: PublishFlags,
    ) -> PublishFuture {
        let mut state = self.lock();
        state.published.push(PublishedEvent {
            name: name.to_string(),
            data: data.map(str::to_string),
            ttl,
            flags,
        });
        if !state.connected {
            return PublishFuture::ready(false);
        }
        match state.publish_outcome {
            PublishOutcome::Accept => PublishFuture::ready(true),
            PublishOutcome::Reject => PublishFuture::ready(false),
            PublishOutcome::Defer => {
                let (promise, future) = PublishFuture::pair();
                state.deferred.push(promise);
                future
            }
        }
    }

    unsafe fn subscribe(
        &self,
        name: &str,
        trampoline: EventHandlerFn,
        context: Context,
        scope: SubscriptionScope,
        device_id: Option<&str>,
    ) -> bool {
        let mut state = self.lock();
        if state.subscriptions.len() >= state.subscription_limit {
            debug!(event = name, "subscription table full");
            return false;
        }
        state.subscriptions.push(SubscriptionRecord {
            info: SubscriptionInfo {
                prefix: name.to_string(),
                scope,
                device_id: device_id.map(str::to_string),
            },
            trampoline,
            context,
        });
        true
    }

    fn unsubscribe_all(&self, _context: Context) {
        let mut state = self.lock();
        state.subscriptions.clear();
        state.unsubscribe_calls += 1;
    }

    fn is_cloud_connected(&self) -> bool {
        self.lock().connected
    }

    fn request_connect(&self) {
        let mut state = self.lock();
        state.connect_intent = true;
        if state.connected {
            return;
        }
        match state.connect_after_ticks {
            Some(0) => state.connected = true,
            other => state.ticks_until_connected = other,
        }
    }

    fn request_disconnect(&self) {
        let mut state = self.lock();
        state.connect_intent = false;
        state.connected = false;
        state.ticks_until_connected = None;
    }

    fn tick(&self) {
        let mut state = self.lock();
        state.ticks = state.ticks.wrapping_add(1);
        if !state.connect_intent || state.connected {
            return;
        }
        match state.ticks_until_connected {
            Some(n) if n <= 1 => {
                state.connected = true;
                state.ticks_until_connected = None;
            }
            Some(n) => state.ticks_until_connected = Some(n - 1),
            None => {}
        }
    }

    fn application_checkin(&self) {
        self.lock().checkins += 1;
    }

    fn request_time_sync(&self) -> bool {
        let mut state = self.lock();
        if !state.connected {
            return false;
        }
        state.sync_pending = true;
        state.sync_requests += 1;
        true
    }

    fn is_time_sync_pending(&self) -> bool {
        self.lock().sync_pending
    }

    fn last_sync_info(&self) -> SyncInfo {
        self.lock().last_sync
    }

    fn device_id(&self) -> String {
        self.lock().device_id.clone()
    }

    fn set_connection_property(&self, property: ConnectionProperty, value: u32) -> bool {
        match property {
            ConnectionProperty::Ping => {
                self.lock().keep_alive_ms = Some(value);
                true
            }
        }
    }
}
