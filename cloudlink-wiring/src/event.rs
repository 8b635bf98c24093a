//! Publishing and subscribing to named events.

use crate::cloud::{Cloud, cloud_call, cloud_enabled};
use crate::error::{CapabilityKind, CloudError, CloudResult};
use cloudlink_protocol::{Context, EventHandlerFn, PublishFuture, RawEventHandler, c_str_or_empty};
use cloudlink_types::{PublishFlags, SubscriptionScope};
use std::ffi::{c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error};

/// Which publishers a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EventScope {
    #[default]
    AllDevices,
    MyDevices,
    /// Events from a single device owned by the same account.
    Device(String),
}

impl EventScope {
    fn lower(&self) -> (SubscriptionScope, Option<&str>) {
        match self {
            Self::AllDevices => (SubscriptionScope::AllDevices, None),
            Self::MyDevices => (SubscriptionScope::MyDevices, None),
            Self::Device(id) => (SubscriptionScope::MyDevices, Some(id.as_str())),
        }
    }
}

impl From<SubscriptionScope> for EventScope {
    fn from(scope: SubscriptionScope) -> Self {
        match scope {
            SubscriptionScope::AllDevices => Self::AllDevices,
            SubscriptionScope::MyDevices => Self::MyDevices,
        }
    }
}

/// An event to publish.
///
/// ```
/// use cloudlink_wiring::{OutgoingEvent, NO_ACK, PRIVATE};
///
/// let event = OutgoingEvent::new("door/open")
///     .with_data("front")
///     .with_flags(PRIVATE)
///     .with_flags(NO_ACK);
/// assert!(!event.flags().is_public());
/// assert!(event.flags().contains(NO_ACK));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEvent {
    name: String,
    data: Option<String>,
    ttl: Option<u32>,
    flags: PublishFlags,
}

impl OutgoingEvent {
    /// A public event with no payload and the configured default TTL.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
            ttl: None,
            flags: PublishFlags::default(),
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Time-to-live in seconds.
    #[must_use]
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Adds flags to those already set.
    #[must_use]
    pub fn with_flags(mut self, flags: impl Into<PublishFlags>) -> Self {
        self.flags |= flags.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn ttl(&self) -> Option<u32> {
        self.ttl
    }

    pub fn flags(&self) -> PublishFlags {
        self.flags
    }
}

type BoxedHandler = Box<dyn FnMut(&str, &str) + Send>;

/// Deliveries may arrive on any engine thread; the lock serializes them.
struct EventHandlerWrapper {
    prefix: String,
    handler: Mutex<BoxedHandler>,
}

unsafe extern "C" fn call_raw_event_handler(
    data: *const c_void,
    event_name: *const c_char,
    event_data: *const c_char,
) {
    if data.is_null() {
        return;
    }
    // SAFETY: `subscribe_raw` registers this trampoline only with a
    // `RawEventHandler` cast to the context pointer.
    let handler = unsafe { std::mem::transmute::<*const c_void, RawEventHandler>(data) };
    unsafe { handler(event_name, event_data) }
}

unsafe extern "C" fn call_wiring_event_handler(
    data: *const c_void,
    event_name: *const c_char,
    event_data: *const c_char,
) {
    // SAFETY: the context is a leaked `EventHandlerWrapper` owned by the
    // engine. Only shared references are formed; mutation goes through the lock.
    let Some(wrapper) = (unsafe { data.cast::<EventHandlerWrapper>().as_ref() }) else {
        return;
    };
    let name = unsafe { c_str_or_empty(event_name) };
    let payload = unsafe { c_str_or_empty(event_data) };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut handler = wrapper.handler.lock().unwrap_or_else(PoisonError::into_inner);
        (*handler)(&name, &payload);
    }));
    if outcome.is_err() {
        error!(prefix = %wrapper.prefix, event = %name, "event handler panicked");
    }
}

impl Cloud {
    /// Publishes a public event with no payload.
    pub fn publish(&self, name: &str) -> PublishFuture {
        self.publish_event(OutgoingEvent::new(name))
    }

    /// Publishes a public event carrying `data`.
    pub fn publish_data(&self, name: &str, data: &str) -> PublishFuture {
        self.publish_event(OutgoingEvent::new(name).with_data(data))
    }

    /// Publishes `event`. Never blocks; the returned future resolves to
    /// whether the cloud accepted it.
    pub fn publish_event(&self, event: OutgoingEvent) -> PublishFuture {
        if !cloud_enabled() {
            return PublishFuture::ready(false);
        }
        let ttl = event.ttl.unwrap_or(self.config.default_ttl);
        debug!(name = %event.name, ttl, flags = %event.flags, "publishing event");
        self.engine
            .publish_event(&event.name, event.data.as_deref(), ttl, event.flags)
    }

    /// Subscribes a C-style handler to events whose name starts with `name`.
    /// Registered without allocating.
    pub fn subscribe_raw(
        &self,
        name: &str,
        handler: RawEventHandler,
        scope: impl Into<EventScope>,
    ) -> bool {
        let context = Context::new(handler as *mut c_void);
        let result = self.register_subscription(name, call_raw_event_handler, context, &scope.into());
        Self::report(CapabilityKind::Subscription, name, result)
    }

    /// Subscribes a callable to events whose name starts with `name`.
    ///
    /// The handler receives the event name and its payload (empty when the
    /// event carried none). It lives for the rest of the process once
    /// accepted, or until [`Cloud::unsubscribe`].
    pub fn subscribe<F>(&self, name: &str, handler: F, scope: impl Into<EventScope>) -> bool
    where
        F: FnMut(&str, &str) + Send + 'static,
    {
        let result = self.register_boxed_handler(name, Box::new(handler), &scope.into());
        Self::report(CapabilityKind::Subscription, name, result)
    }

    /// Subscribes a method bound to a shared instance.
    pub fn subscribe_method<T>(
        &self,
        name: &str,
        instance: Arc<Mutex<T>>,
        method: fn(&mut T, &str, &str),
        scope: impl Into<EventScope>,
    ) -> bool
    where
        T: Send + 'static,
    {
        self.subscribe(
            name,
            move |event, data| {
                let mut guard = instance.lock().unwrap_or_else(PoisonError::into_inner);
                method(&mut guard, event, data);
            },
            scope,
        )
    }

    /// Cancels every subscription made through this device.
    pub fn unsubscribe(&self) {
        cloud_call((), || {
            debug!("cancelling all subscriptions");
            self.engine.unsubscribe_all(Context::null());
        });
    }

    fn register_boxed_handler(
        &self,
        name: &str,
        handler: BoxedHandler,
        scope: &EventScope,
    ) -> CloudResult<()> {
        Self::check_registration(CapabilityKind::Subscription, name)?;
        let wrapper = Box::into_raw(Box::new(EventHandlerWrapper {
            prefix: name.to_string(),
            handler: Mutex::new(handler),
        }));
        let result =
            self.register_subscription(name, call_wiring_event_handler, Context::new(wrapper.cast()), scope);
        if result.is_err() {
            // SAFETY: the engine retained nothing, so the box is ours again.
            drop(unsafe { Box::from_raw(wrapper) });
        }
        result
    }

    fn register_subscription(
        &self,
        name: &str,
        trampoline: EventHandlerFn,
        context: Context,
        scope: &EventScope,
    ) -> CloudResult<()> {
        Self::check_registration(CapabilityKind::Subscription, name)?;
        let (scope, device_id) = scope.lower();
        // SAFETY: each trampoline here is paired only with the context type it
        // expects, and both contexts outlive the registration.
        if unsafe { self.engine.subscribe(name, trampoline, context, scope, device_id) } {
            Ok(())
        } else {
            Err(CloudError::rejected(CapabilityKind::Subscription, name))
        }
    }
}
