//! The narrow invocation ABI shared by the capability layer and the engine.

use cloudlink_types::{VariableKind, VariableValue};
use std::borrow::Cow;
use std::ffi::{CStr, c_char, c_int, c_void};

/// Entry point the engine calls to invoke a registered function.
///
/// Receives the registration context and a NUL-terminated argument string;
/// `reserved` is always null.
pub type CloudFunctionFn =
    unsafe extern "C" fn(data: *mut c_void, param: *const c_char, reserved: *mut c_void) -> c_int;

/// Entry point the engine calls to deliver an event to a subscription.
///
/// `event_data` is null when the event was published without a payload.
pub type EventHandlerFn =
    unsafe extern "C" fn(data: *const c_void, event_name: *const c_char, event_data: *const c_char);

/// A C-style subscription handler taking only the event name and payload.
pub type RawEventHandler = unsafe extern "C" fn(event_name: *const c_char, event_data: *const c_char);

/// Re-materializes the current value of a variable from its registered
/// address. Used for storage that must be read through a lock, an atomic,
/// or a bounded buffer rather than by plain dereference.
pub type VariableUpdateFn = unsafe fn(address: *const c_void) -> VariableValue;

/// Result reported to the engine when a function cannot be invoked.
pub const FUNCTION_FAILED: c_int = -1;

/// Optional registration data for variables whose value cannot be read by
/// dereferencing the address as the kind's plain C type.
#[derive(Debug, Clone, Copy)]
pub struct VariableExtra {
    pub update: VariableUpdateFn,
}

impl VariableExtra {
    #[must_use]
    pub const fn new(update: VariableUpdateFn) -> Self {
        Self { update }
    }
}

/// Opaque context pointer stored alongside a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context(*mut c_void);

// SAFETY: a context is an opaque token. Whoever registers it guarantees the
// pointee may be used from the engine's thread (the capability layer only
// registers `'static` fn pointers and wrappers that serialize calls behind a
// lock).
unsafe impl Send for Context {}
unsafe impl Sync for Context {}

impl Context {
    #[must_use]
    pub const fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    #[must_use]
    pub const fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    #[must_use]
    pub const fn as_ptr(self) -> *mut c_void {
        self.0
    }

    #[must_use]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

/// Reads a registered variable.
///
/// With an accessor the value is produced by `extra.update`; otherwise the
/// address is read as the plain type of `kind` (`bool`, `i32`, `f64`, or a
/// NUL-terminated string).
///
/// # Safety
/// `address` must be the address registered for this variable, still valid,
/// and point at storage matching `kind` (or the accessor's expected type).
pub unsafe fn read_variable(
    address: *const c_void,
    kind: VariableKind,
    extra: Option<VariableExtra>,
) -> VariableValue {
    if let Some(extra) = extra {
        return unsafe { (extra.update)(address) };
    }
    unsafe {
        match kind {
            VariableKind::Bool => VariableValue::Bool(*address.cast::<bool>()),
            VariableKind::Int => VariableValue::Int(*address.cast::<i32>()),
            VariableKind::Double => VariableValue::Double(*address.cast::<f64>()),
            VariableKind::String => {
                VariableValue::String(c_str_or_empty(address.cast::<c_char>()).into_owned())
            }
        }
    }
}

/// Borrows a C string as UTF-8, replacing invalid sequences. Null reads as
/// the empty string.
///
/// # Safety
/// A non-null `ptr` must point at a NUL-terminated string that outlives `'a`.
pub unsafe fn c_str_or_empty<'a>(ptr: *const c_char) -> Cow<'a, str> {
    if ptr.is_null() {
        Cow::Borrowed("")
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy()
    }
}
