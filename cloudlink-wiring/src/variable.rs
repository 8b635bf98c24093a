//! Cloud variables: values the cloud may read on demand.
//!
//! The kind reported to the engine is derived from the Rust type at compile
//! time. Plain immutable scalars and C strings are registered by address;
//! anything mutable (atomics, locks, byte buffers) is registered together
//! with an accessor that takes a fresh snapshot on each read.

use crate::cloud::Cloud;
use crate::error::{CapabilityKind, CloudError, CloudResult};
use cloudlink_protocol::VariableExtra;
use cloudlink_types::{VariableKind, VariableValue};
use std::ffi::{CStr, c_void};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

mod sealed {
    pub trait Sealed {}
}

/// Where the engine reads a variable from.
#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
pub struct VariableBinding {
    address: *const c_void,
    extra: Option<VariableExtra>,
}

impl VariableBinding {
    fn direct(address: *const c_void) -> Self {
        Self {
            address,
            extra: None,
        }
    }

    fn accessor<T: CloudVariable>(value: &'static T) -> Self {
        Self {
            address: ptr::from_ref(value).cast(),
            extra: Some(VariableExtra::new(read_through::<T>)),
        }
    }
}

unsafe fn read_through<T: CloudVariable>(address: *const c_void) -> VariableValue {
    // SAFETY: the address was produced from a `&'static T` in `accessor`.
    unsafe { &*address.cast::<T>() }.snapshot()
}

/// A type that can be exposed as a cloud variable.
///
/// Supported: `bool`, `i32`, `u32`, `f64`, `CStr`, `[u8; N]` (NUL-terminated
/// text), `AtomicBool`, `AtomicI32`, `AtomicU32`, and `Mutex`/`RwLock` around
/// `bool`, `i32`, `u32`, `f64` or `String`.
///
/// `f32` is not a cloud type:
///
/// ```compile_fail,E0277
/// # use cloudlink_protocol::mock::MockEngine;
/// # use cloudlink_wiring::{Cloud, CloudConfig};
/// # use std::sync::Arc;
/// static LEVEL: f32 = 0.5;
/// let cloud = Cloud::new(Arc::new(MockEngine::new()), CloudConfig::default());
/// cloud.variable("level", &LEVEL);
/// ```
///
/// Neither is a reference to a buffer; pass the buffer itself:
///
/// ```compile_fail,E0277
/// # use cloudlink_protocol::mock::MockEngine;
/// # use cloudlink_wiring::{Cloud, CloudConfig};
/// # use std::sync::Arc;
/// static NAME: [u8; 8] = *b"sensor\0\0";
/// let cloud = Cloud::new(Arc::new(MockEngine::new()), CloudConfig::default());
/// cloud.variable("name", &&NAME);
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be registered as a cloud variable",
    label = "unsupported cloud variable type",
    note = "supported types: bool, i32, u32, f64, CStr, [u8; N], AtomicBool, AtomicI32, AtomicU32, and Mutex or RwLock of bool, i32, u32, f64 or String",
    note = "`f32` is not supported; store the value as `f64`",
    note = "pass the variable itself, not a reference to it"
)]
pub trait CloudVariable: Sync + sealed::Sealed {
    /// Kind reported to the cloud.
    const KIND: VariableKind;

    /// The current value.
    fn snapshot(&self) -> VariableValue;

    #[doc(hidden)]
    fn binding(&'static self) -> VariableBinding;
}

macro_rules! direct_variable {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl CloudVariable for $ty {
                const KIND: VariableKind = VariableKind::$kind;

                fn snapshot(&self) -> VariableValue {
                    VariableValue::from(*self)
                }

                fn binding(&'static self) -> VariableBinding {
                    VariableBinding::direct(ptr::from_ref(self).cast())
                }
            }
        )*
    };
}

// u32 shares the i32 layout and is reported as a (wrapping) int.
direct_variable!(bool => Bool, i32 => Int, u32 => Int, f64 => Double);

impl sealed::Sealed for CStr {}

impl CloudVariable for CStr {
    const KIND: VariableKind = VariableKind::String;

    fn snapshot(&self) -> VariableValue {
        VariableValue::String(self.to_string_lossy().into_owned())
    }

    fn binding(&'static self) -> VariableBinding {
        VariableBinding::direct(self.as_ptr().cast())
    }
}

impl<const N: usize> sealed::Sealed for [u8; N] {}

impl<const N: usize> CloudVariable for [u8; N] {
    const KIND: VariableKind = VariableKind::String;

    /// Text up to the first NUL, or the whole buffer when there is none.
    fn snapshot(&self) -> VariableValue {
        let end = self.iter().position(|&b| b == 0).unwrap_or(N);
        VariableValue::String(String::from_utf8_lossy(&self[..end]).into_owned())
    }

    fn binding(&'static self) -> VariableBinding {
        VariableBinding::accessor(self)
    }
}

macro_rules! atomic_variable {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl CloudVariable for $ty {
                const KIND: VariableKind = VariableKind::$kind;

                fn snapshot(&self) -> VariableValue {
                    VariableValue::from(self.load(Ordering::Acquire))
                }

                fn binding(&'static self) -> VariableBinding {
                    VariableBinding::accessor(self)
                }
            }
        )*
    };
}

atomic_variable!(AtomicBool => Bool, AtomicI32 => Int, AtomicU32 => Int);

/// A value that may sit behind a `Mutex` or `RwLock` registration.
pub trait LockedValue: sealed::Sealed + Send + Sync + 'static {
    const KIND: VariableKind;

    fn to_value(&self) -> VariableValue;
}

macro_rules! locked_value {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl LockedValue for $ty {
                const KIND: VariableKind = VariableKind::$kind;

                fn to_value(&self) -> VariableValue {
                    VariableValue::from(self.clone())
                }
            }
        )*
    };
}

impl sealed::Sealed for String {}

locked_value!(bool => Bool, i32 => Int, u32 => Int, f64 => Double, String => String);

impl<T: LockedValue> sealed::Sealed for Mutex<T> {}

impl<T: LockedValue> CloudVariable for Mutex<T> {
    const KIND: VariableKind = T::KIND;

    fn snapshot(&self) -> VariableValue {
        self.lock().unwrap_or_else(PoisonError::into_inner).to_value()
    }

    fn binding(&'static self) -> VariableBinding {
        VariableBinding::accessor(self)
    }
}

impl<T: LockedValue> sealed::Sealed for RwLock<T> {}

impl<T: LockedValue> CloudVariable for RwLock<T> {
    const KIND: VariableKind = T::KIND;

    fn snapshot(&self) -> VariableValue {
        self.read().unwrap_or_else(PoisonError::into_inner).to_value()
    }

    fn binding(&'static self) -> VariableBinding {
        VariableBinding::accessor(self)
    }
}

impl Cloud {
    /// Exposes `value` to the cloud under `name`.
    ///
    /// Returns `true` if the engine accepted the registration. Names longer
    /// than [`MAX_VARIABLE_NAME_LEN`](crate::MAX_VARIABLE_NAME_LEN) are
    /// rejected by the engine; wrap a literal in
    /// [`variable_name!`](crate::variable_name) to catch that at compile time.
    pub fn variable<T>(&self, name: &str, value: &'static T) -> bool
    where
        T: CloudVariable + ?Sized,
    {
        Self::report(CapabilityKind::Variable, name, self.register_variable(name, value))
    }

    fn register_variable<T>(&self, name: &str, value: &'static T) -> CloudResult<()>
    where
        T: CloudVariable + ?Sized,
    {
        Self::check_registration(CapabilityKind::Variable, name)?;
        let binding = value.binding();
        // SAFETY: the binding points at `'static`, `Sync` storage whose layout
        // matches `T::KIND`, or carries an accessor instantiated for `T`.
        let accepted = unsafe {
            self.engine
                .register_variable(name, binding.address, T::KIND, binding.extra)
        };
        if accepted {
            Ok(())
        } else {
            Err(CloudError::rejected(CapabilityKind::Variable, name))
        }
    }
}
