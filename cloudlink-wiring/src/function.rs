//! Cloud functions: named entry points the cloud may invoke with a string
//! argument and an integer result.

use crate::cloud::Cloud;
use crate::error::{CapabilityKind, CloudError, CloudResult};
use cloudlink_protocol::{CloudFunctionFn, Context, FUNCTION_FAILED, c_str_or_empty};
use std::ffi::{c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::error;

/// A plain function pointer handler. Registered without allocating.
pub type UserFunction = fn(&str) -> i32;

type BoxedFunction = Box<dyn FnMut(&str) -> i32 + Send>;

/// Engines may invoke a function from any thread, so calls are serialized
/// through the lock. A callable must not re-enter its own registration.
struct FunctionWrapper {
    name: String,
    call: Mutex<BoxedFunction>,
}

unsafe extern "C" fn call_raw_user_function(
    data: *mut c_void,
    param: *const c_char,
    _reserved: *mut c_void,
) -> c_int {
    if data.is_null() {
        return FUNCTION_FAILED;
    }
    // SAFETY: `Cloud::function` registers this trampoline only with a
    // `UserFunction` cast to the context pointer.
    let func = unsafe { std::mem::transmute::<*mut c_void, UserFunction>(data) };
    let arg = unsafe { c_str_or_empty(param) };
    panic::catch_unwind(|| func(&arg)).unwrap_or_else(|_| {
        error!(function = ?func, "cloud function panicked");
        FUNCTION_FAILED
    })
}

unsafe extern "C" fn call_std_user_function(
    data: *mut c_void,
    param: *const c_char,
    _reserved: *mut c_void,
) -> c_int {
    // SAFETY: the context is a leaked `FunctionWrapper` owned by the engine.
    // Only shared references are formed; mutation goes through the lock.
    let Some(wrapper) = (unsafe { data.cast_const().cast::<FunctionWrapper>().as_ref() }) else {
        return FUNCTION_FAILED;
    };
    let arg = unsafe { c_str_or_empty(param) };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut call = wrapper.call.lock().unwrap_or_else(PoisonError::into_inner);
        (*call)(&arg)
    }));
    match outcome {
        Ok(result) => result,
        Err(_) => {
            error!(function = %wrapper.name, "cloud function panicked");
            FUNCTION_FAILED
        }
    }
}

impl Cloud {
    /// Registers a plain function pointer.
    ///
    /// Returns `true` if the engine accepted the registration. A panic
    /// inside `func` is reported to the cloud as [`FUNCTION_FAILED`].
    pub fn function(&self, name: &str, func: UserFunction) -> bool {
        let context = Context::new(func as *mut c_void);
        Self::report(
            CapabilityKind::Function,
            name,
            self.register_function(name, call_raw_user_function, context),
        )
    }

    /// Registers any callable, including capturing closures.
    ///
    /// The callable lives for the rest of the process once accepted. On
    /// rejection it is dropped before this returns.
    pub fn function_with<F>(&self, name: &str, func: F) -> bool
    where
        F: FnMut(&str) -> i32 + Send + 'static,
    {
        Self::report(
            CapabilityKind::Function,
            name,
            self.register_boxed_function(name, Box::new(func)),
        )
    }

    /// Registers a method bound to a shared instance.
    ///
    /// Invocations lock `instance` for their duration.
    pub fn function_method<T>(
        &self,
        name: &str,
        instance: Arc<Mutex<T>>,
        method: fn(&mut T, &str) -> i32,
    ) -> bool
    where
        T: Send + 'static,
    {
        self.function_with(name, move |arg| {
            let mut guard = instance.lock().unwrap_or_else(PoisonError::into_inner);
            method(&mut guard, arg)
        })
    }

    fn register_boxed_function(&self, name: &str, call: BoxedFunction) -> CloudResult<()> {
        Self::check_registration(CapabilityKind::Function, name)?;
        let wrapper = Box::into_raw(Box::new(FunctionWrapper {
            name: name.to_string(),
            call: Mutex::new(call),
        }));
        let result = self.register_function(name, call_std_user_function, Context::new(wrapper.cast()));
        if result.is_err() {
            // SAFETY: the engine retained nothing, so the box is ours again.
            drop(unsafe { Box::from_raw(wrapper) });
        }
        result
    }

    fn register_function(
        &self,
        name: &str,
        trampoline: CloudFunctionFn,
        context: Context,
    ) -> CloudResult<()> {
        Self::check_registration(CapabilityKind::Function, name)?;
        // SAFETY: each trampoline here is paired only with the context type it
        // expects, and both contexts outlive the registration.
        if unsafe { self.engine.register_function(trampoline, context, name) } {
            Ok(())
        } else {
            Err(CloudError::rejected(CapabilityKind::Function, name))
        }
    }
}
