//! Connection engine contract for the cloudlink device layer.
//!
//! The engine that owns the cloud session only understands a narrow,
//! C-style invocation shape: a fixed-signature entry point plus an opaque
//! context pointer. This crate defines:
//!
//! - **ABI**: trampoline signatures, the opaque [`Context`] pointer and the
//!   variable accessor used to re-materialize values at query time
//! - **Facade**: the [`ProtocolFacade`] trait the capability layer calls into
//! - **Future**: [`PublishFuture`], the non-blocking outcome of a publish
//! - **Mock**: [`mock::MockEngine`], an in-process engine for tests
//!
//! # Ownership
//!
//! Contexts handed to the engine at registration are owned by the engine's
//! registration record from then on. Device capabilities are registered once
//! and live for the rest of the process, so there is no matching release.

mod facade;
mod ffi;
mod future;
pub mod mock;

pub use facade::ProtocolFacade;
pub use ffi::{
    CloudFunctionFn, Context, EventHandlerFn, FUNCTION_FAILED, RawEventHandler, VariableExtra,
    VariableUpdateFn, c_str_or_empty, read_variable,
};
pub use future::{PublishFuture, PublishPromise};
