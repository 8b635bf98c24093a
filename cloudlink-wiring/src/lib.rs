//! Device-side cloud capability layer.
//!
//! [`Cloud`] is the single entry point an application uses to:
//! - expose variables the cloud may read ([`Cloud::variable`])
//! - register functions the cloud may call ([`Cloud::function`])
//! - publish and subscribe to events ([`Cloud::publish_event`], [`Cloud::subscribe`])
//! - control the connection and time synchronization ([`Cloud::connect`], [`Cloud::sync_time`])
//!
//! The facade owns no session state. It type-checks and adapts each call,
//! then delegates to a [`ProtocolFacade`] engine.
//!
//! ```
//! use cloudlink_protocol::mock::MockEngine;
//! use cloudlink_wiring::{Cloud, CloudConfig, function_name, variable_name};
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicI32;
//!
//! static TEMPERATURE: AtomicI32 = AtomicI32::new(21);
//!
//! # if !cloudlink_wiring::cloud_enabled() { return; }
//! let engine = Arc::new(MockEngine::new());
//! let cloud = Cloud::new(engine.clone(), CloudConfig::default());
//!
//! assert!(cloud.variable(variable_name!("temperature"), &TEMPERATURE));
//! assert!(cloud.function_with(function_name!("reset"), |_arg| 0));
//! assert_eq!(engine.call_function("reset", ""), Some(0));
//! ```
//!
//! Building without the default `cloud` feature keeps the API but turns every
//! capability call into its rejection value.

mod cloud;
mod config;
mod connection;
mod error;
mod event;
mod function;
mod policy;
mod variable;

pub use cloud::{Cloud, cloud_enabled};
pub use config::CloudConfig;
pub use error::{CapabilityKind, CloudError, CloudResult};
pub use event::{EventScope, OutgoingEvent};
pub use function::UserFunction;
pub use policy::{ConnectPolicy, SystemConnectPolicy};
pub use variable::{CloudVariable, LockedValue, VariableBinding};

pub use cloudlink_protocol::{FUNCTION_FAILED, ProtocolFacade, PublishFuture, RawEventHandler};
pub use cloudlink_types::{
    FeatureState, MAX_FUNCTION_NAME_LEN, MAX_VARIABLE_NAME_LEN, NO_ACK, PRIVATE, PUBLIC,
    PublishFlag, PublishFlags, SubscriptionScope, SyncInfo, SystemMode, VariableKind,
    VariableValue, WITH_ACK,
};

/// Checks a literal variable name against [`MAX_VARIABLE_NAME_LEN`] at
/// compile time and evaluates to it.
///
/// ```compile_fail,E0080
/// let name = cloudlink_wiring::variable_name!(
///     "this_variable_name_is_far_too_long_to_ever_be_accepted_by_the_cloud"
/// );
/// ```
#[macro_export]
macro_rules! variable_name {
    ($name:literal) => {{
        const _: () = assert!(
            $name.len() <= $crate::MAX_VARIABLE_NAME_LEN,
            "cloud variable name is longer than MAX_VARIABLE_NAME_LEN"
        );
        $name
    }};
}

/// Checks a literal function name against [`MAX_FUNCTION_NAME_LEN`] at
/// compile time and evaluates to it.
///
/// ```compile_fail,E0080
/// let name = cloudlink_wiring::function_name!("calibrate_sensor");
/// ```
#[macro_export]
macro_rules! function_name {
    ($name:literal) => {{
        const _: () = assert!(
            $name.len() <= $crate::MAX_FUNCTION_NAME_LEN,
            "cloud function name is longer than MAX_FUNCTION_NAME_LEN"
        );
        $name
    }};
}
