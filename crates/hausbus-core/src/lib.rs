//! Device and parameter layer for the hausbus backend.
//!
//! This crate is the substrate the composition engine in
//! `hausbus-devices` is built on:
//! - **ParameterSink**: the async transport collaborator that reads
//!   and writes raw channel parameters
//! - **BoundParameter**: a live (channel, parameter) binding with a
//!   cached value and validated writes
//! - **CallParameterCollector**: batches the writes of one logical
//!   command into a single backend call
//! - **Device**: channels, parameter table and the entity registry
//!   with atomic, idempotent registration
//!
//! Everything here is transport-agnostic; network I/O, timeouts and
//! retries live behind the `ParameterSink` implementation.

pub mod collector;
pub mod device;
pub mod error;
pub mod flags;
pub mod ids;
pub mod parameter;
pub mod sink;
pub mod value;

pub use collector::CallParameterCollector;
pub use device::{Device, DeviceEntity};
pub use error::{DeviceError, DeviceResult};
pub use flags::{
    FLAG_INTERNAL, FLAG_SERVICE, FLAG_STICKY, FLAG_TRANSFORM, FLAG_VISIBLE, OPERATION_EVENT,
    OPERATION_NONE, OPERATION_READ, OPERATION_WRITE,
};
pub use ids::{generate_unique_id, DOMAIN};
pub use parameter::{BoundParameter, ParameterDescription};
pub use sink::{ParameterSink, ParamsetKey};
pub use value::{ParamType, ParamValue};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
