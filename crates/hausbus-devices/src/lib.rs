//! Custom Entity Composition Crate
//!
//! This crate builds composite entities for devices whose channel
//! layout hides their real capabilities behind generic paramsets.
//!
//! ## Architecture
//!
//! The composition pipeline has four stages:
//! - **SchemaRegistry**: Validated builtin device-group schemas per entity kind
//! - **Rebaser**: Shifts a schema's channel references to a base channel
//! - **EntityContext**: Binds schema fields to a device's live parameters
//! - **Factory**: Guards, instantiates and registers behavior entities
//!
//! Behavior families (`light`, `lock`) sit on top and turn bound
//! fields into capability traits. The `models` catalog maps device
//! model strings to composition configs.

pub mod entity;
pub mod factory;
pub mod field;
pub mod light;
pub mod lock;
pub mod models;
pub mod rebase;
pub mod schema;

pub use entity::{CompositeEntity, EntityContext, FieldBinding};
pub use factory::{additional_parameters, compose, compose_all, CustomConfig, ExtendedConfig};
pub use field::Field;
pub use light::{Light, LightCommandArgs};
pub use lock::Lock;
pub use models::{custom_configs_for_model, is_custom_model};
pub use rebase::{rebase_additional, rebase_group};
pub use schema::{
    AdditionalEntitiesSpec, ChannelFieldMap, DeviceGroupDefinition, DeviceGroupSchema,
    EntityKind, FieldMap, SchemaRegistry,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
