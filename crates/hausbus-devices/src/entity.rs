//! Composite entity core.
//!
//! `EntityContext` is the shared substrate of every behavior type: it
//! resolves the schema's semantic fields against the device's live
//! parameters at construction and exposes the resulting bindings with
//! type narrowing. Absent bindings mean "feature not supported on
//! this hardware variant", never an error.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use hausbus_core::{BoundParameter, Device, ParamType};

use crate::field::Field;
use crate::schema::{DeviceGroupSchema, EntityKind};

/// One resolved field: where it points and the live parameter behind
/// it.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    pub channel_no: u32,
    pub parameter: String,
    /// Visible bindings surface as diagnostic state to the host
    /// application; internal ones only feed the behavior logic.
    pub visible: bool,
    pub param: Arc<BoundParameter>,
}

/// Common interface of every composed entity.
pub trait CompositeEntity: hausbus_core::DeviceEntity {
    fn kind(&self) -> EntityKind;
    /// The channel this entity instance was composed at.
    fn channel_no(&self) -> u32;
    /// Number of fields that resolved to live parameters. Zero means
    /// the entity has no observable state and is discarded.
    fn bound_field_count(&self) -> usize;
    /// Access to the concrete behavior type behind the trait object.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Device reference, identity and resolved field table shared by all
/// behavior types.
pub struct EntityContext {
    device: Arc<Device>,
    unique_id: String,
    kind: EntityKind,
    channel_no: u32,
    bindings: HashMap<Field, FieldBinding>,
}

impl EntityContext {
    /// Bind every field the (already rebased) schema declares against
    /// the device's live parameters.
    ///
    /// Lookup order: repeatable maps first (bound at the entity's home
    /// channel), then the per-channel field maps. The first resolution
    /// of a field name wins.
    pub fn new(
        device: Arc<Device>,
        unique_id: String,
        kind: EntityKind,
        group: &DeviceGroupSchema,
        channel_no: u32,
    ) -> Self {
        let mut context = Self {
            device,
            unique_id,
            kind,
            channel_no,
            bindings: HashMap::new(),
        };

        for (field, parameter) in &group.repeatable_fields {
            context.try_bind(*field, channel_no, parameter, false);
        }
        for (field, parameter) in &group.visible_repeatable_fields {
            context.try_bind(*field, channel_no, parameter, true);
        }
        for (field_channel, field_map) in &group.fields {
            for (field, parameter) in field_map {
                context.try_bind(*field, *field_channel, parameter, false);
            }
        }
        for (field_channel, field_map) in &group.visible_fields {
            for (field, parameter) in field_map {
                context.try_bind(*field, *field_channel, parameter, true);
            }
        }
        context
    }

    fn try_bind(&mut self, field: Field, channel_no: u32, parameter: &str, visible: bool) {
        if self.bindings.contains_key(&field) {
            return;
        }
        let Some(param) = self.device.parameter(channel_no, parameter) else {
            debug!(
                unique_id = %self.unique_id,
                %field,
                parameter,
                channel_no,
                "Field has no live parameter, treating as unsupported"
            );
            return;
        };
        self.bindings.insert(
            field,
            FieldBinding {
                channel_no,
                parameter: parameter.to_string(),
                visible,
                param,
            },
        );
    }

    /// Resolved binding for `field` narrowed to the expected parameter
    /// type. `None` means the feature is unsupported on this device.
    pub fn binding(&self, field: Field, expected: ParamType) -> Option<Arc<BoundParameter>> {
        let binding = self.bindings.get(&field)?;
        let actual = binding.param.param_type();
        // Write-only action parameters carry whatever payload the
        // behavior sends and match any expectation.
        if actual != expected && actual != ParamType::Action {
            return None;
        }
        Some(binding.param.clone())
    }

    /// Untyped binding lookup.
    pub fn raw_binding(&self, field: Field) -> Option<&FieldBinding> {
        self.bindings.get(&field)
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn channel_no(&self) -> u32 {
        self.channel_no
    }

    pub fn bound_field_count(&self) -> usize {
        self.bindings.len()
    }
}

impl std::fmt::Debug for EntityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityContext")
            .field("unique_id", &self.unique_id)
            .field("kind", &self.kind)
            .field("channel_no", &self.channel_no)
            .field("bound_fields", &self.bindings.len())
            .finish()
    }
}

/// Implements `DeviceEntity` + `CompositeEntity` for a behavior type
/// that embeds an `EntityContext` in a field named `ctx`.
macro_rules! impl_composite_entity {
    ($type:ty) => {
        impl hausbus_core::DeviceEntity for $type {
            fn unique_id(&self) -> &str {
                self.ctx.unique_id()
            }
        }

        impl $crate::entity::CompositeEntity for $type {
            fn kind(&self) -> $crate::schema::EntityKind {
                self.ctx.kind()
            }

            fn channel_no(&self) -> u32 {
                self.ctx.channel_no()
            }

            fn bound_field_count(&self) -> usize {
                self.ctx.bound_field_count()
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }
    };
}

pub(crate) use impl_composite_entity;
