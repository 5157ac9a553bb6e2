//! Entity factory.
//!
//! Turns a schema definition plus a per-model configuration into live
//! composite entities on a device: rebase the group to each base
//! channel, guard against duplicates and missing channels, bind the
//! fields, drop entities that resolved nothing, register the rest
//! atomically on the device.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use hausbus_core::{generate_unique_id, Device, DeviceEntity, DeviceError, DeviceResult, DOMAIN};

use crate::entity::{CompositeEntity, EntityContext};
use crate::light::{ColorDimmer, ColorDimmerEffect, ColorTempDimmer, Dimmer, FixedColorLight};
use crate::lock::{IpLock, RfLock};
use crate::rebase::{rebase_additional, rebase_group};
use crate::schema::{
    AdditionalEntitiesSpec, ChannelFieldMap, DeviceGroupSchema, EntityKind, SchemaRegistry,
};

/// Per-model overrides layered on top of a kind's builtin schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedConfig {
    /// Extra field bindings at fixed absolute channels, merged into
    /// the rebased group before binding.
    pub fixed_channels: ChannelFieldMap,
    /// Extra bare single-parameter entities beyond the schema's own.
    pub additional_entities: AdditionalEntitiesSpec,
}

impl ExtendedConfig {
    /// Every parameter name the override refers to. Callers use this
    /// to widen parameter fetches for models that hide these behind
    /// the internal flag.
    pub fn required_parameters(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self
            .fixed_channels
            .values()
            .flat_map(|fields| fields.values().cloned())
            .collect();
        names.extend(self.additional_entities.parameter_names());
        names.into_iter().collect()
    }
}

/// One composition instruction: which kind to build and at which base
/// channels.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomConfig {
    pub kind: EntityKind,
    /// Base channel offsets; 0 composes the group unshifted.
    pub channels: Vec<u32>,
    pub extended: Option<ExtendedConfig>,
}

impl CustomConfig {
    pub fn new(kind: EntityKind, channels: &[u32]) -> Self {
        Self {
            kind,
            channels: channels.to_vec(),
            extended: None,
        }
    }

    pub fn with_extended(mut self, extended: ExtendedConfig) -> Self {
        self.extended = Some(extended);
        self
    }

    pub fn required_parameters(&self) -> Vec<String> {
        self.extended
            .as_ref()
            .map(ExtendedConfig::required_parameters)
            .unwrap_or_default()
    }
}

/// Compose every entity a config asks for on `device`.
///
/// Each base channel yields one entity per channel of the rebased
/// group's channel set (primary plus secondaries); virtual channels
/// get their own instance this way. An entity is skipped when its
/// unique id is already registered, when its home channel does not
/// exist on the device, or when no schema field resolved to a live
/// parameter.
pub fn compose(
    device: &Arc<Device>,
    registry: &SchemaRegistry,
    config: &CustomConfig,
) -> DeviceResult<Vec<Arc<dyn CompositeEntity>>> {
    let definition = registry.definition(config.kind).ok_or_else(|| {
        DeviceError::SchemaValidation(format!("no definition for kind {}", config.kind))
    })?;

    let mut created: Vec<Arc<dyn CompositeEntity>> = Vec::new();
    for base_channel in &config.channels {
        let mut group = rebase_group(&definition.device_group, *base_channel);
        if let Some(extended) = &config.extended {
            merge_fixed_channels(&mut group, &extended.fixed_channels);
        }

        // Primary first, then secondaries, deduplicated.
        let mut channel_set = vec![group.primary_channel];
        for channel_no in &group.secondary_channels {
            if !channel_set.contains(channel_no) {
                channel_set.push(*channel_no);
            }
        }

        for channel_no in channel_set {
            let unique_id = generate_unique_id(DOMAIN, &device.channel_address(channel_no));
            if device.has_entity(&unique_id) {
                debug!(%unique_id, "Entity already composed, skipping");
                continue;
            }
            if !device.channel_exists(channel_no) {
                debug!(
                    address = device.address(),
                    channel_no,
                    "Channel missing on device, skipping"
                );
                continue;
            }

            let ctx = EntityContext::new(
                device.clone(),
                unique_id.clone(),
                config.kind,
                &group,
                channel_no,
            );
            if ctx.bound_field_count() == 0 {
                debug!(%unique_id, "No field resolved to a live parameter, discarding");
                continue;
            }

            let (entity, composite) = instantiate(config.kind, ctx);
            if device.try_add_entity(entity) {
                info!(
                    %unique_id,
                    kind = %config.kind,
                    channel_no,
                    "Composed entity"
                );
                created.push(composite);
            } else {
                debug!(%unique_id, "Lost registration race, discarding");
            }
        }
    }
    Ok(created)
}

/// Compose all configs of a model catalog entry in order.
pub fn compose_all(
    device: &Arc<Device>,
    registry: &SchemaRegistry,
    configs: &[CustomConfig],
) -> DeviceResult<Vec<Arc<dyn CompositeEntity>>> {
    let mut created = Vec::new();
    for config in configs {
        created.extend(compose(device, registry, config)?);
    }
    Ok(created)
}

/// Merged and rebased bare-parameter spec for a config: the schema's
/// own additional entities at every base channel, plus the extended
/// ones unshifted.
pub fn additional_parameters(
    registry: &SchemaRegistry,
    config: &CustomConfig,
) -> AdditionalEntitiesSpec {
    let mut merged = AdditionalEntitiesSpec::default();
    if let Some(spec) = registry.additional_entities(config.kind) {
        for base_channel in &config.channels {
            merged = merged.merged_with(&rebase_additional(spec, *base_channel));
        }
    }
    if let Some(extended) = &config.extended {
        merged = merged.merged_with(&extended.additional_entities);
    }
    if registry.include_default_entities(config.kind) {
        merged = merged.merged_with(registry.default_entities());
    }
    merged
}

fn merge_fixed_channels(group: &mut DeviceGroupSchema, fixed: &ChannelFieldMap) {
    for (channel_no, fields) in fixed {
        let target = group.fields.entry(*channel_no).or_default();
        for (field, parameter) in fields {
            target.insert(*field, parameter.clone());
        }
    }
}

/// Build the concrete behavior for `kind`, coercing it once to the
/// device-registry trait object and once to the capability object.
fn instantiate(
    kind: EntityKind,
    ctx: EntityContext,
) -> (Arc<dyn DeviceEntity>, Arc<dyn CompositeEntity>) {
    match kind {
        EntityKind::IpDimmer | EntityKind::RfDimmer | EntityKind::RfDimmerWithVirtChannel => {
            let entity = Arc::new(Dimmer::new(ctx));
            (entity.clone(), entity)
        }
        EntityKind::RfDimmerColor => {
            let entity = Arc::new(ColorDimmer::new(ctx));
            (entity.clone(), entity)
        }
        EntityKind::RfDimmerColorEffect => {
            let entity = Arc::new(ColorDimmerEffect::new(ctx));
            (entity.clone(), entity)
        }
        EntityKind::RfDimmerColorTemp => {
            let entity = Arc::new(ColorTempDimmer::new(ctx));
            (entity.clone(), entity)
        }
        EntityKind::IpFixedColorLight | EntityKind::IpSimpleFixedColorLight => {
            let entity = Arc::new(FixedColorLight::new(ctx));
            (entity.clone(), entity)
        }
        EntityKind::IpLock => {
            let entity = Arc::new(IpLock::new(ctx));
            (entity.clone(), entity)
        }
        EntityKind::RfLock => {
            let entity = Arc::new(RfLock::new(ctx));
            (entity.clone(), entity)
        }
    }
}
