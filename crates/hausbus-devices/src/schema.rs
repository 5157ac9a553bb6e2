//! Declarative device-group schemas.
//!
//! Each entity kind is described by a `DeviceGroupDefinition`: the
//! channel layout of the logical device relative to a base channel,
//! and the mapping of semantic fields to raw parameter names. The
//! builtin table is validated once at load; a structurally broken
//! table is a startup failure, never a partially valid registry.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::error;

use hausbus_core::{DeviceError, DeviceResult};

use crate::field::Field;

/// Blueprint tag for a composite entity. Closed set; the factory
/// dispatches behavior types from it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    IpDimmer,
    IpFixedColorLight,
    IpSimpleFixedColorLight,
    IpLock,
    RfDimmer,
    RfDimmerColor,
    RfDimmerColorEffect,
    RfDimmerColorTemp,
    RfDimmerWithVirtChannel,
    RfLock,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::IpDimmer => "IpDimmer",
            Self::IpFixedColorLight => "IpFixedColorLight",
            Self::IpSimpleFixedColorLight => "IpSimpleFixedColorLight",
            Self::IpLock => "IpLock",
            Self::RfDimmer => "RfDimmer",
            Self::RfDimmerColor => "RfDimmerColor",
            Self::RfDimmerColorEffect => "RfDimmerColorEffect",
            Self::RfDimmerColorTemp => "RfDimmerColorTemp",
            Self::RfDimmerWithVirtChannel => "RfDimmerWithVirtChannel",
            Self::RfLock => "RfLock",
        };
        f.write_str(name)
    }
}

/// Field name → raw parameter name.
pub type FieldMap = BTreeMap<Field, String>;
/// Channel offset → field map.
pub type ChannelFieldMap = BTreeMap<u32, FieldMap>;

/// Channel layout and field mapping of one entity kind, relative to a
/// base channel of 0 until rebased.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroupSchema {
    /// Channel whose fields define the entity's primary behavior.
    pub primary_channel: u32,
    /// Additional channels producing sibling entities of the same
    /// kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_channels: Vec<u32>,
    /// Fields bound at each entity's own (home) channel.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repeatable_fields: FieldMap,
    /// Like `repeatable_fields`, but the resulting binding is
    /// user-visible diagnostic state rather than primary state.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub visible_repeatable_fields: FieldMap,
    /// Fields bound at a fixed channel offset, internal.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: ChannelFieldMap,
    /// Fields bound at a fixed channel offset, user-visible.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub visible_fields: ChannelFieldMap,
}

/// Bare single-parameter entities to create alongside a composite
/// entity, at channel offsets rebased the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalEntitiesSpec {
    pub entries: Vec<AdditionalEntityEntry>,
}

/// One group of parameters shared by one or more channel offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalEntityEntry {
    pub channels: Vec<u32>,
    pub parameters: Vec<String>,
}

impl AdditionalEntitiesSpec {
    pub fn entry(channels: &[u32], parameters: &[&str]) -> AdditionalEntityEntry {
        AdditionalEntityEntry {
            channels: channels.to_vec(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn from_entries(entries: Vec<AdditionalEntityEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All parameter names referenced by this spec.
    pub fn parameter_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|entry| entry.parameters.iter().cloned())
            .collect()
    }

    /// Union of entries from both specs.
    pub fn merged_with(&self, other: &AdditionalEntitiesSpec) -> AdditionalEntitiesSpec {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().cloned());
        Self { entries }
    }
}

/// Full per-kind definition: the device group plus optional extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroupDefinition {
    pub device_group: DeviceGroupSchema,
    #[serde(default, skip_serializing_if = "AdditionalEntitiesSpec::is_empty")]
    pub additional_entities: AdditionalEntitiesSpec,
    /// Whether the catalog-wide default entities (battery, RSSI, duty
    /// cycle, ...) are also created for this device group.
    #[serde(default = "default_true")]
    pub include_default_entities: bool,
}

fn default_true() -> bool {
    true
}

/// Validated table of device-group definitions, keyed by entity kind.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    default_entities: AdditionalEntitiesSpec,
    definitions: HashMap<EntityKind, DeviceGroupDefinition>,
}

impl SchemaRegistry {
    /// Build and validate the builtin definition table.
    pub fn builtin() -> DeviceResult<Self> {
        let registry = Self::builtin_unvalidated();
        registry.validate()?;
        Ok(registry)
    }

    pub fn new(
        default_entities: AdditionalEntitiesSpec,
        definitions: HashMap<EntityKind, DeviceGroupDefinition>,
    ) -> DeviceResult<Self> {
        let registry = Self {
            default_entities,
            definitions,
        };
        registry.validate()?;
        Ok(registry)
    }

    pub fn definition(&self, kind: EntityKind) -> Option<&DeviceGroupDefinition> {
        self.definitions.get(&kind)
    }

    pub fn group(&self, kind: EntityKind) -> Option<&DeviceGroupSchema> {
        self.definitions.get(&kind).map(|def| &def.device_group)
    }

    pub fn additional_entities(&self, kind: EntityKind) -> Option<&AdditionalEntitiesSpec> {
        self.definitions
            .get(&kind)
            .map(|def| &def.additional_entities)
            .filter(|spec| !spec.is_empty())
    }

    /// Catalog-wide default entities keyed by channel offset.
    pub fn default_entities(&self) -> &AdditionalEntitiesSpec {
        &self.default_entities
    }

    pub fn include_default_entities(&self, kind: EntityKind) -> bool {
        self.definitions
            .get(&kind)
            .map(|def| def.include_default_entities)
            .unwrap_or(true)
    }

    /// Structural validation of the whole table. Fails on the first
    /// problem found; a broken table must never be half-usable.
    pub fn validate(&self) -> DeviceResult<()> {
        for (kind, definition) in &self.definitions {
            Self::validate_group(*kind, &definition.device_group).inspect_err(|err| {
                error!(kind = %kind, %err, "Device definition table failed validation");
            })?;
        }
        for entry in &self.default_entities.entries {
            if entry.parameters.iter().any(|p| p.is_empty()) {
                return Err(DeviceError::SchemaValidation(
                    "default entities contain an empty parameter name".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn validate_group(kind: EntityKind, group: &DeviceGroupSchema) -> DeviceResult<()> {
        if group
            .secondary_channels
            .iter()
            .any(|ch| *ch == group.primary_channel)
        {
            return Err(DeviceError::SchemaValidation(format!(
                "{kind}: secondary channel duplicates the primary channel"
            )));
        }
        for map in [&group.repeatable_fields, &group.visible_repeatable_fields] {
            if map.values().any(|p| p.is_empty()) {
                return Err(DeviceError::SchemaValidation(format!(
                    "{kind}: empty parameter name in repeatable fields"
                )));
            }
        }
        // No (channel, field) pair may appear in both categories;
        // one would silently shadow the other at bind time.
        for (channel_no, field_map) in &group.fields {
            if field_map.values().any(|p| p.is_empty()) {
                return Err(DeviceError::SchemaValidation(format!(
                    "{kind}: empty parameter name on channel {channel_no}"
                )));
            }
            if let Some(visible_map) = group.visible_fields.get(channel_no) {
                for field in field_map.keys() {
                    if visible_map.contains_key(field) {
                        return Err(DeviceError::SchemaValidation(format!(
                            "{kind}: field {field} on channel {channel_no} is declared both visible and internal"
                        )));
                    }
                }
            }
        }
        for field_map in group.visible_fields.values() {
            if field_map.values().any(|p| p.is_empty()) {
                return Err(DeviceError::SchemaValidation(format!(
                    "{kind}: empty parameter name in visible fields"
                )));
            }
        }
        Ok(())
    }

    fn builtin_unvalidated() -> Self {
        let mut definitions = HashMap::new();

        definitions.insert(
            EntityKind::IpDimmer,
            DeviceGroupDefinition {
                device_group: DeviceGroupSchema {
                    primary_channel: 1,
                    secondary_channels: vec![2, 3],
                    repeatable_fields: field_map(&[
                        (Field::Level, "LEVEL"),
                        (Field::OnTimeValue, "ON_TIME"),
                        (Field::RampTimeValue, "RAMP_TIME"),
                    ]),
                    visible_fields: channel_field_map(&[(
                        0,
                        &[(Field::ChannelLevel, "LEVEL")],
                    )]),
                    ..Default::default()
                },
                ..default_definition()
            },
        );

        definitions.insert(
            EntityKind::IpFixedColorLight,
            DeviceGroupDefinition {
                device_group: DeviceGroupSchema {
                    primary_channel: 1,
                    secondary_channels: vec![2, 3],
                    repeatable_fields: fixed_color_repeatable_fields(),
                    visible_fields: channel_field_map(&[(
                        0,
                        &[
                            (Field::ChannelColor, "COLOR"),
                            (Field::ChannelLevel, "LEVEL"),
                        ],
                    )]),
                    ..Default::default()
                },
                ..default_definition()
            },
        );

        definitions.insert(
            EntityKind::IpSimpleFixedColorLight,
            DeviceGroupDefinition {
                device_group: DeviceGroupSchema {
                    primary_channel: 0,
                    repeatable_fields: fixed_color_repeatable_fields(),
                    ..Default::default()
                },
                ..default_definition()
            },
        );

        definitions.insert(
            EntityKind::IpLock,
            DeviceGroupDefinition {
                device_group: DeviceGroupSchema {
                    primary_channel: 1,
                    repeatable_fields: field_map(&[
                        (Field::Direction, "ACTIVITY_STATE"),
                        (Field::LockState, "LOCK_STATE"),
                        (Field::LockTargetLevel, "LOCK_TARGET_LEVEL"),
                    ]),
                    fields: channel_field_map(&[(0, &[(Field::Error, "ERROR_JAMMED")])]),
                    ..Default::default()
                },
                ..default_definition()
            },
        );

        definitions.insert(
            EntityKind::RfDimmer,
            DeviceGroupDefinition {
                device_group: rf_dimmer_group(),
                ..default_definition()
            },
        );

        definitions.insert(
            EntityKind::RfDimmerColor,
            DeviceGroupDefinition {
                device_group: rf_dimmer_color_group(),
                ..default_definition()
            },
        );

        // Same channel layout as RfDimmerColor; only the behavior
        // type differs (effect program support).
        definitions.insert(
            EntityKind::RfDimmerColorEffect,
            DeviceGroupDefinition {
                device_group: rf_dimmer_color_group(),
                ..default_definition()
            },
        );

        definitions.insert(
            EntityKind::RfDimmerColorTemp,
            DeviceGroupDefinition {
                device_group: DeviceGroupSchema {
                    fields: channel_field_map(&[(1, &[(Field::ColorLevel, "LEVEL")])]),
                    ..rf_dimmer_group()
                },
                ..default_definition()
            },
        );

        definitions.insert(
            EntityKind::RfDimmerWithVirtChannel,
            DeviceGroupDefinition {
                device_group: DeviceGroupSchema {
                    secondary_channels: vec![1, 2],
                    ..rf_dimmer_group()
                },
                ..default_definition()
            },
        );

        definitions.insert(
            EntityKind::RfLock,
            DeviceGroupDefinition {
                device_group: DeviceGroupSchema {
                    primary_channel: 0,
                    repeatable_fields: field_map(&[
                        (Field::Direction, "DIRECTION"),
                        (Field::Error, "ERROR"),
                        (Field::Open, "OPEN"),
                        (Field::State, "STATE"),
                    ]),
                    ..Default::default()
                },
                ..default_definition()
            },
        );

        let default_entities = AdditionalEntitiesSpec::from_entries(vec![
            AdditionalEntitiesSpec::entry(
                &[0],
                &[
                    "DUTY_CYCLE",
                    "DUTYCYCLE",
                    "LOW_BAT",
                    "LOWBAT",
                    "OPERATING_VOLTAGE",
                    "RSSI_DEVICE",
                    "RSSI_PEER",
                    "SABOTAGE",
                ],
            ),
            AdditionalEntitiesSpec::entry(&[2], &["BATTERY_STATE"]),
            AdditionalEntitiesSpec::entry(&[4], &["BATTERY_STATE"]),
        ]);

        Self {
            default_entities,
            definitions,
        }
    }
}

fn default_definition() -> DeviceGroupDefinition {
    DeviceGroupDefinition {
        device_group: DeviceGroupSchema::default(),
        additional_entities: AdditionalEntitiesSpec::default(),
        include_default_entities: true,
    }
}

fn rf_dimmer_group() -> DeviceGroupSchema {
    DeviceGroupSchema {
        primary_channel: 0,
        repeatable_fields: field_map(&[
            (Field::Level, "LEVEL"),
            (Field::OnTimeValue, "ON_TIME"),
            (Field::RampTimeValue, "RAMP_TIME"),
        ]),
        ..Default::default()
    }
}

fn rf_dimmer_color_group() -> DeviceGroupSchema {
    DeviceGroupSchema {
        fields: channel_field_map(&[
            (1, &[(Field::Color, "COLOR")]),
            (2, &[(Field::Program, "PROGRAM")]),
        ]),
        ..rf_dimmer_group()
    }
}

fn fixed_color_repeatable_fields() -> FieldMap {
    field_map(&[
        (Field::Color, "COLOR"),
        (Field::Level, "LEVEL"),
        (Field::OnTimeUnit, "DURATION_UNIT"),
        (Field::OnTimeValue, "DURATION_VALUE"),
        (Field::RampTimeUnit, "RAMP_TIME_UNIT"),
        (Field::RampTimeValue, "RAMP_TIME_VALUE"),
    ])
}

fn field_map(pairs: &[(Field, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(field, parameter)| (*field, parameter.to_string()))
        .collect()
}

fn channel_field_map(entries: &[(u32, &[(Field, &str)])]) -> ChannelFieldMap {
    entries
        .iter()
        .map(|(channel_no, pairs)| (*channel_no, field_map(pairs)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_validates() {
        let registry = SchemaRegistry::builtin().unwrap();
        let group = registry.group(EntityKind::IpDimmer).unwrap();
        assert_eq!(group.primary_channel, 1);
        assert_eq!(group.secondary_channels, vec![2, 3]);
        assert_eq!(
            group.repeatable_fields.get(&Field::Level).map(String::as_str),
            Some("LEVEL")
        );
        assert!(registry.include_default_entities(EntityKind::IpDimmer));
    }

    #[test]
    fn test_kind_without_additional_entities() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert!(registry.additional_entities(EntityKind::IpDimmer).is_none());
    }

    #[test]
    fn test_duplicate_field_across_categories_is_rejected() {
        let mut definitions = HashMap::new();
        definitions.insert(
            EntityKind::RfDimmer,
            DeviceGroupDefinition {
                device_group: DeviceGroupSchema {
                    primary_channel: 0,
                    fields: channel_field_map(&[(1, &[(Field::Color, "COLOR")])]),
                    visible_fields: channel_field_map(&[(1, &[(Field::Color, "COLOR_2")])]),
                    ..Default::default()
                },
                ..default_definition()
            },
        );
        let err = SchemaRegistry::new(AdditionalEntitiesSpec::default(), definitions).unwrap_err();
        assert!(matches!(err, DeviceError::SchemaValidation(_)));
    }

    #[test]
    fn test_secondary_channel_clash_is_rejected() {
        let mut definitions = HashMap::new();
        definitions.insert(
            EntityKind::RfDimmer,
            DeviceGroupDefinition {
                device_group: DeviceGroupSchema {
                    primary_channel: 1,
                    secondary_channels: vec![1, 2],
                    ..Default::default()
                },
                ..default_definition()
            },
        );
        assert!(SchemaRegistry::new(AdditionalEntitiesSpec::default(), definitions).is_err());
    }

    #[test]
    fn test_schema_json_roundtrip() {
        let registry = SchemaRegistry::builtin().unwrap();
        let definition = registry.definition(EntityKind::IpFixedColorLight).unwrap();
        let json = serde_json::to_string(definition).unwrap();
        let back: DeviceGroupDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, definition);
    }
}
