//! Channel rebasing.
//!
//! One device-group schema is shared by every device model of a
//! family; a concrete device places the group at some base channel.
//! Rebasing shifts every channel reference in the schema by that base
//! so the same blueprint can be instantiated at different offsets.

use crate::schema::{AdditionalEntitiesSpec, ChannelFieldMap, DeviceGroupSchema};

/// Shift every channel reference in `group` by `base_channel`.
///
/// Repeatable field maps carry no channel keys; they follow the
/// entity's home channel and are untouched here.
pub fn rebase_group(group: &DeviceGroupSchema, base_channel: u32) -> DeviceGroupSchema {
    if base_channel == 0 {
        return group.clone();
    }
    DeviceGroupSchema {
        primary_channel: group.primary_channel + base_channel,
        secondary_channels: group
            .secondary_channels
            .iter()
            .map(|ch| ch + base_channel)
            .collect(),
        repeatable_fields: group.repeatable_fields.clone(),
        visible_repeatable_fields: group.visible_repeatable_fields.clone(),
        fields: rebase_channel_fields(&group.fields, base_channel),
        visible_fields: rebase_channel_fields(&group.visible_fields, base_channel),
    }
}

/// Shift the channel keys of an additional-entities spec, including
/// every element of multi-channel entries.
pub fn rebase_additional(
    spec: &AdditionalEntitiesSpec,
    base_channel: u32,
) -> AdditionalEntitiesSpec {
    if base_channel == 0 {
        return spec.clone();
    }
    AdditionalEntitiesSpec {
        entries: spec
            .entries
            .iter()
            .map(|entry| crate::schema::AdditionalEntityEntry {
                channels: entry.channels.iter().map(|ch| ch + base_channel).collect(),
                parameters: entry.parameters.clone(),
            })
            .collect(),
    }
}

fn rebase_channel_fields(fields: &ChannelFieldMap, base_channel: u32) -> ChannelFieldMap {
    fields
        .iter()
        .map(|(channel_no, field_map)| (channel_no + base_channel, field_map.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::schema::{EntityKind, SchemaRegistry};

    fn ip_dimmer_group() -> DeviceGroupSchema {
        SchemaRegistry::builtin()
            .unwrap()
            .group(EntityKind::IpDimmer)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_rebase_zero_is_identity() {
        let group = ip_dimmer_group();
        assert_eq!(rebase_group(&group, 0), group);
    }

    #[test]
    fn test_rebase_shifts_all_channel_references() {
        let group = ip_dimmer_group();
        let rebased = rebase_group(&group, 3);

        assert_eq!(rebased.primary_channel, group.primary_channel + 3);
        assert_eq!(rebased.secondary_channels, vec![5, 6]);
        for key in group.visible_fields.keys() {
            let shifted = rebased.visible_fields.get(&(key + 3)).unwrap();
            assert_eq!(shifted, group.visible_fields.get(key).unwrap());
        }
        // Repeatable maps are keyed by field, not channel; identical
        // after rebasing.
        assert_eq!(rebased.repeatable_fields, group.repeatable_fields);
    }

    #[test]
    fn test_rebase_empty_group_stays_empty() {
        let rebased = rebase_group(&DeviceGroupSchema::default(), 7);
        assert_eq!(rebased.primary_channel, 7);
        assert!(rebased.fields.is_empty());
        assert!(rebased.repeatable_fields.is_empty());
    }

    #[test]
    fn test_rebase_additional_shifts_every_tuple_element() {
        let spec = AdditionalEntitiesSpec::from_entries(vec![
            AdditionalEntitiesSpec::entry(&[1, 2, 3], &["PRESS_SHORT"]),
            AdditionalEntitiesSpec::entry(&[0], &["ACTUAL_TEMPERATURE"]),
        ]);
        let rebased = rebase_additional(&spec, 4);
        assert_eq!(rebased.entries[0].channels, vec![5, 6, 7]);
        assert_eq!(rebased.entries[1].channels, vec![4]);
        assert_eq!(rebased.entries[0].parameters, vec!["PRESS_SHORT"]);
    }

    #[test]
    fn test_rebase_does_not_touch_field_values() {
        let group = ip_dimmer_group();
        let rebased = rebase_group(&group, 11);
        assert_eq!(
            rebased.visible_fields[&11].get(&Field::ChannelLevel).map(String::as_str),
            Some("LEVEL")
        );
    }
}
