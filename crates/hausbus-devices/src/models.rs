//! Per-model composition catalog.
//!
//! Maps device model strings to the composition configs the factory
//! runs for them. Lookup is case-insensitive; models with regional
//! suffixes fall back to the longest catalog key that prefixes them.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use crate::factory::{CustomConfig, ExtendedConfig};
use crate::field::Field;
use crate::schema::{AdditionalEntitiesSpec, ChannelFieldMap, EntityKind};

fn rf_dimmer(channels: &[u32]) -> CustomConfig {
    CustomConfig::new(EntityKind::RfDimmer, channels)
}

fn rf_dimmer_virt(channels: &[u32]) -> CustomConfig {
    CustomConfig::new(EntityKind::RfDimmerWithVirtChannel, channels)
}

fn ip_dimmer(channels: &[u32]) -> CustomConfig {
    CustomConfig::new(EntityKind::IpDimmer, channels)
}

fn additional(entries: &[(&[u32], &[&str])]) -> ExtendedConfig {
    ExtendedConfig {
        fixed_channels: ChannelFieldMap::new(),
        additional_entities: AdditionalEntitiesSpec::from_entries(
            entries
                .iter()
                .map(|(channels, parameters)| {
                    AdditionalEntitiesSpec::entry(channels, parameters)
                })
                .collect(),
        ),
    }
}

fn fixed_color_channel(channel_no: u32) -> ExtendedConfig {
    let mut fixed = ChannelFieldMap::new();
    fixed.insert(
        channel_no,
        BTreeMap::from([(Field::Color, "COLOR".to_string())]),
    );
    ExtendedConfig {
        fixed_channels: fixed,
        additional_entities: AdditionalEntitiesSpec::default(),
    }
}

fn catalog() -> &'static HashMap<&'static str, Vec<CustomConfig>> {
    static CATALOG: OnceLock<HashMap<&'static str, Vec<CustomConfig>>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        HashMap::from([
            // Lights.
            ("263 132", vec![rf_dimmer(&[1])]),
            ("263 133", vec![rf_dimmer_virt(&[1])]),
            ("263 134", vec![rf_dimmer(&[1])]),
            (
                "HBW-LC-RGBWW-IN6-DR",
                vec![
                    rf_dimmer(&[7, 8]).with_extended(additional(&[(
                        &[1, 2, 3, 4, 5, 6],
                        &["PRESS_LONG", "PRESS_SHORT", "SENSOR"],
                    )])),
                    CustomConfig::new(EntityKind::RfDimmerColor, &[9, 10, 11])
                        .with_extended(fixed_color_channel(15)),
                    CustomConfig::new(EntityKind::RfDimmerColor, &[12, 13, 14])
                        .with_extended(fixed_color_channel(16)),
                ],
            ),
            ("HM-DW-WM", vec![rf_dimmer(&[1, 2, 3, 4])]),
            ("HM-LC-AO-SM", vec![rf_dimmer_virt(&[1])]),
            (
                "HM-LC-DW-WM",
                vec![CustomConfig::new(EntityKind::RfDimmerColorTemp, &[1, 3, 5])],
            ),
            ("HM-LC-Dim1L-CV", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1L-CV-2", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1L-Pl", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1L-Pl-2", vec![rf_dimmer(&[1])]),
            ("HM-LC-Dim1L-Pl-3", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1PWM-CV", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1PWM-CV-2", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1T-CV", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1T-CV-2", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1T-DR", vec![rf_dimmer(&[1, 2, 3])]),
            ("HM-LC-Dim1T-FM", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1T-FM-2", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1T-FM-LF", vec![rf_dimmer(&[1])]),
            ("HM-LC-Dim1T-Pl", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1T-Pl-2", vec![rf_dimmer(&[1])]),
            ("HM-LC-Dim1T-Pl-3", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1TPBU-FM", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim1TPBU-FM-2", vec![rf_dimmer_virt(&[1])]),
            ("HM-LC-Dim2L-CV", vec![rf_dimmer(&[1, 2])]),
            ("HM-LC-Dim2L-SM", vec![rf_dimmer(&[1, 2])]),
            ("HM-LC-Dim2L-SM-2", vec![rf_dimmer(&[1, 2, 3, 4, 5, 6])]),
            ("HM-LC-Dim2T-SM", vec![rf_dimmer(&[1, 2])]),
            ("HM-LC-Dim2T-SM-2", vec![rf_dimmer(&[1, 2, 3, 4, 5, 6])]),
            (
                "HM-LC-RGBW-WM",
                vec![CustomConfig::new(EntityKind::RfDimmerColorEffect, &[1])],
            ),
            ("HMW-LC-Dim1L-DR", vec![rf_dimmer(&[3])]),
            ("HSS-DX", vec![rf_dimmer(&[1])]),
            ("HmIP-BDT", vec![ip_dimmer(&[3])]),
            (
                "HmIP-BSL",
                vec![CustomConfig::new(EntityKind::IpFixedColorLight, &[7, 11])],
            ),
            (
                "HmIP-DRDI3",
                vec![ip_dimmer(&[4, 8, 12])
                    .with_extended(additional(&[(&[0], &["ACTUAL_TEMPERATURE"])]))],
            ),
            ("HmIP-FDT", vec![ip_dimmer(&[1])]),
            ("HmIP-PDT", vec![ip_dimmer(&[2])]),
            (
                "HmIP-SCTH230",
                vec![ip_dimmer(&[11]).with_extended(additional(&[
                    (&[1], &["CONCENTRATION"]),
                    (&[4], &["HUMIDITY", "ACTUAL_TEMPERATURE"]),
                ]))],
            ),
            (
                "HmIPW-DRD3",
                vec![ip_dimmer(&[1, 5, 9])
                    .with_extended(additional(&[(&[0], &["ACTUAL_TEMPERATURE"])]))],
            ),
            (
                "HmIPW-WRC6",
                vec![CustomConfig::new(
                    EntityKind::IpSimpleFixedColorLight,
                    &[7, 8, 9, 10, 11, 12],
                )],
            ),
            ("OLIGO.smart.iq.HM", vec![rf_dimmer(&[1, 2, 3, 4, 5, 6])]),
            // Locks.
            (
                "HM-Sec-Key",
                vec![CustomConfig::new(EntityKind::RfLock, &[1])
                    .with_extended(additional(&[(&[1], &["DIRECTION", "ERROR"])]))],
            ),
            (
                "HmIP-DLD",
                vec![CustomConfig::new(EntityKind::IpLock, &[0])
                    .with_extended(additional(&[(&[0], &["ERROR_JAMMED"])]))],
            ),
        ])
    })
}

/// Composition configs for a model, if the catalog knows it.
pub fn custom_configs_for_model(model: &str) -> Option<&'static [CustomConfig]> {
    let model_lower = model.to_lowercase();
    let catalog = catalog();
    if let Some(configs) = catalog
        .iter()
        .find(|(key, _)| key.to_lowercase() == model_lower)
        .map(|(_, configs)| configs.as_slice())
    {
        return Some(configs);
    }
    // Longest prefix wins so "HM-LC-Dim1T-Pl-2" never resolves
    // through "HM-LC-Dim1T-Pl".
    catalog
        .iter()
        .filter(|(key, _)| model_lower.starts_with(&key.to_lowercase()))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, configs)| configs.as_slice())
}

pub fn is_custom_model(model: &str) -> bool {
    custom_configs_for_model(model).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(is_custom_model("hmip-bdt"));
        assert!(is_custom_model("HMIP-BDT"));
        assert!(!is_custom_model("HmIP-Unknown"));
    }

    #[test]
    fn test_exact_match_beats_prefix() {
        let configs = custom_configs_for_model("HM-LC-Dim1T-Pl-2").unwrap();
        assert_eq!(configs[0].kind, EntityKind::RfDimmer);
        let configs = custom_configs_for_model("HM-LC-Dim1T-Pl").unwrap();
        assert_eq!(configs[0].kind, EntityKind::RfDimmerWithVirtChannel);
    }

    #[test]
    fn test_suffixed_model_resolves_through_prefix() {
        let configs = custom_configs_for_model("HmIP-BDT-2").unwrap();
        assert_eq!(configs[0].kind, EntityKind::IpDimmer);
        assert_eq!(configs[0].channels, vec![3]);
    }

    #[test]
    fn test_multi_config_model() {
        let configs = custom_configs_for_model("HBW-LC-RGBWW-IN6-DR").unwrap();
        assert_eq!(configs.len(), 3);
        assert_eq!(configs[0].kind, EntityKind::RfDimmer);
        assert_eq!(configs[1].kind, EntityKind::RfDimmerColor);
        let extended = configs[1].extended.as_ref().unwrap();
        assert_eq!(extended.required_parameters(), vec!["COLOR"]);
    }

    #[test]
    fn test_lock_models() {
        assert_eq!(
            custom_configs_for_model("HM-Sec-Key").unwrap()[0].kind,
            EntityKind::RfLock
        );
        assert_eq!(
            custom_configs_for_model("HmIP-DLD").unwrap()[0].kind,
            EntityKind::IpLock
        );
    }
}
