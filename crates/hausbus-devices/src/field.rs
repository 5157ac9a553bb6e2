//! Semantic field vocabulary.
//!
//! Fields are the abstract names composite entities use to address
//! channel parameters. The set is closed; schemas map each field to a
//! concrete parameter name per channel.

use serde::{Deserialize, Serialize};

/// Semantic name a composite entity binds to a (channel, parameter)
/// pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ChannelColor,
    ChannelLevel,
    Color,
    ColorLevel,
    Direction,
    Error,
    Level,
    LockState,
    LockTargetLevel,
    OnTimeUnit,
    OnTimeValue,
    Open,
    Program,
    RampTimeUnit,
    RampTimeValue,
    State,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelColor => "channel_color",
            Self::ChannelLevel => "channel_level",
            Self::Color => "color",
            Self::ColorLevel => "color_level",
            Self::Direction => "direction",
            Self::Error => "error",
            Self::Level => "level",
            Self::LockState => "lock_state",
            Self::LockTargetLevel => "lock_target_level",
            Self::OnTimeUnit => "on_time_unit",
            Self::OnTimeValue => "on_time_value",
            Self::Open => "open",
            Self::Program => "program",
            Self::RampTimeUnit => "ramp_time_unit",
            Self::RampTimeValue => "ramp_time_value",
            Self::State => "state",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&Field::LockTargetLevel).unwrap(),
            "\"lock_target_level\""
        );
        assert_eq!(Field::RampTimeValue.to_string(), "ramp_time_value");
    }
}
