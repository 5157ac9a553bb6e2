//! Light behavior family.
//!
//! Five behavior types built on the same bound-field substrate: the
//! plain dimmer, the color-code dimmer (with and without effect
//! programs), the color-temperature dimmer and the fixed 8-color
//! light. All domain encodings (color code, mireds, duration units,
//! color quantization) live here as pure functions.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use hausbus_core::{
    BoundParameter, CallParameterCollector, DeviceResult, ParamType, ParamValue,
};

use crate::entity::{impl_composite_entity, CompositeEntity, EntityContext};
use crate::field::Field;

pub const MAX_MIREDS: u32 = 500;
pub const MIN_MIREDS: u32 = 153;

const DIMMER_OFF: f64 = 0.0;

pub const TIME_UNIT_SECONDS: i64 = 0;
pub const TIME_UNIT_MINUTES: i64 = 1;
pub const TIME_UNIT_HOURS: i64 = 2;

/// Largest raw duration value the backend accepts before the unit has
/// to be escalated.
const MAX_DURATION_VALUE: f64 = 16343.0;

pub const EFFECT_OFF: &str = "Off";

const EFFECT_LIST: [&str; 7] = [
    EFFECT_OFF,
    "Slow color change",
    "Medium color change",
    "Fast color change",
    "Campfire",
    "Waterfall",
    "TV simulation",
];

/// Named colors of the fixed-color light and their hue/saturation.
const FIXED_COLORS: [(&str, (f64, f64)); 7] = [
    ("WHITE", (0.0, 0.0)),
    ("RED", (0.0, 100.0)),
    ("YELLOW", (60.0, 100.0)),
    ("GREEN", (120.0, 100.0)),
    ("TURQUOISE", (180.0, 100.0)),
    ("BLUE", (240.0, 100.0)),
    ("PURPLE", (300.0, 100.0)),
];

/// Optional arguments of a turn-on/turn-off command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightCommandArgs {
    /// Transition time in seconds.
    pub ramp_time: Option<f64>,
    /// Automatic off timer in seconds.
    pub on_time: Option<f64>,
    /// Target brightness 0..255.
    pub brightness: Option<u8>,
    /// Hue (0..360) and saturation (0..100).
    pub hs_color: Option<(f64, f64)>,
    /// Color temperature in mireds.
    pub color_temp: Option<u32>,
    /// Effect name from the kind's effect list.
    pub effect: Option<String>,
}

impl LightCommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ramp_time(mut self, seconds: f64) -> Self {
        self.ramp_time = Some(seconds);
        self
    }

    pub fn with_on_time(mut self, seconds: f64) -> Self {
        self.on_time = Some(seconds);
        self
    }

    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_hs_color(mut self, hue: f64, saturation: f64) -> Self {
        self.hs_color = Some((hue, saturation));
        self
    }

    pub fn with_color_temp(mut self, mireds: u32) -> Self {
        self.color_temp = Some(mireds);
        self
    }

    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        self.effect = Some(effect.into());
        self
    }
}

/// Read and command interface shared by every light kind.
#[async_trait]
pub trait Light: CompositeEntity {
    fn is_on(&self) -> Option<bool>;
    /// Brightness 0..255.
    fn brightness(&self) -> Option<u8>;
    fn channel_brightness(&self) -> Option<u8> {
        None
    }
    fn color_temp(&self) -> Option<u32> {
        None
    }
    fn hs_color(&self) -> Option<(f64, f64)> {
        None
    }
    fn effect(&self) -> Option<String> {
        None
    }
    fn effect_list(&self) -> Option<Vec<String>> {
        None
    }
    fn supports_brightness(&self) -> bool;
    fn supports_transition(&self) -> bool;
    fn supports_color_temperature(&self) -> bool {
        false
    }
    fn supports_hs_color(&self) -> bool {
        false
    }
    fn supports_effects(&self) -> bool {
        false
    }
    async fn turn_on(&self, args: &LightCommandArgs) -> DeviceResult<()>;
    async fn turn_off(&self, args: &LightCommandArgs) -> DeviceResult<()>;
}

// --- Pure encodings ---------------------------------------------------

/// Decode the backend's integer color code into hue/saturation.
/// Codes >= 200 all read as white; anything else is a fully saturated
/// hue proportional to the code.
pub fn hs_from_color_code(code: i64) -> (f64, f64) {
    if code >= 200 {
        return (0.0, 0.0);
    }
    (code as f64 / 200.0 * 360.0, 100.0)
}

/// Encode hue/saturation into the backend's integer color code.
/// Near-white saturation collapses to the white code 200.
pub fn color_code_from_hs(hue: f64, saturation: f64) -> i64 {
    if saturation / 100.0 < 0.1 {
        return 200;
    }
    ((hue / 360.0).clamp(0.0, 1.0) * 199.0).round() as i64
}

/// Color temperature in mireds for a level fraction in [0, 1].
pub fn mireds_from_level(level: f64) -> u32 {
    (MAX_MIREDS as f64 - (MAX_MIREDS - MIN_MIREDS) as f64 * level).round() as u32
}

/// Level fraction for a color temperature in mireds.
pub fn level_from_mireds(mireds: u32) -> f64 {
    (MAX_MIREDS as f64 - mireds as f64) / (MAX_MIREDS - MIN_MIREDS) as f64
}

/// Encode a duration in seconds into the backend's dual-unit form,
/// escalating seconds to minutes to hours whenever the raw value
/// exceeds what the value field can carry.
pub fn encode_duration(seconds: f64) -> (f64, i64) {
    let mut value = seconds;
    let mut unit = TIME_UNIT_SECONDS;
    if value > MAX_DURATION_VALUE {
        value /= 60.0;
        unit = TIME_UNIT_MINUTES;
    }
    if value > MAX_DURATION_VALUE {
        value /= 60.0;
        unit = TIME_UNIT_HOURS;
    }
    (value, unit)
}

/// Hue/saturation of a named fixed color. Unknown names read as
/// white.
pub fn hs_from_color_name(name: &str) -> (f64, f64) {
    FIXED_COLORS
        .iter()
        .find(|(color, _)| *color == name)
        .map(|(_, hs)| *hs)
        .unwrap_or((0.0, 0.0))
}

/// Quantize an arbitrary hue/saturation into the device's reduced
/// color set: anything near white stays white, everything else falls
/// into one of six 60-degree hue bands wrapping back to red.
pub fn fixed_color_from_hs(hue: f64, saturation: f64) -> &'static str {
    let hue = hue as i64;
    let saturation = saturation as i64;
    if saturation < 5 {
        return "WHITE";
    }
    if hue > 30 && hue <= 90 {
        "YELLOW"
    } else if hue > 90 && hue <= 150 {
        "GREEN"
    } else if hue > 150 && hue <= 210 {
        "TURQUOISE"
    } else if hue > 210 && hue <= 270 {
        "BLUE"
    } else if hue > 270 && hue <= 330 {
        "PURPLE"
    } else {
        "RED"
    }
}

// --- Shared dimmer substrate ------------------------------------------

/// Field handles common to every light kind.
struct DimmerFields {
    level: Option<Arc<BoundParameter>>,
    channel_level: Option<Arc<BoundParameter>>,
    on_time_value: Option<Arc<BoundParameter>>,
    ramp_time_value: Option<Arc<BoundParameter>>,
}

impl DimmerFields {
    fn resolve(ctx: &EntityContext) -> Self {
        Self {
            level: ctx.binding(Field::Level, ParamType::Float),
            channel_level: ctx.binding(Field::ChannelLevel, ParamType::Float),
            on_time_value: ctx.binding(Field::OnTimeValue, ParamType::Float),
            ramp_time_value: ctx.binding(Field::RampTimeValue, ParamType::Float),
        }
    }

    fn level_value(&self) -> Option<f64> {
        self.level.as_ref()?.value()?.as_f64()
    }

    fn is_on(&self) -> Option<bool> {
        self.level.as_ref()?;
        Some(self.level_value().unwrap_or(DIMMER_OFF) > DIMMER_OFF)
    }

    fn brightness(&self) -> Option<u8> {
        self.level.as_ref()?;
        Some((self.level_value().unwrap_or(0.0) * 255.0).round() as u8)
    }

    fn channel_brightness(&self) -> Option<u8> {
        let value = self.channel_level.as_ref()?.value()?.as_f64()?;
        Some((value * 255.0).round() as u8)
    }

    async fn set_on_time(
        &self,
        seconds: f64,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        if let Some(on_time) = &self.on_time_value {
            on_time
                .send_value(ParamValue::Float(seconds), Some(collector))
                .await?;
        }
        Ok(())
    }

    async fn set_ramp_time(
        &self,
        seconds: f64,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        if let Some(ramp_time) = &self.ramp_time_value {
            ramp_time
                .send_value(ParamValue::Float(seconds), Some(collector))
                .await?;
        }
        Ok(())
    }

    /// Final step of every turn-on: write the target level unless the
    /// call carried no brightness-affecting argument and the target
    /// already matches the current brightness.
    async fn write_brightness(
        &self,
        args: &LightCommandArgs,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        let Some(level) = &self.level else {
            return Ok(());
        };
        let current = self.brightness();
        let target = args.brightness.unwrap_or(match current {
            Some(brightness) if brightness > 0 => brightness,
            _ => 255,
        });
        if args.brightness.is_none() && Some(target) == current {
            return Ok(());
        }
        level
            .send_value(ParamValue::Float(target as f64 / 255.0), Some(collector))
            .await
    }

    async fn write_off(
        &self,
        args: &LightCommandArgs,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        if let Some(ramp_time) = args.ramp_time {
            self.set_ramp_time(ramp_time, collector).await?;
        }
        if let Some(level) = &self.level {
            level
                .send_value(ParamValue::Float(DIMMER_OFF), Some(collector))
                .await?;
        }
        Ok(())
    }

    async fn flush(
        &self,
        ctx: &EntityContext,
        collector: CallParameterCollector,
    ) -> DeviceResult<()> {
        collector.flush(ctx.device().sink().as_ref()).await
    }
}

// --- Dimmer -----------------------------------------------------------

/// Plain dimmer: level, optional on-time and ramp-time.
pub struct Dimmer {
    ctx: EntityContext,
    fields: DimmerFields,
}

impl Dimmer {
    pub(crate) fn new(ctx: EntityContext) -> Self {
        let fields = DimmerFields::resolve(&ctx);
        Self { ctx, fields }
    }

    pub async fn turn_on_collected(
        &self,
        args: &LightCommandArgs,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        if let Some(ramp_time) = args.ramp_time {
            self.fields.set_ramp_time(ramp_time, collector).await?;
        }
        if let Some(on_time) = args.on_time {
            self.fields.set_on_time(on_time, collector).await?;
        }
        self.fields.write_brightness(args, collector).await
    }

    pub async fn turn_off_collected(
        &self,
        args: &LightCommandArgs,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        self.fields.write_off(args, collector).await
    }
}

impl_composite_entity!(Dimmer);

#[async_trait]
impl Light for Dimmer {
    fn is_on(&self) -> Option<bool> {
        self.fields.is_on()
    }

    fn brightness(&self) -> Option<u8> {
        self.fields.brightness()
    }

    fn channel_brightness(&self) -> Option<u8> {
        self.fields.channel_brightness()
    }

    fn supports_brightness(&self) -> bool {
        self.fields.level.is_some()
    }

    fn supports_transition(&self) -> bool {
        self.fields.ramp_time_value.is_some()
    }

    async fn turn_on(&self, args: &LightCommandArgs) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        self.turn_on_collected(args, &mut collector).await?;
        self.fields.flush(&self.ctx, collector).await
    }

    async fn turn_off(&self, args: &LightCommandArgs) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        self.turn_off_collected(args, &mut collector).await?;
        self.fields.flush(&self.ctx, collector).await
    }
}

// --- Color dimmer -----------------------------------------------------

/// Dimmer with an integer color-code channel.
pub struct ColorDimmer {
    ctx: EntityContext,
    fields: DimmerFields,
    color: Option<Arc<BoundParameter>>,
}

impl ColorDimmer {
    pub(crate) fn new(ctx: EntityContext) -> Self {
        let fields = DimmerFields::resolve(&ctx);
        let color = ctx.binding(Field::Color, ParamType::Integer);
        Self { ctx, fields, color }
    }

    async fn write_color(
        &self,
        args: &LightCommandArgs,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        if let (Some((hue, saturation)), Some(color)) = (args.hs_color, &self.color) {
            let code = color_code_from_hs(hue, saturation);
            color
                .send_value(ParamValue::Integer(code), Some(collector))
                .await?;
        }
        Ok(())
    }

    pub async fn turn_on_collected(
        &self,
        args: &LightCommandArgs,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        if let Some(ramp_time) = args.ramp_time {
            self.fields.set_ramp_time(ramp_time, collector).await?;
        }
        if let Some(on_time) = args.on_time {
            self.fields.set_on_time(on_time, collector).await?;
        }
        self.write_color(args, collector).await?;
        self.fields.write_brightness(args, collector).await
    }
}

impl_composite_entity!(ColorDimmer);

#[async_trait]
impl Light for ColorDimmer {
    fn is_on(&self) -> Option<bool> {
        self.fields.is_on()
    }

    fn brightness(&self) -> Option<u8> {
        self.fields.brightness()
    }

    fn channel_brightness(&self) -> Option<u8> {
        self.fields.channel_brightness()
    }

    fn hs_color(&self) -> Option<(f64, f64)> {
        let code = self.color.as_ref()?.value()?.as_i64()?;
        Some(hs_from_color_code(code))
    }

    fn supports_brightness(&self) -> bool {
        self.fields.level.is_some()
    }

    fn supports_transition(&self) -> bool {
        self.fields.ramp_time_value.is_some()
    }

    fn supports_hs_color(&self) -> bool {
        true
    }

    async fn turn_on(&self, args: &LightCommandArgs) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        self.turn_on_collected(args, &mut collector).await?;
        self.fields.flush(&self.ctx, collector).await
    }

    async fn turn_off(&self, args: &LightCommandArgs) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        self.fields.write_off(args, &mut collector).await?;
        self.fields.flush(&self.ctx, collector).await
    }
}

// --- Color dimmer with effects ----------------------------------------

/// Color dimmer with a fixed effect-program list.
pub struct ColorDimmerEffect {
    ctx: EntityContext,
    fields: DimmerFields,
    color: Option<Arc<BoundParameter>>,
    effect: Option<Arc<BoundParameter>>,
}

impl ColorDimmerEffect {
    pub(crate) fn new(ctx: EntityContext) -> Self {
        let fields = DimmerFields::resolve(&ctx);
        let color = ctx.binding(Field::Color, ParamType::Integer);
        let effect = ctx.binding(Field::Program, ParamType::Integer);
        Self {
            ctx,
            fields,
            color,
            effect,
        }
    }

    fn current_effect(&self) -> Option<String> {
        let index = self.effect.as_ref()?.value()?.as_i64()?;
        // Raw backend values beyond the table read as unsupported.
        usize::try_from(index)
            .ok()
            .and_then(|index| EFFECT_LIST.get(index))
            .map(|name| name.to_string())
    }

    pub async fn turn_on_collected(
        &self,
        args: &LightCommandArgs,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        if let Some(ramp_time) = args.ramp_time {
            self.fields.set_ramp_time(ramp_time, collector).await?;
        }
        if let Some(on_time) = args.on_time {
            self.fields.set_on_time(on_time, collector).await?;
        }

        if let Some(effect_param) = &self.effect {
            // A new color cancels a running effect unless the call
            // sets one itself.
            if args.hs_color.is_some()
                && args.effect.is_none()
                && self.current_effect().as_deref() != Some(EFFECT_OFF)
            {
                effect_param
                    .send_value(ParamValue::Integer(0), Some(collector))
                    .await?;
            }
            if let Some(effect) = &args.effect {
                match EFFECT_LIST.iter().position(|name| name == effect) {
                    Some(index) => {
                        effect_param
                            .send_value(ParamValue::Integer(index as i64), Some(collector))
                            .await?;
                    }
                    None => {
                        warn!(unique_id = %self.ctx.unique_id(), effect, "Unknown effect name");
                    }
                }
            }
        }

        if let (Some((hue, saturation)), Some(color)) = (args.hs_color, &self.color) {
            color
                .send_value(
                    ParamValue::Integer(color_code_from_hs(hue, saturation)),
                    Some(collector),
                )
                .await?;
        }
        self.fields.write_brightness(args, collector).await
    }
}

impl_composite_entity!(ColorDimmerEffect);

#[async_trait]
impl Light for ColorDimmerEffect {
    fn is_on(&self) -> Option<bool> {
        self.fields.is_on()
    }

    fn brightness(&self) -> Option<u8> {
        self.fields.brightness()
    }

    fn channel_brightness(&self) -> Option<u8> {
        self.fields.channel_brightness()
    }

    fn hs_color(&self) -> Option<(f64, f64)> {
        let code = self.color.as_ref()?.value()?.as_i64()?;
        Some(hs_from_color_code(code))
    }

    fn effect(&self) -> Option<String> {
        self.current_effect()
    }

    fn effect_list(&self) -> Option<Vec<String>> {
        Some(EFFECT_LIST.iter().map(|name| name.to_string()).collect())
    }

    fn supports_brightness(&self) -> bool {
        self.fields.level.is_some()
    }

    fn supports_transition(&self) -> bool {
        self.fields.ramp_time_value.is_some()
    }

    fn supports_hs_color(&self) -> bool {
        true
    }

    fn supports_effects(&self) -> bool {
        true
    }

    async fn turn_on(&self, args: &LightCommandArgs) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        self.turn_on_collected(args, &mut collector).await?;
        self.fields.flush(&self.ctx, collector).await
    }

    async fn turn_off(&self, args: &LightCommandArgs) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        self.fields.write_off(args, &mut collector).await?;
        self.fields.flush(&self.ctx, collector).await
    }
}

// --- Color-temperature dimmer -----------------------------------------

/// Dimmer whose second channel carries the color temperature as a
/// level fraction.
pub struct ColorTempDimmer {
    ctx: EntityContext,
    fields: DimmerFields,
    color_level: Option<Arc<BoundParameter>>,
}

impl ColorTempDimmer {
    pub(crate) fn new(ctx: EntityContext) -> Self {
        let fields = DimmerFields::resolve(&ctx);
        let color_level = ctx.binding(Field::ColorLevel, ParamType::Float);
        Self {
            ctx,
            fields,
            color_level,
        }
    }

    pub async fn turn_on_collected(
        &self,
        args: &LightCommandArgs,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        if let Some(ramp_time) = args.ramp_time {
            self.fields.set_ramp_time(ramp_time, collector).await?;
        }
        if let Some(on_time) = args.on_time {
            self.fields.set_on_time(on_time, collector).await?;
        }
        if let (Some(mireds), Some(color_level)) = (args.color_temp, &self.color_level) {
            color_level
                .send_value(ParamValue::Float(level_from_mireds(mireds)), Some(collector))
                .await?;
        }
        self.fields.write_brightness(args, collector).await
    }
}

impl_composite_entity!(ColorTempDimmer);

#[async_trait]
impl Light for ColorTempDimmer {
    fn is_on(&self) -> Option<bool> {
        self.fields.is_on()
    }

    fn brightness(&self) -> Option<u8> {
        self.fields.brightness()
    }

    fn channel_brightness(&self) -> Option<u8> {
        self.fields.channel_brightness()
    }

    fn color_temp(&self) -> Option<u32> {
        let level = self.color_level.as_ref()?.value()?.as_f64()?;
        Some(mireds_from_level(level))
    }

    fn supports_brightness(&self) -> bool {
        self.fields.level.is_some()
    }

    fn supports_transition(&self) -> bool {
        self.fields.ramp_time_value.is_some()
    }

    fn supports_color_temperature(&self) -> bool {
        true
    }

    async fn turn_on(&self, args: &LightCommandArgs) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        self.turn_on_collected(args, &mut collector).await?;
        self.fields.flush(&self.ctx, collector).await
    }

    async fn turn_off(&self, args: &LightCommandArgs) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        self.fields.write_off(args, &mut collector).await?;
        self.fields.flush(&self.ctx, collector).await
    }
}

// --- Fixed-color light ------------------------------------------------

/// Light with a reduced named-color set and dual-unit timers.
pub struct FixedColorLight {
    ctx: EntityContext,
    fields: DimmerFields,
    color: Option<Arc<BoundParameter>>,
    channel_color: Option<Arc<BoundParameter>>,
    on_time_unit: Option<Arc<BoundParameter>>,
    ramp_time_unit: Option<Arc<BoundParameter>>,
}

impl FixedColorLight {
    pub(crate) fn new(ctx: EntityContext) -> Self {
        let fields = DimmerFields::resolve(&ctx);
        let color = ctx.binding(Field::Color, ParamType::Enum);
        let channel_color = ctx.binding(Field::ChannelColor, ParamType::Enum);
        let on_time_unit = ctx.binding(Field::OnTimeUnit, ParamType::Enum);
        let ramp_time_unit = ctx.binding(Field::RampTimeUnit, ParamType::Enum);
        Self {
            ctx,
            fields,
            color,
            channel_color,
            on_time_unit,
            ramp_time_unit,
        }
    }

    /// Name of the currently active color.
    pub fn color_name(&self) -> Option<String> {
        self.color
            .as_ref()?
            .value()?
            .as_str()
            .map(|name| name.to_string())
    }

    /// Name of the color mirrored on the state channel.
    pub fn channel_color_name(&self) -> Option<String> {
        self.channel_color
            .as_ref()?
            .value()?
            .as_str()
            .map(|name| name.to_string())
    }

    pub fn channel_hs_color(&self) -> Option<(f64, f64)> {
        self.channel_color_name()
            .map(|name| hs_from_color_name(&name))
    }

    /// Write a duration with unit escalation; the unit parameter must
    /// reach the backend before the value.
    async fn set_duration(
        unit_param: &Option<Arc<BoundParameter>>,
        value_param: &Option<Arc<BoundParameter>>,
        seconds: f64,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        let (value, unit) = encode_duration(seconds);
        if let Some(unit_param) = unit_param {
            unit_param
                .send_value(ParamValue::Integer(unit), Some(collector))
                .await?;
        }
        if let Some(value_param) = value_param {
            value_param
                .send_value(ParamValue::Float(value), Some(collector))
                .await?;
        }
        Ok(())
    }

    pub async fn set_on_time_collected(
        &self,
        seconds: f64,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        Self::set_duration(
            &self.on_time_unit,
            &self.fields.on_time_value,
            seconds,
            collector,
        )
        .await
    }

    pub async fn set_ramp_time_collected(
        &self,
        seconds: f64,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        Self::set_duration(
            &self.ramp_time_unit,
            &self.fields.ramp_time_value,
            seconds,
            collector,
        )
        .await
    }

    /// Set the automatic off timer, batching unit and value into one
    /// backend call.
    pub async fn set_on_time(&self, seconds: f64) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        self.set_on_time_collected(seconds, &mut collector).await?;
        self.fields.flush(&self.ctx, collector).await
    }

    pub async fn turn_on_collected(
        &self,
        args: &LightCommandArgs,
        collector: &mut CallParameterCollector,
    ) -> DeviceResult<()> {
        if let Some(ramp_time) = args.ramp_time {
            self.set_ramp_time_collected(ramp_time, collector).await?;
        }
        if let Some(on_time) = args.on_time {
            self.set_on_time_collected(on_time, collector).await?;
        }
        if let (Some((hue, saturation)), Some(color)) = (args.hs_color, &self.color) {
            let name = fixed_color_from_hs(hue, saturation);
            color
                .send_value(ParamValue::String(name.to_string()), Some(collector))
                .await?;
        }
        self.fields.write_brightness(args, collector).await
    }
}

impl_composite_entity!(FixedColorLight);

#[async_trait]
impl Light for FixedColorLight {
    fn is_on(&self) -> Option<bool> {
        self.fields.is_on()
    }

    fn brightness(&self) -> Option<u8> {
        self.fields.brightness()
    }

    fn channel_brightness(&self) -> Option<u8> {
        self.fields.channel_brightness()
    }

    fn hs_color(&self) -> Option<(f64, f64)> {
        Some(hs_from_color_name(&self.color_name()?))
    }

    fn supports_brightness(&self) -> bool {
        self.fields.level.is_some()
    }

    fn supports_transition(&self) -> bool {
        self.fields.ramp_time_value.is_some()
    }

    fn supports_hs_color(&self) -> bool {
        true
    }

    async fn turn_on(&self, args: &LightCommandArgs) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        self.turn_on_collected(args, &mut collector).await?;
        self.fields.flush(&self.ctx, collector).await
    }

    async fn turn_off(&self, args: &LightCommandArgs) -> DeviceResult<()> {
        let mut collector = CallParameterCollector::new();
        if let Some(ramp_time) = args.ramp_time {
            self.set_ramp_time_collected(ramp_time, &mut collector).await?;
        }
        if let Some(level) = &self.fields.level {
            level
                .send_value(ParamValue::Float(DIMMER_OFF), Some(&mut collector))
                .await?;
        }
        self.fields.flush(&self.ctx, collector).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_code_decoding() {
        assert_eq!(hs_from_color_code(0), (0.0, 100.0));
        assert_eq!(hs_from_color_code(100), (180.0, 100.0));
        // 200 is white; larger values are undefined but read as white
        // for robustness.
        assert_eq!(hs_from_color_code(200), (0.0, 0.0));
        assert_eq!(hs_from_color_code(255), (0.0, 0.0));
    }

    #[test]
    fn test_color_code_encoding() {
        assert_eq!(color_code_from_hs(0.0, 100.0), 0);
        assert_eq!(color_code_from_hs(360.0, 100.0), 199);
        // Low saturation collapses to the white code regardless of hue.
        assert_eq!(color_code_from_hs(120.0, 9.0), 200);
        // Out-of-range hue clamps.
        assert_eq!(color_code_from_hs(720.0, 100.0), 199);
    }

    #[test]
    fn test_color_code_roundtrip_red() {
        let code = color_code_from_hs(0.0, 100.0);
        let (hue, saturation) = hs_from_color_code(code);
        assert_eq!(saturation, 100.0);
        assert!(hue.abs() < 60.0);
    }

    #[test]
    fn test_mired_roundtrip() {
        for mireds in [MIN_MIREDS, 200, 300, 400, MAX_MIREDS] {
            assert_eq!(mireds_from_level(level_from_mireds(mireds)), mireds);
        }
    }

    #[test]
    fn test_mired_range_endpoints() {
        assert_eq!(mireds_from_level(0.0), MAX_MIREDS);
        assert_eq!(mireds_from_level(1.0), MIN_MIREDS);
    }

    #[test]
    fn test_duration_unit_escalation() {
        assert_eq!(encode_duration(30.0), (30.0, TIME_UNIT_SECONDS));
        assert_eq!(encode_duration(16343.0), (16343.0, TIME_UNIT_SECONDS));
        let (value, unit) = encode_duration(16344.0);
        assert_eq!(unit, TIME_UNIT_MINUTES);
        assert!((value - 272.4).abs() < 1e-9);
        let (value, unit) = encode_duration(1_000_000.0);
        assert_eq!(unit, TIME_UNIT_HOURS);
        assert!((value - 1_000_000.0 / 3600.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_color_quantization_bands() {
        assert_eq!(fixed_color_from_hs(0.0, 100.0), "RED");
        assert_eq!(fixed_color_from_hs(30.0, 100.0), "RED");
        assert_eq!(fixed_color_from_hs(31.0, 100.0), "YELLOW");
        assert_eq!(fixed_color_from_hs(90.0, 100.0), "YELLOW");
        assert_eq!(fixed_color_from_hs(120.0, 100.0), "GREEN");
        assert_eq!(fixed_color_from_hs(180.0, 100.0), "TURQUOISE");
        assert_eq!(fixed_color_from_hs(240.0, 100.0), "BLUE");
        assert_eq!(fixed_color_from_hs(300.0, 100.0), "PURPLE");
        assert_eq!(fixed_color_from_hs(331.0, 100.0), "RED");
        assert_eq!(fixed_color_from_hs(359.0, 100.0), "RED");
    }

    #[test]
    fn test_fixed_color_white_threshold() {
        assert_eq!(fixed_color_from_hs(180.0, 4.0), "WHITE");
        assert_eq!(fixed_color_from_hs(180.0, 5.0), "TURQUOISE");
    }

    #[test]
    fn test_fixed_color_name_lookup() {
        assert_eq!(hs_from_color_name("BLUE"), (240.0, 100.0));
        assert_eq!(hs_from_color_name("WHITE"), (0.0, 0.0));
        // Unknown names read as white.
        assert_eq!(hs_from_color_name("BLACK"), (0.0, 0.0));
    }
}
