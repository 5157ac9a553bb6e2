//! Live channel parameters.
//!
//! A `BoundParameter` is the per-(channel, parameter) object the
//! composition layer binds its semantic fields to. It owns a cached
//! value fed by the event path and knows how to send new values
//! through the backend sink, either directly or via a collector.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collector::CallParameterCollector;
use crate::error::DeviceResult;
use crate::flags::{FLAG_VISIBLE, OPERATION_EVENT, OPERATION_READ, OPERATION_WRITE};
use crate::sink::{ParameterSink, ParamsetKey};
use crate::value::{ParamType, ParamValue};

/// Static description of a channel parameter as reported by the
/// backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescription {
    pub name: String,
    pub param_type: ParamType,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: Option<String>,
    /// Enum parameters map integer values into this list.
    pub value_list: Option<Vec<String>>,
    pub operations: u32,
    pub flags: u32,
}

impl ParameterDescription {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            min: None,
            max: None,
            unit: None,
            value_list: None,
            operations: OPERATION_READ | OPERATION_WRITE | OPERATION_EVENT,
            flags: FLAG_VISIBLE,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_value_list(mut self, values: &[&str]) -> Self {
        self.value_list = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_operations(mut self, operations: u32) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}

/// A live (channel, parameter) binding with a cached value.
pub struct BoundParameter {
    device_address: String,
    channel_no: u32,
    description: ParameterDescription,
    sink: Arc<dyn ParameterSink>,
    value: RwLock<Option<ParamValue>>,
}

impl BoundParameter {
    pub fn new(
        device_address: impl Into<String>,
        channel_no: u32,
        description: ParameterDescription,
        sink: Arc<dyn ParameterSink>,
    ) -> Self {
        Self {
            device_address: device_address.into(),
            channel_no,
            description,
            sink,
            value: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    pub fn param_type(&self) -> ParamType {
        self.description.param_type
    }

    pub fn description(&self) -> &ParameterDescription {
        &self.description
    }

    pub fn channel_no(&self) -> u32 {
        self.channel_no
    }

    pub fn channel_address(&self) -> String {
        format!("{}:{}", self.device_address, self.channel_no)
    }

    /// Current cached value. Enum parameters resolve their integer
    /// value into the declared value list.
    pub fn value(&self) -> Option<ParamValue> {
        let raw = self.value.read().ok()?.clone()?;
        if self.description.param_type == ParamType::Enum {
            if let (Some(list), Some(idx)) = (&self.description.value_list, raw.as_i64()) {
                return list
                    .get(idx as usize)
                    .map(|entry| ParamValue::String(entry.clone()));
            }
        }
        Some(raw)
    }

    /// Event-path cache update.
    pub fn update_value(&self, value: ParamValue) {
        if let Ok(mut slot) = self.value.write() {
            *slot = Some(value);
        }
    }

    /// Send a new value to the backend. When a collector is supplied
    /// the write is queued there instead of hitting the sink, and the
    /// caller is responsible for flushing.
    ///
    /// Values that fail validation against the parameter description
    /// are dropped with a warning, mirroring the backend's tolerance
    /// for optional features.
    pub async fn send_value(
        &self,
        value: ParamValue,
        collector: Option<&mut CallParameterCollector>,
    ) -> DeviceResult<()> {
        let Some(value) = self.prepare_value(value) else {
            return Ok(());
        };
        match collector {
            Some(collector) => {
                collector.add(&self.channel_address(), &self.description.name, value);
                Ok(())
            }
            None => {
                self.sink
                    .set(
                        &self.channel_address(),
                        ParamsetKey::Values,
                        &self.description.name,
                        value,
                    )
                    .await
            }
        }
    }

    fn prepare_value(&self, value: ParamValue) -> Option<ParamValue> {
        match self.description.param_type {
            ParamType::Float | ParamType::Integer => {
                if let (Some(min), Some(max), Some(v)) =
                    (self.description.min, self.description.max, value.as_f64())
                {
                    if v < min || v > max {
                        warn!(
                            parameter = %self.description.name,
                            value = v,
                            min,
                            max,
                            "Rejecting out-of-range value"
                        );
                        return None;
                    }
                }
                Some(value)
            }
            ParamType::Enum => self.prepare_enum_value(value),
            _ => Some(value),
        }
    }

    fn prepare_enum_value(&self, value: ParamValue) -> Option<ParamValue> {
        let Some(list) = &self.description.value_list else {
            return Some(value);
        };
        match value {
            // Raw index writes are accepted alongside names.
            ParamValue::Integer(idx) => {
                if idx >= 0 && (idx as usize) < list.len() {
                    Some(ParamValue::Integer(idx))
                } else {
                    warn!(
                        parameter = %self.description.name,
                        index = idx,
                        "Enum index outside value list"
                    );
                    None
                }
            }
            ParamValue::String(name) => match list.iter().position(|entry| *entry == name) {
                Some(idx) => Some(ParamValue::Integer(idx as i64)),
                None => {
                    warn!(
                        parameter = %self.description.name,
                        value = %name,
                        "Value not in value list"
                    );
                    None
                }
            },
            other => {
                warn!(
                    parameter = %self.description.name,
                    value_type = other.type_name(),
                    "Unsupported value type for enum parameter"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for BoundParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundParameter")
            .field("channel_address", &self.channel_address())
            .field("parameter", &self.description.name)
            .field("param_type", &self.description.param_type)
            .finish()
    }
}
