//! Batched-write collector.
//!
//! Command methods that touch several parameters of one channel can
//! collect their writes and flush them as a single backend call
//! instead of N individual calls. Order is preserved, which matters
//! for parameters that must be written in sequence (a duration unit
//! before its value).

use std::collections::HashMap;

use crate::error::DeviceResult;
use crate::sink::{ParameterSink, ParamsetKey};
use crate::value::ParamValue;

/// Accumulates parameter writes issued within one logical command.
#[derive(Debug, Default)]
pub struct CallParameterCollector {
    entries: Vec<(String, String, ParamValue)>,
}

impl CallParameterCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one write. `channel_address` is the full
    /// `"{device}:{channel}"` address.
    pub fn add(&mut self, channel_address: &str, parameter: &str, value: ParamValue) {
        self.entries
            .push((channel_address.to_string(), parameter.to_string(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Send everything collected so far. Channels that collected a
    /// single value go out as a plain `set`, channels with more than
    /// one value as one batched `put_paramset` preserving insertion
    /// order.
    pub async fn flush(self, sink: &dyn ParameterSink) -> DeviceResult<()> {
        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Vec<(String, ParamValue)>> = HashMap::new();
        for (channel_address, parameter, value) in self.entries {
            if !grouped.contains_key(&channel_address) {
                order.push(channel_address.clone());
            }
            grouped
                .entry(channel_address)
                .or_default()
                .push((parameter, value));
        }

        for channel_address in order {
            let mut values = grouped.remove(&channel_address).unwrap_or_default();
            if values.len() == 1 {
                let (parameter, value) = values.remove(0);
                sink.set(&channel_address, ParamsetKey::Values, &parameter, value)
                    .await?;
            } else {
                sink.put_paramset(&channel_address, ParamsetKey::Values, values)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Set(String, String, ParamValue),
        Put(String, Vec<(String, ParamValue)>),
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<Call>>,
    }

    #[async_trait]
    impl ParameterSink for RecordingSink {
        async fn get(
            &self,
            _channel_address: &str,
            _paramset: ParamsetKey,
            parameter: &str,
        ) -> DeviceResult<ParamValue> {
            Err(crate::error::DeviceError::ParameterNotFound(
                parameter.to_string(),
            ))
        }

        async fn set(
            &self,
            channel_address: &str,
            _paramset: ParamsetKey,
            parameter: &str,
            value: ParamValue,
        ) -> DeviceResult<()> {
            self.calls.lock().unwrap().push(Call::Set(
                channel_address.to_string(),
                parameter.to_string(),
                value,
            ));
            Ok(())
        }

        async fn put_paramset(
            &self,
            channel_address: &str,
            _paramset: ParamsetKey,
            values: Vec<(String, ParamValue)>,
        ) -> DeviceResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Put(channel_address.to_string(), values));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_single_write_uses_set() {
        let sink = RecordingSink::default();
        let mut collector = CallParameterCollector::new();
        collector.add("ABC123:1", "LEVEL", ParamValue::Float(0.5));
        collector.flush(&sink).await.unwrap();

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            Call::Set(
                "ABC123:1".to_string(),
                "LEVEL".to_string(),
                ParamValue::Float(0.5)
            )
        );
    }

    #[tokio::test]
    async fn test_multiple_writes_batch_in_order() {
        let sink = RecordingSink::default();
        let mut collector = CallParameterCollector::new();
        collector.add("ABC123:1", "DURATION_UNIT", ParamValue::Integer(1));
        collector.add("ABC123:1", "DURATION_VALUE", ParamValue::Float(272.4));
        collector.add("ABC123:0", "LEVEL", ParamValue::Float(1.0));
        collector.flush(&sink).await.unwrap();

        let calls = sink.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Call::Put(address, values) => {
                assert_eq!(address, "ABC123:1");
                assert_eq!(values[0].0, "DURATION_UNIT");
                assert_eq!(values[1].0, "DURATION_VALUE");
            }
            other => panic!("expected batched write, got {other:?}"),
        }
        assert!(matches!(&calls[1], Call::Set(address, _, _) if address == "ABC123:0"));
    }
}
