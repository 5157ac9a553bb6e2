//! Device objects.
//!
//! A `Device` represents one physical device: its address, model,
//! the set of channels it exposes, the live parameters per channel
//! and the registry of logical entities composed on top of it. The
//! device owns its entities exclusively; entities hold non-owning
//! references back.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dashmap::DashMap;

use crate::parameter::{BoundParameter, ParameterDescription};
use crate::sink::ParameterSink;

/// Minimal interface the device registry needs from a registered
/// entity. Composite entity types implement this through their own
/// richer trait.
pub trait DeviceEntity: Send + Sync {
    fn unique_id(&self) -> &str;
}

/// One physical device with its channels, parameters and entities.
pub struct Device {
    address: String,
    model: String,
    interface_id: String,
    sink: Arc<dyn ParameterSink>,
    channels: BTreeSet<u32>,
    parameters: HashMap<(u32, String), Arc<BoundParameter>>,
    entities: DashMap<String, Arc<dyn DeviceEntity>>,
}

impl Device {
    pub fn new(
        address: impl Into<String>,
        model: impl Into<String>,
        interface_id: impl Into<String>,
        sink: Arc<dyn ParameterSink>,
    ) -> Self {
        Self {
            address: address.into(),
            model: model.into(),
            interface_id: interface_id.into(),
            sink,
            channels: BTreeSet::new(),
            parameters: HashMap::new(),
            entities: DashMap::new(),
        }
    }

    /// Declare a channel without parameters.
    pub fn with_channel(mut self, channel_no: u32) -> Self {
        self.channels.insert(channel_no);
        self
    }

    /// Declare a parameter on a channel. The channel is created
    /// implicitly.
    pub fn with_parameter(mut self, channel_no: u32, description: ParameterDescription) -> Self {
        self.channels.insert(channel_no);
        let parameter = Arc::new(BoundParameter::new(
            self.address.clone(),
            channel_no,
            description.clone(),
            self.sink.clone(),
        ));
        self.parameters
            .insert((channel_no, description.name), parameter);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn interface_id(&self) -> &str {
        &self.interface_id
    }

    pub fn sink(&self) -> Arc<dyn ParameterSink> {
        self.sink.clone()
    }

    pub fn channel_exists(&self, channel_no: u32) -> bool {
        self.channels.contains(&channel_no)
    }

    pub fn channel_address(&self, channel_no: u32) -> String {
        format!("{}:{}", self.address, channel_no)
    }

    /// Live parameter at (channel, name), if the device exposes it.
    pub fn parameter(&self, channel_no: u32, name: &str) -> Option<Arc<BoundParameter>> {
        self.parameters
            .get(&(channel_no, name.to_string()))
            .cloned()
    }

    pub fn has_parameter(&self, channel_no: u32, name: &str) -> bool {
        self.parameters.contains_key(&(channel_no, name.to_string()))
    }

    pub fn has_entity(&self, unique_id: &str) -> bool {
        self.entities.contains_key(unique_id)
    }

    /// Atomically register an entity. Returns false if an entity with
    /// the same unique id is already registered; the existing entity
    /// is left untouched.
    pub fn try_add_entity(&self, entity: Arc<dyn DeviceEntity>) -> bool {
        match self.entities.entry(entity.unique_id().to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(entity);
                true
            }
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Route a value event to the matching parameter cache.
    pub fn handle_event(&self, channel_no: u32, parameter: &str, value: crate::value::ParamValue) {
        if let Some(param) = self.parameter(channel_no, parameter) {
            param.update_value(value);
        }
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("address", &self.address)
            .field("model", &self.model)
            .field("channels", &self.channels)
            .field("parameters", &self.parameters.len())
            .field("entities", &self.entities.len())
            .finish()
    }
}
