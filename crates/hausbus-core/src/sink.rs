//! Backend parameter sink interface.
//!
//! The sink is the transport collaborator that actually reads and
//! writes parameter values on the physical backend. Everything above
//! it treats channel parameters as abstract `(address, paramset,
//! parameter)` triples.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DeviceResult;
use crate::value::ParamValue;

/// Named parameter group on a channel. The composition layer only
/// ever touches the live group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamsetKey {
    Values,
    Master,
}

impl ParamsetKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Values => "VALUES",
            Self::Master => "MASTER",
        }
    }
}

impl std::fmt::Display for ParamsetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-side read/write access to channel parameters.
///
/// Implementations own all network fault handling, timeouts and
/// cancellation; callers simply propagate sink errors unchanged.
#[async_trait]
pub trait ParameterSink: Send + Sync {
    /// Read a single parameter value.
    async fn get(
        &self,
        channel_address: &str,
        paramset: ParamsetKey,
        parameter: &str,
    ) -> DeviceResult<ParamValue>;

    /// Write a single parameter value.
    async fn set(
        &self,
        channel_address: &str,
        paramset: ParamsetKey,
        parameter: &str,
        value: ParamValue,
    ) -> DeviceResult<()>;

    /// Write several parameters of one channel in a single backend
    /// call. Pairs are applied in the given order.
    async fn put_paramset(
        &self,
        channel_address: &str,
        paramset: ParamsetKey,
        values: Vec<(String, ParamValue)>,
    ) -> DeviceResult<()>;
}
