//! Error types for the device and parameter layer.

/// Errors that can occur in the device abstraction layer.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// A schema table failed structural validation at load time.
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    /// A channel address does not exist on the device.
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// A parameter does not exist on the channel.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// A value was rejected before being sent to the backend.
    #[error("Invalid value for {parameter}: {reason}")]
    InvalidValue { parameter: String, reason: String },

    /// Error reported by the backend parameter sink.
    #[error("Sink error: {0}")]
    Sink(String),
}

/// Result alias used throughout the device layer.
pub type DeviceResult<T> = Result<T, DeviceError>;
