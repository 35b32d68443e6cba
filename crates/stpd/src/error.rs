//! Error types for the bridge daemon.

use std::io;
use stp_types::PortId;
use thiserror::Error;

/// Result type alias for daemon operations.
pub type Result<T> = std::result::Result<T, StpdError>;

/// Errors that can occur in the bridge daemon.
///
/// None of these are fatal to a running bridge: decode and transport
/// failures are recovered locally (drop the packet, skip the port) and
/// only configuration errors abort startup.
#[derive(Debug, Error)]
pub enum StpdError {
    /// Configuration validation failed.
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Failed to read or parse a configuration file.
    #[error("failed to load configuration from '{path}': {message}")]
    ConfigFile {
        /// The file path.
        path: String,
        /// Error message.
        message: String,
    },

    /// An inbound frame could not be decoded as a BPDU.
    #[error("failed to decode frame: {0}")]
    Decode(String),

    /// A transport send or receive failed on a port.
    #[error("transport failure on port {port}: {message}")]
    Transport {
        /// The port the operation was attempted on.
        port: PortId,
        /// Error message.
        message: String,
    },

    /// The referenced port is not in the registry.
    #[error("unknown port: {0}")]
    UnknownPort(PortId),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl StpdError {
    /// Creates a configuration validation error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error for a port.
    pub fn transport(port: PortId, message: impl Into<String>) -> Self {
        Self::Transport {
            port,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for StpdError {
    fn from(err: serde_json::Error) -> Self {
        StpdError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = StpdError::invalid_config("cost", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration for cost: must be positive"
        );
    }

    #[test]
    fn test_transport_display() {
        let err = StpdError::transport(PortId::new(2), "socket closed");
        assert_eq!(err.to_string(), "transport failure on port 2: socket closed");
    }
}
