//! Error types for the SMP client.

use mcuboot_image::ImageError;
use smp_protocol::ProtocolError;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Frame could not be encoded or a received frame could not be decoded.
    #[error("framing error: {0}")]
    Framing(#[from] ProtocolError),

    /// Image failed structural validation; the upload did not start.
    #[error("invalid image: {0}")]
    Image(#[from] ImageError),

    /// Transport refused the bytes.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An upload is already running.
    #[error("upload already in progress")]
    UploadAlreadyInProgress,

    /// MTU leaves no room for image data in an upload chunk.
    #[error("mtu {mtu} leaves no room for image data")]
    MtuTooSmall {
        /// Configured MTU.
        mtu: usize,
    },

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The client task has stopped.
    #[error("client task stopped")]
    Closed,
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// YAML is malformed.
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
