//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding or decoding frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Encoded body does not fit the 16-bit length field.
    #[error("body too long: maximum {max} bytes, got {actual}")]
    BodyTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual encoded length.
        actual: usize,
    },

    /// Unknown operation code.
    #[error("unknown operation: 0x{0:02X}")]
    UnknownOperation(u8),

    /// Body could not be encoded.
    #[error("body encode failed: {0}")]
    Encode(String),

    /// Body is not valid CBOR.
    #[error("body decode failed: {0}")]
    Decode(String),

    /// Body decoded but a field is missing or has the wrong type.
    #[error("invalid frame data: {0}")]
    InvalidData(String),
}

/// Return codes reported by the device in the `rc` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    /// Success.
    Ok,
    /// Unknown error.
    Unknown,
    /// Out of memory.
    NoMemory,
    /// Invalid argument.
    InvalidValue,
    /// Timed out.
    Timeout,
    /// No such entry.
    NoEntry,
    /// Bad state for this operation.
    BadState,
    /// Response too large.
    MessageTooLarge,
    /// Command not supported.
    NotSupported,
    /// Corrupt data.
    Corrupt,
    /// Device busy.
    Busy,
    /// Code outside the standard range.
    Other(u64),
}

impl ReturnCode {
    /// Whether this code means success.
    pub fn is_ok(self) -> bool {
        self == ReturnCode::Ok
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnCode::Ok => write!(f, "ok"),
            ReturnCode::Unknown => write!(f, "unknown error"),
            ReturnCode::NoMemory => write!(f, "out of memory"),
            ReturnCode::InvalidValue => write!(f, "invalid value"),
            ReturnCode::Timeout => write!(f, "timeout"),
            ReturnCode::NoEntry => write!(f, "no such entry"),
            ReturnCode::BadState => write!(f, "bad state"),
            ReturnCode::MessageTooLarge => write!(f, "message too large"),
            ReturnCode::NotSupported => write!(f, "not supported"),
            ReturnCode::Corrupt => write!(f, "corrupt"),
            ReturnCode::Busy => write!(f, "busy"),
            ReturnCode::Other(code) => write!(f, "error code {}", code),
        }
    }
}

impl From<u64> for ReturnCode {
    fn from(code: u64) -> Self {
        use crate::constants::*;
        match code {
            RC_OK => ReturnCode::Ok,
            RC_UNKNOWN => ReturnCode::Unknown,
            RC_NO_MEMORY => ReturnCode::NoMemory,
            RC_INVALID_VALUE => ReturnCode::InvalidValue,
            RC_TIMEOUT => ReturnCode::Timeout,
            RC_NO_ENTRY => ReturnCode::NoEntry,
            RC_BAD_STATE => ReturnCode::BadState,
            RC_MESSAGE_TOO_LARGE => ReturnCode::MessageTooLarge,
            RC_NOT_SUPPORTED => ReturnCode::NotSupported,
            RC_CORRUPT => ReturnCode::Corrupt,
            RC_BUSY => ReturnCode::Busy,
            _ => ReturnCode::Other(code),
        }
    }
}

impl From<ReturnCode> for u64 {
    fn from(code: ReturnCode) -> Self {
        use crate::constants::*;
        match code {
            ReturnCode::Ok => RC_OK,
            ReturnCode::Unknown => RC_UNKNOWN,
            ReturnCode::NoMemory => RC_NO_MEMORY,
            ReturnCode::InvalidValue => RC_INVALID_VALUE,
            ReturnCode::Timeout => RC_TIMEOUT,
            ReturnCode::NoEntry => RC_NO_ENTRY,
            ReturnCode::BadState => RC_BAD_STATE,
            ReturnCode::MessageTooLarge => RC_MESSAGE_TOO_LARGE,
            ReturnCode::NotSupported => RC_NOT_SUPPORTED,
            ReturnCode::Corrupt => RC_CORRUPT,
            ReturnCode::Busy => RC_BUSY,
            ReturnCode::Other(code) => code,
        }
    }
}
