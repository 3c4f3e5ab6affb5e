//! Error types for mcuboot-image.

use thiserror::Error;

/// Structural violations found while parsing a firmware image.
///
/// Parsing stops at the first violation; a hash mismatch is not an error
/// and is reported through [`crate::ImageDescriptor::hash_valid`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// Buffer is shorter than the fixed image header.
    #[error("image too short: expected at least {expected} bytes, got {actual}")]
    ImageTooShort {
        /// Minimum length required.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    /// Header magic does not identify an MCUboot image.
    #[error("bad image magic: 0x{0:08x}")]
    BadMagic(u32),

    /// Load address must be zero for images the bootloader copies in place.
    #[error("bad load address: 0x{0:08x}")]
    BadLoadAddress(u32),

    /// Declared header plus payload size exceeds the buffer.
    #[error("bad image size: header {header_size} + image {image_size} exceeds buffer of {actual} bytes")]
    BadImageSize {
        /// Header size from the image header.
        header_size: u16,
        /// Payload size from the image header.
        image_size: u32,
        /// Actual buffer length.
        actual: usize,
    },

    /// Header flags are not supported.
    #[error("bad image flags: 0x{0:08x}")]
    BadFlags(u32),

    /// Protected TLV area is missing or does not start with its magic.
    #[error("bad protected TLV magic at offset {offset}: {found:?}")]
    BadProtectedTlvMagic {
        /// Offset where the magic was expected.
        offset: usize,
        /// Value found there, if the buffer was long enough to hold one.
        found: Option<u16>,
    },

    /// Unprotected TLV trailer is missing or does not start with its magic.
    #[error("bad TLV magic at offset {offset}: {found:?}")]
    BadTlvMagic {
        /// Offset where the magic was expected.
        offset: usize,
        /// Value found there, if the buffer was long enough to hold one.
        found: Option<u16>,
    },

    /// A TLV entry or area length runs past the end of its area.
    #[error("malformed TLV at offset {offset}: {message}")]
    BadTlv {
        /// Offset of the offending entry or area header.
        offset: usize,
        /// Description of the violation.
        message: String,
    },
}

impl ImageError {
    /// Create a TLV error at a specific offset.
    pub fn bad_tlv(offset: usize, message: impl Into<String>) -> Self {
        ImageError::BadTlv {
            offset,
            message: message.into(),
        }
    }
}

/// Result alias for image parsing.
pub type Result<T> = std::result::Result<T, ImageError>;
