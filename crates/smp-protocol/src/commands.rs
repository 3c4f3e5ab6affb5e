//! Commands that can be sent to the device.

use ciborium::value::Value;

use crate::constants::*;
use crate::error::ProtocolError;
use crate::frame::Frame;
use crate::types::{Group, Operation};
use crate::value::{self, text_map, uint};

/// Commands that can be sent to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Echo a string back.
    Echo {
        /// Text to echo.
        text: String,
    },

    /// Reset the device.
    Reset,

    /// Read the state of all image slots.
    ImageState,

    /// Mark an image for a test boot on next reset.
    ImageTest {
        /// Hash of the image to test.
        hash: Vec<u8>,
    },

    /// Make an image permanent.
    ImageConfirm {
        /// Hash of the image to confirm; `None` confirms the running image.
        hash: Option<Vec<u8>>,
    },

    /// Erase the secondary slot.
    ImageErase,

    /// One chunk of an image upload.
    UploadChunk(UploadChunk),

    /// Any other command, body supplied by the caller.
    Raw {
        /// Operation.
        operation: Operation,
        /// Command group.
        group: Group,
        /// Command ID within the group.
        command_id: u8,
        /// Body, `None` for no payload.
        body: Option<Value>,
    },
}

impl Command {
    /// Operation this command is sent with.
    pub fn operation(&self) -> Operation {
        match self {
            Command::ImageState => Operation::Read,
            Command::Raw { operation, .. } => *operation,
            _ => Operation::Write,
        }
    }

    /// Command group.
    pub fn group(&self) -> Group {
        match self {
            Command::Echo { .. } | Command::Reset => Group::Os,
            Command::ImageState
            | Command::ImageTest { .. }
            | Command::ImageConfirm { .. }
            | Command::ImageErase
            | Command::UploadChunk(_) => Group::Image,
            Command::Raw { group, .. } => *group,
        }
    }

    /// Command ID within the group.
    pub fn command_id(&self) -> u8 {
        match self {
            Command::Echo { .. } => OS_ECHO,
            Command::Reset => OS_RESET,
            Command::ImageState | Command::ImageTest { .. } | Command::ImageConfirm { .. } => {
                IMAGE_STATE
            }
            Command::ImageErase => IMAGE_ERASE,
            Command::UploadChunk(_) => IMAGE_UPLOAD,
            Command::Raw { command_id, .. } => *command_id,
        }
    }

    /// Build the body value, `None` for commands without a payload.
    pub fn body(&self) -> Option<Value> {
        match self {
            Command::Echo { text } => Some(text_map([(KEY_ECHO_DATA, Value::Text(text.clone()))])),
            Command::Reset | Command::ImageState | Command::ImageErase => None,
            Command::ImageTest { hash } => Some(text_map([
                (KEY_HASH, Value::Bytes(hash.clone())),
                (KEY_CONFIRM, Value::Bool(false)),
            ])),
            Command::ImageConfirm { hash } => {
                let mut entries = Vec::with_capacity(2);
                if let Some(hash) = hash {
                    entries.push((KEY_HASH, Value::Bytes(hash.clone())));
                }
                entries.push((KEY_CONFIRM, Value::Bool(true)));
                Some(text_map(entries))
            }
            Command::UploadChunk(chunk) => Some(chunk.to_value()),
            Command::Raw { body, .. } => body.clone(),
        }
    }

    /// Encode the command to a complete frame.
    pub fn encode(&self, sequence: u8) -> Result<Vec<u8>, ProtocolError> {
        let body = self.body();
        Frame::encode(
            self.operation(),
            self.group(),
            self.command_id(),
            sequence,
            body.as_ref(),
        )
    }
}

/// Body of an image upload request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadChunk {
    /// Offset of `data` within the image.
    pub off: u64,
    /// Image bytes carried by this chunk.
    pub data: Vec<u8>,
    /// Total image length, first chunk only.
    pub len: Option<u64>,
    /// Image hash, first chunk only.
    pub sha: Option<Vec<u8>>,
    /// Target image number, first chunk only.
    pub image: Option<u64>,
}

impl UploadChunk {
    /// Build the CBOR map.
    pub fn to_value(&self) -> Value {
        let mut entries = Vec::with_capacity(5);
        entries.push((KEY_DATA, Value::Bytes(self.data.clone())));
        entries.push((KEY_OFF, uint(self.off)));
        if let Some(len) = self.len {
            entries.push((KEY_LEN, uint(len)));
        }
        if let Some(sha) = &self.sha {
            entries.push((KEY_SHA, Value::Bytes(sha.clone())));
        }
        if let Some(image) = self.image {
            entries.push((KEY_IMAGE, uint(image)));
        }
        text_map(entries)
    }

    /// Encoded body size of this chunk with `data` left empty.
    ///
    /// CBOR length prefixes depend on which fields are present, so the
    /// room left for image bytes must be measured rather than assumed.
    pub fn encoded_overhead(&self) -> Result<usize, ProtocolError> {
        let empty = UploadChunk {
            data: Vec::new(),
            ..self.clone()
        };
        Ok(value::to_cbor(&empty.to_value())?.len())
    }
}
