//! Frame encoding/decoding utilities.
//!
//! Every SMP message is an 8-byte header followed by a CBOR-encoded body.
//! Multi-byte header fields are big-endian.
//!
//! ```text
//! +----+-------+--------+--------+--------+--------+-----+-----+-----------------+
//! | op | flags | len_hi | len_lo | grp_hi | grp_lo | seq | cmd | body[0..len]    |
//! +----+-------+--------+--------+--------+--------+-----+-----+-----------------+
//! ```
//!
//! There is no delimiter and no checksum: the length field is the only
//! frame boundary. [`FrameCodec`] uses it to reassemble frames from
//! transport fragments of arbitrary size.

use bytes::{BufMut, Bytes, BytesMut};
use ciborium::value::Value;

use crate::constants::*;
use crate::error::{ProtocolError, ReturnCode};
use crate::types::{Group, Operation};
use crate::value;

/// One decoded protocol message.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Operation.
    pub operation: Operation,
    /// Reserved flags byte, zero on send.
    pub flags: u8,
    /// Encoded body length from the header.
    pub body_length: u16,
    /// Command group.
    pub group: Group,
    /// Sender sequence number.
    pub sequence: u8,
    /// Command ID within the group.
    pub command_id: u8,
    /// Decoded body, `None` for a zero-length body.
    pub body: Option<Value>,
}

impl Frame {
    /// Encode a frame with the given header fields and body.
    ///
    /// A `None` body is sent as zero bytes.
    pub fn encode(
        operation: Operation,
        group: Group,
        command_id: u8,
        sequence: u8,
        body: Option<&Value>,
    ) -> Result<Vec<u8>, ProtocolError> {
        let body_bytes = match body {
            Some(v) => value::to_cbor(v)?,
            None => Vec::new(),
        };
        if body_bytes.len() > MAX_BODY_SIZE {
            return Err(ProtocolError::BodyTooLong {
                max: MAX_BODY_SIZE,
                actual: body_bytes.len(),
            });
        }

        let mut buf = Vec::with_capacity(HEADER_SIZE + body_bytes.len());
        buf.put_u8(operation.into());
        buf.put_u8(0);
        buf.put_u16(body_bytes.len() as u16);
        buf.put_u16(group.into());
        buf.put_u8(sequence);
        buf.put_u8(command_id);
        buf.extend_from_slice(&body_bytes);
        Ok(buf)
    }

    /// Decode one complete frame.
    ///
    /// `bytes` must hold exactly one frame; the body is everything after the
    /// header.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ProtocolError::FrameTooShort {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let operation =
            Operation::from_byte(bytes[0]).ok_or(ProtocolError::UnknownOperation(bytes[0]))?;
        let body_bytes = &bytes[HEADER_SIZE..];
        let body = if body_bytes.is_empty() {
            None
        } else {
            Some(value::from_cbor(body_bytes)?)
        };

        Ok(Frame {
            operation,
            flags: bytes[1],
            body_length: u16::from_be_bytes([bytes[2], bytes[3]]),
            group: Group::from(u16::from_be_bytes([bytes[4], bytes[5]])),
            sequence: bytes[6],
            command_id: bytes[7],
            body,
        })
    }

    /// Look up a body field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.as_ref().and_then(|b| value::map_get(b, key))
    }

    /// Return code, if the body carries one.
    pub fn rc(&self) -> Option<u64> {
        self.get(KEY_RC).and_then(value::as_u64)
    }

    /// Return code as reported by the device.
    ///
    /// `None` only when the body has no `rc` field. A present `rc` that is
    /// not an unsigned integer is reported as `ReturnCode::Unknown`.
    pub fn return_code(&self) -> Option<ReturnCode> {
        self.get(KEY_RC).map(|rc| match value::as_u64(rc) {
            Some(code) => ReturnCode::from(code),
            None => ReturnCode::Unknown,
        })
    }

    /// Whether this frame belongs to `group`/`command_id`.
    pub fn is_command(&self, group: Group, command_id: u8) -> bool {
        self.group == group && self.command_id == command_id
    }
}

/// Reassembles frames from transport fragments.
///
/// Bytes are appended until the header's length field says a whole frame
/// is present; frames are then extracted front to back. Leftover bytes stay
/// buffered as the start of the next frame.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(HEADER_SIZE + 512),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete frame's raw bytes, header included.
    ///
    /// Returns `None` if more data is needed.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        // The length field ends at byte 4.
        if self.buffer.len() < 4 {
            return None;
        }

        let body_len = u16::from_be_bytes([self.buffer[2], self.buffer[3]]) as usize;
        if self.buffer.len() < HEADER_SIZE + body_len {
            return None;
        }

        Some(self.buffer.split_to(HEADER_SIZE + body_len).freeze())
    }

    /// Append a fragment and decode every frame it completes, in order.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Result<Frame, ProtocolError>> {
        self.push(data);
        let mut frames = Vec::new();
        while let Some(raw) = self.next_frame() {
            frames.push(Frame::decode(&raw));
        }
        frames
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard any partially received frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
