//! Test doubles shared by the unit tests.

use std::time::Duration;

use mcuboot_image::tlv::{TLV_INFO_MAGIC, TLV_SHA256};
use mcuboot_image::{sha256, IMAGE_HEADER_SIZE, IMAGE_MAGIC};

use crate::timer::{Scheduler, TimerId};
use crate::transport::{Transport, TransportError};

/// Records every frame handed to it.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<Vec<u8>>,
    /// Fail the next send, then recover.
    pub fail_next: bool,
}

impl Transport for RecordingTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(TransportError::Write("injected failure".into()));
        }
        self.sent.push(bytes.to_vec());
        Ok(())
    }
}

/// Scheduler whose timers only fire when a test says so.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pub armed: Vec<(TimerId, Duration)>,
    pub cancelled: Vec<TimerId>,
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.armed.push((id, delay));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.armed.retain(|(armed, _)| *armed != id);
        self.cancelled.push(id);
    }
}

/// A structurally valid image of exactly `total_len` bytes with a correct
/// SHA-256 TLV.
pub fn signed_image(total_len: usize) -> Vec<u8> {
    let trailer_len = 4 + 4 + 32;
    let payload_len = total_len - IMAGE_HEADER_SIZE - trailer_len;

    let mut image = vec![0u8; IMAGE_HEADER_SIZE];
    image[0..4].copy_from_slice(&IMAGE_MAGIC.to_le_bytes());
    image[8..10].copy_from_slice(&(IMAGE_HEADER_SIZE as u16).to_le_bytes());
    image[12..16].copy_from_slice(&(payload_len as u32).to_le_bytes());
    image[20] = 1;
    image.extend((0..payload_len).map(|i| (i * 31 + 7) as u8));

    let digest = sha256(&image);
    image.extend_from_slice(&TLV_INFO_MAGIC.to_le_bytes());
    image.extend_from_slice(&(trailer_len as u16).to_le_bytes());
    image.extend_from_slice(&TLV_SHA256.to_le_bytes());
    image.extend_from_slice(&32u16.to_le_bytes());
    image.extend_from_slice(&digest);
    image
}
