#![allow(dead_code)]

use std::time::Duration;

use mcuboot_image::tlv::{TLV_INFO_MAGIC, TLV_SHA256};
use mcuboot_image::{sha256, IMAGE_HEADER_SIZE, IMAGE_MAGIC};
use smp_client::{Scheduler, TimerId, Transport, TransportError};
use smp_protocol::value::{text_map, uint};
use smp_protocol::{Frame, Group, Operation, Value, IMAGE_UPLOAD};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Valid image of exactly `total_len` bytes whose hash TLV matches.
pub fn signed_image(total_len: usize) -> Vec<u8> {
    let trailer_len = 4 + 4 + 32;
    let payload_len = total_len - IMAGE_HEADER_SIZE - trailer_len;

    let mut image = vec![0u8; IMAGE_HEADER_SIZE];
    image[0..4].copy_from_slice(&IMAGE_MAGIC.to_le_bytes());
    image[8..10].copy_from_slice(&(IMAGE_HEADER_SIZE as u16).to_le_bytes());
    image[12..16].copy_from_slice(&(payload_len as u32).to_le_bytes());
    image[20] = 1;
    image[21] = 4;
    image.extend((0..payload_len).map(|i| (i % 251) as u8));

    let digest = sha256(&image);
    image.extend_from_slice(&TLV_INFO_MAGIC.to_le_bytes());
    image.extend_from_slice(&(trailer_len as u16).to_le_bytes());
    image.extend_from_slice(&TLV_SHA256.to_le_bytes());
    image.extend_from_slice(&32u16.to_le_bytes());
    image.extend_from_slice(&digest);
    image
}

pub fn response(group: Group, command_id: u8, body: Value) -> Vec<u8> {
    Frame::encode(Operation::WriteResponse, group, command_id, 0, Some(&body)).unwrap()
}

pub fn upload_ack(off: u64) -> Vec<u8> {
    response(
        Group::Image,
        IMAGE_UPLOAD,
        text_map([("rc", uint(0)), ("off", uint(off))]),
    )
}

#[derive(Default)]
pub struct VecTransport {
    pub sent: Vec<Vec<u8>>,
}

impl Transport for VecTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.sent.push(bytes.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct StepScheduler {
    next: u64,
    pub armed: Vec<(TimerId, Duration)>,
}

impl StepScheduler {
    /// The single timer expected to be armed.
    pub fn armed_one(&self) -> TimerId {
        assert_eq!(self.armed.len(), 1, "expected exactly one armed timer");
        self.armed[0].0
    }
}

impl Scheduler for StepScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.next += 1;
        let id = TimerId(self.next);
        self.armed.push((id, delay));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.armed.retain(|(armed, _)| *armed != id);
    }
}
