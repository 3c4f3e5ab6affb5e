//! The SMP client: sends commands, reassembles responses, and drives uploads.
//!
//! `SmpClient` is a single-threaded state machine. The owner feeds it
//! inbound fragments, fired timers and connection changes; everything it
//! has to report comes out on the event channel.

use mcuboot_image::ImageDescriptor;
use smp_protocol::{upload_ack_offset, Command, Frame, FrameCodec};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EventSender};
use crate::outbound::Outbound;
use crate::timer::{Scheduler, TimerId};
use crate::transport::Transport;
use crate::upload::{UploadEngine, UploadSession};

/// SMP client over transport `T` with timers from `S`.
pub struct SmpClient<T, S> {
    transport: T,
    scheduler: S,
    codec: FrameCodec,
    sequence: u8,
    upload: UploadEngine,
    events: EventSender,
}

/// Split the client into the upload engine and an outbound view.
macro_rules! split {
    ($client:expr) => {{
        let SmpClient {
            transport,
            scheduler,
            sequence,
            upload,
            events,
            ..
        } = &mut *$client;
        (
            upload,
            Outbound {
                transport,
                scheduler,
                sequence,
                events: &*events,
            },
        )
    }};
}

impl<T: Transport, S: Scheduler> SmpClient<T, S> {
    /// Create a client. Events are delivered through `events`.
    pub fn new(config: &ClientConfig, transport: T, scheduler: S, events: EventSender) -> Result<Self> {
        config.validate()?;
        Ok(SmpClient {
            transport,
            scheduler,
            codec: FrameCodec::new(),
            sequence: 0,
            upload: UploadEngine::new(config),
            events,
        })
    }

    /// Sequence number the next frame will carry.
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Running upload, if any.
    pub fn upload_session(&self) -> Option<&UploadSession> {
        self.upload.session()
    }

    /// Whether an upload is running.
    pub fn upload_in_progress(&self) -> bool {
        self.upload.in_progress()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The timer scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Bytes buffered towards an incomplete frame.
    pub fn buffered_len(&self) -> usize {
        self.codec.buffered_len()
    }

    /// Send any command. Responses arrive as `ClientEvent::Message`.
    ///
    /// Returns the sequence number the frame was sent with.
    pub fn send(&mut self, command: &Command) -> Result<u8> {
        let (_, mut out) = split!(self);
        out.send(command)
    }

    /// Echo `text` back from the device.
    pub fn echo(&mut self, text: impl Into<String>) -> Result<u8> {
        self.send(&Command::Echo { text: text.into() })
    }

    /// Reset the device.
    pub fn reset(&mut self) -> Result<u8> {
        self.send(&Command::Reset)
    }

    /// Read the image slot listing.
    pub fn image_state(&mut self) -> Result<u8> {
        self.send(&Command::ImageState)
    }

    /// Mark the image with `hash` for a test boot.
    pub fn image_test(&mut self, hash: impl Into<Vec<u8>>) -> Result<u8> {
        self.send(&Command::ImageTest { hash: hash.into() })
    }

    /// Confirm an image, or the running image when `hash` is `None`.
    pub fn image_confirm(&mut self, hash: Option<Vec<u8>>) -> Result<u8> {
        self.send(&Command::ImageConfirm { hash })
    }

    /// Erase the secondary slot.
    pub fn image_erase(&mut self) -> Result<u8> {
        self.send(&Command::ImageErase)
    }

    /// Start uploading `image` to image number `slot`.
    ///
    /// The image is validated first; `descriptor.hash_valid` in the result
    /// tells whether its hash TLV matched. Fails with
    /// `UploadAlreadyInProgress` while another upload is running.
    pub fn upload(&mut self, image: Vec<u8>, slot: u64) -> Result<ImageDescriptor> {
        let (upload, mut out) = split!(self);
        upload.start(image, slot, &mut out)
    }

    /// Feed bytes received from the transport.
    ///
    /// Every complete frame is either consumed as an upload acknowledgement
    /// or delivered as `ClientEvent::Message`. All frames in `data` are
    /// processed; the first error encountered is returned.
    pub fn on_fragment(&mut self, data: &[u8]) -> Result<()> {
        let mut first_error = None;
        for decoded in self.codec.feed(data) {
            let result = match decoded {
                Ok(frame) => self.dispatch(frame),
                Err(e) => {
                    warn!("SmpClient: dropping undecodable frame: {}", e);
                    Err(ClientError::from(e))
                }
            };
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Deliver a fired timer.
    pub fn on_timer(&mut self, id: TimerId) -> Result<()> {
        let (upload, mut out) = split!(self);
        upload.on_timer(id, &mut out)
    }

    /// The transport started connecting.
    pub fn connecting(&mut self) {
        debug!("SmpClient: connecting");
        self.events.emit(ClientEvent::Connecting);
    }

    /// The transport is connected.
    pub fn connected(&mut self) {
        info!("SmpClient: connected");
        self.events.emit(ClientEvent::Connected);
    }

    /// The transport went away. Any partial frame is discarded.
    ///
    /// A running upload is kept; its retry timer resends once the link is
    /// back.
    pub fn disconnected(&mut self) {
        let discarded = self.codec.buffered_len();
        self.codec.clear();
        info!("SmpClient: disconnected ({} buffered bytes discarded)", discarded);
        self.events.emit(ClientEvent::Disconnected);
    }

    fn dispatch(&mut self, frame: Frame) -> Result<()> {
        if let Some(off) = upload_ack_offset(&frame) {
            let (upload, mut out) = split!(self);
            return upload.on_ack(off, &mut out);
        }
        debug!(
            "SmpClient: received {:?} {:?}/{} seq={} rc={:?}",
            frame.operation,
            frame.group,
            frame.command_id,
            frame.sequence,
            frame.return_code()
        );
        self.events.emit(ClientEvent::Message(frame));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_channel;
    use crate::testing::{signed_image, ManualScheduler, RecordingTransport};
    use smp_protocol::value::{as_bytes, text_map, uint};
    use smp_protocol::{Group, Operation, Value, IMAGE_STATE, IMAGE_UPLOAD, OS_ECHO};
    use tokio::sync::mpsc::UnboundedReceiver;

    type TestClient = SmpClient<RecordingTransport, ManualScheduler>;

    fn client(mtu: usize) -> (TestClient, UnboundedReceiver<ClientEvent>) {
        let config = ClientConfig {
            mtu,
            ..Default::default()
        };
        let (events, rx) = event_channel();
        let client = SmpClient::new(
            &config,
            RecordingTransport::default(),
            ManualScheduler::default(),
            events,
        )
        .unwrap();
        (client, rx)
    }

    fn response(group: Group, command_id: u8, body: Value) -> Vec<u8> {
        Frame::encode(Operation::WriteResponse, group, command_id, 0, Some(&body)).unwrap()
    }

    fn ack(off: u64) -> Vec<u8> {
        response(
            Group::Image,
            IMAGE_UPLOAD,
            text_map([("rc", uint(0)), ("off", uint(off))]),
        )
    }

    fn drain(rx: &mut UnboundedReceiver<ClientEvent>) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn messages(events: &[ClientEvent]) -> Vec<&Frame> {
        events
            .iter()
            .filter_map(|e| match e {
                ClientEvent::Message(frame) => Some(frame),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let (events, _rx) = event_channel();
        let config = ClientConfig {
            mtu: 4,
            ..Default::default()
        };
        let result = SmpClient::new(
            &config,
            RecordingTransport::default(),
            ManualScheduler::default(),
            events,
        );
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_sequence_increments_and_wraps() {
        let (mut client, _rx) = client(140);
        for expected in 0..=255u8 {
            assert_eq!(client.image_state().unwrap(), expected);
        }
        assert_eq!(client.reset().unwrap(), 0);

        let sequences: Vec<u8> = client.transport.sent.iter().map(|f| f[6]).collect();
        assert_eq!(sequences[..3], [0u8, 1, 2]);
        assert_eq!(sequences[255..], [255u8, 0]);
    }

    #[test]
    fn test_failed_send_does_not_consume_sequence() {
        let (mut client, _rx) = client(140);
        client.transport.fail_next = true;
        assert!(matches!(client.echo("x"), Err(ClientError::Transport(_))));
        assert_eq!(client.sequence(), 0);
        assert_eq!(client.echo("x").unwrap(), 0);
    }

    #[test]
    fn test_command_helpers_encode_expected_ids() {
        let (mut client, _rx) = client(140);
        client.echo("hello").unwrap();
        client.image_state().unwrap();
        client.image_confirm(None).unwrap();

        let frames: Vec<Frame> = client
            .transport
            .sent
            .iter()
            .map(|b| Frame::decode(b).unwrap())
            .collect();
        assert!(frames[0].is_command(Group::Os, OS_ECHO));
        assert_eq!(frames[0].operation, Operation::Write);
        assert!(frames[1].is_command(Group::Image, IMAGE_STATE));
        assert_eq!(frames[1].operation, Operation::Read);
        assert!(frames[2].is_command(Group::Image, IMAGE_STATE));
        assert_eq!(frames[2].operation, Operation::Write);
    }

    #[test]
    fn test_ack_consumed_error_delivered() {
        let (mut client, mut rx) = client(140);
        client.upload(signed_image(500), 0).unwrap();
        drain(&mut rx);

        client.on_fragment(&ack(50)).unwrap();
        let events = drain(&mut rx);
        assert!(messages(&events).is_empty());
        assert_eq!(client.upload_session().unwrap().offset(), 50);

        let rejected = response(Group::Image, IMAGE_UPLOAD, text_map([("rc", uint(2))]));
        client.on_fragment(&rejected).unwrap();
        let events = drain(&mut rx);
        let delivered = messages(&events);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].rc(), Some(2));
        assert_eq!(client.upload_session().unwrap().offset(), 50);
    }

    #[test]
    fn test_ack_with_malformed_rc_delivered() {
        let (mut client, mut rx) = client(140);
        client.upload(signed_image(1000), 0).unwrap();
        drain(&mut rx);

        let negative = response(
            Group::Image,
            IMAGE_UPLOAD,
            text_map([("rc", Value::Integer((-1).into())), ("off", uint(60))]),
        );
        client.on_fragment(&negative).unwrap();

        let events = drain(&mut rx);
        assert_eq!(messages(&events).len(), 1);
        assert_eq!(client.upload_session().unwrap().offset(), 0);
        assert_eq!(client.transport.sent.len(), 1);
    }

    #[test]
    fn test_unrelated_frames_delivered_once() {
        let (mut client, mut rx) = client(140);
        let echo = response(
            Group::Os,
            OS_ECHO,
            text_map([("r", Value::Text("hi".into()))]),
        );
        client.on_fragment(&echo).unwrap();

        let events = drain(&mut rx);
        let delivered = messages(&events);
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].is_command(Group::Os, OS_ECHO));
    }

    #[test]
    fn test_ack_without_upload_dropped() {
        let (mut client, mut rx) = client(140);
        client.on_fragment(&ack(10)).unwrap();
        assert!(drain(&mut rx).is_empty());
        assert!(client.transport.sent.is_empty());
    }

    #[test]
    fn test_fragmented_ack() {
        let (mut client, mut rx) = client(140);
        client.upload(signed_image(500), 0).unwrap();
        drain(&mut rx);

        let bytes = ack(40);
        for piece in bytes.chunks(3) {
            client.on_fragment(piece).unwrap();
        }
        assert_eq!(client.upload_session().unwrap().offset(), 40);
        assert_eq!(client.transport.sent.len(), 2);
    }

    #[test]
    fn test_bad_frame_reported_rest_processed() {
        let (mut client, mut rx) = client(140);
        let mut garbage = vec![0u8, 0, 0, 2, 0, 0, 0, 0, 0xff, 0xff];
        let echo = response(Group::Os, OS_ECHO, text_map([("r", Value::Text("a".into()))]));
        garbage.extend_from_slice(&echo);

        let result = client.on_fragment(&garbage);
        assert!(matches!(result, Err(ClientError::Framing(_))));
        assert_eq!(messages(&drain(&mut rx)).len(), 1);
    }

    #[test]
    fn test_full_upload_via_client() {
        let (mut client, mut rx) = client(140);
        let image = signed_image(1000);
        let descriptor = client.upload(image.clone(), 0).unwrap();

        let mut received = Vec::new();
        while client.upload_in_progress() {
            let frame = Frame::decode(client.transport.sent.last().unwrap()).unwrap();
            received.extend_from_slice(frame.get("data").and_then(as_bytes).unwrap());
            client.on_fragment(&ack(received.len() as u64)).unwrap();
        }

        assert_eq!(received, image);
        let finished: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, ClientEvent::UploadFinished { .. }))
            .collect();
        assert_eq!(
            finished,
            vec![ClientEvent::UploadFinished {
                image_hash: descriptor.computed_hash
            }]
        );
    }

    #[test]
    fn test_disconnect_discards_partial_frame() {
        let (mut client, mut rx) = client(140);
        client.connecting();
        client.connected();
        client.on_fragment(&ack(10)[..5]).unwrap();
        assert_eq!(client.buffered_len(), 5);

        client.disconnected();
        assert_eq!(client.buffered_len(), 0);
        assert_eq!(
            drain(&mut rx),
            vec![
                ClientEvent::Connecting,
                ClientEvent::Connected,
                ClientEvent::Disconnected
            ]
        );
    }

    #[test]
    fn test_timer_through_client() {
        let (mut client, _rx) = client(140);
        client.upload(signed_image(300), 0).unwrap();
        let (timer, _) = client.scheduler.armed[0];
        client.on_timer(timer).unwrap();
        assert_eq!(client.transport.sent.len(), 2);
        assert_eq!(client.upload_session().unwrap().retry_count(), 1);
    }
}
