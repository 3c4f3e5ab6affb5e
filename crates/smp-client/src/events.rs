//! Notifications delivered to the host application.

use mcuboot_image::ImageHash;
use smp_protocol::Frame;
use tokio::sync::mpsc;
use tracing::trace;

/// Everything the client reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The transport is connecting.
    Connecting,
    /// The transport is connected.
    Connected,
    /// The transport went away.
    Disconnected,
    /// A received frame that was not consumed as an upload acknowledgement.
    Message(Frame),
    /// An upload chunk is about to be sent.
    UploadProgress(UploadProgress),
    /// The device acknowledged the whole image.
    UploadFinished {
        /// Hash of the uploaded image.
        image_hash: ImageHash,
    },
}

/// Upload progress at the moment a chunk is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Offset of the chunk being sent.
    pub offset: usize,
    /// Image length.
    pub total_length: usize,
    /// `offset * 100 / total_length`, rounded down.
    pub percentage: u8,
}

impl UploadProgress {
    /// Progress for a chunk at `offset` of `total_length`.
    pub fn new(offset: usize, total_length: usize) -> Self {
        let percentage = if total_length == 0 {
            100
        } else {
            (offset.min(total_length) * 100 / total_length) as u8
        };
        UploadProgress {
            offset,
            total_length,
            percentage,
        }
    }
}

/// Sending half of the event channel.
///
/// Emitting never fails; events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

impl EventSender {
    /// Deliver `event` to the receiver, if it is still listening.
    pub fn emit(&self, event: ClientEvent) {
        if let Err(e) = self.tx.send(event) {
            trace!("event receiver closed, dropping {:?}", e.0);
        }
    }
}

/// Create an event channel.
pub fn event_channel() -> (EventSender, mpsc::UnboundedReceiver<ClientEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}
