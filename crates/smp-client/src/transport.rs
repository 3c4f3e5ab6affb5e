//! Transport abstraction over any byte-oriented channel.
//!
//! The client only needs to hand a complete frame to the link. Inbound
//! bytes are pushed into the client by whoever owns the link, one fragment
//! at a time, in arrival order.

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised when handing bytes to a transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The link is gone.
    #[error("transport closed")]
    Closed,

    /// The link refused the write.
    #[error("write failed: {0}")]
    Write(String),
}

/// Outbound half of a byte transport.
pub trait Transport {
    /// Hand one encoded frame to the link.
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).send(bytes)
    }
}

/// Transport that forwards frames to a channel drained by a writer task.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its frames arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelTransport { tx }, rx)
    }

    /// Wrap an existing sender.
    pub fn from_sender(tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        ChannelTransport { tx }
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.tx
            .send(bytes.to_vec())
            .map_err(|_| TransportError::Closed)
    }
}
