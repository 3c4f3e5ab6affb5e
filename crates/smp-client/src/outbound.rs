//! Borrowed view of everything needed to put a command on the wire.

use smp_protocol::Command;
use tracing::trace;

use crate::error::Result;
use crate::events::EventSender;
use crate::timer::Scheduler;
use crate::transport::Transport;

pub(crate) struct Outbound<'a, T, S> {
    pub transport: &'a mut T,
    pub scheduler: &'a mut S,
    pub sequence: &'a mut u8,
    pub events: &'a EventSender,
}

impl<T: Transport, S: Scheduler> Outbound<'_, T, S> {
    /// Encode and send `command`, returning the sequence number used.
    ///
    /// The counter only advances once the transport accepts the frame.
    pub fn send(&mut self, command: &Command) -> Result<u8> {
        let sequence = *self.sequence;
        let bytes = command.encode(sequence)?;
        self.transport.send(&bytes)?;
        *self.sequence = sequence.wrapping_add(1);
        trace!(
            "SmpClient: sent {:?}/{} seq={} ({} bytes)",
            command.group(),
            command.command_id(),
            sequence,
            bytes.len()
        );
        Ok(sequence)
    }
}
