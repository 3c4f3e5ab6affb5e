//! Common types used in the protocol.

use crate::constants::*;

/// Frame operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operation {
    /// Read request.
    Read = OP_READ,
    /// Read response.
    ReadResponse = OP_READ_RSP,
    /// Write request.
    Write = OP_WRITE,
    /// Write response.
    WriteResponse = OP_WRITE_RSP,
}

impl Operation {
    /// Decode from the first header byte. Bits above [`OP_MASK`] are ignored.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte & OP_MASK {
            OP_READ => Some(Operation::Read),
            OP_READ_RSP => Some(Operation::ReadResponse),
            OP_WRITE => Some(Operation::Write),
            OP_WRITE_RSP => Some(Operation::WriteResponse),
            _ => None,
        }
    }

    /// Whether this operation is a response.
    pub fn is_response(self) -> bool {
        matches!(self, Operation::ReadResponse | Operation::WriteResponse)
    }
}

impl From<Operation> for u8 {
    fn from(op: Operation) -> Self {
        op as u8
    }
}

/// Command group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// OS management.
    Os,
    /// Image management.
    Image,
    /// Statistics.
    Stat,
    /// Configuration.
    Config,
    /// Log.
    Log,
    /// Crash.
    Crash,
    /// Split image.
    Split,
    /// Run test.
    Run,
    /// File system.
    FileSystem,
    /// Shell.
    Shell,
    /// Any other group ID (vendor or application specific).
    Other(u16),
}

impl From<u16> for Group {
    fn from(id: u16) -> Self {
        match id {
            GROUP_OS => Group::Os,
            GROUP_IMAGE => Group::Image,
            GROUP_STAT => Group::Stat,
            GROUP_CONFIG => Group::Config,
            GROUP_LOG => Group::Log,
            GROUP_CRASH => Group::Crash,
            GROUP_SPLIT => Group::Split,
            GROUP_RUN => Group::Run,
            GROUP_FS => Group::FileSystem,
            GROUP_SHELL => Group::Shell,
            other => Group::Other(other),
        }
    }
}

impl From<Group> for u16 {
    fn from(group: Group) -> Self {
        match group {
            Group::Os => GROUP_OS,
            Group::Image => GROUP_IMAGE,
            Group::Stat => GROUP_STAT,
            Group::Config => GROUP_CONFIG,
            Group::Log => GROUP_LOG,
            Group::Crash => GROUP_CRASH,
            Group::Split => GROUP_SPLIT,
            Group::Run => GROUP_RUN,
            Group::FileSystem => GROUP_FS,
            Group::Shell => GROUP_SHELL,
            Group::Other(id) => id,
        }
    }
}
