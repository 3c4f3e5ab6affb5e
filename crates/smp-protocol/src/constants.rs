//! Protocol constants
//!
//! Operation codes, group IDs, command IDs and body keys of the SMP
//! management protocol.

/// Size of the frame header.
pub const HEADER_SIZE: usize = 8;

/// Maximum encoded body size (the length field is 16 bits).
pub const MAX_BODY_SIZE: usize = u16::MAX as usize;

// ============================================================================
// Operation Codes
// ============================================================================

/// Read request.
pub const OP_READ: u8 = 0;
/// Response to a read request.
pub const OP_READ_RSP: u8 = 1;
/// Write request.
pub const OP_WRITE: u8 = 2;
/// Response to a write request.
pub const OP_WRITE_RSP: u8 = 3;

/// Bits of the first header byte that carry the operation.
pub const OP_MASK: u8 = 0x07;

// ============================================================================
// Group IDs
// ============================================================================

/// Default/OS management.
pub const GROUP_OS: u16 = 0;
/// Image management.
pub const GROUP_IMAGE: u16 = 1;
/// Statistics.
pub const GROUP_STAT: u16 = 2;
/// Configuration.
pub const GROUP_CONFIG: u16 = 3;
/// Log.
pub const GROUP_LOG: u16 = 4;
/// Crash.
pub const GROUP_CRASH: u16 = 5;
/// Split image.
pub const GROUP_SPLIT: u16 = 6;
/// Run test.
pub const GROUP_RUN: u16 = 7;
/// File system.
pub const GROUP_FS: u16 = 8;
/// Shell.
pub const GROUP_SHELL: u16 = 9;

// ============================================================================
// OS Command IDs
// ============================================================================

/// Echo a string back.
pub const OS_ECHO: u8 = 0;
/// Enable/disable console echo.
pub const OS_CONSOLE_ECHO_CTRL: u8 = 1;
/// Task statistics.
pub const OS_TASK_STATS: u8 = 2;
/// Memory pool statistics.
pub const OS_MPSTATS: u8 = 3;
/// Date and time.
pub const OS_DATETIME: u8 = 4;
/// Reset the device.
pub const OS_RESET: u8 = 5;
/// Buffer parameters.
pub const OS_MCUMGR_PARAMS: u8 = 6;

// ============================================================================
// Image Command IDs
// ============================================================================

/// Read or set image state.
pub const IMAGE_STATE: u8 = 0;
/// Upload an image chunk.
pub const IMAGE_UPLOAD: u8 = 1;
/// Image file operations.
pub const IMAGE_FILE: u8 = 2;
/// Core list.
pub const IMAGE_CORELIST: u8 = 3;
/// Core load.
pub const IMAGE_CORELOAD: u8 = 4;
/// Erase the secondary slot.
pub const IMAGE_ERASE: u8 = 5;

// ============================================================================
// Return Codes
// ============================================================================

/// Success.
pub const RC_OK: u64 = 0;
/// Unknown error.
pub const RC_UNKNOWN: u64 = 1;
/// Out of memory.
pub const RC_NO_MEMORY: u64 = 2;
/// Invalid argument.
pub const RC_INVALID_VALUE: u64 = 3;
/// Operation timed out.
pub const RC_TIMEOUT: u64 = 4;
/// No such entry.
pub const RC_NO_ENTRY: u64 = 5;
/// Bad state for this operation.
pub const RC_BAD_STATE: u64 = 6;
/// Response too large.
pub const RC_MESSAGE_TOO_LARGE: u64 = 7;
/// Command not supported.
pub const RC_NOT_SUPPORTED: u64 = 8;
/// Corrupt data.
pub const RC_CORRUPT: u64 = 9;
/// Device busy.
pub const RC_BUSY: u64 = 10;

// ============================================================================
// Body Keys
// ============================================================================

/// Return code.
pub const KEY_RC: &str = "rc";
/// Upload offset.
pub const KEY_OFF: &str = "off";
/// Upload data.
pub const KEY_DATA: &str = "data";
/// Total upload length (first chunk only).
pub const KEY_LEN: &str = "len";
/// Upload image hash (first chunk only).
pub const KEY_SHA: &str = "sha";
/// Target image number.
pub const KEY_IMAGE: &str = "image";
/// Image hash for state changes.
pub const KEY_HASH: &str = "hash";
/// Confirm flag for state changes.
pub const KEY_CONFIRM: &str = "confirm";
/// Echo request string.
pub const KEY_ECHO_DATA: &str = "d";
/// Echo reply string.
pub const KEY_ECHO_REPLY: &str = "r";
/// Image state list.
pub const KEY_IMAGES: &str = "images";
/// Split image status.
pub const KEY_SPLIT_STATUS: &str = "splitStatus";
