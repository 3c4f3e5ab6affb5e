//! SMP Management Protocol
//!
//! This crate provides types and utilities for talking to devices that run
//! an MCU manager (SMP) server. The protocol carries request/response frames
//! over any byte transport.
//!
//! # Protocol Overview
//!
//! Each frame is an 8-byte big-endian header followed by a CBOR map:
//!
//! - **Requests** (host → device): `Read` or `Write` operations
//! - **Responses** (device → host): `ReadResponse` or `WriteResponse`, usually
//!   carrying an `rc` return code
//!
//! Commands are addressed by a group ID (OS, Image, ...) and a command ID
//! scoped to that group. The sequence number is carried for wire
//! compatibility only; responses are not correlated by it.
//!
//! # Example
//!
//! ```rust,ignore
//! use smp_protocol::{Command, FrameCodec, Response};
//!
//! // Build a command
//! let bytes = Command::ImageState.encode(seq)?;
//!
//! // Reassemble and parse responses
//! let mut codec = FrameCodec::new();
//! for frame in codec.feed(&received_fragment) {
//!     let response = Response::decode(&frame?)?;
//! }
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod responses;
mod types;
pub mod value;

pub use ciborium::value::Value;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use responses::*;
pub use types::*;
