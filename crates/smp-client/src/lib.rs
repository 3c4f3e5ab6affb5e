//! SMP client
//!
//! Talks to an SMP (MCU manager) server over any byte transport: sends
//! commands, reassembles responses from fragments, and uploads MCUboot
//! images in MTU-sized chunks with a per-chunk retry timer.
//!
//! The core is [`SmpClient`], a synchronous state machine parameterised
//! over a [`Transport`] and a [`Scheduler`]. [`runtime::spawn`] hosts it on
//! a tokio task for applications that do not want to drive it themselves.
//!
//! ```rust,ignore
//! let (handle, mut events, _task) = smp_client::runtime::spawn(config, connection)?;
//! handle.connected()?;
//! handle.upload(std::fs::read("app.signed.bin")?, 0).await?;
//! while let Some(event) = events.recv().await {
//!     if let ClientEvent::UploadFinished { .. } = event {
//!         break;
//!     }
//! }
//! ```

mod client;
mod config;
mod error;
mod events;
mod outbound;
pub mod runtime;
#[cfg(test)]
mod testing;
mod timer;
mod transport;
mod upload;

pub use client::SmpClient;
pub use config::{ClientConfig, DEFAULT_MTU, DEFAULT_RETRY_TIMEOUT_MS};
pub use error::{ClientError, ConfigError, Result};
pub use events::{event_channel, ClientEvent, EventSender, UploadProgress};
pub use timer::{Scheduler, TimerId, TokioScheduler};
pub use transport::{ChannelTransport, Transport, TransportError};
pub use upload::UploadSession;
