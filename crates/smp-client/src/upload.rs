//! Chunked image upload with per-chunk retry.
//!
//! The engine sends one chunk at a time and waits for the device to
//! acknowledge it with the next offset it wants. Each send arms a retry
//! timer; if it fires before an acknowledgement arrives, the chunk at the
//! current offset is sent again. The upload never gives up on its own.

use std::time::{Duration, Instant};

use mcuboot_image::{ImageDescriptor, ImageHash};
use smp_protocol::{Command, UploadChunk, HEADER_SIZE};
use tracing::{debug, info, trace, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, UploadProgress};
use crate::outbound::Outbound;
use crate::timer::{Scheduler, TimerId};
use crate::transport::Transport;

/// State of one in-flight upload.
#[derive(Debug, Clone)]
pub struct UploadSession {
    image: Vec<u8>,
    descriptor: ImageDescriptor,
    slot: u64,
    offset: usize,
    retry_count: u32,
    started_at: Instant,
    last_chunk_at: Option<Instant>,
}

impl UploadSession {
    /// Next byte offset to send.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Image length in bytes.
    pub fn total_length(&self) -> usize {
        self.image.len()
    }

    /// Hash announced to the device in the first chunk.
    pub fn image_hash(&self) -> ImageHash {
        self.descriptor.computed_hash
    }

    /// Target image number.
    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Parsed image metadata.
    pub fn descriptor(&self) -> &ImageDescriptor {
        &self.descriptor
    }

    /// Number of chunks resent after a retry timeout.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// When the upload started.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// When the most recent chunk was sent.
    pub fn last_chunk_at(&self) -> Option<Instant> {
        self.last_chunk_at
    }

    fn is_complete(&self) -> bool {
        self.offset >= self.image.len()
    }

    /// Chunk for the current offset, without data.
    fn chunk_template(&self) -> UploadChunk {
        let first = self.offset == 0;
        UploadChunk {
            off: self.offset as u64,
            data: Vec::new(),
            len: first.then_some(self.image.len() as u64),
            sha: first.then(|| self.descriptor.computed_hash.to_vec()),
            image: (first && self.slot != 0).then_some(self.slot),
        }
    }
}

/// Drives at most one upload at a time.
#[derive(Debug)]
pub struct UploadEngine {
    mtu: usize,
    retry_timeout: Duration,
    session: Option<UploadSession>,
    retry_timer: Option<TimerId>,
}

/// Room left for image data once header and the rest of the body are counted.
fn chunk_budget(mtu: usize, chunk: &UploadChunk) -> Result<usize> {
    let overhead = chunk.encoded_overhead()?;
    Ok(mtu.saturating_sub(overhead + HEADER_SIZE))
}

impl UploadEngine {
    /// Idle engine sized by `config`.
    pub fn new(config: &ClientConfig) -> Self {
        UploadEngine {
            mtu: config.mtu,
            retry_timeout: config.retry_timeout(),
            session: None,
            retry_timer: None,
        }
    }

    /// The running upload, if any.
    pub fn session(&self) -> Option<&UploadSession> {
        self.session.as_ref()
    }

    /// Whether an upload is running.
    pub fn in_progress(&self) -> bool {
        self.session.is_some()
    }

    /// Currently armed retry timer.
    pub fn retry_timer(&self) -> Option<TimerId> {
        self.retry_timer
    }

    /// Validate `image` and send its first chunk.
    ///
    /// Parsing and MTU errors leave no session behind. A transport error on
    /// the first chunk is returned but the session stays and the retry timer
    /// remains armed.
    pub(crate) fn start<T: Transport, S: Scheduler>(
        &mut self,
        image: Vec<u8>,
        slot: u64,
        out: &mut Outbound<'_, T, S>,
    ) -> Result<ImageDescriptor> {
        if self.session.is_some() {
            return Err(ClientError::UploadAlreadyInProgress);
        }

        let descriptor = mcuboot_image::parse(&image)?;
        if !descriptor.hash_valid {
            warn!(
                "Upload: image hash TLV missing or mismatched (computed {})",
                descriptor.hash_hex()
            );
        }

        let session = UploadSession {
            image,
            descriptor: descriptor.clone(),
            slot,
            offset: 0,
            retry_count: 0,
            started_at: Instant::now(),
            last_chunk_at: None,
        };

        // The first chunk carries len/sha/image and has the least room.
        if session.total_length() > 0 && chunk_budget(self.mtu, &session.chunk_template())? == 0 {
            return Err(ClientError::MtuTooSmall { mtu: self.mtu });
        }

        info!(
            "Upload: starting {} bytes, version {}, slot {}, hash {}",
            session.total_length(),
            descriptor.version,
            slot,
            descriptor.hash_hex()
        );
        self.session = Some(session);
        self.send_next_chunk(out)?;
        Ok(descriptor)
    }

    /// Handle an acknowledgement carrying the device's next wanted offset.
    pub(crate) fn on_ack<T: Transport, S: Scheduler>(
        &mut self,
        off: u64,
        out: &mut Outbound<'_, T, S>,
    ) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            debug!("Upload: ack off={} with no upload in progress, dropping", off);
            return Ok(());
        };

        let total = session.total_length();
        let off = match usize::try_from(off) {
            Ok(off) if off >= session.offset && off <= total => off,
            _ => {
                warn!(
                    "Upload: dropping ack off={} outside {}..={}",
                    off, session.offset, total
                );
                return Ok(());
            }
        };

        trace!("Upload: ack off={}/{}", off, total);
        session.offset = off;
        self.cancel_retry(out.scheduler);
        self.send_next_chunk(out)
    }

    /// Handle a fired timer. Ids other than the armed retry timer are stale.
    pub(crate) fn on_timer<T: Transport, S: Scheduler>(
        &mut self,
        id: TimerId,
        out: &mut Outbound<'_, T, S>,
    ) -> Result<()> {
        if self.retry_timer != Some(id) {
            trace!("Upload: ignoring stale timer {:?}", id);
            return Ok(());
        }
        self.retry_timer = None;

        if let Some(session) = self.session.as_mut() {
            session.retry_count += 1;
            warn!(
                "Upload: no ack for chunk at offset {} within {:?}, resending (retry {})",
                session.offset, self.retry_timeout, session.retry_count
            );
        }
        self.send_next_chunk(out)
    }

    /// Send the chunk at the current offset, or finish the upload.
    fn send_next_chunk<T: Transport, S: Scheduler>(
        &mut self,
        out: &mut Outbound<'_, T, S>,
    ) -> Result<()> {
        let complete = match &self.session {
            Some(session) => session.is_complete(),
            None => return Ok(()),
        };

        self.cancel_retry(out.scheduler);

        if complete {
            if let Some(session) = self.session.take() {
                info!(
                    "Upload: finished {} bytes in {:?} with {} retries",
                    session.total_length(),
                    session.started_at.elapsed(),
                    session.retry_count
                );
                out.events.emit(ClientEvent::UploadFinished {
                    image_hash: session.image_hash(),
                });
            }
            return Ok(());
        }

        self.retry_timer = Some(out.scheduler.schedule(self.retry_timeout));

        let mtu = self.mtu;
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let mut chunk = session.chunk_template();
        let budget = chunk_budget(mtu, &chunk)?;
        if budget == 0 {
            return Err(ClientError::MtuTooSmall { mtu });
        }
        let end = session.offset.saturating_add(budget).min(session.total_length());
        chunk.data = session.image[session.offset..end].to_vec();

        out.events.emit(ClientEvent::UploadProgress(UploadProgress::new(
            session.offset,
            session.total_length(),
        )));
        session.last_chunk_at = Some(Instant::now());

        debug!(
            "Upload: chunk off={} len={} ({}/{})",
            session.offset,
            chunk.data.len(),
            end,
            session.total_length()
        );
        out.send(&Command::UploadChunk(chunk))?;
        Ok(())
    }

    fn cancel_retry<S: Scheduler>(&mut self, scheduler: &mut S) {
        if let Some(id) = self.retry_timer.take() {
            scheduler.cancel(id);
        }
    }
}
