//! Hosted driver: runs an `SmpClient` on a tokio task.
//!
//! The task owns the client and serialises every input (received
//! fragments, fired timers and requests from handles) through one
//! `select!` loop, so the client never sees two inputs at once.

use mcuboot_image::ImageDescriptor;
use smp_protocol::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::SmpClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::{event_channel, ClientEvent};
use crate::timer::TokioScheduler;
use crate::transport::ChannelTransport;

/// Byte channels connecting the driver to a link.
#[derive(Debug)]
pub struct Connection {
    /// Encoded frames to write to the link.
    pub outgoing: mpsc::UnboundedSender<Vec<u8>>,
    /// Fragments read from the link, in arrival order.
    pub incoming: mpsc::UnboundedReceiver<Vec<u8>>,
}

enum Request {
    Send {
        command: Command,
        reply: oneshot::Sender<Result<u8>>,
    },
    Upload {
        image: Vec<u8>,
        slot: u64,
        reply: oneshot::Sender<Result<ImageDescriptor>>,
    },
    Connecting,
    Connected,
    Disconnected,
}

/// Cloneable handle to a running driver.
#[derive(Debug, Clone)]
pub struct SmpHandle {
    requests: mpsc::UnboundedSender<Request>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::Send { command, .. } => write!(f, "Send({:?})", command.group()),
            Request::Upload { image, slot, .. } => {
                write!(f, "Upload({} bytes, slot {})", image.len(), slot)
            }
            Request::Connecting => write!(f, "Connecting"),
            Request::Connected => write!(f, "Connected"),
            Request::Disconnected => write!(f, "Disconnected"),
        }
    }
}

impl SmpHandle {
    /// Send a command; resolves once it is on the link.
    pub async fn send(&self, command: Command) -> Result<u8> {
        let (reply, rx) = oneshot::channel();
        self.request(Request::Send { command, reply })?;
        rx.await.map_err(|_| ClientError::Closed)?
    }

    /// Start an upload; resolves once the first chunk is sent.
    ///
    /// Completion is reported as `ClientEvent::UploadFinished`.
    pub async fn upload(&self, image: Vec<u8>, slot: u64) -> Result<ImageDescriptor> {
        let (reply, rx) = oneshot::channel();
        self.request(Request::Upload { image, slot, reply })?;
        rx.await.map_err(|_| ClientError::Closed)?
    }

    /// Report that the link is connecting.
    pub fn connecting(&self) -> Result<()> {
        self.request(Request::Connecting)
    }

    /// Report that the link is up.
    pub fn connected(&self) -> Result<()> {
        self.request(Request::Connected)
    }

    /// Report that the link went away.
    pub fn disconnected(&self) -> Result<()> {
        self.request(Request::Disconnected)
    }

    fn request(&self, request: Request) -> Result<()> {
        self.requests.send(request).map_err(|_| ClientError::Closed)
    }
}

/// Spawn a driver task on the current tokio runtime.
///
/// The task runs until every `SmpHandle` is dropped.
pub fn spawn(
    config: ClientConfig,
    connection: Connection,
) -> Result<(SmpHandle, mpsc::UnboundedReceiver<ClientEvent>, JoinHandle<()>)> {
    let (events, events_rx) = event_channel();
    let (scheduler, timers) = TokioScheduler::new();
    let transport = ChannelTransport::from_sender(connection.outgoing);
    let client = SmpClient::new(&config, transport, scheduler, events)?;

    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(client, connection.incoming, timers, requests_rx));

    Ok((
        SmpHandle {
            requests: requests_tx,
        },
        events_rx,
        task,
    ))
}

async fn run(
    mut client: SmpClient<ChannelTransport, TokioScheduler>,
    mut incoming: mpsc::UnboundedReceiver<Vec<u8>>,
    mut timers: mpsc::UnboundedReceiver<crate::timer::TimerId>,
    mut requests: mpsc::UnboundedReceiver<Request>,
) {
    debug!("SmpClient: driver started");
    loop {
        tokio::select! {
            Some(fragment) = incoming.recv() => {
                if let Err(e) = client.on_fragment(&fragment) {
                    warn!("SmpClient: error handling received data: {}", e);
                }
            }
            Some(id) = timers.recv() => {
                if let Err(e) = client.on_timer(id) {
                    warn!("SmpClient: retry failed: {}", e);
                }
            }
            request = requests.recv() => {
                let Some(request) = request else { break };
                handle_request(&mut client, request);
            }
        }
    }
    debug!("SmpClient: driver stopped");
}

fn handle_request(client: &mut SmpClient<ChannelTransport, TokioScheduler>, request: Request) {
    match request {
        Request::Send { command, reply } => {
            let _ = reply.send(client.send(&command));
        }
        Request::Upload { image, slot, reply } => {
            let _ = reply.send(client.upload(image, slot));
        }
        Request::Connecting => client.connecting(),
        Request::Connected => client.connected(),
        Request::Disconnected => client.disconnected(),
    }
}
