//! # Device Connection Manager
//!
//! Owns the single persistent socket to the sensor device. The manager runs
//! as one background task:
//!
//! ```text
//! Connecting ──ok──> Open ──closed/error──> ClosedPendingRetry ──delay──> Connecting
//!      └──────────────failed─────────────────────┘
//! ```
//!
//! There is no retry cap and no backoff growth; every attempt is followed by
//! the same fixed delay, so two attempts are never closer than one interval.
//! Parsed inbound frames are posted, in arrival order, on the event channel
//! given to [`ConnectionManager::spawn`].

use crate::device::frame::{pack_command, parse_frame, CommandAction, InboundMessage};
use crate::device::transport::{Connector, DeviceLink};
use crate::error::ScanError;
use crate::logging::LogThrottle;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Lifecycle of the device socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    ClosedPendingRetry,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

/// Events published by the manager task.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    StateChanged(ConnectionState),
    Message(InboundMessage),
}

/// Fire-and-forget command path to the device.
pub trait CommandSender: Send + Sync {
    /// Hands a command to the socket. Fails with [`ScanError::NotConnected`]
    /// unless the socket is open; nothing is queued for later.
    fn send(&self, action: CommandAction) -> Result<(), ScanError>;
}

/// Configuration for the manager task.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub endpoint: String,
    pub retry_delay: Duration,
}

/// Entry point for spawning the manager task.
pub struct ConnectionManager;

impl ConnectionManager {
    /// Spawns the manager task and returns a handle to it.
    ///
    /// `events` receives every state change and every parsed frame; it can be
    /// any channel whose item type converts from [`DeviceEvent`].
    pub fn spawn<C, E>(
        connector: C,
        config: ConnectionConfig,
        events: mpsc::UnboundedSender<E>,
    ) -> ConnectionHandle
    where
        C: Connector,
        E: From<DeviceEvent> + Send + 'static,
    {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();

        let worker = Worker {
            connector,
            config,
            events,
            outbound: outbound_rx,
            state: state_tx,
            cancel: cancel.clone(),
            parse_warnings: LogThrottle::new(Duration::from_secs(10), 5),
        };
        let task = tokio::spawn(worker.run());

        ConnectionHandle {
            port: CommandPort {
                outbound: outbound_tx,
                state: state_rx,
            },
            cancel,
            task,
        }
    }
}

/// Cloneable command path into a running connection manager.
#[derive(Clone)]
pub struct CommandPort {
    outbound: mpsc::UnboundedSender<CommandAction>,
    state: watch::Receiver<ConnectionState>,
}

impl CommandPort {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }
}

impl CommandSender for CommandPort {
    fn send(&self, action: CommandAction) -> Result<(), ScanError> {
        if !self.is_open() {
            debug!("Dropping {action}: socket not open");
            return Err(ScanError::NotConnected);
        }
        self.outbound
            .send(action)
            .map_err(|_| ScanError::NotConnected)
    }
}

/// Handle to a running connection manager.
pub struct ConnectionHandle {
    port: CommandPort,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    pub fn state(&self) -> ConnectionState {
        self.port.state()
    }

    pub fn is_open(&self) -> bool {
        self.port.is_open()
    }

    /// A cloneable sender for commands.
    pub fn commands(&self) -> CommandPort {
        self.port.clone()
    }

    /// Watch the connection state.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.port.state.clone()
    }

    /// Stops the manager and closes the socket.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("Connection task ended abnormally: {e}");
        }
    }
}

impl CommandSender for ConnectionHandle {
    fn send(&self, action: CommandAction) -> Result<(), ScanError> {
        self.port.send(action)
    }
}

struct Worker<C, E> {
    connector: C,
    config: ConnectionConfig,
    events: mpsc::UnboundedSender<E>,
    outbound: mpsc::UnboundedReceiver<CommandAction>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    parse_warnings: LogThrottle,
}

/// Why a link session ended.
enum LinkEnd {
    Lost,
    Shutdown,
}

impl<C, E> Worker<C, E>
where
    C: Connector,
    E: From<DeviceEvent> + Send + 'static,
{
    async fn run(mut self) {
        loop {
            self.publish(ConnectionState::Connecting);

            let attempt = tokio::select! {
                _ = self.cancel.cancelled() => break,
                attempt = self.connector.connect(&self.config.endpoint) => attempt,
            };

            match attempt {
                Ok(link) => {
                    info!("Device socket connected: {}", self.config.endpoint);
                    self.publish(ConnectionState::Open);
                    if let LinkEnd::Shutdown = self.serve(link).await {
                        break;
                    }
                }
                Err(e) => warn!("Device connection failed: {e}"),
            }

            self.publish(ConnectionState::ClosedPendingRetry);
            info!(
                "Device socket disconnected, reconnecting in {:?}",
                self.config.retry_delay
            );

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.retry_delay) => {}
            }
        }

        self.publish(ConnectionState::Disconnected);
        debug!("Connection manager stopped");
    }

    async fn serve(&mut self, mut link: Box<dyn DeviceLink>) -> LinkEnd {
        // Anything accepted before the previous link died is stale now.
        while let Ok(action) = self.outbound.try_recv() {
            debug!("Discarding {action} queued before reconnect");
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    link.close().await;
                    return LinkEnd::Shutdown;
                }
                inbound = link.recv_text() => match inbound {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(e)) => {
                        warn!("Device socket error: {e}");
                        return LinkEnd::Lost;
                    }
                    None => return LinkEnd::Lost,
                },
                Some(action) = self.outbound.recv() => {
                    if let Err(e) = link.send_text(pack_command(action)).await {
                        warn!("Failed to send {action}: {e}");
                        return LinkEnd::Lost;
                    }
                    debug!("Sent command {action}");
                }
            }
        }
    }

    fn dispatch(&mut self, text: &str) {
        match parse_frame(text) {
            Ok(message) => {
                debug!("Received {} frame", message.kind());
                let _ = self.events.send(DeviceEvent::Message(message).into());
            }
            Err(e) => {
                if self.parse_warnings.allow() {
                    warn!("Dropping malformed device frame: {e}");
                }
            }
        }
    }

    fn publish(&self, state: ConnectionState) {
        self.state.send_replace(state);
        let _ = self.events.send(DeviceEvent::StateChanged(state).into());
    }
}
