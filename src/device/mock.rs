//! Mock device transport for testing
//!
//! This module provides an in-memory [`Connector`] that can be used to test
//! the connection manager and the coordinator without a real sensor.

use crate::device::transport::{Connector, DeviceLink};
use crate::error::ScanError;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

enum LinkInput {
    Text(String),
    Close,
}

#[derive(Default)]
struct MockState {
    /// When each connection attempt happened
    attempts: Vec<Instant>,
    /// Refuse new connections while set
    refuse: bool,
    /// Frames written by the client
    sent: Vec<String>,
    /// Feed for the currently open link
    current: Option<mpsc::UnboundedSender<LinkInput>>,
}

/// Mock connector that simulates a device socket.
///
/// Clones share state, so a test keeps one clone to drive the "device" while
/// the connection manager owns another.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent connection attempts fail.
    pub fn set_refuse(&self, refuse: bool) {
        self.state.lock().unwrap().refuse = refuse;
    }

    /// Pushes a text frame from the device. Returns false if no link is open.
    pub fn push_text(&self, text: &str) -> bool {
        let state = self.state.lock().unwrap();
        match &state.current {
            Some(tx) => tx.send(LinkInput::Text(text.to_string())).is_ok(),
            None => false,
        }
    }

    /// Simulates the device dropping the socket.
    pub fn close_link(&self) {
        if let Some(tx) = self.state.lock().unwrap().current.take() {
            let _ = tx.send(LinkInput::Close);
        }
    }

    /// Instants of every connection attempt so far.
    pub fn attempts(&self) -> Vec<Instant> {
        self.state.lock().unwrap().attempts.clone()
    }

    /// Frames the client has written.
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn is_link_open(&self) -> bool {
        self.state.lock().unwrap().current.is_some()
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn DeviceLink>, ScanError> {
        let mut state = self.state.lock().unwrap();
        state.attempts.push(Instant::now());
        if state.refuse {
            return Err(ScanError::ConnectionError(format!(
                "connection refused: {endpoint}"
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.current = Some(tx);
        Ok(Box::new(MockLink {
            rx,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockLink {
    rx: mpsc::UnboundedReceiver<LinkInput>,
    state: Arc<Mutex<MockState>>,
}

#[async_trait::async_trait]
impl DeviceLink for MockLink {
    async fn send_text(&mut self, text: String) -> Result<(), ScanError> {
        self.state.lock().unwrap().sent.push(text);
        Ok(())
    }

    async fn recv_text(&mut self) -> Option<Result<String, ScanError>> {
        match self.rx.recv().await {
            Some(LinkInput::Text(text)) => Some(Ok(text)),
            Some(LinkInput::Close) | None => None,
        }
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().current = None;
    }
}
