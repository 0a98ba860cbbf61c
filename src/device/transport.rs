//! Transport seam for the device socket
//!
//! The connection manager only talks to these traits, so the same reconnect
//! loop runs over a real WebSocket or over the in-memory mock.

use crate::error::ScanError;

/// An open, bidirectional text-frame link to the device.
#[async_trait::async_trait]
pub trait DeviceLink: Send {
    /// Sends one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), ScanError>;

    /// Waits for the next text frame. `None` means the peer closed the link.
    ///
    /// Must be cancel-safe: it is raced against outbound commands.
    async fn recv_text(&mut self) -> Option<Result<String, ScanError>>;

    /// Closes the link. Errors are not interesting at this point.
    async fn close(&mut self);
}

/// Opens links to an endpoint.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn DeviceLink>, ScanError>;
}
