//! # WebSocket Transport
//!
//! Production [`Connector`] backed by `tokio-tungstenite`. Only text frames
//! are surfaced; ping/pong and binary frames are skipped, and a close frame
//! ends the link.

use crate::device::transport::{Connector, DeviceLink};
use crate::error::ScanError;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Connects to `ws://` / `wss://` endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait::async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn DeviceLink>, ScanError> {
        let (stream, response) = connect_async(endpoint).await?;
        log::debug!("WebSocket handshake with {endpoint}: {}", response.status());
        Ok(Box::new(WsLink { stream }))
    }
}

struct WsLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait::async_trait]
impl DeviceLink for WsLink {
    async fn send_text(&mut self, text: String) -> Result<(), ScanError> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn recv_text(&mut self) -> Option<Result<String, ScanError>> {
        while let Some(msg) = self.stream.next().await {
            match msg {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(frame)) => {
                    log::debug!("Device closed the socket: {frame:?}");
                    return None;
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            log::debug!("Ignoring error while closing socket: {e}");
        }
    }
}
