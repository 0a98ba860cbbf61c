//! The device module contains the sensor-side plumbing: the JSON frame codec,
//! the transport seam with its WebSocket and mock implementations, and the
//! reconnecting connection manager.

pub mod connection;
pub mod frame;
pub mod mock;
pub mod transport;
pub mod websocket;

pub use connection::{
    CommandPort, CommandSender, ConnectionConfig, ConnectionHandle, ConnectionManager,
    ConnectionState, DeviceEvent,
};
pub use frame::{pack_command, parse_frame, CommandAction, InboundMessage, Readings, SensorFrame};
pub use transport::{Connector, DeviceLink};
pub use websocket::WsConnector;
