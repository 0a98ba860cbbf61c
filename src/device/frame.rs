//! # Device Frame Codec
//!
//! JSON text frames exchanged with the sensor device (or the relay in front of
//! it). Every frame carries a `type` discriminator:
//!
//! - inbound `sensor`: `{"type":"sensor","readings":[...18 numbers]}`
//! - inbound `status`: `{"type":"status","message":"ESP connected"}`
//! - `command`: `{"type":"command","action":"read_sensor"}`, sent by this
//!   client and echoed by the relay to every other client
//!
//! Unknown fields (the firmware adds `temperature` and `timestamp`) are ignored.

use crate::constants::SENSOR_CHANNEL_COUNT;
use crate::error::ScanError;
use serde::{Deserialize, Serialize};

/// One reading per spectral channel, indexed 0..=17.
pub type Readings = [f64; SENSOR_CHANNEL_COUNT];

/// A parsed sensor frame. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    readings: Readings,
}

impl SensorFrame {
    pub fn new(readings: Readings) -> Self {
        SensorFrame { readings }
    }

    /// Builds a frame from a variable-length slice, rejecting anything but
    /// exactly [`SENSOR_CHANNEL_COUNT`] values.
    pub fn from_slice(values: &[f64]) -> Result<Self, ScanError> {
        let readings: Readings = values
            .try_into()
            .map_err(|_| ScanError::InvalidChannelCount {
                expected: SENSOR_CHANNEL_COUNT,
                actual: values.len(),
            })?;
        Ok(SensorFrame { readings })
    }

    pub fn readings(&self) -> &Readings {
        &self.readings
    }

    pub fn channel(&self, index: usize) -> Option<f64> {
        self.readings.get(index).copied()
    }
}

/// Actions the device understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    ReadSensor,
    DebugOn,
    DebugOff,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::ReadSensor => "read_sensor",
            CommandAction::DebugOn => "debug_on",
            CommandAction::DebugOff => "debug_off",
        }
    }
}

impl std::fmt::Display for CommandAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Spectral readings pushed by the device, solicited or not.
    Sensor(SensorFrame),
    /// Free-form device status text.
    Status(String),
    /// A command relayed from another client; informational only.
    Command { action: String },
}

impl InboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Sensor(_) => "sensor",
            InboundMessage::Status(_) => "status",
            InboundMessage::Command { .. } => "command",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireMessage {
    Sensor {
        readings: Vec<f64>,
    },
    Status {
        #[serde(default)]
        message: String,
    },
    Command {
        action: String,
    },
}

/// Parses one inbound text frame.
pub fn parse_frame(text: &str) -> Result<InboundMessage, ScanError> {
    let wire: WireMessage = serde_json::from_str(text)?;
    match wire {
        WireMessage::Sensor { readings } => {
            Ok(InboundMessage::Sensor(SensorFrame::from_slice(&readings)?))
        }
        WireMessage::Status { message } => Ok(InboundMessage::Status(message)),
        WireMessage::Command { action } => Ok(InboundMessage::Command { action }),
    }
}

/// Encodes an outbound command frame.
pub fn pack_command(action: CommandAction) -> String {
    let wire = WireMessage::Command {
        action: action.as_str().to_string(),
    };
    // A tagged enum of strings cannot fail to serialize.
    serde_json::to_string(&wire).unwrap_or_else(|_| {
        format!(r#"{{"type":"command","action":"{}"}}"#, action.as_str())
    })
}
