//! Normal/Debug routing of incoming sensor frames.
//!
//! Debug mode renders every sensor frame as a per-channel diagnostic log and
//! still sends it through classification; Normal mode only classifies.
//! Switching modes never touches the scan session.

use crate::device::frame::{CommandAction, SensorFrame};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Debug,
}

impl Mode {
    /// Device command announcing a switch into this mode.
    pub fn command(&self) -> CommandAction {
        match self {
            Mode::Normal => CommandAction::DebugOff,
            Mode::Debug => CommandAction::DebugOn,
        }
    }

    /// Where a sensor frame goes while this mode is active.
    pub fn route(&self) -> FrameRoute {
        FrameRoute {
            debug_log: matches!(self, Mode::Debug),
            classify: true,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => f.write_str("normal"),
            Mode::Debug => f.write_str("debug"),
        }
    }
}

/// Destinations for one sensor frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRoute {
    pub debug_log: bool,
    pub classify: bool,
}

/// Renders a frame as `Ch1: 0.123456` lines, one per channel.
pub fn render_debug_log(frame: &SensorFrame) -> String {
    frame
        .readings()
        .iter()
        .enumerate()
        .map(|(i, value)| format!("Ch{}: {value:.6}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
