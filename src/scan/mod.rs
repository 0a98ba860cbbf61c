//! The scan module contains the user-facing scan workflow: the sequencer
//! state machine and the Normal/Debug frame routing.

pub mod mode;
pub mod sequencer;

pub use mode::{render_debug_log, FrameRoute, Mode};
pub use sequencer::{ScanPhase, ScanSequencer, ScanSession, TriggerOutcome};
