//! # Scan Sequencer
//!
//! Pure state machine for one user-triggered skin scan. It holds no timers of
//! its own: the coordinator schedules countdown ticks and the watchdog and
//! feeds their firings back in, tagged with the session id they were armed
//! for. Firings whose id no longer matches the active session are ignored,
//! which is the only cancellation mechanism needed.
//!
//! ```text
//! Idle ─trigger─> Countdown(3) ─tick─> Countdown(2) ─tick─> Countdown(1) ─tick─> AwaitingData
//!                   │  (read command already sent at trigger time)               │
//!                   └──────────────── sensor frame ─> Classifying ─finish─> Idle ◄┘ watchdog
//! ```

use crate::constants::COUNTDOWN_START;
use log::debug;
use std::time::Duration;
use tokio::time::Instant;

/// Externally visible phase of the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Countdown(u8),
    AwaitingData,
    Classifying,
}

/// The one in-flight scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSession {
    pub id: u64,
    pub armed_at: Instant,
    pub countdown: u8,
    pub awaiting_data: bool,
    pub deadline: Instant,
}

/// Result of a trigger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new session was armed.
    Started(ScanSession),
    /// A session is already active; nothing happened.
    Busy,
    /// The device socket is not open; no session was created.
    Disconnected,
}

/// Scan state machine.
#[derive(Debug)]
pub struct ScanSequencer {
    session: Option<ScanSession>,
    next_id: u64,
    generation: u64,
    watchdog: Duration,
}

impl ScanSequencer {
    pub fn new(watchdog: Duration) -> Self {
        ScanSequencer {
            session: None,
            next_id: 1,
            generation: 0,
            watchdog,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        match &self.session {
            None => ScanPhase::Idle,
            Some(s) if !s.awaiting_data => ScanPhase::Classifying,
            Some(s) if s.countdown > 0 => ScanPhase::Countdown(s.countdown),
            Some(_) => ScanPhase::AwaitingData,
        }
    }

    pub fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    pub fn active_id(&self) -> Option<u64> {
        self.session.map(|s| s.id)
    }

    /// The trigger is usable exactly when no session is active.
    pub fn trigger_enabled(&self) -> bool {
        self.session.is_none()
    }

    /// Arms a new session. The session exists (and the trigger is disabled)
    /// before this returns, so the caller can only start asynchronous work
    /// after mutual exclusion is in place.
    pub fn trigger(&mut self, now: Instant, connected: bool) -> TriggerOutcome {
        if self.session.is_some() {
            return TriggerOutcome::Busy;
        }
        self.generation += 1;
        if !connected {
            return TriggerOutcome::Disconnected;
        }

        let session = ScanSession {
            id: self.next_id,
            armed_at: now,
            countdown: COUNTDOWN_START,
            awaiting_data: true,
            deadline: now + self.watchdog,
        };
        self.next_id += 1;
        self.session = Some(session);
        debug!("Scan {} armed", session.id);
        TriggerOutcome::Started(session)
    }

    /// Counts accepted trigger presses, connected or not. Work dispatched
    /// outside a session is stale once this moves on.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops a session whose read command could not be sent.
    pub fn cancel(&mut self, id: u64) -> bool {
        self.end_if(id, "cancelled")
    }

    /// Advances the cosmetic countdown. Returns the new stage while the
    /// session is still waiting for data, `None` for stale or late ticks.
    pub fn tick(&mut self, id: u64) -> Option<u8> {
        let session = self.session.as_mut().filter(|s| s.id == id)?;
        if !session.awaiting_data || session.countdown == 0 {
            return None;
        }
        session.countdown -= 1;
        Some(session.countdown)
    }

    /// Latches an incoming sensor frame onto the active session. Returns the
    /// session id if the frame completes the wait; `None` means the frame is
    /// unsolicited as far as the sequencer is concerned.
    pub fn accept_frame(&mut self) -> Option<u64> {
        let session = self.session.as_mut().filter(|s| s.awaiting_data)?;
        session.awaiting_data = false;
        session.countdown = 0;
        debug!("Scan {} received sensor data", session.id);
        Some(session.id)
    }

    /// Ends the session once its classification round trip finished.
    pub fn finish(&mut self, id: u64) -> bool {
        self.end_if(id, "finished")
    }

    /// Ends the session when its watchdog fires.
    pub fn expire(&mut self, id: u64) -> bool {
        self.end_if(id, "timed out")
    }

    fn end_if(&mut self, id: u64, why: &str) -> bool {
        if self.active_id() == Some(id) {
            self.session = None;
            debug!("Scan {id} {why}");
            true
        } else {
            false
        }
    }
}
