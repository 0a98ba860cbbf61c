use log::{debug, info, log_enabled, warn, Level};
use std::time::{Duration, Instant};

/// Initializes the logger with the `env_logger` crate.
///
/// The level comes from `RUST_LOG`; without it only warnings and errors are shown.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

/// Initializes the logger with an explicit default level, still overridable
/// through `RUST_LOG`. Safe to call more than once (later calls are ignored).
pub fn init_logger_with_level(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

/// Logs a warning message.
pub fn log_warn(message: &str) {
    if log_enabled!(Level::Warn) {
        warn!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

/// Throttling structure for rate-limiting log messages
///
/// A misbehaving device can push malformed frames many times per second;
/// the connection manager routes its protocol warnings through one of these.
#[derive(Debug)]
pub struct LogThrottle {
    window: Duration,
    cap: u32,
    count: u32,
    suppressed: u32,
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle allowing `cap` messages per `window`
    pub fn new(window: Duration, cap: u32) -> Self {
        Self {
            window,
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    pub fn allow(&mut self) -> bool {
        self.allow_at(Instant::now())
    }

    fn allow_at(&mut self, now: Instant) -> bool {
        if now.duration_since(self.t0) > self.window {
            if self.suppressed > 0 {
                debug!("{} log messages suppressed in last window", self.suppressed);
            }
            self.t0 = now;
            self.count = 0;
            self.suppressed = 0;
        }

        self.count += 1;
        let allowed = self.count <= self.cap;
        if !allowed {
            self.suppressed += 1;
        }
        allowed
    }

    /// Number of messages dropped in the current window
    pub fn suppressed(&self) -> u32 {
        self.suppressed
    }
}
