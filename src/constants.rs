//! Scan Client Constants
//!
//! Timing and protocol constants observed on the dashboard and the AS7265x
//! sensor firmware.

use std::time::Duration;

/// Number of spectral channels in one sensor frame (AS72651/2/3 triad, 6 each)
pub const SENSOR_CHANNEL_COUNT: usize = 18;

/// Fixed delay between a socket close and the next connection attempt
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Watchdog window measured from the scan trigger
pub const SCAN_WATCHDOG: Duration = Duration::from_secs(8);

/// Interval between cosmetic countdown steps
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// First countdown stage shown on trigger
pub const COUNTDOWN_START: u8 = 3;

/// Timeout for backend HTTP round trips
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Multiplier applied to a raw channel for the color preview swatch
pub const PREVIEW_SCALE: f64 = 20.0;

/// Upper bound of one preview color component
pub const PREVIEW_MAX: f64 = 255.0;

/// Default device relay endpoint
pub const DEFAULT_DEVICE_URL: &str = "ws://localhost:8765";

/// Default classification endpoint
pub const DEFAULT_CLASSIFY_URL: &str = "http://localhost:8000/dashboard/calculate_spf/";

/// Default current UV reading endpoint
pub const DEFAULT_UV_CURRENT_URL: &str = "http://localhost:8000/dashboard/api/uv/";

/// Default UV history endpoint
pub const DEFAULT_UV_HISTORY_URL: &str = "http://localhost:8000/dashboard/api/uv/history/";
