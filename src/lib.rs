//! # uvscan-rs - Skin Scan Client for the UV Exposure Dashboard
//!
//! The uvscan-rs crate drives an AS7265x spectral light sensor over its
//! WebSocket relay, runs the dashboard's "skin scan" workflow, and asks the
//! dashboard backend to turn the 18 raw channel readings into a skin type and
//! SPF recommendation.
//!
//! ## Features
//!
//! - Keep one persistent device socket, reconnecting every 3 seconds forever
//! - Run a scan: cosmetic countdown, immediate `read_sensor` command, 8 second watchdog
//! - Post readings to the classification endpoint and render the structured result
//! - Debug mode that logs every sensor frame channel by channel
//! - Read the current and historical UV index from the dashboard API
//! - Support for logging and error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use uvscan_rs::{ClientConfig, HttpClassifier, ScanClient, WsConnector};
//!
//! # async fn run() -> Result<(), uvscan_rs::ScanError> {
//! let config = ClientConfig::load(None)?;
//! let classifier = HttpClassifier::new(&config.classify_url, config.http_timeout())?;
//! let client = ScanClient::start(WsConnector, classifier, &config);
//!
//! let handle = client.handle();
//! handle.trigger_scan()?;
//! let view = handle.wait_for(|v| v.trigger_enabled).await?;
//! println!("{}", view.status);
//!
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod dashboard;
pub mod device;
pub mod error;
pub mod logging;
pub mod scan;
pub mod view;

pub use crate::error::ScanError;
pub use crate::logging::{init_logger, init_logger_with_level, log_info, log_warn};

pub use classifier::{
    ClassificationResponse, ClassificationResult, Classifier, ColorPreview, HttpClassifier, Rgb,
};
pub use config::ClientConfig;
pub use coordinator::{AppEvent, Coordinator, CoordinatorHandle, ScanClient, ScanTiming};
pub use dashboard::{CurrentUv, DashboardClient, UvCategory, UvSample};
pub use device::{
    CommandAction, ConnectionManager, ConnectionState, InboundMessage, SensorFrame, WsConnector,
};
pub use scan::{Mode, ScanPhase};
pub use view::{ResultPanel, ScanView};

/// Classify one set of readings against the backend at `url`.
///
/// # Arguments
/// * `url` - Classification endpoint
/// * `readings` - The 18 channel readings of one sensor frame
///
/// # Returns
/// * `Ok(ClassificationResponse)` - Backend answer, success or application error
/// * `Err(ScanError)` - Transport failure or non-success HTTP status
pub async fn classify(
    url: &str,
    readings: &device::Readings,
) -> Result<ClassificationResponse, ScanError> {
    let classifier = HttpClassifier::new(url, constants::HTTP_TIMEOUT)?;
    classifier.classify(readings).await
}

/// Start a scan client against a WebSocket device endpoint.
///
/// # Arguments
/// * `config` - Endpoints and timing
///
/// # Returns
/// * `Ok(ScanClient)` - Running client; the socket connects in the background
/// * `Err(ScanError)` - The HTTP client could not be built
pub fn connect(config: &ClientConfig) -> Result<ScanClient, ScanError> {
    let classifier = HttpClassifier::new(&config.classify_url, config.http_timeout())?;
    Ok(ScanClient::start(WsConnector, classifier, config))
}
