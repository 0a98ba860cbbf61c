//! Rendered scan screen state.
//!
//! `ScanView` is what the dashboard page would show: a status line, the
//! trigger button state, the result panel, the warning banner, the color
//! swatch and the debug log. The coordinator is its only writer.

use crate::classifier::{ClassificationResult, ColorPreview};
use crate::dashboard::UvCategory;
use crate::device::ConnectionState;
use crate::scan::Mode;

pub const STATUS_DISCONNECTED: &str = "Error: Sensor disconnected";
pub const STATUS_ANALYZING: &str = "Analyzing...";
pub const STATUS_COMPLETE: &str = "Scan Complete!";
pub const STATUS_SERVER_ERROR: &str = "Server Error";
pub const STATUS_WAITING: &str = "Waiting for sensor...";

/// Countdown status line for a stage.
pub fn countdown_status(stage: u8) -> String {
    if stage == 0 {
        STATUS_WAITING.to_string()
    } else {
        format!("Scanning... {stage}")
    }
}

/// Status line for a backend `status: error` answer.
pub fn processing_error_status(message: &str) -> String {
    format!("Error processing data: {message}")
}

/// Fields of a successful classification, formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPanel {
    pub skin_type: String,
    pub ita: String,
    pub spf: String,
    pub reapply: String,
    pub uv_tip: String,
    pub uv_category: UvCategory,
}

impl ResultPanel {
    pub fn from_result(result: &ClassificationResult) -> Self {
        ResultPanel {
            skin_type: result.skin_type.clone(),
            ita: format!("{}°", result.ita_score),
            spf: result.spf_recommendation.clone(),
            reapply: result.reapply_time.clone(),
            uv_tip: format!("Based on current UV: {}", result.uv_index),
            uv_category: UvCategory::from_index(Some(result.uv_index)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanView {
    pub status: String,
    pub trigger_enabled: bool,
    pub connection: ConnectionState,
    pub mode: Mode,
    pub result: Option<ResultPanel>,
    pub warning: Option<String>,
    pub preview: Option<ColorPreview>,
    pub debug_log: String,
    pub device_status: Option<String>,
}

impl Default for ScanView {
    fn default() -> Self {
        ScanView {
            status: String::new(),
            trigger_enabled: true,
            connection: ConnectionState::Disconnected,
            mode: Mode::Normal,
            result: None,
            warning: None,
            preview: None,
            debug_log: String::new(),
            device_status: None,
        }
    }
}

impl ScanView {
    /// Hides the result panel, banner and swatch.
    pub fn clear_result(&mut self) {
        self.result = None;
        self.warning = None;
        self.preview = None;
    }

    /// Shows a successful classification. The banner is replaced, never
    /// carried over: no warning in `result` means no banner.
    pub fn show_result(&mut self, result: &ClassificationResult, preview: ColorPreview) {
        self.status = STATUS_COMPLETE.to_string();
        self.result = Some(ResultPanel::from_result(result));
        self.warning = result.warning().map(str::to_string);
        self.preview = Some(preview);
    }
}
