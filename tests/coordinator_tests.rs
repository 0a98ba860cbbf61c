//! Coordinator behaviour driven event by event on a paused clock.
//!
//! Each test owns the coordinator and its event receiver; `pump` waits for the
//! next posted completion (timer, watchdog or classification) and handles it,
//! so the order of events is exactly the order they would reach the real loop.

mod mock_support;

use mock_support::{readings, type_iii, RecordingSender, ScriptedClassifier};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uvscan_rs::classifier::{ClassificationResponse, Rgb};
use uvscan_rs::coordinator::{AppEvent, Coordinator, ScanTiming};
use uvscan_rs::device::{CommandAction, ConnectionState, DeviceEvent, InboundMessage, SensorFrame};
use uvscan_rs::scan::{Mode, ScanPhase};
use uvscan_rs::view::{
    STATUS_ANALYZING, STATUS_COMPLETE, STATUS_DISCONNECTED, STATUS_SERVER_ERROR,
};
use uvscan_rs::ScanError;

struct Harness {
    coordinator: Coordinator,
    rx: mpsc::UnboundedReceiver<AppEvent>,
    sender: Arc<RecordingSender>,
    classifier: Arc<ScriptedClassifier>,
}

impl Harness {
    fn new(sender: Arc<RecordingSender>, classifier: Arc<ScriptedClassifier>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = Coordinator::new(
            sender.clone(),
            classifier.clone(),
            ScanTiming {
                countdown_tick: Duration::from_secs(1),
                watchdog: Duration::from_secs(8),
            },
            tx,
        );
        Harness {
            coordinator,
            rx,
            sender,
            classifier,
        }
    }

    fn connected(classifier: Arc<ScriptedClassifier>) -> Self {
        let mut harness = Self::new(RecordingSender::open(), classifier);
        harness.send(AppEvent::Device(DeviceEvent::StateChanged(
            ConnectionState::Open,
        )));
        harness
    }

    fn send(&mut self, event: AppEvent) {
        assert!(self.coordinator.handle(event));
    }

    fn frame(&mut self, value: f64) {
        self.send(AppEvent::Device(DeviceEvent::Message(InboundMessage::Sensor(
            SensorFrame::new(readings(value)),
        ))));
    }

    /// Handles the next posted completion and returns a short tag for it.
    async fn pump(&mut self) -> &'static str {
        let event = self.rx.recv().await.expect("coordinator sender dropped");
        let tag = match &event {
            AppEvent::CountdownTick { .. } => "tick",
            AppEvent::WatchdogExpired { .. } => "watchdog",
            AppEvent::Classified { .. } => "classified",
            _ => "other",
        };
        self.send(event);
        tag
    }

    fn read_commands(&self) -> usize {
        self.sender
            .sent()
            .iter()
            .filter(|a| **a == CommandAction::ReadSensor)
            .count()
    }
}

#[tokio::test(start_paused = true)]
async fn test_scan_end_to_end_renders_backend_fields() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![Ok(type_iii(None))]));

    h.send(AppEvent::TriggerScan);
    assert_eq!(h.sender.sent(), vec![CommandAction::ReadSensor]);
    assert_eq!(h.coordinator.view().status, "Scanning... 3");
    assert!(!h.coordinator.view().trigger_enabled);

    assert_eq!(h.pump().await, "tick");
    assert_eq!(h.coordinator.view().status, "Scanning... 2");

    // Device answers within 2 seconds.
    h.frame(0.8);
    assert_eq!(h.coordinator.view().status, STATUS_ANALYZING);
    assert_eq!(h.coordinator.state().scan.phase(), ScanPhase::Classifying);

    assert_eq!(h.pump().await, "classified");
    let view = h.coordinator.view().clone();
    assert_eq!(view.status, STATUS_COMPLETE);
    assert!(view.trigger_enabled);
    assert_eq!(view.warning, None);
    let panel = view.result.expect("result panel");
    assert_eq!(panel.skin_type, "Type III");
    assert_eq!(panel.ita, "30.5°");
    assert_eq!(panel.spf, "SPF 30-50");
    assert_eq!(panel.reapply, "Every 90-120 min");
    assert_eq!(panel.uv_tip, "Based on current UV: 6.2");
    assert_eq!(view.preview.unwrap().color, Rgb::new(16, 16, 16));

    // Leftover countdown ticks and the watchdog belong to a finished scan.
    for _ in 0..3 {
        h.pump().await;
    }
    assert_eq!(h.coordinator.view().status, STATUS_COMPLETE);
    assert!(h.coordinator.view().trigger_enabled);
    assert_eq!(h.classifier.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_trigger_during_scan_sends_nothing() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![]));
    h.send(AppEvent::TriggerScan);
    h.send(AppEvent::TriggerScan);
    h.send(AppEvent::TriggerScan);
    assert_eq!(h.read_commands(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_returns_to_idle_without_result() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![]));
    h.send(AppEvent::TriggerScan);

    let tags = [h.pump().await, h.pump().await, h.pump().await, h.pump().await];
    assert_eq!(tags, ["tick", "tick", "tick", "watchdog"]);

    let view = h.coordinator.view();
    assert!(view.trigger_enabled);
    assert!(view.status.is_empty());
    assert!(view.result.is_none());
    assert_eq!(h.coordinator.state().scan.phase(), ScanPhase::Idle);
    assert_eq!(h.classifier.call_count(), 0);

    // And the user can try again.
    h.send(AppEvent::TriggerScan);
    assert_eq!(h.read_commands(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_reaches_waiting_status() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![]));
    h.send(AppEvent::TriggerScan);
    for _ in 0..3 {
        h.pump().await;
    }
    assert_eq!(h.coordinator.view().status, "Waiting for sensor...");
    assert_eq!(h.coordinator.state().scan.phase(), ScanPhase::AwaitingData);
}

#[tokio::test(start_paused = true)]
async fn test_trigger_while_disconnected_reports_error() {
    let mut h = Harness::new(RecordingSender::closed(), ScriptedClassifier::new(vec![]));
    h.send(AppEvent::TriggerScan);

    let view = h.coordinator.view();
    assert_eq!(view.status, STATUS_DISCONNECTED);
    assert!(view.trigger_enabled);
    assert!(h.sender.sent().is_empty());
    assert_eq!(h.coordinator.state().scan.phase(), ScanPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_send_failure_after_open_releases_trigger() {
    let sender = RecordingSender::closed();
    let mut h = Harness::new(sender, ScriptedClassifier::new(vec![]));
    // The mirror says open, but the socket went away before the send.
    h.send(AppEvent::Device(DeviceEvent::StateChanged(ConnectionState::Open)));
    h.send(AppEvent::TriggerScan);

    assert_eq!(h.coordinator.view().status, STATUS_DISCONNECTED);
    assert!(h.coordinator.view().trigger_enabled);
    assert_eq!(h.coordinator.state().scan.phase(), ScanPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_backend_error_message_and_fallback() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![
        Ok(ClassificationResponse::Error {
            message: Some("Invalid data".into()),
        }),
        Ok(ClassificationResponse::Error { message: None }),
    ]));

    h.send(AppEvent::TriggerScan);
    h.frame(1.0);
    assert_eq!(h.pump().await, "classified");
    assert_eq!(
        h.coordinator.view().status,
        "Error processing data: Invalid data"
    );
    assert!(h.coordinator.view().trigger_enabled);
    assert!(h.coordinator.view().result.is_none());

    h.send(AppEvent::TriggerScan);
    h.frame(1.0);
    // Drain ticks from the first scan until the classification lands.
    while h.pump().await != "classified" {}
    assert_eq!(h.coordinator.view().status, "Error processing data: Unknown");
    assert!(h.coordinator.view().trigger_enabled);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_shows_server_error() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![Err(ScanError::ServerStatus(
        500,
    ))]));
    h.send(AppEvent::TriggerScan);
    h.frame(1.0);
    assert_eq!(h.pump().await, "classified");
    assert_eq!(h.coordinator.view().status, STATUS_SERVER_ERROR);
    assert!(h.coordinator.view().trigger_enabled);
}

#[tokio::test(start_paused = true)]
async fn test_late_classification_after_watchdog_is_dropped() {
    let classifier =
        ScriptedClassifier::with_delay(vec![Ok(type_iii(None))], Duration::from_secs(10));
    let mut h = Harness::connected(classifier);

    h.send(AppEvent::TriggerScan);
    h.frame(1.0);
    assert_eq!(h.coordinator.view().status, STATUS_ANALYZING);

    let tags = [h.pump().await, h.pump().await, h.pump().await, h.pump().await];
    assert_eq!(tags, ["tick", "tick", "tick", "watchdog"]);
    assert!(h.coordinator.view().trigger_enabled);
    assert!(h.coordinator.view().status.is_empty());

    assert_eq!(h.pump().await, "classified");
    let view = h.coordinator.view();
    assert!(view.trigger_enabled);
    assert!(view.result.is_none());
    assert!(view.status.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_warning_clears_previous_banner() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![
        Ok(type_iii(Some("EXTREME UV: avoid sun exposure"))),
        Ok(type_iii(None)),
    ]));

    // Unsolicited frames: no trigger in between to reset the view.
    h.frame(2.0);
    assert_eq!(h.pump().await, "classified");
    assert_eq!(
        h.coordinator.view().warning.as_deref(),
        Some("EXTREME UV: avoid sun exposure")
    );

    h.frame(2.0);
    assert_eq!(h.pump().await, "classified");
    assert_eq!(h.coordinator.view().warning, None);
    assert!(h.coordinator.view().result.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_trigger_clears_previous_result() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![Ok(type_iii(Some(
        "Seek shade",
    )))]));
    h.frame(2.0);
    h.pump().await;
    assert!(h.coordinator.view().result.is_some());

    h.send(AppEvent::TriggerScan);
    let view = h.coordinator.view();
    assert!(view.result.is_none());
    assert!(view.warning.is_none());
    assert!(view.preview.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_trigger_clears_previous_result() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![Ok(type_iii(Some(
        "EXTREME UV: avoid sun exposure",
    )))]));
    h.frame(2.0);
    assert_eq!(h.pump().await, "classified");
    assert!(h.coordinator.view().warning.is_some());

    h.sender.open.store(false, Ordering::SeqCst);
    h.send(AppEvent::Device(DeviceEvent::StateChanged(
        ConnectionState::ClosedPendingRetry,
    )));
    h.send(AppEvent::TriggerScan);

    let view = h.coordinator.view();
    assert_eq!(view.status, STATUS_DISCONNECTED);
    assert!(view.warning.is_none());
    assert!(view.result.is_none());
    assert!(view.preview.is_none());
    assert!(view.trigger_enabled);
}

#[tokio::test(start_paused = true)]
async fn test_failed_read_command_clears_previous_result() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![Ok(type_iii(Some(
        "Seek shade",
    )))]));
    h.frame(2.0);
    assert_eq!(h.pump().await, "classified");

    // Socket gone before the connection state caught up.
    h.sender.open.store(false, Ordering::SeqCst);
    h.send(AppEvent::TriggerScan);

    let view = h.coordinator.view();
    assert_eq!(view.status, STATUS_DISCONNECTED);
    assert!(view.warning.is_none());
    assert!(view.result.is_none());
    assert!(view.trigger_enabled);
    assert_eq!(h.coordinator.state().scan.phase(), ScanPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_unsolicited_result_does_not_land_in_new_scan() {
    let classifier = ScriptedClassifier::with_delay(
        vec![
            Ok(type_iii(Some("EXTREME UV: avoid sun exposure"))),
            Ok(type_iii(None)),
        ],
        Duration::from_millis(500),
    );
    let mut h = Harness::connected(classifier);

    h.frame(2.0);
    h.send(AppEvent::TriggerScan);
    assert_eq!(h.pump().await, "classified");

    let view = h.coordinator.view();
    assert_eq!(view.status, "Scanning... 3");
    assert!(view.result.is_none());
    assert!(view.warning.is_none());
    assert!(!view.trigger_enabled);

    h.frame(1.0);
    while h.pump().await != "classified" {}
    let view = h.coordinator.view();
    assert_eq!(view.status, STATUS_COMPLETE);
    assert!(view.warning.is_none());
    assert!(view.result.is_some());
    assert!(view.trigger_enabled);
}

#[tokio::test(start_paused = true)]
async fn test_unsolicited_result_after_disconnected_trigger_is_dropped() {
    let classifier = ScriptedClassifier::with_delay(
        vec![Ok(type_iii(Some("Seek shade")))],
        Duration::from_millis(500),
    );
    let mut h = Harness::connected(classifier);

    h.frame(2.0);
    h.sender.open.store(false, Ordering::SeqCst);
    h.send(AppEvent::Device(DeviceEvent::StateChanged(
        ConnectionState::ClosedPendingRetry,
    )));
    h.send(AppEvent::TriggerScan);
    assert_eq!(h.pump().await, "classified");

    let view = h.coordinator.view();
    assert_eq!(view.status, STATUS_DISCONNECTED);
    assert!(view.result.is_none());
    assert!(view.warning.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_status_and_relayed_command_do_not_touch_scan() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![]));
    h.send(AppEvent::TriggerScan);
    let phase = h.coordinator.state().scan.phase();

    h.send(AppEvent::Device(DeviceEvent::Message(InboundMessage::Status(
        "ESP connected".into(),
    ))));
    h.send(AppEvent::Device(DeviceEvent::Message(InboundMessage::Command {
        action: "read_sensor".into(),
    })));

    let state = h.coordinator.state();
    assert_eq!(state.scan.phase(), phase);
    assert_eq!(state.mode, Mode::Normal);
    assert!(!state.view.trigger_enabled);
    assert_eq!(state.view.device_status.as_deref(), Some("ESP connected"));
    assert_eq!(h.classifier.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_status_frame_while_idle_keeps_trigger_enabled() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![]));
    h.send(AppEvent::Device(DeviceEvent::Message(InboundMessage::Status(
        "calibrating".into(),
    ))));
    assert!(h.coordinator.view().trigger_enabled);
    assert_eq!(h.coordinator.state().scan.phase(), ScanPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_debug_mode_logs_and_still_classifies() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![Ok(type_iii(None))]));

    h.send(AppEvent::SetMode(Mode::Debug));
    assert_eq!(h.sender.sent(), vec![CommandAction::DebugOn]);

    h.frame(0.25);
    let log = h.coordinator.view().debug_log.clone();
    assert_eq!(log.lines().count(), 18);
    assert!(log.starts_with("Ch1: 0.250000"));
    assert_eq!(h.pump().await, "classified");
    assert_eq!(h.classifier.call_count(), 1);
    assert!(h.coordinator.view().result.is_some());

    h.send(AppEvent::SetMode(Mode::Normal));
    h.send(AppEvent::SetMode(Mode::Normal));
    assert_eq!(
        h.sender.sent(),
        vec![CommandAction::DebugOn, CommandAction::DebugOff]
    );
    assert!(h.coordinator.view().debug_log.is_empty());
    assert_eq!(h.coordinator.view().mode, Mode::Normal);
}

#[tokio::test(start_paused = true)]
async fn test_debug_toggle_while_disconnected_skips_command() {
    let mut h = Harness::new(RecordingSender::closed(), ScriptedClassifier::new(vec![]));
    h.send(AppEvent::SetMode(Mode::Debug));
    assert!(h.sender.sent().is_empty());
    assert_eq!(h.coordinator.state().mode, Mode::Debug);
}

#[tokio::test(start_paused = true)]
async fn test_mode_switch_mid_scan_does_not_stall_sequence() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![Ok(type_iii(None))]));
    h.send(AppEvent::TriggerScan);
    h.send(AppEvent::SetMode(Mode::Debug));
    h.frame(1.0);
    h.send(AppEvent::SetMode(Mode::Normal));

    assert_eq!(h.pump().await, "classified");
    assert!(h.coordinator.view().trigger_enabled);
    assert_eq!(h.coordinator.view().status, STATUS_COMPLETE);
}

#[tokio::test(start_paused = true)]
async fn test_zero_readings_do_not_break_preview() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![Ok(type_iii(None))]));
    h.send(AppEvent::TriggerScan);
    h.frame(0.0);
    while h.pump().await != "classified" {}
    assert_eq!(
        h.coordinator.view().preview.unwrap().color,
        Rgb::new(0, 0, 0)
    );
    let sent: Vec<[f64; 18]> = h.classifier.calls.lock().unwrap().clone();
    assert_eq!(sent, vec![[0.0; 18]]);
}

#[tokio::test(start_paused = true)]
async fn test_simulate_goes_through_classifier() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![Ok(type_iii(None))]));
    h.send(AppEvent::Simulate(Rgb::new(200, 170, 140)));
    assert_eq!(h.pump().await, "classified");

    let calls = h.classifier.calls.lock().unwrap().clone();
    assert_eq!(calls[0][0], 10.0);
    assert_eq!(calls[0][3], 8.5);
    assert_eq!(
        h.coordinator.view().preview.unwrap().color,
        Rgb::new(200, 170, 140)
    );
    assert!(h.coordinator.view().trigger_enabled);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_handling() {
    let mut h = Harness::connected(ScriptedClassifier::new(vec![]));
    assert!(!h.coordinator.handle(AppEvent::Shutdown));
}
