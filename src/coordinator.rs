//! # Scan Coordinator
//!
//! Single owner of the application state. Every asynchronous completion
//! (socket events, countdown ticks, watchdog firings, classification
//! responses) and every user action is posted as an [`AppEvent`] on one
//! channel and handled here in arrival order, so no two handlers ever race.
//!
//! Spawned timers and HTTP calls carry the id of the scan session they were
//! started for; the coordinator checks it before acting on the completion.

use crate::classifier::{simulated_readings, ClassificationResponse, Classifier, ColorPreview, Rgb};
use crate::config::ClientConfig;
use crate::device::{
    CommandAction, CommandSender, ConnectionConfig, ConnectionHandle, ConnectionManager,
    ConnectionState, Connector, DeviceEvent, InboundMessage, Readings, SensorFrame,
};
use crate::error::ScanError;
use crate::scan::{render_debug_log, Mode, ScanSequencer, TriggerOutcome};
use crate::view::{self, ScanView};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Everything the coordinator reacts to.
#[derive(Debug)]
pub enum AppEvent {
    Device(DeviceEvent),
    TriggerScan,
    SetMode(Mode),
    Simulate(Rgb),
    CountdownTick {
        session: u64,
    },
    WatchdogExpired {
        session: u64,
    },
    Classified {
        session: Option<u64>,
        generation: u64,
        preview: ColorPreview,
        outcome: Result<ClassificationResponse, ScanError>,
    },
    Shutdown,
}

impl From<DeviceEvent> for AppEvent {
    fn from(event: DeviceEvent) -> Self {
        AppEvent::Device(event)
    }
}

/// Scan timing knobs.
#[derive(Debug, Clone, Copy)]
pub struct ScanTiming {
    pub countdown_tick: Duration,
    pub watchdog: Duration,
}

impl From<&ClientConfig> for ScanTiming {
    fn from(config: &ClientConfig) -> Self {
        ScanTiming {
            countdown_tick: config.countdown_tick(),
            watchdog: config.watchdog(),
        }
    }
}

/// Process-wide mutable state, owned by the coordinator.
#[derive(Debug)]
pub struct AppState {
    pub mode: Mode,
    pub connection: ConnectionState,
    pub scan: ScanSequencer,
    pub view: ScanView,
}

pub struct Coordinator {
    state: AppState,
    device: Arc<dyn CommandSender>,
    classifier: Arc<dyn Classifier>,
    events: mpsc::UnboundedSender<AppEvent>,
    view_tx: watch::Sender<ScanView>,
    timing: ScanTiming,
}

impl Coordinator {
    /// `events` must feed the receiver later passed to [`Coordinator::run`];
    /// spawned timers and HTTP calls post their completions there.
    pub fn new(
        device: Arc<dyn CommandSender>,
        classifier: Arc<dyn Classifier>,
        timing: ScanTiming,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let view = ScanView::default();
        let (view_tx, _) = watch::channel(view.clone());
        Coordinator {
            state: AppState {
                mode: Mode::Normal,
                connection: ConnectionState::Disconnected,
                scan: ScanSequencer::new(timing.watchdog),
                view,
            },
            device,
            classifier,
            events,
            view_tx,
            timing,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> &ScanView {
        &self.state.view
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanView> {
        self.view_tx.subscribe()
    }

    /// Processes events until shutdown or until every sender is gone.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<AppEvent>) {
        while let Some(event) = events.recv().await {
            if !self.handle(event) {
                break;
            }
        }
        debug!("Coordinator stopped");
    }

    /// Handles one event. Returns false on shutdown.
    pub fn handle(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Device(DeviceEvent::StateChanged(state)) => self.on_connection(state),
            AppEvent::Device(DeviceEvent::Message(message)) => self.on_message(message),
            AppEvent::TriggerScan => self.on_trigger(),
            AppEvent::SetMode(mode) => self.on_set_mode(mode),
            AppEvent::Simulate(rgb) => {
                info!("Simulating sensor frame for {}", rgb.css());
                self.classify(None, simulated_readings(rgb.r, rgb.g, rgb.b));
            }
            AppEvent::CountdownTick { session } => {
                if let Some(stage) = self.state.scan.tick(session) {
                    self.state.view.status = view::countdown_status(stage);
                }
            }
            AppEvent::WatchdogExpired { session } => self.on_watchdog(session),
            AppEvent::Classified {
                session,
                generation,
                preview,
                outcome,
            } => self.on_classified(session, generation, preview, outcome),
            AppEvent::Shutdown => return false,
        }

        self.state.view.trigger_enabled = self.state.scan.trigger_enabled();
        self.publish();
        true
    }

    fn on_connection(&mut self, state: ConnectionState) {
        if self.state.connection != state {
            debug!("Connection {:?} -> {:?}", self.state.connection, state);
        }
        self.state.connection = state;
        self.state.view.connection = state;
    }

    fn on_message(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Sensor(frame) => self.on_sensor_frame(frame),
            InboundMessage::Status(text) => {
                info!("Device status: {text}");
                self.state.view.device_status = Some(text);
            }
            InboundMessage::Command { action } => {
                debug!("Ignoring relayed command {action}");
            }
        }
    }

    fn on_sensor_frame(&mut self, frame: SensorFrame) {
        let route = self.state.mode.route();
        if route.debug_log {
            let log = render_debug_log(&frame);
            debug!("Sensor frame:\n{log}");
            self.state.view.debug_log = log;
        }
        if route.classify {
            let session = self.state.scan.accept_frame();
            if session.is_none() {
                info!("Unsolicited sensor frame; classifying anyway");
            }
            self.classify(session, *frame.readings());
        }
    }

    fn on_trigger(&mut self) {
        let connected = self.state.connection.is_open();
        match self.state.scan.trigger(Instant::now(), connected) {
            TriggerOutcome::Busy => debug!("Scan already in progress; trigger ignored"),
            TriggerOutcome::Disconnected => {
                warn!("Scan requested while sensor is disconnected");
                self.state.view.clear_result();
                self.state.view.status = view::STATUS_DISCONNECTED.to_string();
            }
            TriggerOutcome::Started(session) => {
                self.state.view.clear_result();
                self.state.view.status = view::countdown_status(session.countdown);

                if let Err(e) = self.device.send(CommandAction::ReadSensor) {
                    warn!("Could not send read command: {e}");
                    self.state.scan.cancel(session.id);
                    self.state.view.status = view::STATUS_DISCONNECTED.to_string();
                    return;
                }

                info!("Scan {} started", session.id);
                self.spawn_countdown(session.id, session.countdown);
                self.spawn_watchdog(session.id, session.deadline);
            }
        }
    }

    fn on_set_mode(&mut self, mode: Mode) {
        if self.state.mode == mode {
            return;
        }
        if self.state.connection.is_open() {
            if let Err(e) = self.device.send(mode.command()) {
                debug!("Skipping {}: {e}", mode.command());
            }
        }
        info!("Switching to {mode} mode");
        self.state.mode = mode;
        self.state.view.mode = mode;
        if mode == Mode::Normal {
            self.state.view.debug_log.clear();
        }
    }

    fn on_watchdog(&mut self, session: u64) {
        if self.state.scan.expire(session) {
            info!("Scan {session} timed out waiting for the sensor");
            self.state.view.status.clear();
        }
    }

    fn on_classified(
        &mut self,
        session: Option<u64>,
        generation: u64,
        preview: ColorPreview,
        outcome: Result<ClassificationResponse, ScanError>,
    ) {
        match session {
            Some(id) => {
                if !self.state.scan.finish(id) {
                    debug!("Dropping late classification for scan {id}");
                    return;
                }
            }
            None => {
                // Unsolicited results never land on a scan started after them
                // or on one still in flight.
                if generation != self.state.scan.generation()
                    || self.state.scan.active_id().is_some()
                {
                    debug!("Dropping unsolicited classification from before the last trigger");
                    return;
                }
            }
        }

        match outcome {
            Ok(ClassificationResponse::Success(result)) => {
                info!(
                    "Classified as {} (ITA {}), {}",
                    result.skin_type, result.ita_score, result.spf_recommendation
                );
                self.state.view.show_result(&result, preview);
            }
            Ok(response) => {
                let message = response.error_message().unwrap_or("Unknown");
                warn!("Backend could not classify readings: {message}");
                self.state.view.status = view::processing_error_status(message);
            }
            Err(e) => {
                warn!("Classification request failed: {e}");
                self.state.view.status = view::STATUS_SERVER_ERROR.to_string();
            }
        }
    }

    fn classify(&mut self, session: Option<u64>, readings: Readings) {
        self.state.view.status = view::STATUS_ANALYZING.to_string();
        let generation = self.state.scan.generation();
        let classifier = Arc::clone(&self.classifier);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = classifier.classify(&readings).await;
            let _ = events.send(AppEvent::Classified {
                session,
                generation,
                preview: ColorPreview::from_readings(&readings),
                outcome,
            });
        });
    }

    fn spawn_countdown(&self, session: u64, stages: u8) {
        let events = self.events.clone();
        let tick = self.timing.countdown_tick;
        tokio::spawn(async move {
            for _ in 0..stages {
                tokio::time::sleep(tick).await;
                if events.send(AppEvent::CountdownTick { session }).is_err() {
                    break;
                }
            }
        });
    }

    fn spawn_watchdog(&self, session: u64, deadline: Instant) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = events.send(AppEvent::WatchdogExpired { session });
        });
    }

    fn publish(&self) {
        let view = &self.state.view;
        self.view_tx.send_if_modified(|current| {
            if current != view {
                *current = view.clone();
                true
            } else {
                false
            }
        });
    }
}

/// Cloneable user-facing handle to a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    events: mpsc::UnboundedSender<AppEvent>,
    view: watch::Receiver<ScanView>,
}

impl CoordinatorHandle {
    fn post(&self, event: AppEvent) -> Result<(), ScanError> {
        self.events
            .send(event)
            .map_err(|_| ScanError::CoordinatorStopped)
    }

    pub fn trigger_scan(&self) -> Result<(), ScanError> {
        self.post(AppEvent::TriggerScan)
    }

    pub fn set_mode(&self, mode: Mode) -> Result<(), ScanError> {
        self.post(AppEvent::SetMode(mode))
    }

    pub fn simulate(&self, color: Rgb) -> Result<(), ScanError> {
        self.post(AppEvent::Simulate(color))
    }

    /// Asks the coordinator loop to stop. The device socket stays up until
    /// [`ScanClient::shutdown`].
    pub fn shutdown(&self) -> Result<(), ScanError> {
        self.post(AppEvent::Shutdown)
    }

    /// Latest rendered view.
    pub fn view(&self) -> ScanView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanView> {
        self.view.clone()
    }

    /// Waits until the view satisfies `pred`.
    pub async fn wait_for<F>(&self, mut pred: F) -> Result<ScanView, ScanError>
    where
        F: FnMut(&ScanView) -> bool,
    {
        let mut rx = self.view.clone();
        let view = rx
            .wait_for(|v| pred(v))
            .await
            .map_err(|_| ScanError::CoordinatorStopped)?;
        Ok(view.clone())
    }
}

/// A running scan client: connection manager plus coordinator.
pub struct ScanClient {
    handle: CoordinatorHandle,
    connection: ConnectionHandle,
    task: JoinHandle<()>,
}

impl ScanClient {
    /// Spawns the connection manager and the coordinator loop.
    pub fn start<C, K>(connector: C, classifier: K, config: &ClientConfig) -> Self
    where
        C: Connector,
        K: Classifier,
    {
        let (tx, rx) = mpsc::unbounded_channel::<AppEvent>();
        let connection = ConnectionManager::spawn(
            connector,
            ConnectionConfig {
                endpoint: config.device_url.clone(),
                retry_delay: config.reconnect_delay(),
            },
            tx.clone(),
        );

        let coordinator = Coordinator::new(
            Arc::new(connection.commands()),
            Arc::new(classifier),
            ScanTiming::from(config),
            tx.clone(),
        );
        let handle = CoordinatorHandle {
            events: tx,
            view: coordinator.subscribe(),
        };
        let task = tokio::spawn(coordinator.run(rx));

        ScanClient {
            handle,
            connection,
            task,
        }
    }

    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Stops the coordinator, then the connection manager.
    pub async fn shutdown(self) {
        let _ = self.handle.events.send(AppEvent::Shutdown);
        if let Err(e) = self.task.await {
            warn!("Coordinator task ended abnormally: {e}");
        }
        self.connection.shutdown().await;
    }
}
