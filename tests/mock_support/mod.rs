// Shared fakes for the coordinator and client tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uvscan_rs::classifier::{ClassificationResponse, ClassificationResult, Classifier};
use uvscan_rs::device::{CommandAction, CommandSender, Readings};
use uvscan_rs::ScanError;

/// Records commands; refuses them while "closed".
#[derive(Default)]
pub struct RecordingSender {
    pub open: AtomicBool,
    pub sent: Mutex<Vec<CommandAction>>,
}

impl RecordingSender {
    pub fn open() -> Arc<Self> {
        let sender = Self::default();
        sender.open.store(true, Ordering::SeqCst);
        Arc::new(sender)
    }

    pub fn closed() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<CommandAction> {
        self.sent.lock().unwrap().clone()
    }
}

impl CommandSender for RecordingSender {
    fn send(&self, action: CommandAction) -> Result<(), ScanError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(ScanError::NotConnected);
        }
        self.sent.lock().unwrap().push(action);
        Ok(())
    }
}

/// Answers from a queue after an optional delay.
pub struct ScriptedClassifier {
    responses: Mutex<VecDeque<Result<ClassificationResponse, ScanError>>>,
    delay: Duration,
    pub calls: Mutex<Vec<Readings>>,
}

impl ScriptedClassifier {
    pub fn new(responses: Vec<Result<ClassificationResponse, ScanError>>) -> Arc<Self> {
        Self::with_delay(responses, Duration::ZERO)
    }

    pub fn with_delay(
        responses: Vec<Result<ClassificationResponse, ScanError>>,
        delay: Duration,
    ) -> Arc<Self> {
        Arc::new(ScriptedClassifier {
            responses: Mutex::new(responses.into()),
            delay,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, readings: &Readings) -> Result<ClassificationResponse, ScanError> {
        self.calls.lock().unwrap().push(*readings);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ScanError::HttpError("no scripted response".into())))
    }
}

// Allow Arc<ScriptedClassifier> to be handed to ScanClient::start.
#[async_trait::async_trait]
impl Classifier for SharedClassifier {
    async fn classify(&self, readings: &Readings) -> Result<ClassificationResponse, ScanError> {
        self.0.classify(readings).await
    }
}

pub struct SharedClassifier(pub Arc<ScriptedClassifier>);

pub fn type_iii(warning: Option<&str>) -> ClassificationResponse {
    ClassificationResponse::Success(ClassificationResult {
        skin_type: "Type III".into(),
        ita_score: 30.5,
        spf_recommendation: "SPF 30-50".into(),
        reapply_time: "Every 90-120 min".into(),
        uv_index: 6.2,
        warning: warning.map(str::to_string),
    })
}

pub fn readings(value: f64) -> Readings {
    [value; 18]
}

pub fn sensor_json(value: f64) -> String {
    let values: Vec<String> = (0..18).map(|_| value.to_string()).collect();
    format!(r#"{{"type":"sensor","readings":[{}]}}"#, values.join(","))
}
