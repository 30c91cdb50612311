//! Fire-and-forget gameplay telemetry
//!
//! The simulation only ever enqueues. A [`TelemetryWorker`] drains the queue
//! into a [`TelemetrySink`] elsewhere (a background thread natively, between
//! frames on the web) and logs delivery failures. Nothing flows back.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Wire codes understood by the score server
pub mod codes {
    pub const SESSION_START: u16 = 2;
    pub const ITEM_COLLECTED: u16 = 3;
    pub const STAGE_CHANGED: u16 = 11;
    pub const HIGH_SCORE_UPDATED: u16 = 21;
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry sink rejected event {code}: {reason}")]
    Rejected { code: u16, reason: String },
    #[error("telemetry payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A gameplay event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum TelemetryEvent {
    SessionStart { timestamp: f64 },
    ItemCollected { item_id: u32, stage_id: u32 },
    StageChanged { current_stage: u32, target_score: f64 },
    HighScoreUpdated { score: u64 },
}

impl TelemetryEvent {
    pub fn code(&self) -> u16 {
        match self {
            TelemetryEvent::SessionStart { .. } => codes::SESSION_START,
            TelemetryEvent::ItemCollected { .. } => codes::ITEM_COLLECTED,
            TelemetryEvent::StageChanged { .. } => codes::STAGE_CHANGED,
            TelemetryEvent::HighScoreUpdated { .. } => codes::HIGH_SCORE_UPDATED,
        }
    }

    pub fn payload(&self) -> Result<Value, TelemetryError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// What the server receives for each event
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<'a> {
    pub handler_id: u16,
    pub user_id: &'a str,
    pub payload: &'a Value,
}

/// Receives events drained from the queue
pub trait TelemetrySink: Send {
    fn emit(&mut self, user_id: &str, code: u16, payload: &Value) -> Result<(), TelemetryError>;
}

/// Writes each envelope to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn emit(&mut self, user_id: &str, code: u16, payload: &Value) -> Result<(), TelemetryError> {
        let envelope = Envelope {
            handler_id: code,
            user_id,
            payload,
        };
        log::info!("telemetry {}", serde_json::to_string(&envelope)?);
        Ok(())
    }
}

/// Keeps every delivered `(code, payload)`; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<(u16, Value)>>>,
}

impl RecordingSink {
    pub fn delivered(&self) -> Vec<(u16, Value)> {
        match self.delivered.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, code: u16) -> usize {
        self.delivered().iter().filter(|(c, _)| *c == code).count()
    }
}

impl TelemetrySink for RecordingSink {
    fn emit(&mut self, _user_id: &str, code: u16, payload: &Value) -> Result<(), TelemetryError> {
        match self.delivered.lock() {
            Ok(mut events) => events.push((code, payload.clone())),
            Err(poisoned) => poisoned.into_inner().push((code, payload.clone())),
        }
        Ok(())
    }
}

#[derive(Debug)]
enum TelemetryCommand {
    Emit(TelemetryEvent),
    Shutdown,
}

/// Producer side handed to the simulation
#[derive(Debug, Clone)]
pub struct TelemetryQueue {
    tx: mpsc::Sender<TelemetryCommand>,
}

impl TelemetryQueue {
    /// Enqueue without waiting; a closed queue drops the event with a warning
    pub fn emit(&self, event: TelemetryEvent) {
        let code = event.code();
        if self.tx.send(TelemetryCommand::Emit(event)).is_err() {
            log::warn!("telemetry queue closed; event {code} dropped");
        }
    }

    /// Ask a blocking worker to stop once it has drained what is queued
    pub fn shutdown(&self) {
        let _ = self.tx.send(TelemetryCommand::Shutdown);
    }
}

/// Consumer side: owns the sink
pub struct TelemetryWorker {
    rx: mpsc::Receiver<TelemetryCommand>,
    sink: Box<dyn TelemetrySink>,
    user_id: String,
}

/// Create a connected queue/worker pair
pub fn channel(
    user_id: impl Into<String>,
    sink: impl TelemetrySink + 'static,
) -> (TelemetryQueue, TelemetryWorker) {
    let (tx, rx) = mpsc::channel();
    (
        TelemetryQueue { tx },
        TelemetryWorker {
            rx,
            sink: Box::new(sink),
            user_id: user_id.into(),
        },
    )
}

impl TelemetryWorker {
    /// Deliver everything currently queued without blocking; returns how many were delivered
    pub fn drain(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(command) = self.rx.try_recv() {
            match command {
                TelemetryCommand::Emit(event) => {
                    if self.deliver(&event) {
                        delivered += 1;
                    }
                }
                TelemetryCommand::Shutdown => break,
            }
        }
        delivered
    }

    /// Block delivering events until shutdown or every queue handle is dropped
    pub fn run(mut self) {
        while let Ok(command) = self.rx.recv() {
            match command {
                TelemetryCommand::Emit(event) => {
                    self.deliver(&event);
                }
                TelemetryCommand::Shutdown => break,
            }
        }
        log::debug!("telemetry worker stopped");
    }

    /// Run on a dedicated thread
    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn(self) -> std::io::Result<std::thread::JoinHandle<()>> {
        std::thread::Builder::new()
            .name("dash-runner-telemetry".into())
            .spawn(move || self.run())
    }

    fn deliver(&mut self, event: &TelemetryEvent) -> bool {
        let code = event.code();
        let result = event
            .payload()
            .and_then(|payload| self.sink.emit(&self.user_id, code, &payload));
        match result {
            Ok(()) => true,
            Err(err) => {
                log::warn!("telemetry event {code} not delivered: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FailingSink;

    impl TelemetrySink for FailingSink {
        fn emit(&mut self, _: &str, code: u16, _: &Value) -> Result<(), TelemetryError> {
            Err(TelemetryError::Rejected {
                code,
                reason: "offline".into(),
            })
        }
    }

    #[test]
    fn test_payload_shapes() {
        let event = TelemetryEvent::StageChanged {
            current_stage: 2,
            target_score: 1001.0,
        };
        assert_eq!(event.code(), codes::STAGE_CHANGED);
        assert_eq!(
            event.payload().unwrap(),
            json!({"currentStage": 2, "targetScore": 1001.0})
        );
        let event = TelemetryEvent::ItemCollected {
            item_id: 4,
            stage_id: 1,
        };
        assert_eq!(event.payload().unwrap(), json!({"itemId": 4, "stageId": 1}));
    }

    #[test]
    fn test_drain_delivers_in_order() {
        let sink = RecordingSink::default();
        let (queue, mut worker) = channel("player-1", sink.clone());
        queue.emit(TelemetryEvent::SessionStart { timestamp: 5.0 });
        queue.emit(TelemetryEvent::HighScoreUpdated { score: 120 });

        assert_eq!(worker.drain(), 2);
        let delivered: Vec<u16> = sink.delivered().iter().map(|(c, _)| *c).collect();
        assert_eq!(delivered, vec![codes::SESSION_START, codes::HIGH_SCORE_UPDATED]);
        assert_eq!(worker.drain(), 0);
    }

    #[test]
    fn test_sink_failure_is_swallowed() {
        let (queue, mut worker) = channel("player-1", FailingSink);
        queue.emit(TelemetryEvent::HighScoreUpdated { score: 1 });
        assert_eq!(worker.drain(), 0);
    }

    #[test]
    fn test_emit_after_worker_dropped_does_not_panic() {
        let (queue, worker) = channel("player-1", LogSink);
        drop(worker);
        queue.emit(TelemetryEvent::SessionStart { timestamp: 0.0 });
    }

    #[test]
    fn test_worker_thread_stops_on_shutdown() {
        let sink = RecordingSink::default();
        let (queue, worker) = channel("player-1", sink.clone());
        let handle = worker.spawn().unwrap();
        queue.emit(TelemetryEvent::ItemCollected {
            item_id: 1,
            stage_id: 0,
        });
        queue.shutdown();
        handle.join().unwrap();
        assert_eq!(sink.count(codes::ITEM_COLLECTED), 1);
    }
}
