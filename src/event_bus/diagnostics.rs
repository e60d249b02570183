use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, BoxStream, StreamExt};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, Receiver, Sender, error};
use tokio::time::timeout;

use super::event::Event;
use super::hub::EventHub;

/// Controls whether an [`EventBus`](crate::event_bus::EventBus) tracks sink
/// failures, how large its diagnostics buffer is, and whether failures are
/// also surfaced as `Event::Diagnostic`s on the main event stream.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticsConfig {
    /// Whether sink errors are tracked at all. When `false`, [`EventBus::diagnostics`](crate::event_bus::EventBus::diagnostics)
    /// and [`EventBus::sink_health`](crate::event_bus::EventBus::sink_health) never observe anything.
    pub enabled: bool,
    /// Capacity of the diagnostics broadcast channel. Defaults to 256 when unset.
    pub buffer_capacity: Option<usize>,
    /// When set, every recorded sink failure is also published as an
    /// `Event::Diagnostic` on the bus's main event stream.
    pub emit_to_events: bool,
}

const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 256;

/// Aggregated error history for a single sink, keyed by [`EventSink::name`](crate::event_bus::EventSink::name).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SinkHealth {
    pub sink: String,
    pub error_count: u64,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct SinkHealthEntry {
    error_count: u64,
    last_error: Option<String>,
    last_error_at: Option<DateTime<Utc>>,
}

/// Diagnostics state shared by an `EventBus` and its sink worker tasks: a
/// broadcast channel of [`SinkDiagnostic`]s plus aggregated [`SinkHealth`]
/// per sink name.
pub(crate) struct DiagnosticsState {
    enabled: bool,
    emit_to_events: bool,
    sender: Sender<SinkDiagnostic>,
    health: Mutex<FxHashMap<String, SinkHealthEntry>>,
}

impl DiagnosticsState {
    pub(crate) fn new(config: &DiagnosticsConfig) -> Self {
        let capacity = config
            .buffer_capacity
            .unwrap_or(DEFAULT_DIAGNOSTICS_CAPACITY)
            .max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            enabled: config.enabled,
            emit_to_events: config.emit_to_events,
            sender,
            health: Mutex::new(FxHashMap::default()),
        }
    }

    pub(crate) fn subscribe(&self) -> DiagnosticsStream {
        DiagnosticsStream::new(self.sender.subscribe())
    }

    pub(crate) fn snapshot_health(&self) -> Vec<SinkHealth> {
        self.health
            .lock()
            .unwrap()
            .iter()
            .map(|(sink, entry)| SinkHealth {
                sink: sink.clone(),
                error_count: entry.error_count,
                last_error: entry.last_error.clone(),
                last_error_at: entry.last_error_at,
            })
            .collect()
    }

    /// Records a sink failure: updates this sink's aggregated health,
    /// publishes a [`SinkDiagnostic`], and, when configured, republishes the
    /// failure as an `Event::Diagnostic` on `hub` too. A no-op when
    /// diagnostics tracking is disabled.
    pub(crate) fn record_error(&self, hub: &EventHub, sink: &str, message: &str) {
        if !self.enabled {
            return;
        }
        let when = Utc::now();
        let occurrence = {
            let mut health = self.health.lock().unwrap();
            let entry = health.entry(sink.to_string()).or_default();
            entry.error_count += 1;
            entry.last_error = Some(message.to_string());
            entry.last_error_at = Some(when);
            entry.error_count
        };
        let diagnostic = SinkDiagnostic {
            sink: sink.to_string(),
            error: message.to_string(),
            when,
            occurrence,
        };
        let _ = self.sender.send(diagnostic);
        if self.emit_to_events {
            let _ = hub.publish(Event::diagnostic(format!("sink.error.{sink}"), message.to_string()));
        }
    }
}

/// A single diagnostic entry emitted when a sink reports an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SinkDiagnostic {
    /// Logical sink identifier. Defaults to the sink's type name unless overridden.
    pub sink: String,
    /// Human-readable error message produced by the sink.
    pub error: String,
    /// Timestamp for when the error was observed.
    pub when: DateTime<Utc>,
    /// Monotonic occurrence counter for this sink's errors.
    pub occurrence: u64,
}

/// Stream wrapper for sink diagnostics, mirroring the EventStream API surface.
#[derive(Debug)]
pub struct DiagnosticsStream {
    receiver: Receiver<SinkDiagnostic>,
}

impl DiagnosticsStream {
    pub fn new(receiver: Receiver<SinkDiagnostic>) -> Self {
        Self { receiver }
    }

    /// Receive the next diagnostic, awaiting if necessary.
    pub async fn recv(&mut self) -> Result<SinkDiagnostic, error::RecvError> {
        self.receiver.recv().await
    }

    /// Try to receive a diagnostic without awaiting.
    pub fn try_recv(&mut self) -> Result<SinkDiagnostic, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Consume this wrapper, returning the inner broadcast receiver.
    pub fn into_inner(self) -> Receiver<SinkDiagnostic> {
        self.receiver
    }

    /// Convert into a boxed async stream of diagnostics.
    pub fn into_async_stream(self) -> BoxStream<'static, SinkDiagnostic> {
        let receiver = self.receiver;
        stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(diag) => return Some((diag, receiver)),
                    // Skip lagged notifications and keep draining
                    Err(error::RecvError::Lagged(_)) => continue,
                    Err(error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }

    /// Wait up to `duration` for the next diagnostic.
    pub async fn next_timeout(&mut self, duration: Duration) -> Option<SinkDiagnostic> {
        loop {
            match timeout(duration, self.recv()).await {
                Ok(Ok(diag)) => return Some(diag),
                Ok(Err(error::RecvError::Lagged(_))) => continue,
                Ok(Err(error::RecvError::Closed)) => return None,
                Err(_) => return None,
            }
        }
    }
}
