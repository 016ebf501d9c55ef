// Structured observability events emitted by the orchestrator.

use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::protocol::Flow;

/// Category of a failed flow, for log filtering. Users see one message per
/// flow regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Network,
    Malformed,
    /// The service answered with a non-success status of its own.
    Server,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    RequestAccepted {
        flow: Flow,
        generation: u64,
    },
    /// A request arrived while its lane was busy; no call was made.
    RequestRejected {
        flow: Flow,
    },
    DuplicatesRemoved {
        flow: Flow,
        removed: usize,
        names: Vec<String>,
    },
    /// The server returned a deck without exactly eight unique cards.
    IncompleteDeck {
        flow: Flow,
        received: usize,
        unique: usize,
    },
    StaleResponseDiscarded {
        flow: Flow,
        generation: u64,
        current: Option<u64>,
    },
    FlowFailed {
        flow: Flow,
        kind: FailureKind,
        detail: String,
    },
    FlowSucceeded {
        flow: Flow,
        generation: u64,
    },
}

pub trait Telemetry: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

// ---------------------------------------------------------------------------
// TracingTelemetry
// ---------------------------------------------------------------------------

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn record(&self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::RequestAccepted { flow, generation } => {
                info!(%flow, generation, "request accepted");
            }
            TelemetryEvent::RequestRejected { flow } => {
                info!(%flow, "request rejected: already in flight");
            }
            TelemetryEvent::DuplicatesRemoved {
                flow,
                removed,
                names,
            } => {
                warn!(%flow, removed, ?names, "server returned duplicate cards");
            }
            TelemetryEvent::IncompleteDeck {
                flow,
                received,
                unique,
            } => {
                warn!(%flow, received, unique, "server returned an incomplete deck");
            }
            TelemetryEvent::StaleResponseDiscarded {
                flow,
                generation,
                current,
            } => {
                debug!(%flow, generation, ?current, "discarding stale response");
            }
            TelemetryEvent::FlowFailed { flow, kind, detail } => {
                warn!(%flow, ?kind, %detail, "request failed");
            }
            TelemetryEvent::FlowSucceeded { flow, generation } => {
                info!(%flow, generation, "request settled");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingTelemetry
// ---------------------------------------------------------------------------

/// Keeps every event in memory. Used by tests to assert on anomalies.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Telemetry for RecordingTelemetry {
    fn record(&self, event: TelemetryEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
