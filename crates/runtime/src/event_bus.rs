use std::fmt;

use serde::Serialize;

/// Kinds of recovered failure the overlay engine reports.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    InvalidCoordinate,
    MalformedRoute,
    AdapterFailure,
    NotReady,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::InvalidCoordinate => "invalid_coordinate",
            EventKind::MalformedRoute => "malformed_route",
            EventKind::AdapterFailure => "adapter_failure",
            EventKind::NotReady => "not_ready",
        };
        f.write_str(s)
    }
}

/// A diagnostic event tagged with the reconciliation tick that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub tick: u64,
    pub kind: EventKind,
    pub message: String,
}

/// Append-only journal of recovered failures.
///
/// Failures never surface to the UI; this journal lets hosts and tests see
/// them without installing a log subscriber.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, tick: u64, kind: EventKind, message: impl Into<String>) {
        self.events.push(Event {
            tick,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
