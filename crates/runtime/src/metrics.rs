use std::collections::BTreeMap;

use serde::Serialize;

/// Counters kept by the overlay engine.
///
/// Keys are an enum rather than strings so snapshots have a fixed, sorted
/// order and typos cannot create new series.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    Ticks,
    BufferedScenes,
    MarkersAdded,
    MarkersRemoved,
    RoutesDrawn,
    RoutesRemoved,
    PinsAdded,
    PinsRemoved,
    AreaLayersAdded,
    AreaLayersRemoved,
    ViewportFits,
    Failures,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<Counter, u64>,
    gauges: BTreeMap<Gauge, i64>,
}

/// Point-in-time sizes of the rendered overlay set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gauge {
    LiveMarkers,
    LiveAreaLayers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub counters: Vec<(Counter, u64)>,
    pub gauges: Vec<(Gauge, i64)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, key: Counter) -> u64 {
        self.counters.get(&key).copied().unwrap_or(0)
    }

    pub fn inc(&mut self, key: Counter, by: u64) {
        if by > 0 {
            *self.counters.entry(key).or_insert(0) += by;
        }
    }

    pub fn gauge(&self, key: Gauge) -> Option<i64> {
        self.gauges.get(&key).copied()
    }

    pub fn set_gauge(&mut self, key: Gauge, value: i64) {
        self.gauges.insert(key, value);
    }

    /// Returns a stable, sorted snapshot suitable for logs.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}
