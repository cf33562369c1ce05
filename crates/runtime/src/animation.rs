use std::collections::BTreeMap;
use std::f64::consts::TAU;

use foundation::time::Time;
use serde::Serialize;

use crate::frame::Frame;

/// Opacity at the peak of the pulse (fully expanded).
const PEAK_OPACITY: f32 = 0.3;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PulseSample {
    pub scale: f32,
    pub opacity: f32,
}

/// Periodic scale/opacity oscillation for a highlighted handle.
///
/// The handle grows from `min_scale` to `max_scale` and fades while it grows,
/// following a raised cosine so both ends of the cycle are smooth.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pulse {
    started: Time,
    period_s: f64,
    min_scale: f32,
    max_scale: f32,
}

impl Pulse {
    pub fn new(started: Time, period_s: f64, min_scale: f32, max_scale: f32) -> Self {
        Self {
            started,
            period_s: period_s.max(f64::EPSILON),
            min_scale,
            max_scale,
        }
    }

    pub fn sample(&self, now: Time) -> PulseSample {
        let phase = (now.since(self.started) / self.period_s).fract();
        let t = (0.5 - 0.5 * (TAU * phase).cos()) as f32;
        PulseSample {
            scale: self.min_scale + (self.max_scale - self.min_scale) * t,
            opacity: 1.0 - (1.0 - PEAK_OPACITY) * t,
        }
    }
}

/// Registry of running pulses keyed by handle.
#[derive(Debug, Clone)]
pub struct Animator<K: Ord> {
    running: BTreeMap<K, Pulse>,
}

impl<K: Ord> Default for Animator<K> {
    fn default() -> Self {
        Self {
            running: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> Animator<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the pulse for `key`.
    pub fn start(&mut self, key: K, pulse: Pulse) {
        self.running.insert(key, pulse);
    }

    /// Returns `true` if a pulse was running for `key`.
    pub fn stop(&mut self, key: &K) -> bool {
        self.running.remove(key).is_some()
    }

    pub fn stop_all(&mut self) {
        self.running.clear();
    }

    pub fn is_running(&self, key: &K) -> bool {
        self.running.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Samples every running pulse at the frame's time, in key order.
    pub fn sample(&self, frame: Frame) -> Vec<(K, PulseSample)> {
        self.running
            .iter()
            .map(|(k, p)| (k.clone(), p.sample(frame.time)))
            .collect()
    }
}
