use std::env;

use serde::{Deserialize, Serialize};
use surface::FitOptions;

/// Tunables for viewport fitting and the incident pin pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub fit_padding_px: f32,
    pub fit_max_zoom: f64,
    /// Zoom used when the fit-driving set collapses to a single point.
    pub point_zoom: f64,
    pub pin_zoom: f64,
    pub pulse_period_s: f64,
    pub pulse_min_scale: f32,
    pub pulse_max_scale: f32,
    /// Pin moves at or below this many degrees are not redrawn.
    pub pin_epsilon_deg: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fit_padding_px: 50.0,
            fit_max_zoom: 15.0,
            point_zoom: 13.0,
            pin_zoom: 14.0,
            pulse_period_s: 1.5,
            pulse_min_scale: 1.0,
            pulse_max_scale: 1.8,
            pin_epsilon_deg: 1e-7,
        }
    }
}

impl OverlayConfig {
    /// Defaults overridden by `OVERLAY_*` environment variables.
    ///
    /// Unset or unparseable variables keep their default.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            fit_padding_px: env_var_f32("OVERLAY_FIT_PADDING_PX", d.fit_padding_px),
            fit_max_zoom: env_var_f64("OVERLAY_FIT_MAX_ZOOM", d.fit_max_zoom),
            point_zoom: env_var_f64("OVERLAY_POINT_ZOOM", d.point_zoom),
            pin_zoom: env_var_f64("OVERLAY_PIN_ZOOM", d.pin_zoom),
            pulse_period_s: env_var_f64("OVERLAY_PULSE_PERIOD_S", d.pulse_period_s),
            pulse_min_scale: env_var_f32("OVERLAY_PULSE_MIN_SCALE", d.pulse_min_scale),
            pulse_max_scale: env_var_f32("OVERLAY_PULSE_MAX_SCALE", d.pulse_max_scale),
            pin_epsilon_deg: env_var_f64("OVERLAY_PIN_EPSILON_DEG", d.pin_epsilon_deg),
        }
    }

    pub fn from_json_str(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            padding_px: self.fit_padding_px,
            max_zoom: self.fit_max_zoom,
        }
    }
}

fn env_var_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn env_var_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::OverlayConfig;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = OverlayConfig::from_json_str(r#"{"pin_zoom": 16}"#).unwrap();
        assert_eq!(cfg.pin_zoom, 16.0);
        assert_eq!(cfg.fit_padding_px, OverlayConfig::default().fit_padding_px);
    }

    #[test]
    fn fit_options_mirror_config() {
        let cfg = OverlayConfig::default();
        let opts = cfg.fit_options();
        assert_eq!(opts.padding_px, 50.0);
        assert_eq!(opts.max_zoom, 15.0);
    }
}
