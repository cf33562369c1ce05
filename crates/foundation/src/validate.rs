use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coord::{Coordinate, LAT_MAX, LAT_MIN, LNG_MAX, LNG_MIN};

/// One axis of an unvalidated coordinate as it arrives from the UI layer.
///
/// Feeds mix JSON numbers and free-form strings (`"40.71"`, `" -74.0 "`,
/// `"40.71abc"`), so both are accepted and normalized by [`parse_axis`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAxis {
    Number(f64),
    Text(String),
}

impl From<f64> for RawAxis {
    fn from(v: f64) -> Self {
        RawAxis::Number(v)
    }
}

impl From<&str> for RawAxis {
    fn from(v: &str) -> Self {
        RawAxis::Text(v.to_string())
    }
}

impl fmt::Display for RawAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawAxis::Number(v) => write!(f, "{v}"),
            RawAxis::Text(v) => write!(f, "{v:?}"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Latitude => f.write_str("latitude"),
            Axis::Longitude => f.write_str("longitude"),
        }
    }
}

/// Validator rejection: the axis could not be read as a finite number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCoordinate {
    pub axis: Axis,
    pub input: String,
}

impl fmt::Display for InvalidCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.axis, self.input)
    }
}

impl std::error::Error for InvalidCoordinate {}

/// Reads one axis as a finite number.
///
/// Strings are trimmed and stripped of everything except ASCII digits, `.` and
/// `-` before parsing. NaN and infinities are rejected rather than zeroed.
pub fn parse_axis(raw: &RawAxis) -> Option<f64> {
    let value = match raw {
        RawAxis::Number(v) => *v,
        RawAxis::Text(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok()?
        }
    };
    value.is_finite().then_some(value)
}

/// Validates a raw latitude/longitude pair.
///
/// Out-of-range values are clamped to the nearest boundary; only unparseable
/// or non-finite input is an error.
pub fn validate(lat: &RawAxis, lng: &RawAxis) -> Result<Coordinate, InvalidCoordinate> {
    let lat_v = parse_axis(lat).ok_or_else(|| InvalidCoordinate {
        axis: Axis::Latitude,
        input: lat.to_string(),
    })?;
    let lng_v = parse_axis(lng).ok_or_else(|| InvalidCoordinate {
        axis: Axis::Longitude,
        input: lng.to_string(),
    })?;
    Ok(clamp_logged(lat_v, lng_v))
}

/// Validates an already-numeric pair (e.g. decoded polyline vertices).
pub fn validate_degrees(lat: f64, lng: f64) -> Result<Coordinate, InvalidCoordinate> {
    validate(&RawAxis::Number(lat), &RawAxis::Number(lng))
}

fn clamp_logged(lat: f64, lng: f64) -> Coordinate {
    let c = Coordinate::clamped(lat, lng);
    if c.lat != lat {
        debug!(input = lat, clamped = c.lat, "latitude clamped to [{LAT_MIN}, {LAT_MAX}]");
    }
    if c.lng != lng {
        debug!(input = lng, clamped = c.lng, "longitude clamped to [{LNG_MIN}, {LNG_MAX}]");
    }
    c
}
