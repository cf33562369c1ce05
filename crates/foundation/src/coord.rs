use serde::{Deserialize, Serialize};

pub const LAT_MIN: f64 = -90.0;
pub const LAT_MAX: f64 = 90.0;
pub const LNG_MIN: f64 = -180.0;
pub const LNG_MAX: f64 = 180.0;

/// A WGS84 position in decimal degrees.
///
/// Values built through [`Coordinate::clamped`] or the validator always lie
/// within `[-90, 90]` x `[-180, 180]`. The raw constructor does not check, so
/// it is reserved for values that are already known to be in range.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a coordinate with both axes clamped into the valid ranges.
    pub fn clamped(lat: f64, lng: f64) -> Self {
        Self {
            lat: lat.clamp(LAT_MIN, LAT_MAX),
            lng: lng.clamp(LNG_MIN, LNG_MAX),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    pub fn in_range(&self) -> bool {
        (LAT_MIN..=LAT_MAX).contains(&self.lat) && (LNG_MIN..=LNG_MAX).contains(&self.lng)
    }

    /// True when both axes differ by no more than `epsilon_deg`.
    pub fn approx_eq(&self, other: &Self, epsilon_deg: f64) -> bool {
        (self.lat - other.lat).abs() <= epsilon_deg && (self.lng - other.lng).abs() <= epsilon_deg
    }
}
