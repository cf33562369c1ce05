//! Scene feed wire format supplied by the chat/dashboard layer.
//!
//! Every field is optional; absent and `null` both mean "empty". Axis values
//! may be JSON numbers or strings and are validated during ingestion.

use std::fmt;

use foundation::{OverlayId, RawAxis};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneFeed {
    #[serde(deserialize_with = "null_as_default")]
    pub markers: Vec<MarkerFeed>,
    pub route_encoding: Option<String>,
    pub location_pin: Option<RawPin>,
    #[serde(deserialize_with = "null_as_default")]
    pub disaster_areas: Vec<DisasterAreaFeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerFeed {
    pub id: OverlayId,
    #[serde(default, rename = "type", alias = "category")]
    pub category: Option<String>,
    #[serde(default)]
    pub lat: Option<RawAxis>,
    #[serde(default)]
    pub lng: Option<RawAxis>,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "description")]
    pub detail: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPin {
    pub lat: Option<RawAxis>,
    pub lng: Option<RawAxis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterAreaFeed {
    pub id: OverlayId,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    /// Outer ring as `[lng, lat]` pairs (GeoJSON order).
    #[serde(default, deserialize_with = "null_as_default")]
    pub coordinates: Vec<[RawAxis; 2]>,
}

#[derive(Debug)]
pub struct FeedError(serde_json::Error);

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scene feed: {}", self.0)
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl SceneFeed {
    pub fn from_json_str(payload: &str) -> Result<Self, FeedError> {
        serde_json::from_str(payload).map_err(FeedError)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
