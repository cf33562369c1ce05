use foundation::{Coordinate, OverlayId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerCategory {
    Shelter,
    Danger,
    Evacuation,
    Resource,
    #[default]
    General,
}

impl MarkerCategory {
    /// Case-insensitive lookup; unknown names fall back to `General`.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "shelter" => MarkerCategory::Shelter,
            "danger" => MarkerCategory::Danger,
            "evacuation" => MarkerCategory::Evacuation,
            "resource" => MarkerCategory::Resource,
            _ => MarkerCategory::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerCategory::Shelter => "shelter",
            MarkerCategory::Danger => "danger",
            MarkerCategory::Evacuation => "evacuation",
            MarkerCategory::Resource => "resource",
            MarkerCategory::General => "general",
        }
    }
}

/// A point of interest pushed by the dashboard or chat layer.
///
/// Markers are replaced wholesale; the engine never mutates one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: OverlayId,
    pub category: MarkerCategory,
    pub position: Coordinate,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl Marker {
    pub fn new(
        id: impl Into<OverlayId>,
        category: MarkerCategory,
        position: Coordinate,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            position,
            title: title.into(),
            detail: None,
            severity: None,
            status: None,
            capacity: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
