use foundation::{Coordinate, OverlayId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisasterKind {
    Flood,
    Fire,
    Earthquake,
    Hurricane,
    #[default]
    Other,
}

impl DisasterKind {
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "flood" => DisasterKind::Flood,
            "fire" | "wildfire" => DisasterKind::Fire,
            "earthquake" => DisasterKind::Earthquake,
            "hurricane" => DisasterKind::Hurricane,
            _ => DisasterKind::Other,
        }
    }
}

/// A disaster-affected region drawn as a filled polygon with a dashed outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterArea {
    pub id: OverlayId,
    pub kind: DisasterKind,
    /// Outer ring; closing vertex optional.
    pub ring: Vec<Coordinate>,
}

impl DisasterArea {
    pub fn new(id: impl Into<OverlayId>, kind: DisasterKind, ring: Vec<Coordinate>) -> Self {
        Self {
            id: id.into(),
            kind,
            ring,
        }
    }
}
