use std::fmt;

use foundation::OverlayId;
use serde::Serialize;

/// Name of a line or polygon layer on the map surface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LayerId(pub String);

pub const ROUTE_GLOW_LAYER: &str = "route-glow";
pub const ROUTE_LINE_LAYER: &str = "route-line";

impl LayerId {
    pub fn route_glow() -> Self {
        LayerId(ROUTE_GLOW_LAYER.to_string())
    }

    pub fn route_line() -> Self {
        LayerId(ROUTE_LINE_LAYER.to_string())
    }

    pub fn area_fill(area: &OverlayId) -> Self {
        LayerId(format!("disaster-{area}-fill"))
    }

    pub fn area_outline(area: &OverlayId) -> Self {
        LayerId(format!("disaster-{area}-outline"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a point handle (scene marker or the incident pin) on the surface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKey {
    Marker(OverlayId),
    LocationPin,
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKey::Marker(id) => write!(f, "marker-{id}"),
            MarkerKey::LocationPin => f.write_str("location-pin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LayerId, MarkerKey};
    use foundation::OverlayId;

    #[test]
    fn area_layers_are_paired_per_area() {
        let id = OverlayId::from("f1");
        assert_eq!(LayerId::area_fill(&id).as_str(), "disaster-f1-fill");
        assert_eq!(LayerId::area_outline(&id).as_str(), "disaster-f1-outline");
        assert_ne!(LayerId::route_glow(), LayerId::route_line());
    }

    #[test]
    fn marker_keys_do_not_collide_with_pin() {
        assert_ne!(
            MarkerKey::Marker(OverlayId::from("location-pin")).to_string(),
            MarkerKey::LocationPin.to_string()
        );
    }
}
