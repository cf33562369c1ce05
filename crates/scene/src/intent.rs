use serde::Serialize;

/// Which entity set should drive the camera this tick.
///
/// Variants are declared in precedence order: disaster areas orient the user
/// before a route, a route before the incident pin, the pin before markers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportIntent {
    DisasterAreas,
    Route,
    LocationPin,
    Markers,
}

/// Which entity sets are non-empty.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    pub disaster_areas: bool,
    pub route: bool,
    pub location_pin: bool,
    pub markers: bool,
}

impl ViewportIntent {
    /// Highest-precedence non-empty set, or `None` when nothing should move the camera.
    pub fn select(presence: Presence) -> Option<Self> {
        if presence.disaster_areas {
            Some(ViewportIntent::DisasterAreas)
        } else if presence.route {
            Some(ViewportIntent::Route)
        } else if presence.location_pin {
            Some(ViewportIntent::LocationPin)
        } else if presence.markers {
            Some(ViewportIntent::Markers)
        } else {
            None
        }
    }
}
