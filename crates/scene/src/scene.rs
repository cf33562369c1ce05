use foundation::{Coordinate, OverlayId};

use crate::area::DisasterArea;
use crate::intent::{Presence, ViewportIntent};
use crate::marker::Marker;

/// Declarative snapshot of what the map should show.
///
/// Rebuilt by the UI layer on every update, so equality is structural.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub markers: Vec<Marker>,
    route_encoding: Option<String>,
    pub location_pin: Option<Coordinate>,
    pub disaster_areas: Vec<DisasterArea>,
}

/// Per-entity-set change flags between two scenes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SceneChanges {
    pub markers: bool,
    pub route: bool,
    pub location_pin: bool,
    pub disaster_areas: bool,
}

impl SceneChanges {
    pub fn any(&self) -> bool {
        self.markers || self.route || self.location_pin || self.disaster_areas
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers(mut self, markers: Vec<Marker>) -> Self {
        self.markers = markers;
        self
    }

    /// Sets the encoded route; empty or whitespace-only strings mean "no route".
    pub fn with_route(mut self, encoding: impl Into<String>) -> Self {
        self.set_route(Some(encoding.into()));
        self
    }

    pub fn with_location_pin(mut self, pin: Coordinate) -> Self {
        self.location_pin = Some(pin);
        self
    }

    pub fn with_disaster_areas(mut self, areas: Vec<DisasterArea>) -> Self {
        self.disaster_areas = areas;
        self
    }

    pub fn set_route(&mut self, encoding: Option<String>) {
        self.route_encoding = encoding
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }

    pub fn route_encoding(&self) -> Option<&str> {
        self.route_encoding.as_deref()
    }

    pub fn marker_ids(&self) -> impl Iterator<Item = &OverlayId> + '_ {
        self.markers.iter().map(|m| &m.id)
    }

    pub fn marker(&self, id: &OverlayId) -> Option<&Marker> {
        self.markers.iter().find(|m| &m.id == id)
    }

    pub fn presence(&self) -> Presence {
        Presence {
            disaster_areas: !self.disaster_areas.is_empty(),
            route: self.route_encoding.is_some(),
            location_pin: self.location_pin.is_some(),
            markers: !self.markers.is_empty(),
        }
    }

    /// Declared camera intent, before any entity fails to render.
    pub fn viewport_intent(&self) -> Option<ViewportIntent> {
        ViewportIntent::select(self.presence())
    }

    /// Compares each entity set structurally against `previous`.
    ///
    /// Markers compare by id list only: a marker whose attributes change but
    /// whose id stays the same is not a change.
    pub fn changes_since(&self, previous: &Scene) -> SceneChanges {
        SceneChanges {
            markers: !self.marker_ids().eq(previous.marker_ids()),
            route: self.route_encoding != previous.route_encoding,
            location_pin: self.location_pin != previous.location_pin,
            disaster_areas: self.disaster_areas != previous.disaster_areas,
        }
    }
}
