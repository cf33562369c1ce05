use std::collections::BTreeMap;

use foundation::{Coordinate, OverlayId};
use layers::LayerId;
use scene::{DisasterArea, Marker, Presence};
use surface::Geometry;

use crate::viewport::FitRequest;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRoute {
    /// Trimmed encoding the geometry was decoded from.
    pub encoding: String,
    pub geometry: Geometry,
    /// Line layers on the surface, in draw order.
    pub layers: Vec<LayerId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedArea {
    pub id: OverlayId,
    pub ring: Geometry,
    /// Fill then outline.
    pub layers: Vec<LayerId>,
}

/// What is currently materialized on the map surface.
///
/// Owned exclusively by the reconciler and carried from tick to tick as the
/// baseline the next scene is diffed against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedState {
    pub markers: BTreeMap<OverlayId, Marker>,
    /// Markers whose position failed validation, keyed to the raw position
    /// bits that failed; not re-validated until the position changes.
    pub rejected_markers: BTreeMap<OverlayId, [u64; 2]>,
    pub route: Option<RenderedRoute>,
    /// Encoding that last failed to produce a route; not retried until it changes.
    pub rejected_route: Option<String>,
    pub pin: Option<Coordinate>,
    pub areas: Vec<RenderedArea>,
    /// Scene areas the current area layers were built from.
    pub area_source: Option<Vec<DisasterArea>>,
    /// Last camera request that reached the surface.
    pub last_fit: Option<FitRequest>,
}

impl RenderedState {
    pub fn presence(&self) -> Presence {
        Presence {
            disaster_areas: !self.areas.is_empty(),
            route: self.route.is_some(),
            location_pin: self.pin.is_some(),
            markers: !self.markers.is_empty(),
        }
    }

    pub fn area_layer_count(&self) -> usize {
        self.areas.iter().map(|a| a.layers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.route.is_none() && self.pin.is_none() && self.areas.is_empty()
    }
}
