use std::fmt;

use foundation::{Axis, Coordinate, InvalidCoordinate, OverlayId, RawAxis, validate};
use scene::{DisasterArea, DisasterKind, IdSet, Marker, MarkerCategory, Scene};
use tracing::warn;

use crate::feed::{DisasterAreaFeed, MarkerFeed, RawPin, SceneFeed};

/// Minimum vertex count for a drawable polygon ring.
pub const MIN_RING_VERTICES: usize = 3;

/// Something in the feed that was dropped while building the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestIssue {
    MarkerCoordinate {
        id: OverlayId,
        error: InvalidCoordinate,
    },
    DuplicateMarker {
        id: OverlayId,
    },
    AreaVertex {
        id: OverlayId,
        error: InvalidCoordinate,
    },
    DegenerateArea {
        id: OverlayId,
        vertices: usize,
    },
    DuplicateArea {
        id: OverlayId,
    },
    LocationPin(InvalidCoordinate),
}

impl fmt::Display for IngestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestIssue::MarkerCoordinate { id, error } => write!(f, "marker {id}: {error}"),
            IngestIssue::DuplicateMarker { id } => write!(f, "marker {id}: duplicate id"),
            IngestIssue::AreaVertex { id, error } => write!(f, "disaster area {id}: {error}"),
            IngestIssue::DegenerateArea { id, vertices } => write!(
                f,
                "disaster area {id}: {vertices} valid vertices, need {MIN_RING_VERTICES}"
            ),
            IngestIssue::DuplicateArea { id } => write!(f, "disaster area {id}: duplicate id"),
            IngestIssue::LocationPin(error) => write!(f, "location pin: {error}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub scene: Scene,
    pub issues: Vec<IngestIssue>,
}

/// Builds a validated [`Scene`] from a raw feed.
///
/// Entities whose coordinates fail validation are left out of the scene
/// rather than placed at (0, 0); each omission is reported and logged.
pub fn ingest_scene_feed(feed: &SceneFeed) -> Ingested {
    let mut issues = Vec::new();
    let mut scene = Scene::new();

    let mut seen = IdSet::new();
    for raw in &feed.markers {
        if !seen.insert(raw.id.clone()) {
            issues.push(IngestIssue::DuplicateMarker { id: raw.id.clone() });
            continue;
        }
        match ingest_marker(raw) {
            Ok(marker) => scene.markers.push(marker),
            Err(error) => issues.push(IngestIssue::MarkerCoordinate {
                id: raw.id.clone(),
                error,
            }),
        }
    }

    scene.set_route(feed.route_encoding.clone());

    if let Some(pin) = &feed.location_pin {
        match ingest_pin(pin) {
            Ok(coord) => scene.location_pin = coord,
            Err(error) => issues.push(IngestIssue::LocationPin(error)),
        }
    }

    // Area ids name the surface layers, so a repeated id would collide.
    let mut seen_areas = IdSet::new();
    for raw in &feed.disaster_areas {
        if !seen_areas.insert(raw.id.clone()) {
            issues.push(IngestIssue::DuplicateArea { id: raw.id.clone() });
            continue;
        }
        if let Some(area) = ingest_area(raw, &mut issues) {
            scene.disaster_areas.push(area);
        }
    }

    for issue in &issues {
        warn!("scene feed: {issue}");
    }

    Ingested { scene, issues }
}

/// Convenience wrapper that discards the issue list (issues are still logged).
pub fn build_scene(feed: &SceneFeed) -> Scene {
    ingest_scene_feed(feed).scene
}

fn ingest_marker(raw: &MarkerFeed) -> Result<Marker, InvalidCoordinate> {
    let position = validate_present(raw.lat.as_ref(), raw.lng.as_ref())?;
    let category = raw
        .category
        .as_deref()
        .map(MarkerCategory::parse_lenient)
        .unwrap_or_default();
    Ok(Marker {
        id: raw.id.clone(),
        category,
        position,
        title: raw.title.clone(),
        detail: raw.detail.clone(),
        severity: raw.severity.clone(),
        status: raw.status.clone(),
        capacity: raw.capacity,
    })
}

fn ingest_pin(raw: &RawPin) -> Result<Option<Coordinate>, InvalidCoordinate> {
    if raw.lat.is_none() && raw.lng.is_none() {
        return Ok(None);
    }
    validate_present(raw.lat.as_ref(), raw.lng.as_ref()).map(Some)
}

fn ingest_area(raw: &DisasterAreaFeed, issues: &mut Vec<IngestIssue>) -> Option<DisasterArea> {
    let mut ring = Vec::with_capacity(raw.coordinates.len());
    for [lng, lat] in &raw.coordinates {
        match validate(lat, lng) {
            Ok(c) => ring.push(c),
            Err(error) => issues.push(IngestIssue::AreaVertex {
                id: raw.id.clone(),
                error,
            }),
        }
    }
    if ring.len() < MIN_RING_VERTICES {
        issues.push(IngestIssue::DegenerateArea {
            id: raw.id.clone(),
            vertices: ring.len(),
        });
        return None;
    }
    let kind = raw
        .kind
        .as_deref()
        .map(DisasterKind::parse_lenient)
        .unwrap_or_default();
    Some(DisasterArea::new(raw.id.clone(), kind, ring))
}

fn validate_present(
    lat: Option<&RawAxis>,
    lng: Option<&RawAxis>,
) -> Result<Coordinate, InvalidCoordinate> {
    let missing = |axis| InvalidCoordinate {
        axis,
        input: "missing".to_string(),
    };
    let lat = lat.ok_or_else(|| missing(Axis::Latitude))?;
    let lng = lng.ok_or_else(|| missing(Axis::Longitude))?;
    validate(lat, lng)
}
