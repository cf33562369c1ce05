use std::fmt;

use formats::MalformedRoute;
use foundation::InvalidCoordinate;
use runtime::EventKind;
use surface::SurfaceError;

/// Entity class a failure belongs to; failures never cross classes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityClass {
    Markers,
    Route,
    LocationPin,
    DisasterAreas,
    Viewport,
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityClass::Markers => "markers",
            EntityClass::Route => "route",
            EntityClass::LocationPin => "location pin",
            EntityClass::DisasterAreas => "disaster areas",
            EntityClass::Viewport => "viewport",
        };
        f.write_str(s)
    }
}

/// Recoverable failures. None of them escape the reconciler: each one drops
/// the affected overlay for the tick and is logged.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayError {
    InvalidCoordinate {
        class: EntityClass,
        source: InvalidCoordinate,
    },
    MalformedRoute(MalformedRoute),
    AdapterFailure {
        class: EntityClass,
        source: SurfaceError,
    },
    /// The map surface is still initializing; the scene was buffered.
    NotReady,
}

impl OverlayError {
    pub fn event_kind(&self) -> EventKind {
        match self {
            OverlayError::InvalidCoordinate { .. } => EventKind::InvalidCoordinate,
            OverlayError::MalformedRoute(_) => EventKind::MalformedRoute,
            OverlayError::AdapterFailure { .. } => EventKind::AdapterFailure,
            OverlayError::NotReady => EventKind::NotReady,
        }
    }

    pub fn class(&self) -> Option<EntityClass> {
        match self {
            OverlayError::InvalidCoordinate { class, .. }
            | OverlayError::AdapterFailure { class, .. } => Some(*class),
            OverlayError::MalformedRoute(_) => Some(EntityClass::Route),
            OverlayError::NotReady => None,
        }
    }
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::InvalidCoordinate { class, source } => write!(f, "{class}: {source}"),
            OverlayError::MalformedRoute(e) => write!(f, "malformed route: {e}"),
            OverlayError::AdapterFailure { class, source } => {
                write!(f, "map surface failed for {class}: {source}")
            }
            OverlayError::NotReady => write!(f, "map surface not ready; scene buffered"),
        }
    }
}

impl std::error::Error for OverlayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OverlayError::InvalidCoordinate { source, .. } => Some(source),
            OverlayError::MalformedRoute(e) => Some(e),
            OverlayError::AdapterFailure { source, .. } => Some(source),
            OverlayError::NotReady => None,
        }
    }
}
