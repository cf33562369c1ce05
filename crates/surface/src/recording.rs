use std::collections::BTreeSet;

use foundation::Coordinate;
use layers::{LayerId, LineStyle, MarkerKey, PolygonPaint};
use runtime::PulseSample;
use serde::Serialize;

use crate::surface::{FitOptions, Geometry, MapSurface, MarkerHandle, SurfaceError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CallKind {
    AddMarker,
    RemoveMarker,
    AddLine,
    RemoveLine,
    AddPolygon,
    RemovePolygon,
    FitBounds,
    FlyTo,
    PinPulse,
}

impl CallKind {
    pub fn is_add(&self) -> bool {
        matches!(
            self,
            CallKind::AddMarker | CallKind::AddLine | CallKind::AddPolygon
        )
    }

    pub fn is_remove(&self) -> bool {
        matches!(
            self,
            CallKind::RemoveMarker | CallKind::RemoveLine | CallKind::RemovePolygon
        )
    }

    fn name(&self) -> &'static str {
        match self {
            CallKind::AddMarker => "add_marker",
            CallKind::RemoveMarker => "remove_marker",
            CallKind::AddLine => "add_line",
            CallKind::RemoveLine => "remove_line",
            CallKind::AddPolygon => "add_polygon",
            CallKind::RemovePolygon => "remove_polygon",
            CallKind::FitBounds => "fit_bounds",
            CallKind::FlyTo => "fly_to",
            CallKind::PinPulse => "set_pin_pulse",
        }
    }
}

/// One adapter call as observed by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SurfaceCall {
    AddMarker {
        handle: MarkerHandle,
    },
    RemoveMarker {
        key: MarkerKey,
    },
    AddLine {
        id: LayerId,
        geometry: Geometry,
        style: LineStyle,
    },
    RemoveLine {
        id: LayerId,
    },
    AddPolygon {
        id: LayerId,
        ring: Geometry,
        paint: PolygonPaint,
    },
    RemovePolygon {
        id: LayerId,
    },
    FitBounds {
        coords: Vec<Coordinate>,
        options: FitOptions,
    },
    FlyTo {
        center: Coordinate,
        zoom: f64,
    },
    PinPulse {
        key: MarkerKey,
        pulse: PulseSample,
    },
}

impl SurfaceCall {
    pub fn kind(&self) -> CallKind {
        match self {
            SurfaceCall::AddMarker { .. } => CallKind::AddMarker,
            SurfaceCall::RemoveMarker { .. } => CallKind::RemoveMarker,
            SurfaceCall::AddLine { .. } => CallKind::AddLine,
            SurfaceCall::RemoveLine { .. } => CallKind::RemoveLine,
            SurfaceCall::AddPolygon { .. } => CallKind::AddPolygon,
            SurfaceCall::RemovePolygon { .. } => CallKind::RemovePolygon,
            SurfaceCall::FitBounds { .. } => CallKind::FitBounds,
            SurfaceCall::FlyTo { .. } => CallKind::FlyTo,
            SurfaceCall::PinPulse { .. } => CallKind::PinPulse,
        }
    }

    /// Handle or layer name the call targets, if any.
    pub fn target(&self) -> Option<String> {
        match self {
            SurfaceCall::AddMarker { handle } => Some(handle.key.to_string()),
            SurfaceCall::RemoveMarker { key } | SurfaceCall::PinPulse { key, .. } => {
                Some(key.to_string())
            }
            SurfaceCall::AddLine { id, .. }
            | SurfaceCall::RemoveLine { id }
            | SurfaceCall::AddPolygon { id, .. }
            | SurfaceCall::RemovePolygon { id } => Some(id.to_string()),
            SurfaceCall::FitBounds { .. } | SurfaceCall::FlyTo { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FailRule {
    kind: CallKind,
    target: Option<String>,
}

/// In-memory surface that records every call and tracks live handles.
///
/// It is strict: adding a handle twice or removing one that is not live is an
/// error, which makes double-adds and leaks in the engine visible in tests.
/// Individual calls can be made to fail with [`RecordingSurface::fail_on`].
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
    rejected: Vec<SurfaceCall>,
    live_markers: BTreeSet<MarkerKey>,
    live_lines: BTreeSet<LayerId>,
    live_polygons: BTreeSet<LayerId>,
    fail_rules: Vec<FailRule>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `kind` call fail, or only those whose target contains `target`.
    pub fn fail_on(&mut self, kind: CallKind, target: Option<&str>) {
        self.fail_rules.push(FailRule {
            kind,
            target: target.map(str::to_string),
        });
    }

    pub fn clear_failures(&mut self) {
        self.fail_rules.clear();
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<SurfaceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn rejected(&self) -> &[SurfaceCall] {
        &self.rejected
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.calls.iter().filter(|c| c.kind() == kind).count()
    }

    pub fn add_count(&self) -> usize {
        self.calls.iter().filter(|c| c.kind().is_add()).count()
    }

    pub fn remove_count(&self) -> usize {
        self.calls.iter().filter(|c| c.kind().is_remove()).count()
    }

    pub fn live_markers(&self) -> &BTreeSet<MarkerKey> {
        &self.live_markers
    }

    pub fn live_lines(&self) -> &BTreeSet<LayerId> {
        &self.live_lines
    }

    pub fn live_polygons(&self) -> &BTreeSet<LayerId> {
        &self.live_polygons
    }

    /// True while anything is still materialized on the surface.
    pub fn has_live_handles(&self) -> bool {
        !(self.live_markers.is_empty() && self.live_lines.is_empty() && self.live_polygons.is_empty())
    }

    fn admit(&mut self, call: &SurfaceCall) -> Result<(), SurfaceError> {
        let kind = call.kind();
        let target = call.target();
        let hit = self.fail_rules.iter().any(|rule| {
            rule.kind == kind
                && match (&rule.target, &target) {
                    (None, _) => true,
                    (Some(want), Some(got)) => got.contains(want.as_str()),
                    (Some(_), None) => false,
                }
        });
        if hit {
            self.rejected.push(call.clone());
            return Err(SurfaceError::Rejected {
                call: kind.name(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&mut self, call: SurfaceCall) -> Result<(), SurfaceError> {
        self.admit(&call)?;
        let ok = match &call {
            SurfaceCall::AddMarker { handle } => self.live_markers.insert(handle.key.clone()),
            SurfaceCall::RemoveMarker { key } => self.live_markers.remove(key),
            SurfaceCall::AddLine { id, .. } => self.live_lines.insert(id.clone()),
            SurfaceCall::RemoveLine { id } => self.live_lines.remove(id),
            SurfaceCall::AddPolygon { id, .. } => self.live_polygons.insert(id.clone()),
            SurfaceCall::RemovePolygon { id } => self.live_polygons.remove(id),
            SurfaceCall::PinPulse { key, .. } => self.live_markers.contains(key),
            SurfaceCall::FitBounds { .. } | SurfaceCall::FlyTo { .. } => true,
        };
        if !ok {
            let kind = call.kind();
            let target = call.target().unwrap_or_default();
            self.rejected.push(call);
            return Err(if kind.is_add() {
                SurfaceError::Rejected {
                    call: kind.name(),
                    reason: format!("{target} already exists"),
                }
            } else {
                SurfaceError::UnknownHandle(target)
            });
        }
        self.calls.push(call);
        Ok(())
    }
}

impl MapSurface for RecordingSurface {
    fn add_marker(&mut self, marker: &MarkerHandle) -> Result<(), SurfaceError> {
        self.apply(SurfaceCall::AddMarker {
            handle: marker.clone(),
        })
    }

    fn remove_marker(&mut self, key: &MarkerKey) -> Result<(), SurfaceError> {
        self.apply(SurfaceCall::RemoveMarker { key: key.clone() })
    }

    fn add_line(
        &mut self,
        id: &LayerId,
        geometry: &Geometry,
        style: &LineStyle,
    ) -> Result<(), SurfaceError> {
        self.apply(SurfaceCall::AddLine {
            id: id.clone(),
            geometry: Geometry::clone(geometry),
            style: *style,
        })
    }

    fn remove_line(&mut self, id: &LayerId) -> Result<(), SurfaceError> {
        self.apply(SurfaceCall::RemoveLine { id: id.clone() })
    }

    fn add_polygon(
        &mut self,
        id: &LayerId,
        ring: &Geometry,
        paint: &PolygonPaint,
    ) -> Result<(), SurfaceError> {
        self.apply(SurfaceCall::AddPolygon {
            id: id.clone(),
            ring: Geometry::clone(ring),
            paint: *paint,
        })
    }

    fn remove_polygon(&mut self, id: &LayerId) -> Result<(), SurfaceError> {
        self.apply(SurfaceCall::RemovePolygon { id: id.clone() })
    }

    fn fit_bounds(
        &mut self,
        coords: &[Coordinate],
        options: &FitOptions,
    ) -> Result<(), SurfaceError> {
        self.apply(SurfaceCall::FitBounds {
            coords: coords.to_vec(),
            options: *options,
        })
    }

    fn fly_to(&mut self, center: Coordinate, zoom: f64) -> Result<(), SurfaceError> {
        self.apply(SurfaceCall::FlyTo { center, zoom })
    }

    fn set_pin_pulse(&mut self, key: &MarkerKey, pulse: PulseSample) -> Result<(), SurfaceError> {
        self.apply(SurfaceCall::PinPulse {
            key: key.clone(),
            pulse,
        })
    }
}
