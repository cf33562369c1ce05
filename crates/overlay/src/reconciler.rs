use std::sync::Arc;

use formats::decode_polyline;
use foundation::{Coordinate, OverlayId, Time, validate_degrees};
use layers::{LayerId, LineStyle, MarkerKey, MarkerStyle, PolygonPaint};
use runtime::{Animator, Counter, EventBus, Frame, Gauge, Metrics, Pulse};
use scene::{DisasterArea, Marker, Scene, ViewportIntent};
use surface::{Geometry, MapSurface, MarkerHandle, Popup, SurfaceError};
use tracing::{debug, warn};

use crate::config::OverlayConfig;
use crate::error::{EntityClass, OverlayError};
use crate::readiness::SceneGate;
use crate::rendered::{RenderedArea, RenderedRoute, RenderedState};
use crate::viewport::plan_fit;

/// How a single-instance entity (route or pin) changed this tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntityChange {
    Added,
    Replaced,
    Removed,
}

/// Outcome of one scene update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// The surface was not ready; the scene was held for later.
    pub buffered: bool,
    pub markers_added: usize,
    pub markers_removed: usize,
    pub route: Option<EntityChange>,
    pub location_pin: Option<EntityChange>,
    pub areas_replaced: bool,
    /// Set that drove a camera move, if one was issued.
    pub fit: Option<ViewportIntent>,
    pub failures: Vec<OverlayError>,
}

impl TickReport {
    pub fn is_noop(&self) -> bool {
        self.markers_added == 0
            && self.markers_removed == 0
            && self.route.is_none()
            && self.location_pin.is_none()
            && !self.areas_replaced
            && self.fit.is_none()
    }
}

type ClickHandler = Box<dyn FnMut(&Marker)>;

/// Diff-and-apply engine between a [`Scene`] and a [`MapSurface`].
///
/// Each tick runs markers, route, pin, disaster areas and viewport in that
/// order, so the camera decision sees the final rendered set. A failure in one
/// entity class is recorded and never stops the others.
pub struct Reconciler<S: MapSurface> {
    surface: S,
    config: OverlayConfig,
    rendered: RenderedState,
    gate: SceneGate,
    animator: Animator<MarkerKey>,
    clock: Time,
    on_click: Option<ClickHandler>,
    events: EventBus,
    metrics: Metrics,
    tick: u64,
}

impl<S: MapSurface> Reconciler<S> {
    /// Creates an engine for a surface that is still loading.
    ///
    /// Scenes submitted before [`Reconciler::mark_ready`] are buffered.
    pub fn new(surface: S, config: OverlayConfig) -> Self {
        Self {
            surface,
            config,
            rendered: RenderedState::default(),
            gate: SceneGate::new(),
            animator: Animator::new(),
            clock: Time::ZERO,
            on_click: None,
            events: EventBus::new(),
            metrics: Metrics::new(),
            tick: 0,
        }
    }

    /// Registers the collaborator notified when a rendered marker is clicked.
    pub fn on_marker_click(&mut self, handler: impl FnMut(&Marker) + 'static) {
        self.on_click = Some(Box::new(handler));
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_open()
    }

    /// Number of scene updates seen so far, buffered ones included.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Signals that the map surface finished loading and renders the last
    /// scene received while it was not.
    pub fn mark_ready(&mut self) -> Option<TickReport> {
        let pending = self.gate.open()?;
        debug!("map surface ready; rendering buffered scene");
        Some(self.reconcile(&pending))
    }

    /// Applies a new scene, or buffers it while the surface is not ready.
    pub fn submit(&mut self, scene: Scene) -> TickReport {
        match self.gate.offer(scene) {
            Some(scene) => self.reconcile(&scene),
            None => {
                self.tick += 1;
                let mut report = TickReport {
                    tick: self.tick,
                    buffered: true,
                    ..TickReport::default()
                };
                self.metrics.inc(Counter::BufferedScenes, 1);
                self.record(&mut report, OverlayError::NotReady);
                report
            }
        }
    }

    /// Forwards a click on a rendered marker to the click handler.
    ///
    /// Returns `false` if no marker with `id` is rendered.
    pub fn handle_marker_click(&mut self, id: &OverlayId) -> bool {
        let Some(marker) = self.rendered.markers.get(id) else {
            return false;
        };
        if let Some(handler) = self.on_click.as_mut() {
            handler(marker);
        }
        true
    }

    /// Advances running animations to `frame` and pushes samples to the surface.
    ///
    /// Driven by the host's animation clock, not by scene updates.
    pub fn animate(&mut self, frame: Frame) {
        self.clock = frame.time;
        for (key, sample) in self.animator.sample(frame) {
            if let Err(e) = self.surface.set_pin_pulse(&key, sample) {
                debug!(%key, "pulse update failed: {e}");
            }
        }
    }

    pub fn is_animating(&self) -> bool {
        !self.animator.is_empty()
    }

    /// Removes every rendered handle and stops all animation.
    ///
    /// Handles are forgotten even if the surface reports an error. Returns the
    /// number of removal calls that succeeded.
    pub fn teardown(&mut self) -> usize {
        let mut removed = 0;
        let rendered = std::mem::take(&mut self.rendered);

        for id in rendered.markers.keys() {
            removed += released(self.surface.remove_marker(&MarkerKey::Marker(id.clone())));
        }
        if let Some(route) = &rendered.route {
            for layer in route.layers.iter().rev() {
                removed += released(self.surface.remove_line(layer));
            }
        }
        if rendered.pin.is_some() {
            removed += released(self.surface.remove_marker(&MarkerKey::LocationPin));
        }
        for area in &rendered.areas {
            for layer in area.layers.iter().rev() {
                removed += released(self.surface.remove_polygon(layer));
            }
        }

        self.animator.stop_all();
        self.gate.close();
        self.refresh_gauges();
        debug!(removed, "overlay torn down");
        removed
    }

    /// Tears down and hands the surface back to its owner.
    pub fn into_surface(mut self) -> S {
        self.teardown();
        self.surface
    }

    pub fn rendered(&self) -> &RenderedState {
        &self.rendered
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn reconcile(&mut self, scene: &Scene) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        self.reconcile_markers(scene, &mut report);
        self.reconcile_route(scene, &mut report);
        self.reconcile_pin(scene, &mut report);
        self.reconcile_areas(scene, &mut report);
        self.reconcile_viewport(&mut report);

        self.metrics.inc(Counter::Ticks, 1);
        self.metrics.inc(Counter::MarkersAdded, report.markers_added as u64);
        self.metrics.inc(Counter::MarkersRemoved, report.markers_removed as u64);
        self.refresh_gauges();

        if !report.is_noop() || !report.failures.is_empty() {
            debug!(
                tick = report.tick,
                markers_added = report.markers_added,
                markers_removed = report.markers_removed,
                route = ?report.route,
                pin = ?report.location_pin,
                areas_replaced = report.areas_replaced,
                fit = ?report.fit,
                failures = report.failures.len(),
                "scene reconciled"
            );
        }
        report
    }

    fn reconcile_markers(&mut self, scene: &Scene, report: &mut TickReport) {
        let incoming: scene::IdSet = scene.marker_ids().cloned().collect();
        self.rendered
            .rejected_markers
            .retain(|id, _| incoming.contains(id));

        let current: scene::IdSet = self.rendered.markers.keys().cloned().collect();
        let diff = current.diff(scene.marker_ids());
        if diff.is_empty() {
            return;
        }

        for id in diff.to_remove {
            match self.surface.remove_marker(&MarkerKey::Marker(id.clone())) {
                Ok(()) => {
                    self.rendered.markers.remove(&id);
                    report.markers_removed += 1;
                }
                // Still tracked, so the next tick retries the removal.
                Err(source) => self.adapter_failure(report, EntityClass::Markers, source),
            }
        }

        for id in diff.to_add {
            let Some(marker) = scene.marker(&id) else {
                continue;
            };
            let bits = position_bits(&marker.position);
            // Already reported; stays out until its position changes.
            if self.rendered.rejected_markers.get(&id) == Some(&bits) {
                continue;
            }
            let position = match validate_degrees(marker.position.lat, marker.position.lng) {
                Ok(p) => p,
                Err(source) => {
                    self.rendered.rejected_markers.insert(id, bits);
                    let err = OverlayError::InvalidCoordinate {
                        class: EntityClass::Markers,
                        source,
                    };
                    self.record(report, err);
                    continue;
                }
            };
            let handle = MarkerHandle {
                key: MarkerKey::Marker(id.clone()),
                position,
                style: MarkerStyle::for_category(marker.category),
                popup: Some(Popup {
                    title: marker.title.clone(),
                    detail: marker.detail.clone(),
                }),
            };
            match self.surface.add_marker(&handle) {
                Ok(()) => {
                    self.rendered.rejected_markers.remove(&id);
                    let mut stored = marker.clone();
                    stored.position = position;
                    self.rendered.markers.insert(id, stored);
                    report.markers_added += 1;
                }
                Err(source) => self.adapter_failure(report, EntityClass::Markers, source),
            }
        }
    }

    fn reconcile_route(&mut self, scene: &Scene, report: &mut TickReport) {
        let Some(encoding) = scene.route_encoding() else {
            self.rendered.rejected_route = None;
            if self.rendered.route.is_some() && self.remove_route(report) {
                report.route = Some(EntityChange::Removed);
            }
            return;
        };

        let unchanged = self
            .rendered
            .route
            .as_ref()
            .is_some_and(|r| r.encoding == encoding);
        if unchanged || self.rendered.rejected_route.as_deref() == Some(encoding) {
            return;
        }

        let had_route = self.rendered.route.is_some();
        if had_route && !self.remove_route(report) {
            // The old route is still on the surface; drawing now would stack a
            // second one under the same layer names.
            return;
        }

        let coords = match decode_polyline(encoding) {
            Ok(coords) => coords,
            Err(e) => {
                self.rendered.rejected_route = Some(encoding.to_string());
                self.record(report, OverlayError::MalformedRoute(e));
                if had_route {
                    report.route = Some(EntityChange::Removed);
                }
                return;
            }
        };
        if coords.is_empty() {
            debug!("route encoding has fewer than two valid points; no route drawn");
            self.rendered.rejected_route = Some(encoding.to_string());
            if had_route {
                report.route = Some(EntityChange::Removed);
            }
            return;
        }

        let geometry: Geometry = Arc::from(coords);
        let mut drawn: Vec<LayerId> = Vec::with_capacity(2);
        for (layer, style) in [
            (LayerId::route_glow(), LineStyle::route_glow()),
            (LayerId::route_line(), LineStyle::route_line()),
        ] {
            match self.surface.add_line(&layer, &geometry, &style) {
                Ok(()) => drawn.push(layer),
                Err(source) => {
                    self.adapter_failure(report, EntityClass::Route, source);
                    // Half a route is not drawn: take back what made it on.
                    for layer in drawn.iter().rev() {
                        if let Err(source) = self.surface.remove_line(layer) {
                            self.adapter_failure(report, EntityClass::Route, source);
                        }
                    }
                    if had_route {
                        report.route = Some(EntityChange::Removed);
                    }
                    return;
                }
            }
        }

        self.rendered.rejected_route = None;
        self.rendered.route = Some(RenderedRoute {
            encoding: encoding.to_string(),
            geometry,
            layers: drawn,
        });
        self.metrics.inc(Counter::RoutesDrawn, 1);
        report.route = Some(if had_route {
            EntityChange::Replaced
        } else {
            EntityChange::Added
        });
    }

    /// Removes the rendered route. Returns `false` if any layer could not be
    /// removed, in which case the route stays tracked for a later retry.
    fn remove_route(&mut self, report: &mut TickReport) -> bool {
        let Some(mut route) = self.rendered.route.take() else {
            return true;
        };
        let mut remaining = Vec::new();
        for layer in route.layers.drain(..).rev() {
            if let Err(source) = self.surface.remove_line(&layer) {
                self.adapter_failure(report, EntityClass::Route, source);
                remaining.push(layer);
            }
        }
        if remaining.is_empty() {
            self.metrics.inc(Counter::RoutesRemoved, 1);
            return true;
        }
        remaining.reverse();
        route.layers = remaining;
        self.rendered.route = Some(route);
        false
    }

    fn reconcile_pin(&mut self, scene: &Scene, report: &mut TickReport) {
        let wanted = match scene.location_pin {
            Some(raw) => match validate_degrees(raw.lat, raw.lng) {
                Ok(p) => Some(p),
                Err(source) => {
                    let err = OverlayError::InvalidCoordinate {
                        class: EntityClass::LocationPin,
                        source,
                    };
                    self.record(report, err);
                    None
                }
            },
            None => None,
        };

        let current = self.rendered.pin;
        match (wanted, current) {
            (None, None) => {}
            (None, Some(_)) => {
                if self.remove_pin(report) {
                    report.location_pin = Some(EntityChange::Removed);
                }
            }
            (Some(p), Some(old)) if old.approx_eq(&p, self.config.pin_epsilon_deg) => {}
            (Some(p), old) => {
                if old.is_some() && !self.remove_pin(report) {
                    return;
                }
                if self.add_pin(p, report) {
                    report.location_pin = Some(if old.is_some() {
                        EntityChange::Replaced
                    } else {
                        EntityChange::Added
                    });
                } else if old.is_some() {
                    report.location_pin = Some(EntityChange::Removed);
                }
            }
        }
    }

    fn add_pin(&mut self, position: Coordinate, report: &mut TickReport) -> bool {
        let handle = MarkerHandle {
            key: MarkerKey::LocationPin,
            position,
            style: MarkerStyle::location_pin(),
            popup: None,
        };
        if let Err(source) = self.surface.add_marker(&handle) {
            self.adapter_failure(report, EntityClass::LocationPin, source);
            return false;
        }
        self.rendered.pin = Some(position);
        self.animator.start(
            MarkerKey::LocationPin,
            Pulse::new(
                self.clock,
                self.config.pulse_period_s,
                self.config.pulse_min_scale,
                self.config.pulse_max_scale,
            ),
        );
        self.metrics.inc(Counter::PinsAdded, 1);
        true
    }

    fn remove_pin(&mut self, report: &mut TickReport) -> bool {
        if let Err(source) = self.surface.remove_marker(&MarkerKey::LocationPin) {
            self.adapter_failure(report, EntityClass::LocationPin, source);
            return false;
        }
        self.animator.stop(&MarkerKey::LocationPin);
        self.rendered.pin = None;
        self.metrics.inc(Counter::PinsRemoved, 1);
        true
    }

    fn reconcile_areas(&mut self, scene: &Scene, report: &mut TickReport) {
        let changed = self.rendered.area_source.as_deref() != Some(scene.disaster_areas.as_slice());
        if changed {
            // Wholesale replacement: area counts are small, so no per-area diff.
            if !self.rendered.areas.is_empty() {
                report.areas_replaced = true;
                if !self.remove_areas(report) {
                    // Stale layers are still on the surface; the next tick
                    // retries the whole replacement.
                    self.rendered.area_source = None;
                    return;
                }
            }
            self.rendered.area_source = Some(scene.disaster_areas.clone());
        }

        // Areas that failed on an earlier tick are retried until drawn.
        let mut seen = scene::IdSet::new();
        for area in &scene.disaster_areas {
            if !seen.insert(area.id.clone()) || self.rendered.areas.iter().any(|a| a.id == area.id) {
                continue;
            }
            if let Some(rendered) = self.add_area(area, report) {
                self.rendered.areas.push(rendered);
                report.areas_replaced = true;
            }
        }
    }

    /// Removes every area layer. Layers the surface refused to remove stay
    /// tracked; returns `false` if there were any.
    fn remove_areas(&mut self, report: &mut TickReport) -> bool {
        let mut stuck = Vec::new();
        for mut area in std::mem::take(&mut self.rendered.areas) {
            let mut remaining = Vec::new();
            for layer in area.layers.drain(..).rev() {
                match self.surface.remove_polygon(&layer) {
                    Ok(()) => self.metrics.inc(Counter::AreaLayersRemoved, 1),
                    Err(source) => {
                        self.adapter_failure(report, EntityClass::DisasterAreas, source);
                        remaining.push(layer);
                    }
                }
            }
            if !remaining.is_empty() {
                remaining.reverse();
                area.layers = remaining;
                stuck.push(area);
            }
        }
        let clean = stuck.is_empty();
        self.rendered.areas = stuck;
        clean
    }

    fn add_area(&mut self, area: &DisasterArea, report: &mut TickReport) -> Option<RenderedArea> {
        let ring: Geometry = Arc::from(area.ring.as_slice());
        let fill = LayerId::area_fill(&area.id);
        let outline = LayerId::area_outline(&area.id);

        if let Err(source) = self
            .surface
            .add_polygon(&fill, &ring, &PolygonPaint::area_fill(area.kind))
        {
            self.adapter_failure(report, EntityClass::DisasterAreas, source);
            return None;
        }
        if let Err(source) =
            self.surface
                .add_polygon(&outline, &ring, &PolygonPaint::area_outline(area.kind))
        {
            self.adapter_failure(report, EntityClass::DisasterAreas, source);
            if let Err(source) = self.surface.remove_polygon(&fill) {
                self.adapter_failure(report, EntityClass::DisasterAreas, source);
            }
            return None;
        }

        self.metrics.inc(Counter::AreaLayersAdded, 2);
        Some(RenderedArea {
            id: area.id.clone(),
            ring,
            layers: vec![fill, outline],
        })
    }

    fn reconcile_viewport(&mut self, report: &mut TickReport) {
        let Some(intent) = ViewportIntent::select(self.rendered.presence()) else {
            self.rendered.last_fit = None;
            return;
        };
        let Some(request) = plan_fit(intent, &self.rendered, &self.config) else {
            return;
        };
        if self.rendered.last_fit.as_ref() == Some(&request) {
            return;
        }
        match request.issue(&mut self.surface) {
            Ok(()) => {
                self.rendered.last_fit = Some(request);
                self.metrics.inc(Counter::ViewportFits, 1);
                report.fit = Some(intent);
            }
            Err(source) => self.adapter_failure(report, EntityClass::Viewport, source),
        }
    }

    fn adapter_failure(
        &mut self,
        report: &mut TickReport,
        class: EntityClass,
        source: SurfaceError,
    ) {
        self.record(report, OverlayError::AdapterFailure { class, source });
    }

    fn record(&mut self, report: &mut TickReport, err: OverlayError) {
        match err {
            OverlayError::NotReady => debug!(tick = report.tick, "{err}"),
            _ => {
                warn!(tick = report.tick, "{err}");
                self.metrics.inc(Counter::Failures, 1);
            }
        }
        self.events.emit(report.tick, err.event_kind(), err.to_string());
        report.failures.push(err);
    }

    fn refresh_gauges(&mut self) {
        self.metrics
            .set_gauge(Gauge::LiveMarkers, self.rendered.markers.len() as i64);
        self.metrics
            .set_gauge(Gauge::LiveAreaLayers, self.rendered.area_layer_count() as i64);
    }
}

fn position_bits(c: &Coordinate) -> [u64; 2] {
    [c.lat.to_bits(), c.lng.to_bits()]
}

fn released(result: Result<(), SurfaceError>) -> usize {
    match result {
        Ok(()) => 1,
        Err(e) => {
            warn!("teardown: {e}");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::{EntityChange, Reconciler};
    use crate::config::OverlayConfig;
    use crate::error::{EntityClass, OverlayError};
    use formats::{SceneFeed, build_scene};
    use foundation::{Coordinate, OverlayId};
    use layers::{LayerId, MarkerKey};
    use pretty_assertions::assert_eq;
    use runtime::{Counter, EventKind, Frame, Gauge};
    use scene::{DisasterArea, DisasterKind, Marker, MarkerCategory, Scene, ViewportIntent};
    use surface::{CallKind, NoopSurface, RecordingSurface, SurfaceCall};

    const ROUTE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn ready() -> Reconciler<RecordingSurface> {
        let mut r = Reconciler::new(RecordingSurface::new(), OverlayConfig::default());
        assert!(r.mark_ready().is_none());
        r
    }

    fn marker(id: i64, lat: f64, lng: f64) -> Marker {
        Marker::new(id, MarkerCategory::Shelter, Coordinate::new(lat, lng), format!("m{id}"))
    }

    fn flood(id: &str) -> DisasterArea {
        DisasterArea::new(
            id,
            DisasterKind::Flood,
            vec![
                Coordinate::new(10.0, 10.0),
                Coordinate::new(10.0, 12.0),
                Coordinate::new(12.0, 12.0),
            ],
        )
    }

    fn full_scene() -> Scene {
        Scene::new()
            .with_markers(vec![marker(1, 0.0, 0.0), marker(2, 1.0, 1.0)])
            .with_route(ROUTE)
            .with_location_pin(Coordinate::new(40.71, -74.0))
            .with_disaster_areas(vec![flood("f1")])
    }

    fn marker_key(id: i64) -> MarkerKey {
        MarkerKey::Marker(OverlayId::Int(id))
    }

    #[test]
    fn identical_scene_issues_no_calls() {
        let mut r = ready();
        let first = r.submit(full_scene());
        assert!(first.failures.is_empty());
        assert_eq!(first.markers_added, 2);
        assert_eq!(first.route, Some(EntityChange::Added));
        assert_eq!(first.location_pin, Some(EntityChange::Added));
        assert!(first.areas_replaced);
        r.surface_mut().take_calls();

        let second = r.submit(full_scene());
        assert!(second.is_noop());
        assert!(r.surface().calls().is_empty());
    }

    #[test]
    fn marker_churn_touches_only_changed_ids() {
        let mut r = ready();
        r.submit(Scene::new().with_markers(vec![
            marker(1, 0.0, 0.0),
            marker(2, 1.0, 1.0),
            marker(3, 2.0, 2.0),
        ]));
        r.surface_mut().take_calls();

        let report = r.submit(Scene::new().with_markers(vec![
            marker(1, 0.0, 0.0),
            marker(3, 2.0, 2.0),
            marker(4, 3.0, 3.0),
        ]));
        assert_eq!((report.markers_added, report.markers_removed), (1, 1));
        let s = r.surface();
        assert_eq!(s.add_count(), 1);
        assert_eq!(s.remove_count(), 1);
        assert_eq!(
            s.calls()[0],
            SurfaceCall::RemoveMarker { key: marker_key(2) }
        );
        assert!(s.live_markers().contains(&marker_key(4)));
        assert_eq!(r.metrics().gauge(Gauge::LiveMarkers), Some(3));
    }

    #[test]
    fn duplicate_marker_ids_keep_the_first() {
        let mut r = ready();
        let report = r.submit(Scene::new().with_markers(vec![
            marker(7, 1.0, 1.0),
            marker(7, 5.0, 5.0),
        ]));
        assert_eq!(report.markers_added, 1);
        assert_eq!(
            r.rendered().markers[&OverlayId::Int(7)].position,
            Coordinate::new(1.0, 1.0)
        );
    }

    #[test]
    fn non_finite_marker_is_skipped_alone() {
        let mut r = ready();
        let report = r.submit(Scene::new().with_markers(vec![
            marker(1, f64::NAN, 0.0),
            marker(2, 1.0, 1.0),
        ]));
        assert_eq!(report.markers_added, 1);
        assert!(matches!(
            report.failures.as_slice(),
            [OverlayError::InvalidCoordinate {
                class: EntityClass::Markers,
                ..
            }]
        ));
        assert_eq!(r.events().count(EventKind::InvalidCoordinate), 1);
    }

    #[test]
    fn failed_marker_removal_is_retried() {
        let mut r = ready();
        r.submit(Scene::new().with_markers(vec![marker(1, 0.0, 0.0)]));
        r.surface_mut().fail_on(CallKind::RemoveMarker, None);

        let report = r.submit(Scene::new());
        assert_eq!(report.markers_removed, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(r.rendered().markers.contains_key(&OverlayId::Int(1)));

        r.surface_mut().clear_failures();
        let report = r.submit(Scene::new());
        assert_eq!(report.markers_removed, 1);
        assert!(!r.surface().has_live_handles());
    }

    #[test]
    fn areas_drive_the_camera_over_route() {
        let mut r = ready();
        let report = r.submit(
            Scene::new()
                .with_route(ROUTE)
                .with_disaster_areas(vec![flood("f1")]),
        );
        assert_eq!(report.fit, Some(ViewportIntent::DisasterAreas));
        let fits: Vec<_> = r
            .surface()
            .calls()
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::FitBounds { coords, .. } => Some(coords.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            fits,
            vec![vec![Coordinate::new(10.0, 10.0), Coordinate::new(12.0, 12.0)]]
        );
    }

    #[test]
    fn polygon_failure_leaves_other_overlays_drawn() {
        let mut r = ready();
        r.surface_mut().fail_on(CallKind::AddPolygon, None);
        let report = r.submit(
            Scene::new()
                .with_markers(vec![marker(1, 0.0, 0.0), marker(2, 1.0, 1.0)])
                .with_route(ROUTE)
                .with_disaster_areas(vec![flood("f1")]),
        );
        assert_eq!(report.markers_added, 2);
        assert_eq!(report.route, Some(EntityChange::Added));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].class(), Some(EntityClass::DisasterAreas));
        assert!(r.surface().live_polygons().is_empty());
        // Nothing rendered for the areas, so the route takes the camera.
        assert_eq!(report.fit, Some(ViewportIntent::Route));
    }

    #[test]
    fn outline_failure_takes_back_the_fill() {
        let mut r = ready();
        r.surface_mut().fail_on(CallKind::AddPolygon, Some("outline"));
        r.submit(Scene::new().with_disaster_areas(vec![flood("f1")]));
        assert!(r.surface().live_polygons().is_empty());
        assert_eq!(r.surface().count(CallKind::RemovePolygon), 1);
        assert_eq!(r.rendered().area_layer_count(), 0);
    }

    #[test]
    fn cleared_areas_remove_both_layers() {
        let mut r = ready();
        r.submit(Scene::new().with_disaster_areas(vec![flood("f1"), flood("f2")]));
        assert_eq!(r.surface().live_polygons().len(), 4);

        let report = r.submit(Scene::new());
        assert!(report.areas_replaced);
        assert_eq!(r.surface().count(CallKind::RemovePolygon), 4);
        assert!(r.surface().live_polygons().is_empty());
    }

    #[test]
    fn failed_areas_are_redrawn_once_the_surface_recovers() {
        let mut r = ready();
        let scene = Scene::new().with_disaster_areas(vec![flood("f1")]);
        r.surface_mut().fail_on(CallKind::AddPolygon, None);
        let report = r.submit(scene.clone());
        assert_eq!(report.failures.len(), 1);
        assert!(r.surface().live_polygons().is_empty());

        r.surface_mut().clear_failures();
        let report = r.submit(scene.clone());
        assert!(report.failures.is_empty());
        assert!(report.areas_replaced);
        assert_eq!(r.surface().live_polygons().len(), 2);
        assert_eq!(report.fit, Some(ViewportIntent::DisasterAreas));

        r.surface_mut().take_calls();
        assert!(r.submit(scene).is_noop());
        assert!(r.surface().calls().is_empty());
    }

    #[test]
    fn only_missing_areas_are_retried() {
        let mut r = ready();
        let scene = Scene::new().with_disaster_areas(vec![flood("f1"), flood("f2")]);
        r.surface_mut().fail_on(CallKind::AddPolygon, Some("disaster-f2"));
        r.submit(scene.clone());
        assert_eq!(r.surface().live_polygons().len(), 2);

        r.surface_mut().clear_failures();
        r.surface_mut().take_calls();
        r.submit(scene);
        assert_eq!(r.surface().count(CallKind::AddPolygon), 2);
        assert_eq!(r.surface().count(CallKind::RemovePolygon), 0);
        assert_eq!(r.surface().live_polygons().len(), 4);
    }

    #[test]
    fn stuck_area_layers_are_removed_on_a_later_tick() {
        let mut r = ready();
        r.submit(Scene::new().with_disaster_areas(vec![flood("f1")]));
        r.surface_mut().fail_on(CallKind::RemovePolygon, Some("outline"));

        let report = r.submit(Scene::new());
        assert_eq!(report.failures.len(), 1);
        let outline = LayerId::area_outline(&OverlayId::from("f1"));
        assert_eq!(
            r.surface().live_polygons().iter().cloned().collect::<Vec<_>>(),
            vec![outline]
        );
        assert_eq!(r.rendered().area_layer_count(), 1);

        r.surface_mut().clear_failures();
        let report = r.submit(Scene::new());
        assert!(report.areas_replaced);
        assert!(r.surface().live_polygons().is_empty());
        assert_eq!(r.rendered().area_layer_count(), 0);
    }

    #[test]
    fn repeated_area_ids_are_drawn_once() {
        let mut r = ready();
        let scene = Scene::new().with_disaster_areas(vec![flood("x"), flood("x")]);
        let report = r.submit(scene.clone());
        assert!(report.failures.is_empty());
        assert_eq!(r.surface().live_polygons().len(), 2);

        r.surface_mut().take_calls();
        assert!(r.submit(scene).is_noop());
        assert!(r.surface().calls().is_empty());
    }

    #[test]
    fn invalid_marker_is_reported_once_until_it_moves() {
        let mut r = ready();
        let bad = Scene::new().with_markers(vec![marker(1, f64::NAN, 0.0)]);
        r.submit(bad.clone());
        let report = r.submit(bad);
        assert!(report.failures.is_empty());
        assert_eq!(r.events().count(EventKind::InvalidCoordinate), 1);

        let report = r.submit(Scene::new().with_markers(vec![marker(1, 2.0, 3.0)]));
        assert_eq!(report.markers_added, 1);
        assert!(r.rendered().rejected_markers.is_empty());
    }

    #[test]
    fn route_layers_share_one_geometry() {
        let mut r = ready();
        r.submit(Scene::new().with_route(ROUTE));
        let lines: Vec<_> = r
            .surface()
            .calls()
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::AddLine { id, geometry, .. } => Some((id.clone(), geometry.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, LayerId::route_glow());
        assert_eq!(lines[1].0, LayerId::route_line());
        assert!(Arc::ptr_eq(&lines[0].1, &lines[1].1));
        assert_eq!(lines[0].1.len(), 3);
    }

    #[test]
    fn malformed_route_removes_old_and_is_not_redecoded() {
        let mut r = ready();
        r.submit(Scene::new().with_route(ROUTE));
        r.surface_mut().take_calls();

        let report = r.submit(Scene::new().with_route("abc!"));
        assert_eq!(report.route, Some(EntityChange::Removed));
        assert!(matches!(
            report.failures.as_slice(),
            [OverlayError::MalformedRoute(_)]
        ));
        assert!(r.surface().live_lines().is_empty());
        r.surface_mut().take_calls();

        let report = r.submit(Scene::new().with_route("abc!"));
        assert!(report.failures.is_empty());
        assert!(r.surface().calls().is_empty());
        assert_eq!(r.events().count(EventKind::MalformedRoute), 1);
    }

    #[test]
    fn half_drawn_route_is_rolled_back_and_retried() {
        let mut r = ready();
        r.surface_mut().fail_on(CallKind::AddLine, Some("route-line"));
        let report = r.submit(Scene::new().with_route(ROUTE));
        assert_eq!(report.route, None);
        assert_eq!(report.failures.len(), 1);
        assert!(r.surface().live_lines().is_empty());
        assert!(r.rendered().route.is_none());

        r.surface_mut().clear_failures();
        let report = r.submit(Scene::new().with_route(ROUTE));
        assert_eq!(report.route, Some(EntityChange::Added));
        assert_eq!(r.surface().live_lines().len(), 2);
    }

    #[test]
    fn blank_route_removes_the_drawn_one() {
        let mut r = ready();
        r.submit(Scene::new().with_route(ROUTE));
        let report = r.submit(Scene::new().with_route("   "));
        assert_eq!(report.route, Some(EntityChange::Removed));
        assert_eq!(r.surface().count(CallKind::RemoveLine), 2);
        assert_eq!(r.metrics().counter(Counter::RoutesRemoved), 1);
    }

    #[test]
    fn pin_moves_below_epsilon_are_ignored() {
        let mut r = ready();
        r.submit(Scene::new().with_location_pin(Coordinate::new(10.0, 10.0)));
        r.surface_mut().take_calls();

        let report = r.submit(Scene::new().with_location_pin(Coordinate::new(10.000_000_01, 10.0)));
        assert!(report.is_noop());
        assert!(r.surface().calls().is_empty());

        let report = r.submit(Scene::new().with_location_pin(Coordinate::new(11.0, 10.0)));
        assert_eq!(report.location_pin, Some(EntityChange::Replaced));
        assert_eq!(
            r.surface().calls()[..2]
                .iter()
                .map(SurfaceCall::kind)
                .collect::<Vec<_>>(),
            vec![CallKind::RemoveMarker, CallKind::AddMarker]
        );
        assert_eq!(
            r.surface().calls().last(),
            Some(&SurfaceCall::FlyTo {
                center: Coordinate::new(11.0, 10.0),
                zoom: OverlayConfig::default().pin_zoom,
            })
        );
    }

    #[test]
    fn pin_pulses_until_removed() {
        let mut r = ready();
        r.submit(Scene::new().with_location_pin(Coordinate::new(1.0, 1.0)));
        assert!(r.is_animating());

        r.animate(Frame::fixed(1, 0.75));
        let Some(SurfaceCall::PinPulse { key, pulse }) = r.surface().calls().last() else {
            panic!("expected a pulse update");
        };
        assert_eq!(key, &MarkerKey::LocationPin);
        assert!((pulse.scale - 1.8).abs() < 1e-5);

        let report = r.submit(Scene::new());
        assert_eq!(report.location_pin, Some(EntityChange::Removed));
        assert!(!r.is_animating());
        r.surface_mut().take_calls();
        r.animate(Frame::fixed(2, 0.75));
        assert!(r.surface().calls().is_empty());
    }

    #[test]
    fn feed_with_dirty_pin_renders_at_parsed_position() {
        let feed = SceneFeed::from_json_str(
            r#"{
                "markers": [{"id": 1, "type": "shelter", "lat": "40.7", "lng": -74.01, "title": "Shelter A"}],
                "routeEncoding": "  ",
                "locationPin": {"lat": "40.71abc", "lng": -74.0}
            }"#,
        )
        .unwrap();
        let mut r = ready();
        let report = r.submit(build_scene(&feed));
        assert!(report.failures.is_empty());
        assert_eq!(r.rendered().pin, Some(Coordinate::new(40.71, -74.0)));
        assert!(r.rendered().route.is_none());
        assert!(r.surface().live_markers().contains(&MarkerKey::LocationPin));
        assert_eq!(report.fit, Some(ViewportIntent::LocationPin));
    }

    #[test]
    fn scenes_before_ready_are_buffered_and_last_one_wins() {
        let mut r = Reconciler::new(RecordingSurface::new(), OverlayConfig::default());
        assert!(!r.is_ready());
        let a = r.submit(Scene::new().with_markers(vec![marker(1, 0.0, 0.0)]));
        let b = r.submit(Scene::new().with_markers(vec![marker(2, 0.0, 0.0)]));
        assert!(a.buffered && b.buffered);
        assert_eq!(b.failures, vec![OverlayError::NotReady]);
        assert!(r.surface().calls().is_empty());
        assert_eq!(r.events().count(EventKind::NotReady), 2);
        assert_eq!(r.metrics().counter(Counter::BufferedScenes), 2);
        assert_eq!(r.metrics().counter(Counter::Failures), 0);

        let report = r.mark_ready().unwrap();
        assert_eq!(report.markers_added, 1);
        assert_eq!(
            r.surface().live_markers().iter().cloned().collect::<Vec<_>>(),
            vec![marker_key(2)]
        );
        assert!(r.mark_ready().is_none());
    }

    #[test]
    fn teardown_releases_everything() {
        let mut r = ready();
        r.submit(full_scene());
        assert_eq!(r.teardown(), 7);
        assert!(!r.surface().has_live_handles());
        assert!(!r.is_animating());
        assert!(r.rendered().is_empty());
        assert_eq!(r.metrics().gauge(Gauge::LiveAreaLayers), Some(0));

        // A torn-down engine waits for the next surface to become ready.
        assert!(r.submit(full_scene()).buffered);
        let surface = r.into_surface();
        assert!(!surface.has_live_handles());
    }

    #[test]
    fn marker_click_hands_over_full_record() {
        let mut r = ready();
        let seen: Rc<RefCell<Vec<Marker>>> = Rc::default();
        let sink = Rc::clone(&seen);
        r.on_marker_click(move |m| sink.borrow_mut().push(m.clone()));

        let shelter = marker(3, 4.0, 5.0).with_detail("120 beds");
        r.submit(Scene::new().with_markers(vec![shelter.clone()]));

        assert!(r.handle_marker_click(&OverlayId::Int(3)));
        assert!(!r.handle_marker_click(&OverlayId::from("3")));
        assert_eq!(seen.borrow().as_slice(), &[shelter]);
    }

    #[test]
    fn borrowed_surface_outlives_the_engine() {
        let mut surface = RecordingSurface::new();
        {
            let mut r = Reconciler::new(&mut surface, OverlayConfig::default());
            r.mark_ready();
            r.submit(Scene::new().with_route(ROUTE));
        }
        assert_eq!(surface.live_lines().len(), 2);
    }

    #[test]
    fn headless_surface_tracks_state_without_drawing() {
        let mut r = Reconciler::new(NoopSurface, OverlayConfig::default());
        r.mark_ready();
        let report = r.submit(full_scene());
        assert!(report.failures.is_empty());
        assert_eq!(r.rendered().area_layer_count(), 2);
        assert!(r.submit(full_scene()).is_noop());
        assert_eq!(r.teardown(), 7);
    }
}
