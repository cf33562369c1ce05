use foundation::{Coordinate, GeoBounds};
use scene::ViewportIntent;
use surface::{FitOptions, MapSurface, SurfaceError};

use crate::config::OverlayConfig;
use crate::rendered::RenderedState;

/// Camera move issued to the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum FitRequest {
    Bounds {
        bounds: GeoBounds,
        options: FitOptions,
    },
    FlyTo {
        center: Coordinate,
        zoom: f64,
    },
}

impl FitRequest {
    pub fn issue<S: MapSurface + ?Sized>(&self, surface: &mut S) -> Result<(), SurfaceError> {
        match self {
            FitRequest::Bounds { bounds, options } => {
                surface.fit_bounds(&[bounds.south_west, bounds.north_east], options)
            }
            FitRequest::FlyTo { center, zoom } => surface.fly_to(*center, *zoom),
        }
    }
}

/// Builds the camera request for `intent` from what is actually rendered.
///
/// Returns `None` when the chosen set has nothing to look at.
pub fn plan_fit(
    intent: ViewportIntent,
    rendered: &RenderedState,
    config: &OverlayConfig,
) -> Option<FitRequest> {
    match intent {
        ViewportIntent::DisasterAreas => fit_points(
            rendered.areas.iter().flat_map(|a| a.ring.iter()),
            config,
        ),
        ViewportIntent::Route => {
            let route = rendered.route.as_ref()?;
            fit_points(route.geometry.iter(), config)
        }
        ViewportIntent::LocationPin => rendered.pin.map(|center| FitRequest::FlyTo {
            center,
            zoom: config.pin_zoom,
        }),
        ViewportIntent::Markers => fit_points(rendered.markers.values().map(|m| &m.position), config),
    }
}

fn fit_points<'a>(
    points: impl IntoIterator<Item = &'a Coordinate>,
    config: &OverlayConfig,
) -> Option<FitRequest> {
    let bounds = GeoBounds::from_coordinates(points)?;
    if bounds.is_point() {
        return Some(FitRequest::FlyTo {
            center: bounds.center(),
            zoom: config.point_zoom,
        });
    }
    Some(FitRequest::Bounds {
        bounds,
        options: config.fit_options(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{FitRequest, plan_fit};
    use crate::config::OverlayConfig;
    use crate::rendered::{RenderedArea, RenderedState};
    use foundation::{Coordinate, OverlayId};
    use scene::{Marker, MarkerCategory, ViewportIntent};

    fn marker(id: i64, lat: f64, lng: f64) -> Marker {
        Marker::new(id, MarkerCategory::General, Coordinate::new(lat, lng), "m")
    }

    #[test]
    fn single_marker_flies_to_point() {
        let mut r = RenderedState::default();
        r.markers.insert(OverlayId::Int(1), marker(1, 10.0, 20.0));
        let cfg = OverlayConfig::default();
        assert_eq!(
            plan_fit(ViewportIntent::Markers, &r, &cfg),
            Some(FitRequest::FlyTo {
                center: Coordinate::new(10.0, 20.0),
                zoom: cfg.point_zoom
            })
        );
    }

    #[test]
    fn areas_fit_their_combined_bounds() {
        let mut r = RenderedState::default();
        r.areas.push(RenderedArea {
            id: OverlayId::from("a"),
            ring: Arc::from(vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)]),
            layers: vec![],
        });
        r.areas.push(RenderedArea {
            id: OverlayId::from("b"),
            ring: Arc::from(vec![Coordinate::new(-2.0, 3.0)]),
            layers: vec![],
        });
        let Some(FitRequest::Bounds { bounds, .. }) =
            plan_fit(ViewportIntent::DisasterAreas, &r, &OverlayConfig::default())
        else {
            panic!("expected bounds fit");
        };
        assert_eq!(bounds.south_west, Coordinate::new(-2.0, 0.0));
        assert_eq!(bounds.north_east, Coordinate::new(1.0, 3.0));
    }

    #[test]
    fn missing_set_plans_nothing() {
        let r = RenderedState::default();
        assert_eq!(plan_fit(ViewportIntent::Route, &r, &OverlayConfig::default()), None);
        assert_eq!(
            plan_fit(ViewportIntent::LocationPin, &r, &OverlayConfig::default()),
            None
        );
    }
}
