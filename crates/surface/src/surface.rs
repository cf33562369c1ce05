//! Boundary to the actual map rendering technology.
//!
//! The overlay engine drives any implementation of [`MapSurface`]; it does not
//! know about tiles, projections or the UI toolkit hosting the map.

use std::fmt;
use std::sync::Arc;

use foundation::Coordinate;
use layers::{LayerId, LineStyle, MarkerKey, MarkerStyle, PolygonPaint};
use runtime::PulseSample;
use serde::Serialize;

/// Shared vertex list. Layers drawn from one source hold the same allocation.
pub type Geometry = Arc<[Coordinate]>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Everything the surface needs to materialize one point handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerHandle {
    pub key: MarkerKey,
    pub position: Coordinate,
    pub style: MarkerStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup: Option<Popup>,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct FitOptions {
    pub padding_px: f32,
    pub max_zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The surface refused the call.
    Rejected { call: &'static str, reason: String },
    /// The handle or layer is not on the surface.
    UnknownHandle(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::Rejected { call, reason } => write!(f, "{call} rejected: {reason}"),
            SurfaceError::UnknownHandle(id) => write!(f, "unknown handle: {id}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

pub trait MapSurface {
    fn add_marker(&mut self, marker: &MarkerHandle) -> Result<(), SurfaceError>;
    fn remove_marker(&mut self, key: &MarkerKey) -> Result<(), SurfaceError>;

    fn add_line(
        &mut self,
        id: &LayerId,
        geometry: &Geometry,
        style: &LineStyle,
    ) -> Result<(), SurfaceError>;
    fn remove_line(&mut self, id: &LayerId) -> Result<(), SurfaceError>;

    fn add_polygon(
        &mut self,
        id: &LayerId,
        ring: &Geometry,
        paint: &PolygonPaint,
    ) -> Result<(), SurfaceError>;
    fn remove_polygon(&mut self, id: &LayerId) -> Result<(), SurfaceError>;

    fn fit_bounds(&mut self, coords: &[Coordinate], options: &FitOptions)
    -> Result<(), SurfaceError>;
    fn fly_to(&mut self, center: Coordinate, zoom: f64) -> Result<(), SurfaceError>;

    /// Applies one animation sample to a pulsing handle. Surfaces that animate
    /// natively can ignore this.
    fn set_pin_pulse(&mut self, _key: &MarkerKey, _pulse: PulseSample) -> Result<(), SurfaceError> {
        Ok(())
    }
}

impl<S: MapSurface + ?Sized> MapSurface for &mut S {
    fn add_marker(&mut self, marker: &MarkerHandle) -> Result<(), SurfaceError> {
        (**self).add_marker(marker)
    }

    fn remove_marker(&mut self, key: &MarkerKey) -> Result<(), SurfaceError> {
        (**self).remove_marker(key)
    }

    fn add_line(
        &mut self,
        id: &LayerId,
        geometry: &Geometry,
        style: &LineStyle,
    ) -> Result<(), SurfaceError> {
        (**self).add_line(id, geometry, style)
    }

    fn remove_line(&mut self, id: &LayerId) -> Result<(), SurfaceError> {
        (**self).remove_line(id)
    }

    fn add_polygon(
        &mut self,
        id: &LayerId,
        ring: &Geometry,
        paint: &PolygonPaint,
    ) -> Result<(), SurfaceError> {
        (**self).add_polygon(id, ring, paint)
    }

    fn remove_polygon(&mut self, id: &LayerId) -> Result<(), SurfaceError> {
        (**self).remove_polygon(id)
    }

    fn fit_bounds(
        &mut self,
        coords: &[Coordinate],
        options: &FitOptions,
    ) -> Result<(), SurfaceError> {
        (**self).fit_bounds(coords, options)
    }

    fn fly_to(&mut self, center: Coordinate, zoom: f64) -> Result<(), SurfaceError> {
        (**self).fly_to(center, zoom)
    }

    fn set_pin_pulse(&mut self, key: &MarkerKey, pulse: PulseSample) -> Result<(), SurfaceError> {
        (**self).set_pin_pulse(key, pulse)
    }
}
