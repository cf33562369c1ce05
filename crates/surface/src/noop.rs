use foundation::Coordinate;
use layers::{LayerId, LineStyle, MarkerKey, PolygonPaint};

use crate::surface::{FitOptions, Geometry, MapSurface, MarkerHandle, SurfaceError};

/// Surface that accepts every call and draws nothing.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopSurface;

impl MapSurface for NoopSurface {
    fn add_marker(&mut self, _marker: &MarkerHandle) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn remove_marker(&mut self, _key: &MarkerKey) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn add_line(
        &mut self,
        _id: &LayerId,
        _geometry: &Geometry,
        _style: &LineStyle,
    ) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn remove_line(&mut self, _id: &LayerId) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn add_polygon(
        &mut self,
        _id: &LayerId,
        _ring: &Geometry,
        _paint: &PolygonPaint,
    ) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn remove_polygon(&mut self, _id: &LayerId) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn fit_bounds(
        &mut self,
        _coords: &[Coordinate],
        _options: &FitOptions,
    ) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn fly_to(&mut self, _center: Coordinate, _zoom: f64) -> Result<(), SurfaceError> {
        Ok(())
    }
}
