use crate::coord::Coordinate;

/// Axis-aligned geographic bounds (south-west / north-east corners).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl GeoBounds {
    pub fn from_point(point: Coordinate) -> Self {
        Self {
            south_west: point,
            north_east: point,
        }
    }

    /// Smallest bounds covering every coordinate, or `None` for an empty input.
    pub fn from_coordinates<'a>(points: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut bounds = Self::from_point(*iter.next()?);
        for p in iter {
            bounds.extend(*p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: Coordinate) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south_west.lat + self.north_east.lat) * 0.5,
            (self.south_west.lng + self.north_east.lng) * 0.5,
        )
    }

    /// True when the bounds have zero extent on both axes.
    pub fn is_point(&self) -> bool {
        self.south_west == self.north_east
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;
    use crate::coord::Coordinate;

    #[test]
    fn empty_input_has_no_bounds() {
        assert!(GeoBounds::from_coordinates(&[]).is_none());
    }

    #[test]
    fn covers_all_points() {
        let pts = [
            Coordinate::new(40.7, -74.0),
            Coordinate::new(34.0, -118.2),
            Coordinate::new(41.9, -87.6),
        ];
        let b = GeoBounds::from_coordinates(&pts).unwrap();
        assert_eq!(b.south_west, Coordinate::new(34.0, -118.2));
        assert_eq!(b.north_east, Coordinate::new(41.9, -74.0));
        assert!(pts.iter().all(|p| b.contains(*p)));
        assert!(!b.is_point());
    }

    #[test]
    fn single_point_is_degenerate() {
        let b = GeoBounds::from_coordinates(&[Coordinate::new(1.0, 2.0)]).unwrap();
        assert!(b.is_point());
        assert_eq!(b.center(), Coordinate::new(1.0, 2.0));
    }
}
