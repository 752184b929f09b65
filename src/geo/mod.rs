//! Geographic primitives: coordinates, projection, viewport, boundaries.

pub mod boundaries;
pub mod projection;
pub mod regions;
pub mod viewport;

/// Longitude/latitude pair in degrees. Immutable value type.
///
/// Invariant: lon in [-180, 180], lat in [-90, 90], both finite. Invalid
/// input degrades to [`GeoPoint::ORIGIN`] instead of carrying NaN into the
/// projection math.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Safe sentinel for unrepresentable coordinates.
    pub const ORIGIN: GeoPoint = GeoPoint { lon: 0.0, lat: 0.0 };

    /// Build a point, degrading out-of-range or non-finite values to the
    /// origin sentinel.
    pub fn new(lon: f64, lat: f64) -> Self {
        if Self::in_range(lon, lat) {
            Self { lon, lat }
        } else {
            Self::ORIGIN
        }
    }

    /// Build a point only if the coordinates are representable.
    pub fn try_new(lon: f64, lat: f64) -> Option<Self> {
        Self::in_range(lon, lat).then_some(Self { lon, lat })
    }

    fn in_range(lon: f64, lat: f64) -> bool {
        lon.is_finite() && lat.is_finite() && (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
    }
}
