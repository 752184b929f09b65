//! Equirectangular map projection with a defensive fit-and-validate step.
//!
//! Boundary datasets come from a potentially failing external source, so a
//! bad fit must never poison rendering: `fit_to` keeps the previous
//! configuration unless the new one survives a probe, and `project` is total
//! over any input including NaN.

use super::boundaries::CountryFeature;
use super::GeoPoint;

/// Default Mercator-like configuration (scale 150, centered on 0E 20N).
const DEFAULT_SCALE: f64 = 150.0;
const DEFAULT_CENTER: (f64, f64) = (0.0, 20.0);

/// Fraction of the viewport the fitted dataset should occupy.
const FIT_MARGIN: f64 = 0.95;

#[derive(Clone, Copy, Debug)]
pub struct Projection {
    scale: f64,
    center: (f64, f64),
    translate: (f64, f64),
}

impl Projection {
    pub fn new(viewport_w: f64, viewport_h: f64) -> Self {
        Self {
            scale: DEFAULT_SCALE,
            center: DEFAULT_CENTER,
            translate: (viewport_w / 2.0, viewport_h / 2.0),
        }
    }

    /// Map (lon, lat) degrees to viewport coordinates. Total: invalid input
    /// or a non-finite result yields (0, 0).
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let Some(p) = GeoPoint::try_new(lon, lat) else {
            return (0.0, 0.0);
        };
        let lat_stretch = self.center.1.to_radians().cos().max(0.2);
        let x = self.translate.0 + (p.lon - self.center.0).to_radians() * self.scale * lat_stretch;
        let y = self.translate.1 - (p.lat - self.center.1).to_radians() * self.scale;
        if x.is_finite() && y.is_finite() {
            (x, y)
        } else {
            (0.0, 0.0)
        }
    }

    /// Inverse of [`project`](Self::project) for finite inputs.
    pub fn unproject(&self, x: f64, y: f64) -> GeoPoint {
        let lat_stretch = self.center.1.to_radians().cos().max(0.2);
        let lon = self.center.0 + ((x - self.translate.0) / (self.scale * lat_stretch)).to_degrees();
        let lat = self.center.1 - ((y - self.translate.1) / self.scale).to_degrees();
        GeoPoint::new(lon, lat)
    }

    /// Fit scale/center/translate so every polygon of `features` lands inside
    /// the viewport. Keeps the current configuration when the dataset has no
    /// usable coordinates or the fitted candidate fails the probe.
    pub fn fit_to(&mut self, features: &[CountryFeature], viewport_w: f64, viewport_h: f64) {
        self.translate = (viewport_w / 2.0, viewport_h / 2.0);

        let Some((min_lon, min_lat, max_lon, max_lat)) = bounds(features) else {
            return;
        };

        let center = ((min_lon + max_lon) / 2.0, (min_lat + max_lat) / 2.0);
        let lat_stretch = center.1.to_radians().cos().max(0.2);
        let lon_span = ((max_lon - min_lon).to_radians() * lat_stretch).max(1e-6);
        let lat_span = (max_lat - min_lat).to_radians().max(1e-6);
        let scale = FIT_MARGIN * (viewport_w / lon_span).min(viewport_h / lat_span);

        let candidate = Self {
            scale,
            center,
            translate: self.translate,
        };

        // Probe before adopting: a degenerate fit must not replace a working one.
        let (px, py) = candidate.project(0.0, 0.0);
        if candidate.scale.is_finite() && candidate.scale > 0.0 && px.is_finite() && py.is_finite() {
            *self = candidate;
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

fn bounds(features: &[CountryFeature]) -> Option<(f64, f64, f64, f64)> {
    let mut min_lon = f64::INFINITY;
    let mut min_lat = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut seen = false;

    for feature in features {
        for ring in feature.rings() {
            for &(lon, lat) in ring {
                if GeoPoint::try_new(lon, lat).is_none() {
                    continue;
                }
                min_lon = min_lon.min(lon);
                min_lat = min_lat.min(lat);
                max_lon = max_lon.max(lon);
                max_lat = max_lat.max(lat);
                seen = true;
            }
        }
    }

    (seen && max_lon > min_lon && max_lat > min_lat).then_some((min_lon, min_lat, max_lon, max_lat))
}
