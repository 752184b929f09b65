//! Country boundary store.
//!
//! Loads a GeoJSON-style FeatureCollection from a configured URL and falls
//! back to a built-in set of simplified rectangular boundaries whenever the
//! fetch or the schema disappoints. The map is renderable with zero network
//! connectivity; degraded shapes are the only visible consequence.

use serde::Deserialize;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(4);

/// Simplified rectangular boundaries: (code, name, min_lon, min_lat, max_lon, max_lat).
/// Coarse on purpose; these only need to be recognizable at world zoom.
const BUILTIN_BOXES: &[(&str, &str, f64, f64, f64, f64)] = &[
    ("us", "United States", -125.0, 25.0, -66.0, 49.0),
    ("ca", "Canada", -140.0, 49.0, -55.0, 70.0),
    ("mx", "Mexico", -117.0, 14.0, -86.0, 32.0),
    ("br", "Brazil", -74.0, -33.0, -35.0, 5.0),
    ("ar", "Argentina", -73.0, -55.0, -53.0, -22.0),
    ("gb", "United Kingdom", -8.0, 50.0, 2.0, 59.0),
    ("fr", "France", -5.0, 42.0, 8.0, 51.0),
    ("de", "Germany", 6.0, 47.0, 15.0, 55.0),
    ("es", "Spain", -9.0, 36.0, 3.0, 44.0),
    ("it", "Italy", 7.0, 37.0, 18.0, 47.0),
    ("se", "Sweden", 11.0, 55.0, 24.0, 69.0),
    ("ua", "Ukraine", 22.0, 44.0, 40.0, 52.0),
    ("ru", "Russia", 30.0, 50.0, 180.0, 72.0),
    ("tr", "Turkey", 26.0, 36.0, 45.0, 42.0),
    ("cn", "China", 74.0, 18.0, 135.0, 53.0),
    ("in", "India", 68.0, 7.0, 97.0, 35.0),
    ("jp", "Japan", 129.0, 31.0, 146.0, 45.0),
    ("kr", "South Korea", 126.0, 34.0, 130.0, 39.0),
    ("ir", "Iran", 44.0, 25.0, 63.0, 40.0),
    ("za", "South Africa", 16.0, -35.0, 33.0, -22.0),
    ("ng", "Nigeria", 3.0, 4.0, 15.0, 14.0),
    ("eg", "Egypt", 25.0, 22.0, 35.0, 31.0),
    ("au", "Australia", 113.0, -39.0, 154.0, -11.0),
    ("id", "Indonesia", 95.0, -11.0, 141.0, 6.0),
];

/// One country's renderable boundary: the outer ring of each polygon.
#[derive(Clone, Debug)]
pub struct CountryFeature {
    pub code: String,
    pub name: String,
    rings: Vec<Vec<(f64, f64)>>,
}

impl CountryFeature {
    pub fn rings(&self) -> &[Vec<(f64, f64)>] {
        &self.rings
    }

    /// Even-odd point-in-polygon test over all rings.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.rings.iter().any(|ring| ring_contains(ring, lon, lat))
    }
}

fn ring_contains(ring: &[(f64, f64)], lon: f64, lat: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

// ============================================================================
// GeoJSON wire model
// ============================================================================

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    features: serde_json::Value,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    properties: RawProperties,
    geometry: Option<RawGeometry>,
}

#[derive(Deserialize, Default)]
struct RawProperties {
    #[serde(default, alias = "NAME", alias = "ADMIN")]
    name: Option<String>,
    #[serde(default, alias = "ISO_A3")]
    iso_a3: Option<String>,
    #[serde(default, alias = "ISO_A2")]
    iso_a2: Option<String>,
}

/// Positions are `Vec<f64>` rather than pairs: real-world datasets mix in
/// altitude triples.
#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
}

fn outer_rings(geometry: RawGeometry) -> Vec<Vec<(f64, f64)>> {
    let polygons = match geometry {
        RawGeometry::Polygon { coordinates } => vec![coordinates],
        RawGeometry::MultiPolygon { coordinates } => coordinates,
    };
    polygons
        .into_iter()
        .filter_map(|mut polygon| {
            if polygon.is_empty() {
                return None;
            }
            let ring: Vec<(f64, f64)> = polygon
                .swap_remove(0)
                .into_iter()
                .filter_map(|pos| match pos.as_slice() {
                    [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some((*lon, *lat)),
                    _ => None,
                })
                .collect();
            (ring.len() >= 3).then_some(ring)
        })
        .collect()
}

/// Parse and validate a FeatureCollection body. Pure so the schema checks are
/// testable without a server.
pub fn parse_collection(body: &str) -> Result<Vec<CountryFeature>, String> {
    let raw: RawCollection =
        serde_json::from_str(body).map_err(|e| format!("invalid JSON: {e}"))?;
    if raw.kind != "FeatureCollection" {
        return Err(format!("expected FeatureCollection, got {:?}", raw.kind));
    }
    let Some(items) = raw.features.as_array() else {
        return Err("features is not an array".into());
    };

    // Per-feature tolerance: one malformed feature drops that feature, not the dataset.
    let mut features = Vec::with_capacity(items.len());
    for item in items {
        let Ok(feature) = serde_json::from_value::<RawFeature>(item.clone()) else {
            continue;
        };
        let code = feature
            .id
            .or(feature.properties.iso_a3)
            .or(feature.properties.iso_a2)
            .map(|c| c.to_lowercase());
        let (Some(code), Some(geometry)) = (code, feature.geometry) else {
            continue;
        };
        let rings = outer_rings(geometry);
        if rings.is_empty() {
            continue;
        }
        features.push(CountryFeature {
            name: feature.properties.name.unwrap_or_else(|| code.clone()),
            code,
            rings,
        });
    }

    if features.is_empty() {
        return Err("no usable polygon features".into());
    }
    Ok(features)
}

// ============================================================================
// Boundary store
// ============================================================================

pub struct BoundaryStore {
    features: Vec<CountryFeature>,
    version: u64,
    source: String,
    fallback_reason: Option<String>,
}

impl BoundaryStore {
    /// Built-in dataset only; never fails.
    pub fn fallback() -> Self {
        Self {
            features: builtin_features(),
            version: 0,
            source: "built-in".into(),
            fallback_reason: None,
        }
    }

    /// Fetch from `url` when configured; any failure degrades to the built-in
    /// dataset with the reason recorded for the status line.
    pub fn load(url: Option<&str>) -> Self {
        let mut store = Self::fallback();
        if let Some(url) = url {
            store.reload(url);
        }
        store
    }

    /// Replace the dataset atomically: the new feature set is fully parsed
    /// before the swap, and the version bump invalidates consumer caches.
    pub fn reload(&mut self, url: &str) {
        match fetch_collection(url) {
            Ok(features) => {
                self.features = features;
                self.source = url.to_string();
                self.fallback_reason = None;
            }
            Err(reason) => {
                self.features = builtin_features();
                self.source = "built-in".into();
                self.fallback_reason = Some(reason);
            }
        }
        self.version += 1;
    }

    pub fn features(&self) -> &[CountryFeature] {
        &self.features
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    /// First country whose boundary contains the coordinate.
    pub fn country_at(&self, lon: f64, lat: f64) -> Option<&CountryFeature> {
        self.features.iter().find(|f| f.contains(lon, lat))
    }
}

fn fetch_collection(url: &str) -> Result<Vec<CountryFeature>, String> {
    let response = ureq::get(url)
        .timeout(FETCH_TIMEOUT)
        .call()
        .map_err(|e| format!("fetch failed: {e}"))?;
    let body = response
        .into_string()
        .map_err(|e| format!("read failed: {e}"))?;
    parse_collection(&body)
}

fn builtin_features() -> Vec<CountryFeature> {
    BUILTIN_BOXES
        .iter()
        .map(|&(code, name, min_lon, min_lat, max_lon, max_lat)| CountryFeature {
            code: code.into(),
            name: name.into(),
            rings: vec![vec![
                (min_lon, min_lat),
                (max_lon, min_lat),
                (max_lon, max_lat),
                (min_lon, max_lat),
                (min_lon, min_lat),
            ]],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_dataset_is_never_empty() {
        let store = BoundaryStore::fallback();
        assert!(!store.features().is_empty());
        assert!(store.fallback_reason().is_none());
        assert_eq!(store.source(), "built-in");
    }

    #[test]
    fn wrong_collection_type_is_rejected() {
        let err = parse_collection(r#"{"type": "NotAFeatureCollection", "features": []}"#);
        assert!(err.is_err());
    }

    #[test]
    fn non_array_features_is_rejected() {
        let err = parse_collection(r#"{"type": "FeatureCollection", "features": 7}"#);
        assert!(err.is_err());
    }

    #[test]
    fn garbage_body_is_rejected() {
        assert!(parse_collection("<html>504</html>").is_err());
    }

    #[test]
    fn parses_polygon_and_multipolygon() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "id": "FRA",
                    "properties": {"name": "France", "iso_a3": "FRA"},
                    "geometry": {"type": "Polygon", "coordinates": [[[0,42],[8,42],[8,51],[0,51],[0,42]]]}
                },
                {
                    "properties": {"name": "Japan", "iso_a3": "JPN"},
                    "geometry": {"type": "MultiPolygon", "coordinates": [
                        [[[129,31],[146,31],[146,45],[129,45],[129,31]]],
                        [[[122,24],[125,24],[125,26],[122,26],[122,24]]]
                    ]}
                },
                {"properties": {}, "geometry": null}
            ]
        }"#;
        let features = parse_collection(body).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].code, "fra");
        assert_eq!(features[1].code, "jpn");
        assert_eq!(features[1].rings().len(), 2);
    }

    #[test]
    fn feature_without_identity_is_skipped() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {"properties": {"name": "Nowhere"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
            ]
        }"#;
        assert!(parse_collection(body).is_err());
    }

    #[test]
    fn builtin_contains_lookup_matches_rectangles() {
        let store = BoundaryStore::fallback();
        assert_eq!(store.country_at(-100.0, 40.0).map(|f| f.code.as_str()), Some("us"));
        assert_eq!(store.country_at(139.7, 35.7).map(|f| f.code.as_str()), Some("jp"));
        // Middle of the Pacific maps to nothing.
        assert!(store.country_at(-150.0, 0.0).is_none());
    }
}
