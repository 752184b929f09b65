//! Coordinate → country-code fallback for events that arrive without one.
//!
//! An explicit ordered rule table rather than an if-chain: earlier rules win,
//! so narrow regions (Japan, South Korea, the UK) are listed before the broad
//! boxes that would otherwise swallow them. Coordinates matching no rule are
//! simply unattributed; plenty of valid ocean traffic has no mapped region.

#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub code: &'static str,
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Rule {
    const fn new(code: &'static str, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self { code, min_lon, min_lat, max_lon, max_lat }
    }

    fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// Evaluated top to bottom; first hit wins.
pub const RULES: &[Rule] = &[
    // Islands and peninsulas before the continental boxes that overlap them.
    Rule::new("jp", 129.0, 31.0, 146.0, 45.5),
    Rule::new("kr", 126.0, 34.0, 130.0, 39.0),
    Rule::new("gb", -8.5, 49.8, 2.0, 59.5),
    Rule::new("it", 7.0, 36.5, 18.5, 47.0),
    Rule::new("es", -9.5, 36.0, 3.5, 43.8),
    Rule::new("tr", 26.0, 36.0, 45.0, 42.0),
    // Western/central Europe sub-regions.
    Rule::new("fr", -5.0, 42.3, 8.2, 51.1),
    Rule::new("de", 5.9, 47.3, 15.0, 55.1),
    Rule::new("ua", 22.0, 44.0, 40.2, 52.4),
    Rule::new("se", 11.0, 55.0, 24.2, 69.1),
    // Large-area countries.
    Rule::new("us", -125.0, 24.5, -66.9, 49.4),
    Rule::new("ca", -141.0, 49.0, -52.6, 70.0),
    Rule::new("mx", -117.2, 14.5, -86.7, 32.7),
    Rule::new("br", -74.0, -33.8, -34.8, 5.3),
    Rule::new("ar", -73.6, -55.1, -53.6, -21.8),
    Rule::new("in", 68.1, 6.7, 97.4, 35.5),
    Rule::new("cn", 73.5, 18.2, 134.8, 53.6),
    Rule::new("ru", 30.0, 50.0, 180.0, 77.0),
    Rule::new("ir", 44.0, 25.0, 63.3, 39.8),
    Rule::new("eg", 24.7, 22.0, 36.9, 31.7),
    Rule::new("ng", 2.7, 4.2, 14.7, 13.9),
    Rule::new("za", 16.4, -34.9, 32.9, -22.1),
    Rule::new("id", 95.0, -11.0, 141.0, 6.1),
    Rule::new("au", 112.9, -39.2, 153.7, -10.6),
];

/// Resolve a coordinate to a country code, first matching rule wins.
pub fn country_for(lon: f64, lat: f64) -> Option<&'static str> {
    if !lon.is_finite() || !lat.is_finite() {
        return None;
    }
    RULES.iter().find(|r| r.contains(lon, lat)).map(|r| r.code)
}
