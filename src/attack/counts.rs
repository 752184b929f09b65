//! Per-country attack aggregation for the choropleth layer.
//!
//! Counts accumulate monotonically for the session; they are a historical
//! tally, deliberately decoupled from the transient line set. Events without
//! a country code fall back to the ordered bounding-box rules; events that
//! match nothing are dropped from aggregation without being an error.

use super::AttackEvent;
use crate::geo::regions;
use std::collections::HashMap;

/// Choropleth intensity band, derived from a country's cumulative count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreatBand {
    None,
    Minimal,  // 1..5
    Low,      // 5..20
    Moderate, // 20..50
    High,     // 50..100
    Severe,   // >= 100
}

impl ThreatBand {
    pub fn from_count(count: u64) -> Self {
        match count {
            0 => ThreatBand::None,
            1..=4 => ThreatBand::Minimal,
            5..=19 => ThreatBand::Low,
            20..=49 => ThreatBand::Moderate,
            50..=99 => ThreatBand::High,
            _ => ThreatBand::Severe,
        }
    }
}

/// Owned aggregation store; the only writer of the count map.
pub struct CountryCounts {
    counts: HashMap<String, u64>,
    /// Bumped on every accepted record; consumers use it for cache invalidation.
    revision: u64,
    unattributed: u64,
}

impl CountryCounts {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            revision: 0,
            unattributed: 0,
        }
    }

    /// Attribute one event. Explicit country code wins; otherwise the source
    /// coordinate is resolved through the region rules.
    pub fn record(&mut self, event: &AttackEvent) {
        let code = event
            .country_code
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| c.to_lowercase())
            .or_else(|| {
                event
                    .source_point()
                    .and_then(|p| regions::country_for(p.lon, p.lat))
                    .map(str::to_string)
            });

        match code {
            Some(code) => {
                *self.counts.entry(code).or_insert(0) += 1;
                self.revision += 1;
            }
            None => self.unattributed += 1,
        }
    }

    pub fn count(&self, code: &str) -> u64 {
        self.counts.get(code).copied().unwrap_or(0)
    }

    pub fn band_for(&self, code: &str) -> ThreatBand {
        ThreatBand::from_count(self.count(code))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn unattributed(&self) -> u64 {
        self.unattributed
    }

    /// Countries sorted by count, highest first (status/leaderboard line).
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> =
            self.counts.iter().map(|(c, &n)| (c.as_str(), n)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }
}

impl Default for CountryCounts {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with_code(code: &str) -> AttackEvent {
        AttackEvent {
            country_code: Some(code.into()),
            ..Default::default()
        }
    }

    #[test]
    fn explicit_country_code_is_counted() {
        let mut counts = CountryCounts::new();
        for _ in 0..5 {
            counts.record(&event_with_code("us"));
        }
        assert_eq!(counts.count("us"), 5);
        // Five attacks crosses out of the minimal band.
        assert_eq!(counts.band_for("us"), ThreatBand::Low);
    }

    #[test]
    fn counts_never_decrease() {
        let mut counts = CountryCounts::new();
        let mut last = 0;
        for _ in 0..150 {
            counts.record(&event_with_code("ru"));
            let now = counts.count("ru");
            assert!(now >= last);
            last = now;
        }
        assert_eq!(counts.band_for("ru"), ThreatBand::Severe);
    }

    #[test]
    fn coordinate_fallback_resolves_missing_code() {
        let mut counts = CountryCounts::new();
        let event: AttackEvent =
            serde_json::from_str(r#"{"source": {"lon": 139.7, "lat": 35.7}}"#).unwrap();
        counts.record(&event);
        assert_eq!(counts.count("jp"), 1);
    }

    #[test]
    fn unmatched_coordinates_are_silently_dropped() {
        let mut counts = CountryCounts::new();
        let event: AttackEvent =
            serde_json::from_str(r#"{"source": {"lon": -150.0, "lat": 0.0}}"#).unwrap();
        counts.record(&event);
        assert_eq!(counts.total(), 0);
        assert_eq!(counts.unattributed(), 1);
        assert_eq!(counts.revision(), 0);
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(ThreatBand::from_count(0), ThreatBand::None);
        assert_eq!(ThreatBand::from_count(4), ThreatBand::Minimal);
        assert_eq!(ThreatBand::from_count(5), ThreatBand::Low);
        assert_eq!(ThreatBand::from_count(19), ThreatBand::Low);
        assert_eq!(ThreatBand::from_count(20), ThreatBand::Moderate);
        assert_eq!(ThreatBand::from_count(50), ThreatBand::High);
        assert_eq!(ThreatBand::from_count(99), ThreatBand::High);
        assert_eq!(ThreatBand::from_count(100), ThreatBand::Severe);
        assert_eq!(ThreatBand::from_count(100_000), ThreatBand::Severe);
    }

    #[test]
    fn top_orders_by_count_then_code() {
        let mut counts = CountryCounts::new();
        for _ in 0..3 {
            counts.record(&event_with_code("cn"));
        }
        counts.record(&event_with_code("us"));
        counts.record(&event_with_code("br"));
        let top = counts.top(2);
        assert_eq!(top[0], ("cn", 3));
        assert_eq!(top[1], ("br", 1));
    }
}
