//! Attack events and the stores derived from them.

pub mod counts;
pub mod feed;
pub mod lines;

use crate::geo::GeoPoint;
use serde::Deserialize;

/// Raw coordinate pair as it appears on the wire. Validation happens when the
/// pair is promoted to a [`GeoPoint`], not at parse time.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct WirePoint {
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub lat: f64,
}

/// Attack event as delivered by the external feed. Read-only to the core.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "source_ip")]
    pub source_ip: Option<String>,
    #[serde(default, alias = "country_code")]
    pub country_code: Option<String>,
    #[serde(default, alias = "attack_type")]
    pub attack_type: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub source: Option<WirePoint>,
    #[serde(default)]
    pub destination: Option<WirePoint>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl AttackEvent {
    /// Source coordinates, if present and representable.
    pub fn source_point(&self) -> Option<GeoPoint> {
        self.source.and_then(|p| GeoPoint::try_new(p.lon, p.lat))
    }

    /// Destination coordinates, if present and representable.
    pub fn destination_point(&self) -> Option<GeoPoint> {
        self.destination.and_then(|p| GeoPoint::try_new(p.lon, p.lat))
    }

    pub fn severity(&self) -> Severity {
        self.severity
            .as_deref()
            .map(Severity::parse)
            .unwrap_or(Severity::Medium)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Unknown labels read as Medium rather than failing the event.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "low" | "info" => Severity::Low,
            "high" => Severity::High,
            "critical" | "crit" => Severity::Critical,
            _ => Severity::Medium,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_feed_shape() {
        let event: AttackEvent = serde_json::from_str(
            r#"{
                "id": "evt-1",
                "sourceIp": "203.0.113.7",
                "countryCode": "cn",
                "attackType": "ssh-bruteforce",
                "severity": "high",
                "source": {"lon": 116.4, "lat": 39.9},
                "destination": {"lon": -74.0, "lat": 40.7},
                "timestamp": "2026-08-27T12:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(event.country_code.as_deref(), Some("cn"));
        assert_eq!(event.severity(), Severity::High);
        assert!(event.source_point().is_some());
        assert!(event.destination_point().is_some());
    }

    #[test]
    fn snake_case_aliases_still_parse() {
        let event: AttackEvent = serde_json::from_str(
            r#"{"attack_type": "ddos", "country_code": "ru", "source_ip": "198.51.100.2"}"#,
        )
        .unwrap();
        assert_eq!(event.attack_type, "ddos");
        assert_eq!(event.country_code.as_deref(), Some("ru"));
    }

    #[test]
    fn out_of_range_coordinates_do_not_become_points() {
        let event: AttackEvent =
            serde_json::from_str(r#"{"source": {"lon": 400.0, "lat": 0.0}}"#).unwrap();
        assert!(event.source_point().is_none());
    }

    #[test]
    fn severity_parsing_defaults_to_medium() {
        assert_eq!(Severity::parse("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::parse("weird"), Severity::Medium);
        assert_eq!(AttackEvent::default().severity(), Severity::Medium);
    }
}
