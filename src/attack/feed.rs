//! Attack event feed.
//!
//! Two sources behind one `poll()` seam: a WebSocket feed delivering one JSON
//! event per text frame, and a seeded simulator emitting traffic between a
//! fixed city table. A feed read error drops the socket and degrades to the
//! simulator; the status line reports the switch. Events that arrive with a
//! source IP but no coordinates are resolved through a local GeoLite2
//! database when one is available.

use super::AttackEvent;
use crate::attack::WirePoint;
use crate::config::FeedConfig;
use maxminddb::{geoip2, Reader};
use rand::prelude::*;
use std::collections::HashMap;
use std::net::{IpAddr, TcpStream};
use std::path::{Path, PathBuf};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// Simulator city table: (country code, city, lon, lat).
const CITIES: &[(&str, &str, f64, f64)] = &[
    ("us", "New York", -74.0, 40.7),
    ("us", "San Francisco", -122.4, 37.8),
    ("ca", "Toronto", -79.4, 43.7),
    ("mx", "Mexico City", -99.1, 19.4),
    ("br", "Sao Paulo", -46.6, -23.5),
    ("ar", "Buenos Aires", -58.4, -34.6),
    ("gb", "London", -0.1, 51.5),
    ("fr", "Paris", 2.3, 48.9),
    ("de", "Berlin", 13.4, 52.5),
    ("es", "Madrid", -3.7, 40.4),
    ("it", "Rome", 12.5, 41.9),
    ("se", "Stockholm", 18.1, 59.3),
    ("ua", "Kyiv", 30.5, 50.5),
    ("ru", "Moscow", 37.6, 55.8),
    ("tr", "Istanbul", 29.0, 41.0),
    ("eg", "Cairo", 31.2, 30.0),
    ("ng", "Lagos", 3.4, 6.5),
    ("za", "Johannesburg", 28.0, -26.2),
    ("ir", "Tehran", 51.4, 35.7),
    ("in", "Mumbai", 72.9, 19.1),
    ("cn", "Beijing", 116.4, 39.9),
    ("cn", "Shanghai", 121.5, 31.2),
    ("kr", "Seoul", 127.0, 37.6),
    ("jp", "Tokyo", 139.7, 35.7),
    ("id", "Jakarta", 106.8, -6.2),
    ("au", "Sydney", 151.2, -33.9),
];

const ATTACK_TYPES: &[&str] = &[
    "ddos",
    "ssh-bruteforce",
    "sql-injection",
    "port-scan",
    "malware-c2",
    "phishing",
];

const SEVERITIES: &[&str] = &["low", "medium", "medium", "high", "critical"];

enum Source {
    WebSocket(WebSocket<MaybeTlsStream<TcpStream>>),
    Simulator(Simulator),
}

pub struct Feed {
    source: Source,
    geoip: GeoIpResolver,
    malformed: u64,
    note: Option<String>,
}

impl Feed {
    /// Connect to the configured WebSocket feed, or fall back to simulation.
    pub fn new(config: &FeedConfig, geoip_db: Option<&Path>) -> Self {
        let mut note = None;
        let source = match config.url.as_deref() {
            Some(url) => match connect_ws(url) {
                Ok(ws) => Source::WebSocket(ws),
                Err(e) => {
                    note = Some(format!("feed connect failed ({e}); simulating"));
                    Source::Simulator(Simulator::new(config.seed, config.rate))
                }
            },
            None => Source::Simulator(Simulator::new(config.seed, config.rate)),
        };
        Self {
            source,
            geoip: GeoIpResolver::new(geoip_db),
            malformed: 0,
            note,
        }
    }

    /// Drain everything available this tick. Never blocks.
    pub fn poll(&mut self) -> Vec<AttackEvent> {
        let mut events = match &mut self.source {
            Source::WebSocket(ws) => {
                let (events, malformed, disconnected) = drain_ws(ws);
                self.malformed += malformed;
                if disconnected {
                    self.note = Some("feed disconnected; simulating".into());
                    self.source = Source::Simulator(Simulator::new(None, 1.0));
                }
                events
            }
            Source::Simulator(sim) => sim.tick(),
        };
        for event in &mut events {
            self.resolve_missing_source(event);
        }
        events
    }

    /// Supply coordinates from GeoIP for events that only carry an IP.
    fn resolve_missing_source(&mut self, event: &mut AttackEvent) {
        if event.source.is_some() {
            return;
        }
        let Some(ip) = event.source_ip.as_deref().and_then(|s| s.parse::<IpAddr>().ok()) else {
            return;
        };
        if let Some((lon, lat)) = self.geoip.lookup(ip) {
            event.source = Some(WirePoint { lon, lat });
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.source, Source::Simulator(_))
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// One-shot status note (connect failure, disconnect fallback).
    pub fn take_note(&mut self) -> Option<String> {
        self.note.take()
    }
}

fn connect_ws(url: &str) -> Result<WebSocket<MaybeTlsStream<TcpStream>>, String> {
    let (ws, _) = tungstenite::connect(url).map_err(|e| e.to_string())?;
    // Reads happen on the render thread; the socket must never block a frame.
    match ws.get_ref() {
        MaybeTlsStream::Plain(stream) => stream.set_nonblocking(true).map_err(|e| e.to_string())?,
        MaybeTlsStream::NativeTls(stream) => stream
            .get_ref()
            .set_nonblocking(true)
            .map_err(|e| e.to_string())?,
        _ => {}
    }
    Ok(ws)
}

/// Read all buffered frames: (events, malformed count, disconnected).
fn drain_ws(ws: &mut WebSocket<MaybeTlsStream<TcpStream>>) -> (Vec<AttackEvent>, u64, bool) {
    let mut events = Vec::new();
    let mut malformed = 0;
    loop {
        match ws.read() {
            Ok(Message::Text(text)) => match parse_frame(&text) {
                Some(event) => events.push(event),
                None => malformed += 1,
            },
            Ok(Message::Close(_)) => return (events, malformed, true),
            Ok(_) => continue,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                break
            }
            Err(_) => return (events, malformed, true),
        }
    }
    (events, malformed, false)
}

/// One JSON attack event per frame; anything else counts as malformed.
pub fn parse_frame(text: &str) -> Option<AttackEvent> {
    serde_json::from_str(text).ok()
}

// ============================================================================
// Simulator
// ============================================================================

struct Simulator {
    rng: StdRng,
    /// Mean events per tick.
    rate: f64,
}

impl Simulator {
    fn new(seed: Option<u64>, rate: f64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            rate: rate.clamp(0.01, 50.0),
        }
    }

    fn tick(&mut self) -> Vec<AttackEvent> {
        let mut events = Vec::new();
        let mut budget = self.rate;
        while budget > 0.0 {
            let p = budget.min(1.0);
            if self.rng.gen_bool(p) {
                events.push(self.generate());
            }
            budget -= 1.0;
        }
        events
    }

    fn generate(&mut self) -> AttackEvent {
        let src = CITIES[self.rng.gen_range(0..CITIES.len())];
        let mut dst = CITIES[self.rng.gen_range(0..CITIES.len())];
        if dst.1 == src.1 {
            dst = CITIES[(self.rng.gen_range(0..CITIES.len() - 1) + 1) % CITIES.len()];
        }
        let jitter = |rng: &mut StdRng| rng.gen_range(-1.5..1.5);
        // A quarter of events omit the explicit code to exercise the
        // coordinate fallback path, like real feeds do.
        let country_code = (!self.rng.gen_bool(0.25)).then(|| src.0.to_string());
        AttackEvent {
            id: None,
            source_ip: None,
            country_code,
            attack_type: ATTACK_TYPES[self.rng.gen_range(0..ATTACK_TYPES.len())].into(),
            severity: Some(SEVERITIES[self.rng.gen_range(0..SEVERITIES.len())].into()),
            source: Some(WirePoint {
                lon: (src.2 + jitter(&mut self.rng)).clamp(-180.0, 180.0),
                lat: (src.3 + jitter(&mut self.rng)).clamp(-90.0, 90.0),
            }),
            destination: Some(WirePoint { lon: dst.2, lat: dst.3 }),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

// ============================================================================
// GeoIP
// ============================================================================

/// GeoLite2 lookup with a bounded result cache, optional at every level:
/// no database simply means no IP-only events get coordinates.
struct GeoIpResolver {
    reader: Option<Reader<Vec<u8>>>,
    cache: HashMap<IpAddr, Option<(f64, f64)>>,
}

const GEOIP_CACHE_MAX: usize = 1024;

impl GeoIpResolver {
    fn new(explicit: Option<&Path>) -> Self {
        let reader = find_database(explicit).and_then(|p| Reader::open_readfile(&p).ok());
        Self {
            reader,
            cache: HashMap::new(),
        }
    }

    fn lookup(&mut self, ip: IpAddr) -> Option<(f64, f64)> {
        if let Some(&cached) = self.cache.get(&ip) {
            return cached;
        }
        if self.cache.len() >= GEOIP_CACHE_MAX {
            let evict: Vec<IpAddr> = self.cache.keys().take(GEOIP_CACHE_MAX / 2).copied().collect();
            for key in evict {
                self.cache.remove(&key);
            }
        }
        let result = self.reader.as_ref().and_then(|reader| {
            let city: geoip2::City = reader.lookup(ip).ok()?;
            let location = city.location?;
            Some((location.longitude?, location.latitude?))
        });
        self.cache.insert(ip, result);
        result
    }
}

fn find_database(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }
    let candidates = [
        dirs::config_dir().map(|p| p.join("threatmap/GeoLite2-City.mmdb")),
        Some(PathBuf::from("/usr/share/GeoIP/GeoLite2-City.mmdb")),
        Some(PathBuf::from("/var/lib/GeoIP/GeoLite2-City.mmdb")),
        Some(PathBuf::from("./GeoLite2-City.mmdb")),
    ];
    candidates.into_iter().flatten().find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_simulator_produces_valid_events() {
        let mut sim = Simulator::new(Some(7), 5.0);
        let mut produced = 0;
        for _ in 0..50 {
            for event in sim.tick() {
                produced += 1;
                assert!(event.source_point().is_some());
                assert!(event.destination_point().is_some());
                assert!(!event.attack_type.is_empty());
            }
        }
        assert!(produced > 0);
    }

    #[test]
    fn seeded_simulator_is_deterministic() {
        let collect = || {
            let mut sim = Simulator::new(Some(42), 2.0);
            (0..20).flat_map(|_| sim.tick()).map(|e| e.attack_type).collect::<Vec<_>>()
        };
        assert_eq!(collect(), collect());
    }

    #[test]
    fn parse_frame_rejects_non_event_payloads() {
        assert!(parse_frame("not json").is_none());
        assert!(parse_frame("[1,2,3]").is_none());
        assert!(parse_frame(r#"{"attackType": "ddos"}"#).is_some());
    }

    #[test]
    fn missing_database_leaves_ip_only_events_unresolved() {
        let mut resolver = GeoIpResolver {
            reader: None,
            cache: HashMap::new(),
        };
        assert_eq!(resolver.lookup("203.0.113.9".parse().unwrap()), None);
        // Cached negative result on the second call.
        assert_eq!(resolver.lookup("203.0.113.9".parse().unwrap()), None);
        assert_eq!(resolver.cache.len(), 1);
    }
}
