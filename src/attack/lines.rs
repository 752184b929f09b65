//! Transient attack-line lifecycle.
//!
//! Every accepted event becomes a line that lives exactly [`TTL`] and is then
//! removed by the expiry heap. Insertion and removal-by-id are O(1) against
//! the keyed map; scheduling is a min-heap drained once per tick, so teardown
//! is one `clear()` instead of per-line timer bookkeeping.

use super::{AttackEvent, Severity};
use crate::geo::GeoPoint;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Visual lifetime of a line. The one externally observable timing contract.
pub const TTL: Duration = Duration::from_millis(3000);

/// Same-millisecond inserts still get distinct ids through this sequence.
static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Core-owned visual entity derived from one attack event.
#[derive(Clone, Debug)]
pub struct AttackLine {
    pub id: String,
    pub source: GeoPoint,
    pub destination: GeoPoint,
    pub attack_type: String,
    pub severity: Severity,
    pub country_code: Option<String>,
    pub created_at: Instant,
}

pub struct LineStore {
    lines: HashMap<String, AttackLine>,
    expiries: BinaryHeap<Reverse<(Instant, String)>>,
    rejected: u64,
}

impl LineStore {
    pub fn new() -> Self {
        Self {
            lines: HashMap::new(),
            expiries: BinaryHeap::new(),
            rejected: 0,
        }
    }

    /// Insert a line for `event`, scheduled to expire at `now + TTL`.
    /// Events missing either endpoint (or carrying unrepresentable
    /// coordinates) are rejected here so NaN never reaches the curve math.
    pub fn add(&mut self, event: &AttackEvent, now: Instant) -> Option<String> {
        let (Some(source), Some(destination)) = (event.source_point(), event.destination_point())
        else {
            self.rejected += 1;
            return None;
        };

        let id = next_id();
        self.expiries.push(Reverse((now + TTL, id.clone())));
        self.lines.insert(
            id.clone(),
            AttackLine {
                id: id.clone(),
                source,
                destination,
                attack_type: event.attack_type.clone(),
                severity: event.severity(),
                country_code: event.country_code.clone(),
                created_at: now,
            },
        );
        Some(id)
    }

    /// Drain every line whose deadline has passed. A line is present for
    /// `created <= now < created + TTL` and gone afterwards; entries whose id
    /// was already removed are skipped, never double-removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some(Reverse((deadline, _))) = self.expiries.peek() {
            if *deadline > now {
                break;
            }
            let Some(Reverse((_, id))) = self.expiries.pop() else {
                break;
            };
            if self.lines.remove(&id).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Idempotent removal; the scheduled expiry entry becomes a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        self.lines.remove(id).is_some()
    }

    /// Read-only snapshot of the active set. Iteration order is unspecified.
    pub fn active(&self) -> impl Iterator<Item = &AttackLine> {
        self.lines.values()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Teardown: drops all lines and every pending expiry at once.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.expiries.clear();
    }
}

impl Default for LineStore {
    fn default() -> Self {
        Self::new()
    }
}

fn next_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
    let salt: u16 = rand::random();
    format!("{millis:x}-{seq:x}-{salt:04x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn event(src: (f64, f64), dst: (f64, f64)) -> AttackEvent {
        AttackEvent {
            attack_type: "ddos".into(),
            source: Some(crate::attack::WirePoint { lon: src.0, lat: src.1 }),
            destination: Some(crate::attack::WirePoint { lon: dst.0, lat: dst.1 }),
            ..Default::default()
        }
    }

    #[test]
    fn line_present_before_ttl_absent_after() {
        let mut store = LineStore::new();
        let t0 = Instant::now();
        let id = store.add(&event((0.0, 0.0), (10.0, 10.0)), t0).unwrap();

        store.expire(t0 + Duration::from_millis(2999));
        assert!(store.active().any(|l| l.id == id), "present at 2999ms");

        store.expire(t0 + Duration::from_millis(3001));
        assert!(!store.active().any(|l| l.id == id), "absent at 3001ms");
    }

    #[test]
    fn expiry_is_exactly_once_per_line() {
        let mut store = LineStore::new();
        let t0 = Instant::now();
        for _ in 0..10 {
            store.add(&event((0.0, 0.0), (1.0, 1.0)), t0);
        }
        assert_eq!(store.expire(t0 + TTL), 10);
        assert_eq!(store.expire(t0 + TTL + Duration::from_secs(1)), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn thousand_synchronous_adds_yield_unique_ids() {
        let mut store = LineStore::new();
        let t0 = Instant::now();
        let ids: HashSet<String> = (0..1000)
            .map(|_| store.add(&event((1.0, 2.0), (3.0, 4.0)), t0).unwrap())
            .collect();
        assert_eq!(ids.len(), 1000);
        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn malformed_events_are_rejected_without_insertion() {
        let mut store = LineStore::new();
        let t0 = Instant::now();

        let missing_dst = AttackEvent {
            source: Some(crate::attack::WirePoint { lon: 1.0, lat: 1.0 }),
            ..Default::default()
        };
        assert!(store.add(&missing_dst, t0).is_none());

        let nan_src = event((f64::NAN, 0.0), (1.0, 1.0));
        assert!(store.add(&nan_src, t0).is_none());

        let out_of_range = event((200.0, 0.0), (1.0, 1.0));
        assert!(store.add(&out_of_range, t0).is_none());

        assert_eq!(store.rejected(), 3);
        assert!(store.is_empty());
    }

    #[test]
    fn double_remove_is_a_noop() {
        let mut store = LineStore::new();
        let t0 = Instant::now();
        let id = store.add(&event((0.0, 0.0), (1.0, 1.0)), t0).unwrap();
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        // The stale heap entry is skipped during the drain.
        assert_eq!(store.expire(t0 + TTL), 0);
    }

    #[test]
    fn staggered_inserts_expire_independently() {
        let mut store = LineStore::new();
        let t0 = Instant::now();
        store.add(&event((0.0, 0.0), (1.0, 1.0)), t0);
        store.add(&event((0.0, 0.0), (2.0, 2.0)), t0 + Duration::from_millis(1500));

        assert_eq!(store.expire(t0 + Duration::from_millis(3100)), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.expire(t0 + Duration::from_millis(4600)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn clear_cancels_all_pending_expiries() {
        let mut store = LineStore::new();
        let t0 = Instant::now();
        for _ in 0..32 {
            store.add(&event((0.0, 0.0), (1.0, 1.0)), t0);
        }
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.expire(t0 + TTL), 0);
    }
}
