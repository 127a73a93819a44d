//! In-memory TTL cache and on-disk exchange-rate snapshots.
//!
//! Both live outside the calculation core: callers consult them while
//! resolving rates, then hand plain numbers to `domain`.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    hash::Hash,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info, warn};

const SNAPSHOT_FILENAME: &str = "rate_snapshot.json";

/// Snapshot TTL: 12 hours. Customs exchange rates are published weekly, so
/// this only guards against stale manual overrides.
pub const RATE_SNAPSHOT_TTL: Duration = Duration::from_secs(12 * 60 * 60);

struct Entry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

/// Key/value store where every entry expires after its own TTL.
pub struct TtlCache<K, V> {
    entries: HashMap<K, Entry<V>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value if present and not expired.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.value.clone())
    }

    /// Returns the value even if it has expired; used as a fallback when a
    /// provider is unreachable.
    pub fn get_stale(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn put(&mut self, key: K, value: V, ttl: Duration) {
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Drops expired entries and returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh());
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Last resolved KRW rates, persisted between CLI runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSnapshot {
    /// RFC 3339 timestamp of when the rates were resolved.
    pub fetched_at: String,
    /// Date the rates apply to (YYYY-MM-DD).
    pub quote_date: String,
    pub rates: BTreeMap<String, f64>,
}

impl RateSnapshot {
    pub fn new(quote_date: String, rates: BTreeMap<String, f64>) -> Self {
        let fetched_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        Self {
            fetched_at,
            quote_date,
            rates,
        }
    }

    /// Age since `fetched_at`. An unreadable timestamp counts as infinitely old.
    pub fn age(&self) -> Duration {
        let Ok(fetched) = OffsetDateTime::parse(&self.fetched_at, &Rfc3339) else {
            return Duration::MAX;
        };
        let elapsed = OffsetDateTime::now_utc() - fetched;
        Duration::try_from(elapsed).unwrap_or(Duration::ZERO)
    }

    pub fn is_expired(&self) -> bool {
        self.age() > RATE_SNAPSHOT_TTL
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        if age == Duration::MAX {
            return "unknown".to_string();
        }
        let secs = age.as_secs();
        if secs < 60 {
            format!("{secs}s")
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h", secs / 3600)
        } else {
            format!("{}d", secs / 86400)
        }
    }
}

/// Default snapshot location in the platform's local data directory.
pub fn snapshot_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("import-estimator")
        .join(SNAPSHOT_FILENAME)
}

/// Loads a snapshot if it exists, parses and has not expired.
pub fn load_rate_snapshot(path: &Path) -> Option<RateSnapshot> {
    if !path.exists() {
        debug!(path = %path.display(), "no rate snapshot");
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<RateSnapshot>(&content) {
            Ok(snapshot) => {
                if snapshot.is_expired() {
                    info!(age = %snapshot.age_string(), "rate snapshot expired");
                    return None;
                }
                debug!(
                    rates = snapshot.rates.len(),
                    age = %snapshot.age_string(),
                    "loaded rate snapshot"
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!("failed to parse rate snapshot: {e}");
                None
            }
        },
        Err(e) => {
            warn!("failed to read rate snapshot: {e}");
            None
        }
    }
}

pub fn save_rate_snapshot(path: &Path, snapshot: &RateSnapshot) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, content)?;
    debug!(
        rates = snapshot.rates.len(),
        path = %path.display(),
        "saved rate snapshot"
    );
    Ok(())
}
