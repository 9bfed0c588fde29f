// src/services/rate_limiter.rs
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const BUCKET_SECS: u64 = 3600;

pub trait RateLimiter: Send + Sync {
    /// Records one request for `client_id` and reports whether it is allowed.
    fn check(&self, client_id: &str) -> bool;
}

/// Fixed hourly windows keyed by `(client, unix_secs / 3600)`. Counts live in
/// memory only and reset on restart.
pub struct HourlyRateLimiter {
    limit: u32,
    counts: DashMap<(String, u64), u32>,
    current_bucket: AtomicU64,
}

impl HourlyRateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            counts: DashMap::new(),
            current_bucket: AtomicU64::new(0),
        }
    }

    pub fn check_at(&self, client_id: &str, unix_secs: u64) -> bool {
        let bucket = unix_secs / BUCKET_SECS;

        // Only a forward move prunes; a stale clock reading must not drop the
        // newer hour's counts.
        let prev = self.current_bucket.fetch_max(bucket, Ordering::AcqRel);
        if bucket > prev {
            self.counts.retain(|(_, b), _| *b >= bucket);
        }

        // The entry guard holds the shard lock across read-modify-write.
        let mut count = self
            .counts
            .entry((client_id.to_string(), bucket))
            .or_insert(0);
        *count = count.saturating_add(1);
        *count <= self.limit
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.counts.len()
    }
}

impl RateLimiter for HourlyRateLimiter {
    fn check(&self, client_id: &str) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.check_at(client_id, now)
    }
}
