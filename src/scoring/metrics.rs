use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

const LATENCY_BUCKETS: [u64; 6] = [50, 200, 1_000, 5_000, 20_000, u64::MAX];
const BUCKET_MIDPOINTS: [f64; 6] = [25.0, 125.0, 600.0, 3_000.0, 12_500.0, 40_000.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerId {
    Body,
    Symmetry,
    Emotion,
    Composite,
    Analyze,
}

impl ScorerId {
    pub const ALL: [ScorerId; 5] = [
        ScorerId::Body,
        ScorerId::Symmetry,
        ScorerId::Emotion,
        ScorerId::Composite,
        ScorerId::Analyze,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScorerId::Body => "body",
            ScorerId::Symmetry => "symmetry",
            ScorerId::Emotion => "emotion",
            ScorerId::Composite => "composite",
            ScorerId::Analyze => "analyze",
        }
    }
}

#[derive(Default)]
pub struct ScorerMetrics {
    call_count: AtomicU64,
    total_latency_us: AtomicU64,
    failure_count: AtomicU64,
    last_called_at: AtomicI64,
    latency_buckets: [AtomicU64; 6],
}

impl ScorerMetrics {
    fn record_latency_bucket(&self, latency_us: u64) {
        for (i, &threshold) in LATENCY_BUCKETS.iter().enumerate() {
            if latency_us <= threshold {
                self.latency_buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
    }

    /// Approximate p50/p95/p99 in microseconds, from bucket midpoints.
    pub fn percentiles(&self) -> (f64, f64, f64) {
        let counts: Vec<u64> = self
            .latency_buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect();
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return (0.0, 0.0, 0.0);
        }

        let percentile = |pct: f64| -> f64 {
            let target = (pct / 100.0 * total as f64).ceil() as u64;
            let mut cumulative = 0u64;
            for (i, &count) in counts.iter().enumerate() {
                cumulative += count;
                if cumulative >= target {
                    return BUCKET_MIDPOINTS[i];
                }
            }
            BUCKET_MIDPOINTS[5]
        };

        (percentile(50.0), percentile(95.0), percentile(99.0))
    }
}

pub struct MetricsRegistry {
    metrics: HashMap<ScorerId, ScorerMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let metrics = ScorerId::ALL
            .iter()
            .map(|id| (*id, ScorerMetrics::default()))
            .collect();
        Self { metrics }
    }

    /// `failed` counts modality failures (sentinel results), not panics.
    pub fn record_call(&self, id: ScorerId, latency_us: u64, failed: bool) {
        if let Some(metric) = self.metrics.get(&id) {
            metric.call_count.fetch_add(1, Ordering::Relaxed);
            metric
                .total_latency_us
                .fetch_add(latency_us, Ordering::Relaxed);
            if failed {
                metric.failure_count.fetch_add(1, Ordering::Relaxed);
            }
            metric.record_latency_bucket(latency_us);
            metric
                .last_called_at
                .store(chrono::Utc::now().timestamp_millis(), Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> HashMap<String, MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|(id, metric)| {
                let (p50, p95, p99) = metric.percentiles();
                let last = metric.last_called_at.load(Ordering::Relaxed);
                (
                    id.as_str().to_string(),
                    MetricsSnapshot {
                        call_count: metric.call_count.load(Ordering::Relaxed),
                        total_latency_us: metric.total_latency_us.load(Ordering::Relaxed),
                        failure_count: metric.failure_count.load(Ordering::Relaxed),
                        p50_us: p50,
                        p95_us: p95,
                        p99_us: p99,
                        last_called_at: (last > 0)
                            .then(|| chrono::DateTime::from_timestamp_millis(last))
                            .flatten(),
                    },
                )
            })
            .collect()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub call_count: u64,
    pub total_latency_us: u64,
    pub failure_count: u64,
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    pub last_called_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Time `$block` (a `Result`) and record it under `$id`.
macro_rules! track_scorer {
    ($registry:expr, $id:expr, $block:expr) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let latency_us = start.elapsed().as_micros() as u64;
        $registry.record_call($id, latency_us, result.is_err());
        result
    }};
}

pub(crate) use track_scorer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_calls_and_failures() {
        let registry = MetricsRegistry::new();
        registry.record_call(ScorerId::Body, 10, false);
        registry.record_call(ScorerId::Body, 3_000, true);

        let snap = registry.snapshot();
        let body = &snap["body"];
        assert_eq!(body.call_count, 2);
        assert_eq!(body.failure_count, 1);
        assert_eq!(body.total_latency_us, 3_010);
        assert!(body.last_called_at.is_some());
        assert_eq!(snap["emotion"].call_count, 0);
        assert!(snap["emotion"].last_called_at.is_none());
    }

    #[test]
    fn percentiles_follow_buckets() {
        let registry = MetricsRegistry::new();
        for _ in 0..99 {
            registry.record_call(ScorerId::Symmetry, 10, false);
        }
        registry.record_call(ScorerId::Symmetry, 100_000, false);
        let snap = registry.snapshot();
        assert_eq!(snap["symmetry"].p50_us, 25.0);
        assert_eq!(snap["symmetry"].p95_us, 25.0);
    }

    #[test]
    fn macro_records_errors() {
        let registry = MetricsRegistry::new();
        let r: Result<(), ()> = track_scorer!(registry, ScorerId::Analyze, Err(()));
        assert!(r.is_err());
        assert_eq!(registry.snapshot()["analyze"].failure_count, 1);
    }
}
