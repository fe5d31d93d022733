//! Running health statistics per backend
//!
//! Each backend client owns exactly one [`HealthTracker`]. The tracker hides a
//! [`BackendHealth`] value behind a mutex and only offers whole-value
//! snapshots and read-modify-write updates, so two orchestrator calls hitting
//! the same spot at once can never lose an update.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Consecutive failures after which a backend is considered down
pub const DOWN_AFTER_FAILURES: u32 = 3;

/// Smoothing factor of the latency moving average
pub const LATENCY_EMA_ALPHA: f64 = 0.3;

/// Coarse health state, ordered from best to worst for ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    #[default]
    Unknown,
    Healthy,
    Degraded,
    Down,
}

impl HealthStatus {
    /// Lower is better: HEALTHY > DEGRADED > UNKNOWN > DOWN
    pub fn rank(self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Unknown => 2,
            HealthStatus::Down => 3,
        }
    }
}

/// Snapshot of a backend's running statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BackendHealth {
    pub status: HealthStatus,
    /// Exponential moving average of successful attempt latency
    pub avg_latency_ms: Option<f64>,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
    pub total_requests: u64,
    pub total_failures: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Result of the most recent out-of-band probe
    pub last_probe_ok: Option<bool>,
}

impl BackendHealth {
    fn apply_success(&mut self, latency: Duration) {
        let sample = latency.as_secs_f64() * 1000.0;
        self.avg_latency_ms = Some(match self.avg_latency_ms {
            Some(avg) => LATENCY_EMA_ALPHA * sample + (1.0 - LATENCY_EMA_ALPHA) * avg,
            None => sample,
        });
        self.status = HealthStatus::Healthy;
        self.consecutive_successes += 1;
        self.consecutive_failures = 0;
        self.total_requests += 1;
        self.last_success_at = Some(Utc::now());
    }

    fn apply_failure(&mut self) {
        self.consecutive_failures += 1;
        self.consecutive_successes = 0;
        self.total_requests += 1;
        self.total_failures += 1;
        self.last_failure_at = Some(Utc::now());
        self.status = if self.consecutive_failures >= DOWN_AFTER_FAILURES {
            HealthStatus::Down
        } else {
            HealthStatus::Degraded
        };
    }

    fn apply_probe(&mut self, ok: bool) {
        self.last_probe_ok = Some(ok);
        if !ok {
            self.status = HealthStatus::Down;
        } else if matches!(self.status, HealthStatus::Down | HealthStatus::Unknown) {
            self.status = HealthStatus::Degraded;
        }
    }
}

/// Lock-guarded owner of one backend's [`BackendHealth`]
#[derive(Debug, Default)]
pub struct HealthTracker {
    inner: Mutex<BackendHealth>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BackendHealth {
        self.inner.lock().clone()
    }

    pub fn record_success(&self, latency: Duration) {
        self.inner.lock().apply_success(latency);
    }

    pub fn record_failure(&self) {
        self.inner.lock().apply_failure();
    }

    /// Record an out-of-band availability probe; request counters are untouched
    pub fn record_probe(&self, ok: bool) {
        self.inner.lock().apply_probe(ok);
    }
}
