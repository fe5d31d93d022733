//! Pure ranking of backends by configuration and health
//!
//! Ordering rules:
//!
//! 1. disabled backends are dropped;
//! 2. backends whose status is `DOWN` go after every other backend, so a
//!    usable ordering is still returned when everything is down;
//! 3. within each partition: `priority` descending, then status
//!    (HEALTHY > DEGRADED > UNKNOWN > DOWN), then average latency ascending
//!    (unmeasured latency last), then `id` for a total order.

use std::cmp::Ordering;

use crate::descriptor::BackendDescriptor;
use crate::health::{BackendHealth, HealthStatus};

/// Rank the usable backends, best first
pub fn rank(pairs: &[(BackendDescriptor, BackendHealth)]) -> Vec<BackendDescriptor> {
    let mut usable: Vec<&(BackendDescriptor, BackendHealth)> =
        pairs.iter().filter(|(descriptor, _)| descriptor.enabled).collect();
    usable.sort_by(|a, b| compare(a, b));
    usable.into_iter().map(|(descriptor, _)| descriptor.clone()).collect()
}

/// Head of [`rank`], or `None` when nothing is enabled
pub fn select_best(pairs: &[(BackendDescriptor, BackendHealth)]) -> Option<BackendDescriptor> {
    rank(pairs).into_iter().next()
}

fn compare(
    (da, ha): &(BackendDescriptor, BackendHealth),
    (db, hb): &(BackendDescriptor, BackendHealth),
) -> Ordering {
    let down_a = ha.status == HealthStatus::Down;
    let down_b = hb.status == HealthStatus::Down;

    down_a
        .cmp(&down_b)
        .then_with(|| db.priority.cmp(&da.priority))
        .then_with(|| ha.status.rank().cmp(&hb.status.rank()))
        .then_with(|| compare_latency(ha.avg_latency_ms, hb.avg_latency_ms))
        .then_with(|| da.id.cmp(&db.id))
}

fn compare_latency(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health(status: HealthStatus, latency: Option<f64>) -> BackendHealth {
        BackendHealth {
            status,
            avg_latency_ms: latency,
            ..BackendHealth::default()
        }
    }

    fn ids(ranked: &[BackendDescriptor]) -> Vec<&str> {
        ranked.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_priority_is_primary_key() {
        let pairs = vec![
            (BackendDescriptor::new("low", "http://a", 10), health(HealthStatus::Healthy, Some(5.0))),
            (BackendDescriptor::new("high", "http://b", 90), health(HealthStatus::Degraded, Some(500.0))),
        ];
        assert_eq!(ids(&rank(&pairs)), vec!["high", "low"]);
    }

    #[test]
    fn test_status_then_latency_break_ties() {
        let pairs = vec![
            (BackendDescriptor::new("slow", "http://a", 50), health(HealthStatus::Healthy, Some(300.0))),
            (BackendDescriptor::new("unknown", "http://b", 50), health(HealthStatus::Unknown, None)),
            (BackendDescriptor::new("fast", "http://c", 50), health(HealthStatus::Healthy, Some(20.0))),
            (BackendDescriptor::new("degraded", "http://d", 50), health(HealthStatus::Degraded, Some(1.0))),
        ];
        assert_eq!(ids(&rank(&pairs)), vec!["fast", "slow", "degraded", "unknown"]);
    }

    #[test]
    fn test_down_backends_ranked_last_but_kept() {
        let pairs = vec![
            (BackendDescriptor::new("down", "http://a", 100), health(HealthStatus::Down, Some(1.0))),
            (BackendDescriptor::new("ok", "http://b", 1), health(HealthStatus::Unknown, None)),
        ];
        assert_eq!(ids(&rank(&pairs)), vec!["ok", "down"]);

        let all_down = vec![(
            BackendDescriptor::new("down", "http://a", 100),
            health(HealthStatus::Down, None),
        )];
        assert_eq!(ids(&rank(&all_down)), vec!["down"]);
    }

    #[test]
    fn test_disabled_backends_never_appear() {
        let pairs = vec![
            (BackendDescriptor::new("a", "http://a", 1), health(HealthStatus::Healthy, None)),
            (BackendDescriptor::new("b", "http://b", 2).disabled(), health(HealthStatus::Healthy, None)),
            (BackendDescriptor::new("c", "http://c", 3), health(HealthStatus::Down, None)),
        ];
        let ranked = rank(&pairs);

        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|d| d.enabled));
        let mut got = ids(&ranked);
        got.sort_unstable();
        assert_eq!(got, vec!["a", "c"], "ranking must be a permutation of the enabled set");
    }

    #[test]
    fn test_select_best() {
        let pairs = vec![
            (BackendDescriptor::new("a", "http://a", 1), health(HealthStatus::Healthy, None)),
            (BackendDescriptor::new("b", "http://b", 2), health(HealthStatus::Healthy, None)),
        ];
        assert_eq!(select_best(&pairs).map(|d| d.id), Some("b".to_string()));

        let none_enabled = vec![(
            BackendDescriptor::new("a", "http://a", 1).disabled(),
            health(HealthStatus::Healthy, None),
        )];
        assert!(select_best(&none_enabled).is_none());
        assert!(select_best(&[]).is_none());
    }
}
