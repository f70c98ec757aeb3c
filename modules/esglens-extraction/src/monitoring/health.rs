use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// A worker that has not extracted anything for this long is stale.
const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(24 * 3600);

/// Health state for the worker: per-component flags plus extraction
/// freshness. Healthy iff no component is down and the last successful
/// extraction is within the stale threshold (or none has been attempted yet).
pub struct HealthChecker {
    inner: Mutex<Inner>,
    stale_threshold: Duration,
    started: Instant,
}

struct Inner {
    components: BTreeMap<String, bool>,
    last_success: Option<(Instant, DateTime<Utc>)>,
    any_attempt: bool,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::with_stale_threshold(DEFAULT_STALE_THRESHOLD)
    }

    pub fn with_stale_threshold(stale_threshold: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                components: BTreeMap::new(),
                last_success: None,
                any_attempt: false,
            }),
            stale_threshold,
            started: Instant::now(),
        }
    }

    pub fn set_component(&self, name: &str, healthy: bool) {
        let mut inner = self.inner.lock().expect("health lock poisoned");
        inner.components.insert(name.to_string(), healthy);
    }

    pub fn update_extraction_status(&self, success: bool) {
        let mut inner = self.inner.lock().expect("health lock poisoned");
        inner.any_attempt = true;
        if success {
            inner.last_success = Some((Instant::now(), Utc::now()));
        }
    }

    pub fn is_healthy(&self) -> bool {
        let inner = self.inner.lock().expect("health lock poisoned");
        if inner.components.values().any(|healthy| !healthy) {
            return false;
        }
        match inner.last_success {
            Some((at, _)) => at.elapsed() < self.stale_threshold,
            // A worker that processed nothing yet is idle, not unhealthy.
            None => !inner.any_attempt,
        }
    }

    pub fn status(&self) -> serde_json::Value {
        let healthy = self.is_healthy();
        let inner = self.inner.lock().expect("health lock poisoned");
        serde_json::json!({
            "status": if healthy { "healthy" } else { "unhealthy" },
            "uptime_seconds": self.started.elapsed().as_secs_f64(),
            "components": inner.components,
            "last_successful_extraction": inner.last_success.map(|(_, ts)| ts.to_rfc3339()),
            "stale_threshold_seconds": self.stale_threshold.as_secs(),
        })
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_worker_is_healthy() {
        let checker = HealthChecker::new();
        assert!(checker.is_healthy());
        assert_eq!(checker.status()["status"], "healthy");
    }

    #[test]
    fn recent_success_keeps_it_healthy() {
        let checker = HealthChecker::new();
        checker.update_extraction_status(true);
        assert!(checker.is_healthy());
    }

    #[test]
    fn attempts_without_success_are_unhealthy() {
        let checker = HealthChecker::new();
        checker.update_extraction_status(false);
        assert!(!checker.is_healthy());
    }

    #[test]
    fn unhealthy_component_flips_status() {
        let checker = HealthChecker::new();
        checker.update_extraction_status(true);
        checker.set_component("database", false);
        assert!(!checker.is_healthy());
        checker.set_component("database", true);
        assert!(checker.is_healthy());
    }

    #[test]
    fn success_goes_stale_past_the_threshold() {
        let checker = HealthChecker::with_stale_threshold(Duration::from_millis(0));
        checker.update_extraction_status(true);
        assert!(!checker.is_healthy());
    }
}
