//! Metrics collection and export for resource pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Point-in-time metrics for a pool
///
/// # Examples
///
/// ```
/// use genpool::{Pool, PoolConfiguration};
///
/// let config = PoolConfiguration::new().with_min_capacity(2).with_max_capacity(4);
/// let pool = Pool::new(config, || Ok::<_, std::io::Error>(0u32), |_| Ok::<_, std::io::Error>(())).unwrap();
///
/// let res = pool.acquire().unwrap();
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_created, 2);
/// assert_eq!(metrics.total_acquired, 1);
/// assert_eq!(metrics.idle_resources, 1);
/// pool.release(res).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PoolMetrics {
    /// Resources produced by the factory
    pub total_created: usize,

    /// Resources passed successfully to the destructor
    pub total_destroyed: usize,

    /// Successful acquisitions
    pub total_acquired: usize,

    /// Resources put back into the idle area
    pub total_released: usize,

    /// Resources discarded because their TTL elapsed
    pub total_expired: usize,

    /// Acquisitions that had to wait at capacity
    pub wait_events: usize,

    /// Factory calls that failed
    pub factory_failures: usize,

    /// Destructor calls that failed
    pub destructor_failures: usize,

    /// Resources that exist right now
    pub live_resources: usize,

    /// Resources sitting in the idle area
    pub idle_resources: usize,

    /// Pool utilization ratio (0.0 to 1.0)
    pub utilization: f64,

    /// Maximum number of live resources
    pub max_capacity: usize,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_destroyed".to_string(), self.total_destroyed.to_string());
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("total_expired".to_string(), self.total_expired.to_string());
        metrics.insert("wait_events".to_string(), self.wait_events.to_string());
        metrics.insert("factory_failures".to_string(), self.factory_failures.to_string());
        metrics.insert("destructor_failures".to_string(), self.destructor_failures.to_string());
        metrics.insert("live_resources".to_string(), self.live_resources.to_string());
        metrics.insert("idle_resources".to_string(), self.idle_resources.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics.insert("max_capacity".to_string(), self.max_capacity.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use genpool::{MetricsExporter, Pool, PoolConfiguration};
    /// use std::collections::HashMap;
    ///
    /// let pool = Pool::new(PoolConfiguration::default(), || Ok::<_, std::io::Error>(1), |_| Ok::<_, std::io::Error>(())).unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = MetricsExporter::export_prometheus(&pool.metrics(), "db", Some(&tags));
    /// assert!(output.contains("genpool_resources_live"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let labels = Self::format_labels(pool_name, tags);
        let mut output = String::new();

        let gauges = [
            ("genpool_resources_live", "Resources that currently exist", metrics.live_resources as f64),
            ("genpool_resources_idle", "Resources waiting in the idle area", metrics.idle_resources as f64),
            ("genpool_capacity_max", "Maximum number of live resources", metrics.max_capacity as f64),
            ("genpool_utilization", "Live resources over capacity", metrics.utilization),
        ];
        for (name, help, value) in gauges {
            output.push_str(&format!("# HELP {name} {help}\n"));
            output.push_str(&format!("# TYPE {name} gauge\n"));
            output.push_str(&format!("{name}{{{labels}}} {value}\n"));
        }

        let counters = [
            ("genpool_resources_created_total", "Resources produced by the factory", metrics.total_created),
            ("genpool_resources_destroyed_total", "Resources destroyed", metrics.total_destroyed),
            ("genpool_resources_expired_total", "Resources discarded after their TTL", metrics.total_expired),
            ("genpool_acquired_total", "Successful acquisitions", metrics.total_acquired),
            ("genpool_released_total", "Resources returned to the idle area", metrics.total_released),
            ("genpool_wait_events_total", "Acquisitions that waited at capacity", metrics.wait_events),
            ("genpool_factory_failures_total", "Failed factory calls", metrics.factory_failures),
            ("genpool_destructor_failures_total", "Failed destructor calls", metrics.destructor_failures),
        ];
        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {name} {help}\n"));
            output.push_str(&format!("# TYPE {name} counter\n"));
            output.push_str(&format!("{name}{{{labels}}} {value}\n"));
        }

        output
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            let mut sorted: Vec<_> = tags.iter().collect();
            sorted.sort();
            for (key, value) in sorted {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub expired: AtomicUsize,
    pub waits: AtomicUsize,
    pub factory_failures: AtomicUsize,
    pub destructor_failures: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, live: usize, idle: usize, capacity: usize) -> PoolMetrics {
        let utilization = if capacity > 0 {
            live as f64 / capacity as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_created: self.created.load(Ordering::Relaxed),
            total_destroyed: self.destroyed.load(Ordering::Relaxed),
            total_acquired: self.acquired.load(Ordering::Relaxed),
            total_released: self.released.load(Ordering::Relaxed),
            total_expired: self.expired.load(Ordering::Relaxed),
            wait_events: self.waits.load(Ordering::Relaxed),
            factory_failures: self.factory_failures.load(Ordering::Relaxed),
            destructor_failures: self.destructor_failures.load(Ordering::Relaxed),
            live_resources: live,
            idle_resources: idle,
            utilization,
            max_capacity: capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_from_live_count() {
        let tracker = MetricsTracker::new();
        MetricsTracker::incr(&tracker.created);
        MetricsTracker::incr(&tracker.created);

        let metrics = tracker.get_metrics(2, 1, 4);
        assert_eq!(metrics.total_created, 2);
        assert!((metrics.utilization - 0.5).abs() < f64::EPSILON);
        assert_eq!(metrics.export()["utilization"], "0.50");
    }

    #[test]
    fn test_prometheus_labels_sorted() {
        let metrics = MetricsTracker::new().get_metrics(0, 0, 3);
        let mut tags = HashMap::new();
        tags.insert("zone".to_string(), "b".to_string());
        tags.insert("app".to_string(), "a".to_string());

        let output = MetricsExporter::export_prometheus(&metrics, "p", Some(&tags));
        assert!(output.contains("genpool_capacity_max{pool=\"p\",app=\"a\",zone=\"b\"} 3\n"));
        assert!(output.contains("# TYPE genpool_acquired_total counter\n"));
    }
}
