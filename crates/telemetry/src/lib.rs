//! Logging and request metrics for the catalog service
//!
//! This crate provides:
//! - Structured logging with tracing (compact text or JSON lines)
//! - A per-process session id for correlating log lines
//! - In-process request metrics (counts per route and status, latency
//!   percentiles over the most recent requests)

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Latency samples kept for percentiles; older samples are dropped first
pub const LATENCY_SAMPLE_CAPACITY: usize = 4096;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize with custom configuration
///
/// `RUST_LOG` takes precedence over `config.log_level`.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| anyhow::anyhow!("Invalid log filter {:?}: {}", config.log_level, e))?;

    let json_layer = config.json.then(|| {
        fmt::layer()
            .json()
            .with_target(config.show_target)
    });

    let text_layer = (!config.json).then(|| {
        fmt::layer()
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number)
            .compact()
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::info!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
    pub show_target: bool,
    pub show_thread_ids: bool,
    pub show_file: bool,
    pub show_line_number: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

/// Request counters and latency samples, shared by all connections
pub struct RequestMetrics {
    inner: RwLock<MetricsState>,
    started_at: DateTime<Utc>,
    start_time: Instant,
}

#[derive(Default)]
struct MetricsState {
    by_route: BTreeMap<String, u64>,
    by_status: BTreeMap<u16, u64>,
    latencies_ms: VecDeque<f64>,
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestMetrics {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MetricsState::default()),
            started_at: Utc::now(),
            start_time: Instant::now(),
        }
    }

    /// Record one finished request
    pub fn record(&self, route: &str, status: u16, elapsed: Duration) {
        let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *state.by_route.entry(route.to_string()).or_default() += 1;
        *state.by_status.entry(status).or_default() += 1;
        if state.latencies_ms.len() == LATENCY_SAMPLE_CAPACITY {
            state.latencies_ms.pop_front();
        }
        state.latencies_ms.push_back(elapsed.as_secs_f64() * 1000.0);
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Point-in-time copy of every metric
    ///
    /// Latency stats cover the last [`LATENCY_SAMPLE_CAPACITY`] requests.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let (by_route, by_status, samples) = {
            let state = self.inner.read().unwrap_or_else(|e| e.into_inner());
            (
                state.by_route.clone(),
                state.by_status.clone(),
                state.latencies_ms.iter().copied().collect::<Vec<_>>(),
            )
        };

        let total_requests = by_status.values().sum();
        let error_responses = by_status
            .iter()
            .filter(|(status, _)| **status >= 400)
            .map(|(_, count)| count)
            .sum();

        MetricsSnapshot {
            session_id: session_id().to_string(),
            started_at: self.started_at,
            uptime_secs: self.uptime_secs(),
            total_requests,
            error_responses,
            by_route,
            by_status,
            latency: HistogramStats::from_samples(samples),
        }
    }
}

/// Serializable view of [`RequestMetrics`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub error_responses: u64,
    pub by_route: BTreeMap<String, u64>,
    pub by_status: BTreeMap<u16, u64>,
    pub latency: HistogramStats,
}

/// Histogram statistics (milliseconds)
#[derive(Debug, Clone, Serialize)]
pub struct HistogramStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl HistogramStats {
    fn from_samples(mut sorted: Vec<f64>) -> Self {
        if sorted.is_empty() {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                p50: 0.0,
                p95: 0.0,
                p99: 0.0,
            };
        }

        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sum / count as f64,
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        }
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_routes_and_statuses() {
        let metrics = RequestMetrics::new();
        metrics.record("GET /products", 200, Duration::from_millis(2));
        metrics.record("GET /products", 200, Duration::from_millis(4));
        metrics.record("GET /products/search", 400, Duration::from_millis(1));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 3);
        assert_eq!(snapshot.error_responses, 1);
        assert_eq!(snapshot.by_route["GET /products"], 2);
        assert_eq!(snapshot.by_status[&400], 1);
        assert_eq!(snapshot.latency.count, 3);
        assert!((snapshot.latency.max - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_latency_samples_are_bounded() {
        let metrics = RequestMetrics::new();
        let total = LATENCY_SAMPLE_CAPACITY + 500;
        for i in 0..total {
            metrics.record("GET /products", 200, Duration::from_millis(i as u64));
        }

        let retained = metrics.inner.read().unwrap().latencies_ms.len();
        assert_eq!(retained, LATENCY_SAMPLE_CAPACITY);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, total as u64);
        assert_eq!(snapshot.latency.count, LATENCY_SAMPLE_CAPACITY);
        // oldest samples were evicted
        assert!((snapshot.latency.min - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = RequestMetrics::new().snapshot();
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.latency.p95, 0.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = RequestMetrics::new();
        metrics.record("POST /products", 201, Duration::from_millis(3));
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["by_status"]["201"], 1);
        assert!(json["session_id"].is_string());
    }

    #[test]
    fn test_histogram_stats() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let stats = HistogramStats::from_samples(values);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.mean, 5.5);
    }

    #[test]
    fn test_session_id() {
        let id = session_id();
        assert!(!id.is_empty());
        // Should be a valid UUID
        assert!(Uuid::parse_str(id).is_ok());
    }
}
