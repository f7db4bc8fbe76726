//! Prometheus metrics
//!
//! One [`FeedMetrics`] per data source. Every metric carries a `source`
//! label so a single dashboard can compare endpoints.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Start the Prometheus exporter on `0.0.0.0:<port>/metrics`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new().with_http_listener(addr).install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// How a fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Ok,
    Failed,
    /// Superseded by a newer response before it could be applied
    Stale,
    Malformed,
}

impl FetchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Ok => "ok",
            FetchOutcome::Failed => "failed",
            FetchOutcome::Stale => "stale",
            FetchOutcome::Malformed => "malformed",
        }
    }
}

/// Metrics for one data source
///
/// * `feed_fetches_total{source, outcome}`
/// * `feed_retries_total{source}`
/// * `feed_fetch_duration_seconds{source}`
/// * `feed_mock_fallbacks_total{source}`
/// * `feed_snapshot_age_seconds{source}`
#[derive(Clone)]
pub struct FeedMetrics {
    retries: Counter,
    fetch_duration: Histogram,
    mock_fallbacks: Counter,
    snapshot_age: Gauge,
    source: String,
}

impl FeedMetrics {
    pub fn new(source: &str) -> Self {
        let name = source.to_string();

        Self {
            retries: counter!("feed_retries_total", "source" => name.clone()),
            fetch_duration: histogram!("feed_fetch_duration_seconds", "source" => name.clone()),
            mock_fallbacks: counter!("feed_mock_fallbacks_total", "source" => name.clone()),
            snapshot_age: gauge!("feed_snapshot_age_seconds", "source" => name.clone()),
            source: name,
        }
    }

    pub fn record_fetch(&self, duration: Duration, outcome: FetchOutcome) {
        counter!(
            "feed_fetches_total",
            "source" => self.source.clone(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        self.fetch_duration.record(duration.as_secs_f64());
    }

    pub fn record_retry(&self) {
        self.retries.increment(1);
    }

    pub fn record_mock_fallback(&self) {
        self.mock_fallbacks.increment(1);
    }

    /// Age of the data currently applied for this source
    pub fn set_snapshot_age(&self, age: Duration) {
        self.snapshot_age.set(age.as_secs_f64());
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Records duration and outcome when dropped; outcome defaults to failed
/// so an early return is never counted as a success
pub struct FetchMetricsGuard<'a> {
    metrics: &'a FeedMetrics,
    start: Instant,
    outcome: FetchOutcome,
}

impl<'a> FetchMetricsGuard<'a> {
    pub fn new(metrics: &'a FeedMetrics) -> Self {
        Self {
            metrics,
            start: Instant::now(),
            outcome: FetchOutcome::Failed,
        }
    }

    pub fn set_outcome(&mut self, outcome: FetchOutcome) {
        self.outcome = outcome;
    }
}

impl Drop for FetchMetricsGuard<'_> {
    fn drop(&mut self) {
        self.metrics.record_fetch(self.start.elapsed(), self.outcome);
    }
}
