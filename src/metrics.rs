//! Per-exchange fetch metrics
//!
//! Tracks latency percentiles and success rates of the poll loop's
//! top-of-book requests, one collector per exchange.

use crate::types::Exchange;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Metrics for one exchange
#[derive(Debug, Clone)]
pub struct FetchMetrics {
    pub exchange: Exchange,
    /// 50th percentile latency in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile latency in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of fetches tracked
    pub total_requests: u64,
    /// Number of failed fetches (errors and timeouts)
    pub failed_requests: u64,
}

impl FetchMetrics {
    /// Creates metrics with no data
    pub fn empty(exchange: Exchange) -> Self {
        Self {
            exchange,
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_requests: 0,
            failed_requests: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct Counters {
    samples: VecDeque<LatencySample>,
    total_requests: u64,
    failed_requests: u64,
}

/// Collects and computes metrics for one exchange
pub struct MetricsCollector {
    exchange: Exchange,
    counters: RwLock<Counters>,
}

impl MetricsCollector {
    pub fn new(exchange: Exchange) -> Self {
        Self {
            exchange,
            counters: RwLock::new(Counters {
                samples: VecDeque::with_capacity(MAX_SAMPLES),
                ..Counters::default()
            }),
        }
    }

    /// Records a fetch with its duration and success status
    pub async fn record_request(&self, duration: Duration, success: bool) {
        let mut counters = self.counters.write().await;
        counters.total_requests += 1;
        if !success {
            counters.failed_requests += 1;
        }
        if counters.samples.len() >= MAX_SAMPLES {
            counters.samples.pop_front();
        }
        counters.samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> FetchMetrics {
        let counters = self.counters.read().await;
        if counters.samples.is_empty() {
            return FetchMetrics::empty(self.exchange);
        }

        // Percentiles only over successful fetches
        let mut latencies: Vec<f64> = counters
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let total = counters.total_requests;
        let failed = counters.failed_requests;
        let success_rate = if total > 0 {
            (total - failed) as f64 / total as f64
        } else {
            1.0
        };

        FetchMetrics {
            exchange: self.exchange,
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_requests: total,
            failed_requests: failed,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

/// One collector per configured exchange
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    collectors: HashMap<Exchange, Arc<MetricsCollector>>,
}

impl MetricsRegistry {
    pub fn new(exchanges: &[Exchange]) -> Self {
        Self {
            collectors: exchanges
                .iter()
                .map(|e| (*e, Arc::new(MetricsCollector::new(*e))))
                .collect(),
        }
    }

    pub fn collector(&self, exchange: Exchange) -> Option<&Arc<MetricsCollector>> {
        self.collectors.get(&exchange)
    }

    pub async fn record(&self, exchange: Exchange, duration: Duration, success: bool) {
        if let Some(collector) = self.collectors.get(&exchange) {
            collector.record_request(duration, success).await;
        }
    }
}
