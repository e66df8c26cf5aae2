//! # Prometheus Metrics
//!
//! Operational metrics for the ledger node, scraped by Prometheus at the
//! `/metrics` endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] with
//! the `tally` prefix so they do not collide with any default global
//! registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Prometheus handles are internally reference-counted, so clones share
/// the same underlying series.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Dispatched RPC calls, labelled by method name.
    pub requests_total: IntCounterVec,
    /// RPC calls that produced an `{error}` body, labelled by method name.
    pub request_errors_total: IntCounterVec,
    /// Wallets successfully created.
    pub wallets_created_total: IntCounter,
    /// Payments that reached durable storage.
    pub payments_committed_total: IntCounter,
    /// Wallets currently held in the in-memory cache.
    pub cached_wallets: IntGauge,
    /// Wall time spent dispatching one RPC call.
    pub request_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric definition is invalid or a name is
    /// registered twice.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("tally".into()), None)?;

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "Total number of dispatched RPC calls"),
            &["method"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_errors_total = IntCounterVec::new(
            Opts::new(
                "request_errors_total",
                "Total number of RPC calls answered with an error",
            ),
            &["method"],
        )?;
        registry.register(Box::new(request_errors_total.clone()))?;

        let wallets_created_total =
            IntCounter::new("wallets_created_total", "Total number of wallets created")?;
        registry.register(Box::new(wallets_created_total.clone()))?;

        let payments_committed_total = IntCounter::new(
            "payments_committed_total",
            "Total number of payments persisted to durable storage",
        )?;
        registry.register(Box::new(payments_committed_total.clone()))?;

        let cached_wallets =
            IntGauge::new("cached_wallets", "Number of wallets held in the memory cache")?;
        registry.register(Box::new(cached_wallets.clone()))?;

        let request_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "request_latency_seconds",
                "RPC dispatch latency in seconds, including durable writes",
            )
            .buckets(vec![
                0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
        )?;
        registry.register(Box::new(request_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_errors_total,
            wallets_created_total,
            payments_committed_total,
            cached_wallets,
            request_latency_seconds,
        })
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
