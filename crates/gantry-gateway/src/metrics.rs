//! # Metrics Module
//!
//! This module provides Prometheus metrics for the Gantry gateway.
//! It exposes metrics about HTTP requests, bus requests, and authorization
//! decisions.

use once_cell::sync::Lazy;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

/// Global Prometheus registry for all gateway metrics
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// HTTP request counter
/// Labels: endpoint, method
pub static HTTP_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "gantry_http_requests_total",
        "Total number of HTTP requests by endpoint and method",
    );
    let counter = CounterVec::new(opts, &["endpoint", "method"])
        .expect("Failed to create HTTP requests counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register HTTP requests counter");
    counter
});

/// Bus request counter
/// Labels: subject, outcome
pub static BUS_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "gantry_bus_requests_total",
        "Total number of bus requests by subject and outcome",
    );
    let counter = CounterVec::new(opts, &["subject", "outcome"])
        .expect("Failed to create bus requests counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register bus requests counter");
    counter
});

/// Bus request duration histogram
/// Labels: subject
pub static BUS_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "gantry_bus_request_duration_seconds",
        "Bus request latency distribution in seconds",
    )
    .buckets(vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
    ]);
    let histogram = HistogramVec::new(opts, &["subject"])
        .expect("Failed to create bus request duration histogram");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("Failed to register bus request duration histogram");
    histogram
});

/// Authorization denial counter
/// Labels: resource_type
pub static AUTHZ_DENIALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "gantry_authz_denials_total",
        "Total number of authorization denials by resource type",
    );
    let counter = CounterVec::new(opts, &["resource_type"])
        .expect("Failed to create authz denials counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("Failed to register authz denials counter");
    counter
});

/// Encodes all registered metrics in Prometheus text format
///
/// # Returns
///
/// Returns a String containing all metrics in Prometheus exposition format
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to UTF-8")
}
