// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics collection for the gateway.
//!
//! Tracks inbound requests per route and every call made to the FMP provider.

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::Arc;

use crate::error::AppError;

/// Metrics collector for the gateway
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,

    // Request metrics
    pub requests_total: IntCounterVec,

    // Upstream metrics
    pub upstream_requests: IntCounterVec,
    pub upstream_failures: IntCounterVec,
    pub upstream_latency: HistogramVec,
}

fn metric_error(e: prometheus::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("Failed to create metric: {}", e))
}

impl Metrics {
    pub fn new() -> Result<Self, AppError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("gateway_requests_total", "Total number of HTTP requests by route"),
            &["route"],
        )
        .map_err(metric_error)?;

        let upstream_requests = IntCounterVec::new(
            Opts::new(
                "gateway_upstream_requests_total",
                "Total number of calls made to the FMP provider",
            ),
            &["endpoint"],
        )
        .map_err(metric_error)?;

        let upstream_failures = IntCounterVec::new(
            Opts::new(
                "gateway_upstream_failures_total",
                "Total number of FMP provider calls that resulted in an error",
            ),
            &["endpoint", "kind"],
        )
        .map_err(metric_error)?;

        let upstream_latency = HistogramVec::new(
            HistogramOpts::new(
                "gateway_upstream_latency_seconds",
                "Duration of FMP provider calls in seconds",
            )
            .buckets(vec![
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.0, 5.0, 10.0,
            ]),
            &["endpoint"],
        )
        .map_err(metric_error)?;

        registry
            .register(Box::new(requests_total.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(upstream_requests.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(upstream_failures.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(upstream_latency.clone()))
            .map_err(metric_error)?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            upstream_requests,
            upstream_failures,
            upstream_latency,
        })
    }

    /// Record an inbound request for a route
    pub fn record_request(&self, route: &str) {
        self.requests_total.with_label_values(&[route]).inc();
    }

    /// Record a call to a provider endpoint
    pub fn record_upstream_request(&self, endpoint: &str) {
        self.upstream_requests.with_label_values(&[endpoint]).inc();
    }

    /// Record a failed provider call
    pub fn record_upstream_failure(&self, endpoint: &str, kind: &str) {
        self.upstream_failures
            .with_label_values(&[endpoint, kind])
            .inc();
    }

    /// Observe latency for a provider call in seconds
    pub fn record_upstream_latency(&self, endpoint: &str, seconds: f64) {
        self.upstream_latency
            .with_label_values(&[endpoint])
            .observe(seconds);
    }

    /// Export metrics in Prometheus format
    pub fn export(&self) -> Result<String, AppError> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to convert metrics to string: {}",
                e
            ))
        })
    }
}
