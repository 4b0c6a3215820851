//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

use crate::capture::{AcquireErrorKind, NotReadyReason};

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registering or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics for capture sessions.
///
/// Cloning is cheap; clones update the same series.
#[derive(Clone)]
pub struct SessionMetrics {
    registry: Registry,

    // Acquisition
    opens_total: IntCounter,
    open_failures_total: IntCounterVec,
    active_streams: IntGauge,
    streams_released_total: IntCounter,

    // Still capture
    captures_total: IntCounter,
    capture_rejections_total: IntCounterVec,
    encode_failures_total: IntCounter,
}

impl SessionMetrics {
    /// Creates a registry with all capture metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let opens_total = IntCounter::new(
            "photo_capture_opens_total",
            "Successful camera opens",
        )?;
        let open_failures_total = IntCounterVec::new(
            Opts::new(
                "photo_capture_open_failures_total",
                "Failed camera opens by classification",
            ),
            &["class"],
        )?;
        let active_streams = IntGauge::new(
            "photo_capture_active_streams",
            "Device streams currently owned by a session",
        )?;
        let streams_released_total = IntCounter::new(
            "photo_capture_streams_released_total",
            "Device streams released with all tracks stopped",
        )?;
        let captures_total = IntCounter::new(
            "photo_capture_captures_total",
            "Still images captured",
        )?;
        let capture_rejections_total = IntCounterVec::new(
            Opts::new(
                "photo_capture_capture_rejections_total",
                "Capture requests refused because the camera was not ready",
            ),
            &["reason"],
        )?;
        let encode_failures_total = IntCounter::new(
            "photo_capture_encode_failures_total",
            "Captures that failed to produce an encoded image",
        )?;

        registry.register(Box::new(opens_total.clone()))?;
        registry.register(Box::new(open_failures_total.clone()))?;
        registry.register(Box::new(active_streams.clone()))?;
        registry.register(Box::new(streams_released_total.clone()))?;
        registry.register(Box::new(captures_total.clone()))?;
        registry.register(Box::new(capture_rejections_total.clone()))?;
        registry.register(Box::new(encode_failures_total.clone()))?;

        Ok(Self {
            registry,
            opens_total,
            open_failures_total,
            active_streams,
            streams_released_total,
            captures_total,
            capture_rejections_total,
            encode_failures_total,
        })
    }

    pub(crate) fn stream_acquired(&self) {
        self.active_streams.inc();
    }

    pub(crate) fn open_succeeded(&self) {
        self.opens_total.inc();
    }

    pub(crate) fn open_failed(&self, kind: AcquireErrorKind) {
        self.open_failures_total
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub(crate) fn stream_released(&self) {
        self.active_streams.dec();
        self.streams_released_total.inc();
    }

    pub(crate) fn captured(&self) {
        self.captures_total.inc();
    }

    pub(crate) fn capture_rejected(&self, reason: NotReadyReason) {
        self.capture_rejections_total
            .with_label_values(&[reason.as_str()])
            .inc();
    }

    pub(crate) fn encode_failed(&self) {
        self.encode_failures_total.inc();
    }

    /// Streams currently held.
    pub fn active_streams(&self) -> i64 {
        self.active_streams.get()
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
