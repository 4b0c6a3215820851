//! Prometheus metrics for capture sessions.
//!
//! # Metrics Exposed
//!
//! ## Acquisition
//! - `photo_capture_opens_total` - Successful camera opens
//! - `photo_capture_open_failures_total{class}` - Failed opens by classification
//! - `photo_capture_active_streams` - Device streams currently owned
//! - `photo_capture_streams_released_total` - Streams released with all tracks stopped
//!
//! ## Still Capture
//! - `photo_capture_captures_total` - Still images captured
//! - `photo_capture_capture_rejections_total{reason}` - Captures refused as not ready
//! - `photo_capture_encode_failures_total` - Captures that failed to encode
//!
//! # Example
//!
//! ```no_run
//! use photo_capture::capture::{CaptureConfig, CaptureSession, MockDevices, MockSink};
//! use photo_capture::metrics::SessionMetrics;
//!
//! let metrics = SessionMetrics::new().expect("Failed to create registry");
//! let session = CaptureSession::new(MockDevices::new(), MockSink::new(), CaptureConfig::default())
//!     .with_metrics(metrics.clone());
//!
//! println!("{}", metrics.encode().unwrap());
//! # drop(session);
//! ```

mod collector;

pub use collector::{MetricsError, SessionMetrics};
