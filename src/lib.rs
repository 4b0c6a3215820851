//! Photo Capture Library
//!
//! Camera acquisition and still-photo capture for a photo identification
//! workflow. A [`CaptureSession`] owns the device stream, captures the frame
//! currently playing as a JPEG still and releases the camera on every exit
//! path. UI hosts drive the session through a [`CaptureController`].
//!
//! # Architecture
//!
//! ```text
//! capture (session, devices, encoder)
//!     ↓
//! host (standalone page | modal dialog, intake choice)
//!     ↓                    ↓
//! handoff (read-once)   upload (detection, reports)
//! ```
//!
//! # Design Principles
//!
//! - **One stream**: a session never holds more than one device stream
//! - **Always released**: close, failed opens and drop stop every track
//! - **All-or-nothing capture**: a failed capture leaves the previous still
//! - **Hardware behind traits**: [`MediaDevices`] and [`VideoSink`]
//!
//! # Example
//!
//! ```no_run
//! use photo_capture::capture::{
//!     CaptureConfig, CaptureSession, FacingMode, MockDevices, MockSink,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session =
//!     CaptureSession::new(MockDevices::new(), MockSink::new(), CaptureConfig::default());
//!
//! session.open(FacingMode::Front).await?;
//! let still = session.capture()?;
//! println!("captured {} bytes of {}", still.len(), still.mime());
//!
//! session.switch_facing().await?;
//! session.close();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod handoff;
pub mod host;
pub mod metrics;
pub mod upload;

// Re-export commonly used types at crate root
pub use capture::{
    AcquireError, AcquireErrorKind, CaptureConfig, CaptureError, CaptureSession, FacingMode,
    FileConfig, MediaDevices, SessionState, StillImage, VideoSink,
};
pub use handoff::{FileStore, Handoff, MemoryStore};
pub use host::{CaptureController, CaptureHost, IntakeFlow, UiElements, View};
pub use metrics::SessionMetrics;
pub use upload::{DetectionClient, DetectionResponse, ReportsClient};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
