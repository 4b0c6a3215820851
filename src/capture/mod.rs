//! Camera acquisition and still capture.
//!
//! This module owns the camera lifecycle: requesting a device stream,
//! binding it to a video sink, capturing the current frame as a JPEG
//! still, and releasing the device on every exit path. Hardware is reached
//! only through the [`MediaDevices`] and [`VideoSink`] traits.

mod canvas;
mod config;
mod device;
mod error;
mod frame;
#[cfg(feature = "camera")]
mod hardware;
mod mock;
mod session;
mod still;

pub use canvas::ImageCanvas;
pub use config::{
    CaptureConfig, ConfigError, FacingMode, FileConfig, HandoffConfig, RefreshConfig,
    UploadConfig,
};
pub use device::{MediaDevices, MediaStream, PlatformError, StreamConstraints, VideoSink};
pub use error::{AcquireError, AcquireErrorKind, CaptureError, NotReadyReason};
pub use frame::{Frame, BYTES_PER_PIXEL};
#[cfg(feature = "camera")]
pub use hardware::{NokhwaDevices, NokhwaSink, NokhwaStream};
pub use mock::{DeviceLedger, MockDevices, MockFeed, MockOutcome, MockSink, MockStream};
pub use session::{CaptureSession, SessionState};
pub use still::{StillImage, StillImageError};
