//! Acquisition and capture error taxonomy.

use super::device::PlatformError;
use std::fmt;
use thiserror::Error;

/// Classification of a failed stream acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquireErrorKind {
    /// The user or policy refused camera access.
    PermissionDenied,
    /// No camera matches the request.
    NoDevice,
    /// The camera is locked by another process.
    DeviceBusy,
    /// Acquisition was aborted mid-flight.
    Aborted,
    /// Anything else.
    Unknown,
}

impl AcquireErrorKind {
    /// Classifies a platform error identifier.
    pub fn classify(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => AcquireErrorKind::PermissionDenied,
            "NotFoundError" | "OverconstrainedError" => AcquireErrorKind::NoDevice,
            "NotReadableError" => AcquireErrorKind::DeviceBusy,
            "AbortError" => AcquireErrorKind::Aborted,
            _ => AcquireErrorKind::Unknown,
        }
    }

    /// What the user should do next.
    pub fn guidance(self) -> &'static str {
        match self {
            AcquireErrorKind::PermissionDenied => "Please allow camera access and try again.",
            AcquireErrorKind::NoDevice => "No camera found. Please check if a camera is connected.",
            AcquireErrorKind::DeviceBusy => "Camera is being used by another application.",
            AcquireErrorKind::Aborted => "Camera access was aborted. Please try again.",
            AcquireErrorKind::Unknown => "Please check your camera settings and try again.",
        }
    }

    /// Short label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            AcquireErrorKind::PermissionDenied => "permission_denied",
            AcquireErrorKind::NoDevice => "no_device",
            AcquireErrorKind::DeviceBusy => "device_busy",
            AcquireErrorKind::Aborted => "aborted",
            AcquireErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AcquireErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified acquisition failure. Displays as the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to access camera. {}", .kind.guidance())]
pub struct AcquireError {
    kind: AcquireErrorKind,
    #[source]
    platform: PlatformError,
}

impl AcquireError {
    /// Classified cause.
    pub fn kind(&self) -> AcquireErrorKind {
        self.kind
    }

    /// The underlying platform error.
    pub fn platform(&self) -> &PlatformError {
        &self.platform
    }
}

impl From<PlatformError> for AcquireError {
    fn from(platform: PlatformError) -> Self {
        Self {
            kind: AcquireErrorKind::classify(&platform.name),
            platform,
        }
    }
}

/// Why a capture request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotReadyReason {
    /// The session is not streaming.
    NotActive,
    /// No stream is bound.
    NoStream,
    /// Playback is paused, ended, or has no frame to read.
    PlaybackStalled,
    /// The device has not reported frame dimensions yet.
    ZeroDimensions,
}

impl NotReadyReason {
    /// Short label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            NotReadyReason::NotActive => "not_active",
            NotReadyReason::NoStream => "no_stream",
            NotReadyReason::PlaybackStalled => "playback_stalled",
            NotReadyReason::ZeroDimensions => "zero_dimensions",
        }
    }
}

/// Still capture errors. None of them change session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The session cannot capture yet.
    #[error("camera not ready ({})", .0.as_str())]
    NotReady(NotReadyReason),
    /// Drawing or encoding the still failed.
    #[error("failed to encode still image: {0}")]
    EncodeFailure(String),
}

impl CaptureError {
    /// Message shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            CaptureError::NotReady(NotReadyReason::NoStream) => {
                "Camera stream not available. Please check camera permissions."
            }
            CaptureError::NotReady(_) => "Camera not ready. Please wait a moment and try again.",
            CaptureError::EncodeFailure(_) => "Failed to capture photo. Please try again.",
        }
    }
}
