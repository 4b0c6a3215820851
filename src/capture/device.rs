//! Device acquisition and rendering seams.
//!
//! A capture session talks to hardware through two traits: [`MediaDevices`]
//! hands out video streams, and a [`VideoSink`] plays a bound stream and
//! exposes its current frame. Real backends and the scripted mock in
//! [`super::mock`] implement the same pair.

use super::{FacingMode, Frame};
use thiserror::Error;

/// A device video stream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Requested camera.
    pub facing_mode: FacingMode,
    /// Preferred width; backends pick their closest mode.
    pub ideal_width: u32,
    /// Preferred height; backends pick their closest mode.
    pub ideal_height: u32,
    /// Whether an audio track is requested.
    pub audio: bool,
}

/// A failure reported by the platform, identified the way the platform
/// names it (`NotAllowedError`, `NotReadableError`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct PlatformError {
    /// Platform error identifier used for classification.
    pub name: String,
    /// Free-form detail.
    pub message: String,
}

impl PlatformError {
    /// Creates an error with a platform name such as `NotAllowedError`.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// An acquired device stream.
///
/// Dropping a stream does not guarantee the hardware is released; owners
/// must call [`MediaStream::stop_all_tracks`] first.
pub trait MediaStream {
    /// Stable identifier for logging.
    fn id(&self) -> &str;

    /// Number of tracks the stream carries.
    fn track_count(&self) -> usize;

    /// Stops every track and releases the device.
    fn stop_all_tracks(&mut self);

    /// True while at least one track is live.
    fn is_active(&self) -> bool;
}

/// Hands out device video streams.
#[allow(async_fn_in_trait)]
pub trait MediaDevices {
    /// Stream type produced by this backend.
    type Stream: MediaStream;

    /// Requests a video stream. Suspends until the platform answers, which
    /// includes any permission prompt.
    async fn get_user_media(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<Self::Stream, PlatformError>;
}

/// A live video sink a stream is bound to for preview and frame reads.
#[allow(async_fn_in_trait)]
pub trait VideoSink {
    /// Stream type the sink can play.
    type Stream: MediaStream;

    /// Binds a stream as the sink's source.
    fn attach(&mut self, stream: &Self::Stream);

    /// Starts playback of the bound stream.
    async fn play(&mut self) -> Result<(), PlatformError>;

    /// Clears the source and pauses. Safe to call when nothing is bound.
    fn detach(&mut self);

    /// Native frame dimensions; `(0, 0)` until the device has warmed up.
    fn dimensions(&self) -> (u32, u32);

    /// True when playback is paused.
    fn is_paused(&self) -> bool;

    /// True when the source has ended.
    fn is_ended(&self) -> bool;

    /// Reads the frame currently being displayed.
    fn current_frame(&mut self) -> Option<Frame>;
}
