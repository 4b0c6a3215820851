//! Capture session state machine.
//!
//! A session owns at most one device stream at a time and turns the frame
//! currently playing into a still image on request. Every exit path
//! (close, failed open, drop) stops all tracks of the owned stream.

use super::canvas::ImageCanvas;
use super::device::{MediaDevices, MediaStream, PlatformError, VideoSink};
use super::error::{AcquireError, CaptureError, NotReadyReason};
use super::still::StillImage;
use super::{CaptureConfig, FacingMode, Frame};
use crate::metrics::SessionMetrics;

/// Lifecycle state of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No stream; initial state.
    Closed,
    /// Waiting for the platform to answer an acquisition request.
    Opening,
    /// Streaming; stills can be captured.
    Active,
    /// The last open failed. Recoverable by opening again.
    Error,
}

/// Finite-state controller around a device video stream.
pub struct CaptureSession<D, V>
where
    D: MediaDevices,
    V: VideoSink<Stream = D::Stream>,
{
    devices: D,
    sink: V,
    config: CaptureConfig,
    facing_mode: FacingMode,
    stream: Option<D::Stream>,
    state: SessionState,
    last_error: Option<AcquireError>,
    still_image: Option<StillImage>,
    metrics: Option<SessionMetrics>,
}

impl<D, V> CaptureSession<D, V>
where
    D: MediaDevices,
    V: VideoSink<Stream = D::Stream>,
{
    /// Creates a closed session rendering into `sink`.
    pub fn new(devices: D, sink: V, config: CaptureConfig) -> Self {
        Self {
            devices,
            sink,
            facing_mode: config.facing_mode,
            config,
            stream: None,
            state: SessionState::Closed,
            last_error: None,
            still_image: None,
            metrics: None,
        }
    }

    /// Reports session activity into `metrics`.
    pub fn with_metrics(mut self, metrics: SessionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Opens the camera facing `facing_mode`.
    ///
    /// Any stream from a previous or abandoned open is released first.
    pub async fn open(&mut self, facing_mode: FacingMode) -> Result<(), AcquireError> {
        if self.state != SessionState::Closed {
            self.close();
        }

        self.facing_mode = facing_mode;
        self.state = SessionState::Opening;

        let constraints = self.config.constraints(facing_mode);
        tracing::info!(
            facing = %facing_mode,
            ideal_width = constraints.ideal_width,
            ideal_height = constraints.ideal_height,
            "Requesting camera stream"
        );

        let stream = match self.devices.get_user_media(&constraints).await {
            Ok(stream) => stream,
            Err(err) => return Err(self.fail(err)),
        };

        tracing::info!(
            stream = stream.id(),
            tracks = stream.track_count(),
            "Camera stream acquired"
        );
        if let Some(metrics) = &self.metrics {
            metrics.stream_acquired();
        }

        self.sink.attach(&stream);
        self.stream = Some(stream);

        if let Err(err) = self.sink.play().await {
            return Err(self.fail(err));
        }

        self.state = SessionState::Active;
        self.last_error = None;
        if let Some(metrics) = &self.metrics {
            metrics.open_succeeded();
        }
        tracing::info!(facing = %facing_mode, "Camera opened");
        Ok(())
    }

    /// Re-opens the camera with the current facing mode.
    pub async fn reopen(&mut self) -> Result<(), AcquireError> {
        self.open(self.facing_mode).await
    }

    /// Closes the camera and opens the opposite one.
    pub async fn switch_facing(&mut self) -> Result<(), AcquireError> {
        let next = self.facing_mode.toggled();
        tracing::info!(from = %self.facing_mode, to = %next, "Switching camera");
        self.close();
        self.open(next).await
    }

    /// Captures the frame currently playing as a still image.
    ///
    /// On failure the previous still image, if any, is left in place.
    pub fn capture(&mut self) -> Result<&StillImage, CaptureError> {
        let frame = match self.ready_frame() {
            Ok(frame) => frame,
            Err(reason) => {
                tracing::debug!(reason = reason.as_str(), state = ?self.state, "Capture refused");
                if let Some(metrics) = &self.metrics {
                    metrics.capture_rejected(reason);
                }
                return Err(CaptureError::NotReady(reason));
            }
        };

        let still = match self.encode(&frame) {
            Ok(still) => still,
            Err(err) => {
                tracing::warn!(error = %err, "Capture failed");
                if let Some(metrics) = &self.metrics {
                    metrics.encode_failed();
                }
                return Err(err);
            }
        };

        tracing::info!(
            width = still.width(),
            height = still.height(),
            bytes = still.len(),
            sequence = frame.sequence(),
            "Photo captured"
        );
        if let Some(metrics) = &self.metrics {
            metrics.captured();
        }
        Ok(self.still_image.insert(still))
    }

    /// Releases the device and returns to `Closed`. Idempotent.
    pub fn close(&mut self) {
        let was = self.state;
        self.release_stream();
        self.sink.detach();
        self.state = SessionState::Closed;
        if was != SessionState::Closed {
            tracing::info!(from = ?was, "Camera closed");
        }
    }

    /// Discards the captured still image. The stream is untouched.
    pub fn retake(&mut self) {
        if self.still_image.take().is_some() {
            tracing::debug!("Still image discarded");
        }
    }

    /// Hands the captured still image to the caller.
    pub fn take_still(&mut self) -> Option<StillImage> {
        self.still_image.take()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Facing mode of the current or last open.
    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    /// Classification of the most recent failed open, cleared by a successful one.
    pub fn last_error(&self) -> Option<&AcquireError> {
        self.last_error.as_ref()
    }

    /// The captured still, if any.
    pub fn still_image(&self) -> Option<&StillImage> {
        self.still_image.as_ref()
    }

    /// True while the session owns a device stream.
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// The sink the stream renders into, for preview.
    pub fn sink(&self) -> &V {
        &self.sink
    }

    /// Configuration the session was created with.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    fn ready_frame(&mut self) -> Result<Frame, NotReadyReason> {
        if self.state != SessionState::Active {
            return Err(NotReadyReason::NotActive);
        }
        if self.stream.is_none() {
            return Err(NotReadyReason::NoStream);
        }
        if self.sink.is_paused() || self.sink.is_ended() {
            return Err(NotReadyReason::PlaybackStalled);
        }
        let (width, height) = self.sink.dimensions();
        if width == 0 || height == 0 {
            return Err(NotReadyReason::ZeroDimensions);
        }
        self.sink
            .current_frame()
            .ok_or(NotReadyReason::PlaybackStalled)
    }

    fn encode(&self, frame: &Frame) -> Result<StillImage, CaptureError> {
        let mut canvas =
            ImageCanvas::allocate(frame.width(), frame.height(), self.config.max_pixels)?;
        canvas.draw(frame)?;
        canvas.encode_jpeg(self.config.jpeg_quality)
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let tracks = stream.track_count();
            stream.stop_all_tracks();
            tracing::info!(stream = stream.id(), tracks, "Stopped camera tracks");
            if let Some(metrics) = &self.metrics {
                metrics.stream_released();
            }
        }
    }

    fn fail(&mut self, platform: PlatformError) -> AcquireError {
        self.release_stream();
        self.sink.detach();

        let err = AcquireError::from(platform);
        tracing::warn!(
            class = %err.kind(),
            platform = %err.platform(),
            "Camera acquisition failed"
        );
        if let Some(metrics) = &self.metrics {
            metrics.open_failed(err.kind());
        }

        self.state = SessionState::Error;
        self.last_error = Some(err.clone());
        err
    }
}

impl<D, V> Drop for CaptureSession<D, V>
where
    D: MediaDevices,
    V: VideoSink<Stream = D::Stream>,
{
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::mock::{MockDevices, MockOutcome, MockSink};
    use crate::capture::{AcquireErrorKind, DeviceLedger, MockFeed};
    use proptest::prelude::*;
    use std::time::Duration;

    fn session_with(devices: MockDevices) -> (CaptureSession<MockDevices, MockSink>, DeviceLedger) {
        let ledger = devices.ledger();
        let session = CaptureSession::new(devices, MockSink::new(), CaptureConfig::default());
        (session, ledger)
    }

    #[tokio::test]
    async fn test_open_capture_retake_capture() {
        let (mut session, ledger) = session_with(MockDevices::new());
        assert_eq!(session.state(), SessionState::Closed);

        session.open(FacingMode::Front).await.unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.is_streaming());

        let first = session.capture().unwrap();
        assert!(!first.is_empty());
        assert_eq!((first.width(), first.height()), (640, 480));

        session.retake();
        assert!(session.still_image().is_none());
        assert_eq!(session.state(), SessionState::Active);

        let second = session.capture().unwrap();
        assert!(!second.is_empty());

        session.close();
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.leaked(), 0);
    }

    #[tokio::test]
    async fn test_permission_denied_classified() {
        let devices = MockDevices::new().then(MockOutcome::fail("NotAllowedError"));
        let (mut session, ledger) = session_with(devices);

        let err = session.open(FacingMode::Front).await.unwrap_err();
        assert_eq!(err.kind(), AcquireErrorKind::PermissionDenied);
        assert_eq!(session.state(), SessionState::Error);
        assert!(!session.is_streaming());
        assert_eq!(
            session.last_error().map(AcquireError::kind),
            Some(AcquireErrorKind::PermissionDenied)
        );
        assert_eq!(ledger.live(), 0);
    }

    #[tokio::test]
    async fn test_reopen_after_error_clears_last_error() {
        let devices = MockDevices::new().then(MockOutcome::fail("NotReadableError"));
        let (mut session, _ledger) = session_with(devices);

        let err = session.open(FacingMode::Front).await.unwrap_err();
        assert_eq!(err.kind(), AcquireErrorKind::DeviceBusy);

        session.reopen().await.unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_playback_failure_releases_stream() {
        let devices = MockDevices::new();
        let ledger = devices.ledger();
        let sink = MockSink::new().failing_play(PlatformError::new("AbortError", "interrupted"));
        let mut session = CaptureSession::new(devices, sink, CaptureConfig::default());

        let err = session.open(FacingMode::Front).await.unwrap_err();
        assert_eq!(err.kind(), AcquireErrorKind::Aborted);
        assert_eq!(session.state(), SessionState::Error);
        assert!(!session.is_streaming());
        assert!(!session.sink().is_attached());
        assert_eq!(ledger.acquired(), 1);
        assert_eq!(ledger.released(), 1);
        assert_eq!(ledger.live(), 0);
    }

    #[tokio::test]
    async fn test_capture_when_not_active_is_not_ready() {
        let (mut session, _ledger) = session_with(MockDevices::new());

        assert_eq!(
            session.capture().unwrap_err(),
            CaptureError::NotReady(NotReadyReason::NotActive)
        );
        assert!(session.still_image().is_none());

        session.open(FacingMode::Front).await.unwrap();
        session.capture().unwrap();
        let bytes = session.still_image().unwrap().bytes().to_vec();

        // Still image survives close; capture while closed leaves it alone
        session.close();
        assert!(matches!(
            session.capture(),
            Err(CaptureError::NotReady(NotReadyReason::NotActive))
        ));
        assert_eq!(session.still_image().unwrap().bytes(), bytes.as_slice());
    }

    #[tokio::test]
    async fn test_zero_width_keeps_previous_still() {
        let feed = MockFeed::new(320, 240);
        let (mut session, _ledger) = session_with(MockDevices::with_feed(feed.clone()));
        session.open(FacingMode::Front).await.unwrap();

        session.capture().unwrap();
        let before = session.still_image().cloned();

        feed.set_dimensions(0, 240);
        assert_eq!(
            session.capture().unwrap_err(),
            CaptureError::NotReady(NotReadyReason::ZeroDimensions)
        );
        assert_eq!(session.still_image().cloned(), before);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn test_warm_up_then_capture() {
        let feed = MockFeed::new(0, 0);
        let (mut session, _ledger) = session_with(MockDevices::with_feed(feed.clone()));
        session.open(FacingMode::Back).await.unwrap();

        assert!(matches!(
            session.capture(),
            Err(CaptureError::NotReady(NotReadyReason::ZeroDimensions))
        ));
        assert_eq!(session.state(), SessionState::Active);

        feed.set_dimensions(1280, 720);
        let still = session.capture().unwrap();
        assert_eq!((still.width(), still.height()), (1280, 720));
    }

    #[tokio::test]
    async fn test_paused_playback_not_ready() {
        let feed = MockFeed::default();
        let (mut session, _ledger) = session_with(MockDevices::with_feed(feed.clone()));
        session.open(FacingMode::Front).await.unwrap();

        feed.set_paused(true);
        assert!(matches!(
            session.capture(),
            Err(CaptureError::NotReady(NotReadyReason::PlaybackStalled))
        ));

        feed.set_paused(false);
        feed.set_ended(true);
        assert!(matches!(
            session.capture(),
            Err(CaptureError::NotReady(NotReadyReason::PlaybackStalled))
        ));
    }

    #[tokio::test]
    async fn test_surface_limit_is_encode_failure() {
        let devices = MockDevices::new();
        let config = CaptureConfig {
            max_pixels: 100,
            ..Default::default()
        };
        let mut session = CaptureSession::new(devices, MockSink::new(), config);
        session.open(FacingMode::Front).await.unwrap();

        assert!(matches!(
            session.capture(),
            Err(CaptureError::EncodeFailure(_))
        ));
        assert!(session.still_image().is_none());
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn test_switch_facing_toggles() {
        let (mut session, ledger) = session_with(MockDevices::new());
        session.open(FacingMode::Front).await.unwrap();

        session.switch_facing().await.unwrap();
        assert_eq!(session.facing_mode(), FacingMode::Back);
        session.switch_facing().await.unwrap();
        assert_eq!(session.facing_mode(), FacingMode::Front);

        let requested: Vec<_> = ledger.requests().iter().map(|c| c.facing_mode).collect();
        assert_eq!(
            requested,
            vec![FacingMode::Front, FacingMode::Back, FacingMode::Front]
        );
        assert_eq!(ledger.max_live(), 1);
    }

    #[tokio::test]
    async fn test_switch_to_missing_camera_is_no_device() {
        let devices = MockDevices::new().only(&[FacingMode::Front]);
        let (mut session, ledger) = session_with(devices);
        session.open(FacingMode::Front).await.unwrap();

        let err = session.switch_facing().await.unwrap_err();
        assert_eq!(err.kind(), AcquireErrorKind::NoDevice);
        assert_eq!(session.facing_mode(), FacingMode::Back);
        assert_eq!(ledger.live(), 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut session, ledger) = session_with(MockDevices::new());
        session.close();
        assert_eq!(session.state(), SessionState::Closed);

        session.open(FacingMode::Front).await.unwrap();
        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(ledger.released(), 1);
    }

    #[tokio::test]
    async fn test_open_while_active_closes_first() {
        let (mut session, ledger) = session_with(MockDevices::new());
        session.open(FacingMode::Front).await.unwrap();
        session.open(FacingMode::Front).await.unwrap();

        assert_eq!(ledger.acquired(), 2);
        assert_eq!(ledger.live(), 1);
        assert_eq!(ledger.max_live(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_open_is_closed_by_next_open() {
        let devices = MockDevices::new().then(MockOutcome::Hang);
        let (mut session, ledger) = session_with(devices);

        let result =
            tokio::time::timeout(Duration::from_secs(5), session.open(FacingMode::Front)).await;
        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::Opening);

        session.open(FacingMode::Front).await.unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(ledger.max_live(), 1);
    }

    #[tokio::test]
    async fn test_drop_releases_device() {
        let (mut session, ledger) = session_with(MockDevices::new());
        session.open(FacingMode::Front).await.unwrap();
        drop(session);

        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.leaked(), 0);
    }

    #[tokio::test]
    async fn test_metrics_follow_lifecycle() {
        let metrics = SessionMetrics::new().unwrap();
        let devices = MockDevices::new().then(MockOutcome::fail("AbortError"));
        let mut session = CaptureSession::new(devices, MockSink::new(), CaptureConfig::default())
            .with_metrics(metrics.clone());

        let _ = session.open(FacingMode::Front).await;
        session.open(FacingMode::Front).await.unwrap();
        assert_eq!(metrics.active_streams(), 1);
        session.capture().unwrap();
        session.close();
        assert_eq!(metrics.active_streams(), 0);

        let output = metrics.encode().unwrap();
        assert!(output.contains(r#"photo_capture_open_failures_total{class="aborted"} 1"#));
        assert!(output.contains("photo_capture_captures_total 1"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Open(FacingMode),
        Close,
        Switch,
        Capture,
        Retake,
        FailNext(&'static str),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Open(FacingMode::Front)),
            Just(Op::Open(FacingMode::Back)),
            Just(Op::Close),
            Just(Op::Switch),
            Just(Op::Capture),
            Just(Op::Retake),
            prop_oneof![
                Just("NotAllowedError"),
                Just("NotFoundError"),
                Just("NotReadableError"),
                Just("AbortError"),
                Just("TypeError"),
            ]
            .prop_map(Op::FailNext),
        ]
    }

    proptest! {
        #[test]
        fn prop_at_most_one_stream_owned(ops in proptest::collection::vec(op_strategy(), 1..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (max_live, leaked, live) = runtime.block_on(async {
                let (mut session, ledger) = session_with(MockDevices::new());
                let mut pending = Vec::new();

                for op in ops {
                    match op {
                        Op::Open(facing) => {
                            if let Some(name) = pending.pop() {
                                session.devices.push_outcome(MockOutcome::fail(name));
                            }
                            let _ = session.open(facing).await;
                        }
                        Op::Close => session.close(),
                        Op::Switch => {
                            let before = session.facing_mode();
                            if let Some(name) = pending.pop() {
                                session.devices.push_outcome(MockOutcome::fail(name));
                            }
                            let _ = session.switch_facing().await;
                            assert_ne!(session.facing_mode(), before);
                        }
                        Op::Capture => {
                            let before = session.still_image().cloned();
                            if session.capture().is_err() {
                                assert_eq!(session.still_image().cloned(), before);
                            }
                        }
                        Op::Retake => session.retake(),
                        Op::FailNext(name) => pending.push(name),
                    }

                    assert!(ledger.live() <= 1);
                    if session.state() == SessionState::Error {
                        assert!(!session.is_streaming());
                    }
                    assert_eq!(session.is_streaming(), ledger.live() == 1);
                }

                session.close();
                (ledger.max_live(), ledger.leaked(), ledger.live())
            });

            prop_assert!(max_live <= 1);
            prop_assert_eq!(leaked, 0);
            prop_assert_eq!(live, 0);
        }
    }
}
