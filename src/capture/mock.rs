//! Scripted mock devices for tests and the demo binary.
//!
//! All mock handles share state through `Rc`, matching the single-threaded
//! event loop the session runs on. A [`DeviceLedger`] records every stream
//! the mock hands out so callers can assert nothing is left running.

use super::device::{MediaDevices, MediaStream, PlatformError, StreamConstraints, VideoSink};
use super::frame::BYTES_PER_PIXEL;
use super::{FacingMode, Frame};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Default)]
struct LedgerState {
    live: usize,
    max_live: usize,
    acquired: u64,
    released: u64,
    leaked: u64,
    requests: Vec<StreamConstraints>,
}

/// Shared record of stream acquisitions and releases.
#[derive(Debug, Clone, Default)]
pub struct DeviceLedger(Rc<RefCell<LedgerState>>);

impl DeviceLedger {
    /// Streams currently holding the device.
    pub fn live(&self) -> usize {
        self.0.borrow().live
    }

    /// Highest number of simultaneously live streams ever observed.
    pub fn max_live(&self) -> usize {
        self.0.borrow().max_live
    }

    /// Streams handed out so far.
    pub fn acquired(&self) -> u64 {
        self.0.borrow().acquired
    }

    /// Streams stopped by their owner.
    pub fn released(&self) -> u64 {
        self.0.borrow().released
    }

    /// Streams dropped while their tracks were still running.
    pub fn leaked(&self) -> u64 {
        self.0.borrow().leaked
    }

    /// Every constraint set passed to the device, in order.
    pub fn requests(&self) -> Vec<StreamConstraints> {
        self.0.borrow().requests.clone()
    }

    fn record_request(&self, constraints: &StreamConstraints) {
        self.0.borrow_mut().requests.push(*constraints);
    }

    fn acquire(&self) {
        let mut state = self.0.borrow_mut();
        state.live += 1;
        state.acquired += 1;
        state.max_live = state.max_live.max(state.live);
    }

    fn release(&self) {
        let mut state = self.0.borrow_mut();
        state.live = state.live.saturating_sub(1);
        state.released += 1;
    }

    fn leak(&self) {
        let mut state = self.0.borrow_mut();
        state.live = state.live.saturating_sub(1);
        state.leaked += 1;
    }
}

#[derive(Debug)]
struct FeedState {
    width: u32,
    height: u32,
    warmup_polls: u32,
    paused: bool,
    ended: bool,
    sequence: u64,
}

/// Synthetic video feed shared by every stream a [`MockDevices`] hands out.
#[derive(Debug, Clone)]
pub struct MockFeed(Rc<RefCell<FeedState>>);

impl MockFeed {
    /// Creates a feed of the given size, ready immediately.
    pub fn new(width: u32, height: u32) -> Self {
        Self(Rc::new(RefCell::new(FeedState {
            width,
            height,
            warmup_polls: 0,
            paused: false,
            ended: false,
            sequence: 0,
        })))
    }

    /// Changes the reported frame size.
    pub fn set_dimensions(&self, width: u32, height: u32) {
        let mut state = self.0.borrow_mut();
        state.width = width;
        state.height = height;
    }

    /// Reports zero dimensions for the next `polls` dimension queries.
    pub fn warm_up(&self, polls: u32) {
        self.0.borrow_mut().warmup_polls = polls;
    }

    /// Pauses or resumes playback.
    pub fn set_paused(&self, paused: bool) {
        self.0.borrow_mut().paused = paused;
    }

    /// Marks the source as ended.
    pub fn set_ended(&self, ended: bool) {
        self.0.borrow_mut().ended = ended;
    }

    fn poll_dimensions(&self) -> (u32, u32) {
        let mut state = self.0.borrow_mut();
        if state.warmup_polls > 0 {
            state.warmup_polls -= 1;
            return (0, 0);
        }
        (state.width, state.height)
    }

    fn render(&self, facing: FacingMode) -> Option<Frame> {
        let mut state = self.0.borrow_mut();
        if state.width == 0 || state.height == 0 {
            return None;
        }
        state.sequence += 1;

        let seed = state.sequence.wrapping_mul(31) ^ facing_seed(facing);
        let pixel_count = (state.width as usize) * (state.height as usize);
        let mut pixels = Vec::with_capacity(pixel_count * BYTES_PER_PIXEL);
        for i in 0..pixel_count {
            // Deterministic gradient, only for exercising frame handling
            let v = ((i as u64 ^ seed) % 256) as u8;
            pixels.extend_from_slice(&[v, v.wrapping_add(85), v.wrapping_add(170), 255]);
        }

        Some(Frame::new(pixels, state.width, state.height, state.sequence))
    }
}

impl Default for MockFeed {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

fn facing_seed(facing: FacingMode) -> u64 {
    match facing {
        FacingMode::Front => 0x11,
        FacingMode::Back => 0xA7,
    }
}

/// Scripted answer to one acquisition request.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Hand out a stream.
    Grant,
    /// Fail with the given platform error.
    Fail(PlatformError),
    /// Never answer, like an unanswered permission prompt.
    Hang,
}

impl MockOutcome {
    /// Convenience for `Fail` with a named platform error.
    pub fn fail(name: &str) -> Self {
        MockOutcome::Fail(PlatformError::new(name, "scripted failure"))
    }
}

/// Mock media devices answering requests from a script.
///
/// Once the script is exhausted every request is granted.
#[derive(Debug)]
pub struct MockDevices {
    script: VecDeque<MockOutcome>,
    supported: Vec<FacingMode>,
    ledger: DeviceLedger,
    feed: MockFeed,
    next_id: u64,
}

impl MockDevices {
    /// Devices that grant every request with a 640x480 feed.
    pub fn new() -> Self {
        Self::with_feed(MockFeed::default())
    }

    /// Devices streaming from `feed`.
    pub fn with_feed(feed: MockFeed) -> Self {
        Self {
            script: VecDeque::new(),
            supported: vec![FacingMode::Front, FacingMode::Back],
            ledger: DeviceLedger::default(),
            feed,
            next_id: 0,
        }
    }

    /// Appends an outcome to the script.
    pub fn then(mut self, outcome: MockOutcome) -> Self {
        self.script.push_back(outcome);
        self
    }

    /// Restricts the cameras this device has; other requests are overconstrained.
    pub fn only(mut self, facing: &[FacingMode]) -> Self {
        self.supported = facing.to_vec();
        self
    }

    /// Queues the answer to the next request.
    pub fn push_outcome(&mut self, outcome: MockOutcome) {
        self.script.push_back(outcome);
    }

    /// Handle for inspecting stream bookkeeping.
    pub fn ledger(&self) -> DeviceLedger {
        self.ledger.clone()
    }

    /// Handle to the shared feed.
    pub fn feed(&self) -> MockFeed {
        self.feed.clone()
    }
}

impl Default for MockDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaDevices for MockDevices {
    type Stream = MockStream;

    async fn get_user_media(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<MockStream, PlatformError> {
        self.ledger.record_request(constraints);

        match self.script.pop_front().unwrap_or(MockOutcome::Grant) {
            MockOutcome::Grant => {
                if !self.supported.contains(&constraints.facing_mode) {
                    return Err(PlatformError::new(
                        "OverconstrainedError",
                        format!("no {} camera", constraints.facing_mode),
                    ));
                }
                self.next_id += 1;
                self.ledger.acquire();
                tracing::debug!(facing = %constraints.facing_mode, "MockDevices granted stream");
                Ok(MockStream {
                    id: format!("mock-{}", self.next_id),
                    facing: constraints.facing_mode,
                    feed: self.feed.clone(),
                    ledger: self.ledger.clone(),
                    live_tracks: 1,
                })
            }
            MockOutcome::Fail(err) => Err(err),
            MockOutcome::Hang => std::future::pending().await,
        }
    }
}

/// Stream handed out by [`MockDevices`]. Carries a single video track.
#[derive(Debug)]
pub struct MockStream {
    id: String,
    facing: FacingMode,
    feed: MockFeed,
    ledger: DeviceLedger,
    live_tracks: usize,
}

impl MockStream {
    /// Camera this stream was opened for.
    pub fn facing_mode(&self) -> FacingMode {
        self.facing
    }
}

impl MediaStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn track_count(&self) -> usize {
        1
    }

    fn stop_all_tracks(&mut self) {
        if self.live_tracks > 0 {
            self.live_tracks = 0;
            self.ledger.release();
        }
    }

    fn is_active(&self) -> bool {
        self.live_tracks > 0
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        if self.live_tracks > 0 {
            tracing::warn!(stream = %self.id, "MockStream dropped with live tracks");
            self.ledger.leak();
        }
    }
}

/// Video sink playing [`MockStream`]s.
#[derive(Debug, Default)]
pub struct MockSink {
    source: Option<(MockFeed, FacingMode)>,
    playing: bool,
    play_failures: VecDeque<PlatformError>,
}

impl MockSink {
    /// Creates a sink with nothing attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `play` call fail with the given platform error.
    pub fn failing_play(mut self, err: PlatformError) -> Self {
        self.play_failures.push_back(err);
        self
    }

    /// True while a stream is attached.
    pub fn is_attached(&self) -> bool {
        self.source.is_some()
    }
}

impl VideoSink for MockSink {
    type Stream = MockStream;

    fn attach(&mut self, stream: &MockStream) {
        self.source = Some((stream.feed.clone(), stream.facing));
        self.playing = false;
    }

    async fn play(&mut self) -> Result<(), PlatformError> {
        if let Some(err) = self.play_failures.pop_front() {
            return Err(err);
        }
        if self.source.is_none() {
            return Err(PlatformError::new("InvalidStateError", "no source bound"));
        }
        self.playing = true;
        Ok(())
    }

    fn detach(&mut self) {
        self.source = None;
        self.playing = false;
    }

    fn dimensions(&self) -> (u32, u32) {
        match &self.source {
            Some((feed, _)) => feed.poll_dimensions(),
            None => (0, 0),
        }
    }

    fn is_paused(&self) -> bool {
        match &self.source {
            Some((feed, _)) => !self.playing || feed.0.borrow().paused,
            None => true,
        }
    }

    fn is_ended(&self) -> bool {
        match &self.source {
            Some((feed, _)) => feed.0.borrow().ended,
            None => false,
        }
    }

    fn current_frame(&mut self) -> Option<Frame> {
        let (feed, facing) = self.source.as_ref()?;
        if !self.playing {
            return None;
        }
        feed.render(*facing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureConfig;

    #[tokio::test]
    async fn test_mock_devices_lifecycle() {
        let mut devices = MockDevices::new();
        let ledger = devices.ledger();
        let constraints = CaptureConfig::default().constraints(FacingMode::Front);

        let mut stream = devices.get_user_media(&constraints).await.unwrap();
        assert!(stream.is_active());
        assert_eq!(ledger.live(), 1);

        stream.stop_all_tracks();
        stream.stop_all_tracks();
        assert!(!stream.is_active());
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.released(), 1);

        drop(stream);
        assert_eq!(ledger.leaked(), 0);
    }

    #[tokio::test]
    async fn test_dropping_live_stream_counts_as_leak() {
        let mut devices = MockDevices::new();
        let ledger = devices.ledger();
        let constraints = CaptureConfig::default().constraints(FacingMode::Front);

        let stream = devices.get_user_media(&constraints).await.unwrap();
        drop(stream);

        assert_eq!(ledger.leaked(), 1);
        assert_eq!(ledger.live(), 0);
    }

    #[tokio::test]
    async fn test_scripted_failure_then_grant() {
        let mut devices = MockDevices::new().then(MockOutcome::fail("NotReadableError"));
        let constraints = CaptureConfig::default().constraints(FacingMode::Front);

        let err = devices.get_user_media(&constraints).await.unwrap_err();
        assert_eq!(err.name, "NotReadableError");

        let mut stream = devices.get_user_media(&constraints).await.unwrap();
        stream.stop_all_tracks();
        assert_eq!(devices.ledger().requests().len(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_facing_is_overconstrained() {
        let mut devices = MockDevices::new().only(&[FacingMode::Front]);
        let constraints = CaptureConfig::default().constraints(FacingMode::Back);

        let err = devices.get_user_media(&constraints).await.unwrap_err();
        assert_eq!(err.name, "OverconstrainedError");
    }

    #[tokio::test]
    async fn test_sink_warm_up_reports_zero_dimensions() {
        let mut devices = MockDevices::new();
        let feed = devices.feed();
        let constraints = CaptureConfig::default().constraints(FacingMode::Front);
        let mut stream = devices.get_user_media(&constraints).await.unwrap();

        let mut sink = MockSink::new();
        sink.attach(&stream);
        sink.play().await.unwrap();

        feed.warm_up(2);
        assert_eq!(sink.dimensions(), (0, 0));
        assert_eq!(sink.dimensions(), (0, 0));
        assert_eq!(sink.dimensions(), (640, 480));

        let frame = sink.current_frame().unwrap();
        assert!(frame.is_valid());

        sink.detach();
        assert!(sink.is_paused());
        assert!(sink.current_frame().is_none());
        stream.stop_all_tracks();
    }
}
