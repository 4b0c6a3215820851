//! Presentation surface driven by the capture handlers.

use crate::capture::StillImage;
use crate::upload::DetectionSummary;

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Operation succeeded.
    Success,
    /// Neutral information.
    Info,
    /// Something failed.
    Danger,
}

/// What a capture host can show. Implementations decide how.
pub trait View {
    /// Shows the live camera and hides any preview.
    fn show_camera(&mut self);

    /// Shows a captured still in place of the camera.
    fn show_preview(&mut self, image: &StillImage);

    /// Hides the preview and returns to the upload area.
    fn clear_preview(&mut self);

    /// Inline camera error banner.
    fn show_error(&mut self, message: &str);

    /// Transient notice.
    fn notify(&mut self, message: &str, level: NoticeLevel);

    /// Opens the camera dialog.
    fn open_modal(&mut self);

    /// Closes the camera dialog.
    fn hide_modal(&mut self);

    /// Enables or disables the submit control.
    fn set_submit_enabled(&mut self, enabled: bool);

    /// Processing indicator while a submission is in flight.
    fn set_busy(&mut self, busy: bool);

    /// Renders a detection outcome.
    fn show_results(&mut self, summary: &DetectionSummary);

    /// Renders a failed submission in the results area.
    fn show_failure(&mut self, message: &str);

    /// Leaves for another page.
    fn navigate(&mut self, path: &str);
}

/// View that logs everything and prints results to stdout.
#[derive(Debug, Default)]
pub struct ConsoleView {
    location: Option<String>,
}

impl ConsoleView {
    /// Creates a view that has not navigated yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last path navigated to.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl View for ConsoleView {
    fn show_camera(&mut self) {
        tracing::debug!("Showing camera");
    }

    fn show_preview(&mut self, image: &StillImage) {
        tracing::info!(
            width = image.width(),
            height = image.height(),
            bytes = image.len(),
            "Preview ready"
        );
    }

    fn clear_preview(&mut self) {
        tracing::debug!("Preview cleared");
    }

    fn show_error(&mut self, message: &str) {
        tracing::error!("{}", message);
    }

    fn notify(&mut self, message: &str, level: NoticeLevel) {
        match level {
            NoticeLevel::Danger => tracing::warn!("{}", message),
            NoticeLevel::Success | NoticeLevel::Info => tracing::info!("{}", message),
        }
    }

    fn open_modal(&mut self) {
        tracing::debug!("Camera modal opened");
    }

    fn hide_modal(&mut self) {
        tracing::debug!("Camera modal hidden");
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        tracing::debug!(enabled, "Submit toggled");
    }

    fn set_busy(&mut self, busy: bool) {
        if busy {
            tracing::info!("Processing...");
        }
    }

    fn show_results(&mut self, summary: &DetectionSummary) {
        println!("{summary}");
    }

    fn show_failure(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn navigate(&mut self, path: &str) {
        tracing::info!(path, "Navigating");
        self.location = Some(path.to_string());
    }
}

/// Something a [`RecordingView`] was asked to show.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Live camera shown.
    Camera,
    /// Still preview shown.
    Preview {
        /// Still width in pixels.
        width: u32,
        /// Still height in pixels.
        height: u32,
    },
    /// Preview hidden.
    PreviewCleared,
    /// Inline error banner.
    Error(String),
    /// Transient notice with its level.
    Notice(String, NoticeLevel),
    /// Dialog opened.
    ModalOpened,
    /// Dialog hidden.
    ModalHidden,
    /// Submit enabled or disabled.
    SubmitEnabled(bool),
    /// Processing indicator toggled.
    Busy(bool),
    /// Detection outcome rendered.
    Results(DetectionSummary),
    /// Submission failure rendered.
    Failure(String),
    /// Navigation to a path.
    Navigate(String),
}

/// View that records every call, for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingView {
    /// Every call, oldest first.
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    /// Creates a view with no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices of the given level, in order.
    pub fn notices(&self, level: NoticeLevel) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Notice(msg, l) if *l == level => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }

    /// True if `event` was recorded.
    pub fn contains(&self, event: &ViewEvent) -> bool {
        self.events.contains(event)
    }

    /// Forgets recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl View for RecordingView {
    fn show_camera(&mut self) {
        self.events.push(ViewEvent::Camera);
    }

    fn show_preview(&mut self, image: &StillImage) {
        self.events.push(ViewEvent::Preview {
            width: image.width(),
            height: image.height(),
        });
    }

    fn clear_preview(&mut self) {
        self.events.push(ViewEvent::PreviewCleared);
    }

    fn show_error(&mut self, message: &str) {
        self.events.push(ViewEvent::Error(message.to_string()));
    }

    fn notify(&mut self, message: &str, level: NoticeLevel) {
        self.events.push(ViewEvent::Notice(message.to_string(), level));
    }

    fn open_modal(&mut self) {
        self.events.push(ViewEvent::ModalOpened);
    }

    fn hide_modal(&mut self) {
        self.events.push(ViewEvent::ModalHidden);
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.events.push(ViewEvent::SubmitEnabled(enabled));
    }

    fn set_busy(&mut self, busy: bool) {
        self.events.push(ViewEvent::Busy(busy));
    }

    fn show_results(&mut self, summary: &DetectionSummary) {
        self.events.push(ViewEvent::Results(summary.clone()));
    }

    fn show_failure(&mut self, message: &str) {
        self.events.push(ViewEvent::Failure(message.to_string()));
    }

    fn navigate(&mut self, path: &str) {
        self.events.push(ViewEvent::Navigate(path.to_string()));
    }
}
