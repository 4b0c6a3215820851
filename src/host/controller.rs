//! Event handlers connecting a host's controls to its capture session.

use super::elements::UiElements;
use super::view::{NoticeLevel, View};
use super::CaptureHost;
use crate::capture::{
    AcquireError, CaptureError, CaptureSession, MediaDevices, StillImage, VideoSink,
};
use crate::handoff::{Handoff, HandoffError, HandoffStore};

pub(crate) const CAPTURED: &str = "Photo captured successfully!";
const NOTHING_CAPTURED: &str = "No image captured. Please capture a photo first.";

/// Owns one session and translates UI events into session calls.
pub struct CaptureController<D, V, W>
where
    D: MediaDevices,
    V: VideoSink<Stream = D::Stream>,
    W: View,
{
    session: CaptureSession<D, V>,
    elements: UiElements,
    view: W,
}

impl<D, V, W> CaptureController<D, V, W>
where
    D: MediaDevices,
    V: VideoSink<Stream = D::Stream>,
    W: View,
{
    /// Wraps `session` for the layout described by `elements`.
    pub fn new(session: CaptureSession<D, V>, elements: UiElements, view: W) -> Self {
        Self {
            session,
            elements,
            view,
        }
    }

    /// Which host this controller drives.
    pub fn host(&self) -> CaptureHost {
        self.elements.host()
    }

    /// Shows the camera and opens it with the session's facing mode.
    pub async fn on_open(&mut self) -> Result<(), AcquireError> {
        if self.host() == CaptureHost::ModalDialog {
            self.view.open_modal();
        }
        self.view.show_camera();
        let facing = self.session.facing_mode();
        let result = self.session.open(facing).await;
        self.report_open(result)
    }

    /// Closes the camera and opens the opposite one.
    pub async fn on_switch(&mut self) -> Result<(), AcquireError> {
        let result = self.session.switch_facing().await;
        self.report_open(result)
    }

    /// Captures a still and shows it.
    ///
    /// In the modal host the dialog is hidden afterwards, which closes the
    /// camera, and submission is enabled.
    pub fn on_capture(&mut self) -> Result<(), CaptureError> {
        match self.session.capture() {
            Ok(still) => self.view.show_preview(still),
            Err(err) => {
                tracing::warn!(error = %err, "Capture failed");
                self.report(err.user_message());
                return Err(err);
            }
        }

        if self.host() == CaptureHost::ModalDialog {
            self.view.set_submit_enabled(true);
            self.view.hide_modal();
            self.on_modal_hidden();
            self.view.notify(CAPTURED, NoticeLevel::Success);
        }
        Ok(())
    }

    /// The modal was dismissed, by capture or by the user.
    pub fn on_modal_hidden(&mut self) {
        self.session.close();
    }

    /// Closes the camera and leaves the capture UI.
    pub fn on_close(&mut self) {
        self.session.close();
        match self.host() {
            CaptureHost::StandalonePage => self.view.navigate("/"),
            CaptureHost::ModalDialog => self.view.hide_modal(),
        }
    }

    /// Discards the still and returns to the live camera.
    pub fn on_retake(&mut self) {
        self.session.retake();
        self.view.clear_preview();
        self.view.show_camera();
    }

    /// Hands the still to the main flow and navigates there.
    ///
    /// Returns `false` when there was nothing to hand off. The still is kept
    /// if the store write fails.
    pub fn on_use_photo<S: HandoffStore>(
        &mut self,
        location: Option<&str>,
        handoff: &mut Handoff<S>,
    ) -> Result<bool, HandoffError> {
        let Some(still) = self.session.still_image() else {
            self.view.notify(NOTHING_CAPTURED, NoticeLevel::Danger);
            return Ok(false);
        };
        let location = location.filter(|_| self.elements.has_location_input());
        handoff.put(still, location)?;

        self.session.take_still();
        self.session.close();
        self.view.navigate("/");
        Ok(true)
    }

    /// Page is going away.
    pub fn on_teardown(&mut self) {
        self.session.close();
    }

    /// Takes the captured still out of the session.
    pub fn take_still(&mut self) -> Option<StillImage> {
        self.session.take_still()
    }

    /// The driven session.
    pub fn session(&self) -> &CaptureSession<D, V> {
        &self.session
    }

    /// The view being driven.
    pub fn view(&self) -> &W {
        &self.view
    }

    /// Mutable access to the view.
    pub fn view_mut(&mut self) -> &mut W {
        &mut self.view
    }

    fn report_open(&mut self, result: Result<(), AcquireError>) -> Result<(), AcquireError> {
        if let Err(err) = &result {
            self.report(&err.to_string());
        }
        result
    }

    /// Inline banner when the layout has one, otherwise a notice.
    fn report(&mut self, message: &str) {
        if self.elements.has_error_banner() {
            self.view.show_error(message);
        } else {
            self.view.notify(message, NoticeLevel::Danger);
        }
    }
}
