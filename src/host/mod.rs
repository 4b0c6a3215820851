//! UI adapters driving a capture session.
//!
//! Two hosts share one [`CaptureController`]: a standalone capture page that
//! hands its photo to the main flow and navigates back, and a modal dialog on
//! the dashboard that keeps the photo for submission. [`IntakeFlow`] is the
//! dashboard's choice between uploading a file and using the camera.

mod controller;
mod elements;
mod intake;
mod view;

pub use controller::CaptureController;
pub use elements::{UiElements, UiError, MODAL_REQUIRED, STANDALONE_REQUIRED};
pub use intake::{IntakeError, IntakeFlow, PhotoSource, UploadedFile, MAX_UPLOAD_BYTES};
pub use view::{ConsoleView, NoticeLevel, RecordingView, View, ViewEvent};

use std::fmt;

/// Where the capture UI lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureHost {
    /// Full page; the photo is handed off and the page navigates to `/`.
    StandalonePage,
    /// Dialog over the dashboard; the photo stays for submission.
    ModalDialog,
}

impl CaptureHost {
    /// Element ids this host cannot work without.
    pub fn required_elements(self) -> &'static [&'static str] {
        match self {
            CaptureHost::StandalonePage => STANDALONE_REQUIRED,
            CaptureHost::ModalDialog => MODAL_REQUIRED,
        }
    }

    /// Id of the optional free-text location input.
    pub fn location_element(self) -> &'static str {
        match self {
            CaptureHost::StandalonePage => "cameraLocation",
            CaptureHost::ModalDialog => "location",
        }
    }
}

impl fmt::Display for CaptureHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureHost::StandalonePage => write!(f, "standalone page"),
            CaptureHost::ModalDialog => write!(f, "modal dialog"),
        }
    }
}
