//! Dashboard intake: upload a file or use the camera, then submit.

use super::controller::{CaptureController, CAPTURED};
use super::view::{NoticeLevel, View};
use crate::capture::{
    AcquireError, CaptureError, MediaDevices, StillImage, StillImageError, VideoSink,
};
use crate::handoff::{Handoff, HandoffError, HandoffStore};
use crate::upload::{DetectionClient, DetectionResponse, UploadError, UploadRequest};
use thiserror::Error;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const NOT_AN_IMAGE: &str = "Please select an image file (JPEG, PNG, etc.)";
const TOO_LARGE: &str = "File size exceeds 16MB limit. Please choose a smaller file.";
const UNREADABLE: &str = "Could not read the selected image. Please choose another file.";
const UPLOADED: &str = "Photo uploaded successfully!";
const DISCARDED: &str = "Photo discarded. You can upload or capture a new photo.";
const NO_IMAGE: &str = "Please select an image first";
const DETECTED: &str = "Detection completed successfully!";
const SUBMIT_FAILED: &str = "Failed to process the image. Please try again.";

/// How the current photo was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSource {
    /// Picked from disk.
    Upload,
    /// Captured or handed off by the camera page.
    Camera,
}

/// A file picked from disk.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name as picked.
    pub name: String,
    /// MIME type reported for the file.
    pub mime: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Intake errors. Each has already been shown to the user.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// File MIME type is not `image/*`.
    #[error("`{0}` is not an image type")]
    NotAnImage(String),
    /// File exceeds the upload limit.
    #[error("file is {0} bytes, limit is {MAX_UPLOAD_BYTES}")]
    TooLarge(usize),
    /// File contents are not a decodable image.
    #[error("unreadable image: {0}")]
    Unreadable(#[from] StillImageError),
    /// Submit without a photo.
    #[error("no image selected")]
    NoImage,
    /// Reading the handoff failed.
    #[error(transparent)]
    Handoff(#[from] HandoffError),
    /// The detection request failed.
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// The photo waiting for submission and where it came from.
#[derive(Debug, Default)]
pub struct IntakeFlow {
    source: Option<PhotoSource>,
    image: Option<StillImage>,
}

impl IntakeFlow {
    /// Creates an empty intake.
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the current photo came from.
    pub fn source(&self) -> Option<PhotoSource> {
        self.source
    }

    /// Photo waiting for submission.
    pub fn image(&self) -> Option<&StillImage> {
        self.image.as_ref()
    }

    /// Consumes a photo handed off by the standalone page.
    ///
    /// Returns the handed-off location, if any, so it can prefill the form.
    pub fn restore<S: HandoffStore>(
        &mut self,
        handoff: &mut Handoff<S>,
        view: &mut impl View,
    ) -> Result<Option<String>, IntakeError> {
        let Some(payload) = handoff.take()? else {
            return Ok(None);
        };
        view.show_preview(&payload.image);
        view.set_submit_enabled(true);
        view.notify(CAPTURED, NoticeLevel::Success);
        self.source = Some(PhotoSource::Camera);
        self.image = Some(payload.image);
        Ok(payload.location)
    }

    /// Validates and keeps an uploaded file. Uploads get no preview.
    pub fn accept_upload(
        &mut self,
        file: UploadedFile,
        view: &mut impl View,
    ) -> Result<(), IntakeError> {
        if !file.mime.starts_with("image/") {
            view.notify(NOT_AN_IMAGE, NoticeLevel::Danger);
            return Err(IntakeError::NotAnImage(file.mime));
        }
        if file.bytes.len() > MAX_UPLOAD_BYTES {
            view.notify(TOO_LARGE, NoticeLevel::Danger);
            return Err(IntakeError::TooLarge(file.bytes.len()));
        }
        let image = match StillImage::from_encoded(file.bytes) {
            Ok(image) => image,
            Err(err) => {
                view.notify(UNREADABLE, NoticeLevel::Danger);
                return Err(err.into());
            }
        };

        tracing::info!(
            file = %file.name,
            bytes = image.len(),
            mime = image.mime(),
            "Accepted uploaded photo"
        );
        view.clear_preview();
        view.set_submit_enabled(true);
        view.notify(UPLOADED, NoticeLevel::Success);
        self.source = Some(PhotoSource::Upload);
        self.image = Some(image);
        Ok(())
    }

    /// Opens the camera in the modal host.
    pub async fn choose_camera<D, V, W>(
        &mut self,
        controller: &mut CaptureController<D, V, W>,
    ) -> Result<(), AcquireError>
    where
        D: MediaDevices,
        V: VideoSink<Stream = D::Stream>,
        W: View,
    {
        controller.on_open().await
    }

    /// Captures in the modal host and keeps the still for submission.
    pub fn capture<D, V, W>(
        &mut self,
        controller: &mut CaptureController<D, V, W>,
    ) -> Result<(), CaptureError>
    where
        D: MediaDevices,
        V: VideoSink<Stream = D::Stream>,
        W: View,
    {
        controller.on_capture()?;
        if let Some(still) = controller.take_still() {
            self.source = Some(PhotoSource::Camera);
            self.image = Some(still);
        }
        Ok(())
    }

    /// Drops the current photo.
    pub fn retake(&mut self, view: &mut impl View) {
        self.reset(view);
        view.notify(DISCARDED, NoticeLevel::Info);
    }

    /// Posts the photo with `location` and renders the outcome.
    ///
    /// The intake is reset on success; on failure the photo is kept so the
    /// user can try again.
    pub async fn submit<C: DetectionClient>(
        &mut self,
        location: Option<&str>,
        client: &C,
        view: &mut impl View,
    ) -> Result<DetectionResponse, IntakeError> {
        let Some(image) = self.image.clone() else {
            view.notify(NO_IMAGE, NoticeLevel::Danger);
            return Err(IntakeError::NoImage);
        };

        view.set_busy(true);
        view.set_submit_enabled(false);
        let request = UploadRequest::new(image, location);
        let result = client.submit(&request).await;
        view.set_busy(false);

        match result {
            Ok(response) => {
                view.show_results(&response.summary());
                self.reset(view);
                view.notify(DETECTED, NoticeLevel::Success);
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Detection request failed");
                view.show_failure(SUBMIT_FAILED);
                view.set_submit_enabled(true);
                view.notify(SUBMIT_FAILED, NoticeLevel::Danger);
                Err(err.into())
            }
        }
    }

    fn reset(&mut self, view: &mut impl View) {
        self.source = None;
        self.image = None;
        view.clear_preview();
        view.set_submit_enabled(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{
        CaptureConfig, CaptureSession, Frame, ImageCanvas, MockDevices, MockSink, BYTES_PER_PIXEL,
    };
    use crate::handoff::MemoryStore;
    use crate::host::{CaptureHost, RecordingView, UiElements, ViewEvent};
    use crate::upload::{DetectionSummary, MatchedPerson};
    use std::cell::RefCell;

    fn jpeg() -> StillImage {
        let frame = Frame::new(vec![200u8; 16 * 12 * BYTES_PER_PIXEL], 16, 12, 0);
        let mut canvas = ImageCanvas::allocate(16, 12, 1 << 20).unwrap();
        canvas.draw(&frame).unwrap();
        canvas.encode_jpeg(80).unwrap()
    }

    fn upload(mime: &str, bytes: Vec<u8>) -> UploadedFile {
        UploadedFile {
            name: "suspect.jpg".into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Answers with a canned response and records what it was sent.
    struct FakeDetector {
        response: Option<DetectionResponse>,
        seen: RefCell<Vec<Option<String>>>,
    }

    impl FakeDetector {
        fn answering(response: DetectionResponse) -> Self {
            Self {
                response: Some(response),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                response: None,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl DetectionClient for FakeDetector {
        async fn submit(&self, request: &UploadRequest) -> Result<DetectionResponse, UploadError> {
            self.seen.borrow_mut().push(request.location.clone());
            self.response
                .clone()
                .ok_or_else(|| UploadError::Transport("connection refused".into()))
        }
    }

    fn matched() -> DetectionResponse {
        serde_json::from_value(serde_json::json!({
            "success": true,
            "report_id": "rep-1",
            "detection_time": "now",
            "total_criminals_found": 1,
            "detections": [{"criminal_name": "Jane Roe", "confidence": 88.0, "is_criminal": true}]
        }))
        .unwrap()
    }

    #[test]
    fn test_upload_rejects_non_image() {
        let mut intake = IntakeFlow::new();
        let mut view = RecordingView::new();
        let err = intake
            .accept_upload(upload("application/pdf", vec![1, 2, 3]), &mut view)
            .unwrap_err();
        assert!(matches!(err, IntakeError::NotAnImage(_)));
        assert_eq!(view.notices(NoticeLevel::Danger), vec![NOT_AN_IMAGE]);
        assert!(intake.image().is_none());
    }

    #[test]
    fn test_upload_rejects_oversized() {
        let mut intake = IntakeFlow::new();
        let mut view = RecordingView::new();
        let err = intake
            .accept_upload(upload("image/png", vec![0; MAX_UPLOAD_BYTES + 1]), &mut view)
            .unwrap_err();
        assert!(matches!(err, IntakeError::TooLarge(n) if n == MAX_UPLOAD_BYTES + 1));
        assert_eq!(view.notices(NoticeLevel::Danger), vec![TOO_LARGE]);
    }

    #[test]
    fn test_upload_has_no_preview() {
        let mut intake = IntakeFlow::new();
        let mut view = RecordingView::new();
        intake
            .accept_upload(upload("image/jpeg", jpeg().bytes().to_vec()), &mut view)
            .unwrap();

        assert_eq!(intake.source(), Some(PhotoSource::Upload));
        assert!(view.contains(&ViewEvent::PreviewCleared));
        assert!(!view
            .events
            .iter()
            .any(|e| matches!(e, ViewEvent::Preview { .. })));
        assert!(view.contains(&ViewEvent::SubmitEnabled(true)));
    }

    #[test]
    fn test_restore_behaves_like_capture() {
        let mut handoff = Handoff::new(MemoryStore::new());
        handoff.put(&jpeg(), Some("Dock 4")).unwrap();

        let mut intake = IntakeFlow::new();
        let mut view = RecordingView::new();
        let location = intake.restore(&mut handoff, &mut view).unwrap();

        assert_eq!(location.as_deref(), Some("Dock 4"));
        assert_eq!(intake.source(), Some(PhotoSource::Camera));
        assert!(view.contains(&ViewEvent::Preview {
            width: 16,
            height: 12
        }));
        assert_eq!(view.notices(NoticeLevel::Success), vec![CAPTURED]);
        assert!(!handoff.is_pending().unwrap());

        // Read once.
        let mut again = IntakeFlow::new();
        assert!(again.restore(&mut handoff, &mut view).unwrap().is_none());
        assert!(again.image().is_none());
    }

    #[tokio::test]
    async fn test_submit_without_image() {
        let mut intake = IntakeFlow::new();
        let mut view = RecordingView::new();
        let client = FakeDetector::answering(matched());

        let err = intake.submit(None, &client, &mut view).await.unwrap_err();
        assert!(matches!(err, IntakeError::NoImage));
        assert_eq!(view.notices(NoticeLevel::Danger), vec![NO_IMAGE]);
        assert!(client.seen.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_submit_renders_and_resets() {
        let mut intake = IntakeFlow::new();
        let mut view = RecordingView::new();
        intake
            .accept_upload(upload("image/jpeg", jpeg().bytes().to_vec()), &mut view)
            .unwrap();
        let client = FakeDetector::answering(matched());

        let response = intake
            .submit(Some("  Platform 2 "), &client, &mut view)
            .await
            .unwrap();
        assert_eq!(response.report_id, "rep-1");
        assert_eq!(client.seen.borrow()[0].as_deref(), Some("Platform 2"));
        assert!(view.contains(&ViewEvent::Results(DetectionSummary::Match {
            report_id: "rep-1".into(),
            matches: vec![MatchedPerson {
                name: "Jane Roe".into(),
                confidence: 88.0
            }],
        })));
        assert!(intake.image().is_none());
        assert_eq!(view.events.last(), Some(&ViewEvent::Notice(DETECTED.into(), NoticeLevel::Success)));
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_photo() {
        let mut intake = IntakeFlow::new();
        let mut view = RecordingView::new();
        intake
            .accept_upload(upload("image/jpeg", jpeg().bytes().to_vec()), &mut view)
            .unwrap();

        let err = intake
            .submit(Some("   "), &FakeDetector::failing(), &mut view)
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Upload(UploadError::Transport(_))));
        assert!(intake.image().is_some());
        assert!(view.contains(&ViewEvent::Failure(SUBMIT_FAILED.into())));
        assert_eq!(view.events.iter().rev().nth(1), Some(&ViewEvent::SubmitEnabled(true)));
    }

    #[tokio::test]
    async fn test_camera_choice_then_retake() {
        let session =
            CaptureSession::new(MockDevices::new(), MockSink::new(), CaptureConfig::default());
        let mut controller = CaptureController::new(
            session,
            UiElements::complete(CaptureHost::ModalDialog),
            RecordingView::new(),
        );
        let mut intake = IntakeFlow::new();

        intake.choose_camera(&mut controller).await.unwrap();
        intake.capture(&mut controller).unwrap();
        assert_eq!(intake.source(), Some(PhotoSource::Camera));
        assert!(intake.image().is_some());
        assert!(!controller.session().is_streaming());

        intake.retake(controller.view_mut());
        assert!(intake.image().is_none());
        assert_eq!(
            controller.view().notices(NoticeLevel::Info),
            vec![DISCARDED]
        );
    }
}
