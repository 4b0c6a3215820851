//! Client seams for the detection endpoint and the reports feed.

use super::types::{DetectionResponse, ReportDetail, ReportsPage};
use crate::capture::StillImage;
use thiserror::Error;

/// Errors talking to the detection server.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The server answered `success: false`.
    #[error("detection server rejected the request: {0}")]
    Rejected(String),
    /// The request never completed.
    #[error("request to detection server failed: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
    },
    /// The response body did not match the contract.
    #[error("invalid response from detection server: {0}")]
    Decode(String),
}

/// An image submitted for detection.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Photo to analyse.
    pub image: StillImage,
    /// Free-text location; never blank.
    pub location: Option<String>,
}

impl UploadRequest {
    /// Builds a request, dropping a blank location.
    pub fn new(image: StillImage, location: Option<&str>) -> Self {
        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        Self { image, location }
    }
}

impl DetectionResponse {
    /// Turns a `success: false` envelope into an error.
    pub fn into_result(self) -> Result<Self, UploadError> {
        if self.success {
            Ok(self)
        } else {
            Err(UploadError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

impl ReportDetail {
    /// Turns a `success: false` envelope into an error.
    pub fn into_result(self) -> Result<Self, UploadError> {
        if self.success {
            Ok(self)
        } else {
            Err(UploadError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

/// Submits images for detection.
#[allow(async_fn_in_trait)]
pub trait DetectionClient {
    /// Sends the photo for detection.
    async fn submit(&self, request: &UploadRequest) -> Result<DetectionResponse, UploadError>;
}

/// Reads detection reports.
#[allow(async_fn_in_trait)]
pub trait ReportsClient {
    /// Most recent reports and dashboard counters.
    async fn list_reports(&self) -> Result<ReportsPage, UploadError>;

    /// Fetches one report.
    async fn report_details(&self, report_id: &str) -> Result<ReportDetail, UploadError>;
}
