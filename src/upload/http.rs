//! HTTP client for the detection server.

use super::client::{DetectionClient, ReportsClient, UploadError, UploadRequest};
use super::types::{DetectionResponse, ReportDetail, ReportsPage};
use crate::capture::UploadConfig;
use reqwest::multipart::Form;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Talks to the detection server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpClient {
    /// Builds a client for the configured server.
    pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Server root without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    url: String,
) -> Result<T, UploadError> {
    let status = response.status();
    if !status.is_success() {
        return Err(UploadError::Status {
            status: status.as_u16(),
            url,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| UploadError::Decode(e.to_string()))
}

impl DetectionClient for HttpClient {
    async fn submit(&self, request: &UploadRequest) -> Result<DetectionResponse, UploadError> {
        let mut form = Form::new().text("image_data", request.image.to_data_url());
        if let Some(location) = &request.location {
            form = form.text("location", location.clone());
        }

        let url = self.url("/upload/");
        tracing::info!(
            url = %url,
            bytes = request.image.len(),
            has_location = request.location.is_some(),
            "Submitting image for detection"
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let body: DetectionResponse = decode(response, url).await?;
        let body = body.into_result()?;

        tracing::info!(
            report_id = %body.report_id,
            criminals_found = body.total_criminals_found,
            "Detection completed"
        );
        Ok(body)
    }
}

impl ReportsClient for HttpClient {
    async fn list_reports(&self) -> Result<ReportsPage, UploadError> {
        let url = self.url("/police/");
        let response = self
            .client
            .get(&url)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let page: ReportsPage = decode(response, url).await?;
        tracing::debug!(reports = page.reports.len(), "Reports refreshed");
        Ok(page)
    }

    async fn report_details(&self, report_id: &str) -> Result<ReportDetail, UploadError> {
        let url = self.url(&format!("/report/{report_id}/"));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let detail: ReportDetail = decode(response, url).await?;
        detail.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Frame, ImageCanvas, BYTES_PER_PIXEL};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpClient {
        HttpClient::new(&UploadConfig {
            base_url: format!("{}/", server.uri()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn request(location: Option<&str>) -> UploadRequest {
        let frame = Frame::new(vec![64u8; 8 * 8 * BYTES_PER_PIXEL], 8, 8, 1);
        let mut canvas = ImageCanvas::allocate(8, 8, 1 << 20).unwrap();
        canvas.draw(&frame).unwrap();
        UploadRequest::new(canvas.encode_jpeg(80).unwrap(), location)
    }

    #[tokio::test]
    async fn test_submit_posts_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/"))
            .and(body_string_contains("name=\"image_data\""))
            .and(body_string_contains("data:image/jpeg;base64,"))
            .and(body_string_contains("name=\"location\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "report_id": "abc",
                "detection_time": "Jan 01, 2025 10:00",
                "location": "Station Rd",
                "total_criminals_found": 1,
                "detections": [
                    {"criminal_name": "Jane Roe", "confidence": 91.0, "is_criminal": true}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .submit(&request(Some(" Station Rd ")))
            .await
            .unwrap();
        assert_eq!(response.report_id, "abc");
        assert_eq!(response.detections[0].criminal_name, "Jane Roe");
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "No image data provided"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).submit(&request(None)).await.unwrap_err();
        assert!(matches!(err, UploadError::Rejected(msg) if msg == "No image data provided"));
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/police/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).list_reports().await.unwrap_err();
        assert!(matches!(err, UploadError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_list_reports_sends_xhr_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/police/"))
            .and(header("X-Requested-With", "XMLHttpRequest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reports": [{
                    "id": "r-1",
                    "detection_time": "t",
                    "location": "",
                    "status": "No Match",
                    "has_detections": false
                }],
                "stats": {"total_reports": 1, "criminals_detected": 0, "pending_review": 0, "accuracy_rate": 0.0}
            })))
            .mount(&server)
            .await;

        let page = client_for(&server).list_reports().await.unwrap();
        assert_eq!(page.reports[0].id, "r-1");
        assert_eq!(page.stats.total_reports, 1);
    }

    #[tokio::test]
    async fn test_report_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/report/r-9/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "report_id": "r-9",
                "detection_time": "t",
                "location": "Dock 4",
                "detections": [{"id": "d1", "criminal_id": "c1", "criminal_name": "X", "confidence": 55.5}],
                "status": "Criminal Detected"
            })))
            .mount(&server)
            .await;

        let detail = client_for(&server).report_details("r-9").await.unwrap();
        assert_eq!(detail.location_label(), "Dock 4");
        assert_eq!(detail.status_label(), "Criminal Detected");
        assert_eq!(detail.detections[0].id.as_deref(), Some("d1"));
    }
}
