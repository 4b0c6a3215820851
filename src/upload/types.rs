//! Wire types of the detection endpoint and the reports feed.
//!
//! Field names are a fixed contract with the server and must not change.

use serde::{Deserialize, Deserializer, Serialize};

fn clamp_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_true() -> bool {
    true
}

/// One face analysed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detection record id, present on report details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Matched person id, when there is a match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criminal_id: Option<String>,
    /// True when the face matched a known person.
    #[serde(default)]
    pub is_criminal: bool,
    /// Matched person name; empty when unknown.
    #[serde(default, deserialize_with = "null_as_default")]
    pub criminal_name: String,
    /// Match confidence, 0-100.
    #[serde(default, deserialize_with = "clamp_confidence")]
    pub confidence: f64,
}

/// Response of `POST /upload/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    /// False when the server rejected the request.
    #[serde(default = "default_true")]
    pub success: bool,
    /// Rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Free-text status from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Stored report id.
    #[serde(default)]
    pub report_id: String,
    /// Server-formatted detection time.
    #[serde(default)]
    pub detection_time: String,
    /// Location stored with the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Faces found in the photo, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_faces_detected: Option<u32>,
    /// Faces that matched a known person.
    #[serde(default)]
    pub total_criminals_found: u32,
    /// Per-face results.
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// A matched person as shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPerson {
    /// Person name.
    pub name: String,
    /// Match confidence, 0 to 100.
    pub confidence: f64,
}

/// What the dashboard shows for a detection response.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionSummary {
    /// At least one match; only criminal detections are listed.
    Match {
        /// Server-assigned report id.
        report_id: String,
        /// Matched criminal records.
        matches: Vec<MatchedPerson>,
    },
    /// Nobody matched.
    NoMatch,
}

impl DetectionResponse {
    /// Detailed results are only shown when the server reports matches.
    pub fn summary(&self) -> DetectionSummary {
        if self.total_criminals_found == 0 || self.detections.is_empty() {
            return DetectionSummary::NoMatch;
        }
        let matches = self
            .detections
            .iter()
            .filter(|d| d.is_criminal)
            .map(|d| MatchedPerson {
                name: d.criminal_name.clone(),
                confidence: d.confidence,
            })
            .collect();
        DetectionSummary::Match {
            report_id: self.report_id.clone(),
            matches,
        }
    }
}

impl std::fmt::Display for DetectionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionSummary::Match { report_id, matches } => {
                writeln!(f, "Criminal Detected!")?;
                for person in matches {
                    writeln!(f, "  {} (confidence {}%)", person.name, person.confidence)?;
                }
                write!(f, "Report ID: {report_id}")
            }
            DetectionSummary::NoMatch => write!(f, "No Match Found"),
        }
    }
}

/// One row of the reviewer dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Report id.
    pub id: String,
    /// Server-formatted detection time.
    pub detection_time: String,
    /// Location; empty when none was given.
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    /// Server status text.
    pub status: String,
    /// True when any face matched.
    #[serde(default)]
    pub has_detections: bool,
    /// First matching detection, for linking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_detection_id: Option<String>,
}

impl ReportRow {
    /// Truncated id as shown in the reports table.
    pub fn short_id(&self) -> String {
        let prefix: String = self.id.chars().take(12).collect();
        format!("{prefix}...")
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportStats {
    /// Reports stored.
    pub total_reports: u64,
    /// Reports with at least one match.
    pub criminals_detected: u64,
    /// Reports awaiting review.
    pub pending_review: u64,
    /// Accuracy of verified detections, in percent.
    pub accuracy_rate: f64,
}

/// Response of `GET /police/` as an XHR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportsPage {
    /// Most recent reports first.
    #[serde(default)]
    pub reports: Vec<ReportRow>,
    /// Dashboard counters.
    #[serde(default)]
    pub stats: ReportStats,
}

/// Response of `GET /report/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDetail {
    /// False when the report was not found.
    #[serde(default = "default_true")]
    pub success: bool,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Report id.
    #[serde(default)]
    pub report_id: String,
    /// Server-formatted detection time.
    #[serde(default)]
    pub detection_time: String,
    /// Location, if one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Per-face results.
    #[serde(default)]
    pub detections: Vec<Detection>,
    /// Server status text.
    #[serde(default)]
    pub status: String,
}

impl ReportDetail {
    /// Location as displayed, with a placeholder when missing or blank.
    pub fn location_label(&self) -> &str {
        match self.location.as_deref() {
            Some(location) if !location.trim().is_empty() => location,
            _ => "Not specified",
        }
    }

    /// Match status as shown on the dashboard.
    pub fn status_label(&self) -> &'static str {
        if self.detections.is_empty() {
            "No Match"
        } else {
            "Criminal Detected"
        }
    }
}
