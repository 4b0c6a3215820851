//! Detection endpoint and reports feed.
//!
//! The server side (face matching, report storage) is opaque here; this
//! module only speaks its request/response contract. [`HttpClient`]
//! implements both client traits over `reqwest` when the `http` feature is
//! enabled.

mod client;
#[cfg(feature = "http")]
mod http;
mod poller;
mod types;

pub use client::{DetectionClient, ReportsClient, UploadError, UploadRequest};
#[cfg(feature = "http")]
pub use http::HttpClient;
pub use poller::{AutoRefresh, MIN_PERIOD};
pub use types::{
    Detection, DetectionResponse, DetectionSummary, MatchedPerson, ReportDetail, ReportRow,
    ReportStats, ReportsPage,
};
