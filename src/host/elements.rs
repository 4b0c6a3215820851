//! Startup validation of the UI elements a host needs.

use super::CaptureHost;
use thiserror::Error;

/// UI configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UiError {
    /// A required element is absent.
    #[error("required element `{id}` is missing from the {host} layout")]
    MissingElement {
        /// Host whose layout was checked.
        host: CaptureHost,
        /// Id of the missing element.
        id: &'static str,
    },
}

/// Element ids every standalone page must provide.
pub const STANDALONE_REQUIRED: &[&str] = &[
    "cameraVideo",
    "cameraCanvas",
    "cameraContainer",
    "previewContainer",
    "previewImg",
    "captureBtn",
    "switchCameraBtn",
    "closeBtn",
    "retakeBtn",
    "usePhotoBtn",
];

/// Element ids every modal dashboard must provide.
pub const MODAL_REQUIRED: &[&str] = &[
    "cameraVideo",
    "cameraCanvas",
    "cameraModal",
    "cameraButton",
    "captureBtn",
    "switchCameraBtn",
    "previewImg",
    "imagePreview",
    "submitBtn",
];

const ERROR_BANNER: &str = "cameraErrorMessage";

/// Validated element layout for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiElements {
    host: CaptureHost,
    error_banner: bool,
    location_input: bool,
}

impl UiElements {
    /// Checks every required element with `lookup`, failing on the first
    /// missing one. Optional elements are recorded as present or absent.
    pub fn resolve(host: CaptureHost, lookup: impl Fn(&str) -> bool) -> Result<Self, UiError> {
        if let Some(id) = host.required_elements().iter().find(|id| !lookup(id)) {
            return Err(UiError::MissingElement { host, id });
        }

        let elements = Self {
            host,
            error_banner: lookup(ERROR_BANNER),
            location_input: lookup(host.location_element()),
        };
        tracing::debug!(
            host = %host,
            error_banner = elements.error_banner,
            location_input = elements.location_input,
            "UI elements resolved"
        );
        Ok(elements)
    }

    /// A layout with every optional element present.
    pub fn complete(host: CaptureHost) -> Self {
        Self {
            host,
            error_banner: true,
            location_input: true,
        }
    }

    /// Host the layout belongs to.
    pub fn host(&self) -> CaptureHost {
        self.host
    }

    /// True when the inline camera error banner exists.
    pub fn has_error_banner(&self) -> bool {
        self.error_banner
    }

    /// True when the location input exists.
    pub fn has_location_input(&self) -> bool {
        self.location_input
    }
}
