//! Encoded still images.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Errors decoding a still image from transport form.
#[derive(Debug, Error)]
pub enum StillImageError {
    /// Input is not a base64 `data:` URL.
    #[error("not a base64 data url")]
    NotDataUrl,
    /// Payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Bytes are not a decodable image.
    #[error("unrecognized image data: {0}")]
    Unrecognized(String),
}

/// A single compressed image, ready to be sent for analysis.
#[derive(Clone, PartialEq, Eq)]
pub struct StillImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    mime: String,
}

impl StillImage {
    pub(crate) fn new(bytes: Vec<u8>, width: u32, height: u32, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            width,
            height,
            mime: mime.into(),
        }
    }

    /// Wraps already-encoded image bytes, probing format and dimensions.
    pub fn from_encoded(bytes: Vec<u8>) -> Result<Self, StillImageError> {
        let reader = image::ImageReader::new(std::io::Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| StillImageError::Unrecognized(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| StillImageError::Unrecognized("unknown image format".to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| StillImageError::Unrecognized(e.to_string()))?;

        Ok(Self::new(bytes, width, height, format.to_mime_type()))
    }

    /// Decodes a `data:<mime>;base64,<payload>` url.
    pub fn from_data_url(url: &str) -> Result<Self, StillImageError> {
        let rest = url.strip_prefix("data:").ok_or(StillImageError::NotDataUrl)?;
        let (_, payload) = rest
            .split_once(";base64,")
            .ok_or(StillImageError::NotDataUrl)?;
        let bytes = STANDARD.decode(payload.trim())?;
        Self::from_encoded(bytes)
    }

    /// Encodes the image as a base64 data url.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Encoded image bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// MIME type, e.g. `image/jpeg`.
    #[inline]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Encoded size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when there are no encoded bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for StillImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StillImage")
            .field("mime", &self.mime)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
