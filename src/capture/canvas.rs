//! Off-screen raster surface for still capture.

use super::error::CaptureError;
use super::frame::Frame;
use super::still::StillImage;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

/// An RGBA raster surface sized to one frame.
pub struct ImageCanvas {
    buffer: RgbaImage,
}

impl ImageCanvas {
    /// Allocates a surface, refusing empty or oversized requests.
    pub fn allocate(width: u32, height: u32, max_pixels: u64) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::EncodeFailure(
                "cannot create a zero-sized surface".to_string(),
            ));
        }
        let pixels = u64::from(width) * u64::from(height);
        if pixels > max_pixels {
            return Err(CaptureError::EncodeFailure(format!(
                "{width}x{height} surface exceeds the {max_pixels} pixel limit"
            )));
        }
        Ok(Self {
            buffer: RgbaImage::new(width, height),
        })
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Draws a frame covering the whole surface.
    pub fn draw(&mut self, frame: &Frame) -> Result<(), CaptureError> {
        if frame.width() != self.width() || frame.height() != self.height() {
            return Err(CaptureError::EncodeFailure(format!(
                "frame {}x{} does not match surface {}x{}",
                frame.width(),
                frame.height(),
                self.width(),
                self.height()
            )));
        }
        if !frame.is_valid() {
            return Err(CaptureError::EncodeFailure(
                "frame buffer does not match its dimensions".to_string(),
            ));
        }
        self.buffer.copy_from_slice(frame.pixels());
        Ok(())
    }

    /// Encodes the surface as JPEG. Alpha is dropped.
    pub fn encode_jpeg(&self, quality: u8) -> Result<StillImage, CaptureError> {
        let rgb = DynamicImage::ImageRgba8(self.buffer.clone()).to_rgb8();
        let mut bytes = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
            encoder
                .encode_image(&rgb)
                .map_err(|e| CaptureError::EncodeFailure(e.to_string()))?;
        }

        tracing::debug!(
            width = self.width(),
            height = self.height(),
            bytes = bytes.len(),
            quality,
            "Encoded still image"
        );

        Ok(StillImage::new(bytes, self.width(), self.height(), "image/jpeg"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::BYTES_PER_PIXEL;

    #[test]
    fn test_encode_produces_jpeg() {
        let frame = Frame::new(vec![200u8; 32 * 24 * BYTES_PER_PIXEL], 32, 24, 1);
        let mut canvas = ImageCanvas::allocate(32, 24, 1 << 20).unwrap();
        canvas.draw(&frame).unwrap();

        let still = canvas.encode_jpeg(80).unwrap();
        assert!(!still.is_empty());
        assert_eq!(still.mime(), "image/jpeg");
        assert_eq!((still.width(), still.height()), (32, 24));
        // JPEG SOI marker
        assert_eq!(&still.bytes()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_oversized_surface_refused() {
        assert!(matches!(
            ImageCanvas::allocate(4000, 4000, 1000),
            Err(CaptureError::EncodeFailure(_))
        ));
        assert!(ImageCanvas::allocate(0, 10, 1000).is_err());
    }

    #[test]
    fn test_mismatched_frame_refused() {
        let frame = Frame::new(vec![0u8; 8 * 8 * BYTES_PER_PIXEL], 8, 8, 1);
        let mut canvas = ImageCanvas::allocate(16, 8, 1 << 20).unwrap();
        assert!(canvas.draw(&frame).is_err());

        let short = Frame::new(vec![0u8; 10], 16, 8, 2);
        assert!(canvas.draw(&short).is_err());
    }
}
