//! Native camera backend built on `nokhwa`.
//!
//! Native cameras carry no facing metadata, so each facing mode maps to a
//! configured device index.

use super::device::{MediaDevices, MediaStream, PlatformError, StreamConstraints, VideoSink};
use super::{FacingMode, Frame};
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::{Camera, NokhwaError};
use std::cell::RefCell;
use std::rc::Rc;

/// Native media devices.
#[derive(Debug, Clone)]
pub struct NokhwaDevices {
    front_index: u32,
    back_index: u32,
    fps: u32,
    initialized: bool,
}

impl NokhwaDevices {
    /// Front camera at index 0, back camera at index 1.
    pub fn new() -> Self {
        Self {
            front_index: 0,
            back_index: 1,
            fps: 30,
            initialized: false,
        }
    }

    /// Uses the given device indices for the front and back cameras.
    pub fn with_indices(front_index: u32, back_index: u32) -> Self {
        Self {
            front_index,
            back_index,
            ..Self::new()
        }
    }

    /// Asks the OS for camera access once; later calls only re-check it.
    fn ensure_permission(&mut self) -> Result<(), PlatformError> {
        if !self.initialized {
            nokhwa::nokhwa_initialize(|granted| {
                tracing::debug!(granted, "Camera permission request answered");
            });
            self.initialized = true;
        }
        if nokhwa::nokhwa_check() {
            Ok(())
        } else {
            Err(PlatformError::new(
                "NotAllowedError",
                "camera access has not been granted",
            ))
        }
    }

    fn index_for(&self, facing: FacingMode) -> u32 {
        match facing {
            FacingMode::Front => self.front_index,
            FacingMode::Back => self.back_index,
        }
    }
}

impl Default for NokhwaDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaDevices for NokhwaDevices {
    type Stream = NokhwaStream;

    async fn get_user_media(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<NokhwaStream, PlatformError> {
        self.ensure_permission()?;
        let index = self.index_for(constraints.facing_mode);

        let devices = nokhwa::query(ApiBackend::Auto).map_err(|e| platform_error(&e))?;
        if index as usize >= devices.len() {
            return Err(PlatformError::new(
                "NotFoundError",
                format!("no camera at index {index} ({} found)", devices.len()),
            ));
        }

        let format = CameraFormat::new(
            Resolution::new(constraints.ideal_width, constraints.ideal_height),
            FrameFormat::MJPEG,
            self.fps,
        );
        let requested =
            RequestedFormat::new::<RgbAFormat>(RequestedFormatType::Closest(format));

        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| platform_error(&e))?;
        camera.open_stream().map_err(|e| platform_error(&e))?;

        tracing::info!(index, resolution = %camera.resolution(), "Native camera stream opened");

        Ok(NokhwaStream {
            id: format!("nokhwa-{index}"),
            camera: Rc::new(RefCell::new(camera)),
            active: true,
        })
    }
}

/// Maps a backend error onto the platform error names acquisition failures
/// are classified by.
fn platform_error(err: &NokhwaError) -> PlatformError {
    let name = match err {
        NokhwaError::UninitializedError | NokhwaError::InitializeError { .. } => {
            "NotAllowedError"
        }
        // Format negotiation could not satisfy the requested constraints
        NokhwaError::GetPropertyError { .. } | NokhwaError::StructureError { .. } => {
            "OverconstrainedError"
        }
        NokhwaError::OpenDeviceError { .. } | NokhwaError::OpenStreamError { .. } => {
            "NotReadableError"
        }
        _ => "NokhwaError",
    };
    PlatformError::new(name, err.to_string())
}

/// A native camera stream with one video track.
pub struct NokhwaStream {
    id: String,
    camera: Rc<RefCell<Camera>>,
    active: bool,
}

impl MediaStream for NokhwaStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn track_count(&self) -> usize {
        1
    }

    fn stop_all_tracks(&mut self) {
        if self.active {
            if let Err(e) = self.camera.borrow_mut().stop_stream() {
                tracing::warn!(stream = %self.id, error = %e, "Camera refused to stop");
            }
            self.active = false;
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Sink decoding frames from a native camera.
#[derive(Default)]
pub struct NokhwaSink {
    camera: Option<Rc<RefCell<Camera>>>,
    playing: bool,
    sequence: u64,
}

impl NokhwaSink {
    /// Creates a sink with nothing attached.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VideoSink for NokhwaSink {
    type Stream = NokhwaStream;

    fn attach(&mut self, stream: &NokhwaStream) {
        self.camera = Some(Rc::clone(&stream.camera));
        self.playing = false;
    }

    async fn play(&mut self) -> Result<(), PlatformError> {
        let camera = self
            .camera
            .as_ref()
            .ok_or_else(|| PlatformError::new("InvalidStateError", "no source bound"))?;
        if !camera.borrow().is_stream_open() {
            return Err(PlatformError::new("AbortError", "stream closed before playback"));
        }
        self.playing = true;
        Ok(())
    }

    fn detach(&mut self) {
        self.camera = None;
        self.playing = false;
    }

    fn dimensions(&self) -> (u32, u32) {
        match &self.camera {
            Some(camera) if self.playing => {
                let resolution = camera.borrow().resolution();
                (resolution.width(), resolution.height())
            }
            _ => (0, 0),
        }
    }

    fn is_paused(&self) -> bool {
        !self.playing
    }

    fn is_ended(&self) -> bool {
        match &self.camera {
            Some(camera) => !camera.borrow().is_stream_open(),
            None => false,
        }
    }

    fn current_frame(&mut self) -> Option<Frame> {
        let camera = self.camera.as_ref()?;
        let buffer = match camera.borrow_mut().frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read camera frame");
                return None;
            }
        };
        let decoded = match buffer.decode_image::<RgbAFormat>() {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to decode camera frame");
                return None;
            }
        };

        self.sequence += 1;
        let (width, height) = decoded.dimensions();
        Some(Frame::new(decoded.into_raw(), width, height, self.sequence))
    }
}
