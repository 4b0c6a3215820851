//! Session handoff between the standalone capture page and the main flow.
//!
//! The standalone page writes the captured image (and an optional location)
//! before navigating away; the main flow reads it once on startup. Reading
//! clears the entries whether or not they decode.

mod store;

pub use store::{FileStore, HandoffStore, MemoryStore, StoreError};

use crate::capture::{StillImage, StillImageError};
use thiserror::Error;

/// Key holding the image as a data url.
pub const IMAGE_KEY: &str = "capturedImageData";
/// Key holding the free-text location.
pub const LOCATION_KEY: &str = "capturedLocation";

/// Handoff errors.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The stored image could not be decoded.
    #[error("handed-off image is unreadable: {0}")]
    Image(#[from] StillImageError),
}

/// Image and location passed across a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffPayload {
    /// Captured still.
    pub image: StillImage,
    /// Trimmed location, when one was entered.
    pub location: Option<String>,
}

/// Read-once transfer over a [`HandoffStore`].
#[derive(Debug)]
pub struct Handoff<S: HandoffStore> {
    store: S,
}

impl<S: HandoffStore> Handoff<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stores an image and location, replacing anything pending.
    /// Blank locations are not stored.
    pub fn put(&mut self, image: &StillImage, location: Option<&str>) -> Result<(), HandoffError> {
        self.store.set(IMAGE_KEY, &image.to_data_url())?;
        match location.map(str::trim).filter(|l| !l.is_empty()) {
            Some(location) => self.store.set(LOCATION_KEY, location)?,
            None => self.store.remove(LOCATION_KEY)?,
        }
        tracing::info!(bytes = image.len(), "Handed off captured image");
        Ok(())
    }

    /// Takes the pending payload, clearing it from the store.
    pub fn take(&mut self) -> Result<Option<HandoffPayload>, HandoffError> {
        let Some(data_url) = self.store.get(IMAGE_KEY)? else {
            return Ok(None);
        };
        let location = self.store.get(LOCATION_KEY)?;
        self.store.remove(IMAGE_KEY)?;
        self.store.remove(LOCATION_KEY)?;

        let image = StillImage::from_data_url(&data_url)?;
        tracing::info!(bytes = image.len(), "Received handed-off image");
        Ok(Some(HandoffPayload { image, location }))
    }

    /// True when an image is waiting to be read.
    pub fn is_pending(&self) -> Result<bool, HandoffError> {
        Ok(self.store.get(IMAGE_KEY)?.is_some())
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
