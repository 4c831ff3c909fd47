use crate::config::LayoutConfig;
use crate::error::Result;
use crate::intake::{DecodedImage, Upload, decode_upload};
use crate::model::{ImageId, SpriteImage, SpriteSheet};
use crate::pipeline::compose;
use tracing::{debug, error, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Proof of which session generation a decode was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeTicket {
    generation: u64,
}

/// A file that was refused during intake.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub file_name: String,
    pub reason: String,
}

/// Outcome of a batch intake.
#[derive(Debug, Clone, Default)]
pub struct IntakeReport {
    pub accepted: Vec<ImageId>,
    pub rejected: Vec<Rejection>,
}

/// Ordered collection of uploaded images owned by the caller.
///
/// Decodes may run outside the session (on another thread or task): take an
/// [`IntakeTicket`] first and hand the result to [`SpriteSession::commit`].
/// A [`SpriteSession::clear`] in between invalidates the ticket, so stale
/// decodes are dropped instead of reappearing in the cleared collection.
#[derive(Debug, Default)]
pub struct SpriteSession {
    images: Vec<SpriteImage>,
    next_id: u64,
    generation: u64,
}

impl SpriteSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_intake(&self) -> IntakeTicket {
        IntakeTicket {
            generation: self.generation,
        }
    }

    /// Current generation; advances on every `clear`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Appends `decoded` if `ticket` is still current; otherwise discards it.
    pub fn commit(&mut self, ticket: IntakeTicket, decoded: DecodedImage) -> Option<ImageId> {
        if ticket.generation != self.generation {
            debug!(
                file = %decoded.original_name,
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale decode"
            );
            return None;
        }
        Some(self.push(decoded))
    }

    /// Decodes and appends a single upload.
    pub fn add(&mut self, upload: Upload) -> Result<ImageId> {
        let decoded = decode_upload(upload)?;
        Ok(self.push(decoded))
    }

    /// Decodes a batch and appends accepted images in submission order.
    /// Unsupported files are reported and skipped; they never abort the batch.
    pub fn ingest(&mut self, uploads: Vec<Upload>) -> IntakeReport {
        let ticket = self.begin_intake();
        let mut report = IntakeReport::default();

        #[cfg(feature = "parallel")]
        let decoded: Vec<(String, Result<DecodedImage>)> = uploads
            .into_par_iter()
            .map(|u| (u.file_name.clone(), decode_upload(u)))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let decoded: Vec<(String, Result<DecodedImage>)> = uploads
            .into_iter()
            .map(|u| (u.file_name.clone(), decode_upload(u)))
            .collect();

        for (file_name, result) in decoded {
            match result {
                Ok(img) => {
                    if let Some(id) = self.commit(ticket, img) {
                        report.accepted.push(id);
                    }
                }
                Err(e) => {
                    error!(file = %file_name, error = %e, "rejecting upload");
                    report.rejected.push(Rejection {
                        file_name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "intake finished"
        );
        report
    }

    pub fn remove(&mut self, id: ImageId) -> bool {
        let before = self.images.len();
        self.images.retain(|img| img.id != id);
        self.images.len() != before
    }

    /// Drops every image and invalidates outstanding intake tickets.
    pub fn clear(&mut self) {
        self.images.clear();
        self.generation += 1;
    }

    pub fn images(&self) -> &[SpriteImage] {
        &self.images
    }

    pub fn get(&self, id: ImageId) -> Option<&SpriteImage> {
        self.images.iter().find(|img| img.id == id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Composes the current collection; see [`crate::pipeline::compose`].
    pub fn compose(&self, cfg: &LayoutConfig) -> Result<SpriteSheet> {
        compose(&self.images, cfg)
    }

    fn push(&mut self, decoded: DecodedImage) -> ImageId {
        let id = ImageId(self.next_id);
        self.next_id += 1;
        self.images.push(decoded.into_image(id));
        id
    }
}
