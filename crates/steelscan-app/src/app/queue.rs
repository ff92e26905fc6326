//! Ingestion queue and the single in-flight slot

use std::collections::VecDeque;

use steelscan_types::ImagePayload;
use tracing::debug;

/// Pending images plus the one image currently being analyzed or reviewed.
///
/// The current image is never also in the pending queue, and images only
/// leave through [`advance`](Self::advance), [`remove`](Self::remove) or an
/// explicit clear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueManager {
    current: Option<ImagePayload>,
    pending: VecDeque<ImagePayload>,
}

impl QueueManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ImagePayload> {
        self.current.as_ref()
    }

    pub fn pending(&self) -> impl Iterator<Item = &ImagePayload> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Nothing current and nothing waiting
    pub fn is_drained(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }

    /// Append `images` in order. When nothing is current and `idle` is set,
    /// the head is promoted right away; returns whether that happened.
    pub fn enqueue(&mut self, images: Vec<ImagePayload>, idle: bool) -> bool {
        let count = images.len();
        self.pending.extend(images);
        debug!(added = count, pending = self.pending.len(), "images queued");

        if self.current.is_none() && idle {
            self.advance().is_some()
        } else {
            false
        }
    }

    /// Promote the head of the queue; `None` empties the current slot
    pub fn advance(&mut self) -> Option<ImagePayload> {
        self.current = self.pending.pop_front();
        self.current.clone()
    }

    /// Drop a pending (not yet started) image
    pub fn remove(&mut self, index: usize) -> Option<ImagePayload> {
        self.pending.remove(index)
    }

    /// Put an image in the current slot without touching the queue
    pub fn set_current(&mut self, image: ImagePayload) {
        self.current = Some(image);
    }

    pub fn clear_current(&mut self) {
        self.current = None;
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.pending.clear();
    }
}
