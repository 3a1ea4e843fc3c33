//! Background color-key analysis for a live frame stream.
//!
//! A [`FrameWorker`] owns one task that keys frames off the caller's thread.
//! Submission goes through a single-slot `watch` channel: a frame submitted
//! while the worker is busy replaces any frame still waiting, so only the
//! latest frame is ever analyzed. Results are published the same way.

use std::sync::Arc;

use image::RgbaImage;
use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::transparency::{apply_transparency, KeyColor};

/// Supplies the key color for each frame. Called once per analyzed frame.
pub type KeySource = Arc<dyn Fn() -> KeyColor + Send + Sync>;

#[derive(Clone)]
struct PendingFrame {
    sequence: u64,
    image: Arc<RgbaImage>,
}

/// A keyed frame ready for display.
#[derive(Debug, Clone)]
pub struct KeyedFrame {
    /// Submission number of the source frame, starting at 1.
    pub sequence: u64,
    /// The keyed image.
    pub image: Arc<RgbaImage>,
}

/// Single-worker, latest-frame-only color-key analyzer.
pub struct FrameWorker {
    frames: watch::Sender<Option<PendingFrame>>,
    results: watch::Receiver<Option<KeyedFrame>>,
    next_sequence: u64,
    handle: JoinHandle<()>,
}

impl FrameWorker {
    /// Start the worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(key_source: KeySource) -> Self {
        let (frames, frame_rx) = watch::channel(None);
        let (result_tx, results) = watch::channel(None);
        let handle = tokio::spawn(run(frame_rx, result_tx, key_source));
        Self {
            frames,
            results,
            next_sequence: 1,
            handle,
        }
    }

    /// Start a worker that always uses the same key color.
    #[must_use]
    pub fn with_key(key: KeyColor) -> Self {
        Self::spawn(Arc::new(move || key))
    }

    /// Hand a frame to the worker, replacing any frame it has not started yet.
    ///
    /// Returns the frame's sequence number.
    pub fn submit(&mut self, frame: RgbaImage) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.frames.send_replace(Some(PendingFrame {
            sequence,
            image: Arc::new(frame),
        }));
        sequence
    }

    /// A receiver for keyed frames. Only the most recent result is retained.
    #[must_use]
    pub fn results(&self) -> watch::Receiver<Option<KeyedFrame>> {
        self.results.clone()
    }

    /// Stop accepting frames and wait for the in-flight frame to finish.
    pub async fn shutdown(self) {
        let Self { frames, handle, .. } = self;
        drop(frames);
        if let Err(e) = handle.await {
            warn!("frame worker terminated abnormally: {e}");
        }
    }
}

async fn run(
    mut frames: watch::Receiver<Option<PendingFrame>>,
    results: watch::Sender<Option<KeyedFrame>>,
    key_source: KeySource,
) {
    let mut last_sequence = 0u64;
    while frames.changed().await.is_ok() {
        let Some(frame) = frames.borrow_and_update().clone() else {
            continue;
        };

        let dropped = frame.sequence.saturating_sub(last_sequence + 1);
        if dropped > 0 {
            debug!("dropped {dropped} stale frame(s) before #{}", frame.sequence);
        }
        last_sequence = frame.sequence;

        let key = key_source();
        let sequence = frame.sequence;
        let keyed = tokio::task::spawn_blocking(move || apply_transparency(&frame.image, key)).await;

        match keyed {
            Ok(image) => {
                debug!("keyed frame #{sequence} with {key}");
                results.send_replace(Some(KeyedFrame {
                    sequence,
                    image: Arc::new(image),
                }));
            }
            Err(e) => warn!("frame #{sequence} analysis failed: {e}"),
        }
    }
    debug!("frame worker stopped after #{last_sequence}");
}
