//! Camera scanning loop.
//!
//! Decoding images into strings belongs to the platform; this module only
//! drives a [`FrameSource`] until one decoded string yields a document
//! identifier, the scan is cancelled, or the source runs dry. The source is
//! released on every exit path, including errors and a dropped future.

use async_trait::async_trait;
use tokio::sync::watch;

use legitcheck_core::{token_from_payload, EmbeddedToken};

use crate::error::ScanError;

/// A camera, or anything else that produces decoded QR payloads.
#[async_trait]
pub trait FrameSource: Send {
    /// The next decoded payload. `Ok(None)` means the source has ended.
    async fn next_frame(&mut self) -> Result<Option<String>, ScanError>;

    /// Release the underlying device. Called exactly once per scan.
    fn release(&mut self);
}

/// How a scan finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Accepted(EmbeddedToken),
    Cancelled,
    SourceEnded,
}

/// A finished scan and how many frames it looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub frames: u64,
    /// Frames that decoded to something other than an identifier.
    pub noise: u64,
}

/// Cancels a running scan.
#[derive(Debug)]
pub struct ScanCanceller {
    tx: watch::Sender<bool>,
}

impl ScanCanceller {
    /// A canceller and the signal to hand to [`scan`].
    pub fn channel() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

struct Released<S: FrameSource> {
    source: S,
}

impl<S: FrameSource> Drop for Released<S> {
    fn drop(&mut self) {
        self.source.release();
    }
}

/// Scan frames until an identifier is found or the scan is cancelled.
///
/// Frames that carry no identifier are skipped. A dropped canceller counts as
/// a cancellation.
pub async fn scan<S: FrameSource>(
    source: S,
    mut cancel: watch::Receiver<bool>,
) -> Result<ScanReport, ScanError> {
    let mut guard = Released { source };
    let mut frames = 0u64;
    let mut noise = 0u64;

    let report = |outcome, frames, noise| ScanReport {
        outcome,
        frames,
        noise,
    };

    loop {
        if *cancel.borrow_and_update() {
            return Ok(report(ScanOutcome::Cancelled, frames, noise));
        }

        tokio::select! {
            biased;

            changed = cancel.changed() => {
                if changed.is_err() {
                    tracing::debug!(frames, "scan canceller dropped");
                    return Ok(report(ScanOutcome::Cancelled, frames, noise));
                }
            }

            frame = guard.source.next_frame() => {
                let Some(payload) = frame? else {
                    return Ok(report(ScanOutcome::SourceEnded, frames, noise));
                };
                frames += 1;

                match token_from_payload(&payload) {
                    Some(token) => {
                        tracing::debug!(document_id = %token.id, frames, "scan accepted");
                        return Ok(report(ScanOutcome::Accepted(token), frames, noise));
                    }
                    None => noise += 1,
                }
            }
        }
    }
}
