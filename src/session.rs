//! # Print Session
//!
//! Drives one batch of cards end-to-end:
//!
//! ```text
//! image ──► rasterize ──► encode ──► transport.write ──► outcome
//!   │                                                      │
//!   └────────────── next card (always) ◄───────────────────┘
//! ```
//!
//! ## Batch Semantics
//!
//! - The connection is opened **once** per batch and reused for every
//!   card; reopening per card is pointless device churn and risks
//!   exclusivity conflicts.
//! - A per-card failure (rasterize, encode, or transfer) becomes that
//!   card's failed [`PrintOutcome`]; the batch keeps going. Failures are
//!   values, not control flow.
//! - When the transport faults, the session attempts **exactly one**
//!   reconnect for the whole batch. If the reconnect fails, every
//!   remaining card is marked failed without another write attempt — a
//!   dead device should cost one reconnect, not a stall per card.
//! - The batch always returns one outcome per input image, in input
//!   order.
//!
//! ## Cutting
//!
//! The last card of a batch is always cut — nobody wants the final card
//! stuck in the printer. Intermediate cards follow the caller's policy.
//!
//! ## Progress & Cancellation
//!
//! An optional callback observes each outcome as it is produced; it is
//! observational only and introduces no reentrancy. Cancellation is
//! best-effort and honored only between cards — aborting mid-frame
//! would leave the printer with half a raster command.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::TarjetaError;
use crate::printer::PrinterConfig;
use crate::protocol::{EncodeOptions, encode};
use crate::render::{RasterOptions, rasterize};
use crate::transport::{Transport, TransportState};

/// When to cut between cards (the last card is always cut)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CutPolicy {
    /// Cut after every card (default)
    #[default]
    EveryCard,
    /// Only cut after the last card; intermediate cards stay joined
    LastCardOnly,
}

impl CutPolicy {
    /// Whether a card at this position gets a cut frame
    #[inline]
    pub fn cut_after(self, is_last: bool) -> bool {
        is_last || self == Self::EveryCard
    }
}

/// Which stage failed, when a card fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Image could not be rasterized (too wide, undecodable)
    Rasterize,
    /// Bitmap could not be encoded (width precondition)
    Encode,
    /// Frames could not be written to the device
    Transport,
    /// Batch aborted before this card was attempted
    Aborted,
}

/// # Print Outcome
///
/// Per-card result. Produced once, never mutated: a batch returns one of
/// these per input, in input order.
#[derive(Debug, Clone)]
pub struct PrintOutcome {
    /// Position of the card in the batch
    pub index: usize,
    /// Whether a cut frame was (or would have been) emitted for the card
    pub cut_after: bool,
    /// Whether the card reached the device completely
    pub success: bool,
    /// Failure classification, when `success` is false
    pub failure: Option<FailureStage>,
    /// Human-readable failure detail
    pub detail: Option<String>,
}

impl PrintOutcome {
    fn ok(index: usize, cut_after: bool) -> Self {
        Self {
            index,
            cut_after,
            success: true,
            failure: None,
            detail: None,
        }
    }

    fn failed(index: usize, cut_after: bool, stage: FailureStage, detail: String) -> Self {
        Self {
            index,
            cut_after,
            success: false,
            failure: Some(stage),
            detail: Some(detail),
        }
    }
}

/// Observational per-card progress callback
pub type ProgressFn<'a> = Box<dyn FnMut(usize, &PrintOutcome) + 'a>;

/// # Print Session
///
/// Orchestrates one batch of already-rendered card images through
/// rasterize → encode → write against a single transport.
pub struct PrintSession<'t, T: Transport> {
    transport: &'t mut T,
    config: PrinterConfig,
    raster_options: RasterOptions,
    progress: Option<ProgressFn<'t>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'t, T: Transport> PrintSession<'t, T> {
    /// Create a session over a transport.
    pub fn new(transport: &'t mut T, config: PrinterConfig) -> Self {
        let raster_options = RasterOptions {
            max_upscale: config.max_upscale,
            ..RasterOptions::default()
        };
        Self {
            transport,
            config,
            raster_options,
            progress: None,
            cancel: None,
        }
    }

    /// Override rasterization options (builder-style)
    pub fn with_raster_options(mut self, options: RasterOptions) -> Self {
        self.raster_options = options;
        self
    }

    /// Observe each card's outcome as it completes.
    ///
    /// Called once per card, after its write finishes. Observational
    /// only — the callback cannot influence the batch except through a
    /// cancellation flag.
    pub fn on_progress(mut self, callback: ProgressFn<'t>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Honor this flag between cards: once set, remaining cards are
    /// marked failed instead of printed. Never interrupts a card
    /// mid-write.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Print a batch of card images.
    ///
    /// Returns exactly `images.len()` outcomes, in input order. Physical
    /// side effects: printing and cutting. The connection is closed on
    /// every exit path.
    pub fn print_batch(
        &mut self,
        images: &[DynamicImage],
        policy: CutPolicy,
    ) -> Vec<PrintOutcome> {
        let total = images.len();
        let mut outcomes = Vec::with_capacity(total);
        if total == 0 {
            return outcomes;
        }

        info!(cards = total, policy = ?policy, "starting print batch");

        // One connection per batch
        if let Err(e) = self.open() {
            warn!("could not open printer: {}", e);
            for (index, _) in images.iter().enumerate() {
                let cut = policy.cut_after(index + 1 == total);
                outcomes.push(PrintOutcome::failed(
                    index,
                    cut,
                    FailureStage::Transport,
                    e.to_string(),
                ));
            }
            self.transport.close();
            return outcomes;
        }

        let mut reconnect_spent = false;
        let mut abort_reason: Option<String> = None;

        for (index, image) in images.iter().enumerate() {
            let cut = policy.cut_after(index + 1 == total);

            if abort_reason.is_none()
                && let Some(flag) = &self.cancel
                && flag.load(Ordering::Relaxed)
            {
                abort_reason = Some("batch cancelled".to_string());
            }

            let outcome = if let Some(reason) = &abort_reason {
                PrintOutcome::failed(index, cut, FailureStage::Aborted, reason.clone())
            } else {
                self.print_card(index, image, cut, &mut reconnect_spent, &mut abort_reason)
            };

            if let Some(callback) = &mut self.progress {
                callback(index, &outcome);
            }
            outcomes.push(outcome);
        }

        self.transport.close();
        let printed = outcomes.iter().filter(|o| o.success).count();
        info!(printed, total, "print batch finished");
        outcomes
    }

    /// Discover and connect once.
    fn open(&mut self) -> Result<(), TarjetaError> {
        self.transport.discover()?;
        self.transport.connect()
    }

    /// Rasterize, encode, and write a single card.
    fn print_card(
        &mut self,
        index: usize,
        image: &DynamicImage,
        cut: bool,
        reconnect_spent: &mut bool,
        abort_reason: &mut Option<String>,
    ) -> PrintOutcome {
        let bitmap = match rasterize(image, self.config.width_dots, &self.raster_options) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                return PrintOutcome::failed(index, cut, FailureStage::Rasterize, e.to_string());
            }
        };

        let options = EncodeOptions {
            cut_after: cut,
            feed_lines: self.config.feed_lines,
        };
        let frames = match encode(&bitmap, &self.config, &options) {
            Ok(frames) => frames,
            Err(e) => {
                return PrintOutcome::failed(index, cut, FailureStage::Encode, e.to_string());
            }
        };

        debug!(card = index, frames = frames.len(), rows = bitmap.height(), "writing card");

        match self.transport.write(&frames) {
            Ok(()) => PrintOutcome::ok(index, cut),
            Err(first_error) => {
                if self.transport.state() != TransportState::Faulted {
                    return PrintOutcome::failed(
                        index,
                        cut,
                        FailureStage::Transport,
                        first_error.to_string(),
                    );
                }

                if *reconnect_spent {
                    // The one reconnect is gone; the device is confirmed
                    // unreachable. This card's write did run, the rest
                    // never will.
                    *abort_reason = Some(
                        TarjetaError::BatchAborted(first_error.to_string()).to_string(),
                    );
                    return PrintOutcome::failed(
                        index,
                        cut,
                        FailureStage::Transport,
                        first_error.to_string(),
                    );
                }

                *reconnect_spent = true;
                warn!(card = index, "transport faulted, attempting reconnect");
                self.transport.close();
                let reconnected =
                    self.transport.discover().is_ok() && self.transport.connect().is_ok();

                if !reconnected {
                    let reason =
                        TarjetaError::BatchAborted("reconnect failed".to_string()).to_string();
                    *abort_reason = Some(reason.clone());
                    return PrintOutcome::failed(index, cut, FailureStage::Aborted, reason);
                }

                // One more try for this card on the fresh connection
                match self.transport.write(&frames) {
                    Ok(()) => PrintOutcome::ok(index, cut),
                    Err(second_error) => {
                        if self.transport.state() == TransportState::Faulted {
                            *abort_reason = Some(
                                TarjetaError::BatchAborted(second_error.to_string()).to_string(),
                            );
                        }
                        PrintOutcome::failed(
                            index,
                            cut,
                            FailureStage::Transport,
                            second_error.to_string(),
                        )
                    }
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FrameKind;
    use crate::transport::mock::MockTransport;
    use image::{GrayImage, Luma};
    use pretty_assertions::assert_eq;

    fn card_image() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(384, 100, Luma([60])))
    }

    fn batch(n: usize) -> Vec<DynamicImage> {
        (0..n).map(|_| card_image()).collect()
    }

    fn config() -> PrinterConfig {
        PrinterConfig::generic_58mm()
    }

    #[test]
    fn test_three_cards_happy_path() {
        let mut mock = MockTransport::ready();
        let outcomes = PrintSession::new(&mut mock, config())
            .print_batch(&batch(3), CutPolicy::EveryCard);

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.success));
        assert!(outcomes.iter().all(|o| o.cut_after));

        // Three cut frames total, one connection opened and closed once
        assert_eq!(mock.frames_of_kind(FrameKind::Cut), 3);
        assert_eq!(mock.connect_calls, 1);
        assert_eq!(mock.close_calls, 1);
        assert_eq!(mock.write_calls, 3);
    }

    #[test]
    fn test_outcomes_preserve_input_order() {
        let mut mock = MockTransport::ready();
        let outcomes = PrintSession::new(&mut mock, config())
            .print_batch(&batch(5), CutPolicy::EveryCard);

        let indices: Vec<usize> = outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_last_card_always_cut() {
        let mut mock = MockTransport::ready();
        let outcomes = PrintSession::new(&mut mock, config())
            .print_batch(&batch(3), CutPolicy::LastCardOnly);

        assert!(!outcomes[0].cut_after);
        assert!(!outcomes[1].cut_after);
        assert!(outcomes[2].cut_after);
        assert_eq!(mock.frames_of_kind(FrameKind::Cut), 1);
    }

    #[test]
    fn test_per_card_rasterize_failure_does_not_abort_batch() {
        // Card 1 is far too narrow for the device width
        let images = vec![
            card_image(),
            DynamicImage::ImageLuma8(GrayImage::from_pixel(10, 10, Luma([0]))),
            card_image(),
        ];
        let mut mock = MockTransport::ready();
        let outcomes =
            PrintSession::new(&mut mock, config()).print_batch(&images, CutPolicy::EveryCard);

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].failure, Some(FailureStage::Rasterize));
        assert!(outcomes[2].success);
        assert_eq!(mock.write_calls, 2);
    }

    #[test]
    fn test_fault_with_failed_reconnect_aborts_remainder() {
        // Second write faults; the reconnect is refused
        let mut mock = MockTransport {
            fail_write_at: Some(1),
            allowed_connects: Some(1),
            ..MockTransport::ready()
        };
        let outcomes = PrintSession::new(&mut mock, config())
            .print_batch(&batch(4), CutPolicy::EveryCard);

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].failure, Some(FailureStage::Aborted));
        assert_eq!(outcomes[2].failure, Some(FailureStage::Aborted));
        assert_eq!(outcomes[3].failure, Some(FailureStage::Aborted));

        // No write attempts after the fault
        assert_eq!(mock.write_calls, 2);
        // Exactly one reconnect attempt
        assert_eq!(mock.connect_calls, 2);
    }

    #[test]
    fn test_fault_with_successful_reconnect_retries_card() {
        let mut mock = MockTransport {
            fail_write_at: Some(1),
            ..MockTransport::ready()
        };
        let outcomes = PrintSession::new(&mut mock, config())
            .print_batch(&batch(3), CutPolicy::EveryCard);

        assert!(outcomes.iter().all(|o| o.success), "{:?}", outcomes);
        // Card 1 was written twice: the fault and the post-reconnect retry
        assert_eq!(mock.write_calls, 4);
        assert_eq!(mock.connect_calls, 2);
        assert_eq!(mock.written.len(), 3);
    }

    #[test]
    fn test_absent_device_fails_every_card_without_writes() {
        let mut mock = MockTransport::absent();
        let outcomes = PrintSession::new(&mut mock, config())
            .print_batch(&batch(3), CutPolicy::EveryCard);

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| !o.success));
        assert!(
            outcomes
                .iter()
                .all(|o| o.failure == Some(FailureStage::Transport))
        );
        assert_eq!(mock.write_calls, 0);
    }

    #[test]
    fn test_empty_batch() {
        let mut mock = MockTransport::ready();
        let outcomes =
            PrintSession::new(&mut mock, config()).print_batch(&[], CutPolicy::EveryCard);
        assert!(outcomes.is_empty());
        assert_eq!(mock.connect_calls, 0);
    }

    #[test]
    fn test_progress_callback_fires_per_card() {
        let seen = std::cell::RefCell::new(Vec::new());
        let mut mock = MockTransport::ready();
        let outcomes = PrintSession::new(&mut mock, config())
            .on_progress(Box::new(|index, outcome| {
                seen.borrow_mut().push((index, outcome.success));
            }))
            .print_batch(&batch(3), CutPolicy::EveryCard);

        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            seen.into_inner(),
            vec![(0, true), (1, true), (2, true)]
        );
    }

    #[test]
    fn test_cancellation_between_cards() {
        let flag = Arc::new(AtomicBool::new(false));
        let observer = Arc::clone(&flag);

        let mut mock = MockTransport::ready();
        let outcomes = PrintSession::new(&mut mock, config())
            .with_cancel_flag(Arc::clone(&flag))
            .on_progress(Box::new(move |index, _| {
                if index == 0 {
                    observer.store(true, Ordering::Relaxed);
                }
            }))
            .print_batch(&batch(3), CutPolicy::EveryCard);

        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].failure, Some(FailureStage::Aborted));
        assert!(!outcomes[2].success);
        // Only the first card reached the device
        assert_eq!(mock.write_calls, 1);
    }

    #[test]
    fn test_connection_closed_after_abort() {
        let mut mock = MockTransport {
            fail_write_at: Some(0),
            allowed_connects: Some(1),
            ..MockTransport::ready()
        };
        PrintSession::new(&mut mock, config()).print_batch(&batch(2), CutPolicy::EveryCard);

        // Closed once during reconnect, once at batch end
        assert_eq!(mock.close_calls, 2);
        assert_eq!(mock.state(), TransportState::Disconnected);
    }

    #[test]
    fn test_cut_policy_helper() {
        assert!(CutPolicy::EveryCard.cut_after(false));
        assert!(CutPolicy::EveryCard.cut_after(true));
        assert!(!CutPolicy::LastCardOnly.cut_after(false));
        assert!(CutPolicy::LastCardOnly.cut_after(true));
    }
}
