//! # Command Encoder
//!
//! Turns a monochrome [`Bitmap`] plus print directives into an ordered
//! sequence of protocol [`Frame`]s ready for the transport.
//!
//! ## Frame Order
//!
//! ```text
//! ┌──────┐  ┌────────┐     ┌────────┐  ┌──────┐  ┌─────┐
//! │ init │─►│ raster │ ... │ raster │─►│ feed │─►│ cut │
//! └──────┘  └────────┘     └────────┘  └──────┘  └─────┘
//!            ≤ C rows       final may      if        if
//!            each           be short    feed > 0  cut_after
//! ```
//!
//! The init frame is mandatory: a prior job's printer state must not
//! leak into this one. Raster frames carry at most `max_chunk_rows`
//! rows each (a printer buffer limit); a bitmap taller than one chunk
//! is split in row order with no gaps or overlaps, and a height that is
//! not a multiple of the chunk size yields a final short chunk — never
//! a dropped or padded one.
//!
//! Encoding is pure: no device access, no side effects.

use crate::error::TarjetaError;
use crate::printer::PrinterConfig;
use crate::protocol::{commands, graphics};
use crate::render::Bitmap;

/// What one frame carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Printer reset (ESC @)
    Init,
    /// One raster chunk of `rows` bitmap rows (GS v 0)
    Raster { rows: u16 },
    /// Blank-line paper feed (ESC d n)
    Feed,
    /// Paper cut (GS V)
    Cut,
}

/// # Frame
///
/// One protocol command as an opaque, immutable byte sequence. A print
/// job is an ordered sequence of frames; the transport writes each frame
/// atomically and never splits one across a retry boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    kind: FrameKind,
    bytes: Vec<u8>,
}

impl Frame {
    fn new(kind: FrameKind, bytes: Vec<u8>) -> Self {
        Self { kind, bytes }
    }

    /// What this frame carries
    #[inline]
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// The raw command bytes
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Command length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the frame is empty (never true for encoder output)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Print directives for one card
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Emit a cut frame after the image
    pub cut_after: bool,
    /// Blank lines to feed after the image (0 = no feed frame)
    pub feed_lines: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            cut_after: true,
            feed_lines: 2,
        }
    }
}

/// Encode a bitmap into an ordered frame sequence.
///
/// Emits, in order: one init frame, `ceil(H/C)` raster frames (row
/// counts summing to exactly H), a feed frame if `feed_lines > 0`, and
/// a cut frame iff `cut_after` is true.
///
/// ## Errors
///
/// [`TarjetaError::Encoding`] if the bitmap width is not exactly the
/// configured raster width. This is a precondition violation caught
/// here, before any bytes reach the device — it must never surface as
/// a transport failure.
pub fn encode(
    bitmap: &Bitmap,
    config: &PrinterConfig,
    options: &EncodeOptions,
) -> Result<Vec<Frame>, TarjetaError> {
    if bitmap.width_dots() != config.width_dots {
        return Err(TarjetaError::Encoding(format!(
            "bitmap width {} does not match device raster width {}",
            bitmap.width_dots(),
            config.width_dots
        )));
    }

    let height = bitmap.height();
    let chunk_rows = config.max_chunk_rows.max(1) as u32;
    let chunk_count = height.div_ceil(chunk_rows) as usize;

    let mut frames = Vec::with_capacity(2 + chunk_count + options.cut_after as usize);
    frames.push(Frame::new(FrameKind::Init, commands::init()));

    let mut row = 0u32;
    while row < height {
        let end = (row + chunk_rows).min(height);
        let rows = (end - row) as u16;
        frames.push(Frame::new(
            FrameKind::Raster { rows },
            graphics::raster(bitmap.width_dots(), rows, bitmap.rows(row, end)),
        ));
        row = end;
    }

    if options.feed_lines > 0 {
        frames.push(Frame::new(
            FrameKind::Feed,
            commands::feed_lines(options.feed_lines),
        ));
    }

    if options.cut_after {
        frames.push(Frame::new(FrameKind::Cut, commands::cut_feed(0)));
    }

    Ok(frames)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> PrinterConfig {
        PrinterConfig::generic_58mm()
    }

    fn bitmap(height: u32) -> Bitmap {
        Bitmap::from_packed(384, height, vec![0xAA; 48 * height as usize]).unwrap()
    }

    fn raster_rows(frames: &[Frame]) -> Vec<u16> {
        frames
            .iter()
            .filter_map(|f| match f.kind() {
                FrameKind::Raster { rows } => Some(rows),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_starts_with_exactly_one_init() {
        let frames = encode(&bitmap(10), &config(), &EncodeOptions::default()).unwrap();
        assert_eq!(frames[0].kind(), FrameKind::Init);
        assert_eq!(frames[0].bytes(), &[0x1B, 0x40]);
        let inits = frames
            .iter()
            .filter(|f| f.kind() == FrameKind::Init)
            .count();
        assert_eq!(inits, 1);
    }

    #[test]
    fn test_cut_after_true_ends_with_one_cut() {
        let frames = encode(&bitmap(10), &config(), &EncodeOptions::default()).unwrap();
        assert_eq!(frames.last().unwrap().kind(), FrameKind::Cut);
        let cuts = frames.iter().filter(|f| f.kind() == FrameKind::Cut).count();
        assert_eq!(cuts, 1);
    }

    #[test]
    fn test_cut_after_false_has_no_cut() {
        let opts = EncodeOptions {
            cut_after: false,
            feed_lines: 0,
        };
        let frames = encode(&bitmap(10), &config(), &opts).unwrap();
        assert!(frames.iter().all(|f| f.kind() != FrameKind::Cut));
        assert!(frames.iter().all(|f| f.kind() != FrameKind::Feed));
    }

    #[test]
    fn test_feed_frame_between_raster_and_cut() {
        let opts = EncodeOptions {
            cut_after: true,
            feed_lines: 3,
        };
        let frames = encode(&bitmap(10), &config(), &opts).unwrap();
        let kinds: Vec<FrameKind> = frames.iter().map(|f| f.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                FrameKind::Init,
                FrameKind::Raster { rows: 10 },
                FrameKind::Feed,
                FrameKind::Cut,
            ]
        );
        let feed = &frames[2];
        assert_eq!(feed.bytes(), &[0x1B, 0x64, 3]);
    }

    #[test]
    fn test_short_bitmap_single_chunk() {
        let frames = encode(&bitmap(100), &config(), &EncodeOptions::default()).unwrap();
        assert_eq!(raster_rows(&frames), vec![100]);
    }

    #[test]
    fn test_exact_multiple_of_chunk_size() {
        // 512 rows at 256 rows/chunk = exactly 2 chunks
        let frames = encode(&bitmap(512), &config(), &EncodeOptions::default()).unwrap();
        assert_eq!(raster_rows(&frames), vec![256, 256]);
    }

    #[test]
    fn test_final_short_chunk_preserved() {
        // 600 rows = 256 + 256 + 88, ceil(600/256) = 3 chunks
        let frames = encode(&bitmap(600), &config(), &EncodeOptions::default()).unwrap();
        let rows = raster_rows(&frames);
        assert_eq!(rows, vec![256, 256, 88]);
        assert_eq!(rows.iter().map(|&r| r as u32).sum::<u32>(), 600);
    }

    #[test]
    fn test_chunk_count_is_ceiling() {
        for height in [1u32, 255, 256, 257, 1000] {
            let frames = encode(&bitmap(height), &config(), &EncodeOptions::default()).unwrap();
            let rows = raster_rows(&frames);
            assert_eq!(rows.len() as u32, height.div_ceil(256), "height {}", height);
            assert_eq!(
                rows.iter().map(|&r| r as u32).sum::<u32>(),
                height,
                "height {}",
                height
            );
        }
    }

    #[test]
    fn test_chunks_cover_rows_in_order() {
        // Distinct byte per row so chunk boundaries are verifiable
        let height = 300u32;
        let data: Vec<u8> = (0..height)
            .flat_map(|row| std::iter::repeat_n((row % 251) as u8, 48))
            .collect();
        let bmp = Bitmap::from_packed(384, height, data).unwrap();
        let frames = encode(&bmp, &config(), &EncodeOptions::default()).unwrap();

        // First raster chunk starts at row 0, second at row 256
        let rasters: Vec<&Frame> = frames
            .iter()
            .filter(|f| matches!(f.kind(), FrameKind::Raster { .. }))
            .collect();
        assert_eq!(rasters.len(), 2);
        assert_eq!(rasters[0].bytes()[8], 0); // row 0 payload
        assert_eq!(rasters[1].bytes()[8], (256 % 251) as u8); // row 256 payload
    }

    #[test]
    fn test_width_mismatch_is_encoding_error() {
        // Width off by one in either direction must be caught here
        for width in [383u16, 385] {
            let row_bytes = (width as usize).div_ceil(8);
            let bmp = Bitmap::from_packed(width, 10, vec![0; row_bytes * 10]).unwrap();
            let err = encode(&bmp, &config(), &EncodeOptions::default()).unwrap_err();
            assert!(
                matches!(err, TarjetaError::Encoding(_)),
                "width {} should fail encode",
                width
            );
        }
    }

    #[test]
    fn test_custom_chunk_size() {
        let mut cfg = config();
        cfg.max_chunk_rows = 24;
        let frames = encode(&bitmap(50), &cfg, &EncodeOptions::default()).unwrap();
        assert_eq!(raster_rows(&frames), vec![24, 24, 2]);
    }
}
