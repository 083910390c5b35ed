//! # ESC/POS Protocol Commands
//!
//! This module implements the ESC/POS command subset used by tarjeta:
//! initialization, paper feed, and paper cut. Raster graphics live in
//! [`graphics`](super::graphics), status queries in
//! [`status`](super::status).
//!
//! ## Protocol Overview
//!
//! ESC/POS is a command-based protocol where commands are byte sequences
//! starting with escape characters:
//!
//! - Two bytes: `ESC @`
//! - Multi-byte with parameters: `ESC d n`, `GS V m n`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`
//!
//! ## Reference
//!
//! Based on the Epson "ESC/POS Application Programming Guide"; byte
//! values are common to most compatible receipt printers.

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
///
/// Most ESC/POS commands begin with ESC (0x1B). This byte signals the
/// start of a control sequence rather than printable text.
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Prefix for graphics, cutter, and extended commands.
/// Hex: 0x1D, Decimal: 29
pub const GS: u8 = 0x1D;

/// DLE (Data Link Escape) - Real-time command prefix
///
/// Real-time commands (`DLE EOT n`) are handled by the printer even while
/// it is busy printing, which is what makes status queries non-blocking.
pub const DLE: u8 = 0x10;

/// EOT (End of Transmission) - Real-time status request selector
pub const EOT: u8 = 0x04;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Resets the printer to its power-on default state. Sent at the start of
/// every print job so a prior job's state (alignment, density, partial
/// line buffer) cannot leak into this one.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
/// | Decimal | 27 64 |
///
/// ## Example
///
/// ```
/// use tarjeta::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// PAPER FEED
// ============================================================================

/// # Print and Feed n Lines (ESC d n)
///
/// Feeds the paper forward by `n` blank lines at the current line
/// spacing.
///
/// ## Protocol Details
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC d n  |
/// | Hex     | 1B 64 n  |
/// | Decimal | 27 100 n |
///
/// ## Example
///
/// ```
/// use tarjeta::protocol::commands;
///
/// assert_eq!(commands::feed_lines(3), vec![0x1B, 0x64, 3]);
/// ```
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

// ============================================================================
// CUTTER CONTROL
// ============================================================================

/// # Full Cut at Current Position (GS V 0)
///
/// Cuts the paper at the current position without feeding. Content still
/// between the print head and the cutter will be cut through — prefer
/// [`cut_feed`] for receipts.
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | Hex     | 1D 56 00 |
/// | Decimal | 29 86 0  |
#[inline]
pub fn cut_full() -> Vec<u8> {
    vec![GS, b'V', 0]
}

/// # Partial Cut at Current Position (GS V 1)
///
/// Leaves a small uncut "hinge" so the card hangs instead of falling.
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | Hex     | 1D 56 01 |
/// | Decimal | 29 86 1  |
#[inline]
pub fn cut_partial() -> Vec<u8> {
    vec![GS, b'V', 1]
}

/// # Feed and Full Cut (GS V 66 n)
///
/// Feeds `n` lines, then performs a full cut. The printer manages the
/// cutter-to-head distance itself, which wastes less top margin on the
/// next card than a separate feed + cut.
///
/// | Format  | Bytes      |
/// |---------|------------|
/// | Hex     | 1D 56 42 n |
/// | Decimal | 29 86 66 n |
///
/// ## Example
///
/// ```
/// use tarjeta::protocol::commands;
///
/// assert_eq!(commands::cut_feed(0), vec![0x1D, 0x56, 0x42, 0]);
/// ```
#[inline]
pub fn cut_feed(n: u8) -> Vec<u8> {
    vec![GS, b'V', 66, n]
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ESC/POS uses little-endian encoding for all multi-byte integers.
///
/// ## Example
///
/// ```
/// use tarjeta::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(384), [0x80, 0x01]); // 384 = 0x0180
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert_eq!(init(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_feed_lines() {
        assert_eq!(feed_lines(0), vec![0x1B, 0x64, 0x00]);
        assert_eq!(feed_lines(2), vec![0x1B, 0x64, 0x02]);
        assert_eq!(feed_lines(255), vec![0x1B, 0x64, 0xFF]);
    }

    #[test]
    fn test_cut_full() {
        assert_eq!(cut_full(), vec![0x1D, 0x56, 0x00]);
    }

    #[test]
    fn test_cut_partial() {
        assert_eq!(cut_partial(), vec![0x1D, 0x56, 0x01]);
    }

    #[test]
    fn test_cut_feed() {
        assert_eq!(cut_feed(0), vec![0x1D, 0x56, 0x42, 0x00]);
        assert_eq!(cut_feed(4), vec![0x1D, 0x56, 0x42, 0x04]);
    }

    #[test]
    fn test_u16_le() {
        assert_eq!(u16_le(0x0000), [0x00, 0x00]);
        assert_eq!(u16_le(0x00FF), [0xFF, 0x00]);
        assert_eq!(u16_le(0xFF00), [0x00, 0xFF]);
        assert_eq!(u16_le(0x1234), [0x34, 0x12]);
        assert_eq!(u16_le(384), [0x80, 0x01]); // common width: 384 dots
    }
}
