//! # ESC/POS Real-Time Status (DLE EOT)
//!
//! Status-request builders and response-byte parsing for the real-time
//! transmit-status commands. These are handled by the printer even while
//! it is busy, and they do not mutate printer state, so a status query is
//! always safe to issue.
//!
//! ## Requests
//!
//! | Request | Bytes | Returns |
//! |---------|----------|---------|
//! | Printer status | 10 04 01 | online/offline, drawer |
//! | Offline cause | 10 04 02 | cover open, feed button, error |
//! | Error cause | 10 04 03 | cutter error, unrecoverable error |
//! | Paper sensor | 10 04 04 | paper near-end / end |
//!
//! Each request elicits exactly one response byte. Response bytes are
//! recognizable by their fixed bits: bit 0 = 0, bit 1 = 1, bit 4 = 1,
//! bit 7 = 0.

use super::commands::{DLE, EOT};

/// Which DLE EOT status to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRequest {
    /// Transmit printer status (n = 1)
    Printer,
    /// Transmit offline cause (n = 2)
    OfflineCause,
    /// Transmit error cause (n = 3)
    ErrorCause,
    /// Transmit roll paper sensor status (n = 4)
    PaperSensor,
}

impl StatusRequest {
    /// The `n` selector byte for this request
    #[inline]
    pub fn selector(self) -> u8 {
        match self {
            Self::Printer => 1,
            Self::OfflineCause => 2,
            Self::ErrorCause => 3,
            Self::PaperSensor => 4,
        }
    }

    /// Build the 3-byte request command
    ///
    /// ```
    /// use tarjeta::protocol::status::StatusRequest;
    ///
    /// assert_eq!(StatusRequest::PaperSensor.command(), vec![0x10, 0x04, 4]);
    /// ```
    #[inline]
    pub fn command(self) -> Vec<u8> {
        vec![DLE, EOT, self.selector()]
    }
}

// ============================================================================
// RESPONSE PARSING
// ============================================================================

/// Printer status byte (DLE EOT 1): bit 3 set = offline
#[inline]
pub fn is_offline(byte: u8) -> bool {
    byte & 0x08 != 0
}

/// Offline-cause byte (DLE EOT 2): bit 2 set = cover open
#[inline]
pub fn is_cover_open(byte: u8) -> bool {
    byte & 0x04 != 0
}

/// Offline-cause byte (DLE EOT 2): bit 5 set = printing stopped on paper end
#[inline]
pub fn is_paper_end_stop(byte: u8) -> bool {
    byte & 0x20 != 0
}

/// Offline-cause byte (DLE EOT 2): bit 6 set = error condition
#[inline]
pub fn is_error(byte: u8) -> bool {
    byte & 0x40 != 0
}

/// Paper-sensor byte (DLE EOT 4): bits 5-6 set = roll paper end
#[inline]
pub fn is_paper_out(byte: u8) -> bool {
    byte & 0x60 == 0x60
}

/// Paper-sensor byte (DLE EOT 4): bits 2-3 set = roll paper near end
#[inline]
pub fn is_paper_near_end(byte: u8) -> bool {
    byte & 0x0C == 0x0C
}

/// Check the fixed bits that identify a valid DLE EOT response byte.
///
/// Bit 0 must be 0, bit 1 must be 1, bit 4 must be 1, bit 7 must be 0.
/// Anything else is noise (e.g. stale print data in the IN endpoint) and
/// must not be parsed as status.
#[inline]
pub fn is_status_byte(byte: u8) -> bool {
    byte & 0b1001_0011 == 0b0001_0010
}

// ============================================================================
// TESTS
// ============================================================================
