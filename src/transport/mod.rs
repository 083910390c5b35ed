//! # Printer Transport Layer
//!
//! This module owns the device connection and all byte-level I/O.
//!
//! ## Available Transports
//!
//! - [`usb`]: USB bulk transfer via libusb (the production path)
//! - [`mock`]: scriptable in-memory transport for tests
//!
//! ## Connection Lifecycle
//!
//! ```text
//! Disconnected ──discover/connect──► Connected ──write/query──► Connected
//!      ▲                                │
//!      └────────────close──────────────┘
//!
//! any state ──unrecoverable I/O error──► Faulted (terminal)
//! ```
//!
//! A `Faulted` transport must be closed and rediscovered, never reused:
//! the device may have been unplugged, power-cycled, or left mid-command,
//! so nothing about the old handle can be trusted. `close` is idempotent
//! and is invoked on every session exit path, so the device is never left
//! held across process lifetimes.
//!
//! There is no separate device-handle type: the transport value itself
//! owns the open USB handle exclusively, all I/O goes through `&mut self`
//! (so concurrent I/O on one handle is not expressible), and it is
//! invalid for writes after `close` or a fault.

pub mod mock;
pub mod usb;

use crate::error::TarjetaError;
use crate::protocol::Frame;

pub use usb::UsbTransport;

/// Connection state of a transport
///
/// Discovery, writing, and querying are transient within a call; only
/// the resting states are observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No device held
    Disconnected,
    /// Device open and claimed; ready for write/query
    Connected,
    /// Unrecoverable I/O error; close and rediscover before reuse
    Faulted,
}

/// Identity of a discovered device on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId {
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus: u8,
    pub address: u8,
}

/// # Device Status Snapshot
///
/// Result of one status query. Recomputed on every call and never
/// cached — paper runs out and covers open between calls.
///
/// A non-ready printer is *data*, not an error: status queries succeed
/// whenever the link itself works.
#[derive(Debug, Clone, Default)]
pub struct DeviceStatus {
    /// Printer reports online
    pub online: bool,
    /// Roll paper end detected
    pub paper_out: bool,
    /// Roll paper near-end warning
    pub paper_near_end: bool,
    /// Cover open
    pub cover_open: bool,
    /// Printer-reported error condition
    pub error: bool,
    /// Human-readable descriptions of every non-ready condition
    pub errors: Vec<String>,
}

impl DeviceStatus {
    /// A fully ready status (used by tests and defaults)
    pub fn ready() -> Self {
        Self {
            online: true,
            ..Self::default()
        }
    }

    /// Whether the device can accept a print job right now
    pub fn is_ready(&self) -> bool {
        self.online && !self.paper_out && !self.cover_open && !self.error
    }
}

/// # Transport
///
/// The seam between the session/diagnostics layers and the physical
/// link. One implementation talks USB; tests script the mock.
pub trait Transport {
    /// Enumerate the bus for the configured vendor/product pair.
    ///
    /// Idempotent: every call re-scans rather than returning a cached
    /// result, because devices come and go between calls. Fails with
    /// [`TarjetaError::DeviceNotFound`] when no device matches.
    fn discover(&mut self) -> Result<DeviceId, TarjetaError>;

    /// Open the discovered device for exclusive use.
    ///
    /// Fails with [`TarjetaError::Connection`] if the device is already
    /// held by another session (no queueing) or cannot be claimed.
    fn connect(&mut self) -> Result<(), TarjetaError>;

    /// Write frames to the device in order, atomically per frame.
    ///
    /// A frame is never left half-written as a dangling command: on a
    /// transient error the same frame is retried (from its unsent
    /// remainder) up to the configured bound with backoff. Exhausting
    /// retries faults the transport and fails with
    /// [`TarjetaError::Transfer`].
    fn write(&mut self, frames: &[Frame]) -> Result<(), TarjetaError>;

    /// Read the device status registers without mutating printer state.
    ///
    /// Never fails for a non-ready printer — non-readiness comes back in
    /// the snapshot. Only a link-level failure is an `Err`.
    fn query_status(&mut self) -> Result<DeviceStatus, TarjetaError>;

    /// Release the device. Idempotent; safe to call in any state.
    fn close(&mut self);

    /// Current resting state
    fn state(&self) -> TransportState;
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_status() {
        let status = DeviceStatus::ready();
        assert!(status.is_ready());
        assert!(status.errors.is_empty());
    }

    #[test]
    fn test_paper_out_not_ready() {
        let status = DeviceStatus {
            online: true,
            paper_out: true,
            ..DeviceStatus::default()
        };
        assert!(!status.is_ready());
    }

    #[test]
    fn test_cover_open_not_ready() {
        let status = DeviceStatus {
            online: true,
            cover_open: true,
            ..DeviceStatus::default()
        };
        assert!(!status.is_ready());
    }

    #[test]
    fn test_offline_not_ready() {
        assert!(!DeviceStatus::default().is_ready());
    }

    #[test]
    fn test_near_end_still_ready() {
        // Near-end is a warning, not a blocker
        let status = DeviceStatus {
            online: true,
            paper_near_end: true,
            ..DeviceStatus::default()
        };
        assert!(status.is_ready());
    }
}
