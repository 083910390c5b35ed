//! # Error Types
//!
//! This module defines error types used throughout the tarjeta library.
//!
//! ## Taxonomy
//!
//! | Variant | Stage | Meaning |
//! |---------|-------|---------|
//! | `ImageTooWide` | rasterize | Upscaling past the configured maximum |
//! | `UnsupportedFormat` | rasterize | Image cannot be decoded to pixels |
//! | `Encoding` | encode | Precondition violation (width mismatch) |
//! | `DeviceNotFound` | transport | No matching USB device on the bus |
//! | `Connection` | transport | Device present but cannot be opened |
//! | `Transfer` | transport | Write/read failed after retries |
//! | `BatchAborted` | session | Reconnect after a fault failed |
//!
//! Rasterize/encode errors for one card are downgraded to a failed
//! [`PrintOutcome`](crate::session::PrintOutcome) at the session boundary;
//! they never abort a batch. Diagnostics capture every variant as report
//! text rather than propagating it.

use thiserror::Error;

/// Main error type for tarjeta operations
#[derive(Debug, Error)]
pub enum TarjetaError {
    /// Source image would need upscaling beyond the configured maximum
    #[error(
        "Image too wide to rasterize: {source_width} px source would need \
         {factor:.2}x upscale to reach {target_width} dots (max {max_factor:.2}x)"
    )]
    ImageTooWide {
        source_width: u32,
        target_width: u16,
        factor: f32,
        max_factor: f32,
    },

    /// Image cannot be decoded into pixel data
    #[error("Unsupported image: {0}")]
    UnsupportedFormat(String),

    /// Encoder precondition violation — programmer/config error, never a
    /// runtime device condition
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// No USB device matching the configured vendor/product ids
    #[error("Printer not found: no USB device {vendor_id:04x}:{product_id:04x}")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// Device discovered but could not be opened for exclusive use
    #[error("Connection error: {0}")]
    Connection(String),

    /// Frame transfer failed after exhausting retries
    #[error("Transfer error: {0}")]
    Transfer(String),

    /// Transport faulted mid-batch and the single reconnect attempt failed
    #[error("Batch aborted: {0}")]
    BatchAborted(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
