//! # Printer Configuration
//!
//! This module defines hardware and link characteristics for supported
//! ESC/POS thermal printers.
//!
//! ## Supported Printers
//!
//! | Profile | Width (dots) | Resolution | Chunk Rows |
//! |---------|--------------|------------|------------|
//! | Generic 58mm | 384 | 203 DPI | 256 |
//! | Generic 80mm | 576 | 203 DPI | 256 |
//!
//! ## Usage
//!
//! ```
//! use tarjeta::printer::PrinterConfig;
//!
//! let config = PrinterConfig::generic_58mm();
//! println!("Print width: {} dots ({} bytes)",
//!          config.width_dots,
//!          config.width_bytes());
//! ```
//!
//! Everything device-specific lives here — raster width, chunk limit,
//! USB identity, retry policy. The encoder and transport take these as
//! inputs and hard-code nothing.

use std::time::Duration;

/// # Printer Configuration
///
/// Defines the characteristics of one printer target.
///
/// ## Physical Properties
///
/// - **width_dots**: Maximum printable width in dots (pixels)
/// - **dpi**: Resolution in dots per inch
/// - **max_chunk_rows**: Maximum bitmap rows per raster command — a
///   printer buffer limit, taller bitmaps are split into multiple frames
///
/// ## USB Identity
///
/// - **vendor_id / product_id**: The fixed pair `discover` scans for
///
/// ## Link Tuning
///
/// - **io_timeout**: Per bulk write/read call
/// - **write_retries**: Attempts per frame before the transport faults
/// - **retry_backoff**: Base delay between attempts (doubles per retry)
///
/// Retry bound, backoff, and chunk size are deployment parameters, not
/// protocol requirements; tune them per printer model.
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    /// Printer model name
    pub name: &'static str,

    /// Maximum print width in dots (pixels)
    pub width_dots: u16,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Maximum rows per raster chunk (printer buffer limit)
    pub max_chunk_rows: u16,

    /// Blank lines to feed before a cut
    pub feed_lines: u8,

    /// USB vendor id to discover
    pub vendor_id: u16,

    /// USB product id to discover
    pub product_id: u16,

    /// Timeout for each bulk write/read call
    pub io_timeout: Duration,

    /// Write attempts per frame before the transport faults
    pub write_retries: u32,

    /// Base backoff between write attempts (doubles each retry)
    pub retry_backoff: Duration,

    /// Maximum upscale factor the rasterizer will apply
    pub max_upscale: f32,
}

impl PrinterConfig {
    /// Generic 58mm ESC/POS printer (384-dot raster width).
    ///
    /// The default USB identity matches Epson TM-series printers
    /// (vendor 0x04b8); override with [`with_usb_id`](Self::with_usb_id)
    /// for clones.
    pub fn generic_58mm() -> Self {
        Self {
            name: "Generic 58mm ESC/POS",
            width_dots: 384,
            dpi: 203,
            max_chunk_rows: 256,
            feed_lines: 2,
            vendor_id: 0x04b8,
            product_id: 0x0e28,
            io_timeout: Duration::from_secs(5),
            write_retries: 3,
            retry_backoff: Duration::from_millis(50),
            max_upscale: 2.0,
        }
    }

    /// Generic 80mm ESC/POS printer (576-dot raster width).
    pub fn generic_80mm() -> Self {
        Self {
            name: "Generic 80mm ESC/POS",
            width_dots: 576,
            ..Self::generic_58mm()
        }
    }

    /// Print width in bytes (`ceil(width_dots / 8)`)
    #[inline]
    pub fn width_bytes(&self) -> u16 {
        self.width_dots.div_ceil(8)
    }

    /// Calculate dots per millimeter
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / 25.4
    }

    /// Calculate print width in millimeters
    #[inline]
    pub fn width_mm(&self) -> f32 {
        self.width_dots as f32 / self.dots_per_mm()
    }

    /// Override the USB identity (builder-style)
    pub fn with_usb_id(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self.product_id = product_id;
        self
    }

    /// Override the raster width in dots (builder-style)
    pub fn with_width_dots(mut self, width_dots: u16) -> Self {
        self.width_dots = width_dots;
        self
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::generic_58mm()
    }
}

// ============================================================================
// TESTS
// ============================================================================
