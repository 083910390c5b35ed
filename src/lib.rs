//! # Tarjeta - ESC/POS Task Card Printer Library
//!
//! Tarjeta is a Rust library for printing task cards on ESC/POS thermal
//! printers over USB. It provides:
//!
//! - **Protocol implementation**: ESC/POS command builders (raster, feed,
//!   cut, real-time status)
//! - **Rasterization**: image → printer-width 1-bit bitmap with Bayer 8x8
//!   ordered dithering
//! - **Transport**: USB bulk transfer via libusb, with per-frame retry
//! - **Sessions**: batch printing with per-card outcomes and a bounded
//!   reconnect
//! - **Diagnostics**: a never-failing device/readiness probe
//!
//! ## Quick Start
//!
//! ```no_run
//! use tarjeta::{
//!     printer::PrinterConfig,
//!     session::{CutPolicy, PrintSession},
//!     transport::UsbTransport,
//! };
//!
//! let config = PrinterConfig::generic_58mm();
//! let mut transport = UsbTransport::new(config.clone());
//!
//! let image = tarjeta::render::load_image("card.png")?;
//! let outcomes = PrintSession::new(&mut transport, config)
//!     .print_batch(&[image], CutPolicy::EveryCard);
//!
//! for outcome in &outcomes {
//!     println!("card {}: ok={}", outcome.index, outcome.success);
//! }
//! # Ok::<(), tarjeta::error::TarjetaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | ESC/POS command builders and the frame encoder |
//! | [`render`] | Dithering and rasterization |
//! | [`transport`] | USB and mock communication backends |
//! | [`session`] | Batch printing orchestration |
//! | [`diagnostics`] | Connectivity/readiness probing |
//! | [`printer`] | Printer configurations |
//! | [`card`] | Card records and output naming |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Currently tested with:
//! - Epson TM-T20III (58mm paper, 203 DPI, USB)
//!
//! Other ESC/POS printers with a bulk-out endpoint should work with
//! appropriate configuration adjustments.

pub mod card;
pub mod diagnostics;
pub mod error;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use error::TarjetaError;
pub use printer::PrinterConfig;
pub use session::{CutPolicy, PrintOutcome, PrintSession};
pub use transport::UsbTransport;
