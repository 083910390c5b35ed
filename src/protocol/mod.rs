//! # ESC/POS Protocol
//!
//! Command builders and the frame encoder for the ESC/POS subset this
//! driver speaks: initialize, raster image, feed, cut, and real-time
//! status.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`commands`] | Control commands (init, feed, cut) |
//! | [`graphics`] | Raster bit-image command (GS v 0) |
//! | [`status`] | Real-time status requests and parsing (DLE EOT) |
//! | [`encoder`] | Bitmap + directives → ordered frame sequence |

pub mod commands;
pub mod encoder;
pub mod graphics;
pub mod status;

pub use encoder::{EncodeOptions, Frame, FrameKind, encode};
