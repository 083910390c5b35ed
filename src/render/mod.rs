//! # Rendering
//!
//! Image-to-bitmap conversion for thermal printing.
//!
//! ## Modules
//!
//! - [`dither`]: Bayer 8x8 ordered dithering and row packing
//! - [`raster`]: Rasterizer — source image to device-width [`Bitmap`]

pub mod dither;
pub mod raster;

pub use raster::{Bitmap, MonochromeMode, RasterOptions, load_image, rasterize};
