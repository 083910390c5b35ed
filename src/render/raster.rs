//! # Rasterizer
//!
//! Converts an arbitrary-resolution source image into a 1-bit [`Bitmap`]
//! sized to the printer's fixed dot width.
//!
//! ## Pipeline
//!
//! ```text
//! image ──► scale to target width ──► grayscale ──► 1-bit ──► packed rows
//!           (aspect preserved)                     (dither or
//!                                                   threshold)
//! ```
//!
//! Rasterization is a pure function of its inputs: the same image and
//! options always yield a byte-identical bitmap. Both conversion modes
//! are deterministic, and the scaler uses a fixed filter.

use image::DynamicImage;
use image::imageops::FilterType;

use crate::error::TarjetaError;
use crate::render::dither;

/// # Monochrome Bitmap
///
/// A 1-bit image at exactly the device raster width, rows packed
/// MSB-first into `ceil(width/8)` bytes with blank-bit padding.
///
/// ## Invariants
///
/// - `width_dots` equals the device raster width it was built for
/// - `height > 0`
/// - `data.len() == row_bytes() * height`
///
/// The fields are private so the invariants hold for the bitmap's
/// lifetime; the encoder relies on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width_dots: u16,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// Build a bitmap from packed row data.
    ///
    /// Fails with [`TarjetaError::Encoding`] if the data length does not
    /// match `ceil(width/8) * height` or the height is zero.
    pub fn from_packed(width_dots: u16, height: u32, data: Vec<u8>) -> Result<Self, TarjetaError> {
        if height == 0 {
            return Err(TarjetaError::Encoding(
                "Bitmap height must be > 0".to_string(),
            ));
        }
        let row_bytes = (width_dots as usize).div_ceil(8);
        let expected = row_bytes * height as usize;
        if data.len() != expected {
            return Err(TarjetaError::Encoding(format!(
                "Bitmap data length {} does not match {} bytes/row × {} rows = {}",
                data.len(),
                row_bytes,
                height,
                expected
            )));
        }
        Ok(Self {
            width_dots,
            height,
            data,
        })
    }

    /// Width in dots
    #[inline]
    pub fn width_dots(&self) -> u16 {
        self.width_dots
    }

    /// Height in dots (row count)
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per packed row
    #[inline]
    pub fn row_bytes(&self) -> usize {
        (self.width_dots as usize).div_ceil(8)
    }

    /// All packed row data, row-major
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// A contiguous range of packed rows `[start, end)`
    pub fn rows(&self, start: u32, end: u32) -> &[u8] {
        let rb = self.row_bytes();
        &self.data[start as usize * rb..end as usize * rb]
    }
}

/// How grayscale becomes 1-bit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonochromeMode {
    /// Bayer 8x8 ordered dithering (default) — preserves midtones
    Dither,
    /// Fixed luminance threshold: luma below the cutoff prints black.
    /// Crisper for text-heavy cards, loses midtones.
    Threshold(u8),
}

/// Rasterization options
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    /// 1-bit conversion mode
    pub mode: MonochromeMode,
    /// Maximum upscale factor before refusing the image
    pub max_upscale: f32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            mode: MonochromeMode::Dither,
            max_upscale: 2.0,
        }
    }
}

/// Rasterize an image to a device-width 1-bit bitmap.
///
/// Scales the image proportionally so its width equals `target_width`
/// (height follows the aspect ratio, within one dot), converts to 1-bit
/// with the selected deterministic mode, and packs each row MSB-first.
///
/// ## Errors
///
/// - [`TarjetaError::ImageTooWide`] if reaching `target_width` would
///   upscale the source beyond `options.max_upscale` (guards against
///   unbounded memory growth from degenerate inputs)
/// - [`TarjetaError::UnsupportedFormat`] if the image has a zero
///   dimension
pub fn rasterize(
    image: &DynamicImage,
    target_width: u16,
    options: &RasterOptions,
) -> Result<Bitmap, TarjetaError> {
    let (src_w, src_h) = (image.width(), image.height());
    if src_w == 0 || src_h == 0 {
        return Err(TarjetaError::UnsupportedFormat(format!(
            "image has zero dimension ({}x{})",
            src_w, src_h
        )));
    }

    let factor = target_width as f32 / src_w as f32;
    if factor > options.max_upscale {
        return Err(TarjetaError::ImageTooWide {
            source_width: src_w,
            target_width,
            factor,
            max_factor: options.max_upscale,
        });
    }

    // Proportional height, at least one row
    let target_height =
        ((src_h as f64 * target_width as f64 / src_w as f64).round() as u32).max(1);

    // Triangle is a fixed linear filter: cheap and deterministic
    let scaled = image
        .resize_exact(target_width as u32, target_height, FilterType::Triangle)
        .to_luma8();

    let row_bytes = (target_width as usize).div_ceil(8);
    let mut data = Vec::with_capacity(row_bytes * target_height as usize);
    let mut row_pixels = vec![false; target_width as usize];

    for y in 0..target_height {
        for x in 0..target_width as u32 {
            let luma = scaled.get_pixel(x, y).0[0];
            row_pixels[x as usize] = match options.mode {
                MonochromeMode::Threshold(cutoff) => luma < cutoff,
                MonochromeMode::Dither => {
                    let darkness = 1.0 - luma as f32 / 255.0;
                    dither::should_print(x as usize, y as usize, darkness)
                }
            };
        }
        data.extend(dither::pack_row(&row_pixels));
    }

    Bitmap::from_packed(target_width, target_height, data)
}

/// Decode an image file for rasterization.
///
/// Fails with [`TarjetaError::UnsupportedFormat`] if the file cannot be
/// decoded into pixel data.
pub fn load_image(path: impl AsRef<std::path::Path>) -> Result<DynamicImage, TarjetaError> {
    let path = path.as_ref();
    image::open(path)
        .map_err(|e| TarjetaError::UnsupportedFormat(format!("{}: {}", path.display(), e)))
}

// ============================================================================
// TESTS
// ============================================================================
