//! # Bayer 8x8 Ordered Dithering
//!
//! This module implements ordered dithering using a Bayer matrix to convert
//! continuous-tone (grayscale) images to binary (black/white) output
//! suitable for thermal printers.
//!
//! ## What is Dithering?
//!
//! Dithering simulates grayscale on a device that can only print black or
//! white. By varying the density of black dots, we create the illusion of
//! different gray levels.
//!
//! ```text
//! Grayscale:    White    Light    Medium    Dark    Black
//!               ░░░░░░   ░░▒░░░   ░▒░▒░▒   ▒▓▒▓▒▓   ██████
//! ```
//!
//! ## Ordered Dithering
//!
//! For each pixel position (x, y):
//!
//! 1. Look up a threshold value from the matrix using (x mod 8, y mod 8)
//! 2. Compare the pixel's darkness to the threshold
//! 3. If darkness > threshold, print black; otherwise leave white
//!
//! Ordered dithering is **deterministic** — the same input always yields
//! the same output — which is the property the rasterizer guarantees to
//! its callers. Error-diffusion methods trade that for quality; this
//! driver does not.

/// Bayer 8x8 dithering matrix
///
/// Values range from 0-63, arranged so activation spreads evenly across
/// the tile as intensity rises, producing a pleasing halftone screen.
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Get the dithering threshold for a pixel position.
///
/// Returns a value strictly inside (0, 1):
///
/// ```text
/// matrix_value = BAYER8[y mod 8][x mod 8]
/// threshold = (matrix_value + 0.5) / 64.0
/// ```
///
/// Adding 0.5 before dividing ensures full black (1.0) always prints and
/// full white (0.0) never does.
#[inline]
pub fn threshold(x: usize, y: usize) -> f32 {
    let matrix_value = BAYER8[y & 7][x & 7];
    (matrix_value as f32 + 0.5) / 64.0
}

/// Determine if a dot should be printed at the given position.
///
/// `darkness` is 0.0 = white, 1.0 = black.
///
/// ## Example
///
/// ```
/// use tarjeta::render::dither::should_print;
///
/// // Full black always prints
/// assert!(should_print(0, 0, 1.0));
///
/// // Full white never prints
/// assert!(!should_print(0, 0, 0.0));
/// ```
#[inline]
pub fn should_print(x: usize, y: usize, darkness: f32) -> bool {
    darkness > threshold(x, y)
}

/// Pack a row of boolean pixel values into bytes.
///
/// ## Bit Packing
///
/// - Bit 7 (MSB) = leftmost pixel
/// - Bit 0 (LSB) = rightmost pixel
/// - 1 = black (print dot), 0 = white (no dot)
///
/// ## Padding
///
/// If the row length is not a multiple of 8, the last byte is padded
/// with zeros (blank) on the right.
///
/// ## Example
///
/// ```
/// use tarjeta::render::dither::pack_row;
///
/// // 8 pixels pack into 1 byte
/// let row = vec![true, true, true, true, false, false, false, false];
/// assert_eq!(pack_row(&row), vec![0xF0]); // 11110000
///
/// // 12 pixels pack into 2 bytes (4 bits padding)
/// let row = vec![true; 12];
/// assert_eq!(pack_row(&row), vec![0xFF, 0xF0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let num_bytes = pixels.len().div_ceil(8);
    let mut bytes = vec![0u8; num_bytes];

    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            let byte_idx = i / 8;
            let bit_idx = 7 - (i % 8); // MSB first
            bytes[byte_idx] |= 1 << bit_idx;
        }
    }

    bytes
}

// ============================================================================
// TESTS
// ============================================================================
