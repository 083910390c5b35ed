//! # Pipeline Tests
//!
//! End-to-end tests through the public API: image in, ESC/POS bytes out.
//!
//! ## Test Coverage
//!
//! - **Wire format**: a rasterized card encodes to the exact command
//!   framing a printer expects (init, GS v 0 header, feed, cut).
//! - **Batch behavior**: sessions against the mock transport produce the
//!   documented per-card outcomes and frame traffic.
//!
//! Everything here runs offline; no hardware, no golden files.

use image::{DynamicImage, GrayImage, Luma};
use pretty_assertions::assert_eq;

use tarjeta::printer::PrinterConfig;
use tarjeta::protocol::{EncodeOptions, FrameKind, encode};
use tarjeta::render::{MonochromeMode, RasterOptions, rasterize};
use tarjeta::session::{CutPolicy, PrintSession};
use tarjeta::transport::mock::MockTransport;

/// A solid mid-gray card at twice the device width
fn card(width: u32, height: u32, luma: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([luma])))
}

#[test]
fn image_to_wire_bytes() {
    let config = PrinterConfig::generic_58mm();

    // Black card, threshold mode: every dot prints, so the payload is
    // fully predictable
    let image = card(768, 200, 0);
    let options = RasterOptions {
        mode: MonochromeMode::Threshold(128),
        ..RasterOptions::default()
    };
    let bitmap = rasterize(&image, config.width_dots, &options).unwrap();
    assert_eq!(bitmap.width_dots(), 384);
    assert_eq!(bitmap.height(), 100);

    let frames = encode(&bitmap, &config, &EncodeOptions::default()).unwrap();
    let kinds: Vec<FrameKind> = frames.iter().map(|f| f.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            FrameKind::Init,
            FrameKind::Raster { rows: 100 },
            FrameKind::Feed,
            FrameKind::Cut,
        ]
    );

    // ESC @
    assert_eq!(frames[0].bytes(), &[0x1B, 0x40]);

    // GS v 0, m=0, 48 bytes wide, 100 rows, all-black payload
    let raster = frames[1].bytes();
    assert_eq!(&raster[..8], &[0x1D, 0x76, 0x30, 0x00, 48, 0, 100, 0]);
    assert_eq!(raster.len(), 8 + 48 * 100);
    assert!(raster[8..].iter().all(|&b| b == 0xFF));

    // ESC d 2, then GS V 66 0
    assert_eq!(frames[2].bytes(), &[0x1B, 0x64, 2]);
    assert_eq!(frames[3].bytes(), &[0x1D, 0x56, 0x42, 0]);
}

#[test]
fn tall_card_splits_into_ordered_chunks() {
    let config = PrinterConfig::generic_58mm();
    let image = card(384, 600, 0);
    let options = RasterOptions {
        mode: MonochromeMode::Threshold(128),
        ..RasterOptions::default()
    };
    let bitmap = rasterize(&image, config.width_dots, &options).unwrap();
    let frames = encode(&bitmap, &config, &EncodeOptions::default()).unwrap();

    let chunk_rows: Vec<u16> = frames
        .iter()
        .filter_map(|f| match f.kind() {
            FrameKind::Raster { rows } => Some(rows),
            _ => None,
        })
        .collect();
    assert_eq!(chunk_rows, vec![256, 256, 88]);
    assert_eq!(chunk_rows.iter().map(|&r| r as u32).sum::<u32>(), 600);
}

#[test]
fn batch_of_three_through_mock_device() {
    let images = vec![card(768, 400, 60), card(768, 400, 60), card(768, 400, 60)];
    let mut mock = MockTransport::ready();

    let outcomes = PrintSession::new(&mut mock, PrinterConfig::generic_58mm())
        .print_batch(&images, CutPolicy::LastCardOnly);

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.success));

    // Exactly one connection, one close, one cut (last card only)
    assert_eq!(mock.connect_calls, 1);
    assert_eq!(mock.close_calls, 1);
    assert_eq!(mock.frames_of_kind(FrameKind::Cut), 1);

    // Every card starts with init, and the last write carries the cut
    assert!(
        mock.written
            .iter()
            .all(|kinds| kinds.first() == Some(&FrameKind::Init))
    );
    assert_eq!(mock.written[2].last(), Some(&FrameKind::Cut));
}

#[test]
fn diagnostics_report_shape() {
    let mut mock = MockTransport::absent();
    let report = tarjeta::diagnostics::collect(&mut mock);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["usbDeviceFound"], false);
    assert_eq!(json["printerExists"], false);
    assert_eq!(json["printerReady"], false);
    assert!(!json["errorMessages"].as_array().unwrap().is_empty());
}
