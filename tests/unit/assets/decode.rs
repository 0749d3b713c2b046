use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn sample_factor_rounds_down_to_power_of_two() {
    assert_eq!(sample_factor(100, 50, 1024), 1);
    assert_eq!(sample_factor(1024, 1024, 1024), 1);
    assert_eq!(sample_factor(1500, 800, 1024), 1);
    assert_eq!(sample_factor(2048, 100, 1024), 2);
    assert_eq!(sample_factor(3000, 4000, 1024), 2);
    assert_eq!(sample_factor(4096, 4096, 1024), 4);
    assert_eq!(sample_factor(100, 7000, 1024), 4);
    assert_eq!(sample_factor(9000, 9000, 1024), 8);
}

#[test]
fn decode_small_png_keeps_straight_rgba() {
    let bytes = png_bytes(3, 2, [100, 50, 200, 128]);
    let buf = decode_image_bytes(&bytes, 1024, 64 * 1024 * 1024).unwrap();
    assert_eq!((buf.width(), buf.height()), (3, 2));
    assert_eq!(buf.pixel(2, 1), [100, 50, 200, 128]);
}

#[test]
fn decode_bounds_larger_dimension() {
    let bytes = png_bytes(300, 120, [10, 20, 30, 255]);
    let buf = decode_image_bytes(&bytes, 64, 64 * 1024 * 1024).unwrap();
    assert!(buf.width().max(buf.height()) <= 64);
    assert_eq!(buf.width(), 64);
    assert_eq!(buf.pixel(0, 0), [10, 20, 30, 255]);
}

#[test]
fn downsample_averages_blocks() {
    let data = vec![
        0, 0, 0, 255, 100, 100, 100, 255, //
        200, 200, 200, 255, 100, 100, 100, 255,
    ];
    let src = PixelBuffer::from_raw(2, 2, data).unwrap();
    let out = box_downsample(src, 2).unwrap();
    assert_eq!((out.width(), out.height()), (1, 1));
    assert_eq!(out.pixel(0, 0), [100, 100, 100, 255]);
}

#[test]
fn garbage_bytes_are_decode_failures() {
    let err = decode_image_bytes(b"definitely not an image", 64, 1024 * 1024).unwrap_err();
    assert!(matches!(err, CompositorError::DecodeFailure { .. }));
}

#[test]
fn missing_path_is_not_found() {
    let err = load_image(Path::new("/nonexistent/outfit/top.png"), 64, 1024 * 1024).unwrap_err();
    assert!(matches!(err, CompositorError::NotFound { .. }));
}

#[test]
fn tiny_decode_limit_reports_out_of_memory() {
    let bytes = png_bytes(256, 256, [1, 2, 3, 255]);
    let err = decode_image_bytes(&bytes, 1024, 16).unwrap_err();
    assert!(matches!(err, CompositorError::OutOfMemory { .. }));
}

#[test]
fn oversized_source_is_rejected_from_its_header() {
    let bytes = png_bytes(64, 64, [9, 9, 9, 255]);
    let rgba = 64 * 64 * 4;

    let err = decode_image_bytes(&bytes, 32, rgba as u64 - 1).unwrap_err();
    assert!(
        matches!(err, CompositorError::OutOfMemory { bytes, .. } if bytes == rgba),
        "{err:?}"
    );
    assert!(!err.is_item_recoverable());

    let buf = decode_image_bytes(&bytes, 32, 4 * rgba as u64).unwrap();
    assert_eq!((buf.width(), buf.height()), (32, 32));
}
