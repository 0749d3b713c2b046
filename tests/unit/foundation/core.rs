use super::*;

#[test]
fn transparent_buffer_is_zeroed() {
    let buf = PixelBuffer::transparent(3, 2, "test").unwrap();
    assert_eq!(buf.data().len(), 3 * 2 * 4);
    assert!(buf.data().iter().all(|&b| b == 0));
    assert_eq!(buf.coverage(), 0.0);
}

#[test]
fn from_raw_rejects_wrong_length() {
    assert!(PixelBuffer::from_raw(2, 2, vec![0u8; 15]).is_err());
    assert!(PixelBuffer::from_raw(2, 2, vec![0u8; 16]).is_ok());
}

#[test]
fn huge_allocation_reports_out_of_memory() {
    let err = try_alloc_zeroed(usize::MAX / 2, "huge").unwrap_err();
    assert!(matches!(err, CompositorError::OutOfMemory { what: "huge", .. }));
}

#[test]
fn alpha_mask_round_trip_keeps_rgb() {
    let data = vec![10, 20, 30, 40, 50, 60, 70, 80];
    let buf = PixelBuffer::from_raw(2, 1, data).unwrap();
    let mut mask = buf.alpha_mask().unwrap();
    assert_eq!(mask.data, vec![40, 80]);

    mask.data = vec![255, 0];
    let out = buf.with_alpha(&mask).unwrap();
    assert_eq!(out.data(), &[10, 20, 30, 255, 50, 60, 70, 0]);
}

#[test]
fn with_alpha_rejects_mismatched_mask() {
    let buf = PixelBuffer::transparent(2, 2, "test").unwrap();
    let mask = AlphaMask {
        width: 1,
        height: 1,
        data: vec![0],
    };
    assert!(buf.with_alpha(&mask).is_err());
}

#[test]
fn coverage_counts_nonzero_alpha() {
    let data = vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 255, 3, 3, 3, 0];
    let buf = PixelBuffer::from_raw(2, 2, data).unwrap();
    assert!((buf.coverage() - 0.5).abs() < 1e-6);
}

#[test]
fn pixel_rect_rounds_and_clips() {
    let r = PixelRect::from_rect_clipped(Rect::new(-3.2, 1.6, 10.4, 20.0), 8, 16);
    assert_eq!(r, PixelRect::new(0, 2, 8, 14));
    assert_eq!(r.right(), 8);
    assert_eq!(r.bottom(), 16);
    assert!(!r.is_empty());
    assert!(PixelRect::new(1, 1, 0, 5).is_empty());
}
