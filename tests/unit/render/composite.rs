use super::*;

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [0, 0, 0, 0];
    assert_eq!(over(dst, src), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src), src);
}

#[test]
fn over_dst_transparent_returns_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src), src);
}

#[test]
fn premultiply_round_trip_is_exact_for_opaque_and_clear() {
    let mut px = vec![12, 34, 56, 255, 90, 80, 70, 0];
    premultiply_in_place(&mut px);
    assert_eq!(px, vec![12, 34, 56, 255, 0, 0, 0, 0]);
    unpremultiply_in_place(&mut px);
    assert_eq!(px, vec![12, 34, 56, 255, 0, 0, 0, 0]);
}

#[test]
fn unpremultiply_restores_half_alpha_within_one() {
    let mut px = vec![200, 100, 50, 128];
    premultiply_in_place(&mut px);
    unpremultiply_in_place(&mut px);
    assert!((i32::from(px[0]) - 200).abs() <= 1);
    assert!((i32::from(px[1]) - 100).abs() <= 1);
    assert!((i32::from(px[2]) - 50).abs() <= 1);
    assert_eq!(px[3], 128);
}

#[test]
fn identity_scale_copies_pixels() {
    let src = PixelBuffer::from_raw(
        2,
        2,
        vec![
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 9, 9, 9, 255,
        ],
    )
    .unwrap();
    let mut dst = PixelBuffer::transparent(4, 4, "test").unwrap();
    let full = PixelRect::new(0, 0, 2, 2);
    draw_scaled_over(&mut dst, &src, full, PixelRect::new(1, 1, 2, 2)).unwrap();

    assert_eq!(dst.pixel(1, 1), [255, 0, 0, 255]);
    assert_eq!(dst.pixel(2, 1), [0, 255, 0, 255]);
    assert_eq!(dst.pixel(1, 2), [0, 0, 255, 255]);
    assert_eq!(dst.pixel(2, 2), [9, 9, 9, 255]);
    assert_eq!(dst.pixel(0, 0), [0, 0, 0, 0]);
    assert_eq!(dst.pixel(3, 3), [0, 0, 0, 0]);
}

#[test]
fn upscale_fills_destination_rect() {
    let src = PixelBuffer::from_raw(1, 1, vec![40, 50, 60, 255]).unwrap();
    let mut dst = PixelBuffer::transparent(8, 8, "test").unwrap();
    draw_scaled_over(
        &mut dst,
        &src,
        PixelRect::new(0, 0, 1, 1),
        PixelRect::new(2, 2, 4, 4),
    )
    .unwrap();

    let opaque = dst.data().chunks_exact(4).filter(|p| p[3] == 255).count();
    assert_eq!(opaque, 16);
    assert_eq!(dst.pixel(5, 5), [40, 50, 60, 255]);
}

#[test]
fn transparent_neighbours_do_not_darken_edges() {
    // White opaque pixel next to a fully transparent one.
    let src = PixelBuffer::from_raw(2, 1, vec![255, 255, 255, 255, 0, 0, 0, 0]).unwrap();
    let mut dst = PixelBuffer::transparent(8, 1, "test").unwrap();
    draw_scaled_over(
        &mut dst,
        &src,
        PixelRect::new(0, 0, 2, 1),
        PixelRect::new(0, 0, 8, 1),
    )
    .unwrap();

    let mut straight = dst.into_raw();
    unpremultiply_in_place(&mut straight);
    for px in straight.chunks_exact(4).filter(|p| p[3] > 0) {
        assert!(px[0] >= 250, "edge pixel darkened: {px:?}");
    }
}

#[test]
fn rejects_source_rect_out_of_bounds() {
    let src = PixelBuffer::transparent(2, 2, "test").unwrap();
    let mut dst = PixelBuffer::transparent(2, 2, "test").unwrap();
    assert!(
        draw_scaled_over(
            &mut dst,
            &src,
            PixelRect::new(1, 1, 2, 2),
            PixelRect::new(0, 0, 2, 2)
        )
        .is_err()
    );
}
