use crate::foundation::core::{PixelBuffer, PixelRect};
use crate::foundation::error::{CompositorError, CompositorResult};

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Convert straight RGBA8 to premultiplied in place.
pub fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255(u16::from(px[0]), a);
        px[1] = mul_div255(u16::from(px[1]), a);
        px[2] = mul_div255(u16::from(px[2]), a);
    }
}

/// Convert premultiplied RGBA8 back to straight alpha in place, rounding to nearest.
pub fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

/// Resample `src_rect` of a straight-alpha `src` into `dst_rect` of a premultiplied `dst`
/// with bilinear filtering, compositing source-over.
///
/// Samples are premultiplied before interpolation so transparent neighbours do not bleed
/// dark fringes into the edge.
pub fn draw_scaled_over(
    dst_premul: &mut PixelBuffer,
    src: &PixelBuffer,
    src_rect: PixelRect,
    dst_rect: PixelRect,
) -> CompositorResult<()> {
    if src_rect.is_empty() || dst_rect.is_empty() {
        return Ok(());
    }
    if src_rect.right() > src.width() || src_rect.bottom() > src.height() {
        return Err(CompositorError::validation(
            "draw source rect exceeds the source buffer",
        ));
    }

    let sx = f64::from(src_rect.width) / f64::from(dst_rect.width);
    let sy = f64::from(src_rect.height) / f64::from(dst_rect.height);
    let max_u = f64::from(src_rect.width - 1);
    let max_v = f64::from(src_rect.height - 1);

    let dst_w = dst_premul.width();
    let x_end = dst_rect.right().min(dst_w);
    let y_end = dst_rect.bottom().min(dst_premul.height());
    let src_data = src.data();
    let src_w = src.width() as usize;

    let fetch = |x: u32, y: u32| -> [f32; 4] {
        let i = (((src_rect.y + y) as usize) * src_w + (src_rect.x + x) as usize) * 4;
        let a = f32::from(src_data[i + 3]) / 255.0;
        [
            f32::from(src_data[i]) * a,
            f32::from(src_data[i + 1]) * a,
            f32::from(src_data[i + 2]) * a,
            f32::from(src_data[i + 3]),
        ]
    };

    let dst = dst_premul.data_mut();
    for y in dst_rect.y..y_end {
        let v = ((f64::from(y - dst_rect.y) + 0.5) * sy - 0.5).clamp(0.0, max_v);
        let y0 = v.floor() as u32;
        let y1 = (y0 + 1).min(src_rect.height - 1);
        let fy = (v - f64::from(y0)) as f32;

        for x in dst_rect.x..x_end {
            let u = ((f64::from(x - dst_rect.x) + 0.5) * sx - 0.5).clamp(0.0, max_u);
            let x0 = u.floor() as u32;
            let x1 = (x0 + 1).min(src_rect.width - 1);
            let fx = (u - f64::from(x0)) as f32;

            let p00 = fetch(x0, y0);
            let p10 = fetch(x1, y0);
            let p01 = fetch(x0, y1);
            let p11 = fetch(x1, y1);

            let mut sample = [0u8; 4];
            for c in 0..4 {
                let top = p00[c] + (p10[c] - p00[c]) * fx;
                let bot = p01[c] + (p11[c] - p01[c]) * fx;
                let val = top + (bot - top) * fy;
                sample[c] = val.round().clamp(0.0, 255.0) as u8;
            }
            // Premultiplied color can never exceed alpha.
            for c in 0..3 {
                sample[c] = sample[c].min(sample[3]);
            }

            let di = ((y as usize) * (dst_w as usize) + x as usize) * 4;
            let cur = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over(cur, sample));
        }
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
