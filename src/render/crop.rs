use crate::foundation::core::{PixelBuffer, PixelRect, Rect};
use crate::foundation::error::CompositorResult;
use crate::render::composite::{draw_scaled_over, unpremultiply_in_place};

/// Tight bounding box of every pixel with nonzero alpha, or `None` if there are none.
pub fn opaque_bounds(buf: &PixelBuffer) -> Option<PixelRect> {
    let w = buf.width() as usize;
    if w == 0 {
        return None;
    }
    let (mut x0, mut y0) = (usize::MAX, usize::MAX);
    let (mut x1, mut y1) = (0usize, 0usize);
    for (y, row) in buf.data().chunks_exact(w * 4).enumerate() {
        let mut first = None;
        let mut last = 0usize;
        for (x, px) in row.chunks_exact(4).enumerate() {
            if px[3] != 0 {
                first.get_or_insert(x);
                last = x;
            }
        }
        if let Some(first) = first {
            x0 = x0.min(first);
            x1 = x1.max(last);
            y0 = y0.min(y);
            y1 = y1.max(y);
        }
    }
    if x0 == usize::MAX {
        return None;
    }
    Some(PixelRect::new(
        x0 as u32,
        y0 as u32,
        (x1 - x0 + 1) as u32,
        (y1 - y0 + 1) as u32,
    ))
}

/// Crop `src` to its opaque content, scale it uniformly to fit `canvas_w x canvas_h`, and
/// center it on a fresh transparent canvas of that size.
///
/// A fully transparent input is returned unchanged, as is one whose content already spans a
/// canvas of exactly the target size.
#[tracing::instrument(skip(src), fields(w = src.width(), h = src.height()))]
pub fn crop_to_content(
    src: PixelBuffer,
    canvas_w: u32,
    canvas_h: u32,
) -> CompositorResult<PixelBuffer> {
    let Some(bounds) = opaque_bounds(&src) else {
        tracing::debug!("no opaque pixels; nothing to crop");
        return Ok(src);
    };
    let full = PixelRect::new(0, 0, src.width(), src.height());
    if bounds == full && src.width() == canvas_w && src.height() == canvas_h {
        return Ok(src);
    }

    let (bw, bh) = (f64::from(bounds.width), f64::from(bounds.height));
    let (cw, ch) = (f64::from(canvas_w), f64::from(canvas_h));
    let scale = (cw / bw).min(ch / bh);
    let (dw, dh) = (bw * scale, bh * scale);
    let x0 = (cw - dw) / 2.0;
    let y0 = (ch - dh) / 2.0;
    let dest =
        PixelRect::from_rect_clipped(Rect::new(x0, y0, x0 + dw, y0 + dh), canvas_w, canvas_h);
    tracing::debug!(?bounds, ?dest, scale, "cropping to content");

    let mut out = PixelBuffer::transparent(canvas_w, canvas_h, "cropped canvas")?;
    draw_scaled_over(&mut out, &src, bounds, dest)?;
    drop(src);
    unpremultiply_in_place(out.data_mut());
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/crop.rs"]
mod tests;
