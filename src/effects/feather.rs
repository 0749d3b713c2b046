use crate::foundation::core::{PixelBuffer, try_alloc_zeroed};
use crate::foundation::error::CompositorResult;

/// Soften alpha edges with a separable box blur of `radius`; RGB is left untouched.
///
/// Near the image border only in-bounds samples are averaged, so a fully opaque image stays
/// fully opaque.
#[tracing::instrument(skip(src), fields(w = src.width(), h = src.height()))]
pub fn feather_alpha(src: PixelBuffer, radius: u32) -> CompositorResult<PixelBuffer> {
    if radius == 0 || src.pixel_count() == 0 {
        return Ok(src);
    }

    let mut mask = src.alpha_mask()?;
    let (w, h) = (mask.width as usize, mask.height as usize);
    // Once the window spans a whole row and column a wider one averages the same samples.
    let radius = (radius as usize).min(w.max(h));
    let mut tmp = try_alloc_zeroed(w * h, "feather scratch")?;

    horizontal_pass(&mask.data, &mut tmp, w, h, radius);
    vertical_pass(&tmp, &mut mask.data, w, h, radius);
    drop(tmp);

    src.with_alpha(&mask)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, r: usize) {
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = x.saturating_sub(r);
            let hi = (x + r).min(w - 1);
            let sum: u32 = row[lo..=hi].iter().map(|&a| u32::from(a)).sum();
            dst[y * w + x] = avg(sum, (hi - lo + 1) as u32);
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, r: usize) {
    for y in 0..h {
        let lo = y.saturating_sub(r);
        let hi = (y + r).min(h - 1);
        let n = (hi - lo + 1) as u32;
        for x in 0..w {
            let mut sum = 0u32;
            for sy in lo..=hi {
                sum += u32::from(src[sy * w + x]);
            }
            dst[y * w + x] = avg(sum, n);
        }
    }
}

fn avg(sum: u32, n: u32) -> u8 {
    ((sum + n / 2) / n).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/feather.rs"]
mod tests;
