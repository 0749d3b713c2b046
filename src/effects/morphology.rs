use std::collections::VecDeque;

use crate::foundation::core::{AlphaMask, PixelBuffer, try_alloc_zeroed};
use crate::foundation::error::{CompositorError, CompositorResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Extreme {
    Max,
    Min,
}

impl Extreme {
    fn identity(self) -> u8 {
        match self {
            Extreme::Max => 0,
            Extreme::Min => 255,
        }
    }

    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Extreme::Max => a.max(b),
            Extreme::Min => a.min(b),
        }
    }

    // `true` when `incoming` makes `queued` irrelevant for the rest of the window.
    fn dominates(self, incoming: u8, queued: u8) -> bool {
        match self {
            Extreme::Max => incoming >= queued,
            Extreme::Min => incoming <= queued,
        }
    }
}

/// Half-widths of the horizontal spans making up a disc of `radius`, indexed by `dy + radius`.
pub fn disc_spans(radius: u32) -> CompositorResult<Vec<u32>> {
    let len = usize::try_from(2 * u64::from(radius) + 1)
        .map_err(|_| CompositorError::validation(format!("disc radius {radius} is too large")))?;
    let mut spans = Vec::new();
    spans
        .try_reserve_exact(len)
        .map_err(|_| CompositorError::out_of_memory("disc spans", len.saturating_mul(4)))?;
    let r = u64::from(radius);
    spans.extend((0..len as u64).map(|k| {
        let dy = k.abs_diff(r);
        // `r * r` fits in u64 for any u32 radius; the root never exceeds `r`.
        (r * r - dy * dy).isqrt() as u32
    }));
    Ok(spans)
}

// A disc whose radius reaches `w + h` already covers every pixel of a `w x h` mask from any
// center, so larger radii give the same result.
fn effective_radius(radius: u32, width: u32, height: u32) -> u32 {
    let reach = u64::from(width) + u64::from(height);
    u32::try_from(reach).map_or(radius, |reach| radius.min(reach))
}

/// Morphological closing of the alpha channel: dilation then erosion with a disc of `radius`.
///
/// Bridges transparent gaps narrower than roughly `2 * radius` between separately drawn
/// cutouts. RGB is not modified.
#[tracing::instrument(skip(canvas), fields(w = canvas.width(), h = canvas.height()))]
pub fn close_silhouette(canvas: PixelBuffer, radius: u32) -> CompositorResult<PixelBuffer> {
    if radius == 0 || canvas.pixel_count() == 0 {
        return Ok(canvas);
    }
    let mask = canvas.alpha_mask()?;
    let dilated = morph(&mask, radius, Extreme::Max)?;
    drop(mask);
    let closed = morph(&dilated, radius, Extreme::Min)?;
    drop(dilated);
    canvas.with_alpha(&closed)
}

/// Grayscale dilation (max over the disc). Out-of-bounds samples are ignored.
pub fn dilate(mask: &AlphaMask, radius: u32) -> CompositorResult<AlphaMask> {
    morph(mask, radius, Extreme::Max)
}

/// Grayscale erosion (min over the disc). Out-of-bounds samples are ignored.
pub fn erode(mask: &AlphaMask, radius: u32) -> CompositorResult<AlphaMask> {
    morph(mask, radius, Extreme::Min)
}

fn morph(mask: &AlphaMask, radius: u32, op: Extreme) -> CompositorResult<AlphaMask> {
    let (w, h) = (mask.width as usize, mask.height as usize);
    let mut out = try_alloc_zeroed(w * h, "morphology output")?;
    if w == 0 || h == 0 {
        return Ok(AlphaMask {
            width: mask.width,
            height: mask.height,
            data: out,
        });
    }

    let radius = effective_radius(radius, mask.width, mask.height);
    let spans = disc_spans(radius)?;
    let r = radius as isize;
    let mut span_row = vec![0u8; w];
    let mut deque = VecDeque::<usize>::with_capacity(w);

    for y in 0..h {
        let out_row = &mut out[y * w..(y + 1) * w];
        out_row.fill(op.identity());
        for (k, &half) in spans.iter().enumerate() {
            let sy = y as isize + k as isize - r;
            if sy < 0 || sy >= h as isize {
                continue;
            }
            let sy = sy as usize;
            sliding_extreme(
                &mask.data[sy * w..(sy + 1) * w],
                half as usize,
                op,
                &mut deque,
                &mut span_row,
            );
            for (o, &s) in out_row.iter_mut().zip(span_row.iter()) {
                *o = op.pick(*o, s);
            }
        }
    }

    Ok(AlphaMask {
        width: mask.width,
        height: mask.height,
        data: out,
    })
}

/// `out[x] = extreme(row[x - half ..= x + half])`, window clipped to the row.
fn sliding_extreme(
    row: &[u8],
    half: usize,
    op: Extreme,
    deque: &mut VecDeque<usize>,
    out: &mut [u8],
) {
    let w = row.len();
    deque.clear();
    let mut next = 0usize;
    for (x, slot) in out.iter_mut().enumerate().take(w) {
        let hi = (x + half).min(w - 1);
        while next <= hi {
            while let Some(&back) = deque.back() {
                if op.dominates(row[next], row[back]) {
                    deque.pop_back();
                } else {
                    break;
                }
            }
            deque.push_back(next);
            next += 1;
        }
        let lo = x.saturating_sub(half);
        while let Some(&front) = deque.front() {
            if front < lo {
                deque.pop_front();
            } else {
                break;
            }
        }
        *slot = deque.front().map_or(op.identity(), |&i| row[i]);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/morphology.rs"]
mod tests;
