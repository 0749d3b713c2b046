use std::collections::VecDeque;

use crate::foundation::config::BackgroundOpts;
use crate::foundation::core::{PixelBuffer, try_alloc_zeroed};
use crate::foundation::error::{CompositorError, CompositorResult};

/// Diagnostics produced by [`remove_background`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RemovalStats {
    /// Background color estimated from the corner patches.
    pub background_rgb: [u8; 3],
    /// Number of pixels classified as border-connected background.
    pub cleared_pixels: usize,
    /// Fraction of non-transparent pixels in the cutout (before any revert).
    pub coverage: f32,
    /// `true` when at least one background pixel was cleared; `false` when nothing matched
    /// or the original was returned.
    pub removed: bool,
    /// Coverage sits between the hard and soft floors.
    pub low_coverage: bool,
}

/// Output of [`remove_background`]: the cutout (or the untouched original) plus stats.
#[derive(Debug)]
pub struct BackgroundRemoval {
    /// Resulting pixels.
    pub buffer: PixelBuffer,
    /// What happened.
    pub stats: RemovalStats,
}

/// Clear every border-connected pixel that matches the light background sampled from the
/// corners. Background-colored regions enclosed by the garment are kept.
///
/// If nothing is cleared, or the result would leave less than `opts.hard_coverage_floor` of the
/// image visible, the input is returned unchanged and `stats.removed` is `false`.
#[tracing::instrument(skip_all, fields(w = src.width(), h = src.height()))]
pub fn remove_background(
    mut src: PixelBuffer,
    opts: &BackgroundOpts,
) -> CompositorResult<BackgroundRemoval> {
    let (w, h) = (src.width(), src.height());
    if w == 0 || h == 0 {
        return Err(CompositorError::validation(
            "background removal needs a non-empty image",
        ));
    }

    let bg = estimate_background(&src, opts.corner_sample_size);
    let background = flood_from_border(&src, bg, opts)?;

    let total = src.pixel_count();
    let cleared = background.iter().filter(|&&b| b != 0).count();
    let kept = src
        .data()
        .chunks_exact(4)
        .zip(background.iter())
        .filter(|(px, b)| **b == 0 && px[3] != 0)
        .count();
    let coverage = kept as f32 / total as f32;

    if coverage < opts.hard_coverage_floor {
        tracing::warn!(
            coverage,
            floor = opts.hard_coverage_floor,
            "background removal would erase the garment; keeping original"
        );
        return Ok(BackgroundRemoval {
            buffer: src,
            stats: RemovalStats {
                background_rgb: bg,
                cleared_pixels: cleared,
                coverage,
                removed: false,
                low_coverage: true,
            },
        });
    }

    if cleared == 0 {
        tracing::debug!(?bg, "no border-connected background found");
        return Ok(BackgroundRemoval {
            buffer: src,
            stats: RemovalStats {
                background_rgb: bg,
                cleared_pixels: 0,
                coverage,
                removed: false,
                low_coverage: coverage < opts.soft_coverage_floor,
            },
        });
    }

    let low_coverage = coverage < opts.soft_coverage_floor;
    if low_coverage {
        tracing::warn!(
            coverage,
            floor = opts.soft_coverage_floor,
            "low garment coverage after background removal"
        );
    }

    for (px, &b) in src.data_mut().chunks_exact_mut(4).zip(background.iter()) {
        if b != 0 {
            px.copy_from_slice(&[0, 0, 0, 0]);
        }
    }
    drop(background);

    tracing::debug!(?bg, cleared, coverage, "background removed");
    Ok(BackgroundRemoval {
        buffer: src,
        stats: RemovalStats {
            background_rgb: bg,
            cleared_pixels: cleared,
            coverage,
            removed: true,
            low_coverage,
        },
    })
}

/// Average RGB of the four corner patches, ignoring fully transparent samples.
pub fn estimate_background(src: &PixelBuffer, corner_sample_size: u32) -> [u8; 3] {
    let (w, h) = (src.width(), src.height());
    let size = corner_sample_size.min(w / 10).min(h / 10).max(1);
    let origins = [
        (0, 0),
        (w - size, 0),
        (0, h - size),
        (w - size, h - size),
    ];

    let mut acc = [0u64; 3];
    let mut n = 0u64;
    for (ox, oy) in origins {
        for y in oy..oy + size {
            for x in ox..ox + size {
                let px = src.pixel(x, y);
                if px[3] == 0 {
                    continue;
                }
                for c in 0..3 {
                    acc[c] += u64::from(px[c]);
                }
                n += 1;
            }
        }
    }
    if n == 0 {
        return [255, 255, 255];
    }
    [
        ((acc[0] + n / 2) / n) as u8,
        ((acc[1] + n / 2) / n) as u8,
        ((acc[2] + n / 2) / n) as u8,
    ]
}

fn is_candidate(px: &[u8], bg: [u8; 3], opts: &BackgroundOpts) -> bool {
    if px[3] == 0 {
        return true;
    }
    let mut dist = 0u32;
    for c in 0..3 {
        let d = i32::from(px[c]) - i32::from(bg[c]);
        dist += (d * d) as u32;
    }
    let brightness = (u32::from(px[0]) + u32::from(px[1]) + u32::from(px[2])) / 3;
    dist < opts.distance_sq_threshold && brightness > u32::from(opts.brightness_threshold)
}

const CANDIDATE: u8 = 1;
const BACKGROUND: u8 = 2;

fn visit(i: usize, state: &mut [u8], queue: &mut VecDeque<usize>) {
    if state[i] == CANDIDATE {
        state[i] = BACKGROUND;
        queue.push_back(i);
    }
}

/// 4-connected BFS over candidate pixels seeded from the image border.
/// Returns one byte per pixel, nonzero for background.
fn flood_from_border(
    src: &PixelBuffer,
    bg: [u8; 3],
    opts: &BackgroundOpts,
) -> CompositorResult<Vec<u8>> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let mut state = try_alloc_zeroed(w * h, "background mask")?;
    for (s, px) in state.iter_mut().zip(src.data().chunks_exact(4)) {
        if is_candidate(px, bg, opts) {
            *s = CANDIDATE;
        }
    }

    let mut queue = VecDeque::<usize>::new();
    for x in 0..w {
        visit(x, &mut state, &mut queue);
        visit((h - 1) * w + x, &mut state, &mut queue);
    }
    for y in 0..h {
        visit(y * w, &mut state, &mut queue);
        visit(y * w + w - 1, &mut state, &mut queue);
    }

    while let Some(i) = queue.pop_front() {
        let (x, y) = (i % w, i / w);
        if x > 0 {
            visit(i - 1, &mut state, &mut queue);
        }
        if x + 1 < w {
            visit(i + 1, &mut state, &mut queue);
        }
        if y > 0 {
            visit(i - w, &mut state, &mut queue);
        }
        if y + 1 < h {
            visit(i + w, &mut state, &mut queue);
        }
    }

    for s in &mut state {
        *s = u8::from(*s == BACKGROUND);
    }
    Ok(state)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/background.rs"]
mod tests;
