use std::{
    io::{BufRead, Cursor, Seek},
    path::{Path, PathBuf},
};

use image::{ImageError, ImageReader, imageops::FilterType};

use crate::foundation::core::{PixelBuffer, try_alloc_zeroed};
use crate::foundation::error::{CompositorError, CompositorResult};

/// Power-of-two downsampling factor that brings the larger of `width`/`height` close to
/// `max_dim` without going below it: `largest / max_dim` rounded down to a power of two,
/// minimum 1.
pub fn sample_factor(width: u32, height: u32, max_dim: u32) -> u32 {
    let largest = width.max(height);
    if max_dim == 0 || largest <= max_dim {
        return 1;
    }
    let ratio = largest / max_dim;
    if ratio <= 1 {
        return 1;
    }
    1u32 << (31 - ratio.leading_zeros())
}

/// Decode the image at `path` into straight RGBA8 whose larger dimension is at most `max_dim`.
///
/// The header is read first: a source whose RGBA8 pixels would exceed `max_decode_bytes` is
/// rejected with [`CompositorError::OutOfMemory`] before any pixel data is allocated. The same
/// cap bounds the decoder's own allocations.
#[tracing::instrument(skip(max_decode_bytes))]
pub fn load_image(
    path: &Path,
    max_dim: u32,
    max_decode_bytes: u64,
) -> CompositorResult<PixelBuffer> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Err(CompositorError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CompositorError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(CompositorError::decode(path, e.to_string())),
    }

    let open = || ImageReader::open(path).and_then(|r| r.with_guessed_format());
    decode_bounded(open, path, max_dim, max_decode_bytes)
}

/// Decode encoded image bytes; same bounds as [`load_image`].
pub fn decode_image_bytes(
    bytes: &[u8],
    max_dim: u32,
    max_decode_bytes: u64,
) -> CompositorResult<PixelBuffer> {
    let open = || ImageReader::new(Cursor::new(bytes)).with_guessed_format();
    decode_bounded(open, Path::new("<memory>"), max_dim, max_decode_bytes)
}

fn decode_bounded<R, F>(
    open: F,
    label: &Path,
    max_dim: u32,
    max_decode_bytes: u64,
) -> CompositorResult<PixelBuffer>
where
    R: BufRead + Seek,
    F: Fn() -> std::io::Result<ImageReader<R>>,
{
    let reader = |what: &str| {
        open().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CompositorError::NotFound {
                path: label.to_path_buf(),
            },
            _ => CompositorError::decode(label, format!("{what}: {e}")),
        })
    };

    let (w, h) = reader("read header")?
        .into_dimensions()
        .map_err(|e| map_image_error(e, label, max_decode_bytes))?;
    if w == 0 || h == 0 {
        return Err(CompositorError::decode(label, "image has no pixels"));
    }
    let rgba_bytes = u64::from(w) * u64::from(h) * 4;
    if rgba_bytes > max_decode_bytes {
        tracing::warn!(
            src_w = w,
            src_h = h,
            rgba_bytes,
            max_decode_bytes,
            "source image exceeds the decode budget"
        );
        return Err(CompositorError::out_of_memory(
            "decoded source image",
            usize::try_from(rgba_bytes).unwrap_or(usize::MAX),
        ));
    }

    let mut reader = reader("open")?;
    let mut limits = image::Limits::default();
    limits.max_alloc = Some(max_decode_bytes);
    reader.limits(limits);

    let img = reader
        .decode()
        .map_err(|e| map_image_error(e, label, max_decode_bytes))?;
    let rgba = img.into_rgba8();
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return Err(CompositorError::decode(label, "image has no pixels"));
    }

    let factor = sample_factor(w, h, max_dim);
    let buf = PixelBuffer::from_rgba_image(rgba);
    let buf = if factor > 1 {
        box_downsample(buf, factor)?
    } else {
        buf
    };

    let out = fit_within(buf, max_dim)?;
    tracing::debug!(
        src_w = w,
        src_h = h,
        factor,
        out_w = out.width(),
        out_h = out.height(),
        "decoded source image"
    );
    Ok(out)
}

fn map_image_error(e: ImageError, label: &Path, max_decode_bytes: u64) -> CompositorError {
    match e {
        ImageError::Limits(_) => CompositorError::out_of_memory(
            "decoded source image",
            usize::try_from(max_decode_bytes).unwrap_or(usize::MAX),
        ),
        ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            CompositorError::NotFound {
                path: PathBuf::from(label),
            }
        }
        other => CompositorError::decode(label, other.to_string()),
    }
}

/// Average `factor x factor` blocks; trailing partial blocks are dropped like an
/// integer-subsampling decoder would.
fn box_downsample(src: PixelBuffer, factor: u32) -> CompositorResult<PixelBuffer> {
    let out_w = (src.width() / factor).max(1);
    let out_h = (src.height() / factor).max(1);
    let fw = factor.min(src.width());
    let fh = factor.min(src.height());
    let mut out = try_alloc_zeroed((out_w as usize) * (out_h as usize) * 4, "downsampled source")?;

    let src_w = src.width() as usize;
    let data = src.data();
    let n = fw * fh;
    for oy in 0..out_h {
        for ox in 0..out_w {
            let mut acc = [0u32; 4];
            for dy in 0..fh {
                let row = ((oy * fh + dy) as usize) * src_w;
                for dx in 0..fw {
                    let i = (row + (ox * fw + dx) as usize) * 4;
                    for c in 0..4 {
                        acc[c] += u32::from(data[i + c]);
                    }
                }
            }
            let o = ((oy * out_w + ox) as usize) * 4;
            for c in 0..4 {
                out[o + c] = ((acc[c] + n / 2) / n) as u8;
            }
        }
    }
    PixelBuffer::from_raw(out_w, out_h, out)
}

fn fit_within(src: PixelBuffer, max_dim: u32) -> CompositorResult<PixelBuffer> {
    let (w, h) = (src.width(), src.height());
    let largest = w.max(h);
    if max_dim == 0 || largest <= max_dim {
        return Ok(src);
    }
    let scale = f64::from(max_dim) / f64::from(largest);
    let nw = ((f64::from(w) * scale).round() as u32).clamp(1, max_dim);
    let nh = ((f64::from(h) * scale).round() as u32).clamp(1, max_dim);
    let img = src.into_rgba_image()?;
    let resized = image::imageops::resize(&img, nw, nh, FilterType::Triangle);
    Ok(PixelBuffer::from_rgba_image(resized))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
