use crate::foundation::error::{CompositorError, CompositorResult};

pub use kurbo::Rect;

/// Allocate a zero-filled byte buffer, reporting allocation failure as
/// [`CompositorError::OutOfMemory`] instead of aborting the process.
pub fn try_alloc_zeroed(len: usize, what: &'static str) -> CompositorResult<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| CompositorError::out_of_memory(what, len))?;
    out.resize(len, 0);
    Ok(out)
}

fn rgba_len(width: u32, height: u32) -> CompositorResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| CompositorError::validation("pixel buffer size overflow"))
}

/// Row-major straight (non-premultiplied) RGBA8 pixels.
///
/// A buffer is owned by exactly one pipeline stage at a time; stages take it by value and
/// return a new buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    /// Allocate a fully transparent buffer.
    pub fn transparent(width: u32, height: u32, what: &'static str) -> CompositorResult<Self> {
        let len = rgba_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: try_alloc_zeroed(len, what)?,
        })
    }

    /// Wrap existing RGBA8 bytes; `data.len()` must equal `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> CompositorResult<Self> {
        if data.len() != rgba_len(width, height)? {
            return Err(CompositorError::validation(format!(
                "pixel buffer expects {width}x{height}x4 bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Take ownership of an `image` crate buffer.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }

    /// Convert into an `image` crate buffer without copying.
    pub fn into_rgba_image(self) -> CompositorResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| CompositorError::validation("pixel buffer length mismatch"))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw RGBA8 bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer and return its bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Total pixel count.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// RGBA at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Fraction of pixels whose alpha is nonzero.
    pub fn coverage(&self) -> f32 {
        let total = self.pixel_count();
        if total == 0 {
            return 0.0;
        }
        let opaque = self.data.chunks_exact(4).filter(|px| px[3] != 0).count();
        opaque as f32 / total as f32
    }

    /// Extract the alpha channel as a fresh mask.
    pub fn alpha_mask(&self) -> CompositorResult<AlphaMask> {
        let mut data = try_alloc_zeroed(self.pixel_count(), "alpha mask")?;
        for (dst, px) in data.iter_mut().zip(self.data.chunks_exact(4)) {
            *dst = px[3];
        }
        Ok(AlphaMask {
            width: self.width,
            height: self.height,
            data,
        })
    }

    /// Replace the alpha channel, keeping RGB untouched.
    pub fn with_alpha(mut self, mask: &AlphaMask) -> CompositorResult<Self> {
        if mask.width != self.width || mask.height != self.height {
            return Err(CompositorError::validation(
                "alpha mask dimensions must match the pixel buffer",
            ));
        }
        for (px, &a) in self.data.chunks_exact_mut(4).zip(mask.data.iter()) {
            px[3] = a;
        }
        Ok(self)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }
}

/// 8-bit opacity plane derived from a [`PixelBuffer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaMask {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major alpha values.
    pub data: Vec<u8>,
}

/// Integer pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Build a rectangle from origin and size.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u32 {
        self.y + self.height
    }

    /// Whether the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Float rectangle with the same bounds.
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }

    /// Round a float rectangle to pixel bounds, clipped to `[0, max_w] x [0, max_h]`.
    pub fn from_rect_clipped(r: Rect, max_w: u32, max_h: u32) -> Self {
        let clip = |v: f64, max: u32| v.round().clamp(0.0, f64::from(max)) as u32;
        let x0 = clip(r.x0.min(r.x1), max_w);
        let x1 = clip(r.x0.max(r.x1), max_w);
        let y0 = clip(r.y0.min(r.y1), max_h);
        let y1 = clip(r.y0.max(r.y1), max_h);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
