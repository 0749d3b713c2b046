use std::path::PathBuf;

use crate::foundation::core::{PixelBuffer, PixelRect, Rect};
use crate::foundation::error::{CompositorError, CompositorResult};
use crate::layout::category::{Band, Category};
use crate::render::composite::{draw_scaled_over, unpremultiply_in_place};

/// One requested item: a category and where its photo lives.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceItem {
    /// Clothing category.
    pub category: Category,
    /// Readable image path.
    pub path: PathBuf,
}

/// A processed item ready to be drawn, plus whatever the caller wants reported with it.
#[derive(Debug)]
pub struct PreparedItem<M> {
    /// Cutout pixels.
    pub buffer: PixelBuffer,
    /// Caller-defined metadata carried into [`DrawnItem`].
    pub meta: M,
}

/// An item that made it onto the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawnItem<M> {
    /// Clothing category.
    pub category: Category,
    /// Destination rectangle on the canvas.
    pub dest: PixelRect,
    /// Metadata returned by the prepare step.
    pub meta: M,
}

/// An item that was skipped because it could not be loaded or processed.
#[derive(Debug)]
pub struct SkippedItem {
    /// Clothing category.
    pub category: Category,
    /// Source path.
    pub path: PathBuf,
    /// Why it was skipped (always [`CompositorError::ItemLoadFailure`]).
    pub error: CompositorError,
}

/// Canvas after every item was drawn, in straight alpha.
#[derive(Debug)]
pub struct LayeredCanvas<M> {
    /// The composited canvas.
    pub canvas: PixelBuffer,
    /// Items drawn, back to front.
    pub drawn: Vec<DrawnItem<M>>,
    /// Items skipped.
    pub skipped: Vec<SkippedItem>,
}

/// Destination of a `src_w x src_h` image fitted into `band` of a `canvas_w x canvas_h` canvas.
///
/// The image is scaled uniformly so its height fills the band; if that makes it wider than
/// the canvas it is scaled by width instead. It is centered horizontally on the canvas and
/// vertically within the band. Returns `None` when nothing would be visible.
pub fn place_in_band(
    src_w: u32,
    src_h: u32,
    band: Band,
    canvas_w: u32,
    canvas_h: u32,
) -> Option<PixelRect> {
    if src_w == 0 || src_h == 0 || canvas_w == 0 || canvas_h == 0 {
        return None;
    }
    let ch = f64::from(canvas_h);
    let cw = f64::from(canvas_w);
    let band_top = (band.top * ch).round();
    let band_bottom = (band.bottom * ch).round();
    let band_h = band_bottom - band_top;
    if band_h <= 0.0 {
        return None;
    }

    let (sw, sh) = (f64::from(src_w), f64::from(src_h));
    let mut scale = band_h / sh;
    if sw * scale > cw {
        scale = cw / sw;
    }
    let (dw, dh) = (sw * scale, sh * scale);
    debug_assert!(dh <= band_h + 1e-9);

    let x0 = (cw - dw) / 2.0;
    let y0 = band_top + (band_h - dh) / 2.0;
    let dest =
        PixelRect::from_rect_clipped(Rect::new(x0, y0, x0 + dw, y0 + dh), canvas_w, canvas_h);
    if dest.is_empty() { None } else { Some(dest) }
}

/// Draw `items` back to front (ascending category rank) onto a fresh transparent canvas.
///
/// `prepare` loads and processes one item. Failures are logged and recorded in
/// [`LayeredCanvas::skipped`], except allocation failures which abort. If nothing could be
/// drawn the result is [`CompositorError::AllItemsFailed`].
pub fn draw_layers<M, F>(
    canvas_w: u32,
    canvas_h: u32,
    items: &[SourceItem],
    mut prepare: F,
) -> CompositorResult<LayeredCanvas<M>>
where
    F: FnMut(&SourceItem) -> CompositorResult<PreparedItem<M>>,
{
    if items.is_empty() {
        return Err(CompositorError::NoItemsProvided);
    }

    let mut order: Vec<&SourceItem> = items.iter().collect();
    order.sort_by_key(|item| item.category.layout().rank);

    let init = LayeredCanvas {
        canvas: PixelBuffer::transparent(canvas_w, canvas_h, "composite canvas")?,
        drawn: Vec::with_capacity(order.len()),
        skipped: Vec::new(),
    };

    let mut layered = order.into_iter().try_fold(init, |mut acc, item| {
        match prepare(item).and_then(|prepared| draw_item(&mut acc.canvas, item, prepared)) {
            Ok(drawn) => acc.drawn.push(drawn),
            Err(e) if e.is_item_recoverable() => {
                tracing::warn!(
                    category = %item.category,
                    path = %item.path.display(),
                    error = %e,
                    "skipping item"
                );
                acc.skipped.push(SkippedItem {
                    category: item.category,
                    path: item.path.clone(),
                    error: CompositorError::ItemLoadFailure {
                        category: item.category,
                        source: Box::new(e),
                    },
                });
            }
            Err(e) => return Err(e),
        }
        Ok(acc)
    })?;

    if layered.drawn.is_empty() {
        return Err(CompositorError::AllItemsFailed {
            attempted: items.len(),
        });
    }

    unpremultiply_in_place(layered.canvas.data_mut());
    Ok(layered)
}

fn draw_item<M>(
    canvas_premul: &mut PixelBuffer,
    item: &SourceItem,
    prepared: PreparedItem<M>,
) -> CompositorResult<DrawnItem<M>> {
    let PreparedItem { buffer, meta } = prepared;
    let band = item.category.layout().band;
    let dest = place_in_band(
        buffer.width(),
        buffer.height(),
        band,
        canvas_premul.width(),
        canvas_premul.height(),
    )
    .ok_or_else(|| {
        CompositorError::validation(format!(
            "{} item of {}x{} has no visible placement",
            item.category,
            buffer.width(),
            buffer.height()
        ))
    })?;

    let full = PixelRect::new(0, 0, buffer.width(), buffer.height());
    draw_scaled_over(canvas_premul, &buffer, full, dest)?;
    tracing::debug!(category = %item.category, ?dest, "drew item");

    Ok(DrawnItem {
        category: item.category,
        dest,
        meta,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/layout/positioner.rs"]
mod tests;
