//! Outfit compositor turns one photo per clothing category into a single outfit silhouette.
//!
//! Every item photo is cut out of its background, its edges are softened, and it is drawn into
//! a fixed vertical band of a square canvas chosen by its [`Category`]. The layered canvas is
//! then closed morphologically so separate garments read as one figure, cropped to its content,
//! and rescaled back to the canonical canvas size.
//!
//! # Pipeline overview
//!
//! 1. **Load**: [`ItemSource`] decodes each image, downsampling to at most
//!    [`CompositorConfig::max_source_dim`] on the long side.
//! 2. **Cut out**: [`remove_background`] flood-fills the border-connected background.
//! 3. **Feather**: [`feather_alpha`] box-blurs the alpha channel of cut-out items.
//! 4. **Lay out**: [`draw_layers`] draws items back to front into their category bands.
//! 5. **Merge**: [`close_silhouette`] bridges small gaps between garments.
//! 6. **Crop**: [`crop_to_content`] centers the opaque region at canonical size.
//! 7. **Persist** (optional): [`CompositeCache`] stores PNGs and evicts old ones.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: identical inputs and configuration yield identical pixels.
//! - **Partial success**: a failing item is skipped and reported; only when no item can be
//!   drawn does a request fail.
//! - **Straight RGBA8** between stages, premultiplied only while drawing.
//!
//! [`Compositor`] ties the stages together.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod cache;
mod effects;
mod foundation;
mod layout;
mod render;

pub use assets::decode::{decode_image_bytes, load_image, sample_factor};
pub use assets::source::{FsItemSource, ItemSource, MemoryItemSource};
pub use cache::store::{CACHE_SUBDIR, CacheEntry, CompositeCache, EvictionStats};
pub use effects::background::{
    BackgroundRemoval, RemovalStats, estimate_background, remove_background,
};
pub use effects::feather::feather_alpha;
pub use effects::morphology::{close_silhouette, dilate, disc_spans, erode};
pub use foundation::config::{BackgroundOpts, CompositorConfig};
pub use foundation::core::{AlphaMask, PixelBuffer, PixelRect, Rect, try_alloc_zeroed};
pub use foundation::error::{CompositorError, CompositorResult, FailureKind};
pub use layout::category::{Band, Category, CategoryLayout, category_layouts};
pub use layout::positioner::{
    DrawnItem, LayeredCanvas, PreparedItem, SkippedItem, SourceItem, draw_layers, place_in_band,
};
pub use render::composite::{
    PremulRgba8, draw_scaled_over, over, premultiply_in_place, unpremultiply_in_place,
};
pub use render::crop::{crop_to_content, opaque_bounds};
pub use render::pipeline::{
    ComposedOutfit, CompositeOutput, CompositeReport, Compositor, ItemReport, SkipReport,
    items_from_pairs,
};
