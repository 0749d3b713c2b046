use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::assets::source::{FsItemSource, ItemSource};
use crate::cache::store::CompositeCache;
use crate::effects::background::{RemovalStats, remove_background};
use crate::effects::feather::feather_alpha;
use crate::effects::morphology::close_silhouette;
use crate::foundation::config::CompositorConfig;
use crate::foundation::core::{PixelBuffer, PixelRect};
use crate::foundation::error::{CompositorError, CompositorResult};
use crate::layout::category::Category;
use crate::layout::positioner::{PreparedItem, SourceItem, draw_layers};
use crate::render::crop::crop_to_content;

/// Per-item diagnostics for an item that was drawn.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ItemReport {
    /// Clothing category.
    pub category: Category,
    /// Source path.
    pub path: PathBuf,
    /// Where the item landed on the layout canvas, before cropping.
    pub dest: PixelRect,
    /// Background removal outcome.
    pub removal: RemovalStats,
    /// Whether the edges were feathered.
    pub feathered: bool,
}

/// Per-item diagnostics for an item that was skipped.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SkipReport {
    /// Clothing category.
    pub category: Category,
    /// Source path.
    pub path: PathBuf,
    /// Human-readable reason.
    pub reason: String,
}

/// Diagnostics for one composite request.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct CompositeReport {
    /// Items drawn, back to front.
    pub drawn: Vec<ItemReport>,
    /// Items skipped after a load or processing failure.
    pub skipped: Vec<SkipReport>,
}

impl CompositeReport {
    /// Number of items drawn.
    pub fn drawn_count(&self) -> usize {
        self.drawn.len()
    }

    /// Number of items skipped.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Finished composite held in memory.
#[derive(Debug)]
pub struct ComposedOutfit {
    /// Cropped, merged silhouette at canonical size.
    pub image: PixelBuffer,
    /// What happened along the way.
    pub report: CompositeReport,
}

/// Finished composite persisted to the cache.
#[derive(Clone, Debug)]
pub struct CompositeOutput {
    /// PNG location inside the cache directory.
    pub path: PathBuf,
    /// What happened along the way.
    pub report: CompositeReport,
}

/// Runs the outfit pipeline: load, cut out, feather, lay out, merge, crop.
///
/// A compositor holds no per-request state; one instance may serve concurrent requests from
/// several threads when its [`ItemSource`] allows it.
#[derive(Clone, Debug)]
pub struct Compositor<S = FsItemSource> {
    config: CompositorConfig,
    source: S,
}

impl Compositor<FsItemSource> {
    /// Compositor reading item images from the filesystem.
    pub fn new(config: CompositorConfig) -> Self {
        let source = FsItemSource::new(config.max_decode_bytes);
        Self { config, source }
    }
}

impl<S: ItemSource> Compositor<S> {
    /// Compositor reading item images through `source`.
    pub fn with_source(config: CompositorConfig, source: S) -> Self {
        Self { config, source }
    }

    /// Active configuration.
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Composite the given items into one silhouette.
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    pub fn compose(&self, items: &BTreeMap<Category, PathBuf>) -> CompositorResult<ComposedOutfit> {
        if items.is_empty() {
            return Err(CompositorError::NoItemsProvided);
        }
        self.config.validate()?;

        let items: Vec<SourceItem> = items
            .iter()
            .map(|(&category, path)| SourceItem {
                category,
                path: path.clone(),
            })
            .collect();

        let cfg = &self.config;
        let layered = draw_layers(cfg.canvas_width, cfg.canvas_height, &items, |item| {
            self.prepare_item(item)
        })?;

        let report = CompositeReport {
            drawn: layered
                .drawn
                .into_iter()
                .map(|d| ItemReport {
                    category: d.category,
                    path: d.meta.path,
                    dest: d.dest,
                    removal: d.meta.removal,
                    feathered: d.meta.feathered,
                })
                .collect(),
            skipped: layered
                .skipped
                .into_iter()
                .map(|s| SkipReport {
                    category: s.category,
                    path: s.path,
                    reason: s.error.to_string(),
                })
                .collect(),
        };

        let merged = close_silhouette(layered.canvas, cfg.merge_radius)?;
        let image = crop_to_content(merged, cfg.canvas_width, cfg.canvas_height)?;

        tracing::info!(
            drawn = report.drawn_count(),
            skipped = report.skipped_count(),
            coverage = image.coverage(),
            "composite ready"
        );
        Ok(ComposedOutfit { image, report })
    }

    /// Composite the given items and persist the result in `cache`.
    pub fn compose_to_cache(
        &self,
        items: &BTreeMap<Category, PathBuf>,
        cache: &CompositeCache,
    ) -> CompositorResult<CompositeOutput> {
        let ComposedOutfit { image, report } = self.compose(items)?;
        let path = cache.save(image)?;
        Ok(CompositeOutput { path, report })
    }

    fn prepare_item(&self, item: &SourceItem) -> CompositorResult<PreparedItem<ItemMeta>> {
        let cfg = &self.config;
        let source = self.source.load(item, cfg.max_source_dim)?;
        let removal = remove_background(source, &cfg.background)?;

        let feathered = removal.stats.removed && cfg.feather_radius > 0;
        let buffer = if feathered {
            feather_alpha(removal.buffer, cfg.feather_radius)?
        } else {
            removal.buffer
        };

        Ok(PreparedItem {
            buffer,
            meta: ItemMeta {
                path: item.path.clone(),
                removal: removal.stats,
                feathered,
            },
        })
    }
}

#[derive(Debug)]
struct ItemMeta {
    path: PathBuf,
    removal: RemovalStats,
    feathered: bool,
}

/// Build a request map from `(category, path)` pairs; later duplicates replace earlier ones.
pub fn items_from_pairs<I, P>(pairs: I) -> BTreeMap<Category, PathBuf>
where
    I: IntoIterator<Item = (Category, P)>,
    P: AsRef<Path>,
{
    pairs
        .into_iter()
        .map(|(c, p)| (c, p.as_ref().to_path_buf()))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
