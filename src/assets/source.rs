use std::{collections::HashMap, path::PathBuf};

use crate::assets::decode;
use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{CompositorError, CompositorResult};
use crate::layout::positioner::SourceItem;

/// Where item images come from.
///
/// Implementations must be cheap to call once per item and must not keep the returned
/// buffer; ownership passes to the caller.
pub trait ItemSource {
    /// Decode `item`'s image so that its larger dimension is at most `max_dim`.
    fn load(&self, item: &SourceItem, max_dim: u32) -> CompositorResult<PixelBuffer>;
}

/// Reads item images from the local filesystem.
#[derive(Clone, Debug)]
pub struct FsItemSource {
    max_decode_bytes: u64,
}

impl FsItemSource {
    /// Source whose decoder may allocate at most `max_decode_bytes` per image.
    pub fn new(max_decode_bytes: u64) -> Self {
        Self { max_decode_bytes }
    }
}

impl ItemSource for FsItemSource {
    fn load(&self, item: &SourceItem, max_dim: u32) -> CompositorResult<PixelBuffer> {
        decode::load_image(&item.path, max_dim, self.max_decode_bytes)
    }
}

/// Serves encoded images from memory, keyed by path. Useful for embedding and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryItemSource {
    files: HashMap<PathBuf, Vec<u8>>,
    max_decode_bytes: u64,
}

impl MemoryItemSource {
    /// Empty source with the given decode limit.
    pub fn new(max_decode_bytes: u64) -> Self {
        Self {
            files: HashMap::new(),
            max_decode_bytes,
        }
    }

    /// Register encoded bytes under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }
}

impl ItemSource for MemoryItemSource {
    fn load(&self, item: &SourceItem, max_dim: u32) -> CompositorResult<PixelBuffer> {
        let bytes = self
            .files
            .get(&item.path)
            .ok_or_else(|| CompositorError::NotFound {
                path: item.path.clone(),
            })?;
        decode::decode_image_bytes(bytes, max_dim, self.max_decode_bytes)
    }
}
