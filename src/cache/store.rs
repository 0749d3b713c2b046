use std::{
    io::BufWriter,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::Context;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{CompositorError, CompositorResult};

/// Name of the cache subdirectory composites are written to.
pub const CACHE_SUBDIR: &str = "outfit_composites";

const FILE_PREFIX: &str = "composite_";

// In-flight temporary files younger than this are left alone by eviction.
const STALE_TMP_AGE: Duration = Duration::from_secs(60);

/// Outcome of [`CompositeCache::evict_older_than`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct EvictionStats {
    /// Files inspected.
    pub scanned: usize,
    /// Files deleted.
    pub deleted: usize,
    /// Bytes freed by the deleted files.
    pub bytes_freed: u64,
    /// Files that were due but could not be deleted.
    pub failed: usize,
}

/// A file currently held by the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// Path of the cached file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
}

/// PNG store for finished composites with age-based eviction.
///
/// Filenames are random UUIDs so concurrent writers never collide, and eviction tolerates
/// files disappearing underneath it.
#[derive(Clone, Debug)]
pub struct CompositeCache {
    dir: PathBuf,
}

impl CompositeCache {
    /// Cache rooted at `cache_root/outfit_composites`.
    pub fn new(cache_root: impl AsRef<Path>) -> Self {
        Self {
            dir: cache_root.as_ref().join(CACHE_SUBDIR),
        }
    }

    /// Directory holding cached composites.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Encode `image` as PNG under a fresh unique name and return its path.
    #[tracing::instrument(skip(self, image), fields(dir = %self.dir.display()))]
    pub fn save(&self, image: PixelBuffer) -> CompositorResult<PathBuf> {
        let id = uuid::Uuid::new_v4();
        let final_path = self.dir.join(format!("{FILE_PREFIX}{id}.png"));
        let tmp_path = self.dir.join(format!(".{FILE_PREFIX}{id}.png.tmp"));

        let save_failure = |source: anyhow::Error| CompositorError::SaveFailure {
            path: final_path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create cache dir '{}'", self.dir.display()))
            .map_err(save_failure)?;

        let img = image.into_rgba_image()?;
        let written = write_png(&tmp_path, &img).and_then(|()| {
            std::fs::rename(&tmp_path, &final_path).with_context(|| {
                format!(
                    "rename '{}' to '{}'",
                    tmp_path.display(),
                    final_path.display()
                )
            })
        });
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(save_failure(e));
        }

        tracing::info!(path = %final_path.display(), "saved composite");
        Ok(final_path)
    }

    /// List cached composites. A missing directory is an empty cache.
    pub fn entries(&self) -> CompositorResult<Vec<CacheEntry>> {
        let rd = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read cache dir '{}'", self.dir.display()))
                    .into());
            }
        };

        let mut out = Vec::new();
        for entry in rd {
            let entry = entry.context("read cache dir entry")?;
            if is_temp_file(&entry.path()) {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(anyhow::Error::new(e).context("stat cache entry").into()),
            };
            out.push(CacheEntry {
                path: entry.path(),
                size: meta.len(),
                modified: meta.modified().context("read cache entry mtime")?,
            });
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    /// Delete every file whose age is at least `max_age`. Never fails: problems are logged and
    /// counted in [`EvictionStats::failed`].
    #[tracing::instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn evict_older_than(&self, max_age: Duration) -> EvictionStats {
        let mut stats = EvictionStats::default();
        let rd = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return stats,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read cache dir; skipping eviction");
                return stats;
            }
        };

        let now = SystemTime::now();
        for entry in rd {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "cannot read cache dir entry");
                    stats.failed += 1;
                    continue;
                }
            };
            let path = entry.path();
            let meta = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot stat cache file");
                    stats.failed += 1;
                    continue;
                }
            };
            stats.scanned += 1;

            // Files stamped in the future count as brand new.
            let age = meta
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .unwrap_or(Duration::ZERO);
            if age < max_age || (is_temp_file(&path) && age < STALE_TMP_AGE) {
                continue;
            }

            match std::fs::remove_file(&path) {
                Ok(()) => {
                    stats.deleted += 1;
                    stats.bytes_freed += meta.len();
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot evict cache file");
                    stats.failed += 1;
                }
            }
        }

        tracing::info!(
            scanned = stats.scanned,
            deleted = stats.deleted,
            bytes_freed = stats.bytes_freed,
            failed = stats.failed,
            "cache eviction finished"
        );
        stats
    }
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n.ends_with(".tmp"))
}

fn write_png(path: &Path, img: &image::RgbaImage) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("create '{}'", path.display()))?;
    let mut w = BufWriter::new(file);
    img.write_to(&mut w, image::ImageFormat::Png)
        .with_context(|| format!("encode png '{}'", path.display()))?;
    let file = w
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush '{}': {}", path.display(), e.error()))?;
    file.sync_all()
        .with_context(|| format!("sync '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
