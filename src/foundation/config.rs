use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{CompositorError, CompositorResult};

/// Tuning for background detection and the coverage safety net.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundOpts {
    /// Edge length of the square patch sampled at each corner.
    pub corner_sample_size: u32,
    /// Squared RGB distance below which a pixel may be background.
    pub distance_sq_threshold: u32,
    /// Mean channel brightness above which a pixel may be background.
    pub brightness_threshold: u8,
    /// Coverage below this reverts removal entirely.
    pub hard_coverage_floor: f32,
    /// Coverage below this keeps the cutout but flags it as suspicious.
    pub soft_coverage_floor: f32,
}

impl Default for BackgroundOpts {
    fn default() -> Self {
        Self {
            corner_sample_size: 10,
            distance_sq_threshold: 2700,
            brightness_threshold: 180,
            hard_coverage_floor: 0.02,
            soft_coverage_floor: 0.10,
        }
    }
}

/// Compositor configuration. Defaults are the values downstream 3D generation is tuned for.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositorConfig {
    /// Canonical output width.
    pub canvas_width: u32,
    /// Canonical output height.
    pub canvas_height: u32,
    /// Largest dimension a decoded source may have.
    pub max_source_dim: u32,
    /// Allocation ceiling handed to the image decoder, in bytes.
    pub max_decode_bytes: u64,
    /// Background removal tuning.
    pub background: BackgroundOpts,
    /// Box blur radius applied to cutout alpha edges.
    pub feather_radius: u32,
    /// Disc radius of the silhouette closing.
    pub merge_radius: u32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1024,
            canvas_height: 1024,
            max_source_dim: 1024,
            max_decode_bytes: 256 * 1024 * 1024,
            background: BackgroundOpts::default(),
            feather_radius: 2,
            merge_radius: 12,
        }
    }
}

impl CompositorConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> CompositorResult<Self> {
        let cfg: Self = serde_json::from_str(s).context("parse compositor config JSON")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_path(path: &Path) -> CompositorResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read compositor config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> CompositorResult<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(CompositorError::validation("canvas dimensions must be > 0"));
        }
        if self.max_source_dim == 0 {
            return Err(CompositorError::validation("max_source_dim must be > 0"));
        }
        if self.max_decode_bytes == 0 {
            return Err(CompositorError::validation("max_decode_bytes must be > 0"));
        }
        let canvas_dim = self.canvas_width.max(self.canvas_height);
        if self.merge_radius > canvas_dim {
            return Err(CompositorError::validation(format!(
                "merge_radius must be <= {canvas_dim} (the larger canvas dimension)"
            )));
        }
        if self.feather_radius > self.max_source_dim {
            return Err(CompositorError::validation(format!(
                "feather_radius must be <= max_source_dim ({})",
                self.max_source_dim
            )));
        }
        let bg = &self.background;
        for (name, v) in [
            ("hard_coverage_floor", bg.hard_coverage_floor),
            ("soft_coverage_floor", bg.soft_coverage_floor),
        ] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(CompositorError::validation(format!(
                    "{name} must be within [0, 1]"
                )));
            }
        }
        if bg.hard_coverage_floor > bg.soft_coverage_floor {
            return Err(CompositorError::validation(
                "hard_coverage_floor must be <= soft_coverage_floor",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
