//! Pipeline configuration.

use crate::core::errors::{SegError, SegResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a batch annotation run.
///
/// Controls where output artifacts land and which optional artifacts
/// (mask PNGs, JSON metadata, visualizations) are produced. Argument
/// parsing happens outside this crate; callers typically deserialize
/// this from a config file or build it directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory that receives the output subfolders.
    pub output_root: PathBuf,

    /// Whether to run overlap suppression on the generated masks.
    pub enable_mask_nms: bool,

    /// Intersection-over-smaller-area threshold for suppression.
    pub mask_nms_threshold: f32,

    /// Whether to save per-mask binary PNGs.
    pub save_masks: bool,

    /// Whether to save simplified per-mask JSON metadata.
    pub save_json: bool,

    /// Whether to save colored mask overlays with index annotations.
    pub save_overlays: bool,

    /// Whether to save bounding-box + label visualizations.
    pub save_label_visuals: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("out"),
            enable_mask_nms: true,
            mask_nms_threshold: 0.5,
            save_masks: true,
            save_json: false,
            save_overlays: false,
            save_label_visuals: false,
        }
    }
}

impl PipelineConfig {
    /// Validates the configuration before any processing starts.
    ///
    /// Threshold must lie in (0, 1]; a non-positive threshold would
    /// suppress disjoint masks, and anything above 1 can never fire.
    pub fn validate(&self) -> SegResult<()> {
        if self.output_root.as_os_str().is_empty() {
            return Err(SegError::config_error("output_root must not be empty"));
        }
        if !(self.mask_nms_threshold > 0.0 && self.mask_nms_threshold <= 1.0) {
            return Err(SegError::config_error(format!(
                "mask_nms_threshold must be in (0, 1], got {}",
                self.mask_nms_threshold
            )));
        }
        Ok(())
    }
}
