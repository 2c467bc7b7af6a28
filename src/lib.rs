//! # sam2yolo
//!
//! Post-processing for class-agnostic instance segmentation masks.
//!
//! Given the raw output of a "Segment Anything"-style mask generator,
//! this crate de-duplicates overlapping masks, decomposes each survivor
//! into connected regions, traces each region's outer contour into a
//! bounded polygon, assigns a label via a zero-shot image/text
//! classifier, and writes YOLO-segmentation label files plus optional
//! mask images, JSON metadata, and visualization overlays.
//!
//! ## Modules
//!
//! * [`core`] - Error handling, collaborator traits, and configuration
//! * [`domain`] - Mask, region, polygon, and annotation record types
//! * [`processors`] - Suppression, region decomposition, polygon
//!   extraction, and zero-shot label resolution
//! * [`utils`] - Image helpers, description dictionaries, visualization
//! * [`pipeline`] - Batch orchestration and annotation output

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::core::{SegError, SegResult, Severity};

    // Collaborator traits
    pub use crate::core::{MaskGenerator, ZeroShotClassifier};

    // Domain types
    pub use crate::domain::{AnnotationRecord, Mask, MaskMeta, Polygon, Region};

    // Processors
    pub use crate::processors::{
        LabelResolver, decompose_regions, extract_polygon, mask_iou, suppress_overlaps,
    };

    // Utilities
    pub use crate::utils::{DescriptionSet, LabelDictionary, load_image};

    // Pipeline (high-level API)
    pub use crate::pipeline::{OutputDirs, Pipeline, PipelineConfig};
}
