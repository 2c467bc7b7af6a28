//! The mask post-processing pipeline: overlap suppression, region
//! decomposition, polygon extraction, and zero-shot label resolution.
//!
//! # Modules
//!
//! * `suppress` - Greedy pairwise overlap NMS and the `mask_iou` utility
//! * `regions` - Connected-component decomposition of a mask
//! * `polygon` - Outer-contour polygon extraction and canonicalization
//! * `classify` - Zero-shot label resolution for object crops

pub mod classify;
pub mod polygon;
pub mod regions;
pub mod suppress;

pub use classify::{LabelResolver, ResolvedLabel};
pub use polygon::extract_polygon;
pub use regions::decompose_regions;
pub use suppress::{mask_iou, sort_by_area_desc, suppress_overlaps};
