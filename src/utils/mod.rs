//! Utility functions: image helpers, description dictionaries, and
//! visualization.

pub mod dict;
pub mod image;
pub mod visualization;

pub use dict::{DescriptionSet, LabelDictionary};
pub use image::{
    crop_object_from_white_background, dynamic_to_rgb, load_image, mask_to_white_background,
};
pub use visualization::{
    LabeledBox, VisualizationConfig, render_label_boxes, render_mask_overlay,
};
