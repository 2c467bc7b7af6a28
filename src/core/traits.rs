//! Collaborator traits for the external models the pipeline consumes.
//!
//! The mask generator and the zero-shot classifier run outside this
//! crate (ONNX sessions, remote services, test stubs). The pipeline
//! only sees these narrow interfaces.

use crate::core::SegResult;
use crate::domain::Mask;
use image::RgbImage;
use ndarray::{Array1, Array2};

/// Produces candidate instance masks for one image.
///
/// Invoked once per image; the pipeline sorts the returned masks by
/// descending area before suppression, so implementations need not
/// order their output.
pub trait MaskGenerator {
    /// Generates raw masks with quality metadata for the given image.
    fn generate(&self, image: &RgbImage) -> SegResult<Vec<Mask>>;
}

/// Embeds images and text prompts into a shared similarity space.
///
/// Both embedding kinds must be L2-normalizable; the label resolver
/// normalizes them itself before taking dot products, so
/// implementations may return unnormalized vectors.
pub trait ZeroShotClassifier {
    /// Embeds a single image crop.
    fn encode_image(&self, image: &RgbImage) -> SegResult<Array1<f32>>;

    /// Embeds a batch of text prompts, one row per prompt.
    fn encode_text(&self, prompts: &[String]) -> SegResult<Array2<f32>>;
}
