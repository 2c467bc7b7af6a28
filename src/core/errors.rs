//! Error types for the annotation pipeline.
//!
//! This module defines the errors that can occur while post-processing
//! segmentation masks, along with a severity classification that drives
//! the pipeline's skip/continue policy: per-object errors skip one mask,
//! per-image errors skip one image, and fatal errors halt the batch.

use std::path::PathBuf;
use thiserror::Error;

/// How far an error's blast radius extends.
///
/// The batch loops consult this to decide whether to skip the current
/// mask, skip the current image, or stop processing entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Skip the offending mask and continue with the next one.
    Object,
    /// Skip the offending image and continue with the next one.
    Image,
    /// Propagate and halt the batch.
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Object => write!(f, "object"),
            Severity::Image => write!(f, "image"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

/// Errors produced by the segmentation post-processing pipeline.
#[derive(Error, Debug)]
pub enum SegError {
    /// An image file could not be loaded or decoded.
    #[error("failed to load image '{path}'")]
    ImageLoad {
        /// Path of the offending image file.
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A region produced no traceable contour.
    #[error("no contour found for region {region_label}")]
    ContourNotFound {
        /// Connected-component label of the region within its mask.
        region_label: u32,
    },

    /// An image contained no non-white content to crop.
    #[error("empty content: {context}")]
    EmptyContent {
        /// Description of what was being cropped.
        context: String,
    },

    /// The external classifier collaborator failed.
    #[error("classification failed: {context}")]
    Classification {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The external mask generator collaborator failed.
    #[error("mask generation failed: {context}")]
    MaskGeneration {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A classifier label has no entry in the label dictionary.
    #[error("label '{label}' not present in the label dictionary")]
    UnknownLabel { label: String },

    /// Invalid input to a processing step.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A configuration problem, detected before processing starts.
    #[error("configuration: {message}")]
    ConfigError { message: String },

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("serialization")]
    Serialize(#[from] serde_json::Error),
}

impl SegError {
    /// Classifies this error per the pipeline's recovery policy.
    ///
    /// Crop, contour, and classification failures are confined to one
    /// object; image decode failures are confined to one image;
    /// everything else (misconfiguration, IO on output paths, a broken
    /// generator) halts the batch.
    pub fn severity(&self) -> Severity {
        match self {
            SegError::ContourNotFound { .. }
            | SegError::EmptyContent { .. }
            | SegError::Classification { .. }
            | SegError::UnknownLabel { .. } => Severity::Object,
            SegError::ImageLoad { .. } | SegError::MaskGeneration { .. } => Severity::Image,
            SegError::InvalidInput { .. }
            | SegError::ConfigError { .. }
            | SegError::Io(_)
            | SegError::Serialize(_) => Severity::Fatal,
        }
    }

    /// Creates an error for an image that could not be loaded.
    pub fn image_load(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::ImageLoad {
            path: path.into(),
            source,
        }
    }

    /// Creates an error for a crop that found no content.
    pub fn empty_content(context: impl Into<String>) -> Self {
        Self::EmptyContent {
            context: context.into(),
        }
    }

    /// Creates an error for a failed classifier call.
    pub fn classification(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Classification {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an error for a failed mask generator call.
    pub fn mask_generation(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::MaskGeneration {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an error for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an error for a configuration problem.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

/// Convenient result alias for pipeline operations.
pub type SegResult<T> = Result<T, SegError>;
