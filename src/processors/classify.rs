//! Zero-shot label resolution for object crops.
//!
//! Embedding and similarity scoring are delegated to the external
//! classifier collaborator; this module owns the prompt template, the
//! L2 normalization of both embedding sides, the stable argmax, and the
//! mapping through the label dictionary.

use crate::core::{SegError, SegResult, ZeroShotClassifier};
use crate::utils::dict::DescriptionSet;
use image::RgbImage;
use ndarray::{Array1, Array2, Axis};

/// The fixed prompt template applied to every candidate description.
const PROMPT_TEMPLATE: &str = "This is ";

/// The label chosen for one object crop.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLabel {
    /// The winning textual label.
    pub label: String,
    /// Its integer id from the label dictionary.
    pub class_id: usize,
}

/// Resolves labels for object crops against a fixed candidate set.
pub struct LabelResolver<'a> {
    classifier: &'a dyn ZeroShotClassifier,
    descriptions: &'a DescriptionSet,
}

impl<'a> LabelResolver<'a> {
    pub fn new(classifier: &'a dyn ZeroShotClassifier, descriptions: &'a DescriptionSet) -> Self {
        Self {
            classifier,
            descriptions,
        }
    }

    /// Picks the best-matching label for the given crop.
    ///
    /// Prefixes each candidate description with the prompt template,
    /// embeds the crop and the prompts, L2-normalizes both sides, and
    /// takes the argmax of the dot-product similarities. Ties resolve
    /// to the first-occurring maximum.
    pub fn resolve(&self, crop: &RgbImage) -> SegResult<ResolvedLabel> {
        let prompts: Vec<String> = self
            .descriptions
            .texts
            .iter()
            .map(|desc| format!("{PROMPT_TEMPLATE}{desc}"))
            .collect();
        if prompts.is_empty() {
            return Err(SegError::invalid_input("no candidate descriptions"));
        }

        let mut image_features = self.classifier.encode_image(crop)?;
        let mut text_features = self.classifier.encode_text(&prompts)?;
        if text_features.nrows() != prompts.len() {
            return Err(SegError::invalid_input(format!(
                "classifier returned {} text embeddings for {} prompts",
                text_features.nrows(),
                prompts.len()
            )));
        }
        if text_features.ncols() != image_features.len() {
            return Err(SegError::invalid_input(
                "image and text embedding dimensions differ",
            ));
        }

        normalize_rows(&mut text_features);
        normalize(&mut image_features);

        let similarity = text_features.dot(&image_features);
        let best = stable_argmax(&similarity).ok_or_else(|| SegError::invalid_input(
            "empty similarity vector",
        ))?;

        let label = self.descriptions.labels[best].clone();
        let class_id = self
            .descriptions
            .dictionary
            .id(&label)
            .ok_or_else(|| SegError::UnknownLabel {
                label: label.clone(),
            })?;

        Ok(ResolvedLabel { label, class_id })
    }
}

/// Scales a vector to unit L2 norm. Zero vectors are left untouched.
fn normalize(vector: &mut Array1<f32>) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.mapv_inplace(|v| v / norm);
    }
}

/// Scales every row of a matrix to unit L2 norm.
fn normalize_rows(matrix: &mut Array2<f32>) {
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
}

/// Index of the first maximum element.
fn stable_argmax(values: &Array1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &value) in values.iter().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::dict::DescriptionSet;
    use ndarray::array;

    struct StubClassifier {
        image: Array1<f32>,
        text: Array2<f32>,
    }

    impl ZeroShotClassifier for StubClassifier {
        fn encode_image(&self, _image: &RgbImage) -> SegResult<Array1<f32>> {
            Ok(self.image.clone())
        }

        fn encode_text(&self, prompts: &[String]) -> SegResult<Array2<f32>> {
            // The resolver must apply the prompt template.
            assert!(prompts.iter().all(|p| p.starts_with("This is ")));
            Ok(self.text.clone())
        }
    }

    fn descriptions() -> DescriptionSet {
        DescriptionSet::from_pairs(vec![
            ("red and ripe".to_string(), "ripe".to_string()),
            ("green".to_string(), "unripe".to_string()),
        ])
    }

    #[test]
    fn test_resolves_highest_similarity_label() {
        let set = descriptions();
        let stub = StubClassifier {
            image: array![1.0, 0.0],
            text: array![[0.0, 1.0], [1.0, 0.0]],
        };
        let resolver = LabelResolver::new(&stub, &set);
        let resolved = resolver.resolve(&RgbImage::new(4, 4)).unwrap();
        assert_eq!(resolved.label, "unripe");
        assert_eq!(resolved.class_id, 1);
    }

    #[test]
    fn test_normalization_removes_magnitude_bias() {
        // The second row has a huge norm but points away from the
        // image embedding; normalization must keep the first row the
        // winner.
        let set = descriptions();
        let stub = StubClassifier {
            image: array![1.0, 0.0],
            text: array![[0.9, 0.1], [100.0, 400.0]],
        };
        let resolver = LabelResolver::new(&stub, &set);
        let resolved = resolver.resolve(&RgbImage::new(4, 4)).unwrap();
        assert_eq!(resolved.label, "ripe");
        assert_eq!(resolved.class_id, 0);
    }

    #[test]
    fn test_tie_resolves_to_first_maximum() {
        let set = descriptions();
        let stub = StubClassifier {
            image: array![1.0, 0.0],
            text: array![[1.0, 0.0], [1.0, 0.0]],
        };
        let resolver = LabelResolver::new(&stub, &set);
        let resolved = resolver.resolve(&RgbImage::new(4, 4)).unwrap();
        assert_eq!(resolved.label, "ripe");
    }

    #[test]
    fn test_embedding_dimension_mismatch_is_an_error() {
        let set = descriptions();
        let stub = StubClassifier {
            image: array![1.0, 0.0, 0.0],
            text: array![[1.0, 0.0], [0.0, 1.0]],
        };
        let resolver = LabelResolver::new(&stub, &set);
        assert!(resolver.resolve(&RgbImage::new(4, 4)).is_err());
    }

    #[test]
    fn test_stable_argmax() {
        assert_eq!(stable_argmax(&array![0.1, 0.9, 0.9, 0.2]), Some(1));
        assert_eq!(stable_argmax(&array![]), None);
    }
}
