//! Batch orchestration: the per-image mask generation pass and the
//! per-mask label assignment loop.
//!
//! Images live under `<image_root>/<subset>/<image_id>.<ext>` (subsets
//! are typically `train`/`val`/`test`). Processing is strictly
//! sequential: one image at a time, one mask at a time. Recovery
//! follows [`Severity`]: object-level errors skip one mask, image-level
//! errors skip one image, everything else halts the batch.

pub mod writer;

use crate::core::{MaskGenerator, SegError, SegResult, Severity, ZeroShotClassifier};
use crate::domain::{AnnotationRecord, Mask};
use crate::processors::{
    LabelResolver, decompose_regions, extract_polygon, sort_by_area_desc, suppress_overlaps,
};
use crate::utils::dict::DescriptionSet;
use crate::utils::image::{crop_object_from_white_background, load_image, mask_to_white_background};
use crate::utils::visualization::{
    LabeledBox, VisualizationConfig, render_label_boxes, render_mask_overlay,
};
use image::RgbImage;
use std::path::Path;
use tracing::{debug, info, warn};

pub use crate::core::config::PipelineConfig;
pub use writer::{LabelFileWriter, OutputDirs, save_mask_images, save_mask_metadata};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Images fully processed.
    pub images: usize,
    /// Images skipped due to per-image recoverable errors.
    pub images_skipped: usize,
    /// Objects that produced a label line.
    pub objects: usize,
    /// Objects skipped due to per-object recoverable errors.
    pub objects_skipped: usize,
}

/// The batch annotation pipeline.
///
/// Owns the run configuration, output layout, and candidate label set;
/// borrows the two external model collaborators.
pub struct Pipeline<'a> {
    config: PipelineConfig,
    dirs: OutputDirs,
    generator: &'a dyn MaskGenerator,
    classifier: &'a dyn ZeroShotClassifier,
    descriptions: DescriptionSet,
    visualization: VisualizationConfig,
}

impl<'a> Pipeline<'a> {
    /// Validates the configuration, creates the output folders, and
    /// builds a pipeline.
    pub fn new(
        config: PipelineConfig,
        generator: &'a dyn MaskGenerator,
        classifier: &'a dyn ZeroShotClassifier,
        descriptions: DescriptionSet,
    ) -> SegResult<Self> {
        config.validate()?;
        if descriptions.texts.is_empty() {
            return Err(SegError::config_error("descriptions must not be empty"));
        }
        let dirs = OutputDirs::create(&config.output_root)?;
        Ok(Self {
            config,
            dirs,
            generator,
            classifier,
            descriptions,
            visualization: VisualizationConfig::default(),
        })
    }

    /// Replaces the visualization settings (font, borders).
    pub fn with_visualization(mut self, visualization: VisualizationConfig) -> Self {
        self.visualization = visualization;
        self
    }

    pub fn output_dirs(&self) -> &OutputDirs {
        &self.dirs
    }

    /// Processes every image under `image_root`, one subset directory
    /// at a time, one image at a time.
    pub fn run(&self, image_root: &Path) -> SegResult<RunStats> {
        let mut stats = RunStats::default();

        for subset in sorted_entries(image_root)? {
            if !subset.is_dir() {
                continue;
            }
            let subset_name = file_name_lossy(&subset);

            for image_path in sorted_entries(&subset)? {
                if !is_image_file(&image_path) {
                    continue;
                }
                match self.process_image(&image_path, &subset_name) {
                    Ok((labeled, skipped)) => {
                        stats.images += 1;
                        stats.objects += labeled;
                        stats.objects_skipped += skipped;
                    }
                    Err(e) if e.severity() != Severity::Fatal => {
                        warn!("error with file {}: {e}", image_path.display());
                        stats.images_skipped += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        info!(
            "batch complete: {} images ({} skipped), {} objects ({} skipped)",
            stats.images, stats.images_skipped, stats.objects, stats.objects_skipped
        );
        Ok(stats)
    }

    /// Runs the full flow for one image: generate, suppress, then
    /// label each surviving mask. Returns (labeled, skipped) object
    /// counts.
    pub fn process_image(&self, image_path: &Path, subset: &str) -> SegResult<(usize, usize)> {
        let image_id = file_stem_lossy(image_path);
        let image = load_image(image_path)?;

        let masks = self.generate_masks(&image, subset, &image_id)?;
        self.assign_labels(&image, &masks, subset, &image_id)
    }

    /// The mask generation pass for one image: invoke the generator,
    /// sort by descending area, persist the requested artifacts, and
    /// apply overlap suppression.
    pub fn generate_masks(
        &self,
        image: &RgbImage,
        subset: &str,
        image_id: &str,
    ) -> SegResult<Vec<Mask>> {
        let mut masks = self.generator.generate(image)?;
        sort_by_area_desc(&mut masks);
        debug!("{subset}/{image_id}: generated {} masks", masks.len());

        if self.config.save_masks {
            let dir = self.dirs.masks.join(subset).join(image_id);
            save_mask_images(&masks, &dir)?;
        }

        let masks = if self.config.enable_mask_nms {
            suppress_overlaps(masks, self.config.mask_nms_threshold)
        } else {
            masks
        };

        if self.config.save_overlays {
            let overlay = render_mask_overlay(image, &masks, &self.visualization);
            let dir = self.dirs.visual.join(subset);
            std::fs::create_dir_all(&dir)?;
            overlay
                .save(dir.join(format!("{image_id}.png")))
                .map_err(|e| SegError::invalid_input(format!("failed to save overlay: {e}")))?;
        }

        if self.config.save_json {
            let dir = self.dirs.json.join(subset).join(image_id);
            save_mask_metadata(&masks, &dir)?;
        }

        Ok(masks)
    }

    /// The label assignment pass for one image: classify each mask,
    /// extract its region polygons, and flush label lines as they
    /// accumulate. Per-object failures are logged and skipped.
    pub fn assign_labels(
        &self,
        image: &RgbImage,
        masks: &[Mask],
        subset: &str,
        image_id: &str,
    ) -> SegResult<(usize, usize)> {
        let (width, height) = image.dimensions();
        let resolver = LabelResolver::new(self.classifier, &self.descriptions);
        let mut label_writer = LabelFileWriter::new(&self.dirs.labels, subset, image_id);
        let mut labeled_boxes = Vec::new();
        let mut skipped = 0usize;

        for (index, mask) in masks.iter().enumerate() {
            match self.label_one_mask(image, mask, width, height, &resolver) {
                Ok((record, labeled_box)) => {
                    label_writer.push(&record)?;
                    labeled_boxes.push(labeled_box);
                }
                Err(e) if e.severity() == Severity::Object => {
                    warn!("{subset}/{image_id}: skipping mask {index}: {e}");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        // The label file exists even when every mask failed.
        label_writer.flush()?;

        if self.config.save_label_visuals && !labeled_boxes.is_empty() {
            let rendered = render_label_boxes(image, &labeled_boxes, &self.visualization);
            let dir = self.dirs.label_visual.join(subset);
            std::fs::create_dir_all(&dir)?;
            rendered
                .save(dir.join(format!("{image_id}.png")))
                .map_err(|e| {
                    SegError::invalid_input(format!("failed to save label visual: {e}"))
                })?;
        }

        info!("{} labels generated", label_writer.path().display());
        Ok((label_writer.len(), skipped))
    }

    /// Classifies one mask and converts its regions into an annotation
    /// record. Every error here is per-object recoverable for the
    /// caller.
    fn label_one_mask(
        &self,
        image: &RgbImage,
        mask: &Mask,
        width: u32,
        height: u32,
        resolver: &LabelResolver<'_>,
    ) -> SegResult<(AnnotationRecord, LabeledBox)> {
        let masked = mask_to_white_background(image, &mask.segmentation);
        let (crop, bounds) = crop_object_from_white_background(&masked)?;
        let resolved = resolver.resolve(&crop)?;

        let mut polygons = Vec::new();
        for region in decompose_regions(mask) {
            polygons.push(extract_polygon(&region, width, height)?);
        }

        Ok((
            AnnotationRecord {
                class_id: resolved.class_id,
                polygons,
            },
            LabeledBox {
                label: resolved.label,
                bounds,
            },
        ))
    }
}

fn sorted_entries(dir: &Path) -> SegResult<Vec<std::path::PathBuf>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    Ok(entries)
}

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
}

fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem_lossy(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb};
    use ndarray::{Array1, Array2, array};
    use tempfile::TempDir;

    struct StubGenerator {
        masks: Vec<Mask>,
    }

    impl MaskGenerator for StubGenerator {
        fn generate(&self, _image: &RgbImage) -> SegResult<Vec<Mask>> {
            Ok(self.masks.clone())
        }
    }

    /// Always matches the first candidate description.
    struct FirstWinsClassifier;

    impl ZeroShotClassifier for FirstWinsClassifier {
        fn encode_image(&self, _image: &RgbImage) -> SegResult<Array1<f32>> {
            Ok(array![1.0, 0.0])
        }

        fn encode_text(&self, prompts: &[String]) -> SegResult<Array2<f32>> {
            let mut features = Array2::zeros((prompts.len(), 2));
            for (i, mut row) in features.axis_iter_mut(ndarray::Axis(0)).enumerate() {
                row[0] = if i == 0 { 1.0 } else { 0.0 };
                row[1] = if i == 0 { 0.0 } else { 1.0 };
            }
            Ok(features)
        }
    }

    fn rect_mask(x0: u32, y0: u32, x1: u32, y1: u32, score: f32) -> Mask {
        let mut grid = GrayImage::new(64, 64);
        for x in x0..x1 {
            for y in y0..y1 {
                grid.put_pixel(x, y, Luma([255]));
            }
        }
        let mut mask = Mask::from_segmentation(grid);
        mask.stability_score = score;
        mask
    }

    fn descriptions() -> DescriptionSet {
        DescriptionSet::from_pairs(vec![
            ("red and ripe".into(), "ripe".into()),
            ("green".into(), "unripe".into()),
        ])
    }

    fn write_test_image(root: &Path, subset: &str, name: &str) {
        let dir = root.join(subset);
        std::fs::create_dir_all(&dir).unwrap();
        let image = RgbImage::from_pixel(64, 64, Rgb([80, 120, 40]));
        image.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_end_to_end_overlapping_masks() {
        let tmp = TempDir::new().unwrap();
        let image_root = tmp.path().join("images");
        write_test_image(&image_root, "train", "0001.png");

        // Masks 0 and 1 overlap 80% of the smaller; mask 2 is disjoint.
        let generator = StubGenerator {
            masks: vec![
                rect_mask(0, 0, 40, 25, 0.9),
                rect_mask(0, 6, 50, 25, 0.95),
                rect_mask(44, 44, 64, 54, 0.99),
            ],
        };
        let classifier = FirstWinsClassifier;
        let config = PipelineConfig {
            output_root: tmp.path().join("out"),
            ..Default::default()
        };
        let pipeline =
            Pipeline::new(config, &generator, &classifier, descriptions()).unwrap();

        let stats = pipeline.run(&image_root).unwrap();
        assert_eq!(stats.images, 1);
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.objects_skipped, 0);

        // Mask PNGs are saved before suppression, so all three exist.
        let mask_dir = tmp.path().join("out/mask/train/0001");
        assert!(mask_dir.join("mask_2.png").is_file());

        let labels = std::fs::read_to_string(tmp.path().join("out/labels/train/0001.txt")).unwrap();
        let lines: Vec<&str> = labels.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert!(line.starts_with("0 "));
            // coordinate pairs: even token count after the class id
            let tokens = line.split_whitespace().count();
            assert_eq!(tokens % 2, 1);
        }
    }

    #[test]
    fn test_empty_mask_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let image_root = tmp.path().join("images");
        write_test_image(&image_root, "val", "7.jpg");

        let generator = StubGenerator {
            masks: vec![
                Mask::from_segmentation(GrayImage::new(64, 64)), // all-white crop -> skip
                rect_mask(10, 10, 30, 30, 0.8),
            ],
        };
        let classifier = FirstWinsClassifier;
        let config = PipelineConfig {
            output_root: tmp.path().join("out"),
            enable_mask_nms: false,
            ..Default::default()
        };
        let pipeline =
            Pipeline::new(config, &generator, &classifier, descriptions()).unwrap();

        let stats = pipeline.run(&image_root).unwrap();
        assert_eq!(stats.images, 1);
        assert_eq!(stats.objects, 1);
        assert_eq!(stats.objects_skipped, 1);

        let labels = std::fs::read_to_string(tmp.path().join("out/labels/val/7.txt")).unwrap();
        assert_eq!(labels.lines().count(), 1);
    }

    #[test]
    fn test_multi_region_mask_emits_single_line() {
        let tmp = TempDir::new().unwrap();
        let image_root = tmp.path().join("images");
        write_test_image(&image_root, "train", "multi.png");

        // One mask with two disjoint blobs.
        let mut grid = GrayImage::new(64, 64);
        for (x0, y0) in [(4u32, 4u32), (40, 40)] {
            for x in x0..x0 + 8 {
                for y in y0..y0 + 8 {
                    grid.put_pixel(x, y, Luma([255]));
                }
            }
        }
        let generator = StubGenerator {
            masks: vec![Mask::from_segmentation(grid)],
        };
        let classifier = FirstWinsClassifier;
        let config = PipelineConfig {
            output_root: tmp.path().join("out"),
            ..Default::default()
        };
        let pipeline =
            Pipeline::new(config, &generator, &classifier, descriptions()).unwrap();

        let stats = pipeline.run(&image_root).unwrap();
        assert_eq!(stats.objects, 1);

        let labels =
            std::fs::read_to_string(tmp.path().join("out/labels/train/multi.txt")).unwrap();
        let lines: Vec<&str> = labels.lines().collect();
        assert_eq!(lines.len(), 1);
        // Two concatenated polygons give well over one rectangle's
        // worth of coordinate pairs.
        assert!(lines[0].split_whitespace().count() > 20);
    }

    #[test]
    fn test_missing_subset_image_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let image_root = tmp.path().join("images");
        let dir = image_root.join("train");
        std::fs::create_dir_all(&dir).unwrap();
        // Not a decodable image.
        std::fs::write(dir.join("broken.png"), b"not a png").unwrap();

        let generator = StubGenerator { masks: Vec::new() };
        let classifier = FirstWinsClassifier;
        let config = PipelineConfig {
            output_root: tmp.path().join("out"),
            ..Default::default()
        };
        let pipeline =
            Pipeline::new(config, &generator, &classifier, descriptions()).unwrap();

        let stats = pipeline.run(&image_root).unwrap();
        assert_eq!(stats.images, 0);
        assert_eq!(stats.images_skipped, 1);
    }

    #[test]
    fn test_empty_descriptions_rejected() {
        let tmp = TempDir::new().unwrap();
        let generator = StubGenerator { masks: Vec::new() };
        let classifier = FirstWinsClassifier;
        let config = PipelineConfig {
            output_root: tmp.path().join("out"),
            ..Default::default()
        };
        let result = Pipeline::new(config, &generator, &classifier, DescriptionSet::default());
        assert!(matches!(result, Err(SegError::ConfigError { .. })));
    }
}
