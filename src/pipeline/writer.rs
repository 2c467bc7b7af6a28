//! Output artifact persistence: label files, mask images, and JSON
//! metadata.

use crate::core::SegResult;
use crate::domain::{AnnotationRecord, Mask, MaskMeta};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The output directory layout for one run.
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub masks: PathBuf,
    pub json: PathBuf,
    pub labels: PathBuf,
    pub visual: PathBuf,
    pub label_visual: PathBuf,
}

impl OutputDirs {
    /// Creates the output subfolders under the given root.
    pub fn create(root: &Path) -> SegResult<Self> {
        let dirs = Self {
            masks: root.join("mask"),
            json: root.join("json"),
            labels: root.join("labels"),
            visual: root.join("visual"),
            label_visual: root.join("label_visual"),
        };
        for dir in [
            &dirs.masks,
            &dirs.json,
            &dirs.labels,
            &dirs.visual,
            &dirs.label_visual,
        ] {
            fs::create_dir_all(dir)?;
            debug!("created output folder: {}", dir.display());
        }
        Ok(dirs)
    }
}

/// Accumulates label lines for one image and flushes them to disk
/// after every successful mask.
///
/// Each flush rewrites the whole file, so the file always reflects all
/// successes so far and a later crash in the same image's loop never
/// loses earlier progress.
pub struct LabelFileWriter {
    path: PathBuf,
    lines: Vec<String>,
}

impl LabelFileWriter {
    /// Prepares a writer for `<labels>/<subset>/<image_id>.txt`.
    pub fn new(labels_dir: &Path, subset: &str, image_id: &str) -> Self {
        Self {
            path: labels_dir.join(subset).join(format!("{image_id}.txt")),
            lines: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines written so far.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Appends one record and rewrites the label file.
    pub fn push(&mut self, record: &AnnotationRecord) -> SegResult<()> {
        self.lines.push(record.to_line());
        self.flush()
    }

    /// Rewrites the label file with every line accumulated so far.
    pub fn flush(&self) -> SegResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = self.lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Saves each mask as a white-on-black PNG named `mask_<i>.png`.
pub fn save_mask_images(masks: &[Mask], dir: &Path) -> SegResult<()> {
    fs::create_dir_all(dir)?;
    for (i, mask) in masks.iter().enumerate() {
        let path = dir.join(format!("mask_{i}.png"));
        mask.segmentation
            .save(&path)
            .map_err(|e| crate::core::SegError::invalid_input(format!(
                "failed to save mask image '{}': {e}",
                path.display()
            )))?;
    }
    Ok(())
}

/// Saves simplified per-mask JSON metadata as `mask_<i>.json`.
pub fn save_mask_metadata(masks: &[Mask], dir: &Path) -> SegResult<()> {
    fs::create_dir_all(dir)?;
    for (i, mask) in masks.iter().enumerate() {
        let meta = MaskMeta::from(mask);
        let file = fs::File::create(dir.join(format!("mask_{i}.json")))?;
        serde_json::to_writer_pretty(file, &meta)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Polygon;
    use image::{GrayImage, Luma};
    use tempfile::TempDir;

    fn record(class_id: usize) -> AnnotationRecord {
        AnnotationRecord {
            class_id,
            polygons: vec![Polygon {
                points: vec![[0.5, 0.5], [0.25, 0.75]],
            }],
        }
    }

    #[test]
    fn test_output_dirs_created() {
        let tmp = TempDir::new().unwrap();
        let dirs = OutputDirs::create(tmp.path()).unwrap();
        assert!(dirs.masks.is_dir());
        assert!(dirs.json.is_dir());
        assert!(dirs.labels.is_dir());
        assert!(dirs.visual.is_dir());
        assert!(dirs.label_visual.is_dir());
    }

    #[test]
    fn test_label_writer_flushes_after_each_push() {
        let tmp = TempDir::new().unwrap();
        let mut writer = LabelFileWriter::new(tmp.path(), "train", "0001");

        writer.push(&record(0)).unwrap();
        let after_one = fs::read_to_string(writer.path()).unwrap();
        assert_eq!(after_one.lines().count(), 1);

        writer.push(&record(1)).unwrap();
        let after_two = fs::read_to_string(writer.path()).unwrap();
        assert_eq!(after_two.lines().count(), 2);
        assert!(after_two.starts_with("0 0.500000"));
        assert!(after_two.ends_with('\n'));
    }

    #[test]
    fn test_label_writer_overwrite_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut writer = LabelFileWriter::new(tmp.path(), "val", "7");
        writer.push(&record(2)).unwrap();
        let first = fs::read_to_string(writer.path()).unwrap();
        writer.flush().unwrap();
        let second = fs::read_to_string(writer.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_mask_images_and_metadata() {
        let tmp = TempDir::new().unwrap();
        let mut grid = GrayImage::new(8, 8);
        grid.put_pixel(2, 2, Luma([255]));
        let mask = crate::domain::Mask::from_segmentation(grid);

        save_mask_images(std::slice::from_ref(&mask), tmp.path()).unwrap();
        assert!(tmp.path().join("mask_0.png").is_file());

        save_mask_metadata(std::slice::from_ref(&mask), tmp.path()).unwrap();
        let text = fs::read_to_string(tmp.path().join("mask_0.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["area"], 1);
        assert_eq!(json["stability_score"], 0.0);
    }
}
