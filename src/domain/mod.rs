//! Domain types for masks, regions, polygons, and annotation records.

use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One candidate instance mask produced by the external generator.
///
/// The segmentation grid uses 0 for background and 255 for foreground.
/// Masks are immutable once generated; the pipeline only reads them.
#[derive(Debug, Clone)]
pub struct Mask {
    /// Binary membership grid over image pixel space.
    pub segmentation: GrayImage,
    /// Foreground pixel count.
    pub area: u64,
    /// Stability score from the generator, used as the suppression
    /// tie-breaker.
    pub stability_score: f32,
    /// The generator's own IoU estimate for this mask.
    pub predicted_iou: f32,
    /// Prompt points that produced this mask.
    pub point_coords: Vec<[f32; 2]>,
    /// Bounding box in XYWH pixel coordinates.
    pub bbox: [u32; 4],
    /// Image region the mask was generated within, XYWH.
    pub crop_box: [u32; 4],
}

impl Mask {
    /// Builds a mask from a binary grid, computing the area and bbox
    /// from the foreground pixels. Score metadata defaults to zero;
    /// generators that know better fill the fields directly.
    pub fn from_segmentation(segmentation: GrayImage) -> Self {
        let (width, height) = segmentation.dimensions();
        let mut area = 0u64;
        let (mut x_min, mut y_min, mut x_max, mut y_max) = (width, height, 0u32, 0u32);
        for (x, y, pixel) in segmentation.enumerate_pixels() {
            if pixel.0[0] > 0 {
                area += 1;
                x_min = x_min.min(x);
                y_min = y_min.min(y);
                x_max = x_max.max(x);
                y_max = y_max.max(y);
            }
        }
        let bbox = if area == 0 {
            [0, 0, 0, 0]
        } else {
            [x_min, y_min, x_max - x_min + 1, y_max - y_min + 1]
        };
        Self {
            segmentation,
            area,
            stability_score: 0.0,
            predicted_iou: 0.0,
            point_coords: Vec::new(),
            bbox,
            crop_box: [0, 0, width, height],
        }
    }
}

/// Simplified, JSON-serializable metadata for one mask.
///
/// The field set is fixed; no runtime type-sniffing is needed to
/// serialize it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskMeta {
    pub area: u64,
    pub bbox: [u32; 4],
    pub predicted_iou: f32,
    pub point_coords: Vec<[f32; 2]>,
    pub stability_score: f32,
    pub crop_box: [u32; 4],
}

impl From<&Mask> for MaskMeta {
    fn from(mask: &Mask) -> Self {
        Self {
            area: mask.area,
            bbox: mask.bbox,
            predicted_iou: mask.predicted_iou,
            point_coords: mask.point_coords.clone(),
            stability_score: mask.stability_score,
            crop_box: mask.crop_box,
        }
    }
}

/// One maximal connected component of a mask's foreground pixels.
#[derive(Debug, Clone)]
pub struct Region {
    /// Component label within the originating mask, starting at 1.
    /// Label 0 is the background and is never emitted.
    pub label: u32,
    /// Foreground pixel count of this component.
    pub pixel_count: u64,
    /// Binary grid containing only this component's pixels.
    pub mask: GrayImage,
}

/// An ordered, implicitly closed contour polygon with coordinates
/// normalized to `[0, 1]` image-relative space.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// Normalized (x, y) vertices in boundary-walk order.
    pub points: Vec<[f64; 2]>,
}

impl Polygon {
    /// Appends this polygon's vertices to a label line as
    /// space-separated tokens with 6 decimal digits.
    pub fn push_tokens(&self, line: &mut String) {
        for point in &self.points {
            // write! to a String cannot fail
            let _ = write!(line, " {:.6} {:.6}", point[0], point[1]);
        }
    }
}

/// One object's final annotation: a class id plus one polygon per
/// connected region of the originating mask, in region-label order.
#[derive(Debug, Clone)]
pub struct AnnotationRecord {
    pub class_id: usize,
    pub polygons: Vec<Polygon>,
}

impl AnnotationRecord {
    /// Serializes the record into one label-file line (no trailing
    /// newline): `"<class_id> <x1> <y1> <x2> <y2> ..."`.
    pub fn to_line(&self) -> String {
        let mut line = self.class_id.to_string();
        for polygon in &self.polygons {
            polygon.push_tokens(&mut line);
        }
        line
    }
}
