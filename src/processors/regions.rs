//! Connected-component decomposition of a single mask.
//!
//! A generator mask may cover several disconnected blobs (occlusion,
//! thin structures lost to thresholding). Each blob becomes its own
//! region so polygon extraction can trace each outer boundary
//! separately.

use crate::domain::{Mask, Region};
use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};

/// Splits a mask into its disjoint connected components.
///
/// Uses 4-connectivity, matching the scientific labeling routine's
/// default. Returns one [`Region`] per component label in
/// `1..=num_labels`; the background label 0 is never emitted, and
/// zero-pixel components (malformed input) are filtered out.
/// Regions come back in ascending label order.
pub fn decompose_regions(mask: &Mask) -> Vec<Region> {
    let (width, height) = mask.segmentation.dimensions();
    let labelled = connected_components(&mask.segmentation, Connectivity::Four, Luma([0u8]));

    let num_labels = labelled.pixels().map(|p| p.0[0]).max().unwrap_or(0);
    if num_labels == 0 {
        return Vec::new();
    }

    let mut pixel_counts = vec![0u64; num_labels as usize + 1];
    for pixel in labelled.pixels() {
        pixel_counts[pixel.0[0] as usize] += 1;
    }

    let mut regions = Vec::with_capacity(num_labels as usize);
    for label in 1..=num_labels {
        let pixel_count = pixel_counts[label as usize];
        if pixel_count == 0 {
            continue;
        }
        let mut grid = GrayImage::new(width, height);
        for (x, y, pixel) in labelled.enumerate_pixels() {
            if pixel.0[0] == label {
                grid.put_pixel(x, y, Luma([255]));
            }
        }
        regions.push(Region {
            label,
            pixel_count,
            mask: grid,
        });
    }
    regions
}
