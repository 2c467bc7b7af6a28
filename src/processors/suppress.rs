//! Greedy overlap suppression over a set of candidate masks.
//!
//! The policy is deliberately order-dependent: masks are compared in
//! their stored order (descending area after [`sort_by_area_desc`]),
//! and whenever a pair overlaps by more than `threshold` of the smaller
//! mask's area, the strictly lower-scored mask is dropped; on equal
//! scores the later-ordered mask is dropped. Downstream label files
//! depend on this exact behavior, so it must not be replaced with a
//! globally optimal selection.

use crate::domain::Mask;
use image::GrayImage;
use rayon::prelude::*;

/// Mask count above which bit-packing runs on the rayon pool.
const PARALLEL_PACK_THRESHOLD: usize = 16;

/// Sorts masks by descending area, preserving insertion order on ties.
pub fn sort_by_area_desc(masks: &mut [Mask]) {
    masks.sort_by(|a, b| b.area.cmp(&a.area));
}

/// A mask's foreground grid packed into u64 words, one bit per pixel,
/// so pairwise intersections reduce to AND + popcount.
struct PackedMask {
    words: Vec<u64>,
}

impl PackedMask {
    fn pack(grid: &GrayImage) -> Self {
        let pixels = grid.as_raw();
        let words = pixels
            .chunks(64)
            .map(|chunk| {
                let mut word = 0u64;
                for (bit, &value) in chunk.iter().enumerate() {
                    if value > 0 {
                        word |= 1 << bit;
                    }
                }
                word
            })
            .collect();
        Self { words }
    }

    fn intersection(&self, other: &PackedMask) -> u64 {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as u64)
            .sum()
    }

    fn union(&self, other: &PackedMask) -> u64 {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a | b).count_ones() as u64)
            .sum()
    }
}

/// Suppresses redundant masks using an area-relative overlap rule.
///
/// For each ordered pair (i, j) with i < j, both still kept: if the
/// intersection exceeds `threshold * min(area_i, area_j)`, the mask
/// with the strictly lower stability score is dropped (j on ties). A
/// dropped mask no longer participates in later comparisons, but drop
/// decisions it already caused are not undone.
///
/// Returns the surviving masks in their original relative order.
/// Empty input yields empty output. O(n^2) in mask count.
pub fn suppress_overlaps(masks: Vec<Mask>, threshold: f32) -> Vec<Mask> {
    if masks.is_empty() {
        return masks;
    }

    let packed: Vec<PackedMask> = if masks.len() > PARALLEL_PACK_THRESHOLD {
        masks
            .par_iter()
            .map(|m| PackedMask::pack(&m.segmentation))
            .collect()
    } else {
        masks
            .iter()
            .map(|m| PackedMask::pack(&m.segmentation))
            .collect()
    };

    let mut keep = vec![true; masks.len()];
    for i in 0..masks.len() {
        if !keep[i] {
            continue;
        }
        for j in (i + 1)..masks.len() {
            if !keep[j] {
                continue;
            }
            let intersection = packed[i].intersection(&packed[j]) as f32;
            let smaller_area = masks[i].area.min(masks[j].area) as f32;
            if intersection > threshold * smaller_area {
                if masks[i].stability_score < masks[j].stability_score {
                    keep[i] = false;
                } else {
                    keep[j] = false;
                }
            }
            if !keep[i] {
                break;
            }
        }
    }

    let dropped = keep.iter().filter(|&&k| !k).count();
    if dropped > 0 {
        tracing::debug!("overlap suppression dropped {dropped} of {} masks", masks.len());
    }

    masks
        .into_iter()
        .zip(keep)
        .filter_map(|(mask, kept)| kept.then_some(mask))
        .collect()
}

/// Computes the intersection-over-union of two binary masks.
///
/// Returns exactly 0.0 when the union is empty.
pub fn mask_iou(mask1: &GrayImage, mask2: &GrayImage) -> f32 {
    let a = PackedMask::pack(mask1);
    let b = PackedMask::pack(mask2);
    let union = a.union(&b);
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b) as f32 / union as f32
}
