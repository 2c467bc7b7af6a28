//! Outer-contour polygon extraction for a single region.
//!
//! Traces the region's external boundary, downsamples the vertex chain
//! to a bounded count, rotates it to a canonical starting vertex, and
//! normalizes coordinates to `[0, 1]` image-relative space.

use crate::core::{SegError, SegResult};
use crate::domain::{Polygon, Region};
use imageproc::contours::{BorderType, Contour, find_contours};

/// Soft upper bound on polygon vertex count.
const MAX_POLYGON_POINTS: usize = 300;

/// Extracts the region's outer-boundary polygon.
///
/// Steps:
/// 1. Trace contours and keep only external borders, selecting the one
///    with the maximum enclosed area (nested/inner contours discarded).
/// 2. Keep vertices in boundary-walk order.
/// 3. Downsample with `skip = max(1, n / 300)`.
/// 4. Rotate so the bottom-most vertex (maximum y, first occurrence)
///    comes first. This makes the output invariant to where the tracer
///    happened to start, which label-format stability depends on.
/// 5. Divide x by `image_width` and y by `image_height`.
///
/// Fails with [`SegError::ContourNotFound`] when the region has no
/// traceable boundary; callers skip the region's mask and continue.
pub fn extract_polygon(region: &Region, image_width: u32, image_height: u32) -> SegResult<Polygon> {
    if image_width == 0 || image_height == 0 {
        return Err(SegError::invalid_input("image dimensions must be nonzero"));
    }

    let contours = find_contours::<u32>(&region.mask);
    let outer = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .max_by(|a, b| {
            enclosed_area(a)
                .partial_cmp(&enclosed_area(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or(SegError::ContourNotFound {
            region_label: region.label,
        })?;

    let points: Vec<[u32; 2]> = outer.points.iter().map(|p| [p.x, p.y]).collect();
    let canonical = downsample_and_canonicalize(points);

    let width = image_width as f64;
    let height = image_height as f64;
    let normalized = canonical
        .into_iter()
        .map(|[x, y]| [x as f64 / width, y as f64 / height])
        .collect();

    Ok(Polygon { points: normalized })
}

/// Shoelace area enclosed by a traced contour.
fn enclosed_area(contour: &Contour<u32>) -> f64 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let mut doubled = 0.0f64;
    for i in 0..points.len() {
        let a = &points[i];
        let b = &points[(i + 1) % points.len()];
        doubled += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    doubled.abs() / 2.0
}

/// Downsamples the vertex chain to at most [`MAX_POLYGON_POINTS`]
/// vertices and rotates it so the bottom-most vertex comes first.
///
/// Relative order is preserved throughout: downsampling keeps every
/// skip-th vertex of the walk, and the rotation moves the prefix before
/// the pivot to the end. Among equal maximum-y vertices the first one
/// in walk order wins.
fn downsample_and_canonicalize(points: Vec<[u32; 2]>) -> Vec<[u32; 2]> {
    if points.is_empty() {
        return points;
    }

    let skip = (points.len() / MAX_POLYGON_POINTS).max(1);
    let mut sparse: Vec<[u32; 2]> = points.into_iter().step_by(skip).collect();

    let mut bottom_index = 0;
    let mut max_y = sparse[0][1];
    for (i, point) in sparse.iter().enumerate().skip(1) {
        if point[1] > max_y {
            max_y = point[1];
            bottom_index = i;
        }
    }
    sparse.rotate_left(bottom_index);
    sparse
}
