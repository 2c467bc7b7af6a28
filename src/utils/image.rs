//! Image loading and masking helpers.

use crate::core::{SegError, SegResult};
use image::{DynamicImage, GrayImage, Rgb, RgbImage, imageops};

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns [`SegError::ImageLoad`] naming the offending path; the
/// pipeline treats this as a per-image recoverable error.
pub fn load_image(path: &std::path::Path) -> SegResult<RgbImage> {
    let img = image::open(path).map_err(|e| SegError::image_load(path, e))?;
    Ok(dynamic_to_rgb(img))
}

/// Applies a binary mask to an image, retaining color inside the mask
/// and setting everything else to white.
///
/// Mask pixels with value 0 are background; anything greater is
/// foreground. The mask must have the same dimensions as the image.
pub fn mask_to_white_background(image: &RgbImage, mask: &GrayImage) -> RgbImage {
    let mut out = image.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let inside = mask
            .get_pixel_checked(x, y)
            .map(|p| p.0[0] > 0)
            .unwrap_or(false);
        if !inside {
            *pixel = Rgb([255, 255, 255]);
        }
    }
    out
}

/// Crops an image with a white background to the minimal bounding box
/// containing non-white content.
///
/// Returns the crop together with its pixel bounds
/// `[x_min, y_min, x_max, y_max]` (exclusive max).
///
/// # Errors
///
/// Returns [`SegError::EmptyContent`] when every pixel is pure white;
/// a zero-sized crop is never returned silently.
pub fn crop_object_from_white_background(image: &RgbImage) -> SegResult<(RgbImage, [u32; 4])> {
    let (width, height) = image.dimensions();
    let (mut x_min, mut y_min) = (width, height);
    let (mut x_max, mut y_max) = (0u32, 0u32);
    let mut found = false;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0 != [255, 255, 255] {
            found = true;
            x_min = x_min.min(x);
            y_min = y_min.min(y);
            x_max = x_max.max(x);
            y_max = y_max.max(y);
        }
    }

    if !found {
        return Err(SegError::empty_content(
            "no non-white pixels to crop from white background",
        ));
    }

    let bounds = [x_min, y_min, x_max + 1, y_max + 1];
    let crop = imageops::crop_imm(image, x_min, y_min, x_max - x_min + 1, y_max - y_min + 1)
        .to_image();
    Ok((crop, bounds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_fully_white_image_is_an_error() {
        let white = RgbImage::from_pixel(16, 16, Rgb([255, 255, 255]));
        let err = crop_object_from_white_background(&white).unwrap_err();
        assert!(matches!(err, SegError::EmptyContent { .. }));
    }

    #[test]
    fn test_crop_bounds_are_minimal() {
        let mut image = RgbImage::from_pixel(32, 32, Rgb([255, 255, 255]));
        for x in 5..12 {
            for y in 8..20 {
                image.put_pixel(x, y, Rgb([200, 30, 30]));
            }
        }
        let (crop, bounds) = crop_object_from_white_background(&image).unwrap();
        assert_eq!(bounds, [5, 8, 12, 20]);
        assert_eq!(crop.dimensions(), (7, 12));
    }

    #[test]
    fn test_single_pixel_crop() {
        let mut image = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));
        image.put_pixel(3, 4, Rgb([0, 0, 0]));
        let (crop, bounds) = crop_object_from_white_background(&image).unwrap();
        assert_eq!(bounds, [3, 4, 4, 5]);
        assert_eq!(crop.dimensions(), (1, 1));
    }

    #[test]
    fn test_mask_to_white_background() {
        let image = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        let mut mask = GrayImage::new(4, 4);
        mask.put_pixel(1, 1, Luma([255]));

        let masked = mask_to_white_background(&image, &mask);
        assert_eq!(masked.get_pixel(1, 1).0, [10, 20, 30]);
        assert_eq!(masked.get_pixel(0, 0).0, [255, 255, 255]);
    }
}
