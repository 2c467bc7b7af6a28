//! Visualization of generated masks and classified objects.
//!
//! Two overlay styles: colored mask overlays with a numeric index per
//! mask (for inspecting the generator's raw/suppressed output), and
//! bounding-box + label overlays for the final classified objects.

use crate::domain::Mask;
use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;

const BBOX_COLOR: Rgb<u8> = Rgb([229, 94, 76]);

const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([229, 94, 76]);

const LABEL_BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const INDEX_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const BORDER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Deterministic per-index overlay palette. Colors repeat after 12
/// masks, which inspection tolerates since adjacent indices differ.
const MASK_PALETTE: [Rgb<u8>; 12] = [
    Rgb([230, 25, 75]),
    Rgb([60, 180, 75]),
    Rgb([255, 225, 25]),
    Rgb([0, 130, 200]),
    Rgb([245, 130, 48]),
    Rgb([145, 30, 180]),
    Rgb([70, 240, 240]),
    Rgb([240, 50, 230]),
    Rgb([210, 245, 60]),
    Rgb([250, 190, 190]),
    Rgb([0, 128, 128]),
    Rgb([170, 110, 40]),
];

/// Configuration for overlay rendering.
///
/// Text annotations (mask indices, labels) are skipped when no font is
/// configured; boxes and mask colors are always drawn.
pub struct VisualizationConfig {
    /// The font to use for text rendering. If None, text rendering is skipped.
    pub font: Option<FontVec>,

    /// The scale factor for the font. Defaults to 24.0.
    pub font_scale: f32,

    /// Whether to draw contour borders on mask overlays.
    pub draw_borders: bool,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_scale: 24.0,
            draw_borders: true,
        }
    }
}

impl VisualizationConfig {
    /// Creates a VisualizationConfig with a font loaded from the specified path.
    pub fn with_font_path(font_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let font_data = std::fs::read(font_path)?;
        let font = FontVec::try_from_vec(font_data)
            .map_err(|_| format!("Failed to parse font file: {}", font_path.display()))?;

        Ok(Self {
            font: Some(font),
            ..Self::default()
        })
    }
}

/// Renders colored mask overlays with per-mask numeric index
/// annotations onto a copy of the image.
pub fn render_mask_overlay(
    image: &RgbImage,
    masks: &[Mask],
    config: &VisualizationConfig,
) -> RgbImage {
    let mut canvas = image.clone();

    for (index, mask) in masks.iter().enumerate() {
        let color = MASK_PALETTE[index % MASK_PALETTE.len()];
        blend_mask(&mut canvas, mask, color);

        if config.draw_borders {
            for contour in find_contours::<u32>(&mask.segmentation) {
                if contour.border_type != BorderType::Outer {
                    continue;
                }
                for point in &contour.points {
                    if point.x < canvas.width() && point.y < canvas.height() {
                        canvas.put_pixel(point.x, point.y, BORDER_COLOR);
                    }
                }
            }
        }

        if let Some(font) = &config.font
            && let Some((cx, cy)) = mask_centroid(mask)
        {
            draw_text_mut(
                &mut canvas,
                INDEX_TEXT_COLOR,
                cx as i32,
                cy as i32,
                config.font_scale,
                font,
                &index.to_string(),
            );
        }
    }

    canvas
}

/// A classified object ready for label visualization.
#[derive(Debug, Clone)]
pub struct LabeledBox {
    pub label: String,
    /// Pixel bounds `[x_min, y_min, x_max, y_max]`, exclusive max.
    pub bounds: [u32; 4],
}

/// Renders bounding boxes with label text over a white background strip
/// above each box.
pub fn render_label_boxes(
    image: &RgbImage,
    boxes: &[LabeledBox],
    config: &VisualizationConfig,
) -> RgbImage {
    let mut canvas = image.clone();

    for labeled in boxes {
        let [x_min, y_min, x_max, y_max] = labeled.bounds;
        let width = x_max.saturating_sub(x_min);
        let height = y_max.saturating_sub(y_min);
        if width == 0 || height == 0 {
            continue;
        }

        let rect = Rect::at(x_min as i32, y_min as i32).of_size(width, height);
        draw_hollow_rect_mut(&mut canvas, rect, BBOX_COLOR);

        if let Some(font) = &config.font {
            let text_width = measure_text_width(&labeled.label, font, config.font_scale)
                .max(1.0)
                .ceil() as u32;
            let text_height = config.font_scale.ceil() as u32;
            let strip_top = y_min.saturating_sub(text_height) as i32;

            let strip = Rect::at(x_min as i32, strip_top).of_size(text_width, text_height);
            draw_filled_rect_mut(&mut canvas, strip, LABEL_BACKGROUND_COLOR);
            draw_text_mut(
                &mut canvas,
                LABEL_TEXT_COLOR,
                x_min as i32,
                strip_top,
                config.font_scale,
                font,
                &labeled.label,
            );
        }
    }

    canvas
}

/// Alpha-blends a mask's foreground onto the canvas at 50% opacity.
fn blend_mask(canvas: &mut RgbImage, mask: &Mask, color: Rgb<u8>) {
    for (x, y, pixel) in mask.segmentation.enumerate_pixels() {
        if pixel.0[0] > 0
            && x < canvas.width()
            && y < canvas.height()
        {
            let base = canvas.get_pixel(x, y).0;
            let blended = Rgb([
                ((base[0] as u16 + color.0[0] as u16) / 2) as u8,
                ((base[1] as u16 + color.0[1] as u16) / 2) as u8,
                ((base[2] as u16 + color.0[2] as u16) / 2) as u8,
            ]);
            canvas.put_pixel(x, y, blended);
        }
    }
}

/// Mean coordinate of the mask's foreground pixels.
fn mask_centroid(mask: &Mask) -> Option<(u32, u32)> {
    let mut count = 0u64;
    let (mut sum_x, mut sum_y) = (0u64, 0u64);
    for (x, y, pixel) in mask.segmentation.enumerate_pixels() {
        if pixel.0[0] > 0 {
            count += 1;
            sum_x += x as u64;
            sum_y += y as u64;
        }
    }
    (count > 0).then(|| ((sum_x / count) as u32, (sum_y / count) as u32))
}

fn measure_text_width(text: &str, font: &FontVec, scale: f32) -> f32 {
    use ab_glyph::{Font, ScaleFont};

    let scaled_font = font.as_scaled(scale);
    text.chars()
        .map(|ch| scaled_font.h_advance(scaled_font.scaled_glyph(ch).id))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Mask;
    use image::{GrayImage, Luma};

    fn sample_mask() -> Mask {
        let mut grid = GrayImage::new(16, 16);
        for x in 4..8 {
            for y in 4..8 {
                grid.put_pixel(x, y, Luma([255]));
            }
        }
        Mask::from_segmentation(grid)
    }

    #[test]
    fn test_overlay_tints_foreground_only() {
        let image = RgbImage::from_pixel(16, 16, Rgb([0, 0, 0]));
        let config = VisualizationConfig {
            draw_borders: false,
            ..Default::default()
        };
        let overlay = render_mask_overlay(&image, &[sample_mask()], &config);
        assert_ne!(overlay.get_pixel(5, 5).0, [0, 0, 0]);
        assert_eq!(overlay.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_centroid_of_square() {
        assert_eq!(mask_centroid(&sample_mask()), Some((5, 5)));
    }

    #[test]
    fn test_label_boxes_draw_rect_edges() {
        let image = RgbImage::from_pixel(32, 32, Rgb([0, 0, 0]));
        let boxes = vec![LabeledBox {
            label: "ripe".into(),
            bounds: [4, 4, 12, 12],
        }];
        let rendered = render_label_boxes(&image, &boxes, &VisualizationConfig::default());
        assert_eq!(rendered.get_pixel(4, 4).0, BBOX_COLOR.0);
        assert_eq!(rendered.get_pixel(16, 16).0, [0, 0, 0]);
    }

    #[test]
    fn test_degenerate_box_is_skipped() {
        let image = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let boxes = vec![LabeledBox {
            label: "x".into(),
            bounds: [3, 3, 3, 3],
        }];
        let rendered = render_label_boxes(&image, &boxes, &VisualizationConfig::default());
        assert_eq!(rendered.get_pixel(3, 3).0, [0, 0, 0]);
    }
}
