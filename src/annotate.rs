//! Rendering of detections onto a copy of the source image.

use font8x8::UnicodeFonts;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut},
    rect::Rect,
};

use crate::Detection;

/// Side of a glyph cell in the built-in font, in pixels at scale 1.
const GLYPH_SIZE: u32 = 8;
/// Upper bound for both line thickness and font scale.
pub const MAX_STROKE: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationStyle {
    pub color: Rgb<u8>,
    /// Rectangle line thickness in pixels, clamped to `1..=MAX_STROKE`.
    pub thickness: u32,
    /// Integer glyph magnification; glyph strokes are this many pixels wide.
    /// Clamped to `1..=MAX_STROKE`.
    pub font_scale: u32,
    /// Distance between the label baseline and the top edge of the box.
    pub label_offset: i32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: Rgb([0, 255, 0]),
            thickness: 2,
            font_scale: 1,
            label_offset: 10,
        }
    }
}

pub struct Annotated {
    pub image: RgbImage,
    /// Number of boxes drawn, one per detection.
    pub rectangles: usize,
}

/// Draws every detection as a box plus a `"<label>: <confidence>"` caption.
pub fn annotate(img: &DynamicImage, detections: &[Detection], style: &AnnotationStyle) -> Annotated {
    let mut image = img.to_rgb8();
    let mut rectangles = 0;

    for det in detections {
        let [x1, y1, x2, y2] = det.xyxy().map(|v| v as i32);
        draw_box(&mut image, (x1, y1), (x2, y2), style);
        draw_label(&mut image, &det.caption(), (x1, y1 - style.label_offset), style);
        rectangles += 1;
    }

    tracing::debug!(rectangles, "annotated image");

    Annotated { image, rectangles }
}

fn draw_box(image: &mut RgbImage, (x1, y1): (i32, i32), (x2, y2): (i32, i32), style: &AnnotationStyle) {
    let thickness = style.thickness.clamp(1, MAX_STROKE) as i32;
    for i in 0..thickness {
        // negative offsets grow the outline outwards, positive ones inwards
        let offset = i - thickness / 2;
        let width = x2 - x1 - 2 * offset + 1;
        let height = y2 - y1 - 2 * offset + 1;
        if width <= 0 || height <= 0 {
            continue;
        }
        let rect = Rect::at(x1 + offset, y1 + offset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, rect, style.color);
    }
}

/// Renders `text` with its baseline at `origin.1`, starting at `origin.0`.
fn draw_label(image: &mut RgbImage, text: &str, (x, baseline): (i32, i32), style: &AnnotationStyle) {
    let scale = style.font_scale.clamp(1, MAX_STROKE);
    let advance = (GLYPH_SIZE * scale) as i32;
    let top = baseline - advance;

    for (n, ch) in text.chars().enumerate() {
        let Some(glyph) = font8x8::BASIC_FONTS.get(ch).or_else(|| font8x8::BASIC_FONTS.get('?'))
        else {
            continue;
        };
        let left = x + n as i32 * advance;

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = left + (col * scale) as i32;
                let py = top + (row as u32 * scale) as i32;
                draw_filled_rect_mut(image, Rect::at(px, py).of_size(scale, scale), style.color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn blank(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, BLACK))
    }

    #[test]
    fn no_detections_leaves_pixels_untouched() {
        let img = blank(32, 32);
        let out = annotate(&img, &[], &AnnotationStyle::default());
        assert_eq!(out.rectangles, 0);
        assert_eq!(out.image, img.to_rgb8());
    }

    #[test]
    fn draws_one_rectangle_per_detection() {
        let dets = vec![
            Detection::new(10.0, 30.0, 40.0, 60.0, "bottle", 0, 0.9),
            Detection::new(50.0, 70.0, 90.0, 95.0, "bottle", 0, 0.4),
        ];
        let out = annotate(&blank(100, 100), &dets, &AnnotationStyle::default());
        assert_eq!(out.rectangles, dets.len());

        // both outline pixels of the default 2px line are set
        assert_eq!(*out.image.get_pixel(10, 45), GREEN);
        assert_eq!(*out.image.get_pixel(9, 45), GREEN);
        assert_eq!(*out.image.get_pixel(40, 45), GREEN);
        assert_eq!(*out.image.get_pixel(25, 60), GREEN);
        // interior stays clear
        assert_eq!(*out.image.get_pixel(25, 45), BLACK);
        assert_eq!(*out.image.get_pixel(70, 85), BLACK);
    }

    #[test]
    fn label_sits_above_the_box() {
        let dets = vec![Detection::new(10.0, 40.0, 60.0, 80.0, "bottle", 0, 0.9)];
        let style = AnnotationStyle {
            thickness: 1,
            ..Default::default()
        };
        let out = annotate(&blank(100, 100), &dets, &style);

        let label_rows = 22..30;
        let inked = out
            .image
            .enumerate_pixels()
            .filter(|(_, y, p)| label_rows.contains(y) && **p == GREEN)
            .count();
        assert!(inked > 0);
        // nothing drawn between the label baseline and the box
        assert!(out
            .image
            .enumerate_pixels()
            .filter(|(_, y, _)| (30..40).contains(y))
            .all(|(_, _, p)| *p == BLACK));
    }

    #[test]
    fn boxes_outside_the_image_are_clipped() {
        let dets = vec![Detection::new(0.0, 0.0, 200.0, 200.0, "bottle", 0, 0.5)];
        let out = annotate(&blank(20, 20), &dets, &AnnotationStyle::default());
        assert_eq!(out.rectangles, 1);
        assert_eq!(*out.image.get_pixel(0, 10), GREEN);
    }

    #[test]
    fn oversized_strokes_are_clamped() {
        let dets = vec![Detection::new(30.0, 40.0, 60.0, 70.0, "bottle", 0, 0.5)];
        let style = AnnotationStyle {
            thickness: u32::MAX,
            font_scale: u32::MAX,
            ..Default::default()
        };
        let out = annotate(&blank(100, 100), &dets, &style);
        assert_eq!(out.rectangles, 1);
        assert_eq!(*out.image.get_pixel(30, 55), GREEN);
        assert_eq!(*out.image.get_pixel(45, 70), GREEN);
    }

    #[test]
    fn does_not_modify_detections() {
        let dets = vec![Detection::new(1.0, 2.0, 3.0, 4.0, "bottle", 0, 0.5)];
        let before = dets.clone();
        annotate(&blank(10, 10), &dets, &AnnotationStyle::default());
        assert_eq!(dets, before);
    }
}
