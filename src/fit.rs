//! Fitting a line of text into its OCR bounding box.
//!
//! The font size is fixed by the caller. What [fit] solves for is the character
//! spacing that stretches or squeezes the run so that its rendered width equals
//! the usable span of the box, along with where the baseline starts and how the
//! text is rotated.
//!
//! Character spacing is in unscaled text-space units, the way the `Tc` operator
//! takes it: a glyph advances by `width * font_size + spacing`.

use crate::descriptor::FontDescriptor;
use crate::rect::Rect;
use crate::transform::{Morph, Rotation, Transform};
use crate::units::Pt;
use crate::{OverlayError, Result};

/// Relative tolerance used when deciding whether a run fits its span
pub const FIT_TOLERANCE: f32 = 1e-3;

/// Knobs for [fit]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Rotation in degrees, any multiple of 90
    pub rotation: i32,
    /// Extra transform applied after the rotation
    pub morph: Option<Morph>,
    /// Lower bound for the solved character spacing; unbounded when [None]
    pub min_spacing: Option<Pt>,
}

impl FitOptions {
    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_morph(mut self, morph: Morph) -> Self {
        self.morph = Some(morph);
        self
    }

    pub fn with_min_spacing(mut self, min_spacing: Pt) -> Self {
        self.min_spacing = Some(min_spacing);
        self
    }
}

/// Everything needed to draw one fitted line
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementResult {
    /// `false` when there was nothing to draw
    pub success: bool,
    /// The text as it will be drawn, after newline and encoding clean-up
    pub text: String,
    pub font_size: Pt,
    pub char_spacing: Pt,
    pub rendered_width_estimate: Pt,
    pub available_width: Pt,
    pub fits: bool,
    /// Start of the baseline, in the rotated content-stream coordinates
    pub anchor: (Pt, Pt),
    pub rotation: Rotation,
    /// Content-space morph transform, applied after `rotation`
    pub morph: Option<Transform>,
}

fn normalize_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Single-byte fonts can't address anything past Latin-1
fn encodable_text(text: String, font: &FontDescriptor) -> String {
    if !font.simple {
        return text;
    }
    text.chars()
        .map(|c| if (c as u32) > 0xFF { '?' } else { c })
        .collect()
}

fn base_width(text: &str, font: &FontDescriptor, font_size: Pt) -> Pt {
    if font.is_composite() {
        return font_size * text.chars().count() as f32;
    }
    text.chars()
        .map(|c| font_size * font.glyph_width(c))
        .sum()
}

fn usable_span(rect: &Rect, rotation: Rotation) -> Pt {
    if rotation.is_vertical() {
        Pt(rect.h() as f32)
    } else {
        Pt(rect.w() as f32)
    }
}

/// The baseline start in image space (y grows downward from the top of the page)
fn image_anchor(rect: &Rect, rotation: Rotation, ascent: Pt) -> (Pt, Pt) {
    let x0 = Pt(rect.x0 as f32);
    let y0 = Pt(rect.y0 as f32);
    let x1 = Pt(rect.x1 as f32);
    let y1 = Pt(rect.y1 as f32);
    match rotation {
        Rotation::Identity => (x0, y0 + ascent),
        Rotation::Ccw90 => (x0 + ascent, y1),
        Rotation::Flip180 => (x1, y1 - ascent),
        Rotation::Cw90 => (x1 - ascent, y0),
    }
}

/// Express an image-space point in the coordinates the rotation matrix maps back
/// onto the page
fn content_anchor((x, y): (Pt, Pt), rotation: Rotation, page_height: Pt) -> (Pt, Pt) {
    match rotation {
        Rotation::Identity => (x, page_height - y),
        Rotation::Ccw90 => (page_height - y, -x),
        Rotation::Flip180 => (-x, y - page_height),
        Rotation::Cw90 => (y - page_height, x),
    }
}

fn fits_span(rendered: Pt, span: Pt) -> bool {
    *rendered <= *span + FIT_TOLERANCE * span.0.abs().max(1.0)
}

/// Fit `text` into `rect` on a page of height `page_height`, drawn with `font` at
/// `font_size`.
///
/// Fails with [OverlayError::Geometry] for an empty rectangle or an unusable font
/// size and with [OverlayError::Rotation] for a rotation that is not a multiple
/// of 90 degrees. Blank text is not an error: the result has `success == false`.
pub fn fit(
    rect: &Rect,
    text: &str,
    font: &FontDescriptor,
    font_size: Pt,
    page_height: Pt,
    options: &FitOptions,
) -> Result<PlacementResult> {
    if rect.empty() {
        return Err(OverlayError::Geometry(format!("empty rectangle {rect}")));
    }
    if !font_size.is_finite() || *font_size <= 0.0 {
        return Err(OverlayError::Geometry(format!("invalid font size {font_size}")));
    }
    let rotation = Rotation::from_degrees(options.rotation)?;
    let span = usable_span(rect, rotation);

    let text = normalize_text(text);
    if text.trim().is_empty() {
        return Ok(PlacementResult {
            success: false,
            text,
            font_size,
            char_spacing: Pt(0.0),
            rendered_width_estimate: Pt(0.0),
            available_width: span,
            fits: false,
            anchor: (Pt(0.0), Pt(0.0)),
            rotation,
            morph: None,
        });
    }

    let text = encodable_text(text, font);
    let n = text.chars().count();
    let base = base_width(&text, font, font_size);

    let mut spacing = if n > 1 {
        (span - base) / (n - 1) as f32
    } else {
        Pt(0.0)
    };
    if let Some(min) = options.min_spacing {
        if spacing < min {
            spacing = min;
        }
    }

    let rendered = base + spacing * (n.saturating_sub(1)) as f32;
    let ascent = font_size * font.ascender;
    let anchor = content_anchor(image_anchor(rect, rotation, ascent), rotation, page_height);

    Ok(PlacementResult {
        success: true,
        text,
        font_size,
        char_spacing: spacing,
        rendered_width_estimate: rendered,
        available_width: span,
        fits: fits_span(rendered, span),
        anchor,
        rotation,
        morph: options.morph.map(|m| m.to_content(page_height)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const PAGE_HEIGHT: Pt = Pt(1000.0);

    fn flat_font(width: f32, simple: bool) -> FontDescriptor {
        FontDescriptor {
            name: "Flat".into(),
            file_path: None,
            face_index: 0,
            simple,
            ordering: -1,
            ascender: 0.75,
            descender: -0.25,
            glyph_widths: HashMap::from([('A', width), ('B', width)]),
            fallback_width: width,
        }
    }

    fn close(a: Pt, b: Pt) -> bool {
        (*a - *b).abs() < 1e-3
    }

    fn fit_default(rect: &Rect, text: &str, font: &FontDescriptor, size: f32) -> PlacementResult {
        fit(rect, text, font, Pt(size), PAGE_HEIGHT, &FitOptions::default()).unwrap()
    }

    #[test]
    fn stretches_two_glyphs_across_the_box() {
        let rect = Rect::new(0, 0, 100, 20);
        let placement = fit_default(&rect, "AB", &flat_font(0.6, false), 20.0);
        assert!(placement.success);
        assert!(close(placement.char_spacing, Pt(76.0)));
        assert!(close(placement.rendered_width_estimate, Pt(100.0)));
        assert!(close(placement.available_width, Pt(100.0)));
        assert!(placement.fits);
    }

    #[test]
    fn blank_text_is_not_drawn() {
        let rect = Rect::new(0, 0, 100, 20);
        for text in ["", "   ", "\r\n"] {
            let placement = fit_default(&rect, text, &flat_font(0.6, false), 20.0);
            assert!(!placement.success);
            assert_eq!(placement.char_spacing, Pt(0.0));
            assert_eq!(placement.rendered_width_estimate, Pt(0.0));
            assert_eq!(placement.available_width, Pt(100.0));
            assert!(!placement.fits);
        }
    }

    #[test]
    fn composite_fonts_squeeze_negative() {
        let rect = Rect::new(0, 0, 40, 12);
        let font = FontDescriptor::composite("KaiTi", 2, 0.88, -0.12);
        let placement = fit_default(&rect, "中文字体名", &font, 10.0);
        assert!(close(placement.char_spacing, Pt(-2.5)));
        assert!(close(placement.rendered_width_estimate, Pt(40.0)));
        assert!(placement.fits);
    }

    #[test]
    fn rendered_width_matches_span_for_every_rotation_and_mode() {
        let rect = Rect::new(30, 40, 230, 90);
        let fonts = [
            FontDescriptor::base_font(),
            FontDescriptor::composite("Ming", 1, 0.8, -0.2),
            flat_font(0.45, false),
        ];
        for font in &fonts {
            for rotation in [0, 90, 180, 270, -90, 450] {
                let options = FitOptions::default().with_rotation(rotation);
                let placement =
                    fit(&rect, "Hello, OCR", font, Pt(12.0), PAGE_HEIGHT, &options).unwrap();
                let span = if placement.rotation.is_vertical() { 50.0 } else { 200.0 };
                assert!(close(placement.available_width, Pt(span)));
                assert!(
                    close(placement.rendered_width_estimate, Pt(span)),
                    "{} at {rotation}: {:?}",
                    font.name,
                    placement.rendered_width_estimate
                );
            }
        }
    }

    #[test]
    fn span_axis_follows_rotation() {
        let rect = Rect::new(0, 0, 30, 120);
        let font = flat_font(0.5, false);
        let upright = fit_default(&rect, "AB", &font, 10.0);
        let turned = fit(
            &rect,
            "AB",
            &font,
            Pt(10.0),
            PAGE_HEIGHT,
            &FitOptions::default().with_rotation(90),
        )
        .unwrap();
        assert_eq!(upright.available_width, Pt(30.0));
        assert_eq!(turned.available_width, Pt(120.0));
        assert_eq!(turned.rotation, Rotation::Ccw90);
    }

    #[test]
    fn degenerate_rect_is_an_error() {
        let font = flat_font(0.5, false);
        for rect in [Rect::new(10, 10, 10, 30), Rect::new(10, 30, 50, 20)] {
            assert!(matches!(
                fit(&rect, "AB", &font, Pt(10.0), PAGE_HEIGHT, &FitOptions::default()),
                Err(OverlayError::Geometry(_))
            ));
        }
    }

    #[test]
    fn bad_font_size_is_an_error() {
        let rect = Rect::new(0, 0, 10, 10);
        let font = flat_font(0.5, false);
        for size in [0.0, -3.0, f32::NAN] {
            assert!(fit(&rect, "AB", &font, Pt(size), PAGE_HEIGHT, &FitOptions::default()).is_err());
        }
    }

    #[test]
    fn odd_rotation_is_an_error() {
        let rect = Rect::new(0, 0, 10, 10);
        let options = FitOptions::default().with_rotation(45);
        let result = fit(&rect, "", &flat_font(0.5, false), Pt(5.0), PAGE_HEIGHT, &options);
        assert!(matches!(result, Err(OverlayError::Rotation(45))));
    }

    #[test]
    fn fitting_is_pure() {
        let rect = Rect::new(5, 5, 305, 25);
        let font = FontDescriptor::base_font();
        let a = fit_default(&rect, "Same input", &font, 14.0);
        let b = fit_default(&rect, "Same input", &font, 14.0);
        assert_eq!(a, b);
    }

    #[test]
    fn simple_fonts_replace_wide_characters() {
        let rect = Rect::new(0, 0, 100, 10);
        let placement = fit_default(&rect, "a→b\nc", &FontDescriptor::base_font(), 8.0);
        assert_eq!(placement.text, "a?b c");

        let wide = fit_default(&rect, "a→b", &flat_font(0.5, false), 8.0);
        assert_eq!(wide.text, "a→b");
    }

    #[test]
    fn single_glyph_has_no_spacing() {
        let rect = Rect::new(0, 0, 100, 10);
        let placement = fit_default(&rect, "A", &flat_font(0.5, false), 8.0);
        assert_eq!(placement.char_spacing, Pt(0.0));
        assert!(close(placement.rendered_width_estimate, Pt(4.0)));
        assert!(placement.fits);
    }

    #[test]
    fn overflowing_single_glyph_does_not_fit() {
        let rect = Rect::new(0, 0, 3, 10);
        let placement = fit_default(&rect, "A", &flat_font(0.5, false), 8.0);
        assert!(!placement.fits);
    }

    #[test]
    fn min_spacing_clamps_the_solution() {
        let rect = Rect::new(0, 0, 40, 12);
        let font = FontDescriptor::composite("KaiTi", 2, 0.88, -0.12);
        let options = FitOptions::default().with_min_spacing(Pt(-1.0));
        let placement = fit(&rect, "中文字体名", &font, Pt(10.0), PAGE_HEIGHT, &options).unwrap();
        assert_eq!(placement.char_spacing, Pt(-1.0));
        assert!(close(placement.rendered_width_estimate, Pt(46.0)));
        assert!(!placement.fits);
    }

    #[test]
    fn anchors_land_on_the_baseline_corner() {
        let rect = Rect::new(100, 200, 300, 260);
        let font = flat_font(0.5, false);
        let size = 20.0;
        let ascent = 0.75 * size;
        let expected_image_anchor = [
            (0, (100.0, 200.0 + ascent)),
            (90, (100.0 + ascent, 260.0)),
            (180, (300.0, 260.0 - ascent)),
            (270, (300.0 - ascent, 200.0)),
        ];

        for (degrees, (x, y)) in expected_image_anchor {
            let options = FitOptions::default().with_rotation(degrees);
            let placement = fit(&rect, "AB", &font, Pt(size), PAGE_HEIGHT, &options).unwrap();
            let (px, py) = placement.rotation.matrix().apply(placement.anchor);
            assert!(close(px, Pt(x)), "{degrees}: x {px}");
            assert!(close(py, PAGE_HEIGHT - Pt(y)), "{degrees}: y {py}");
        }
    }

    #[test]
    fn morph_is_carried_in_content_space() {
        let rect = Rect::new(0, 0, 100, 20);
        let morph = Morph::new((Pt(50.0), Pt(10.0)), Transform::scale(1.0, 2.0));
        let options = FitOptions::default().with_morph(morph);
        let placement = fit(&rect, "AB", &flat_font(0.5, false), Pt(10.0), PAGE_HEIGHT, &options)
            .unwrap();
        assert_eq!(placement.morph, Some(morph.to_content(PAGE_HEIGHT)));
        assert!(fit_default(&rect, "AB", &flat_font(0.5, false), 10.0).morph.is_none());
    }
}
