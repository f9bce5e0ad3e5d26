use owned_ttf_parser::{Face, GlyphId};
use std::collections::HashMap;
use std::path::PathBuf;

/// Name of the built-in fallback font
pub const BASE_FONT_NAME: &str = "Helvetica";

/// Helvetica advance widths for the printable ASCII range (space through tilde),
/// in thousandths of an em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' - '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0' - '9'
    278, 278, 584, 584, 584, 556, 1015, // ':' - '@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A' - 'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N' - 'Z'
    278, 278, 278, 469, 556, 333, // '[' - '`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a' - 'm'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n' - 'z'
    334, 260, 334, 584, // '{' - '~'
];

/// Helvetica's missing width, used for every code outside the ASCII range
const HELVETICA_FALLBACK_WIDTH: f32 = 0.556;

/// The glyph `ch` maps to in `face`, ignoring mappings to `.notdef`
pub(crate) fn mapped_glyph(face: &Face<'_>, ch: char) -> Option<GlyphId> {
    face.glyph_index(ch).filter(|gid| gid.0 > 0)
}

/// The glyph drawn for characters `face` doesn't map: U+FFFD, then `?`, then `.notdef`
pub(crate) fn replacement_glyph(face: &Face<'_>) -> GlyphId {
    mapped_glyph(face, '\u{FFFD}')
        .or_else(|| mapped_glyph(face, '?'))
        .unwrap_or(GlyphId(0))
}

/// The glyph actually drawn for `ch`
pub(crate) fn drawn_glyph(face: &Face<'_>, ch: char) -> GlyphId {
    mapped_glyph(face, ch).unwrap_or_else(|| replacement_glyph(face))
}

/// Everything the text fitter needs to know about the font a line is drawn with.
///
/// Widths, ascender and descender are in em units (font design units divided by
/// units per em), so multiplying by a font size gives PDF points.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    /// Resource name of the font, safe to use as a PDF name
    pub name: String,
    /// Font file to embed, [None] for the built-in base font
    pub file_path: Option<PathBuf>,
    /// Face index within the font file (collections hold several)
    pub face_index: u32,
    /// Single-byte addressing: only codes up to 255 can be drawn
    pub simple: bool,
    /// `>= 0` selects composite addressing, where every glyph advances by one
    /// em; `< 0` uses the per-glyph widths below
    pub ordering: i32,
    pub ascender: f32,
    pub descender: f32,
    pub glyph_widths: HashMap<char, f32>,
    /// Width used for characters missing from [FontDescriptor::glyph_widths]
    pub fallback_width: f32,
}

impl FontDescriptor {
    /// The built-in base font: Helvetica, single-byte addressing and metrics for the
    /// printable ASCII range
    pub fn base_font() -> FontDescriptor {
        let glyph_widths = (' '..='~')
            .zip(HELVETICA_WIDTHS)
            .map(|(ch, w)| (ch, w as f32 / 1000.0))
            .collect();

        FontDescriptor {
            name: BASE_FONT_NAME.to_string(),
            file_path: None,
            face_index: 0,
            simple: true,
            ordering: -1,
            ascender: 0.718,
            descender: -0.207,
            glyph_widths,
            fallback_width: HELVETICA_FALLBACK_WIDTH,
        }
    }

    /// A composite font where every glyph advances by exactly one em
    pub fn composite(name: &str, ordering: u16, ascender: f32, descender: f32) -> FontDescriptor {
        FontDescriptor {
            name: name.to_string(),
            file_path: None,
            face_index: 0,
            simple: false,
            ordering: ordering as i32,
            ascender,
            descender,
            glyph_widths: HashMap::new(),
            fallback_width: 1.0,
        }
    }

    /// Measure a parsed font face for the characters of `text`.
    ///
    /// The face is embedded with two-byte glyph ids, so the descriptor is never
    /// simple, and widths come from the horizontal metrics of each glyph.
    pub fn from_face(
        name: &str,
        file_path: Option<PathBuf>,
        face_index: u32,
        face: &Face<'_>,
        text: &str,
    ) -> FontDescriptor {
        let units_per_em = face.units_per_em().max(1) as f32;
        let advance = |gid: GlyphId| {
            face.glyph_hor_advance(gid)
                .map(|w| w as f32 / units_per_em)
        };

        let mut glyph_widths = HashMap::new();
        for ch in text.chars() {
            if glyph_widths.contains_key(&ch) {
                continue;
            }
            if let Some(width) = mapped_glyph(face, ch).and_then(advance) {
                glyph_widths.insert(ch, width);
            }
        }

        let fallback_width = advance(replacement_glyph(face)).unwrap_or(0.5);

        FontDescriptor {
            name: name.to_string(),
            file_path,
            face_index,
            simple: false,
            ordering: -1,
            ascender: face.ascender() as f32 / units_per_em,
            descender: face.descender() as f32 / units_per_em,
            glyph_widths,
            fallback_width,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.ordering >= 0
    }

    pub fn is_builtin(&self) -> bool {
        self.file_path.is_none()
    }

    /// The advance of `ch` in em units
    pub fn glyph_width(&self, ch: char) -> f32 {
        self.glyph_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.fallback_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_font_covers_printable_ascii() {
        let font = FontDescriptor::base_font();
        assert_eq!(font.glyph_widths.len(), 95);
        assert!(font.simple);
        assert!(!font.is_composite());
        assert!(font.is_builtin());
        assert_eq!(font.glyph_width('A'), 0.667);
        assert_eq!(font.glyph_width('i'), 0.222);
        assert_eq!(font.glyph_width('@'), 1.015);
        assert_eq!(font.glyph_width('~'), 0.584);
        assert_eq!(font.glyph_width('é'), HELVETICA_FALLBACK_WIDTH);
    }

    #[test]
    fn unmapped_characters_measure_the_replacement_glyph() {
        let bytes =
            std::fs::read(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts/Tuffy.ttf")).unwrap();
        let face = Face::parse(&bytes, 0).unwrap();

        // Tuffy has no U+FFFD, so `?` stands in for anything it doesn't map
        assert_eq!(replacement_glyph(&face), mapped_glyph(&face, '?').unwrap());
        assert_eq!(drawn_glyph(&face, '中'), replacement_glyph(&face));
        assert_eq!(drawn_glyph(&face, 'a'), mapped_glyph(&face, 'a').unwrap());

        let font = FontDescriptor::from_face("Tuffy", None, 0, &face, "a中?");
        assert!(!font.glyph_widths.contains_key(&'中'));
        assert_eq!(font.glyph_width('中'), font.glyph_width('?'));
        assert_ne!(font.glyph_width('a'), 0.0);
    }

    #[test]
    fn composite_fonts_use_ordering() {
        let font = FontDescriptor::composite("KaiTi", 2, 0.88, -0.12);
        assert!(font.is_composite());
        assert!(!font.simple);
        assert_eq!(font.glyph_width('中'), 1.0);
    }
}
