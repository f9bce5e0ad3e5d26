use crate::{
    descriptor::{drawn_glyph, mapped_glyph, replacement_glyph},
    refs::{ObjectReferences, RefType},
    Result,
};
use id_arena::Id;
use owned_ttf_parser::{AsFaceRef, GlyphId, OwnedFace};
use pdf_writer::{
    types::{FontFlags, SystemInfo},
    Finish, Name, Pdf, Ref, Str,
};
use std::collections::HashMap;
use std::path::Path;

/// Where the glyphs of a [Font] come from
pub enum FontKind {
    /// One of the standard fonts every PDF reader provides, drawn with single-byte
    /// WinAnsi codes and never embedded
    Base14 { base_font: String },
    /// A TrueType face embedded in its entirety and addressed by two-byte glyph ids
    TrueType { face: OwnedFace },
}

/// A font as it is written into the PDF.
///
/// Fonts are stored "globally" within the document and referred to from page
/// content by their resource name, which is unique per document.
pub struct Font {
    name: String,
    pub kind: FontKind,
}

impl Font {
    /// A base-14 font, used under the resource name `base_font`
    pub fn base14<S: ToString>(base_font: S) -> Font {
        let base_font = base_font.to_string();
        Font {
            name: base_font.clone(),
            kind: FontKind::Base14 { base_font },
        }
    }

    /// Load a font from raw bytes, parsing the font and returning an error if the font
    /// could not be parsed
    pub fn load<S: ToString>(name: S, bytes: Vec<u8>, index: u32) -> Result<Font> {
        let face = OwnedFace::from_vec(bytes, index)?;
        Ok(Font {
            name: name.to_string(),
            kind: FontKind::TrueType { face },
        })
    }

    /// Read and parse the face at `index` of the font file at `path`
    pub fn load_file<S: ToString, P: AsRef<Path>>(name: S, path: P, index: u32) -> Result<Font> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::load(name, bytes, index)
    }

    /// The resource name the font is referred to by in content streams
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename<S: ToString>(&mut self, name: S) {
        self.name = name.to_string();
    }

    /// Whether text is drawn with one byte per character
    pub fn is_simple(&self) -> bool {
        matches!(self.kind, FontKind::Base14 { .. })
    }

    fn face_name(face: &OwnedFace, name_id: u16) -> Option<String> {
        face.as_face_ref()
            .names()
            .into_iter()
            .find(|name| name.name_id == name_id && name.is_unicode())
            .and_then(|name| name.to_string())
    }

    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        match &self.kind {
            FontKind::Base14 { .. } => None,
            FontKind::TrueType { face } => mapped_glyph(face.as_face_ref(), ch).map(|gid| gid.0),
        }
    }

    /// The glyph drawn for characters the font doesn't map
    pub fn replacement_glyph_id(&self) -> Option<u16> {
        match &self.kind {
            FontKind::Base14 { .. } => None,
            FontKind::TrueType { face } => Some(replacement_glyph(face.as_face_ref()).0),
        }
    }

    /// Encode `text` into the codes a `Tj` operator takes for this font. Characters the
    /// font can't address fall back to a replacement glyph, U+FFFD, then `?`, then
    /// `.notdef`, the same glyph [crate::FontDescriptor::from_face] measures them with.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match &self.kind {
            FontKind::Base14 { .. } => text
                .chars()
                .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
                .collect(),
            FontKind::TrueType { face } => {
                let face = face.as_face_ref();
                text.chars()
                    .flat_map(|ch| drawn_glyph(face, ch).0.to_be_bytes())
                    .collect()
            }
        }
    }

    fn write_cid(
        &self,
        face: &OwnedFace,
        refs: &mut ObjectReferences,
        font_index: usize,
        writer: &mut Pdf,
    ) -> Ref {
        let font_descriptor_id = self.write_descriptor(face, refs, font_index, writer);

        let id = refs.gen(RefType::CidFont(font_index));

        let mut cid_font = writer.cid_font(id);
        cid_font.subtype(pdf_writer::types::CidFontType::Type2);
        cid_font.base_font(Name(self.name.as_bytes()));
        cid_font.system_info(SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        });
        cid_font.font_descriptor(font_descriptor_id);

        let advances = Self::glyph_advances(face);

        let scaling = 1000.0 / face.as_face_ref().units_per_em() as f32;

        // find the most popular width to use as the default
        // <width, count>
        let mut widths_counts: HashMap<u16, usize> = HashMap::new();
        for (_, advance) in advances.iter() {
            *widths_counts.entry(*advance).or_insert(0) += 1;
        }
        let most_common_width = widths_counts
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(&sz, _)| sz as f32 * scaling)
            .unwrap_or(1000.0);

        let id_widths: Vec<(u16, f32)> = advances
            .iter()
            .map(|&(gid, advance)| (gid, advance as f32 * scaling))
            .collect();

        let mut widths = cid_font.widths();
        let mut blocks = id_widths.into_iter();
        if let Some((first_cid, first_width)) = blocks.next() {
            let mut start_cid: u16 = first_cid;
            let mut current_widths: Vec<f32> = vec![first_width];
            for (cid, width) in blocks {
                if (cid - start_cid) as usize > current_widths.len() {
                    widths.consecutive(start_cid, current_widths.clone());
                    start_cid = cid;
                    current_widths.clear();
                }
                current_widths.push(width);
            }
            widths.consecutive(start_cid, current_widths);
        }
        widths.finish();

        cid_font.default_width(most_common_width);
        cid_font.cid_to_gid_map_predefined(Name(b"Identity"));

        id
    }

    fn write_font_data(
        face: &OwnedFace,
        refs: &mut ObjectReferences,
        font_index: usize,
        writer: &mut Pdf,
    ) -> Ref {
        let id = refs.gen(RefType::FontData(font_index));

        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(
            face.as_slice(),
            miniz_oxide::deflate::CompressionLevel::DefaultLevel as u8,
        );
        let mut stream = writer.stream(id, compressed.as_slice());
        stream.filter(pdf_writer::Filter::FlateDecode);
        stream.pair(Name(b"Length1"), face.as_slice().len() as i32);

        id
    }

    fn write_descriptor(
        &self,
        face: &OwnedFace,
        refs: &mut ObjectReferences,
        font_index: usize,
        writer: &mut Pdf,
    ) -> Ref {
        let font_data_stream_id = Self::write_font_data(face, refs, font_index, writer);
        let face_ref = face.as_face_ref();

        let gids = Self::glyph_ids(face);
        let gids_augmented = Self::glyphs_sizing(face, &gids);

        let max_width = gids_augmented
            .values()
            .map(|&(_, (w, _))| w)
            .max()
            .unwrap_or_default();
        let max_height = gids_augmented
            .values()
            .map(|&(_, (_, h))| h)
            .max()
            .unwrap_or_default();
        let sum_width: usize = gids_augmented.values().map(|&(_, (w, _))| w as usize).sum();
        let avg_width = sum_width as f32 / gids_augmented.len().max(1) as f32;

        let id = refs.gen(RefType::FontDescriptor(font_index));

        let mut descriptor = writer.font_descriptor(id);
        descriptor.name(Name(self.name.as_bytes()));
        if let Some(family) = Self::face_name(face, owned_ttf_parser::name_id::FAMILY) {
            descriptor.family(Str(family.as_bytes()));
        }
        descriptor.weight(face_ref.weight().to_number());

        let mut flags: FontFlags = FontFlags::NON_SYMBOLIC;
        if face_ref.is_monospaced() {
            flags.set(FontFlags::FIXED_PITCH, true);
        }
        if face_ref.is_italic() {
            flags.set(FontFlags::ITALIC, true);
        }
        descriptor.flags(flags);

        let scaling = 1000.0 / face_ref.units_per_em() as f32;
        let bbox = face_ref.global_bounding_box();
        descriptor.bbox(pdf_writer::Rect {
            x1: bbox.x_min as f32 * scaling,
            y1: bbox.y_min as f32 * scaling,
            x2: bbox.x_max as f32 * scaling,
            y2: (bbox.y_max as f32).max(max_height as f32) * scaling,
        });
        descriptor.italic_angle(face_ref.italic_angle());
        descriptor.ascent(face_ref.ascender() as f32 * scaling);
        descriptor.descent(face_ref.descender() as f32 * scaling);
        descriptor.leading(face_ref.line_gap() as f32 * scaling);
        descriptor.cap_height(
            face_ref
                .capital_height()
                .map(|h| h as f32 * scaling)
                .unwrap_or(1000.0),
        );
        descriptor.x_height(
            face_ref
                .x_height()
                .unwrap_or_else(|| face_ref.capital_height().unwrap_or_default())
                as f32
                * scaling,
        );
        // not recorded in TrueType fonts; readers only use it as a hint
        descriptor.stem_v(80.0);
        descriptor.avg_width(avg_width * scaling);
        descriptor.max_width(max_width as f32 * scaling);
        descriptor.missing_width(max_width as f32 * scaling);

        descriptor.font_file2(font_data_stream_id);

        id
    }

    /// Every glyph the font maps a character to, with the first character mapping to it
    fn glyph_ids(face: &OwnedFace) -> HashMap<u16, char> {
        let mut map: HashMap<u16, char> = HashMap::new();

        let Some(cmap) = face.as_face_ref().tables().cmap else {
            return map;
        };
        for subtable in cmap.subtables.into_iter().filter(|table| table.is_unicode()) {
            subtable.codepoints(|codepoint: u32| {
                if let Ok(ch) = char::try_from(codepoint) {
                    if let Some(index) = subtable.glyph_index(codepoint).filter(|index| index.0 > 0)
                    {
                        map.entry(index.0).or_insert(ch);
                    }
                }
            });
        }

        map
    }

    /// Advance of every glyph text can be drawn with, `.notdef` included, in font
    /// units and sorted by glyph id
    fn glyph_advances(face: &OwnedFace) -> Vec<(u16, u16)> {
        let face_ref = face.as_face_ref();
        let mut advances: Vec<(u16, u16)> = Self::glyph_ids(face)
            .into_keys()
            .chain(std::iter::once(0))
            .filter_map(|gid| {
                face_ref
                    .glyph_hor_advance(GlyphId(gid))
                    .map(|advance| (gid, advance))
            })
            .collect();
        advances.sort_by_key(|&(gid, _)| gid);
        advances
    }

    fn glyphs_sizing(
        face: &OwnedFace,
        ids: &HashMap<u16, char>,
    ) -> HashMap<u16, (char, (u16, i16))> {
        let face = face.as_face_ref();
        let mut ids_augmented: HashMap<u16, (char, (u16, i16))> = HashMap::new();
        for (&id, &ch) in ids.iter() {
            if let Some(gid) = face.glyph_index(ch) {
                if let Some(h_advance) = face.glyph_hor_advance(gid) {
                    let height = face
                        .glyph_bounding_box(gid)
                        .map(|bbox| bbox.y_max - bbox.y_min - face.descender())
                        .unwrap_or(1000);
                    ids_augmented.insert(id, (ch, (h_advance, height)));
                }
            }
        }
        ids_augmented
    }

    fn write_to_unicode(
        face: &OwnedFace,
        refs: &mut ObjectReferences,
        font_index: usize,
        writer: &mut Pdf,
    ) -> Ref {
        let id = refs.gen(RefType::ToUnicode(font_index));
        let map = Self::to_unicode_cmap(face);

        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(
            map.as_bytes(),
            miniz_oxide::deflate::CompressionLevel::DefaultLevel as u8,
        );
        let mut stream = writer.stream(id, compressed.as_slice());
        stream.filter(pdf_writer::Filter::FlateDecode);

        id
    }

    /// The CMap that lets readers extract text from glyph ids
    fn to_unicode_cmap(face: &OwnedFace) -> String {
        let mut map: String = r#"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
/Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
"#
        .replace("\r\n", "\n");

        let mut ids: Vec<(u16, char)> = Self::glyph_ids(face).into_iter().collect();
        ids.sort_by_key(|&(id, _)| id);

        // at most 100 entries per block, each block sharing its high byte
        let mut cmap_blocks: Vec<Vec<(u16, char)>> = Vec::new();
        let mut current_block: Vec<(u16, char)> = Vec::new();
        let mut high_byte: u8 = 0;
        for &(id, ch) in ids.iter() {
            if (id >> 8) as u8 != high_byte || current_block.len() >= 100 {
                if !current_block.is_empty() {
                    cmap_blocks.push(std::mem::take(&mut current_block));
                }
                high_byte = (id >> 8) as u8;
            }
            current_block.push((id, ch));
        }
        if !current_block.is_empty() {
            cmap_blocks.push(current_block);
        }

        for block in cmap_blocks.into_iter() {
            map.push_str(&format!("{} beginbfchar\n", block.len()));
            for (id, ch) in block.into_iter() {
                let mut utf16 = [0u16; 2];
                let units: String = ch
                    .encode_utf16(&mut utf16)
                    .iter()
                    .map(|unit| format!("{unit:04x}"))
                    .collect();
                map.push_str(&format!("<{id:04x}> <{units}>\n"));
            }
            map.push_str("endbfchar\n");
        }

        map.push_str("endcmap CMapName currentdict /CMap defineresource pop end end\n");
        map
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, id: Id<Font>, writer: &mut Pdf) {
        let font_index = id.index();
        let font_id = refs.gen(RefType::Font(font_index));

        match &self.kind {
            FontKind::Base14 { base_font } => {
                writer
                    .type1_font(font_id)
                    .base_font(Name(base_font.as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
            FontKind::TrueType { face } => {
                let cid_font_id = self.write_cid(face, refs, font_index, writer);
                let to_unicode_id = Self::write_to_unicode(face, refs, font_index, writer);

                let mut font = writer.type0_font(font_id);
                font.base_font(Name(self.name.as_bytes()));
                font.encoding_predefined(Name(b"Identity-H"));
                font.descendant_font(cid_font_id);
                font.to_unicode(to_unicode_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FontDescriptor;
    use crate::fit::{fit, FitOptions};
    use crate::units::Pt;

    fn tuffy() -> Vec<u8> {
        std::fs::read(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts/Tuffy.ttf")).unwrap()
    }

    #[test]
    fn base14_fonts_encode_single_bytes() {
        let font = Font::base14("Helvetica");
        assert_eq!(font.name(), "Helvetica");
        assert!(font.is_simple());
        assert_eq!(font.encode("Aé中"), vec![b'A', 0xE9, b'?']);
        assert_eq!(font.glyph_id('A'), None);
    }

    #[test]
    fn garbage_is_not_a_font() {
        assert!(Font::load("Broken", vec![0, 1, 2, 3], 0).is_err());
    }

    #[test]
    fn missing_font_file_is_an_io_error() {
        assert!(matches!(
            Font::load_file("Missing", "/definitely/not/here.ttf", 0),
            Err(crate::OverlayError::Io(_))
        ));
    }

    #[test]
    fn width_array_covers_every_drawable_glyph() {
        let font = Font::load("Tuffy", tuffy(), 0).unwrap();
        let FontKind::TrueType { face } = &font.kind else {
            panic!("Tuffy is a TrueType font");
        };
        let advances = Font::glyph_advances(face);
        assert_eq!(advances.first().map(|&(gid, _)| gid), Some(0));
        assert!(advances.windows(2).all(|pair| pair[0].0 < pair[1].0));

        let replacement = font.replacement_glyph_id().unwrap();
        assert!(advances.iter().any(|&(gid, _)| gid == replacement));
    }

    #[test]
    fn unmapped_characters_are_drawn_as_measured() {
        let bytes = tuffy();
        let face = owned_ttf_parser::Face::parse(&bytes, 0).unwrap();
        let text = "a中b";
        let descriptor = FontDescriptor::from_face("Tuffy", None, 0, &face, text);
        let font = Font::load("Tuffy", bytes.clone(), 0).unwrap();

        let size = 20.0;
        let placement = fit(
            &crate::Rect::new(0, 0, 200, 30),
            text,
            &descriptor,
            Pt(size),
            Pt(100.0),
            &FitOptions::default(),
        )
        .unwrap();
        assert!(placement.fits);

        // what a reader draws: the /W width of every glyph written, plus Tc between them
        let FontKind::TrueType { face: owned } = &font.kind else {
            panic!("Tuffy is a TrueType font");
        };
        let scaling = 1000.0 / face.units_per_em() as f32;
        let widths: HashMap<u16, f32> = Font::glyph_advances(owned)
            .into_iter()
            .map(|(gid, advance)| (gid, advance as f32 * scaling))
            .collect();
        let codes = font.encode(&placement.text);
        let drawn: f32 = codes
            .chunks(2)
            .map(|code| u16::from_be_bytes([code[0], code[1]]))
            .map(|gid| widths[&gid] / 1000.0 * size)
            .sum();
        let glyphs = codes.len() / 2;
        let rendered = drawn + placement.char_spacing.0 * (glyphs - 1) as f32;

        assert_eq!(glyphs, 3);
        assert!(
            (rendered - placement.available_width.0).abs() < 1e-3,
            "{rendered} != {}",
            placement.available_width
        );
        assert!((rendered - placement.rendered_width_estimate.0).abs() < 1e-3);
    }
}
