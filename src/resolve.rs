//! Picking one font for a whole line of text.
//!
//! Every character of the line is looked up in a [FontCatalog]. The most recent
//! successful match becomes a hint for the next lookup so that a line tends to
//! stay within one family, and the font matched by the *last* character that
//! matched at all is used for the entire line.

use crate::descriptor::FontDescriptor;
use crate::Result;
use owned_ttf_parser::Face;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use usvg::fontdb;

/// Outcome of a single catalog lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogMatch<F> {
    /// `font` has a glyph for the character
    Matched { font: F, glyph_id: u16 },
    NoMatch,
}

/// A searchable collection of fonts, such as the fonts installed on the system
pub trait FontCatalog {
    type Font: Clone;

    /// Find a font covering `ch`, preferring `hint` or fonts related to it when set
    fn match_char(&self, hint: Option<&Self::Font>, ch: char) -> CatalogMatch<Self::Font>;

    /// Build the metrics of `font` for the characters of `text`
    fn describe(&self, font: &Self::Font, text: &str) -> Result<FontDescriptor>;
}

/// Walk `text` against the catalog and return the font of the last character that
/// matched, or [None] if no character matched
pub fn resolve<C: FontCatalog + ?Sized>(catalog: &C, text: &str) -> Option<C::Font> {
    let mut hint: Option<C::Font> = None;
    for ch in text.chars() {
        if let CatalogMatch::Matched { font, .. } = catalog.match_char(hint.as_ref(), ch) {
            hint = Some(font);
        }
    }
    hint
}

/// Resolve `text` to a font and describe it, falling back to the built-in base
/// font when nothing in the catalog covers any of the text
pub fn resolve_descriptor<C: FontCatalog + ?Sized>(
    catalog: &C,
    text: &str,
) -> Result<FontDescriptor> {
    match resolve(catalog, text) {
        Some(font) => catalog.describe(&font, text),
        None => Ok(FontDescriptor::base_font()),
    }
}

/// Make a font name usable as a content-stream resource name
pub fn escape_font_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// A font face known to a [SystemFontCatalog]
#[derive(Debug, Clone, PartialEq)]
pub struct SystemFont {
    pub id: fontdb::ID,
    pub family: String,
    pub post_script_name: String,
    pub path: PathBuf,
    pub index: u32,
}

impl SystemFont {
    /// The PostScript name if the face has one, its family name otherwise
    pub fn name(&self) -> &str {
        if self.post_script_name.is_empty() {
            &self.family
        } else {
            &self.post_script_name
        }
    }
}

/// A [FontCatalog] over installed fonts, backed by a [fontdb::Database]
pub struct SystemFontCatalog {
    db: fontdb::Database,
    /// Faces that can be embedded: backed by a file and with TrueType outlines
    candidates: Vec<fontdb::ID>,
    /// First candidate covering a character, filled as characters are searched
    scanned: RwLock<HashMap<char, Option<(fontdb::ID, u16)>>>,
}

impl SystemFontCatalog {
    /// Build a catalog from the system fonts (if asked for) and any extra font directories
    pub fn new<P: AsRef<Path>>(use_system_fonts: bool, font_dirs: &[P]) -> SystemFontCatalog {
        let mut db = fontdb::Database::new();
        if use_system_fonts {
            db.load_system_fonts();
        }
        for dir in font_dirs {
            db.load_fonts_dir(dir);
        }
        Self::from_database(db)
    }

    pub fn from_database(db: fontdb::Database) -> SystemFontCatalog {
        let candidates: Vec<fontdb::ID> = db
            .faces()
            .filter(|face| Self::file_path(face).is_some())
            .filter(|face| Self::has_outlines(&db, face.id))
            .map(|face| face.id)
            .collect();
        log::debug!(
            "font catalog holds {} faces, {} of them embeddable",
            db.len(),
            candidates.len()
        );
        SystemFontCatalog {
            db,
            candidates,
            scanned: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Number of faces lines can be drawn with
    pub fn embeddable_len(&self) -> usize {
        self.candidates.len()
    }

    // only faces backed by a file can be embedded later on
    fn file_path(face: &fontdb::FaceInfo) -> Option<&Path> {
        match &face.source {
            fontdb::Source::File(path) => Some(path.as_path()),
            _ => None,
        }
    }

    // embedded as CIDFontType2, which needs glyf outlines
    fn has_outlines(db: &fontdb::Database, id: fontdb::ID) -> bool {
        db.with_face_data(id, |data, index| {
            Face::parse(data, index).is_ok_and(|face| face.tables().glyf.is_some())
        })
        .unwrap_or(false)
    }

    fn system_font(&self, id: fontdb::ID) -> Option<SystemFont> {
        let face = self.db.face(id)?;
        Some(SystemFont {
            id,
            family: face
                .families
                .first()
                .map(|(family, _)| family.clone())
                .unwrap_or_default(),
            post_script_name: face.post_script_name.clone(),
            path: Self::file_path(face)?.to_path_buf(),
            index: face.index,
        })
    }

    /// Glyph id of `ch` in the face, if the face maps `ch`
    fn glyph_in(&self, id: fontdb::ID, ch: char) -> Option<u16> {
        self.db
            .with_face_data(id, |data, index| {
                let face = Face::parse(data, index).ok()?;
                face.glyph_index(ch).map(|gid| gid.0).filter(|&gid| gid > 0)
            })
            .flatten()
    }

    fn first_match<I>(&self, ids: I, ch: char) -> Option<(fontdb::ID, u16)>
    where
        I: IntoIterator<Item = fontdb::ID>,
    {
        ids.into_iter()
            .find_map(|id| self.glyph_in(id, ch).map(|glyph_id| (id, glyph_id)))
    }

    /// The first candidate covering `ch`, searching each character only once
    fn scan(&self, ch: char) -> Option<(fontdb::ID, u16)> {
        let cached = self
            .scanned
            .read()
            .ok()
            .and_then(|scanned| scanned.get(&ch).copied());
        if let Some(found) = cached {
            return found;
        }
        let found = self.first_match(self.candidates.iter().copied(), ch);
        if let Ok(mut scanned) = self.scanned.write() {
            scanned.insert(ch, found);
        }
        found
    }

    fn matched(&self, found: Option<(fontdb::ID, u16)>) -> CatalogMatch<SystemFont> {
        match found.and_then(|(id, glyph_id)| Some((self.system_font(id)?, glyph_id))) {
            Some((font, glyph_id)) => CatalogMatch::Matched { font, glyph_id },
            None => CatalogMatch::NoMatch,
        }
    }
}

impl FontCatalog for SystemFontCatalog {
    type Font = SystemFont;

    fn match_char(&self, hint: Option<&SystemFont>, ch: char) -> CatalogMatch<SystemFont> {
        if let Some(hint) = hint {
            if let Some(glyph_id) = self.glyph_in(hint.id, ch) {
                return CatalogMatch::Matched {
                    font: hint.clone(),
                    glyph_id,
                };
            }

            let related = self.candidates.iter().copied().filter(|&id| {
                id != hint.id
                    && self.db.face(id).is_some_and(|face| {
                        face.families
                            .iter()
                            .any(|(family, _)| family == &hint.family)
                    })
            });
            if let found @ Some(_) = self.first_match(related, ch) {
                return self.matched(found);
            }
        }

        self.matched(self.scan(ch))
    }

    fn describe(&self, font: &SystemFont, text: &str) -> Result<FontDescriptor> {
        let name = escape_font_name(font.name());
        let described = self.db.with_face_data(font.id, |data, index| {
            Face::parse(data, index).map(|face| {
                FontDescriptor::from_face(&name, Some(font.path.clone()), index, &face, text)
            })
        });

        match described {
            Some(descriptor) => Ok(descriptor?),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("font data unavailable: {}", font.path.display()),
            )
            .into()),
        }
    }
}
