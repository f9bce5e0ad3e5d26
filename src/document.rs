use crate::{
    content::Opacity,
    descriptor::FontDescriptor,
    font::Font,
    image::Image,
    info::Info,
    page::Page,
    refs::{ObjectReferences, RefType},
    Result,
};
use id_arena::{Arena, Id};
use pdf_writer::{Finish, Name, Pdf, Ref, TextStr};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

/// Where a document font comes from. Descriptors with the same source share one font.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FontSource {
    Builtin(String),
    File(PathBuf, u32),
}

impl FontSource {
    fn of(descriptor: &FontDescriptor) -> FontSource {
        match &descriptor.file_path {
            Some(path) => FontSource::File(path.clone(), descriptor.face_index),
            None => FontSource::Builtin(descriptor.name.clone()),
        }
    }
}

#[derive(Default)]
/// A document is the main object that stores all the contents of the PDF
/// then renders it out with a call to [Document::write]
pub struct Document {
    pub info: Option<Info>,
    pub pages: Arena<Page>,
    pub page_order: Vec<Id<Page>>,
    pub fonts: Arena<Font>,
    font_names: HashMap<String, Id<Font>>,
    font_sources: HashMap<FontSource, Id<Font>>,
    pub images: Arena<Image>,
    /// Name of the optional content layer that text marked as optional content
    /// is put on; without one, such text is always visible
    pub layer: Option<String>,
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    /// Sets information about the document. If not provided, no information block will be
    /// written to the PDF
    pub fn set_info(&mut self, info: Info) {
        self.info = Some(info);
    }

    /// Name the optional content layer readers can toggle the overlaid text with
    pub fn set_layer<S: ToString>(&mut self, name: S) {
        self.layer = Some(name.to_string());
    }

    /// Add a page to the end of the document, returning its id
    pub fn add_page(&mut self, page: Page) -> Id<Page> {
        let id = self.pages.alloc(page);
        self.page_order.push(id);
        id
    }

    pub fn page_count(&self) -> usize {
        self.page_order.len()
    }

    /// The pages in document order
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.page_order.iter().filter_map(|id| self.pages.get(*id))
    }

    /// Add a font to the document. A font whose resource name is already taken is
    /// renamed with a numeric suffix, so every font keeps a resource of its own.
    pub fn add_font(&mut self, mut font: Font) -> Id<Font> {
        let name = self.unique_font_name(font.name());
        font.rename(&name);
        let id = self.fonts.alloc(font);
        self.font_names.insert(name, id);
        id
    }

    fn unique_font_name(&self, name: &str) -> String {
        if !self.font_names.contains_key(name) {
            return name.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{name}_{n}");
            if !self.font_names.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// The font with the given resource name, if one was added
    pub fn font_named(&self, name: &str) -> Option<Id<Font>> {
        self.font_names.get(name).copied()
    }

    /// The document font for a resolved descriptor, loading and embedding its font
    /// file the first time the file (and face) is seen
    pub fn font_for(&mut self, descriptor: &FontDescriptor) -> Result<Id<Font>> {
        let source = FontSource::of(descriptor);
        if let Some(&id) = self.font_sources.get(&source) {
            return Ok(id);
        }
        let font = match &descriptor.file_path {
            Some(path) => Font::load_file(&descriptor.name, path, descriptor.face_index)?,
            None => Font::base14(&descriptor.name),
        };
        let id = self.add_font(font);
        self.font_sources.insert(source, id);
        log::debug!("added font {} to the document", descriptor.name);
        Ok(id)
    }

    /// Add an image to the document structure. Images are stored "globally" within
    /// the document and placed on pages by their id.
    pub fn add_image(&mut self, image: Image) -> Id<Image> {
        self.images.alloc(image)
    }

    /// Every distinct non-opaque opacity used on any page, in first-use order
    fn opacities(pages: &Arena<Page>, page_order: &[Id<Page>]) -> Vec<Opacity> {
        let mut opacities: Vec<Opacity> = Vec::new();
        for page in page_order.iter().filter_map(|id| pages.get(*id)) {
            for opacity in page.lines().filter_map(|line| line.style.opacity()) {
                if !opacities.contains(&opacity) {
                    opacities.push(opacity);
                }
            }
        }
        opacities
    }

    fn write_layer(refs: &mut ObjectReferences, name: &str, writer: &mut Pdf) -> Ref {
        let id = refs.gen(RefType::OptionalContentGroup);
        writer
            .indirect(id)
            .dict()
            .pair(Name(b"Type"), Name(b"OCG"))
            .pair(Name(b"Name"), TextStr(name));
        id
    }

    /// Write the entire document to the writer. The document is rendered in memory
    /// first, so very large documents need a matching amount of memory.
    pub fn write<W: Write>(self, mut w: W) -> Result<()> {
        let Document {
            info,
            pages,
            page_order,
            fonts,
            font_names: _,
            font_sources: _,
            images,
            layer,
        } = self;

        let mut refs = ObjectReferences::new();

        let catalog_id = refs.gen(RefType::Catalog);
        let page_tree_id = refs.gen(RefType::PageTree);

        let mut writer = Pdf::new();
        if let Some(info) = info {
            info.write(&mut refs, &mut writer);
        }

        let page_refs: Vec<Ref> = page_order
            .iter()
            .enumerate()
            .map(|(i, _id)| refs.gen(RefType::Page(i)))
            .collect();

        writer
            .pages(page_tree_id)
            .count(page_refs.len() as i32)
            .kids(page_refs);

        for (i, font) in fonts.iter() {
            font.write(&mut refs, i, &mut writer);
        }

        for (i, image) in images.iter() {
            image.write(&mut refs, i.index(), &mut writer)?;
        }

        let gstates = Self::opacities(&pages, &page_order);
        for (i, opacity) in gstates.iter().enumerate() {
            let id = refs.gen(RefType::ExtGState(i));
            writer
                .ext_graphics(id)
                .stroking_alpha(opacity.stroke)
                .non_stroking_alpha(opacity.fill);
        }

        let uses_layer = page_order
            .iter()
            .filter_map(|id| pages.get(*id))
            .any(Page::uses_layer);
        let layer_id = match &layer {
            Some(name) if uses_layer => Some(Self::write_layer(&mut refs, name, &mut writer)),
            _ => None,
        };

        for (page_index, id) in page_order.iter().enumerate() {
            let page = pages.get(*id).ok_or(crate::OverlayError::PageMissing)?;
            page.write(
                &mut refs,
                page_index,
                &fonts,
                &gstates,
                layer_id,
                &mut writer,
            )?;
        }

        let mut catalog = writer.catalog(catalog_id);
        catalog.pages(page_tree_id);
        if let Some(layer_id) = layer_id {
            let mut properties = catalog.insert(Name(b"OCProperties")).dict();
            properties.insert(Name(b"OCGs")).array().item(layer_id);
            let mut default_config = properties.insert(Name(b"D")).dict();
            default_config.insert(Name(b"ON")).array().item(layer_id);
            default_config.insert(Name(b"Order")).array().item(layer_id);
            default_config.finish();
            properties.finish();
        }
        catalog.finish();

        w.write_all(writer.finish().as_slice()).map_err(Into::into)
    }
}
