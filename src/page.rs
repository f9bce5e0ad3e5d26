use crate::colour::Colour;
use crate::content::{self, Opacity};
use crate::fit::PlacementResult;
use crate::font::Font;
use crate::image::Image;
use crate::refs::{ObjectReferences, RefType};
use crate::units::Pt;
use crate::Result;
use id_arena::{Arena, Id};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Name, Pdf, Rect, Ref};
use std::collections::BTreeSet;

/// Text rendering mode that paints nothing, which keeps text searchable but invisible
pub const RENDER_INVISIBLE: u8 = 3;

/// How a fitted line is painted
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct TextStyle {
    pub stroke: Option<Colour>,
    /// Falls back to `stroke` when unset and the render mode is 0 (fill)
    pub fill: Option<Colour>,
    pub stroke_opacity: f32,
    pub fill_opacity: f32,
    /// The `Tr` operand: 0 fills, 1 strokes, 3 draws nothing
    pub render_mode: u8,
    /// Mark the text as part of the document's optional content layer
    pub optional_content: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            stroke: None,
            fill: None,
            stroke_opacity: 1.0,
            fill_opacity: 1.0,
            render_mode: 0,
            optional_content: false,
        }
    }
}

impl TextStyle {
    /// Searchable text that is not painted, for laying over a page image
    pub fn invisible() -> TextStyle {
        TextStyle {
            render_mode: RENDER_INVISIBLE,
            ..Default::default()
        }
    }

    /// The colour used for filling glyphs, if any
    pub fn fill_colour(&self) -> Option<Colour> {
        match (self.fill, self.render_mode) {
            (Some(fill), _) => Some(fill),
            (None, 0) => self.stroke,
            (None, _) => None,
        }
    }

    /// Opacities that need a graphics state, [None] when fully opaque
    pub(crate) fn opacity(&self) -> Option<Opacity> {
        let opacity = Opacity {
            stroke: self.stroke_opacity.clamp(0.0, 1.0),
            fill: self.fill_opacity.clamp(0.0, 1.0),
        };
        (!opacity.is_opaque()).then_some(opacity)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct ImageLayout {
    pub image: Id<Image>,
    pub position: Rect,
}

/// A fitted line waiting to be written
#[derive(Clone, PartialEq, Debug)]
pub struct TextLayout {
    pub font: Id<Font>,
    pub placement: PlacementResult,
    pub style: TextStyle,
}

#[derive(Clone, PartialEq, Debug)]
pub enum PageContents {
    Image(ImageLayout),
    Text(TextLayout),
}

/// Anything fitted lines can be drawn onto
pub trait TextInserter {
    /// Record `placement` drawn with `font`. Returns `false`, recording nothing, when
    /// the placement has nothing to draw.
    fn insert_line(&mut self, font: Id<Font>, placement: &PlacementResult, style: &TextStyle)
        -> bool;
}

pub struct Page {
    /// The size of the page
    pub media_box: Rect,
    /// Everything drawn on the page, in painting order
    pub contents: Vec<PageContents>,
}

impl Page {
    pub fn new(width: Pt, height: Pt) -> Page {
        Page {
            media_box: Rect {
                x1: 0.0,
                y1: 0.0,
                x2: *width,
                y2: *height,
            },
            contents: Vec::default(),
        }
    }

    pub fn width(&self) -> Pt {
        Pt(self.media_box.x2 - self.media_box.x1)
    }

    pub fn height(&self) -> Pt {
        Pt(self.media_box.y2 - self.media_box.y1)
    }

    pub fn add_image(&mut self, image: ImageLayout) {
        self.contents.push(PageContents::Image(image));
    }

    /// Cover the whole page with `image`
    pub fn add_background(&mut self, image: Id<Image>) {
        let position = self.media_box;
        self.add_image(ImageLayout { image, position });
    }

    /// The fitted lines on this page
    pub fn lines(&self) -> impl Iterator<Item = &TextLayout> {
        self.contents.iter().filter_map(|c| match c {
            PageContents::Text(text) => Some(text),
            PageContents::Image(_) => None,
        })
    }

    pub(crate) fn fonts(&self) -> BTreeSet<usize> {
        self.lines().map(|line| line.font.index()).collect()
    }

    pub(crate) fn uses_layer(&self) -> bool {
        self.lines().any(|line| line.style.optional_content)
    }

    pub(crate) fn write(
        &self,
        refs: &mut ObjectReferences,
        page_index: usize,
        fonts: &Arena<Font>,
        gstates: &[Opacity],
        layer: Option<Ref>,
        writer: &mut Pdf,
    ) -> Result<()> {
        let Some(id) = refs.get(RefType::Page(page_index)) else {
            return Err(crate::OverlayError::PageMissing);
        };
        let content_id = refs.gen(RefType::ContentForPage(page_index));

        let mut page = writer.page(id);
        page.media_box(self.media_box);
        if let Some(parent) = refs.get(RefType::PageTree) {
            page.parent(parent);
        }

        let used_fonts = self.fonts();
        let mut resources = page.resources();
        let mut resource_fonts = resources.fonts();
        for (font_id, font) in fonts.iter().filter(|(id, _)| used_fonts.contains(&id.index())) {
            if let Some(font_ref) = refs.get(RefType::Font(font_id.index())) {
                resource_fonts.pair(Name(font.name().as_bytes()), font_ref);
            }
        }
        resource_fonts.finish();

        let mut resource_xobjects = resources.x_objects();
        for content in self.contents.iter() {
            if let PageContents::Image(image) = content {
                if let Some(image_ref) = refs.get(RefType::Image(image.image.index())) {
                    resource_xobjects.pair(
                        Name(format!("I{}", image.image.index()).as_bytes()),
                        image_ref,
                    );
                }
            }
        }
        resource_xobjects.finish();

        if !gstates.is_empty() {
            let mut resource_gstates = resources.ext_g_states();
            for (i, _) in gstates.iter().enumerate() {
                if let Some(gs_ref) = refs.get(RefType::ExtGState(i)) {
                    resource_gstates.pair(Name(format!("GS{i}").as_bytes()), gs_ref);
                }
            }
            resource_gstates.finish();
        }

        let layer = layer.filter(|_| self.uses_layer());
        if let Some(layer) = layer {
            resources
                .insert(Name(b"Properties"))
                .dict()
                .pair(Name(content::LAYER_PROPERTY), layer);
        }
        resources.finish();

        page.contents(content_id);
        page.finish();

        let rendered = content::render_contents(&self.contents, fonts, gstates, layer.is_some())?;
        let compressed = compress_to_vec_zlib(
            rendered.as_slice(),
            CompressionLevel::DefaultLevel as u8,
        );
        writer
            .stream(content_id, compressed.as_slice())
            .filter(Filter::FlateDecode);

        Ok(())
    }
}

impl TextInserter for Page {
    fn insert_line(
        &mut self,
        font: Id<Font>,
        placement: &PlacementResult,
        style: &TextStyle,
    ) -> bool {
        if !placement.success {
            return false;
        }
        self.contents.push(PageContents::Text(TextLayout {
            font,
            placement: placement.clone(),
            style: *style,
        }));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::colours;
    use crate::descriptor::FontDescriptor;
    use crate::fit::{fit, FitOptions};

    fn placement(text: &str) -> PlacementResult {
        fit(
            &crate::Rect::new(10, 10, 110, 30),
            text,
            &FontDescriptor::base_font(),
            Pt(12.0),
            Pt(200.0),
            &FitOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn pages_are_sized_in_points() {
        let page = Page::new(Pt(640.0), Pt(480.0));
        assert_eq!(page.width(), Pt(640.0));
        assert_eq!(page.height(), Pt(480.0));
    }

    #[test]
    fn only_successful_placements_are_recorded() {
        let mut fonts: Arena<Font> = Arena::new();
        let font = fonts.alloc(Font::base14("Helvetica"));
        let mut page = Page::new(Pt(200.0), Pt(200.0));

        assert!(page.insert_line(font, &placement("Hello"), &TextStyle::default()));
        assert!(!page.insert_line(font, &placement("  "), &TextStyle::default()));
        assert_eq!(page.lines().count(), 1);
        assert_eq!(page.fonts().into_iter().collect::<Vec<_>>(), vec![font.index()]);
    }

    #[test]
    fn fill_falls_back_to_stroke_when_filling() {
        let style = TextStyle {
            stroke: Some(colours::RED),
            ..Default::default()
        };
        assert_eq!(style.fill_colour(), Some(colours::RED));

        let stroked = TextStyle {
            render_mode: 1,
            ..style
        };
        assert_eq!(stroked.fill_colour(), None);

        let explicit = TextStyle {
            fill: Some(colours::BLUE),
            ..style
        };
        assert_eq!(explicit.fill_colour(), Some(colours::BLUE));
    }

    #[test]
    fn opaque_styles_need_no_graphics_state() {
        assert!(TextStyle::default().opacity().is_none());
        let faded = TextStyle {
            fill_opacity: 0.5,
            ..Default::default()
        };
        assert_eq!(
            faded.opacity(),
            Some(Opacity {
                stroke: 1.0,
                fill: 0.5
            })
        );
    }
}
