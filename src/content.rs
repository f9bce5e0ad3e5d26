//! Rendering page contents into content-stream operators.

use crate::font::Font;
use crate::page::{ImageLayout, PageContents, TextLayout};
use crate::transform::Rotation;
use id_arena::Arena;
use std::io::Write;

/// Resource name the optional content layer is registered under in each page's
/// `/Properties`
pub(crate) const LAYER_PROPERTY: &[u8] = b"OC0";

/// Char spacing below this magnitude is not worth a `Tc` operator
const MIN_CHAR_SPACING: f32 = 1e-6;

/// A pair of constant opacities, written to the document as an ExtGState
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) struct Opacity {
    pub stroke: f32,
    pub fill: f32,
}

impl Opacity {
    pub fn is_opaque(&self) -> bool {
        self.stroke >= 1.0 && self.fill >= 1.0
    }
}

/// Renders page contents to a PDF content stream.
///
/// `gstates` lists every opacity the document declares, in the order their
/// `/GS{n}` resources were named. `layer` tells whether the page has the optional
/// content layer in its resources.
pub(crate) fn render_contents(
    contents: &[PageContents],
    fonts: &Arena<Font>,
    gstates: &[Opacity],
    layer: bool,
) -> Result<Vec<u8>, std::io::Error> {
    let mut content: Vec<u8> = Vec::default();

    for page_content in contents.iter() {
        match page_content {
            PageContents::Image(image) => render_image(&mut content, image)?,
            PageContents::Text(text) => render_text(&mut content, text, fonts, gstates, layer)?,
        }
    }

    Ok(content)
}

#[allow(clippy::write_with_newline)]
fn render_image(content: &mut Vec<u8>, image: &ImageLayout) -> Result<(), std::io::Error> {
    write!(content, "q\n")?;
    write!(
        content,
        "{} 0 0 {} {} {} cm\n",
        image.position.x2 - image.position.x1,
        image.position.y2 - image.position.y1,
        image.position.x1,
        image.position.y1
    )?;
    write!(content, "/I{} Do\n", image.image.index())?;
    write!(content, "Q\n")?;
    Ok(())
}

#[allow(clippy::write_with_newline)]
fn render_text(
    content: &mut Vec<u8>,
    text: &TextLayout,
    fonts: &Arena<Font>,
    gstates: &[Opacity],
    layer: bool,
) -> Result<(), std::io::Error> {
    let Some(font) = fonts.get(text.font) else {
        log::warn!("skipping line drawn with unknown font {:?}", text.font);
        return Ok(());
    };
    let placement = &text.placement;
    let style = &text.style;
    let marked = layer && style.optional_content;

    write!(content, "q\n")?;
    if marked {
        write!(content, "/OC /{} BDC\n", String::from_utf8_lossy(LAYER_PROPERTY))?;
    }
    if let Some(gs) = style
        .opacity()
        .and_then(|opacity| gstates.iter().position(|g| *g == opacity))
    {
        write!(content, "/GS{gs} gs\n")?;
    }

    if let Some(morph) = placement.morph {
        morph.write_cm(content)?;
    }
    if placement.rotation != Rotation::Identity {
        placement.rotation.matrix().write_cm(content)?;
    }

    write!(content, "BT\n")?;
    write!(
        content,
        "1 0 0 1 {} {} Tm\n",
        placement.anchor.0, placement.anchor.1
    )?;
    write!(content, "/{} {} Tf\n", font.name(), placement.font_size)?;
    if style.render_mode != 0 {
        write!(content, "{} Tr\n", style.render_mode)?;
    }
    if placement.char_spacing.0.abs() >= MIN_CHAR_SPACING {
        write!(content, "{} Tc\n", placement.char_spacing)?;
    }
    if let Some(stroke) = style.stroke {
        stroke.write_stroke(content)?;
    }
    if let Some(fill) = style.fill_colour() {
        fill.write_fill(content)?;
    }

    write!(content, "<")?;
    for byte in font.encode(&placement.text) {
        write!(content, "{byte:02x}")?;
    }
    write!(content, "> Tj\n")?;
    write!(content, "ET\n")?;

    if marked {
        write!(content, "EMC\n")?;
    }
    write!(content, "Q\n")?;
    Ok(())
}
