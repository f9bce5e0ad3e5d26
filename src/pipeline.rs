//! Turning page images and their OCR results into one searchable PDF.
//!
//! Every input image needs an OCR result next to it, named like the image with
//! the [OverlayOptions::ocr_suffix] in place of its extension (`scan.png` pairs
//! with `scan.ms.json` by default). Each OCR page becomes one PDF page the size
//! of the image, with the image in the background and every recognized line
//! fitted over it as invisible, selectable text.

use crate::colour::{colours, Colour};
use crate::descriptor::FontDescriptor;
use crate::document::Document;
use crate::fit::{fit, FitOptions};
use crate::image::Image;
use crate::info::Info;
use crate::ocr;
use crate::page::{Page, TextInserter, TextStyle, RENDER_INVISIBLE};
use crate::resolve::{resolve_descriptor, FontCatalog, SystemFontCatalog};
use crate::units::Pt;
use crate::{OverlayError, Result};
use id_arena::Id;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Image extensions picked up when scanning a directory
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Settings for a conversion
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOptions {
    /// Replaces the image extension to name the OCR result, e.g. `.ms.json`
    pub ocr_suffix: String,
    /// A line's font size is its box height divided by this
    pub font_scale: f32,
    /// Draw the page images behind the text
    pub embed_images: bool,
    /// Text render mode; when unset, invisible over images and filled otherwise
    pub render_mode: Option<u8>,
    pub colour: Colour,
    /// Directories searched for fonts in addition to (or instead of) the system fonts
    pub font_dirs: Vec<PathBuf>,
    pub use_system_fonts: bool,
    /// Put the text on an optional content layer with this name
    pub layer_name: Option<String>,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        OverlayOptions {
            ocr_suffix: ".ms.json".to_string(),
            font_scale: 1.32,
            embed_images: true,
            render_mode: None,
            colour: colours::BLACK,
            font_dirs: Vec::new(),
            use_system_fonts: true,
            layer_name: None,
        }
    }
}

impl OverlayOptions {
    pub fn with_ocr_suffix<S: ToString>(mut self, suffix: S) -> Self {
        self.ocr_suffix = suffix.to_string();
        self
    }

    pub fn with_font_scale(mut self, font_scale: f32) -> Self {
        self.font_scale = font_scale;
        self
    }

    pub fn with_embed_images(mut self, embed_images: bool) -> Self {
        self.embed_images = embed_images;
        self
    }

    pub fn with_render_mode(mut self, render_mode: u8) -> Self {
        self.render_mode = Some(render_mode);
        self
    }

    pub fn with_colour(mut self, colour: Colour) -> Self {
        self.colour = colour;
        self
    }

    pub fn with_font_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.font_dirs.push(dir.into());
        self
    }

    pub fn with_system_fonts(mut self, use_system_fonts: bool) -> Self {
        self.use_system_fonts = use_system_fonts;
        self
    }

    pub fn with_layer_name<S: ToString>(mut self, name: S) -> Self {
        self.layer_name = Some(name.to_string());
        self
    }

    /// The render mode actually used for text
    pub fn effective_render_mode(&self) -> u8 {
        match self.render_mode {
            Some(mode) => mode,
            None if self.embed_images => RENDER_INVISIBLE,
            None => 0,
        }
    }

    fn text_style(&self) -> TextStyle {
        TextStyle {
            fill: Some(self.colour),
            render_mode: self.effective_render_mode(),
            optional_content: self.layer_name.is_some(),
            ..Default::default()
        }
    }
}

/// What a conversion did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub pages: usize,
    pub lines: usize,
    /// Lines that were blank or could not be placed
    pub skipped_lines: usize,
    /// OCR pages without any line
    pub skipped_pages: usize,
    /// Images without an OCR result next to them
    pub missing_ocr: usize,
    /// Images whose OCR result could not be decoded
    pub malformed_ocr: usize,
    /// Images that could not be read
    pub unreadable_images: usize,
}

/// Where the OCR result for `image` is expected
pub fn sibling_ocr_path(image: &Path, suffix: &str) -> PathBuf {
    image.with_extension(suffix.trim_start_matches('.'))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn walk_images(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_images(&path, found)?;
        } else if is_image(&path) {
            found.push(path);
        }
    }
    Ok(())
}

/// The images to convert: `input` itself when it is a file, or every image below
/// the directory `input` that has an OCR result next to it, sorted by path.
///
/// A file named explicitly is taken whatever its extension; reading it decides
/// whether it is an image.
pub fn collect_inputs(input: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    if input.is_dir() {
        let mut images = Vec::new();
        walk_images(input, &mut images)?;
        images.retain(|image| sibling_ocr_path(image, suffix).is_file());
        images.sort();
        log::debug!("found {} images below {}", images.len(), input.display());
        return Ok(images);
    }

    if input.is_file() {
        let sibling = sibling_ocr_path(input, suffix);
        if !sibling.is_file() {
            return Err(OverlayError::MissingSiblingFile(sibling));
        }
        return Ok(vec![input.to_path_buf()]);
    }

    Err(OverlayError::InvalidInput(input.to_path_buf()))
}

fn base_font(document: &mut Document) -> Result<(FontDescriptor, Id<crate::Font>)> {
    let descriptor = FontDescriptor::base_font();
    let font = document.font_for(&descriptor)?;
    Ok((descriptor, font))
}

/// Fit every line of `ocr_page` onto `page`
fn overlay_lines<C: FontCatalog + ?Sized>(
    document: &mut Document,
    page: &mut Page,
    ocr_page: &ocr::Page,
    catalog: &C,
    options: &OverlayOptions,
    report: &mut ConversionReport,
) -> Result<()> {
    let style = options.text_style();

    for line in ocr_page.lines.iter() {
        let text = line.joined_text();
        let descriptor = resolve_descriptor(catalog, &text).unwrap_or_else(|e| {
            log::warn!("could not load the font for {text:?}, using the base font: {e}");
            FontDescriptor::base_font()
        });
        let (descriptor, font) = match document.font_for(&descriptor) {
            Ok(font) => (descriptor, font),
            Err(e) => {
                log::warn!("could not embed font {}: {e}", descriptor.name);
                base_font(document)?
            }
        };

        let font_size = Pt(line.rect.h() as f32 / options.font_scale);
        let placement = match fit(
            &line.rect,
            &text,
            &descriptor,
            font_size,
            page.height(),
            &FitOptions::default(),
        ) {
            Ok(placement) => placement,
            Err(e @ (OverlayError::Geometry(_) | OverlayError::Rotation(_))) => {
                log::warn!("skipping line {text:?}: {e}");
                report.skipped_lines += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        if !placement.fits {
            log::debug!(
                "line {text:?} overflows its box: {} > {}",
                placement.rendered_width_estimate,
                placement.available_width
            );
        }

        if page.insert_line(font, &placement, &style) {
            report.lines += 1;
        } else {
            report.skipped_lines += 1;
        }
    }

    Ok(())
}

/// Build the document for `images` without writing it. Images that can't be used are
/// skipped, logged and counted in the report.
pub fn build_document<C: FontCatalog + ?Sized>(
    images: &[PathBuf],
    catalog: &C,
    options: &OverlayOptions,
) -> Result<(Document, ConversionReport)> {
    let mut document = Document::new();
    let mut report = ConversionReport::default();
    if let Some(layer) = &options.layer_name {
        document.set_layer(layer);
    }

    for (i, image_path) in images.iter().enumerate() {
        let started = Instant::now();
        log::info!(
            "[{}/{}] {}",
            i + 1,
            images.len(),
            image_path.display()
        );

        let ocr_path = sibling_ocr_path(image_path, &options.ocr_suffix);
        let file = match File::open(&ocr_path) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("skipping {}: no OCR result ({e})", image_path.display());
                report.missing_ocr += 1;
                continue;
            }
        };
        let ocr_pages = match ocr::decode_reader(BufReader::new(file)) {
            Ok(pages) => pages,
            Err(e) => {
                log::warn!("skipping {}: {e}", ocr_path.display());
                report.malformed_ocr += 1;
                continue;
            }
        };
        log::debug!("decoded {} in {:?}", ocr_path.display(), started.elapsed());

        let loaded = if options.embed_images {
            Image::new_from_disk(image_path).map(|image| {
                let size = (image.width, image.height);
                (Some(image), size)
            })
        } else {
            Image::dimensions(image_path).map(|(w, h)| (None, (w as f32, h as f32)))
        };
        let (image, (width, height)) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                log::warn!("skipping {}: {e}", image_path.display());
                report.unreadable_images += 1;
                continue;
            }
        };
        let image = image.map(|image| document.add_image(image));
        log::debug!("loaded {} in {:?}", image_path.display(), started.elapsed());

        for ocr_page in ocr_pages.iter() {
            if ocr_page.rect().is_none() {
                log::warn!("skipping an OCR page without lines in {}", ocr_path.display());
                report.skipped_pages += 1;
                continue;
            }

            let mut page = Page::new(Pt(width), Pt(height));
            if let Some(image) = image {
                page.add_background(image);
            }
            overlay_lines(&mut document, &mut page, ocr_page, catalog, options, &mut report)?;
            document.add_page(page);
            report.pages += 1;
        }
        log::debug!("laid out {} in {:?}", image_path.display(), started.elapsed());
    }

    Ok((document, report))
}

/// Convert `images` into a PDF at `output`, resolving fonts through `catalog`
pub fn convert_with<C: FontCatalog + ?Sized>(
    images: &[PathBuf],
    output: &Path,
    catalog: &C,
    options: &OverlayOptions,
) -> Result<ConversionReport> {
    let started = Instant::now();
    let (mut document, report) = build_document(images, catalog, options)?;
    if document.page_count() == 0 {
        return Err(OverlayError::NoPages);
    }

    let mut info = Info::new();
    if let Some(title) = output.file_stem().and_then(|stem| stem.to_str()) {
        info.title(title);
    }
    document.set_info(info);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let saving = Instant::now();
    let mut writer = BufWriter::new(File::create(output)?);
    document.write(&mut writer)?;
    writer.flush()?;
    log::debug!("saved {} in {:?}", output.display(), saving.elapsed());

    log::info!(
        "wrote {} pages with {} lines to {} in {:?}",
        report.pages,
        report.lines,
        output.display(),
        started.elapsed()
    );
    Ok(report)
}

/// Convert `images` into a PDF at `output`, resolving fonts from the fonts installed
/// on the system and in [OverlayOptions::font_dirs]
pub fn convert(
    images: &[PathBuf],
    output: &Path,
    options: &OverlayOptions,
) -> Result<ConversionReport> {
    let started = Instant::now();
    let catalog = SystemFontCatalog::new(options.use_system_fonts, &options.font_dirs);
    log::debug!("loaded {} font faces in {:?}", catalog.len(), started.elapsed());
    convert_with(images, output, &catalog, options)
}
