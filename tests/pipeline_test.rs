use ocr_overlay::{
    build_document, collect_inputs, convert_with, CatalogMatch, FontCatalog, FontDescriptor,
    OverlayError, OverlayOptions, Result,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Knows no fonts, so every line falls back to the base font
struct NoFonts;

impl FontCatalog for NoFonts {
    type Font = ();

    fn match_char(&self, _hint: Option<&()>, _ch: char) -> CatalogMatch<()> {
        CatalogMatch::NoMatch
    }

    fn describe(&self, _font: &(), _text: &str) -> Result<FontDescriptor> {
        Ok(FontDescriptor::base_font())
    }
}

/// Matches every character with a font whose file doesn't exist
struct VanishedFonts;

impl FontCatalog for VanishedFonts {
    type Font = ();

    fn match_char(&self, _hint: Option<&()>, _ch: char) -> CatalogMatch<()> {
        CatalogMatch::Matched {
            font: (),
            glyph_id: 1,
        }
    }

    fn describe(&self, _font: &(), _text: &str) -> Result<FontDescriptor> {
        Ok(FontDescriptor {
            name: "Vanished".into(),
            file_path: Some(PathBuf::from("/nowhere/vanished.ttf")),
            ..FontDescriptor::base_font()
        })
    }
}

const OCR: &str = r#"[{"lines": [
    {
        "text": "Hello world",
        "boundingPolygon": [{"x": 10, "y": 10}, {"x": 150, "y": 10}, {"x": 150, "y": 40}, {"x": 10, "y": 40}],
        "words": [
            {"text": "Hello", "boundingPolygon": [{"x": 10, "y": 10}, {"x": 70, "y": 10}, {"x": 70, "y": 40}, {"x": 10, "y": 40}], "confidence": 0.99},
            {"text": "world", "boundingPolygon": [{"x": 80, "y": 10}, {"x": 150, "y": 10}, {"x": 150, "y": 40}, {"x": 80, "y": 40}], "confidence": 0.97}
        ]
    },
    {
        "text": "   ",
        "boundingPolygon": [{"x": 10, "y": 50}, {"x": 150, "y": 50}, {"x": 150, "y": 80}, {"x": 10, "y": 80}],
        "words": []
    }
]}]"#;

fn write_scan(dir: &Path, name: &str, ocr: Option<&str>) -> PathBuf {
    let image_path = dir.join(format!("{name}.png"));
    image::RgbImage::from_pixel(200, 100, image::Rgb([255, 255, 255]))
        .save(&image_path)
        .unwrap();
    if let Some(ocr) = ocr {
        fs::write(dir.join(format!("{name}.ms.json")), ocr).unwrap();
    }
    image_path
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn converts_a_scan_into_a_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_scan(dir.path(), "page1", Some(OCR));
    let output = dir.path().join("out").join("book.pdf");

    let report = convert_with(&[image], &output, &NoFonts, &OverlayOptions::default()).unwrap();
    assert_eq!(report.pages, 1);
    assert_eq!(report.lines, 1);
    assert_eq!(report.skipped_lines, 1);

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(contains(&bytes, b"/BaseFont /Helvetica"));
    assert!(contains(&bytes, b"/Subtype /Image"));
    assert!(contains(&bytes, b"(book)"));
}

#[test]
fn pages_take_the_image_size() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_scan(dir.path(), "page1", Some(OCR));

    let (document, _) = build_document(&[image], &NoFonts, &OverlayOptions::default()).unwrap();
    let page = document.pages().next().unwrap();
    assert_eq!(page.width().0, 200.0);
    assert_eq!(page.height().0, 100.0);
    assert_eq!(page.lines().count(), 1);
}

#[test]
fn text_only_documents_skip_the_images() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_scan(dir.path(), "page1", Some(OCR));
    let options = OverlayOptions::default().with_embed_images(false);

    let (document, report) = build_document(&[image], &NoFonts, &options).unwrap();
    assert_eq!(report.pages, 1);
    assert_eq!(document.images.len(), 0);
    assert_eq!(document.page_count(), 1);
}

#[test]
fn unusable_inputs_are_skipped_and_counted() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_scan(dir.path(), "good", Some(OCR));
    let missing = write_scan(dir.path(), "missing", None);
    let malformed = write_scan(dir.path(), "malformed", Some(r#"{"lines": "#));
    let unreadable = dir.path().join("unreadable.png");
    fs::write(&unreadable, b"not a png").unwrap();
    fs::write(dir.path().join("unreadable.ms.json"), OCR).unwrap();

    let (document, report) = build_document(
        &[missing, malformed, unreadable, good],
        &NoFonts,
        &OverlayOptions::default(),
    )
    .unwrap();
    assert_eq!(document.page_count(), 1);
    assert_eq!(report.missing_ocr, 1);
    assert_eq!(report.malformed_ocr, 1);
    assert_eq!(report.unreadable_images, 1);
}

#[test]
fn pages_without_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_scan(dir.path(), "blank", Some(r#"[{"lines": []}]"#));
    let output = dir.path().join("blank.pdf");

    let (_, report) = build_document(&[image.clone()], &NoFonts, &OverlayOptions::default()).unwrap();
    assert_eq!(report.skipped_pages, 1);

    let result = convert_with(&[image], &output, &NoFonts, &OverlayOptions::default());
    assert!(matches!(result, Err(OverlayError::NoPages)));
    assert!(!output.exists());
}

#[test]
fn missing_font_files_fall_back_to_the_base_font() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_scan(dir.path(), "page1", Some(OCR));

    let (document, report) =
        build_document(&[image], &VanishedFonts, &OverlayOptions::default()).unwrap();
    assert_eq!(report.lines, 1);
    assert!(document.font_named("Vanished").is_none());
    assert!(document.font_named("Helvetica").is_some());
}

#[test]
fn layers_wrap_the_text() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_scan(dir.path(), "page1", Some(OCR));
    let output = dir.path().join("layered.pdf");
    let options = OverlayOptions::default().with_layer_name("OCR text");

    convert_with(&[image], &output, &NoFonts, &options).unwrap();
    let bytes = fs::read(&output).unwrap();
    assert!(contains(&bytes, b"/OCProperties"));
    assert!(contains(&bytes, b"(OCR text)"));
}

#[test]
fn collects_images_recursively_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("b");
    fs::create_dir(&nested).unwrap();
    let second = write_scan(&nested, "page", Some(OCR));
    let first = write_scan(dir.path(), "a", Some(OCR));
    write_scan(dir.path(), "no-ocr", None);
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let images = collect_inputs(dir.path(), ".ms.json").unwrap();
    assert_eq!(images, vec![first, second]);
}

#[test]
fn a_single_image_needs_its_ocr_result() {
    let dir = tempfile::tempdir().unwrap();
    let with = write_scan(dir.path(), "with", Some(OCR));
    let without = write_scan(dir.path(), "without", None);

    assert_eq!(collect_inputs(&with, ".ms.json").unwrap(), vec![with.clone()]);
    assert!(matches!(
        collect_inputs(&without, ".ms.json"),
        Err(OverlayError::MissingSiblingFile(path)) if path == dir.path().join("without.ms.json")
    ));
}

#[test]
fn any_named_file_with_an_ocr_result_is_taken() {
    let dir = tempfile::tempdir().unwrap();
    let scan = dir.path().join("page.scan");
    image::RgbImage::from_pixel(200, 100, image::Rgb([255, 255, 255]))
        .save_with_format(&scan, image::ImageFormat::Png)
        .unwrap();
    fs::write(dir.path().join("page.ms.json"), OCR).unwrap();

    let images = collect_inputs(&scan, ".ms.json").unwrap();
    assert_eq!(images, vec![scan.clone()]);

    for options in [
        OverlayOptions::default(),
        OverlayOptions::default().with_embed_images(false),
    ] {
        let (document, report) = build_document(&images, &NoFonts, &options).unwrap();
        assert_eq!(document.page_count(), 1);
        assert_eq!(report.unreadable_images, 0);
    }
}

#[test]
fn other_inputs_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "hello").unwrap();

    assert!(matches!(
        collect_inputs(&notes, ".ms.json"),
        Err(OverlayError::MissingSiblingFile(_))
    ));
    assert!(matches!(
        collect_inputs(&dir.path().join("gone"), ".ms.json"),
        Err(OverlayError::InvalidInput(_))
    ));
}
