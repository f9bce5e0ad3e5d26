//! ocr-overlay CLI - build searchable PDFs from page images and their OCR results

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use ocr_overlay::{collect_inputs, convert, Colour, OverlayError, OverlayOptions};

#[derive(Parser)]
#[command(name = "ocr-overlay")]
#[command(version)]
#[command(about = "Overlay OCR results onto page images to produce a searchable PDF", long_about = None)]
struct Cli {
    /// An image with an OCR result next to it, or a directory searched for such images
    #[arg(short, long, value_name = "PATH", default_value = "input")]
    input: PathBuf,

    /// Output PDF file
    #[arg(short, long, value_name = "FILE", default_value = "output.pdf")]
    output: PathBuf,

    /// Suffix replacing the image extension to find its OCR result
    #[arg(long, default_value = ".ms.json")]
    suffix: String,

    /// Extra directory to load fonts from (repeatable)
    #[arg(long = "font-dir", value_name = "DIR")]
    font_dirs: Vec<PathBuf>,

    /// Only use fonts from --font-dir
    #[arg(long)]
    no_system_fonts: bool,

    /// Don't draw the page images, only the text
    #[arg(long)]
    no_images: bool,

    /// Paint the text instead of keeping it invisible
    #[arg(long)]
    visible: bool,

    /// Text colour as #rrggbb
    #[arg(long, value_name = "HEX")]
    colour: Option<String>,

    /// Put the text on a toggleable layer with this name
    #[arg(long, value_name = "NAME")]
    layer: Option<String>,

    /// A line's font size is its box height divided by this
    #[arg(long, default_value = "1.32")]
    font_scale: f32,

    /// Log every stage with timings
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> Result<OverlayOptions, String> {
        let mut options = OverlayOptions::default()
            .with_ocr_suffix(&self.suffix)
            .with_font_scale(self.font_scale)
            .with_embed_images(!self.no_images)
            .with_system_fonts(!self.no_system_fonts);
        for dir in &self.font_dirs {
            options = options.with_font_dir(dir);
        }
        if self.visible {
            options = options.with_render_mode(0);
        }
        if let Some(hex) = &self.colour {
            let colour = Colour::from_hex(hex).ok_or_else(|| format!("invalid colour: {hex}"))?;
            options = options.with_colour(colour);
        }
        if let Some(layer) = &self.layer {
            options = options.with_layer_name(layer);
        }
        if !(self.font_scale.is_finite() && self.font_scale > 0.0) {
            return Err(format!("invalid font scale: {}", self.font_scale));
        }
        Ok(options)
    }
}

fn run(cli: &Cli, options: &OverlayOptions) -> Result<(), OverlayError> {
    let images = collect_inputs(&cli.input, &options.ocr_suffix)?;
    log::info!("found {} images to convert", images.len());

    let report = convert(&images, &cli.output, options)?;
    if report.skipped_lines > 0 || report.missing_ocr > 0 || report.malformed_ocr > 0 {
        log::warn!(
            "skipped {} lines, {} images without OCR result, {} malformed OCR results",
            report.skipped_lines,
            report.missing_ocr,
            report.malformed_ocr
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let options = match cli.options() {
        Ok(options) => options,
        Err(message) => {
            log::error!("{message}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(OverlayError::NoPages) => {
            log::error!("no page was produced, nothing written");
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
