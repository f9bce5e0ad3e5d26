//! Lay OCR results over page images to build searchable PDF documents.
//!
//! The crate is split in a few layers:
//!
//! * geometry ([Point], [Rect], [Vector1D], [Vector2D]) and the [ocr] document model,
//! * font resolution ([resolve], [FontCatalog]), picking one font per line of text,
//! * text fitting ([fit]), which stretches a line to exactly cover its OCR box,
//! * the PDF side ([Document], [Page], [Font], [Image]) and the [TextInserter] seam
//!   between fitted lines and pages,
//! * the [convert] pipeline tying it all together.

mod colour;
pub use colour::*;

mod descriptor;
pub use descriptor::*;

mod document;
pub use document::*;

mod font;
pub use font::*;

mod fit;
pub use fit::*;

mod image;
pub use self::image::*;

mod info;
pub use info::*;

/// The OCR document model: pages, lines and words
pub mod ocr;

mod page;
pub use page::*;

mod pipeline;
pub use pipeline::*;

mod point;
pub use point::*;

mod rect;
pub use rect::*;

mod resolve;
pub use resolve::*;

mod transform;
pub use transform::*;

mod vector;
pub use vector::*;

mod content;
pub(crate) mod refs;

mod units;
pub use units::*;

mod error;
pub use error::*;

/// Re-export PDF-writer functionality
pub use pdf_writer;
