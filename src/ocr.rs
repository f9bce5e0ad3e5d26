//! The OCR document model: pages made of lines made of words, each with an
//! axis-aligned bounding [Rect] in image space.
//!
//! OCR engines report a four-corner polygon per region. [decode] collapses each
//! polygon to its bounding box, which is the only normalization this layer does.
//!
//! ```
//! let json = r#"[{"lines": [{
//!     "text": "Hello",
//!     "boundingPolygon": [{"x": 10, "y": 5}, {"x": 60, "y": 6}, {"x": 60, "y": 20}, {"x": 10, "y": 19}],
//!     "words": [{
//!         "text": "Hello",
//!         "boundingPolygon": [{"x": 10, "y": 5}, {"x": 60, "y": 6}, {"x": 60, "y": 20}, {"x": 10, "y": 19}],
//!         "confidence": 0.98
//!     }]
//! }]}]"#;
//!
//! let pages = ocr_overlay::ocr::decode(json).expect("valid OCR result");
//! assert_eq!(pages[0].lines[0].rect, ocr_overlay::Rect::new(10, 5, 60, 20));
//! ```

use crate::point::Point;
use crate::rect::Rect;
use crate::Result;
use serde::Deserialize;
use std::io::Read;

/// A single recognized word
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Word {
    pub text: String,
    #[serde(rename = "boundingPolygon")]
    pub rect: Rect,
    #[serde(default)]
    pub confidence: f32,
}

/// A recognized line of text. `text` is the engine's transcription of the whole
/// line and may differ from the concatenated words.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Line {
    pub text: String,
    #[serde(rename = "boundingPolygon")]
    pub rect: Rect,
    /// Words in the order the engine produced them
    pub words: Vec<Word>,
}

impl Line {
    /// Rebuild the line text from its words. A word is preceded by a space only
    /// when it is longer than one character, which keeps runs of single-glyph
    /// words (as OCR engines report CJK text) tight. Falls back to [Line::text]
    /// when there are no words.
    pub fn joined_text(&self) -> String {
        let mut words = self.words.iter();
        let Some(first) = words.next() else {
            return self.text.clone();
        };

        let mut text = first.text.clone();
        for word in words {
            if word.text.chars().count() > 1 {
                text.push(' ');
            }
            text.push_str(&word.text);
        }
        text
    }
}

/// One page of an OCR result
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawPage")]
pub struct Page {
    pub lines: Vec<Line>,
    rect: Option<Rect>,
}

#[derive(Deserialize)]
struct RawPage {
    lines: Vec<Line>,
}

impl From<RawPage> for Page {
    fn from(raw: RawPage) -> Self {
        Page::new(raw.lines)
    }
}

impl Page {
    pub fn new(lines: Vec<Line>) -> Page {
        let rect = lines
            .iter()
            .map(|line| line.rect)
            .reduce(|acc, r| acc.union(&r));
        Page { lines, rect }
    }

    /// The bounding box of every line on the page, or [None] if the page has no lines
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Deserialize)]
struct QuadPoint {
    x: f64,
    y: f64,
}

impl<'de> Deserialize<'de> for Rect {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<QuadPoint>::deserialize(deserializer)?;
        let quad: [QuadPoint; 4] = points.try_into().map_err(|points: Vec<QuadPoint>| {
            serde::de::Error::invalid_length(points.len(), &"a polygon of exactly 4 points")
        })?;

        // floor the low edges and ceil the high ones so fractional polygons stay covered
        let low = quad.each_ref().map(|p| Point::new(p.x.floor() as i32, p.y.floor() as i32));
        let high = quad.each_ref().map(|p| Point::new(p.x.ceil() as i32, p.y.ceil() as i32));
        let low = Rect::from_quad(low);
        let high = Rect::from_quad(high);
        Ok(Rect::new(low.x0, low.y0, high.x1, high.y1))
    }
}

/// Decode an OCR result: a JSON list of pages
pub fn decode(json: &str) -> Result<Vec<Page>> {
    Ok(serde_json::from_str(json)?)
}

/// Decode an OCR result from a reader, see [decode]
pub fn decode_reader<R: Read>(mut reader: R) -> Result<Vec<Page>> {
    let mut json = String::new();
    reader.read_to_string(&mut json)?;
    decode(&json)
}
