//! Positioned text lines of a PDF page and the queries the extractor runs
//! against them. Coordinates are PDF user space: origin bottom-left, y up.

#[cfg(feature = "mupdf")]
mod mupdf_backend;
pub mod resolver;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

pub use resolver::{BlockResolver, LayoutConfig};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &BBox) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    #[serde(flatten)]
    pub bbox: BBox,
}

/// The anchor line of one numbered problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProblemLabel {
    pub number: u32,
    pub bbox: BBox,
}

/// Text-line queries over a single page.
pub trait TextQuery {
    /// Box of the first line, in reading order, whose text contains `needle`.
    fn find_line(&self, needle: &str) -> Option<BBox>;
    /// Text of every line fully inside `area`, in reading order, joined by
    /// single spaces.
    fn text_in(&self, area: &BBox) -> String;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageText {
    pub lines: Vec<TextLine>,
}

impl TextQuery for PageText {
    fn find_line(&self, needle: &str) -> Option<BBox> {
        self.lines
            .iter()
            .find(|line| line.text.contains(needle))
            .map(|line| line.bbox)
    }

    fn text_in(&self, area: &BBox) -> String {
        self.lines
            .iter()
            .filter(|line| area.contains(&line.bbox))
            .flat_map(|line| line.text.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub pages: Vec<PageText>,
}

impl DocumentLayout {
    pub fn page(&self, index: usize) -> Option<&PageText> {
        self.pages.get(index)
    }
}

pub const LAYOUT_SUFFIX: &str = ".layout.json";

/// Load the text layout of a `*.pdf` or a pre-extracted `*.layout.json`.
pub fn load_document(path: &Path) -> Result<DocumentLayout, ExtractError> {
    let malformed = |reason: String| ExtractError::MalformedDocument {
        path: path.display().to_string(),
        reason,
    };
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| malformed("invalid file name".into()))?;

    if name.ends_with(LAYOUT_SUFFIX) {
        let raw = std::fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
        return serde_json::from_str(&raw).map_err(|e| malformed(e.to_string()));
    }
    load_pdf(path).map_err(malformed)
}

#[cfg(feature = "mupdf")]
fn load_pdf(path: &Path) -> Result<DocumentLayout, String> {
    mupdf_backend::load(path)
}

#[cfg(not(feature = "mupdf"))]
fn load_pdf(_path: &Path) -> Result<DocumentLayout, String> {
    Err("PDF support requires the `mupdf` feature".into())
}
