use std::path::Path;

use ::mupdf::{Document, TextPageFlags};

use super::{BBox, DocumentLayout, PageText, TextLine};

/// Read every page's text lines with MuPDF. MuPDF puts the origin at the
/// top-left, so y is flipped against the page bounds.
pub fn load(path: &Path) -> Result<DocumentLayout, String> {
    let path_str = path.to_str().ok_or("invalid path encoding")?;
    let document = Document::open(path_str).map_err(|e| e.to_string())?;

    let mut pages = Vec::new();
    for page_result in document.pages().map_err(|e| e.to_string())? {
        let page = page_result.map_err(|e| e.to_string())?;
        let bounds = page.bounds().map_err(|e| e.to_string())?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| e.to_string())?;
        let flip = |y: f32| f64::from(bounds.y0 + bounds.y1 - y);

        let mut lines = Vec::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let text: String = line
                    .chars()
                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                    .collect();
                if text.trim().is_empty() {
                    continue;
                }
                let rect = line.bounds();
                lines.push(TextLine {
                    text,
                    bbox: BBox {
                        x0: f64::from(rect.x0),
                        y0: flip(rect.y1),
                        x1: f64::from(rect.x1),
                        y1: flip(rect.y0),
                    },
                });
            }
        }
        pages.push(PageText { lines });
    }

    Ok(DocumentLayout { pages })
}
