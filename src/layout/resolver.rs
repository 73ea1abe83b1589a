use serde::Deserialize;

use super::{BBox, ProblemLabel, TextQuery};

/// Slack added around a label when growing its text block.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical slack per line, in points.
    pub extra_line_spacing: f64,
    /// Horizontal slack to the right of the label, in points.
    pub extra_width: f64,
    /// Upper bound on growth steps for a single block.
    pub max_lines: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            extra_line_spacing: 10.0,
            extra_width: 60.0,
            max_lines: 64,
        }
    }
}

pub struct BlockResolver {
    config: LayoutConfig,
}

impl BlockResolver {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Area covering `num_lines` lines below the top of `label`.
    pub fn search_area(&self, label: &ProblemLabel, num_lines: usize) -> BBox {
        let line_height = label.bbox.height();
        BBox {
            x0: label.bbox.x0,
            y0: label.bbox.y1 - (line_height + self.config.extra_line_spacing) * num_lines as f64,
            x1: label.bbox.x1 + self.config.extra_width,
            y1: label.bbox.y1,
        }
    }

    /// Grow the area one line at a time while it captures more text, and
    /// return the text of the last area that grew.
    pub fn expand_to_block<Q: TextQuery + ?Sized>(&self, label: &ProblemLabel, query: &Q) -> String {
        let text_for = |num_lines| query.text_in(&self.search_area(label, num_lines));

        let mut num_lines = 1;
        let mut current = text_for(num_lines);
        while num_lines < self.config.max_lines {
            let next = text_for(num_lines + 1);
            if next.chars().count() <= current.chars().count() {
                break;
            }
            current = next;
            num_lines += 1;
        }
        current
    }
}

impl Default for BlockResolver {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{PageText, TextLine};

    fn line(text: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> TextLine {
        TextLine {
            text: text.into(),
            bbox: BBox { x0, y0, x1, y1 },
        }
    }

    /// Two problems, the first wrapping over three lines.
    fn page() -> PageText {
        PageText {
            lines: vec![
                line("1. Jo has 5 red pens", 72.0, 700.0, 220.0, 712.0),
                line("and 4 blue pens.", 86.0, 686.0, 200.0, 698.0),
                line("How many pens?", 86.0, 672.0, 190.0, 684.0),
                line("2. A cat sleeps.", 72.0, 600.0, 180.0, 612.0),
            ],
        }
    }

    fn label(page: &PageText, number: u32) -> ProblemLabel {
        ProblemLabel {
            number,
            bbox: page.find_line(&format!("{}.", number)).unwrap(),
        }
    }

    #[test]
    fn search_area_geometry() {
        let resolver = BlockResolver::default();
        let lbl = ProblemLabel {
            number: 1,
            bbox: BBox { x0: 72.0, y0: 700.0, x1: 220.0, y1: 712.0 },
        };
        let area = resolver.search_area(&lbl, 2);
        assert_eq!(area, BBox { x0: 72.0, y0: 668.0, x1: 280.0, y1: 712.0 });
    }

    #[test]
    fn captures_wrapped_paragraph() {
        let page = page();
        let text = BlockResolver::default().expand_to_block(&label(&page, 1), &page);
        assert_eq!(text, "1. Jo has 5 red pens and 4 blue pens. How many pens?");
    }

    #[test]
    fn single_line_block() {
        let page = page();
        let text = BlockResolver::default().expand_to_block(&label(&page, 2), &page);
        assert_eq!(text, "2. A cat sleeps.");
    }

    #[test]
    fn growth_is_monotone_and_settles() {
        let page = page();
        let resolver = BlockResolver::default();
        let lbl = label(&page, 1);
        let lengths: Vec<usize> = (1..=8)
            .map(|n| page.text_in(&resolver.search_area(&lbl, n)).len())
            .collect();
        assert!(lengths.windows(2).all(|w| w[0] <= w[1]), "{:?}", lengths);
        assert_eq!(lengths[2], lengths[3]);
    }

    #[test]
    fn iteration_cap_bounds_runaway_growth() {
        // A column of lines packed tightly enough to keep growing forever.
        let lines = (0..200)
            .map(|i| {
                let top = 800.0 - 12.0 * i as f64;
                line(&format!("{}. row", i + 1), 72.0, top - 10.0, 120.0, top)
            })
            .collect();
        let page = PageText { lines };
        let resolver = BlockResolver::new(LayoutConfig {
            max_lines: 5,
            ..LayoutConfig::default()
        });
        let text = resolver.expand_to_block(&label(&page, 1), &page);
        let limit = page.text_in(&resolver.search_area(&label(&page, 1), 5));
        assert_eq!(text, limit);
    }
}
