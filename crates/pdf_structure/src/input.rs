//! Records handed over by the upstream parser.

use std::sync::Arc;

use crate::geom::{HasPosition, Rectangle};
use crate::style::{StyleRef, StyleRegistry};

/// A contiguous span of glyphs sharing one style on one line.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub style: StyleRef,
    pub pos: Rectangle,
    pub font_size: f32,
    /// Vertical scale of the text matrix the run was drawn with.
    pub y_scale: f32,
    pub page_number: u32,
    /// Gap from the previous run's right edge on the same line.
    pub distance_to_preceding: f32,
    /// Advance width per char of `text`, when the parser knows them.
    pub char_widths: Option<Vec<f32>>,
}

impl TextRun {
    pub fn new(
        text: impl Into<String>,
        style: StyleRef,
        pos: Rectangle,
        page_number: u32,
        distance_to_preceding: f32,
    ) -> Self {
        let font_size = style.x_size;
        TextRun {
            text: text.into(),
            style,
            pos,
            font_size,
            y_scale: 1.0,
            page_number,
            distance_to_preceding,
            char_widths: None,
        }
    }

    pub fn with_char_widths(mut self, widths: Vec<f32>) -> Self {
        self.char_widths = Some(widths);
        self
    }

    pub fn with_font_size(mut self, font_size: f32, y_scale: f32) -> Self {
        self.font_size = font_size;
        self.y_scale = y_scale;
        self
    }

    /// Width of the char at `idx`; spreads the run width evenly when the
    /// parser supplied no (or unusable) per-char widths.
    pub(crate) fn char_width(&self, idx: usize) -> f32 {
        let even = || {
            let n = self.text.chars().count().max(1);
            self.pos.width / n as f32
        };
        match &self.char_widths {
            Some(widths) => match widths.get(idx) {
                Some(w) if *w > 0.0 => *w,
                _ => even(),
            },
            None => even(),
        }
    }

    /// Some parsers report glyph boxes far taller than the font allows.
    pub(crate) fn is_too_high(&self, max_height_factor: f32) -> bool {
        self.pos.height > self.font_size * self.y_scale * max_height_factor
    }
}

impl HasPosition for TextRun {
    fn pos(&self) -> Rectangle {
        self.pos
    }
}

/// Every run of one page, in document order, plus the page's size.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub number: u32,
    pub dimensions: Rectangle,
    pub runs: Vec<TextRun>,
}

impl PageContent {
    pub fn new(number: u32, dimensions: Rectangle) -> Self {
        PageContent {
            number,
            dimensions,
            runs: Vec::new(),
        }
    }

    pub fn push(&mut self, run: TextRun) {
        self.runs.push(run);
    }
}

/// All pages of a document and the style table their runs point into.
#[derive(Debug, Default)]
pub struct DocumentContent {
    pub styles: Arc<StyleRegistry>,
    pub pages: Vec<PageContent>,
}

impl DocumentContent {
    pub fn new(styles: Arc<StyleRegistry>) -> Self {
        DocumentContent {
            styles,
            pages: Vec::new(),
        }
    }

    pub fn add_page(&mut self, page: PageContent) {
        self.pages.push(page);
    }
}
