//! Filling a [`DocumentNode`] page by page from parser output.
//!
//! ```text
//! PageContent  ->  lines  ->  WordNode[]  ->  add_word  ->  combine_children
//!                  words::group_runs_into_lines / words::build_words
//! ```

pub mod spacing;
pub mod words;

use std::sync::Arc;

use crate::config::AnalysisConfig;
use crate::input::{PageContent, TextRun};
use crate::observer::{AssemblyEvent, AssemblyObserver, NoopObserver};
use crate::style::{FormulaDetector, StyleRegistry};
use crate::tree::{DocumentNode, PageId};
use crate::StructureError;

/// Builds the document tree one page at a time.
pub struct DocumentBuilder<O = NoopObserver> {
    config: AnalysisConfig,
    doc: DocumentNode,
    observer: O,
}

impl DocumentBuilder<NoopObserver> {
    pub fn new(styles: Arc<StyleRegistry>, config: AnalysisConfig) -> Self {
        let doc = DocumentNode::new(styles, config.assembly.clone());
        DocumentBuilder {
            config,
            doc,
            observer: NoopObserver,
        }
    }
}

impl<O: AssemblyObserver> DocumentBuilder<O> {
    pub fn with_observer<P: AssemblyObserver>(self, observer: P) -> DocumentBuilder<P> {
        DocumentBuilder {
            config: self.config,
            doc: self.doc,
            observer,
        }
    }

    pub fn with_formula_detector(mut self, detector: Box<dyn FormulaDetector>) -> Self {
        self.doc = self.doc.with_formula_detector(detector);
        self
    }

    /// Segment and place every run of `page`.
    ///
    /// The page node exists afterwards even if no word came out of it. Runs
    /// with non-finite geometry are skipped.
    pub fn fill_page(&mut self, page: &PageContent) -> Result<PageId, StructureError> {
        let page_id = self.doc.add_page(page.number, page.dimensions);

        let mut runs: Vec<TextRun> = Vec::with_capacity(page.runs.len());
        for run in &page.runs {
            if run.pos.is_finite() && run.distance_to_preceding.is_finite() {
                runs.push(run.clone());
            } else {
                log::warn!(
                    target: "pdf_structure::words",
                    "page {}: skipping run '{}' with non-finite geometry {}",
                    page.number,
                    run.text,
                    run.pos
                );
                self.observer.observe(&AssemblyEvent::RunSkipped {
                    page: page.number,
                    reason: format!("non-finite geometry {}", run.pos),
                });
            }
        }

        let mut word_count = 0;
        for line in words::group_runs_into_lines(runs) {
            let line_words = words::build_words(
                &line,
                page.number,
                &self.config.segmentation,
                &mut self.observer,
            );
            for word in line_words {
                self.doc.add_word(word, &mut self.observer)?;
                word_count += 1;
            }
        }

        self.doc.combine_children(page_id.node(), &mut self.observer);

        log::debug!(
            target: "pdf_structure::tree",
            "page {}: {} words in {} paragraphs",
            page.number,
            word_count,
            self.doc.paragraphs(page_id).count()
        );

        Ok(page_id)
    }

    pub fn document(&self) -> &DocumentNode {
        &self.doc
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn finish(self) -> DocumentNode {
        self.doc
    }

    pub fn into_parts(self) -> (DocumentNode, O) {
        (self.doc, self.observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rectangle;
    use crate::observer::EventLog;
    use crate::style::{FontDescriptor, StyleRef};

    fn setup() -> (Arc<StyleRegistry>, StyleRef) {
        let registry = Arc::new(StyleRegistry::new());
        let style = registry.intern(&FontDescriptor {
            font_name: "Times".to_string(),
            font_size: 10.0,
            line_height: 10.0,
            width_of_space: 3.0,
            char_widths: Vec::new(),
        });
        (registry, style)
    }

    fn make_run(text: &str, style: &StyleRef, x: f32, y: f32, w: f32, distance: f32) -> TextRun {
        TextRun::new(text, style.clone(), Rectangle::new(x, y, w, 10.0), 1, distance)
    }

    fn make_page(runs: Vec<TextRun>) -> PageContent {
        let mut page = PageContent::new(1, Rectangle::new(0.0, 0.0, 600.0, 800.0));
        for run in runs {
            page.push(run);
        }
        page
    }

    #[test]
    fn test_report_scenario_is_one_word() {
        let (registry, style) = setup();
        let page = make_page(vec![
            make_run("Report", &style, 0.0, 0.0, 60.0, 0.0),
            make_run("1", &style, 65.0, 0.0, 5.0, 5.0),
            make_run(".", &style, 71.0, 0.0, 3.0, 1.0),
            make_run("2", &style, 75.0, 0.0, 5.0, 4.0),
        ]);

        let mut builder = DocumentBuilder::new(registry, AnalysisConfig::default());
        builder.fill_page(&page).unwrap();
        let doc = builder.finish();

        let words = doc.words();
        assert_eq!(words.len(), 1);
        let word = doc.word(words[0]);
        assert_eq!(word.text(), "Report1.2");
        assert_eq!(word.char_spacing(), 6.0);
        assert_eq!(word.pos(), Rectangle::new(0.0, 0.0, 80.0, 10.0));
    }

    #[test]
    fn test_empty_page_still_creates_page_node() {
        let (registry, _) = setup();
        let mut builder = DocumentBuilder::new(registry, AnalysisConfig::default());
        let empty = PageContent::new(4, Rectangle::new(0.0, 0.0, 600.0, 800.0));
        let page = builder.fill_page(&empty).unwrap();
        let doc = builder.finish();
        assert_eq!(doc.pages().collect::<Vec<_>>(), vec![page]);
        assert_eq!(doc.page_number(page), 4);
        assert_eq!(doc.text(page.node()), "");
    }

    #[test]
    fn test_non_finite_runs_are_skipped() {
        let (registry, style) = setup();
        let page = make_page(vec![
            make_run("good", &style, 0.0, 100.0, 40.0, 0.0),
            make_run("bad", &style, f32::NAN, 100.0, 30.0, 0.0),
        ]);

        let mut builder = DocumentBuilder::new(registry, AnalysisConfig::default())
            .with_observer(EventLog::new());
        builder.fill_page(&page).unwrap();
        let (doc, log) = builder.into_parts();

        assert_eq!(doc.text(doc.root()), "good");
        assert_eq!(log.count(|e| matches!(e, AssemblyEvent::RunSkipped { .. })), 1);
        assert_eq!(log.words_emitted(), 1);
    }

    #[test]
    fn test_two_lines_form_one_paragraph() {
        let (registry, style) = setup();
        // Runs arrive bottom line first.
        let page = make_page(vec![
            make_run("second", &style, 10.0, 111.0, 60.0, 0.0),
            make_run("first", &style, 10.0, 100.0, 50.0, 0.0),
            make_run("line", &style, 120.0, 100.0, 40.0, 60.0),
        ]);

        let mut builder = DocumentBuilder::new(registry, AnalysisConfig::default());
        let page_id = builder.fill_page(&page).unwrap();
        let doc = builder.finish();

        let paragraphs: Vec<_> = doc.paragraphs(page_id).collect();
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(doc.text(paragraphs[0].node()), "first line\nsecond");
    }
}
