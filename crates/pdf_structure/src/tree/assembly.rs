//! Placing words into pages, paragraphs and lines.
//!
//! Placement is greedy: a word goes into the first paragraph that takes it,
//! and within it into the first line that takes it. Since arrival order says
//! little about geometry, [`DocumentNode::combine_children`] runs afterwards
//! and merges lines that turned out to sit on the same baseline.
//!
//! Nodes detached by a merge stay in the arena but are unreachable from the
//! root.

use crate::geom::{is_within_variance, Rectangle};
use crate::observer::{AssemblyEvent, AssemblyObserver, RejectReason};
use crate::StructureError;

use super::{DocumentNode, LineId, NodeId, NodeKind, PageId, ParagraphId, WordId, WordNode};

impl DocumentNode {
    /// Place a word on the page it names.
    pub fn add_word(
        &mut self,
        word: WordNode,
        observer: &mut dyn AssemblyObserver,
    ) -> Result<WordId, StructureError> {
        let page = self.require_page(word.page_number())?;
        let id = self.new_word(word);
        self.page_add_word(page, id, observer);
        Ok(id)
    }

    /// Offer a word to each paragraph of the page; start a new one if none takes it.
    pub fn page_add_word(
        &mut self,
        page: PageId,
        word: WordId,
        observer: &mut dyn AssemblyObserver,
    ) {
        let paragraphs: Vec<ParagraphId> = self.paragraphs(page).collect();
        for paragraph in paragraphs {
            if self.paragraph_add_word(paragraph, word, observer) {
                return;
            }
        }

        log::debug!(
            target: "pdf_structure::tree",
            "page {}: new paragraph for {}",
            self.page_number(page),
            self.word(word)
        );

        // Fill before attaching so the page sorts the paragraph by its real position.
        let paragraph = self.new_paragraph();
        let line = self.new_line();
        self.add_child(line.node(), word.node());
        self.add_child(paragraph.node(), line.node());
        self.add_child(page.node(), paragraph.node());

        observer.observe(&AssemblyEvent::NewParagraph {
            page: self.page_number(page),
        });
    }

    /// Try to place a word in a paragraph. Returns false if the paragraph refuses it.
    pub fn paragraph_add_word(
        &mut self,
        paragraph: ParagraphId,
        word: WordId,
        observer: &mut dyn AssemblyObserver,
    ) -> bool {
        let lines: Vec<LineId> = self.lines(paragraph).collect();

        if lines.is_empty() {
            log::debug!(
                target: "pdf_structure::tree",
                "{}: first line for {}",
                self.summary(paragraph.node()),
                self.word(word)
            );
            self.push_new_line(paragraph, word);
            return true;
        }

        for line in lines {
            if self.line_add_word(line, word) {
                return true;
            }
        }

        match self.new_line_rejection(paragraph, word) {
            None => {
                log::debug!(
                    target: "pdf_structure::tree",
                    "{}: {} is a new line in this paragraph",
                    self.summary(paragraph.node()),
                    self.word(word)
                );
                self.push_new_line(paragraph, word);
                true
            }
            Some(reason) => {
                log::trace!(
                    target: "pdf_structure::tree",
                    "{} rejected: {:?}",
                    self.word(word),
                    reason
                );
                observer.observe(&AssemblyEvent::WordRejected { reason });
                false
            }
        }
    }

    fn push_new_line(&mut self, paragraph: ParagraphId, word: WordId) {
        let line = self.new_line();
        self.add_child(line.node(), word.node());
        self.add_child(paragraph.node(), line.node());
    }

    /// Append a word to a line if its top coincides with the line's.
    pub fn line_add_word(&mut self, line: LineId, word: WordId) -> bool {
        if !self.children(line.node()).is_empty()
            && !self.is_on_same_line(self.pos(line.node()), self.word(word).pos())
        {
            return false;
        }
        self.add_child(line.node(), word.node());
        true
    }

    /// Two tops are on the same line when they differ by at most
    /// `line_y_tolerance` of the shorter height.
    fn is_on_same_line(&self, a: Rectangle, b: Rectangle) -> bool {
        let variance = self.config.line_y_tolerance * a.height.min(b.height);
        is_within_variance(a.y, b.y, variance)
    }

    /// Whether a word no line accepted still continues this paragraph as a new line.
    pub fn is_new_line_in_this_paragraph(&self, paragraph: ParagraphId, word: WordId) -> bool {
        self.new_line_rejection(paragraph, word).is_none()
    }

    fn new_line_rejection(&self, paragraph: ParagraphId, word: WordId) -> Option<RejectReason> {
        let last_line = match self.children(paragraph.node()).last() {
            Some(&line) if !self.children(line).is_empty() => line,
            _ => return None,
        };

        let line_style = self.style(last_line);
        let word = self.word(word);
        let para = self.pos(paragraph.node());
        let pos = word.pos();

        // The smaller of the two line heights decides how far below it may start.
        let y_size = line_style.y_size.min(word.style().y_size);
        if !is_within_variance(para.end_y(), pos.y, y_size) {
            return Some(RejectReason::TooFarBelow);
        }

        let space = line_style.width_of_space;
        let starts_aligned = is_within_variance(para.x, pos.x, space);
        let ends_aligned = is_within_variance(para.end_x(), pos.end_x(), space);
        let starts_inside = para.x < pos.x && para.end_x() + space > pos.x;

        if starts_aligned || ends_aligned || starts_inside {
            None
        } else {
            Some(RejectReason::NotAligned)
        }
    }

    // -- Retroactive merging -------------------------------------------------

    /// Merge lines on the same baseline in every paragraph below `id`.
    ///
    /// Children are re-sorted on the way back up, since nodes grew after they
    /// were attached.
    pub fn combine_children(&mut self, id: NodeId, observer: &mut dyn AssemblyObserver) {
        match self.kind(id) {
            NodeKind::Word(_) => return,
            NodeKind::Paragraph => self.combine_lines(ParagraphId(id), observer),
            _ => {}
        }

        let children = self.children(id).to_vec();
        for child in children {
            self.combine_children(child, observer);
        }

        self.sort_children(id);
        self.invalidate_this_and_parents(id);
    }

    fn combine_lines(&mut self, paragraph: ParagraphId, observer: &mut dyn AssemblyObserver) {
        // Merged lines are blanked out rather than removed so indices stay valid.
        let mut lines: Vec<Option<LineId>> = self.lines(paragraph).map(Some).collect();

        for i in 0..lines.len() {
            let Some(first) = lines[i] else { continue };

            for j in 0..lines.len() {
                if i == j {
                    continue;
                }
                let Some(second) = lines[j] else { continue };

                if self.is_on_same_line(self.pos(first.node()), self.pos(second.node())) {
                    log::debug!(
                        target: "pdf_structure::tree",
                        "combining lines {} and {}",
                        self.summary(first.node()),
                        self.summary(second.node())
                    );
                    observer.observe(&AssemblyEvent::LinesCombined {
                        kept: self.children(first.node()).len(),
                        removed: self.children(second.node()).len(),
                    });
                    self.combine_line_with(first, second);
                    lines[j] = None;
                }
            }
        }
    }

    /// Move every word of `other` into `line` and detach `other`.
    pub fn combine_line_with(&mut self, line: LineId, other: LineId) {
        let words = self.children(other.node()).to_vec();
        self.add_children(line.node(), words);
        if let Some(parent) = self.parent(other.node()) {
            self.remove_child(parent, other.node());
        }
    }

    /// Move every line of `other` into `paragraph` without any checks and
    /// detach `other`.
    pub fn combine_with(&mut self, paragraph: ParagraphId, other: ParagraphId) {
        let lines = self.children(other.node()).to_vec();
        self.add_children(paragraph.node(), lines);
        if let Some(parent) = self.parent(other.node()) {
            self.remove_child(parent, other.node());
        }
    }
}
