//! Reading-structure reconstruction for positioned text.
//!
//! Takes the glyph runs a document parser produced for each page and rebuilds
//! words, lines, paragraphs and pages from their geometry, then tags words
//! with semantic roles such as running headers and page numbers.
//!
//! ```text
//! DocumentContent  ->  DocumentBuilder::fill_page (per page)  ->  DocumentNode
//!                                                                    |
//!                                       RoleRecognizer::recognize  <-+
//! ```

use thiserror::Error;

pub mod builder;
pub mod config;
pub mod geom;
pub mod input;
pub mod observer;
pub mod roles;
pub mod sorting;
pub mod style;
pub mod tree;

pub use builder::DocumentBuilder;
pub use config::{AnalysisConfig, AssemblyConfig, RoleConfig, SegmentationConfig};
pub use geom::{HasPosition, Rectangle};
pub use input::{DocumentContent, PageContent, TextRun};
pub use observer::{AssemblyEvent, AssemblyObserver, EventLog, NoopObserver, RejectReason};
pub use roles::{Role, RoleRecognizer, RoleSet};
pub use style::{FontDescriptor, FormulaDetector, Style, StyleId, StyleRef, StyleRegistry};
pub use tree::{DocumentNode, LineId, NodeId, NodeKind, PageId, ParagraphId, WordId, WordNode};

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Body text style must be a real font style, got {0}")]
    InvalidBodyStyle(StyleId),
    #[error("Page not found: {0}")]
    UnknownPage(u32),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the whole pipeline over a document.
///
/// 1. Check the body style (sentinels are rejected before any work is done).
/// 2. For each page: group runs into lines, segment words, place them, merge
///    lines on the same baseline.
/// 3. Tag roles over the finished tree.
pub fn analyze(
    content: &DocumentContent,
    body_style: StyleRef,
    config: &AnalysisConfig,
    observer: &mut dyn AssemblyObserver,
) -> Result<DocumentNode, StructureError> {
    let recognizer = RoleRecognizer::new(body_style, config.roles.clone())?;

    let mut builder = DocumentBuilder::new(content.styles.clone(), config.clone())
        .with_observer(&mut *observer);
    for page in &content.pages {
        builder.fill_page(page)?;
    }
    let mut doc = builder.finish();

    let added = recognizer.recognize(&mut doc, observer);
    log::debug!(
        target: "pdf_structure::roles",
        "{} pages, {} words, {} roles assigned",
        doc.pages().count(),
        doc.words().len(),
        added
    );

    Ok(doc)
}
