//! The document tree: document -> page -> paragraph -> line -> word.
//!
//! Nodes live in one arena owned by [`DocumentNode`]; parents and children
//! refer to each other by index. Each node caches its bounding rectangle, its
//! text, a short description and its dominant style. Any change to a node's
//! children clears those caches on the node and on every ancestor, and the
//! next read recomputes them.
//!
//! Children are kept sorted: words in a line by X, pages in the document by
//! page number, everything else by Y then X.

mod assembly;
mod word;

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use crate::config::AssemblyConfig;
use crate::geom::{find_bounds, Rectangle};
use crate::roles::{Role, RoleSet};
use crate::sorting::{by_lower_x, by_lower_y_then_lower_x};
use crate::style::{
    find_dominating_style, FormulaDetector, NeverFormula, StyleRef, StyleRegistry, StyledText,
};
use crate::StructureError;

pub use word::WordNode;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Index of a node in its document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

macro_rules! typed_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NodeId);

        impl $name {
            pub fn node(self) -> NodeId {
                self.0
            }
        }

        impl From<$name> for NodeId {
            fn from(id: $name) -> NodeId {
                id.0
            }
        }
    };
}

typed_id!(
    /// A page node.
    PageId
);
typed_id!(
    /// A paragraph node.
    ParagraphId
);
typed_id!(
    /// A line node.
    LineId
);
typed_id!(
    /// A word leaf.
    WordId
);

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Page { number: u32, dimensions: Rectangle },
    Paragraph,
    Line,
    Word(WordNode),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "Document",
            NodeKind::Page { .. } => "Page",
            NodeKind::Paragraph => "Paragraph",
            NodeKind::Line => "Line",
            NodeKind::Word(_) => "Word",
        }
    }

    /// Separator placed between children's text.
    fn text_separator(&self) -> &'static str {
        match self {
            NodeKind::Line => " ",
            NodeKind::Paragraph => "\n",
            _ => "\n\n",
        }
    }
}

/// Derived values, computed on first read after the last mutation.
#[derive(Debug, Default)]
struct NodeCache {
    pos: OnceCell<Rectangle>,
    text: OnceCell<String>,
    summary: OnceCell<String>,
    style: OnceCell<StyleRef>,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    cache: NodeCache,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            parent: None,
            children: Vec::new(),
            cache: NodeCache::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Root of the tree and owner of every node in it.
pub struct DocumentNode {
    nodes: Vec<Node>,
    root: NodeId,
    styles: Arc<StyleRegistry>,
    formula: Box<dyn FormulaDetector>,
    config: AssemblyConfig,
}

impl fmt::Debug for DocumentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentNode")
            .field("nodes", &self.nodes.len())
            .field("pages", &self.children(self.root).len())
            .field("styles", &self.styles.len())
            .finish()
    }
}

impl DocumentNode {
    pub fn new(styles: Arc<StyleRegistry>, config: AssemblyConfig) -> Self {
        DocumentNode {
            nodes: vec![Node::new(NodeKind::Document)],
            root: NodeId(0),
            styles,
            formula: Box::new(NeverFormula),
            config,
        }
    }

    /// Replace the formula heuristic consulted by [`DocumentNode::style`].
    pub fn with_formula_detector(mut self, detector: Box<dyn FormulaDetector>) -> Self {
        self.formula = detector;
        self.invalidate_all_styles();
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.styles
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    // -- Structure ---------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn pages(&self) -> impl Iterator<Item = PageId> + '_ {
        self.children(self.root).iter().map(|&id| PageId(id))
    }

    pub fn paragraphs(&self, page: PageId) -> impl Iterator<Item = ParagraphId> + '_ {
        self.children(page.0).iter().map(|&id| ParagraphId(id))
    }

    pub fn lines(&self, paragraph: ParagraphId) -> impl Iterator<Item = LineId> + '_ {
        self.children(paragraph.0).iter().map(|&id| LineId(id))
    }

    pub fn line_words(&self, line: LineId) -> impl Iterator<Item = WordId> + '_ {
        self.children(line.0).iter().map(|&id| WordId(id))
    }

    /// Every word below `id`, depth first in child order.
    pub fn words_under(&self, id: NodeId) -> Vec<WordId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let NodeKind::Word(_) = self.kind(current) {
                out.push(WordId(current));
            }
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Every word in the document, in reading order.
    pub fn words(&self) -> Vec<WordId> {
        self.words_under(self.root)
    }

    pub fn word(&self, id: WordId) -> &WordNode {
        match &self.nodes[id.0 .0].kind {
            NodeKind::Word(word) => word,
            other => unreachable!("WordId points at a {} node", other.name()),
        }
    }

    pub fn page_number(&self, page: PageId) -> u32 {
        match self.kind(page.0) {
            NodeKind::Page { number, .. } => *number,
            _ => 0,
        }
    }

    /// Physical page size as reported by the parser.
    pub fn page_dimensions(&self, page: PageId) -> Rectangle {
        match self.kind(page.0) {
            NodeKind::Page { dimensions, .. } => *dimensions,
            _ => crate::geom::EMPTY_BOUNDS,
        }
    }

    pub fn page_by_number(&self, number: u32) -> Option<PageId> {
        self.pages().find(|&p| self.page_number(p) == number)
    }

    /// The page a node belongs to, if it is attached to one.
    pub fn page_of(&self, id: NodeId) -> Option<PageId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if let NodeKind::Page { .. } = self.kind(node) {
                return Some(PageId(node));
            }
            current = self.parent(node);
        }
        None
    }

    // -- Cached reads --------------------------------------------------------

    /// Bounding rectangle of a node.
    pub fn pos(&self, id: NodeId) -> Rectangle {
        let node = &self.nodes[id.0];
        if let NodeKind::Word(word) = &node.kind {
            return word.pos();
        }
        *node
            .cache
            .pos
            .get_or_init(|| find_bounds(node.children.iter().map(|&c| self.pos(c))))
    }

    /// Text of a node; children joined by a level-specific separator.
    pub fn text(&self, id: NodeId) -> &str {
        let node = &self.nodes[id.0];
        if let NodeKind::Word(word) = &node.kind {
            return word.text();
        }
        node.cache.text.get_or_init(|| {
            node.children
                .iter()
                .map(|&c| self.text(c))
                .collect::<Vec<_>>()
                .join(node.kind.text_separator())
        })
    }

    /// Short human-readable description, for diagnostics.
    pub fn summary(&self, id: NodeId) -> &str {
        let node = &self.nodes[id.0];
        node.cache.summary.get_or_init(|| {
            if let NodeKind::Word(word) = &node.kind {
                return word.to_string();
            }
            let text = self.text(id);
            let preview: String = text.chars().take(40).collect();
            let ellipsis = if preview.len() < text.len() { "..." } else { "" };
            format!(
                "{}{{{}, '{}{}'}}",
                node.kind.name(),
                self.pos(id),
                preview.replace('\n', " / "),
                ellipsis
            )
        })
    }

    /// Dominant style below a node, weighted by character count.
    ///
    /// On equal counts the style met first in reading order wins. A node
    /// without words has [`crate::style::Style::no_style`].
    pub fn style(&self, id: NodeId) -> StyleRef {
        let node = &self.nodes[id.0];
        if let NodeKind::Word(word) = &node.kind {
            return word.style().clone();
        }
        node.cache
            .style
            .get_or_init(|| {
                let words = self.words_under(id);
                let items: Vec<&dyn StyledText> = words
                    .iter()
                    .map(|&w| self.word(w) as &dyn StyledText)
                    .collect();
                find_dominating_style(&items, self.formula.as_ref())
            })
            .clone()
    }

    /// Union of the roles of every word below a node. Not cached.
    pub fn roles(&self, id: NodeId) -> RoleSet {
        if let NodeKind::Word(word) = self.kind(id) {
            return word.roles();
        }
        self.words_under(id)
            .into_iter()
            .fold(RoleSet::new(), |acc, w| acc.union(self.word(w).roles()))
    }

    /// Add a role to a word; returns false if it already had it.
    pub fn add_role(&mut self, id: WordId, role: Role) -> bool {
        match &mut self.nodes[id.0 .0].kind {
            NodeKind::Word(word) => word.add_role(role),
            _ => false,
        }
    }

    /// True when a line starts noticeably right of its paragraph.
    pub fn is_indented(&self, line: LineId) -> bool {
        match self.parent(line.0) {
            Some(paragraph) => {
                self.pos(line.0).x > self.pos(paragraph).x + self.config.indent_threshold
            }
            None => false,
        }
    }

    // -- Mutation ------------------------------------------------------------

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    /// Create the page node for `number`, or return the existing one.
    pub fn add_page(&mut self, number: u32, dimensions: Rectangle) -> PageId {
        if let Some(existing) = self.page_by_number(number) {
            return existing;
        }
        let id = self.alloc(NodeKind::Page { number, dimensions });
        self.add_child(self.root, id);
        PageId(id)
    }

    pub(crate) fn new_paragraph(&mut self) -> ParagraphId {
        ParagraphId(self.alloc(NodeKind::Paragraph))
    }

    pub(crate) fn new_line(&mut self) -> LineId {
        LineId(self.alloc(NodeKind::Line))
    }

    pub(crate) fn new_word(&mut self, word: WordNode) -> WordId {
        WordId(self.alloc(NodeKind::Word(word)))
    }

    /// Attach `child` under `parent`, keeping children sorted.
    ///
    /// A child that already has a parent is moved.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.invalidate_this_and_parents(parent);
        self.sort_this_and_parents(parent);
    }

    /// Attach several children at once; sorts and invalidates once.
    pub fn add_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.detach(child);
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0].children.extend(children);
        self.invalidate_this_and_parents(parent);
        self.sort_this_and_parents(parent);
    }

    /// Detach `child` from `parent`. Returns false if it was not a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.nodes[child.0].parent != Some(parent) {
            return false;
        }
        self.detach(child);
        true
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|&c| c != child);
            self.invalidate_this_and_parents(old);
        }
    }

    fn sort_children(&mut self, parent: NodeId) {
        let mut children = std::mem::take(&mut self.nodes[parent.0].children);
        match self.nodes[parent.0].kind {
            NodeKind::Document => {
                children.sort_by_key(|&c| self.page_number(PageId(c)));
            }
            NodeKind::Line => {
                children.sort_by(|&a, &b| by_lower_x(&self.pos(a), &self.pos(b)));
            }
            _ => {
                children.sort_by(|&a, &b| by_lower_y_then_lower_x(&self.pos(a), &self.pos(b)));
            }
        }
        self.nodes[parent.0].children = children;
    }

    /// Re-sort `id` and every ancestor; a grown child can change its
    /// parent's place among its siblings.
    fn sort_this_and_parents(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            self.sort_children(node);
            current = self.nodes[node.0].parent;
        }
    }

    /// Clear cached values on `id` and every ancestor.
    fn invalidate_this_and_parents(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            self.nodes[node.0].cache = NodeCache::default();
            current = self.nodes[node.0].parent;
        }
    }

    fn invalidate_all_styles(&mut self) {
        for node in &mut self.nodes {
            node.cache.style = OnceCell::new();
        }
    }

    /// Look up a page, failing for numbers never added.
    pub fn require_page(&self, number: u32) -> Result<PageId, StructureError> {
        self.page_by_number(number)
            .ok_or(StructureError::UnknownPage(number))
    }
}
