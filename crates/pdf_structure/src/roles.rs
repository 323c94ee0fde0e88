//! Semantic roles for words, assigned in one pass over a finished tree.
//!
//! Every check compares a word against the document's body text style, which
//! the caller must supply. Roles are only ever added, so running the pass
//! twice leaves the tree unchanged.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::config::RoleConfig;
use crate::observer::{AssemblyEvent, AssemblyObserver};
use crate::style::StyleRef;
use crate::tree::{DocumentNode, WordId, WordNode};
use crate::StructureError;

// ---------------------------------------------------------------------------
// Role & RoleSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Inline citation or numbered-reference marker such as `(a)` or `3.`.
    Identifier,
    /// Running header.
    Headnote,
    Footnote,
    Pagenumber,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Identifier, Role::Headnote, Role::Footnote, Role::Pagenumber];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Identifier => "IDENTIFIER",
            Role::Headnote => "HEADNOTE",
            Role::Footnote => "FOOTNOTE",
            Role::Pagenumber => "PAGENUMBER",
        };
        f.write_str(name)
    }
}

/// Set of roles on a word, or the union over a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    pub fn new() -> Self {
        RoleSet(0)
    }

    /// Add a role; returns false if it was already present.
    pub fn insert(&mut self, role: Role) -> bool {
        let had = self.contains(role);
        self.0 |= role.bit();
        !had
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn union(self, other: RoleSet) -> RoleSet {
        RoleSet(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl Serialize for RoleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// A one or two char token, or `X` followed by one or two digits.
const ID: &str = r"(?:X[0-9]{1,2}|(?-u:\w){1,2})";

fn ref_with_dot() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?s)^\s*({ID}\s*\.\s*[0-9]?).*$")).unwrap())
}

fn num_in_parenthesis() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"(?s)^(\(\s*{ID}\s*\)).*$")).unwrap())
}

/// True for text that opens with a reference marker: `(<id>)...` or
/// `<id> .<digit>?...`.
pub fn looks_like_identifier(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    num_in_parenthesis().is_match(trimmed) || ref_with_dot().is_match(trimmed)
}

// ---------------------------------------------------------------------------
// Recognizer
// ---------------------------------------------------------------------------

/// Assigns roles to the words of a document relative to a body text style.
#[derive(Debug, Clone)]
pub struct RoleRecognizer {
    body: StyleRef,
    config: RoleConfig,
}

impl RoleRecognizer {
    /// Fails for the `NO_STYLE` and `FORMULA` sentinels, which carry no metrics.
    pub fn new(body_style: StyleRef, config: RoleConfig) -> Result<Self, StructureError> {
        if body_style.is_sentinel() {
            return Err(StructureError::InvalidBodyStyle(body_style.id));
        }
        Ok(RoleRecognizer {
            body: body_style,
            config,
        })
    }

    pub fn body_style(&self) -> &StyleRef {
        &self.body
    }

    /// Tag every word in the document. Returns how many roles were added.
    pub fn recognize(&self, doc: &mut DocumentNode, observer: &mut dyn AssemblyObserver) -> usize {
        let mut added = 0;

        for page in doc.pages().collect::<Vec<_>>() {
            let words = doc.words_under(page.node());
            let page_height = doc.page_dimensions(page).height;

            for (idx, &word) in words.iter().enumerate() {
                let mut assign = |doc: &mut DocumentNode, role: Role| {
                    if doc.add_role(word, role) {
                        log::debug!(
                            target: "pdf_structure::roles",
                            "{} -> {}",
                            doc.word(word),
                            role
                        );
                        observer.observe(&AssemblyEvent::RoleAssigned { role });
                        added += 1;
                    }
                };

                if self.is_identifier(doc.word(word)) {
                    assign(doc, Role::Identifier);
                }
                if self.is_headnote(doc.word(word), page_height) {
                    assign(doc, Role::Headnote);
                }
                if self.config.detect_footnotes && self.is_footnote(doc, &words, idx, page_height) {
                    assign(doc, Role::Footnote);
                }
                if self.is_page_number(doc.word(word)) {
                    assign(doc, Role::Pagenumber);
                }
            }

            log::trace!(
                target: "pdf_structure::roles",
                "page {}: {} words checked",
                doc.page_number(page),
                words.len()
            );
        }

        added
    }

    /// Reference markers set in anything but body text.
    pub fn is_identifier(&self, word: &WordNode) -> bool {
        word.style().id != self.body.id && looks_like_identifier(word.text())
    }

    /// In the top band of the page and set smaller than body text, or as large
    /// but in another font.
    pub fn is_headnote(&self, word: &WordNode, page_height: f32) -> bool {
        if word.pos().y >= page_height * self.config.headnote_percent / 100.0 {
            return false;
        }
        let style = word.style();
        style.y_size < self.body.y_size
            || (style.y_size == self.body.y_size && style.font_name != self.body.font_name)
    }

    /// In the bottom band of the page, and either following a footnote or
    /// starting a run of smaller-than-body words that lasts to the page end.
    fn is_footnote(
        &self,
        doc: &DocumentNode,
        words: &[WordId],
        idx: usize,
        page_height: f32,
    ) -> bool {
        let bottom_band = page_height * (100.0 - self.config.footnote_percent) / 100.0;
        if doc.word(words[idx]).pos().y < bottom_band {
            return false;
        }

        if idx > 0 && doc.word(words[idx - 1]).has_role(Role::Footnote) {
            return true;
        }

        words[idx..]
            .iter()
            .all(|&w| doc.word(w).style().y_size < self.body.y_size)
    }

    /// A short all-digit head- or foot-note.
    pub fn is_page_number(&self, word: &WordNode) -> bool {
        if !(word.has_role(Role::Headnote) || word.has_role(Role::Footnote)) {
            return false;
        }
        let text = word.text();
        !text.is_empty()
            && text.chars().count() <= self.config.page_number_max_len
            && text.chars().all(|c| c.is_ascii_digit())
    }
}
