//! Text styles, the document-wide style registry and dominant-style lookup.
//!
//! Styles are compared by identity: two styles built from the same font data
//! but interned separately (or by different registries) are different styles.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::geom::HasPosition;

/// Shared handle to an interned style.
pub type StyleRef = Arc<Style>;

/// Identifier of an interned style, unique across every registry in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StyleId(u32);

impl StyleId {
    pub const NO_STYLE: StyleId = StyleId(0);
    pub const FORMULA: StyleId = StyleId(1);

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "style-{}", self.0)
    }
}

/// A distinct font/size/metrics combination seen in a document.
#[derive(Debug, Clone, Serialize)]
pub struct Style {
    pub id: StyleId,
    pub font_name: String,
    /// Font size; the horizontal size used to judge gaps.
    pub x_size: f32,
    /// Line height.
    pub y_size: f32,
    pub width_of_space: f32,
    pub char_widths: Vec<f32>,
}

impl Style {
    /// Sentinel for content without a usable text style.
    pub fn no_style() -> StyleRef {
        static NO_STYLE: OnceLock<StyleRef> = OnceLock::new();
        NO_STYLE
            .get_or_init(|| Arc::new(Style::sentinel(StyleId::NO_STYLE, "no-style")))
            .clone()
    }

    /// Sentinel for content that looks like a mathematical formula.
    pub fn formula() -> StyleRef {
        static FORMULA: OnceLock<StyleRef> = OnceLock::new();
        FORMULA
            .get_or_init(|| Arc::new(Style::sentinel(StyleId::FORMULA, "formula")))
            .clone()
    }

    fn sentinel(id: StyleId, name: &str) -> Style {
        Style {
            id,
            font_name: name.to_string(),
            x_size: 0.0,
            y_size: 0.0,
            width_of_space: 0.0,
            char_widths: Vec::new(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == StyleId::NO_STYLE || self.id == StyleId::FORMULA
    }
}

impl PartialEq for Style {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Style {}

impl Hash for Style {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{{font={}, size={}, line={}, space={}}}",
            self.id, self.font_name, self.x_size, self.y_size, self.width_of_space
        )
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Font data the parser reports for a run; the registry interns it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FontDescriptor {
    pub font_name: String,
    pub font_size: f32,
    pub line_height: f32,
    pub width_of_space: f32,
    #[serde(default)]
    pub char_widths: Vec<f32>,
}

/// Interning key. Floats are keyed by their bit patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StyleKey {
    font_name: String,
    font_size: u32,
    char_widths: Vec<u32>,
    width_of_space: u32,
}

impl From<&FontDescriptor> for StyleKey {
    fn from(d: &FontDescriptor) -> Self {
        StyleKey {
            font_name: d.font_name.clone(),
            font_size: d.font_size.to_bits(),
            char_widths: d.char_widths.iter().map(|w| w.to_bits()).collect(),
            width_of_space: d.width_of_space.to_bits(),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_key: HashMap<StyleKey, StyleRef>,
    by_id: Vec<StyleRef>,
}

/// Append-only intern table shared by the parser and the analysis stages.
///
/// Lookups and inserts take `&self`, so one registry can be shared across
/// threads processing different pages.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    inner: RwLock<RegistryInner>,
}

/// Next id to hand out; 0 and 1 belong to the sentinels.
static NEXT_STYLE_ID: AtomicU32 = AtomicU32::new(2);

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the style for `descriptor`, creating it on first sight.
    ///
    /// The line height is not part of the key; the first sighting wins.
    pub fn intern(&self, descriptor: &FontDescriptor) -> StyleRef {
        let key = StyleKey::from(descriptor);

        {
            let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(style) = inner.by_key.get(&key) {
                return style.clone();
            }
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have won the race between the two locks.
        if let Some(style) = inner.by_key.get(&key) {
            return style.clone();
        }

        let id = StyleId(NEXT_STYLE_ID.fetch_add(1, Ordering::Relaxed));
        let style = Arc::new(Style {
            id,
            font_name: descriptor.font_name.clone(),
            x_size: descriptor.font_size,
            y_size: descriptor.line_height,
            width_of_space: descriptor.width_of_space,
            char_widths: descriptor.char_widths.clone(),
        });
        log::trace!(target: "pdf_structure::words", "new style {}", style);
        inner.by_key.insert(key, style.clone());
        inner.by_id.push(style.clone());
        style
    }

    pub fn get(&self, id: StyleId) -> Option<StyleRef> {
        match id {
            StyleId::NO_STYLE => Some(Style::no_style()),
            StyleId::FORMULA => Some(Style::formula()),
            _ => {
                let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
                inner.by_id.iter().find(|s| s.id == id).cloned()
            }
        }
    }

    /// All interned styles in id order.
    pub fn styles(&self) -> Vec<StyleRef> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_id.clone()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Dominant style
// ---------------------------------------------------------------------------

/// Positioned text carrying a style.
pub trait StyledText: HasPosition {
    fn text(&self) -> &str;
    fn style(&self) -> &StyleRef;
}

/// Opaque heuristic deciding whether a group of text looks like a formula.
pub trait FormulaDetector: Send + Sync {
    fn is_likely_formula(&self, items: &[&dyn StyledText]) -> bool;
}

impl<F> FormulaDetector for F
where
    F: Fn(&[&dyn StyledText]) -> bool + Send + Sync,
{
    fn is_likely_formula(&self, items: &[&dyn StyledText]) -> bool {
        self(items)
    }
}

/// Detector that never reports a formula.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverFormula;

impl FormulaDetector for NeverFormula {
    fn is_likely_formula(&self, _items: &[&dyn StyledText]) -> bool {
        false
    }
}

/// The style covering the most characters in `items`.
///
/// Formula-looking content short-circuits to [`Style::formula`]; an empty
/// collection yields [`Style::no_style`]. On equal character counts the style
/// seen first in `items` wins.
pub fn find_dominating_style(
    items: &[&dyn StyledText],
    detector: &dyn FormulaDetector,
) -> StyleRef {
    if detector.is_likely_formula(items) {
        return Style::formula();
    }

    // Insertion-ordered tally so ties resolve to the earliest style.
    let mut counts: Vec<(&StyleRef, usize)> = Vec::new();
    for item in items {
        let chars = item.text().chars().count();
        match counts.iter_mut().find(|(s, _)| s.id == item.style().id) {
            Some((_, n)) => *n += chars,
            None => counts.push((item.style(), chars)),
        }
    }

    let mut best: Option<(&StyleRef, usize)> = None;
    for (style, n) in counts {
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((style, n));
        }
    }

    best.map(|(style, _)| style.clone())
        .unwrap_or_else(Style::no_style)
}
