use std::fmt;

use crate::geom::{HasPosition, Rectangle};
use crate::roles::{Role, RoleSet};
use crate::style::{StyleRef, StyledText};

/// A word: the leaf of the document tree.
///
/// Everything but the role set is fixed at construction.
#[derive(Debug, Clone)]
pub struct WordNode {
    text: String,
    style: StyleRef,
    pos: Rectangle,
    page_number: u32,
    char_spacing: f32,
    roles: RoleSet,
}

impl WordNode {
    pub fn new(
        text: impl Into<String>,
        style: StyleRef,
        pos: Rectangle,
        page_number: u32,
        char_spacing: f32,
    ) -> Self {
        WordNode {
            text: text.into(),
            style,
            pos,
            page_number,
            char_spacing,
            roles: RoleSet::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &StyleRef {
        &self.style
    }

    pub fn pos(&self) -> Rectangle {
        self.pos
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Char spacing of the line the word was cut from.
    pub fn char_spacing(&self) -> f32 {
        self.char_spacing
    }

    pub fn roles(&self) -> RoleSet {
        self.roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    pub(crate) fn add_role(&mut self, role: Role) -> bool {
        self.roles.insert(role)
    }

    /// True when `next` continues this word on the same line: same style,
    /// same top, and its left edge within this word's char spacing.
    pub fn is_part_of_same_word_as(&self, next: &WordNode) -> bool {
        if self.style.id != next.style.id || self.pos.y != next.pos.y {
            return false;
        }
        let gap = next.pos.x - self.pos.end_x();
        gap <= self.char_spacing
    }
}

impl fmt::Display for WordNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WordNode{{text='{}', {}, {}}}", self.text, self.pos, self.style.id)
    }
}

impl HasPosition for WordNode {
    fn pos(&self) -> Rectangle {
        self.pos
    }
}

impl StyledText for WordNode {
    fn text(&self) -> &str {
        &self.text
    }

    fn style(&self) -> &StyleRef {
        &self.style
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::style::{FontDescriptor, StyleRegistry};

    fn style(registry: &StyleRegistry, name: &str) -> StyleRef {
        registry.intern(&FontDescriptor {
            font_name: name.to_string(),
            font_size: 10.0,
            line_height: 12.0,
            width_of_space: 3.0,
            char_widths: Vec::new(),
        })
    }

    #[test]
    fn test_same_word_continuation() {
        let registry = Arc::new(StyleRegistry::new());
        let body = style(&registry, "Times");
        let bold = style(&registry, "Times-Bold");

        let at = |text: &str, x: f32| {
            WordNode::new(text, body.clone(), Rectangle::new(x, 10.0, 20.0, 12.0), 1, 6.0)
        };
        let head = at("Rep", 0.0);
        let near = at("ort", 24.0);
        let far = at("ort", 40.0);
        let styled = WordNode::new("ort", bold, Rectangle::new(22.0, 10.0, 20.0, 12.0), 1, 6.0);
        let lower = WordNode::new("ort", body, Rectangle::new(22.0, 30.0, 20.0, 12.0), 1, 6.0);

        assert!(head.is_part_of_same_word_as(&near));
        assert!(!head.is_part_of_same_word_as(&far));
        assert!(!head.is_part_of_same_word_as(&styled));
        assert!(!head.is_part_of_same_word_as(&lower));
    }

    #[test]
    fn test_roles_are_additive() {
        let registry = StyleRegistry::new();
        let pos = Rectangle::new(0.0, 0.0, 5.0, 5.0);
        let mut word = WordNode::new("3", style(&registry, "Times"), pos, 1, 6.0);
        assert!(word.add_role(Role::Pagenumber));
        assert!(word.add_role(Role::Footnote));
        assert!(!word.add_role(Role::Pagenumber));
        assert!(word.has_role(Role::Pagenumber) && word.has_role(Role::Footnote));
        assert!(word.to_string().starts_with("WordNode{text='3'"));
    }
}
