//! Page-space geometry: rectangles, bounds and tolerance predicates.
//!
//! All coordinates are `f32` page units with Y growing downwards. The upstream
//! parser normalises the axis before handing runs over, so nothing here needs
//! to know which way the source format pointed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bounds returned for an empty collection.
pub const EMPTY_BOUNDS: Rectangle = Rectangle {
    x: 0.1,
    y: 0.1,
    width: 0.1,
    height: 0.1,
};

/// An immutable axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }

    pub fn end_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn end_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rectangle::new(
            x,
            y,
            self.end_x().max(other.end_x()) - x,
            self.end_y().max(other.end_y()) - y,
        )
    }

    /// True when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pos{{x={}, y={}, w={}, h={}}}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Anything that occupies a rectangle on a page.
pub trait HasPosition {
    fn pos(&self) -> Rectangle;
}

impl HasPosition for Rectangle {
    fn pos(&self) -> Rectangle {
        *self
    }
}

impl<T: HasPosition + ?Sized> HasPosition for &T {
    fn pos(&self) -> Rectangle {
        (**self).pos()
    }
}

// ---------------------------------------------------------------------------
// Tolerance predicates
// ---------------------------------------------------------------------------

/// Returns true if `b` is within `percentage` percent of `a`.
///
/// The percentage is taken of `a`, so the predicate is not symmetric.
pub fn is_within_percent(a: f32, b: f32, percentage: f32) -> bool {
    if a == b {
        return true;
    }
    let slack = a / 100.0 * percentage;
    a + slack >= b && a - slack <= b
}

/// Returns true if `b` lies within `a ± variance`.
pub fn is_within_variance(a: f32, b: f32, variance: f32) -> bool {
    if a == b {
        return true;
    }
    a - variance <= b && a + variance >= b
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Axis-aligned bounding rectangle of `items`.
///
/// An empty collection yields [`EMPTY_BOUNDS`] rather than an error.
pub fn find_bounds<P, I>(items: I) -> Rectangle
where
    P: HasPosition,
    I: IntoIterator<Item = P>,
{
    let mut iter = items.into_iter();
    let Some(first) = iter.next() else {
        return EMPTY_BOUNDS;
    };

    iter.fold(first.pos(), |acc, item| acc.union(&item.pos()))
}
