//! Orderings over positioned content.
//!
//! Every comparator here is total over finite coordinates (`f32::total_cmp`)
//! and meant for use with the stable `sort_by`, except [`region_order`] which
//! is not transitive and must only drive one-shot sorts.

use std::cmp::Ordering;

use crate::geom::{is_within_percent, HasPosition};

/// Two Y starts within this percentage of each other are treated as one row
/// by [`region_order`].
const REGION_Y_PERCENT: f32 = 4.0;

pub fn by_lower_y<T: HasPosition>(a: &T, b: &T) -> Ordering {
    a.pos().y.total_cmp(&b.pos().y)
}

pub fn by_lower_x<T: HasPosition>(a: &T, b: &T) -> Ordering {
    a.pos().x.total_cmp(&b.pos().x)
}

pub fn by_higher_x<T: HasPosition>(a: &T, b: &T) -> Ordering {
    b.pos().x.total_cmp(&a.pos().x)
}

pub fn by_lower_y_then_lower_x<T: HasPosition>(a: &T, b: &T) -> Ordering {
    by_lower_y(a, b).then_with(|| by_lower_x(a, b))
}

pub fn by_smallest_area<T: HasPosition>(a: &T, b: &T) -> Ordering {
    a.pos().area().total_cmp(&b.pos().area())
}

/// Reading order for regions laid out in a 2-D grid.
///
/// Whatever lies strictly left of (or above) the other comes first. Items
/// that overlap on both axes, or whose tops are within 4% of each other, tie
/// on Y and are ordered by X.
pub fn region_order<T: HasPosition>(a: &T, b: &T) -> Ordering {
    let (p, q) = (a.pos(), b.pos());

    if p.end_x() < q.x {
        return Ordering::Less;
    }
    if p.x > q.end_x() {
        return Ordering::Greater;
    }
    if p.end_y() < q.y {
        return Ordering::Less;
    }
    if p.y > q.end_y() {
        return Ordering::Greater;
    }
    if !is_within_percent(p.y, q.y, REGION_Y_PERCENT) {
        return p.y.total_cmp(&q.y);
    }
    p.x.total_cmp(&q.x)
}

/// Consume `items` and return them ordered smallest area first.
pub fn smallest_first<T: HasPosition>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by(by_smallest_area);
    items
}
