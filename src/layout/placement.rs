use crate::ir::{Bounds, Point, Side};

use super::types::Size;

/// Top-left corners for `count` children on `side` of `parent`, each the
/// size of the parent. See [`compute_child_positions_sized`].
pub fn compute_child_positions(parent: &Bounds, side: Side, gap: f32, count: usize) -> Vec<Point> {
    compute_child_positions_sized(parent, Size::of(parent), side, gap, count)
}

/// Top-left corners for a fresh group of `count` children.
///
/// The group sits `gap` away from `side` of the parent and is stacked along
/// the perpendicular axis, centered on the parent:
/// `start = -(count*size + (count-1)*gap - parent_size) / 2`.
pub fn compute_child_positions_sized(
    parent: &Bounds,
    size: Size,
    side: Side,
    gap: f32,
    count: usize,
) -> Vec<Point> {
    if count == 0 {
        return Vec::new();
    }
    let n = count as f32;
    if side.stacks_horizontally() {
        let total = n * size.width + (n - 1.0) * gap;
        let start = parent.x - (total - parent.width) / 2.0;
        let y = match side {
            Side::Bottom => parent.bottom() + gap,
            _ => parent.y - gap - size.height,
        };
        (0..count)
            .map(|idx| Point::new(start + idx as f32 * (size.width + gap), y))
            .collect()
    } else {
        let total = n * size.height + (n - 1.0) * gap;
        let start = parent.y - (total - parent.height) / 2.0;
        let x = match side {
            Side::Right => parent.right() + gap,
            _ => parent.x - gap - size.width,
        };
        (0..count)
            .map(|idx| Point::new(x, start + idx as f32 * (size.height + gap)))
            .collect()
    }
}

/// Top-left corners for `count` children appended after the siblings that
/// already sit on `side` of their parent. Nothing is recentered: the new
/// nodes continue the row (or column) past its last member, with that
/// member's size and cross-axis position.
pub fn append_after_existing_siblings(
    existing: &[Bounds],
    side: Side,
    gap: f32,
    count: usize,
) -> Vec<Point> {
    append_to_siblings(existing, side, gap, count, false)
}

/// Like [`append_after_existing_siblings`]; with `reversed` the row grows
/// towards the start of the axis instead.
pub fn append_to_siblings(
    existing: &[Bounds],
    side: Side,
    gap: f32,
    count: usize,
    reversed: bool,
) -> Vec<Point> {
    if count == 0 {
        return Vec::new();
    }
    let Some(anchor) = append_anchor(existing, side, reversed) else {
        return Vec::new();
    };
    let horizontal = side.stacks_horizontally();
    let axis = |bounds: &Bounds| if horizontal { bounds.x } else { bounds.y };
    let extent = if horizontal { anchor.width } else { anchor.height };
    let step = extent + gap;

    (1..=count)
        .map(|idx| {
            let offset = idx as f32 * step;
            let along = if reversed { axis(&anchor) - offset } else { axis(&anchor) + offset };
            if horizontal {
                Point::new(along, anchor.y)
            } else {
                Point::new(anchor.x, along)
            }
        })
        .collect()
}

/// The sibling new nodes are appended after: the last one along the stacking
/// axis, or the first one when `reversed`.
pub fn append_anchor(existing: &[Bounds], side: Side, reversed: bool) -> Option<Bounds> {
    let horizontal = side.stacks_horizontally();
    let axis = |bounds: &Bounds| if horizontal { bounds.x } else { bounds.y };
    let pick = |a: &&Bounds, b: &&Bounds| axis(*a).total_cmp(&axis(*b));
    let found = if reversed {
        existing.iter().min_by(pick)
    } else {
        existing.iter().max_by(pick)
    };
    found.copied()
}
