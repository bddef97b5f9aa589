use crate::ir::{Direction, Point, Side};

// ── Connection-site selection ───────────────────────────────────────
/// Aspect-ratio threshold for preferring horizontal vs vertical edge sides.
const DIRECTION_PREF_RATIO: f32 = 1.35;

/// Preferred site per side, indexed `[top, right, bottom, left]`, for each
/// site count the host is known to produce. The host numbers sites
/// counter-clockwise from the top, so LEFT comes before RIGHT.
const SITE_TABLE: [(usize, [usize; 4]); 4] = [
    (1, [0, 0, 0, 0]),
    (2, [0, 1, 1, 0]),
    (4, [0, 3, 2, 1]),
    (8, [0, 6, 4, 2]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Axis an edge between two centers should run along. Clear-cut cases
    /// follow the displacement; near-diagonal ones fall back to `layout`.
    pub fn between(from: Point, to: Point, layout: Direction) -> Self {
        let dx = (to.x - from.x).abs();
        let dy = (to.y - from.y).abs();
        let ratio = dx / dy.max(1e-3);
        if ratio > DIRECTION_PREF_RATIO {
            Self::Horizontal
        } else if ratio < 1.0 / DIRECTION_PREF_RATIO {
            Self::Vertical
        } else if layout.is_horizontal() {
            // siblings run horizontally, so parent and child are stacked
            Self::Vertical
        } else {
            Self::Horizontal
        }
    }
}

fn side_slot(side: Side) -> usize {
    match side {
        Side::Top => 0,
        Side::Right => 1,
        Side::Bottom => 2,
        Side::Left => 3,
    }
}

/// Index of the anchor to use on `side` of a node with `anchor_count` sites.
///
/// Unknown site counts fall back to anchor `0`; a node without sites has no
/// connection point at all.
pub fn pick_connection_site(anchor_count: usize, side: Side) -> Option<usize> {
    if anchor_count == 0 {
        return None;
    }
    let site = SITE_TABLE
        .iter()
        .find(|(count, _)| *count == anchor_count)
        .map(|(_, sites)| sites[side_slot(side)])
        .unwrap_or(0);
    Some(site)
}

/// Anchor point on `side` among a node's `anchors`.
pub fn connection_point(anchors: &[Point], side: Side) -> Option<Point> {
    pick_connection_site(anchors.len(), side).and_then(|idx| anchors.get(idx).copied())
}

/// Sides an edge leaves `a` and enters `b` by. Ties count as "not greater"
/// and resolve to the second branch.
pub fn determine_sides(a: Point, b: Point, orientation: Orientation) -> (Side, Side) {
    match orientation {
        Orientation::Horizontal => {
            if b.x > a.x {
                (Side::Right, Side::Left)
            } else {
                (Side::Left, Side::Right)
            }
        }
        Orientation::Vertical => {
            if b.y > a.y {
                (Side::Bottom, Side::Top)
            } else {
                (Side::Top, Side::Bottom)
            }
        }
    }
}
