use serde::{Deserialize, Serialize};

use crate::ir::{Bounds, Side};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn of(bounds: &Bounds) -> Self {
        Self::new(bounds.width, bounds.height)
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// How new children are sized relative to their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SizeMode {
    /// Every child gets the parent's size.
    #[default]
    MatchParent,
    /// Children split the parent's extent along the stacking axis.
    FitParent,
}

/// Child size for `count` children on `side` of `parent`. With
/// [`SizeMode::FitParent`] the result can be non-positive; callers check it
/// before placing anything.
pub fn child_size(parent: &Bounds, side: Side, gap: f32, count: usize, mode: SizeMode) -> Size {
    match mode {
        SizeMode::MatchParent => Size::of(parent),
        SizeMode::FitParent => {
            let n = count.max(1) as f32;
            let gaps = (n - 1.0) * gap;
            if side.stacks_horizontally() {
                Size::new((parent.width - gaps) / n, parent.height)
            } else {
                Size::new(parent.width, (parent.height - gaps) / n)
            }
        }
    }
}
