use serde::{Deserialize, Serialize};
use std::fmt;

/// Orientation governing how a node's children are arranged.
///
/// `LeftRight`/`RightLeft` line siblings up along the horizontal axis,
/// `TopDown`/`DownTop` along the vertical axis. The reversed variants start
/// from the far end of the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "TD")]
    TopDown,
    #[serde(rename = "RL")]
    RightLeft,
    #[serde(rename = "DT")]
    DownTop,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "LR" => Some(Self::LeftRight),
            "TD" => Some(Self::TopDown),
            "RL" => Some(Self::RightLeft),
            "DT" => Some(Self::DownTop),
            _ => None,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::LeftRight => "LR",
            Self::TopDown => "TD",
            Self::RightLeft => "RL",
            Self::DownTop => "DT",
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, Self::RightLeft | Self::DownTop)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// One of the four cardinal sides of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }

    /// True when children placed on this side stack along the horizontal axis.
    pub fn stacks_horizontally(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A reference from a parent to one of its children, optionally carrying a
/// layout override for that child's own subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRef {
    pub id: String,
    pub layout: Option<Direction>,
}

impl ChildRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layout: None,
        }
    }

    pub fn with_layout(id: impl Into<String>, layout: Direction) -> Self {
        Self {
            id: id.into(),
            layout: Some(layout),
        }
    }
}

/// Relationship record attached to one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Ancestor IDs from the root down to the immediate parent.
    pub parent_chain: Vec<String>,
    pub layout: Option<Direction>,
    pub current: String,
    pub children: Vec<ChildRef>,
}

impl Descriptor {
    pub fn root(current: impl Into<String>) -> Self {
        Self {
            parent_chain: Vec::new(),
            layout: None,
            current: current.into(),
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_chain.is_empty()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_chain.last().map(String::as_str)
    }

    /// Chain a child of this node carries: this node's chain plus its own ID.
    pub fn child_chain(&self) -> Vec<String> {
        let mut chain = self.parent_chain.clone();
        chain.push(self.current.clone());
        chain
    }

    pub fn joined_chain(&self) -> String {
        self.parent_chain.join("|")
    }

    pub fn child(&self, id: &str) -> Option<&ChildRef> {
        self.children.iter().find(|child| child.id == id)
    }

    pub fn level(&self) -> &str {
        crate::hierarchy::level_of(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_tokens_round_trip() {
        for token in ["LR", "TD", "RL", "DT"] {
            let dir = Direction::from_token(token).unwrap();
            assert_eq!(dir.as_token(), token);
        }
        assert_eq!(Direction::from_token("TB"), None);
        assert_eq!(Direction::from_token(""), None);
    }

    #[test]
    fn child_chain_appends_current() {
        let mut desc = Descriptor::root("B2");
        desc.parent_chain = vec!["A1".to_string()];
        assert_eq!(desc.child_chain(), vec!["A1".to_string(), "B2".to_string()]);
        assert_eq!(desc.parent_id(), Some("A1"));
        assert_eq!(desc.level(), "B");
    }
}
