//! Descriptor codec.
//!
//! A descriptor is the only persisted structure of the hierarchy. Two textual
//! forms are accepted on read:
//!
//! ```text
//! graph[A1|B2](TD)[C1][D1,D2:LR]   current form
//! graph[B2][C1][D1,D2]             legacy form, layout reads as LR
//! ```
//!
//! Parsing never fails loudly: anything that does not match yields `None`.

use crate::error::InvalidDescriptor;
use crate::ir::{ChildRef, Descriptor, Direction};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static CURRENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^graph\[(?P<chain>[^\[\]]*)\]\((?P<layout>[^()]*)\)\[(?P<current>[^\[\]]*)\]\[(?P<children>[^\[\]]*)\]$")
        .unwrap()
});
static LEGACY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^graph\[(?P<chain>[^\[\]]*)\]\[(?P<current>[^\[\]]*)\]\[(?P<children>[^\[\]]*)\]$")
        .unwrap()
});

/// Which grammar a descriptor was read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorForm {
    Current,
    Legacy,
}

pub fn parse_descriptor(text: &str) -> Option<Descriptor> {
    parse_descriptor_with_form(text).map(|(descriptor, _)| descriptor)
}

pub fn parse_descriptor_with_form(text: &str) -> Option<(Descriptor, DescriptorForm)> {
    let text = text.trim();
    if let Some(caps) = CURRENT_RE.captures(text) {
        let layout_token = caps["layout"].trim();
        let layout = if layout_token.is_empty() {
            None
        } else {
            Some(Direction::from_token(layout_token)?)
        };
        let descriptor = build_descriptor(&caps["chain"], layout, &caps["current"], &caps["children"])?;
        return Some((descriptor, DescriptorForm::Current));
    }
    if let Some(caps) = LEGACY_RE.captures(text) {
        let descriptor = build_descriptor(
            &caps["chain"],
            Some(Direction::LeftRight),
            &caps["current"],
            &caps["children"],
        )?;
        return Some((descriptor, DescriptorForm::Legacy));
    }
    None
}

fn build_descriptor(
    chain: &str,
    layout: Option<Direction>,
    current: &str,
    children: &str,
) -> Option<Descriptor> {
    let current = current.trim();
    if current.is_empty() {
        return None;
    }
    Some(Descriptor {
        parent_chain: parse_chain(chain),
        layout,
        current: current.to_string(),
        children: parse_children(children),
    })
}

/// Chain entries are bare IDs; a stray `id:layout` entry keeps only the ID.
fn parse_chain(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(|segment| segment.split(':').next().unwrap_or("").trim())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_children(raw: &str) -> Vec<ChildRef> {
    let mut children = Vec::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (id, layout) = match entry.split_once(':') {
            Some((id, token)) => (id.trim(), Direction::from_token(token.trim())),
            None => (entry, None),
        };
        if id.is_empty() {
            continue;
        }
        children.push(ChildRef {
            id: id.to_string(),
            layout,
        });
    }
    children
}

pub fn serialize_descriptor(descriptor: &Descriptor) -> String {
    let children = descriptor
        .children
        .iter()
        .map(|child| match child.layout {
            Some(layout) => format!("{}:{}", child.id, layout.as_token()),
            None => child.id.clone(),
        })
        .collect::<Vec<_>>()
        .join(",");

    if descriptor.parent_chain.is_empty() && descriptor.layout.is_none() {
        return format!("graph[][{}][{}]", descriptor.current, children);
    }

    format!(
        "graph[{}]({})[{}][{}]",
        descriptor.joined_chain(),
        descriptor.layout.map(Direction::as_token).unwrap_or(""),
        descriptor.current,
        children
    )
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_descriptor(self))
    }
}

impl FromStr for Descriptor {
    type Err = InvalidDescriptor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_descriptor(s).ok_or_else(|| InvalidDescriptor(s.trim().to_string()))
    }
}
