//! Keeping a parent's declared children in step with the nodes created for it.

use crate::canvas::{Canvas, NodeId, read_descriptor, scan_page};
use crate::hierarchy::{ROOT_LEVEL, find_next_available_root_id, level_of, number_of};
use crate::ir::{ChildRef, Descriptor, Direction};
use tracing::{debug, info};

/// Merge `new_children` into `parent.children`, keyed by ID.
///
/// An existing entry keeps its layout override unless the incoming entry
/// carries one of its own. Attaching an already declared child changes nothing.
pub fn attach_children(parent: &Descriptor, new_children: &[ChildRef]) -> Descriptor {
    let mut updated = parent.clone();
    for child in new_children {
        match updated.children.iter_mut().find(|entry| entry.id == child.id) {
            Some(entry) => {
                if child.layout.is_some() {
                    entry.layout = child.layout;
                }
            }
            None => updated.children.push(child.clone()),
        }
    }
    debug!(
        parent = %updated.current,
        children = updated.children.len(),
        "attached children"
    );
    updated
}

/// Remove `child_id` from the parent's declared children.
pub fn detach_child(parent: &Descriptor, child_id: &str) -> Descriptor {
    let mut updated = parent.clone();
    updated.children.retain(|entry| entry.id != child_id);
    updated
}

/// Record (or drop, with `None`) a layout override on the parent's entry for
/// `child_id`. An undeclared child is declared on the way.
pub fn set_child_layout(parent: &Descriptor, child_id: &str, layout: Option<Direction>) -> Descriptor {
    let mut updated = parent.clone();
    match updated.children.iter_mut().find(|entry| entry.id == child_id) {
        Some(entry) => entry.layout = layout,
        None => updated.children.push(ChildRef {
            id: child_id.to_string(),
            layout,
        }),
    }
    updated
}

/// Descriptor for a fresh child of `parent`.
pub fn child_descriptor(parent: &Descriptor, id: &str, layout: Option<Direction>) -> Descriptor {
    Descriptor {
        parent_chain: parent.child_chain(),
        layout,
        current: id.to_string(),
        children: Vec::new(),
    }
}

/// A new root descriptor using the lowest root number free on the page.
pub fn initialize_root<C: Canvas + ?Sized>(canvas: &C) -> Descriptor {
    let used = scan_page(canvas)
        .into_iter()
        .filter(|scanned| scanned.descriptor.is_root())
        .filter(|scanned| level_of(&scanned.descriptor.current) == ROOT_LEVEL)
        .filter_map(|scanned| number_of(&scanned.descriptor.current));
    Descriptor::root(find_next_available_root_id(used))
}

/// The node's descriptor, or a freshly initialized root when it has none.
/// The second value is `true` when the node was upgraded. Nothing is written.
pub fn descriptor_or_root<C: Canvas + ?Sized>(
    canvas: &C,
    node: NodeId,
) -> (Descriptor, bool) {
    match read_descriptor(canvas, node) {
        Some(descriptor) => (descriptor, false),
        None => {
            let descriptor = initialize_root(canvas);
            info!(%node, root = %descriptor.current, "untyped node upgraded to root");
            (descriptor, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::MemoryCanvas;
    use crate::ir::Bounds;
    use crate::parser::parse_descriptor;

    #[test]
    fn attach_is_idempotent() {
        let parent = parse_descriptor("graph[](LR)[A1][]").unwrap();
        let once = attach_children(&parent, &[ChildRef::new("B1")]);
        let twice = attach_children(&once, &[ChildRef::new("B1")]);
        assert_eq!(once.children, twice.children);
        assert_eq!(twice.children, vec![ChildRef::new("B1")]);
    }

    #[test]
    fn attach_keeps_existing_override() {
        let parent = parse_descriptor("graph[](LR)[A1][B1:TD,B2]").unwrap();
        let updated = attach_children(&parent, &[ChildRef::new("B1"), ChildRef::new("B3")]);
        assert_eq!(
            updated.children,
            vec![
                ChildRef::with_layout("B1", Direction::TopDown),
                ChildRef::new("B2"),
                ChildRef::new("B3"),
            ]
        );
    }

    #[test]
    fn attach_accepts_new_override() {
        let parent = parse_descriptor("graph[](LR)[A1][B1]").unwrap();
        let updated = attach_children(&parent, &[ChildRef::with_layout("B1", Direction::DownTop)]);
        assert_eq!(updated.children, vec![ChildRef::with_layout("B1", Direction::DownTop)]);
    }

    #[test]
    fn child_layout_override_can_be_set_and_cleared() {
        let parent = parse_descriptor("graph[](LR)[A1][B1]").unwrap();
        let set = set_child_layout(&parent, "B1", Some(Direction::TopDown));
        assert_eq!(set.to_string(), "graph[](LR)[A1][B1:TD]");
        let cleared = set_child_layout(&set, "B1", None);
        assert_eq!(cleared.to_string(), "graph[](LR)[A1][B1]");
        let declared = set_child_layout(&cleared, "B7", Some(Direction::RightLeft));
        assert_eq!(declared.to_string(), "graph[](LR)[A1][B1,B7:RL]");
    }

    #[test]
    fn detach_removes_entry() {
        let parent = parse_descriptor("graph[](LR)[A1][B1,B2]").unwrap();
        assert_eq!(detach_child(&parent, "B1").children, vec![ChildRef::new("B2")]);
    }

    #[test]
    fn initialize_root_fills_lowest_gap() {
        let mut canvas = MemoryCanvas::new();
        for text in ["graph[][A1][]", "graph[](LR)[A3][]", "graph[A1](LR)[B2][]"] {
            let node = canvas.add_node("rectangle", Bounds::default()).unwrap();
            canvas.node_mut(node).unwrap().descriptor = Some(text.to_string());
        }
        let root = initialize_root(&canvas);
        assert_eq!(root.current, "A2");
        assert!(root.is_root());
        assert_eq!(root.layout, None);
        assert!(root.children.is_empty());
    }

    #[test]
    fn untyped_node_is_upgraded_without_writing() {
        let mut canvas = MemoryCanvas::new();
        let node = canvas.add_node("rectangle", Bounds::default()).unwrap();
        let (descriptor, upgraded) = descriptor_or_root(&canvas, node);
        assert!(upgraded);
        assert_eq!(descriptor.current, "A1");
        assert_eq!(canvas.node(node).unwrap().descriptor, None);
    }
}
