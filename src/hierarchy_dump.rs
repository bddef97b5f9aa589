use crate::canvas::{Canvas, NodeId, ScannedNode, read_descriptor, scan_page};
use crate::layout::resolve_layout;
use crate::parser::{DescriptorForm, parse_descriptor_with_form};
use crate::query::{children_of, dangling_children, parent_of};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct HierarchyDump {
    pub page: usize,
    pub roots: Vec<TreeDump>,
    /// Typed nodes whose parent is not on the page.
    pub orphans: Vec<TreeDump>,
    pub untyped: Vec<NodeId>,
}

#[derive(Debug, Serialize)]
pub struct TreeDump {
    pub node: NodeId,
    pub id: String,
    pub descriptor: String,
    pub layout: String,
    pub legacy: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dangling: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeDump>,
}

impl HierarchyDump {
    pub fn from_canvas<C: Canvas + ?Sized>(canvas: &C) -> Self {
        let nodes = scan_page(canvas);
        let mut visited = HashSet::new();

        let roots = nodes
            .iter()
            .filter(|scanned| scanned.descriptor.is_root())
            .filter_map(|scanned| tree(canvas, &nodes, scanned, &mut visited))
            .collect();
        let orphans = nodes
            .iter()
            .filter(|scanned| !scanned.descriptor.is_root())
            .filter(|scanned| parent_of(&nodes, scanned).is_none())
            .filter_map(|scanned| tree(canvas, &nodes, scanned, &mut visited))
            .collect();
        let untyped = canvas
            .nodes_on_page()
            .into_iter()
            .filter(|node| read_descriptor(canvas, *node).is_none())
            .collect();

        HierarchyDump {
            page: canvas.current_page(),
            roots,
            orphans,
            untyped,
        }
    }
}

fn tree<C: Canvas + ?Sized>(
    canvas: &C,
    nodes: &[ScannedNode],
    scanned: &ScannedNode,
    visited: &mut HashSet<NodeId>,
) -> Option<TreeDump> {
    if !visited.insert(scanned.node) {
        return None;
    }
    let legacy = canvas
        .descriptor_text(scanned.node)
        .and_then(|text| parse_descriptor_with_form(&text))
        .is_some_and(|(_, form)| form == DescriptorForm::Legacy);
    let children = children_of(nodes, &scanned.descriptor)
        .into_iter()
        .filter_map(|child| tree(canvas, nodes, child, visited))
        .collect();
    Some(TreeDump {
        node: scanned.node,
        id: scanned.descriptor.current.clone(),
        descriptor: scanned.descriptor.to_string(),
        layout: resolve_layout(nodes, scanned).to_string(),
        legacy,
        dangling: dangling_children(nodes, &scanned.descriptor)
            .into_iter()
            .map(|child| child.id)
            .collect(),
        children,
    })
}

pub fn write_hierarchy_dump<C: Canvas + ?Sized>(path: &Path, canvas: &C) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = HierarchyDump::from_canvas(canvas);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::MemoryCanvas;
    use crate::ir::Bounds;

    fn canvas_with(texts: &[Option<&str>]) -> MemoryCanvas {
        let mut canvas = MemoryCanvas::new();
        for text in texts {
            let node = canvas.add_node("rectangle", Bounds::default()).unwrap();
            canvas.node_mut(node).unwrap().descriptor = text.map(str::to_string);
        }
        canvas
    }

    #[test]
    fn nests_children_under_roots() {
        let canvas = canvas_with(&[
            Some("graph[](TD)[A1][B1,B2,B9]"),
            Some("graph[A1](TD)[B1][]"),
            Some("graph[A1](TD)[B2][C1]"),
            Some("graph[A1|B2](TD)[C1][]"),
            None,
        ]);
        let dump = HierarchyDump::from_canvas(&canvas);
        assert_eq!(dump.roots.len(), 1);
        let root = &dump.roots[0];
        assert_eq!(root.id, "A1");
        assert_eq!(root.dangling, vec!["B9".to_string()]);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[1].children[0].id, "C1");
        assert_eq!(dump.untyped, vec![NodeId(5)]);
        assert!(dump.orphans.is_empty());
    }

    #[test]
    fn flags_legacy_descriptors_and_orphans() {
        let canvas = canvas_with(&[Some("graph[](TD)[A1][]"), Some("graph[A7][B1][]")]);
        let dump = HierarchyDump::from_canvas(&canvas);
        assert!(!dump.roots[0].legacy);
        assert_eq!(dump.orphans.len(), 1);
        assert!(dump.orphans[0].legacy);
        assert_eq!(dump.orphans[0].layout, "LR");
    }

    #[test]
    fn serializes_to_json() {
        let canvas = canvas_with(&[Some("graph[](LR)[A1][]")]);
        let json = serde_json::to_string(&HierarchyDump::from_canvas(&canvas)).unwrap();
        assert!(json.contains("\"descriptor\":\"graph[](LR)[A1][]\""));
        assert!(!json.contains("children"));
    }
}
