//! Boundary between the hierarchy core and the drawing host.
//!
//! The core never owns nodes. It reads geometry and descriptor text through
//! [`Canvas`] and writes back descriptor text, new nodes and edges.
//! [`MemoryCanvas`] is a self-contained host used by the CLI and the tests.

use crate::error::CanvasError;
use crate::ir::{Bounds, Descriptor, Point};
use crate::parser::{parse_descriptor, serialize_descriptor};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

pub type PageId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Styling for a drawn edge. The core passes it to the host untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeStyle {
    pub arrow_start: bool,
    pub arrow_end: bool,
    pub line: LineStyle,
    pub color: String,
    pub width: f32,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            arrow_start: false,
            arrow_end: true,
            line: LineStyle::Solid,
            color: "#333333".to_string(),
            width: 1.4,
        }
    }
}

/// Operations the host exposes to the hierarchy core.
///
/// Anchor points are reported counter-clockwise starting at the top of the
/// node, so for a four-site node the order is top, left, bottom, right.
pub trait Canvas {
    fn current_page(&self) -> PageId;
    /// Every node on the current page, in z-order.
    fn nodes_on_page(&self) -> Vec<NodeId>;
    fn page_of(&self, node: NodeId) -> Option<PageId>;

    fn descriptor_text(&self, node: NodeId) -> Option<String>;
    fn set_descriptor_text(&mut self, node: NodeId, text: &str) -> Result<(), CanvasError>;
    fn clear_descriptor_text(&mut self, node: NodeId) -> Result<(), CanvasError>;

    fn bounds(&self, node: NodeId) -> Option<Bounds>;
    fn create_node(&mut self, kind: &str, bounds: Bounds) -> Result<NodeId, CanvasError>;
    fn set_node_text(&mut self, node: NodeId, text: &str) -> Result<(), CanvasError>;

    fn anchor_points(&self, node: NodeId) -> Vec<Point>;
    fn draw_edge(&mut self, from: Point, to: Point, style: &EdgeStyle) -> Result<EdgeId, CanvasError>;

    fn select(&mut self, node: NodeId, additive: bool);
}

/// Parsed descriptor of `node`, or `None` for an untyped node.
pub fn read_descriptor<C: Canvas + ?Sized>(canvas: &C, node: NodeId) -> Option<Descriptor> {
    canvas
        .descriptor_text(node)
        .and_then(|text| parse_descriptor(&text))
}

pub fn write_descriptor<C: Canvas + ?Sized>(
    canvas: &mut C,
    node: NodeId,
    descriptor: &Descriptor,
) -> Result<(), CanvasError> {
    canvas.set_descriptor_text(node, &serialize_descriptor(descriptor))
}

/// A node of the current page together with its parsed descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedNode {
    pub node: NodeId,
    pub descriptor: Descriptor,
}

/// Parse every descriptor on the current page. Untyped nodes are skipped.
pub fn scan_page<C: Canvas + ?Sized>(canvas: &C) -> Vec<ScannedNode> {
    canvas
        .nodes_on_page()
        .into_iter()
        .filter_map(|node| {
            read_descriptor(canvas, node).map(|descriptor| ScannedNode { node, descriptor })
        })
        .collect()
}

// ── In-memory host ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    pub id: NodeId,
    pub kind: String,
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    /// Older storage slot some documents still carry descriptors in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    pub anchor_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: EdgeId,
    pub start: Point,
    pub end: Point,
    pub style: EdgeStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCanvas {
    pub pages: Vec<Page>,
    #[serde(default)]
    pub current_page: PageId,
    #[serde(default)]
    pub selection: Vec<NodeId>,
    #[serde(default)]
    next_node_id: u64,
    #[serde(default)]
    next_edge_id: u64,
}

impl Default for MemoryCanvas {
    fn default() -> Self {
        Self::new()
    }
}

/// Connection-site count the in-memory host gives each node kind.
pub fn anchor_count_for_kind(kind: &str) -> usize {
    match kind {
        "ellipse" | "oval" | "octagon" => 8,
        "hexagon" => 6,
        "line" | "connector" => 2,
        "dot" => 1,
        "freeform" => 0,
        _ => 4,
    }
}

impl MemoryCanvas {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            current_page: 0,
            selection: Vec::new(),
            next_node_id: 1,
            next_edge_id: 1,
        }
    }

    pub fn add_page(&mut self) -> PageId {
        self.pages.push(Page::default());
        self.pages.len() - 1
    }

    pub fn set_current_page(&mut self, page: PageId) -> Result<(), CanvasError> {
        if page >= self.pages.len() {
            return Err(CanvasError::UnknownPage(page));
        }
        self.current_page = page;
        Ok(())
    }

    pub fn page(&self) -> Option<&Page> {
        self.pages.get(self.current_page)
    }

    pub fn add_node(&mut self, kind: &str, bounds: Bounds) -> Result<NodeId, CanvasError> {
        self.add_node_on_page(self.current_page, kind, bounds)
    }

    pub fn add_node_on_page(
        &mut self,
        page: PageId,
        kind: &str,
        bounds: Bounds,
    ) -> Result<NodeId, CanvasError> {
        let id = NodeId(self.next_node_id.max(1));
        let target = self
            .pages
            .get_mut(page)
            .ok_or(CanvasError::UnknownPage(page))?;
        target.nodes.push(CanvasNode {
            id,
            kind: kind.to_string(),
            bounds,
            text: None,
            descriptor: None,
            alt_text: None,
            anchor_count: anchor_count_for_kind(kind),
        });
        self.next_node_id = id.0 + 1;
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&CanvasNode> {
        self.pages
            .iter()
            .flat_map(|page| page.nodes.iter())
            .find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut CanvasNode> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.nodes.iter_mut())
            .find(|node| node.id == id)
    }

    /// Delete a node without touching any other node's descriptor.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        self.selection.retain(|selected| *selected != id);
        for page in &mut self.pages {
            if let Some(idx) = page.nodes.iter().position(|node| node.id == id) {
                page.nodes.remove(idx);
                return true;
            }
        }
        false
    }

    pub fn edges(&self) -> &[CanvasEdge] {
        self.page().map(|page| page.edges.as_slice()).unwrap_or(&[])
    }

    /// Move descriptors still stored in the legacy slot to the primary slot.
    pub fn migrate_legacy_descriptors(&mut self) -> usize {
        let mut migrated = 0;
        for node in self.pages.iter_mut().flat_map(|page| page.nodes.iter_mut()) {
            if node.descriptor.is_some() {
                continue;
            }
            if let Some(text) = legacy_descriptor(node) {
                node.descriptor = Some(text);
                node.alt_text = None;
                migrated += 1;
            }
        }
        migrated
    }

    fn node_or_err(&mut self, id: NodeId) -> Result<&mut CanvasNode, CanvasError> {
        self.node_mut(id).ok_or(CanvasError::UnknownNode(id))
    }
}

fn legacy_descriptor(node: &CanvasNode) -> Option<String> {
    node.alt_text
        .as_deref()
        .filter(|text| parse_descriptor(text).is_some())
        .map(str::to_string)
}

impl Canvas for MemoryCanvas {
    fn current_page(&self) -> PageId {
        self.current_page
    }

    fn nodes_on_page(&self) -> Vec<NodeId> {
        self.page()
            .map(|page| page.nodes.iter().map(|node| node.id).collect())
            .unwrap_or_default()
    }

    fn page_of(&self, node: NodeId) -> Option<PageId> {
        self.pages
            .iter()
            .position(|page| page.nodes.iter().any(|candidate| candidate.id == node))
    }

    fn descriptor_text(&self, node: NodeId) -> Option<String> {
        let node = self.node(node)?;
        node.descriptor
            .clone()
            .filter(|text| !text.trim().is_empty())
            .or_else(|| legacy_descriptor(node))
    }

    fn set_descriptor_text(&mut self, node: NodeId, text: &str) -> Result<(), CanvasError> {
        let node = self.node_or_err(node)?;
        if legacy_descriptor(node).is_some() {
            node.alt_text = None;
        }
        node.descriptor = Some(text.to_string());
        Ok(())
    }

    fn clear_descriptor_text(&mut self, node: NodeId) -> Result<(), CanvasError> {
        let node = self.node_or_err(node)?;
        if legacy_descriptor(node).is_some() {
            node.alt_text = None;
        }
        node.descriptor = None;
        Ok(())
    }

    fn bounds(&self, node: NodeId) -> Option<Bounds> {
        self.node(node).map(|node| node.bounds)
    }

    fn create_node(&mut self, kind: &str, bounds: Bounds) -> Result<NodeId, CanvasError> {
        self.add_node(kind, bounds)
    }

    fn set_node_text(&mut self, node: NodeId, text: &str) -> Result<(), CanvasError> {
        self.node_or_err(node)?.text = Some(text.to_string());
        Ok(())
    }

    fn anchor_points(&self, node: NodeId) -> Vec<Point> {
        self.node(node)
            .map(|node| perimeter_anchors(&node.bounds, node.anchor_count))
            .unwrap_or_default()
    }

    fn draw_edge(&mut self, from: Point, to: Point, style: &EdgeStyle) -> Result<EdgeId, CanvasError> {
        let id = EdgeId(self.next_edge_id.max(1));
        let current = self.current_page;
        let page = self
            .pages
            .get_mut(current)
            .ok_or(CanvasError::UnknownPage(current))?;
        page.edges.push(CanvasEdge {
            id,
            start: from,
            end: to,
            style: style.clone(),
        });
        self.next_edge_id = id.0 + 1;
        Ok(id)
    }

    fn select(&mut self, node: NodeId, additive: bool) {
        if !additive {
            self.selection.clear();
        }
        if !self.selection.contains(&node) {
            self.selection.push(node);
        }
    }
}

/// `count` sites spread evenly around the node, counter-clockwise from the top.
/// Directions are projected onto the bounding box so diagonals hit corners.
fn perimeter_anchors(bounds: &Bounds, count: usize) -> Vec<Point> {
    let center = bounds.center();
    let half_w = (bounds.width / 2.0) as f64;
    let half_h = (bounds.height / 2.0) as f64;
    (0..count)
        .map(|idx| {
            let angle = std::f64::consts::FRAC_PI_2
                + idx as f64 * std::f64::consts::TAU / count as f64;
            let dx = snap(angle.cos());
            let dy = snap(-angle.sin());
            let scale = dx.abs().max(dy.abs());
            Point::new(
                center.x + (dx / scale * half_w) as f32,
                center.y + (dy / scale * half_h) as f32,
            )
        })
        .collect()
}

fn snap(value: f64) -> f64 {
    if value.abs() < 1e-9 { 0.0 } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Direction;

    #[test]
    fn four_anchors_run_counter_clockwise_from_top() {
        let anchors = perimeter_anchors(&Bounds::new(0.0, 0.0, 100.0, 40.0), 4);
        assert_eq!(
            anchors,
            vec![
                Point::new(50.0, 0.0),
                Point::new(0.0, 20.0),
                Point::new(50.0, 40.0),
                Point::new(100.0, 20.0),
            ]
        );
    }

    #[test]
    fn eight_anchors_include_corners() {
        let anchors = perimeter_anchors(&Bounds::new(0.0, 0.0, 100.0, 40.0), 8);
        assert_eq!(anchors.len(), 8);
        assert_eq!(anchors[1], Point::new(0.0, 0.0));
        assert_eq!(anchors[4], Point::new(50.0, 40.0));
        assert_eq!(anchors[6], Point::new(100.0, 20.0));
    }

    #[test]
    fn legacy_slot_is_read_and_migrated_on_write() {
        let mut canvas = MemoryCanvas::new();
        let node = canvas.add_node("rectangle", Bounds::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        canvas.node_mut(node).unwrap().alt_text = Some("graph[][A1][]".to_string());

        let desc = read_descriptor(&canvas, node).unwrap();
        assert_eq!(desc.current, "A1");
        assert_eq!(desc.layout, Some(Direction::LeftRight));

        write_descriptor(&mut canvas, node, &desc).unwrap();
        let stored = canvas.node(node).unwrap();
        assert_eq!(stored.alt_text, None);
        assert_eq!(stored.descriptor.as_deref(), Some("graph[](LR)[A1][]"));
    }

    #[test]
    fn plain_alt_text_is_not_a_descriptor() {
        let mut canvas = MemoryCanvas::new();
        let node = canvas.add_node("rectangle", Bounds::default()).unwrap();
        canvas.node_mut(node).unwrap().alt_text = Some("company logo".to_string());
        assert_eq!(canvas.descriptor_text(node), None);
        assert_eq!(canvas.migrate_legacy_descriptors(), 0);
        canvas.set_descriptor_text(node, "graph[][A1][]").unwrap();
        assert_eq!(canvas.node(node).unwrap().alt_text.as_deref(), Some("company logo"));
    }

    #[test]
    fn scan_skips_untyped_and_other_pages() {
        let mut canvas = MemoryCanvas::new();
        let a = canvas.add_node("rectangle", Bounds::default()).unwrap();
        let _untyped = canvas.add_node("rectangle", Bounds::default()).unwrap();
        let other = canvas.add_page();
        let b = canvas
            .add_node_on_page(other, "rectangle", Bounds::default())
            .unwrap();
        canvas.set_descriptor_text(a, "graph[][A1][]").unwrap();
        canvas.set_descriptor_text(b, "graph[][A2][]").unwrap();

        let scanned = scan_page(&canvas);
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].node, a);
        assert_eq!(canvas.page_of(b), Some(other));
    }

    #[test]
    fn selection_replaces_unless_additive() {
        let mut canvas = MemoryCanvas::new();
        let a = canvas.add_node("rectangle", Bounds::default()).unwrap();
        let b = canvas.add_node("rectangle", Bounds::default()).unwrap();
        canvas.select(a, false);
        canvas.select(b, true);
        assert_eq!(canvas.selection, vec![a, b]);
        canvas.select(b, false);
        assert_eq!(canvas.selection, vec![b]);
    }
}
