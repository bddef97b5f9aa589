//! User-facing operations.
//!
//! Each command checks its preconditions, then runs the core pipeline:
//! placement, naming, synchronization and finally edge drawing. Failures of
//! the selection or of the geometry are raised before anything is written.

use std::collections::HashSet;

use crate::canvas::{
    Canvas, EdgeId, EdgeStyle, NodeId, ScannedNode, read_descriptor, scan_page, write_descriptor,
};
use crate::config::PlacementConfig;
use crate::error::{CanvasError, CommandError, CommandResult};
use crate::hierarchy::{child_level, generate_sibling_ids, level_of, next_sibling_number};
use crate::ir::{Bounds, ChildRef, Descriptor, Direction, Side};
use crate::layout::{
    LayoutSource, Orientation, Size, SizeMode, append_anchor, append_to_siblings, child_size,
    compute_child_positions_sized, connection_point, detect_layout_from_geometry,
    determine_sides, resolve_layout, resolve_layout_with_source,
};
use crate::query::{self, children_of, is_child_of, parent_of};
use crate::sync::{
    attach_children, child_descriptor, descriptor_or_root, detach_child, initialize_root,
    set_child_layout as override_child_layout,
};
use tracing::{debug, info, warn};

/// Exactly one node must be selected.
pub fn require_single(selection: &[NodeId]) -> CommandResult<NodeId> {
    match selection {
        [node] => Ok(*node),
        _ => Err(CommandError::SelectionPrecondition(format!(
            "select exactly one node (got {})",
            selection.len()
        ))),
    }
}

/// Exactly two distinct nodes must be selected, parent first.
pub fn require_pair(selection: &[NodeId]) -> CommandResult<(NodeId, NodeId)> {
    match selection {
        [a, b] if a != b => Ok((*a, *b)),
        [_, _] => Err(CommandError::SelectionPrecondition(
            "select two different nodes".to_string(),
        )),
        _ => Err(CommandError::SelectionPrecondition(format!(
            "select exactly two nodes (got {})",
            selection.len()
        ))),
    }
}

fn ensure_on_current_page<C: Canvas + ?Sized>(canvas: &C, node: NodeId) -> CommandResult<()> {
    match canvas.page_of(node) {
        None => Err(CanvasError::UnknownNode(node).into()),
        Some(page) if page != canvas.current_page() => Err(CommandError::SelectionPrecondition(
            format!("node {node} is not on the current page"),
        )),
        Some(_) => Ok(()),
    }
}

fn bounds_of<C: Canvas + ?Sized>(canvas: &C, node: NodeId) -> CommandResult<Bounds> {
    canvas
        .bounds(node)
        .ok_or_else(|| CanvasError::UnknownNode(node).into())
}

/// A root without an explicit layout is pinned to the one it resolved to, so
/// its serialized form stops being the ambiguous short form.
fn pin_root_layout(descriptor: &mut Descriptor, layout: Direction) {
    if descriptor.is_root() && descriptor.layout.is_none() {
        descriptor.layout = Some(layout);
    }
}

/// IDs for the next `count` children of `parent`: declared children and
/// children found on the page both count toward the numbering.
fn next_child_ids(
    nodes: &[ScannedNode],
    parent: &Descriptor,
    count: usize,
) -> CommandResult<Vec<String>> {
    let level = child_level(&parent.current);
    let declared = parent.children.iter().map(|child| child.id.as_str());
    let found = children_of(nodes, parent)
        .into_iter()
        .map(|scanned| scanned.descriptor.current.as_str());
    next_sibling_number(&level, declared.chain(found))
        .and_then(|start| generate_sibling_ids(&level, start, count))
        .ok_or_else(|| CommandError::NumberingExhausted {
            parent: parent.current.clone(),
            level,
            count,
        })
}

// ── Roots ───────────────────────────────────────────────────────────

/// Make `node` a root. A node already in a hierarchy is left untouched.
pub fn init_root<C: Canvas + ?Sized>(canvas: &mut C, node: NodeId) -> CommandResult<Descriptor> {
    ensure_on_current_page(canvas, node)?;
    if let Some(existing) = read_descriptor(canvas, node) {
        debug!(%node, id = %existing.current, "node already has a descriptor");
        return Ok(existing);
    }
    let descriptor = initialize_root(canvas);
    write_descriptor(canvas, node, &descriptor)?;
    info!(%node, id = %descriptor.current, "initialized root");
    Ok(descriptor)
}

// ── Child creation ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ChildRequest {
    pub side: Side,
    pub count: usize,
    pub gap: f32,
    pub size_mode: SizeMode,
    pub node_kind: String,
    /// Optional text per child, in sibling order.
    pub texts: Vec<String>,
}

impl ChildRequest {
    pub fn new(side: Side, count: usize) -> Self {
        Self::from_config(&PlacementConfig::default(), side, count)
    }

    pub fn from_config(config: &PlacementConfig, side: Side, count: usize) -> Self {
        Self {
            side,
            count,
            gap: config.gap,
            size_mode: config.size_mode,
            node_kind: config.node_kind.clone(),
            texts: Vec::new(),
        }
    }

    pub fn gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    pub fn size_mode(mut self, mode: SizeMode) -> Self {
        self.size_mode = mode;
        self
    }

    pub fn texts(mut self, texts: Vec<String>) -> Self {
        self.texts = texts;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedChild {
    pub node: NodeId,
    pub id: String,
    pub bounds: Bounds,
    pub edge: Option<EdgeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateReport {
    pub parent_id: String,
    pub upgraded_parent: bool,
    /// True when the children continued an existing row instead of being
    /// centered on the parent.
    pub appended: bool,
    pub children: Vec<CreatedChild>,
    /// IDs of children whose edge could not be attached to an anchor.
    pub skipped_edges: Vec<String>,
}

/// Create `request.count` children of `parent` and connect them to it.
///
/// The first group created on a side is centered on the parent; later
/// groups on the same side continue after the existing children.
pub fn create_children<C: Canvas + ?Sized>(
    canvas: &mut C,
    parent: NodeId,
    request: &ChildRequest,
    edge_style: &EdgeStyle,
) -> CommandResult<CreateReport> {
    ensure_on_current_page(canvas, parent)?;
    let parent_bounds = bounds_of(canvas, parent)?;
    if request.count == 0 {
        return Ok(CreateReport::default());
    }

    let nodes = scan_page(canvas);
    let (mut parent_desc, upgraded) = descriptor_or_root(canvas, parent);
    let on_side: Vec<Bounds> = children_of(&nodes, &parent_desc)
        .into_iter()
        .filter(|scanned| scanned.node != parent)
        .filter_map(|scanned| canvas.bounds(scanned.node))
        .filter(|bounds| side_of(&parent_bounds, bounds) == Some(request.side))
        .collect();

    let layout = match resolve_layout_with_source(
        &nodes,
        &ScannedNode {
            node: parent,
            descriptor: parent_desc.clone(),
        },
    ) {
        (_, LayoutSource::Default) if !on_side.is_empty() => {
            let detected = detect_layout_from_geometry(&parent_bounds, &on_side);
            debug!(parent = %parent_desc.current, layout = %detected, "layout read from sibling geometry");
            detected
        }
        (layout, _) => layout,
    };
    // Reversal only applies when the layout runs along the row being filled.
    let reversed =
        layout.is_reversed() && layout.is_horizontal() == request.side.stacks_horizontally();

    let (positions, size, appended) =
        match append_anchor(&on_side, request.side, reversed) {
            Some(anchor) => {
                let positions = append_to_siblings(
                    &on_side,
                    request.side,
                    request.gap,
                    request.count,
                    reversed,
                );
                (positions, Size::of(&anchor), true)
            }
            None => {
                let size = child_size(
                    &parent_bounds,
                    request.side,
                    request.gap,
                    request.count,
                    request.size_mode,
                );
                if !size.is_positive() {
                    return Err(CommandError::GeometricInfeasibility {
                        count: request.count,
                        gap: request.gap,
                        size: size.width.min(size.height),
                    });
                }
                let mut positions = compute_child_positions_sized(
                    &parent_bounds,
                    size,
                    request.side,
                    request.gap,
                    request.count,
                );
                if reversed {
                    positions.reverse();
                }
                (positions, size, false)
            }
        };

    let ids = next_child_ids(&nodes, &parent_desc, request.count)?;

    let mut created = Vec::with_capacity(ids.len());
    for (idx, (id, position)) in ids.iter().zip(positions).enumerate() {
        let bounds = Bounds::new(position.x, position.y, size.width, size.height);
        let node = canvas.create_node(&request.node_kind, bounds)?;
        if let Some(text) = request.texts.get(idx) {
            canvas.set_node_text(node, text)?;
        }
        created.push(CreatedChild {
            node,
            id: id.clone(),
            bounds,
            edge: None,
        });
    }

    pin_root_layout(&mut parent_desc, layout);
    let refs: Vec<ChildRef> = ids.iter().map(ChildRef::new).collect();
    let parent_desc = attach_children(&parent_desc, &refs);
    write_descriptor(canvas, parent, &parent_desc)?;
    for child in &created {
        let descriptor = child_descriptor(&parent_desc, &child.id, Some(layout));
        write_descriptor(canvas, child.node, &descriptor)?;
    }

    let mut skipped_edges = Vec::new();
    let parent_point = connection_point(&canvas.anchor_points(parent), request.side);
    for child in &mut created {
        let child_point = connection_point(&canvas.anchor_points(child.node), request.side.opposite());
        match (parent_point, child_point) {
            (Some(from), Some(to)) => {
                child.edge = Some(canvas.draw_edge(from, to, edge_style)?);
            }
            _ => {
                warn!(parent = %parent_desc.current, child = %child.id, "cannot resolve connection");
                skipped_edges.push(child.id.clone());
            }
        }
    }

    info!(
        parent = %parent_desc.current,
        count = created.len(),
        appended,
        layout = %layout,
        "created children"
    );
    Ok(CreateReport {
        parent_id: parent_desc.current.clone(),
        upgraded_parent: upgraded,
        appended,
        children: created,
        skipped_edges,
    })
}

/// Which side of `parent` a child sits on. Children below or above the
/// parent count as bottom or top even when they stick out sideways.
fn side_of(parent: &Bounds, child: &Bounds) -> Option<Side> {
    if child.y >= parent.bottom() {
        Some(Side::Bottom)
    } else if child.bottom() <= parent.y {
        Some(Side::Top)
    } else if child.x >= parent.right() {
        Some(Side::Right)
    } else if child.right() <= parent.x {
        Some(Side::Left)
    } else {
        None
    }
}

// ── Connect & splice ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Relabel {
    pub node: NodeId,
    pub old_id: Option<String>,
    pub new_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectReport {
    pub parent_id: String,
    pub child_id: String,
    pub upgraded_parent: bool,
    /// The child and every descendant whose ID or chain was rewritten.
    pub relabeled: Vec<Relabel>,
    pub edge: Option<EdgeId>,
}

/// Make `child` a child of `parent` and draw an edge between them.
///
/// The child leaves its previous parent's declared children, takes the next
/// free ID on the level below `parent`, and its whole subtree is rewritten
/// onto the new path (sibling numbers are kept).
pub fn connect<C: Canvas + ?Sized>(
    canvas: &mut C,
    parent: NodeId,
    child: NodeId,
    edge_style: &EdgeStyle,
) -> CommandResult<ConnectReport> {
    if parent == child {
        return Err(CommandError::SelectionPrecondition(
            "cannot connect a node to itself".to_string(),
        ));
    }
    if canvas.page_of(parent) != canvas.page_of(child) {
        return Err(CommandError::SelectionPrecondition(
            "cannot connect nodes on different pages".to_string(),
        ));
    }
    ensure_on_current_page(canvas, parent)?;
    ensure_on_current_page(canvas, child)?;
    let parent_bounds = bounds_of(canvas, parent)?;
    let child_bounds = bounds_of(canvas, child)?;

    let nodes = scan_page(canvas);
    let (mut parent_desc, upgraded) = descriptor_or_root(canvas, parent);
    let child_scanned = read_descriptor(canvas, child).map(|descriptor| ScannedNode {
        node: child,
        descriptor,
    });

    if let Some(scanned) = &child_scanned {
        if query::family(&nodes, scanned).contains(&parent) {
            return Err(CommandError::SelectionPrecondition(format!(
                "{} is a descendant of {}",
                parent_desc.current, scanned.descriptor.current
            )));
        }
    }

    let already_child = child_scanned
        .as_ref()
        .is_some_and(|scanned| is_child_of(&scanned.descriptor, &parent_desc));
    let new_id = match &child_scanned {
        Some(scanned) if already_child => scanned.descriptor.current.clone(),
        _ => next_child_ids(&nodes, &parent_desc, 1)?.remove(0),
    };

    if let Some(scanned) = child_scanned.as_ref().filter(|_| !already_child) {
        if let Some(old_parent) = parent_of(&nodes, scanned) {
            if old_parent.node == parent {
                parent_desc = detach_child(&parent_desc, &scanned.descriptor.current);
            } else {
                let detached = detach_child(&old_parent.descriptor, &scanned.descriptor.current);
                write_descriptor(canvas, old_parent.node, &detached)?;
                debug!(old_parent = %old_parent.descriptor.current, "detached from previous parent");
            }
        }
    }

    let layout = resolve_layout(
        &nodes,
        &ScannedNode {
            node: parent,
            descriptor: parent_desc.clone(),
        },
    );
    pin_root_layout(&mut parent_desc, layout);
    let parent_desc = attach_children(&parent_desc, &[ChildRef::new(new_id.clone())]);
    write_descriptor(canvas, parent, &parent_desc)?;

    let mut relabeled = Vec::new();
    match &child_scanned {
        Some(scanned) => {
            let mut visited = HashSet::from([parent, child]);
            let moved = rebase(&scanned.descriptor, &parent_desc, &new_id);
            write_descriptor(canvas, child, &moved)?;
            relabeled.push(Relabel {
                node: child,
                old_id: Some(scanned.descriptor.current.clone()),
                new_id: new_id.clone(),
            });
            rebase_subtree(
                canvas,
                &nodes,
                &scanned.descriptor,
                &moved,
                &mut visited,
                &mut relabeled,
            )?;
        }
        None => {
            let descriptor = child_descriptor(&parent_desc, &new_id, None);
            write_descriptor(canvas, child, &descriptor)?;
            relabeled.push(Relabel {
                node: child,
                old_id: None,
                new_id: new_id.clone(),
            });
        }
    }

    let from_center = parent_bounds.center();
    let to_center = child_bounds.center();
    let orientation = Orientation::between(from_center, to_center, layout);
    let (parent_side, child_side) = determine_sides(from_center, to_center, orientation);
    let from = connection_point(&canvas.anchor_points(parent), parent_side);
    let to = connection_point(&canvas.anchor_points(child), child_side);
    let edge = match (from, to) {
        (Some(from), Some(to)) => Some(canvas.draw_edge(from, to, edge_style)?),
        _ => {
            warn!(parent = %parent_desc.current, child = %new_id, "cannot resolve connection");
            None
        }
    };

    info!(parent = %parent_desc.current, child = %new_id, moved = relabeled.len(), "connected");
    Ok(ConnectReport {
        parent_id: parent_desc.current.clone(),
        child_id: new_id,
        upgraded_parent: upgraded,
        relabeled,
        edge,
    })
}

/// Swap the level prefix of `id` for `level`, keeping its number.
fn relevel(id: &str, level: &str) -> String {
    let suffix = &id[level_of(id).len()..];
    if suffix.is_empty() {
        format!("{level}1")
    } else {
        format!("{level}{suffix}")
    }
}

/// `old` moved under `new_parent` as `new_id`; its declared children follow
/// onto the next level.
fn rebase(old: &Descriptor, new_parent: &Descriptor, new_id: &str) -> Descriptor {
    let below = child_level(new_id);
    Descriptor {
        parent_chain: new_parent.child_chain(),
        layout: old.layout,
        current: new_id.to_string(),
        children: old
            .children
            .iter()
            .map(|entry| ChildRef {
                id: relevel(&entry.id, &below),
                layout: entry.layout,
            })
            .collect(),
    }
}

fn rebase_subtree<C: Canvas + ?Sized>(
    canvas: &mut C,
    nodes: &[ScannedNode],
    old_parent: &Descriptor,
    new_parent: &Descriptor,
    visited: &mut HashSet<NodeId>,
    relabeled: &mut Vec<Relabel>,
) -> CommandResult<()> {
    let below = child_level(&new_parent.current);
    for scanned in nodes {
        if !is_child_of(&scanned.descriptor, old_parent) || !visited.insert(scanned.node) {
            continue;
        }
        let new_id = relevel(&scanned.descriptor.current, &below);
        let moved = rebase(&scanned.descriptor, new_parent, &new_id);
        write_descriptor(canvas, scanned.node, &moved)?;
        relabeled.push(Relabel {
            node: scanned.node,
            old_id: Some(scanned.descriptor.current.clone()),
            new_id,
        });
        rebase_subtree(canvas, nodes, &scanned.descriptor, &moved, visited, relabeled)?;
    }
    Ok(())
}

// ── Layout edits ────────────────────────────────────────────────────

/// Set or clear the layout a node's own children follow.
pub fn set_layout<C: Canvas + ?Sized>(
    canvas: &mut C,
    node: NodeId,
    layout: Option<Direction>,
) -> CommandResult<Descriptor> {
    ensure_on_current_page(canvas, node)?;
    let (mut descriptor, _) = descriptor_or_root(canvas, node);
    descriptor.layout = layout;
    write_descriptor(canvas, node, &descriptor)?;
    Ok(descriptor)
}

/// Set or clear the override a parent records for one of its children.
pub fn set_child_layout<C: Canvas + ?Sized>(
    canvas: &mut C,
    parent: NodeId,
    child: NodeId,
    layout: Option<Direction>,
) -> CommandResult<Descriptor> {
    ensure_on_current_page(canvas, parent)?;
    ensure_on_current_page(canvas, child)?;
    let parent_desc = read_descriptor(canvas, parent).ok_or_else(|| {
        CommandError::SelectionPrecondition(format!("node {parent} has no hierarchy descriptor"))
    })?;
    let child_desc = read_descriptor(canvas, child).ok_or_else(|| {
        CommandError::SelectionPrecondition(format!("node {child} has no hierarchy descriptor"))
    })?;
    if !is_child_of(&child_desc, &parent_desc) {
        return Err(CommandError::SelectionPrecondition(format!(
            "{} is not a child of {}",
            child_desc.current, parent_desc.current
        )));
    }
    let updated = override_child_layout(&parent_desc, &child_desc.current, layout);
    write_descriptor(canvas, parent, &updated)?;
    Ok(updated)
}

/// Drop the node's descriptor. Other nodes that reference it are not touched.
pub fn clear_relationship<C: Canvas + ?Sized>(canvas: &mut C, node: NodeId) -> CommandResult<()> {
    ensure_on_current_page(canvas, node)?;
    canvas.clear_descriptor_text(node)?;
    info!(%node, "cleared relationship");
    Ok(())
}

// ── Selection ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Related {
    Siblings,
    Level,
    Ancestors,
    Family,
}

/// Nodes related to `node`, the node itself included.
pub fn related_nodes<C: Canvas + ?Sized>(
    canvas: &C,
    node: NodeId,
    relation: Related,
) -> CommandResult<Vec<NodeId>> {
    ensure_on_current_page(canvas, node)?;
    let descriptor = read_descriptor(canvas, node).ok_or_else(|| {
        CommandError::SelectionPrecondition(format!("node {node} has no hierarchy descriptor"))
    })?;
    let origin = ScannedNode { node, descriptor };
    let nodes = scan_page(canvas);
    let related = match relation {
        Related::Siblings => query::siblings(&nodes, &origin),
        Related::Level => query::level_peers(&nodes, &origin),
        Related::Ancestors => {
            let mut lineage = query::ancestors(&nodes, &origin);
            lineage.push(node);
            lineage
        }
        Related::Family => {
            let mut family = vec![node];
            family.extend(query::family(&nodes, &origin));
            family
        }
    };
    Ok(related)
}

/// Replace the host selection with the nodes related to `node`.
pub fn select_related<C: Canvas + ?Sized>(
    canvas: &mut C,
    node: NodeId,
    relation: Related,
) -> CommandResult<Vec<NodeId>> {
    let related = related_nodes(canvas, node, relation)?;
    for (idx, target) in related.iter().enumerate() {
        canvas.select(*target, idx > 0);
    }
    debug!(%node, ?relation, selected = related.len(), "selection updated");
    Ok(related)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_shapes_are_checked() {
        assert_eq!(require_single(&[NodeId(3)]), Ok(NodeId(3)));
        assert!(require_single(&[]).is_err());
        assert!(require_single(&[NodeId(1), NodeId(2)]).is_err());
        assert_eq!(require_pair(&[NodeId(1), NodeId(2)]), Ok((NodeId(1), NodeId(2))));
        assert!(require_pair(&[NodeId(1), NodeId(1)]).is_err());
        assert!(require_pair(&[NodeId(1)]).is_err());
    }

    #[test]
    fn relevel_keeps_numbers() {
        assert_eq!(relevel("C4", "D"), "D4");
        assert_eq!(relevel("ZA12", "B"), "B12");
        assert_eq!(relevel("X", "C"), "C1");
    }

    #[test]
    fn rebase_moves_children_one_level_down() {
        let old = crate::parser::parse_descriptor("graph[A2](TD)[B3][C1:RL,C2]").unwrap();
        let parent = crate::parser::parse_descriptor("graph[A1](LR)[B1][]").unwrap();
        let moved = rebase(&old, &parent, "C5");
        assert_eq!(moved.to_string(), "graph[A1|B1](TD)[C5][D1:RL,D2]");
    }

    #[test]
    fn side_is_decided_vertically_first() {
        let parent = Bounds::new(0.0, 0.0, 100.0, 50.0);
        assert_eq!(side_of(&parent, &Bounds::new(0.0, 70.0, 100.0, 50.0)), Some(Side::Bottom));
        assert_eq!(side_of(&parent, &Bounds::new(150.0, 70.0, 100.0, 50.0)), Some(Side::Bottom));
        assert_eq!(side_of(&parent, &Bounds::new(120.0, 0.0, 100.0, 50.0)), Some(Side::Right));
        assert_eq!(side_of(&parent, &Bounds::new(-40.0, -60.0, 30.0, 50.0)), Some(Side::Top));
        assert_eq!(side_of(&parent, &Bounds::new(-40.0, 10.0, 30.0, 20.0)), Some(Side::Left));
        assert_eq!(side_of(&parent, &Bounds::new(10.0, 10.0, 30.0, 20.0)), None);
    }
}
