//! Relationship queries over one page.
//!
//! There is no index: every query works on a fresh [`scan_page`] of the
//! canvas and filters it, so hand-edited or half-deleted hierarchies are read
//! exactly as they are.
//!
//! [`scan_page`]: crate::canvas::scan_page

use crate::canvas::{NodeId, ScannedNode};
use crate::hierarchy::level_of;
use crate::ir::{ChildRef, Descriptor};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Two chains describe the same path when one is a suffix of the other.
/// Older documents only record the immediate parent, so a short chain must
/// still line up with a full one.
pub fn chains_compatible(a: &[String], b: &[String]) -> bool {
    a.ends_with(b) || b.ends_with(a)
}

/// Whether `candidate` hangs directly under `parent`: its chain ends with the
/// parent's ID and lines up with the parent's own path, so nodes under a
/// same-named parent elsewhere on the page do not match.
pub fn is_child_of(candidate: &Descriptor, parent: &Descriptor) -> bool {
    if candidate.parent_id() != Some(parent.current.as_str()) {
        return false;
    }
    chains_compatible(&parent.child_chain(), &candidate.parent_chain)
}

/// Nodes sharing the origin's parent chain, origin first.
pub fn siblings(nodes: &[ScannedNode], origin: &ScannedNode) -> Vec<NodeId> {
    let chain = origin.descriptor.joined_chain();
    let mut result = vec![origin.node];
    result.extend(
        nodes
            .iter()
            .filter(|scanned| scanned.node != origin.node)
            .filter(|scanned| scanned.descriptor.joined_chain() == chain)
            .map(|scanned| scanned.node),
    );
    result
}

/// Nodes on the same level as the origin, under any parent.
pub fn level_peers(nodes: &[ScannedNode], origin: &ScannedNode) -> Vec<NodeId> {
    let level = origin.descriptor.level();
    nodes
        .iter()
        .filter(|scanned| level_of(&scanned.descriptor.current) == level)
        .map(|scanned| scanned.node)
        .collect()
}

/// Ancestors in chain order (root first). Ancestors that cannot be found on
/// the page are skipped.
pub fn ancestors(nodes: &[ScannedNode], origin: &ScannedNode) -> Vec<NodeId> {
    let chain = &origin.descriptor.parent_chain;
    let mut result = Vec::new();
    for (depth, id) in chain.iter().enumerate() {
        let prefix = &chain[..depth];
        let found = nodes.iter().find(|scanned| {
            scanned.node != origin.node
                && scanned.descriptor.current == *id
                && chains_compatible(prefix, &scanned.descriptor.parent_chain)
        });
        match found {
            Some(scanned) => result.push(scanned.node),
            None => debug!(ancestor = %id, "ancestor missing from page"),
        }
    }
    result
}

/// Nodes directly under `parent`, in page order.
pub fn children_of<'a>(nodes: &'a [ScannedNode], parent: &Descriptor) -> Vec<&'a ScannedNode> {
    nodes
        .iter()
        .filter(|scanned| is_child_of(&scanned.descriptor, parent))
        .collect()
}

/// Immediate parent of `child`, if it is on the page.
pub fn parent_of<'a>(nodes: &'a [ScannedNode], child: &ScannedNode) -> Option<&'a ScannedNode> {
    let chain = &child.descriptor.parent_chain;
    let (parent_id, above) = chain.split_last()?;
    nodes.iter().find(|scanned| {
        scanned.node != child.node
            && scanned.descriptor.current == *parent_id
            && chains_compatible(above, &scanned.descriptor.parent_chain)
    })
}

/// Every descendant of the origin, depth first.
///
/// Each node is visited at most once, so cyclic or self-referencing chains
/// still terminate.
pub fn family(nodes: &[ScannedNode], origin: &ScannedNode) -> Vec<NodeId> {
    let mut visited = HashSet::new();
    visited.insert(origin.node);
    let mut result = Vec::new();
    expand_family(nodes, &origin.descriptor, &mut visited, &mut result);
    result
}

fn expand_family(
    nodes: &[ScannedNode],
    frontier: &Descriptor,
    visited: &mut HashSet<NodeId>,
    result: &mut Vec<NodeId>,
) {
    for scanned in nodes {
        if !is_child_of(&scanned.descriptor, frontier) {
            continue;
        }
        if !visited.insert(scanned.node) {
            trace!(node = %scanned.node, id = %scanned.descriptor.current, "already visited");
            continue;
        }
        result.push(scanned.node);
        expand_family(nodes, &scanned.descriptor, visited, result);
    }
}

/// Declared children of `parent` with no matching node on the page.
pub fn dangling_children(nodes: &[ScannedNode], parent: &Descriptor) -> Vec<ChildRef> {
    let present: HashSet<&str> = children_of(nodes, parent)
        .into_iter()
        .map(|scanned| scanned.descriptor.current.as_str())
        .collect();
    parent
        .children
        .iter()
        .filter(|child| !present.contains(child.id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_descriptor;

    fn page(texts: &[&str]) -> Vec<ScannedNode> {
        texts
            .iter()
            .enumerate()
            .map(|(idx, text)| ScannedNode {
                node: NodeId(idx as u64 + 1),
                descriptor: parse_descriptor(text).unwrap(),
            })
            .collect()
    }

    fn sample() -> Vec<ScannedNode> {
        page(&[
            "graph[](LR)[A1][B1,B2]",     // 1
            "graph[A1](LR)[B1][C1]",      // 2
            "graph[A1](LR)[B2][]",        // 3
            "graph[A1|B1](LR)[C1][]",     // 4
            "graph[](LR)[A2][B1]",        // 5
            "graph[A2](LR)[B1][C1]",      // 6
            "graph[A2|B1](LR)[C1][]",     // 7
        ])
    }

    #[test]
    fn siblings_share_the_exact_chain() {
        let nodes = sample();
        assert_eq!(siblings(&nodes, &nodes[2]), vec![NodeId(3), NodeId(2)]);
        assert_eq!(siblings(&nodes, &nodes[0]), vec![NodeId(1), NodeId(5)]);
    }

    #[test]
    fn level_peers_ignore_parents() {
        let nodes = sample();
        assert_eq!(
            level_peers(&nodes, &nodes[3]),
            vec![NodeId(4), NodeId(7)]
        );
    }

    #[test]
    fn ancestors_follow_the_chain() {
        let nodes = sample();
        assert_eq!(ancestors(&nodes, &nodes[6]), vec![NodeId(5), NodeId(6)]);
        assert_eq!(ancestors(&nodes, &nodes[3]), vec![NodeId(1), NodeId(2)]);
        assert!(ancestors(&nodes, &nodes[0]).is_empty());
    }

    #[test]
    fn missing_ancestor_is_skipped() {
        let nodes = page(&["graph[](LR)[A1][]", "graph[A1|B9](LR)[C1][]"]);
        assert_eq!(ancestors(&nodes, &nodes[1]), vec![NodeId(1)]);
    }

    #[test]
    fn family_stays_under_its_own_root() {
        let nodes = sample();
        assert_eq!(family(&nodes, &nodes[0]), vec![NodeId(2), NodeId(4), NodeId(3)]);
        assert_eq!(family(&nodes, &nodes[4]), vec![NodeId(6), NodeId(7)]);
        assert!(family(&nodes, &nodes[2]).is_empty());
    }

    #[test]
    fn family_accepts_short_legacy_chains() {
        let nodes = page(&["graph[][A1][B1]", "graph[A1][B1][C1]", "graph[B1][C1][]"]);
        assert_eq!(family(&nodes, &nodes[0]), vec![NodeId(2), NodeId(3)]);
        assert_eq!(ancestors(&nodes, &nodes[2]), vec![NodeId(2)]);
    }

    #[test]
    fn family_terminates_on_self_reference() {
        let nodes = page(&["graph[B1](LR)[B1][B1]", "graph[B1|B1](LR)[B1][]"]);
        let result = family(&nodes, &nodes[0]);
        assert_eq!(result, vec![NodeId(2)]);
    }

    #[test]
    fn family_terminates_on_mutual_cycle() {
        let nodes = page(&["graph[C1](LR)[B1][C1]", "graph[B1](LR)[C1][B1]"]);
        assert_eq!(family(&nodes, &nodes[0]), vec![NodeId(2)]);
        assert_eq!(family(&nodes, &nodes[1]), vec![NodeId(1)]);
    }

    #[test]
    fn dangling_children_are_reported() {
        let nodes = page(&["graph[](LR)[A1][B1,B2,B3]", "graph[A1](LR)[B2][]"]);
        let dangling: Vec<String> = dangling_children(&nodes, &nodes[0].descriptor)
            .into_iter()
            .map(|child| child.id)
            .collect();
        assert_eq!(dangling, vec!["B1".to_string(), "B3".to_string()]);
    }

    #[test]
    fn parent_lookup_respects_the_path() {
        let nodes = sample();
        assert_eq!(parent_of(&nodes, &nodes[6]).map(|p| p.node), Some(NodeId(6)));
        assert_eq!(parent_of(&nodes, &nodes[3]).map(|p| p.node), Some(NodeId(2)));
        assert_eq!(parent_of(&nodes, &nodes[0]), None);
    }
}
