use crate::canvas::ScannedNode;
use crate::ir::{Bounds, Direction};
use crate::query::{ancestors, parent_of};

/// Where a resolved layout came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSource {
    Own,
    ParentOverride,
    Ancestor(String),
    Default,
}

/// Layout governing the children of `target`.
pub fn resolve_layout(nodes: &[ScannedNode], target: &ScannedNode) -> Direction {
    resolve_layout_with_source(nodes, target).0
}

/// Resolution order: the node's own layout, the override on its parent's
/// entry for it, the nearest ancestor declaring one, then `LR`.
pub fn resolve_layout_with_source(
    nodes: &[ScannedNode],
    target: &ScannedNode,
) -> (Direction, LayoutSource) {
    if let Some(layout) = target.descriptor.layout {
        return (layout, LayoutSource::Own);
    }

    if let Some(layout) = parent_of(nodes, target)
        .and_then(|parent| parent.descriptor.child(&target.descriptor.current))
        .and_then(|entry| entry.layout)
    {
        return (layout, LayoutSource::ParentOverride);
    }

    let lineage = ancestors(nodes, target);
    for node in lineage.iter().rev() {
        let found = nodes
            .iter()
            .find(|scanned| scanned.node == *node)
            .and_then(|scanned| scanned.descriptor.layout.map(|l| (l, &scanned.descriptor.current)));
        if let Some((layout, id)) = found {
            return (layout, LayoutSource::Ancestor(id.clone()));
        }
    }

    (Direction::default(), LayoutSource::Default)
}

/// Guess a layout from where the siblings already sit.
///
/// The axis along which sibling centers vary most is the layout axis; the
/// sign of the first-to-last displacement picks the direction. A lone
/// sibling is judged by its offset from the parent: children below or above
/// the parent line up horizontally, children beside it vertically.
pub fn detect_layout_from_geometry(parent: &Bounds, siblings: &[Bounds]) -> Direction {
    match siblings {
        [] => Direction::default(),
        [only] => {
            let parent_center = parent.center();
            let center = only.center();
            let dx = (center.x - parent_center.x).abs();
            let dy = (center.y - parent_center.y).abs();
            if dx > dy {
                Direction::TopDown
            } else {
                Direction::LeftRight
            }
        }
        [first, .., last] => {
            let xs: Vec<f32> = siblings.iter().map(|b| b.center().x).collect();
            let ys: Vec<f32> = siblings.iter().map(|b| b.center().y).collect();
            if variance(&xs) >= variance(&ys) {
                if last.center().x < first.center().x {
                    Direction::RightLeft
                } else {
                    Direction::LeftRight
                }
            } else if last.center().y < first.center().y {
                Direction::DownTop
            } else {
                Direction::TopDown
            }
        }
    }
}

fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::NodeId;
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

    #[test]
    fn own_layout_wins() {
        let nodes = page(&["graph[](TD)[A1][B1:RL]", "graph[A1](DT)[B1][]"]);
        assert_eq!(
            resolve_layout_with_source(&nodes, &nodes[1]),
            (Direction::DownTop, LayoutSource::Own)
        );
    }

    #[test]
    fn parent_override_beats_ancestors() {
        let nodes = page(&["graph[](TD)[A1][B1:RL]", "graph[A1]()[B1][]"]);
        assert_eq!(
            resolve_layout_with_source(&nodes, &nodes[1]),
            (Direction::RightLeft, LayoutSource::ParentOverride)
        );
    }

    #[test]
    fn nearest_declaring_ancestor_is_used() {
        let nodes = page(&[
            "graph[](TD)[A1][B1]",
            "graph[A1](RL)[B1][C1]",
            "graph[A1|B1]()[C1][D1]",
            "graph[A1|B1|C1]()[D1][]",
        ]);
        assert_eq!(
            resolve_layout_with_source(&nodes, &nodes[3]),
            (Direction::RightLeft, LayoutSource::Ancestor("B1".to_string()))
        );
    }

    #[test]
    fn falls_back_to_lr() {
        let nodes = page(&["graph[A9]()[B1][]"]);
        assert_eq!(
            resolve_layout_with_source(&nodes, &nodes[0]),
            (Direction::LeftRight, LayoutSource::Default)
        );
    }

    #[test]
    fn geometry_picks_the_wider_spread() {
        let parent = Bounds::new(0.0, 0.0, 100.0, 50.0);
        let row = [
            Bounds::new(-60.0, 100.0, 100.0, 50.0),
            Bounds::new(60.0, 100.0, 100.0, 50.0),
        ];
        assert_eq!(detect_layout_from_geometry(&parent, &row), Direction::LeftRight);
        let reversed = [row[1], row[0]];
        assert_eq!(detect_layout_from_geometry(&parent, &reversed), Direction::RightLeft);

        let column = [
            Bounds::new(200.0, -40.0, 100.0, 50.0),
            Bounds::new(200.0, 40.0, 100.0, 50.0),
        ];
        assert_eq!(detect_layout_from_geometry(&parent, &column), Direction::TopDown);
        let upward = [column[1], column[0]];
        assert_eq!(detect_layout_from_geometry(&parent, &upward), Direction::DownTop);
    }

    #[test]
    fn lone_sibling_uses_its_offset_from_the_parent() {
        let parent = Bounds::new(0.0, 0.0, 100.0, 50.0);
        let below = [Bounds::new(0.0, 80.0, 100.0, 50.0)];
        assert_eq!(detect_layout_from_geometry(&parent, &below), Direction::LeftRight);
        let beside = [Bounds::new(150.0, 0.0, 100.0, 50.0)];
        assert_eq!(detect_layout_from_geometry(&parent, &beside), Direction::TopDown);
        assert_eq!(detect_layout_from_geometry(&parent, &[]), Direction::LeftRight);
    }
}
