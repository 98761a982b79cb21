use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::mindmap::MindMapNode;

pub const LEVEL_SPACING: f32 = 220.0;
pub const SIBLING_SPACING: f32 = 72.0;

/// Left-to-right tidy tree: depth runs along x, leaves are stacked along y
/// with fixed spacing and every parent sits at the middle of its children.
/// The result is centred on the origin.
pub fn tree_targets(tree: &MindMapNode) -> HashMap<String, Vec2> {
    let mut targets = HashMap::with_capacity(tree.node_count());
    let mut next_leaf = 0usize;
    place(tree, 0, &mut next_leaf, &mut targets);

    let Some((min, max)) = bounds(targets.values()) else {
        return targets;
    };
    let center = (min + max) * 0.5;
    for target in targets.values_mut() {
        *target -= center;
    }
    targets
}

fn place(
    node: &MindMapNode,
    depth: usize,
    next_leaf: &mut usize,
    targets: &mut HashMap<String, Vec2>,
) -> f32 {
    let y = if node.children.is_empty() {
        let y = *next_leaf as f32 * SIBLING_SPACING;
        *next_leaf += 1;
        y
    } else {
        let child_ys = node
            .children
            .iter()
            .map(|child| place(child, depth + 1, next_leaf, targets))
            .collect::<Vec<_>>();
        let first = child_ys.first().copied().unwrap_or_default();
        let last = child_ys.last().copied().unwrap_or_default();
        (first + last) * 0.5
    };

    targets.insert(node.id.clone(), vec2(depth as f32 * LEVEL_SPACING, y));
    y
}

fn bounds<'a>(points: impl Iterator<Item = &'a Vec2>) -> Option<(Vec2, Vec2)> {
    points.fold(None, |acc, point| match acc {
        None => Some((*point, *point)),
        Some((min, max)) => Some((min.min(*point), max.max(*point))),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mindmap::NodeKind;

    fn leaf(id: &str) -> MindMapNode {
        MindMapNode::new(id, id, NodeKind::Option, 1.0)
    }

    #[test]
    fn parents_centre_over_children_and_depth_runs_along_x() {
        let mut topic = MindMapNode::new("t", "Topic", NodeKind::Topic, 5.0);
        topic.children = vec![leaf("a"), leaf("b"), leaf("c")];
        let mut root = MindMapNode::new("r", "Root", NodeKind::Root, 10.0);
        root.children = vec![topic];

        let targets = tree_targets(&root);
        assert_eq!(targets.len(), 5);

        let (r, t, a, b, c) = (
            targets["r"],
            targets["t"],
            targets["a"],
            targets["b"],
            targets["c"],
        );
        assert_eq!(r.y, t.y);
        assert_eq!(t.y, b.y);
        assert_eq!(b.y - a.y, SIBLING_SPACING);
        assert_eq!(c.y - b.y, SIBLING_SPACING);
        assert_eq!(t.x - r.x, LEVEL_SPACING);
        assert_eq!(a.x - t.x, LEVEL_SPACING);
        // centred on the origin
        assert_eq!(r.x + a.x, 0.0);
        assert_eq!(a.y + c.y, 0.0);
    }

    #[test]
    fn single_node_sits_at_origin() {
        let targets = tree_targets(&leaf("solo"));
        assert_eq!(targets["solo"], Vec2::ZERO);
    }
}
