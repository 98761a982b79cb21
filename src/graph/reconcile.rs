use std::collections::{HashMap, HashSet};

use eframe::egui::Vec2;

use crate::mindmap::{MindMapNode, sanitize};

use super::{Body, LayoutMode, Link, NodeMeta, NodeRegistry, tree_targets};

/// A node of the next working set. `body` is `None` for ids the previous
/// graph never had; the layout engine seeds those.
#[derive(Clone, Debug)]
pub struct PendingNode {
    pub meta: NodeMeta,
    pub body: Option<Body>,
    pub parent: Option<usize>,
    pub age: f32,
}

#[derive(Clone, Debug)]
pub struct Reconciliation {
    pub nodes: Vec<PendingNode>,
    pub links: Vec<Link>,
    pub tree_targets: Option<HashMap<String, Vec2>>,
    /// Ids of the previous graph that are gone from the new one.
    pub removed: Vec<String>,
    /// Ids that are new in this graph.
    pub entered: Vec<String>,
}

impl Reconciliation {
    /// Links as `(parent, child)` positions in `nodes`.
    pub fn link_indices(&self) -> Vec<(usize, usize)> {
        let index_by_id = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.meta.id.as_str(), index))
            .collect::<HashMap<_, _>>();
        self.links
            .iter()
            .filter_map(|link| {
                Some((
                    *index_by_id.get(link.source.as_str())?,
                    *index_by_id.get(link.target.as_str())?,
                ))
            })
            .collect()
    }
}

/// Merges `tree` against the current registry. `previous` is only read; the
/// caller swaps the returned working set in when it is ready.
pub fn reconcile(previous: &NodeRegistry, tree: &MindMapNode, mode: LayoutMode) -> Reconciliation {
    let tree = sanitize(tree);

    let mut nodes = Vec::with_capacity(tree.node_count());
    let mut links = Vec::with_capacity(nodes.capacity().saturating_sub(1));
    flatten(&tree, None, 0, &mut nodes, &mut links);

    let mut entered = Vec::new();
    for node in &mut nodes {
        match previous.get(&node.meta.id) {
            Some(prior) => {
                node.body = Some(Body {
                    pos: prior.body.pos,
                    vel: prior.body.vel,
                    pin: prior.body.pin,
                });
                node.age = prior.age;
            }
            None => entered.push(node.meta.id.clone()),
        }
    }

    let kept = nodes
        .iter()
        .map(|node| node.meta.id.as_str())
        .collect::<HashSet<_>>();
    let removed = previous
        .nodes()
        .iter()
        .filter(|node| !kept.contains(node.meta.id.as_str()))
        .map(|node| node.meta.id.clone())
        .collect();

    let tree_targets = match mode {
        LayoutMode::Organized => Some(tree_targets(&tree)),
        LayoutMode::Organic => None,
    };

    Reconciliation {
        nodes,
        links,
        tree_targets,
        removed,
        entered,
    }
}

fn flatten(
    node: &MindMapNode,
    parent: Option<usize>,
    depth: usize,
    nodes: &mut Vec<PendingNode>,
    links: &mut Vec<Link>,
) {
    let index = nodes.len();
    nodes.push(PendingNode {
        meta: NodeMeta {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            weight: node.weight,
            is_recommendation: node.is_recommendation,
            collapsed: node.collapsed,
            depth,
        },
        body: None,
        parent,
        age: 0.0,
    });

    if let Some(parent) = parent {
        links.push(Link {
            source: nodes[parent].meta.id.clone(),
            target: node.id.clone(),
        });
    }

    for child in &node.children {
        flatten(child, Some(index), depth + 1, nodes, links);
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::SimNode;
    use crate::mindmap::NodeKind;

    fn tree(children: &[&str]) -> MindMapNode {
        let mut root = MindMapNode::new("root", "Root", NodeKind::Root, 10.0);
        root.children = children
            .iter()
            .map(|id| MindMapNode::new(*id, *id, NodeKind::Option, 4.0))
            .collect();
        root
    }

    fn registry_from(reconciliation: &Reconciliation) -> NodeRegistry {
        let nodes = reconciliation
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| SimNode {
                meta: node.meta.clone(),
                body: Body {
                    pos: vec2(index as f32 * 10.0, -(index as f32) * 3.5),
                    vel: vec2(0.25, -0.5),
                    pin: None,
                },
                parent: node.parent,
                age: 1.0,
            })
            .collect();
        NodeRegistry::new(nodes, reconciliation.link_indices())
    }

    #[test]
    fn first_reconciliation_enters_everything() {
        let result = reconcile(&NodeRegistry::default(), &tree(&["x", "y"]), LayoutMode::Organic);
        assert_eq!(result.entered, ["root", "x", "y"]);
        assert!(result.removed.is_empty());
        assert!(result.nodes.iter().all(|node| node.body.is_none()));
        assert!(result.tree_targets.is_none());
        assert_eq!(
            result.links,
            [
                Link {
                    source: "root".into(),
                    target: "x".into()
                },
                Link {
                    source: "root".into(),
                    target: "y".into()
                },
            ]
        );
        assert_eq!(result.link_indices(), [(0, 1), (0, 2)]);
    }

    #[test]
    fn surviving_nodes_carry_position_and_removed_ones_are_flagged() {
        let first = reconcile(&NodeRegistry::default(), &tree(&["x", "y"]), LayoutMode::Organic);
        let previous = registry_from(&first);
        let x_before = previous.get("x").unwrap().body;

        let second = reconcile(&previous, &tree(&["x", "z"]), LayoutMode::Organic);
        let x_after = second
            .nodes
            .iter()
            .find(|node| node.meta.id == "x")
            .and_then(|node| node.body)
            .unwrap();
        assert_eq!(x_after.pos, x_before.pos);
        assert_eq!(x_after.vel, x_before.vel);
        assert_eq!(second.removed, ["y"]);
        assert_eq!(second.entered, ["z"]);

        // the previous working set is untouched
        assert_eq!(previous.len(), 3);
        assert!(previous.get("y").is_some());
    }

    #[test]
    fn organized_mode_computes_targets_for_every_node() {
        let result = reconcile(
            &NodeRegistry::default(),
            &tree(&["x", "y", "z"]),
            LayoutMode::Organized,
        );
        let targets = result.tree_targets.unwrap();
        assert_eq!(targets.len(), 4);
        assert!(targets["x"].x > targets["root"].x);
    }

    #[test]
    fn missing_ids_and_weights_are_sanitized() {
        let mut root = tree(&[]);
        root.children.push(MindMapNode::new("", "Open Question", NodeKind::Topic, f32::NAN));
        let result = reconcile(&NodeRegistry::default(), &root, LayoutMode::Organic);
        assert_eq!(result.nodes[1].meta.id, "root-open-question-1-0");
        assert_eq!(result.nodes[1].meta.weight, 1.0);
        assert_eq!(result.nodes[1].meta.depth, 1);
    }
}
