mod reconcile;
mod tree_layout;

use std::collections::HashMap;

use eframe::egui::Vec2;

use crate::mindmap::NodeKind;

pub use reconcile::{PendingNode, Reconciliation, reconcile};
pub use tree_layout::tree_targets;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutMode {
    /// Free-floating physics.
    #[default]
    Organic,
    /// Nodes pulled towards a left-to-right tree.
    Organized,
}

impl LayoutMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Organic => "Organic",
            Self::Organized => "Organized",
        }
    }
}

/// Physical state of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Fixed position while the user drags the node.
    pub pin: Option<Vec2>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeMeta {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub weight: f32,
    pub is_recommendation: bool,
    pub collapsed: bool,
    pub depth: usize,
}

#[derive(Clone, Debug)]
pub struct SimNode {
    pub meta: NodeMeta,
    pub body: Body,
    pub parent: Option<usize>,
    /// Seconds since the node entered the graph.
    pub age: f32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub source: String,
    pub target: String,
}

/// Arena of simulated nodes addressed by index, with an id lookup.
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    nodes: Vec<SimNode>,
    links: Vec<(usize, usize)>,
    index_by_id: HashMap<String, usize>,
}

impl NodeRegistry {
    pub fn new(nodes: Vec<SimNode>, links: Vec<(usize, usize)>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.meta.id.clone(), index))
            .collect();
        Self {
            nodes,
            links,
            index_by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [SimNode] {
        &mut self.nodes
    }

    pub fn links(&self) -> &[(usize, usize)] {
        &self.links
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&SimNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }
}
