use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::slugify;

pub const DEFAULT_WEIGHT: f32 = 1.0;
pub const MIN_WEIGHT: f32 = 1.0;
pub const MAX_WEIGHT: f32 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    #[default]
    Topic,
    Option,
    Outcome,
    Pro,
    Con,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Topic => "topic",
            Self::Option => "option",
            Self::Outcome => "outcome",
            Self::Pro => "pro",
            Self::Con => "con",
        }
    }

    fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "root" => Self::Root,
            "option" => Self::Option,
            "outcome" => Self::Outcome,
            "pro" => Self::Pro,
            "con" => Self::Con,
            _ => Self::Topic,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapNode {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub children: Vec<MindMapNode>,
    #[serde(default)]
    pub is_recommendation: bool,
    #[serde(default)]
    pub collapsed: bool,
}

fn default_weight() -> f32 {
    DEFAULT_WEIGHT
}

impl MindMapNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind, weight: f32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            weight,
            children: Vec::new(),
            is_recommendation: false,
            collapsed: false,
        }
    }

    /// Decodes a loosely shaped JSON tree. Unknown or mistyped fields fall
    /// back to defaults, non-object children are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let name = match object.get("name").or_else(|| object.get("label")) {
            Some(Value::String(name)) => name.trim().to_owned(),
            Some(Value::Number(number)) => number.to_string(),
            _ => String::new(),
        };
        let id = match object.get("id") {
            Some(Value::String(id)) => id.trim().to_owned(),
            Some(Value::Number(number)) => number.to_string(),
            _ => String::new(),
        };
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .map(NodeKind::from_wire)
            .unwrap_or_default();
        let weight = object
            .get("weight")
            .and_then(Value::as_f64)
            .map(|weight| weight as f32)
            .unwrap_or(DEFAULT_WEIGHT);
        let children = object
            .get("children")
            .and_then(Value::as_array)
            .map(|children| children.iter().filter_map(Self::from_value).collect())
            .unwrap_or_default();

        Some(Self {
            id,
            name: if name.is_empty() { "Untitled".to_owned() } else { name },
            kind,
            weight,
            children,
            is_recommendation: object
                .get("isRecommendation")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            collapsed: object
                .get("collapsed")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    pub fn find(&self, id: &str) -> Option<&MindMapNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Replaces the node carrying `updated.id`, keeping the existing subtree
    /// when `updated` arrives without children.
    pub fn replace(&mut self, updated: &MindMapNode) -> bool {
        if self.id == updated.id {
            let children = if updated.children.is_empty() {
                std::mem::take(&mut self.children)
            } else {
                updated.children.clone()
            };
            *self = MindMapNode {
                children,
                ..updated.clone()
            };
            return true;
        }
        self.children.iter_mut().any(|child| child.replace(updated))
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

/// Returns a copy of `tree` with every id present and unique and every
/// weight inside `[MIN_WEIGHT, MAX_WEIGHT]`.
pub fn sanitize(tree: &MindMapNode) -> MindMapNode {
    let mut seen = HashSet::new();
    sanitize_node(tree, "root", 0, 0, &mut seen)
}

fn sanitize_node(
    node: &MindMapNode,
    parent_id: &str,
    depth: usize,
    index: usize,
    seen: &mut HashSet<String>,
) -> MindMapNode {
    let mut id = node.id.trim().to_owned();
    if id.is_empty() || seen.contains(&id) {
        id = format!("{parent_id}-{}-{depth}-{index}", slugify(&node.name));
        let mut suffix = 1usize;
        while seen.contains(&id) {
            id = format!("{parent_id}-{}-{depth}-{index}-{suffix}", slugify(&node.name));
            suffix += 1;
        }
    }
    seen.insert(id.clone());

    let weight = if node.weight.is_finite() && node.weight > 0.0 {
        node.weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
    } else {
        DEFAULT_WEIGHT
    };

    let children = node
        .children
        .iter()
        .enumerate()
        .map(|(child_index, child)| sanitize_node(child, &id, depth + 1, child_index, seen))
        .collect();

    MindMapNode {
        id,
        name: node.name.clone(),
        kind: node.kind,
        weight,
        children,
        is_recommendation: node.is_recommendation,
        collapsed: node.collapsed,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn from_value_tolerates_broken_payloads() {
        let value = json!({
            "name": "Career",
            "type": "mystery",
            "children": [
                null,
                {"name": "Stay", "type": "option", "weight": 7, "isRecommendation": true},
                "not a node",
                {"type": "con", "children": "oops"}
            ]
        });

        let node = MindMapNode::from_value(&value).unwrap();
        assert_eq!(node.kind, NodeKind::Topic);
        assert_eq!(node.weight, DEFAULT_WEIGHT);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].name, "Stay");
        assert!(node.children[0].is_recommendation);
        assert_eq!(node.children[1].name, "Untitled");
        assert!(node.children[1].children.is_empty());
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(MindMapNode::from_value(&json!([1, 2])).is_none());
    }

    #[test]
    fn sanitize_synthesizes_ids_from_position() {
        let mut tree = MindMapNode::new("", "Root", NodeKind::Root, 10.0);
        tree.children.push(MindMapNode::new("", "Pay Rise", NodeKind::Pro, 0.0));
        tree.children.push(MindMapNode::new("dup", "A", NodeKind::Option, 42.0));
        tree.children.push(MindMapNode::new("dup", "B", NodeKind::Option, 3.0));

        let clean = sanitize(&tree);
        assert_eq!(clean.id, "root-root-0-0");
        assert_eq!(clean.children[0].id, "root-root-0-0-pay-rise-1-0");
        assert_eq!(clean.children[0].weight, DEFAULT_WEIGHT);
        assert_eq!(clean.children[1].id, "dup");
        assert_eq!(clean.children[1].weight, MAX_WEIGHT);
        assert_eq!(clean.children[2].id, "root-root-0-0-b-1-2");

        assert_eq!(sanitize(&clean), clean);
    }

    #[test]
    fn replace_keeps_subtree_when_update_has_no_children() {
        let mut tree = MindMapNode::new("r", "Root", NodeKind::Root, 10.0);
        let mut topic = MindMapNode::new("t", "Topic", NodeKind::Topic, 8.0);
        topic.children.push(MindMapNode::new("o", "Stay", NodeKind::Option, 5.0));
        tree.children.push(topic);

        let renamed = MindMapNode::new("t", "Renamed", NodeKind::Topic, 8.0);
        assert!(tree.replace(&renamed));
        let topic = tree.find("t").unwrap();
        assert_eq!(topic.name, "Renamed");
        assert_eq!(topic.children.len(), 1);
        assert!(!tree.replace(&MindMapNode::new("missing", "x", NodeKind::Topic, 1.0)));
    }
}
