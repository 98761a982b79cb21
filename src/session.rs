use log::{debug, info};

use crate::conversation::{ChatMessage, fingerprint};
use crate::graph::{LayoutMode, reconcile, tree_targets};
use crate::mindmap::{self, MindMapNode};
use crate::physics::{ForceLayout, PhysicsConfig};

/// A replacement for the rendered mind map, from whichever producer.
#[derive(Clone, Debug)]
pub enum GraphUpdate {
    /// Heuristic tree built synchronously from the conversation.
    Instant(MindMapNode),
    /// Tree returned by the structuring collaborator for the conversation
    /// identified by `fingerprint`.
    Background {
        tree: MindMapNode,
        fingerprint: String,
    },
    /// A single node edited from the canvas.
    Edit(MindMapNode),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// Background result for a conversation that was already applied.
    SkippedRedundant,
    /// Edit for a node the current tree does not have.
    UnknownNode,
}

/// Conversation plus everything derived from it. All graph changes go
/// through [`Session::apply_update`].
///
/// `tree` is always sanitized, so its ids are the ones the layout registry
/// and the canvas use.
pub struct Session {
    messages: Vec<ChatMessage>,
    tree: MindMapNode,
    layout: ForceLayout,
    last_background: Option<String>,
}

impl Session {
    pub fn new(mode: LayoutMode, config: PhysicsConfig) -> Self {
        let mut session = Self {
            messages: Vec::new(),
            tree: mindmap::sanitize(&mindmap::extract(&[])),
            layout: ForceLayout::new(mode, config),
            last_background: None,
        };
        session.install_current();
        session
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn tree(&self) -> &MindMapNode {
        &self.tree
    }

    pub fn layout(&self) -> &ForceLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut ForceLayout {
        &mut self.layout
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.messages)
    }

    /// Appends a message and applies the instant tree for the new
    /// conversation. Returns the fingerprint a background request for this
    /// conversation should carry.
    pub fn push_message(&mut self, message: ChatMessage) -> String {
        self.messages.push(message);
        let tree = mindmap::extract(&self.messages);
        self.apply_update(GraphUpdate::Instant(tree));
        self.fingerprint()
    }

    pub fn apply_update(&mut self, update: GraphUpdate) -> UpdateOutcome {
        match update {
            GraphUpdate::Instant(tree) => {
                self.tree = mindmap::sanitize(&tree);
            }
            GraphUpdate::Background { tree, fingerprint } => {
                if self.last_background.as_deref() == Some(fingerprint.as_str()) {
                    debug!("skipping background mind map for an applied conversation");
                    return UpdateOutcome::SkippedRedundant;
                }
                // a late result still merges into the current working graph
                info!("background mind map replaces the working tree");
                self.tree = mindmap::sanitize(&tree);
                self.last_background = Some(fingerprint);
            }
            GraphUpdate::Edit(node) => {
                let mut edited = self.tree.clone();
                if !edited.replace(&node) {
                    return UpdateOutcome::UnknownNode;
                }
                self.tree = mindmap::sanitize(&edited);
            }
        }

        self.install_current();
        UpdateOutcome::Applied
    }

    pub fn set_mode(&mut self, mode: LayoutMode) {
        if mode == self.layout.mode() {
            return;
        }
        let targets = match mode {
            LayoutMode::Organized => Some(tree_targets(&self.tree)),
            LayoutMode::Organic => None,
        };
        self.layout.set_mode(mode, targets);
    }

    fn install_current(&mut self) {
        let reconciliation = reconcile(self.layout.registry(), &self.tree, self.layout.mode());
        self.layout.install(reconciliation);
    }
}
