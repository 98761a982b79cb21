mod extract;
mod node;

pub use extract::{INSTANT_ROOT_ID, extract};
pub use node::{MindMapNode, NodeKind, sanitize};
