use crate::types::{NodeId, Sign};
use serde::{Deserialize, Serialize};

/// A single decision-tree node stored in a [`Tree`](super::Tree) arena.
///
/// Leaves carry the predicted class index (or regression value) in `value`;
/// split nodes carry the attribute index, the comparison sign and, for numeric
/// splits, the threshold in `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(super) attribute: Option<usize>,
    pub(super) sign: Sign,
    pub(super) value: f64,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
    /// Number of nodes in this subtree, 0 for a released arena slot
    pub(super) size: usize,
    /// 0 for a leaf, else 1 + the tallest child
    pub(super) height: usize,
}

impl Node {
    pub(super) fn leaf(value: f64, parent: Option<NodeId>) -> Self {
        Self {
            attribute: None,
            sign: Sign::Less,
            value,
            parent,
            children: Vec::new(),
            size: 1,
            height: 0,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.attribute.is_none()
    }

    pub fn attribute(&self) -> Option<usize> {
        self.attribute
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// Leaf prediction or split threshold
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub(super) fn is_live(&self) -> bool {
        self.size > 0
    }
}
