use super::node::Node;
use crate::data::Dataset;
use crate::error::{EvoTreeError, Result};
use crate::types::{AttributeKind, NodeId, Sign};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena-backed decision tree.
///
/// Every node caches its subtree size and height. Structural edits
/// (`split`, `set_child_at`, `clear_children`, `make_leaf`, `replace_subtree`)
/// restore both caches by walking from the edited node up to the root; the rest
/// of the tree is never revisited. Released slots are recycled through a free
/// list, so a `NodeId` is only meaningful for the tree that produced it and
/// only until the next structural edit that removes it.
///
/// `Clone` produces an independent arena, so clones never share nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl Tree {
    /// Single-leaf tree predicting `value`
    pub fn leaf(value: f64) -> Self {
        Self {
            nodes: vec![Node::leaf(value, None)],
            free: Vec::new(),
            root: 0,
        }
    }

    /// One-level tree splitting on `attribute`, with one leaf per branch.
    pub fn stump(attribute: usize, kind: AttributeKind, threshold: f64, leaf_values: &[f64]) -> Result<Self> {
        if leaf_values.len() != kind.arity() {
            return Err(EvoTreeError::InvalidTree(format!(
                "stump on attribute {} needs {} leaf values, got {}",
                attribute,
                kind.arity(),
                leaf_values.len()
            )));
        }

        let mut tree = Tree::leaf(0.0);
        let root = tree.root();
        tree.split(root, attribute, Sign::for_kind(kind), threshold, kind.arity())?;
        let children = tree.nodes[root].children.clone();
        for (child, &value) in children.into_iter().zip(leaf_values) {
            tree.nodes[child].value = value;
        }
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// # Panics
    /// Panics if `id` is not a slot of this arena.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).filter(|n| n.is_live())
    }

    /// Number of nodes, read from the root cache
    pub fn size(&self) -> usize {
        self.nodes[self.root].size
    }

    /// Height of the tree, read from the root cache (0 for a single leaf)
    pub fn height(&self) -> usize {
        self.nodes[self.root].height
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id].is_leaf()
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Turns leaf `id` into a split node with `arity` fresh leaf children.
    ///
    /// The children inherit the old leaf value. Numeric splits (`Sign::Less`)
    /// are binary; nominal splits need at least two branches.
    pub fn split(&mut self, id: NodeId, attribute: usize, sign: Sign, value: f64, arity: usize) -> Result<()> {
        self.check(id)?;
        if !self.nodes[id].is_leaf() {
            return Err(EvoTreeError::InvalidTree(format!("node {} is already split", id)));
        }
        match sign {
            Sign::Less if arity != 2 => {
                return Err(EvoTreeError::InvalidTree(format!(
                    "numeric split needs 2 branches, got {}",
                    arity
                )))
            }
            Sign::Equal if arity < 2 => {
                return Err(EvoTreeError::InvalidTree(format!(
                    "nominal split needs at least 2 branches, got {}",
                    arity
                )))
            }
            _ => {}
        }

        let inherited = self.nodes[id].value;
        let children: Vec<NodeId> = (0..arity)
            .map(|_| self.alloc(Node::leaf(inherited, Some(id))))
            .collect();

        let node = &mut self.nodes[id];
        node.attribute = Some(attribute);
        node.sign = sign;
        node.value = value;
        node.children = children;
        self.propagate(id, arity as isize);
        Ok(())
    }

    /// Replaces the child at `index` of split node `id` with a copy of `subtree`.
    ///
    /// Returns the id of the grafted subtree root.
    pub fn set_child_at(&mut self, id: NodeId, index: usize, subtree: &Tree) -> Result<NodeId> {
        self.check(id)?;
        let node = &self.nodes[id];
        if node.is_leaf() {
            return Err(EvoTreeError::InvalidTree(format!("node {} is a leaf", id)));
        }
        if index >= node.children.len() {
            return Err(EvoTreeError::InvalidTree(format!(
                "child index {} outside 0..{} for node {}",
                index,
                node.children.len(),
                id
            )));
        }

        let old = node.children[index];
        let old_size = self.nodes[old].size as isize;
        self.release(old);

        let new = self.graft(subtree, subtree.root, Some(id));
        self.nodes[id].children[index] = new;
        let delta = self.nodes[new].size as isize - old_size;
        self.propagate(id, delta);
        Ok(new)
    }

    /// Detaches every child of `id`, turning it into a leaf that keeps its
    /// stored value.
    pub fn clear_children(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        let children = std::mem::take(&mut self.nodes[id].children);
        let removed: usize = children.iter().map(|&c| self.nodes[c].size).sum();
        for child in children {
            self.release(child);
        }
        self.nodes[id].attribute = None;
        self.propagate(id, -(removed as isize));
        Ok(())
    }

    /// Turns `id` into a terminal predicting `value`.
    pub fn make_leaf(&mut self, id: NodeId, value: f64) -> Result<()> {
        self.clear_children(id)?;
        self.nodes[id].value = value;
        Ok(())
    }

    /// Overwrites the leaf value or split threshold of `id`. Not structural.
    pub fn set_value(&mut self, id: NodeId, value: f64) -> Result<()> {
        self.check(id)?;
        self.nodes[id].value = value;
        Ok(())
    }

    /// Puts a copy of `subtree` where `id` currently is.
    ///
    /// When `id` is the root the whole tree is replaced. Returns the id of the
    /// new subtree root.
    pub fn replace_subtree(&mut self, id: NodeId, subtree: &Tree) -> Result<NodeId> {
        self.check(id)?;
        match self.nodes[id].parent {
            None => {
                *self = subtree.subtree(subtree.root);
                Ok(self.root)
            }
            Some(parent) => {
                let position = self.position_in_parent(id)?;
                self.set_child_at(parent, position, subtree)
            }
        }
    }

    /// Independent, compact copy of the subtree rooted at `id`.
    pub fn subtree(&self, id: NodeId) -> Tree {
        let mut tree = Tree {
            nodes: Vec::with_capacity(self.nodes[id].size),
            free: Vec::new(),
            root: 0,
        };
        tree.root = tree.graft(self, id, None);
        tree
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// The `n`-th node in preorder, located through cached subtree sizes.
    pub fn nth_node(&self, n: usize) -> Option<NodeId> {
        if n >= self.size() {
            return None;
        }

        let mut current = self.root;
        let mut remaining = n;
        loop {
            if remaining == 0 {
                return Some(current);
            }
            remaining -= 1;

            let mut next = None;
            for &child in &self.nodes[current].children {
                let size = self.nodes[child].size;
                if remaining < size {
                    next = Some(child);
                    break;
                }
                remaining -= size;
            }
            current = next?;
        }
    }

    /// Uniformly random node
    pub fn random_node<R: Rng>(&self, rng: &mut R) -> NodeId {
        let n = rng.gen_range(0..self.size());
        self.nth_node(n).unwrap_or(self.root)
    }

    /// Node ids in preorder
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.size());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        order
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.nodes[id].is_leaf())
            .collect()
    }

    pub fn internal_nodes(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| !self.nodes[id].is_leaf())
            .collect()
    }

    /// Position of `id` among its parent's children
    pub fn position_in_parent(&self, id: NodeId) -> Result<usize> {
        let parent = self.nodes[id]
            .parent
            .ok_or_else(|| EvoTreeError::InvalidTree(format!("node {} has no parent", id)))?;
        self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == id)
            .ok_or_else(|| {
                EvoTreeError::InvalidTree(format!("node {} is not a child of its parent {}", id, parent))
            })
    }

    /// `(ancestor, branch)` pairs leading from the root down to `id`.
    pub fn path_to(&self, id: NodeId) -> Result<Vec<(NodeId, usize)>> {
        self.check(id)?;
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            path.push((parent, self.position_in_parent(current)?));
            current = parent;
        }
        path.reverse();
        Ok(path)
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    /// Branch taken at split node `id` by `record`.
    ///
    /// Missing numeric values fail the `<` test and take branch 1. Missing or
    /// out-of-range nominal values take the last branch.
    pub fn branch(&self, id: NodeId, dataset: &dyn Dataset, record: usize) -> Option<usize> {
        let node = &self.nodes[id];
        let attribute = node.attribute?;
        let value = dataset.value_at(record, attribute);
        let last = node.children.len().saturating_sub(1);
        let branch = match node.sign {
            Sign::Less => {
                if value < node.value {
                    0
                } else {
                    1
                }
            }
            Sign::Equal => {
                if value.is_nan() || value < 0.0 {
                    last
                } else {
                    (value as usize).min(last)
                }
            }
        };
        Some(branch)
    }

    /// Leaf reached by `record`
    pub fn leaf_for(&self, dataset: &dyn Dataset, record: usize) -> NodeId {
        let mut current = self.root;
        while let Some(branch) = self.branch(current, dataset, record) {
            current = self.nodes[current].children[branch];
        }
        current
    }

    /// Value of the leaf reached by `record`
    pub fn classify(&self, dataset: &dyn Dataset, record: usize) -> f64 {
        self.nodes[self.leaf_for(dataset, record)].value
    }

    /// Whether `record` passes through node `id`
    pub fn reaches(&self, id: NodeId, dataset: &dyn Dataset, record: usize) -> Result<bool> {
        let path = self.path_to(id)?;
        Ok(self.follows(&path, dataset, record))
    }

    /// The subset of `records` passing through node `id`
    pub fn records_reaching(&self, id: NodeId, dataset: &dyn Dataset, records: &[usize]) -> Result<Vec<usize>> {
        let path = self.path_to(id)?;
        Ok(records
            .iter()
            .copied()
            .filter(|&r| self.follows(&path, dataset, r))
            .collect())
    }

    fn follows(&self, path: &[(NodeId, usize)], dataset: &dyn Dataset, record: usize) -> bool {
        path.iter()
            .all(|&(node, branch)| self.branch(node, dataset, record) == Some(branch))
    }

    // ------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------

    /// Node count by full traversal, independent of the caches
    pub fn traverse_size(&self) -> usize {
        self.preorder().len()
    }

    /// Height by full traversal, independent of the caches
    pub fn traverse_height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            height = height.max(depth);
            for &child in &self.nodes[id].children {
                stack.push((child, depth + 1));
            }
        }
        height
    }

    /// Checks leaf/attribute/children consistency, parent links and both
    /// caches for every reachable node.
    pub fn validate(&self) -> Result<()> {
        if self.nodes[self.root].parent.is_some() {
            return Err(EvoTreeError::InvalidTree("root has a parent".to_string()));
        }
        for id in self.preorder() {
            let node = &self.nodes[id];
            if node.attribute.is_none() != node.children.is_empty() {
                return Err(EvoTreeError::InvalidTree(format!(
                    "node {} mixes leaf and split state",
                    id
                )));
            }
            let mut size = 1;
            let mut height = 0;
            for &child in &node.children {
                if self.nodes[child].parent != Some(id) {
                    return Err(EvoTreeError::InvalidTree(format!(
                        "node {} does not point back to parent {}",
                        child, id
                    )));
                }
                size += self.nodes[child].size;
                height = height.max(self.nodes[child].height + 1);
            }
            if node.size != size || node.height != height {
                return Err(EvoTreeError::InvalidTree(format!(
                    "node {} caches size {} height {}, expected {} and {}",
                    id, node.size, node.height, size, height
                )));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Arena internals
    // ------------------------------------------------------------------

    fn check(&self, id: NodeId) -> Result<()> {
        match self.nodes.get(id) {
            Some(node) if node.is_live() => Ok(()),
            _ => Err(EvoTreeError::InvalidTree(format!("node {} does not exist", id))),
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Returns the subtree rooted at `id` to the free list
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current];
            stack.append(&mut node.children);
            node.parent = None;
            node.attribute = None;
            node.size = 0;
            node.height = 0;
            self.free.push(current);
        }
    }

    /// Copies the subtree of `src` rooted at `src_id` into this arena.
    /// Cached sizes and heights are copied as-is since they only depend on
    /// the subtree itself.
    fn graft(&mut self, src: &Tree, src_id: NodeId, parent: Option<NodeId>) -> NodeId {
        let mut top = src.nodes[src_id].clone();
        top.parent = parent;
        top.children = Vec::new();
        let new_root = self.alloc(top);

        let mut stack = vec![(src_id, new_root)];
        while let Some((from, to)) = stack.pop() {
            for &child in &src.nodes[from].children {
                let mut copy = src.nodes[child].clone();
                copy.parent = Some(to);
                copy.children = Vec::new();
                let id = self.alloc(copy);
                self.nodes[to].children.push(id);
                stack.push((child, id));
            }
        }
        new_root
    }

    /// Applies a size delta at `start` and every ancestor, recomputing each
    /// height from the children caches on the way up.
    fn propagate(&mut self, start: NodeId, size_delta: isize) {
        let mut current = Some(start);
        while let Some(id) = current {
            let height = self.nodes[id]
                .children
                .iter()
                .map(|&c| self.nodes[c].height + 1)
                .max()
                .unwrap_or(0);
            let node = &mut self.nodes[id];
            node.size = (node.size as isize + size_delta) as usize;
            node.height = height;
            current = node.parent;
        }
    }

    fn structurally_equal(&self, a: NodeId, other: &Tree, b: NodeId) -> bool {
        let (x, y) = (&self.nodes[a], &other.nodes[b]);
        x.attribute == y.attribute
            && x.sign == y.sign
            && x.value == y.value
            && x.children.len() == y.children.len()
            && x
                .children
                .iter()
                .zip(&y.children)
                .all(|(&ca, &cb)| self.structurally_equal(ca, other, cb))
    }

    fn write_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.nodes[id];
        match node.attribute {
            None => write!(f, "[{}]", node.value),
            Some(attribute) => match node.sign {
                Sign::Less => {
                    write!(f, "(a{} < {} ? ", attribute, node.value)?;
                    self.write_node(node.children[0], f)?;
                    write!(f, " : ")?;
                    self.write_node(node.children[1], f)?;
                    write!(f, ")")
                }
                Sign::Equal => {
                    write!(f, "(a{} = {{", attribute)?;
                    for (i, &child) in node.children.iter().enumerate() {
                        if i > 0 {
                            write!(f, " | ")?;
                        }
                        write!(f, "{}: ", i)?;
                        self.write_node(child, f)?;
                    }
                    write!(f, "}})")
                }
            },
        }
    }
}

/// Structural equality: same shape, attributes, signs and values, regardless
/// of arena layout.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.structurally_equal(self.root, other, other.root)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(self.root, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// (a0 < 5 ? (a1 < 2 ? [0] : [1]) : [1])
    fn sample() -> Tree {
        let mut tree = Tree::leaf(1.0);
        tree.split(0, 0, Sign::Less, 5.0, 2).unwrap();
        let left = tree.node(0).children()[0];
        tree.split(left, 1, Sign::Less, 2.0, 2).unwrap();
        let left_left = tree.node(left).children()[0];
        tree.set_value(left_left, 0.0).unwrap();
        tree
    }

    #[test]
    fn test_leaf_baseline() {
        let tree = Tree::leaf(3.0);
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.height(), 0);
        assert!(tree.is_leaf(tree.root()));
    }

    #[test]
    fn test_split_updates_caches() {
        let tree = sample();
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.height(), 2);
        tree.validate().unwrap();
    }

    #[test]
    fn test_split_rejects_bad_arity() {
        let mut tree = Tree::leaf(0.0);
        assert!(tree.split(0, 0, Sign::Less, 1.0, 3).is_err());
        assert!(tree.split(0, 0, Sign::Equal, 1.0, 1).is_err());
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn test_set_child_at_bounds() {
        let mut tree = sample();
        let root = tree.root();
        assert!(tree.set_child_at(root, 2, &Tree::leaf(0.0)).is_err());
        let leaf = tree.leaves()[0];
        assert!(tree.set_child_at(leaf, 0, &Tree::leaf(0.0)).is_err());
    }

    #[test]
    fn test_set_child_at_propagates_delta() {
        let mut tree = sample();
        let root = tree.root();
        let grafted = tree.set_child_at(root, 1, &sample()).unwrap();
        assert_eq!(tree.node(grafted).parent(), Some(root));
        assert_eq!(tree.size(), 5 - 1 + 5);
        assert_eq!(tree.height(), 3);
        tree.validate().unwrap();
    }

    #[test]
    fn test_clear_children_keeps_value() {
        let mut tree = sample();
        let left = tree.node(tree.root()).children()[0];
        tree.set_value(left, 9.0).unwrap();
        tree.clear_children(left).unwrap();
        assert!(tree.is_leaf(left));
        assert_eq!(tree.node(left).value(), 9.0);
        assert_eq!(tree.size(), 3);
        assert_eq!(tree.height(), 1);
        tree.validate().unwrap();
    }

    #[test]
    fn test_make_leaf_on_root() {
        let mut tree = sample();
        tree.make_leaf(tree.root(), 4.0).unwrap();
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.to_string(), "[4]");
    }

    #[test]
    fn test_released_slots_are_reused() {
        let mut tree = sample();
        let left = tree.node(tree.root()).children()[0];
        tree.clear_children(left).unwrap();
        let slots = tree.nodes.len();
        tree.split(left, 2, Sign::Less, 0.5, 2).unwrap();
        assert_eq!(tree.nodes.len(), slots);
        tree.validate().unwrap();
    }

    #[test]
    fn test_nth_node_is_preorder() {
        let tree = sample();
        let preorder = tree.preorder();
        for (n, id) in preorder.iter().enumerate() {
            assert_eq!(tree.nth_node(n), Some(*id));
        }
        assert_eq!(tree.nth_node(preorder.len()), None);
    }

    #[test]
    fn test_replace_root_replaces_tree() {
        let mut tree = sample();
        let replacement = Tree::stump(3, AttributeKind::Nominal { values: 3 }, 0.0, &[0.0, 1.0, 2.0]).unwrap();
        tree.replace_subtree(tree.root(), &replacement).unwrap();
        assert_eq!(tree, replacement);
        assert_eq!(tree.size(), 4);
    }

    #[test]
    fn test_subtree_copy_is_compact() {
        let tree = sample();
        let left = tree.node(tree.root()).children()[0];
        let copy = tree.subtree(left);
        assert_eq!(copy.size(), 3);
        assert_eq!(copy.nodes.len(), 3);
        assert_eq!(copy.node(copy.root()).parent(), None);
        copy.validate().unwrap();
    }

    #[test]
    fn test_path_and_display() {
        let tree = sample();
        let left = tree.node(tree.root()).children()[0];
        let left_right = tree.node(left).children()[1];
        assert_eq!(tree.path_to(left_right).unwrap(), vec![(tree.root(), 0), (left, 1)]);
        assert_eq!(tree.to_string(), "(a0 < 5 ? (a1 < 2 ? [0] : [1]) : [1])");
    }
}
