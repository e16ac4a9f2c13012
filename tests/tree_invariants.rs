mod common;

use common::{full_tree, numeric_stump};
use evotree::engines::generation::operators::crossover::swap_subtrees;
use evotree::engines::generation::Individual;
use evotree::engines::tree::Tree;
use evotree::types::Sign;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    Split { leaf: usize, nominal: bool },
    Collapse { node: usize, value: f64 },
    Graft { node: usize, threshold: f64 },
    SetValue { node: usize, value: f64 },
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<usize>(), any::<bool>()).prop_map(|(leaf, nominal)| Edit::Split { leaf, nominal }),
        (any::<usize>(), 0.0..3.0f64).prop_map(|(node, value)| Edit::Collapse { node, value }),
        (any::<usize>(), -5.0..5.0f64).prop_map(|(node, threshold)| Edit::Graft { node, threshold }),
        (any::<usize>(), -5.0..5.0f64).prop_map(|(node, value)| Edit::SetValue { node, value }),
    ]
}

fn apply(tree: &mut Tree, edit: &Edit) {
    match *edit {
        Edit::Split { leaf, nominal } => {
            if tree.size() > 300 {
                return;
            }
            let leaves = tree.leaves();
            let id = leaves[leaf % leaves.len()];
            if nominal {
                tree.split(id, 1, Sign::Equal, 0.0, 3).unwrap();
            } else {
                tree.split(id, 0, Sign::Less, 1.5, 2).unwrap();
            }
        }
        Edit::Collapse { node, value } => {
            let internal = tree.internal_nodes();
            if !internal.is_empty() {
                tree.make_leaf(internal[node % internal.len()], value).unwrap();
            }
        }
        Edit::Graft { node, threshold } => {
            let id = tree.nth_node(node % tree.size()).unwrap();
            tree.replace_subtree(id, &numeric_stump(threshold)).unwrap();
        }
        Edit::SetValue { node, value } => {
            let id = tree.nth_node(node % tree.size()).unwrap();
            tree.set_value(id, value).unwrap();
        }
    }
}

proptest! {
    #[test]
    fn cached_size_and_height_match_traversal(edits in prop::collection::vec(edit(), 1..60)) {
        let mut tree = Tree::leaf(0.0);
        for edit in &edits {
            apply(&mut tree, edit);
            prop_assert_eq!(tree.size(), tree.traverse_size());
            prop_assert_eq!(tree.height(), tree.traverse_height());
            prop_assert!(tree.validate().is_ok());
        }
    }

    #[test]
    fn copies_are_independent(edits in prop::collection::vec(edit(), 1..30)) {
        let mut original = full_tree(2);
        let snapshot = original.clone();
        let mut copy = original.clone();
        for edit in &edits {
            apply(&mut copy, edit);
        }
        prop_assert_eq!(&original, &snapshot);

        apply(&mut original, &Edit::Graft { node: 0, threshold: 0.5 });
        prop_assert!(copy.validate().is_ok());
    }

    #[test]
    fn preorder_positions_round_trip(height in 0usize..5) {
        let tree = full_tree(height);
        for (n, id) in tree.preorder().into_iter().enumerate() {
            prop_assert_eq!(tree.nth_node(n), Some(id));
        }
        prop_assert_eq!(tree.nth_node(tree.size()), None);
    }
}

fn twenty_one_nodes() -> Tree {
    // 15-node full tree of height 3 plus three more binary splits
    let mut tree = full_tree(3);
    for leaf in tree.leaves().into_iter().take(3) {
        tree.split(leaf, 0, Sign::Less, 0.0, 2).unwrap();
    }
    tree
}

#[test]
fn crossover_size_follows_swapped_subtrees() {
    let base = twenty_one_nodes();
    assert_eq!(base.size(), 21);

    for n in 0..21 {
        for m in 0..21 {
            let mut a = Individual::new(base.clone(), 1);
            let mut b = Individual::new(base.clone(), 1);
            let node_a = a.tree().nth_node(n).unwrap();
            let node_b = b.tree().nth_node(m).unwrap();
            let size_a = a.tree().node(node_a).size();
            let size_b = b.tree().node(node_b).size();

            swap_subtrees(&mut a, node_a, &mut b, node_b).unwrap();

            assert_eq!(a.tree().size(), 21 - size_a + size_b);
            assert_eq!(b.tree().size(), 21 - size_b + size_a);
            assert_eq!(a.tree().size(), a.tree().traverse_size());
            assert_eq!(b.tree().size(), b.tree().traverse_size());
            assert_eq!(a.tree().height(), a.tree().traverse_height());
            assert_eq!(b.tree().height(), b.tree().traverse_height());
            assert!(a.has_changed() && b.has_changed());
        }
    }
}

#[test]
fn display_renders_structure() {
    let tree = numeric_stump(5.0);
    assert_eq!(tree.to_string(), "(a0 < 5 ? [0] : [1])");
}
