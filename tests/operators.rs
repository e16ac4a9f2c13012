mod common;

use common::{comparator_of, functions, regression_dataset, two_class_dataset};
use evotree::config::ComponentSpec;
use evotree::engines::evaluation::{SingleComparator, SizeFitness};
use evotree::engines::generation::{
    Individual, MutationOperator, Operator, Population, RandomStumpGenerator, Selector,
};
use evotree::engines::tree::Tree;
use evotree::functions::{ComponentRegistry, ParamMap};
use evotree::EvoTreeError;
use std::sync::Arc;

fn leaves(n: usize) -> Population {
    let comparator = comparator_of(SingleComparator::new(functions(vec![Box::new(SizeFitness)]), 0).unwrap());
    let individuals = (0..n).map(|_| Individual::new(Tree::leaf(0.0), 1)).collect();
    Population::with_individuals(comparator, n, individuals)
}

#[test]
fn every_operator_round_trips_its_params() {
    let registry = ComponentRegistry::new();
    for name in registry.mutation_names() {
        let spec = ComponentSpec::new(name.as_str()).with_params("PROB 0.25");
        let operator = registry.create_mutation(&spec, 7).unwrap();
        let again = registry
            .create_mutation(&ComponentSpec::new(name.as_str()).with_params(operator.params()), 8)
            .unwrap();
        assert_eq!(again.params(), operator.params(), "{}", name);
        assert_eq!(again.probability(), 0.25, "{}", name);
    }
    for name in registry.crossover_names() {
        let operator = registry
            .create_crossover(&ComponentSpec::new(name.as_str()).with_params("prob 0.6"), 1)
            .unwrap();
        assert_eq!(operator.params(), "PROB 0.6");
    }
}

#[test]
fn selector_params_round_trip() {
    let registry = ComponentRegistry::new();
    for name in registry.selector_names() {
        let selector: Box<dyn Selector> = registry.create_selector(&ComponentSpec::new(name.as_str()), 3).unwrap();
        let again = registry
            .create_selector(&ComponentSpec::new(name.as_str()).with_params(selector.params()), 4)
            .unwrap();
        assert_eq!(again.params(), selector.params(), "{}", name);
    }
}

#[test]
fn malformed_params_are_rejected() {
    let registry = ComponentRegistry::new();
    for params in ["PROB", "PROB 0.5 0.7", "PROB 1.5", "PROB x", "DEPTH 3"] {
        let result = registry.create_crossover(&ComponentSpec::new("subtree").with_params(params), 0);
        assert!(matches!(result, Err(EvoTreeError::Configuration(_))), "{}", params);
    }
}

#[test]
fn param_map_is_case_insensitive_and_ordered() {
    let map = ParamMap::parse("prob 0.5;Jitter 2").unwrap();
    assert_eq!(map.get("PROB"), Some("0.5"));
    assert_eq!(map.get_f64("JITTER").unwrap(), Some(2.0));
    assert_eq!(map.to_string(), "PROB 0.5;JITTER 2");
}

#[test]
fn stump_mutation_grows_leaves_into_stumps() {
    let data = two_class_dataset(20);
    let registry = ComponentRegistry::new();
    let mut mutation = registry
        .create_mutation(&ComponentSpec::new("stump").with_probability(1.0), 9)
        .unwrap();
    mutation.attach_stump_generator(Arc::new(RandomStumpGenerator));

    let mut pop = leaves(5);
    mutation.mutate(&mut pop, &data).unwrap();
    for individual in pop.individuals() {
        assert!(individual.tree().size() > 1);
        assert_eq!(individual.tree().height(), 1);
        individual.tree().validate().unwrap();
    }
}

#[test]
fn numeric_node_to_leaf_uses_mean() {
    let data = regression_dataset(10);
    let registry = ComponentRegistry::new();
    let mut mutation = registry
        .create_mutation(&ComponentSpec::new("node-to-leaf-numeric").with_probability(1.0), 2)
        .unwrap();

    let mut pop = leaves(1);
    pop.individuals_mut()[0].set_tree(common::numeric_stump(4.5));
    mutation.mutate(&mut pop, &data).unwrap();

    let tree = pop.individuals()[0].tree();
    assert_eq!(tree.size(), 1);
    assert!((tree.node(tree.root()).value() - 9.0).abs() < 1e-9);
}
