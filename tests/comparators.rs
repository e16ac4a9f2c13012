mod common;

use common::{functions, scored};
use evotree::engines::evaluation::{
    FitnessComparator, HeightFitness, MseFitness, ParetoComparator, PriorityComparator,
    SingleComparator, SizeFitness, WeightedComparator,
};
use evotree::EvoTreeError;
use proptest::prelude::*;
use std::cmp::Ordering;

fn total_orders() -> Vec<Box<dyn FitnessComparator>> {
    let three = || {
        functions(vec![
            Box::new(SizeFitness),
            Box::new(MseFitness),
            Box::new(HeightFitness),
        ])
    };
    vec![
        Box::new(SingleComparator::new(three(), 1).unwrap()),
        Box::new(WeightedComparator::new(three(), vec![0.5, 2.0, -1.0]).unwrap()),
        Box::new(PriorityComparator::new(three()).unwrap()),
    ]
}

fn fitness_vector() -> impl Strategy<Value = Vec<f64>> {
    // Small integer grid so ties actually occur
    prop::collection::vec((-3i32..3).prop_map(f64::from), 3)
}

proptest! {
    #[test]
    fn total_orders_are_consistent(a in fitness_vector(), b in fitness_vector(), c in fitness_vector()) {
        let (a, b, c) = (scored(&a), scored(&b), scored(&c));
        for comparator in total_orders() {
            prop_assert_eq!(comparator.compare(&a, &a).unwrap(), Ordering::Equal);

            let ab = comparator.compare(&a, &b).unwrap();
            prop_assert_eq!(ab, comparator.compare(&b, &a).unwrap().reverse());

            let bc = comparator.compare(&b, &c).unwrap();
            if ab != Ordering::Greater && bc != Ordering::Greater {
                prop_assert_ne!(comparator.compare(&a, &c).unwrap(), Ordering::Greater);
            }
        }
    }

    #[test]
    fn ranking_puts_best_first(values in prop::collection::vec(fitness_vector(), 1..20)) {
        let individuals: Vec<_> = values.iter().map(|v| scored(v)).collect();
        for comparator in total_orders() {
            let order = comparator.rank(&individuals).unwrap();
            prop_assert_eq!(order.len(), individuals.len());
            for pair in order.windows(2) {
                let ordering = comparator.compare(&individuals[pair[0]], &individuals[pair[1]]).unwrap();
                prop_assert_ne!(ordering, Ordering::Greater);
            }
        }
    }
}

#[test]
fn minimized_slot_prefers_smaller_values() {
    let single = SingleComparator::new(functions(vec![Box::new(MseFitness)]), 0).unwrap();
    assert_eq!(single.compare(&scored(&[0.5]), &scored(&[2.0])).unwrap(), Ordering::Less);
}

#[test]
fn pareto_rejects_non_dominated_pairs() {
    let pareto = ParetoComparator::new(functions(vec![Box::new(SizeFitness), Box::new(HeightFitness)])).unwrap();
    assert!(!pareto.is_total_order());

    let result = pareto.compare(&scored(&[1.0, 0.0]), &scored(&[0.0, 1.0]));
    assert!(matches!(result, Err(EvoTreeError::UnsupportedOperation(_))));

    assert_eq!(pareto.compare(&scored(&[1.0, 1.0]), &scored(&[0.0, 1.0])).unwrap(), Ordering::Less);
    assert_eq!(pareto.compare(&scored(&[1.0, 1.0]), &scored(&[1.0, 1.0])).unwrap(), Ordering::Equal);
}

#[test]
fn pareto_ranks_first_front_first() {
    let pareto = ParetoComparator::new(functions(vec![Box::new(SizeFitness), Box::new(HeightFitness)])).unwrap();
    let individuals = vec![
        scored(&[0.0, 0.0]),
        scored(&[1.0, 0.0]),
        scored(&[0.0, 1.0]),
        scored(&[0.5, 0.5]),
    ];
    let order = pareto.rank(&individuals).unwrap();
    assert_eq!(order.len(), 4);
    assert_eq!(order[3], 0);
    assert!(order[..3].contains(&1) && order[..3].contains(&2) && order[..3].contains(&3));
}

#[test]
fn unevaluated_individuals_cannot_be_ranked() {
    let single = SingleComparator::new(functions(vec![Box::new(SizeFitness)]), 0).unwrap();
    let fresh = evotree::Individual::new(evotree::Tree::leaf(0.0), 1);
    assert!(matches!(
        single.rank(&[scored(&[1.0]), fresh]),
        Err(EvoTreeError::Computation(_))
    ));
}
