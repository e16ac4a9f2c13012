use super::fitness::FitnessFunctions;
use super::pareto::{dominates, OptimizationDirection, ParetoRanking};
use crate::engines::generation::Individual;
use crate::error::{EvoTreeError, Result};
use std::cmp::Ordering;

/// Orders individuals by their fitness vectors.
///
/// `compare(a, b)` returns `Less` when `a` is better than `b`, so sorting
/// ascending puts the best individual first. A comparator owns the fitness
/// functions whose slots it reads.
pub trait FitnessComparator: Send + Sync {
    fn name(&self) -> &str;

    fn functions(&self) -> &FitnessFunctions;

    fn compare(&self, a: &Individual, b: &Individual) -> Result<Ordering>;

    /// `false` when `compare` can fail on valid, evaluated individuals
    fn is_total_order(&self) -> bool {
        true
    }

    /// Indices of `individuals`, best first. Equal individuals keep their
    /// relative order.
    fn rank(&self, individuals: &[Individual]) -> Result<Vec<usize>> {
        for individual in individuals {
            ensure_evaluated(individual, self.functions().len())?;
        }
        let mut indices: Vec<usize> = (0..individuals.len()).collect();
        let mut failure = None;
        indices.sort_by(|&a, &b| {
            self.compare(&individuals[a], &individuals[b]).unwrap_or_else(|e| {
                failure.get_or_insert(e);
                Ordering::Equal
            })
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(indices),
        }
    }
}

fn ensure_evaluated(individual: &Individual, slots: usize) -> Result<()> {
    if !individual.is_evaluated() || individual.fitness().len() < slots {
        return Err(EvoTreeError::Computation(
            "Cannot compare an individual whose fitness was never computed".to_string(),
        ));
    }
    Ok(())
}

/// Direction-oriented fitness values: larger is better in every slot
fn oriented(individual: &Individual, directions: &[OptimizationDirection]) -> Result<Vec<f64>> {
    ensure_evaluated(individual, directions.len())?;
    Ok(directions
        .iter()
        .zip(individual.fitness())
        .map(|(d, &v)| d.orient(v))
        .collect())
}

/// Larger first; `-0.0` and `0.0` tie
fn better_first(a: f64, b: f64) -> Ordering {
    (b + 0.0).total_cmp(&(a + 0.0))
}

/// Orders by one designated slot
pub struct SingleComparator {
    functions: FitnessFunctions,
    slot: usize,
}

impl SingleComparator {
    pub fn new(functions: FitnessFunctions, slot: usize) -> Result<Self> {
        if slot >= functions.len() {
            return Err(EvoTreeError::Configuration(format!(
                "Comparator slot {} but only {} fitness functions registered",
                slot,
                functions.len()
            )));
        }
        Ok(Self { functions, slot })
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl FitnessComparator for SingleComparator {
    fn name(&self) -> &str {
        "single"
    }

    fn functions(&self) -> &FitnessFunctions {
        &self.functions
    }

    fn compare(&self, a: &Individual, b: &Individual) -> Result<Ordering> {
        let direction = self.functions.directions()[self.slot];
        ensure_evaluated(a, self.functions.len())?;
        ensure_evaluated(b, self.functions.len())?;
        Ok(better_first(
            direction.orient(a.fitness()[self.slot]),
            direction.orient(b.fitness()[self.slot]),
        ))
    }
}

/// Orders by `Σ wᵢ · fitnessᵢ`, with minimized slots negated first
pub struct WeightedComparator {
    functions: FitnessFunctions,
    weights: Vec<f64>,
}

impl WeightedComparator {
    pub fn new(functions: FitnessFunctions, weights: Vec<f64>) -> Result<Self> {
        if weights.len() != functions.len() {
            return Err(EvoTreeError::Configuration(format!(
                "{} weights given for {} fitness functions",
                weights.len(),
                functions.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(EvoTreeError::Configuration("Weights must be finite".to_string()));
        }
        Ok(Self { functions, weights })
    }

    pub fn score(&self, individual: &Individual) -> Result<f64> {
        let values = oriented(individual, &self.functions.directions())?;
        Ok(values.iter().zip(&self.weights).map(|(v, w)| v * w).sum())
    }
}

impl FitnessComparator for WeightedComparator {
    fn name(&self) -> &str {
        "weighted"
    }

    fn functions(&self) -> &FitnessFunctions {
        &self.functions
    }

    fn compare(&self, a: &Individual, b: &Individual) -> Result<Ordering> {
        Ok(better_first(self.score(a)?, self.score(b)?))
    }
}

/// Lexicographic order over the slots in registration order
pub struct PriorityComparator {
    functions: FitnessFunctions,
}

impl PriorityComparator {
    pub fn new(functions: FitnessFunctions) -> Result<Self> {
        if functions.is_empty() {
            return Err(EvoTreeError::Configuration(
                "Priority comparator needs at least one fitness function".to_string(),
            ));
        }
        Ok(Self { functions })
    }
}

impl FitnessComparator for PriorityComparator {
    fn name(&self) -> &str {
        "priority"
    }

    fn functions(&self) -> &FitnessFunctions {
        &self.functions
    }

    fn compare(&self, a: &Individual, b: &Individual) -> Result<Ordering> {
        let directions = self.functions.directions();
        let a = oriented(a, &directions)?;
        let b = oriented(b, &directions)?;
        Ok(a.iter()
            .zip(&b)
            .map(|(&x, &y)| better_first(x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal))
    }
}

/// Pareto dominance.
///
/// `compare` only answers for dominated or identical pairs and returns
/// `UnsupportedOperation` for mutually non-dominated ones. Ranking a whole
/// population uses non-dominated sorting with crowding distance instead.
pub struct ParetoComparator {
    functions: FitnessFunctions,
}

impl ParetoComparator {
    pub fn new(functions: FitnessFunctions) -> Result<Self> {
        if functions.is_empty() {
            return Err(EvoTreeError::Configuration(
                "Pareto comparator needs at least one fitness function".to_string(),
            ));
        }
        Ok(Self { functions })
    }

    pub fn ranking(&self, individuals: &[Individual]) -> Result<ParetoRanking> {
        let slots = self.functions.len();
        for individual in individuals {
            ensure_evaluated(individual, slots)?;
        }
        let objectives: Vec<&[f64]> = individuals.iter().map(|i| &i.fitness()[..slots]).collect();
        Ok(ParetoRanking::compute(&objectives, &self.functions.directions()))
    }
}

impl FitnessComparator for ParetoComparator {
    fn name(&self) -> &str {
        "pareto"
    }

    fn functions(&self) -> &FitnessFunctions {
        &self.functions
    }

    fn compare(&self, a: &Individual, b: &Individual) -> Result<Ordering> {
        let slots = self.functions.len();
        ensure_evaluated(a, slots)?;
        ensure_evaluated(b, slots)?;
        let directions = self.functions.directions();
        let (fa, fb) = (&a.fitness()[..slots], &b.fitness()[..slots]);

        if dominates(fa, fb, &directions) {
            Ok(Ordering::Less)
        } else if dominates(fb, fa, &directions) {
            Ok(Ordering::Greater)
        } else if fa == fb {
            Ok(Ordering::Equal)
        } else {
            Err(EvoTreeError::UnsupportedOperation(
                "Pareto comparison of mutually non-dominated individuals".to_string(),
            ))
        }
    }

    fn is_total_order(&self) -> bool {
        false
    }

    fn rank(&self, individuals: &[Individual]) -> Result<Vec<usize>> {
        Ok(self.ranking(individuals)?.order())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::{HeightFitness, MseFitness, SizeFitness};
    use crate::engines::tree::Tree;

    fn scored(values: &[f64]) -> Individual {
        let mut ind = Individual::new(Tree::leaf(0.0), values.len());
        for (slot, &v) in values.iter().enumerate() {
            ind.set_fitness(slot, v);
        }
        ind.unchange();
        ind
    }

    fn two_maximized() -> FitnessFunctions {
        FitnessFunctions::new()
            .with(Box::new(SizeFitness))
            .with(Box::new(HeightFitness))
    }

    #[test]
    fn test_single_respects_direction() {
        let maximize = SingleComparator::new(FitnessFunctions::new().with(Box::new(SizeFitness)), 0).unwrap();
        let minimize = SingleComparator::new(FitnessFunctions::new().with(Box::new(MseFitness)), 0).unwrap();
        let (a, b) = (scored(&[0.9]), scored(&[0.1]));
        assert_eq!(maximize.compare(&a, &b).unwrap(), Ordering::Less);
        assert_eq!(minimize.compare(&a, &b).unwrap(), Ordering::Greater);
        assert_eq!(maximize.compare(&a, &a).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_single_rejects_bad_slot() {
        assert!(SingleComparator::new(two_maximized(), 2).is_err());
    }

    #[test]
    fn test_weighted_sum_and_ties() {
        let cmp = WeightedComparator::new(two_maximized(), vec![1.0, 2.0]).unwrap();
        let (a, b) = (scored(&[2.0, 0.0]), scored(&[0.0, 1.0]));
        assert_eq!(cmp.compare(&a, &b).unwrap(), Ordering::Equal);
        let c = scored(&[0.0, 1.5]);
        assert_eq!(cmp.compare(&c, &a).unwrap(), Ordering::Less);
        assert!(WeightedComparator::new(two_maximized(), vec![1.0]).is_err());
    }

    #[test]
    fn test_signed_zero_scores_tie() {
        let cmp = WeightedComparator::new(two_maximized(), vec![-1.0, -1.0]).unwrap();
        let (a, b) = (scored(&[0.0, 0.0]), scored(&[1.0, -1.0]));
        assert_eq!(cmp.compare(&a, &b).unwrap(), Ordering::Equal);
        assert_eq!(cmp.compare(&b, &a).unwrap(), Ordering::Equal);

        let single = SingleComparator::new(two_maximized(), 0).unwrap();
        assert_eq!(single.compare(&scored(&[-0.0, 1.0]), &scored(&[0.0, 1.0])).unwrap(), Ordering::Equal);

        let priority = PriorityComparator::new(two_maximized()).unwrap();
        let (c, d) = (scored(&[-0.0, 2.0]), scored(&[0.0, 1.0]));
        assert_eq!(priority.compare(&c, &d).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_priority_is_lexicographic() {
        let cmp = PriorityComparator::new(two_maximized()).unwrap();
        let (a, b, c) = (scored(&[1.0, 0.0]), scored(&[0.5, 9.0]), scored(&[1.0, 0.5]));
        assert_eq!(cmp.compare(&a, &b).unwrap(), Ordering::Less);
        assert_eq!(cmp.compare(&c, &a).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_pareto_partial_order() {
        let cmp = ParetoComparator::new(two_maximized()).unwrap();
        let (a, b, c) = (scored(&[1.0, 1.0]), scored(&[0.5, 0.5]), scored(&[2.0, 0.0]));
        assert_eq!(cmp.compare(&a, &b).unwrap(), Ordering::Less);
        assert_eq!(cmp.compare(&b, &a).unwrap(), Ordering::Greater);
        assert_eq!(cmp.compare(&a, &a).unwrap(), Ordering::Equal);
        assert!(matches!(cmp.compare(&a, &c), Err(EvoTreeError::UnsupportedOperation(_))));
        assert!(!cmp.is_total_order());

        let order = cmp.rank(&[b, a, c]).unwrap();
        assert_eq!(order.last(), Some(&0));
    }

    #[test]
    fn test_unevaluated_individual_is_an_error() {
        let cmp = SingleComparator::new(two_maximized(), 0).unwrap();
        let fresh = Individual::new(Tree::leaf(0.0), 2);
        assert!(matches!(
            cmp.compare(&fresh, &scored(&[1.0, 1.0])),
            Err(EvoTreeError::Computation(_))
        ));
        assert!(cmp.rank(&[fresh]).is_err());
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let cmp = SingleComparator::new(two_maximized(), 0).unwrap();
        let pop = vec![scored(&[1.0, 0.0]), scored(&[2.0, 0.0]), scored(&[1.0, 5.0])];
        assert_eq!(cmp.rank(&pop).unwrap(), vec![1, 0, 2]);
    }
}
