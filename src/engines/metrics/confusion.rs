// src/engines/metrics/confusion.rs
use crate::data::Dataset;
use crate::engines::tree::Tree;
use serde::{Deserialize, Serialize};

/// How per-class confusion metrics are folded into one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Averaging {
    /// Mean of per-class values weighted by class support
    Weighted,
    /// Plain mean of per-class values
    Unweighted,
    /// Metric computed once over the summed one-vs-rest counts
    Total,
}

/// One-vs-rest counts for a single class
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClassCounts {
    pub tp: f64,
    pub fp: f64,
    pub tn: f64,
    pub fn_: f64,
}

impl ClassCounts {
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn specificity(&self) -> f64 {
        ratio(self.tn, self.tn + self.fp)
    }

    pub fn prevalence(&self) -> f64 {
        ratio(self.tp + self.fn_, self.tp + self.fp + self.tn + self.fn_)
    }

    fn add(&mut self, other: &ClassCounts) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.tn += other.tn;
        self.fn_ += other.fn_;
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Square matrix of `actual x predicted` record counts, plus a per-class
/// tally of predictions that name no class at all
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    classes: usize,
    counts: Vec<usize>,
    unmatched: Vec<usize>,
}

impl ConfusionMatrix {
    pub fn new(classes: usize) -> Self {
        Self {
            classes,
            counts: vec![0; classes * classes],
            unmatched: vec![0; classes],
        }
    }

    /// Classifies every record of `dataset` with `tree`.
    /// Records with a missing class are skipped.
    pub fn from_tree(tree: &Tree, dataset: &dyn Dataset) -> Self {
        let mut matrix = Self::new(dataset.num_classes());
        for record in 0..dataset.num_records() {
            let actual = dataset.class_of(record);
            if actual.is_nan() {
                continue;
            }
            matrix.record(actual, tree.classify(dataset, record));
        }
        matrix
    }

    /// Adds one observation. A prediction that is not an integral class
    /// index is a miss; an actual value that is not one is ignored.
    pub fn record(&mut self, actual: f64, predicted: f64) {
        let Some(a) = self.index(actual) else {
            return;
        };
        match self.index(predicted) {
            Some(p) => self.counts[a * self.classes + p] += 1,
            None => self.unmatched[a] += 1,
        }
    }

    fn index(&self, value: f64) -> Option<usize> {
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < self.classes as f64 {
            Some(value as usize)
        } else {
            None
        }
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn count(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual * self.classes + predicted]
    }

    /// Predictions for records of `actual` that named no class
    pub fn unmatched(&self, actual: usize) -> usize {
        self.unmatched[actual]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.unmatched.iter().sum::<usize>()
    }

    pub fn correct(&self) -> usize {
        (0..self.classes).map(|c| self.count(c, c)).sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct() as f64, self.total() as f64)
    }

    /// Records whose actual class is `class`
    pub fn support(&self, class: usize) -> usize {
        (0..self.classes).map(|p| self.count(class, p)).sum::<usize>() + self.unmatched[class]
    }

    pub fn counts_for(&self, class: usize) -> ClassCounts {
        let tp = self.count(class, class);
        let predicted: usize = (0..self.classes).map(|a| self.count(a, class)).sum();
        let actual = self.support(class);
        let total = self.total();
        ClassCounts {
            tp: tp as f64,
            fp: (predicted - tp) as f64,
            fn_: (actual - tp) as f64,
            tn: (total + tp - predicted - actual) as f64,
        }
    }

    /// Folds `metric` over all classes with the given averaging policy
    pub fn average<F>(&self, averaging: Averaging, metric: F) -> f64
    where
        F: Fn(&ClassCounts) -> f64,
    {
        if self.classes == 0 {
            return 0.0;
        }
        match averaging {
            Averaging::Unweighted => {
                (0..self.classes)
                    .map(|c| metric(&self.counts_for(c)))
                    .sum::<f64>()
                    / self.classes as f64
            }
            Averaging::Weighted => {
                let total = self.total() as f64;
                if total == 0.0 {
                    return 0.0;
                }
                (0..self.classes)
                    .map(|c| metric(&self.counts_for(c)) * self.support(c) as f64 / total)
                    .sum()
            }
            Averaging::Total => {
                let mut sum = ClassCounts::default();
                for c in 0..self.classes {
                    sum.add(&self.counts_for(c));
                }
                metric(&sum)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> ConfusionMatrix {
        // actual 0: 3 right, 1 wrong; actual 1: 2 right, 2 wrong
        let mut m = ConfusionMatrix::new(2);
        for (a, p) in [(0, 0), (0, 0), (0, 0), (0, 1), (1, 1), (1, 1), (1, 0), (1, 0)] {
            m.record(a as f64, p as f64);
        }
        m
    }

    #[test]
    fn test_counts_for_class() {
        let m = matrix();
        let c = m.counts_for(1);
        assert_eq!(c, ClassCounts { tp: 2.0, fp: 1.0, tn: 3.0, fn_: 2.0 });
        assert!((c.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((c.recall() - 0.5).abs() < 1e-12);
        assert!((c.specificity() - 0.75).abs() < 1e-12);
        assert!((c.prevalence() - 0.5).abs() < 1e-12);
        assert_eq!(m.accuracy(), 5.0 / 8.0);
    }

    #[test]
    fn test_averaging_policies() {
        let m = matrix();
        let unweighted = m.average(Averaging::Unweighted, ClassCounts::recall);
        assert!((unweighted - (0.75 + 0.5) / 2.0).abs() < 1e-12);
        // equal support, so weighted equals unweighted
        let weighted = m.average(Averaging::Weighted, ClassCounts::recall);
        assert!((weighted - unweighted).abs() < 1e-12);
        // summed one-vs-rest recall equals accuracy
        let total = m.average(Averaging::Total, ClassCounts::recall);
        assert!((total - m.accuracy()).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_predictions_are_misses() {
        let mut m = ConfusionMatrix::new(2);
        m.record(1.0, 1.0);
        m.record(1.0, 1.4);
        m.record(1.0, 7.0);
        m.record(1.0, -1.0);
        m.record(1.0, f64::NAN);
        m.record(0.0, 0.0);
        assert_eq!(m.count(1, 1), 1);
        assert_eq!(m.unmatched(1), 4);
        assert_eq!(m.total(), 6);
        assert_eq!(m.accuracy(), 2.0 / 6.0);

        let c = m.counts_for(1);
        assert_eq!(c, ClassCounts { tp: 1.0, fp: 0.0, tn: 1.0, fn_: 4.0 });
        let other = m.counts_for(0);
        assert_eq!(other, ClassCounts { tp: 1.0, fp: 0.0, tn: 5.0, fn_: 0.0 });
    }

    #[test]
    fn test_invalid_actual_is_ignored() {
        let mut m = ConfusionMatrix::new(2);
        m.record(2.0, 1.0);
        m.record(0.5, 0.0);
        assert_eq!(m.total(), 0);
    }

    #[test]
    fn test_empty_matrix() {
        let m = ConfusionMatrix::new(3);
        assert_eq!(m.accuracy(), 0.0);
        assert_eq!(m.average(Averaging::Weighted, ClassCounts::precision), 0.0);
    }
}
