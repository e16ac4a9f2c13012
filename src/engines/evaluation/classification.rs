use super::fitness::FitnessFunction;
use super::pareto::OptimizationDirection;
use crate::data::Dataset;
use crate::engines::metrics::{Averaging, ClassCounts, ConfusionMatrix};
use crate::engines::tree::Tree;
use crate::error::{EvoTreeError, Result};
use crate::functions::ParamMap;
use crate::types::TargetSupport;

fn require_nominal(name: &str, dataset: &dyn Dataset) -> Result<()> {
    if !dataset.class_kind().is_nominal() {
        return Err(EvoTreeError::Incompatible(format!(
            "'{}' needs a nominal class attribute",
            name
        )));
    }
    Ok(())
}

/// Fraction of correctly classified training records
#[derive(Debug, Clone, Copy, Default)]
pub struct AccuracyFitness;

impl FitnessFunction for AccuracyFitness {
    fn name(&self) -> &str {
        "accuracy"
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::Maximize
    }

    fn target_support(&self) -> TargetSupport {
        TargetSupport::Nominal
    }

    fn evaluate(&self, tree: &Tree, dataset: &dyn Dataset) -> Result<f64> {
        require_nominal(self.name(), dataset)?;
        Ok(ConfusionMatrix::from_tree(tree, dataset).accuracy())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfusionMetric {
    Precision,
    Recall,
    Specificity,
    Prevalence,
    TruePositives,
    FalsePositives,
    TrueNegatives,
    FalseNegatives,
}

impl ConfusionMetric {
    pub fn name(&self) -> &'static str {
        match self {
            ConfusionMetric::Precision => "precision",
            ConfusionMetric::Recall => "recall",
            ConfusionMetric::Specificity => "specificity",
            ConfusionMetric::Prevalence => "prevalence",
            ConfusionMetric::TruePositives => "tp",
            ConfusionMetric::FalsePositives => "fp",
            ConfusionMetric::TrueNegatives => "tn",
            ConfusionMetric::FalseNegatives => "fn",
        }
    }

    fn of(&self, counts: &ClassCounts) -> f64 {
        match self {
            ConfusionMetric::Precision => counts.precision(),
            ConfusionMetric::Recall => counts.recall(),
            ConfusionMetric::Specificity => counts.specificity(),
            ConfusionMetric::Prevalence => counts.prevalence(),
            ConfusionMetric::TruePositives => counts.tp,
            ConfusionMetric::FalsePositives => counts.fp,
            ConfusionMetric::TrueNegatives => counts.tn,
            ConfusionMetric::FalseNegatives => counts.fn_,
        }
    }

    fn direction(&self) -> OptimizationDirection {
        match self {
            ConfusionMetric::FalsePositives | ConfusionMetric::FalseNegatives => {
                OptimizationDirection::Minimize
            }
            _ => OptimizationDirection::Maximize,
        }
    }
}

/// Which class a confusion metric is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfusionTarget {
    Class(usize),
    Average(Averaging),
}

impl Default for ConfusionTarget {
    fn default() -> Self {
        ConfusionTarget::Average(Averaging::Weighted)
    }
}

/// Confusion-matrix metric for one class or averaged over all classes.
///
/// Parameters: `AVERAGE WEIGHTED|UNWEIGHTED|TOTAL` or `INDEX <class>`.
/// An explicit `INDEX` wins over `AVERAGE`.
#[derive(Debug, Clone)]
pub struct ConfusionFitness {
    metric: ConfusionMetric,
    target: ConfusionTarget,
}

impl ConfusionFitness {
    pub fn new(metric: ConfusionMetric) -> Self {
        Self {
            metric,
            target: ConfusionTarget::default(),
        }
    }

    pub fn with_target(mut self, target: ConfusionTarget) -> Self {
        self.target = target;
        self
    }

    pub fn target(&self) -> ConfusionTarget {
        self.target
    }
}

impl FitnessFunction for ConfusionFitness {
    fn name(&self) -> &str {
        self.metric.name()
    }

    fn direction(&self) -> OptimizationDirection {
        self.metric.direction()
    }

    fn target_support(&self) -> TargetSupport {
        TargetSupport::Nominal
    }

    fn evaluate(&self, tree: &Tree, dataset: &dyn Dataset) -> Result<f64> {
        require_nominal(self.name(), dataset)?;
        let matrix = ConfusionMatrix::from_tree(tree, dataset);
        match self.target {
            ConfusionTarget::Class(class) => {
                if class >= matrix.classes() {
                    return Err(EvoTreeError::DataShape(format!(
                        "'{}' targets class {} but the dataset has {} classes",
                        self.name(),
                        class,
                        matrix.classes()
                    )));
                }
                Ok(self.metric.of(&matrix.counts_for(class)))
            }
            ConfusionTarget::Average(averaging) => Ok(matrix.average(averaging, |c| self.metric.of(c))),
        }
    }

    fn set_params(&mut self, params: &str) -> Result<()> {
        let map = ParamMap::parse(params)?;
        map.ensure_known(&["AVERAGE", "INDEX"])?;

        self.target = ConfusionTarget::default();
        if let Some(average) = map.get("AVERAGE") {
            let averaging = match average.to_uppercase().as_str() {
                "WEIGHTED" => Averaging::Weighted,
                "UNWEIGHTED" => Averaging::Unweighted,
                "TOTAL" => Averaging::Total,
                other => {
                    return Err(EvoTreeError::Configuration(format!(
                        "Unknown averaging policy '{}'",
                        other
                    )))
                }
            };
            self.target = ConfusionTarget::Average(averaging);
        }
        if let Some(index) = map.get_usize("INDEX")? {
            self.target = ConfusionTarget::Class(index);
        }
        Ok(())
    }

    fn params(&self) -> String {
        match self.target {
            ConfusionTarget::Class(class) => format!("INDEX {}", class),
            ConfusionTarget::Average(Averaging::Weighted) => "AVERAGE WEIGHTED".to_string(),
            ConfusionTarget::Average(Averaging::Unweighted) => "AVERAGE UNWEIGHTED".to_string(),
            ConfusionTarget::Average(Averaging::Total) => "AVERAGE TOTAL".to_string(),
        }
    }
}
