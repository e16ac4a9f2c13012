/// Pareto utilities for multi-objective fitness vectors
/// Implements NSGA-II style fast non-dominated sorting and crowding distance
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Defines whether a fitness value should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationDirection {
    Maximize,
    Minimize,
}

impl OptimizationDirection {
    /// Maps `value` so that larger is always better
    pub fn orient(&self, value: f64) -> f64 {
        match self {
            OptimizationDirection::Maximize => value,
            OptimizationDirection::Minimize => -value,
        }
    }
}

/// Check if objectives A dominate objectives B
/// A dominates B if A is no worse than B in all objectives and strictly better in at least one
pub fn dominates(a_objectives: &[f64], b_objectives: &[f64], directions: &[OptimizationDirection]) -> bool {
    if a_objectives.len() != b_objectives.len() || a_objectives.len() != directions.len() {
        return false;
    }

    let mut at_least_one_better = false;

    for i in 0..a_objectives.len() {
        let a_val = directions[i].orient(a_objectives[i]);
        let b_val = directions[i].orient(b_objectives[i]);

        if b_val > a_val {
            return false;
        }
        if a_val > b_val {
            at_least_one_better = true;
        }
    }

    at_least_one_better
}

/// Front rank and crowding distance of every member of a population
#[derive(Debug, Clone, PartialEq)]
pub struct ParetoRanking {
    /// 0 = best front
    pub rank: Vec<usize>,
    pub crowding_distance: Vec<f64>,
    pub fronts: Vec<Vec<usize>>,
}

impl ParetoRanking {
    pub fn compute(objectives: &[&[f64]], directions: &[OptimizationDirection]) -> Self {
        let (fronts, rank) = fast_non_dominated_sort(objectives, directions);
        let mut crowding_distance = vec![0.0; objectives.len()];
        for front in &fronts {
            calculate_crowding_distance(objectives, front, &mut crowding_distance);
        }
        Self {
            rank,
            crowding_distance,
            fronts,
        }
    }

    /// Crowded comparison: lower rank first, then larger crowding distance
    pub fn crowded_cmp(&self, a: usize, b: usize) -> Ordering {
        self.rank[a].cmp(&self.rank[b]).then_with(|| {
            self.crowding_distance[b]
                .partial_cmp(&self.crowding_distance[a])
                .unwrap_or(Ordering::Equal)
        })
    }

    /// Indices ordered best first, ties kept in input order
    pub fn order(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.rank.len()).collect();
        indices.sort_by(|&a, &b| self.crowded_cmp(a, b));
        indices
    }
}

/// Fast non-dominated sorting (NSGA-II algorithm)
/// Returns the fronts (0 = best) and the front rank of every index
pub fn fast_non_dominated_sort(
    objectives: &[&[f64]],
    directions: &[OptimizationDirection],
) -> (Vec<Vec<usize>>, Vec<usize>) {
    let n = objectives.len();

    // domination_count: how many individuals dominate i
    // dominated_solutions: indices i dominates
    let mut domination_count = vec![0usize; n];
    let mut dominated_solutions: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut rank = vec![0usize; n];
    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut first_front = Vec::new();

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if dominates(objectives[i], objectives[j], directions) {
                dominated_solutions[i].push(j);
            } else if dominates(objectives[j], objectives[i], directions) {
                domination_count[i] += 1;
            }
        }
        if domination_count[i] == 0 {
            first_front.push(i);
        }
    }

    if first_front.is_empty() {
        return (fronts, rank);
    }
    fronts.push(first_front);

    let mut front_index = 0;
    while front_index < fronts.len() {
        let mut next_front = Vec::new();
        for &i in &fronts[front_index] {
            for &j in &dominated_solutions[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    rank[j] = front_index + 1;
                    next_front.push(j);
                }
            }
        }
        if !next_front.is_empty() {
            next_front.sort_unstable();
            fronts.push(next_front);
        }
        front_index += 1;
    }

    (fronts, rank)
}

/// Crowding distance of the members of one front, written into `distance`
/// Higher values indicate more isolated individuals
pub fn calculate_crowding_distance(objectives: &[&[f64]], front: &[usize], distance: &mut [f64]) {
    let front_size = front.len();

    if front_size <= 2 {
        for &idx in front {
            distance[idx] = f64::INFINITY;
        }
        return;
    }

    for &idx in front {
        distance[idx] = 0.0;
    }

    let num_objectives = objectives[front[0]].len();
    for obj in 0..num_objectives {
        let mut sorted: Vec<usize> = front.to_vec();
        sorted.sort_by(|&a, &b| objectives[a][obj].total_cmp(&objectives[b][obj]));

        distance[sorted[0]] = f64::INFINITY;
        distance[sorted[front_size - 1]] = f64::INFINITY;

        let min_val = objectives[sorted[0]][obj];
        let max_val = objectives[sorted[front_size - 1]][obj];
        let range = max_val - min_val;
        if range.abs() < 1e-10 {
            continue;
        }

        for i in 1..(front_size - 1) {
            let prev_val = objectives[sorted[i - 1]][obj];
            let next_val = objectives[sorted[i + 1]][obj];
            distance[sorted[i]] += (next_val - prev_val) / range;
        }
    }
}
