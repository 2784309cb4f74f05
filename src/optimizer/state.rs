use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::reduce::LevelSummary;

/// Snapshot handed to [`Objective::after_level`](crate::Objective::after_level)
/// after each level.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelReport {
    /// 1-based level index.
    pub level: usize,
    /// Best value found so far (all levels).
    pub best_value: f64,
    /// Point of `best_value`.
    pub best_point: Vec<f64>,
    /// Smallest value sampled in this level.
    pub level_min: f64,
    /// Cutoff that will prune the next level.
    pub cutoff: f64,
    /// Number of active cells in this level.
    pub n_cells: usize,
    /// Objective evaluations performed in this level.
    pub evaluations: usize,
    /// Wall time of the level (expand, evaluate, reduce).
    pub elapsed: Duration,
}

/// Outcome of an optimization run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationResult {
    /// Smallest objective value observed.
    pub best_value: f64,
    /// Point where `best_value` was observed.
    pub best_point: Vec<f64>,
    /// Final cutoff.
    pub cutoff: f64,
    /// Best value after the seed batch and after each level; never increases.
    pub min_values_history: Vec<f64>,
    /// Cutoff after the seed batch and after each level.
    pub cutoff_history: Vec<f64>,
    /// Objective evaluations of the seed batch and of each level.
    pub samples_per_level: Vec<usize>,
    /// Active cells of the seed batch (one) and of each level.
    pub cells_per_level: Vec<usize>,
    /// Levels that ran to completion.
    pub levels_completed: usize,
}

impl OptimizationResult {
    /// Total objective evaluations across the run.
    #[must_use]
    pub fn total_evaluations(&self) -> usize {
        self.samples_per_level.iter().sum()
    }

    /// Serialize the result as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if a value cannot be encoded.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the result as pretty-printed JSON to `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    #[cfg(feature = "serde")]
    pub fn write_json(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(std::io::Error::other)
    }
}

/// Run-wide state owned by the orchestrator.
#[derive(Debug)]
pub(crate) struct GlobalState {
    pub(crate) current_min: f64,
    pub(crate) current_min_sample: Vec<f64>,
    pub(crate) cutoff: f64,
    min_values_history: Vec<f64>,
    cutoff_history: Vec<f64>,
    samples_per_level: Vec<usize>,
    cells_per_level: Vec<usize>,
}

impl GlobalState {
    /// State after the root cell's seed batch.
    pub(crate) fn seed(root: LevelSummary, evaluations: usize) -> Self {
        Self {
            current_min: root.min,
            cutoff: root.max_bound,
            min_values_history: vec![root.min],
            cutoff_history: vec![root.max_bound],
            samples_per_level: vec![evaluations],
            cells_per_level: vec![1],
            current_min_sample: root.best_point,
        }
    }

    /// Fold one level's summary in. The minimum and cutoff only move down.
    pub(crate) fn absorb(&mut self, level: &LevelSummary, evaluations: usize, cells: usize) {
        if level.min < self.current_min {
            self.current_min = level.min;
            self.current_min_sample.clone_from(&level.best_point);
        }
        if level.max_bound < self.cutoff {
            self.cutoff = level.max_bound;
        }
        self.min_values_history.push(self.current_min);
        self.cutoff_history.push(self.cutoff);
        self.samples_per_level.push(evaluations);
        self.cells_per_level.push(cells);
    }

    pub(crate) fn report(
        &self,
        level: usize,
        level_min: f64,
        n_cells: usize,
        evaluations: usize,
        elapsed: Duration,
    ) -> LevelReport {
        LevelReport {
            level,
            best_value: self.current_min,
            best_point: self.current_min_sample.clone(),
            level_min,
            cutoff: self.cutoff,
            n_cells,
            evaluations,
            elapsed,
        }
    }

    pub(crate) fn into_result(self, levels_completed: usize) -> OptimizationResult {
        OptimizationResult {
            best_value: self.current_min,
            best_point: self.current_min_sample,
            cutoff: self.cutoff,
            min_values_history: self.min_values_history,
            cutoff_history: self.cutoff_history,
            samples_per_level: self.samples_per_level,
            cells_per_level: self.cells_per_level,
            levels_completed,
        }
    }
}
