//! Hyper-rectangular cells: sampling, statistics, and subdivision.
//!
//! A [`Cell`] owns one box of the search space, the samples drawn inside it,
//! and the statistics computed from them. Each level of the optimizer calls
//! [`Cell::expand`] to turn a competitive cell into children and
//! [`Cell::evaluate`] to sample the children.
//!
//! # Lifecycle
//!
//! 1. Created alive with a sample budget ([`gen_grid`](crate::grid::gen_grid)
//!    or [`Cell::new`]).
//! 2. [`evaluate`](Cell::evaluate) draws `target_samples` new points and
//!    recomputes [`CellStats`].
//! 3. [`expand`](Cell::expand) compares the stats with the global cutoff,
//!    splits the box along its most important axes, hands the existing samples
//!    down to the children, and marks the cell dead. A dead cell never
//!    produces children again.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::gen_grid;
use crate::importance::ImportanceModel;
use crate::objective::Objective;
use crate::variable::Variable;

/// Default next-level sample budget when a cell's mean is exactly zero.
pub const DEFAULT_CV_FALLBACK: u32 = 50;

/// Upper bound on the samples reserved ahead of a draw; larger budgets grow
/// the buffer as values arrive.
const MAX_RESERVE: usize = 4096;

/// One evaluated point.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Coordinates, one per variable.
    pub point: Vec<f64>,
    /// Objective value at `point`.
    pub value: f64,
}

/// Summary statistics of a cell's sample values.
///
/// `min_bound` and `max_bound` widen the observed range by `λ` standard
/// deviations around the mean. They are statistical, not guaranteed, bounds
/// on the objective inside the cell.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellStats {
    /// Smallest sampled value.
    pub min: f64,
    /// `min(min, mean - λ·std)`: optimistic lower bound used for pruning.
    pub min_bound: f64,
    /// `max(max, mean + λ·std)`: pessimistic upper bound, cutoff candidate.
    pub max_bound: f64,
    /// Point where `min` was observed (first occurrence).
    pub best_point: Vec<f64>,
    /// Mean of sampled values.
    pub mean: f64,
    /// Population standard deviation of sampled values.
    pub std: f64,
}

impl CellStats {
    /// Compute stats from `samples`, or `None` if there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(samples: &[Sample], lambda: f64) -> Option<Self> {
        let first = samples.first()?;
        let n = samples.len() as f64;

        let mut best = first;
        let mut max = first.value;
        let mut sum = 0.0;
        for s in samples {
            if s.value < best.value {
                best = s;
            }
            max = max.max(s.value);
            sum += s.value;
        }
        let mean = sum / n;
        let std = (samples
            .iter()
            .map(|s| (s.value - mean).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();

        Some(Self {
            min: best.value,
            min_bound: best.value.min(mean - lambda * std),
            max_bound: max.max(mean + lambda * std),
            best_point: best.point.clone(),
            mean,
            std,
        })
    }

    /// Coefficient of variation in percent, `round(std / |mean| · 100)`.
    ///
    /// Returns `fallback` when the mean is exactly zero.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::float_cmp
    )]
    pub fn coefficient_of_variation(&self, fallback: u32) -> u32 {
        if self.mean == 0.0 {
            return fallback;
        }
        // Saturating float-to-int conversion; NaN maps to zero.
        (self.std / self.mean.abs() * 100.0).round() as u32
    }
}

/// Inputs to [`Cell::expand`] shared by every cell of a level.
#[derive(Clone, Copy, Debug)]
pub struct ExpandParams {
    /// Global cutoff: cells whose `min_bound` exceeds it are pruned.
    pub cutoff: f64,
    /// Greedy axis-doubling rounds per expansion.
    pub splits_per_level: u32,
    /// Sample budget used when a cell's mean is zero.
    pub cv_fallback: u32,
    /// Upper limit on a child's sample budget, if any.
    pub max_cell_samples: Option<u32>,
}

impl ExpandParams {
    /// Parameters with the default fallback and no budget cap.
    #[must_use]
    pub fn new(cutoff: f64, splits_per_level: u32) -> Self {
        Self {
            cutoff,
            splits_per_level,
            cv_fallback: DEFAULT_CV_FALLBACK,
            max_cell_samples: None,
        }
    }

    fn child_budget(&self, stats: &CellStats) -> u32 {
        let cv = stats.coefficient_of_variation(self.cv_fallback);
        self.max_cell_samples.map_or(cv, |cap| cv.min(cap))
    }
}

/// A hyper-rectangular region of the search space.
#[derive(Clone, Debug)]
pub struct Cell {
    variables: Vec<Variable>,
    target_samples: u32,
    children: Vec<Cell>,
    alive: bool,
    samples: Vec<Sample>,
    stats: Option<CellStats>,
}

impl Cell {
    /// Creates an alive cell over `variables` that will draw
    /// `target_samples` points per evaluation.
    #[must_use]
    pub fn new(variables: Vec<Variable>, target_samples: u32) -> Self {
        Self {
            variables,
            target_samples,
            children: Vec::new(),
            alive: true,
            samples: Vec::new(),
            stats: None,
        }
    }

    /// The cell's box, one interval per axis.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Number of axes.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.variables.len()
    }

    /// Points drawn per call to [`sample`](Self::sample).
    #[must_use]
    pub fn target_samples(&self) -> u32 {
        self.target_samples
    }

    /// `false` once the cell has been expanded or found terminal.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Samples drawn in, or inherited by, this cell.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Stats over [`samples`](Self::samples); `None` until evaluated.
    #[must_use]
    pub fn stats(&self) -> Option<&CellStats> {
        self.stats.as_ref()
    }

    /// Children stored by [`expand_in_place`](Self::expand_in_place).
    #[must_use]
    pub fn children(&self) -> &[Cell] {
        &self.children
    }

    /// `true` if every coordinate of `point` lies in the closed box.
    #[must_use]
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(point)
                .all(|(v, &x)| v.contains(x))
    }

    /// Draw `target_samples` points and evaluate each once.
    ///
    /// Continuous axes are drawn uniformly, discrete axes uniformly and then
    /// rounded. Existing samples are kept. Dead cells draw nothing.
    ///
    /// Returns the number of objective evaluations performed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Objective`] on the first failed evaluation.
    pub fn sample<O>(&mut self, objective: &O, rng: &mut fastrand::Rng) -> Result<usize>
    where
        O: Objective + ?Sized,
    {
        if !self.alive {
            return Ok(0);
        }
        let n = self.target_samples as usize;
        self.samples.reserve(n.min(MAX_RESERVE));
        for _ in 0..n {
            let point: Vec<f64> = self.variables.iter().map(|v| v.draw(rng)).collect();
            let value = objective
                .evaluate(&point)
                .map_err(|e| Error::Objective(e.to_string()))?;
            self.samples.push(Sample { point, value });
        }
        Ok(n)
    }

    /// Recompute [`stats`](Self::stats) from the current samples.
    pub fn compute_stats(&mut self, lambda: f64) {
        self.stats = CellStats::from_samples(&self.samples, lambda);
    }

    /// [`sample`](Self::sample) followed by
    /// [`compute_stats`](Self::compute_stats).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Objective`] on the first failed evaluation.
    pub fn evaluate<O>(
        &mut self,
        objective: &O,
        lambda: f64,
        rng: &mut fastrand::Rng,
    ) -> Result<usize>
    where
        O: Objective + ?Sized,
    {
        let drawn = self.sample(objective, rng)?;
        self.compute_stats(lambda);
        Ok(drawn)
    }

    /// Assign per-axis `divs` from the importance model.
    ///
    /// Axes at their resolution floor get zero importance. If every axis is at
    /// the floor, or the cell has no samples, the cell becomes terminal and
    /// the divisions are left untouched. Otherwise, starting from one
    /// division per axis, the most important axis is doubled
    /// `splits_per_level` times, halving its importance each time and
    /// retiring it once a further split would go below `min_width`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the model returns the wrong
    /// number of importances.
    pub fn subdivide(
        &mut self,
        splits_per_level: u32,
        model: &dyn ImportanceModel,
        rng: &mut fastrand::Rng,
    ) -> Result<()> {
        if self.samples.is_empty() || self.variables.iter().all(Variable::at_resolution_floor) {
            self.alive = false;
            return Ok(());
        }

        let (points, values): (Vec<Vec<f64>>, Vec<f64>) = self
            .samples
            .iter()
            .map(|s| (s.point.clone(), s.value))
            .unzip();
        let mut importances = model.fit(&points, &values, rng);
        if importances.len() != self.dims() {
            return Err(Error::DimensionMismatch {
                expected: self.dims(),
                got: importances.len(),
            });
        }

        for (imp, var) in importances.iter_mut().zip(&self.variables) {
            if var.at_resolution_floor() || !imp.is_finite() || *imp < 0.0 {
                *imp = 0.0;
            }
        }

        let mut divs = vec![1_u32; self.dims()];
        for _ in 0..splits_per_level {
            let (axis, top) = argmax(&importances);
            if top <= 0.0 {
                break;
            }
            divs[axis] = divs[axis].saturating_mul(2);
            importances[axis] /= 2.0;

            let var = &self.variables[axis];
            if var.width() / f64::from(divs[axis]) < var.min_width {
                importances[axis] = 0.0;
            }
        }

        for (var, d) in self.variables.iter_mut().zip(divs) {
            var.divs = d;
        }
        Ok(())
    }

    /// Produce this cell's children for the next level.
    ///
    /// A cell whose `min_bound` is at or below `params.cutoff` is split with
    /// [`subdivide`](Self::subdivide) into a grid whose cells each get a
    /// sample budget equal to this cell's coefficient of variation. Existing
    /// samples are moved to the first child whose box contains them, and a
    /// child that inherits anything has its budget reduced by one (never
    /// below one). Pruned, converged (`CV == 0`), unevaluated, or fully
    /// resolved cells yield no children.
    ///
    /// The cell is dead afterwards and keeps its stats but no samples once it
    /// has been split; calling `expand` again returns nothing.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::DimensionMismatch`] from the importance model.
    pub fn expand(
        &mut self,
        params: &ExpandParams,
        model: &dyn ImportanceModel,
        rng: &mut fastrand::Rng,
    ) -> Result<Vec<Cell>> {
        if !self.alive {
            return Ok(Vec::new());
        }

        for var in &mut self.variables {
            if var.at_resolution_floor() {
                var.divs = 1;
            }
        }

        let budget = self
            .stats
            .as_ref()
            .filter(|s| s.min_bound <= params.cutoff)
            .map_or(0, |s| params.child_budget(s));

        let mut children = Vec::new();
        if budget > 0 {
            self.subdivide(params.splits_per_level, model, rng)?;
            children = gen_grid(budget, &self.variables, self.alive);
            self.hand_down_samples(&mut children);
        }

        self.alive = false;
        Ok(children)
    }

    /// Like [`expand`](Self::expand), but keeps the children in this cell.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::DimensionMismatch`] from the importance model.
    pub fn expand_in_place(
        &mut self,
        params: &ExpandParams,
        model: &dyn ImportanceModel,
        rng: &mut fastrand::Rng,
    ) -> Result<&[Cell]> {
        let children = self.expand(params, model, rng)?;
        if !children.is_empty() {
            self.children = children;
        }
        Ok(&self.children)
    }

    /// Move each sample to the first child containing it.
    fn hand_down_samples(&mut self, children: &mut [Cell]) {
        let mut inherited = vec![false; children.len()];
        for sample in core::mem::take(&mut self.samples) {
            if let Some(idx) = children.iter().position(|c| c.contains(&sample.point)) {
                children[idx].samples.push(sample);
                inherited[idx] = true;
            }
        }
        for (child, got) in children.iter_mut().zip(inherited) {
            if got {
                child.target_samples = child.target_samples.saturating_sub(1).max(1);
            }
        }
    }
}

/// Index and value of the largest entry; the first one wins ties.
fn argmax(values: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, &v) in values.iter().enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best
}
