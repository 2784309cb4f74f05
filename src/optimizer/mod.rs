//! The level-by-level orchestrator.
//!
//! An [`Optimizer`] runs the state machine
//!
//! ```text
//! INIT ─▶ (EXPAND ─▶ EVALUATE ─▶ REDUCE) × n_levels ─▶ DONE
//!            │ empty grid
//!            └──────────────────────────────────────▶ DONE
//! ```
//!
//! - **INIT** samples a root cell over the whole domain and seeds the best
//!   value, best point, and cutoff from its stats.
//! - **EXPAND** calls [`Cell::expand`] on every active cell; the children, in
//!   parent order, become the next grid.
//! - **EVALUATE** calls [`Cell::evaluate`] on every new cell.
//! - **REDUCE** folds the cell stats with
//!   [`reduce_level`](crate::reduce::reduce_level) and updates the run state.
//!
//! Cells of one phase run concurrently: with rayon in
//! [`optimize`](Optimizer::optimize) (feature `parallel`, on by default), and
//! as blocking tokio tasks in `optimize_async` (feature `async`). Every cell
//! task gets its own generator, forked in grid order from the run's master
//! generator before dispatch, so a seeded run gives the same result in every
//! executor.

#[cfg(feature = "async")]
mod async_impl;
mod builder;
mod state;

use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub use builder::{
    DEFAULT_LAMBDA_PRUNE, DEFAULT_ROOT_SAMPLES, DEFAULT_SPLITS_PER_LEVEL, OptimizerBuilder,
};
pub(crate) use state::GlobalState;
pub use state::{LevelReport, OptimizationResult};

use crate::cell::{Cell, ExpandParams};
use crate::error::{Error, Result};
use crate::importance::ImportanceModel;
use crate::objective::Objective;
use crate::reduce::{LevelSummary, reduce_level};
use crate::rng_util;
use crate::variable::Variable;

/// Settings shared by every level of a run.
#[derive(Clone, Copy, Debug)]
struct OptimizerConfig {
    splits_per_level: u32,
    lambda_prune: f64,
    root_samples: u32,
    cv_fallback: u32,
    max_cell_samples: Option<u32>,
    seed: Option<u64>,
}

/// Adaptive multi-level cell-partitioning minimizer.
///
/// # Examples
///
/// ```
/// use cellopt::prelude::*;
///
/// let optimizer = Optimizer::builder().seed(3).build().unwrap();
/// let vars = vec![
///     Variable::continuous(-5.0, 5.0).with_min_width(0.01),
///     Variable::continuous(-5.0, 5.0).with_min_width(0.01),
/// ];
///
/// let result = optimizer
///     .optimize(4, vars, |x: &[f64]| {
///         Ok::<_, Error>((x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2))
///     })
///     .unwrap();
///
/// assert!(result.best_value < 1.0);
/// assert_eq!(result.min_values_history.len(), result.levels_completed + 1);
/// ```
pub struct Optimizer {
    config: OptimizerConfig,
    model: Arc<dyn ImportanceModel>,
    #[cfg(feature = "async")]
    concurrency: usize,
}

impl Optimizer {
    /// Return a builder with default settings.
    #[must_use]
    pub fn builder() -> OptimizerBuilder {
        OptimizerBuilder::new()
    }

    /// Greedy axis-doubling rounds per cell and level.
    #[must_use]
    pub fn splits_per_level(&self) -> u32 {
        self.config.splits_per_level
    }

    /// Pruning width in standard deviations.
    #[must_use]
    pub fn lambda_prune(&self) -> f64 {
        self.config.lambda_prune
    }

    /// Sample budget of the root cell.
    #[must_use]
    pub fn root_samples(&self) -> u32 {
        self.config.root_samples
    }

    /// Run up to `n_levels` levels over the box described by `variables`.
    ///
    /// Stops early when no cell produces children. `n_levels == 0` returns
    /// the stats of the root cell's seed batch.
    ///
    /// # Errors
    ///
    /// - [`Error::NoVariables`] or a validation error from
    ///   [`Variable::validate`] if the search space is malformed.
    /// - [`Error::Objective`] if any evaluation fails; the run is aborted.
    /// - [`Error::DimensionMismatch`] if the importance model returns the
    ///   wrong number of scores.
    pub fn optimize<O>(
        &self,
        n_levels: usize,
        variables: Vec<Variable>,
        objective: O,
    ) -> Result<OptimizationResult>
    where
        O: Objective + Sync,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("optimize", n_levels, dims = variables.len()).entered();

        let (mut root, mut rng) = self.init(variables)?;
        let mut root_rng = rng_util::fork_n(&mut rng, 1);
        let drawn = root.evaluate(&objective, self.config.lambda_prune, &mut root_rng[0])?;
        let mut state = GlobalState::seed(root_summary(&root)?, drawn);
        trace_info!(
            best_value = state.current_min,
            cutoff = state.cutoff,
            evaluations = drawn,
            "root cell evaluated"
        );

        let mut grid = vec![root];
        let mut levels_completed = 0;

        for level in 1..=n_levels {
            #[cfg(feature = "tracing")]
            let _level_span = tracing::debug_span!("level", level).entered();
            let started = Instant::now();

            let params = self.expand_params(state.cutoff);
            let rngs = rng_util::fork_n(&mut rng, grid.len());
            grid = expand_all(grid, &params, self.model.as_ref(), rngs)?;
            if grid.is_empty() {
                trace_info!(level, "no cell left to expand");
                break;
            }

            let rngs = rng_util::fork_n(&mut rng, grid.len());
            let evaluations =
                evaluate_all(&mut grid, &objective, self.config.lambda_prune, rngs)?;

            let summary = level_summary(&grid)?;
            state.absorb(&summary, evaluations, grid.len());
            levels_completed = level;

            let report =
                state.report(level, summary.min, grid.len(), evaluations, started.elapsed());
            log_level(&report);
            if objective.after_level(&report).is_break() {
                trace_debug!(level, "stopped by objective");
                break;
            }
        }

        Ok(state.into_result(levels_completed))
    }

    /// Validate the search space and create the root cell and master rng.
    fn init(&self, variables: Vec<Variable>) -> Result<(Cell, fastrand::Rng)> {
        if variables.is_empty() {
            return Err(Error::NoVariables);
        }
        for v in &variables {
            v.validate()?;
        }
        let rng = self
            .config
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Ok((Cell::new(variables, self.config.root_samples), rng))
    }

    fn expand_params(&self, cutoff: f64) -> ExpandParams {
        ExpandParams {
            cutoff,
            splits_per_level: self.config.splits_per_level,
            cv_fallback: self.config.cv_fallback,
            max_cell_samples: self.config.max_cell_samples,
        }
    }
}

/// Minimize `objective` over `variables` with default settings
/// (`splits_per_level = 3`, `lambda_prune = 3`).
///
/// Returns the best value and the point where it was found.
///
/// ```
/// use cellopt::{Error, Variable, optimize};
///
/// let (best, point) = optimize(3, vec![Variable::continuous(-10.0, 10.0)], |x: &[f64]| {
///     Ok::<_, Error>(x[0] * x[0])
/// })
/// .unwrap();
/// assert!(best >= 0.0);
/// assert_eq!(point.len(), 1);
/// ```
///
/// # Errors
///
/// See [`Optimizer::optimize`].
pub fn optimize<O>(
    n_levels: usize,
    variables: Vec<Variable>,
    objective: O,
) -> Result<(f64, Vec<f64>)>
where
    O: Objective + Sync,
{
    let result = Optimizer::builder()
        .build()?
        .optimize(n_levels, variables, objective)?;
    Ok((result.best_value, result.best_point))
}

/// Expand every cell; children are concatenated in parent order.
fn expand_all(
    grid: Vec<Cell>,
    params: &ExpandParams,
    model: &dyn ImportanceModel,
    rngs: Vec<fastrand::Rng>,
) -> Result<Vec<Cell>> {
    let expand = |(mut cell, mut rng): (Cell, fastrand::Rng)| cell.expand(params, model, &mut rng);

    #[cfg(feature = "parallel")]
    let families: Vec<Vec<Cell>> = grid
        .into_par_iter()
        .zip(rngs)
        .map(expand)
        .collect::<Result<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let families: Vec<Vec<Cell>> = grid
        .into_iter()
        .zip(rngs)
        .map(expand)
        .collect::<Result<_>>()?;

    Ok(families.into_iter().flatten().collect())
}

/// Sample and compute stats for every cell; returns the evaluations drawn.
fn evaluate_all<O>(
    grid: &mut [Cell],
    objective: &O,
    lambda: f64,
    rngs: Vec<fastrand::Rng>,
) -> Result<usize>
where
    O: Objective + Sync,
{
    let evaluate =
        |(cell, mut rng): (&mut Cell, fastrand::Rng)| cell.evaluate(objective, lambda, &mut rng);

    #[cfg(feature = "parallel")]
    let drawn: Vec<usize> = grid
        .par_iter_mut()
        .zip(rngs)
        .map(evaluate)
        .collect::<Result<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let drawn: Vec<usize> = grid
        .iter_mut()
        .zip(rngs)
        .map(evaluate)
        .collect::<Result<_>>()?;

    Ok(drawn.into_iter().sum())
}

fn root_summary(root: &Cell) -> Result<LevelSummary> {
    root.stats()
        .map(LevelSummary::from)
        .ok_or(Error::Internal("root cell has no samples"))
}

fn level_summary(grid: &[Cell]) -> Result<LevelSummary> {
    reduce_level(grid.iter().filter_map(Cell::stats))
        .ok_or(Error::Internal("level produced no statistics"))
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn log_level(report: &LevelReport) {
    trace_info!(
        level = report.level,
        best_value = report.best_value,
        level_min = report.level_min,
        cutoff = report.cutoff,
        cells = report.n_cells,
        evaluations = report.evaluations,
        elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        "level completed"
    );
}
