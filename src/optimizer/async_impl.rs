use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::objective::Objective;
use crate::rng_util;
use crate::variable::Variable;

use super::{GlobalState, OptimizationResult, Optimizer, level_summary, log_level, root_summary};

impl Optimizer {
    /// Run the optimizer with every cell task on tokio's blocking pool.
    ///
    /// Each level submits one task per cell through
    /// [`spawn_blocking`](tokio::task::spawn_blocking), at most
    /// [`concurrency`](super::OptimizerBuilder::concurrency) at a time, and
    /// collects the outputs in submission order before moving on. The expand
    /// and evaluate phases of a level never overlap. The first failed task
    /// stops the run: queued tasks are aborted and running ones draw no
    /// further samples. With a fixed seed the result is identical to
    /// [`optimize`](Self::optimize).
    ///
    /// # Errors
    ///
    /// Same as [`optimize`](Self::optimize), plus [`Error::TaskError`] if a
    /// task panics or the runtime shuts down.
    ///
    /// # Examples
    ///
    /// ```
    /// use cellopt::prelude::*;
    ///
    /// # #[cfg(feature = "async")]
    /// # async fn example() -> cellopt::Result<()> {
    /// let optimizer = Optimizer::builder().seed(42).concurrency(4).build()?;
    /// let result = optimizer
    ///     .optimize_async(3, vec![Variable::continuous(-10.0, 10.0)], |x: &[f64]| {
    ///         Ok::<_, Error>(x[0] * x[0])
    ///     })
    ///     .await?;
    ///
    /// assert!(result.best_value >= 0.0);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn optimize_async<O>(
        &self,
        n_levels: usize,
        variables: Vec<Variable>,
        objective: O,
    ) -> Result<OptimizationResult>
    where
        O: Objective + Send + Sync + 'static,
    {
        let objective = Arc::new(objective);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let failed = Arc::new(AtomicBool::new(false));
        let lambda = self.config.lambda_prune;

        let (root, mut rng) = self.init(variables)?;
        let root_rngs = rng_util::fork_n(&mut rng, 1);
        let tasks = evaluate_tasks(&objective, &failed, lambda, vec![root], root_rngs);
        let (mut grid, drawn) = join_evaluations(&semaphore, &failed, tasks).await?;
        let root = grid
            .first()
            .ok_or(Error::Internal("root cell task returned nothing"))?;
        let mut state = GlobalState::seed(root_summary(root)?, drawn);
        trace_info!(
            best_value = state.current_min,
            cutoff = state.cutoff,
            evaluations = drawn,
            "root cell evaluated"
        );

        let mut levels_completed = 0;

        for level in 1..=n_levels {
            let started = Instant::now();

            let params = self.expand_params(state.cutoff);
            let rngs = rng_util::fork_n(&mut rng, grid.len());
            let tasks: Vec<_> = grid
                .into_iter()
                .zip(rngs)
                .map(|(mut cell, mut rng)| {
                    let model = Arc::clone(&self.model);
                    move || cell.expand(&params, &*model, &mut rng)
                })
                .collect();
            grid = run_tasks(&semaphore, &failed, tasks)
                .await?
                .into_iter()
                .flatten()
                .collect();
            if grid.is_empty() {
                trace_info!(level, "no cell left to expand");
                break;
            }

            let rngs = rng_util::fork_n(&mut rng, grid.len());
            let tasks = evaluate_tasks(&objective, &failed, lambda, grid, rngs);
            let (evaluated, evaluations) = join_evaluations(&semaphore, &failed, tasks).await?;
            grid = evaluated;

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
}

/// Objective wrapper that refuses new evaluations once any cell task of the
/// run has failed.
struct Guarded<O> {
    inner: Arc<O>,
    failed: Arc<AtomicBool>,
}

impl<O: Objective> Objective for Guarded<O> {
    type Error = String;

    fn evaluate(&self, point: &[f64]) -> core::result::Result<f64, String> {
        if self.failed.load(Ordering::Acquire) {
            return Err(String::from("run aborted"));
        }
        self.inner.evaluate(point).map_err(|e| e.to_string())
    }
}

enum Outcome<T> {
    Done(usize, T),
    Failed(Error),
    /// Stopped because another task failed first.
    Cancelled,
}

/// Run every task on the blocking pool, at most one per semaphore permit, and
/// return the outputs in submission order.
///
/// The first failure sets `failed` and returns; dropping the [`JoinSet`]
/// aborts the tasks still waiting for a permit.
async fn run_tasks<T, F>(
    semaphore: &Arc<Semaphore>,
    failed: &Arc<AtomicBool>,
    tasks: Vec<F>,
) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let n = tasks.len();
    let mut set = JoinSet::new();
    for (index, task) in tasks.into_iter().enumerate() {
        let semaphore = Arc::clone(semaphore);
        let failed = Arc::clone(failed);
        set.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return Outcome::Failed(Error::TaskError(e.to_string())),
            };
            if failed.load(Ordering::Acquire) {
                return Outcome::Cancelled;
            }
            let result = match tokio::task::spawn_blocking(task).await {
                Ok(result) => result,
                Err(e) => Err(Error::TaskError(e.to_string())),
            };
            match result {
                Ok(value) => Outcome::Done(index, value),
                // Only the first failure is reported; later ones were
                // cut short by it.
                Err(e) => {
                    if failed.swap(true, Ordering::AcqRel) {
                        Outcome::Cancelled
                    } else {
                        Outcome::Failed(e)
                    }
                }
            }
        });
    }

    let mut slots: Vec<Option<T>> = (0..n).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Outcome::Done(index, value)) => slots[index] = Some(value),
            Ok(Outcome::Cancelled) => {}
            Ok(Outcome::Failed(e)) => {
                failed.store(true, Ordering::Release);
                return Err(e);
            }
            Err(e) => {
                failed.store(true, Ordering::Release);
                return Err(Error::TaskError(e.to_string()));
            }
        }
    }
    slots
        .into_iter()
        .collect::<Option<Vec<T>>>()
        .ok_or(Error::Internal("cell task finished without a result"))
}

type EvaluateTask = Box<dyn FnOnce() -> Result<(Cell, usize)> + Send>;

fn evaluate_tasks<O>(
    objective: &Arc<O>,
    failed: &Arc<AtomicBool>,
    lambda: f64,
    grid: Vec<Cell>,
    rngs: Vec<fastrand::Rng>,
) -> Vec<EvaluateTask>
where
    O: Objective + Send + Sync + 'static,
{
    grid.into_iter()
        .zip(rngs)
        .map(|(mut cell, mut rng)| {
            let guarded = Guarded {
                inner: Arc::clone(objective),
                failed: Arc::clone(failed),
            };
            Box::new(move || {
                let drawn = cell.evaluate(&guarded, lambda, &mut rng)?;
                Ok((cell, drawn))
            }) as EvaluateTask
        })
        .collect()
}

async fn join_evaluations(
    semaphore: &Arc<Semaphore>,
    failed: &Arc<AtomicBool>,
    tasks: Vec<EvaluateTask>,
) -> Result<(Vec<Cell>, usize)> {
    let (grid, drawn): (Vec<Cell>, Vec<usize>) =
        run_tasks(semaphore, failed, tasks).await?.into_iter().unzip();
    Ok((grid, drawn.into_iter().sum()))
}
