//! The [`Objective`] trait defines what gets minimized.
//!
//! For simple closures, pass them directly to
//! [`Optimizer::optimize`](crate::Optimizer::optimize):
//!
//! ```
//! use cellopt::prelude::*;
//!
//! let optimizer = Optimizer::builder().seed(7).build().unwrap();
//! let result = optimizer
//!     .optimize(3, vec![Variable::continuous(-5.0, 5.0)], |x: &[f64]| {
//!         Ok::<_, Error>((x[0] - 1.0).powi(2))
//!     })
//!     .unwrap();
//! assert!(result.best_value < 1.0);
//! ```
//!
//! For early stopping between levels, implement [`Objective`] on a struct and
//! override [`after_level`](Objective::after_level):
//!
//! ```
//! use std::ops::ControlFlow;
//!
//! use cellopt::prelude::*;
//!
//! struct StopBelow {
//!     target: f64,
//! }
//!
//! impl Objective for StopBelow {
//!     type Error = Error;
//!
//!     fn evaluate(&self, point: &[f64]) -> Result<f64> {
//!         Ok(point.iter().map(|x| x * x).sum())
//!     }
//!
//!     fn after_level(&self, report: &LevelReport) -> ControlFlow<()> {
//!         if report.best_value < self.target {
//!             ControlFlow::Break(())
//!         } else {
//!             ControlFlow::Continue(())
//!         }
//!     }
//! }
//!
//! let optimizer = Optimizer::builder().seed(1).build().unwrap();
//! let vars = cellopt::variable::variables_in_box(2, -4.0, 4.0, 1e-3);
//! let result = optimizer.optimize(20, vars, StopBelow { target: 0.5 }).unwrap();
//! assert!(result.levels_completed <= 20);
//! ```

use core::ops::ControlFlow;

use crate::optimizer::LevelReport;

/// A black-box function to minimize, with an optional per-level hook.
///
/// The only required method is [`evaluate`](Objective::evaluate). It is
/// called exactly once per drawn sample and never retried: the first error
/// aborts the whole run.
///
/// # Thread safety
///
/// Cells are evaluated concurrently, so optimizers require `Sync` on the
/// objective (and `Send + 'static` for the async executor).
pub trait Objective {
    /// The error type returned by [`evaluate`](Objective::evaluate).
    type Error: ToString;

    /// Evaluate the objective at `point` (one coordinate per variable).
    ///
    /// # Errors
    ///
    /// Any error whose type implements `ToString`. It is surfaced as
    /// [`Error::Objective`](crate::Error::Objective).
    fn evaluate(&self, point: &[f64]) -> Result<f64, Self::Error>;

    /// Called after each completed level (expand, evaluate, reduce).
    ///
    /// Return `ControlFlow::Break(())` to stop before the next level.
    ///
    /// Default: always continues.
    fn after_level(&self, _report: &LevelReport) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<F, E> Objective for F
where
    F: Fn(&[f64]) -> Result<f64, E>,
    E: ToString,
{
    type Error = E;

    fn evaluate(&self, point: &[f64]) -> Result<f64, E> {
        self(point)
    }
}
