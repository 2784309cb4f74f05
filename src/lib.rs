#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Adaptive multi-level global minimization by recursive cell partitioning.
//!
//! The search space is a box of bounded variables. Each level samples every
//! active cell, fits an importance model to the samples, and splits the
//! cells whose statistical lower bound can still beat the best known upper
//! bound. Splits go along the axes that explain most of the variance, and
//! children of spread-out cells get more samples. Cells that cannot contain
//! the minimum are dropped.
//!
//! # Getting Started
//!
//! ```
//! use cellopt::prelude::*;
//!
//! let optimizer = Optimizer::builder().seed(7).build().unwrap();
//! let vars = vec![Variable::continuous(-10.0, 10.0).with_min_width(0.05)];
//!
//! let result = optimizer
//!     .optimize(5, vars, |x: &[f64]| Ok::<_, Error>((x[0] - 3.0).powi(2)))
//!     .unwrap();
//!
//! println!("f({:?}) = {:.4}", result.best_point, result.best_value);
//! assert!(result.best_value < 1.0);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Variable`] | One bounded axis of the search space with its resolution floor. |
//! | [`Cell`] | A box of the search space with its samples and [`CellStats`]. |
//! | [`ImportanceModel`](importance::ImportanceModel) | Ranks axes before a cell is split ([`RandomForestImportance`](importance::RandomForestImportance), [`FanovaImportance`](importance::FanovaImportance)). |
//! | [`Optimizer`] | Drives the levels: expand, evaluate, reduce. |
//! | [`Objective`] | The function being minimized, with an optional per-level hook. |
//! | [`OptimizationResult`] | Best value and point plus per-level histories. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `parallel` | Cells of a level are expanded and evaluated on the rayon pool | on |
//! | `async` | `Optimizer::optimize_async` on tokio's blocking pool | off |
//! | `serde` | `Serialize`/`Deserialize` on public data types, `OptimizationResult::to_json` | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) per level | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod cell;
mod error;
pub mod grid;
pub mod importance;
pub mod objective;
mod optimizer;
pub mod reduce;
mod rng_util;
pub mod variable;

pub use cell::{Cell, CellStats, ExpandParams, Sample};
pub use error::{Error, Result};
pub use objective::Objective;
pub use optimizer::{
    DEFAULT_LAMBDA_PRUNE, DEFAULT_ROOT_SAMPLES, DEFAULT_SPLITS_PER_LEVEL, LevelReport,
    OptimizationResult, Optimizer, OptimizerBuilder, optimize,
};
pub use reduce::LevelSummary;
pub use variable::{Variable, VariableKind};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use cellopt::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cell::{Cell, CellStats};
    pub use crate::error::{Error, Result};
    pub use crate::importance::{FanovaImportance, ImportanceModel, RandomForestImportance};
    pub use crate::objective::Objective;
    pub use crate::optimizer::{
        LevelReport, OptimizationResult, Optimizer, OptimizerBuilder, optimize,
    };
    pub use crate::variable::{Variable, VariableKind};
}
