use std::sync::Arc;

use crate::cell::DEFAULT_CV_FALLBACK;
use crate::error::{Error, Result};
use crate::importance::{ImportanceModel, RandomForestImportance};

use super::{Optimizer, OptimizerConfig};

/// Default greedy axis-doubling rounds per cell and level.
pub const DEFAULT_SPLITS_PER_LEVEL: u32 = 3;
/// Default pruning width in standard deviations.
pub const DEFAULT_LAMBDA_PRUNE: f64 = 3.0;
/// Default sample budget of the root cell.
pub const DEFAULT_ROOT_SAMPLES: u32 = 50;

/// A builder for [`Optimizer`] instances with a fluent API.
///
/// Created via [`Optimizer::builder()`].
///
/// # Defaults
///
/// - `splits_per_level`: 3
/// - `lambda_prune`: 3.0
/// - `root_samples`: 50
/// - `cv_fallback`: 50
/// - `max_cell_samples`: unlimited
/// - `seed`: random
/// - importance model: [`RandomForestImportance`]
///
/// # Examples
///
/// ```
/// use cellopt::importance::FanovaImportance;
/// use cellopt::prelude::*;
///
/// let optimizer = Optimizer::builder()
///     .splits_per_level(2)
///     .lambda_prune(1.0)
///     .seed(42)
///     .importance_model(FanovaImportance::new())
///     .build()
///     .unwrap();
///
/// assert_eq!(optimizer.splits_per_level(), 2);
/// ```
pub struct OptimizerBuilder {
    config: OptimizerConfig,
    model: Option<Arc<dyn ImportanceModel>>,
    #[cfg(feature = "async")]
    concurrency: Option<usize>,
}

impl OptimizerBuilder {
    pub(super) fn new() -> Self {
        Self {
            config: OptimizerConfig {
                splits_per_level: DEFAULT_SPLITS_PER_LEVEL,
                lambda_prune: DEFAULT_LAMBDA_PRUNE,
                root_samples: DEFAULT_ROOT_SAMPLES,
                cv_fallback: DEFAULT_CV_FALLBACK,
                max_cell_samples: None,
                seed: None,
            },
            model: None,
            #[cfg(feature = "async")]
            concurrency: None,
        }
    }

    /// Set how many times per level a cell doubles the divisions of its most
    /// important axis. A cell yields at most `2^splits` children.
    #[must_use]
    pub fn splits_per_level(mut self, splits: u32) -> Self {
        self.config.splits_per_level = splits;
        self
    }

    /// Set the number of standard deviations used to widen each cell's
    /// bounds around its mean.
    #[must_use]
    pub fn lambda_prune(mut self, lambda: f64) -> Self {
        self.config.lambda_prune = lambda;
        self
    }

    /// Set the number of samples drawn in the root cell.
    #[must_use]
    pub fn root_samples(mut self, n: u32) -> Self {
        self.config.root_samples = n;
        self
    }

    /// Set the child sample budget used when a cell's mean is exactly zero.
    #[must_use]
    pub fn cv_fallback(mut self, n: u32) -> Self {
        self.config.cv_fallback = n;
        self
    }

    /// Cap the per-child sample budget derived from the coefficient of
    /// variation.
    #[must_use]
    pub fn max_cell_samples(mut self, n: u32) -> Self {
        self.config.max_cell_samples = Some(n);
        self
    }

    /// Fix the random seed. Together with a deterministic objective this
    /// makes runs reproducible.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the model that ranks axes before a cell is split.
    ///
    /// Defaults to [`RandomForestImportance`] if not specified.
    #[must_use]
    pub fn importance_model(mut self, model: impl ImportanceModel + 'static) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    /// Set the maximum number of cell tasks running at once in
    /// [`Optimizer::optimize_async`]. Defaults to the available parallelism.
    #[cfg(feature = "async")]
    #[must_use]
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = Some(n);
        self
    }

    /// Build the [`Optimizer`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSplits`] if `splits_per_level` is zero.
    /// - [`Error::InvalidLambda`] if `lambda_prune` is negative or not finite.
    /// - [`Error::InvalidSampleBudget`] if `root_samples` is zero.
    pub fn build(self) -> Result<Optimizer> {
        let config = self.config;
        if config.splits_per_level == 0 {
            return Err(Error::InvalidSplits);
        }
        if !config.lambda_prune.is_finite() || config.lambda_prune < 0.0 {
            return Err(Error::InvalidLambda(config.lambda_prune));
        }
        if config.root_samples == 0 {
            return Err(Error::InvalidSampleBudget);
        }

        let model = self
            .model
            .unwrap_or_else(|| Arc::new(RandomForestImportance::new()));

        Ok(Optimizer {
            config,
            model,
            #[cfg(feature = "async")]
            concurrency: self
                .concurrency
                .unwrap_or_else(|| {
                    std::thread::available_parallelism().map_or(1, core::num::NonZeroUsize::get)
                })
                .max(1),
        })
    }
}
