//! Pluggable axis-importance models.
//!
//! Before a cell is split, an [`ImportanceModel`] is fitted on the cell's
//! samples and returns one non-negative score per axis. Axes with higher
//! scores receive more divisions. Any supervised regressor that can report
//! feature importances fits this role; the crate ships two forest-based
//! models:
//!
//! | Model | Measure |
//! |-------|---------|
//! | [`RandomForestImportance`] | Mean decrease in squared error (default) |
//! | [`FanovaImportance`] | fANOVA main effects of the fitted forest |
//!
//! Closures with the signature `Fn(&[Vec<f64>], &[f64]) -> Vec<f64>` also
//! implement the trait:
//!
//! ```
//! use cellopt::importance::ImportanceModel;
//!
//! // Rank axes by the spread of the sampled coordinates.
//! let spread = |points: &[Vec<f64>], _values: &[f64]| -> Vec<f64> {
//!     let dims = points[0].len();
//!     (0..dims)
//!         .map(|j| {
//!             let lo = points.iter().map(|p| p[j]).fold(f64::INFINITY, f64::min);
//!             let hi = points.iter().map(|p| p[j]).fold(f64::NEG_INFINITY, f64::max);
//!             hi - lo
//!         })
//!         .collect()
//! };
//!
//! let mut rng = fastrand::Rng::with_seed(0);
//! let imp = spread.fit(&[vec![0.0, 0.0], vec![4.0, 1.0]], &[1.0, 2.0], &mut rng);
//! assert_eq!(imp, vec![4.0, 1.0]);
//! ```

mod forest;

pub use forest::{ForestConfig, RandomForest};

/// Scores how strongly each axis drives the objective inside a cell.
///
/// Implementations must be `Send + Sync`: cells are expanded concurrently and
/// share a single model instance.
pub trait ImportanceModel: Send + Sync {
    /// Fit on `points` (one row per sample) and `values`, returning one
    /// non-negative importance per axis.
    ///
    /// `points` is never empty. `rng` is the calling cell's generator and is
    /// the only source of randomness a model should use, so that runs stay
    /// reproducible.
    fn fit(&self, points: &[Vec<f64>], values: &[f64], rng: &mut fastrand::Rng) -> Vec<f64>;
}

impl<F> ImportanceModel for F
where
    F: Fn(&[Vec<f64>], &[f64]) -> Vec<f64> + Send + Sync,
{
    fn fit(&self, points: &[Vec<f64>], values: &[f64], _rng: &mut fastrand::Rng) -> Vec<f64> {
        self(points, values)
    }
}

/// Impurity-decrease importance from a random forest regressor.
#[derive(Debug, Clone, Default)]
pub struct RandomForestImportance {
    config: ForestConfig,
}

impl RandomForestImportance {
    /// Creates the model with default forest settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the model with custom forest settings.
    #[must_use]
    pub fn with_config(config: ForestConfig) -> Self {
        Self { config }
    }
}

impl ImportanceModel for RandomForestImportance {
    fn fit(&self, points: &[Vec<f64>], values: &[f64], rng: &mut fastrand::Rng) -> Vec<f64> {
        let dims = points.first().map_or(0, Vec::len);
        RandomForest::fit(points, values, &self.config, rng)
            .map_or_else(|| vec![0.0; dims], |forest| forest.impurity_importances())
    }
}

/// fANOVA main-effect importance from a random forest regressor.
///
/// Slower than [`RandomForestImportance`] but insensitive to the bias of
/// impurity scores toward features with many distinct values.
#[derive(Debug, Clone, Default)]
pub struct FanovaImportance {
    config: ForestConfig,
}

impl FanovaImportance {
    /// Creates the model with default forest settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the model with custom forest settings.
    #[must_use]
    pub fn with_config(config: ForestConfig) -> Self {
        Self { config }
    }
}

impl ImportanceModel for FanovaImportance {
    fn fit(&self, points: &[Vec<f64>], values: &[f64], rng: &mut fastrand::Rng) -> Vec<f64> {
        let dims = points.first().map_or(0, Vec::len);
        RandomForest::fit(points, values, &self.config, rng)
            .map_or_else(|| vec![0.0; dims], |forest| forest.main_effects(points))
    }
}
