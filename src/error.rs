#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the lower bound is greater than the upper bound, or
    /// either bound is not finite.
    #[error("invalid bounds: lower ({low}) must be finite and less than or equal to upper ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when a variable is created with zero divisions.
    #[error("invalid divisions: divs must be at least 1")]
    InvalidDivs,

    /// Returned when the minimum resolvable width is negative or not finite.
    #[error("invalid minimum width: {0} must be finite and non-negative")]
    InvalidMinWidth(f64),

    /// Returned when the search space has no variables.
    #[error("search space must contain at least one variable")]
    NoVariables,

    /// Returned when a point, importance vector, or cell does not match the
    /// dimensionality of the search space.
    #[error("dimension mismatch: expected {expected} dimensions, got {got}")]
    DimensionMismatch {
        /// The expected number of dimensions.
        expected: usize,
        /// The actual number of dimensions.
        got: usize,
    },

    /// Returned when `splits_per_level` is zero.
    #[error("invalid splits per level: must be at least 1")]
    InvalidSplits,

    /// Returned when the pruning multiplier is negative or not finite.
    #[error("invalid pruning lambda: {0} must be finite and non-negative")]
    InvalidLambda(f64),

    /// Returned when the root sample budget is zero.
    #[error("invalid sample budget: the root cell needs at least one sample")]
    InvalidSampleBudget,

    /// Returned when the objective function fails. The run is aborted.
    #[error("objective evaluation failed: {0}")]
    Objective(String),

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// Returned when an async task fails.
    #[cfg(feature = "async")]
    #[error("async task error: {0}")]
    TaskError(String),
}

pub type Result<T> = core::result::Result<T, Error>;
