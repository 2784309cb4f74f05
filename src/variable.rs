//! Bounded search-space dimensions.
//!
//! A [`Variable`] describes one coordinate axis of a cell: its closed
//! interval, whether it is continuous or integer-valued, the smallest width
//! the optimizer is allowed to resolve, and how many equal divisions the axis
//! gets when the owning cell is split.
//!
//! # Example
//!
//! ```
//! use cellopt::variable::Variable;
//!
//! let x = Variable::continuous(-10.0, 10.0).with_min_width(0.01);
//! let n = Variable::discrete(0.0, 32.0);
//!
//! assert!(x.validate().is_ok());
//! assert_eq!(n.width(), 32.0);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default minimum resolvable width for new variables.
pub const DEFAULT_MIN_WIDTH: f64 = 1e-3;

/// Whether samples along an axis are real-valued or rounded to integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VariableKind {
    /// Uniform real values.
    #[default]
    Continuous,
    /// Uniform real values rounded to the nearest integer.
    Discrete,
}

/// One bounded axis of the search space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Variable {
    /// Lower bound (inclusive).
    pub lower: f64,
    /// Upper bound (inclusive).
    pub upper: f64,
    /// Continuous or discrete sampling.
    pub kind: VariableKind,
    /// Minimum width a cell may have along this axis before it stops splitting.
    pub min_width: f64,
    /// Number of equal divisions used when the owning cell is split.
    pub divs: u32,
}

impl Variable {
    /// Creates a variable with the given bounds, kind and defaults
    /// (`min_width = 1e-3`, `divs = 1`).
    #[must_use]
    pub fn new(lower: f64, upper: f64, kind: VariableKind) -> Self {
        Self {
            lower,
            upper,
            kind,
            min_width: DEFAULT_MIN_WIDTH,
            divs: 1,
        }
    }

    /// Creates a continuous variable over `[lower, upper]`.
    #[must_use]
    pub fn continuous(lower: f64, upper: f64) -> Self {
        Self::new(lower, upper, VariableKind::Continuous)
    }

    /// Creates a discrete (integer-rounded) variable over `[lower, upper]`.
    #[must_use]
    pub fn discrete(lower: f64, upper: f64) -> Self {
        Self::new(lower, upper, VariableKind::Discrete)
    }

    /// Sets the minimum resolvable width.
    #[must_use]
    pub fn with_min_width(mut self, min_width: f64) -> Self {
        self.min_width = min_width;
        self
    }

    /// Sets the number of divisions.
    #[must_use]
    pub fn with_divs(mut self, divs: u32) -> Self {
        self.divs = divs;
        self
    }

    /// Width of the interval.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// `true` once the interval is no wider than `min_width`.
    ///
    /// Axes at the floor are never split again and carry no importance.
    #[must_use]
    pub fn at_resolution_floor(&self) -> bool {
        self.width() <= self.min_width
    }

    /// `true` if `value` lies in the closed interval.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Draw one value from the interval.
    pub(crate) fn draw(&self, rng: &mut fastrand::Rng) -> f64 {
        let v = crate::rng_util::f64_range(rng, self.lower, self.upper);
        match self.kind {
            VariableKind::Continuous => v,
            VariableKind::Discrete => v.round(),
        }
    }

    /// Checks the variable's invariants.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidBounds`] if a bound is not finite or `lower > upper`.
    /// - [`Error::InvalidMinWidth`] if `min_width` is negative or not finite.
    /// - [`Error::InvalidDivs`] if `divs` is zero.
    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() || self.lower > self.upper {
            return Err(Error::InvalidBounds {
                low: self.lower,
                high: self.upper,
            });
        }
        if !self.min_width.is_finite() || self.min_width < 0.0 {
            return Err(Error::InvalidMinWidth(self.min_width));
        }
        if self.divs == 0 {
            return Err(Error::InvalidDivs);
        }
        Ok(())
    }
}

/// Build `n` identical continuous variables over `[lower, upper]`.
///
/// ```
/// let vars = cellopt::variable::variables_in_box(3, -10.0, 10.0, 1e-3);
/// assert_eq!(vars.len(), 3);
/// ```
#[must_use]
pub fn variables_in_box(n: usize, lower: f64, upper: f64, min_width: f64) -> Vec<Variable> {
    (0..n)
        .map(|_| Variable::continuous(lower, upper).with_min_width(min_width))
        .collect()
}
