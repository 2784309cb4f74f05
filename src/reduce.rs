//! Level reduction: folding per-cell stats into one level summary.
//!
//! Stats are combined pairwise in a tree with doubling stride: first
//! `s[0]⊕s[1]`, `s[2]⊕s[3]`, …, then `s[0]⊕s[2]`, `s[4]⊕s[6]`, …, until
//! everything has been folded into `s[0]`. Each combine step depends only on
//! its two direct inputs, so steps of the same stride are independent.
//!
//! Two combine rules are provided:
//!
//! - [`combine`] keeps the left operand's `min_bound` unchanged while
//!   min-combining `min` and `max_bound`. The optimizer uses this rule.
//! - [`combine_symmetric`] also min-combines `min_bound`.
//!
//! Only `min`, `max_bound` and `best_point` feed the optimizer's state, so
//! both rules drive the search identically.
//!
//! ```
//! use cellopt::reduce::{LevelSummary, combine, tree_reduce};
//!
//! let s = |min: f64, max_bound: f64| LevelSummary {
//!     min,
//!     min_bound: min - 1.0,
//!     max_bound,
//!     best_point: vec![min],
//! };
//! let level = tree_reduce(vec![s(5.0, 10.0), s(2.0, 7.0), s(9.0, 3.0)], combine).unwrap();
//! assert_eq!(level.min, 2.0);
//! assert_eq!(level.max_bound, 3.0);
//! assert_eq!(level.best_point, vec![2.0]);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::CellStats;

/// The reducible part of a cell's stats.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LevelSummary {
    /// Smallest sampled value.
    pub min: f64,
    /// Optimistic lower bound.
    pub min_bound: f64,
    /// Pessimistic upper bound; after reduction, the cutoff candidate.
    pub max_bound: f64,
    /// Point where `min` was observed.
    pub best_point: Vec<f64>,
}

impl From<&CellStats> for LevelSummary {
    fn from(stats: &CellStats) -> Self {
        Self {
            min: stats.min,
            min_bound: stats.min_bound,
            max_bound: stats.max_bound,
            best_point: stats.best_point.clone(),
        }
    }
}

/// Combine two summaries, keeping `a.min_bound` as is.
///
/// The smaller `min` wins together with its point; on a tie `b` wins.
/// `max_bound` is the smaller of the two.
#[must_use]
pub fn combine(a: &LevelSummary, b: &LevelSummary) -> LevelSummary {
    let winner = if a.min < b.min { a } else { b };
    LevelSummary {
        min: winner.min,
        min_bound: a.min_bound,
        max_bound: a.max_bound.min(b.max_bound),
        best_point: winner.best_point.clone(),
    }
}

/// Combine two summaries, min-combining every bound.
#[must_use]
pub fn combine_symmetric(a: &LevelSummary, b: &LevelSummary) -> LevelSummary {
    LevelSummary {
        min_bound: a.min_bound.min(b.min_bound),
        ..combine(a, b)
    }
}

/// Fold `items` with `op` along a doubling-stride tree.
///
/// Returns `None` for empty input.
#[must_use]
pub fn tree_reduce<F>(mut items: Vec<LevelSummary>, op: F) -> Option<LevelSummary>
where
    F: Fn(&LevelSummary, &LevelSummary) -> LevelSummary,
{
    let n = items.len();
    let mut stride = 1;
    while stride < n {
        for i in (0..n).step_by(2 * stride) {
            if i + stride < n {
                items[i] = op(&items[i], &items[i + stride]);
            }
        }
        stride *= 2;
    }
    items.into_iter().next()
}

/// Reduce a level's cell stats with [`combine`].
#[must_use]
pub fn reduce_level<'a>(stats: impl IntoIterator<Item = &'a CellStats>) -> Option<LevelSummary> {
    tree_reduce(stats.into_iter().map(LevelSummary::from).collect(), combine)
}
