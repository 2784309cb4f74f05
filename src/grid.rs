//! Regular subdivision of a cell's box into child cells.

use crate::cell::Cell;
use crate::variable::Variable;

/// Split the box described by `variables` into `Π divs` child cells.
///
/// Children are enumerated in row-major order (the last axis varies
/// fastest). Each child gets `target_samples` as its sample budget, fresh
/// `divs = 1` on every axis, and the parent's `kind` and `min_width`. Along
/// each axis the outermost children reuse the parent's exact bounds, so the
/// children tile the parent box without gaps.
///
/// An `alive == false` template yields no children.
///
/// ```
/// use cellopt::grid::gen_grid;
/// use cellopt::variable::Variable;
///
/// let vars = vec![
///     Variable::continuous(0.0, 4.0).with_divs(2),
///     Variable::continuous(0.0, 3.0).with_divs(3),
/// ];
/// let children = gen_grid(10, &vars, true);
/// assert_eq!(children.len(), 6);
/// assert_eq!(children[1].variables()[1].lower, 1.0);
/// assert!(gen_grid(10, &vars, false).is_empty());
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gen_grid(target_samples: u32, variables: &[Variable], alive: bool) -> Vec<Cell> {
    if !alive || variables.is_empty() {
        return Vec::new();
    }

    let shape: Vec<usize> = variables.iter().map(|v| v.divs.max(1) as usize).collect();
    let total: usize = shape.iter().product();

    (0..total)
        .map(|flat| {
            let index = unravel_index(flat, &shape);
            let bounds = variables
                .iter()
                .zip(&shape)
                .zip(&index)
                .map(|((v, &n), &d)| {
                    let step = v.width() / n as f64;
                    let lower = v.lower + step * d as f64;
                    let upper = if d + 1 == n {
                        v.upper
                    } else {
                        v.lower + step * (d + 1) as f64
                    };
                    Variable {
                        lower,
                        upper,
                        kind: v.kind,
                        min_width: v.min_width,
                        divs: 1,
                    }
                })
                .collect();
            Cell::new(bounds, target_samples)
        })
        .collect()
}

/// Convert a flat index into per-axis indices for a row-major `shape`.
///
/// ```
/// use cellopt::grid::unravel_index;
///
/// assert_eq!(unravel_index(5, &[2, 3]), vec![1, 2]);
/// assert_eq!(unravel_index(0, &[4]), vec![0]);
/// ```
#[must_use]
pub fn unravel_index(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for (slot, &n) in index.iter_mut().zip(shape).rev() {
        *slot = flat % n;
        flat /= n;
    }
    index
}
