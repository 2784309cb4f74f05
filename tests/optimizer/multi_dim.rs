use cellopt::prelude::*;
use cellopt::variable::variables_in_box;

use crate::test_functions;

fn run(
    dims: usize,
    lower: f64,
    upper: f64,
    levels: usize,
    f: fn(&[f64]) -> f64,
) -> OptimizationResult {
    Optimizer::builder()
        .seed(2024)
        .max_cell_samples(32)
        .build()
        .unwrap()
        .optimize(levels, variables_in_box(dims, lower, upper, 1e-3), |x: &[f64]| {
            Ok::<_, Error>(f(x))
        })
        .unwrap()
}

#[test]
fn ackley_improves_on_the_seed_batch() {
    let result = run(2, -10.0, 10.0, 3, test_functions::ackley);

    assert!(result.best_value >= 0.0);
    assert!(result.best_value <= result.min_values_history[0]);
    assert!(result.best_value < 10.0);
    assert!(result.levels_completed >= 1);
}

#[test]
fn levy_in_three_dimensions() {
    let result = run(3, -10.0, 10.0, 2, test_functions::levy);

    assert_eq!(result.best_point.len(), 3);
    assert!(result.best_value.is_finite());
    assert!(
        (test_functions::levy(&result.best_point) - result.best_value).abs() < 1e-9
    );
}

#[test]
fn schwefel_stays_in_domain() {
    let result = run(2, -500.0, 500.0, 2, test_functions::schwefel);

    assert!(result.best_point.iter().all(|x| (-500.0..=500.0).contains(x)));
    assert!(result.best_value >= -1e-6);
}

#[test]
fn each_level_splits_into_at_most_eight_children_per_cell() {
    let result = run(4, -5.0, 5.0, 2, test_functions::sphere);

    for w in result.cells_per_level.windows(2) {
        assert!(w[1] <= w[0] * 8, "cells went from {} to {}", w[0], w[1]);
    }
}
