use cellopt::prelude::*;

use crate::test_functions;

fn run(seed: u64) -> OptimizationResult {
    Optimizer::builder()
        .seed(seed)
        .max_cell_samples(40)
        .build()
        .unwrap()
        .optimize(
            3,
            cellopt::variable::variables_in_box(2, -5.0, 5.0, 0.01),
            |x: &[f64]| Ok::<_, Error>(test_functions::rastrigin(x)),
        )
        .unwrap()
}

#[test]
fn same_seed_same_result() {
    assert_eq!(run(123), run(123));
}

#[test]
fn different_seeds_explore_differently() {
    let a = run(1);
    let b = run(2);
    assert_ne!(a.best_point, b.best_point);
}

#[test]
fn builder_settings_are_reported() {
    let optimizer = Optimizer::builder()
        .splits_per_level(2)
        .lambda_prune(1.5)
        .root_samples(20)
        .build()
        .unwrap();

    assert_eq!(optimizer.splits_per_level(), 2);
    assert_eq!(optimizer.lambda_prune(), 1.5);
    assert_eq!(optimizer.root_samples(), 20);
}

#[test]
fn fewer_splits_give_fewer_cells() {
    let cells = |splits: u32| {
        Optimizer::builder()
            .seed(21)
            .splits_per_level(splits)
            .max_cell_samples(30)
            .build()
            .unwrap()
            .optimize(
                1,
                vec![Variable::continuous(-8.0, 8.0).with_min_width(0.01)],
                |x: &[f64]| Ok::<_, Error>(x[0].abs()),
            )
            .unwrap()
            .cells_per_level[1]
    };

    assert_eq!(cells(1), 2);
    assert_eq!(cells(3), 8);
}
