use cellopt::prelude::*;

fn square(x: &[f64]) -> Result<f64> {
    Ok(x.iter().map(|v| v * v).sum())
}

#[test]
fn zero_levels_returns_the_seed_batch() {
    let optimizer = Optimizer::builder().seed(11).build().unwrap();
    let result = optimizer
        .optimize(0, vec![Variable::continuous(-10.0, 10.0)], square)
        .unwrap();

    assert_eq!(result.levels_completed, 0);
    assert_eq!(result.samples_per_level, vec![50]);
    assert_eq!(result.min_values_history, vec![result.best_value]);
    assert_eq!(result.cutoff_history, vec![result.cutoff]);
}

#[test]
fn min_width_covering_the_domain_ends_after_first_expansion() {
    let optimizer = Optimizer::builder().seed(2).build().unwrap();
    let vars = vec![Variable::continuous(-10.0, 10.0).with_min_width(20.0)];

    let result = optimizer.optimize(6, vars, square).unwrap();

    assert_eq!(result.levels_completed, 0);
    assert_eq!(result.cells_per_level, vec![1]);
    assert_eq!(result.total_evaluations(), 50);
}

#[test]
fn constant_objective_converges_immediately() {
    let optimizer = Optimizer::builder().seed(4).build().unwrap();
    let vars = cellopt::variable::variables_in_box(3, -1.0, 1.0, 1e-3);

    let result = optimizer
        .optimize(5, vars, |_: &[f64]| Ok::<_, Error>(2.5))
        .unwrap();

    assert_eq!(result.levels_completed, 0);
    assert_eq!(result.best_value, 2.5);
    assert_eq!(result.cutoff, 2.5);
}

#[test]
fn zero_mean_uses_the_fallback_budget() {
    let optimizer = Optimizer::builder()
        .seed(8)
        .cv_fallback(7)
        .build()
        .unwrap();

    let result = optimizer
        .optimize(3, vec![Variable::continuous(0.0, 1.0)], |_: &[f64]| {
            Ok::<_, Error>(0.0)
        })
        .unwrap();

    // No axis carries importance, so each level holds a single cell that
    // inherits every sample and draws one fewer than the fallback.
    assert_eq!(result.levels_completed, 3);
    assert_eq!(result.cells_per_level, vec![1, 1, 1, 1]);
    assert_eq!(result.samples_per_level, vec![50, 6, 6, 6]);
    assert_eq!(result.best_value, 0.0);
}

#[test]
fn objective_error_aborts_the_run() {
    let optimizer = Optimizer::builder().seed(1).build().unwrap();
    let vars = vec![Variable::continuous(-10.0, 10.0)];

    let err = optimizer
        .optimize(3, vars, |x: &[f64]| {
            if x[0] > 5.0 {
                Err(format!("diverged at {:.2}", x[0]))
            } else {
                Ok(x[0])
            }
        })
        .unwrap_err();

    match err {
        Error::Objective(msg) => assert!(msg.starts_with("diverged at"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_search_space_is_rejected() {
    let optimizer = Optimizer::builder().seed(1).build().unwrap();

    assert!(matches!(
        optimizer.optimize(1, Vec::new(), square),
        Err(Error::NoVariables)
    ));
    assert!(matches!(
        optimizer.optimize(1, vec![Variable::continuous(0.0, f64::NAN)], square),
        Err(Error::InvalidBounds { .. })
    ));
    assert!(matches!(
        optimizer.optimize(
            1,
            vec![Variable::continuous(0.0, 1.0).with_min_width(-1.0)],
            square
        ),
        Err(Error::InvalidMinWidth(_))
    ));
}

#[test]
fn pruning_can_discard_a_cell_holding_the_minimum() {
    use cellopt::ExpandParams;

    let well = |x: &[f64]| {
        if (x[0] - 0.5).abs() < 1e-9 {
            Ok::<_, Error>(-100.0)
        } else {
            Ok(10.0 + x[0])
        }
    };
    let mut rng = fastrand::Rng::with_seed(12);
    let mut cell = Cell::new(vec![Variable::continuous(0.0, 1.0)], 20);
    cell.evaluate(&well, 3.0, &mut rng).unwrap();

    let stats = cell.stats().unwrap();
    assert!(stats.min_bound > 5.0);

    let children = cell
        .expand(&ExpandParams::new(5.0, 3), &RandomForestImportance::new(), &mut rng)
        .unwrap();

    assert!(children.is_empty());
    assert!(!cell.is_alive());
    assert!(cell.contains(&[0.5]));
}
