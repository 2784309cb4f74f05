use cellopt::prelude::*;

fn square(x: &[f64]) -> Result<f64> {
    Ok(x[0] * x[0])
}

#[test]
fn one_dimensional_square_finds_origin() {
    let min_width = 1.0;
    let optimizer = Optimizer::builder().seed(42).build().unwrap();
    let vars = vec![Variable::continuous(-10.0, 10.0).with_min_width(min_width)];

    let result = optimizer.optimize(5, vars, square).unwrap();

    assert!(result.best_value >= 0.0);
    assert!(result.best_value < min_width * min_width);
    assert_eq!(result.best_point.len(), 1);
    assert!(result.best_point[0].abs() < min_width);
    assert!((square(&result.best_point).unwrap() - result.best_value).abs() < 1e-12);
    assert!(
        result.min_values_history.windows(2).all(|w| w[1] <= w[0]),
        "best value got worse: {:?}",
        result.min_values_history
    );
}

#[test]
fn histories_track_each_level() {
    let optimizer = Optimizer::builder()
        .seed(7)
        .max_cell_samples(40)
        .build()
        .unwrap();
    let vars = vec![
        Variable::continuous(-5.0, 5.0).with_min_width(0.1),
        Variable::continuous(-5.0, 5.0).with_min_width(0.1),
    ];

    let result = optimizer
        .optimize(3, vars, |x: &[f64]| Ok::<_, Error>(x[0] * x[0] + x[1] * x[1]))
        .unwrap();

    let n = result.levels_completed + 1;
    assert_eq!(result.min_values_history.len(), n);
    assert_eq!(result.cutoff_history.len(), n);
    assert_eq!(result.samples_per_level.len(), n);
    assert_eq!(result.cells_per_level.len(), n);

    for w in result.min_values_history.windows(2) {
        assert!(w[1] <= w[0], "best value increased: {w:?}");
    }
    for w in result.cutoff_history.windows(2) {
        assert!(w[1] <= w[0], "cutoff increased: {w:?}");
    }

    assert_eq!(result.samples_per_level[0], 50);
    assert_eq!(result.cells_per_level[0], 1);
    assert_eq!(
        result.total_evaluations(),
        result.samples_per_level.iter().sum::<usize>()
    );
    assert_eq!(*result.min_values_history.last().unwrap(), result.best_value);
    assert_eq!(*result.cutoff_history.last().unwrap(), result.cutoff);
    assert!(result.best_value <= result.cutoff);
}

#[test]
fn best_point_lies_in_the_domain() {
    let optimizer = Optimizer::builder().seed(3).max_cell_samples(30).build().unwrap();
    let vars = vec![
        Variable::continuous(2.0, 6.0),
        Variable::continuous(-1.0, 0.5),
    ];

    let result = optimizer
        .optimize(3, vars.clone(), |x: &[f64]| Ok::<_, Error>(x[0] - x[1]))
        .unwrap();

    for (x, v) in result.best_point.iter().zip(&vars) {
        assert!(v.contains(*x), "{x} outside [{}, {}]", v.lower, v.upper);
    }
}

#[test]
fn free_function_uses_defaults() {
    let (best, point) = optimize(
        2,
        vec![Variable::continuous(-3.0, 3.0).with_min_width(0.5)],
        |x: &[f64]| Ok::<_, Error>((x[0] - 1.0).abs()),
    )
    .unwrap();

    assert!(best >= 0.0);
    assert!((best - (point[0] - 1.0).abs()).abs() < 1e-12);
}

#[test]
fn fanova_model_drives_the_search() {
    let optimizer = Optimizer::builder()
        .seed(5)
        .max_cell_samples(30)
        .importance_model(FanovaImportance::new())
        .build()
        .unwrap();
    let vars = vec![
        Variable::continuous(-4.0, 4.0).with_min_width(0.1),
        Variable::continuous(-4.0, 4.0).with_min_width(0.1),
    ];

    let result = optimizer
        .optimize(3, vars, |x: &[f64]| Ok::<_, Error>(x[0] * x[0] + 0.01 * x[1]))
        .unwrap();

    assert!(result.levels_completed >= 1);
    assert!(result.best_value <= result.min_values_history[0]);
}

#[test]
fn custom_model_with_wrong_length_is_rejected() {
    let optimizer = Optimizer::builder()
        .seed(1)
        .importance_model(|_: &[Vec<f64>], _: &[f64]| vec![1.0])
        .build()
        .unwrap();
    let vars = vec![Variable::continuous(0.0, 1.0), Variable::continuous(0.0, 1.0)];

    let err = optimizer
        .optimize(2, vars, |x: &[f64]| Ok::<_, Error>(x[0] + x[1]))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 2,
            got: 1
        }
    ));
}
