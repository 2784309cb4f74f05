use cellopt::prelude::*;

#[test]
fn discrete_axis_only_sees_integers() {
    let optimizer = Optimizer::builder().seed(17).max_cell_samples(20).build().unwrap();
    let vars = vec![
        Variable::discrete(-10.0, 10.0).with_min_width(1.0),
        Variable::continuous(-1.0, 1.0).with_min_width(0.05),
    ];

    let result = optimizer
        .optimize(3, vars, |x: &[f64]| {
            assert_eq!(x[0], x[0].round(), "non-integer coordinate {}", x[0]);
            Ok::<_, Error>((x[0] - 3.0).powi(2) + x[1] * x[1])
        })
        .unwrap();

    let p = &result.best_point;
    assert_eq!(p[0], p[0].round());
    assert!((result.best_value - ((p[0] - 3.0).powi(2) + p[1] * p[1])).abs() < 1e-12);
}

#[test]
fn discrete_point_stays_in_range() {
    let optimizer = Optimizer::builder().seed(6).build().unwrap();
    let vars = vec![Variable::discrete(0.0, 64.0).with_min_width(1.0)];

    let result = optimizer
        .optimize(4, vars, |x: &[f64]| Ok::<_, Error>((x[0] - 40.0).abs()))
        .unwrap();

    assert_eq!(result.best_point[0], result.best_point[0].round());
    assert!((0.0..=64.0).contains(&result.best_point[0]));
}
