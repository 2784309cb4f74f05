use core::ops::ControlFlow;
use std::sync::{Arc, Mutex};

use cellopt::prelude::*;

struct StopAfter {
    levels: usize,
    seen: Arc<Mutex<Vec<LevelReport>>>,
}

impl StopAfter {
    fn new(levels: usize) -> (Self, Arc<Mutex<Vec<LevelReport>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let objective = Self {
            levels,
            seen: Arc::clone(&seen),
        };
        (objective, seen)
    }
}

impl Objective for StopAfter {
    type Error = Error;

    fn evaluate(&self, x: &[f64]) -> Result<f64> {
        Ok(x.iter().map(|v| (v - 0.5).powi(2)).sum())
    }

    fn after_level(&self, report: &LevelReport) -> ControlFlow<()> {
        let mut seen = self.seen.lock().unwrap();
        seen.push(report.clone());
        if seen.len() >= self.levels {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

fn vars() -> Vec<Variable> {
    cellopt::variable::variables_in_box(2, -2.0, 2.0, 0.01)
}

#[test]
fn break_stops_before_the_next_level() {
    let optimizer = Optimizer::builder().seed(9).max_cell_samples(30).build().unwrap();
    let (objective, seen) = StopAfter::new(2);

    let result = optimizer.optimize(10, vars(), objective).unwrap();

    assert_eq!(result.levels_completed, 2);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].level, 1);
    assert_eq!(seen[1].level, 2);
}

#[test]
fn reports_match_the_result_histories() {
    let optimizer = Optimizer::builder().seed(13).max_cell_samples(30).build().unwrap();
    let (objective, seen) = StopAfter::new(usize::MAX);

    let result = optimizer.optimize(3, vars(), objective).unwrap();
    let seen = seen.lock().unwrap();

    assert_eq!(seen.len(), result.levels_completed);
    for report in seen.iter() {
        assert_eq!(report.best_value, result.min_values_history[report.level]);
        assert_eq!(report.cutoff, result.cutoff_history[report.level]);
        assert_eq!(report.n_cells, result.cells_per_level[report.level]);
        assert_eq!(report.evaluations, result.samples_per_level[report.level]);
        assert!(report.best_value <= report.level_min);
        assert_eq!(report.best_point.len(), 2);
    }
}
