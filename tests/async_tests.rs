//! Async integration tests for the optimizer.
//!
//! These tests are only compiled when the `async` feature is enabled.

#![cfg(feature = "async")]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cellopt::variable::variables_in_box;
use cellopt::{Error, Optimizer, Variable};

fn builder(seed: u64) -> cellopt::OptimizerBuilder {
    Optimizer::builder().seed(seed).max_cell_samples(30)
}

fn bowl(x: &[f64]) -> Result<f64, Error> {
    Ok(x.iter().map(|v| (v - 1.0).powi(2)).sum())
}

#[tokio::test]
async fn async_matches_sync_with_same_seed() {
    let optimizer = builder(42).concurrency(3).build().unwrap();

    let sync = optimizer
        .optimize(3, variables_in_box(2, -4.0, 4.0, 0.01), bowl)
        .unwrap();
    let async_result = optimizer
        .optimize_async(3, variables_in_box(2, -4.0, 4.0, 0.01), bowl)
        .await
        .unwrap();

    assert_eq!(sync, async_result);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_permit_gives_the_same_result() {
    let wide = builder(5).concurrency(8).build().unwrap();
    let narrow = builder(5).concurrency(1).build().unwrap();

    let a = wide
        .optimize_async(2, variables_in_box(3, -2.0, 2.0, 0.01), bowl)
        .await
        .unwrap();
    let b = narrow
        .optimize_async(2, variables_in_box(3, -2.0, 2.0, 0.01), bowl)
        .await
        .unwrap();

    assert_eq!(a, b);
}

#[tokio::test]
async fn async_objective_error_aborts() {
    let optimizer = builder(1).build().unwrap();

    let err = optimizer
        .optimize_async(2, vec![Variable::continuous(-10.0, 10.0)], |x: &[f64]| {
            if x[0] < -5.0 {
                Err("out of range")
            } else {
                Ok(x[0])
            }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Objective(ref msg) if msg == "out of range"));
}

#[tokio::test]
async fn async_zero_levels_evaluates_root_only() {
    let optimizer = builder(3).root_samples(12).build().unwrap();

    let result = optimizer
        .optimize_async(0, vec![Variable::continuous(0.0, 1.0)], bowl)
        .await
        .unwrap();

    assert_eq!(result.levels_completed, 0);
    assert_eq!(result.samples_per_level, vec![12]);
}

#[tokio::test]
async fn async_task_panic_is_reported() {
    let optimizer = builder(4).build().unwrap();

    let err = optimizer
        .optimize_async(1, vec![Variable::continuous(0.0, 1.0)], |x: &[f64]| {
            if x[0] >= 0.0 {
                panic!("objective blew up");
            }
            Ok::<_, Error>(x[0])
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TaskError(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failure_stops_queued_cell_tasks() {
    let optimizer = builder(6).concurrency(1).build().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    // The root batch succeeds; afterwards the lowest tenth of the axis fails
    // and every other point is slow.
    let objective = move |x: &[f64]| {
        if counter.fetch_add(1, Ordering::SeqCst) < 50 {
            return Ok(x[0]);
        }
        if x[0] < 0.1 {
            return Err("diverged");
        }
        std::thread::sleep(Duration::from_millis(2));
        Ok(x[0])
    };

    let err = optimizer
        .optimize_async(3, vec![Variable::continuous(0.0, 1.0)], objective)
        .await
        .unwrap_err();
    let at_return = calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(matches!(err, Error::Objective(ref msg) if msg == "diverged"));
    assert_eq!(calls.load(Ordering::SeqCst), at_return);
}
