/// Generate a random `f64` in the range `[low, high)`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Derive `n` independent generators from `rng`, one per task.
///
/// Seeds are drawn in order, so the derived streams depend only on the
/// parent state and not on the order in which tasks later run.
pub(crate) fn fork_n(rng: &mut fastrand::Rng, n: usize) -> Vec<fastrand::Rng> {
    (0..n)
        .map(|_| fastrand::Rng::with_seed(rng.u64(..)))
        .collect()
}
