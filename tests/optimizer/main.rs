#![allow(clippy::cast_precision_loss, clippy::float_cmp)]

#[allow(dead_code)]
#[path = "../../benches/test_functions.rs"]
mod test_functions;

mod basic;
mod discrete;
mod hooks;
mod multi_dim;
mod reproducibility;
mod termination;
