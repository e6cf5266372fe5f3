//! Measuring how long executing algorithms takes.

use super::*;
use std::sync::atomic::{compiler_fence, Ordering::SeqCst};
use std::time::*;

/// Measure how long it takes to execute the given lambda,
/// print the time, report it as `running_time_ms` and return the result of the lambda.
pub fn report_time<Out, F: FnOnce() -> Out>(name: &str, f: F) -> Out {
    report_time_with_key(name, "running_time_ms", f)
}

/// Measure how long it takes to execute the given lambda,
/// print the time, report it under the given key and return the result of the lambda.
pub fn report_time_with_key<Out, F: FnOnce() -> Out>(name: &str, key: &'static str, f: F) -> Out {
    eprintln!("starting {}", name);
    let (res, t_passed) = measure(f);
    let t_passed = t_passed.as_secs_f64() * 1000.0;
    eprintln!("{} done - took: {}ms", name, t_passed);
    report!(key, t_passed);
    res
}

/// Measure how long it takes to execute the given lambda
/// and return a tuple of the result of the lambda and a duration object.
pub fn measure<Out, F: FnOnce() -> Out>(f: F) -> (Out, Duration) {
    compiler_fence(SeqCst);
    let start = Instant::now();
    let res = f();
    let t_passed = start.elapsed();
    compiler_fence(SeqCst);
    (res, t_passed)
}
