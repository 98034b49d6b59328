// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

/// Trait for observing the progress of an iterative training loop.
///
/// The training loop takes an `Arc<dyn IterationCallback>` and calls
/// [`IterationCallback::on_iteration`] once per completed iteration.
/// Callbacks only observe; they cannot change the outcome of training.
pub trait IterationCallback: Send + Sync {
    /// Called after iteration `iteration` (1-based) finished.
    ///
    /// `center_shift` is the value compared against `tolerance` to decide
    /// convergence.
    fn on_iteration(&self, iteration: u32, center_shift: f32, tolerance: f32);
}

#[derive(Debug, Default)]
pub struct NoopIterationCallback {}

impl IterationCallback for NoopIterationCallback {
    fn on_iteration(&self, _iteration: u32, _center_shift: f32, _tolerance: f32) {}
}

/// Reports every iteration through the `log` facade.
#[derive(Debug)]
pub struct LogIterationCallback {
    prefix: String,
}

impl LogIterationCallback {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LogIterationCallback {
    fn default() -> Self {
        Self::new("running kmeans")
    }
}

impl IterationCallback for LogIterationCallback {
    fn on_iteration(&self, iteration: u32, center_shift: f32, tolerance: f32) {
        log::info!(
            "[{}] iteration={} center_shift={:.6} tol={:.6}",
            self.prefix,
            iteration,
            center_shift,
            tolerance
        );
    }
}
