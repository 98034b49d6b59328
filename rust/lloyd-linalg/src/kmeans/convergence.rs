// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

/// Outcome of one training iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    Continue,
    /// The squared center shift dropped below the tolerance.
    Converged,
    /// The iteration cap was reached without converging.
    MaxIterations,
}

/// Tracks center shift across iterations and decides when to stop.
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    tolerance: f32,
    max_iters: u32,
    iteration: u32,
    center_shift: f32,
}

impl ConvergenceMonitor {
    pub fn new(tolerance: f32, max_iters: u32) -> Self {
        Self {
            tolerance,
            max_iters,
            iteration: 0,
            center_shift: f32::INFINITY,
        }
    }

    /// Sum over centroids of the euclidean norm of their displacement.
    pub fn center_shift(previous: &[f32], next: &[f32], dimension: usize) -> f32 {
        previous
            .chunks_exact(dimension)
            .zip(next.chunks_exact(dimension))
            .map(|(p, n)| {
                p.iter()
                    .zip(n)
                    .map(|(a, b)| ((*a - *b) as f64).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .sum::<f64>() as f32
    }

    /// Record one iteration that moved the centroids from `previous` to `next`.
    pub fn observe(&mut self, previous: &[f32], next: &[f32], dimension: usize) -> ConvergenceStatus {
        self.iteration += 1;
        self.center_shift = Self::center_shift(previous, next, dimension);
        if self.squared_shift() < self.tolerance {
            ConvergenceStatus::Converged
        } else if self.iteration >= self.max_iters {
            ConvergenceStatus::MaxIterations
        } else {
            ConvergenceStatus::Continue
        }
    }

    /// Number of iterations observed so far.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Center shift of the last iteration.
    pub fn last_shift(&self) -> f32 {
        self.center_shift
    }

    /// The quantity compared against the tolerance.
    pub fn squared_shift(&self) -> f32 {
        self.center_shift * self.center_shift
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_center_shift_sums_norms() {
        let previous = [0.0, 0.0, 1.0, 1.0];
        let next = [3.0, 4.0, 1.0, 2.0];
        assert_relative_eq!(ConvergenceMonitor::center_shift(&previous, &next, 2), 6.0);
        assert_eq!(ConvergenceMonitor::center_shift(&next, &next, 2), 0.0);
    }

    #[test]
    fn test_converges_on_squared_shift() {
        // Shift 0.02 squares to 4e-4, shift 0.009 to 8.1e-5.
        let mut monitor = ConvergenceMonitor::new(1e-4, 100);
        assert_eq!(
            monitor.observe(&[0.0], &[0.02], 1),
            ConvergenceStatus::Continue
        );
        assert_eq!(
            monitor.observe(&[0.0], &[0.009], 1),
            ConvergenceStatus::Converged
        );
        assert_eq!(monitor.iteration(), 2);
        assert_relative_eq!(monitor.last_shift(), 0.009);
    }

    #[test]
    fn test_stops_at_max_iters() {
        let mut monitor = ConvergenceMonitor::new(1e-4, 3);
        let statuses = (0..3)
            .map(|_| monitor.observe(&[0.0], &[1.0], 1))
            .collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![
                ConvergenceStatus::Continue,
                ConvergenceStatus::Continue,
                ConvergenceStatus::MaxIterations
            ]
        );
    }

    #[test]
    fn test_convergence_wins_on_last_iteration() {
        let mut monitor = ConvergenceMonitor::new(1e-4, 1);
        assert_eq!(
            monitor.observe(&[1.0, 1.0], &[1.0, 1.0], 2),
            ConvergenceStatus::Converged
        );
    }
}
