// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lloyd Authors

/// Environment variable overriding the number of threads used for compute
/// intensive work.
pub const CPU_THREADS_ENV: &str = "LLOYD_CPU_THREADS";

/// Number of threads to use for compute intensive tasks.
///
/// `LLOYD_CPU_THREADS` takes precedence when it holds a positive integer,
/// otherwise the number of logical CPUs is used.
pub fn get_num_compute_intensive_cpus() -> usize {
    if let Ok(user_specified) = std::env::var(CPU_THREADS_ENV) {
        match user_specified.trim().parse::<usize>() {
            Ok(n) if n > 0 => return n,
            _ => log::warn!(
                "Ignoring {}={:?}: expected a positive integer",
                CPU_THREADS_ENV,
                user_specified
            ),
        }
    }
    num_cpus::get().max(1)
}
