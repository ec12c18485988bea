//! Fork-join parallel Monte Carlo estimation.
//!
//! [`estimate_parallel`] fans the sequential estimator out across worker
//! threads spawned and joined within the call; no pool survives it. Workers
//! share nothing mutable: the generator is borrowed immutably and every
//! worker owns a private random stream and private scratch buffers, so no
//! locks are involved.
//!
//! There is no cancellation or timeout: a generator that never returns
//! blocks the whole estimate.

use std::thread;

use crate::engine::errors::SimError;
use crate::engine::estimator::estimate;
use crate::engine::random::RandomStream;

/// Configuration for a parallel estimate.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Base seed; worker `w` runs on `base_seed + w`.
    pub base_seed: u64,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            base_seed: rand::random(),
        }
    }
}

/// Estimates the mean output of `generator` over `samples` draws, split
/// across `config.workers` threads.
///
/// Every requested draw is taken: worker `w` receives
/// `samples / workers` draws plus one of the `samples % workers` remainder
/// draws while they last, and partial means are recombined weighted by each
/// worker's share, so the result is the exact mean over all `samples` draws.
/// Workers whose share is zero are not spawned.
///
/// A worker that returns an error or panics aborts the whole estimate with
/// [`SimError::WorkerFailure`]; partial results are discarded, never
/// returned as if complete.
pub fn estimate_parallel<G>(
    samples: usize,
    in_dim: usize,
    out_dim: usize,
    generator: &G,
    config: &ParallelConfig,
) -> Result<Vec<f64>, SimError>
where
    G: Fn(&[f32], &mut [f32]) + Sync,
{
    if config.workers == 0 {
        return Err(SimError::InvalidArgument(
            "worker count must be positive".to_string(),
        ));
    }
    if samples == 0 {
        return Err(SimError::InvalidArgument(
            "sample count must be positive".to_string(),
        ));
    }
    if out_dim == 0 {
        return Err(SimError::InvalidArgument(
            "output dimension must be positive".to_string(),
        ));
    }

    let base = samples / config.workers;
    let remainder = samples % config.workers;
    let shares: Vec<usize> = (0..config.workers)
        .map(|w| base + usize::from(w < remainder))
        .filter(|&share| share > 0)
        .collect();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        "parallel estimate: {} draws over {} workers",
        samples,
        shares.len()
    );

    let partials = thread::scope(|scope| {
        let handles: Vec<_> = shares
            .iter()
            .enumerate()
            .map(|(w, &share)| {
                let seed = config.base_seed.wrapping_add(w as u64);
                scope.spawn(move || {
                    let mut rng = RandomStream::seed_from_u64(seed);
                    estimate(share, in_dim, out_dim, |i, o| generator(i, o), &mut rng)
                })
            })
            .collect();

        let mut partials = Vec::with_capacity(handles.len());
        let mut failure = None;
        for (w, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok(mean)) => partials.push(mean),
                Ok(Err(e)) => {
                    failure.get_or_insert(SimError::WorkerFailure(format!("worker {w}: {e}")));
                }
                Err(_) => {
                    failure
                        .get_or_insert(SimError::WorkerFailure(format!("worker {w} panicked")));
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(partials),
        }
    })?;

    // Share-weighted recombination: exact mean over all drawn samples.
    let mut acc = vec![0.0f64; out_dim];
    for (mean, &share) in partials.iter().zip(&shares) {
        for (a, &m) in acc.iter_mut().zip(mean) {
            *a += m * share as f64;
        }
    }
    let total = samples as f64;
    Ok(acc.into_iter().map(|a| a / total).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(workers: usize, seed: u64) -> ParallelConfig {
        ParallelConfig {
            workers,
            base_seed: seed,
        }
    }

    #[test]
    fn constant_generator_is_exact() {
        let gen = |_: &[f32], out: &mut [f32]| out.copy_from_slice(&[3.0]);
        let mean = estimate_parallel(10, 2, 1, &gen, &config(4, 1)).unwrap();
        assert_eq!(mean, vec![3.0]);
    }

    #[test]
    fn remainder_draws_are_not_dropped() {
        // 10 draws over 4 workers: shares [3, 3, 2, 2], all ten taken.
        let calls = AtomicUsize::new(0);
        let gen = |_: &[f32], out: &mut [f32]| {
            calls.fetch_add(1, Ordering::Relaxed);
            out[0] = 1.0;
        };
        let mean = estimate_parallel(10, 1, 1, &gen, &config(4, 2)).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 10);
        assert_eq!(mean, vec![1.0]);
    }

    #[test]
    fn more_workers_than_samples() {
        let calls = AtomicUsize::new(0);
        let gen = |_: &[f32], out: &mut [f32]| {
            calls.fetch_add(1, Ordering::Relaxed);
            out[0] = 2.0;
        };
        let mean = estimate_parallel(3, 1, 1, &gen, &config(8, 3)).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(mean, vec![2.0]);
    }

    #[test]
    fn identity_generator_converges_to_half() {
        let gen = |input: &[f32], out: &mut [f32]| out[0] = input[0];
        let mean = estimate_parallel(1_000_000, 1, 1, &gen, &config(4, 99)).unwrap();
        assert!((mean[0] - 0.5).abs() < 0.01, "mean was {}", mean[0]);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let gen = |input: &[f32], out: &mut [f32]| out[0] = input[0] * input[1];
        let a = estimate_parallel(10_000, 2, 1, &gen, &config(3, 7)).unwrap();
        let b = estimate_parallel(10_000, 2, 1, &gen, &config(3, 7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_workers_is_an_error() {
        let gen = |_: &[f32], _: &mut [f32]| {};
        let err = estimate_parallel(10, 1, 1, &gen, &config(0, 1)).unwrap_err();
        assert!(matches!(err, SimError::InvalidArgument(_)));
    }

    #[test]
    fn zero_samples_is_an_error() {
        let gen = |_: &[f32], _: &mut [f32]| {};
        let err = estimate_parallel(0, 1, 1, &gen, &config(4, 1)).unwrap_err();
        assert!(matches!(err, SimError::InvalidArgument(_)));
    }

    #[test]
    fn worker_panic_becomes_worker_failure() {
        let gen = |input: &[f32], _: &mut [f32]| {
            if input[0] >= 0.0 {
                panic!("generator blew up");
            }
        };
        let err = estimate_parallel(100, 1, 1, &gen, &config(2, 1)).unwrap_err();
        assert!(matches!(err, SimError::WorkerFailure(_)));
    }

    #[test]
    fn default_config_uses_available_parallelism() {
        let config = ParallelConfig::default();
        assert!(config.workers > 0);
    }
}
