//! Sequential Monte Carlo mean estimation.
//!
//! [`estimate`] drives a caller-supplied generator with i.i.d. uniform
//! inputs and reduces the outputs to a per-component mean. Scratch buffers
//! are owned by the call frame, never thread-local, so the estimator is
//! reentrant and independently testable per call.

use crate::engine::errors::SimError;
use crate::engine::random::RandomStream;

/// Estimates the mean output of `generator` over `samples` uniform draws.
///
/// The generator is treated as pure: it receives an input slice of
/// `in_dim` uniforms in `[0, 1)` and writes `out_dim` values into an output
/// slice that is zeroed before every invocation. Outputs accumulate into an
/// `f64` accumulator regardless of the sample's `f32` precision, which keeps
/// long runs free of single-precision drift.
///
/// `samples == 0` is [`SimError::InvalidArgument`], not a silent NaN;
/// so is `out_dim == 0`.
pub fn estimate<G>(
    samples: usize,
    in_dim: usize,
    out_dim: usize,
    mut generator: G,
    rng: &mut RandomStream,
) -> Result<Vec<f64>, SimError>
where
    G: FnMut(&[f32], &mut [f32]),
{
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

    let mut input = vec![0.0f32; in_dim];
    let mut sample = vec![0.0f32; out_dim];
    let mut acc = vec![0.0f64; out_dim];

    for _ in 0..samples {
        rng.fill(&mut input);
        sample.fill(0.0);
        generator(&input, &mut sample);
        for (a, &s) in acc.iter_mut().zip(&sample) {
            *a += f64::from(s);
        }
    }

    let n = samples as f64;
    Ok(acc.into_iter().map(|a| a / n).collect())
}
