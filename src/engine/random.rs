//! Seedable uniform(0,1) random streams.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// A stream of uniform(0,1) draws backed by a PCG-32 generator.
///
/// PCG-32 has small state and is cheap to fork, so every worker in a
/// parallel estimate owns one independent stream seeded from a base seed
/// plus its worker index. Single draws are `f64`; [`fill`](Self::fill)
/// produces the single-precision input buffers consumed by generators.
#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: Pcg32,
}

impl RandomStream {
    /// Creates a stream seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Pcg32::from_entropy(),
        }
    }

    /// Creates a deterministic stream from a 64-bit seed.
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Draws one uniform value in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Fills `buf` with independent uniform values in `[0, 1)`.
    #[inline]
    pub fn fill(&mut self, buf: &mut [f32]) {
        for slot in buf.iter_mut() {
            *slot = self.rng.gen::<f32>();
        }
    }
}
