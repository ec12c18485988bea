//! Ancestral sampling of full joint assignments.
//!
//! One draw walks the network in topological order, pulls one uniform per
//! node, and inverts each node's cumulative CPT conditioned on the parent
//! states sampled earlier in the same draw. The graph is read-only during
//! sampling; the only observable mutation is advancing the random stream.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::engine::errors::SimError;
use crate::engine::network::{BeliefNetwork, NodeIdx};
use crate::engine::random::RandomStream;

/// One sampled joint assignment: a state index per node, indexed by
/// [`NodeIdx`]. Produced fresh per draw and never fed back into the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointSample {
    states: Vec<usize>,
}

impl JointSample {
    /// Sampled state index of a node.
    #[inline]
    pub fn state(&self, idx: NodeIdx) -> usize {
        self.states[idx.0 as usize]
    }

    /// All sampled states in arena (declaration) order.
    #[inline]
    pub fn states(&self) -> &[usize] {
        &self.states
    }
}

/// Draws full joint samples from a validated [`BeliefNetwork`].
///
/// The sampler assumes the graph passed validation at build time and does
/// not re-validate per draw.
#[derive(Debug, Clone, Copy)]
pub struct AncestralSampler<'g> {
    net: &'g BeliefNetwork,
}

impl<'g> AncestralSampler<'g> {
    pub fn new(net: &'g BeliefNetwork) -> Self {
        Self { net }
    }

    /// Draws one joint sample, consuming one uniform per node.
    pub fn sample(&self, rng: &mut RandomStream) -> Result<JointSample, SimError> {
        self.sample_inner(|_| rng.uniform())
    }

    /// Draws one joint sample from pre-drawn uniforms.
    ///
    /// `uniforms` must hold one value per node and is consumed in
    /// topological order: `uniforms[k]` feeds the k-th node of
    /// [`BeliefNetwork::topological_order`]. This is the bridge that lets a
    /// network act as a Monte Carlo generator with `input_dim` equal to the
    /// node count.
    pub fn sample_with(&self, uniforms: &[f32]) -> Result<JointSample, SimError> {
        if uniforms.len() != self.net.len() {
            return Err(SimError::InvalidArgument(format!(
                "expected {} uniforms, got {}",
                self.net.len(),
                uniforms.len()
            )));
        }
        self.sample_inner(|k| f64::from(uniforms[k]))
    }

    /// Generator-shaped adapter: samples a joint assignment from `uniforms`
    /// and writes the state indices into `out` as `f32`, in arena order.
    pub fn fill_states(&self, uniforms: &[f32], out: &mut [f32]) -> Result<(), SimError> {
        if out.len() != self.net.len() {
            return Err(SimError::InvalidArgument(format!(
                "expected output of {} states, got {}",
                self.net.len(),
                out.len()
            )));
        }
        let joint = self.sample_with(uniforms)?;
        for (slot, &state) in out.iter_mut().zip(joint.states()) {
            *slot = state as f32;
        }
        Ok(())
    }

    /// Draws `n` independent joint samples in parallel.
    ///
    /// Each trajectory owns a private stream seeded with
    /// `base_seed + trajectory_index`, so results are reproducible and
    /// independent of the rayon schedule.
    #[cfg(feature = "parallel")]
    pub fn sample_batch(&self, n: usize, base_seed: u64) -> Result<Vec<JointSample>, SimError> {
        (0..n)
            .into_par_iter()
            .map(|i| {
                let mut rng = RandomStream::seed_from_u64(base_seed.wrapping_add(i as u64));
                self.sample(&mut rng)
            })
            .collect()
    }

    fn sample_inner<F>(&self, mut uniform_for: F) -> Result<JointSample, SimError>
    where
        F: FnMut(usize) -> f64,
    {
        let mut states = vec![0usize; self.net.len()];
        for (k, idx) in self.net.topological_order().enumerate() {
            let node = self.net.node(idx);
            // Parents precede their children in this order, so their
            // states are already settled within this draw.
            let parent_states: SmallVec<[usize; 4]> = node
                .parents()
                .iter()
                .map(|p| states[p.0 as usize])
                .collect();
            let u = uniform_for(k);
            states[idx.0 as usize] = node.cpt().state_for(&parent_states, u)?;
        }
        Ok(JointSample { states })
    }
}
