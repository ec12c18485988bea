//! # Credence
//!
//! Sampling engine for discrete Bayesian networks.
//!
//! Credence compiles conditional probability tables (CPTs) into a cumulative
//! form that supports inverse-CDF draws via binary search, layers the network
//! by longest root-to-node path so ancestral sampling never visits a child
//! before a parent, and reduces many independent draws to a mean estimate
//! with a fork-join parallel Monte Carlo estimator.
//!
//! ## Example
//!
//! ```rust,ignore
//! use credence::{AncestralSampler, BeliefNetwork, NodeSpec, RandomStream};
//!
//! let net = BeliefNetwork::build(vec![
//!     NodeSpec::new("rain", ["yes", "no"], [], [0.2, 0.8]),
//!     NodeSpec::new("wet", ["yes", "no"], ["rain"], [0.9, 0.1, 0.05, 0.95]),
//! ])?;
//!
//! let sampler = AncestralSampler::new(&net);
//! let mut rng = RandomStream::seed_from_u64(7);
//! let joint = sampler.sample(&mut rng)?;
//! ```

pub mod engine;

// Re-export commonly used types
pub use engine::cpt::CumulativeCpt;
pub use engine::errors::SimError;
pub use engine::estimator::estimate;
pub use engine::network::{BeliefNetwork, NodeIdx, NodeSpec};
pub use engine::parallel::{estimate_parallel, ParallelConfig};
pub use engine::random::RandomStream;
pub use engine::sampler::{AncestralSampler, JointSample};
