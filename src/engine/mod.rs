//! The sampling engine for discrete belief networks.
//!
//! This module provides:
//! - **errors**: Error types for construction and sampling failures
//! - **random**: Seedable uniform(0,1) streams, one per worker
//! - **cpt**: CPT compilation into mixed-radix cumulative form
//! - **network**: Node arena, parent resolution, and depth layering
//! - **sampler**: Ancestral sampling of full joint assignments
//! - **estimator**: Sequential Monte Carlo mean estimation
//! - **parallel**: Fork-join parallel estimation

pub mod cpt;
pub mod errors;
pub mod estimator;
pub mod network;
pub mod parallel;
pub mod random;
pub mod sampler;
