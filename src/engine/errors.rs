//! Error types for network construction and sampling.

use thiserror::Error;

/// Errors that can occur while building a belief network or drawing samples
/// through it.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// without breaking changes. All public APIs return `Result<T, SimError>` to
/// avoid panics in library code; malformed input is reported once, at
/// construction time where possible, rather than deferred to sampling time.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SimError {
    /// CPT length inconsistent with the node's own and parent domain sizes.
    #[error("node `{node}`: CPT has {actual} entries, expected {expected}")]
    ShapeMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },

    /// A parent id does not resolve to any known node.
    #[error("node `{node}`: unknown parent `{parent}`")]
    MissingParent { node: String, parent: String },

    /// The parent links contain a cycle; no topological order exists.
    #[error("dependency cycle through nodes: {}", nodes.join(", "))]
    CyclicGraph { nodes: Vec<String> },

    /// A cumulative line does not cover the drawn uniform value
    /// (non-normalized probability table).
    #[error("sampling error: {0}")]
    Sampling(String),

    /// Invalid caller-supplied argument (zero sample count, zero workers,
    /// mismatched buffer dimensions).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A parallel worker failed; the whole estimate was aborted and any
    /// partial results discarded.
    #[error("worker failure: {0}")]
    WorkerFailure(String),
}
