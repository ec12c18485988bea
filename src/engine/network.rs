//! Belief network construction: parent resolution and depth layering.
//!
//! Nodes live in a single owned arena; parent links are integer indices into
//! that arena, never pointers, so the graph is trivially shareable across
//! worker threads once built. Construction resolves ids, computes the
//! longest root-to-node depth with an explicit worklist (no recursion), and
//! compiles every CPT. After [`BeliefNetwork::build`] returns the graph is
//! read-only.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::engine::cpt::CumulativeCpt;
use crate::engine::errors::SimError;

/// Index of a node in the network arena.
///
/// Implements Ord/PartialOrd for stable, deterministic iteration.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeIdx(pub u32);

/// Resolved input descriptor for one discrete variable.
///
/// Callers (or an external markup loader) hand these over with parent
/// references still as string ids and the CPT flattened in declared parent
/// order; [`BeliefNetwork::build`] does the rest.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeSpec {
    pub id: String,
    pub states: Vec<String>,
    pub parents: Vec<String>,
    pub cpt: Vec<f32>,
}

impl NodeSpec {
    pub fn new<I, S, P, C>(id: &str, states: S, parents: P, cpt: C) -> Self
    where
        S: IntoIterator<Item = I>,
        P: IntoIterator<Item = I>,
        I: Into<String>,
        C: IntoIterator<Item = f32>,
    {
        Self {
            id: id.to_string(),
            states: states.into_iter().map(Into::into).collect(),
            parents: parents.into_iter().map(Into::into).collect(),
            cpt: cpt.into_iter().collect(),
        }
    }
}

/// A fully resolved node: immutable after construction.
#[derive(Debug)]
pub struct Node {
    id: String,
    states: Vec<String>,
    parents: SmallVec<[NodeIdx; 4]>,
    cpt: CumulativeCpt,
    depth: u32,
}

impl Node {
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Number of states in this node's domain.
    #[inline]
    pub fn domain_size(&self) -> usize {
        self.states.len()
    }

    /// Parent indices in declared order.
    #[inline]
    pub fn parents(&self) -> &[NodeIdx] {
        &self.parents
    }

    #[inline]
    pub fn cpt(&self) -> &CumulativeCpt {
        &self.cpt
    }

    /// Longest root-to-node path length; roots have depth 0.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

/// A validated, read-only discrete Bayesian network.
#[derive(Debug)]
pub struct BeliefNetwork {
    nodes: Vec<Node>,
    index: FxHashMap<String, NodeIdx>,
    /// Node indices in ascending depth, declaration order breaking ties.
    order: Vec<NodeIdx>,
}

impl BeliefNetwork {
    /// Builds a network from resolved node descriptors.
    ///
    /// Construction fails fast: duplicate or empty-domain nodes are
    /// [`SimError::InvalidArgument`], an unresolved parent id is
    /// [`SimError::MissingParent`], a dependency cycle is
    /// [`SimError::CyclicGraph`], and a CPT whose length does not match
    /// own-domain x parent-domain product is [`SimError::ShapeMismatch`].
    /// Sampling never re-validates.
    pub fn build(specs: Vec<NodeSpec>) -> Result<Self, SimError> {
        let mut index = FxHashMap::default();
        for (i, spec) in specs.iter().enumerate() {
            if spec.states.is_empty() {
                return Err(SimError::InvalidArgument(format!(
                    "node `{}` has an empty state list",
                    spec.id
                )));
            }
            if index.insert(spec.id.clone(), NodeIdx(i as u32)).is_some() {
                return Err(SimError::InvalidArgument(format!(
                    "duplicate node id `{}`",
                    spec.id
                )));
            }
        }

        // Resolve parent ids into arena indices.
        let mut parents: Vec<SmallVec<[NodeIdx; 4]>> = Vec::with_capacity(specs.len());
        for spec in &specs {
            let mut resolved = SmallVec::with_capacity(spec.parents.len());
            for pid in &spec.parents {
                let Some(&pidx) = index.get(pid) else {
                    return Err(SimError::MissingParent {
                        node: spec.id.clone(),
                        parent: pid.clone(),
                    });
                };
                resolved.push(pidx);
            }
            parents.push(resolved);
        }

        let depths = compute_depths(&specs, &parents)?;

        // Compile CPTs against the resolved parent domains.
        let mut nodes = Vec::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            let parent_sizes: SmallVec<[usize; 4]> = parents[i]
                .iter()
                .map(|p| specs[p.0 as usize].states.len())
                .collect();
            let expected =
                spec.states.len() * parent_sizes.iter().product::<usize>();
            if spec.cpt.len() != expected {
                return Err(SimError::ShapeMismatch {
                    node: spec.id.clone(),
                    expected,
                    actual: spec.cpt.len(),
                });
            }
            let cpt = CumulativeCpt::compile(&spec.id, &spec.cpt, &parent_sizes)?;
            nodes.push(Node {
                id: spec.id.clone(),
                states: spec.states.clone(),
                parents: parents[i].clone(),
                cpt,
                depth: depths[i],
            });
        }

        // Ascending depth; sort_by_key is stable, so declaration order
        // breaks ties deterministically.
        let mut order: Vec<NodeIdx> = (0..nodes.len() as u32).map(NodeIdx).collect();
        order.sort_by_key(|idx| nodes[idx.0 as usize].depth);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "built belief network: {} nodes, max depth {}",
            nodes.len(),
            nodes.iter().map(Node::depth).max().unwrap_or(0)
        );

        Ok(Self {
            nodes,
            index,
            order,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.0 as usize]
    }

    /// Looks a node up by id.
    pub fn node_by_id(&self, id: &str) -> Option<(NodeIdx, &Node)> {
        self.index.get(id).map(|&idx| (idx, self.node(idx)))
    }

    /// Nodes in an order where every parent precedes its children.
    ///
    /// Sampling must consume this view; declaration order carries no
    /// ordering guarantee.
    pub fn topological_order(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.order.iter().copied()
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}

/// Longest-path depth per node via a Kahn-style worklist.
///
/// The child adjacency map is the inverted parent relation. A node is
/// visited once all parents are settled and takes `max(parent depth) + 1`,
/// so a diamond resolves to the longer path. Nodes left unvisited when the
/// worklist drains sit on a cycle.
fn compute_depths(
    specs: &[NodeSpec],
    parents: &[SmallVec<[NodeIdx; 4]>],
) -> Result<Vec<u32>, SimError> {
    let n = specs.len();
    let mut children: Vec<SmallVec<[u32; 4]>> = vec![SmallVec::new(); n];
    let mut pending: Vec<usize> = vec![0; n];
    for (i, ps) in parents.iter().enumerate() {
        pending[i] = ps.len();
        for p in ps {
            children[p.0 as usize].push(i as u32);
        }
    }

    let mut depths = vec![0u32; n];
    let mut queue: VecDeque<u32> = (0..n as u32).filter(|&i| pending[i as usize] == 0).collect();
    let mut visited = 0usize;

    while let Some(i) = queue.pop_front() {
        visited += 1;
        let d = depths[i as usize];
        for &c in &children[i as usize] {
            let c = c as usize;
            depths[c] = depths[c].max(d + 1);
            pending[c] -= 1;
            if pending[c] == 0 {
                queue.push_back(c as u32);
            }
        }
    }

    if visited < n {
        let nodes = specs
            .iter()
            .enumerate()
            .filter(|(i, _)| pending[*i] > 0)
            .map(|(_, s)| s.id.clone())
            .collect();
        return Err(SimError::CyclicGraph { nodes });
    }

    Ok(depths)
}
