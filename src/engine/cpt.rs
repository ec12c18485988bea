//! Compiled conditional probability tables.
//!
//! A raw CPT arrives as a flat sequence of non-negative probabilities: one
//! line of `line_size` entries (the node's own domain) per joint parent
//! assignment, lines ordered by the mixed-radix encoding of the parent state
//! tuple in declared parent order. Compilation precomputes the per-parent
//! strides and per-line prefix sums, so one draw costs a dot product plus a
//! binary search over a single line.
//!
//! ## Precision
//!
//! Prefix sums are accumulated in `f32`, the table's native precision. Lines
//! are short (one entry per own-state), so accumulated drift stays well below
//! [`NORMALIZATION_EPS`]. The uniform draw itself is `f64` and compared
//! against widened `f32` cumulative values, which makes boundary results
//! reproducible across platforms.

use smallvec::SmallVec;

use crate::engine::errors::SimError;

/// Tolerance for treating a line's final cumulative value as 1.0.
///
/// A normalized table can land slightly below 1.0 after `f32` prefix
/// summation; a draw inside that gap is round-off, not a malformed table,
/// and clamps to the last state instead of failing.
pub const NORMALIZATION_EPS: f32 = 1e-4;

/// A CPT compiled into per-parent strides and per-line cumulative sums.
#[derive(Debug, Clone)]
pub struct CumulativeCpt {
    /// Stride per parent, in declared parent order: the product of all
    /// parent domain sizes strictly to the right, times the line size.
    /// The last entry equals `line_size` when any parents exist.
    radix: SmallVec<[usize; 4]>,
    /// Length of one line, i.e. the node's own domain size.
    line_size: usize,
    /// Prefix sums of the raw table, restarted at every line boundary.
    cumulative: Vec<f32>,
}

impl CumulativeCpt {
    /// Compiles a flat probability table against its parent domain sizes.
    ///
    /// Strides are derived by folding left-to-right over the domain sizes,
    /// starting from the total table length and dividing at each step; the
    /// value remaining after the last division is the line size. `node` is
    /// only used for diagnostics.
    ///
    /// Fails with [`SimError::ShapeMismatch`] when the table length does not
    /// factor cleanly over the parent domains, and with
    /// [`SimError::InvalidArgument`] on an empty table or a zero domain size.
    pub fn compile(
        node: &str,
        cpt: &[f32],
        parent_domain_sizes: &[usize],
    ) -> Result<Self, SimError> {
        if cpt.is_empty() {
            return Err(SimError::InvalidArgument(format!(
                "node `{node}`: empty probability table"
            )));
        }
        if parent_domain_sizes.iter().any(|&s| s == 0) {
            return Err(SimError::InvalidArgument(format!(
                "node `{node}`: parent domain size of zero"
            )));
        }

        let mut radix = SmallVec::new();
        let mut total = cpt.len();
        for &size in parent_domain_sizes {
            if total % size != 0 {
                return Err(SimError::ShapeMismatch {
                    node: node.to_string(),
                    expected: parent_domain_sizes.iter().product::<usize>(),
                    actual: cpt.len(),
                });
            }
            total /= size;
            radix.push(total);
        }
        let line_size = total;
        if line_size == 0 {
            return Err(SimError::ShapeMismatch {
                node: node.to_string(),
                expected: parent_domain_sizes.iter().product::<usize>(),
                actual: cpt.len(),
            });
        }

        // Prefix sums restart at the start of every line.
        let mut cumulative = Vec::with_capacity(cpt.len());
        for line in cpt.chunks_exact(line_size) {
            let mut acc = 0.0f32;
            for &p in line {
                acc += p;
                cumulative.push(acc);
            }
        }

        Ok(Self {
            radix,
            line_size,
            cumulative,
        })
    }

    /// The node's own domain size (entries per line).
    #[inline]
    pub fn line_size(&self) -> usize {
        self.line_size
    }

    /// Per-parent strides in declared parent order.
    #[inline]
    pub fn radix(&self) -> &[usize] {
        &self.radix
    }

    /// The full cumulative table.
    #[inline]
    pub fn cumulative(&self) -> &[f32] {
        &self.cumulative
    }

    /// Linear offset of the line addressed by a joint parent assignment.
    #[inline]
    fn line_offset(&self, parent_states: &[usize]) -> usize {
        parent_states
            .iter()
            .zip(&self.radix)
            .map(|(&s, &r)| s * r)
            .sum()
    }

    /// Samples a state index by inverse-CDF lookup.
    ///
    /// `parent_states` addresses one line via the mixed-radix strides; the
    /// returned index is the position of the first cumulative value strictly
    /// greater than `u`, found by binary search.
    ///
    /// When `u` is not covered by the line, the final cumulative value
    /// decides: within [`NORMALIZATION_EPS`] of 1.0 the draw clamps to the
    /// last state (float round-off of a normalized line), otherwise the
    /// table is genuinely non-normalized and [`SimError::Sampling`] is
    /// returned.
    pub fn state_for(&self, parent_states: &[usize], u: f64) -> Result<usize, SimError> {
        if parent_states.len() != self.radix.len() {
            return Err(SimError::InvalidArgument(format!(
                "expected {} parent states, got {}",
                self.radix.len(),
                parent_states.len()
            )));
        }
        let offset = self.line_offset(parent_states);
        let Some(line) = self.cumulative.get(offset..offset + self.line_size) else {
            return Err(SimError::InvalidArgument(format!(
                "parent state tuple {parent_states:?} is outside the table"
            )));
        };

        let idx = line.partition_point(|&c| f64::from(c) <= u);
        if idx < self.line_size {
            return Ok(idx);
        }

        let last = line[self.line_size - 1];
        if last >= 1.0 - NORMALIZATION_EPS {
            Ok(self.line_size - 1)
        } else {
            Err(SimError::Sampling(format!(
                "draw {u} exceeds cumulative line total {last} (non-normalized table)"
            )))
        }
    }
}
