//! Packed offsets array (C8): one monotone, bit-packed sequence shared by
//! all four tagged-category sub-arrays (`left_positions`, `right_or_collision
//! sizes`, `none_sizes`, `none_positions`), concatenated end to end exactly
//! as `mphf.cpp::build_inverted_index` lays them out before handing the
//! whole thing to its `sizes_and_positions` structure.
//!
//! Values are stored as prefix sums in a width-packed
//! `simple_sds::int_vector::IntVector`: `access(i)` returns the prefix sum up
//! to (not including) index `i`, and `diff(i) = access(i + 1) - access(i)`
//! recovers the original raw value at `i`.

use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Access, Push, Vector};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PackedOffsets {
    #[serde(with = "simple_sds::serde_compat")]
    prefix: IntVector,
}

impl PackedOffsets {
    /// Builds the structure from the raw (un-prefix-summed) per-entry
    /// values, in the concatenation order the tagger produces them.
    pub fn build(values: &[u64]) -> Self {
        let span = tracing::debug_span!("build_packed_offsets", n = values.len());
        let _enter = span.enter();

        let mut sum: u64 = 0;
        let mut prefix_vals = Vec::with_capacity(values.len() + 1);
        prefix_vals.push(0u64);
        for &v in values {
            sum += v;
            prefix_vals.push(sum);
        }

        let width = bits_needed(sum);
        let mut prefix = IntVector::with_capacity(prefix_vals.len(), width)
            .expect("bit width fits within IntVector's limits");
        for v in prefix_vals {
            prefix.push(v);
        }

        Self { prefix }
    }

    /// Number of raw entries (one less than the stored prefix-sum length).
    pub fn len(&self) -> usize {
        self.prefix.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exclusive prefix sum of the raw values up to (not including) `i`.
    pub fn access(&self, i: usize) -> u64 {
        self.prefix.get(i)
    }

    /// Recovers the raw value originally stored at index `i`.
    pub fn diff(&self, i: usize) -> u64 {
        self.access(i + 1) - self.access(i)
    }
}

fn bits_needed(max_value: u64) -> usize {
    if max_value == 0 {
        1
    } else {
        (64 - max_value.leading_zeros()) as usize
    }
}
