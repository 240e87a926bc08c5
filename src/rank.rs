//! Category rank structure (C7): supports `type(i)` and `rank_of_type(i)`
//! over the tagged minimizer sequence.
//!
//! Built as a two-level binary wavelet tree over the 2-bit category
//! alphabet, atop `simple_sds::bit_vector::BitVector` (the generic
//! rank-supporting bitvector primitive) rather than four separate
//! per-category rank vectors — the standard succinct encoding of a
//! small-alphabet sequence.

use simple_sds::bit_vector::BitVector;
use simple_sds::ops::{Access, BitVec, Vector};
use serde::{Deserialize, Serialize};

/// Positional category of a minimizer within its super-k-mer (see the data
/// model). `RightOrCollision` covers both true right-maximal super-k-mers
/// and the collision sentinel; the distinction is made downstream by the
/// query engine inspecting the associated size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MinimizerCategory {
    Left,
    RightOrCollision,
    Maximal,
    None,
}

impl MinimizerCategory {
    fn code(self) -> u8 {
        match self {
            MinimizerCategory::Left => 0,
            MinimizerCategory::RightOrCollision => 1,
            MinimizerCategory::Maximal => 2,
            MinimizerCategory::None => 3,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryRank {
    #[serde(with = "simple_sds::serde_compat")]
    root: BitVector,
    #[serde(with = "simple_sds::serde_compat")]
    left: BitVector,
    #[serde(with = "simple_sds::serde_compat")]
    right: BitVector,
}

impl CategoryRank {
    /// Builds the rank structure over `tags`, in order.
    pub fn build(tags: &[MinimizerCategory]) -> Self {
        let span = tracing::debug_span!("build_category_rank", n = tags.len());
        let _enter = span.enter();

        let root_bits: Vec<bool> = tags.iter().map(|t| (t.code() >> 1) & 1 == 1).collect();
        let mut left_bits = Vec::new();
        let mut right_bits = Vec::new();
        for t in tags {
            let code = t.code();
            if code >> 1 == 0 {
                left_bits.push(code & 1 == 1);
            } else {
                right_bits.push(code & 1 == 1);
            }
        }

        let mut root = BitVector::from_iter(root_bits);
        root.enable_rank();
        let mut left = BitVector::from_iter(left_bits);
        left.enable_rank();
        let mut right = BitVector::from_iter(right_bits);
        right.enable_rank();

        Self { root, left, right }
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(type(i), rank_of_type(i))`: the category at position `i` and how
    /// many entries of that same category precede `i`.
    pub fn rank_of(&self, i: usize) -> (MinimizerCategory, u64) {
        let top_bit = self.root.get(i);
        let ones_before = self.root.rank(i) as u64;
        if !top_bit {
            let pos = i as u64 - ones_before;
            let pos_idx = pos as usize;
            let low_bit = self.left.get(pos_idx);
            let ones_before_low = self.left.rank(pos_idx) as u64;
            if !low_bit {
                (MinimizerCategory::Left, pos - ones_before_low)
            } else {
                (MinimizerCategory::RightOrCollision, ones_before_low)
            }
        } else {
            let pos = ones_before;
            let pos_idx = pos as usize;
            let low_bit = self.right.get(pos_idx);
            let ones_before_low = self.right.rank(pos_idx) as u64;
            if !low_bit {
                (MinimizerCategory::Maximal, pos - ones_before_low)
            } else {
                (MinimizerCategory::None, ones_before_low)
            }
        }
    }
}
