//! Category tagger (C6): assigns every unique minimizer a position-derived
//! category and builds the rank/offsets structures the query engine reads
//! from. A faithful port of `mphf::build_inverted_index`, split from the
//! unique/collision separation which already happened upstream in
//! [`crate::classify`].

use crate::classify::UniqueMinimizerRecord;
use crate::mphf::Mphf;
use crate::params::Params;
use crate::packed_offsets::PackedOffsets;
use crate::rank::{CategoryRank, MinimizerCategory};
use serde::{Deserialize, Serialize};

/// Everything the query engine (C10) needs to resolve a minimizer's MPHF
/// rank into a global k-mer rank.
#[derive(Serialize, Deserialize)]
pub struct TaggedIndex {
    pub rank: CategoryRank,
    pub offsets: PackedOffsets,
    pub right_coll_sizes_start: usize,
    pub none_sizes_start: usize,
    pub none_pos_start: usize,
    pub n_maximal: u64,
}

/// Builds the tagged index from the classifier's unique-minimizer records
/// (collisions included, flagged by the `size == 0` sentinel) and the
/// already-built minimizer MPHF, which fixes the rank order every record
/// must be placed in.
pub fn build(mut records: Vec<UniqueMinimizerRecord>, minimizer_mphf: &Mphf, params: &Params) -> TaggedIndex {
    let span = tracing::debug_span!("build_tagged_index", n = records.len());
    let _enter = span.enter();

    records.sort_by_key(|r| minimizer_mphf.get_or_panic(&r.minimizer));

    let k = params.k as u32;
    let m = params.m as u32;
    let window_width = k - m + 1;

    let mut tags = Vec::with_capacity(records.len());
    let mut left_positions = Vec::new();
    let mut right_or_collision_sizes = Vec::new();
    let mut none_positions = Vec::new();
    let mut none_sizes = Vec::new();
    let mut n_maximal = 0u64;

    for r in &records {
        if r.size == 0 {
            tags.push(MinimizerCategory::RightOrCollision);
            right_or_collision_sizes.push(0u64);
        } else if r.p1 == k - m {
            if r.size == window_width {
                tags.push(MinimizerCategory::Maximal);
                n_maximal += 1;
            } else {
                tags.push(MinimizerCategory::RightOrCollision);
                right_or_collision_sizes.push(r.size as u64);
            }
        } else if r.p1 == r.size - 1 {
            tags.push(MinimizerCategory::Left);
            left_positions.push(r.p1 as u64 + 1);
        } else {
            tags.push(MinimizerCategory::None);
            none_positions.push(r.p1 as u64);
            none_sizes.push(r.size as u64);
        }
    }

    tracing::debug!(
        n_maximal,
        n_left = left_positions.len(),
        n_right_or_collision = right_or_collision_sizes.len(),
        n_none = none_positions.len(),
        "tagged minimizers"
    );

    let rank = CategoryRank::build(&tags);

    let right_coll_sizes_start = left_positions.len();
    let mut combined = left_positions;
    combined.extend(right_or_collision_sizes);
    let none_sizes_start = combined.len();
    combined.extend(none_sizes);
    let none_pos_start = combined.len();
    combined.extend(none_positions);

    let offsets = PackedOffsets::build(&combined);

    TaggedIndex {
        rank,
        offsets,
        right_coll_sizes_start,
        none_sizes_start,
        none_pos_start,
        n_maximal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(minimizer: u64, p1: u32, size: u32) -> UniqueMinimizerRecord {
        UniqueMinimizerRecord { minimizer, p1, size }
    }

    #[test]
    fn maximal_and_left_and_none_and_collision_all_land_in_distinct_categories() {
        // k - m = 2, window_width = 3.
        let params = Params::new(5, 3, 1, false);
        let records = vec![
            rec(10, 2, 3), // p1 == k-m, size == window_width -> MAXIMAL
            rec(20, 1, 2), // p1 == size - 1 -> LEFT
            rec(30, 0, 2), // p1 != k-m, p1 != size-1 -> NONE
            rec(40, 0, 0), // collision sentinel -> RIGHT_OR_COLLISION
            rec(50, 2, 1), // p1 == k-m but size != window_width -> RIGHT_OR_COLLISION (right)
        ];
        let minimizers: Vec<u64> = records.iter().map(|r| r.minimizer).collect();
        let mphf = Mphf::build(&minimizers);
        let tagged = build(records, &mphf, &params);

        assert_eq!(tagged.n_maximal, 1);
        assert_eq!(tagged.rank.len(), 5);

        let mut counts = [0u64; 4];
        for i in 0..5 {
            let (cat, _) = tagged.rank.rank_of(i);
            counts[match cat {
                MinimizerCategory::Left => 0,
                MinimizerCategory::RightOrCollision => 1,
                MinimizerCategory::Maximal => 2,
                MinimizerCategory::None => 3,
            }] += 1;
        }
        assert_eq!(counts, [1, 2, 1, 1]);
    }

    #[test]
    fn offsets_start_indices_partition_the_combined_array() {
        let params = Params::new(5, 3, 1, false);
        let records = vec![rec(1, 1, 2), rec(2, 0, 2), rec(3, 0, 0)];
        let minimizers: Vec<u64> = records.iter().map(|r| r.minimizer).collect();
        let mphf = Mphf::build(&minimizers);
        let tagged = build(records, &mphf, &params);

        assert_eq!(tagged.right_coll_sizes_start, 1); // one LEFT entry
        assert!(tagged.none_sizes_start >= tagged.right_coll_sizes_start);
        assert!(tagged.none_pos_start >= tagged.none_sizes_start);
    }
}
