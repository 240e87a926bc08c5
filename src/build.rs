//! Build pipeline orchestrator (C15): turns a sequence of contigs into a
//! queryable [`Index`]. Ties together every other component in the order
//! the reference tool's driver does:
//!
//! 1. scan every contig into super-k-mer records (C3), counting k-mers
//! 2. externally sort those records by minimizer (black-box primitive)
//! 3. classify into unique vs. colliding minimizers (C4)
//! 4. build the minimizer MPHF over the distinct minimizer values (C5)
//! 5. externally sort the colliding ids by id ascending
//! 6. re-scan every contig to collect the actual colliding k-mers (C11)
//! 7. build the fallback k-mer MPHF over the collected k-mers (C9)
//! 8. tag unique minimizers and assemble the rank/offsets structures (C6/C7/C8),
//!    then hand everything to [`Index::assemble`] (C10)

use crate::classify::classify;
use crate::error::{ResourceError, Result};
use crate::hash::MinimizerHasher;
use crate::kmer::Kmer;
use crate::mphf::Mphf;
use crate::params::Params;
use crate::query::Index;
use crate::scanner::scan_contig;
use crate::sorted_stream::{sort_external, ByMinimizer, SortableId};

fn sort_io_err(e: std::io::Error) -> crate::error::Error {
    ResourceError::ExternalSortIo { message: e.to_string() }.into()
}

/// Size, in bytes, of one encoded [`crate::sorted_stream::ByMinimizer`] run
/// entry (two `u64`s, two `u32`s).
const SUPER_KMER_RECORD_BYTES: u64 = 24;
/// Size, in bytes, of one encoded colliding-id run entry.
const COLLIDING_ID_BYTES: u64 = 8;

/// Splits `budget` between the two external sorts the way the reference
/// classifier does: the colliding-ids sort gets the greater of 1% of the
/// minimizer-stream size or 4 MB, and the unique-minimizer sort gets
/// whatever remains, converted to an item count for each sort's segment size.
fn split_sort_budget(budget: u64, n_super_kmers: u64) -> (usize, usize) {
    let minimizer_stream_bytes = n_super_kmers * SUPER_KMER_RECORD_BYTES;
    let colliding_budget = (minimizer_stream_bytes / 100).max(4_000_000).min(budget);
    let main_budget = budget.saturating_sub(colliding_budget).max(SUPER_KMER_RECORD_BYTES);

    let main_segment_items = (main_budget / SUPER_KMER_RECORD_BYTES).max(1) as usize;
    let colliding_segment_items = (colliding_budget / COLLIDING_ID_BYTES).max(1) as usize;
    (main_segment_items, colliding_segment_items)
}

/// Builds an [`Index`] over `contigs` under `params`, using `hasher` to seed
/// every minimizer comparison.
///
/// `params` is validated first; every other failure surfaces as
/// [`crate::error::Error`] variants from the resource/invariant families.
pub fn build<H, C, I>(contigs: I, params: Params, hasher: &H) -> Result<Index>
where
    H: MinimizerHasher,
    C: AsRef<[u8]>,
    I: IntoIterator<Item = C>,
{
    params.validate()?;

    let span = tracing::debug_span!("build_index", k = params.k, m = params.m);
    let _enter = span.enter();

    let contigs: Vec<C> = contigs.into_iter().collect();

    let mut mm_count = 0u64;
    let mut super_kmers = Vec::new();
    let mut kmer_count = 0u64;
    for contig in &contigs {
        kmer_count += scan_contig(contig.as_ref(), &params, hasher, &mut mm_count, |r| {
            super_kmers.push(ByMinimizer(r));
        });
    }
    tracing::info!(kmer_count, n_super_kmers = super_kmers.len(), "scan complete");

    let (main_segment_items, colliding_segment_items) =
        split_sort_budget(params.memory_budget_bytes, super_kmers.len() as u64);

    let sorted_records = sort_external(super_kmers, main_segment_items, None).map_err(sort_io_err)?;

    let mut unique = Vec::new();
    let mut colliding_ids = Vec::new();
    classify(
        sorted_records.map(|r| r.0),
        |u| unique.push(u),
        |id| colliding_ids.push(SortableId(id)),
    );
    tracing::info!(
        n_unique = unique.len(),
        n_colliding_ids = colliding_ids.len(),
        "classification complete"
    );

    let minimizers: Vec<u64> = unique.iter().map(|u| u.minimizer).collect();
    let minimizer_mphf = Mphf::build(&minimizers);

    let sorted_colliding_ids =
        sort_external(colliding_ids, colliding_segment_items, None).map_err(sort_io_err)?;
    let mut ids_iter = sorted_colliding_ids.map(|s| s.0).peekable();

    let mut mm_count = 0u64;
    let mut colliding_kmers: Vec<Kmer> = Vec::new();
    let mut super_kmer_size_histogram: std::collections::HashMap<u32, u64> = std::collections::HashMap::new();
    for contig in &contigs {
        crate::collector::collect_colliding_kmers(
            contig.as_ref(),
            &params,
            hasher,
            &mut mm_count,
            &mut ids_iter,
            &mut super_kmer_size_histogram,
            |km| colliding_kmers.push(km),
        );
    }
    tracing::info!(
        n_colliding_kmers = colliding_kmers.len(),
        ?super_kmer_size_histogram,
        "collection complete"
    );

    let fallback_kmer_mphf = Mphf::build(&colliding_kmers);

    Ok(Index::assemble(
        params,
        kmer_count,
        minimizer_mphf,
        fallback_kmer_mphf,
        unique,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::IdentityHasher;

    #[test]
    fn builds_a_queryable_index_over_a_handful_of_contigs() {
        let params = Params::new(9, 5, 7, true);
        let contigs: Vec<&[u8]> = vec![b"ACGTACGTACGTACGTACGT", b"TTTTGGGGCCCCAAAATTTT", b"GATTACAGATTACAGATTACA"];
        let index = build(contigs.clone(), params, &IdentityHasher).unwrap();

        let mut seen = std::collections::HashSet::new();
        let mut total = 0usize;
        for contig in &contigs {
            let ranks = index.evaluate(contig, &IdentityHasher).unwrap();
            total += ranks.len();
            for r in ranks {
                assert!(r < index.kmer_count());
                seen.insert(r);
            }
        }
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn rejects_invalid_params_before_scanning_anything() {
        let params = Params::new(3, 5, 1, false);
        let contigs: Vec<&[u8]> = vec![b"ACGT"];
        assert!(build(contigs, params, &IdentityHasher).is_err());
    }

    #[test]
    fn split_sort_budget_gives_colliding_ids_the_floor_on_a_small_stream() {
        let (main_items, colliding_items) = split_sort_budget(crate::params::MIN_MEMORY_BUDGET_BYTES, 10);
        assert!(main_items >= 1);
        assert!(colliding_items >= 1);
        // with so few super-k-mers, 1% of the stream is tiny, so the 4 MB
        // floor dominates the colliding-ids share.
        assert_eq!(colliding_items as u64 * COLLIDING_ID_BYTES, 4_000_000);
    }

    #[test]
    fn split_sort_budget_never_panics_on_a_minimal_budget() {
        let (main_items, colliding_items) = split_sort_budget(SUPER_KMER_RECORD_BYTES, 0);
        assert!(main_items >= 1);
        assert!(colliding_items >= 1);
    }
}
