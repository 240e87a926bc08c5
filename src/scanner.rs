//! Windowed minimizer scanner (C3): a single-pass, single-threaded-per-contig
//! sliding-window scan over one contig, emitting one record per super-k-mer.
//!
//! The circular buffer and the `p1`/`min_pos` bookkeeping follow the
//! reference implementation's `minimizer::from_string` exactly (see the
//! design notes on why a ring, not a deque, makes `p1` fall out of the
//! buffer index for free after a break).

use crate::hash::MinimizerHasher;
use crate::params::Params;

/// One minimizer-instance slot held live in the circular window.
#[derive(Clone, Copy, Debug, Default)]
struct MmSlot {
    /// Packed m-mer value (canonical if configured).
    itself: u64,
    /// Seeded hash of `itself`.
    hash: u64,
    /// Globally unique id assigned in emission order.
    id: u64,
    p1: u32,
    size: u32,
}

/// A super-k-mer record: the minimizer instance plus its position and run
/// length, ready to be sorted by `minimizer` and consumed by the classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuperKmerRecord {
    pub minimizer: u64,
    pub id: u64,
    pub p1: u32,
    pub size: u32,
}

/// Scans one contig, calling `emit` for every closed super-k-mer and
/// returning the number of k-mers the contig contributed.
///
/// `mm_count` is the process-wide minimizer-instance counter; callers
/// processing contigs in parallel must give each worker a disjoint range (or
/// make the counter atomic) since only equality comparisons against it
/// survive downstream.
pub fn scan_contig<H: MinimizerHasher>(
    contig: &[u8],
    params: &Params,
    hasher: &H,
    mm_count: &mut u64,
    mut emit: impl FnMut(SuperKmerRecord),
) -> u64 {
    let span = tracing::debug_span!("scan_contig", contig_len = contig.len());
    let _enter = span.enter();

    let k = params.k as u32;
    let m = params.m as u32;
    let w = params.window_width() as usize;
    let canonical = params.canonical;

    let shift = 2 * (m - 1);
    let mask: u64 = if m == 32 {
        u64::MAX
    } else {
        (1u64 << (2 * m)) - 1
    };

    let mut buffer = vec![MmSlot::default(); w];
    let mut buf_pos: usize = 0;
    let mut min_pos: usize = w; // w means "no minimum yet" (CLOSED state)
    let mut mm = [0u64, 0u64];
    let mut nbases_since_last_break: u64 = 0;
    let mut sks: u32 = 0;
    let mut p1: u32 = 0;
    let mut kmer_count: u64 = 0;
    let mut z: usize = 0;
    let mut find_brand_new_min = false;

    macro_rules! emit_slot {
        ($slot:expr) => {{
            let record = SuperKmerRecord {
                minimizer: $slot.itself,
                id: $slot.id,
                p1: $slot.p1,
                size: $slot.size,
            };
            tracing::trace!(
                minimizer = record.minimizer,
                id = record.id,
                p1 = record.p1,
                size = record.size,
                "emit super-k-mer"
            );
            emit(record);
        }};
    }

    for &byte in contig {
        let c = crate::alphabet::encode(byte);
        if c != crate::alphabet::BREAK {
            let c = c as u64;
            mm[0] = (mm[0] << 2 | c) & mask;
            mm[1] = (mm[1] >> 2) | ((3 ^ c) << shift);
            if canonical && mm[0] != mm[1] {
                z = if mm[0] < mm[1] { 0 } else { 1 };
            }
            nbases_since_last_break += 1;

            if nbases_since_last_break >= m as u64 {
                let mut current = MmSlot {
                    itself: mm[z],
                    hash: hasher.hash(mm[z]),
                    id: *mm_count,
                    p1: 0,
                    size: 0,
                };
                *mm_count += 1;

                if nbases_since_last_break == k as u64 {
                    kmer_count += 1;
                }

                if nbases_since_last_break == k as u64 + 1 {
                    // first full window after a break: scan it whole
                    min_pos = 0;
                    p1 = 0;
                    for j in 0..w {
                        if buffer[j].hash < buffer[min_pos].hash {
                            min_pos = j;
                            p1 = min_pos as u32;
                        }
                    }
                    sks = 1;
                }

                if nbases_since_last_break >= k as u64 + 1 {
                    debug_assert!(sks != 0);
                    debug_assert!(sks <= k - m + 1);
                    if buf_pos % w == min_pos {
                        // old minimum is about to be overwritten: it's final
                        buffer[min_pos].p1 = p1;
                        buffer[min_pos].size = sks;
                        emit_slot!(buffer[min_pos]);
                        sks = 0;
                        find_brand_new_min = true;
                    } else if current.hash < buffer[min_pos].hash {
                        buffer[min_pos].p1 = p1;
                        buffer[min_pos].size = sks;
                        emit_slot!(buffer[min_pos]);
                        sks = 0;
                        p1 = k - m;
                        min_pos = buf_pos;
                    }
                    sks += 1;
                    kmer_count += 1;
                }

                buffer[buf_pos] = current;
                buf_pos = (buf_pos + 1) % w;

                if find_brand_new_min {
                    find_brand_new_min = false;
                    min_pos = buf_pos;
                    p1 = 0;
                    let mut tmp: u32 = 1;
                    for j in (buf_pos + 1) % w..w {
                        if buffer[min_pos].hash > buffer[j].hash {
                            min_pos = j;
                            p1 = tmp;
                        }
                        tmp += 1;
                    }
                    for j in 0..=buf_pos {
                        if buffer[min_pos].hash > buffer[j].hash {
                            min_pos = j;
                            p1 = tmp;
                        }
                        tmp += 1;
                    }
                }
            }
        } else {
            tracing::debug!(kmer_count, "break encountered");
            nbases_since_last_break = 0;
            if min_pos < w {
                buffer[min_pos].p1 = p1;
                buffer[min_pos].size = sks;
                emit_slot!(buffer[min_pos]);
            }
            sks = 0;
            min_pos = w;
            buf_pos = 0;
        }
    }

    if nbases_since_last_break == k as u64 {
        // the whole contig (after the last break) is exactly one k-mer long
        min_pos = 0;
        p1 = 0;
        sks = 1;
        for j in 0..w {
            if buffer[j].hash < buffer[min_pos].hash {
                min_pos = j;
                p1 = min_pos as u32;
            }
        }
    }
    if min_pos < w {
        buffer[min_pos].p1 = p1;
        buffer[min_pos].size = sks;
        emit_slot!(buffer[min_pos]);
    }

    kmer_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::IdentityHasher;

    fn scan(contig: &[u8], k: u8, m: u8) -> (Vec<SuperKmerRecord>, u64) {
        let params = Params::new(k, m, 42, false);
        let mut mm_count = 0u64;
        let mut records = Vec::new();
        let kmer_count = scan_contig(contig, &params, &IdentityHasher, &mut mm_count, |r| {
            records.push(r)
        });
        (records, kmer_count)
    }

    #[test]
    fn single_kmer_contig() {
        // S2: "AAAAA", k=5, m=3: the only m-mer is "AAA" (value 0) at p1=0.
        let (records, kmer_count) = scan(b"AAAAA", 5, 3);
        assert_eq!(kmer_count, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].p1, 0);
        assert_eq!(records[0].size, 1);
    }

    #[test]
    fn every_record_respects_size_and_p1_bounds() {
        // S6-style sanity check (property 4) on a short fixed contig.
        let (records, _) = scan(b"ACGTACGTACGTACGTACGT", 7, 3);
        for r in &records {
            assert!(r.size >= 1 && r.size <= 5);
            assert!(r.p1 <= 4);
        }
    }

    #[test]
    fn break_splits_contig_into_independent_segments() {
        // A break resets window state; each side of length exactly k
        // contributes its own single-k-mer super-k-mer.
        let (records, kmer_count) = scan(b"ACGTTNACGTT", 5, 3);
        assert_eq!(kmer_count, 2);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn contig_shorter_than_k_contributes_nothing() {
        let (records, kmer_count) = scan(b"ACG", 5, 3);
        assert_eq!(kmer_count, 0);
        assert!(records.is_empty());
    }

    #[test]
    fn mm_count_advances_across_contigs() {
        let params = Params::new(5, 3, 42, false);
        let mut mm_count = 0u64;
        scan_contig(b"ACGTACGT", &params, &IdentityHasher, &mut mm_count, |_| {});
        let first_contig_count = mm_count;
        assert!(first_contig_count > 0);
        scan_contig(b"TTTTTTTT", &params, &IdentityHasher, &mut mm_count, |_| {});
        assert!(mm_count > first_contig_count);
    }

    #[quickcheck_macros::quickcheck]
    fn size_sums_to_kmer_count(seed: u64) -> bool {
        let bases = b"ACGT";
        let len = 200usize;
        let mut contig = Vec::with_capacity(len);
        let mut state = seed | 1;
        for _ in 0..len {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            contig.push(bases[(state % 4) as usize]);
        }
        let (records, kmer_count) = scan(&contig, 11, 5);
        let total: u64 = records.iter().map(|r| r.size as u64).sum();
        total == kmer_count
    }
}
