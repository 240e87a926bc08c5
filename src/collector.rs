//! Second-pass colliding-k-mer collector (C11): re-scans a contig, this
//! time tracking each live super-k-mer's actual k-mer content, and emits
//! that content whenever the closing super-k-mer's minimizer instance id is
//! one of the (sorted) colliding ids produced by the classifier.
//!
//! A deliberate near-duplicate of [`crate::scanner::scan_contig`]'s state
//! machine rather than a generalization of it: the reference implementation
//! keeps these as two separate functions too, since the inner loop carries
//! different payloads (a rolling k-mer buffer here, nothing there).

use std::collections::HashMap;

use crate::hash::MinimizerHasher;
use crate::kmer::Kmer;
use crate::params::Params;

#[derive(Clone, Copy, Default)]
struct KmSlot {
    hash: u64,
    id: u64,
}

/// Scans `contig`, draining `colliding_ids` (sorted ascending, shared across
/// every contig in the input) in lockstep, and calling `emit_kmer` once for
/// every k-mer belonging to a super-k-mer whose minimizer instance id was
/// flagged as colliding. Every closed super-k-mer, colliding or not,
/// increments `size_histogram[size]`, mirroring the reference's
/// `statistics` map.
pub fn collect_colliding_kmers<H, I>(
    contig: &[u8],
    params: &Params,
    hasher: &H,
    mm_count: &mut u64,
    colliding_ids: &mut std::iter::Peekable<I>,
    size_histogram: &mut HashMap<u32, u64>,
    mut emit_kmer: impl FnMut(Kmer),
) where
    H: MinimizerHasher,
    I: Iterator<Item = u64>,
{
    let span = tracing::debug_span!("collect_colliding_kmers", contig_len = contig.len());
    let _enter = span.enter();

    let k = params.k as u32;
    let m = params.m as u32;
    let w = params.window_width() as usize;
    let canonical = params.canonical;

    let mm_shift = 2 * (m - 1);
    let mm_mask: u64 = if m == 32 { u64::MAX } else { (1u64 << (2 * m)) - 1 };
    let km_shift = 2 * (k - 1);
    let km_mask: u128 = if k == 64 { u128::MAX } else { (1u128 << (2 * k)) - 1 };

    let mut mm_buffer = vec![KmSlot::default(); w];
    let mut km_buffer: Vec<u128> = Vec::with_capacity(2 * k as usize);
    let mut mm_buf_pos: usize = 0;
    let mut min_pos: usize = w;
    let mut mm = [0u64, 0u64];
    let mut km = [0u128, 0u128];
    let mut nbases_since_last_break: u64 = 0;
    let mut sks: u32 = 0;
    let mut z: usize = 0;
    let mut find_brand_new_min = false;

    macro_rules! flush_if_colliding {
        ($id:expr, $size:expr) => {{
            *size_histogram.entry($size).or_insert(0) += 1;
            if colliding_ids.peek() == Some(&$id) {
                for &word in &km_buffer {
                    emit_kmer(Kmer::from_u128(word, params.k));
                }
                colliding_ids.next();
            }
            km_buffer.clear();
        }};
    }

    for &byte in contig {
        let c = crate::alphabet::encode(byte);
        if c != crate::alphabet::BREAK {
            let c = c as u64;
            mm[0] = (mm[0] << 2 | c) & mm_mask;
            mm[1] = (mm[1] >> 2) | ((3 ^ c) << mm_shift);
            let cu = c as u128;
            km[0] = (km[0] << 2 | cu) & km_mask;
            km[1] = (km[1] >> 2) | ((3u128 ^ cu) << km_shift);
            if canonical && mm[0] != mm[1] {
                z = if mm[0] < mm[1] { 0 } else { 1 };
            }
            nbases_since_last_break += 1;

            if nbases_since_last_break >= m as u64 {
                let current = KmSlot {
                    hash: hasher.hash(mm[z]),
                    id: *mm_count,
                };
                *mm_count += 1;

                if nbases_since_last_break == k as u64 + 1 {
                    min_pos = 0;
                    for j in 0..w {
                        if mm_buffer[j].hash < mm_buffer[min_pos].hash {
                            min_pos = j;
                        }
                    }
                    sks = 1;
                }

                if nbases_since_last_break >= k as u64 + 1 {
                    if mm_buf_pos % w == min_pos || current.hash < mm_buffer[min_pos].hash {
                        flush_if_colliding!(mm_buffer[min_pos].id, sks);
                        if mm_buf_pos % w == min_pos {
                            find_brand_new_min = true;
                        } else {
                            min_pos = mm_buf_pos;
                        }
                        sks = 0;
                    }
                    sks += 1;
                }

                mm_buffer[mm_buf_pos] = current;
                mm_buf_pos = (mm_buf_pos + 1) % w;
                if nbases_since_last_break >= k as u64 {
                    km_buffer.push(km[z]);
                }

                if find_brand_new_min {
                    find_brand_new_min = false;
                    min_pos = mm_buf_pos;
                    for j in (mm_buf_pos + 1) % w..w {
                        if mm_buffer[min_pos].hash > mm_buffer[j].hash {
                            min_pos = j;
                        }
                    }
                    for j in 0..=mm_buf_pos {
                        if mm_buffer[min_pos].hash > mm_buffer[j].hash {
                            min_pos = j;
                        }
                    }
                }
            }
        } else {
            nbases_since_last_break = 0;
            if min_pos < w {
                flush_if_colliding!(mm_buffer[min_pos].id, sks);
            }
            km_buffer.clear();
            min_pos = w;
            sks = 0;
            mm_buf_pos = 0;
        }
    }

    if nbases_since_last_break == k as u64 {
        min_pos = 0;
        sks = 1;
        for j in 0..w {
            if mm_buffer[j].hash < mm_buffer[min_pos].hash {
                min_pos = j;
            }
        }
    }
    if min_pos < w {
        flush_if_colliding!(mm_buffer[min_pos].id, sks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::IdentityHasher;
    use crate::scanner::scan_contig;

    #[test]
    fn collecting_no_ids_emits_nothing() {
        let params = Params::new(7, 3, 1, false);
        let mut mm_count = 0u64;
        let mut ids: std::iter::Peekable<std::vec::IntoIter<u64>> = Vec::new().into_iter().peekable();
        let mut out = Vec::new();
        let mut histogram = HashMap::new();
        collect_colliding_kmers(
            b"ACGTACGTACGTGGAT",
            &params,
            &IdentityHasher,
            &mut mm_count,
            &mut ids,
            &mut histogram,
            |k| out.push(k),
        );
        assert!(out.is_empty());
        assert!(!histogram.is_empty());
    }

    #[test]
    fn collecting_every_minimizer_id_emits_every_kmer_of_the_contig() {
        let params = Params::new(7, 3, 1, false);
        let contig: &[u8] = b"ACGTACGTACGTGGAT";

        let mut mm_count_scan = 0u64;
        let mut all_ids = Vec::new();
        scan_contig(contig, &params, &IdentityHasher, &mut mm_count_scan, |r| {
            all_ids.push(r.id)
        });
        all_ids.sort_unstable();

        let mut mm_count = 0u64;
        let mut ids = all_ids.into_iter().peekable();
        let mut out = Vec::new();
        let mut histogram = HashMap::new();
        collect_colliding_kmers(
            contig,
            &params,
            &IdentityHasher,
            &mut mm_count,
            &mut ids,
            &mut histogram,
            |k| out.push(k),
        );
        assert_eq!(out.len(), contig.len() - 7 + 1);
        let total: u64 = histogram.iter().map(|(&size, &count)| size as u64 * count).sum();
        assert_eq!(total, scan_contig(contig, &params, &IdentityHasher, &mut 0u64, |_| {}));
    }
}
