//! Query engine (C10): resolves a `(kmer, minimizer, position)` triplet to
//! its rank in `[0, nkmers)`. A direct port of `mphf::query`'s per-category
//! formula table.

use std::io::{self, Read, Write};

use crate::classify::UniqueMinimizerRecord;
use crate::error::{ResourceError, Result};
use crate::hash::MinimizerHasher;
use crate::kmer::Kmer;
use crate::mphf::Mphf;
use crate::params::Params;
use crate::rank::MinimizerCategory;
use crate::tagger::{self, TaggedIndex};

fn persistence_io_err(e: impl std::fmt::Display) -> crate::error::Error {
    ResourceError::PersistenceIo { message: e.to_string() }.into()
}

fn write_framed(output: &mut dyn Write, bytes: &[u8]) -> io::Result<()> {
    output.write_all(&(bytes.len() as u64).to_le_bytes())?;
    output.write_all(bytes)
}

fn read_framed(input: &mut dyn Read) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 8];
    input.read_exact(&mut len_buf)?;
    let len = u64::from_le_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    input.read_exact(&mut buf)?;
    Ok(buf)
}

/// The assembled, immutable index: everything a query needs, nothing it
/// doesn't. Built once by [`crate::build::build`], then read-only for the
/// lifetime of the process (or until reloaded from disk).
pub struct Index {
    params: Params,
    nkmers: u64,
    minimizer_mphf: Mphf,
    fallback_kmer_mphf: Mphf,
    tagged: TaggedIndex,
}

impl Index {
    pub(crate) fn assemble(
        params: Params,
        nkmers: u64,
        minimizer_mphf: Mphf,
        fallback_kmer_mphf: Mphf,
        unique_records: Vec<UniqueMinimizerRecord>,
    ) -> Self {
        let tagged = tagger::build(unique_records, &minimizer_mphf, &params);
        Self {
            params,
            nkmers,
            minimizer_mphf,
            fallback_kmer_mphf,
            tagged,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn kmer_count(&self) -> u64 {
        self.nkmers
    }

    /// Resolves one `(kmer, minimizer, position)` triplet, where `position`
    /// is the minimizer's offset from the left edge of the k-mer's window
    /// (`0..=k-m`).
    pub fn query(&self, kmer: &Kmer, minimizer: u64, position: u32) -> Result<u64> {
        let k = self.params.k as u32;
        let m = self.params.m as u32;
        let window_width = (k - m + 1) as u64;

        let mp_hash = self.minimizer_mphf.get_or_panic(&minimizer);
        let (category, mm_type_rank) = self.tagged.rank.rank_of(mp_hash as usize);

        let (global_rank, local_rank, is_maximal) = match category {
            MinimizerCategory::Left => {
                let global = self.tagged.offsets.access(mm_type_rank as usize);
                (global, position as u64, false)
            }
            MinimizerCategory::RightOrCollision => {
                let sk_size = self
                    .tagged
                    .offsets
                    .diff(self.tagged.right_coll_sizes_start + mm_type_rank as usize);
                if sk_size == 0 {
                    let global = self.tagged.offsets.access(self.tagged.none_pos_start);
                    // total function per the query contract: a kmer
                    // inconsistent with (minimizer, position) is the
                    // caller's contract violation, not ours, so this still
                    // resolves to some rank in [0, N) rather than erroring.
                    let local = self.fallback_kmer_mphf.get_or_panic(kmer);
                    (global, local, false)
                } else {
                    let global = self
                        .tagged
                        .offsets
                        .access(self.tagged.right_coll_sizes_start + mm_type_rank as usize);
                    let local = (k - m) as u64 - position as u64;
                    (global, local, false)
                }
            }
            MinimizerCategory::Maximal => {
                let global = window_width * mm_type_rank;
                (global, position as u64, true)
            }
            MinimizerCategory::None => {
                let global = self
                    .tagged
                    .offsets
                    .access(self.tagged.none_sizes_start + mm_type_rank as usize);
                let sk_size = self
                    .tagged
                    .offsets
                    .diff(self.tagged.none_pos_start + mm_type_rank as usize);
                let local = sk_size - position as u64;
                (global, local, false)
            }
        };

        let global_rank = if is_maximal {
            global_rank
        } else {
            global_rank + window_width * self.tagged.n_maximal
        };

        Ok(global_rank + local_rank)
    }

    /// Convenience wrapper mirroring the reference implementation's "dumb"
    /// evaluation path: recomputes each k-mer's minimizer independently
    /// (not via the streaming scanner) and resolves it. Quadratic in the
    /// window width; meant for tests and small-scale verification, not the
    /// hot query path.
    pub fn evaluate<H: MinimizerHasher>(&self, contig: &[u8], hasher: &H) -> Result<Vec<u64>> {
        let k = self.params.k as usize;
        let m = self.params.m as u8;
        if contig.len() < k {
            return Ok(Vec::new());
        }

        let mut results = Vec::with_capacity(contig.len() - k + 1);
        for i in 0..=contig.len() - k {
            let window = &contig[i..i + k];
            if !window.iter().all(|&b| crate::alphabet::is_base(b)) {
                // a break inside this window: no real k-mer starts here.
                continue;
            }
            let kmer = Kmer::from_bytes_checked(window)?;
            let (minimizer, position, strand) =
                naive_window_minimizer(window, m, self.params.canonical, hasher);
            // the fallback MPHF is keyed by whichever strand the winning
            // m-mer came from, mirroring the second-pass collector.
            let kmer = if strand == 1 {
                kmer.to_reverse_complement()
            } else {
                kmer
            };
            results.push(self.query(&kmer, minimizer, position)?);
        }
        Ok(results)
    }

    /// Serializes the full index into one length-prefixed binary container:
    /// the build parameters and k-mer count (`bincode`), the minimizer and
    /// fallback MPHF blobs (their own raw `io::Write` encoding), and the
    /// tagged rank/offsets structures (`bincode`, routed through
    /// `simple_sds`'s serde-compatible representation).
    pub fn save(&self, output: &mut dyn Write) -> Result<()> {
        let params_bytes = bincode::serialize(&self.params).map_err(persistence_io_err)?;
        write_framed(output, &params_bytes).map_err(persistence_io_err)?;

        write_framed(output, &self.nkmers.to_le_bytes()).map_err(persistence_io_err)?;

        let mut minimizer_mphf_bytes = Vec::new();
        self.minimizer_mphf
            .write(&mut minimizer_mphf_bytes)
            .map_err(persistence_io_err)?;
        write_framed(output, &minimizer_mphf_bytes).map_err(persistence_io_err)?;

        let mut fallback_mphf_bytes = Vec::new();
        self.fallback_kmer_mphf
            .write(&mut fallback_mphf_bytes)
            .map_err(persistence_io_err)?;
        write_framed(output, &fallback_mphf_bytes).map_err(persistence_io_err)?;

        let tagged_bytes = bincode::serialize(&self.tagged).map_err(persistence_io_err)?;
        write_framed(output, &tagged_bytes).map_err(persistence_io_err)?;

        Ok(())
    }

    /// Reconstructs an [`Index`] from bytes written by [`Index::save`].
    pub fn load(input: &mut dyn Read) -> Result<Self> {
        let params_bytes = read_framed(input).map_err(persistence_io_err)?;
        let params: Params = bincode::deserialize(&params_bytes).map_err(persistence_io_err)?;

        let nkmers_bytes = read_framed(input).map_err(persistence_io_err)?;
        let nkmers = u64::from_le_bytes(
            nkmers_bytes
                .try_into()
                .map_err(|_| persistence_io_err("corrupt k-mer count frame"))?,
        );

        let minimizer_mphf_bytes = read_framed(input).map_err(persistence_io_err)?;
        let minimizer_mphf =
            Mphf::read(&mut &minimizer_mphf_bytes[..]).map_err(persistence_io_err)?;

        let fallback_mphf_bytes = read_framed(input).map_err(persistence_io_err)?;
        let fallback_kmer_mphf =
            Mphf::read(&mut &fallback_mphf_bytes[..]).map_err(persistence_io_err)?;

        let tagged_bytes = read_framed(input).map_err(persistence_io_err)?;
        let tagged: TaggedIndex = bincode::deserialize(&tagged_bytes).map_err(persistence_io_err)?;

        Ok(Self {
            params,
            nkmers,
            minimizer_mphf,
            fallback_kmer_mphf,
            tagged,
        })
    }
}

/// Scans one k-mer-length window for its minimizer from scratch: the
/// leftmost m-mer (canonicalized if configured) with the smallest hash, its
/// 0-indexed offset from the window's left edge, and which strand (0
/// forward, 1 reverse-complement) the winning m-mer came from.
fn naive_window_minimizer<H: MinimizerHasher>(
    window: &[u8],
    m: u8,
    canonical: bool,
    hasher: &H,
) -> (u64, u32, u8) {
    let width = window.len() - m as usize + 1;
    let mut best_hash = u64::MAX;
    let mut best_value = 0u64;
    let mut best_pos = 0u32;
    let mut best_strand = 0u8;
    for start in 0..width {
        let sub = &window[start..start + m as usize];
        let fwd = Kmer::from_bytes_checked(sub).expect("window bytes already validated");
        let (value, strand) = if canonical {
            let rc = fwd.to_reverse_complement();
            if fwd <= rc {
                (fwd, 0u8)
            } else {
                (rc, 1u8)
            }
        } else {
            (fwd, 0u8)
        };
        let value = value.into_u128() as u64;
        let h = hasher.hash(value);
        if h < best_hash {
            best_hash = h;
            best_value = value;
            best_pos = start as u32;
            best_strand = strand;
        }
    }
    (best_value, best_pos, best_strand)
}
