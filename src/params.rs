//! Validated build parameters (C13).

use crate::error::{ConfigurationError, Result};

/// Minimum memory budget the classifier is willing to work with: the 4 MB floor
/// reserved for the colliding-ids sort in the reference implementation.
pub const MIN_MEMORY_BUDGET_BYTES: u64 = 4_000_000;

/// Parameters governing a single build of the index.
///
/// `k` and `m` bound the k-mer and minimizer widths; `seed` drives the
/// minimizer hash (C2); `canonical` toggles reverse-complement-aware
/// minimizer selection. `memory_budget_bytes` and `threads` size the
/// off-line external-sort / MPHF-construction stages; they have no effect
/// on the single-threaded per-contig scan (see the concurrency model).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Params {
    pub k: u8,
    pub m: u8,
    pub seed: u64,
    pub canonical: bool,
    pub memory_budget_bytes: u64,
    pub threads: usize,
}

impl Params {
    /// Build parameters with the reference implementation's defaults for
    /// the ambient knobs (single-threaded, minimum memory budget).
    pub fn new(k: u8, m: u8, seed: u64, canonical: bool) -> Self {
        Self {
            k,
            m,
            seed,
            canonical,
            memory_budget_bytes: MIN_MEMORY_BUDGET_BYTES,
            threads: 1,
        }
    }

    pub fn with_memory_budget_bytes(mut self, bytes: u64) -> Self {
        self.memory_budget_bytes = bytes;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Checks every error-visible condition from the external-interfaces
    /// section: `k < m`, `2m > 64`, `2k` exceeding the k-mer word width, and
    /// a memory budget below the classifier's own floor.
    pub fn validate(&self) -> Result<()> {
        let k = self.k as u32;
        let m = self.m as u32;

        if m == 0 || k < m {
            return Err(ConfigurationError::InvalidKM { k, m }.into());
        }
        if 2 * m > 64 {
            return Err(ConfigurationError::MinimizerTooWide { m, two_m: 2 * m }.into());
        }
        if 2 * k > 128 {
            return Err(ConfigurationError::KmerTooWide {
                k,
                two_k: 2 * k,
                max_bits: 128,
            }
            .into());
        }
        if self.memory_budget_bytes < MIN_MEMORY_BUDGET_BYTES {
            return Err(ConfigurationError::MemoryBudgetTooSmall {
                requested: self.memory_budget_bytes,
                minimum: MIN_MEMORY_BUDGET_BYTES,
            }
            .into());
        }
        Ok(())
    }

    /// Window width `w = k - m + 1`: the number of minimizer slots held live
    /// by the circular buffer, and the number of k-mers in a MAXIMAL
    /// super-k-mer.
    pub fn window_width(&self) -> u32 {
        (self.k - self.m) as u32 + 1
    }
}
