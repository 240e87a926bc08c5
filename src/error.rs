//! Error taxonomy for the k-mer MPHF build and query pipeline.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every fallible outcome exposed by this crate.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Invalid build parameters, or a temporary directory that cannot be used.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A malformed contig stream.
    #[error(transparent)]
    Input(#[from] InputError),

    /// A resource (disk, memory) could not be obtained.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// An internal invariant was violated; this indicates a bug in this crate.
    #[error(transparent)]
    Invariant(#[from] InternalInvariantViolation),

    /// A query-time failure.
    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("m must be >= 1 and k must be >= m, got k={k}, m={m}")]
    InvalidKM { k: u32, m: u32 },

    #[error("2*m must be <= 64, got m={m} (2m={two_m})")]
    MinimizerTooWide { m: u32, two_m: u32 },

    #[error("2*k must be <= {max_bits} (the k-mer word width), got k={k} (2k={two_k})")]
    KmerTooWide { k: u32, two_k: u32, max_bits: u32 },

    #[error("temporary directory {path} is not usable: {reason}")]
    UnusableTempDir { path: String, reason: String },

    #[error("memory budget {requested} bytes is smaller than the minimum required {minimum} bytes")]
    MemoryBudgetTooSmall { requested: u64, minimum: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("contig byte at position {pos} is not terminated correctly")]
    UnterminatedContig { pos: usize },

    #[error("invalid byte {byte:#04x} at contig position {pos} under strict parsing")]
    InvalidByte { byte: u8, pos: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("external sort ran out of disk space in {tmp_dir}")]
    OutOfDisk { tmp_dir: String },

    #[error("memory budget of {budget} bytes cannot accommodate a single run of {minimum_run} bytes")]
    MemoryBudgetUnsatisfiable { budget: u64, minimum_run: u64 },

    #[error("external sort failed: {message}")]
    ExternalSortIo { message: String },

    #[error("index persistence failed: {message}")]
    PersistenceIo { message: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalInvariantViolation {
    #[error("super-k-mer size {sks} exceeds the window width {window}")]
    SuperKmerSizeExceedsWindow { sks: u64, window: u64 },

    #[error("super-k-mer size {sks} does not match the buffered k-mer count {buffered}")]
    SuperKmerSizeMismatch { sks: u64, buffered: u64 },

    #[error("none_positions has {positions} entries but none_sizes has {sizes}")]
    OffsetArrayLengthMismatch { positions: usize, sizes: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unrecognized minimizer category tag {tag} at rank {rank}")]
    UnrecognizedCategory { tag: u8, rank: u64 },
}
