/* mod declaration */
pub mod alphabet;
pub mod build;
pub mod classify;
pub mod collector;
pub mod error;
pub mod hash;
pub mod kmer;
pub mod mphf;
pub mod packed_offsets;
pub mod params;
pub mod query;
pub mod rank;
pub mod scanner;
pub mod sorted_stream;
pub mod tagger;
pub mod utils;

pub use build::build;
pub use error::{Error, Result};
pub use params::Params;
pub use query::Index;

#[cfg(test)]
extern crate quickcheck;

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;
