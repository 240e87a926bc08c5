//! Thin wrapper around the generic minimal-perfect-hash-function primitive
//! (black box per the purpose/scope section): `ph::fmph::Function`. Used for
//! both the minimizer MPHF (C5) and the fallback k-mer MPHF (C9) — they
//! differ only in the key type fed to `build`.

use std::hash::Hash;
use std::io;

use ph::fmph::{BuildConf, Function};

/// A minimal perfect hash function over a known, fixed key set.
pub struct Mphf {
    inner: Function,
}

impl Mphf {
    /// Builds an MPHF over `keys`. `keys` must contain no duplicates — the
    /// classifier (C4) and collector (C11) are responsible for that.
    pub fn build<K: Hash + Sync>(keys: &[K]) -> Self {
        let span = tracing::debug_span!("build_mphf", n_keys = keys.len());
        let _enter = span.enter();
        Self {
            inner: Function::from_slice_with_conf(keys, BuildConf::default()),
        }
    }

    /// Looks up `key`'s position in `[0, len())`. `None` only if `key` was
    /// not among the keys the function was built over.
    pub fn get<K: Hash + ?Sized>(&self, key: &K) -> Option<u64> {
        self.inner.get(key)
    }

    /// Like [`Mphf::get`], but panics instead of returning `None`. Use only
    /// when the caller already knows `key` was part of the build set.
    pub fn get_or_panic<K: Hash + ?Sized>(&self, key: &K) -> u64 {
        self.inner.get_or_panic(key)
    }

    /// Number of distinct keys the function was built over.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write(&self, output: &mut dyn io::Write) -> io::Result<()> {
        self.inner.write(output)
    }

    pub fn read(input: &mut dyn io::Read) -> io::Result<Self> {
        Ok(Self {
            inner: Function::read(input)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mphf_is_a_bijection_onto_0_len() {
        let keys: Vec<u64> = (0..500).map(|i| i * 7919).collect();
        let f = Mphf::build(&keys);
        assert_eq!(f.len(), keys.len());
        let mut seen = vec![false; keys.len()];
        for k in &keys {
            let h = f.get_or_panic(k) as usize;
            assert!(h < keys.len());
            assert!(!seen[h], "collision at {h}");
            seen[h] = true;
        }
        assert!(seen.into_iter().all(|b| b));
    }

    #[test]
    fn round_trips_through_write_read() {
        let keys: Vec<u64> = (0..200).collect();
        let f = Mphf::build(&keys);
        let mut buf = Vec::new();
        f.write(&mut buf).unwrap();
        let f2 = Mphf::read(&mut &buf[..]).unwrap();
        for k in &keys {
            assert_eq!(f.get(k), f2.get(k));
        }
    }
}
