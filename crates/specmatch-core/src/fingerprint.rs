//! Stable fingerprint of index-affecting configuration.
//!
//! Only the keys in [`Config::INDEX_AFFECTING_KEYS`] participate: `min_mz`, `max_mz`,
//! `bin_size`, `num_trees`. Anything else (tolerance, thread count, `top`) can change
//! between runs without invalidating a persisted ANN index.

use crate::config::Config;
use sha1::{Digest, Sha1};

/// Full fingerprint hex digest plus its 7-char filename suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    digest: String,
}

impl Fingerprint {
    /// First 7 hex characters, as embedded in persisted index filenames.
    pub fn short(&self) -> &str {
        &self.digest[..7]
    }

    /// Full hex digest.
    pub fn full(&self) -> &str {
        &self.digest
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// Compute the config fingerprint used to gate ANN index reuse.
///
/// Canonicalizes the index-affecting keys into a sorted `key=value` string and hashes
/// it with SHA-1 — the same scheme used by the spectral-library reader this engine was
/// ported from, kept here so pre-existing index files on disk remain valid.
pub fn config_fingerprint(config: &Config) -> Fingerprint {
    let mut pairs: Vec<(&'static str, String)> = vec![
        ("min_mz", format!("{:.6}", config.min_mz)),
        ("max_mz", format!("{:.6}", config.max_mz)),
        ("bin_size", format!("{:.6}", config.bin_size)),
        ("num_trees", config.num_trees.to_string()),
    ];
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let canonical = pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",");

    let mut hasher = Sha1::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    Fingerprint {
        digest: hex_encode(&digest),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{:02x}", b).unwrap();
    }
    s
}

/// Build the persisted index filename for one charge state: `<lib-stem>_<fp7>_<charge>.idxann`.
pub fn index_filename(lib_stem: &str, fp: &Fingerprint, charge: i8) -> String {
    format!("{}_{}_{}.idxann", lib_stem, fp.short(), charge)
}
