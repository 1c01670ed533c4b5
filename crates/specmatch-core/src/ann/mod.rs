//! ANN Index Manager (C2).
//!
//! Owns the lifecycle of per-charge [`forest::RPForest`] indices: building them from
//! library vectors, persisting them atomically, and serving queries through a
//! single-slot [`cache::IndexCache`]. Concurrency: index *load* is serialized by the
//! cache's mutex; index *build* is parallelized across distinct charges by the caller
//! (the search driver's bounded worker pool — §5 of the design), since each charge's
//! build touches no shared mutable state beyond its own output file.

pub mod cache;
pub mod forest;

use crate::config::Config;
use crate::error::{SearchError, SearchResult};
use crate::fingerprint::{index_filename, Fingerprint};
use crate::persistence::directory::Directory;
use cache::IndexCache;
use forest::{RPForest, RPForestParams, RPTreeParams};

/// Coordinates build/load/query/unload for one library's ANN indices across all charges.
pub struct IndexManager {
    cache: IndexCache,
    lib_stem: String,
}

impl IndexManager {
    pub fn new(lib_stem: impl Into<String>) -> Self {
        Self {
            cache: IndexCache::new(),
            lib_stem: lib_stem.into(),
        }
    }

    fn filename(&self, fp: &Fingerprint, charge: i8) -> String {
        index_filename(&self.lib_stem, fp, charge)
    }

    /// Build and atomically persist the index for one charge. Deterministic: the forest
    /// is always seeded with `0`.
    pub fn build(
        &self,
        dir: &dyn Directory,
        config: &Config,
        fp: &Fingerprint,
        charge: i8,
        vectors: &[Vec<f32>],
    ) -> SearchResult<()> {
        if vectors.is_empty() {
            return Err(SearchError::BackendFailure(format!(
                "no library vectors to index for charge {}",
                charge
            )));
        }
        let dim = config.vector_dim();
        let mut forest = RPForest::new(
            dim,
            RPForestParams {
                num_trees: config.num_trees,
                tree_params: RPTreeParams::default(),
                seed: 0,
            },
        )?;
        for v in vectors {
            forest.add(v)?;
        }
        forest.build()?;

        let bytes = postcard::to_allocvec(&forest)
            .map_err(|e| SearchError::BackendFailure(format!("encoding ANN index: {}", e)))?;
        let filename = self.filename(fp, charge);
        dir.atomic_write(&filename, &bytes)?;
        tracing::info!(charge, vectors = vectors.len(), %filename, "built ANN index");
        Ok(())
    }

    /// `true` if a persisted index file exists for `charge` under the current fingerprint.
    pub fn exists(&self, dir: &dyn Directory, fp: &Fingerprint, charge: i8) -> bool {
        dir.exists(&self.filename(fp, charge))
    }

    /// Query the `charge` index for the `k` nearest neighbors of `vector`, returning
    /// local (per-charge) indices. Returns `Ok(None)` if no index is persisted for this
    /// charge — callers degrade to the pure mass filter.
    pub fn query(
        &self,
        dir: &dyn Directory,
        fp: &Fingerprint,
        charge: i8,
        vector: &[f32],
        k: usize,
    ) -> SearchResult<Option<Vec<(u32, f32)>>> {
        let filename = self.filename(fp, charge);
        self.cache
            .with_index(dir, &filename, charge, |forest| forest.search(vector, k))
            .and_then(|opt| opt.transpose())
    }

    pub fn unload_all(&self) {
        self.cache.unload_all();
    }

    pub fn loaded_charge(&self) -> Option<i8> {
        self.cache.loaded_charge()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::directory::FsDirectory;

    fn test_config() -> Config {
        Config {
            min_mz: 0.0,
            max_mz: 4.0,
            bin_size: 1.0,
            num_trees: 3,
            ..Config::default()
        }
    }

    #[test]
    fn build_then_query_roundtrip() {
        let dir = FsDirectory::new(std::env::temp_dir().join("specmatch_ann_mgr_roundtrip")).unwrap();
        let cfg = test_config();
        let fp = crate::fingerprint::config_fingerprint(&cfg);
        let manager = IndexManager::new("test_lib");

        let vectors: Vec<Vec<f32>> = (0..20)
            .map(|i| vec![i as f32, (20 - i) as f32, 0.0, 1.0])
            .collect();
        manager.build(&dir, &cfg, &fp, 2, &vectors).unwrap();
        assert!(manager.exists(&dir, &fp, 2));

        let query = vectors[5].clone();
        let results = manager.query(&dir, &fp, 2, &query, 3).unwrap().unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= 3);
    }

    #[test]
    fn missing_charge_query_returns_none() {
        let dir = FsDirectory::new(std::env::temp_dir().join("specmatch_ann_mgr_missing")).unwrap();
        let cfg = test_config();
        let fp = crate::fingerprint::config_fingerprint(&cfg);
        let manager = IndexManager::new("test_lib");
        let result = manager.query(&dir, &fp, 3, &[0.0, 0.0, 0.0, 0.0], 5).unwrap();
        assert!(result.is_none());
    }
}
