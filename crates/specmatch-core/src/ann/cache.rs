//! Single-slot ANN index cache (C2).
//!
//! Only one charge's index is ever resident: each index can be hundreds of megabytes,
//! and the search driver (C5) already sorts queries by `(charge, mz)` so that charge
//! transitions are rare. Loading is serialized by a process-wide mutex; a loaded handle
//! is reused across queries of the same charge without re-reading the file.

use super::forest::RPForest;
use crate::error::SearchError;
use crate::persistence::directory::Directory;
use std::sync::Mutex;

struct Slot {
    charge: i8,
    forest: RPForest,
}

/// Owns at most one loaded [`RPForest`] at a time, guarded by a mutex.
pub struct IndexCache {
    slot: Mutex<Option<Slot>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self { slot: Mutex::new(None) }
    }

    /// Run `f` against the index for `charge`, loading it from `dir`/`filename` first if
    /// the cache is empty or holds a different charge. Returns `Ok(None)` if the backing
    /// file does not exist — callers degrade to the pure mass filter in that case.
    pub fn with_index<R>(
        &self,
        dir: &dyn Directory,
        filename: &str,
        charge: i8,
        f: impl FnOnce(&RPForest) -> R,
    ) -> Result<Option<R>, SearchError> {
        let mut guard = self.slot.lock().expect("ANN index cache mutex poisoned");

        let needs_load = match guard.as_ref() {
            Some(slot) => slot.charge != charge,
            None => true,
        };

        if needs_load {
            if !dir.exists(filename) {
                tracing::debug!(charge, filename, "no persisted ANN index, degrading to mass filter");
                *guard = None;
                return Ok(None);
            }
            tracing::debug!(charge, filename, "loading ANN index");
            let forest = load_forest(dir, filename)?;
            *guard = Some(Slot { charge, forest });
        }

        Ok(guard.as_ref().map(|slot| f(&slot.forest)))
    }

    /// Release the cached index, if any.
    pub fn unload_all(&self) {
        let mut guard = self.slot.lock().expect("ANN index cache mutex poisoned");
        *guard = None;
    }

    pub fn loaded_charge(&self) -> Option<i8> {
        self.slot.lock().expect("ANN index cache mutex poisoned").as_ref().map(|s| s.charge)
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new()
    }
}

fn load_forest(dir: &dyn Directory, filename: &str) -> Result<RPForest, SearchError> {
    use std::io::Read;
    let mut reader = dir
        .open_file(filename)
        .map_err(|e| SearchError::BackendFailure(format!("opening {}: {}", filename, e)))?;
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| SearchError::BackendFailure(format!("reading {}: {}", filename, e)))?;
    postcard::from_bytes(&bytes)
        .map_err(|e| SearchError::BackendFailure(format!("decoding {}: {}", filename, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ann::forest::{RPForestParams, RPTreeParams};
    use crate::persistence::directory::FsDirectory;

    fn make_forest(seed: u64) -> RPForest {
        let mut forest = RPForest::new(
            2,
            RPForestParams {
                num_trees: 2,
                tree_params: RPTreeParams { max_leaf_size: 2 },
                seed,
            },
        )
        .unwrap();
        for v in [[1.0, 0.0], [0.0, 1.0], [0.5, 0.5], [0.2, 0.8]] {
            forest.add(&v).unwrap();
        }
        forest.build().unwrap();
        forest
    }

    #[test]
    fn missing_file_degrades_to_none() {
        let dir = FsDirectory::new(std::env::temp_dir().join("specmatch_cache_test_missing")).unwrap();
        let cache = IndexCache::new();
        let result = cache.with_index(&dir, "charge_2.idxann", 2, |f| f.num_vectors());
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn single_slot_reload_on_charge_change() {
        let dir = FsDirectory::new(std::env::temp_dir().join("specmatch_cache_test_reload")).unwrap();
        let bytes2 = postcard::to_allocvec(&make_forest(0)).unwrap();
        let bytes3 = postcard::to_allocvec(&make_forest(0)).unwrap();
        dir.atomic_write("charge_2.idxann", &bytes2).unwrap();
        dir.atomic_write("charge_3.idxann", &bytes3).unwrap();

        let cache = IndexCache::new();
        cache.with_index(&dir, "charge_2.idxann", 2, |f| f.num_vectors()).unwrap();
        assert_eq!(cache.loaded_charge(), Some(2));
        cache.with_index(&dir, "charge_3.idxann", 3, |f| f.num_vectors()).unwrap();
        assert_eq!(cache.loaded_charge(), Some(3));
    }
}
