//! Candidate Filter (C3): mass-window filter, optional ANN refinement, intersection.

use crate::ann::IndexManager;
use crate::config::{Config, ToleranceMode};
use crate::fingerprint::Fingerprint;
use crate::library::SpectralLibraryReader;
use crate::persistence::directory::Directory;
use crate::spectrum::Spectrum;

/// Composes the precursor-mass window filter with ANN refinement.
pub struct CandidateFilter<'a> {
    reader: &'a dyn SpectralLibraryReader,
    ann: &'a IndexManager,
    dir: &'a dyn Directory,
    fingerprint: &'a Fingerprint,
}

impl<'a> CandidateFilter<'a> {
    pub fn new(
        reader: &'a dyn SpectralLibraryReader,
        ann: &'a IndexManager,
        dir: &'a dyn Directory,
        fingerprint: &'a Fingerprint,
    ) -> Self {
        Self { reader, ann, dir, fingerprint }
    }

    /// Library ids passing the precursor-mass window around `query`, in library order.
    pub fn mass_filter(&self, query: &Spectrum, config: &Config) -> Vec<String> {
        let charge = match query.precursor_charge() {
            Some(c) => c,
            None => return Vec::new(),
        };
        let info = match self.reader.spec_info(charge) {
            Some(info) => info,
            None => return Vec::new(),
        };
        let tol = config.precursor_tolerance_mass;

        info.ids
            .iter()
            .zip(&info.precursor_mass)
            .filter(|(_, &m)| mass_within_tolerance(query.precursor_mz(), m, charge, tol, config.precursor_tolerance_mode))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Full candidate set: mass filter, refined by ANN when `mass_ids` is large enough
    /// and an index exists for this charge; degrades gracefully to the mass filter
    /// result otherwise. Order follows `mass_ids`, preserved through the intersection.
    pub fn candidates(&self, query: &Spectrum, config: &Config) -> Vec<Spectrum> {
        let mass_ids = self.mass_filter(query, config);
        if mass_ids.is_empty() {
            return Vec::new();
        }

        let candidate_ids = if mass_ids.len() > config.ann_cutoff {
            self.refine_with_ann(query, config, &mass_ids).unwrap_or(mass_ids)
        } else {
            mass_ids
        };

        candidate_ids
            .into_iter()
            .filter_map(|id| match self.reader.get_spectrum(&id, true) {
                Ok(spectrum) => Some(spectrum),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "skipping candidate: spectrum read failed");
                    None
                }
            })
            .filter(|spectrum| spectrum.is_valid())
            .collect()
    }

    /// `mass_ids ∩ ann_ids`, preserving `mass_ids` order. Returns `None` if no ANN index
    /// is available for this charge (caller falls back to `mass_ids` verbatim).
    fn refine_with_ann(&self, query: &Spectrum, config: &Config, mass_ids: &[String]) -> Option<Vec<String>> {
        let charge = query.precursor_charge()?;
        let info = self.reader.spec_info(charge)?;
        let vector = query.vector(config);
        let ann_local = self
            .ann
            .query(self.dir, self.fingerprint, charge, &vector, config.num_candidates)
            .ok()
            .flatten()?;

        let ann_ids: std::collections::HashSet<String> = ann_local
            .into_iter()
            .filter_map(|(local_idx, _dist)| info.ids.get(local_idx as usize).cloned())
            .collect();

        Some(mass_ids.iter().filter(|id| ann_ids.contains(*id)).cloned().collect())
    }
}

fn mass_within_tolerance(query_mz: f64, library_mass: f64, charge: i8, tol: f64, mode: ToleranceMode) -> bool {
    match mode {
        ToleranceMode::Da => (query_mz - library_mass).abs() * charge as f64 <= tol,
        ToleranceMode::Ppm => {
            if library_mass.abs() <= f64::EPSILON {
                false
            } else {
                (query_mz - library_mass).abs() / library_mass * 1.0e6 <= tol
            }
        }
        ToleranceMode::Off => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchResult;
    use crate::library::SpecInfo;
    use crate::spectrum::PeakMatches;
    use std::collections::HashMap;

    struct FixtureReader {
        info: HashMap<i8, SpecInfo>,
        spectra: HashMap<String, Spectrum>,
    }

    impl SpectralLibraryReader for FixtureReader {
        fn is_recreated(&self) -> bool {
            false
        }
        fn spec_info(&self, charge: i8) -> Option<&SpecInfo> {
            self.info.get(&charge)
        }
        fn get_spectrum(&self, id: &str, _load_peaks: bool) -> SearchResult<Spectrum> {
            self.spectra
                .get(id)
                .cloned()
                .ok_or_else(|| crate::error::SearchError::NotFound(id.to_string()))
        }
        fn all_spectra(&self) -> SearchResult<Vec<Spectrum>> {
            Ok(self.spectra.values().cloned().collect())
        }
        fn stem(&self) -> &str {
            "fixture"
        }
    }

    struct NoAligner;
    impl crate::library::PeakAligner for NoAligner {
        fn best_match(
            &self,
            _query: &Spectrum,
            _candidates: &[Spectrum],
        ) -> SearchResult<Option<(Spectrum, f64, PeakMatches)>> {
            Ok(None)
        }
    }

    fn fixture() -> FixtureReader {
        let masses = vec![498.0, 499.8, 500.1, 501.0];
        let ids: Vec<String> = (0..masses.len()).map(|i| format!("lib{}", i)).collect();
        let mut spectra = HashMap::new();
        for id in &ids {
            spectra.insert(
                id.clone(),
                Spectrum::new(id.clone(), vec![100.0, 200.0], vec![1.0, 1.0], 500.0, Some(2)),
            );
        }
        let mut info = HashMap::new();
        info.insert(2, SpecInfo { ids, precursor_mass: masses });
        FixtureReader { info, spectra }
    }

    #[test]
    fn mass_filter_da_boundary_example() {
        let reader = fixture();
        let ann = crate::ann::IndexManager::new("fixture");
        let dir = crate::persistence::directory::MemoryDirectory::new();
        let cfg = Config {
            precursor_tolerance_mass: 0.5,
            precursor_tolerance_mode: ToleranceMode::Da,
            ..Config::default()
        };
        let fp = crate::fingerprint::config_fingerprint(&cfg);
        let filter = CandidateFilter::new(&reader, &ann, &dir, &fp);
        let query = Spectrum::new("q", vec![100.0], vec![1.0], 500.0, Some(2));

        let kept = filter.mass_filter(&query, &cfg);
        assert_eq!(kept, vec!["lib2".to_string()]);
    }

    #[test]
    fn empty_mass_filter_short_circuits() {
        let reader = fixture();
        let ann = crate::ann::IndexManager::new("fixture");
        let dir = crate::persistence::directory::MemoryDirectory::new();
        let cfg = Config {
            precursor_tolerance_mass: 0.0001,
            precursor_tolerance_mode: ToleranceMode::Da,
            ..Config::default()
        };
        let fp = crate::fingerprint::config_fingerprint(&cfg);
        let filter = CandidateFilter::new(&reader, &ann, &dir, &fp);
        let query = Spectrum::new("q", vec![100.0], vec![1.0], 10.0, Some(2));
        assert!(filter.candidates(&query, &cfg).is_empty());
    }

    #[test]
    fn ann_cutoff_inactive_returns_mass_filter_verbatim() {
        let reader = fixture();
        let ann = crate::ann::IndexManager::new("fixture");
        let dir = crate::persistence::directory::MemoryDirectory::new();
        let cfg = Config {
            precursor_tolerance_mass: 5.0,
            precursor_tolerance_mode: ToleranceMode::Da,
            ann_cutoff: 1000,
            ..Config::default()
        };
        let fp = crate::fingerprint::config_fingerprint(&cfg);
        let filter = CandidateFilter::new(&reader, &ann, &dir, &fp);
        let query = Spectrum::new("q", vec![100.0], vec![1.0], 500.0, Some(2));
        let candidates = filter.candidates(&query, &cfg);
        assert_eq!(candidates.len(), 4);
    }

    #[test]
    fn composition_subset_of_mass_filter() {
        let reader = fixture();
        let ann = crate::ann::IndexManager::new("fixture");
        let dir = crate::persistence::directory::MemoryDirectory::new();
        let cfg = Config {
            precursor_tolerance_mass: 5.0,
            precursor_tolerance_mode: ToleranceMode::Da,
            ann_cutoff: 0,
            ..Config::default()
        };
        let fp = crate::fingerprint::config_fingerprint(&cfg);
        let filter = CandidateFilter::new(&reader, &ann, &dir, &fp);
        let query = Spectrum::new("q", vec![100.0], vec![1.0], 500.0, Some(2));
        let mass_ids = filter.mass_filter(&query, &cfg);
        let candidates = filter.candidates(&query, &cfg);
        // No ANN index persisted, so this degrades to the mass filter verbatim.
        assert_eq!(candidates.len(), mass_ids.len());
    }
}
