//! End-to-end wiring of the ANN index manager, candidate filter, and search driver
//! against a library large enough to cross `ann_cutoff`.

use std::collections::HashMap;

use specmatch_core::ann::IndexManager;
use specmatch_core::candidates::CandidateFilter;
use specmatch_core::config::{Config, ToleranceMode};
use specmatch_core::error::{SearchError, SearchResult};
use specmatch_core::fingerprint::config_fingerprint;
use specmatch_core::library::{PeakAligner, SpecInfo, SpectralLibraryReader};
use specmatch_core::persistence::directory::MemoryDirectory;
use specmatch_core::search::{CancellationToken, SearchDriver};
use specmatch_core::spectrum::{PeakMatches, Spectrum};

struct LibraryFixture {
    info: HashMap<i8, SpecInfo>,
    spectra: HashMap<String, Spectrum>,
}

impl SpectralLibraryReader for LibraryFixture {
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
            .ok_or_else(|| SearchError::NotFound(id.to_string()))
    }
    fn all_spectra(&self) -> SearchResult<Vec<Spectrum>> {
        Ok(self.spectra.values().cloned().collect())
    }
    fn stem(&self) -> &str {
        "fixture_lib"
    }
}

/// Picks the candidate whose peak set exactly matches the query's, scoring 1.0; otherwise 0.0.
struct ExactOverlapAligner;
impl PeakAligner for ExactOverlapAligner {
    fn best_match(
        &self,
        query: &Spectrum,
        candidates: &[Spectrum],
    ) -> SearchResult<Option<(Spectrum, f64, PeakMatches)>> {
        let best = candidates.iter().max_by(|a, b| {
            overlap_count(query, a).cmp(&overlap_count(query, b))
        });
        Ok(best.map(|c| {
            let matches: PeakMatches = (0..query.mz().len().min(c.mz().len()))
                .map(|i| (i, i))
                .collect();
            let score = overlap_count(query, c) as f64;
            (c.clone(), score, matches)
        }))
    }
}

fn overlap_count(a: &Spectrum, b: &Spectrum) -> usize {
    a.mz().iter().filter(|mz| b.mz().contains(mz)).count()
}

/// Builds a 200-entry charge-2 library spread across the mass window, each with a
/// distinct single-peak signature, so the ANN index can discriminate between them.
fn build_library(config: &Config) -> (LibraryFixture, Vec<Vec<f32>>) {
    let mut ids = Vec::new();
    let mut masses = Vec::new();
    let mut spectra = HashMap::new();
    let mut vectors = Vec::new();

    for i in 0..200 {
        let id = format!("lib{i}");
        let peak_mz = 100.0 + i as f64 * 10.0;
        let precursor = 400.0 + i as f64 * 0.01;
        let spectrum = Spectrum::new(id.clone(), vec![peak_mz], vec![1.0], precursor, Some(2));
        vectors.push(spectrum.vector(config));
        ids.push(id.clone());
        masses.push(precursor);
        spectra.insert(id, spectrum);
    }

    let mut info = HashMap::new();
    info.insert(2, SpecInfo { ids, precursor_mass: masses });
    (LibraryFixture { info, spectra }, vectors)
}

#[test]
fn ann_refinement_narrows_a_large_mass_filter_to_the_true_match() {
    let config = Config {
        min_mz: 0.0,
        max_mz: 2100.0,
        bin_size: 1.0,
        num_trees: 4,
        precursor_tolerance_mass: 1000.0, // deliberately wide: whole library passes mass filter
        precursor_tolerance_mode: ToleranceMode::Da,
        ann_cutoff: 10, // force ANN refinement at 200 mass-filter hits
        num_candidates: 5,
        ..Config::default()
    };
    let (reader, vectors) = build_library(&config);
    let dir = MemoryDirectory::new();
    let fp = config_fingerprint(&config);
    let ann = IndexManager::new("fixture_lib");
    ann.build(&dir, &config, &fp, 2, &vectors).unwrap();

    let filter = CandidateFilter::new(&reader, &ann, &dir, &fp);
    let target = &reader.spectra["lib50"];
    let query = Spectrum::new("q", target.mz().to_vec(), target.intensity().to_vec(), target.precursor_mz(), Some(2));

    let mass_ids = filter.mass_filter(&query, &config);
    assert_eq!(mass_ids.len(), 200, "wide tolerance should pass the whole library");

    let candidates = filter.candidates(&query, &config);
    assert!(
        candidates.len() < 200,
        "ANN refinement should narrow the candidate set below the full library"
    );
    assert!(candidates.iter().any(|c| c.identifier() == "lib50"));
}

#[test]
fn search_driver_finds_the_true_match_through_ann_refinement() {
    let config = Config {
        min_mz: 0.0,
        max_mz: 2100.0,
        bin_size: 1.0,
        num_trees: 4,
        precursor_tolerance_mass: 1000.0,
        precursor_tolerance_mode: ToleranceMode::Da,
        ann_cutoff: 10,
        num_candidates: 5,
        ..Config::default()
    };
    let (reader, vectors) = build_library(&config);
    let dir = MemoryDirectory::new();
    let fp = config_fingerprint(&config);
    let ann = IndexManager::new("fixture_lib");
    ann.build(&dir, &config, &fp, 2, &vectors).unwrap();

    let filter = CandidateFilter::new(&reader, &ann, &dir, &fp);
    let aligner = ExactOverlapAligner;
    let driver = SearchDriver::new(filter, &aligner);

    let target = &reader.spectra["lib123"];
    let query = Spectrum::new(
        "query_for_123",
        target.mz().to_vec(),
        target.intensity().to_vec(),
        target.precursor_mz(),
        Some(2),
    );

    let cancel = CancellationToken::new();
    let results = driver.search(vec![query], &config, &cancel).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].library_id, Some("lib123".to_string()));
}
