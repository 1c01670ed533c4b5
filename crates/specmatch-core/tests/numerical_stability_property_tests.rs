//! Property-based tests for numerical stability of the similarity engine.
//!
//! Verifies handling of extreme intensities, empty matches, and degenerate peak sets.

use proptest::prelude::*;
use specmatch_core::spectrum::{Spectrum, SpectrumSpectrumMatch};
use specmatch_core::similarity::SimilarityEngine;

fn spectrum(mz: Vec<f64>, intensity: Vec<f32>) -> Spectrum {
    Spectrum::new("s".to_string(), mz, intensity, 500.0, Some(2))
}

proptest! {
    #[test]
    fn all_metrics_finite_for_extreme_intensities(
        intensities in prop::collection::vec(1e-6f32..1e8f32, 2..20)
    ) {
        let mz: Vec<f64> = (0..intensities.len()).map(|i| 100.0 + i as f64).collect();
        let query = spectrum(mz.clone(), intensities.clone());
        let library = spectrum(mz.clone(), intensities.clone());
        let peak_matches: Vec<(usize, usize)> = (0..mz.len()).map(|i| (i, i)).collect();
        let ssm = SpectrumSpectrumMatch::new(query, library, peak_matches, 0.0);
        let engine = SimilarityEngine::new(&ssm, None);

        prop_assert!(engine.cosine().is_finite());
        prop_assert!(engine.manhattan().is_finite());
        prop_assert!(engine.euclidean().is_finite());
        prop_assert!(engine.braycurtis().is_finite());
        prop_assert!(engine.canberra().is_finite());
        prop_assert!(engine.entropy().is_finite());
    }

    #[test]
    fn no_panic_on_fully_disjoint_spectra(
        n_query in 1usize..15,
        n_library in 1usize..15,
    ) {
        let query = spectrum(
            (0..n_query).map(|i| 100.0 + i as f64).collect(),
            vec![1.0; n_query],
        );
        let library = spectrum(
            (0..n_library).map(|i| 900.0 + i as f64).collect(),
            vec![1.0; n_library],
        );
        let ssm = SpectrumSpectrumMatch::new(query, library, Vec::new(), 0.0);
        let engine = SimilarityEngine::new(&ssm, None);

        prop_assert_eq!(engine.cosine(), 0.0);
        prop_assert_eq!(engine.n_matched_peaks(), 0);
        prop_assert!(engine.hypergeometric_score(50.5, 2500.0, 0.02).is_finite());
    }

    #[test]
    fn top_restriction_never_increases_matched_count(
        intensities in prop::collection::vec(0.0f32..1000.0f32, 5..25),
        top in 1usize..30,
    ) {
        let mz: Vec<f64> = (0..intensities.len()).map(|i| 100.0 + i as f64).collect();
        let query = spectrum(mz.clone(), intensities.clone());
        let library = spectrum(mz.clone(), intensities.clone());
        let peak_matches: Vec<(usize, usize)> = (0..mz.len()).map(|i| (i, i)).collect();
        let ssm = SpectrumSpectrumMatch::new(query, library, peak_matches, 0.0);

        let unrestricted = SimilarityEngine::new(&ssm, None);
        let restricted = SimilarityEngine::new(&ssm, Some(top));

        prop_assert!(restricted.n_matched_peaks() <= unrestricted.n_matched_peaks());
    }
}
