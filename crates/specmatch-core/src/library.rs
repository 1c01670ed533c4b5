//! External collaborator contracts (§6).
//!
//! Spectral-library readers, peak preprocessing, and the peak aligner are out of scope
//! for this crate — it only depends on these contracts. A production deployment
//! supplies concrete implementations (MGF/splib parsing, mass-tolerance alignment).

use crate::error::SearchResult;
use crate::spectrum::{PeakMatches, Spectrum};

/// Per-charge library metadata: parallel `ids`/`precursor_mass` arrays, sorted by id.
#[derive(Debug, Clone, Default)]
pub struct SpecInfo {
    pub ids: Vec<String>,
    pub precursor_mass: Vec<f64>,
}

/// A reader over an opened spectral library. `Reader::spec_info` backs the mass filter
/// (C3); `Reader::get_spectrum` lazily loads peaks for candidates that survive it.
pub trait SpectralLibraryReader {
    /// `true` if the backing store reports the persisted index is out of date,
    /// independent of the config fingerprint (e.g. the library file itself changed).
    fn is_recreated(&self) -> bool;

    fn spec_info(&self, charge: i8) -> Option<&SpecInfo>;

    fn get_spectrum(&self, id: &str, load_peaks: bool) -> SearchResult<Spectrum>;

    fn all_spectra(&self) -> SearchResult<Vec<Spectrum>>;

    /// Stable filename stem used to derive persisted ANN index names.
    fn stem(&self) -> &str;
}

/// Produces a best match for a query among a candidate set. The alignment (tolerance
/// window peak matching) and the scoring function are both external to this crate.
pub trait PeakAligner {
    /// Returns `(library_spectrum, score, peak_matches)` for the best-scoring candidate,
    /// or `None` if `candidates` is empty or no candidate aligns at all.
    fn best_match(
        &self,
        query: &Spectrum,
        candidates: &[Spectrum],
    ) -> SearchResult<Option<(Spectrum, f64, PeakMatches)>>;
}
