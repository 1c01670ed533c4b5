//! Spectral library search core: candidate retrieval and spectrum-similarity scoring
//! for tandem mass-spectrometry identification.
//!
//! # Pipeline
//!
//! Query spectra flow through two stages:
//! - **Candidate retrieval** ([`candidates`]): a precursor-mass window, optionally
//!   refined by an approximate-nearest-neighbor index ([`ann`]), narrows a
//!   multi-million-entry library down to a tractable candidate set.
//! - **Scoring** ([`similarity`]): a battery of 25+ distance/similarity metrics over
//!   a query/candidate peak alignment, used to rank candidates and expose diagnostic
//!   features.
//!
//! The [`search`] module ties both stages together into a driver that iterates query
//! spectra in an order that keeps the ANN cache ([`ann::cache`]) effective and
//! reconciles duplicate identifications arising from unknown precursor charges.
//!
//! **Out of scope** (external collaborator contracts in [`library`]): spectral-library
//! readers (MGF, splib, ...), peak preprocessing, and the peak aligner itself.
//!
//! # Example
//!
//! ```no_run
//! use specmatch_core::{Config, ann::IndexManager, candidates::CandidateFilter,
//!     persistence::directory::FsDirectory, search::{CancellationToken, SearchDriver}};
//! # use specmatch_core::library::{SpectralLibraryReader, PeakAligner, SpecInfo};
//! # use specmatch_core::{Spectrum, SearchResult, PeakMatches};
//! # struct MyReader; struct MyAligner;
//! # impl SpectralLibraryReader for MyReader {
//! #     fn is_recreated(&self) -> bool { false }
//! #     fn spec_info(&self, _charge: i8) -> Option<&SpecInfo> { None }
//! #     fn get_spectrum(&self, id: &str, _p: bool) -> SearchResult<Spectrum> {
//! #         Err(specmatch_core::SearchError::NotFound(id.to_string()))
//! #     }
//! #     fn all_spectra(&self) -> SearchResult<Vec<Spectrum>> { Ok(vec![]) }
//! #     fn stem(&self) -> &str { "lib" }
//! # }
//! # impl PeakAligner for MyAligner {
//! #     fn best_match(&self, _q: &Spectrum, _c: &[Spectrum]) -> SearchResult<Option<(Spectrum, f64, PeakMatches)>> { Ok(None) }
//! # }
//! let config = Config::default();
//! let reader = MyReader;
//! let aligner = MyAligner;
//! let ann = IndexManager::new(reader.stem());
//! let dir = FsDirectory::new("./indices")?;
//! let fp = specmatch_core::fingerprint::config_fingerprint(&config);
//! let filter = CandidateFilter::new(&reader, &ann, &dir, &fp);
//! let driver = SearchDriver::new(filter, &aligner);
//! let cancel = CancellationToken::new();
//! let identifications = driver.search(vec![], &config, &cancel)?;
//! # Ok::<(), specmatch_core::SearchError>(())
//! ```

/// Search configuration, including the index-affecting key set.
pub mod config;

/// Error types for search operations.
pub mod error;

/// Stable config fingerprint gating ANN index reuse (C6).
pub mod fingerprint;

/// Spectrum, peak-match, and spectrum-spectrum-match value types (C1).
pub mod spectrum;

/// External collaborator contracts: library reader and peak aligner (§6).
pub mod library;

/// Random-projection-forest ANN backend and per-charge index lifecycle (C2).
pub mod ann;

/// Mass-window filter + ANN refinement candidate retrieval (C3).
pub mod candidates;

/// Spectrum-similarity metric catalog (C4).
pub mod similarity;

/// Charge-sorted query driver, dedup-by-query-id (C5).
pub mod search;

/// Crash-safe, multi-process-safe storage backends for persisted ANN indices.
pub mod persistence;

/// SIMD-dispatching vector primitives shared by the ANN backend and similarity engine.
pub mod simd;

pub use config::Config;
pub use error::{SearchError, SearchResult};
pub use spectrum::{Identification, PeakMatch, PeakMatches, Spectrum, SpectrumSpectrumMatch};

/// Re-exports covering the common case: building a driver and running a search.
pub mod prelude {
    pub use crate::ann::IndexManager;
    pub use crate::candidates::CandidateFilter;
    pub use crate::config::{Config, ToleranceMode};
    pub use crate::error::{SearchError, SearchResult};
    pub use crate::library::{PeakAligner, SpecInfo, SpectralLibraryReader};
    pub use crate::search::{CancellationToken, SearchDriver};
    pub use crate::similarity::SimilarityEngine;
    pub use crate::spectrum::{Identification, Spectrum, SpectrumSpectrumMatch};
}
