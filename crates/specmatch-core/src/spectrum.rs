//! Spectrum, peak-match, and spectrum-spectrum-match value types (C1).

use crate::config::Config;

/// A query or library spectrum: parallel `mz`/`intensity` arrays plus precursor metadata.
///
/// `mz` is strictly increasing; `len(mz) == len(intensity)`. Library spectra are never
/// empty; query spectra may be invalid (see [`Spectrum::is_valid`]) and are filtered by
/// the driver before scoring. Equality for library spectra is by `identifier`; queries
/// with unknown charge are expanded into multiple trial spectra sharing a `query_id` but
/// differing in `precursor_charge` — see [`Spectrum::charge_trial`].
#[derive(Debug, Clone)]
pub struct Spectrum {
    mz: Vec<f64>,
    intensity: Vec<f32>,
    precursor_mz: f64,
    precursor_charge: Option<i8>,
    identifier: String,
    /// Stable id shared by all charge trials derived from the same raw query.
    query_id: String,
}

impl Spectrum {
    /// Construct a spectrum. Does not validate; call [`Spectrum::is_valid`] before use.
    pub fn new(
        identifier: impl Into<String>,
        mz: Vec<f64>,
        intensity: Vec<f32>,
        precursor_mz: f64,
        precursor_charge: Option<i8>,
    ) -> Self {
        let identifier = identifier.into();
        let query_id = identifier.clone();
        Self {
            mz,
            intensity,
            precursor_mz,
            precursor_charge,
            identifier,
            query_id,
        }
    }

    pub fn mz(&self) -> &[f64] {
        &self.mz
    }

    pub fn intensity(&self) -> &[f32] {
        &self.intensity
    }

    pub fn precursor_mz(&self) -> f64 {
        self.precursor_mz
    }

    pub fn precursor_charge(&self) -> Option<i8> {
        self.precursor_charge
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Neutral precursor mass given the current charge: `(precursor_mz - proton) * charge`.
    pub fn precursor_mass(&self) -> Option<f64> {
        const PROTON_MASS: f64 = 1.007_276_466_62;
        self.precursor_charge
            .map(|z| (self.precursor_mz - PROTON_MASS) * z as f64)
    }

    /// A charge-trial view sharing this spectrum's peaks and `query_id` but carrying a
    /// different `precursor_charge`. Used when the raw query's charge is unknown.
    pub fn charge_trial(&self, charge: i8) -> Spectrum {
        Spectrum {
            mz: self.mz.clone(),
            intensity: self.intensity.clone(),
            precursor_mz: self.precursor_mz,
            precursor_charge: Some(charge),
            identifier: self.identifier.clone(),
            query_id: self.query_id.clone(),
        }
    }

    /// Minimal external validity predicate: non-empty, aligned arrays, known charge.
    /// Real preprocessing (noise removal, normalization) is out of scope for this crate.
    pub fn is_valid(&self) -> bool {
        !self.mz.is_empty()
            && self.mz.len() == self.intensity.len()
            && self.precursor_charge.is_some()
    }

    /// Dense binned feature vector over `[config.min_mz, config.max_mz)` at `config.bin_size`,
    /// used only for ANN lookup. Intensities falling in the same bin are summed.
    pub fn vector(&self, config: &Config) -> Vec<f32> {
        let dim = config.vector_dim();
        let mut v = vec![0.0f32; dim];
        for (&mz, &intensity) in self.mz.iter().zip(self.intensity.iter()) {
            if mz < config.min_mz || mz >= config.max_mz {
                continue;
            }
            let bin = ((mz - config.min_mz) / config.bin_size) as usize;
            if bin < dim {
                v[bin] += intensity;
            }
        }
        v
    }
}

/// A single `(query_peak_index, library_peak_index)` correspondence.
pub type PeakMatch = (usize, usize);

/// A list of peak matches, in aligner-emission order. Each query index and each library
/// index appears at most once; order is preserved for determinism and is never resorted
/// by this crate.
pub type PeakMatches = Vec<PeakMatch>;

/// A spectrum-spectrum match: a query, its chosen library spectrum, their peak alignment,
/// plus a score slot and performance counters.
///
/// Created by the search driver (C5) when scoring a candidate; mutated only to attach the
/// chosen library spectrum and score. The similarity engine (C4) never mutates an SSM —
/// it reads it and returns scalars.
#[derive(Debug, Clone)]
pub struct SpectrumSpectrumMatch {
    pub query: Spectrum,
    pub library: Spectrum,
    pub peak_matches: PeakMatches,
    pub score: f64,
    pub n_candidates: usize,
    pub time_candidates: std::time::Duration,
    pub time_match: std::time::Duration,
    pub time_total: std::time::Duration,
}

impl SpectrumSpectrumMatch {
    pub fn new(query: Spectrum, library: Spectrum, peak_matches: PeakMatches, score: f64) -> Self {
        Self {
            query,
            library,
            peak_matches,
            score,
            n_candidates: 0,
            time_candidates: std::time::Duration::ZERO,
            time_match: std::time::Duration::ZERO,
            time_total: std::time::Duration::ZERO,
        }
    }
}

/// Final, per-query output record.
#[derive(Debug, Clone)]
pub struct Identification {
    pub query_id: String,
    pub query_charge: Option<i8>,
    pub library_id: Option<String>,
    pub score: f64,
    pub peak_match_indices: PeakMatches,
    pub n_candidates: usize,
    pub time_candidates: std::time::Duration,
    pub time_match: std::time::Duration,
    pub time_total: std::time::Duration,
}

impl Identification {
    /// An identification recorded for a query that matched no candidate.
    pub fn unmatched(query: &Spectrum) -> Self {
        Self {
            query_id: query.query_id().to_string(),
            query_charge: query.precursor_charge(),
            library_id: None,
            score: f64::NEG_INFINITY,
            peak_match_indices: Vec::new(),
            n_candidates: 0,
            time_candidates: std::time::Duration::ZERO,
            time_match: std::time::Duration::ZERO,
            time_total: std::time::Duration::ZERO,
        }
    }

    pub fn from_ssm(ssm: &SpectrumSpectrumMatch) -> Self {
        Self {
            query_id: ssm.query.query_id().to_string(),
            query_charge: ssm.query.precursor_charge(),
            library_id: Some(ssm.library.identifier().to_string()),
            score: ssm.score,
            peak_match_indices: ssm.peak_matches.clone(),
            n_candidates: ssm.n_candidates,
            time_candidates: ssm.time_candidates,
            time_match: ssm.time_match,
            time_total: ssm.time_total,
        }
    }
}
