//! Search configuration.

/// Precursor mass tolerance interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToleranceMode {
    /// Absolute Dalton tolerance, scaled by charge.
    Da,
    /// Relative parts-per-million tolerance.
    Ppm,
    /// No filtering; every library entry passes.
    Off,
}

/// Recognized search configuration.
///
/// Fields marked *index-affecting* participate in [`crate::fingerprint::config_fingerprint`]
/// and therefore gate reuse of persisted ANN indices (see [`crate::ann`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Spectrum bin range lower bound, in Da. Index-affecting.
    pub min_mz: f64,
    /// Spectrum bin range upper bound, in Da. Index-affecting.
    pub max_mz: f64,
    /// Bin width, in Da. Index-affecting.
    pub bin_size: f64,
    /// ANN forest size (number of trees). Index-affecting.
    pub num_trees: usize,

    /// Precursor mass window half-width.
    pub precursor_tolerance_mass: f64,
    /// Interpretation of `precursor_tolerance_mass`.
    pub precursor_tolerance_mode: ToleranceMode,
    /// Number of ANN neighbors to retrieve per query.
    pub num_candidates: usize,
    /// Mass-filter candidate count above which ANN refinement activates.
    pub ann_cutoff: usize,
    /// ANN query-time search effort. `None` defers to the backend's default.
    pub search_k: Option<usize>,
    /// Worker pool size for parallel per-charge index builds.
    pub num_threads: usize,
    /// Restrict several similarity metrics to the `top` most intense library peaks.
    pub top: Option<usize>,
}

impl Config {
    /// Keys that contribute to the ANN index fingerprint, in a fixed canonical order.
    pub(crate) const INDEX_AFFECTING_KEYS: &'static [&'static str] =
        &["min_mz", "max_mz", "bin_size", "num_trees"];

    /// Vector dimension implied by `[min_mz, max_mz)` binned at `bin_size`.
    pub fn vector_dim(&self) -> usize {
        ((self.max_mz - self.min_mz) / self.bin_size).ceil().max(0.0) as usize
    }

    pub fn validate(&self) -> Result<(), crate::error::SearchError> {
        if self.max_mz <= self.min_mz {
            return Err(crate::error::SearchError::BadArgument(format!(
                "max_mz ({}) must exceed min_mz ({})",
                self.max_mz, self.min_mz
            )));
        }
        if self.bin_size <= 0.0 {
            return Err(crate::error::SearchError::BadArgument(
                "bin_size must be positive".into(),
            ));
        }
        if self.precursor_tolerance_mass < 0.0 {
            return Err(crate::error::SearchError::BadArgument(
                "precursor_tolerance_mass must be non-negative".into(),
            ));
        }
        if self.num_trees == 0 {
            return Err(crate::error::SearchError::BadArgument(
                "num_trees must be positive".into(),
            ));
        }
        if let Some(top) = self.top {
            if top == 0 {
                return Err(crate::error::SearchError::BadArgument(
                    "top must be positive when provided".into(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_mz: 50.5,
            max_mz: 2500.0,
            bin_size: 0.02,
            num_trees: 10,
            precursor_tolerance_mass: 10.0,
            precursor_tolerance_mode: ToleranceMode::Ppm,
            num_candidates: 1000,
            ann_cutoff: 10_000,
            search_k: None,
            num_threads: 1,
            top: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_dim_rounds_up() {
        let cfg = Config {
            min_mz: 0.0,
            max_mz: 10.0,
            bin_size: 3.0,
            ..Config::default()
        };
        assert_eq!(cfg.vector_dim(), 4);
    }

    #[test]
    fn rejects_inverted_range() {
        let cfg = Config {
            min_mz: 100.0,
            max_mz: 50.0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
