//! CLI-flag mirror of [`specmatch_core::Config`].

use clap::Args;
use specmatch_core::config::ToleranceMode;
use specmatch_core::Config;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Spectrum bin range lower bound, in Da.
    #[arg(long, default_value_t = 50.5)]
    pub min_mz: f64,

    /// Spectrum bin range upper bound, in Da.
    #[arg(long, default_value_t = 2500.0)]
    pub max_mz: f64,

    /// Bin width, in Da.
    #[arg(long, default_value_t = 0.02)]
    pub bin_size: f64,

    /// ANN forest size (number of trees).
    #[arg(long, default_value_t = 10)]
    pub num_trees: usize,

    /// Precursor mass window half-width.
    #[arg(long, default_value_t = 10.0)]
    pub precursor_tolerance_mass: f64,

    /// Interpretation of `--precursor-tolerance-mass`.
    #[arg(long, value_enum, default_value_t = ToleranceModeArg::Ppm)]
    pub precursor_tolerance_mode: ToleranceModeArg,

    /// Number of ANN neighbors to retrieve per query.
    #[arg(long, default_value_t = 1000)]
    pub num_candidates: usize,

    /// Mass-filter candidate count above which ANN refinement activates.
    #[arg(long, default_value_t = 10_000)]
    pub ann_cutoff: usize,

    /// ANN query-time search effort. Omit to defer to the backend default.
    #[arg(long)]
    pub search_k: Option<usize>,

    /// Worker pool size for parallel per-charge index builds.
    #[arg(long, default_value_t = 1)]
    pub num_threads: usize,

    /// Restrict top/pearsonr/spearmanr/scribe metrics to the `top` most-intense library peaks.
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum ToleranceModeArg {
    Da,
    Ppm,
    Off,
}

impl From<ToleranceModeArg> for ToleranceMode {
    fn from(value: ToleranceModeArg) -> Self {
        match value {
            ToleranceModeArg::Da => ToleranceMode::Da,
            ToleranceModeArg::Ppm => ToleranceMode::Ppm,
            ToleranceModeArg::Off => ToleranceMode::Off,
        }
    }
}

impl ConfigArgs {
    pub fn into_config(self) -> Config {
        Config {
            min_mz: self.min_mz,
            max_mz: self.max_mz,
            bin_size: self.bin_size,
            num_trees: self.num_trees,
            precursor_tolerance_mass: self.precursor_tolerance_mass,
            precursor_tolerance_mode: self.precursor_tolerance_mode.into(),
            num_candidates: self.num_candidates,
            ann_cutoff: self.ann_cutoff,
            search_k: self.search_k,
            num_threads: self.num_threads,
            top: self.top,
        }
    }
}
