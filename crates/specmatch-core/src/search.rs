//! Search Driver (C5): orders queries, dispatches filter + score, dedups by query id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::candidates::CandidateFilter;
use crate::config::Config;
use crate::error::SearchResult;
use crate::library::PeakAligner;
use crate::spectrum::{Identification, Spectrum, SpectrumSpectrumMatch};

/// Charges tried for a query whose precursor charge is unknown.
const UNKNOWN_CHARGE_TRIALS: [i8; 2] = [2, 3];

/// Cooperative cancellation checked between queries, never mid-query.
#[derive(Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Drives a single-threaded, charge-sorted scan over query spectra, scoring each
/// against its candidate set and retaining the best identification per query id.
pub struct SearchDriver<'a> {
    filter: CandidateFilter<'a>,
    aligner: &'a dyn PeakAligner,
}

impl<'a> SearchDriver<'a> {
    pub fn new(filter: CandidateFilter<'a>, aligner: &'a dyn PeakAligner) -> Self {
        Self { filter, aligner }
    }

    /// Expand unknown-charge queries into `{2,3}` trials, drop invalid trials, and sort
    /// by `(precursor_charge, precursor_mz)` for ANN-cache locality. Stable so that
    /// ties preserve input order.
    fn prepare_trials(raw_queries: Vec<Spectrum>) -> Vec<Spectrum> {
        let mut trials: Vec<Spectrum> = Vec::with_capacity(raw_queries.len());
        for query in raw_queries {
            if query.precursor_charge().is_none() {
                for charge in UNKNOWN_CHARGE_TRIALS {
                    trials.push(query.charge_trial(charge));
                }
            } else {
                trials.push(query);
            }
        }
        trials.retain(Spectrum::is_valid);
        trials.sort_by(|a, b| {
            a.precursor_charge()
                .cmp(&b.precursor_charge())
                .then_with(|| {
                    a.precursor_mz()
                        .partial_cmp(&b.precursor_mz())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        trials
    }

    /// Runs the search: materialize trials, sort, score each in order, dedup by
    /// `query_id` keeping the best score. Queries for which no trial produced any
    /// identification are emitted as [`Identification::unmatched`]. Output order
    /// follows first appearance in the charge-sorted scan.
    pub fn search(
        &self,
        raw_queries: Vec<Spectrum>,
        config: &Config,
        cancel: &CancellationToken,
    ) -> SearchResult<Vec<Identification>> {
        let trials = Self::prepare_trials(raw_queries);

        let mut order: Vec<String> = Vec::new();
        let mut best: HashMap<String, Identification> = HashMap::new();
        let mut unmatched_fallback: HashMap<String, Spectrum> = HashMap::new();

        for trial in &trials {
            if cancel.is_cancelled() {
                break;
            }
            let query_id = trial.query_id().to_string();
            if !best.contains_key(&query_id) && !unmatched_fallback.contains_key(&query_id) {
                order.push(query_id.clone());
            }
            unmatched_fallback.entry(query_id.clone()).or_insert_with(|| trial.clone());

            let total_start = Instant::now();

            let candidates_start = Instant::now();
            let candidates = self.filter.candidates(trial, config);
            let time_candidates = candidates_start.elapsed();
            let n_candidates = candidates.len();
            if candidates.is_empty() {
                continue;
            }

            let match_start = Instant::now();
            let outcome = self.aligner.best_match(trial, &candidates)?;
            let time_match = match_start.elapsed();

            let (library, score, peak_matches) = match outcome {
                Some(best_match) => best_match,
                None => continue,
            };

            let mut ssm = SpectrumSpectrumMatch::new(trial.clone(), library, peak_matches, score);
            ssm.n_candidates = n_candidates;
            ssm.time_candidates = time_candidates;
            ssm.time_match = time_match;
            ssm.time_total = total_start.elapsed();
            let identification = Identification::from_ssm(&ssm);

            best.entry(query_id)
                .and_modify(|existing| {
                    if identification.score > existing.score {
                        *existing = identification.clone();
                    }
                })
                .or_insert(identification);
        }

        Ok(order
            .into_iter()
            .map(|id| {
                best.remove(&id).unwrap_or_else(|| {
                    Identification::unmatched(&unmatched_fallback[&id])
                })
            })
            .collect())
    }
}
