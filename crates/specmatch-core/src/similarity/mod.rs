//! Spectrum-similarity feature engine (C4).
//!
//! Stateless per [`SpectrumSpectrumMatch`]: construct a [`SimilarityEngine`] from an SSM
//! (and an optional `top` library-peak restriction), then call metric methods. Every
//! metric is a pure function of the matched/unmatched arrays built once at construction.

pub mod entropy;
pub mod hypergeometric;
pub mod rank;

use crate::error::{SearchError, SearchResult};
use crate::spectrum::SpectrumSpectrumMatch;
use crate::simd;

/// Which parallel array `mean_squared_error` compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Mz,
    Intensity,
}

/// The four arrays derived from a peak-match list, plus the unmatched-intensity
/// complements `Uq`/`Ul` used by several distance metrics.
///
/// If `top` is set, `mq`/`iq`/`ml`/`il` are restricted to matches whose library peak is
/// among the `top` most intense library peaks — found by partial selection
/// ([`slice::select_nth_unstable_by`]), not a full sort. `Uq`/`Ul` are always computed
/// against the *full*, unrestricted peak-match list: they describe what the aligner left
/// unmatched, independent of which matches a particular metric call chooses to look at.
#[derive(Debug, Clone, Default)]
pub struct MatchedArrays {
    pub mq: Vec<f64>,
    pub iq: Vec<f32>,
    pub ml: Vec<f64>,
    pub il: Vec<f32>,
    pub uq: Vec<f32>,
    pub ul: Vec<f32>,
}

impl MatchedArrays {
    pub fn from_ssm(ssm: &SpectrumSpectrumMatch, top: Option<usize>) -> Self {
        let query_mz = ssm.query.mz();
        let query_intensity = ssm.query.intensity();
        let library_mz = ssm.library.mz();
        let library_intensity = ssm.library.intensity();

        let restricted = match top {
            Some(top) if top < library_intensity.len() => {
                let threshold = top_intensity_threshold(library_intensity, top);
                ssm.peak_matches
                    .iter()
                    .copied()
                    .filter(|&(_, l)| library_intensity[l] >= threshold)
                    .collect::<Vec<_>>()
            }
            _ => ssm.peak_matches.clone(),
        };

        let mut mq = Vec::with_capacity(restricted.len());
        let mut iq = Vec::with_capacity(restricted.len());
        let mut ml = Vec::with_capacity(restricted.len());
        let mut il = Vec::with_capacity(restricted.len());
        for &(q, l) in &restricted {
            mq.push(query_mz[q]);
            iq.push(query_intensity[q]);
            ml.push(library_mz[l]);
            il.push(library_intensity[l]);
        }

        let matched_q: std::collections::HashSet<usize> =
            ssm.peak_matches.iter().map(|&(q, _)| q).collect();
        let matched_l: std::collections::HashSet<usize> =
            ssm.peak_matches.iter().map(|&(_, l)| l).collect();
        let uq: Vec<f32> = query_intensity
            .iter()
            .enumerate()
            .filter(|(i, _)| !matched_q.contains(i))
            .map(|(_, &v)| v)
            .collect();
        let ul: Vec<f32> = library_intensity
            .iter()
            .enumerate()
            .filter(|(i, _)| !matched_l.contains(i))
            .map(|(_, &v)| v)
            .collect();

        Self { mq, iq, ml, il, uq, ul }
    }

    pub fn n_matched(&self) -> usize {
        self.iq.len()
    }
}

/// Index of the `top`-th largest value in `values`, found by partial selection.
fn top_intensity_threshold(values: &[f32], top: usize) -> f32 {
    let mut buf = values.to_vec();
    let idx = top.saturating_sub(1).min(buf.len().saturating_sub(1));
    buf.select_nth_unstable_by(idx, |a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    buf[idx]
}

/// Machine epsilon used to guard denominators that can vanish.
const EPS: f64 = f64::EPSILON;

pub struct SimilarityEngine<'a> {
    ssm: &'a SpectrumSpectrumMatch,
    matched: MatchedArrays,
}

impl<'a> SimilarityEngine<'a> {
    pub fn new(ssm: &'a SpectrumSpectrumMatch, top: Option<usize>) -> Self {
        Self {
            ssm,
            matched: MatchedArrays::from_ssm(ssm, top),
        }
    }

    pub fn matched(&self) -> &MatchedArrays {
        &self.matched
    }

    fn k(&self) -> usize {
        self.matched.iq.len()
    }

    fn n_query(&self) -> usize {
        self.ssm.query.mz().len()
    }

    fn n_library(&self) -> usize {
        self.ssm.library.mz().len()
    }

    // ---- similarity / overlap ----------------------------------------------------

    /// Dot product of already-L2-normalized matched intensities.
    pub fn cosine(&self) -> f64 {
        if self.k() == 0 {
            return 0.0;
        }
        simd::dot(&self.matched.iq, &self.matched.il) as f64
    }

    pub fn n_matched_peaks(&self) -> usize {
        self.k()
    }

    pub fn frac_n_peaks_query(&self) -> f64 {
        if self.n_query() == 0 {
            return 0.0;
        }
        self.k() as f64 / self.n_query() as f64
    }

    pub fn frac_n_peaks_library(&self) -> f64 {
        if self.n_library() == 0 {
            return 0.0;
        }
        self.k() as f64 / self.n_library() as f64
    }

    pub fn frac_intensity_query(&self) -> f64 {
        let total: f64 = self.ssm.query.intensity().iter().map(|&v| v as f64).sum();
        if total <= EPS {
            return 0.0;
        }
        let matched: f64 = self.matched.iq.iter().map(|&v| v as f64).sum();
        matched / total
    }

    pub fn frac_intensity_library(&self) -> f64 {
        let total: f64 = self.ssm.library.intensity().iter().map(|&v| v as f64).sum();
        if total <= EPS {
            return 0.0;
        }
        let matched: f64 = self.matched.il.iter().map(|&v| v as f64).sum();
        matched / total
    }

    pub fn mean_squared_error(&self, axis: Axis) -> SearchResult<f64> {
        if self.k() == 0 {
            return Ok(f64::INFINITY);
        }
        let n_q = self.n_query();
        if n_q == 0 {
            return Err(SearchError::BadArgument(
                "mean_squared_error: query has no peaks".into(),
            ));
        }
        let sse: f64 = match axis {
            Axis::Mz => self
                .matched
                .mq
                .iter()
                .zip(&self.matched.ml)
                .map(|(&a, &b)| (a - b).powi(2))
                .sum(),
            Axis::Intensity => self
                .matched
                .iq
                .iter()
                .zip(&self.matched.il)
                .map(|(&a, &b)| (a as f64 - b as f64).powi(2))
                .sum(),
        };
        Ok(sse / n_q as f64)
    }

    pub fn spectral_contrast_angle(&self) -> f64 {
        let cosine = self.cosine().clamp(-1.0, 1.0);
        1.0 - 2.0 * cosine.acos() / std::f64::consts::PI
    }

    pub fn hypergeometric_score(&self, min_mz: f64, max_mz: f64, bin_size: f64) -> f64 {
        let bins = hypergeometric::n_bins(min_mz, max_mz, bin_size);
        hypergeometric::hypergeometric_score(self.n_library(), self.k(), bins)
    }

    pub fn kendalltau(&self) -> f64 {
        rank::kendall_tau(&self.matched.iq, &self.matched.il)
    }

    pub fn pearsonr(&self) -> f64 {
        rank::pearson(&self.matched.iq, &self.matched.il)
    }

    pub fn spearmanr(&self) -> f64 {
        rank::spearman(&self.matched.iq, &self.matched.il)
    }

    // ---- MSforID family -------------------------------------------------------------

    pub fn ms_for_id_v1(&self) -> f64 {
        let k = self.k();
        if k == 0 {
            return 0.0;
        }
        let sum_abs_diff: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| (a as f64 - b as f64).abs())
            .sum();
        let denom = sum_abs_diff.max(EPS).powf(0.25);
        (k as f64).powi(4) / (self.n_query() as f64 * self.n_library() as f64 * denom)
    }

    pub fn ms_for_id_v2(&self) -> f64 {
        let k = self.k();
        if k == 0 {
            return 0.0;
        }
        let sum_q: f64 = self.ssm.query.intensity().iter().map(|&v| v as f64).sum();
        let sum_l: f64 = self.ssm.library.intensity().iter().map(|&v| v as f64).sum();
        let sum_abs_intensity_diff: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| (a as f64 - b as f64).abs())
            .sum();
        let sum_abs_mz_diff: f64 = self
            .matched
            .mq
            .iter()
            .zip(&self.matched.ml)
            .map(|(&a, &b)| (a - b).abs())
            .sum();
        let n_q = self.n_query() as f64;
        let n_l = self.n_library() as f64;
        (k as f64).powi(4) * (sum_q + 2.0 * sum_l).powf(1.25)
            / ((n_q + 2.0 * n_l).powi(2) + sum_abs_intensity_diff + sum_abs_mz_diff)
    }

    // ---- unmatched-aware distances ---------------------------------------------------

    fn sum_abs_diff(&self) -> f64 {
        self.matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| (a as f64 - b as f64).abs())
            .sum()
    }

    fn sum_unmatched(&self) -> f64 {
        self.matched.uq.iter().chain(&self.matched.ul).map(|&v| v as f64).sum()
    }

    pub fn manhattan(&self) -> f64 {
        self.sum_abs_diff() + self.sum_unmatched()
    }

    pub fn euclidean(&self) -> f64 {
        let matched_sq: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| (a as f64 - b as f64).powi(2))
            .sum();
        let unmatched_sq: f64 = self.matched.uq.iter().chain(&self.matched.ul).map(|&v| (v as f64).powi(2)).sum();
        (matched_sq + unmatched_sq).sqrt()
    }

    pub fn chebyshev(&self) -> f64 {
        let matched_max = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| (a as f64 - b as f64).abs())
            .fold(0.0_f64, f64::max);
        let unmatched_max = self.matched.uq.iter().chain(&self.matched.ul).map(|&v| v as f64).fold(0.0_f64, f64::max);
        matched_max.max(unmatched_max)
    }

    pub fn braycurtis(&self) -> f64 {
        let num = self.sum_abs_diff() + self.sum_unmatched();
        let sum_matched_plus: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| a as f64 + b as f64)
            .sum();
        let denom = sum_matched_plus + self.sum_unmatched();
        if denom <= EPS {
            0.0
        } else {
            num / denom
        }
    }

    pub fn canberra(&self) -> f64 {
        let matched_term: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| {
                let (a, b) = (a as f64, b as f64);
                let denom = a + b;
                if denom <= EPS {
                    0.0
                } else {
                    (a - b).abs() / denom
                }
            })
            .sum();
        // Empty match over non-empty spectra still adds the full unmatched-count penalty
        // here, per the catalog's canberra formula; canberra(A,A)=0 still holds since k
        // then equals n_query=n_library and the penalty vanishes too.
        let penalty = (self.n_query() - self.k()) as f64 + (self.n_library() - self.k()) as f64;
        matched_term + penalty
    }

    pub fn ruzicka(&self) -> f64 {
        let sum_min: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| (a as f64).min(b as f64))
            .sum();
        let sum_max: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| (a as f64).max(b as f64))
            .sum();
        let denom = sum_max + self.sum_unmatched();
        if denom <= EPS {
            0.0
        } else {
            sum_min / denom
        }
    }

    pub fn scribe_fragment_acc(&self) -> f64 {
        let sum_q: f64 = self.ssm.query.intensity().iter().map(|&v| v as f64).sum();
        let sum_l: f64 = self.ssm.library.intensity().iter().map(|&v| v as f64).sum();
        if sum_q <= EPS || sum_l <= EPS {
            return (1.0 / 1e-3_f64).ln();
        }
        let ssd: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| (a as f64 / sum_q - b as f64 / sum_l).powi(2))
            .sum();
        (1.0 / ssd.max(1e-3)).ln()
    }

    pub fn entropy(&self, weighted: bool) -> f64 {
        let h_q = entropy::weighted_entropy(self.ssm.query.intensity(), weighted);
        let h_l = entropy::weighted_entropy(self.ssm.library.intensity(), weighted);
        let merged = entropy::merge_intensities(
            self.ssm.query.intensity(),
            self.ssm.library.intensity(),
            &self.ssm.peak_matches,
        );
        let h_merge = entropy::weighted_entropy(&merged, weighted);
        2.0 * h_merge - h_q - h_l
    }

    // ---- bonus metrics (supplemented from the original reference implementation) -----

    /// Binary peak-overlap Jaccard index: `k / (|q| + |l| - k)`.
    pub fn jaccard(&self) -> f64 {
        let union = self.n_query() + self.n_library() - self.k();
        if union == 0 {
            0.0
        } else {
            self.k() as f64 / union as f64
        }
    }

    /// Binary peak-overlap Dice coefficient: `2k / (|q| + |l|)`.
    pub fn dice(&self) -> f64 {
        let denom = self.n_query() + self.n_library();
        if denom == 0 {
            0.0
        } else {
            2.0 * self.k() as f64 / denom as f64
        }
    }

    /// Improved similarity index: the squared relative difference `((iq-il)/(iq+il))^2`
    /// summed over every matched pair, normalized by the count of pairs with positive
    /// query intensity (not by the term count — matches the original's normalization).
    pub fn improved_sim(&self) -> f64 {
        let count_positive = self.matched.iq.iter().filter(|&&a| a > 0.0).count();
        if count_positive == 0 {
            return 0.0;
        }
        let sum_sq: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| {
                let (a, b) = (a as f64, b as f64);
                let denom = a + b;
                if denom <= EPS {
                    0.0
                } else {
                    ((a - b) / denom).powi(2)
                }
            })
            .sum();
        (sum_sq / count_positive as f64).sqrt()
    }

    /// Jensen-Shannon distance (square root of the JS divergence) between the matched
    /// intensity distributions.
    pub fn jensenshannon(&self) -> f64 {
        if self.k() == 0 {
            return 0.0;
        }
        let sum_q: f64 = self.matched.iq.iter().map(|&v| v as f64).sum();
        let sum_l: f64 = self.matched.il.iter().map(|&v| v as f64).sum();
        if sum_q <= EPS || sum_l <= EPS {
            return 0.0;
        }
        let mut divergence = 0.0;
        for (&a, &b) in self.matched.iq.iter().zip(&self.matched.il) {
            let p = a as f64 / sum_q;
            let q = b as f64 / sum_l;
            let m = 0.5 * (p + q);
            if m > 0.0 {
                if p > 0.0 {
                    divergence += 0.5 * p * (p / m).ln();
                }
                if q > 0.0 {
                    divergence += 0.5 * q * (q / m).ln();
                }
            }
        }
        divergence.max(0.0).sqrt()
    }

    pub fn wave_hedges(&self) -> f64 {
        let matched_term: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| {
                let (a, b) = (a as f64, b as f64);
                let denom = a.max(b);
                if denom <= EPS {
                    0.0
                } else {
                    (a - b).abs() / denom
                }
            })
            .sum();
        let unmatched_term = self.matched.uq.len() as f64 + self.matched.ul.len() as f64;
        matched_term + unmatched_term
    }

    pub fn squared_chord(&self) -> f64 {
        let matched_term: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| ((a as f64).sqrt() - (b as f64).sqrt()).powi(2))
            .sum();
        let unmatched_term: f64 = self.matched.uq.iter().chain(&self.matched.ul).map(|&v| v as f64).sum();
        matched_term + unmatched_term
    }

    pub fn divergence(&self) -> f64 {
        let matched_term: f64 = self
            .matched
            .iq
            .iter()
            .zip(&self.matched.il)
            .map(|(&a, &b)| {
                let (a, b) = (a as f64, b as f64);
                let denom = (a + b).powi(2);
                if denom <= EPS {
                    0.0
                } else {
                    2.0 * (a - b).powi(2) / denom
                }
            })
            .sum();
        let unmatched_term = 2.0 * (self.matched.uq.len() as f64 + self.matched.ul.len() as f64);
        matched_term + unmatched_term
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::{Spectrum, SpectrumSpectrumMatch};

    fn engine_for<'a>(
        ssm: &'a SpectrumSpectrumMatch,
        top: Option<usize>,
    ) -> SimilarityEngine<'a> {
        SimilarityEngine::new(ssm, top)
    }

    #[test]
    fn empty_match_set_sentinels() {
        let q = Spectrum::new("q", vec![100.0], vec![1.0], 500.0, Some(2));
        let l = Spectrum::new("l", vec![200.0], vec![1.0], 500.0, Some(2));
        let ssm = SpectrumSpectrumMatch::new(q, l, vec![], 0.0);
        let e = engine_for(&ssm, None);

        assert_eq!(e.cosine(), 0.0);
        assert_eq!(e.n_matched_peaks(), 0);
        assert!(e.mean_squared_error(Axis::Mz).unwrap().is_infinite());
        assert_eq!(e.kendalltau(), -1.0);
        assert_eq!(e.ms_for_id_v1(), 0.0);
        assert!((e.manhattan() - 2.0).abs() < 1e-9);
        assert!((e.euclidean() - 2.0f64.sqrt()).abs() < 1e-9);
        assert!((e.chebyshev() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn identical_spectra_perfect_alignment() {
        let mz = vec![100.0, 200.0, 300.0];
        let intensity = vec![0.6f32, 0.8, 0.0];
        let q = Spectrum::new("q", mz.clone(), intensity.clone(), 500.0, Some(2));
        let l = Spectrum::new("l", mz, intensity, 500.0, Some(2));
        let matches = vec![(0, 0), (1, 1), (2, 2)];
        let ssm = SpectrumSpectrumMatch::new(q, l, matches, 0.0);
        let e = engine_for(&ssm, None);

        assert!((e.cosine() - 1.0).abs() < 1e-6);
        assert!((e.spectral_contrast_angle() - 1.0).abs() < 1e-6);
        assert!(e.euclidean() < 1e-9);
        assert!(e.scribe_fragment_acc() >= (1.0 / 0.001f64).ln() - 1e-6);
    }

    #[test]
    fn mass_filter_da_example_boundary() {
        // See similarity-catalog boundary scenario 4: library masses bracket the window.
        let tol = 0.5;
        let query_mz = 500.0;
        let charge = 2.0;
        let library_masses = [498.0, 499.8, 500.1, 501.0];
        let kept: Vec<f64> = library_masses
            .iter()
            .copied()
            .filter(|&m| (query_mz - m).abs() * charge <= tol)
            .collect();
        assert_eq!(kept, vec![500.1]);
    }

    #[test]
    fn jaccard_and_dice_are_bounded() {
        let q = Spectrum::new("q", vec![1.0, 2.0], vec![1.0, 1.0], 500.0, Some(2));
        let l = Spectrum::new("l", vec![1.0, 2.0, 3.0], vec![1.0, 1.0, 1.0], 500.0, Some(2));
        let ssm = SpectrumSpectrumMatch::new(q, l, vec![(0, 0), (1, 1)], 0.0);
        let e = engine_for(&ssm, None);
        assert!(e.jaccard() >= 0.0 && e.jaccard() <= 1.0);
        assert!(e.dice() >= 0.0 && e.dice() <= 1.0);
    }

    #[test]
    fn top_restriction_uses_partial_selection_not_full_sort() {
        let q = Spectrum::new(
            "q",
            vec![1.0, 2.0, 3.0],
            vec![1.0, 1.0, 1.0],
            500.0,
            Some(2),
        );
        let l = Spectrum::new(
            "l",
            vec![1.0, 2.0, 3.0],
            vec![5.0, 1.0, 10.0],
            500.0,
            Some(2),
        );
        let matches = vec![(0, 0), (1, 1), (2, 2)];
        let ssm = SpectrumSpectrumMatch::new(q, l, matches, 0.0);
        let e = SimilarityEngine::new(&ssm, Some(2));
        // top=2 keeps library peaks with intensity 10 and 5, drops the one with intensity 1.
        assert_eq!(e.matched().n_matched(), 2);
    }
}
