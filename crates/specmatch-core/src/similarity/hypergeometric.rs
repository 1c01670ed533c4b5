//! Hypergeometric candidate-quality score.
//!
//! Models "how surprising is it that `k` of `L` library peaks landed in query bins by
//! chance" as a hypergeometric tail probability over `B` total bins.

use statrs::function::gamma::ln_gamma;

/// `ln C(n, k)`, or `-inf` for an out-of-range `k` (the term it feeds into then
/// contributes zero via `exp(-inf) == 0`).
fn ln_choose(n: f64, k: f64) -> f64 {
    if k < 0.0 || k > n || n < 0.0 {
        return f64::NEG_INFINITY;
    }
    ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0)
}

/// Number of bins spanning `[min_mz, max_mz)` at `bin_size`.
pub fn n_bins(min_mz: f64, max_mz: f64, bin_size: f64) -> usize {
    ((max_mz - min_mz) / bin_size).ceil().max(0.0) as usize
}

/// `Σ_{i=k+1}^{L-1} C(L,i) C(B-L,L-i) / C(B,L)`.
///
/// When `B < L` there are fewer bins than library peaks, so `B - L` is negative and the
/// combinatorial model is degenerate; this implementation returns `0.0` in that case
/// rather than guessing an alternate upper bound (see the crate's design notes).
pub fn hypergeometric_score(l_peaks: usize, k_matched: usize, n_bins: usize) -> f64 {
    let l = l_peaks as f64;
    let b = n_bins as f64;
    if n_bins < l_peaks || l_peaks == 0 {
        return 0.0;
    }
    if k_matched >= l_peaks {
        // k+1 > L-1: empty summation range.
        return 0.0;
    }
    let log_denom = ln_choose(b, l);
    let mut total = 0.0;
    for i in (k_matched + 1)..l_peaks {
        let term = ln_choose(l, i as f64) + ln_choose(b - l, l - i as f64) - log_denom;
        total += term.exp();
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_matched_and_full_library_degenerate_to_zero() {
        assert_eq!(hypergeometric_score(5, 5, 100), 0.0);
    }

    #[test]
    fn closed_form_matches_spec_example() {
        // L=5, k=3, B=100 => single term i=4.
        let l = 5.0_f64;
        let b = 100.0_f64;
        let expected = {
            let c_l_i = ln_choose(l, 4.0).exp();
            let c_bl_li = ln_choose(b - l, l - 4.0).exp();
            let c_b_l = ln_choose(b, l).exp();
            c_l_i * c_bl_li / c_b_l
        };
        let got = hypergeometric_score(5, 3, 100);
        assert!((got - expected).abs() / expected < 1e-6);
    }

    #[test]
    fn more_bins_than_peaks_required() {
        assert_eq!(hypergeometric_score(10, 2, 5), 0.0);
    }

    #[test]
    fn n_bins_matches_config_shape() {
        assert_eq!(n_bins(0.0, 10.0, 2.0), 5);
    }
}
