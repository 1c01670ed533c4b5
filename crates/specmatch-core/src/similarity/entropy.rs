//! Spectral entropy: Shannon entropy of a normalized intensity vector, with an optional
//! re-exponentiation schedule that sharpens low-entropy spectra before the final
//! entropy computation.

const WEIGHT_START: f64 = 0.25;
const ENTROPY_CUTOFF: f64 = 3.0;

fn weight_slope() -> f64 {
    (1.0 - WEIGHT_START) / ENTROPY_CUTOFF
}

/// Shannon entropy of `values`, normalized to sum to 1 first. Zero-intensity entries
/// contribute nothing (by the usual `0 * ln(0) = 0` convention).
pub fn shannon_entropy(values: &[f32]) -> f64 {
    let total: f64 = values.iter().map(|&v| v as f64).sum();
    if total <= f64::EPSILON {
        return 0.0;
    }
    let mut h = 0.0;
    for &v in values {
        let p = v as f64 / total;
        if p > 0.0 {
            h -= p * p.ln();
        }
    }
    h
}

/// `H(x)` with the optional weighted re-exponentiation schedule applied first.
///
/// When `weighted` is false, or the unweighted entropy already exceeds the cutoff,
/// the entropy is returned unchanged. Otherwise intensities are re-exponentiated by
/// `w = weight_start + slope * H(x)`, renormalized, and entropy is recomputed.
pub fn weighted_entropy(values: &[f32], weighted: bool) -> f64 {
    let h = shannon_entropy(values);
    if !weighted || h > ENTROPY_CUTOFF {
        return h;
    }
    let w = WEIGHT_START + weight_slope() * h;
    let reweighted: Vec<f32> = values.iter().map(|&v| (v as f64).powf(w) as f32).collect();
    shannon_entropy(&reweighted)
}

/// Build the merged spectrum used by the `entropy` metric: a copy of the query
/// intensities with library intensities added in at matched indices, followed by the
/// library intensities at every unmatched library index.
pub fn merge_intensities(
    query_intensity: &[f32],
    library_intensity: &[f32],
    peak_matches: &[(usize, usize)],
) -> Vec<f32> {
    let mut merged = query_intensity.to_vec();
    let mut library_matched = vec![false; library_intensity.len()];
    for &(q, l) in peak_matches {
        if q < merged.len() && l < library_intensity.len() {
            merged[q] += library_intensity[l];
            library_matched[l] = true;
        }
    }
    for (l, &matched) in library_matched.iter().enumerate() {
        if !matched {
            merged.push(library_intensity[l]);
        }
    }
    merged
}
