//! Rank-correlation helpers shared by `kendalltau`, `pearsonr`, and `spearmanr`.

/// Kendall's tau-b over paired observations, using the textbook O(n^2) concordant/
/// discordant pair count — matched-peak counts in practice are small (tens, not
/// thousands), so the quadratic cost never matters.
///
/// Returns `-1.0` for fewer than two pairs (the empty-match sentinel required by the
/// metric catalog; a single pair has no ordering to compare against).
pub fn kendall_tau(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len();
    if n < 2 {
        return -1.0;
    }
    let mut concordant: i64 = 0;
    let mut discordant: i64 = 0;
    let mut ties_a: i64 = 0;
    let mut ties_b: i64 = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            let da = a[i] - a[j];
            let db = b[i] - b[j];
            let sign = da.signum() as i64 * db.signum() as i64;
            match (da == 0.0, db == 0.0) {
                (true, true) => {}
                (true, false) => ties_a += 1,
                (false, true) => ties_b += 1,
                (false, false) => {
                    if sign > 0 {
                        concordant += 1;
                    } else {
                        discordant += 1;
                    }
                }
            }
        }
    }
    let n0 = (n * (n - 1) / 2) as f64;
    let denom = ((n0 - ties_a as f64) * (n0 - ties_b as f64)).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (concordant - discordant) as f64 / denom
}

/// Pearson correlation coefficient. Returns `0.0` for fewer than two pairs, matching
/// the metric catalog's empty/degenerate sentinel rather than propagating NaN.
pub fn pearson(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len();
    if n < 2 {
        return 0.0;
    }
    let mean_a = a.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let mean_b = b.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] as f64 - mean_a;
        let db = b[i] as f64 - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (var_a * var_b).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    cov / denom
}

/// Fractional (average-tie) ranks, ascending.
fn fractional_ranks(values: &[f32]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| values[i].partial_cmp(&values[j]).unwrap());

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let avg_rank = ((i + j) as f64 / 2.0) + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }
    ranks
}

/// Spearman rank correlation: Pearson correlation of fractional ranks.
/// Returns `0.0` for fewer than two pairs.
pub fn spearman(a: &[f32], b: &[f32]) -> f64 {
    if a.len() < 2 {
        return 0.0;
    }
    let ra = fractional_ranks(a);
    let rb = fractional_ranks(b);
    let ra32: Vec<f32> = ra.iter().map(|&v| v as f32).collect();
    let rb32: Vec<f32> = rb.iter().map(|&v| v as f32).collect();
    pearson(&ra32, &rb32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kendall_perfect_agreement() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [10.0, 20.0, 30.0, 40.0];
        assert!((kendall_tau(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn kendall_perfect_disagreement() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [40.0, 30.0, 20.0, 10.0];
        assert!((kendall_tau(&a, &b) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn pearson_too_few_points() {
        assert_eq!(pearson(&[1.0], &[2.0]), 0.0);
    }

    #[test]
    fn spearman_perfect_agreement() {
        let a = [3.0, 1.0, 2.0];
        let b = [30.0, 10.0, 20.0];
        assert!((spearman(&a, &b) - 1.0).abs() < 1e-9);
    }
}
