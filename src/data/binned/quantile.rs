//! Bin threshold computation from a feature column.
//!
//! Thresholds are the cut points between consecutive bins. A value `x` lands in
//! bin `b` when `t[b-1] < x <= t[b]`, so bin `b` is the number of thresholds
//! strictly smaller than `x`.

/// Compute sorted, deduplicated thresholds for one feature.
///
/// `values` must contain only finite numbers (missing values already removed).
/// The slice is sorted in place.
///
/// - At most `max_bins` distinct values: one bin per distinct value, with the
///   thresholds at midpoints between consecutive distinct values.
/// - Otherwise: the `100·k/max_bins` percentiles (`k = 1..max_bins`) with
///   midpoint interpolation, deduplicated so ties never produce empty bins.
pub(crate) fn find_thresholds(values: &mut [f64], max_bins: usize) -> Vec<f64> {
    debug_assert!(max_bins >= 2);
    if values.is_empty() {
        return Vec::new();
    }

    values.sort_unstable_by(f64::total_cmp);

    let mut distinct: Vec<f64> = Vec::with_capacity(max_bins + 1);
    for &v in values.iter() {
        if distinct.last() != Some(&v) {
            distinct.push(v);
            if distinct.len() > max_bins {
                break;
            }
        }
    }

    if distinct.len() <= max_bins {
        return distinct
            .windows(2)
            .map(|w| separating_midpoint(w[0], w[1]))
            .collect();
    }

    let mut thresholds: Vec<f64> = Vec::with_capacity(max_bins - 1);
    for k in 1..max_bins {
        let t = percentile_midpoint(values, 100.0 * k as f64 / max_bins as f64);
        // Heavy ties collapse neighbouring percentiles onto the same value.
        if thresholds.last().is_none_or(|&last| t > last) {
            thresholds.push(t);
        }
    }
    thresholds
}

/// Percentile of sorted data, averaging the two neighbouring order statistics.
fn percentile_midpoint(sorted: &[f64], percentile: f64) -> f64 {
    let rank = percentile / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    midpoint(sorted[lo], sorted[hi])
}

#[inline]
fn midpoint(a: f64, b: f64) -> f64 {
    a + (b - a) * 0.5
}

/// Midpoint of `a < b` that still puts `a` and `b` in different bins.
///
/// Between adjacent floats the midpoint rounds to `b`; `a` itself is the
/// threshold then. The result lies in `[a, b)`, so thresholds built from
/// consecutive distinct values are strictly increasing.
#[inline]
fn separating_midpoint(a: f64, b: f64) -> f64 {
    let m = midpoint(a, b);
    if m < b { m } else { a }
}
