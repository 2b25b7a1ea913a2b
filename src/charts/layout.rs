//! Chart Layout Module
//! Backend-independent geometry: histogram bins, box summaries, point spreading.

use crate::stats::StatsCalculator;
use std::collections::HashMap;

/// One histogram bar covering `[start, end)` (the last bin is closed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Five-number summary drawn by a box plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
    pub mean: f64,
}

/// Equal-width bins spanning the data, like `numpy.histogram`.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // A single distinct value gets a unit-wide range centred on it.
    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: lo + i as f64 * width,
            end: lo + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Quartiles with 1.5 IQR whiskers clipped to the data.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = StatsCalculator::percentile(&sorted, 25.0);
    let median = StatsCalculator::percentile(&sorted, 50.0);
    let q3 = StatsCalculator::percentile(&sorted, 75.0);
    let iqr = q3 - q1;

    let whisker_low = sorted
        .iter()
        .copied()
        .find(|&v| v >= q1 - 1.5 * iqr)
        .unwrap_or(q1);
    let whisker_high = sorted
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= q3 + 1.5 * iqr)
        .unwrap_or(q3);

    Some(BoxSummary {
        whisker_low,
        q1,
        median,
        q3,
        whisker_high,
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
    })
}

/// Horizontal offsets that spread duplicate values symmetrically around `center`.
pub fn beeswarm_positions(y_values: &[f64], center: f64, width: f64) -> Vec<f64> {
    let n = y_values.len();
    if n == 0 {
        return Vec::new();
    }

    let mut positions = vec![center; n];

    // Round values and find duplicates
    let precision = 1e6;
    let mut value_indices: HashMap<i64, Vec<usize>> = HashMap::new();
    for (i, &y) in y_values.iter().enumerate() {
        let key = (y * precision).round() as i64;
        value_indices.entry(key).or_default().push(i);
    }

    for indices in value_indices.values() {
        if indices.len() > 1 {
            let step = width / (indices.len() - 1) as f64;
            let start = center - width / 2.0;
            for (i, &idx) in indices.iter().enumerate() {
                positions[idx] = start + i as f64 * step;
            }
        }
    }

    positions
}

/// Data range padded by 15% on each side; `fallback` when there is no data.
pub fn padded_range<'a, I>(values: I, fallback: (f64, f64)) -> (f64, f64)
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_infinite() {
        return fallback;
    }
    let pad = ((max - min) * 0.15).max(0.5);
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_cover_all_values() {
        let bins = histogram_bins(&[1.0, 2.0, 2.0, 3.0, 5.0], 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].start, 1.0);
        assert_eq!(bins[3].end, 5.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        // max value falls in the last (closed) bin
        assert_eq!(bins[3].count, 1);
    }

    #[test]
    fn single_value_bins() {
        let bins = histogram_bins(&[4.0, 4.0], 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
        assert!(bins[0].start < 4.0 && bins[4].end > 4.0);
    }

    #[test]
    fn no_bins_for_empty_input() {
        assert!(histogram_bins(&[], 5).is_empty());
    }

    #[test]
    fn box_summary_whiskers_exclude_outliers() {
        let summary = box_summary(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(summary.median, 3.5);
        assert_eq!(summary.whisker_low, 1.0);
        assert_eq!(summary.whisker_high, 5.0);
        assert!(box_summary(&[]).is_none());
    }

    #[test]
    fn beeswarm_spreads_duplicates_only() {
        let xs = beeswarm_positions(&[3.0, 3.0, 5.0], 1.0, 0.2);
        assert!((xs[0] - 0.9).abs() < 1e-12);
        assert!((xs[1] - 1.1).abs() < 1e-12);
        assert_eq!(xs[2], 1.0);
    }

    #[test]
    fn padded_range_falls_back_when_empty() {
        assert_eq!(padded_range(&[], (0.0, 6.0)), (0.0, 6.0));
        let (lo, hi) = padded_range(&[1.0, 5.0], (0.0, 1.0));
        assert!(lo < 1.0 && hi > 5.0);
    }
}
