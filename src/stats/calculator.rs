//! Statistics Calculator Module
//! Descriptive statistics, Likert distributions and category counts.

use crate::config::FieldName;
use crate::data::Series;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Likert scale used by the rating questions.
pub const LIKERT_SCORES: [u8; 5] = [1, 2, 3, 4, 5];

/// Descriptive statistics for one non-empty series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldStats {
    pub field: FieldName,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub p05: f64,
    pub p25: f64,
    pub p75: f64,
    pub p95: f64,
}

/// Count and share of one Likert score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreShare {
    pub score: u8,
    pub count: usize,
    pub percentage: f64,
}

/// Count and share of one categorical answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Descriptive statistics, `None` for an empty series.
    pub fn describe(series: &Series) -> Option<FieldStats> {
        let values = series.values();
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        // Sample variance (ddof = 1); a single answer has no spread.
        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        Some(FieldStats {
            field: series.field.clone(),
            count: n,
            mean,
            median,
            std: variance.sqrt(),
            variance,
            min: sorted[0],
            max: sorted[n - 1],
            p05: Self::percentile(&sorted, 5.0),
            p25: Self::percentile(&sorted, 25.0),
            p75: Self::percentile(&sorted, 75.0),
            p95: Self::percentile(&sorted, 95.0),
        })
    }

    /// Percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Share of each 1-5 score. Values off the scale are not counted.
    pub fn likert_distribution(series: &Series) -> Vec<ScoreShare> {
        let total = series.len();
        LIKERT_SCORES
            .iter()
            .map(|&score| {
                let count = series
                    .values()
                    .iter()
                    .filter(|&&v| v == f64::from(score))
                    .count();
                ScoreShare {
                    score,
                    count,
                    percentage: Self::share(count, total),
                }
            })
            .collect()
    }

    /// Frequency of each answer, most common first, ties by label.
    pub fn category_counts(labels: &[String]) -> Vec<CategoryCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for label in labels {
            *counts.entry(label.as_str()).or_default() += 1;
        }

        let total = labels.len();
        let mut result: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(label, count)| CategoryCount {
                label: label.to_string(),
                count,
                percentage: Self::share(count, total),
            })
            .collect();
        result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        result
    }

    fn share(count: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64 * 100.0
        }
    }

    /// Describe many series in parallel; empty ones map to `None`.
    pub fn describe_all_parallel(series: &[Series]) -> HashMap<FieldName, Option<FieldStats>> {
        series
            .par_iter()
            .map(|s| (s.field.clone(), Self::describe(s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Series {
        Series::from_values(FieldName::new("Age"), values.to_vec())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn describes_age_series() {
        let stats = StatsCalculator::describe(&series(&[34.0, 29.0, 51.0, 40.0])).unwrap();
        assert_eq!(stats.count, 4);
        assert!(close(stats.mean, 38.5));
        assert!(close(stats.median, 37.0));
        assert_eq!(stats.min, 29.0);
        assert_eq!(stats.max, 51.0);
        // sample variance of [29, 34, 40, 51]
        assert!(close(stats.variance, 269.0 / 3.0));
        assert!(close(stats.p25, 32.75));
    }

    #[test]
    fn single_value_has_zero_spread() {
        let stats = StatsCalculator::describe(&series(&[3.0])).unwrap();
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.p95, 3.0);
    }

    #[test]
    fn empty_series_has_no_stats() {
        assert!(StatsCalculator::describe(&series(&[])).is_none());
    }

    #[test]
    fn percentile_matches_numpy_linear() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(close(StatsCalculator::percentile(&sorted, 5.0), 1.2));
        assert!(close(StatsCalculator::percentile(&sorted, 50.0), 3.0));
        assert!(close(StatsCalculator::percentile(&sorted, 95.0), 4.8));
    }

    #[test]
    fn likert_distribution_counts_each_score() {
        let dist = StatsCalculator::likert_distribution(&series(&[5.0, 3.0, 4.0, 5.0, 2.5]));
        let counts: Vec<usize> = dist.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![0, 0, 1, 1, 2]);
        assert!(close(dist[4].percentage, 40.0));
    }

    #[test]
    fn category_counts_most_common_first() {
        let labels: Vec<String> = [
            "student", "engineer", "student", "artist", "engineer", "student",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let counts = StatsCalculator::category_counts(&labels);
        assert_eq!(counts[0].label, "student");
        assert_eq!(counts[0].count, 3);
        assert!(close(counts[0].percentage, 50.0));
        assert_eq!(counts[2].label, "artist");
    }

    #[test]
    fn parallel_describe_keeps_empty_distinct() {
        let all = vec![
            series(&[1.0, 2.0]),
            Series::empty(FieldName::new("TechAffinity")),
        ];
        let stats = StatsCalculator::describe_all_parallel(&all);
        assert!(stats[&FieldName::new("Age")].is_some());
        assert!(stats[&FieldName::new("TechAffinity")].is_none());
    }
}
