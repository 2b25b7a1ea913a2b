//! Pearson correlation and least-squares fit over aligned pairs.

use crate::data::AlignedPair;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
    Negligible,
}

impl CorrelationStrength {
    pub fn from_r(r: f64) -> Self {
        let r = r.abs();
        if r >= 0.7 {
            CorrelationStrength::Strong
        } else if r >= 0.4 {
            CorrelationStrength::Moderate
        } else if r >= 0.2 {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::Negligible
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CorrelationStrength::Strong => "strong correlation",
            CorrelationStrength::Moderate => "moderate correlation",
            CorrelationStrength::Weak => "weak correlation",
            CorrelationStrength::Negligible => "little to no correlation",
        };
        f.write_str(text)
    }
}

/// y = slope * x + intercept
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlation {
    pub x_field: String,
    pub y_field: String,
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
    pub x_mean: f64,
    pub y_mean: f64,
    pub strength: CorrelationStrength,
    pub fit: LinearFit,
}

/// Pearson r with two-tailed p-value.
///
/// `None` when fewer than two pairs remain or either side is constant.
pub fn pearson(pair: &AlignedPair) -> Option<Correlation> {
    let n = pair.len();
    if n < 2 {
        return None;
    }

    let xs = pair.x.values();
    let ys = pair.y.values();
    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let y_mean = ys.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in pair.points() {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let slope = sxy / sxx;

    Some(Correlation {
        x_field: pair.x.field.to_string(),
        y_field: pair.y.field.to_string(),
        r,
        p_value: p_value(r, n),
        n,
        x_mean,
        y_mean,
        strength: CorrelationStrength::from_r(r),
        fit: LinearFit {
            slope,
            intercept: y_mean - slope * x_mean,
        },
    })
}

fn p_value(r: f64, n: usize) -> f64 {
    // Two points always lie on a line.
    if n < 3 {
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldName;
    use crate::data::Series;

    fn pair(xs: &[f64], ys: &[f64]) -> AlignedPair {
        AlignedPair::positional(
            &Series::from_values(FieldName::new("X"), xs.to_vec()),
            &Series::from_values(FieldName::new("Y"), ys.to_vec()),
        )
    }

    #[test]
    fn perfect_line() {
        let c = pearson(&pair(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0])).unwrap();
        assert!((c.r - 1.0).abs() < 1e-12);
        assert_eq!(c.p_value, 0.0);
        assert!((c.fit.slope - 2.0).abs() < 1e-12);
        assert!(c.fit.intercept.abs() < 1e-12);
        assert_eq!(c.strength, CorrelationStrength::Strong);
    }

    #[test]
    fn matches_reference_values() {
        // scipy.stats.pearsonr([1,2,3,4,5], [2,1,4,3,5]) -> (0.8, 0.1040)
        let c = pearson(&pair(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 1.0, 4.0, 3.0, 5.0])).unwrap();
        assert!((c.r - 0.8).abs() < 1e-12);
        assert!((c.p_value - 0.1040).abs() < 1e-3);
        assert_eq!(c.n, 5);
    }

    #[test]
    fn constant_side_has_no_correlation() {
        assert!(pearson(&pair(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0])).is_none());
    }

    #[test]
    fn too_few_points() {
        assert!(pearson(&pair(&[1.0], &[1.0])).is_none());
        let two = pearson(&pair(&[1.0, 2.0], &[5.0, 3.0])).unwrap();
        assert_eq!(two.p_value, 1.0);
    }

    #[test]
    fn strength_thresholds() {
        assert_eq!(CorrelationStrength::from_r(-0.75), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::from_r(0.4), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_r(0.25), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::from_r(0.1), CorrelationStrength::Negligible);
    }

    #[test]
    fn symmetric_in_arguments() {
        let p = pair(&[1.0, 2.0, 4.0, 3.0], &[1.0, 3.0, 2.0, 5.0]);
        let a = pearson(&p).unwrap();
        let b = pearson(&p.swapped()).unwrap();
        assert!((a.r - b.r).abs() < 1e-12);
        assert!((a.p_value - b.p_value).abs() < 1e-12);
    }
}
