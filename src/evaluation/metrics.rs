//! Regression scores

use crate::error::{PricerError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Scores written to `results.json`, each rounded to four decimals.
///
/// A score that is undefined for the data (NaN) is serialized as `null`
/// and read back as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    #[serde(deserialize_with = "nan_from_null")]
    pub rmse: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub mae: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub nmae: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub r2: f64,
}

fn nan_from_null<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl ScoreReport {
    /// Compute every score for targets `y` and predictions `y_hat`
    pub fn compute(y: &[f64], y_hat: &[f64]) -> Result<Self> {
        if y.len() != y_hat.len() {
            return Err(PricerError::ShapeMismatch {
                expected: format!("{} predictions", y.len()),
                actual: format!("{} predictions", y_hat.len()),
            });
        }
        if y.is_empty() {
            return Err(PricerError::DataError("cannot score an empty set".to_string()));
        }

        let mae = mae(y, y_hat);
        let iqr = iqr(y);
        let nmae = if iqr == 0.0 { f64::NAN } else { mae / iqr };

        Ok(Self {
            rmse: round4(rmse(y, y_hat)),
            mae: round4(mae),
            nmae: round4(nmae),
            r2: round4(squared_correlation(y, y_hat)),
        })
    }
}

pub fn rmse(y: &[f64], y_hat: &[f64]) -> f64 {
    let mse = y
        .iter()
        .zip(y_hat)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y.len() as f64;
    mse.sqrt()
}

pub fn mae(y: &[f64], y_hat: &[f64]) -> f64 {
    y.iter().zip(y_hat).map(|(t, p)| (t - p).abs()).sum::<f64>() / y.len() as f64
}

/// Percentile with linear interpolation between closest ranks
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Interquartile range, `q75 - q25`
pub fn iqr(values: &[f64]) -> f64 {
    percentile(values, 75.0) - percentile(values, 25.0)
}

/// Square of the Pearson correlation; 0.0 when either side has no variance
pub fn squared_correlation(y: &[f64], y_hat: &[f64]) -> f64 {
    let n = y.len() as f64;
    let mean_y = y.iter().sum::<f64>() / n;
    let mean_p = y_hat.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_y = 0.0;
    let mut var_p = 0.0;
    for (t, p) in y.iter().zip(y_hat) {
        cov += (t - mean_y) * (p - mean_p);
        var_y += (t - mean_y).powi(2);
        var_p += (p - mean_p).powi(2);
    }
    if var_y == 0.0 || var_p == 0.0 {
        return 0.0;
    }
    let r = cov / (var_y.sqrt() * var_p.sqrt());
    r * r
}

/// Round to four decimal places
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scores() {
        let y = [1.0, 2.0, 3.0, 4.0];
        let y_hat = [1.0, 2.0, 3.0, 5.0];
        let report = ScoreReport::compute(&y, &y_hat).unwrap();

        assert_eq!(report.rmse, 0.5);
        assert_eq!(report.mae, 0.25);
        assert_eq!(report.nmae, round4(0.25 / 1.5));
        assert!(report.r2 > 0.9 && report.r2 <= 1.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(percentile(&values, 25.0), 1.75);
        assert_eq!(percentile(&values, 75.0), 3.25);
        assert_eq!(percentile(&values, 50.0), 2.5);
        assert_eq!(percentile(&[7.0], 75.0), 7.0);
    }

    #[test]
    fn test_zero_iqr_gives_null_nmae() {
        let report = ScoreReport::compute(&[5.0, 5.0], &[4.0, 6.0]).unwrap();
        assert!(report.nmae.is_nan());
        assert_eq!(report.r2, 0.0);

        let json = serde_json::to_value(report).unwrap();
        assert!(json["nmae"].is_null());
        assert_eq!(json["mae"], serde_json::json!(1.0));
    }

    #[test]
    fn test_constant_predictions_score_zero_r2() {
        let report = ScoreReport::compute(&[1.0, 2.0, 3.0, 4.0], &[2.5; 4]).unwrap();
        assert_eq!(report.r2, 0.0);
        assert_eq!(squared_correlation(&[3.0, 3.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_null_score_reads_back_as_nan() {
        let report = ScoreReport::compute(&[5.0, 5.0], &[4.0, 6.0]).unwrap();
        let json = serde_json::to_string(&report).unwrap();

        let restored: ScoreReport = serde_json::from_str(&json).unwrap();
        assert!(restored.nmae.is_nan());
        assert_eq!(restored.mae, report.mae);
        assert_eq!(restored.rmse, report.rmse);
        assert_eq!(restored.r2, report.r2);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            ScoreReport::compute(&[1.0], &[1.0, 2.0]),
            Err(PricerError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.166666), 0.1667);
        assert_eq!(round4(1234.56789), 1234.5679);
    }
}
