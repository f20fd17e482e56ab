/// Per-feature standardization to zero mean and unit variance.
///
/// Fitted on a row-major matrix of samples; the scale of each feature is its
/// population standard deviation. Features with zero variance keep a scale of
/// `1.0`, so they standardize to all zeros instead of NaN.
///
/// # Examples
///
/// ```
/// use gamelytics_stats::standardize::StandardScaler;
///
/// let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
/// let scaler = StandardScaler::fit(&rows);
/// let scaled = scaler.transform(&rows);
/// assert_eq!(scaled[0], vec![-1.0, 0.0]);
/// assert_eq!(scaled[1], vec![1.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct StandardScaler {
    /// Mean of each feature.
    pub means: Vec<f64>,
    /// Population standard deviation of each feature (`1.0` when zero).
    pub scales: Vec<f64>,
}

impl StandardScaler {
    /// Fits the scaler on the given rows.
    ///
    /// The number of features is taken from the first row; an empty input
    /// produces a scaler with no features.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let num_features = rows.first().map_or(0, Vec::len);
        if rows.is_empty() {
            return Self {
                means: vec![],
                scales: vec![],
            };
        }
        let n = rows.len() as f64;

        let mut means = vec![0.0; num_features];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut scales = vec![0.0; num_features];
        for row in rows {
            for ((scale, value), mean) in scales.iter_mut().zip(row).zip(&means) {
                *scale += (value - mean).powi(2);
            }
        }
        for scale in &mut scales {
            let std_dev = (*scale / n).sqrt();
            *scale = if std_dev > f64::EPSILON { std_dev } else { 1.0 };
        }

        Self { means, scales }
    }

    /// Standardizes each row with the fitted means and scales.
    #[must_use]
    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(&self.means)
                    .zip(&self.scales)
                    .map(|((value, mean), scale)| (value - mean) / scale)
                    .collect()
            })
            .collect()
    }

    /// Fits on `rows` and returns the standardized rows.
    #[must_use]
    pub fn fit_transform(rows: &[Vec<f64>]) -> (Self, Vec<Vec<f64>>) {
        let scaler = Self::fit(rows);
        let scaled = scaler.transform(rows);
        (scaler, scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardized_columns_have_zero_mean_unit_variance() {
        let rows = vec![
            vec![1.0, 100.0],
            vec![2.0, 300.0],
            vec![3.0, 200.0],
            vec![6.0, 400.0],
        ];
        let (_, scaled) = StandardScaler::fit_transform(&rows);
        for col in 0..2 {
            let mean = scaled.iter().map(|r| r[col]).sum::<f64>() / 4.0;
            let var = scaled.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_feature_scales_to_zero() {
        let rows = vec![vec![5.0], vec![5.0], vec![5.0]];
        let (scaler, scaled) = StandardScaler::fit_transform(&rows);
        assert_eq!(scaler.scales, vec![1.0]);
        assert!(scaled.iter().all(|r| r[0] == 0.0));
    }

    #[test]
    fn test_empty_rows() {
        let (scaler, scaled) = StandardScaler::fit_transform(&[]);
        assert!(scaler.means.is_empty());
        assert!(scaled.is_empty());
    }
}
