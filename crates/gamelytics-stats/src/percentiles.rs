/// Computes a single percentile value from sorted data.
///
/// Uses linear interpolation between the two closest ranks, so the 50th
/// percentile of an even-length dataset is the midpoint of the two central
/// values. For a dataset with n values the fractional rank is
/// `(n - 1) * percentile / 100`.
///
/// # Arguments
///
/// * `sorted_values` - Values sorted in ascending order
/// * `percentile` - The percentile to compute (0.0 to 100.0, clamped)
///
/// # Returns
///
/// The value at the specified percentile. Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use gamelytics_stats::percentiles::compute_percentile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
///
/// assert_eq!(compute_percentile(&values, 50.0), 3.0);
/// assert_eq!(compute_percentile(&values, 25.0), 2.0);
/// assert_eq!(compute_percentile(&[1.0, 2.0], 50.0), 1.5);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    let Some(&last) = sorted_values.last() else {
        return f64::NAN;
    };
    let rank = (sorted_values.len() - 1) as f64 * percentile.clamp(0.0, 100.0) / 100.0;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if upper >= sorted_values.len() {
        return last;
    }
    let fraction = rank - lower as f64;
    sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * fraction
}

/// Computes several percentiles from unsorted values.
///
/// Returns one value per requested point, in the same order.
///
/// ```
/// use gamelytics_stats::percentiles::percentiles_of;
///
/// let cuts = percentiles_of([3.0, 1.0, 2.0, 4.0], &[0.0, 100.0]);
/// assert_eq!(cuts, vec![1.0, 4.0]);
/// ```
#[must_use]
pub fn percentiles_of<I>(values: I, percentile_points: &[f64]) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sorted = values.into_iter().collect::<Vec<_>>();
    sorted.sort_by(f64::total_cmp);
    percentile_points
        .iter()
        .map(|&p| compute_percentile(&sorted, p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_nan() {
        assert!(compute_percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_interpolates_between_ranks() {
        let values = [10.0, 20.0, 30.0, 40.0];
        // rank = 3 * 1/3 = 1.0
        assert!((compute_percentile(&values, 100.0 / 3.0) - 20.0).abs() < 1e-9);
        // rank = 3 * 0.5 = 1.5
        assert!((compute_percentile(&values, 50.0) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_percentile_is_clamped() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(compute_percentile(&values, 150.0), 3.0);
        assert_eq!(compute_percentile(&values, -5.0), 1.0);
    }
}
