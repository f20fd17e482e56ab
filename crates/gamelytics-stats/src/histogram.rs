use std::ops::Range;

use serde::Serialize;

/// A histogram representation of a dataset's distribution.
///
/// The histogram divides the data range `[min, max]` into equal-width bins
/// and counts the values falling into each bin. The last bin is closed on the
/// right so that the maximum value is always counted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Histogram {
    /// The bins comprising the histogram, ordered by range.
    pub bins: Vec<HistogramBin>,
}

/// A single bin in a histogram.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end).
    pub range: Range<f64>,
    /// The number of values that fall within this bin's range.
    pub count: u64,
}

impl Histogram {
    /// Creates a histogram with `num_bins` equal-width bins.
    ///
    /// Non-finite values are ignored. An empty input or `num_bins == 0`
    /// yields a histogram without bins.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gamelytics_stats::histogram::Histogram;
    /// let values = [5.0, 2.0, 8.0, 1.0, 9.0, 3.0, 7.0, 4.0, 6.0, 10.0];
    /// let histogram = Histogram::new(values, 5);
    /// assert_eq!(histogram.bins.len(), 5);
    /// assert_eq!(histogram.total(), 10);
    /// ```
    #[must_use]
    pub fn new<I>(values: I, num_bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self::build(values, BinSpec::Count(num_bins))
    }

    /// Creates a histogram whose bins have a fixed width, starting at the
    /// minimum value rounded down to a multiple of `bin_width`.
    ///
    /// Use this for discrete data (ages, counts) so that bins align to
    /// whole units.
    ///
    /// ```
    /// # use gamelytics_stats::histogram::Histogram;
    /// let histogram = Histogram::with_bin_width([18.0, 19.0, 25.0, 31.0], 5.0);
    /// assert_eq!(histogram.bins[0].range.start, 15.0);
    /// assert_eq!(histogram.total(), 4);
    /// ```
    #[must_use]
    pub fn with_bin_width<I>(values: I, bin_width: f64) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self::build(values, BinSpec::Width(bin_width))
    }

    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    fn build<I>(values: I, spec: BinSpec) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        let Some(min) = values.iter().copied().reduce(f64::min) else {
            return Self::default();
        };
        let max = values.iter().copied().fold(min, f64::max);

        let (start, width, num_bins) = match spec {
            BinSpec::Count(0) => return Self::default(),
            BinSpec::Count(n) => {
                let range = max - min;
                if range <= f64::EPSILON {
                    // Distribution concentrated at a single value
                    (min, 1.0, 1)
                } else {
                    (min, range / n as f64, n)
                }
            }
            BinSpec::Width(width) if width > 0.0 && width.is_finite() => {
                let start = (min / width).floor() * width;
                let n = ((max - start) / width).floor() as usize + 1;
                (start, width, n)
            }
            BinSpec::Width(_) => return Self::default(),
        };

        let mut bins = (0..num_bins)
            .map(|idx| HistogramBin {
                range: start + idx as f64 * width..start + (idx + 1) as f64 * width,
                count: 0,
            })
            .collect::<Vec<_>>();

        for value in values {
            let idx = (((value - start) / width).floor() as usize).min(num_bins - 1);
            bins[idx].count += 1;
        }

        Self { bins }
    }

    /// Total number of values counted across all bins.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).sum()
    }
}

#[derive(Debug, Clone, Copy)]
enum BinSpec {
    Count(usize),
    Width(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        let histogram = Histogram::new(Vec::<f64>::new(), 10);
        assert!(histogram.bins.is_empty());
    }

    #[test]
    fn test_maximum_is_counted_in_last_bin() {
        let histogram = Histogram::new([0.0, 5.0, 10.0], 2);
        assert_eq!(histogram.bins.len(), 2);
        assert_eq!(histogram.bins[0].count, 1);
        assert_eq!(histogram.bins[1].count, 2);
    }

    #[test]
    fn test_single_value_produces_single_bin() {
        let histogram = Histogram::new([3.0, 3.0, 3.0], 10);
        assert_eq!(histogram.bins.len(), 1);
        assert_eq!(histogram.bins[0].count, 3);
    }

    #[test]
    fn test_fixed_width_alignment() {
        let histogram = Histogram::with_bin_width([0.0, 1.0, 1.0, 2.0, 7.0], 1.0);
        assert_eq!(histogram.bins.len(), 8);
        assert_eq!(histogram.bins[1].count, 2);
        assert_eq!(histogram.bins[7].count, 1);
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let histogram = Histogram::new([1.0, f64::NAN, 2.0, f64::INFINITY], 2);
        assert_eq!(histogram.total(), 2);
    }
}
