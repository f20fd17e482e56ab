//! Statistical routines for the Gamelytics dashboard.
//!
//! This crate knows nothing about players or games; it works on plain `f64`
//! slices and rows:
//!
//! - **Descriptive statistics**: mean, median, variance, standard deviation
//! - **Percentiles**: linear-interpolated percentiles of a dataset
//! - **Histograms**: equal-width and fixed-width binning
//! - **Standardization**: per-feature zero-mean / unit-variance scaling
//! - **k-means**: seeded k-means++ clustering with restarts
//! - **Hypothesis tests**: chi-squared 2x2, Welch's t-test, effect sizes and
//!   confidence intervals
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation
//! - [`histogram`]: Histogram construction for visualizing distributions
//! - [`standardize`]: Feature standardization
//! - [`kmeans`]: k-means clustering
//! - [`hypothesis`]: Two-sample significance testing
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use gamelytics_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Creating a histogram
//!
//! ```
//! use gamelytics_stats::histogram::Histogram;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
//! let histogram = Histogram::new(values, 5);
//! assert_eq!(histogram.total(), 10);
//! ```
//!
//! ## Comparing two samples
//!
//! ```
//! use gamelytics_stats::hypothesis::{SampleSummary, welch_t_test};
//!
//! let a = SampleSummary::from_values(&[1.0, 2.0, 3.0]).unwrap();
//! let b = SampleSummary::from_values(&[1.0, 2.0, 3.0]).unwrap();
//! assert!(welch_t_test(&a, &b).p_value > 0.5);
//! ```

pub mod descriptive;
pub mod histogram;
pub mod hypothesis;
pub mod kmeans;
pub mod percentiles;
pub mod standardize;
