//! Analyzers behind the Gamelytics dashboard.
//!
//! Every analyzer is a pure function of a [`FilteredView`] and returns a plain
//! serializable result. Analyses that need a minimum amount of data report
//! an [`AnalysisError`] instead of producing NaN figures; page metrics in
//! [`metrics`] are zero-guarded and never fail.
//!
//! - [`aggregate`]: grouped means, sums and value counts
//! - [`metrics`]: KPI figures for each dashboard page
//! - [`retention`]: retention curves by days since signup
//! - [`cohort`]: weekly signup cohort matrix
//! - [`segmentation`]: k-means player segments with characteristic labels
//! - [`ab_test`]: A/B significance testing and effect sizes
//! - [`session`]: dataset ownership with memoized filtering and export
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use gamelytics_analysis::{metrics::OverviewMetrics, session::Session};
//! use gamelytics_data::{FilterSpec, generator};
//!
//! let config = generator::GeneratorConfig {
//!     players: 200,
//!     ..generator::GeneratorConfig::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
//! };
//! let session = Session::new(generator::generate(&config).unwrap());
//! let view = session.view(&FilterSpec::default());
//! let overview = OverviewMetrics::compute(&view);
//! assert_eq!(overview.players, 200);
//! assert!((0.0..=100.0).contains(&overview.retention_rate_pct));
//! ```
//!
//! [`FilteredView`]: gamelytics_data::FilteredView

pub use self::error::AnalysisError;

pub mod ab_test;
pub mod aggregate;
pub mod cohort;
mod error;
pub mod metrics;
pub mod retention;
pub mod segmentation;
pub mod session;
