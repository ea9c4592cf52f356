//! Statistical procedures for comparing latency samples across implementations.
//!
//! This crate provides the numeric side of perfstat:
//!
//! - **Descriptive statistics**: count, mean, sample standard deviation, quartiles, extremes
//! - **Normality**: Shapiro-Wilk W test
//! - **Group comparison**: one-way ANOVA and Kruskal-Wallis H test
//! - **Post-hoc**: Dunn's pairwise test with Bonferroni correction
//!
//! Every test returns an [`outcome::Outcome`], which either carries the
//! computed result or says why the input could not be tested. Tail
//! probabilities come from the distributions in [`statrs`].
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation by linear interpolation
//! - [`rank`]: Average ranks with tie bookkeeping
//! - [`normality`]: Shapiro-Wilk test
//! - [`comparison`]: ANOVA and Kruskal-Wallis
//! - [`posthoc`]: Dunn's test
//! - [`outcome`]: Tagged test results
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use perfstat_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.median, 3.0);
//! ```
//!
//! ## Comparing groups
//!
//! ```
//! use perfstat_stats::{
//!     comparison::{kruskal_wallis, one_way_anova},
//!     posthoc::{Correction, dunn},
//! };
//!
//! let groups = [
//!     vec![101.0, 99.0, 100.5, 98.7, 100.2],
//!     vec![502.0, 497.5, 499.9, 501.3, 500.4],
//! ];
//! assert!(one_way_anova(&groups).is_significant(0.05));
//! assert!(kruskal_wallis(&groups).is_significant(0.05));
//!
//! let matrix = dunn(&groups, Correction::Bonferroni);
//! assert!(matrix.computed().unwrap().get(0, 1) < 0.05);
//! ```
//!
//! ## Handling degenerate input
//!
//! ```
//! use perfstat_stats::{normality::shapiro_wilk, outcome::Outcome};
//!
//! assert_eq!(
//!     shapiro_wilk(&[120.0]),
//!     Outcome::InsufficientData { required: 3, actual: 1 }
//! );
//! ```

pub mod comparison;
pub mod descriptive;
pub mod normality;
pub mod outcome;
pub mod percentiles;
pub mod posthoc;
pub mod rank;
