use std::fmt;

use serde::Serialize;

/// A test statistic together with its p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    /// The test statistic (W, F, H, ...).
    pub statistic: f64,
    /// The p-value associated with the statistic.
    pub p_value: f64,
}

impl TestResult {
    /// Returns `true` if the p-value falls strictly below `alpha`.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Tagged result of a statistical procedure.
///
/// Every procedure classifies the adequacy of its input before computing, so
/// degenerate inputs surface as explicit markers instead of panics or `NaN`s.
#[derive(Debug, Clone, PartialEq, Serialize, derive_more::IsVariant)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The procedure ran.
    Computed(T),
    /// Too few observations for the procedure.
    InsufficientData {
        /// Minimum number of observations needed.
        required: usize,
        /// Number of observations available.
        actual: usize,
    },
    /// Too few groups for a comparison.
    NotApplicable {
        /// Number of groups available.
        groups: usize,
    },
    /// All observations coincide, so the statistic is undefined.
    ZeroVariance,
}

/// Outcome of a single hypothesis test.
pub type TestOutcome = Outcome<TestResult>;

impl<T> Outcome<T> {
    /// Returns the computed value, if any.
    #[must_use]
    pub fn computed(&self) -> Option<&T> {
        match self {
            Outcome::Computed(value) => Some(value),
            _ => None,
        }
    }

    /// Maps the computed value, keeping markers as they are.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Computed(value) => Outcome::Computed(f(value)),
            Outcome::InsufficientData { required, actual } => {
                Outcome::InsufficientData { required, actual }
            }
            Outcome::NotApplicable { groups } => Outcome::NotApplicable { groups },
            Outcome::ZeroVariance => Outcome::ZeroVariance,
        }
    }

    /// Human-readable text for the non-computed markers.
    ///
    /// Returns `None` for [`Outcome::Computed`].
    #[must_use]
    pub fn marker(&self) -> Option<String> {
        match self {
            Outcome::Computed(_) => None,
            Outcome::InsufficientData { required, actual } => Some(format!(
                "insufficient data ({actual} {}, at least {required} required)",
                if *actual == 1 { "value" } else { "values" }
            )),
            Outcome::NotApplicable { groups } => Some(format!(
                "not applicable ({groups} implementation {}, at least 2 required)",
                if *groups == 1 { "group" } else { "groups" }
            )),
            Outcome::ZeroVariance => Some("not computable (zero variance)".to_owned()),
        }
    }
}

impl TestOutcome {
    /// Returns `true` only for a computed result with `p < alpha`.
    ///
    /// # Examples
    ///
    /// ```
    /// use perfstat_stats::outcome::{Outcome, TestOutcome, TestResult};
    ///
    /// let computed: TestOutcome = Outcome::Computed(TestResult { statistic: 9.1, p_value: 0.003 });
    /// assert!(computed.is_significant(0.05));
    ///
    /// let skipped: TestOutcome = Outcome::NotApplicable { groups: 1 };
    /// assert!(!skipped.is_significant(0.05));
    /// ```
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.computed().is_some_and(|r| r.is_significant(alpha))
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Computed(result) => {
                write!(f, "statistic = {}, p-value = {}", result.statistic, result.p_value)
            }
            _ => match self.marker() {
                Some(marker) => f.write_str(&marker),
                None => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_text() {
        let outcome: TestOutcome = Outcome::InsufficientData {
            required: 3,
            actual: 1,
        };
        assert_eq!(
            outcome.marker().unwrap(),
            "insufficient data (1 value, at least 3 required)"
        );
        let outcome: TestOutcome = Outcome::NotApplicable { groups: 1 };
        assert_eq!(
            outcome.to_string(),
            "not applicable (1 implementation group, at least 2 required)"
        );
    }

    #[test]
    fn test_significance_threshold_is_strict() {
        let outcome: TestOutcome = Outcome::Computed(TestResult {
            statistic: 1.0,
            p_value: 0.05,
        });
        assert!(!outcome.is_significant(0.05));
        assert!(outcome.is_computed());
    }

    #[test]
    fn test_map_keeps_markers() {
        let outcome: Outcome<u32> = Outcome::ZeroVariance;
        assert_eq!(outcome.map(|v| v * 2), Outcome::ZeroVariance);
        assert_eq!(Outcome::Computed(2).map(|v| v * 2), Outcome::Computed(4));
    }
}
