//! Omnibus tests comparing a metric across two or more groups.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};

use crate::{
    outcome::{Outcome, TestOutcome, TestResult},
    rank::Ranking,
};

/// Checks the group layout shared by every multi-group procedure.
///
/// Returns the marker to report when the groups cannot be compared.
pub(crate) fn check_groups<G, T>(groups: &[G]) -> Option<Outcome<T>>
where
    G: AsRef<[f64]>,
{
    if groups.len() < 2 {
        return Some(Outcome::NotApplicable {
            groups: groups.len(),
        });
    }
    if groups.iter().any(|g| g.as_ref().is_empty()) {
        return Some(Outcome::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    None
}

/// One-way analysis of variance across `groups`.
///
/// The statistic is `F = MSB / MSW` with `(k - 1, N - k)` degrees of freedom.
///
/// # Returns
///
/// * `NotApplicable` - fewer than two groups
/// * `InsufficientData` - an empty group, or no within-group degrees of freedom (`N <= k`)
/// * `ZeroVariance` - every value in every group is identical
/// * `Computed` - F and its p-value; `F = inf, p = 0` when groups are internally
///   constant but their means differ
///
/// # Examples
///
/// ```
/// use perfstat_stats::comparison::one_way_anova;
///
/// let a = [1.0, 2.0, 3.0];
/// let b = [4.0, 5.0, 6.0];
/// let result = *one_way_anova(&[&a[..], &b[..]]).computed().unwrap();
/// assert!((result.statistic - 13.5).abs() < 1e-12);
/// assert!(result.p_value > 0.02 && result.p_value < 0.025);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn one_way_anova<G>(groups: &[G]) -> TestOutcome
where
    G: AsRef<[f64]>,
{
    if let Some(marker) = check_groups(groups) {
        return marker;
    }

    let k = groups.len();
    let total = groups.iter().map(|g| g.as_ref().len()).sum::<usize>();
    if total <= k {
        return Outcome::InsufficientData {
            required: k + 1,
            actual: total,
        };
    }

    let grand_mean = groups
        .iter()
        .flat_map(|g| g.as_ref().iter())
        .sum::<f64>()
        / total as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    let mut all_constant = true;
    for group in groups {
        let values = group.as_ref();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        ss_between += n * (mean - grand_mean).powi(2);
        ss_within += values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        all_constant &= values.iter().all(|v| *v == values[0]);
    }

    if all_constant {
        let first = groups[0].as_ref()[0];
        if groups.iter().all(|g| g.as_ref()[0] == first) {
            return Outcome::ZeroVariance;
        }
        return Outcome::Computed(TestResult {
            statistic: f64::INFINITY,
            p_value: 0.0,
        });
    }

    let df_between = (k - 1) as f64;
    let df_within = (total - k) as f64;
    let Ok(dist) = FisherSnedecor::new(df_between, df_within) else {
        return Outcome::InsufficientData {
            required: k + 1,
            actual: total,
        };
    };
    let f = (ss_between / df_between) / (ss_within / df_within);
    Outcome::Computed(TestResult {
        statistic: f,
        p_value: dist.sf(f),
    })
}

/// Kruskal-Wallis H test across `groups`, with tie correction.
///
/// The p-value comes from the chi-squared distribution with `k - 1` degrees of freedom.
///
/// # Returns
///
/// * `NotApplicable` - fewer than two groups
/// * `InsufficientData` - an empty group
/// * `ZeroVariance` - every value is tied
/// * `Computed` - H and its p-value
///
/// # Examples
///
/// ```
/// use perfstat_stats::comparison::kruskal_wallis;
///
/// let x = vec![1.0, 3.0, 5.0, 7.0, 9.0];
/// let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
/// let result = *kruskal_wallis(&[x, y]).computed().unwrap();
/// assert!((result.statistic - 0.272_727).abs() < 1e-5);
/// assert!((result.p_value - 0.601_508).abs() < 1e-4);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn kruskal_wallis<G>(groups: &[G]) -> TestOutcome
where
    G: AsRef<[f64]>,
{
    if let Some(marker) = check_groups(groups) {
        return marker;
    }

    let pooled = groups
        .iter()
        .flat_map(|g| g.as_ref().iter().copied())
        .collect::<Vec<_>>();
    let ranking = Ranking::new(&pooled);
    let correction = ranking.tie_correction();
    if correction <= 0.0 {
        return Outcome::ZeroVariance;
    }

    let n = pooled.len() as f64;
    let mut offset = 0;
    let mut weighted = 0.0;
    for group in groups {
        let len = group.as_ref().len();
        let rank_sum = ranking.ranks[offset..offset + len].iter().sum::<f64>();
        weighted += rank_sum.powi(2) / len as f64;
        offset += len;
    }

    let h = (12.0 / (n * (n + 1.0)) * weighted - 3.0 * (n + 1.0)) / correction;
    let Ok(dist) = ChiSquared::new((groups.len() - 1) as f64) else {
        return Outcome::NotApplicable {
            groups: groups.len(),
        };
    };
    Outcome::Computed(TestResult {
        statistic: h,
        p_value: dist.sf(h.max(0.0)),
    })
}
