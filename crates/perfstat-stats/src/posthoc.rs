//! Pairwise post-hoc comparisons following a significant omnibus test.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::{comparison::check_groups, outcome::Outcome, rank::Ranking};

/// Multiple-comparison adjustment applied to pairwise p-values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    /// Raw two-sided p-values.
    None,
    /// Multiply by the number of comparisons, capped at 1.
    #[default]
    Bonferroni,
}

impl Correction {
    /// Adjusts a raw p-value given the number of comparisons performed.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn adjust(self, p_value: f64, comparisons: usize) -> f64 {
        match self {
            Correction::None => p_value,
            Correction::Bonferroni => (p_value * comparisons as f64).min(1.0),
        }
    }
}

/// Square matrix of pairwise p-values indexed by group position.
///
/// The matrix is symmetric and its diagonal is 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseMatrix {
    p_values: Vec<Vec<f64>>,
}

impl PairwiseMatrix {
    fn identity(size: usize) -> Self {
        let p_values = (0..size)
            .map(|i| (0..size).map(|j| if i == j { 1.0 } else { f64::NAN }).collect())
            .collect();
        Self { p_values }
    }

    fn set(&mut self, i: usize, j: usize, p_value: f64) {
        self.p_values[i][j] = p_value;
        self.p_values[j][i] = p_value;
    }

    /// Number of groups compared.
    #[must_use]
    pub fn size(&self) -> usize {
        self.p_values.len()
    }

    /// Adjusted p-value between groups `i` and `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.p_values[i][j]
    }

    /// Rows of the matrix.
    #[must_use]
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.p_values.iter().map(Vec::as_slice)
    }

    /// Returns `true` if every off-diagonal entry mirrors its transpose.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        let n = self.size();
        (0..n).all(|i| (0..n).all(|j| self.get(i, j).to_bits() == self.get(j, i).to_bits()))
    }
}

/// Dunn's test for every pair of groups.
///
/// Values are ranked across all groups together. For groups `i` and `j` the
/// statistic is
///
/// ```text
/// z = |R̄ᵢ - R̄ⱼ| / sqrt((N(N+1)/12 - Σ(t³-t)/(12(N-1))) · (1/nᵢ + 1/nⱼ))
/// ```
///
/// and the two-sided p-value is adjusted with `correction` over `k(k-1)/2`
/// comparisons.
///
/// # Returns
///
/// * `NotApplicable` - fewer than two groups
/// * `InsufficientData` - an empty group
/// * `ZeroVariance` - every value is tied
/// * `Computed` - the pairwise matrix
///
/// # Examples
///
/// ```
/// use perfstat_stats::posthoc::{Correction, dunn};
///
/// let fast = vec![10.0, 11.0, 12.0, 13.0];
/// let slow = vec![50.0, 51.0, 52.0, 53.0];
/// let matrix = dunn(&[fast, slow], Correction::Bonferroni);
/// let matrix = matrix.computed().unwrap();
///
/// assert_eq!(matrix.get(0, 0), 1.0);
/// assert_eq!(matrix.get(0, 1), matrix.get(1, 0));
/// assert!(matrix.get(0, 1) < 0.05);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn dunn<G>(groups: &[G], correction: Correction) -> Outcome<PairwiseMatrix>
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
    let n = pooled.len() as f64;
    let variance = n * (n + 1.0) / 12.0 - ranking.tie_sum / (12.0 * (n - 1.0));
    if variance <= 0.0 {
        return Outcome::ZeroVariance;
    }

    let mut offset = 0;
    let mut mean_ranks = Vec::with_capacity(groups.len());
    for group in groups {
        let len = group.as_ref().len();
        let rank_sum = ranking.ranks[offset..offset + len].iter().sum::<f64>();
        mean_ranks.push((rank_sum / len as f64, len as f64));
        offset += len;
    }

    let k = groups.len();
    let comparisons = k * (k - 1) / 2;
    let normal = Normal::standard();
    let mut matrix = PairwiseMatrix::identity(k);
    for i in 0..k {
        for j in i + 1..k {
            let (rank_i, n_i) = mean_ranks[i];
            let (rank_j, n_j) = mean_ranks[j];
            let z = (rank_i - rank_j).abs() / (variance * (1.0 / n_i + 1.0 / n_j)).sqrt();
            let p_value = 2.0 * normal.sf(z);
            matrix.set(i, j, correction.adjust(p_value.min(1.0), comparisons));
        }
    }

    Outcome::Computed(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_separated_groups() {
        let a = (0..10).map(|i| 100.0 + f64::from(i)).collect::<Vec<_>>();
        let b = (0..10).map(|i| 500.0 + f64::from(i)).collect::<Vec<_>>();
        let matrix = dunn(&[a, b], Correction::Bonferroni);
        let matrix = matrix.computed().unwrap();
        // mean ranks 5.5 and 15.5, p = 2 * (1 - Φ(10 / sqrt(35 * 0.2)))
        assert!((matrix.get(0, 1) - 1.570_523e-4).abs() < 1e-9);
        assert!(matrix.get(0, 1) < 0.001);
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let groups = [
            vec![1.0, 2.0, 3.0, 3.0],
            vec![2.0, 4.0, 5.0],
            vec![9.0, 8.0, 7.0, 7.0, 6.0],
        ];
        let matrix = dunn(&groups, Correction::Bonferroni);
        let matrix = matrix.computed().unwrap();
        assert_eq!(matrix.size(), 3);
        assert!(matrix.is_symmetric());
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), 1.0);
        }
        for row in matrix.rows() {
            assert!(row.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_bonferroni_scales_by_comparisons() {
        let groups = [
            vec![1.0, 2.0, 3.0, 4.0],
            vec![3.0, 4.0, 5.0, 6.0],
            vec![5.0, 6.0, 7.0, 8.0],
        ];
        let raw = dunn(&groups, Correction::None);
        let adjusted = dunn(&groups, Correction::Bonferroni);
        let (raw, adjusted) = (raw.computed().unwrap(), adjusted.computed().unwrap());
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    let expected = (raw.get(i, j) * 3.0).min(1.0);
                    assert!((adjusted.get(i, j) - expected).abs() < 1e-15);
                }
            }
        }
    }

    #[test]
    fn test_identical_groups_cap_at_one() {
        let groups = [vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0], vec![10.0, 11.0, 12.0]];
        let matrix = dunn(&groups, Correction::Bonferroni);
        assert_eq!(matrix.computed().unwrap().get(0, 1), 1.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(
            dunn(&[vec![1.0, 2.0]], Correction::Bonferroni),
            Outcome::NotApplicable { groups: 1 }
        );
        assert_eq!(
            dunn(&[vec![3.0; 3], vec![3.0; 2]], Correction::Bonferroni),
            Outcome::ZeroVariance
        );
    }
}
