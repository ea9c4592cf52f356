/// Average ranks of a set of values, with tie bookkeeping.
///
/// Tied values share the mean of the ranks they would occupy. Ranks start at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Rank of each input value, in input order.
    pub ranks: Vec<f64>,
    /// Sum of `t³ - t` over every group of `t` tied values.
    pub tie_sum: f64,
}

impl Ranking {
    /// Ranks `values`, assigning average ranks to ties.
    ///
    /// # Examples
    ///
    /// ```
    /// use perfstat_stats::rank::Ranking;
    ///
    /// let ranking = Ranking::new(&[10.0, 20.0, 10.0, 30.0]);
    /// assert_eq!(ranking.ranks, vec![1.5, 3.0, 1.5, 4.0]);
    /// assert_eq!(ranking.tie_sum, 6.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(values: &[f64]) -> Self {
        let mut order = (0..values.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

        let mut ranks = vec![0.0; values.len()];
        let mut tie_sum = 0.0;
        let mut start = 0;
        while start < order.len() {
            let mut end = start + 1;
            while end < order.len() && values[order[end]] == values[order[start]] {
                end += 1;
            }
            // positions start..end hold ranks start+1..=end
            let average = (start + 1 + end) as f64 / 2.0;
            for &idx in &order[start..end] {
                ranks[idx] = average;
            }
            let tied = (end - start) as f64;
            tie_sum += tied.powi(3) - tied;
            start = end;
        }

        Self { ranks, tie_sum }
    }

    /// Tie correction factor `1 - Σ(t³ - t) / (N³ - N)`.
    ///
    /// Zero when every value is tied.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn tie_correction(&self) -> f64 {
        let n = self.ranks.len() as f64;
        if n < 2.0 {
            return 1.0;
        }
        1.0 - self.tie_sum / (n.powi(3) - n)
    }
}
