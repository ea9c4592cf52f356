//! Shapiro-Wilk test for normality.
//!
//! Coefficients and p-value approximations follow Royston (1995),
//! "Remark AS R94", valid for 3 ≤ n ≤ 5000.

use std::f64::consts::PI;

use statrs::distribution::{ContinuousCDF, Normal};

use crate::outcome::{Outcome, TestOutcome, TestResult};

/// Minimum sample size accepted by the Shapiro-Wilk test.
pub const SHAPIRO_MIN_SAMPLES: usize = 3;

/// Relative range below which a sample is treated as constant.
const ZERO_RANGE: f64 = 1e-19;

/// Runs the Shapiro-Wilk W test on `values`.
///
/// `NaN` values are discarded. The statistic is `W` and a small p-value
/// rejects normality.
///
/// # Returns
///
/// * `Computed` - W and its p-value
/// * `InsufficientData` - fewer than 3 values
/// * `ZeroVariance` - all values are identical
///
/// # Examples
///
/// ```
/// use perfstat_stats::normality::shapiro_wilk;
///
/// let outcome = shapiro_wilk(&[1.0, 2.0, 3.0]);
/// let result = outcome.computed().unwrap();
/// assert!((result.statistic - 1.0).abs() < 1e-12);
///
/// assert!(shapiro_wilk(&[1.0, 2.0]).is_insufficient_data());
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn shapiro_wilk(values: &[f64]) -> TestOutcome {
    let mut x = values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .collect::<Vec<_>>();
    let n = x.len();
    if n < SHAPIRO_MIN_SAMPLES {
        return Outcome::InsufficientData {
            required: SHAPIRO_MIN_SAMPLES,
            actual: n,
        };
    }
    x.sort_by(f64::total_cmp);

    let range = x[n - 1] - x[0];
    if range <= ZERO_RANGE * x[n - 1].abs().max(1.0) {
        return Outcome::ZeroVariance;
    }

    let coefficients = coefficients(n);
    let mean = x.iter().sum::<f64>() / n as f64;
    let ssq = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    let numerator = coefficients
        .iter()
        .zip(&x)
        .map(|(a, v)| a * v)
        .sum::<f64>()
        .powi(2);
    let w = (numerator / ssq).min(1.0);

    Outcome::Computed(TestResult {
        statistic: w,
        p_value: p_value(w, n),
    })
}

/// Evaluates `c[0] + c[1] x + c[2] x² + ...`.
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

/// Antisymmetric weights `a_1..a_n` for the ordered sample.
#[expect(clippy::cast_precision_loss)]
fn coefficients(n: usize) -> Vec<f64> {
    const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_190, 4.434_685, -2.706_056];
    const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];

    if n == 3 {
        let a = std::f64::consts::FRAC_1_SQRT_2;
        return vec![-a, 0.0, a];
    }

    let nf = n as f64;
    let normal = Normal::standard();
    let m = (1..=n)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect::<Vec<_>>();
    let summ2 = m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let mut a = vec![0.0; n];
    let an = poly(&C1, rsn) + m[n - 1] / ssumm2;
    a[n - 1] = an;
    a[0] = -an;

    let (first_inner, eps) = if n > 5 {
        let an1 = poly(&C2, rsn) + m[n - 2] / ssumm2;
        a[n - 2] = an1;
        a[1] = -an1;
        let eps = (summ2 - 2.0 * m[n - 1].powi(2) - 2.0 * m[n - 2].powi(2))
            / (1.0 - 2.0 * an.powi(2) - 2.0 * an1.powi(2));
        (2, eps)
    } else {
        let eps = (summ2 - 2.0 * m[n - 1].powi(2)) / (1.0 - 2.0 * an.powi(2));
        (1, eps)
    };

    let scale = eps.sqrt();
    for (ai, mi) in a
        .iter_mut()
        .zip(&m)
        .take(n - first_inner)
        .skip(first_inner)
    {
        *ai = mi / scale;
    }
    a
}

/// Significance level of `w` for a sample of size `n`.
#[expect(clippy::cast_precision_loss)]
fn p_value(w: f64, n: usize) -> f64 {
    const G: [f64; 2] = [-2.273, 0.459];
    const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
    const C4: [f64; 4] = [1.3822, -0.778_57, 0.062_767, -0.002_032_2];
    const C5: [f64; 4] = [-1.5861, -0.310_82, -0.083_751, 0.003_891_5];
    const C6: [f64; 3] = [-0.4803, -0.082_676, 0.003_030_2];

    if n == 3 {
        // exact distribution for n = 3
        let stqr = (0.75_f64).sqrt().asin();
        let p = 6.0 / PI * (w.sqrt().asin() - stqr);
        return p.clamp(0.0, 1.0);
    }

    let nf = n as f64;
    let y = (1.0 - w).ln();
    let (y, mean, sigma) = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return 1e-99;
        }
        (-(gamma - y).ln(), poly(&C3, nf), poly(&C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (y, poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };
    Normal::standard().sf((y - mean) / sigma)
}
