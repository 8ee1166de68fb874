//! Descriptive and inferential statistics over small samples.

use serde::Serialize;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator), `None` below two observations.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64)
}

/// 0.0 when `total` is zero.
pub fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TTestResult {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    pub mean_a: f64,
    pub mean_b: f64,
    pub n_a: usize,
    pub n_b: usize,
}

impl TTestResult {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Two-sided Welch t-test. `None` when either group has fewer than two
/// observations or both groups have zero variance.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<TTestResult> {
    let var_a = sample_variance(a)?;
    let var_b = sample_variance(b)?;
    let (n_a, n_b) = (a.len() as f64, b.len() as f64);

    let se_a = var_a / n_a;
    let se_b = var_b / n_b;
    let se = (se_a + se_b).sqrt();
    if se == 0.0 {
        return None;
    }

    let (mean_a, mean_b) = (mean(a), mean(b));
    let t = (mean_a - mean_b) / se;
    let df = (se_a + se_b).powi(2) / (se_a.powi(2) / (n_a - 1.0) + se_b.powi(2) / (n_b - 1.0));

    Some(TTestResult {
        t_statistic: t,
        degrees_of_freedom: df,
        p_value: student_t_two_sided_p(t, df),
        mean_a,
        mean_b,
        n_a: a.len(),
        n_b: b.len(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Pearson correlation with a t-based two-sided p-value. Needs at least three
/// pairs and non-constant inputs.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<CorrelationResult> {
    let n = x.len().min(y.len());
    if n < 3 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let (mx, my) = (mean(x), mean(y));

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let df = (n - 2) as f64;
    let p_value = if (1.0 - r.abs()) < 1e-12 {
        0.0
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        student_t_two_sided_p(t, df)
    };

    Some(CorrelationResult { r, p_value, n })
}

/// P(|T| > |t|) for Student's t with `df` degrees of freedom.
pub fn student_t_two_sided_p(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    let x = df / (df + t * t);
    regularized_incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

/// I_x(a, b) evaluated with the Lentz continued fraction.
pub fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 300;
    const EPSILON: f64 = 3e-14;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

    let (qab, qap, qam) = (a + b, a + 1.0, a - 1.0);
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        let even = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + even * d);
        c = guard(1.0 + even / c);
        h *= d * c;

        let odd = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + odd * d);
        c = guard(1.0 + odd / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    h
}

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// ln Γ(x) via the Lanczos approximation.
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let series = LANCZOS_COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS_COEFFICIENTS[0], |acc, (i, c)| acc + c / (x + i as f64));

    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_mean_and_variance() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(sample_variance(&[1.0]), None);
        assert!(close(sample_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap(), 32.0 / 7.0, 1e-12));
        assert_eq!(ratio(1, 0), 0.0);
    }

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(close(ln_gamma(5.0), 24f64.ln(), 1e-10));
        assert!(close(ln_gamma(0.5), std::f64::consts::PI.sqrt().ln(), 1e-10));
    }

    #[test]
    fn test_student_t_p_values() {
        assert!(close(student_t_two_sided_p(0.0, 10.0), 1.0, 1e-12));
        assert!(close(student_t_two_sided_p(2.0, 10.0), 0.0734, 5e-4));
        assert!(close(student_t_two_sided_p(-2.0, 10.0), 0.0734, 5e-4));
        assert!(close(student_t_two_sided_p(1.96, 100_000.0), 0.05, 1e-3));
    }

    #[test]
    fn test_welch_t_test() {
        let a = [19.8, 20.4, 19.6, 17.8, 18.5, 18.9, 18.3, 18.9, 19.5, 22.0];
        let b = [28.2, 26.6, 20.1, 23.3, 25.2, 22.1, 17.7, 27.6, 20.6, 13.7];
        let result = welch_t_test(&a, &b).unwrap();
        assert!(close(result.t_statistic, -2.074, 0.001));
        assert!(close(result.degrees_of_freedom, 10.21, 0.01));
        assert!(close(result.p_value, 0.0643, 5e-4));
        assert!(!result.is_significant(0.05));
        assert!(result.is_significant(0.1));
    }

    #[test]
    fn test_welch_needs_two_observations_and_spread() {
        assert!(welch_t_test(&[1.0], &[1.0, 2.0]).is_none());
        assert!(welch_t_test(&[1.0, 1.0], &[2.0, 2.0]).is_none());
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let perfect = pearson(&x, &[2.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
        assert!(close(perfect.r, 1.0, 1e-12));
        assert_eq!(perfect.p_value, 0.0);

        let noisy = pearson(&x, &[2.0, 1.0, 4.0, 3.0, 5.0]).unwrap();
        assert!(close(noisy.r, 0.8, 1e-12));
        assert!(noisy.p_value > 0.05 && noisy.p_value < 0.2);

        assert!(pearson(&x, &[3.0; 5]).is_none());
        assert!(pearson(&[1.0, 2.0], &[1.0, 2.0]).is_none());
    }
}
