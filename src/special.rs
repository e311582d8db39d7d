//! Special mathematical functions.
//!
//! Numerical approximations used by the margin functions: the standard
//! normal CDF/PDF and Hermite polynomials for Edgeworth expansions, and
//! binomial coefficients for null-distribution totals.

/// 1/√(2π) ≈ 0.3989422804014327
const FRAC_1_SQRT_2PI: f64 = 0.3989422804014326779399460599343818684758586311649;

/// Standard normal CDF Φ(x) = P(Z ≤ x) for Z ~ N(0,1).
///
/// # Algorithm
/// ACM Algorithm 209 (Ibbetson, 1963): piecewise polynomial
/// approximations due to A. M. Murray, evaluated by Horner's rule on
/// `y = |x|/2`. For `y ≥ 3` the tail is saturated.
///
/// Reference: Ibbetson (1963), "Algorithm 209: Gauss", *Communications
/// of the ACM* 6(10), p. 616.
///
/// # Accuracy
/// Maximum absolute error ≈ 1 × 10⁻⁹.
///
/// # Examples
/// ```
/// use u_robust::special::standard_normal_cdf;
/// assert!((standard_normal_cdf(0.0) - 0.5).abs() < 1e-15);
/// assert!((standard_normal_cdf(1.96) - 0.975).abs() < 1e-4);
/// ```
pub fn standard_normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }

    let z = if x.abs() < 1e-9 {
        0.0
    } else {
        let y = x.abs() / 2.0;
        if y >= 3.0 {
            1.0
        } else if y < 1.0 {
            let w = y * y;
            ((((((((0.000124818987 * w - 0.001075204047) * w + 0.005198775019) * w
                - 0.019198292004)
                * w
                + 0.059054035642)
                * w
                - 0.151968751364)
                * w
                + 0.319152932694)
                * w
                - 0.531923007300)
                * w
                + 0.797884560593)
                * y
                * 2.0
        } else {
            let y = y - 2.0;
            (((((((((((((-0.000045255659 * y + 0.000152529290) * y - 0.000019538132)
                * y
                - 0.000676904986)
                * y
                + 0.001390604284)
                * y
                - 0.000794620820)
                * y
                - 0.002034254874)
                * y
                + 0.006549791214)
                * y
                - 0.010557625006)
                * y
                + 0.011630447319)
                * y
                - 0.009279453341)
                * y
                + 0.005353579108)
                * y
                - 0.002141268741)
                * y
                + 0.000535310849)
                * y
                + 0.999936657524
        }
    };

    if x > 0.0 {
        (1.0 + z) / 2.0
    } else {
        (1.0 - z) / 2.0
    }
}

/// Standard normal PDF φ(x) = (1/√(2π)) exp(-x²/2).
///
/// # Examples
/// ```
/// use u_robust::special::standard_normal_pdf;
/// let peak = standard_normal_pdf(0.0);
/// assert!((peak - 0.3989422804014327).abs() < 1e-15);
/// ```
pub fn standard_normal_pdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Probabilists' Hermite polynomial Heₖ(z).
///
/// Evaluated with the three-term recurrence
/// `Heₖ₊₁(z) = z·Heₖ(z) − k·Heₖ₋₁(z)`, `He₀ = 1`, `He₁ = z`.
/// The `k`-th derivative of φ is `(−1)ᵏ Heₖ(z) φ(z)`, which is how the
/// Edgeworth corrections in [`crate::margin`] use it.
///
/// # Examples
/// ```
/// use u_robust::special::hermite;
/// let z = 1.5_f64;
/// assert!((hermite(3, z) - (z.powi(3) - 3.0 * z)).abs() < 1e-12);
/// ```
pub fn hermite(order: u32, z: f64) -> f64 {
    let mut prev = 1.0;
    if order == 0 {
        return prev;
    }
    let mut curr = z;
    for k in 1..order {
        let next = z * curr - k as f64 * prev;
        prev = curr;
        curr = next;
    }
    curr
}

/// Binomial coefficient C(n, k) as `f64`.
///
/// # Algorithm
/// Exact multiplicative formula in `u128` while it does not overflow
/// (every intermediate `C(n, i)` is an integer, so the running
/// division is exact). Beyond that the same product runs in `f64`,
/// accurate to a few ulps per factor and `+inf` past `f64::MAX`.
///
/// # Examples
/// ```
/// use u_robust::special::binomial;
/// assert_eq!(binomial(10, 3), 120.0);
/// assert_eq!(binomial(60, 30), 118264581564861424.0);
/// assert_eq!(binomial(3, 5), 0.0);
/// ```
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    if k == 0 {
        return 1.0;
    }

    let mut exact: Option<u128> = Some(1);
    for i in 0..k {
        exact = exact
            .and_then(|acc| acc.checked_mul((n - i) as u128))
            .map(|acc| acc / (i + 1) as u128);
        if exact.is_none() {
            break;
        }
    }

    match exact {
        Some(value) => value as f64,
        None => (0..k).fold(1.0_f64, |acc, i| acc * (n - i) as f64 / (i + 1) as f64),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_at_zero() {
        assert_eq!(standard_normal_cdf(0.0), 0.5);
    }

    #[test]
    fn test_cdf_symmetry() {
        for &x in &[0.1, 0.5, 1.0, 1.5, 2.0, 3.0, 5.0] {
            let sum = standard_normal_cdf(x) + standard_normal_cdf(-x);
            assert!((sum - 1.0).abs() < 1e-12, "Φ({x}) + Φ(-{x}) = {sum}");
        }
    }

    #[test]
    fn test_cdf_known_values() {
        let cases = [
            (1.0, 0.8413447460685429),
            (1.959963984540054, 0.975),
            (-2.0, 0.022750131948179195),
            (3.0, 0.9986501019683699),
        ];
        for (x, expected) in cases {
            let actual = standard_normal_cdf(x);
            assert!(
                (actual - expected).abs() < 2e-9,
                "Φ({x}) = {actual}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_cdf_extremes() {
        assert_eq!(standard_normal_cdf(10.0), 1.0);
        assert_eq!(standard_normal_cdf(-10.0), 0.0);
        assert_eq!(standard_normal_cdf(f64::INFINITY), 1.0);
        assert_eq!(standard_normal_cdf(f64::NEG_INFINITY), 0.0);
        assert!(standard_normal_cdf(f64::NAN).is_nan());
    }

    #[test]
    fn test_pdf_at_zero() {
        assert!((standard_normal_pdf(0.0) - FRAC_1_SQRT_2PI).abs() < 1e-16);
    }

    #[test]
    fn test_pdf_symmetry() {
        for &x in &[0.3, 1.0, 2.5] {
            assert_eq!(standard_normal_pdf(x), standard_normal_pdf(-x));
        }
    }

    #[test]
    fn test_hermite_low_orders() {
        let z = 0.7_f64;
        assert_eq!(hermite(0, z), 1.0);
        assert_eq!(hermite(1, z), z);
        assert!((hermite(2, z) - (z * z - 1.0)).abs() < 1e-15);
    }

    #[test]
    fn test_hermite_edgeworth_orders() {
        let z = -1.3_f64;
        let z2 = z * z;
        let z3 = z2 * z;
        let z5 = z3 * z2;
        let z7 = z5 * z2;
        assert!((hermite(3, z) - (z3 - 3.0 * z)).abs() < 1e-12);
        assert!((hermite(5, z) - (z5 - 10.0 * z3 + 15.0 * z)).abs() < 1e-12);
        assert!((hermite(7, z) - (z7 - 21.0 * z5 + 105.0 * z3 - 105.0 * z)).abs() < 1e-10);
    }

    #[test]
    fn test_binomial_small() {
        assert_eq!(binomial(0, 0), 1.0);
        assert_eq!(binomial(5, 0), 1.0);
        assert_eq!(binomial(5, 5), 1.0);
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(binomial(10, 7), 120.0);
    }

    #[test]
    fn test_binomial_beyond_u128() {
        let actual = binomial(400, 200);
        assert!((actual / 1.0295250013541444e119 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_binomial_boundary_of_exact_path() {
        // Largest central coefficient whose running product fits u128
        assert_eq!(binomial(124, 62), 1520803477811874490019821888415218656.0);
        assert!((binomial(126, 63) / 6.034934435761406e36 - 1.0).abs() < 1e-13);
    }

    #[test]
    fn test_binomial_overflows_to_infinity() {
        assert_eq!(binomial(2000, 1000), f64::INFINITY);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn cdf_in_zero_one(x in -10.0_f64..10.0) {
            let p = standard_normal_cdf(x);
            prop_assert!((0.0..=1.0).contains(&p));
        }

        #[test]
        fn cdf_is_monotonic(x1 in -8.0_f64..8.0, x2 in -8.0_f64..8.0) {
            let (lo, hi) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
            prop_assert!(standard_normal_cdf(lo) <= standard_normal_cdf(hi) + 1e-15);
        }

        #[test]
        fn pdf_is_non_negative(x in -20.0_f64..20.0) {
            prop_assert!(standard_normal_pdf(x) >= 0.0);
        }

        #[test]
        fn binomial_symmetric(n in 0_usize..200, k in 0_usize..200) {
            prop_assume!(k <= n);
            let a = binomial(n, k);
            let b = binomial(n, n - k);
            prop_assert!((a - b).abs() <= 1e-12 * a.max(1.0));
        }

        #[test]
        fn binomial_pascal_rule(n in 1_usize..60, k in 1_usize..60) {
            prop_assume!(k < n);
            let lhs = binomial(n, k);
            let rhs = binomial(n - 1, k - 1) + binomial(n - 1, k);
            prop_assert!((lhs - rhs).abs() <= 1e-12 * lhs);
        }
    }
}
