//! Lag polynomials and the stationarity-preserving coefficient transform.
//!
//! A polynomial is stored as its coefficients in the backshift operator `B`,
//! lowest power first, so `[1.0, -0.5]` is `1 - 0.5B`.

/// Largest partial autocorrelation the transform can produce.
const PACF_LIMIT: f64 = 0.9995;

/// Product of two lag polynomials.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        if *x == 0.0 {
            continue;
        }
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 - φ_1 B - ... - φ_p B^p`.
pub fn ar_polynomial(phi: &[f64]) -> Vec<f64> {
    std::iter::once(1.0).chain(phi.iter().map(|c| -c)).collect()
}

/// `1 + θ_1 B + ... + θ_q B^q`.
pub fn ma_polynomial(theta: &[f64]) -> Vec<f64> {
    std::iter::once(1.0).chain(theta.iter().copied()).collect()
}

/// Substitute `B -> B^s`.
pub fn seasonal_expand(poly: &[f64], period: usize) -> Vec<f64> {
    if poly.is_empty() {
        return Vec::new();
    }
    let period = period.max(1);
    let mut out = vec![0.0; (poly.len() - 1) * period + 1];
    for (i, c) in poly.iter().enumerate() {
        out[i * period] = *c;
    }
    out
}

/// `(1 - B)^d (1 - B^s)^D`.
pub fn differencing_polynomial(d: usize, cap_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    let seasonal = seasonal_expand(&[1.0, -1.0], period);
    for _ in 0..cap_d {
        poly = multiply(&poly, &seasonal);
    }
    poly
}

/// Non-zero terms of degree >= 1 as `(lag, coefficient)` pairs.
pub fn sparse_terms(poly: &[f64]) -> Vec<(usize, f64)> {
    poly.iter()
        .enumerate()
        .skip(1)
        .filter(|(_, c)| **c != 0.0)
        .map(|(i, c)| (i, *c))
        .collect()
}

/// Map unconstrained values to AR coefficients of a stationary process.
///
/// Each value becomes a partial autocorrelation `PACF_LIMIT * tanh(x)`; the
/// Durbin-Levinson recursion then yields `φ` with `1 - Σ φ_i B^i` having all
/// roots outside the unit circle.
pub fn constrained_ar(raw: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(raw.len());
    for &x in raw {
        let r = PACF_LIMIT * x.tanh();
        let previous = phi.clone();
        let k = previous.len();
        for j in 0..k {
            phi[j] = previous[j] - r * previous[k - 1 - j];
        }
        phi.push(r);
    }
    phi
}

/// Map unconstrained values to MA coefficients of an invertible process.
pub fn constrained_ma(raw: &[f64]) -> Vec<f64> {
    constrained_ar(raw).into_iter().map(|c| -c).collect()
}

/// Inverse of [`constrained_ar`] for stationary `φ`.
///
/// Returns `None` when `φ` is not stationary.
pub fn unconstrained_ar(phi: &[f64]) -> Option<Vec<f64>> {
    let mut current = phi.to_vec();
    let mut raw = vec![0.0; phi.len()];
    for k in (0..phi.len()).rev() {
        let r = current[k];
        if r.is_nan() || r.abs() >= PACF_LIMIT {
            return None;
        }
        raw[k] = (r / PACF_LIMIT).atanh();
        let denom = 1.0 - r * r;
        let previous: Vec<f64> = current[..k].to_vec();
        for j in 0..k {
            current[j] = (previous[j] + r * previous[k - 1 - j]) / denom;
        }
        current.truncate(k);
    }
    Some(raw)
}

/// Whether `1 - Σ φ_i B^i` has all roots outside the unit circle.
pub fn is_stationary(phi: &[f64]) -> bool {
    unconstrained_ar(phi).is_some()
}

/// First `n` coefficients of `ma(B) / ar(B)` (the ψ-weights), with `ψ_0 = 1`.
///
/// `ar` and `ma` are full polynomials with unit constant term.
pub fn psi_weights(ar: &[f64], ma: &[f64], n: usize) -> Vec<f64> {
    let mut psi = vec![0.0; n];
    for j in 0..n {
        let mut value = ma.get(j).copied().unwrap_or(0.0);
        for i in 1..=j.min(ar.len().saturating_sub(1)) {
            value -= ar[i] * psi[j - i];
        }
        psi[j] = value;
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn multiplies_polynomials() {
        // (1 - 0.5B)(1 + 0.2B) = 1 - 0.3B - 0.1B^2
        let product = multiply(&ar_polynomial(&[0.5]), &ma_polynomial(&[0.2]));
        assert_relative_eq!(product[0], 1.0);
        assert_relative_eq!(product[1], -0.3, epsilon = 1e-12);
        assert_relative_eq!(product[2], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn seasonal_expansion_places_terms_at_multiples() {
        let poly = seasonal_expand(&ar_polynomial(&[0.4, 0.1]), 24);
        assert_eq!(poly.len(), 49);
        assert_eq!(sparse_terms(&poly), vec![(24, -0.4), (48, -0.1)]);
    }

    #[test]
    fn differencing_polynomial_expands() {
        // (1 - B)(1 - B^4) = 1 - B - B^4 + B^5
        let poly = differencing_polynomial(1, 1, 4);
        assert_eq!(poly, vec![1.0, -1.0, 0.0, 0.0, -1.0, 1.0]);
        assert_eq!(differencing_polynomial(0, 0, 24), vec![1.0]);
    }

    #[test]
    fn transform_is_stationary_and_invertible() {
        for raw in [vec![3.0], vec![-2.0, 1.5], vec![0.7, -0.4, 2.5]] {
            let phi = constrained_ar(&raw);
            assert!(is_stationary(&phi));
            let back = unconstrained_ar(&phi).unwrap();
            for (a, b) in raw.iter().zip(&back) {
                assert_relative_eq!(a, b, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn single_coefficient_is_scaled_tanh() {
        let phi = constrained_ar(&[0.5]);
        assert_relative_eq!(phi[0], PACF_LIMIT * 0.5_f64.tanh(), epsilon = 1e-15);
        assert_relative_eq!(constrained_ma(&[0.5])[0], -phi[0], epsilon = 1e-15);
    }

    #[test]
    fn explosive_ar_is_not_stationary() {
        assert!(!is_stationary(&[1.2]));
        assert!(!is_stationary(&[0.5, 0.6]));
        assert!(is_stationary(&[0.5, 0.3]));
    }

    #[test]
    fn psi_weights_of_ar1_are_geometric() {
        let psi = psi_weights(&ar_polynomial(&[0.6]), &[1.0], 5);
        for (j, w) in psi.iter().enumerate() {
            assert_relative_eq!(*w, 0.6_f64.powi(j as i32), epsilon = 1e-12);
        }
    }

    #[test]
    fn psi_weights_of_random_walk_are_one() {
        let psi = psi_weights(&differencing_polynomial(1, 0, 1), &[1.0], 4);
        assert_eq!(psi, vec![1.0; 4]);
    }

    #[test]
    fn psi_weights_of_ma1() {
        let psi = psi_weights(&[1.0], &ma_polynomial(&[0.4]), 4);
        assert_eq!(psi, vec![1.0, 0.4, 0.0, 0.0]);
    }
}
