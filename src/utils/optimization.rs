//! Numerical optimisation: Nelder-Mead for likelihood surfaces and a
//! safeguarded Newton solver for monotone scalar equations.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Number of objective evaluations.
    pub evaluations: usize,
    /// Whether the simplex met the tolerance before the iteration limit.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Tolerance on the spread of objective values across the simplex,
    /// relative to `1 + |best|`.
    pub tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step size (default: 0.1).
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-9,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

impl NelderMeadConfig {
    /// A cheaper budget used while screening many candidate models.
    pub fn coarse() -> Self {
        Self {
            max_iter: 400,
            tolerance: 1e-6,
            ..Self::default()
        }
    }
}

/// Minimise `objective` with the Nelder-Mead simplex method.
///
/// Non-finite objective values are treated as `+inf`, so an objective may
/// signal an infeasible point by returning NaN.
///
/// # Example
/// ```
/// use wind_resource::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     &NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(objective: F, initial: &[f64], config: &NelderMeadConfig) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let mut evaluations = 0usize;
    let mut eval = |x: &[f64]| {
        evaluations += 1;
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    if n == 0 {
        let value = eval(initial);
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: value,
            iterations: 0,
            evaluations: 1,
            converged: value.is_finite(),
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(initial.to_vec());
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs().max(0.5)
        } else {
            config.initial_step
        };
        vertex[i] += step;
        simplex.push(vertex);
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        let spread = values[worst] - values[best];
        if values[best].is_finite()
            && spread <= config.tolerance * (values[best].abs() + 1.0)
        {
            converged = true;
            break;
        }

        let centroid = centroid_without(&simplex, worst);
        let size = simplex
            .iter()
            .map(|v| distance(v, &centroid))
            .fold(0.0, f64::max);
        if values[best].is_finite() && size < config.tolerance {
            converged = true;
            break;
        }

        let reflected = along(&centroid, &simplex[worst], -config.alpha);
        let reflected_value = eval(&reflected);

        if reflected_value < values[best] {
            let expanded = along(&centroid, &reflected, config.gamma);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        // Outside contraction towards the reflected point, inside otherwise.
        let (target, target_value) = if reflected_value < values[worst] {
            (&reflected, reflected_value)
        } else {
            (&simplex[worst], values[worst])
        };
        let contracted = along(&centroid, target, config.rho);
        let contracted_value = eval(&contracted);
        if contracted_value < target_value {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i != best {
                for j in 0..n {
                    simplex[i][j] = anchor[j] + config.sigma * (simplex[i][j] - anchor[j]);
                }
                values[i] = eval(&simplex[i]);
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        evaluations,
        converged,
    }
}

/// Centroid of the simplex excluding one vertex.
fn centroid_without(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];
    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v;
            }
        }
    }
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

/// `centroid + t * (point - centroid)`.
fn along(centroid: &[f64], point: &[f64], t: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + t * (p - c))
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Outcome of a bracketed root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootResult {
    pub root: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Find the root of an increasing function on `[lo, hi]`, starting at `initial`.
///
/// `f` returns the value and derivative. Newton steps are taken while they
/// stay inside the current bracket; otherwise the bracket is bisected. The
/// caller must ensure `f(lo) <= 0 <= f(hi)`.
pub fn newton_bisect<F>(
    f: F,
    (lo, hi): (f64, f64),
    initial: f64,
    tolerance: f64,
    max_iter: usize,
) -> RootResult
where
    F: Fn(f64) -> (f64, f64),
{
    let (mut lo, mut hi) = (lo, hi);
    let mut x = if initial > lo && initial < hi {
        initial
    } else {
        0.5 * (lo + hi)
    };

    for iteration in 1..=max_iter {
        let (value, slope) = f(x);
        if !value.is_finite() {
            // Treat an overflow as overshooting the root.
            hi = x;
            x = 0.5 * (lo + hi);
            continue;
        }
        if value.abs() < tolerance * 1e-3 {
            return RootResult {
                root: x,
                iterations: iteration,
                converged: true,
            };
        }
        if value > 0.0 {
            hi = x;
        } else {
            lo = x;
        }

        let newton = x - value / slope;
        let next = if slope > 0.0 && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };

        if (next - x).abs() <= tolerance * x.abs().max(1.0) || hi - lo <= tolerance {
            return RootResult {
                root: next,
                iterations: iteration,
                converged: true,
            };
        }
        x = next;
    }

    RootResult {
        root: x,
        iterations: max_iter,
        converged: false,
    }
}
