//! Ordinary least squares on an explicit design matrix.
//!
//! Used by the augmented Dickey-Fuller regression and by the seasonal
//! regressors of the SARIMA model.

use crate::error::{Result, WindError};

/// Least-squares estimates with their standard errors.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// One coefficient per design column.
    pub coefficients: Vec<f64>,
    /// Standard error of each coefficient.
    pub standard_errors: Vec<f64>,
    /// `y - X b`.
    pub residuals: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Residual variance `rss / (n - k)`.
    pub sigma2: f64,
    pub nobs: usize,
}

impl OlsFit {
    /// Predict from one row of regressor values.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.coefficients.iter().zip(row).map(|(b, x)| b * x).sum()
    }

    /// t statistic of coefficient `i`.
    pub fn t_statistic(&self, i: usize) -> f64 {
        self.coefficients[i] / self.standard_errors[i]
    }

    /// Gaussian log-likelihood at the ML variance `rss / n`.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI * self.rss / n).ln() + 1.0)
    }
}

/// Fit `y = X b` where `columns` holds the columns of `X`.
///
/// No intercept is added implicitly; pass a column of ones if one is wanted.
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OlsFit> {
    let n = y.len();
    let k = columns.len();

    if k == 0 {
        return Err(WindError::InvalidParameter(
            "OLS requires at least one regressor".into(),
        ));
    }
    if n <= k {
        return Err(WindError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }
    if let Some(col) = columns.iter().find(|c| c.len() != n) {
        return Err(WindError::InvalidParameter(format!(
            "regressor length {} does not match {} observations",
            col.len(),
            n
        )));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for i in 0..k {
        for j in 0..=i {
            let s: f64 = columns[i].iter().zip(&columns[j]).map(|(a, b)| a * b).sum();
            xtx[i][j] = s;
            xtx[j][i] = s;
        }
        xty[i] = columns[i].iter().zip(y).map(|(a, b)| a * b).sum();
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        WindError::InvalidParameter("OLS design matrix is singular".into())
    })?;
    let coefficients = cholesky_solve(&chol, &xty);

    let residuals: Vec<f64> = (0..n)
        .map(|t| y[t] - (0..k).map(|j| coefficients[j] * columns[j][t]).sum::<f64>())
        .collect();
    let rss: f64 = residuals.iter().map(|r| r * r).sum();
    let sigma2 = rss / (n - k) as f64;

    // Diagonal of (X'X)^-1, one unit vector at a time.
    let standard_errors = (0..k)
        .map(|i| {
            let mut unit = vec![0.0; k];
            unit[i] = 1.0;
            let col = cholesky_solve(&chol, &unit);
            (sigma2 * col[i]).max(0.0).sqrt()
        })
        .collect();

    Ok(OlsFit {
        coefficients,
        standard_errors,
        residuals,
        rss,
        sigma2,
        nobs: n,
    })
}

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max).max(1.0);
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 1e-12 * scale {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(l)
}

/// Solve `L L' x = b`.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }
    x
}
