//! Penalized least squares for linear models with per-coefficient priors
//!
//! Solves `(XᵀX + diag(λ)) β = Xᵀy`. A zero-mean Gaussian prior with scale
//! `s` on a coefficient, under Gaussian noise with variance `σ²`, corresponds
//! to the penalty `λ = σ² / s²`, so the solution is the MAP estimate.

use crate::{MathError, Result};
use nalgebra::{DMatrix, DVector};

/// Row-major design matrix with a fixed column count
#[derive(Debug, Clone, Default)]
pub struct DesignMatrix {
    rows: Vec<Vec<f64>>,
    columns: usize,
}

impl DesignMatrix {
    /// Create an empty design matrix for `rows` observations
    pub fn new(rows: usize) -> Self {
        Self {
            rows: vec![Vec::new(); rows],
            columns: 0,
        }
    }

    /// Append a block of columns; `block[i]` holds the new columns for row `i`
    pub fn push_block(&mut self, block: &[Vec<f64>]) -> Result<()> {
        if block.len() != self.rows.len() {
            return Err(MathError::InvalidInput(format!(
                "Block has {} rows, design matrix has {}",
                block.len(),
                self.rows.len()
            )));
        }

        let width = block.first().map_or(0, Vec::len);
        if block.iter().any(|row| row.len() != width) {
            return Err(MathError::InvalidInput(
                "Block rows have inconsistent widths".to_string(),
            ));
        }

        for (row, extra) in self.rows.iter_mut().zip(block) {
            row.extend_from_slice(extra);
        }
        self.columns += width;

        Ok(())
    }

    /// Append a single column
    pub fn push_column(&mut self, column: &[f64]) -> Result<()> {
        let block: Vec<Vec<f64>> = column.iter().map(|&v| vec![v]).collect();
        self.push_block(&block)
    }

    /// Number of observations
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of regressors
    pub fn n_columns(&self) -> usize {
        self.columns
    }

    /// Multiply the matrix by a coefficient vector
    pub fn predict(&self, coefficients: &[f64]) -> Result<Vec<f64>> {
        if coefficients.len() != self.columns {
            return Err(MathError::InvalidInput(format!(
                "Expected {} coefficients, got {}",
                self.columns,
                coefficients.len()
            )));
        }

        Ok(self
            .rows
            .iter()
            .map(|row| row.iter().zip(coefficients).map(|(x, b)| x * b).sum())
            .collect())
    }

    fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.rows.len(), self.columns, |i, j| self.rows[i][j])
    }
}

/// Coefficients of a penalized fit and the effective number of parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PenalizedFit {
    /// Solution of the penalized normal equations
    pub coefficients: Vec<f64>,
    /// Trace of the hat matrix, `p - Σ λ_j [(XᵀX + Λ)⁻¹]_jj`
    pub effective_dof: f64,
}

fn check_dimensions(design: &DesignMatrix, target: &[f64], penalties: &[f64]) -> Result<()> {
    let n = design.n_rows();
    let p = design.n_columns();

    if n == 0 || p == 0 {
        return Err(MathError::InsufficientData(
            "Design matrix is empty".to_string(),
        ));
    }
    if target.len() != n {
        return Err(MathError::InvalidInput(format!(
            "Target length ({}) doesn't match design rows ({})",
            target.len(),
            n
        )));
    }
    if penalties.len() != p {
        return Err(MathError::InvalidInput(format!(
            "Penalty length ({}) doesn't match design columns ({})",
            penalties.len(),
            p
        )));
    }
    if penalties.iter().any(|l| *l < 0.0 || !l.is_finite()) {
        return Err(MathError::InvalidInput(
            "Penalties must be finite and non-negative".to_string(),
        ));
    }
    Ok(())
}

/// Solve the penalized normal equations and report the effective degrees of
/// freedom of the fit.
///
/// `penalties[j]` is added to the `j`-th diagonal entry of `XᵀX`.
pub fn penalized_fit(
    design: &DesignMatrix,
    target: &[f64],
    penalties: &[f64],
) -> Result<PenalizedFit> {
    check_dimensions(design, target, penalties)?;

    let x = design.to_matrix();
    let xt = x.transpose();
    let mut normal = &xt * &x;
    for (j, lambda) in penalties.iter().enumerate() {
        normal[(j, j)] += *lambda;
    }
    let rhs = &xt * DVector::from_column_slice(target);

    let singular = || MathError::CalculationError("Normal equations are singular".to_string());
    let (solution, inverse) = match normal.clone().cholesky() {
        Some(cholesky) => (cholesky.solve(&rhs), cholesky.inverse()),
        None => {
            let lu = normal.lu();
            let solution = lu.solve(&rhs).ok_or_else(singular)?;
            let inverse = lu.try_inverse().ok_or_else(singular)?;
            (solution, inverse)
        }
    };

    if solution.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Least squares solution is not finite".to_string(),
        ));
    }

    let shrinkage: f64 = penalties
        .iter()
        .enumerate()
        .map(|(j, lambda)| lambda * inverse[(j, j)])
        .sum();

    Ok(PenalizedFit {
        coefficients: solution.iter().copied().collect(),
        effective_dof: design.n_columns() as f64 - shrinkage,
    })
}
