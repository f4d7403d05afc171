//! Gaussian elimination over Q(r) on nalgebra matrices
//!
//! nalgebra's own decompositions need a floating-point field, so the exact
//! routines here walk the `DMatrix` storage directly.

use super::poly::Polynomial;
use super::ratfunc::RationalFunction;
use crate::error::{InheritanceError, Result};
use nalgebra::DMatrix;
use num_traits::{One, Zero};

/// A matrix over the field of rational functions in `r`.
pub type RationalMatrix = DMatrix<RationalFunction>;

/// A matrix whose entries are polynomials in `r`.
pub type PolynomialMatrix = DMatrix<Polynomial>;

pub fn identity(n: usize) -> RationalMatrix {
    DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            RationalFunction::one()
        } else {
            RationalFunction::zero()
        }
    })
}

pub fn to_rational(matrix: &PolynomialMatrix) -> RationalMatrix {
    matrix.map(RationalFunction::from)
}

pub fn multiply(a: &RationalMatrix, b: &RationalMatrix) -> RationalMatrix {
    assert_eq!(a.ncols(), b.nrows(), "inner dimensions must agree");
    DMatrix::from_fn(a.nrows(), b.ncols(), |i, j| {
        (0..a.ncols()).fold(RationalFunction::zero(), |acc, l| {
            let (x, y) = (&a[(i, l)], &b[(l, j)]);
            if x.is_zero() || y.is_zero() {
                acc
            } else {
                &acc + &(x * y)
            }
        })
    })
}

/// Row vector times matrix.
pub fn row_times(row: &[RationalFunction], matrix: &RationalMatrix) -> Vec<RationalFunction> {
    assert_eq!(row.len(), matrix.nrows(), "row length must match matrix rows");
    (0..matrix.ncols())
        .map(|j| {
            row.iter()
                .enumerate()
                .filter(|(i, v)| !v.is_zero() && !matrix[(*i, j)].is_zero())
                .fold(RationalFunction::zero(), |acc, (i, v)| &acc + &(v * &matrix[(i, j)]))
        })
        .collect()
}

/// `m - λI`
pub fn shift_diagonal(matrix: &RationalMatrix, lambda: &RationalFunction) -> RationalMatrix {
    let mut shifted = matrix.clone();
    for i in 0..shifted.nrows().min(shifted.ncols()) {
        shifted[(i, i)] = &shifted[(i, i)] - lambda;
    }
    shifted
}

/// Reduced row echelon form and its pivot columns.
///
/// Among the candidate rows the pivot with the smallest numerator plus
/// denominator degree is chosen, which keeps intermediate expressions small.
pub fn rref(matrix: &RationalMatrix) -> (RationalMatrix, Vec<usize>) {
    let mut m = matrix.clone();
    let (rows, cols) = m.shape();
    let mut pivots = Vec::new();
    let mut row = 0;
    for col in 0..cols {
        if row == rows {
            break;
        }
        let Some(pivot) = (row..rows)
            .filter(|&i| !m[(i, col)].is_zero())
            .min_by_key(|&i| m[(i, col)].complexity())
        else {
            continue;
        };
        m.swap_rows(row, pivot);
        let Some(inv) = m[(row, col)].inv() else {
            continue;
        };
        for j in col..cols {
            m[(row, j)] = &m[(row, j)] * &inv;
        }
        for i in 0..rows {
            if i == row || m[(i, col)].is_zero() {
                continue;
            }
            let factor = m[(i, col)].clone();
            for j in col..cols {
                if m[(row, j)].is_zero() {
                    continue;
                }
                let delta = &factor * &m[(row, j)];
                m[(i, j)] = &m[(i, j)] - &delta;
            }
        }
        pivots.push(col);
        row += 1;
    }
    (m, pivots)
}

pub fn rank(matrix: &RationalMatrix) -> usize {
    rref(matrix).1.len()
}

/// Basis of the right null space `{v : M·v = 0}`, one vector per free column.
pub fn nullspace(matrix: &RationalMatrix) -> Vec<Vec<RationalFunction>> {
    let (reduced, pivots) = rref(matrix);
    let cols = matrix.ncols();
    (0..cols)
        .filter(|c| !pivots.contains(c))
        .map(|free| {
            let mut v = vec![RationalFunction::zero(); cols];
            v[free] = RationalFunction::one();
            for (k, &p) in pivots.iter().enumerate() {
                v[p] = -&reduced[(k, free)];
            }
            v
        })
        .collect()
}

/// Exact inverse by Gauss-Jordan elimination on `[M | I]`.
pub fn inverse(matrix: &RationalMatrix) -> Result<RationalMatrix> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(InheritanceError::singular(format!(
            "inverting a non-square {}x{} matrix",
            n,
            matrix.ncols()
        )));
    }
    let id = identity(n);
    let augmented = DMatrix::from_fn(n, 2 * n, |i, j| {
        if j < n {
            matrix[(i, j)].clone()
        } else {
            id[(i, j - n)].clone()
        }
    });
    let (reduced, pivots) = rref(&augmented);
    if pivots.len() < n || pivots[n - 1] != n - 1 {
        return Err(InheritanceError::singular(format!(
            "inverting a {}x{} matrix of rank {}",
            n,
            n,
            pivots.iter().filter(|&&p| p < n).count()
        )));
    }
    Ok(DMatrix::from_fn(n, n, |i, j| reduced[(i, j + n)].clone()))
}

/// Evaluate every entry at a numeric recombination fraction.
pub fn evaluate(matrix: &RationalMatrix, r: f64) -> DMatrix<f64> {
    matrix.map(|f| f.eval_f64(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::poly::rational;

    fn entry(p: Polynomial) -> RationalFunction {
        RationalFunction::from(p)
    }

    fn sample() -> RationalMatrix {
        // [[1, r], [1 - r, 1]]
        let r = Polynomial::variable();
        DMatrix::from_row_slice(
            2,
            2,
            &[
                RationalFunction::one(),
                entry(r.clone()),
                entry(&Polynomial::one() - &r),
                RationalFunction::one(),
            ],
        )
    }

    #[test]
    fn test_inverse_round_trip() {
        let m = sample();
        let inv = inverse(&m).unwrap();
        assert_eq!(multiply(&m, &inv), identity(2));
        assert_eq!(multiply(&inv, &m), identity(2));
    }

    #[test]
    fn test_singular_matrix_is_rejected() {
        let r = entry(Polynomial::variable());
        let m = DMatrix::from_row_slice(
            2,
            2,
            &[r.clone(), r.clone(), RationalFunction::one(), RationalFunction::one()],
        );
        let err = inverse(&m).unwrap_err();
        assert!(err.is_algebraic());
        assert_eq!(rank(&m), 1);
    }

    #[test]
    fn test_nullspace() {
        // rows (1, r, 0) and (0, 0, 1): kernel spanned by (-r, 1, 0)
        let r = entry(Polynomial::variable());
        let m = DMatrix::from_row_slice(
            2,
            3,
            &[
                RationalFunction::one(),
                r.clone(),
                RationalFunction::zero(),
                RationalFunction::zero(),
                RationalFunction::zero(),
                RationalFunction::one(),
            ],
        );
        let kernel = nullspace(&m);
        assert_eq!(kernel.len(), 1);
        assert_eq!(kernel[0], vec![-&r, RationalFunction::one(), RationalFunction::zero()]);
    }

    #[test]
    fn test_row_times_and_evaluate() {
        let m = sample();
        let row = vec![
            RationalFunction::constant(rational(1, 2)),
            RationalFunction::constant(rational(1, 2)),
        ];
        let out = row_times(&row, &m);
        // (1/2)(1) + (1/2)(1 - r) = 1 - r/2
        assert_eq!(
            out[0],
            entry(Polynomial::linear(rational(1, 1), rational(-1, 2)))
        );
        let numeric = evaluate(&m, 0.25);
        assert!((numeric[(1, 0)] - 0.75).abs() < 1e-12);
    }
}
