//! Eigen — exact diagonalization T = P·Λ·P⁻¹ over Q(r)
//!
//! Eigenvalues are searched among polynomials in r. A polynomial eigenvalue
//! of a polynomial matrix never exceeds the largest entry degree `d`, and at
//! an integer point `x` the value `s·λ(x)` is an integer root of the
//! characteristic polynomial of the integer matrix `s·T(x)` (`s` clears every
//! coefficient denominator). Sampling `x = 0..=d` and interpolating gives the
//! candidates; the points `d+1` and `d+2` filter them, and an exact null-space
//! computation over Q(r) confirms each survivor and yields its eigenspace.

use super::matrix::{self, PolynomialMatrix, RationalMatrix};
use super::poly::Polynomial;
use super::ratfunc::RationalFunction;
use crate::error::{InheritanceError, Result};
use log::{debug, info, warn};
use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Exact eigendecomposition of a square polynomial matrix.
#[derive(Debug, Clone)]
pub struct Eigendecomposition {
    /// Eigenvalue of each column of `vectors`
    eigenvalues: Vec<Polynomial>,
    /// P: right eigenvectors as columns
    vectors: RationalMatrix,
    /// P⁻¹
    inverse: RationalMatrix,
}

impl Eigendecomposition {
    pub fn dimension(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn eigenvalues(&self) -> &[Polynomial] {
        &self.eigenvalues
    }

    /// Distinct eigenvalues with their geometric multiplicity.
    pub fn distinct_eigenvalues(&self) -> Vec<(Polynomial, usize)> {
        let mut out: Vec<(Polynomial, usize)> = Vec::new();
        for value in &self.eigenvalues {
            match out.iter_mut().find(|(v, _)| v == value) {
                Some((_, count)) => *count += 1,
                None => out.push((value.clone(), 1)),
            }
        }
        out
    }

    pub fn vectors(&self) -> &RationalMatrix {
        &self.vectors
    }

    pub fn inverse(&self) -> &RationalMatrix {
        &self.inverse
    }

    /// P·Λ·P⁻¹, which must equal the decomposed matrix.
    pub fn reconstruct(&self) -> RationalMatrix {
        let n = self.dimension();
        let scaled = DMatrix::from_fn(n, n, |i, j| {
            &self.vectors[(i, j)] * &RationalFunction::from(self.eigenvalues[j].clone())
        });
        matrix::multiply(&scaled, &self.inverse)
    }
}

/// Diagonalize `matrix` exactly, failing when its eigenvectors over Q(r) do
/// not span the whole space.
pub fn diagonalize(matrix: &PolynomialMatrix) -> Result<Eigendecomposition> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(InheritanceError::NotDiagonalizable {
            found: 0,
            dimension: n.max(matrix.ncols()),
        });
    }
    let rational = matrix::to_rational(matrix);

    let mut eigenvalues = Vec::new();
    let mut columns: Vec<Vec<RationalFunction>> = Vec::new();
    for lambda in polynomial_eigenvalues(matrix) {
        let shifted = matrix::shift_diagonal(&rational, &RationalFunction::from(lambda.clone()));
        let basis = matrix::nullspace(&shifted);
        if basis.is_empty() {
            continue;
        }
        debug!("eigenvalue {} with multiplicity {}", lambda, basis.len());
        for v in basis {
            eigenvalues.push(lambda.clone());
            columns.push(v);
        }
    }

    if columns.len() != n {
        warn!(
            "only {} independent eigenvectors for a {}x{} matrix",
            columns.len(),
            n,
            n
        );
        return Err(InheritanceError::NotDiagonalizable {
            found: columns.len(),
            dimension: n,
        });
    }

    let vectors = DMatrix::from_fn(n, n, |i, j| columns[j][i].clone());
    let inverse = matrix::inverse(&vectors).map_err(|_| {
        InheritanceError::singular("inverting the eigenvector matrix")
    })?;

    info!(
        "Diagonalized {}x{} matrix over Q(r) with {} eigenvectors",
        n,
        n,
        eigenvalues.len()
    );

    Ok(Eigendecomposition {
        eigenvalues,
        vectors,
        inverse,
    })
}

/// Candidate polynomial eigenvalues, distinct and sorted.
///
/// Each returned polynomial agrees with an eigenvalue at `d + 3` sample
/// points; [`diagonalize`] confirms it exactly.
pub fn polynomial_eigenvalues(matrix: &PolynomialMatrix) -> Vec<Polynomial> {
    let degree = matrix.iter().filter_map(Polynomial::degree).max().unwrap_or(0);
    let scale = matrix
        .iter()
        .fold(BigInt::one(), |acc, p| acc.lcm(&p.denominator_lcm()));
    let scale_q = BigRational::from_integer(scale.clone());

    let roots: Vec<Vec<BigInt>> = (0..=degree + 2)
        .map(|x| {
            let x = BigRational::from_integer(BigInt::from(x));
            let sampled = matrix.map(|p| (p.eval(&x) * &scale_q).to_integer());
            integer_roots(&characteristic_polynomial(&sampled), &row_sum_bound(&sampled))
        })
        .collect();

    let mut combos: Vec<Vec<BigInt>> = vec![Vec::new()];
    for at_x in roots.iter().take(degree + 1) {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                at_x.iter().map(move |root| {
                    let mut next = prefix.clone();
                    next.push(root.clone());
                    next
                })
            })
            .collect();
    }

    let mut found: Vec<Polynomial> = Vec::new();
    for combo in combos {
        let points: Vec<(BigRational, BigRational)> = combo
            .into_iter()
            .enumerate()
            .map(|(x, y)| {
                (
                    BigRational::from_integer(BigInt::from(x)),
                    BigRational::from_integer(y),
                )
            })
            .collect();
        let candidate = Polynomial::interpolate(&points);
        let consistent = (degree + 1..=degree + 2).all(|x| {
            let value = candidate.eval(&BigRational::from_integer(BigInt::from(x)));
            value.is_integer() && roots[x].contains(&value.to_integer())
        });
        if !consistent {
            continue;
        }
        let lambda = candidate.scale(&scale_q.recip());
        if !found.contains(&lambda) {
            found.push(lambda);
        }
    }
    found.sort();
    found
}

/// Characteristic polynomial det(λI − A) by Faddeev–LeVerrier, ascending
/// coefficients, exact over the integers.
fn characteristic_polynomial(a: &DMatrix<BigInt>) -> Vec<BigInt> {
    let n = a.nrows();
    let mut coeffs = vec![BigInt::zero(); n + 1];
    coeffs[n] = BigInt::one();
    let mut m = DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            BigInt::one()
        } else {
            BigInt::zero()
        }
    });
    for k in 1..=n {
        let am = DMatrix::from_fn(n, n, |i, j| {
            (0..n).fold(BigInt::zero(), |acc, l| acc + &a[(i, l)] * &m[(l, j)])
        });
        let trace: BigInt = (0..n).map(|i| am[(i, i)].clone()).sum();
        let c = -trace / BigInt::from(k);
        m = am;
        for i in 0..n {
            m[(i, i)] += &c;
        }
        coeffs[n - k] = c;
    }
    coeffs
}

/// Largest absolute row sum, an upper bound on every eigenvalue's modulus.
fn row_sum_bound(a: &DMatrix<BigInt>) -> BigInt {
    a.row_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<BigInt>())
        .max()
        .unwrap_or_else(BigInt::zero)
}

fn integer_roots(coeffs: &[BigInt], bound: &BigInt) -> Vec<BigInt> {
    let Some(b) = bound.to_i64() else {
        warn!("eigenvalue bound {} too large to scan", bound);
        return Vec::new();
    };
    (-b..=b)
        .map(BigInt::from)
        .filter(|x| {
            coeffs
                .iter()
                .rev()
                .fold(BigInt::zero(), |acc, c| acc * x + c)
                .is_zero()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::poly::rational;

    fn poly_matrix(n: usize, entries: Vec<Polynomial>) -> PolynomialMatrix {
        DMatrix::from_row_slice(n, n, &entries)
    }

    fn one_minus_r() -> Polynomial {
        &Polynomial::one() - &Polynomial::variable()
    }

    #[test]
    fn test_characteristic_polynomial() {
        // [[2, 1], [1, 2]]: λ² - 4λ + 3
        let a = DMatrix::from_row_slice(
            2,
            2,
            &[BigInt::from(2), BigInt::from(1), BigInt::from(1), BigInt::from(2)],
        );
        let c = characteristic_polynomial(&a);
        assert_eq!(c, vec![BigInt::from(3), BigInt::from(-4), BigInt::from(1)]);
        assert_eq!(
            integer_roots(&c, &row_sum_bound(&a)),
            vec![BigInt::from(1), BigInt::from(3)]
        );
    }

    #[test]
    fn test_diagonalize_triangular() {
        // [[1, 0], [r, 1 - r]] has eigenvalues 1 and 1 - r
        let t = poly_matrix(
            2,
            vec![Polynomial::one(), Polynomial::zero(), Polynomial::variable(), one_minus_r()],
        );
        let eig = diagonalize(&t).unwrap();
        assert_eq!(eig.dimension(), 2);
        assert!(eig.eigenvalues().contains(&Polynomial::one()));
        assert!(eig.eigenvalues().contains(&one_minus_r()));
        assert_eq!(eig.reconstruct(), matrix::to_rational(&t));
    }

    #[test]
    fn test_repeated_eigenvalue() {
        // two absorbing states feeding a transient one
        let half = Polynomial::from_ratio(1, 2);
        let quarter = Polynomial::from_ratio(1, 4);
        let t = poly_matrix(
            3,
            vec![
                Polynomial::one(),
                Polynomial::zero(),
                Polynomial::zero(),
                Polynomial::zero(),
                Polynomial::one(),
                Polynomial::zero(),
                quarter.clone(),
                quarter,
                half.clone(),
            ],
        );
        let eig = diagonalize(&t).unwrap();
        let distinct = eig.distinct_eigenvalues();
        assert!(distinct.contains(&(Polynomial::one(), 2)));
        assert!(distinct.contains(&(half, 1)));
        assert_eq!(eig.reconstruct(), matrix::to_rational(&t));
    }

    #[test]
    fn test_defective_matrix_fails() {
        // Jordan block [[1, r], [0, 1]]
        let t = poly_matrix(
            2,
            vec![Polynomial::one(), Polynomial::variable(), Polynomial::zero(), Polynomial::one()],
        );
        match diagonalize(&t) {
            Err(InheritanceError::NotDiagonalizable { found, dimension }) => {
                assert_eq!(found, 1);
                assert_eq!(dimension, 2);
            }
            other => panic!("expected NotDiagonalizable, got {:?}", other),
        }
    }

    #[test]
    fn test_irrational_spectrum_fails() {
        // eigenvalues ±√2 are not in Q(r)
        let t = poly_matrix(
            2,
            vec![Polynomial::zero(), Polynomial::from(2), Polynomial::one(), Polynomial::zero()],
        );
        let err = diagonalize(&t).unwrap_err();
        assert!(err.is_algebraic());
    }

    #[test]
    fn test_quadratic_eigenvalue() {
        // diag(r^2 - r + 1/2, 1/2 - r) conjugated by [[1, 1], [0, 1]]
        let a = Polynomial::from_coeffs(vec![rational(1, 2), rational(-1, 1), rational(1, 1)]);
        let b = Polynomial::linear(rational(1, 2), rational(-1, 1));
        let t = poly_matrix(
            2,
            vec![a.clone(), &b - &a, Polynomial::zero(), b.clone()],
        );
        let values = polynomial_eigenvalues(&t);
        assert!(values.contains(&a));
        assert!(values.contains(&b));
        let eig = diagonalize(&t).unwrap();
        println!("eigenvalues: {:?}", eig.distinct_eigenvalues());
        assert_eq!(eig.reconstruct(), matrix::to_rational(&t));
    }
}
