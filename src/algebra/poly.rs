//! Polynomial — exact polynomials in the recombination fraction r
//!
//! Coefficients are arbitrary-precision rationals stored in ascending powers
//! of r with no trailing zeros, so structural equality is mathematical
//! equality. Every probability produced by meiosis, mating and selfing is a
//! `Polynomial`.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Build the rational `numer / denom`.
pub fn rational(numer: i64, denom: i64) -> BigRational {
    BigRational::new(BigInt::from(numer), BigInt::from(denom))
}

/// Lossy conversion used only at the numeric boundary.
pub fn rational_to_f64(q: &BigRational) -> f64 {
    q.to_f64().unwrap_or(f64::NAN)
}

/// A univariate polynomial in `r` with rational coefficients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Polynomial {
    coeffs: Vec<BigRational>,
}

impl Polynomial {
    /// Build from ascending coefficients, trimming trailing zeros.
    pub fn from_coeffs(mut coeffs: Vec<BigRational>) -> Self {
        while coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    pub fn constant(c: BigRational) -> Self {
        Self::from_coeffs(vec![c])
    }

    pub fn from_ratio(numer: i64, denom: i64) -> Self {
        Self::constant(rational(numer, denom))
    }

    /// The recombination fraction `r` itself.
    pub fn variable() -> Self {
        Self::from_coeffs(vec![BigRational::zero(), BigRational::one()])
    }

    /// `a + b·r`
    pub fn linear(a: BigRational, b: BigRational) -> Self {
        Self::from_coeffs(vec![a, b])
    }

    pub fn coeffs(&self) -> &[BigRational] {
        &self.coeffs
    }

    /// Degree in r; `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    pub fn is_constant(&self) -> bool {
        self.coeffs.len() <= 1
    }

    pub fn coefficient(&self, power: usize) -> BigRational {
        self.coeffs.get(power).cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn leading(&self) -> Option<&BigRational> {
        self.coeffs.last()
    }

    pub fn scale(&self, factor: &BigRational) -> Self {
        if factor.is_zero() {
            return Self::zero();
        }
        Self {
            coeffs: self.coeffs.iter().map(|c| c * factor).collect(),
        }
    }

    pub fn pow(&self, exp: u32) -> Self {
        let mut result = Self::one();
        let mut base = self.clone();
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                result = &result * &base;
            }
            e >>= 1;
            if e > 0 {
                base = &base * &base;
            }
        }
        result
    }

    /// Exact evaluation at a rational point (Horner).
    pub fn eval(&self, x: &BigRational) -> BigRational {
        self.coeffs
            .iter()
            .rev()
            .fold(BigRational::zero(), |acc, c| acc * x + c)
    }

    /// Floating-point evaluation (Horner).
    pub fn eval_f64(&self, x: f64) -> f64 {
        self.coeffs
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + rational_to_f64(c))
    }

    /// Euclidean division; `None` when dividing by zero.
    pub fn div_rem(&self, divisor: &Self) -> Option<(Self, Self)> {
        let dd = divisor.degree()?;
        let Some(n) = self.degree() else {
            return Some((Self::zero(), Self::zero()));
        };
        if n < dd {
            return Some((Self::zero(), self.clone()));
        }
        let lead_inv = divisor.coeffs[dd].recip();
        let mut rem = self.coeffs.clone();
        let mut quot = vec![BigRational::zero(); n - dd + 1];
        for i in (0..=n - dd).rev() {
            let c = &rem[i + dd] * &lead_inv;
            if !c.is_zero() {
                for (j, d) in divisor.coeffs.iter().enumerate() {
                    rem[i + j] -= &c * d;
                }
            }
            quot[i] = c;
        }
        rem.truncate(dd);
        Some((Self::from_coeffs(quot), Self::from_coeffs(rem)))
    }

    /// Scale so the leading coefficient is 1 (zero stays zero).
    pub fn monic(&self) -> Self {
        match self.leading() {
            Some(lead) => self.scale(&lead.recip()),
            None => Self::zero(),
        }
    }

    /// Monic greatest common divisor over Q.
    pub fn gcd(&self, other: &Self) -> Self {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            match a.div_rem(&b) {
                Some((_, rem)) => a = std::mem::replace(&mut b, rem),
                None => break,
            }
        }
        a.monic()
    }

    /// Least common multiple of the coefficient denominators.
    pub fn denominator_lcm(&self) -> BigInt {
        self.coeffs
            .iter()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()))
    }

    /// Lagrange interpolation through points with distinct abscissae.
    pub fn interpolate(points: &[(BigRational, BigRational)]) -> Self {
        let mut result = Self::zero();
        for (i, (xi, yi)) in points.iter().enumerate() {
            let mut basis = Self::one();
            let mut denom = BigRational::one();
            for (j, (xj, _)) in points.iter().enumerate() {
                if i == j {
                    continue;
                }
                basis = &basis * &Self::linear(-xj.clone(), BigRational::one());
                denom *= xi - xj;
            }
            result += &basis.scale(&(yi / &denom));
        }
        result
    }
}

impl From<BigRational> for Polynomial {
    fn from(c: BigRational) -> Self {
        Self::constant(c)
    }
}

impl From<i64> for Polynomial {
    fn from(n: i64) -> Self {
        Self::constant(BigRational::from_integer(BigInt::from(n)))
    }
}

impl Zero for Polynomial {
    fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }
}

impl One for Polynomial {
    fn one() -> Self {
        Self {
            coeffs: vec![BigRational::one()],
        }
    }
}

impl Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let len = self.coeffs.len().max(rhs.coeffs.len());
        let coeffs = (0..len)
            .map(|i| match (self.coeffs.get(i), rhs.coeffs.get(i)) {
                (Some(a), Some(b)) => a + b,
                (Some(a), None) => a.clone(),
                (None, Some(b)) => b.clone(),
                (None, None) => BigRational::zero(),
            })
            .collect();
        Polynomial::from_coeffs(coeffs)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        Polynomial {
            coeffs: self.coeffs.iter().map(|c| -c).collect(),
        }
    }
}

impl Sub<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        self + &(-rhs)
    }
}

impl Mul<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        if self.is_zero() || rhs.is_zero() {
            return Polynomial::zero();
        }
        let mut coeffs = vec![BigRational::zero(); self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in rhs.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Polynomial::from_coeffs(coeffs)
    }
}

impl Add for Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: Polynomial) -> Polynomial {
        &self + &rhs
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: Polynomial) -> Polynomial {
        &self - &rhs
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: Polynomial) -> Polynomial {
        &self * &rhs
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        -&self
    }
}

impl AddAssign<&Polynomial> for Polynomial {
    fn add_assign(&mut self, rhs: &Polynomial) {
        *self = &*self + rhs;
    }
}

impl SubAssign<&Polynomial> for Polynomial {
    fn sub_assign(&mut self, rhs: &Polynomial) {
        *self = &*self - rhs;
    }
}

impl MulAssign<&Polynomial> for Polynomial {
    fn mul_assign(&mut self, rhs: &Polynomial) {
        *self = &*self * rhs;
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for (power, c) in self.coeffs.iter().enumerate().rev() {
            if c.is_zero() {
                continue;
            }
            let magnitude = c.abs();
            if first {
                if c.is_negative() {
                    write!(f, "-")?;
                }
            } else {
                write!(f, " {} ", if c.is_negative() { "-" } else { "+" })?;
            }
            first = false;
            if power == 0 {
                write!(f, "{}", magnitude)?;
                continue;
            }
            if !magnitude.is_one() {
                write!(f, "{}*", magnitude)?;
            }
            match power {
                1 => write!(f, "r")?,
                p => write!(f, "r^{}", p)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_minus_r() -> Polynomial {
        &Polynomial::one() - &Polynomial::variable()
    }

    #[test]
    fn test_trailing_zeros_are_trimmed() {
        let p = Polynomial::from_coeffs(vec![rational(1, 2), BigRational::zero()]);
        assert_eq!(p.degree(), Some(0));
        assert_eq!(p, Polynomial::from_ratio(1, 2));
        assert!(Polynomial::from_coeffs(vec![BigRational::zero()]).is_zero());
    }

    #[test]
    fn test_arithmetic() {
        let r = Polynomial::variable();
        let square = one_minus_r().pow(2);
        assert_eq!(
            square,
            Polynomial::from_coeffs(vec![rational(1, 1), rational(-2, 1), rational(1, 1)])
        );
        // (1-r)^2 + 2r(1-r) + r^2 = 1
        let two_r = r.scale(&rational(2, 1));
        let total = &(&square + &(&two_r * &one_minus_r())) + &r.pow(2);
        assert_eq!(total, Polynomial::one());
        assert!((&total - &Polynomial::one()).is_zero());
    }

    #[test]
    fn test_eval() {
        let p = one_minus_r().pow(2).scale(&rational(1, 2));
        assert_eq!(p.eval(&rational(1, 5)), rational(8, 25));
        assert!((p.eval_f64(0.2) - 0.32).abs() < 1e-12);
    }

    #[test]
    fn test_rational_to_f64_beyond_f64_range() {
        // numerator and denominator each overflow f64 on their own
        let big = BigInt::from(10).pow(400);
        let q = BigRational::new(&big + BigInt::one(), &big * BigInt::from(3));
        assert!((rational_to_f64(&q) - 1.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_div_rem_and_gcd() {
        let a = &one_minus_r() * &Polynomial::linear(rational(1, 1), rational(2, 1));
        let b = one_minus_r().pow(2);
        let (q, rem) = a.div_rem(&one_minus_r()).unwrap();
        assert!(rem.is_zero());
        assert_eq!(q, Polynomial::linear(rational(1, 1), rational(2, 1)));
        // gcd is monic: r - 1
        let g = a.gcd(&b);
        assert_eq!(g, Polynomial::linear(rational(-1, 1), rational(1, 1)));
        assert!(a.div_rem(&Polynomial::zero()).is_none());
    }

    #[test]
    fn test_interpolate() {
        // 1/2 - r + r^2 through r = 0, 1, 2
        let points: Vec<(BigRational, BigRational)> = (0..3)
            .map(|x| {
                let x = rational(x, 1);
                let y = &(&x * &x - &x) + &rational(1, 2);
                (x, y)
            })
            .collect();
        let p = Polynomial::interpolate(&points);
        assert_eq!(
            p,
            Polynomial::from_coeffs(vec![rational(1, 2), rational(-1, 1), rational(1, 1)])
        );
    }

    #[test]
    fn test_denominator_lcm() {
        let p = Polynomial::from_coeffs(vec![rational(1, 4), rational(-1, 2), rational(3, 1)]);
        assert_eq!(p.denominator_lcm(), BigInt::from(4));
    }

    #[test]
    fn test_display() {
        let p = one_minus_r().pow(2).scale(&rational(1, 2));
        assert_eq!(p.to_string(), "1/2*r^2 - r + 1/2");
        assert_eq!(Polynomial::zero().to_string(), "0");
        assert_eq!((-&Polynomial::variable()).to_string(), "-r");
    }
}
