//! RationalFunction — exact elements of Q(r)
//!
//! Always stored reduced (numerator and denominator coprime) with a monic
//! denominator, so derived equality is equality in the field.

use super::poly::{rational_to_f64, Polynomial};
use num_rational::BigRational;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// A quotient of two polynomials in `r`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RationalFunction {
    numer: Polynomial,
    denom: Polynomial,
}

impl RationalFunction {
    /// `None` when the denominator is the zero polynomial.
    pub fn new(numer: Polynomial, denom: Polynomial) -> Option<Self> {
        if denom.is_zero() {
            return None;
        }
        Some(Self::reduced(numer, denom))
    }

    fn reduced(numer: Polynomial, denom: Polynomial) -> Self {
        if numer.is_zero() {
            return Self::zero();
        }
        let g = numer.gcd(&denom);
        let (numer, denom) = if g.is_constant() {
            (numer, denom)
        } else {
            match (numer.div_rem(&g), denom.div_rem(&g)) {
                (Some((n, _)), Some((d, _))) => (n, d),
                _ => (numer, denom),
            }
        };
        match denom.leading() {
            Some(lead) if !lead.is_one() => {
                let inv = lead.recip();
                Self {
                    numer: numer.scale(&inv),
                    denom: denom.scale(&inv),
                }
            }
            _ => Self { numer, denom },
        }
    }

    pub fn constant(c: BigRational) -> Self {
        Self::from(Polynomial::constant(c))
    }

    pub fn numer(&self) -> &Polynomial {
        &self.numer
    }

    pub fn denom(&self) -> &Polynomial {
        &self.denom
    }

    pub fn is_polynomial(&self) -> bool {
        self.denom.is_constant()
    }

    /// The numerator when the denominator is 1.
    pub fn as_polynomial(&self) -> Option<&Polynomial> {
        self.is_polynomial().then_some(&self.numer)
    }

    /// Total degree of numerator and denominator; used to pick cheap pivots.
    pub fn complexity(&self) -> usize {
        self.numer.degree().unwrap_or(0) + self.denom.degree().unwrap_or(0)
    }

    pub fn inv(&self) -> Option<Self> {
        Self::new(self.denom.clone(), self.numer.clone())
    }

    pub fn checked_div(&self, rhs: &Self) -> Option<Self> {
        rhs.inv().map(|inv| self * &inv)
    }

    pub fn scale(&self, factor: &BigRational) -> Self {
        Self::reduced(self.numer.scale(factor), self.denom.clone())
    }

    pub fn pow(&self, exp: u32) -> Self {
        Self {
            numer: self.numer.pow(exp),
            denom: self.denom.pow(exp),
        }
    }

    /// Exact value at `x`; `None` at a pole.
    pub fn eval(&self, x: &BigRational) -> Option<BigRational> {
        let d = self.denom.eval(x);
        if d.is_zero() {
            return None;
        }
        Some(self.numer.eval(x) / d)
    }

    pub fn eval_f64(&self, x: f64) -> f64 {
        self.numer.eval_f64(x) / self.denom.eval_f64(x)
    }

    /// Exact value converted to f64 when `x` is not a pole.
    pub fn eval_exact_f64(&self, x: &BigRational) -> Option<f64> {
        self.eval(x).map(|v| rational_to_f64(&v))
    }
}

impl From<Polynomial> for RationalFunction {
    fn from(numer: Polynomial) -> Self {
        Self {
            numer,
            denom: Polynomial::one(),
        }
    }
}

impl From<i64> for RationalFunction {
    fn from(n: i64) -> Self {
        Self::from(Polynomial::from(n))
    }
}

impl Zero for RationalFunction {
    fn zero() -> Self {
        Self {
            numer: Polynomial::zero(),
            denom: Polynomial::one(),
        }
    }

    fn is_zero(&self) -> bool {
        self.numer.is_zero()
    }
}

impl One for RationalFunction {
    fn one() -> Self {
        Self::from(Polynomial::one())
    }
}

impl Add<&RationalFunction> for &RationalFunction {
    type Output = RationalFunction;

    fn add(self, rhs: &RationalFunction) -> RationalFunction {
        if self.is_zero() {
            return rhs.clone();
        }
        if rhs.is_zero() {
            return self.clone();
        }
        if self.denom == rhs.denom {
            return RationalFunction::reduced(&self.numer + &rhs.numer, self.denom.clone());
        }
        let numer = &(&self.numer * &rhs.denom) + &(&rhs.numer * &self.denom);
        RationalFunction::reduced(numer, &self.denom * &rhs.denom)
    }
}

impl Neg for &RationalFunction {
    type Output = RationalFunction;

    fn neg(self) -> RationalFunction {
        RationalFunction {
            numer: -&self.numer,
            denom: self.denom.clone(),
        }
    }
}

impl Sub<&RationalFunction> for &RationalFunction {
    type Output = RationalFunction;

    fn sub(self, rhs: &RationalFunction) -> RationalFunction {
        self + &(-rhs)
    }
}

impl Mul<&RationalFunction> for &RationalFunction {
    type Output = RationalFunction;

    fn mul(self, rhs: &RationalFunction) -> RationalFunction {
        if self.is_zero() || rhs.is_zero() {
            return RationalFunction::zero();
        }
        RationalFunction::reduced(&self.numer * &rhs.numer, &self.denom * &rhs.denom)
    }
}

impl Add for RationalFunction {
    type Output = RationalFunction;

    fn add(self, rhs: RationalFunction) -> RationalFunction {
        &self + &rhs
    }
}

impl Sub for RationalFunction {
    type Output = RationalFunction;

    fn sub(self, rhs: RationalFunction) -> RationalFunction {
        &self - &rhs
    }
}

impl Mul for RationalFunction {
    type Output = RationalFunction;

    fn mul(self, rhs: RationalFunction) -> RationalFunction {
        &self * &rhs
    }
}

impl Neg for RationalFunction {
    type Output = RationalFunction;

    fn neg(self) -> RationalFunction {
        -&self
    }
}

impl fmt::Display for RationalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom.is_one() {
            return write!(f, "{}", self.numer);
        }
        let numer = if self.numer.is_constant() {
            self.numer.to_string()
        } else {
            format!("({})", self.numer)
        };
        if self.denom.is_constant() {
            write!(f, "{}/{}", numer, self.denom)
        } else {
            write!(f, "{}/({})", numer, self.denom)
        }
    }
}
