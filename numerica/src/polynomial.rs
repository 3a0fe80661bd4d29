use std::fmt;
use std::ops;

use crate::error::{NumericError, Result};
use crate::tolerance::Tolerance;

/// Univariate polynomial with real coefficients, highest degree first.
///
/// `[3.0, 2.0, -1.0]` is `3x^2 + 2x - 1`. Construction normalizes the
/// coefficients once: magnitudes below the coefficient tolerance become
/// exactly zero and leading zeros are dropped, leaving `[0.0]` for the zero
/// polynomial. Every operation returns a fresh value.
#[derive(Debug, Clone)]
pub struct Polynomial {
    coeffs: Vec<f64>,
    tol: Tolerance,
}

fn normalize(coeffs: Vec<f64>, tol: &Tolerance) -> Vec<f64> {
    let coeffs: Vec<f64> = coeffs
        .into_iter()
        .map(|c| tol.snap(c))
        .skip_while(|c| *c == 0.0)
        .collect();
    if coeffs.is_empty() { vec![0.0] } else { coeffs }
}

// Coefficients left-padded with zeros up to len, aligning the constant terms.
fn padded(coeffs: &[f64], len: usize) -> impl Iterator<Item = f64> + '_ {
    std::iter::repeat_n(0.0, len - coeffs.len()).chain(coeffs.iter().copied())
}

// 1 + max(|c_1|..|c_n|) / |c_0|
fn cauchy_bound(coeffs: &[f64]) -> f64 {
    let max_tail = coeffs[1..].iter().map(|c| c.abs()).fold(0.0, f64::max);
    1.0 + max_tail / coeffs[0].abs()
}

impl Polynomial {
    pub fn new(coeffs: Vec<f64>) -> Self {
        Self::with_tolerance(coeffs, Tolerance::default())
    }

    pub fn with_tolerance(coeffs: Vec<f64>, tol: Tolerance) -> Self {
        Polynomial {
            coeffs: normalize(coeffs, &tol),
            tol,
        }
    }

    pub fn zero() -> Self {
        Self::new(vec![0.0])
    }

    pub fn constant(c: f64) -> Self {
        Self::new(vec![c])
    }

    /// Monic polynomial `(x - r_0)(x - r_1)...` vanishing at every given root.
    pub fn from_roots(roots: &[f64]) -> Self {
        roots
            .iter()
            .fold(Self::constant(1.0), |acc, r| acc.multiply(&Self::new(vec![1.0, -r])))
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Coefficient of the `x^power` term.
    pub fn coeff(&self, power: usize) -> Option<f64> {
        self.degree()
            .checked_sub(power)
            .map(|idx| self.coeffs[idx])
    }

    pub fn leading(&self) -> f64 {
        self.coeffs[0]
    }

    pub fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs[0] == 0.0
    }

    /// Horner's method.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coeffs.iter().fold(0.0, |acc, c| acc * x + c)
    }

    /// Borrow this polynomial as a plain scalar function for the root solvers.
    pub fn as_fn(&self) -> impl Fn(f64) -> f64 + Copy + '_ {
        move |x| self.evaluate(x)
    }

    fn zip_with(&self, other: &Polynomial, op: impl Fn(f64, f64) -> f64) -> Polynomial {
        let len = self.coeffs.len().max(other.coeffs.len());
        let coeffs = padded(&self.coeffs, len)
            .zip(padded(&other.coeffs, len))
            .map(|(a, b)| op(a, b))
            .collect();
        Polynomial::with_tolerance(coeffs, self.tol)
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn subtract(&self, other: &Polynomial) -> Polynomial {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn negate(&self) -> Polynomial {
        self.scale(-1.0)
    }

    pub fn scale(&self, c: f64) -> Polynomial {
        Polynomial::with_tolerance(self.coeffs.iter().map(|ci| ci * c).collect(), self.tol)
    }

    pub fn multiply(&self, other: &Polynomial) -> Polynomial {
        if self.is_zero() || other.is_zero() {
            return Polynomial::with_tolerance(vec![0.0], self.tol);
        }
        let mut coeffs = vec![0.0; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Polynomial::with_tolerance(coeffs, self.tol)
    }

    /// Derivative. Constants (the zero polynomial included) yield zero.
    pub fn differentiate(&self) -> Polynomial {
        let n = self.degree();
        if n == 0 {
            return Polynomial::with_tolerance(vec![0.0], self.tol);
        }
        let coeffs = self.coeffs[..n]
            .iter()
            .enumerate()
            .map(|(i, c)| c * (n - i) as f64)
            .collect();
        Polynomial::with_tolerance(coeffs, self.tol)
    }

    /// P(-x), flipping the sign of every odd power.
    pub fn reflect(&self) -> Polynomial {
        let n = self.degree();
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .map(|(i, c)| if (n - i) % 2 == 1 { -c } else { *c })
            .collect();
        Polynomial::with_tolerance(coeffs, self.tol)
    }

    /// Long division returning `(quotient, remainder)` with
    /// `self == divisor * quotient + remainder` and the remainder of lower
    /// degree than the divisor (or zero).
    pub fn divide_by(&self, divisor: &Polynomial) -> Result<(Polynomial, Polynomial)> {
        let zero = Polynomial::with_tolerance(vec![0.0], self.tol);
        if divisor.is_zero() || self.tol.is_zero(divisor.leading()) {
            return Err(NumericError::DivisionByZero("divisor is the zero polynomial"));
        }
        if self.degree() < divisor.degree() {
            return Ok((zero, self.clone()));
        }
        let pivot = divisor.leading();
        if divisor.degree() == 0 {
            let quotient = self.coeffs.iter().map(|c| c / pivot).collect();
            return Ok((Polynomial::with_tolerance(quotient, self.tol), zero));
        }

        let mut quotient = vec![0.0; self.degree() - divisor.degree() + 1];
        let mut remainder = self.clone();
        // Each step strictly lowers the remainder degree.
        for _ in 0..quotient.len() {
            if remainder.is_zero() || remainder.degree() < divisor.degree() {
                break;
            }
            let shift = remainder.degree() - divisor.degree();
            let term = remainder.leading() / pivot;
            let qidx = quotient.len() - 1 - shift;
            quotient[qidx] = term;

            let mut coeffs = remainder.coeffs;
            for (rc, dc) in coeffs.iter_mut().zip(&divisor.coeffs) {
                *rc -= term * dc;
            }
            coeffs[0] = 0.0;
            remainder = Polynomial::with_tolerance(coeffs, self.tol);
        }
        Ok((Polynomial::with_tolerance(quotient, self.tol), remainder))
    }

    /// Cauchy bounds `(lower, upper)` enclosing every real root.
    pub fn real_root_bounds(&self) -> (f64, f64) {
        if self.degree() == 0 {
            return (0.0, 0.0);
        }
        let upper = cauchy_bound(&self.coeffs);
        let lower = -cauchy_bound(&self.reflect().coeffs);
        (lower, upper)
    }

    /// Coefficient-wise comparison allowing an absolute error of `eps`.
    pub fn approx_eq(&self, other: &Polynomial, eps: f64) -> bool {
        let len = self.coeffs.len().max(other.coeffs.len());
        padded(&self.coeffs, len)
            .zip(padded(&other.coeffs, len))
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl PartialEq for Polynomial {
    fn eq(&self, other: &Self) -> bool {
        self.coeffs == other.coeffs
    }
}

impl FromIterator<f64> for Polynomial {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Polynomial::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let n = self.degree();
        let mut first = true;
        for (i, &c) in self.coeffs.iter().enumerate() {
            if c == 0.0 {
                continue;
            }
            match (first, c < 0.0) {
                (true, true) => write!(f, "-")?,
                (true, false) => (),
                (false, true) => write!(f, " - ")?,
                (false, false) => write!(f, " + ")?,
            }
            first = false;
            let power = n - i;
            if c.abs() != 1.0 || power == 0 {
                write!(f, "{}", c.abs())?;
            }
            match power {
                0 => (),
                1 => write!(f, "x")?,
                p => write!(f, "x^{}", p)?,
            }
        }
        Ok(())
    }
}

macro_rules! poly_binop {
    ($optrait:ident, $opfn:ident, $method:ident) => {
        impl ops::$optrait<&Polynomial> for &Polynomial {
            type Output = Polynomial;
            fn $opfn(self, rhs: &Polynomial) -> Polynomial {
                Polynomial::$method(self, rhs)
            }
        }

        impl ops::$optrait for Polynomial {
            type Output = Polynomial;
            fn $opfn(self, rhs: Polynomial) -> Polynomial {
                Polynomial::$method(&self, &rhs)
            }
        }
    };
}

poly_binop!(Add, add, add);
poly_binop!(Sub, sub, subtract);
poly_binop!(Mul, mul, multiply);

impl ops::Mul<f64> for &Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: f64) -> Polynomial {
        self.scale(rhs)
    }
}

impl ops::Mul<f64> for Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: f64) -> Polynomial {
        self.scale(rhs)
    }
}

impl ops::Neg for &Polynomial {
    type Output = Polynomial;
    fn neg(self) -> Polynomial {
        self.negate()
    }
}

impl ops::Neg for Polynomial {
    type Output = Polynomial;
    fn neg(self) -> Polynomial {
        self.negate()
    }
}
