use log::{debug, trace, warn};

use crate::error::{NumericError, Result};
use crate::findroot::Solver;
use crate::polynomial::Polynomial;
use crate::tolerance::Tolerance;

/// Canonical Sturm sequence `P, P', -rem(P, P'), ...` of a polynomial.
///
/// Counting assumes `P` is square-free over the queried interval; that is
/// not checked.
#[derive(Debug, Clone)]
pub struct SturmSequence {
    terms: Vec<Polynomial>,
    tol: Tolerance,
}

impl SturmSequence {
    pub fn new(p: &Polynomial) -> Result<Self> {
        Self::with_tolerance(p, *p.tolerance())
    }

    /// Build the sequence. Fails with `DivisionByZero` when a term vanishes
    /// before a zero remainder shows up, as happens for constant inputs.
    pub fn with_tolerance(p: &Polynomial, tol: Tolerance) -> Result<Self> {
        tol.validate()?;
        let p = Polynomial::with_tolerance(p.coeffs().to_vec(), tol);
        let dp = p.differentiate();
        let mut terms = vec![p, dp];
        for _ in 0..tol.max_iterations {
            let n = terms.len();
            let (_, remainder) = terms[n - 2].divide_by(&terms[n - 1])?;
            if remainder.is_zero() {
                debug!("sturm sequence of {} has {} terms", terms[0], terms.len());
                return Ok(SturmSequence { terms, tol });
            }
            trace!("sturm term #{}: {}", n, -&remainder);
            terms.push(-remainder);
        }
        Err(NumericError::MaxIterations {
            iterations: tol.max_iterations,
            estimate: None,
        })
    }

    pub fn terms(&self) -> &[Polynomial] {
        &self.terms
    }

    /// `P / gcd(P, P')`, where the gcd is the last term of the sequence.
    /// Same distinct roots as `P`, all of them simple.
    pub fn square_free(&self) -> Result<Polynomial> {
        let p = &self.terms[0];
        let gcd = &self.terms[self.terms.len() - 1];
        if gcd.degree() == 0 {
            return Ok(p.clone());
        }
        let (q, _) = p.divide_by(gcd)?;
        trace!("square-free part of {} is {}", p, q);
        Ok(q)
    }

    /// Sign changes along the sequence evaluated at `x`. Values closer to
    /// zero than the sign tolerance carry no sign and are skipped.
    pub fn sign_variations(&self, x: f64) -> usize {
        let signs: Vec<bool> = self
            .terms
            .iter()
            .map(|p| p.evaluate(x))
            .filter(|v| v.abs() >= self.tol.sign)
            .map(|v| v > 0.0)
            .collect();
        signs.windows(2).filter(|w| w[0] != w[1]).count()
    }

    /// Number of distinct real roots in `(a, b]`.
    pub fn count_roots(&self, a: f64, b: f64) -> Result<usize> {
        if !(a < b) {
            return Err(NumericError::InvalidInterval { a, b });
        }
        let (va, vb) = (self.sign_variations(a), self.sign_variations(b));
        if va < vb {
            warn!(
                "sign variations grew from {} to {} over ({}, {}], input is not square-free?",
                va, vb, a, b
            );
        }
        Ok(va.saturating_sub(vb))
    }
}

/// Number of distinct real roots of `p` in `(a, b]`.
pub fn sturm_count(p: &Polynomial, a: f64, b: f64) -> Result<usize> {
    if !(a < b) {
        return Err(NumericError::InvalidInterval { a, b });
    }
    SturmSequence::new(p)?.count_roots(a, b)
}

/// Disjoint intervals `(lo, hi]`, sorted ascending, each holding exactly one
/// distinct real root of `p`.
pub fn isolate_roots(p: &Polynomial) -> Result<Vec<(f64, f64)>> {
    if p.is_zero() {
        return Err(NumericError::InvalidInput(
            "the zero polynomial vanishes everywhere".to_string(),
        ));
    }
    if p.degree() == 0 {
        return Ok(Vec::new());
    }
    let seq = SturmSequence::new(p)?;
    let max_splits = p.tolerance().max_iterations;
    // Roots lie strictly inside the Cauchy bounds so (lower, upper] misses none.
    let (lower, upper) = p.real_root_bounds();

    let mut isolated = Vec::new();
    let mut pending = vec![(lower, upper, seq.count_roots(lower, upper)?)];
    let mut splits = 0;
    while let Some((a, b, count)) = pending.pop() {
        match count {
            0 => (),
            1 => isolated.push((a, b)),
            _ => {
                splits += 1;
                let mid = (a + b) / 2.0;
                // roots closer together than f64 spacing can't be split
                if splits > max_splits || !(a < mid && mid < b) {
                    return Err(NumericError::MaxIterations {
                        iterations: splits,
                        estimate: Some(mid),
                    });
                }
                pending.push((a, mid, seq.count_roots(a, mid)?));
                pending.push((mid, b, seq.count_roots(mid, b)?));
            }
        }
    }
    isolated.sort_by(|x, y| x.0.total_cmp(&y.0));
    debug!("isolated {} real roots of {}", isolated.len(), p);
    Ok(isolated)
}

/// Every distinct real root of `p`, ascending.
///
/// Repeated roots don't change sign, so each interval is refined on the
/// square-free part `q` of `p` and every returned `x` has `|q(x)| <= tol`.
/// When `p` is already square-free, `q` is `p`.
pub fn real_roots(p: &Polynomial, tol: f64) -> Result<Vec<f64>> {
    let intervals = isolate_roots(p)?;
    if intervals.is_empty() {
        return Ok(Vec::new());
    }
    let q = SturmSequence::new(p)?.square_free()?;
    let solver = Solver::new(*p.tolerance());
    intervals
        .into_iter()
        .map(|(a, b)| {
            // the interval is open on the left, so only b can be the root
            if q.evaluate(b).abs() <= tol {
                Ok(b)
            } else {
                solver.bisection(q.as_fn(), (a, b), tol)
            }
        })
        .collect()
}
