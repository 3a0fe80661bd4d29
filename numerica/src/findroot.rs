use log::{debug, trace};

use crate::error::{NumericError, Result};
use crate::function::ScalarFn;
use crate::sampling::linspace;
use crate::tolerance::Tolerance;

/// Iterative root solvers sharing one iteration ceiling.
///
/// Every method either converges (`|f(x)| <= tol`), fails on a precondition
/// or degenerate denominator, or gives up with `MaxIterations` once
/// `Tolerance::max_iterations` steps have run.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    tol: Tolerance,
}

fn check_residual(tol: f64) -> Result<()> {
    if tol.is_finite() && tol >= 0.0 {
        Ok(())
    } else {
        Err(NumericError::InvalidInput(format!(
            "residual tolerance must be finite and non-negative, got {}",
            tol
        )))
    }
}

fn finite(x: f64, fx: f64) -> Result<f64> {
    if x.is_finite() && fx.is_finite() {
        Ok(fx)
    } else {
        Err(NumericError::NonFinite { x })
    }
}

fn same_sign(fa: f64, fb: f64) -> bool {
    (fa > 0.0 && fb > 0.0) || (fa < 0.0 && fb < 0.0)
}

impl Solver {
    pub fn new(tol: Tolerance) -> Self {
        Solver { tol }
    }

    pub fn tolerance(&self) -> &Tolerance {
        &self.tol
    }

    fn exhausted(&self, estimate: f64) -> NumericError {
        debug!("gave up after {} iterations at x={}", self.tol.max_iterations, estimate);
        NumericError::MaxIterations {
            iterations: self.tol.max_iterations,
            estimate: Some(estimate),
        }
    }

    /// Halve a bracket `[a, b]` with `f(a) * f(b) <= 0` until the midpoint
    /// residual drops to `tol`.
    pub fn bisection(&self, f: impl ScalarFn, (a, b): (f64, f64), tol: f64) -> Result<f64> {
        check_residual(tol)?;
        let fa = finite(a, f.eval(a))?;
        let fb = finite(b, f.eval(b))?;
        if same_sign(fa, fb) {
            return Err(NumericError::NoSignChange { a, b, fa, fb });
        }
        // lo holds the endpoint with the lower image: f(lo) <= 0 <= f(hi)
        let (mut lo, mut hi) = if fa < fb { (a, b) } else { (b, a) };
        for iteration in 0..self.tol.max_iterations {
            let x = (lo + hi) / 2.0;
            if x == lo || x == hi {
                debug!("bisection bracket collapsed at x={} after {} steps", x, iteration);
                return Err(NumericError::MaxIterations {
                    iterations: iteration,
                    estimate: Some(x),
                });
            }
            let fx = finite(x, f.eval(x))?;
            trace!("bisection #{}: x={} f(x)={}", iteration, x, fx);
            if fx.abs() <= tol {
                debug!("bisection converged to {} in {} steps", x, iteration + 1);
                return Ok(x);
            }
            if fx > 0.0 {
                hi = x;
            } else {
                lo = x;
            }
        }
        Err(self.exhausted((lo + hi) / 2.0))
    }

    /// Secant method seeded with two points. No bracketing is kept, so
    /// convergence depends on the seeds.
    pub fn secant(&self, f: impl ScalarFn, (a, b): (f64, f64), tol: f64) -> Result<f64> {
        check_residual(tol)?;
        let (mut a, mut b) = if a < b { (a, b) } else { (b, a) };
        let (mut fa, mut fb) = (finite(a, f.eval(a))?, finite(b, f.eval(b))?);
        for iteration in 0..self.tol.max_iterations {
            if fb == fa {
                return Err(NumericError::DivisionByZero(
                    "secant line is horizontal, f(a) == f(b)",
                ));
            }
            let x = (fb * a - fa * b) / (fb - fa);
            let fx = finite(x, f.eval(x))?;
            trace!("secant #{}: x={} f(x)={}", iteration, x, fx);
            if fx.abs() <= tol {
                debug!("secant converged to {} in {} steps", x, iteration + 1);
                return Ok(x);
            }
            (a, fa) = (b, fb);
            (b, fb) = (x, fx);
        }
        Err(self.exhausted(b))
    }

    /// Newton-Raphson from `x0` using the analytic derivative `df`.
    /// Convergence is local only: cycles and divergence end in `MaxIterations`.
    pub fn newton_raphson(
        &self,
        f: impl ScalarFn,
        df: impl ScalarFn,
        x0: f64,
        tol: f64,
    ) -> Result<f64> {
        check_residual(tol)?;
        let mut x = x0;
        for iteration in 0..self.tol.max_iterations {
            let dfx = df.eval(x);
            if dfx == 0.0 {
                return Err(NumericError::DivisionByZero("derivative vanishes at current x"));
            }
            let next = x - f.eval(x) / dfx;
            let fnext = finite(next, f.eval(next))?;
            trace!("newton #{}: x={} f(x)={}", iteration, next, fnext);
            if fnext.abs() <= tol {
                debug!("newton converged to {} in {} steps", next, iteration + 1);
                return Ok(next);
            }
            x = next;
        }
        Err(self.exhausted(x))
    }

    /// False position on a bracket, Illinois variant.
    pub fn regula_falsi(&self, f: impl ScalarFn, (a, b): (f64, f64), tol: f64) -> Result<f64> {
        check_residual(tol)?;
        let (mut a, mut b) = (a, b);
        let (mut fa, mut fb) = (finite(a, f.eval(a))?, finite(b, f.eval(b))?);
        if same_sign(fa, fb) {
            return Err(NumericError::NoSignChange { a, b, fa, fb });
        }
        if fa.abs() <= tol {
            return Ok(a);
        }
        if fb.abs() <= tol {
            return Ok(b);
        }
        let mut last_fx_sign = 0.0;
        for iteration in 0..self.tol.max_iterations {
            // weighted mean of the endpoints, fb - fa can't vanish here
            let x = (a * fb - b * fa) / (fb - fa);
            let fx = finite(x, f.eval(x))?;
            trace!("regula falsi #{}: x={} f(x)={}", iteration, x, fx);
            if fx.abs() <= tol {
                debug!("regula falsi converged to {} in {} steps", x, iteration + 1);
                return Ok(x);
            }
            // same side twice in a row: halve the value kept at the other end
            if fa.signum() == fx.signum() {
                (a, fa) = (x, fx);
                if fx.signum() == last_fx_sign {
                    fb /= 2.0;
                }
            } else {
                (b, fb) = (x, fx);
                if fx.signum() == last_fx_sign {
                    fa /= 2.0;
                }
            }
            last_fx_sign = fx.signum();
        }
        Err(self.exhausted((a + b) / 2.0))
    }
}

pub fn bisection(f: impl ScalarFn, bracket: (f64, f64), tol: f64) -> Result<f64> {
    Solver::default().bisection(f, bracket, tol)
}

pub fn secant(f: impl ScalarFn, seeds: (f64, f64), tol: f64) -> Result<f64> {
    Solver::default().secant(f, seeds, tol)
}

pub fn newton_raphson(f: impl ScalarFn, df: impl ScalarFn, x0: f64, tol: f64) -> Result<f64> {
    Solver::default().newton_raphson(f, df, x0, tol)
}

pub fn regula_falsi(f: impl ScalarFn, bracket: (f64, f64), tol: f64) -> Result<f64> {
    Solver::default().regula_falsi(f, bracket, tol)
}

/// Sample `f` over `[x0, xf]` in `divs` steps and return the sub-intervals
/// where it changes sign. Sampling is refined up to 4 times when nothing
/// turns up.
pub fn explore_domain(f: impl ScalarFn, (x0, xf): (f64, f64), divs: usize) -> Result<Vec<(f64, f64)>> {
    explore(&f, (x0, xf), divs, 4, 10)
}

fn explore(
    f: &impl ScalarFn,
    (a, b): (f64, f64),
    divs: usize,
    max_division_depth: usize,
    nested_div_factor: usize,
) -> Result<Vec<(f64, f64)>> {
    if !(a < b) {
        return Err(NumericError::InvalidInterval { a, b });
    }
    if divs < 2 {
        return Err(NumericError::InvalidInput(format!(
            "need at least 2 divisions to explore, got {}",
            divs
        )));
    }

    let points = linspace(a, b, divs + 1)
        .into_iter()
        .map(|x| (x, f.eval(x)))
        .collect::<Vec<_>>();

    let mut root_brackets = Vec::new();
    for w in points.windows(2) {
        let &[(x0, fx0), (x1, fx1)] = w else {
            unreachable!()
        };
        if fx1.signum() != fx0.signum() {
            root_brackets.push((x0, x1));
        }
    }

    if root_brackets.is_empty() && max_division_depth > 0 {
        trace!("no sign change over {} divisions, refining", divs);
        explore(
            f,
            (a, b),
            nested_div_factor * divs,
            max_division_depth - 1,
            nested_div_factor,
        )
    } else {
        Ok(root_brackets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Polynomial;

    macro_rules! fuzzy_eq {
        ($lhs:expr, $rhs:expr, $eps:expr) => {{
            let (l, r) = ($lhs, $rhs);
            assert!((l - r).abs() < $eps, "{} != {}", l, r)
        }};
    }

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn bisection_finds_square_root() -> Result<()> {
        init_logs();
        let root = bisection(|x: f64| x * x - 16.0, (3.0, 5.0), 1.0e-6)?;
        fuzzy_eq!(root, 4.0, 1.0e-6);
        let root = bisection(|x: f64| x * x - 2.0, (0.0, 2.0), 1.0e-10)?;
        fuzzy_eq!(root, 2f64.sqrt(), 1.0e-9);
        // bracket given in reverse order with decreasing function
        let root = bisection(|x: f64| 3.0 - x, (10.0, -10.0), 1.0e-12)?;
        fuzzy_eq!(root, 3.0, 1.0e-12);
        Ok(())
    }

    #[test]
    fn bisection_requires_sign_change() {
        let err = bisection(|x: f64| x * x - 16.0, (0.0, 1.0), 1.0e-6).unwrap_err();
        assert_eq!(
            err,
            NumericError::NoSignChange { a: 0.0, b: 1.0, fa: -16.0, fb: -15.0 }
        );
    }

    #[test]
    fn bisection_accepts_boundary_root() -> Result<()> {
        let root = bisection(|x: f64| x - 1.0, (1.0, 3.0), 1.0e-9)?;
        fuzzy_eq!(root, 1.0, 1.0e-8);
        Ok(())
    }

    #[test]
    fn bisection_rejects_bad_tolerance() {
        assert!(matches!(
            bisection(|x: f64| x, (-1.0, 1.0), f64::NAN),
            Err(NumericError::InvalidInput(_))
        ));
    }

    #[test]
    fn bisection_respects_iteration_ceiling() {
        let solver = Solver::new(Tolerance::new().with_max_iterations(5));
        let err = solver
            .bisection(|x: f64| x * x - 2.0, (0.0, 2.0), 1.0e-12)
            .unwrap_err();
        assert!(matches!(err, NumericError::MaxIterations { iterations: 5, .. }));
    }

    #[test]
    fn secant_converges() -> Result<()> {
        init_logs();
        let root = secant(|x: f64| x * x - 2.0, (1.0, 2.0), 1.0e-10)?;
        fuzzy_eq!(root, 2f64.sqrt(), 1.0e-9);
        let root = secant(|x: f64| x.cos() - x, (1.0, 0.0), 1.0e-12)?;
        fuzzy_eq!(root, 0.7390851332151607, 1.0e-9);
        Ok(())
    }

    #[test]
    fn bisection_stops_when_bracket_collapses() {
        // a jump at 1/3 never meets the residual, the bracket runs out of floats first
        let step = |x: f64| if x < 1.0 / 3.0 { -1.0 } else { 1.0 };
        match bisection(step, (0.0, 1.0), 0.5) {
            Err(NumericError::MaxIterations { iterations, estimate: Some(x) }) => {
                assert!(iterations < 100, "ran {} iterations", iterations);
                fuzzy_eq!(x, 1.0 / 3.0, 1.0e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn secant_respects_iteration_ceiling() {
        let solver = Solver::new(Tolerance::new().with_max_iterations(3));
        let err = solver
            .secant(|x: f64| x.cos() - x, (1.0, 0.0), 1.0e-15)
            .unwrap_err();
        assert!(matches!(
            err,
            NumericError::MaxIterations { iterations: 3, estimate: Some(_) }
        ));
    }

    #[test]
    fn secant_horizontal_line() {
        let err = secant(|x: f64| x * x - 4.0, (-1.0, 1.0), 1.0e-6).unwrap_err();
        assert!(matches!(err, NumericError::DivisionByZero(_)));
    }

    #[test]
    fn newton_finds_sqrt2() -> Result<()> {
        init_logs();
        let root = newton_raphson(|x: f64| x * x - 2.0, |x: f64| 2.0 * x, 1.0, 1.0e-9)?;
        fuzzy_eq!(root, 2f64.sqrt(), 1.0e-9);
        Ok(())
    }

    #[test]
    fn newton_zero_derivative() {
        let err = newton_raphson(|x: f64| x * x - 2.0, |x: f64| 2.0 * x, 0.0, 1.0e-9).unwrap_err();
        assert!(matches!(err, NumericError::DivisionByZero(_)));
    }

    #[test]
    fn newton_leaves_the_domain() {
        // first step from 5 lands at 5 - 5 ln 5 < 0 where ln is NaN
        let err = newton_raphson(|x: f64| x.ln(), |x: f64| 1.0 / x, 5.0, 1.0e-9).unwrap_err();
        match err {
            NumericError::NonFinite { x } => fuzzy_eq!(x, 5.0 - 5.0 * 5f64.ln(), 1.0e-12),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn newton_cycle_hits_ceiling() {
        // x^3 - 2x + 2 bounces between 0 and 1 forever
        let solver = Solver::new(Tolerance::new().with_max_iterations(50));
        let err = solver
            .newton_raphson(
                |x: f64| x.powi(3) - 2.0 * x + 2.0,
                |x: f64| 3.0 * x * x - 2.0,
                0.0,
                1.0e-9,
            )
            .unwrap_err();
        assert!(matches!(err, NumericError::MaxIterations { iterations: 50, .. }));
    }

    #[test]
    fn newton_on_polynomial_adapter() -> Result<()> {
        let p = Polynomial::new(vec![1.0, 0.0, -4.0]);
        let dp = p.differentiate();
        let root = newton_raphson(p.as_fn(), dp.as_fn(), 5.0, 1.0e-12)?;
        fuzzy_eq!(root, 2.0, 1.0e-9);
        Ok(())
    }

    #[test]
    fn regula_falsi_converges() -> Result<()> {
        let root = regula_falsi(|x: f64| x.powi(3) - x - 2.0, (1.0, 2.0), 1.0e-12)?;
        fuzzy_eq!(root, 1.5213797068045676, 1.0e-9);
        assert!(regula_falsi(|x: f64| x * x + 1.0, (-1.0, 1.0), 1.0e-9).is_err());
        Ok(())
    }

    #[test]
    fn test_explore_domain() -> Result<()> {
        let f = |x: f64| {
            let mut sum = -1000.0;
            for i in 1..=5 {
                sum += 100.0 / (1.0 + x).powi(i)
            }
            sum
        };
        let brackets = explore_domain(f, (-1000.0, 1000.0), 10)?;
        assert_eq!(brackets.len(), 2);
        let (x0, x1) = brackets[1];
        let root = regula_falsi(f, (x0, x1), 1.0e-10)?;
        fuzzy_eq!(root, -0.1940185201887317, 1.0e-9);
        Ok(())
    }

    #[test]
    fn explore_domain_bad_args() {
        assert!(matches!(
            explore_domain(|x: f64| x, (1.0, 1.0), 10),
            Err(NumericError::InvalidInterval { .. })
        ));
        assert!(matches!(
            explore_domain(|x: f64| x, (0.0, 1.0), 1),
            Err(NumericError::InvalidInput(_))
        ));
    }
}
