/// A real valued function of one real variable.
///
/// Root solvers only see this capability, so closures, function pointers and
/// borrowed polynomials (through `Polynomial::as_fn`) are all accepted.
pub trait ScalarFn {
    fn eval(&self, x: f64) -> f64;
}

impl<F> ScalarFn for F
where
    F: Fn(f64) -> f64,
{
    fn eval(&self, x: f64) -> f64 {
        self(x)
    }
}
