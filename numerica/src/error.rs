use thiserror::Error;

/// Failures raised by polynomial arithmetic, root counting and root solvers.
///
/// Every variant is local and recoverable: nothing is left half-mutated, so a
/// caller can retry with different starting data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("division by zero: {0}")]
    DivisionByZero(&'static str),
    #[error("no sign change between f({a})={fa} and f({b})={fb}")]
    NoSignChange { a: f64, b: f64, fa: f64, fb: f64 },
    #[error("invalid interval: lower bound {a} must be below upper bound {b}")]
    InvalidInterval { a: f64, b: f64 },
    #[error(
        "didn't converge after {iterations} iterations{}",
        .estimate.map(|x| format!(", last estimate x={}", x)).unwrap_or_default()
    )]
    MaxIterations {
        iterations: usize,
        estimate: Option<f64>,
    },
    #[error("non finite value reached at x={x}")]
    NonFinite { x: f64 },
}

pub type Result<T> = std::result::Result<T, NumericError>;
