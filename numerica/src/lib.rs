#![deny(warnings)]

mod error;
pub use error::{NumericError, Result};

mod tolerance;
pub use tolerance::Tolerance;

mod polynomial;
pub use polynomial::Polynomial;

mod function;
pub use function::ScalarFn;

mod sampling;
pub use sampling::linspace;

mod findroot;
pub use findroot::{Solver, bisection, explore_domain, newton_raphson, regula_falsi, secant};

mod sturm;
pub use sturm::{SturmSequence, isolate_roots, real_roots, sturm_count};
