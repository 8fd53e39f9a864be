//! The `gl8_core` crate provides a fixed-step 4-stage Gauss-Legendre (GL8)
//! integrator whose implicit stage equations are solved by fixed-point iteration.
//! It is generic over the scalar type, supporting both `f64` and the
//! extended-precision `DoubleDouble`.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `VectorField` (autonomous ODE right-hand sides), `Hamiltonian`.
//! - **Tableau**: Butcher coefficients built in the target precision from closed forms in sqrt(30).
//! - **Integrator**: `Gl8` with bounded Picard iteration and per-step diagnostics.
//! - **Propagate / Diagnostics / Convergence**: trajectories, energy drift, and empirical order checks.
pub mod convergence;
pub mod diagnostics;
pub mod double_double;
pub mod error;
pub mod integrator;
pub mod propagate;
pub mod systems;
pub mod tableau;
pub mod traits;

pub use double_double::DoubleDouble;
pub use error::{StepError, StepResult};
pub use integrator::{gl8_step, Gl8, Gl8Settings, StepOutcome};
pub use traits::{Hamiltonian, Scalar, VectorField};
