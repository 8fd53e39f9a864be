//! Eighth-order Gauss-Legendre implicit Runge-Kutta step.
//!
//! The implicit stage equations
//!
//! ```text
//! g_i = f(y + dt * sum_j a_ij g_j),   i = 1..4
//! ```
//!
//! are solved by fixed-point iteration starting from `g = 0`, and the step
//! returns `y + dt * sum_i b_i g_i`. Each iteration first mixes the stages
//! with `A` and then re-evaluates every stage derivative at the point its
//! mixed estimate predicts. The loop stops when the max-norm change of `g`
//! drops below the tolerance or after `max_iterations` sweeps, whichever
//! comes first; running out of iterations is not an error.
//!
//! Precision: with `f64` the achievable tolerance is about `1e-16 * |g|`.
//! Tighter tolerances only converge once successive iterates agree exactly,
//! otherwise every step runs to the bound. Use
//! [`DoubleDouble`](crate::double_double::DoubleDouble) for tolerances such
//! as `1e-18` and for long horizons where `f64` rounding swamps the method's
//! truncation error.

use crate::error::{StepError, StepResult};
use crate::tableau::{Tableau, STAGES};
use crate::traits::{constant, Scalar, VectorField};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gl8Settings {
    /// Upper bound on fixed-point sweeps per step.
    pub max_iterations: usize,
    /// Max-norm change of the stage derivatives below which a step counts as
    /// converged. Non-positive values disable early exit.
    pub tolerance: f64,
    /// Fail with [`StepError::NonFinite`] instead of returning NaN/inf.
    pub reject_non_finite: bool,
}

impl Default for Gl8Settings {
    fn default() -> Self {
        Self {
            max_iterations: 16,
            tolerance: 1e-18,
            reject_non_finite: false,
        }
    }
}

impl Gl8Settings {
    /// Settings with a looser bound of 50 sweeps, for accuracy studies.
    pub fn reference() -> Self {
        Self {
            max_iterations: 50,
            ..Self::default()
        }
    }

    pub fn with_tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
}

/// Result of one step together with how the fixed-point loop terminated.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome<T> {
    pub state: Vec<T>,
    /// Sweeps performed, in `1..=max_iterations`.
    pub iterations: usize,
    /// `false` when the loop exhausted `max_iterations`.
    pub converged: bool,
    /// Max-norm change of `g` in the last sweep.
    pub residual: T,
}

/// Fixed-step GL8 integrator. Holds only the tableau and its settings, so
/// one instance can be shared across threads and trajectories.
#[derive(Debug, Clone)]
pub struct Gl8<T: Scalar> {
    tableau: Tableau<T>,
    tolerance: T,
    settings: Gl8Settings,
}

impl<T: Scalar> Gl8<T> {
    pub fn new(settings: Gl8Settings) -> StepResult<Self> {
        if settings.max_iterations == 0 {
            return Err(StepError::InvalidSettings {
                what: "max_iterations must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            tableau: Tableau::gauss_legendre(),
            tolerance: constant(settings.tolerance),
            settings,
        })
    }

    pub fn settings(&self) -> &Gl8Settings {
        &self.settings
    }

    pub fn tableau(&self) -> &Tableau<T> {
        &self.tableau
    }

    /// Advances `y` by `dt`, returning the new state and convergence info.
    /// `y` is left untouched.
    pub fn step<F>(&self, field: &F, y: &[T], dt: T) -> StepResult<StepOutcome<T>>
    where
        F: VectorField<T> + ?Sized,
    {
        let n = y.len();
        if n == 0 {
            return Err(StepError::EmptyState);
        }
        let expected = field.dimension();
        if expected != n {
            return Err(StepError::DimensionMismatch {
                expected,
                actual: n,
            });
        }

        let a = &self.tableau.a;
        let zero = T::zero();
        // Stage j occupies g[j * n..(j + 1) * n].
        let mut g = vec![zero; STAGES * n];
        let mut prev = vec![zero; STAGES * n];
        let mut point = vec![zero; n];
        let mut derivative = vec![zero; n];

        let mut iterations = 0;
        let mut converged = false;
        let mut residual = zero;

        while iterations < self.settings.max_iterations {
            iterations += 1;
            prev.copy_from_slice(&g);

            // g = A * g
            for i in 0..STAGES {
                for k in 0..n {
                    let mut acc = zero;
                    for j in 0..STAGES {
                        acc = acc + a[i][j] * prev[j * n + k];
                    }
                    g[i * n + k] = acc;
                }
            }

            // g_j = f(y + dt * g_j)
            for j in 0..STAGES {
                let stage = &mut g[j * n..(j + 1) * n];
                for k in 0..n {
                    point[k] = y[k] + dt * stage[k];
                }
                field
                    .apply(&point, &mut derivative)
                    .map_err(|source| StepError::Evaluation {
                        stage: j,
                        source: source.into(),
                    })?;
                stage.copy_from_slice(&derivative);
            }

            residual = max_abs_difference(&g, &prev);
            if residual < self.tolerance {
                converged = true;
                break;
            }
        }

        let b = &self.tableau.b;
        let mut state = Vec::with_capacity(n);
        for k in 0..n {
            let mut acc = zero;
            for j in 0..STAGES {
                acc = acc + b[j] * g[j * n + k];
            }
            state.push(y[k] + dt * acc);
        }

        if self.settings.reject_non_finite {
            if let Some(index) = state.iter().position(|v| !v.is_finite()) {
                return Err(StepError::NonFinite { index });
            }
        }

        Ok(StepOutcome {
            state,
            iterations,
            converged,
            residual,
        })
    }

    /// [`step`](Self::step) without the convergence report.
    pub fn advance<F>(&self, field: &F, y: &[T], dt: T) -> StepResult<Vec<T>>
    where
        F: VectorField<T> + ?Sized,
    {
        self.step(field, y, dt).map(|outcome| outcome.state)
    }
}

/// One GL8 step of `y` under `field` with default settings and tolerance `eps`.
///
/// Builds the tableau on every call; loops should construct a [`Gl8`] once
/// and reuse it.
pub fn gl8_step<T, F>(y: &[T], field: &F, dt: T, eps: T) -> StepResult<Vec<T>>
where
    T: Scalar,
    F: VectorField<T> + ?Sized,
{
    let tolerance = eps.to_f64().unwrap_or(f64::NAN);
    let integrator = Gl8::new(Gl8Settings::default().with_tolerance(tolerance))?;
    integrator.advance(field, y, dt)
}

// NaN anywhere makes the result NaN so the convergence test fails.
fn max_abs_difference<T: Scalar>(a: &[T], b: &[T]) -> T {
    let mut worst = T::zero();
    for (x, y) in a.iter().zip(b) {
        let d = (*x - *y).abs();
        if d.is_nan() {
            return d;
        }
        if d > worst {
            worst = d;
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::{gl8_step, Gl8, Gl8Settings};
    use crate::double_double::DoubleDouble;
    use crate::error::StepError;
    use crate::tableau::Tableau;
    use crate::traits::{from_fn, VectorField};
    use anyhow::{bail, Result};
    use std::cell::Cell;

    struct Decay;

    impl VectorField<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, x: &[f64], out: &mut [f64]) -> Result<()> {
            out[0] = -x[0];
            Ok(())
        }
    }

    struct CountingField {
        calls: Cell<usize>,
    }

    impl VectorField<f64> for CountingField {
        fn dimension(&self) -> usize {
            2
        }

        fn apply(&self, x: &[f64], out: &mut [f64]) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            out[0] = x[1];
            out[1] = -x[0];
            Ok(())
        }
    }

    struct FailsAbove {
        limit: f64,
    }

    impl VectorField<f64> for FailsAbove {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, x: &[f64], out: &mut [f64]) -> Result<()> {
            if x[0] > self.limit {
                bail!("state {} outside the model domain", x[0]);
            }
            out[0] = 1.0;
            Ok(())
        }
    }

    fn integrator(settings: Gl8Settings) -> Gl8<f64> {
        Gl8::new(settings).expect("valid settings")
    }

    #[test]
    fn default_settings_use_sixteen_iterations() {
        let settings = Gl8Settings::default();
        assert_eq!(settings.max_iterations, 16);
        assert_eq!(settings.tolerance, 1e-18);
        assert!(!settings.reject_non_finite);
        assert_eq!(Gl8Settings::reference().max_iterations, 50);
    }

    #[test]
    fn settings_deserialize_with_defaults_for_missing_fields() {
        let settings: Gl8Settings =
            serde_json::from_str(r#"{"max_iterations": 50}"#).expect("parse settings");
        assert_eq!(settings.max_iterations, 50);
        assert_eq!(settings.tolerance, 1e-18);
    }

    #[test]
    fn integrator_holds_the_gauss_legendre_tableau() {
        let gl8 = integrator(Gl8Settings::default());
        assert_eq!(gl8.tableau(), &Tableau::<f64>::gauss_legendre());
        assert_eq!(gl8.settings(), &Gl8Settings::default());
    }

    #[test]
    fn zero_iteration_bound_is_rejected() {
        let err = Gl8::<f64>::new(Gl8Settings::default().with_max_iterations(0))
            .expect_err("zero iterations must be rejected");
        assert!(matches!(err, StepError::InvalidSettings { .. }));
    }

    #[test]
    fn exponential_decay_matches_closed_form() {
        let gl8 = integrator(Gl8Settings::default().with_tolerance(1e-15));
        let outcome = gl8.step(&Decay, &[1.0], 0.1).expect("step");
        assert!(outcome.converged);
        assert!((outcome.state[0] - (-0.1f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn zero_step_returns_input() {
        let gl8 = integrator(Gl8Settings::default());
        let y = [0.3, -1.7];
        let field = CountingField {
            calls: Cell::new(0),
        };
        let next = gl8.advance(&field, &y, 0.0).expect("step");
        assert_eq!(next, y.to_vec());
    }

    #[test]
    fn input_state_is_not_mutated() {
        let gl8 = integrator(Gl8Settings::default());
        let y = vec![1.0, 0.0];
        let field = CountingField {
            calls: Cell::new(0),
        };
        let next = gl8.advance(&field, &y, 0.1).expect("step");
        assert_eq!(y, vec![1.0, 0.0]);
        assert_eq!(next.len(), 2);
        assert_ne!(next, y);
    }

    #[test]
    fn evaluations_are_bounded_by_four_per_iteration() {
        let settings = Gl8Settings::default()
            .with_tolerance(0.0)
            .with_max_iterations(7);
        let gl8 = integrator(settings);
        let field = CountingField {
            calls: Cell::new(0),
        };
        let outcome = gl8.step(&field, &[1.0, 0.0], 0.01).expect("step");
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 7);
        assert_eq!(field.calls.get(), 4 * 7);
    }

    #[test]
    fn non_positive_tolerance_runs_to_the_bound() {
        let gl8 = integrator(Gl8Settings::default().with_tolerance(-1.0));
        let outcome = gl8.step(&Decay, &[1.0], 0.01).expect("step");
        assert_eq!(outcome.iterations, 16);
        assert!(!outcome.converged);
        assert!((outcome.state[0] - (-0.01f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn more_iterations_leave_a_converged_step_unchanged() {
        let field = CountingField {
            calls: Cell::new(0),
        };
        let y = [0.4, 0.2];
        let short = integrator(Gl8Settings::default().with_tolerance(1e-14))
            .step(&field, &y, 0.05)
            .expect("step");
        let long = integrator(Gl8Settings::reference().with_tolerance(1e-14))
            .step(&field, &y, 0.05)
            .expect("step");
        assert!(short.converged && long.converged);
        for (a, b) in short.state.iter().zip(&long.state) {
            assert!((a - b).abs() < 1e-15);
        }
    }

    #[test]
    fn dimension_mismatch_fails_fast() {
        let gl8 = integrator(Gl8Settings::default());
        let err = gl8.step(&Decay, &[1.0, 2.0], 0.1).expect_err("mismatch");
        assert!(matches!(
            err,
            StepError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        ));
        let err = gl8.step(&Decay, &[], 0.1).expect_err("empty");
        assert!(matches!(err, StepError::EmptyState));
    }

    #[test]
    fn evaluator_errors_propagate_with_their_message() {
        let gl8 = integrator(Gl8Settings::default());
        let err = gl8
            .step(&FailsAbove { limit: 1.0 }, &[0.99], 1.0)
            .expect_err("field should fail");
        match err {
            StepError::Evaluation { source, .. } => {
                assert!(source.to_string().contains("outside the model domain"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_finite_results_pass_through_unless_rejected() {
        let blow_up = from_fn(1, |x: &[f64], out: &mut [f64]| out[0] = x[0] * 1e300);
        let lenient = integrator(Gl8Settings::default());
        let outcome = lenient.step(&blow_up, &[1e300], 1.0).expect("step");
        assert!(!outcome.state[0].is_finite());
        assert!(!outcome.converged);

        let strict = integrator(Gl8Settings {
            reject_non_finite: true,
            ..Gl8Settings::default()
        });
        let err = strict.step(&blow_up, &[1e300], 1.0).expect_err("non-finite");
        assert!(matches!(err, StepError::NonFinite { index: 0 }));
    }

    #[test]
    fn free_function_matches_integrator() {
        let field = from_fn(2, |x: &[f64], out: &mut [f64]| {
            out[0] = x[1];
            out[1] = -x[0].sin();
        });
        let y = [0.5, 0.1];
        let direct = gl8_step(&y, &field, 0.01, 1e-18).expect("step");
        let held = integrator(Gl8Settings::default())
            .advance(&field, &y, 0.01)
            .expect("step");
        assert_eq!(direct, held);
    }

    #[test]
    fn double_double_step_reproduces_the_pade_stability_function() {
        type Dd = DoubleDouble;
        let num = |v: f64| Dd::new(v, 0.0);
        // GL8 applied to y' = -y is the (4,4) Pade approximant of exp(z).
        let p = |z: Dd| {
            Dd::ONE
                + z / num(2.0)
                + num(3.0) * z * z / num(28.0)
                + z * z * z / num(84.0)
                + z * z * z * z / num(1680.0)
        };
        let dt = num(0.1);
        let expected = p(-dt) / p(dt);

        let field = from_fn(1, |x: &[Dd], out: &mut [Dd]| out[0] = -x[0]);
        let gl8 = Gl8::<Dd>::new(Gl8Settings::reference().with_tolerance(1e-28)).expect("settings");
        let outcome = gl8.step(&field, &[Dd::ONE], dt).expect("step");
        assert!(outcome.converged);
        let err = (outcome.state[0] - expected).hi.abs();
        assert!(err < 1e-26, "error {err}");
    }
}
