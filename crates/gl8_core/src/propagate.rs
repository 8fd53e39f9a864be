use crate::{
    integrator::Gl8,
    traits::{constant, Scalar, VectorField},
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropagationStats {
    pub steps: usize,
    /// Steps whose fixed-point loop hit `max_iterations` without converging.
    pub unconverged_steps: usize,
    pub total_iterations: usize,
    pub max_iterations_used: usize,
    pub max_residual: f64,
}

/// States sampled from a fixed-step run starting at t = 0.
#[derive(Debug, Clone)]
pub struct Trajectory<T> {
    pub dt: T,
    pub times: Vec<T>,
    pub states: Vec<Vec<T>>,
    pub stats: PropagationStats,
}

impl<T: Scalar> Trajectory<T> {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn final_state(&self) -> Option<&[T]> {
        self.states.last().map(|s| s.as_slice())
    }

    pub fn final_time(&self) -> Option<T> {
        self.times.last().copied()
    }
}

/// Repeatedly applies `integrator` for `steps` steps of size `dt`.
///
/// The initial state and every `stride`-th state are recorded, and the final
/// state is always recorded.
pub fn propagate<T, F>(
    integrator: &Gl8<T>,
    field: &F,
    initial_state: &[T],
    dt: T,
    steps: usize,
    stride: usize,
) -> Result<Trajectory<T>>
where
    T: Scalar,
    F: VectorField<T> + ?Sized,
{
    if initial_state.is_empty() {
        bail!("Initial state must not be empty.");
    }
    if initial_state.len() != field.dimension() {
        bail!(
            "Initial state dimension mismatch. Expected {}, got {}.",
            field.dimension(),
            initial_state.len()
        );
    }
    if initial_state.iter().any(|v| !v.is_finite()) {
        bail!("Initial state must be finite.");
    }
    if steps == 0 {
        bail!("Propagation requires at least one integration step.");
    }
    if stride == 0 {
        bail!("Sampling stride must be greater than zero.");
    }
    if !dt.is_finite() {
        bail!("dt must be finite.");
    }

    let capacity = steps / stride + 2;
    let mut times = Vec::with_capacity(capacity);
    let mut states = Vec::with_capacity(capacity);
    times.push(T::zero());
    states.push(initial_state.to_vec());

    let mut stats = PropagationStats::default();
    let mut state = initial_state.to_vec();

    for i in 1..=steps {
        let outcome = integrator
            .step(field, &state, dt)
            .with_context(|| format!("GL8 step {} of {} failed.", i, steps))?;

        stats.steps += 1;
        stats.total_iterations += outcome.iterations;
        stats.max_iterations_used = stats.max_iterations_used.max(outcome.iterations);
        if !outcome.converged {
            stats.unconverged_steps += 1;
        }
        let residual = outcome.residual.to_f64().unwrap_or(f64::NAN);
        if residual.is_nan() || residual > stats.max_residual {
            stats.max_residual = residual;
        }

        state = outcome.state;
        if i % stride == 0 || i == steps {
            times.push(constant::<T>(i as f64) * dt);
            states.push(state.clone());
        }
    }

    debug!(
        steps = stats.steps,
        samples = states.len(),
        mean_iterations = stats.total_iterations as f64 / stats.steps as f64,
        max_iterations_used = stats.max_iterations_used,
        "GL8 propagation finished"
    );
    if stats.unconverged_steps > 0 {
        warn!(
            unconverged = stats.unconverged_steps,
            steps = stats.steps,
            max_residual = stats.max_residual,
            tolerance = integrator.settings().tolerance,
            "fixed-point iteration exhausted its bound on some steps"
        );
    }

    Ok(Trajectory {
        dt,
        times,
        states,
        stats,
    })
}
