use crate::{
    integrator::{Gl8, Gl8Settings},
    propagate::propagate,
    systems::ExactSolution,
    traits::{constant, Scalar, VectorField},
};
use anyhow::{bail, Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceLevel {
    pub dt: f64,
    pub steps: usize,
    /// Max-norm global error at `t_end`.
    pub error: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvergenceStudy {
    pub levels: Vec<ConvergenceLevel>,
    /// log2(e_k / e_{k+1}) between consecutive halvings of dt.
    pub observed_orders: Vec<f64>,
}

impl ConvergenceStudy {
    pub fn final_order(&self) -> Option<f64> {
        self.observed_orders.last().copied()
    }
}

/// Integrates to `t_end` with `base_steps * 2^k` steps for k in 0..levels and
/// measures the global error against the exact flow.
pub fn convergence_study<T, S>(
    settings: Gl8Settings,
    system: &S,
    initial_state: &[T],
    t_end: f64,
    base_steps: usize,
    levels: usize,
) -> Result<ConvergenceStudy>
where
    T: Scalar,
    S: VectorField<T> + ExactSolution<T>,
{
    if !(t_end.is_finite() && t_end > 0.0) {
        bail!("t_end must be positive and finite.");
    }
    if base_steps == 0 {
        bail!("base_steps must be greater than zero.");
    }
    if levels < 2 {
        bail!("A convergence study needs at least two levels.");
    }
    if initial_state.is_empty() {
        bail!("Initial state must not be empty.");
    }
    if initial_state.len() != system.dimension() {
        bail!(
            "Initial state dimension mismatch. Expected {}, got {}.",
            system.dimension(),
            initial_state.len()
        );
    }

    let integrator = Gl8::<T>::new(settings)?;
    let t_end_scalar = constant::<T>(t_end);
    let exact = system.exact(t_end_scalar, initial_state);

    let mut results = Vec::with_capacity(levels);
    for level in 0..levels {
        let steps = base_steps
            .checked_shl(level as u32)
            .filter(|s| s >> level == base_steps)
            .context("Step count overflow in convergence study.")?;
        let dt = t_end_scalar / constant::<T>(steps as f64);
        let trajectory = propagate(&integrator, system, initial_state, dt, steps, steps)
            .with_context(|| format!("Convergence level {} ({} steps) failed.", level, steps))?;
        let final_state = trajectory
            .final_state()
            .context("Propagation returned no final state.")?;
        let error = final_state
            .iter()
            .zip(&exact)
            .map(|(a, b)| (*a - *b).abs().to_f64().unwrap_or(f64::NAN))
            .fold(0.0_f64, f64::max);
        results.push(ConvergenceLevel {
            dt: dt.to_f64().unwrap_or(f64::NAN),
            steps,
            error,
        });
    }

    let observed_orders = results
        .windows(2)
        .map(|pair| (pair[0].error / pair[1].error).log2())
        .collect();

    Ok(ConvergenceStudy {
        levels: results,
        observed_orders,
    })
}
