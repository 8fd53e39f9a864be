use crate::{
    propagate::Trajectory,
    traits::{Hamiltonian, Scalar},
};
use anyhow::{bail, Result};
use serde::Serialize;

/// Energy error along a trajectory, E(t) - E(0).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyReport {
    pub initial_energy: f64,
    pub max_abs_drift: f64,
    pub final_drift: f64,
    /// Least-squares slope of the drift against time. Near zero for bounded
    /// oscillation, comparable to `max_abs_drift / t_end` for secular growth.
    pub drift_slope: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub drift: Vec<f64>,
}

impl EnergyReport {
    /// Drops the per-sample series, keeping the summary numbers.
    pub fn summary(&self) -> Self {
        Self {
            drift: Vec::new(),
            ..self.clone()
        }
    }
}

pub fn energy_report<T, H>(trajectory: &Trajectory<T>, system: &H) -> Result<EnergyReport>
where
    T: Scalar,
    H: Hamiltonian<T> + ?Sized,
{
    let Some(first) = trajectory.states.first() else {
        bail!("Trajectory has no samples.");
    };
    if trajectory.times.len() != trajectory.states.len() {
        bail!(
            "Trajectory has {} times but {} states.",
            trajectory.times.len(),
            trajectory.states.len()
        );
    }

    let e0 = system.energy(first);
    // Subtract in the scalar type so extended precision drift survives.
    let drift: Vec<f64> = trajectory
        .states
        .iter()
        .map(|state| to_f64(system.energy(state) - e0))
        .collect();
    let times: Vec<f64> = trajectory.times.iter().map(|&t| to_f64(t)).collect();

    let max_abs_drift = drift.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
    let final_drift = drift.last().copied().unwrap_or(0.0);

    Ok(EnergyReport {
        initial_energy: to_f64(e0),
        max_abs_drift,
        final_drift,
        drift_slope: least_squares_slope(&times, &drift),
        drift,
    })
}

fn to_f64<T: Scalar>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

fn least_squares_slope(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        sxy += dx * (y[i] - mean_y);
        sxx += dx * dx;
    }
    if sxx == 0.0 {
        0.0
    } else {
        sxy / sxx
    }
}
