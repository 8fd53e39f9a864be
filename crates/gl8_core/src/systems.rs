//! Reference vector fields with known invariants or closed-form solutions.

use crate::traits::{constant, Hamiltonian, Scalar, VectorField};
use anyhow::{bail, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Vector fields whose flow is known exactly.
pub trait ExactSolution<T: Scalar> {
    /// State at time `t` starting from `initial_state` at time zero.
    fn exact(&self, t: T, initial_state: &[T]) -> Vec<T>;
}

/// Planar pendulum, state `[theta, omega]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pendulum {
    pub gravity_over_length: f64,
}

impl Default for Pendulum {
    fn default() -> Self {
        Self {
            gravity_over_length: 1.0,
        }
    }
}

impl<T: Scalar> VectorField<T> for Pendulum {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, x: &[T], out: &mut [T]) -> Result<()> {
        let k = constant::<T>(self.gravity_over_length);
        out[0] = x[1];
        out[1] = -k * x[0].sin();
        Ok(())
    }
}

impl<T: Scalar> Hamiltonian<T> for Pendulum {
    /// 0.5 omega^2 + (g / L) (1 - cos theta)
    fn energy(&self, x: &[T]) -> T {
        let k = constant::<T>(self.gravity_over_length);
        constant::<T>(0.5) * x[1] * x[1] + k * (T::one() - x[0].cos())
    }
}

/// Harmonic oscillator x'' = -omega^2 x, state `[x, v]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicOscillator {
    pub omega: f64,
}

impl<T: Scalar> VectorField<T> for HarmonicOscillator {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, x: &[T], out: &mut [T]) -> Result<()> {
        let omega = constant::<T>(self.omega);
        out[0] = x[1];
        out[1] = -omega * omega * x[0];
        Ok(())
    }
}

impl<T: Scalar> Hamiltonian<T> for HarmonicOscillator {
    fn energy(&self, x: &[T]) -> T {
        let omega = constant::<T>(self.omega);
        constant::<T>(0.5) * (x[1] * x[1] + omega * omega * x[0] * x[0])
    }
}

impl<T: Scalar> ExactSolution<T> for HarmonicOscillator {
    fn exact(&self, t: T, initial_state: &[T]) -> Vec<T> {
        let omega = constant::<T>(self.omega);
        let (s, c) = (omega * t).sin_cos();
        let (x0, v0) = (initial_state[0], initial_state[1]);
        vec![x0 * c + v0 / omega * s, -x0 * omega * s + v0 * c]
    }
}

/// Linear system y' = M y.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    matrix: DMatrix<f64>,
}

impl LinearSystem {
    pub fn new(matrix: DMatrix<f64>) -> Result<Self> {
        if matrix.nrows() == 0 {
            bail!("Linear system matrix must not be empty.");
        }
        if !matrix.is_square() {
            bail!(
                "Linear system matrix must be square, got {}x{}.",
                matrix.nrows(),
                matrix.ncols()
            );
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            bail!("Linear system matrix must be finite.");
        }
        Ok(Self { matrix })
    }

    /// Builds the system from a row-major slice of a `dim x dim` matrix.
    pub fn from_row_slice(dim: usize, entries: &[f64]) -> Result<Self> {
        if entries.len() != dim * dim {
            bail!(
                "Expected {} matrix entries for dimension {}, got {}.",
                dim * dim,
                dim,
                entries.len()
            );
        }
        Self::new(DMatrix::from_row_slice(dim, dim, entries))
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

impl VectorField<f64> for LinearSystem {
    fn dimension(&self) -> usize {
        self.matrix.nrows()
    }

    fn apply(&self, x: &[f64], out: &mut [f64]) -> Result<()> {
        let n = self.matrix.nrows();
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..n {
                sum += self.matrix[(i, j)] * x[j];
            }
            out[i] = sum;
        }
        Ok(())
    }
}

impl ExactSolution<f64> for LinearSystem {
    /// exp(t M) y0 via nalgebra's Padé-based matrix exponential.
    fn exact(&self, t: f64, initial_state: &[f64]) -> Vec<f64> {
        let propagator = (&self.matrix * t).exp();
        let y = propagator * DVector::from_column_slice(initial_state);
        y.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ExactSolution, HarmonicOscillator, LinearSystem, Pendulum};
    use crate::double_double::DoubleDouble;
    use crate::traits::{Hamiltonian, VectorField};

    #[test]
    fn pendulum_field_and_energy() {
        let pendulum = Pendulum::default();
        let mut out = [0.0; 2];
        pendulum
            .apply(&[std::f64::consts::FRAC_PI_2, 0.3], &mut out)
            .expect("apply");
        assert_eq!(out, [0.3, -1.0]);
        let e: f64 = pendulum.energy(&[0.0, 2.0]);
        assert!((e - 2.0).abs() < 1e-15);
        let e: f64 = pendulum.energy(&[std::f64::consts::PI, 0.0]);
        assert!((e - 2.0).abs() < 1e-15);
    }

    #[test]
    fn pendulum_runs_in_double_double() {
        let pendulum = Pendulum {
            gravity_over_length: 4.0,
        };
        let x = [DoubleDouble::PI / DoubleDouble::new(6.0, 0.0), DoubleDouble::ZERO];
        let mut out = [DoubleDouble::ZERO; 2];
        pendulum.apply(&x, &mut out).expect("apply");
        let err = (out[1] + DoubleDouble::new(2.0, 0.0)).hi.abs();
        assert!(err < 1e-30, "error {err}");
    }

    #[test]
    fn oscillator_exact_solution_conserves_energy() {
        let oscillator = HarmonicOscillator { omega: 2.0 };
        let y0 = [1.0, 0.5];
        let e0: f64 = oscillator.energy(&y0);
        for t in [0.0, 0.3, 1.7, 12.5] {
            let y = oscillator.exact(t, &y0);
            let e: f64 = oscillator.energy(&y);
            assert!((e - e0).abs() < 1e-13);
        }
        assert_eq!(oscillator.exact(0.0, &y0), y0.to_vec());
    }

    #[test]
    fn linear_system_rejects_bad_matrices() {
        assert!(LinearSystem::from_row_slice(2, &[1.0, 2.0, 3.0]).is_err());
        assert!(LinearSystem::new(nalgebra::DMatrix::zeros(2, 3)).is_err());
        assert!(LinearSystem::from_row_slice(1, &[f64::NAN]).is_err());
    }

    #[test]
    fn linear_rotation_matches_oscillator() {
        let rotation = LinearSystem::from_row_slice(2, &[0.0, 1.0, -1.0, 0.0]).expect("matrix");
        let oscillator = HarmonicOscillator { omega: 1.0 };
        let y0 = [0.2, -0.4];
        let a = rotation.exact(2.5, &y0);
        let b = oscillator.exact(2.5, &y0);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-12);
        }
        let mut out = [0.0; 2];
        rotation.apply(&y0, &mut out).expect("apply");
        assert_eq!(out, [-0.4, -0.2]);
    }
}
