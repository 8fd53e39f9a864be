//! Butcher tableau of the 4-stage Gauss-Legendre collocation method.
//!
//! The coefficients are built from closed-form expressions in sqrt(30) and
//! sqrt((15 +- 2 sqrt(30)) / 35), evaluated in the scalar type itself so that
//! an extended precision scalar gets extended precision coefficients.
//!
//! Reference: Hairer, E., Nørsett, S.P., & Wanner, G. (1993). "Solving
//! Ordinary Differential Equations I", Section II.7, Table 7.4.

use crate::traits::{constant, Scalar};

/// Number of stages.
pub const STAGES: usize = 4;

/// Classical order of the method.
pub const ORDER: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tableau<T> {
    /// Runge-Kutta matrix a_ij.
    pub a: [[T; STAGES]; STAGES],
    /// Quadrature weights b_i.
    pub b: [T; STAGES],
    /// Nodes c_i, the row sums of `a`.
    pub c: [T; STAGES],
}

fn ratio<T: Scalar>(num: f64, den: f64) -> T {
    constant::<T>(num) / constant::<T>(den)
}

impl<T: Scalar> Tableau<T> {
    pub fn gauss_legendre() -> Self {
        let two = constant::<T>(2.0);
        let sqrt30 = constant::<T>(30.0).sqrt();

        let w1p = ratio::<T>(1.0, 8.0) + sqrt30 / constant::<T>(144.0);
        let w1m = ratio::<T>(1.0, 8.0) - sqrt30 / constant::<T>(144.0);
        let w2p = ((constant::<T>(15.0) + two * sqrt30) / constant::<T>(35.0)).sqrt() / two;
        let w2m = ((constant::<T>(15.0) - two * sqrt30) / constant::<T>(35.0)).sqrt() / two;
        let w3p = (ratio::<T>(1.0, 6.0) + sqrt30 / constant::<T>(24.0)) * w2p;
        let w3m = (ratio::<T>(1.0, 6.0) - sqrt30 / constant::<T>(24.0)) * w2m;
        let w4p = (ratio::<T>(1.0, 21.0) + constant::<T>(5.0) * sqrt30 / constant::<T>(168.0)) * w2p;
        let w4m = (ratio::<T>(1.0, 21.0) - constant::<T>(5.0) * sqrt30 / constant::<T>(168.0)) * w2m;
        let w5p = w2p - two * w3p;
        let w5m = w2m - two * w3m;

        let a = [
            [w1m, w1p - w3p + w4m, w1p - w3p - w4m, w1m - w5p],
            [w1m - w3m + w4p, w1p, w1p - w5m, w1m - w3m - w4p],
            [w1m + w3m + w4p, w1p + w5m, w1p, w1m + w3m - w4p],
            [w1m + w5p, w1p + w3p + w4m, w1p + w3p - w4m, w1m],
        ];
        let b = [two * w1m, two * w1p, two * w1p, two * w1m];
        let c = a.map(|row| row.iter().fold(T::zero(), |acc, &v| acc + v));

        Self { a, b, c }
    }

    /// Largest violation of the quadrature conditions
    /// sum_i b_i c_i^(k-1) = 1/k for k = 1..=8.
    pub fn quadrature_defect(&self) -> T {
        let mut worst = T::zero();
        for k in 1..=usize::from(ORDER) {
            let mut sum = T::zero();
            for i in 0..STAGES {
                sum = sum + self.b[i] * self.c[i].powi(k as i32 - 1);
            }
            let defect = (sum - ratio::<T>(1.0, k as f64)).abs();
            worst = worst.max(defect);
        }
        worst
    }

    /// Largest violation of the collocation conditions
    /// sum_j a_ij c_j^(k-1) = c_i^k / k for k = 1..=4.
    pub fn collocation_defect(&self) -> T {
        let mut worst = T::zero();
        for k in 1..=STAGES {
            for i in 0..STAGES {
                let mut sum = T::zero();
                for j in 0..STAGES {
                    sum = sum + self.a[i][j] * self.c[j].powi(k as i32 - 1);
                }
                let expected = self.c[i].powi(k as i32) / constant::<T>(k as f64);
                worst = worst.max((sum - expected).abs());
            }
        }
        worst
    }
}
