use std::sync::Arc;
use std::thread;

use gl8_core::diagnostics::energy_report;
use gl8_core::propagate::propagate;
use gl8_core::systems::{ExactSolution, HarmonicOscillator, Pendulum};
use gl8_core::traits::from_fn;
use gl8_core::{gl8_step, DoubleDouble, Gl8, Gl8Settings};
use num_traits::Float;
use proptest::prelude::*;

type Dd = DoubleDouble;

fn dd(value: f64) -> Dd {
    Dd::new(value, 0.0)
}

#[test]
fn pendulum_energy_is_conserved_in_double_double() {
    let gl8 = Gl8::<Dd>::new(Gl8Settings::default()).expect("settings");
    let y0 = [Dd::PI / dd(6.0), dd(0.1)];
    let trajectory =
        propagate(&gl8, &Pendulum::default(), &y0, dd(0.01), 3000, 100).expect("propagate");

    assert_eq!(trajectory.stats.unconverged_steps, 0);
    let report = energy_report(&trajectory, &Pendulum::default()).expect("report");
    assert!(
        report.max_abs_drift < 1e-14,
        "energy drift {:e}",
        report.max_abs_drift
    );
    assert!(report.drift_slope.abs() < 1e-15);
}

#[test]
fn pendulum_energy_is_bounded_in_f64() {
    let gl8 = Gl8::<f64>::new(Gl8Settings::default()).expect("settings");
    let y0 = [std::f64::consts::FRAC_PI_6, 0.1];
    let trajectory =
        propagate(&gl8, &Pendulum::default(), &y0, 0.01, 3000, 10).expect("propagate");
    let report = energy_report(&trajectory, &Pendulum::default()).expect("report");
    assert!(report.max_abs_drift < 1e-12, "energy drift {:e}", report.max_abs_drift);
}

#[test]
fn double_double_tracks_the_oscillator_beyond_f64() {
    let oscillator = HarmonicOscillator { omega: 1.0 };
    let settings = Gl8Settings::reference().with_tolerance(1e-28);
    let gl8 = Gl8::<Dd>::new(settings).expect("settings");
    let y0 = [Dd::ONE, Dd::ZERO];
    let trajectory = propagate(&gl8, &oscillator, &y0, dd(0.0625), 16, 16).expect("propagate");
    let last = trajectory.final_state().expect("final state");
    let exact = oscillator.exact(Dd::ONE, &y0);
    for (a, b) in last.iter().zip(&exact) {
        let err = (*a - *b).abs().hi;
        assert!(err < 1e-18, "error {err:e}");
    }
}

#[test]
fn integrator_is_shared_across_threads() {
    let gl8 = Arc::new(Gl8::<f64>::new(Gl8Settings::default()).expect("settings"));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let gl8 = Arc::clone(&gl8);
            thread::spawn(move || {
                let y0 = [0.1 * (i as f64 + 1.0), 0.0];
                gl8.advance(&Pendulum::default(), &y0, 0.05).expect("step")
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let y0 = [0.1 * (i as f64 + 1.0), 0.0];
        let expected = gl8.advance(&Pendulum::default(), &y0, 0.05).expect("step");
        assert_eq!(handle.join().expect("thread"), expected);
    }
}

proptest! {
    #[test]
    fn step_preserves_dimension(
        state in prop::collection::vec(-2.0f64..2.0, 1..6),
        dt in -0.2f64..0.2,
    ) {
        let n = state.len();
        // Weakly coupled linear chain, contractive for |dt| < 0.2.
        let field = from_fn(n, move |x: &[f64], out: &mut [f64]| {
            for i in 0..n {
                out[i] = -x[i] + 0.5 * x[(i + 1) % n];
            }
        });
        let next = gl8_step(&state, &field, dt, 1e-18).expect("step");
        prop_assert_eq!(next.len(), n);
        prop_assert!(next.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_step_is_the_identity(
        theta in -3.0f64..3.0,
        omega in -3.0f64..3.0,
    ) {
        let next = gl8_step(&[theta, omega], &Pendulum::default(), 0.0, 1e-18).expect("step");
        prop_assert_eq!(next, vec![theta, omega]);
    }
}
