use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gl8_core::convergence::{convergence_study, ConvergenceStudy};
use gl8_core::diagnostics::{energy_report, EnergyReport};
use gl8_core::propagate::{propagate, PropagationStats};
use gl8_core::systems::{HarmonicOscillator, Pendulum};
use gl8_core::{DoubleDouble, Gl8, Gl8Settings, Scalar};
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gl8")]
#[command(about = "GL8 - Gauss-Legendre implicit Runge-Kutta integrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Integrate the planar pendulum and report energy drift
    Pendulum(PendulumArgs),
    /// Measure the empirical order of accuracy on the harmonic oscillator
    Convergence(ConvergenceArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
enum Precision {
    F64,
    DoubleDouble,
}

#[derive(clap::Args)]
struct PendulumArgs {
    /// Initial angle in radians (defaults to pi/6 at full working precision)
    #[arg(long)]
    theta0: Option<String>,
    /// Initial angular velocity
    #[arg(long, default_value = "0.1")]
    omega0: String,
    /// Time step
    #[arg(long, default_value = "0.01")]
    dt: String,
    /// End time
    #[arg(long, default_value_t = 1000.0)]
    t_end: f64,
    #[arg(long, value_enum, default_value_t = Precision::DoubleDouble)]
    precision: Precision,
    /// JSON file with integrator settings
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Override the fixed-point iteration bound
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Override the fixed-point tolerance
    #[arg(long)]
    tolerance: Option<f64>,
    /// Record every k-th step
    #[arg(long, default_value_t = 100)]
    stride: usize,
    /// Output CSV file path (optional, defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ConvergenceArgs {
    /// Coarsest time step; each level halves it
    #[arg(long, default_value_t = 1.0)]
    dt0: f64,
    #[arg(long, default_value_t = 4)]
    levels: usize,
    #[arg(long, default_value_t = 10.0)]
    t_end: f64,
    #[arg(long, value_enum, default_value_t = Precision::F64)]
    precision: Precision,
    /// JSON file with integrator settings
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Serialize)]
struct PendulumSummary {
    precision: Precision,
    dt: f64,
    steps: usize,
    final_time: f64,
    settings: Gl8Settings,
    stats: PropagationStats,
    energy: EnergyReport,
}

#[derive(Serialize)]
struct ConvergenceSummary {
    precision: Precision,
    t_end: f64,
    settings: Gl8Settings,
    study: ConvergenceStudy,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pendulum(args) => cmd_pendulum(&args),
        Commands::Convergence(args) => cmd_convergence(&args),
    }
}

fn load_settings(path: Option<&Path>) -> Result<Gl8Settings> {
    let Some(path) = path else {
        return Ok(Gl8Settings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}.", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse settings file {}.", path.display()))
}

fn step_count(t_end: f64, dt: f64) -> Result<usize> {
    if !(dt.is_finite() && dt > 0.0) {
        bail!("dt must be positive and finite.");
    }
    if !(t_end.is_finite() && t_end > 0.0) {
        bail!("t_end must be positive and finite.");
    }
    let steps = (t_end / dt).round();
    if steps < 1.0 {
        bail!("t_end must cover at least one step of size {}.", dt);
    }
    Ok(steps as usize)
}

fn cmd_pendulum(args: &PendulumArgs) -> Result<()> {
    let mut settings = load_settings(args.settings.as_deref())?;
    if let Some(max_iterations) = args.max_iterations {
        settings = settings.with_max_iterations(max_iterations);
    }
    if let Some(tolerance) = args.tolerance {
        settings = settings.with_tolerance(tolerance);
    }

    match args.precision {
        Precision::F64 => run_pendulum::<f64>(args, settings),
        Precision::DoubleDouble => run_pendulum::<DoubleDouble>(args, settings),
    }
}

fn parse_scalar<T>(name: &str, text: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    text.trim()
        .parse::<T>()
        .with_context(|| format!("Invalid {}: \"{}\".", name, text))
}

fn run_pendulum<T>(args: &PendulumArgs, settings: Gl8Settings) -> Result<()>
where
    T: Scalar + Display + FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let theta0: T = match &args.theta0 {
        Some(text) => parse_scalar("theta0", text)?,
        None => {
            let six = T::from_f64(6.0).context("Scalar type cannot represent 6.")?;
            let four = T::from_f64(4.0).context("Scalar type cannot represent 4.")?;
            T::one().atan() * four / six
        }
    };
    let omega0: T = parse_scalar("omega0", &args.omega0)?;
    let dt: T = parse_scalar("dt", &args.dt)?;
    let dt_f64 = dt.to_f64().context("dt is not representable as f64.")?;
    let steps = step_count(args.t_end, dt_f64)?;

    info!(
        precision = ?args.precision,
        steps,
        dt = dt_f64,
        max_iterations = settings.max_iterations,
        tolerance = settings.tolerance,
        "integrating pendulum"
    );

    let pendulum = Pendulum::default();
    let integrator = Gl8::<T>::new(settings)?;
    let trajectory = propagate(
        &integrator,
        &pendulum,
        &[theta0, omega0],
        dt,
        steps,
        args.stride,
    )?;
    let report = energy_report(&trajectory, &pendulum)?;

    // Build CSV
    let mut csv = String::from("t,theta,omega,delta_e\n");
    for ((t, state), delta_e) in trajectory
        .times
        .iter()
        .zip(&trajectory.states)
        .zip(&report.drift)
    {
        csv.push_str(&format!("{},{},{},{:e}\n", t, state[0], state[1], delta_e));
    }

    let final_time = trajectory
        .final_time()
        .and_then(|t| t.to_f64())
        .context("Trajectory has no final time.")?;
    let summary = PendulumSummary {
        precision: args.precision,
        dt: trajectory.dt.to_f64().unwrap_or(dt_f64),
        steps,
        final_time,
        settings,
        stats: trajectory.stats.clone(),
        energy: report.summary(),
    };

    if let Some(path) = &args.output {
        std::fs::write(path, csv)
            .with_context(|| format!("Failed to write {}.", path.display()))?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", csv);
        info!(
            final_time = summary.final_time,
            max_abs_drift = summary.energy.max_abs_drift,
            final_drift = summary.energy.final_drift,
            drift_slope = summary.energy.drift_slope,
            unconverged_steps = summary.stats.unconverged_steps,
            "pendulum run finished"
        );
    }
    Ok(())
}

fn cmd_convergence(args: &ConvergenceArgs) -> Result<()> {
    let settings = match &args.settings {
        Some(path) => load_settings(Some(path.as_path()))?,
        None => Gl8Settings::reference(),
    };
    let base_steps = step_count(args.t_end, args.dt0)?;
    let oscillator = HarmonicOscillator { omega: 1.0 };

    info!(
        precision = ?args.precision,
        base_steps,
        levels = args.levels,
        "running convergence study"
    );

    let study = match args.precision {
        Precision::F64 => convergence_study::<f64, _>(
            settings,
            &oscillator,
            &[1.0, 0.0],
            args.t_end,
            base_steps,
            args.levels,
        )?,
        Precision::DoubleDouble => convergence_study(
            settings,
            &oscillator,
            &[DoubleDouble::ONE, DoubleDouble::ZERO],
            args.t_end,
            base_steps,
            args.levels,
        )?,
    };

    let summary = ConvergenceSummary {
        precision: args.precision,
        t_end: args.t_end,
        settings,
        study,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
