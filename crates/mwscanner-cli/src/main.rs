//! mwscanner CLI — antenna placement geometry from the command line.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use mwscanner::report::{ArraySummary, AxisReport, FitReport, PlanReport};
use mwscanner::{AntennaArray, AxisSelector, Ellipse, FitConfig, PlanConfig};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "mwscanner")]
#[command(about = "Place scanner antennas on a common enclosing ellipse or circle")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the minimum-volume enclosing ellipse of a point set.
    Fit(CliFitArgs),

    /// Intersect one antenna axis with a given ellipse.
    Solve(CliSolveArgs),

    /// Plan moves onto the enclosing ellipse of the current positions.
    PlanEllipse(CliPlanEllipseArgs),

    /// Plan moves onto a common circle outside the farthest antenna.
    PlanCircle(CliPlanCircleArgs),

    /// Print the antenna array description.
    ArrayInfo(CliArrayInfoArgs),
}

#[derive(Debug, Clone, Args)]
struct CliFitArgs {
    /// JSON file holding an array of [x, y] points (mm).
    #[arg(long)]
    points: PathBuf,

    /// Convergence tolerance on the weight update.
    #[arg(long, default_value = "1e-3")]
    tol: f64,

    /// Iteration cap.
    #[arg(long, default_value = "10000")]
    max_iters: usize,

    /// Number of boundary samples to include in the output.
    #[arg(long, default_value = "0")]
    samples: usize,

    /// Path to write the fit (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliSolveArgs {
    /// Shape matrix entry A₁₁.
    #[arg(long, allow_negative_numbers = true)]
    a: f64,
    /// Shape matrix entry A₁₂ = A₂₁.
    #[arg(long, allow_negative_numbers = true)]
    b: f64,
    /// Shape matrix entry A₂₂.
    #[arg(long, allow_negative_numbers = true)]
    c: f64,
    /// Ellipse center x (mm).
    #[arg(long, allow_negative_numbers = true)]
    cx: f64,
    /// Ellipse center y (mm).
    #[arg(long, allow_negative_numbers = true)]
    cy: f64,
    /// Axis angle in degrees.
    #[arg(long, allow_negative_numbers = true)]
    angle: f64,
    /// Selector index 0–7.
    #[arg(long)]
    selector: usize,
    /// Current antenna radius (mm) the delta is measured from.
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    reference: f64,
}

#[derive(Debug, Clone, Args)]
struct CliArrayArgs {
    /// Antenna array description (JSON). The built-in lab rig when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliArrayInfoArgs {
    #[command(flatten)]
    array: CliArrayArgs,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Args)]
struct CliPlanEllipseArgs {
    /// Current radial antenna positions in mm, comma separated, array order.
    #[arg(long, value_delimiter = ',', required = true)]
    positions: Vec<f64>,

    #[command(flatten)]
    array: CliArrayArgs,

    /// Convergence tolerance of the ellipse fit.
    #[arg(long, default_value = "1e-3")]
    tol: f64,

    /// Negative deltas above -SLACK mm are treated as zero moves.
    #[arg(long, default_value = "2.0")]
    negative_slack: f64,

    /// Path to write the plan (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliPlanCircleArgs {
    /// Current radial antenna positions in mm, comma separated, array order.
    #[arg(long, value_delimiter = ',', required = true)]
    positions: Vec<f64>,

    /// Gap between the farthest antenna and the circle (mm).
    #[arg(long)]
    distance: f64,

    #[command(flatten)]
    array: CliArrayArgs,

    /// Path to write the plan (JSON). Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl CliArrayArgs {
    fn load(&self) -> CliResult<AntennaArray> {
        match &self.config {
            Some(path) => {
                tracing::info!("Loading array description: {}", path.display());
                Ok(AntennaArray::from_json_file(path)?)
            }
            None => Ok(AntennaArray::default()),
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fit(args) => run_fit(&args),
        Commands::Solve(args) => run_solve(&args),
        Commands::PlanEllipse(args) => run_plan_ellipse(&args),
        Commands::PlanCircle(args) => run_plan_circle(&args),
        Commands::ArrayInfo(args) => run_array_info(&args),
    }
}

fn write_json<T: serde::Serialize>(value: &T, out: Option<&Path>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("Results written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn parse_points(data: &str) -> CliResult<Vec<[f64; 2]>> {
    let points: Vec<[f64; 2]> = serde_json::from_str(data)
        .map_err(|e| -> CliError { format!("points must be a JSON array of [x, y]: {}", e).into() })?;
    Ok(points)
}

// ── fit ────────────────────────────────────────────────────────────────

fn run_fit(args: &CliFitArgs) -> CliResult<()> {
    let data = std::fs::read_to_string(&args.points).map_err(|e| -> CliError {
        format!("Failed to read {}: {}", args.points.display(), e).into()
    })?;
    let points = parse_points(&data)?;
    tracing::info!("Fitting {} points", points.len());

    let config = FitConfig {
        tolerance: args.tol,
        max_iters: args.max_iters,
        ..FitConfig::default()
    };
    let fit = mwscanner::fit_enclosing_ellipse_with(&points, &config)?;
    let axes = fit.ellipse.axes();
    tracing::info!(
        "Ellipse center=({:.3}, {:.3}) semi-axes=({:.3}, {:.3}) after {} iterations",
        axes.cx,
        axes.cy,
        axes.a,
        axes.b,
        fit.iterations,
    );

    let mut report = FitReport::from(&fit);
    report.boundary_samples = fit.ellipse.sample_points(args.samples);
    write_json(&report, args.out.as_deref())
}

// ── solve ──────────────────────────────────────────────────────────────

fn run_solve(args: &CliSolveArgs) -> CliResult<()> {
    let ellipse = Ellipse::from_coeffs(args.a, args.b, args.c, args.cx, args.cy)?;
    let selector = AxisSelector::from_index(args.selector)?;
    let axis = mwscanner::solve_axis(&ellipse, args.angle, selector, args.reference)?;
    if axis.fallback {
        tracing::warn!("Selector {} fell back to the second root", args.selector);
    }
    write_json(&AxisReport::from(&axis), None)
}

// ── plan-ellipse ───────────────────────────────────────────────────────

fn run_plan_ellipse(args: &CliPlanEllipseArgs) -> CliResult<()> {
    let array = args.array.load()?;
    let config = PlanConfig {
        fit: FitConfig {
            tolerance: args.tol,
            ..FitConfig::default()
        },
        negative_slack_mm: args.negative_slack,
    };
    let plan = mwscanner::plan_ellipse(&array, &args.positions, &config)?;
    let n_clamped = plan.moves.iter().filter(|m| m.clamped).count();
    tracing::info!("Planned {} moves ({} clamped)", plan.moves.len(), n_clamped);
    write_json(&PlanReport::from(&plan), args.out.as_deref())
}

// ── plan-circle ────────────────────────────────────────────────────────

fn run_plan_circle(args: &CliPlanCircleArgs) -> CliResult<()> {
    let array = args.array.load()?;
    let plan = mwscanner::plan_circle(&array, &args.positions, args.distance)?;
    tracing::info!(
        "Planned circle of radius {:.2} mm{}",
        plan.target_radius_mm,
        if plan.capped { " (capped)" } else { "" }
    );
    write_json(&PlanReport::from(&plan), args.out.as_deref())
}

// ── array-info ─────────────────────────────────────────────────────────

fn run_array_info(args: &CliArrayInfoArgs) -> CliResult<()> {
    let array = args.array.load()?;
    if args.json {
        return write_json(&ArraySummary::from(&array), None);
    }

    println!("mwscanner antenna array");
    println!("  name:            {}", array.name);
    println!("  antennas:        {}", array.len());
    println!("  steps per mm:    {}", array.steps_per_mm);
    println!("  max circle:      {} mm", array.min_home_radius_mm());
    for a in array.antennas() {
        println!(
            "  antenna {}:       {:>5.1}°  travel {:.1}–{:.1} mm",
            a.id,
            a.angle_deg,
            a.inner_radius_mm(),
            a.home_radius_mm
        );
    }

    Ok(())
}
