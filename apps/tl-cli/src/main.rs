use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tl_app::{
    AppResult, LoopMetrics, RunOptions, RunProgressEvent, RunReport, RunStage, record_to_csv,
    record_to_json, run_service,
};
use tl_project::schema::{ClockDef, Scenario};
use tracing::debug;

#[derive(Parser)]
#[command(name = "thermoloop")]
#[command(about = "Thermoloop CLI - closed-loop PID temperature regulation simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario (the built-in water boiler when no file is given)
    Run {
        /// Path to a scenario YAML or JSON file
        scenario_path: Option<PathBuf>,
        /// Override the run duration in seconds
        #[arg(long)]
        duration: Option<f64>,
        /// Override the logical clock step in seconds
        #[arg(long, conflicts_with = "wall_clock")]
        step: Option<f64>,
        /// Run against the real clock instead of logical time
        #[arg(long)]
        wall_clock: bool,
        /// Sleep after every iteration in wall-clock mode (milliseconds)
        #[arg(long, default_value_t = 5, requires = "wall_clock")]
        pace_ms: u64,
        /// Print every sample as it is produced
        #[arg(long)]
        telemetry: bool,
        /// Export the trajectory in this format
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
        /// Export file path (optional, defaults to stdout)
        #[arg(short, long, requires = "format")]
        output: Option<PathBuf>,
    },
    /// Validate scenario file syntax and values
    Validate {
        /// Path to the scenario file
        scenario_path: PathBuf,
    },
    /// Print the built-in water boiler scenario as YAML
    Init {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

struct RunArgs {
    scenario_path: Option<PathBuf>,
    duration: Option<f64>,
    step: Option<f64>,
    wall_clock: bool,
    pace_ms: u64,
    telemetry: bool,
    format: Option<ExportFormat>,
    output: Option<PathBuf>,
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario_path,
            duration,
            step,
            wall_clock,
            pace_ms,
            telemetry,
            format,
            output,
        } => cmd_run(RunArgs {
            scenario_path,
            duration,
            step,
            wall_clock,
            pace_ms,
            telemetry,
            format,
            output,
        }),
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Init { output } => cmd_init(output.as_deref()),
    }
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = tl_project::load_scenario(scenario_path)?;
    println!("✓ Scenario '{}' is valid", scenario.name);
    Ok(())
}

fn cmd_init(output: Option<&Path>) -> AppResult<()> {
    let scenario = Scenario::default();
    match output {
        Some(path) => {
            tl_project::save_yaml(path, &scenario)?;
            println!("✓ Wrote scenario '{}' to {}", scenario.name, path.display());
        }
        None => print!("{}", tl_project::to_yaml_string(&scenario)?),
    }
    Ok(())
}

fn cmd_run(args: RunArgs) -> AppResult<()> {
    let scenario = match &args.scenario_path {
        Some(path) => tl_project::load_scenario(path)?,
        None => Scenario::default(),
    };

    let clock = if args.wall_clock {
        Some(ClockDef::WallClock {
            pace_ms: args.pace_ms,
        })
    } else {
        args.step.map(|step_s| ClockDef::Logical { step_s })
    };
    let options = RunOptions {
        duration_s: args.duration,
        clock,
    };
    debug!(?options, "run options");

    eprintln!("Running scenario: {}", scenario.name);
    if args.telemetry {
        println!(
            "{:>10}  {:>11}  {:>8}  {:>10}  {:>10}  {:>10}  {:>10}",
            "time_s", "measurement", "setpoint", "output", "p", "i", "d"
        );
    }

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let report = run_service::run_scenario_with_progress(
        &scenario,
        &options,
        Some(&mut |event: RunProgressEvent| {
            if args.telemetry {
                if let Some(p) = &event.loop_progress {
                    println!(
                        "{:>10.3}  {:>11.1}  {:>8.1}  {:>10.3}  {:>10.3}  {:>10.3}  {:>10.3}",
                        p.sim_time_s,
                        p.measurement,
                        p.setpoint,
                        p.output,
                        p.terms.proportional,
                        p.terms.integral,
                        p.terms.derivative
                    );
                }
                return;
            }
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    if !args.telemetry {
        clear_progress_line();
    }

    print_summary(&report);

    if let Some(format) = args.format {
        let content = match format {
            ExportFormat::Csv => record_to_csv(&report.record),
            ExportFormat::Json => record_to_json(&report.record)?,
        };
        match &args.output {
            Some(path) => {
                std::fs::write(path, content)?;
                eprintln!(
                    "✓ Exported {} samples to {}",
                    report.record.len(),
                    path.display()
                );
            }
            None => print!("{}", content),
        }
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    let record = &report.record;
    eprintln!("✓ Simulation completed");
    eprintln!("  Samples: {}", record.len());
    if record.degenerate_steps > 0 {
        eprintln!("  Degenerate time steps: {}", record.degenerate_steps);
    }
    eprintln!("  Setpoint changes applied: {}", record.setpoint_changes_applied);
    if let Some(last) = record.last() {
        eprintln!(
            "  Final: t={:.3}s  measurement={:.1}  setpoint={:.1}  output={:.3}",
            last.elapsed, last.measurement, last.setpoint, last.output
        );
    }
    print_metrics(&report.metrics);
    eprintln!(
        "  Timing: compile={:.3}s  run={:.3}s  total={:.3}s",
        report.timing.compile_time_s, report.timing.run_time_s, report.timing.total_time_s
    );
}

fn print_metrics(metrics: &LoopMetrics) {
    if !metrics.has_data() {
        return;
    }
    let rows = [
        ("Rise time 10%", metrics.rise_time_10_s, "s"),
        ("Rise time 90%", metrics.rise_time_90_s, "s"),
        ("Settling time 2%", metrics.settling_time_2pct_s, "s"),
        ("Overshoot", metrics.overshoot_pct, "%"),
        ("Steady-state error", metrics.steady_state_error, ""),
        ("Peak measurement", metrics.peak_measurement, ""),
        ("Max output", metrics.max_controller_output, ""),
        ("Saturated high", metrics.saturation_pct_upper, "%"),
        ("Saturated low", metrics.saturation_pct_lower, "%"),
    ];
    eprintln!("  Loop metrics:");
    for (label, value, unit) in rows {
        if let Some(v) = value {
            eprintln!("    {:<20} {:.3}{}", label, v, unit);
        }
    }
}

fn clear_progress_line() {
    eprint!("\r{}\r", " ".repeat(100));
    let _ = io::stderr().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (&event.stage, &event.loop_progress) {
        (RunStage::Running, Some(p)) => {
            let width = 28usize;
            let filled = ((p.fraction_complete * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            eprint!(
                "\r[{}] {:>6.2}%  t={:.3}/{:.3}s  pv={:.1}  sp={:.1}  elapsed={:.1}s",
                bar,
                p.fraction_complete * 100.0,
                p.sim_time_s,
                p.duration_s,
                p.measurement,
                p.setpoint,
                event.elapsed_wall_s
            );
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(message) = &event.message {
                line.push_str(&format!("  {}", message));
            }
            eprint!("{}", line);
        }
    }
    let _ = io::stderr().flush();
}
