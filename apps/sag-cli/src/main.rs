use clap::{Parser, Subcommand, ValueEnum};
use sag_app::{
    AppResult, ExportFormat, RunProgressEvent, RunRequest, RunStage, RunSummary, project_service,
    run_service,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sag-cli")]
#[command(about = "SAG mill mass and grade balance simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file
    Validate {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
    },
    /// Print the built-in plant defaults as a scenario file
    Defaults {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a scenario
    Run {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
        /// Simulated hours, overriding the scenario duration
        #[arg(long)]
        hours: Option<f64>,
        /// Export the recorded history to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// History export format
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        /// Do not draw the progress bar
        #[arg(long)]
        quiet: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => ExportFormat::Csv,
            Format::Json => ExportFormat::Json,
        }
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Defaults { output } => cmd_defaults(output.as_deref()),
        Commands::Run {
            scenario_path,
            hours,
            output,
            format,
            quiet,
        } => cmd_run(&scenario_path, hours, output.as_deref(), format, quiet),
    }
}

fn cmd_validate(scenario_path: &Path) -> AppResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let scenario = project_service::load_scenario(scenario_path)?;
    project_service::validate_scenario(&scenario)?;
    println!("✓ Scenario is valid");
    println!("  Name: {}", scenario.name);
    println!("  Duration: {} h", scenario.duration_h);
    println!("  Events: {}", scenario.events.len());
    Ok(())
}

fn cmd_defaults(output: Option<&Path>) -> AppResult<()> {
    let yaml = project_service::default_scenario_yaml()?;
    if let Some(path) = output {
        std::fs::write(path, yaml)?;
        println!("✓ Wrote default scenario to {}", path.display());
    } else {
        print!("{}", yaml);
    }
    Ok(())
}

fn cmd_run(
    scenario_path: &Path,
    hours: Option<f64>,
    output: Option<&Path>,
    format: Format,
    quiet: bool,
) -> AppResult<()> {
    let scenario = project_service::load_scenario(scenario_path)?;
    println!("Running scenario: {}", scenario.name);

    let request = RunRequest {
        scenario: &scenario,
        duration_h: hours,
    };

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let response = run_service::run_scenario_with_progress(
        &request,
        Some(&mut |event| {
            if quiet {
                return;
            }
            let fraction = event
                .progress
                .as_ref()
                .map(|p| p.fraction_complete)
                .unwrap_or(-1.0);
            let emit_now = (fraction >= 0.0 && (fraction - last_fraction).abs() >= 0.005)
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                if fraction >= 0.0 {
                    last_fraction = fraction;
                }
                last_emit = Instant::now();
            }
        }),
    )?;
    if !quiet {
        clear_progress_line();
    }

    println!("✓ Simulation completed");
    print_summary(&response.summary);

    if let Some(path) = output {
        info!(path = %path.display(), samples = response.history.len(), "exporting history");
        sag_app::write_history(path, &response.history, format.into())?;
        println!(
            "✓ Exported {} history samples to {}",
            response.history.len(),
            path.display()
        );
    }

    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (event.stage, &event.progress) {
        (RunStage::Simulating, Some(p)) => {
            let width = 28usize;
            let filled = ((p.fraction_complete * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  t={:.2}/{:.2}h  step={}  solids={:.0}t  elapsed={:.1}s",
                bar,
                p.fraction_complete * 100.0,
                p.sim_time_h,
                p.t_end_h,
                p.step,
                p.solids_t,
                event.elapsed_wall_s
            );
        }
        _ => {
            let mut line = format!(
                "\r{}  elapsed={:.2}s",
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
        }
    }
    let _ = io::stdout().flush();
}

fn print_summary(summary: &RunSummary) {
    let state = &summary.final_state;
    println!();
    println!("Run summary: {}", summary.name);
    if let Some(seed) = summary.seed {
        println!("  Seed: {}", seed);
    }
    println!(
        "  Steps: {} ({:.2} h simulated, {:.2} s wall)",
        summary.steps, summary.duration_h, summary.wall_time_s
    );
    println!("  Events applied: {}", summary.events_applied);
    println!("\nFinal state (t = {:.2} h):", state.t_h);
    println!("  Feed flow:     {:>10.1} t/h", state.feed_flow_tph);
    println!("  Feed grade:    {:>10.4} %", state.feed_grade * 100.0);
    println!("  Mill solids:   {:>10.1} t", state.solids_t);
    println!("  Mill water:    {:>10.1} t", state.water_t);
    println!("  Mill copper:   {:>10.2} t", state.copper_t);
    println!("  Mill grade:    {:>10.4} %", state.mill_grade() * 100.0);
    println!("  Mill moisture: {:>10.2} %", state.moisture * 100.0);
    println!("\nSolids holdup:");
    println!("  Predicted steady state: {:>10.1} t", summary.predicted_solids_t);
    println!(
        "  Range over run:         {:>10.1} .. {:.1} t",
        summary.min_solids_t, summary.max_solids_t
    );
}
