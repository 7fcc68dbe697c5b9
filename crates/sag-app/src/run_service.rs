//! Scenario execution service.
//!
//! Events are scheduled on the run clock, the simulated time elapsed since
//! the run started. A `reset` event returns the simulator to time zero but
//! the run clock keeps counting, so later events still fire in order and
//! the run always covers the requested duration.

use std::time::Instant;

use sag_project::{EventAction, Scenario, ScenarioEvent};
use sag_sim::{HistorySeries, Simulator, Snapshot, TargetKind};
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage, SimProgress};

/// Progress events per run while simulating.
const PROGRESS_UPDATES: u64 = 100;

/// Request to execute a scenario.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub scenario: &'a Scenario,
    /// Overrides the scenario's own duration.
    pub duration_h: Option<f64>,
}

impl<'a> RunRequest<'a> {
    pub fn new(scenario: &'a Scenario) -> Self {
        Self {
            scenario,
            duration_h: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub name: String,
    pub seed: Option<u64>,
    pub steps: u64,
    pub duration_h: f64,
    pub events_applied: usize,
    pub final_state: Snapshot,
    /// Holdup the mill would settle at for the final setpoints.
    pub predicted_solids_t: f64,
    pub min_solids_t: f64,
    pub max_solids_t: f64,
    pub wall_time_s: f64,
}

#[derive(Debug, Clone)]
pub struct RunResponse {
    pub summary: RunSummary,
    pub history: HistorySeries,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    progress: Option<SimProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            progress,
        });
    }
}

/// Build a simulator in the scenario's starting configuration.
pub fn build_simulator(scenario: &Scenario) -> AppResult<Simulator> {
    let mut sim = Simulator::new(scenario.parameters.clone(), scenario.options.clone())?;
    apply_initial_targets(&mut sim, scenario)?;
    Ok(sim)
}

pub fn run_scenario(request: &RunRequest) -> AppResult<RunResponse> {
    run_scenario_with_progress(request, None)
}

/// Execute a scenario and stream progress events.
pub fn run_scenario_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let scenario = request.scenario;

    emit_progress(&mut progress_cb, RunStage::Preparing, started, None, None);
    sag_project::validate_scenario(scenario)?;

    let duration_h = request.duration_h.unwrap_or(scenario.duration_h);
    if !duration_h.is_finite() || duration_h <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "run duration must be positive, got {duration_h} h"
        )));
    }

    let mut sim = build_simulator(scenario)?;
    let dt = sim.options().dt_h;
    let slack = 0.5 * dt;
    let total_steps = ((duration_h - slack) / dt).ceil().max(1.0) as u64;
    let report_every = (total_steps / PROGRESS_UPDATES).max(1);

    info!(
        name = %scenario.name,
        duration_h,
        total_steps,
        seed = ?sim.seed(),
        events = scenario.events.len(),
        "run started"
    );

    let mut pending = scenario.events.iter().peekable();
    let mut events_applied = 0usize;
    let mut min_solids_t = sim.snapshot().solids_t;
    let mut max_solids_t = min_solids_t;

    for step in 0..total_steps {
        let run_t = step as f64 * dt;
        while let Some(event) = pending.next_if(|e| e.at_h <= run_t + slack) {
            apply_event(&mut sim, scenario, event)?;
            events_applied += 1;
        }

        sim.step();
        let solids_t = sim.snapshot().solids_t;
        min_solids_t = min_solids_t.min(solids_t);
        max_solids_t = max_solids_t.max(solids_t);

        let done = step + 1;
        if done % report_every == 0 || done == total_steps {
            emit_progress(
                &mut progress_cb,
                RunStage::Simulating,
                started,
                None,
                Some(SimProgress {
                    sim_time_h: done as f64 * dt,
                    t_end_h: duration_h,
                    fraction_complete: done as f64 / total_steps as f64,
                    step: done,
                    total_steps,
                    solids_t,
                }),
            );
        }
    }

    // Events stamped at the very end only change the final setpoints.
    for event in pending {
        apply_event(&mut sim, scenario, event)?;
        events_applied += 1;
    }

    let summary = RunSummary {
        name: scenario.name.clone(),
        seed: sim.seed(),
        steps: total_steps,
        duration_h: total_steps as f64 * dt,
        events_applied,
        final_state: sim.snapshot(),
        predicted_solids_t: sim.equilibrium_solids_t(),
        min_solids_t,
        max_solids_t,
        wall_time_s: started.elapsed().as_secs_f64(),
    };

    info!(
        steps = summary.steps,
        events_applied,
        solids_t = summary.final_state.solids_t,
        wall_time_s = summary.wall_time_s,
        "run finished"
    );
    emit_progress(&mut progress_cb, RunStage::Completed, started, None, None);

    Ok(RunResponse {
        summary,
        history: sim.history(),
    })
}

fn apply_event(sim: &mut Simulator, scenario: &Scenario, event: &ScenarioEvent) -> AppResult<()> {
    match &event.action {
        EventAction::SetTarget { kind, value } => sim.set_target_named(kind, *value)?,
        EventAction::SetParameter { name, value } => sim.set_parameter_named(name, *value)?,
        EventAction::Reset => {
            sim.reset();
            apply_initial_targets(sim, scenario)?;
        }
    }
    info!(at_h = event.at_h, action = %event.action, "scenario event applied");
    Ok(())
}

fn apply_initial_targets(sim: &mut Simulator, scenario: &Scenario) -> AppResult<()> {
    if let Some(targets) = &scenario.targets {
        sim.set_target(TargetKind::Flow, targets.feed_flow_tph)?;
        sim.set_target(TargetKind::Grade, targets.feed_grade)?;
    }
    Ok(())
}
