//! Simulator handle: clock, per-step pipeline, setpoints and history.
//!
//! Each `step()` runs the fixed causal chain
//! feed → recirculation delay → mill balance → fines delay → history,
//! then advances time by exactly one `dt`. Time is `step_count * dt`, so
//! running many steps back to back does not drift.

use serde::{Deserialize, Serialize};
use sag_controls::{DEFAULT_RAMP_WINDOW_H, Decimator, DelayLine, NoiseSource, SeededNoise};
use sag_core::units::minutes_to_hours;
use sag_core::{Tolerances, nearly_equal};
use tracing::{debug, info, trace};

use crate::error::{SimError, SimResult};
use crate::feed::FeedGenerator;
use crate::history::{History, HistorySample, HistorySeries};
use crate::mill::{MillBalance, MillInputs, MillInventory};
use crate::params::{ParamName, Parameters, TargetKind, Targets};
use crate::state::{SimulationState, Snapshot};

/// Holdup the mill starts with (t).
pub const INITIAL_SOLIDS_T: f64 = 10.0;
pub const INITIAL_WATER_T: f64 = 5.0;

/// Options fixed for the lifetime of a simulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Fixed time step (hours)
    pub dt_h: f64,
    /// Record every N-th step (decimation)
    pub record_every: usize,
    /// Maximum number of history rows kept
    pub history_capacity: usize,
    /// Onset ramp of the delay lines (hours)
    pub ramp_window_h: f64,
    /// Longest transport delay allowed (minutes). The delay lines keep this
    /// much history, so a delay lengthened at run time reads what was
    /// recorded instead of restarting from zero.
    pub max_delay_min: f64,
    /// Noise seed; drawn once at creation when absent
    pub seed: Option<u64>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt_h: 1.0 / 60.0,
            record_every: 10,
            history_capacity: 5000,
            ramp_window_h: DEFAULT_RAMP_WINDOW_H,
            max_delay_min: 180.0,
            seed: None,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !self.dt_h.is_finite() || self.dt_h <= 0.0 {
            return Err(SimError::InvalidOption {
                what: "dt_h must be positive",
            });
        }
        if self.record_every == 0 {
            return Err(SimError::InvalidOption {
                what: "record_every must be positive",
            });
        }
        if self.history_capacity == 0 {
            return Err(SimError::InvalidOption {
                what: "history_capacity must be positive",
            });
        }
        if !self.ramp_window_h.is_finite() || self.ramp_window_h < 0.0 {
            return Err(SimError::InvalidOption {
                what: "ramp_window_h must be non-negative",
            });
        }
        if !self.max_delay_min.is_finite() || self.max_delay_min < 0.0 {
            return Err(SimError::InvalidOption {
                what: "max_delay_min must be non-negative",
            });
        }
        Ok(())
    }

    /// Both transport delays of `params` must fit within `max_delay_min`.
    pub fn check_delays(&self, params: &Parameters) -> SimResult<()> {
        for (name, delay_min) in [
            (ParamName::RecircDelay, params.recirc_delay_min),
            (ParamName::FinesDelay, params.fines_delay_min),
        ] {
            if delay_min > self.max_delay_min {
                return Err(SimError::InvalidParameter {
                    name: name.as_str(),
                    value: delay_min,
                    reason: "exceeds max_delay_min",
                });
            }
        }
        Ok(())
    }
}

/// What happens to the setpoints on reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetsOnReset {
    /// Back to the nominal targets of the parameter set.
    #[default]
    Nominal,
    /// Keep the current operator targets.
    Preserve,
}

/// Flows of the step just taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Time at the end of the step.
    pub t_h: f64,
    /// Time the feed and delay lines were sampled (start of the step).
    pub sampled_at_h: f64,
    pub feed_flow_tph: f64,
    pub feed_grade: f64,
    pub recirc_flow_tph: f64,
    pub total_solids_in_tph: f64,
    pub discharge_flow_tph: f64,
    pub fines_flow_tph: f64,
    pub mill_grade: f64,
    pub moisture: f64,
    pub additional_water_tph: f64,
}

/// Per-step components derived from one parameter set.
#[derive(Clone, Debug)]
struct Pipeline {
    feed: FeedGenerator,
    mill: MillBalance,
    /// Fresh feed, delayed by the recirculation transport time.
    feed_line: DelayLine,
    /// Net product, delayed by the fines transport time.
    fines_line: DelayLine,
}

impl Pipeline {
    fn build(params: &Parameters, options: &SimOptions, state: &SimulationState) -> SimResult<Self> {
        let retain_h = minutes_to_hours(options.max_delay_min);
        Ok(Self {
            feed: FeedGenerator::new(params, state.feed_flow_tph, state.feed_grade)?,
            mill: MillBalance::from_parameters(params)?,
            feed_line: DelayLine::new(
                minutes_to_hours(params.recirc_delay_min),
                options.ramp_window_h,
                options.dt_h,
            )?
            .with_retention(retain_h)?,
            fines_line: DelayLine::new(
                minutes_to_hours(params.fines_delay_min),
                options.ramp_window_h,
                options.dt_h,
            )?
            .with_retention(retain_h)?,
        })
    }

    /// Same pipeline with new coefficients; buffers and feed state carry over.
    fn reconfigured(&self, params: &Parameters) -> SimResult<Self> {
        let mut next = self.clone();
        next.mill = MillBalance::from_parameters(params)?;
        next.feed.configure(params)?;

        let recirc_delay_h = minutes_to_hours(params.recirc_delay_min);
        if !nearly_equal(recirc_delay_h, next.feed_line.delay_h(), Tolerances::default()) {
            next.feed_line.set_delay(recirc_delay_h)?;
            debug!(delay_h = recirc_delay_h, "recirculation delay resized");
        }
        let fines_delay_h = minutes_to_hours(params.fines_delay_min);
        if !nearly_equal(fines_delay_h, next.fines_line.delay_h(), Tolerances::default()) {
            next.fines_line.set_delay(fines_delay_h)?;
            debug!(delay_h = fines_delay_h, "fines delay resized");
        }
        Ok(next)
    }
}

pub struct Simulator {
    options: SimOptions,
    seed: Option<u64>,
    /// Parameters and pipeline that `reset()` returns to.
    initial: (Parameters, Pipeline),
    params: Parameters,
    targets: Targets,
    state: SimulationState,
    pipeline: Pipeline,
    history: History,
    decimator: Decimator,
    noise: Box<dyn NoiseSource>,
    step_count: u64,
    last: Option<StepReport>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("t_h", &self.state.t_h)
            .field("step_count", &self.step_count)
            .field("seed", &self.seed)
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Create a simulator with seeded variability noise.
    pub fn new(params: Parameters, options: SimOptions) -> SimResult<Self> {
        let noise = match options.seed {
            Some(seed) => SeededNoise::new(seed),
            None => SeededNoise::from_entropy(),
        };
        let seed = noise.seed();
        let mut sim = Self::with_noise(params, options, Box::new(noise))?;
        sim.seed = Some(seed);
        info!(seed, "noise seeded");
        Ok(sim)
    }

    /// Create a simulator drawing variability from `noise`.
    pub fn with_noise(
        params: Parameters,
        options: SimOptions,
        noise: Box<dyn NoiseSource>,
    ) -> SimResult<Self> {
        options.validate()?;
        params.validate()?;
        options.check_delays(&params)?;

        let targets = Targets::nominal(&params);
        let state = initial_state(&params);
        let pipeline = Pipeline::build(&params, &options, &state)?;

        info!(
            dt_h = options.dt_h,
            record_every = options.record_every,
            history_capacity = options.history_capacity,
            "simulator created"
        );

        Ok(Self {
            history: History::new(options.history_capacity),
            decimator: Decimator::new(options.record_every),
            seed: None,
            initial: (params.clone(), pipeline.clone()),
            options,
            params,
            targets,
            state,
            pipeline,
            noise,
            step_count: 0,
            last: None,
        })
    }

    /// Advance exactly one `dt`.
    pub fn step(&mut self) -> StepReport {
        let dt = self.options.dt_h;
        let t = self.state.t_h;

        let p = &mut self.pipeline;

        let feed = p.feed.step(t, dt, &self.targets, self.noise.as_mut());

        p.feed_line.record(t, feed.flow_tph);
        let recirc = self.params.recirc_fraction * p.feed_line.read(t);

        let inputs = MillInputs {
            feed_flow_tph: feed.flow_tph,
            feed_grade: feed.grade,
            recirc_flow_tph: recirc,
        };
        let rates = p.mill.step(&mut self.state.mill, &inputs, dt);

        p.fines_line
            .record(t, (rates.discharge_tph - recirc).max(0.0));
        let fines = p.fines_line.read(t);

        self.step_count += 1;
        self.state.t_h = self.step_count as f64 * dt;
        self.state.feed_flow_tph = feed.flow_tph;
        self.state.feed_grade = feed.grade;

        let report = StepReport {
            t_h: self.state.t_h,
            sampled_at_h: t,
            feed_flow_tph: feed.flow_tph,
            feed_grade: feed.grade,
            recirc_flow_tph: recirc,
            total_solids_in_tph: rates.total_solids_in_tph,
            discharge_flow_tph: rates.discharge_tph,
            fines_flow_tph: fines,
            mill_grade: rates.mill_grade,
            moisture: rates.moisture,
            additional_water_tph: rates.additional_water_tph,
        };

        trace!(
            t_h = report.t_h,
            feed = report.feed_flow_tph,
            recirc = report.recirc_flow_tph,
            discharge = report.discharge_flow_tph,
            fines = report.fines_flow_tph,
            "step"
        );

        if self.decimator.tick() {
            self.history.push(HistorySample {
                t_h: report.t_h,
                feed_flow_tph: report.feed_flow_tph,
                fines_flow_tph: report.fines_flow_tph,
                recirc_flow_tph: report.recirc_flow_tph,
                discharge_flow_tph: report.discharge_flow_tph,
                feed_grade: report.feed_grade,
                mill_grade: report.mill_grade,
                target_flow_tph: self.targets.feed_flow_tph,
                target_grade: self.targets.feed_grade,
                solids_t: self.state.mill.solids_t,
                water_t: self.state.mill.water_t,
                copper_t: self.state.mill.copper_t,
                moisture: self.state.mill.moisture(),
            });
        }

        self.last = Some(report);
        report
    }

    /// Take `n` steps; returns the last report.
    pub fn advance(&mut self, n: usize) -> Option<StepReport> {
        (0..n).map(|_| self.step()).last()
    }

    /// Step until simulated time reaches `t_h`. A non-finite `t_h` takes no
    /// steps and returns `None`.
    pub fn advance_to(&mut self, t_h: f64) -> Option<StepReport> {
        if !t_h.is_finite() {
            debug!(t_h, "advance_to ignored non-finite time");
            return None;
        }
        // Half a step of slack so that a target on the step grid is not
        // overshot by one step because of rounding.
        let slack = 0.5 * self.options.dt_h;
        let mut last = None;
        while self.state.t_h + slack < t_h {
            last = Some(self.step());
        }
        last
    }

    /// Change a setpoint; takes effect on the next step.
    pub fn set_target(&mut self, kind: TargetKind, value: f64) -> SimResult<()> {
        self.targets.set(kind, value)?;
        debug!(%kind, value, t_h = self.state.t_h, "target updated");
        Ok(())
    }

    /// [`Self::set_target`] with the kind given by name.
    pub fn set_target_named(&mut self, kind: &str, value: f64) -> SimResult<()> {
        self.set_target(kind.parse()?, value)
    }

    /// Change a tunable; takes effect on the next step.
    pub fn set_parameter(&mut self, name: ParamName, value: f64) -> SimResult<()> {
        let mut next = self.params.clone();
        next.set(name, value)?;
        self.options.check_delays(&next)?;
        self.pipeline = self.pipeline.reconfigured(&next)?;
        self.params = next;
        debug!(%name, value, t_h = self.state.t_h, "parameter updated");
        Ok(())
    }

    /// [`Self::set_parameter`] with the parameter given by name.
    pub fn set_parameter_named(&mut self, name: &str, value: f64) -> SimResult<()> {
        self.set_parameter(name.parse()?, value)
    }

    /// Back to the construction-time parameters, nominal targets, initial
    /// state and empty buffers. The noise source restarts from its seed.
    pub fn reset(&mut self) {
        let (params, pipeline) = self.initial.clone();
        self.reinitialize(params, pipeline, TargetsOnReset::Nominal);
    }

    /// Reset with a new parameter set, which also becomes the set later
    /// `reset()` calls return to.
    pub fn reset_with(&mut self, params: Parameters, targets: TargetsOnReset) -> SimResult<()> {
        params.validate()?;
        self.options.check_delays(&params)?;
        let pipeline = Pipeline::build(&params, &self.options, &initial_state(&params))?;
        self.initial = (params.clone(), pipeline.clone());
        self.reinitialize(params, pipeline, targets);
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn history(&self) -> HistorySeries {
        self.history.series()
    }

    pub fn targets(&self) -> Targets {
        self.targets
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    /// Seed of the noise source, if it is a seeded one.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn last_step(&self) -> Option<&StepReport> {
        self.last.as_ref()
    }

    /// Solids holdup the mill settles at for the current targets, once feed
    /// and recirculation have caught up: `F * (1 + r) / k`.
    pub fn equilibrium_solids_t(&self) -> f64 {
        let feed = self
            .targets
            .feed_flow_tph
            .clamp(0.0, self.params.max_feed_flow_tph);
        self.pipeline
            .mill
            .equilibrium_solids_t(feed * (1.0 + self.params.recirc_fraction))
    }

    fn reinitialize(&mut self, params: Parameters, pipeline: Pipeline, targets: TargetsOnReset) {
        if targets == TargetsOnReset::Nominal {
            self.targets = Targets::nominal(&params);
        }
        self.state = initial_state(&params);
        self.pipeline = pipeline;
        self.params = params;
        self.history.clear();
        self.decimator.reset();
        self.noise.restart();
        self.step_count = 0;
        self.last = None;
        info!(seed = ?self.seed, ?targets, "simulator reset");
    }
}

fn initial_state(params: &Parameters) -> SimulationState {
    SimulationState {
        t_h: 0.0,
        mill: MillInventory {
            solids_t: INITIAL_SOLIDS_T,
            water_t: INITIAL_WATER_T,
            copper_t: INITIAL_SOLIDS_T * params.nominal_feed_grade,
        },
        feed_flow_tph: 0.0,
        feed_grade: params.nominal_feed_grade,
    }
}
