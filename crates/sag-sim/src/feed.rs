//! Crusher feed generator.
//!
//! Flow and grade each follow their operator target through a first-order
//! lag. Once past the warm-up, the output is the lagged base value times a
//! bounded variability multiplier. The multiplier is never written back into
//! the base, so variability cannot accumulate from step to step. Outputs are
//! clamped to absolute bounds (`[0, max_feed_flow]`, `[min_grade, max_grade]`)
//! that do not move with the target.

use sag_controls::{FirstOrderLag, NoiseSource};
use tracing::debug;

use crate::error::SimResult;
use crate::params::{FeedVariability, Parameters, Targets};

/// Feed delivered over one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedOutput {
    pub flow_tph: f64,
    pub grade: f64,
}

#[derive(Clone, Debug)]
pub struct FeedGenerator {
    flow_lag: FirstOrderLag,
    grade_lag: FirstOrderLag,
    variability: FeedVariability,
    max_flow_tph: f64,
    min_grade: f64,
    max_grade: f64,
    base_flow_tph: f64,
    base_grade: f64,
}

impl FeedGenerator {
    /// Create a generator starting from the given feed.
    pub fn new(params: &Parameters, initial_flow_tph: f64, initial_grade: f64) -> SimResult<Self> {
        let mut generator = Self {
            flow_lag: FirstOrderLag::new(params.tau_flow_h)?,
            grade_lag: FirstOrderLag::new(params.tau_grade_h)?,
            variability: params.variability.clone(),
            max_flow_tph: params.max_feed_flow_tph,
            min_grade: params.min_grade,
            max_grade: params.max_grade,
            base_flow_tph: initial_flow_tph,
            base_grade: initial_grade,
        };
        generator.base_flow_tph = generator.clamp_flow(initial_flow_tph);
        generator.base_grade = generator.clamp_grade(initial_grade);
        Ok(generator)
    }

    /// Pick up new coefficients; the base values carry over.
    pub fn configure(&mut self, params: &Parameters) -> SimResult<()> {
        self.flow_lag = FirstOrderLag::new(params.tau_flow_h)?;
        self.grade_lag = FirstOrderLag::new(params.tau_grade_h)?;
        self.variability = params.variability.clone();
        self.max_flow_tph = params.max_feed_flow_tph;
        self.min_grade = params.min_grade;
        self.max_grade = params.max_grade;
        self.base_flow_tph = self.clamp_flow(self.base_flow_tph);
        self.base_grade = self.clamp_grade(self.base_grade);
        Ok(())
    }

    /// Noise-free flow the generator is relaxing.
    pub fn base_flow_tph(&self) -> f64 {
        self.base_flow_tph
    }

    pub fn base_grade(&self) -> f64 {
        self.base_grade
    }

    /// Produce the feed for the step starting at `t_h`.
    pub fn step(
        &mut self,
        t_h: f64,
        dt_h: f64,
        targets: &Targets,
        noise: &mut dyn NoiseSource,
    ) -> FeedOutput {
        self.base_flow_tph = self
            .flow_lag
            .step(self.base_flow_tph, targets.feed_flow_tph, dt_h);
        self.base_grade = self
            .grade_lag
            .step(self.base_grade, targets.feed_grade, dt_h);

        let varying = t_h > self.variability.warmup_h;

        if varying {
            if let Some(kick) = self.variability.flow.disturbance(noise) {
                debug!(t_h, kick, "feed flow disturbance");
                self.base_flow_tph *= 1.0 + kick;
            }
        }
        self.base_flow_tph = self.clamp_flow(self.base_flow_tph);
        self.base_grade = self.clamp_grade(self.base_grade);

        let (flow_mult, grade_mult) = if varying {
            let flow_scale = self
                .variability
                .proximity(self.base_flow_tph, targets.feed_flow_tph);
            let grade_scale = self
                .variability
                .proximity(self.base_grade, targets.feed_grade);
            (
                self.variability.flow.multiplier(t_h, flow_scale, noise),
                self.variability.grade.multiplier(t_h, grade_scale, noise),
            )
        } else {
            (1.0, 1.0)
        };

        let raw_flow = self.base_flow_tph * flow_mult;
        let raw_grade = self.base_grade * grade_mult;
        let flow_tph = self.clamp_flow(raw_flow);
        let grade = self.clamp_grade(raw_grade);
        if flow_tph != raw_flow || grade != raw_grade {
            debug!(t_h, raw_flow, flow_tph, raw_grade, grade, "feed clamped to bounds");
        }

        FeedOutput { flow_tph, grade }
    }

    fn clamp_flow(&self, flow: f64) -> f64 {
        flow.clamp(0.0, self.max_flow_tph)
    }

    fn clamp_grade(&self, grade: f64) -> f64 {
        grade.clamp(self.min_grade, self.max_grade)
    }
}
