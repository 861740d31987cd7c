//! Simulated annealing over `(Linf, K, t_anchor, C, ts)`.
//!
//! A single current candidate is perturbed with Gaussian steps whose size
//! shrinks with the temperature. Better or equal candidates are always
//! accepted, worse ones with probability `exp(Δscore / T)`. The run ends when
//! the wall-clock budget is used up (or an optional iteration cap is hit) and
//! returns the best candidate ever seen, not the last one.
//!
//! The trace holds every `trace_interval`-th iteration, every improvement of
//! the best score and the last iteration, so its length stays bounded by the
//! work done rather than by one entry per proposal.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{ElefanError, Result};
use crate::global_opt::progress::Progress;
use crate::global_opt::{
    clip_to_bounds, encode, score_point, SearchControl, SearchResult, SearchStrategy,
    Termination, TraceEntry,
};
use crate::parameters::{Bounds, GrowthParameters, SearchBounds};
use crate::problem::GrowthObjective;

/// Smallest step, relative to the initial one, used late in the schedule.
const MIN_STEP_FRACTION: f64 = 0.01;

fn default_sa_time() -> f64 {
    60.0
}

fn default_sa_temp() -> f64 {
    1.0
}

fn default_cooling() -> f64 {
    8.0
}

fn default_step_size() -> f64 {
    0.1
}

fn default_trace_interval() -> usize {
    100
}

/// Simulated annealing search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedAnnealing {
    /// Search bounds (`low_par` / `up_par`)
    pub bounds: SearchBounds,

    /// Wall-clock budget in seconds
    #[serde(default = "default_sa_time")]
    pub sa_time: f64,

    /// Initial temperature, on the scale of score differences
    #[serde(default = "default_sa_temp")]
    pub sa_temp: f64,

    /// Exponential cooling rate: `T = sa_temp * exp(-cooling * progress)`
    #[serde(default = "default_cooling")]
    pub cooling: f64,

    /// Initial step as a fraction of each parameter's range
    #[serde(default = "default_step_size")]
    pub step_size: f64,

    /// Optional iteration cap; when set the schedule follows iterations
    /// instead of elapsed time
    #[serde(default)]
    pub max_iterations: Option<usize>,

    /// Starting candidate (defaults to the centre of the bounds)
    #[serde(default)]
    pub initial: Option<GrowthParameters>,

    #[serde(default)]
    pub seed: Option<u64>,

    /// Iterations between regular trace entries. Default: 100
    #[serde(default = "default_trace_interval")]
    pub trace_interval: usize,
}

impl SimulatedAnnealing {
    /// Create a new annealing search with default tuning.
    pub fn new(bounds: SearchBounds) -> Self {
        Self {
            bounds,
            sa_time: default_sa_time(),
            sa_temp: default_sa_temp(),
            cooling: default_cooling(),
            step_size: default_step_size(),
            max_iterations: None,
            initial: None,
            seed: None,
            trace_interval: default_trace_interval(),
        }
    }

    pub fn with_time_budget(mut self, seconds: f64) -> Self {
        self.sa_time = seconds;
        self
    }

    pub fn with_temperature(mut self, sa_temp: f64, cooling: f64) -> Self {
        self.sa_temp = sa_temp;
        self.cooling = cooling;
        self
    }

    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_initial(mut self, initial: GrowthParameters) -> Self {
        self.initial = Some(initial);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_trace_interval(mut self, trace_interval: usize) -> Self {
        self.trace_interval = trace_interval;
        self
    }

    fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        if !self.sa_time.is_finite() || self.sa_time < 0.0 {
            return Err(ElefanError::InvalidParameter(format!(
                "SA_time must be a non-negative number of seconds, got {}",
                self.sa_time
            )));
        }
        if !(self.sa_temp > 0.0) || !self.sa_temp.is_finite() {
            return Err(ElefanError::InvalidParameter(format!(
                "SA_temp must be positive, got {}",
                self.sa_temp
            )));
        }
        if !(self.cooling >= 0.0) || !self.cooling.is_finite() {
            return Err(ElefanError::InvalidParameter(format!(
                "cooling rate must be non-negative, got {}",
                self.cooling
            )));
        }
        if !(self.step_size > 0.0) || !self.step_size.is_finite() {
            return Err(ElefanError::InvalidParameter(format!(
                "step size must be positive, got {}",
                self.step_size
            )));
        }
        if self.trace_interval == 0 {
            return Err(ElefanError::InvalidParameter(
                "trace interval must be at least one iteration".to_string(),
            ));
        }
        Ok(())
    }

    fn initial_point(&self, bounds: &[Bounds]) -> Vec<f64> {
        match &self.initial {
            Some(p) => clip_to_bounds(&encode(p), bounds),
            None => self.bounds.centre(),
        }
    }

    /// Gaussian step around `current`, clipped to the bounds.
    fn perturb(
        &self,
        current: &[f64],
        bounds: &[Bounds],
        scale: f64,
        rng: &mut impl Rng,
    ) -> Vec<f64> {
        let candidate: Vec<f64> = current
            .iter()
            .zip(bounds)
            .map(|(&x, b)| {
                let sd = self.step_size * b.width() * scale;
                match Normal::new(0.0, sd) {
                    Ok(normal) if sd > 0.0 => x + normal.sample(rng),
                    _ => x,
                }
            })
            .collect();
        clip_to_bounds(&candidate, bounds)
    }
}

impl SearchStrategy for SimulatedAnnealing {
    fn name(&self) -> &'static str {
        "simulated annealing"
    }

    fn search<O: GrowthObjective>(
        &self,
        objective: &O,
        control: &SearchControl,
    ) -> Result<SearchResult> {
        self.validate()?;

        let bounds = self.bounds.to_vec();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let start = Instant::now();
        let budget = Duration::from_secs_f64(self.sa_time);

        let mut current = self.initial_point(&bounds);
        let mut current_score = score_point(objective, &self.bounds, &current);
        let mut best = current.clone();
        let mut best_score = current_score;
        let mut evaluations = 1;
        let mut trace = vec![TraceEntry {
            iteration: 0,
            mean: current_score,
            best: best_score,
        }];

        let progress = Progress::new(
            self.max_iterations.unwrap_or(0) as u64,
            control.progress,
            "simulated annealing",
        );

        let mut iterations = 0;
        let termination = loop {
            if start.elapsed() >= budget {
                break Termination::TimeBudget;
            }
            if self.max_iterations.map_or(false, |n| iterations >= n) {
                break Termination::IterationLimit;
            }
            if control.is_cancelled() {
                break Termination::Cancelled;
            }

            let fraction = match self.max_iterations {
                Some(n) => iterations as f64 / n as f64,
                None => start.elapsed().as_secs_f64() / self.sa_time,
            };
            let temperature = self.sa_temp * (-self.cooling * fraction.min(1.0)).exp();
            let scale = (temperature / self.sa_temp).max(MIN_STEP_FRACTION);

            let candidate = self.perturb(&current, &bounds, scale, &mut rng);
            let candidate_score = score_point(objective, &self.bounds, &candidate);
            evaluations += 1;
            iterations += 1;

            let delta = candidate_score - current_score;
            let accept = delta >= 0.0 || rng.gen::<f64>() < (delta / temperature).exp();
            let mut improved = false;
            if accept {
                current = candidate;
                current_score = candidate_score;
                if current_score > best_score {
                    best = current.clone();
                    best_score = current_score;
                    improved = true;
                    debug!(iteration = iterations, score = best_score, "annealing improved");
                }
            }

            if improved || iterations % self.trace_interval == 0 {
                trace.push(TraceEntry {
                    iteration: iterations,
                    mean: current_score,
                    best: best_score,
                });
            }
            progress.inc();
        };
        progress.finish();

        if trace.last().map_or(true, |e| e.iteration != iterations) {
            trace.push(TraceEntry {
                iteration: iterations,
                mean: current_score,
                best: best_score,
            });
        }

        let result = SearchResult::from_best(
            objective,
            self.bounds.decode(&best),
            best_score,
            trace,
            iterations,
            evaluations,
            termination,
        );
        info!(
            iterations,
            rn_max = result.rn_max,
            linf = result.par.linf,
            k = result.par.k,
            termination = termination.description(),
            "simulated annealing finished"
        );
        Ok(result)
    }
}
