//! Global search over growth parameters.
//!
//! This module provides the search strategies that look for the growth
//! parameters with the highest ELEFAN score: an exhaustive grid scan over
//! `(Linf, K)`, simulated annealing and a genetic algorithm over
//! `(Linf, K, t_anchor, C, ts)`. All of them implement [`SearchStrategy`] and
//! only talk to the data through a [`GrowthObjective`], so a new strategy
//! needs no change to the restructuring or scoring code.

use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::parameters::{Bounds, GrowthParameters, SearchBounds};
use crate::problem::{GrowthObjective, WORST_SCORE};

/// Trait for search strategies over growth parameters.
pub trait SearchStrategy {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run the search and return the best candidate found.
    ///
    /// # Arguments
    ///
    /// * `objective` - The score to maximise
    /// * `control` - Progress display and cancellation
    ///
    /// # Returns
    ///
    /// * The best candidate, its score and a convergence trace
    fn search<O: GrowthObjective>(&self, objective: &O, control: &SearchControl)
        -> Result<SearchResult>;
}

/// Cooperative cancellation flag, checked between iterations only.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run-time controls passed to every search.
#[derive(Debug, Clone, Default)]
pub struct SearchControl {
    /// Show a progress bar (requires the `progress` feature)
    pub progress: bool,

    pub cancel: CancelToken,
}

impl SearchControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// Every grid cell was evaluated.
    Completed,

    /// No improvement over the configured number of generations.
    Stalled,

    /// Iteration or generation limit reached.
    IterationLimit,

    /// Wall-clock budget used up.
    TimeBudget,

    /// Stopped through the cancel token.
    Cancelled,
}

impl Termination {
    /// True for runs that stopped on their own criterion rather than on a
    /// budget or a cancellation.
    pub fn is_converged(&self) -> bool {
        matches!(self, Termination::Completed | Termination::Stalled)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Termination::Completed => "all candidates evaluated",
            Termination::Stalled => "no improvement within the run limit",
            Termination::IterationLimit => "iteration limit reached",
            Termination::TimeBudget => "time budget exhausted",
            Termination::Cancelled => "cancelled",
        }
    }
}

/// One point of the convergence trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TraceEntry {
    pub iteration: usize,

    /// Current score (annealing), population mean (genetic) or cell score (grid)
    pub mean: f64,

    /// Best score seen so far
    pub best: f64,
}

/// Scores of a `(K, Linf)` grid; rows follow `k`, columns follow `linf`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSurface {
    pub linf: Vec<f64>,
    pub k: Vec<f64>,
    pub score: ndarray::Array2<f64>,
    pub esp: ndarray::Array2<f64>,
    pub t_anchor: ndarray::Array2<f64>,
}

/// Result of a global search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Best growth parameters found
    pub par: GrowthParameters,

    /// Growth performance index of `par`
    pub phi_l: f64,

    /// Best score
    pub rn_max: f64,

    /// Explained sum of peaks of `par`
    pub esp: f64,

    pub ncohort: usize,

    pub agemax: usize,

    pub trace: Vec<TraceEntry>,

    /// Full score grid (grid scan only)
    pub score_surface: Option<ScoreSurface>,

    pub iterations: usize,

    pub evaluations: usize,

    pub termination: Termination,

    /// Number of anchor searches that stopped at their iteration cap
    pub anchor_nonconverged: usize,
}

impl SearchResult {
    /// Build a result for `par`, re-evaluating it for ESP and cohort details.
    pub(crate) fn from_best<O: GrowthObjective>(
        objective: &O,
        par: GrowthParameters,
        rn_max: f64,
        trace: Vec<TraceEntry>,
        iterations: usize,
        evaluations: usize,
        termination: Termination,
    ) -> Self {
        let (esp, ncohort, agemax) = match objective.fit(&par) {
            Ok(fit) => (fit.esp, fit.ncohort, fit.agemax),
            Err(_) => (0.0, 0, 0),
        };
        Self {
            par,
            phi_l: par.phi_l(),
            rn_max,
            esp,
            ncohort,
            agemax,
            trace,
            score_surface: None,
            iterations,
            evaluations,
            termination,
            anchor_nonconverged: 0,
        }
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ELEFAN Search Result:")?;
        writeln!(f, "  Termination: {}", self.termination.description())?;
        writeln!(f, "  Rn_max: {:.3}", self.rn_max)?;
        writeln!(f, "  ESP: {:.4}", self.esp)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.evaluations)?;
        writeln!(f, "  Cohorts: {} (agemax {})", self.ncohort, self.agemax)?;
        writeln!(f, "  Parameters: {}", self.par)?;
        Ok(())
    }
}

// Import specific search strategies
mod genetic;
mod grid_scan;
mod parallel;
mod progress;
mod simulated_annealing;

// Re-export search strategies
pub use genetic::GeneticAlgorithm;
pub use grid_scan::GridScan;
pub use parallel::{evaluate_population_parallel, fit_shapes_parallel};
pub use simulated_annealing::SimulatedAnnealing;

/// Generate a random point within the given bounds.
///
/// Fixed coordinates (`min == max`) are returned as they are.
pub(crate) fn random_point(bounds: &[Bounds], rng: &mut impl Rng) -> Vec<f64> {
    bounds
        .iter()
        .map(|b| {
            if b.is_fixed() {
                b.min
            } else {
                rng.gen_range(b.min..=b.max)
            }
        })
        .collect()
}

/// Clip a point to the given bounds.
pub(crate) fn clip_to_bounds(point: &[f64], bounds: &[Bounds]) -> Vec<f64> {
    point
        .iter()
        .zip(bounds)
        .map(|(x, b)| b.clamp(*x))
        .collect()
}

/// Create a population of random points within the given bounds.
pub(crate) fn create_population(
    bounds: &[Bounds],
    pop_size: usize,
    rng: &mut impl Rng,
) -> Vec<Vec<f64>> {
    (0..pop_size).map(|_| random_point(bounds, rng)).collect()
}

/// Encode growth parameters in `(Linf, K, t_anchor, C, ts)` order.
pub(crate) fn encode(par: &GrowthParameters) -> Vec<f64> {
    vec![par.linf, par.k, par.t_anchor, par.c, par.ts]
}

/// Score of an encoded candidate.
pub(crate) fn score_point<O: GrowthObjective>(
    objective: &O,
    bounds: &SearchBounds,
    point: &[f64],
) -> f64 {
    let score = objective.score(&bounds.decode(point));
    if score.is_finite() {
        score
    } else {
        WORST_SCORE
    }
}
