//! End-to-end ELEFAN fit.
//!
//! [`fit`] restructures a length-frequency sample once, wraps the surface in
//! an [`ElefanProblem`] and hands it to the configured search strategy. The
//! whole run is described by one serialisable [`ElefanConfig`].

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::anchor::AnchorPolicy;
use crate::error::Result;
use crate::global_opt::{
    GeneticAlgorithm, GridScan, ScoreSurface, SearchControl, SearchResult, SearchStrategy,
    SimulatedAnnealing, TraceEntry,
};
use crate::lfq::LengthFrequency;
use crate::parameters::GrowthParameters;
use crate::problem::{ElefanProblem, GrowthObjective};
use crate::restructure::{restructure, RestructureConfig, RestructuredSurface};
use crate::vbgf::{EvaluationOptions, GrowthCurveFamily};

/// Search strategy selected by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Strategy {
    GridScan(GridScan),
    SimulatedAnnealing(SimulatedAnnealing),
    Genetic(GeneticAlgorithm),
}

impl SearchStrategy for Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::GridScan(s) => s.name(),
            Strategy::SimulatedAnnealing(s) => s.name(),
            Strategy::Genetic(s) => s.name(),
        }
    }

    fn search<O: GrowthObjective>(
        &self,
        objective: &O,
        control: &SearchControl,
    ) -> Result<SearchResult> {
        match self {
            Strategy::GridScan(s) => s.search(objective, control),
            Strategy::SimulatedAnnealing(s) => s.search(objective, control),
            Strategy::Genetic(s) => s.search(objective, control),
        }
    }
}

impl From<GridScan> for Strategy {
    fn from(s: GridScan) -> Self {
        Strategy::GridScan(s)
    }
}

impl From<SimulatedAnnealing> for Strategy {
    fn from(s: SimulatedAnnealing) -> Self {
        Strategy::SimulatedAnnealing(s)
    }
}

impl From<GeneticAlgorithm> for Strategy {
    fn from(s: GeneticAlgorithm) -> Self {
        Strategy::Genetic(s)
    }
}

/// Complete description of one ELEFAN run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElefanConfig {
    #[serde(default)]
    pub restructure: RestructureConfig,

    #[serde(default)]
    pub evaluation: EvaluationOptions,

    /// Anchor choice for the grid scan; the stochastic strategies search
    /// `t_anchor` directly
    #[serde(default)]
    pub anchor: AnchorPolicy,

    pub strategy: Strategy,
}

impl ElefanConfig {
    /// Create a configuration with default restructuring and evaluation.
    pub fn new(strategy: impl Into<Strategy>) -> Self {
        Self {
            restructure: RestructureConfig::default(),
            evaluation: EvaluationOptions::default(),
            anchor: AnchorPolicy::default(),
            strategy: strategy.into(),
        }
    }

    pub fn with_restructure(mut self, restructure: RestructureConfig) -> Self {
        self.restructure = restructure;
        self
    }

    pub fn with_evaluation(mut self, evaluation: EvaluationOptions) -> Self {
        self.evaluation = evaluation;
        self
    }

    pub fn with_anchor_policy(mut self, anchor: AnchorPolicy) -> Self {
        self.anchor = anchor;
        self
    }

    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Restructured data together with the search outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ElefanFit {
    surface: RestructuredSurface,
    result: SearchResult,
}

impl ElefanFit {
    pub fn surface(&self) -> &RestructuredSurface {
        &self.surface
    }

    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    pub fn into_result(self) -> SearchResult {
        self.result
    }

    /// Best growth parameters.
    pub fn par(&self) -> &GrowthParameters {
        &self.result.par
    }

    /// Best score.
    pub fn rn_max(&self) -> f64 {
        self.result.rn_max
    }

    pub fn phi_l(&self) -> f64 {
        self.result.phi_l
    }

    pub fn rcounts(&self) -> &Array2<f64> {
        self.surface.rcounts()
    }

    pub fn peaks_mat(&self) -> &Array2<usize> {
        self.surface.peaks_mat()
    }

    pub fn asp(&self) -> f64 {
        self.surface.asp()
    }

    pub fn esp(&self) -> f64 {
        self.result.esp
    }

    pub fn ncohort(&self) -> usize {
        self.result.ncohort
    }

    pub fn agemax(&self) -> usize {
        self.result.agemax
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.result.trace
    }

    /// Full score grid, present for grid scans only.
    pub fn score_surface(&self) -> Option<&ScoreSurface> {
        self.result.score_surface.as_ref()
    }

    /// Cohort family of the best parameters over the sampled period.
    pub fn curve_family(&self) -> GrowthCurveFamily {
        let dates = self.surface.sample().dates();
        let t_first = dates.first().copied().unwrap_or_default();
        let t_last = dates.last().copied().unwrap_or(t_first);
        GrowthCurveFamily::new(self.result.par, t_first, t_last, self.result.agemax)
    }
}

/// Fit growth parameters to a length-frequency sample.
///
/// # Arguments
///
/// * `lfq` - The length-frequency sample
/// * `config` - Restructuring, evaluation and search settings
/// * `control` - Progress display and cancellation
///
/// # Returns
///
/// * The restructured surface and the best parameters found
pub fn fit(lfq: &LengthFrequency, config: &ElefanConfig, control: &SearchControl) -> Result<ElefanFit> {
    config.anchor.validate(lfq.n_dates())?;

    let surface = restructure(lfq, &config.restructure)?;
    let problem = ElefanProblem::new(surface)
        .with_options(config.evaluation)
        .with_anchor_policy(config.anchor);

    info!(
        strategy = config.strategy.name(),
        lengths = lfq.n_lengths(),
        dates = lfq.n_dates(),
        asp = problem.surface().asp(),
        "starting ELEFAN fit"
    );
    let result = config.strategy.search(&problem, control)?;

    Ok(ElefanFit {
        surface: problem.into_surface(),
        result,
    })
}
