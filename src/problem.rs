//! Scoring objective shared by all search strategies.
//!
//! This module defines the [`GrowthObjective`] trait, which maps candidate
//! growth parameters to a score, and [`ElefanProblem`], its implementation
//! over a restructured length-frequency surface. Evaluation only reads the
//! surface, so one problem can be scored from many threads at once.

use crate::anchor::{best_anchor, AnchorFit, AnchorPolicy, GrowthShape};
use crate::error::Result;
use crate::parameters::GrowthParameters;
use crate::restructure::RestructuredSurface;
use crate::vbgf::{evaluate, CurveFit, EvaluationOptions};

/// Score given to candidates whose evaluation fails. Lower than any
/// attainable score (`10^0 / 10 = 0.1`).
pub const WORST_SCORE: f64 = 0.0;

/// A score to be maximised over growth parameters.
pub trait GrowthObjective: Sync {
    /// Evaluate a complete set of growth parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - Candidate parameters, anchor included
    ///
    /// # Returns
    ///
    /// * The fit, or an error if the candidate cannot be evaluated
    fn fit(&self, params: &GrowthParameters) -> Result<CurveFit>;

    /// Choose the anchor for a curve shape and evaluate the result.
    fn fit_shape(&self, shape: &GrowthShape) -> Result<AnchorFit>;

    /// Score of `params`; failed or non-finite evaluations give [`WORST_SCORE`].
    fn score(&self, params: &GrowthParameters) -> f64 {
        match self.fit(params) {
            Ok(fit) if fit.score.is_finite() => fit.score,
            _ => WORST_SCORE,
        }
    }
}

/// ELEFAN objective: a restructured surface plus evaluation settings.
#[derive(Debug, Clone)]
pub struct ElefanProblem {
    surface: RestructuredSurface,
    options: EvaluationOptions,
    anchor: AnchorPolicy,
}

impl ElefanProblem {
    /// Create a new problem with default evaluation and anchor settings.
    pub fn new(surface: RestructuredSurface) -> Self {
        Self {
            surface,
            options: EvaluationOptions::default(),
            anchor: AnchorPolicy::default(),
        }
    }

    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_anchor_policy(mut self, anchor: AnchorPolicy) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn surface(&self) -> &RestructuredSurface {
        &self.surface
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    pub fn anchor_policy(&self) -> &AnchorPolicy {
        &self.anchor
    }

    pub fn into_surface(self) -> RestructuredSurface {
        self.surface
    }
}

impl GrowthObjective for ElefanProblem {
    fn fit(&self, params: &GrowthParameters) -> Result<CurveFit> {
        evaluate(&self.surface, params, &self.options)
    }

    fn fit_shape(&self, shape: &GrowthShape) -> Result<AnchorFit> {
        best_anchor(&self.surface, shape, &self.options, &self.anchor)
    }
}
