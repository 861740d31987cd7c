//! Choice of the anchor time `t_anchor` for a fixed growth curve shape.
//!
//! For given `(Linf, K, C, ts)` the explained sum of peaks is a piecewise
//! constant function of `t_anchor`: moving the anchor shifts whole cohorts
//! between length classes. Two policies pick the anchor:
//!
//! - [`AnchorPolicy::Optimise`] maximises ESP over `[0, 1)` with a coarse
//!   pre-scan followed by a bounded golden-section refinement. The result is
//!   the maximum of a plateau, not necessarily the global one.
//! - [`AnchorPolicy::Cross`] / [`AnchorPolicy::CrossMax`] force the curve
//!   through one (date, length) point.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ElefanError, Result};
use crate::parameters::{seasonal_vbgf, GrowthParameters};
use crate::restructure::RestructuredSurface;
use crate::vbgf::{evaluate, CurveFit, EvaluationOptions};

/// Step of the candidate grid for the zero-length time in the cross policies.
const CROSS_STEP: f64 = 0.01;

fn default_tol() -> f64 {
    0.001
}

fn default_grid_points() -> usize {
    20
}

fn default_max_iterations() -> usize {
    100
}

/// Growth curve shape without its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthShape {
    pub linf: f64,
    pub k: f64,
    #[serde(default)]
    pub c: f64,
    #[serde(default)]
    pub ts: f64,
}

impl GrowthShape {
    pub fn new(linf: f64, k: f64) -> Self {
        Self {
            linf,
            k,
            c: 0.0,
            ts: 0.0,
        }
    }

    pub fn seasonal(linf: f64, k: f64, c: f64, ts: f64) -> Self {
        Self { linf, k, c, ts }
    }

    pub fn with_anchor(&self, t_anchor: f64) -> GrowthParameters {
        GrowthParameters::seasonal(self.linf, self.k, t_anchor, self.c, self.ts)
    }
}

impl From<&GrowthParameters> for GrowthShape {
    fn from(p: &GrowthParameters) -> Self {
        Self::seasonal(p.linf, p.k, p.c, p.ts)
    }
}

/// How the anchor time is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// Maximise ESP over `[0, 1)`.
    Optimise {
        /// Bracket width at which the refinement stops
        #[serde(default = "default_tol")]
        tol: f64,
        /// Evenly spaced anchors evaluated before refining (0 = refine over `[0, 1)` directly)
        #[serde(default = "default_grid_points")]
        grid_points: usize,
        /// Iteration cap of the refinement
        #[serde(default = "default_max_iterations")]
        max_iterations: usize,
    },

    /// Force the curve through `length` at sampling date `date_index`.
    Cross { date_index: usize, length: f64 },

    /// Force the curve through the cell with the largest restructured score.
    CrossMax,
}

impl Default for AnchorPolicy {
    fn default() -> Self {
        AnchorPolicy::Optimise {
            tol: default_tol(),
            grid_points: default_grid_points(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl AnchorPolicy {
    /// Check the policy against a sample with `n_dates` sampling dates.
    pub fn validate(&self, n_dates: usize) -> Result<()> {
        match *self {
            AnchorPolicy::Optimise { tol, .. } if !(tol > 0.0) => {
                Err(ElefanError::InvalidParameter(format!(
                    "anchor tolerance must be positive, got {}",
                    tol
                )))
            }
            AnchorPolicy::Cross { date_index, .. } if date_index >= n_dates => {
                Err(ElefanError::InvalidInput(format!(
                    "cross date index {} out of range for {} dates",
                    date_index, n_dates
                )))
            }
            AnchorPolicy::Cross { length, .. } if !length.is_finite() || length < 0.0 => {
                Err(ElefanError::InvalidInput(format!(
                    "cross length must be a non-negative number, got {}",
                    length
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Chosen anchor and the score of the resulting curve family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorFit {
    /// Anchor time in [0, 1)
    pub t_anchor: f64,

    pub fit: CurveFit,

    /// False when the refinement hit its iteration cap before `tol`
    pub converged: bool,

    /// Number of curve evaluations used
    pub evaluations: usize,
}

impl AnchorFit {
    pub fn params(&self, shape: &GrowthShape) -> GrowthParameters {
        shape.with_anchor(self.t_anchor)
    }
}

/// Map any real anchor onto `[0, 1)`.
pub fn wrap_anchor(t: f64) -> f64 {
    let w = t.rem_euclid(1.0);
    if w >= 1.0 {
        0.0
    } else {
        w
    }
}

/// Best anchor for `shape` under `policy`.
pub fn best_anchor(
    surface: &RestructuredSurface,
    shape: &GrowthShape,
    options: &EvaluationOptions,
    policy: &AnchorPolicy,
) -> Result<AnchorFit> {
    match *policy {
        AnchorPolicy::Optimise {
            tol,
            grid_points,
            max_iterations,
        } => optimise_anchor(surface, shape, options, tol, grid_points, max_iterations),
        AnchorPolicy::Cross { date_index, length } => {
            cross_anchor(surface, shape, options, date_index, length)
        }
        AnchorPolicy::CrossMax => {
            let (i, j) = surface.max_cell();
            let length = surface.sample().midpoints()[i];
            cross_anchor(surface, shape, options, j, length)
        }
    }
}

fn optimise_anchor(
    surface: &RestructuredSurface,
    shape: &GrowthShape,
    options: &EvaluationOptions,
    tol: f64,
    grid_points: usize,
    max_iterations: usize,
) -> Result<AnchorFit> {
    if !(tol > 0.0) {
        return Err(ElefanError::InvalidParameter(format!(
            "anchor tolerance must be positive, got {}",
            tol
        )));
    }

    let mut evaluations = 0;
    let mut eval_at = |t: f64| -> Result<CurveFit> {
        evaluations += 1;
        evaluate(surface, &shape.with_anchor(wrap_anchor(t)), options)
    };

    // coarse pre-scan; keeps the first of equal maxima
    let (mut best_t, mut best_fit, lo, hi) = if grid_points > 0 {
        let step = 1.0 / grid_points as f64;
        let mut best: Option<(f64, CurveFit)> = None;
        for i in 0..grid_points {
            let t = i as f64 / grid_points as f64;
            let fit = eval_at(t)?;
            if best.as_ref().map_or(true, |(_, b)| fit.esp > b.esp) {
                best = Some((t, fit));
            }
        }
        let (t, fit) = best.ok_or_else(|| {
            ElefanError::FunctionEvaluation("anchor pre-scan produced no candidate".to_string())
        })?;
        (t, Some(fit), t - step, t + step)
    } else {
        (0.0, None, 0.0, 1.0)
    };

    let refined = golden_section_max(
        |t| eval_at(t).map(|fit| fit.esp),
        lo,
        hi,
        tol,
        max_iterations,
    )?;

    let refined_t = wrap_anchor(refined.x);
    if best_fit.map_or(true, |b| refined.fx > b.esp) {
        best_t = refined_t;
        best_fit = Some(evaluate(surface, &shape.with_anchor(refined_t), options)?);
        evaluations += 1;
    }

    let fit = best_fit.ok_or_else(|| {
        ElefanError::FunctionEvaluation("anchor search produced no candidate".to_string())
    })?;

    if !refined.converged {
        debug!(
            linf = shape.linf,
            k = shape.k,
            iterations = refined.iterations,
            "anchor refinement stopped at iteration cap"
        );
    }

    Ok(AnchorFit {
        t_anchor: best_t,
        fit,
        converged: refined.converged,
        evaluations,
    })
}

fn cross_anchor(
    surface: &RestructuredSurface,
    shape: &GrowthShape,
    options: &EvaluationOptions,
    date_index: usize,
    length: f64,
) -> Result<AnchorFit> {
    let dates = surface.sample().dates();
    let Some(&t_target) = dates.get(date_index) else {
        return Err(ElefanError::InvalidInput(format!(
            "cross date index {} out of range for {} dates",
            date_index,
            dates.len()
        )));
    };
    if !length.is_finite() || length < 0.0 {
        return Err(ElefanError::InvalidInput(format!(
            "cross length must be a non-negative number, got {}",
            length
        )));
    }

    let probe = shape.with_anchor(0.0);
    probe.validate()?;
    let agemax = options.resolve_agemax(&probe)?;

    // zero-length times from agemax years before the target up to the target
    let steps = (agemax as f64 / CROSS_STEP).round() as usize;
    let mut best_t0 = t_target;
    let mut best_dist = f64::INFINITY;
    for s in 0..=steps {
        let t0 = t_target - agemax as f64 + s as f64 * CROSS_STEP;
        let dist = (seasonal_vbgf(&probe, t_target, t0) - length).powi(2);
        if dist < best_dist {
            best_dist = dist;
            best_t0 = t0;
        }
    }

    let t_anchor = wrap_anchor(best_t0);
    let fit = evaluate(surface, &shape.with_anchor(t_anchor), options)?;
    Ok(AnchorFit {
        t_anchor,
        fit,
        converged: true,
        evaluations: 1,
    })
}

/// Outcome of [`golden_section_max`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoldenSection {
    pub x: f64,
    pub fx: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Bounded golden-section search for a maximum of `f` on `[lo, hi]`.
///
/// Stops once the bracket is narrower than `tol` or after `max_iterations`
/// shrink steps. On flat stretches the left point is kept.
pub fn golden_section_max<F>(
    mut f: F,
    lo: f64,
    hi: f64,
    tol: f64,
    max_iterations: usize,
) -> Result<GoldenSection>
where
    F: FnMut(f64) -> Result<f64>,
{
    if !(lo <= hi) {
        return Err(ElefanError::InvalidInput(format!(
            "invalid search interval [{}, {}]",
            lo, hi
        )));
    }
    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;

    let (mut a, mut b) = (lo, hi);
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = f(c)?;
    let mut fd = f(d)?;

    let mut iterations = 0;
    while b - a > tol && iterations < max_iterations {
        if fc >= fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = f(c)?;
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = f(d)?;
        }
        iterations += 1;
    }

    let (x, fx) = if fc >= fd { (c, fc) } else { (d, fd) };
    Ok(GoldenSection {
        x,
        fx,
        iterations,
        converged: b - a <= tol,
    })
}
