//! Exhaustive grid scan over `(Linf, K)`.
//!
//! Every cell of the Cartesian product of a `Linf` grid and a `K` grid gets
//! its own anchor search. With a single `Linf` value this is the classic
//! K-scan; with several it is the response surface. The seasonal terms are
//! held fixed for the whole scan.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::anchor::GrowthShape;
use crate::error::{ElefanError, Result};
use crate::global_opt::progress::Progress;
use crate::global_opt::{
    fit_shapes_parallel, ScoreSurface, SearchControl, SearchResult, SearchStrategy, Termination,
    TraceEntry,
};
use crate::problem::{GrowthObjective, WORST_SCORE};

/// Grid scan over asymptotic length and growth coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridScan {
    /// Candidate asymptotic lengths (columns of the score surface)
    pub linf: Vec<f64>,

    /// Candidate growth coefficients (rows of the score surface)
    pub k: Vec<f64>,

    /// Seasonal amplitude used for every cell
    #[serde(default)]
    pub c: f64,

    /// Summer point used for every cell
    #[serde(default)]
    pub ts: f64,
}

impl GridScan {
    /// Create a response-surface scan over the given grids.
    ///
    /// # Arguments
    ///
    /// * `linf` - Candidate asymptotic lengths
    /// * `k` - Candidate growth coefficients
    pub fn new(linf: Vec<f64>, k: Vec<f64>) -> Self {
        Self {
            linf,
            k,
            c: 0.0,
            ts: 0.0,
        }
    }

    /// K-scan: a single asymptotic length and a grid of growth coefficients.
    pub fn k_scan(linf: f64, k: Vec<f64>) -> Self {
        Self::new(vec![linf], k)
    }

    /// Evenly spaced grids including both ends.
    ///
    /// # Arguments
    ///
    /// * `linf` - `(first, last, steps)` for the asymptotic length
    /// * `k` - `(first, last, steps)` for the growth coefficient
    pub fn from_ranges(linf: (f64, f64, usize), k: (f64, f64, usize)) -> Self {
        Self::new(linspace(linf.0, linf.1, linf.2), linspace(k.0, k.1, k.2))
    }

    /// Hold the seasonal terms at fixed values during the scan.
    pub fn with_seasonality(mut self, c: f64, ts: f64) -> Self {
        self.c = c;
        self.ts = ts;
        self
    }

    pub fn n_cells(&self) -> usize {
        self.linf.len() * self.k.len()
    }

    fn validate(&self) -> Result<()> {
        for (name, grid) in [("Linf", &self.linf), ("K", &self.k)] {
            if grid.is_empty() {
                return Err(ElefanError::BoundsViolation(format!(
                    "{} grid is empty",
                    name
                )));
            }
            if let Some(v) = grid.iter().find(|v| !v.is_finite() || **v <= 0.0) {
                return Err(ElefanError::BoundsViolation(format!(
                    "{} grid values must be positive and finite, got {}",
                    name, v
                )));
            }
        }
        if !self.c.is_finite() || self.c < 0.0 || !(0.0..=1.0).contains(&self.ts) {
            return Err(ElefanError::BoundsViolation(format!(
                "invalid seasonal terms C = {}, ts = {}",
                self.c, self.ts
            )));
        }
        Ok(())
    }

    /// Cells in row-major order: `K` outer, `Linf` inner.
    fn shapes(&self) -> Vec<GrowthShape> {
        self.k
            .iter()
            .flat_map(|&k| {
                self.linf
                    .iter()
                    .map(move |&linf| GrowthShape::seasonal(linf, k, self.c, self.ts))
            })
            .collect()
    }
}

fn linspace(first: f64, last: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![first],
        n => (0..n)
            .map(|i| first + (last - first) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

impl SearchStrategy for GridScan {
    fn name(&self) -> &'static str {
        "grid scan"
    }

    fn search<O: GrowthObjective>(
        &self,
        objective: &O,
        control: &SearchControl,
    ) -> Result<SearchResult> {
        self.validate()?;

        let shapes = self.shapes();
        let progress = Progress::new(shapes.len() as u64, control.progress, "grid scan");
        let fits = fit_shapes_parallel(objective, &shapes, || {
            let cancelled = control.is_cancelled();
            if !cancelled {
                progress.inc();
            }
            cancelled
        });
        progress.finish();

        let (nk, nl) = (self.k.len(), self.linf.len());
        let mut score = Array2::from_elem((nk, nl), WORST_SCORE);
        let mut esp = Array2::zeros((nk, nl));
        let mut t_anchor = Array2::from_elem((nk, nl), f64::NAN);

        let mut best: Option<(usize, f64, f64)> = None;
        let mut trace = Vec::with_capacity(shapes.len());
        let mut evaluations = 0;
        let mut evaluated = 0;
        let mut skipped = 0;
        let mut nonconverged = 0;

        // sequential pass keeps the first of equal maxima
        for (cell, fit) in fits.into_iter().enumerate() {
            let (row, col) = (cell / nl, cell % nl);
            let cell_score = match fit {
                None => {
                    skipped += 1;
                    continue;
                }
                Some(Ok(a)) => {
                    evaluations += a.evaluations;
                    if !a.converged {
                        nonconverged += 1;
                    }
                    esp[[row, col]] = a.fit.esp;
                    t_anchor[[row, col]] = a.t_anchor;
                    if a.fit.score.is_finite() {
                        a.fit.score
                    } else {
                        WORST_SCORE
                    }
                }
                Some(Err(e)) => {
                    debug!(linf = shapes[cell].linf, k = shapes[cell].k, error = %e, "cell scored as worst");
                    WORST_SCORE
                }
            };
            evaluated += 1;
            score[[row, col]] = cell_score;

            if best.map_or(true, |(_, s, _)| cell_score > s) {
                best = Some((cell, cell_score, t_anchor[[row, col]]));
            }
            trace.push(TraceEntry {
                iteration: cell,
                mean: cell_score,
                best: best.map_or(WORST_SCORE, |(_, s, _)| s),
            });
        }

        let termination = if skipped > 0 {
            Termination::Cancelled
        } else {
            Termination::Completed
        };

        let (par, rn_max) = match best {
            Some((cell, s, t)) => {
                let anchor = if t.is_finite() { t } else { 0.0 };
                (shapes[cell].with_anchor(anchor), s)
            }
            None => (shapes[0].with_anchor(0.0), WORST_SCORE),
        };

        let mut result = SearchResult::from_best(
            objective,
            par,
            rn_max,
            trace,
            evaluated,
            evaluations,
            termination,
        );
        result.anchor_nonconverged = nonconverged;
        result.score_surface = Some(ScoreSurface {
            linf: self.linf.clone(),
            k: self.k.clone(),
            score,
            esp,
            t_anchor,
        });

        info!(
            cells = evaluated,
            rn_max = result.rn_max,
            linf = result.par.linf,
            k = result.par.k,
            t_anchor = result.par.t_anchor,
            termination = result.termination.description(),
            "grid scan finished"
        );
        Ok(result)
    }
}
