//! Leave-one-date-out jackknife.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::elefan::{fit, ElefanConfig};
use crate::error::{ElefanError, Result};
use crate::global_opt::{SearchControl, SearchResult, Termination};
use crate::lfq::LengthFrequency;
use crate::parameters::PARAMETER_NAMES;

use super::ParameterSummary;

fn default_z() -> f64 {
    1.96
}

/// Settings of a jackknife run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JackknifeConfig {
    /// Settings of every partial fit
    pub fit: ElefanConfig,

    /// Normal quantile of the confidence intervals. Default: 1.96
    #[serde(default = "default_z")]
    pub z: f64,
}

impl JackknifeConfig {
    pub fn new(fit: ElefanConfig) -> Self {
        Self { fit, z: default_z() }
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = z;
        self
    }
}

/// One partial fit.
#[derive(Debug, Clone, Serialize)]
pub struct JackknifeRun {
    /// Index of the sampling date left out
    pub omitted: usize,

    /// Decimal year of the sampling date left out
    pub omitted_date: f64,

    /// Search outcome; `None` if the fit failed or was cancelled
    pub outcome: Option<SearchResult>,
}

/// All partial fits and their summary.
#[derive(Debug, Clone, Serialize)]
pub struct JackknifeResult {
    pub runs: Vec<JackknifeRun>,

    /// Linf, K, t_anchor, C, ts and phiL, in that order
    pub summary: Vec<ParameterSummary>,

    /// True if some runs were skipped through the cancel token
    pub cancelled: bool,
}

impl JackknifeResult {
    /// Number of partial fits that produced a result.
    pub fn successful(&self) -> usize {
        self.runs.iter().filter(|r| r.outcome.is_some()).count()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSummary> {
        self.summary.iter().find(|s| s.name == name)
    }
}

/// Re-fit `lfq` once per sampling date with that date left out.
///
/// Partial fits run in parallel. A failing partial fit is logged and left
/// out of the summary. A partial fit skipped or interrupted through the
/// cancel token has no outcome and sets `cancelled`.
///
/// # Arguments
///
/// * `lfq` - The full sample (at least three sampling dates)
/// * `config` - Fit settings and interval width
/// * `control` - Cancellation (progress display is not used for partial fits)
pub fn jackknife(
    lfq: &LengthFrequency,
    config: &JackknifeConfig,
    control: &SearchControl,
) -> Result<JackknifeResult> {
    if lfq.n_dates() < 3 {
        return Err(ElefanError::InvalidInput(format!(
            "jackknife needs at least 3 sampling dates, got {}",
            lfq.n_dates()
        )));
    }
    if !(config.z > 0.0) || !config.z.is_finite() {
        return Err(ElefanError::InvalidParameter(format!(
            "interval quantile must be positive, got {}",
            config.z
        )));
    }

    let partial_control = SearchControl::new().with_cancel_token(control.cancel.clone());

    let runs: Vec<(JackknifeRun, bool)> = (0..lfq.n_dates())
        .into_par_iter()
        .map(|j| {
            let omitted_date = lfq.dates()[j];
            if control.is_cancelled() {
                let run = JackknifeRun {
                    omitted: j,
                    omitted_date,
                    outcome: None,
                };
                return (run, true);
            }
            let outcome = lfq
                .without_date(j)
                .and_then(|partial| fit(&partial, &config.fit, &partial_control));
            let (outcome, skipped) = match outcome {
                Ok(f) if f.result().termination == Termination::Cancelled => (None, true),
                Ok(f) => (Some(f.into_result()), false),
                Err(e) => {
                    warn!(omitted = j, error = %e, "jackknife fit failed");
                    (None, false)
                }
            };
            let run = JackknifeRun {
                omitted: j,
                omitted_date,
                outcome,
            };
            (run, skipped)
        })
        .collect();

    let cancelled = runs.iter().any(|(_, skipped)| *skipped);
    let runs: Vec<JackknifeRun> = runs.into_iter().map(|(run, _)| run).collect();

    let partials: Vec<[f64; 6]> = runs
        .iter()
        .filter_map(|r| r.outcome.as_ref())
        .map(|o| [o.par.linf, o.par.k, o.par.t_anchor, o.par.c, o.par.ts, o.phi_l])
        .collect();

    let names = PARAMETER_NAMES.iter().copied().chain(std::iter::once("phiL"));
    let summary: Vec<ParameterSummary> = names
        .enumerate()
        .filter_map(|(i, name)| {
            let values: Vec<f64> = partials.iter().map(|p| p[i]).collect();
            match name {
                "t_anchor" | "ts" => ParameterSummary::from_phases(name, &values, config.z),
                _ => ParameterSummary::from_partials(name, &values, config.z),
            }
        })
        .collect();

    if summary.is_empty() && !cancelled {
        return Err(ElefanError::FunctionEvaluation(format!(
            "only {} of {} jackknife fits succeeded",
            partials.len(),
            runs.len()
        )));
    }

    info!(
        runs = runs.len(),
        successful = partials.len(),
        cancelled,
        "jackknife finished"
    );
    Ok(JackknifeResult {
        runs,
        summary,
        cancelled,
    })
}
