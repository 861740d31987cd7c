//! Von Bertalanffy curve family and its score against a restructured surface.
//!
//! A candidate [`GrowthParameters`] describes one growth curve that repeats
//! every year: cohort `y` starts from length zero at `y + t_anchor`. The
//! family covers `agemax` years of history before the first sample up to the
//! last sample. For every sampling date, each cohort alive at that date falls
//! into one length class; the positive restructured scores it lands on make
//! up the explained sum of peaks (ESP).

use serde::{Deserialize, Serialize};

use crate::error::{ElefanError, Result};
use crate::parameters::{seasonal_vbgf, GrowthParameters, MAX_AGEMAX};
use crate::restructure::RestructuredSurface;

/// Options of the curve evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Oldest age followed by each cohort. `None` derives it from `K`. Default: None
    pub agemax: Option<usize>,

    /// Count every peak at most once across the cohort family. Default: true
    pub flagging_out: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            agemax: None,
            flagging_out: true,
        }
    }
}

impl EvaluationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agemax(mut self, agemax: usize) -> Self {
        self.agemax = Some(agemax);
        self
    }

    pub fn with_flagging_out(mut self, flagging_out: bool) -> Self {
        self.flagging_out = flagging_out;
        self
    }

    /// Oldest age followed for `params`: the fixed `agemax` if set, otherwise
    /// the one derived from `K`. Must lie in `1..=MAX_AGEMAX`.
    pub fn resolve_agemax(&self, params: &GrowthParameters) -> Result<usize> {
        match self.agemax {
            Some(0) => Err(ElefanError::InvalidParameter(
                "agemax must be at least one year".to_string(),
            )),
            Some(agemax) if agemax > MAX_AGEMAX => Err(ElefanError::InvalidParameter(format!(
                "agemax {} is above the limit of {} years",
                agemax, MAX_AGEMAX
            ))),
            Some(agemax) => Ok(agemax),
            None => params.default_agemax(),
        }
    }
}

/// Outcome of scoring one growth curve family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveFit {
    /// Explained sum of peaks
    pub esp: f64,

    /// `round(10^(ESP/ASP) / 10, 3)`
    pub score: f64,

    /// Number of yearly cohorts in the family
    pub ncohort: usize,

    /// Oldest age followed
    pub agemax: usize,
}

/// Yearly-repeating cohorts of one growth curve.
#[derive(Debug, Clone)]
pub struct GrowthCurveFamily {
    params: GrowthParameters,
    agemax: usize,
    first_year: i64,
    last_year: i64,
}

/// Sampled path of one cohort, for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortTrajectory {
    /// Time at which the cohort has length zero
    pub t0: f64,
    pub times: Vec<f64>,
    pub lengths: Vec<f64>,
}

impl GrowthCurveFamily {
    /// Family covering `[t_first - agemax, t_last]`.
    pub fn new(params: GrowthParameters, t_first: f64, t_last: f64, agemax: usize) -> Self {
        Self {
            params,
            agemax,
            first_year: (t_first.floor() as i64)
                .saturating_sub(i64::try_from(agemax).unwrap_or(i64::MAX)),
            last_year: t_last.floor() as i64,
        }
    }

    pub fn ncohort(&self) -> usize {
        let span = self.last_year.saturating_sub(self.first_year).saturating_add(1);
        usize::try_from(span).unwrap_or(0)
    }

    pub fn agemax(&self) -> usize {
        self.agemax
    }

    /// Zero-length times of all cohorts, oldest first.
    pub fn cohort_origins(&self) -> impl Iterator<Item = f64> + '_ {
        (self.first_year..=self.last_year).map(move |y| y as f64 + self.params.t_anchor)
    }

    /// Lengths of all cohorts alive at time `t` (age in `[0, agemax]`).
    pub fn lengths_at(&self, t: f64) -> impl Iterator<Item = f64> + '_ {
        let agemax = self.agemax as f64;
        self.cohort_origins().filter_map(move |t0| {
            let age = t - t0;
            if (0.0..=agemax).contains(&age) {
                Some(seasonal_vbgf(&self.params, t, t0))
            } else {
                None
            }
        })
    }

    /// Each cohort sampled every `tincr` years over its life, clipped to `t_end`.
    pub fn trajectories(&self, tincr: f64, t_end: f64) -> Vec<CohortTrajectory> {
        let step = if tincr > 0.0 { tincr } else { 0.05 };
        self.cohort_origins()
            .map(|t0| {
                let stop = (t0 + self.agemax as f64).min(t_end);
                let n = ((stop - t0) / step).floor().max(-1.0) as i64 + 1;
                let times: Vec<f64> = (0..n).map(|i| t0 + i as f64 * step).collect();
                let lengths = times
                    .iter()
                    .map(|&t| seasonal_vbgf(&self.params, t, t0))
                    .collect();
                CohortTrajectory { t0, times, lengths }
            })
            .collect()
    }
}

/// Score of an explained sum of peaks relative to the available sum.
///
/// ```
/// use elefan_rs::vbgf::score_from_esp;
///
/// assert_eq!(score_from_esp(4.0, 4.0).unwrap(), 1.0);
/// assert_eq!(score_from_esp(0.0, 4.0).unwrap(), 0.1);
/// assert!(score_from_esp(1.0, 0.0).is_err());
/// ```
pub fn score_from_esp(esp: f64, asp: f64) -> Result<f64> {
    if !(asp > 0.0) {
        return Err(ElefanError::DegenerateSurface);
    }
    let raw = 10f64.powf(esp / asp) / 10.0;
    if !raw.is_finite() {
        return Err(ElefanError::FunctionEvaluation(format!(
            "non-finite score for ESP = {}, ASP = {}",
            esp, asp
        )));
    }
    Ok(round_to(raw, 3))
}

pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Explained sum of peaks of the curve family described by `params`.
///
/// With `flagging_out`, a peak crossed several times (by several cohorts or
/// on several of its cells) contributes only its largest crossed score, so
/// `ESP <= ASP`. Without it every positive crossing adds up.
pub fn evaluate(
    surface: &RestructuredSurface,
    params: &GrowthParameters,
    options: &EvaluationOptions,
) -> Result<CurveFit> {
    params.validate()?;
    let agemax = options.resolve_agemax(params)?;

    let sample = surface.sample();
    let dates = sample.dates();
    let family = GrowthCurveFamily::new(*params, dates[0], dates[dates.len() - 1], agemax);

    let rcounts = surface.rcounts();
    let labels = surface.peaks_mat();
    let mut crossed = vec![0.0_f64; surface.n_peaks()];
    let mut total = 0.0;

    for (j, &t) in dates.iter().enumerate() {
        for length in family.lengths_at(t) {
            if !length.is_finite() {
                return Err(ElefanError::FunctionEvaluation(format!(
                    "non-finite length at t = {} for {}",
                    t, params
                )));
            }
            let Some(i) = sample.bin_index(length) else {
                continue;
            };
            let value = rcounts[[i, j]];
            if value > 0.0 {
                let slot = &mut crossed[labels[[i, j]] - 1];
                *slot = slot.max(value);
                total += value;
            }
        }
    }

    let esp = if options.flagging_out {
        crossed.iter().sum()
    } else {
        total
    };

    Ok(CurveFit {
        esp,
        score: score_from_esp(esp, surface.asp())?,
        ncohort: family.ncohort(),
        agemax,
    })
}
