//! Restructuring of length-frequency data.
//!
//! Raw counts are turned into peak/trough scores relative to a local moving
//! average, one sampling date at a time. Positive cells are grouped into
//! peaks, and the available sum of peaks (ASP) is the sum of each peak's
//! largest score. The resulting [`RestructuredSurface`] is computed once and
//! shared read-only by every candidate growth curve.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ElefanError, Result};
use crate::lfq::LengthFrequency;

pub mod moving_average;
pub mod peaks;

pub use peaks::Connectivity;

use moving_average::{
    balance_troughs, centred_moving_average, peak_trough_score, relative_counts,
};
use peaks::{label_peaks, peak_maxima, suppress_minor_peaks};

/// Options for [`restructure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestructureConfig {
    /// Moving-average window in length classes (odd). Default: 5
    pub ma: usize,

    /// Additional square-root compression of peak scores. Default: false
    pub addl_sqrt: bool,

    /// Remove peaks that are small relative to the strongest peak of the
    /// same sampling date. Default: true
    pub flag_small_peaks: bool,

    /// Mass fraction of the strongest peak below which a peak is removed. Default: 0.05
    pub min_peak_fraction: f64,

    /// Rescale troughs so that their mass matches the peaks. Default: true
    pub balance_troughs: bool,

    /// Neighbourhood used to group positive cells into peaks. Default: Column
    pub connectivity: Connectivity,
}

impl Default for RestructureConfig {
    fn default() -> Self {
        Self {
            ma: 5,
            addl_sqrt: false,
            flag_small_peaks: true,
            min_peak_fraction: 0.05,
            balance_troughs: true,
            connectivity: Connectivity::Column,
        }
    }
}

impl RestructureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ma(mut self, ma: usize) -> Self {
        self.ma = ma;
        self
    }

    pub fn with_addl_sqrt(mut self, addl_sqrt: bool) -> Self {
        self.addl_sqrt = addl_sqrt;
        self
    }

    pub fn with_peak_flagging(mut self, enabled: bool, min_fraction: f64) -> Self {
        self.flag_small_peaks = enabled;
        self.min_peak_fraction = min_fraction;
        self
    }

    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.ma == 0 || self.ma % 2 == 0 {
            return Err(ElefanError::InvalidInput(format!(
                "moving average window must be an odd integer >= 1, got {}",
                self.ma
            )));
        }
        if !(0.0..=1.0).contains(&self.min_peak_fraction) {
            return Err(ElefanError::InvalidInput(format!(
                "min_peak_fraction must lie in [0, 1], got {}",
                self.min_peak_fraction
            )));
        }
        Ok(())
    }
}

/// Restructured scores of a length-frequency sample.
#[derive(Debug, Clone, Serialize)]
pub struct RestructuredSurface {
    sample: LengthFrequency,
    rcounts: Array2<f64>,
    peaks_mat: Array2<usize>,
    peak_maxima: Vec<f64>,
    asp: f64,
    degenerate_columns: Vec<usize>,
}

impl RestructuredSurface {
    /// The sample the surface was computed from.
    pub fn sample(&self) -> &LengthFrequency {
        &self.sample
    }

    /// Signed restructured scores, same shape as the catch matrix.
    pub fn rcounts(&self) -> &Array2<f64> {
        &self.rcounts
    }

    /// Peak labels (0 = no peak).
    pub fn peaks_mat(&self) -> &Array2<usize> {
        &self.peaks_mat
    }

    /// Number of distinct peaks.
    pub fn n_peaks(&self) -> usize {
        self.peak_maxima.len()
    }

    /// Largest score of the peak labelled `label`.
    pub fn peak_max(&self, label: usize) -> Option<f64> {
        label
            .checked_sub(1)
            .and_then(|i| self.peak_maxima.get(i))
            .copied()
    }

    /// Available sum of peaks.
    pub fn asp(&self) -> f64 {
        self.asp
    }

    /// Sampling dates skipped because their total catch was zero.
    pub fn degenerate_columns(&self) -> &[usize] {
        &self.degenerate_columns
    }

    /// Fail with [`ElefanError::DegenerateColumn`] if any sampling date was skipped.
    pub fn require_complete(&self) -> Result<()> {
        match self.degenerate_columns.first() {
            Some(&column) => Err(ElefanError::DegenerateColumn { column }),
            None => Ok(()),
        }
    }

    /// Cell with the largest restructured score (first in column-major order on ties).
    pub fn max_cell(&self) -> (usize, usize) {
        let (n_len, n_dates) = self.rcounts.dim();
        let mut best = (0, 0);
        for j in 0..n_dates {
            for i in 0..n_len {
                if self.rcounts[[i, j]] > self.rcounts[[best.0, best.1]] {
                    best = (i, j);
                }
            }
        }
        best
    }
}

/// Restructure every sampling date of `sample`.
///
/// Dates with zero total catch are skipped with a warning and contribute no
/// peaks. Fails with [`ElefanError::DegenerateSurface`] when no positive peak
/// remains anywhere, since no growth curve could then be scored.
pub fn restructure(sample: &LengthFrequency, config: &RestructureConfig) -> Result<RestructuredSurface> {
    config.validate()?;

    let (n_len, n_dates) = sample.catch().dim();
    let mut rcounts = Array2::<f64>::zeros((n_len, n_dates));
    let mut degenerate_columns = Vec::new();

    for (j, counts) in sample.catch().axis_iter(Axis(1)).enumerate() {
        let counts = counts.to_vec();
        if counts.iter().sum::<f64>() <= 0.0 {
            warn!(column = j, date = sample.dates()[j], "sampling date has zero total catch, skipped");
            degenerate_columns.push(j);
            continue;
        }

        let scores = restructure_column(&counts, config);
        rcounts.column_mut(j).assign(&ndarray::Array1::from(scores));
    }

    let (peaks_mat, n_peaks) = label_peaks(&rcounts, config.connectivity);
    let maxima = peak_maxima(&rcounts, &peaks_mat, n_peaks);
    let asp: f64 = maxima.iter().sum();

    debug!(n_peaks, asp, degenerate = degenerate_columns.len(), "restructured sample");

    if !(asp > 0.0) {
        return Err(ElefanError::DegenerateSurface);
    }

    Ok(RestructuredSurface {
        sample: sample.clone(),
        rcounts,
        peaks_mat,
        peak_maxima: maxima,
        asp,
        degenerate_columns,
    })
}

/// Peak/trough scores for one sampling date.
fn restructure_column(counts: &[f64], config: &RestructureConfig) -> Vec<f64> {
    let ma = centred_moving_average(counts, config.ma);
    let ratios = relative_counts(counts, &ma, config.ma);
    let mut scores: Vec<f64> = ratios
        .iter()
        .map(|&r| peak_trough_score(r, config.addl_sqrt))
        .collect();

    if config.flag_small_peaks {
        suppress_minor_peaks(&mut scores, config.min_peak_fraction);
    }
    if config.balance_troughs {
        balance_troughs(&mut scores);
    }
    scores
}
