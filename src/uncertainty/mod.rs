//! # Uncertainty of Growth Estimates
//!
//! ELEFAN returns point estimates only. This module resamples the data to
//! judge how much those estimates depend on individual sampling dates:
//!
//! - Jackknife re-fits with one sampling date left out at a time
//! - Jackknife mean, standard error and normal-approximation confidence
//!   interval for each growth parameter and for `phiL`
//!
//! `t_anchor` and `ts` are phases on `[0, 1)` and are summarised on the
//! circle: estimates of 0.02 and 0.98 have mean 0.0, not 0.5.

mod jackknife;

pub use jackknife::{jackknife, JackknifeConfig, JackknifeResult, JackknifeRun};

use serde::Serialize;
use std::f64::consts::TAU;

/// Jackknife summary of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSummary {
    pub name: &'static str,

    /// Mean of the partial estimates
    pub mean: f64,

    /// Jackknife standard error
    pub std_error: f64,

    /// Lower end of the confidence interval
    pub lower: f64,

    /// Upper end of the confidence interval
    pub upper: f64,
}

impl ParameterSummary {
    /// Summarise partial estimates `values`.
    ///
    /// # Arguments
    ///
    /// * `name` - Parameter name
    /// * `values` - One estimate per leave-one-out fit (at least two)
    /// * `z` - Normal quantile of the interval (1.96 for 95%)
    pub fn from_partials(name: &'static str, values: &[f64], z: f64) -> Option<Self> {
        let n = values.len();
        if n < 2 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        let std_error = ((n - 1) as f64 / n as f64 * ss).sqrt();
        Some(Self {
            name,
            mean,
            std_error,
            lower: mean - z * std_error,
            upper: mean + z * std_error,
        })
    }

    /// Summarise partial estimates of a phase on `[0, 1)`.
    ///
    /// The mean is the circular mean mapped back onto `[0, 1)`; deviations
    /// from it are taken the short way round the circle. The interval ends
    /// are not wrapped, so `lower` may be negative and `upper` may exceed 1.
    pub fn from_phases(name: &'static str, values: &[f64], z: f64) -> Option<Self> {
        let n = values.len();
        if n < 2 {
            return None;
        }
        let (sin, cos) = values
            .iter()
            .fold((0.0, 0.0), |(s, c), v| (s + (TAU * v).sin(), c + (TAU * v).cos()));
        let mean = (sin.atan2(cos) / TAU).rem_euclid(1.0);
        let mean = if mean >= 1.0 { 0.0 } else { mean };
        let ss: f64 = values
            .iter()
            .map(|v| {
                let d = (v - mean).rem_euclid(1.0);
                let d = if d > 0.5 { d - 1.0 } else { d };
                d * d
            })
            .sum();
        let std_error = ((n - 1) as f64 / n as f64 * ss).sqrt();
        Some(Self {
            name,
            mean,
            std_error,
            lower: mean - z * std_error,
            upper: mean + z * std_error,
        })
    }
}
