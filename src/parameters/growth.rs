//! Von Bertalanffy growth parameters.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{ElefanError, Result};

/// Oldest age, in years, a cohort family may follow.
///
/// Evaluation cost grows with the number of cohorts, so growth coefficients
/// below `-ln(0.05) / MAX_AGEMAX` (about 0.03 per year) are rejected.
pub const MAX_AGEMAX: usize = 100;

/// Parameters of the (seasonalised) von Bertalanffy growth function.
///
/// `t_anchor` is the fractional year at which every yearly cohort of the
/// curve family starts from length zero. `c = 0` gives the plain VBGF and
/// makes `ts` irrelevant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthParameters {
    /// Asymptotic length
    pub linf: f64,

    /// Growth coefficient (per year)
    pub k: f64,

    /// Phase in [0, 1) of the zero-length crossing
    #[serde(default)]
    pub t_anchor: f64,

    /// Amplitude of seasonal oscillation
    #[serde(default)]
    pub c: f64,

    /// Summer point
    #[serde(default)]
    pub ts: f64,
}

impl GrowthParameters {
    /// Create non-seasonal parameters.
    pub fn new(linf: f64, k: f64, t_anchor: f64) -> Self {
        Self {
            linf,
            k,
            t_anchor,
            c: 0.0,
            ts: 0.0,
        }
    }

    /// Create seasonal parameters.
    pub fn seasonal(linf: f64, k: f64, t_anchor: f64, c: f64, ts: f64) -> Self {
        Self {
            linf,
            k,
            t_anchor,
            c,
            ts,
        }
    }

    /// Growth performance index `phi' = log10(K) + 2 log10(Linf)`.
    pub fn phi_l(&self) -> f64 {
        self.k.log10() + 2.0 * self.linf.log10()
    }

    /// Check `Linf > 0`, `K > 0`, finite values and `t_anchor` in [0, 1).
    pub fn validate(&self) -> Result<()> {
        let values = [self.linf, self.k, self.t_anchor, self.c, self.ts];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ElefanError::InvalidParameter(format!(
                "growth parameters must be finite: {:?}",
                self
            )));
        }
        if self.linf <= 0.0 {
            return Err(ElefanError::InvalidParameter(format!(
                "Linf must be positive, got {}",
                self.linf
            )));
        }
        if self.k <= 0.0 {
            return Err(ElefanError::InvalidParameter(format!(
                "K must be positive, got {}",
                self.k
            )));
        }
        if !(0.0..1.0).contains(&self.t_anchor) {
            return Err(ElefanError::InvalidParameter(format!(
                "t_anchor must lie in [0, 1), got {}",
                self.t_anchor
            )));
        }
        Ok(())
    }

    /// Age at which the non-seasonal curve reaches 95% of `Linf`, rounded up.
    ///
    /// At least one year; ages above [`MAX_AGEMAX`] are an error.
    pub fn default_agemax(&self) -> Result<usize> {
        let age = (-(1.0_f64 - 0.95).ln() / self.k).ceil();
        if !(age <= MAX_AGEMAX as f64) {
            return Err(ElefanError::InvalidParameter(format!(
                "K = {} implies an agemax of {} years, above the limit of {}",
                self.k, age, MAX_AGEMAX
            )));
        }
        Ok((age as usize).max(1))
    }
}

impl fmt::Display for GrowthParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Linf = {:.3}, K = {:.4}, t_anchor = {:.3}, C = {:.3}, ts = {:.3}, phiL = {:.3}",
            self.linf,
            self.k,
            self.t_anchor,
            self.c,
            self.ts,
            self.phi_l()
        )
    }
}

/// Seasonalised VBGF length at time `t` for a cohort starting from zero at `t0`.
///
/// `L(t) = Linf (1 - exp(-(K (t - t0) + S(t) - S(t0))))` with
/// `S(x) = C K / (2 pi) sin(2 pi (x - ts))`.
pub fn seasonal_vbgf(params: &GrowthParameters, t: f64, t0: f64) -> f64 {
    let amp = params.c * params.k / (2.0 * PI);
    let s_t = amp * (2.0 * PI * (t - params.ts)).sin();
    let s_t0 = amp * (2.0 * PI * (t0 - params.ts)).sin();
    params.linf * (1.0 - (-(params.k * (t - t0) + s_t - s_t0)).exp())
}
