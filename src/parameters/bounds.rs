//! Parameter bounds
//!
//! Bounds on a single growth parameter, and the named `low_par`/`up_par`
//! box used by the stochastic search drivers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::growth::GrowthParameters;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than or equal to max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Invalid bounds for {name}: min ({min}) must be less than or equal to max ({max})")]
    InvalidNamedBounds { name: &'static str, min: f64, max: f64 },

    #[error("Bounds for {name} must be finite, got [{min}, {max}]")]
    NonFinite { name: &'static str, min: f64, max: f64 },

    #[error("Bounds for {name} must be within {allowed}, got [{min}, {max}]")]
    OutOfDomain {
        name: &'static str,
        allowed: &'static str,
        min: f64,
        max: f64,
    },
}

/// Represents the bounds constraints on a parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

impl Bounds {
    /// Create a new bounds constraint with min and max values
    ///
    /// # Examples
    ///
    /// ```
    /// use elefan_rs::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert_eq!(bounds.max, 10.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// A degenerate range pinning the parameter to `value`.
    pub fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Check if a value is within the bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if the bounds are finite (both min and max are finite)
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Whether the range collapses to a single value.
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    /// Clamp a value to be within the bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Named search box over `(Linf, K, t_anchor, C, ts)`.
///
/// The stochastic drivers encode a candidate as a vector in this order; see
/// [`SearchBounds::to_vec`] and [`SearchBounds::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchBounds {
    pub linf: Bounds,
    pub k: Bounds,
    pub t_anchor: Bounds,
    pub c: Bounds,
    pub ts: Bounds,
}

/// Parameter names in encoding order.
pub const PARAMETER_NAMES: [&str; 5] = ["Linf", "K", "t_anchor", "C", "ts"];

impl SearchBounds {
    /// Build a search box from `low_par` and `up_par` vectors ordered as
    /// `(Linf, K, t_anchor, C, ts)`, validating every range.
    ///
    /// ```
    /// use elefan_rs::parameters::SearchBounds;
    ///
    /// let bounds = SearchBounds::from_low_up(
    ///     [40.0, 0.1, 0.0, 0.0, 0.0],
    ///     [60.0, 1.0, 1.0, 1.0, 1.0],
    /// ).unwrap();
    /// assert_eq!(bounds.linf.max, 60.0);
    /// ```
    pub fn from_low_up(low_par: [f64; 5], up_par: [f64; 5]) -> Result<Self, BoundsError> {
        let bounds = Self {
            linf: Bounds {
                min: low_par[0],
                max: up_par[0],
            },
            k: Bounds {
                min: low_par[1],
                max: up_par[1],
            },
            t_anchor: Bounds {
                min: low_par[2],
                max: up_par[2],
            },
            c: Bounds {
                min: low_par[3],
                max: up_par[3],
            },
            ts: Bounds {
                min: low_par[4],
                max: up_par[4],
            },
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Non-seasonal search box: `C` and `ts` pinned to zero.
    pub fn non_seasonal(linf: Bounds, k: Bounds) -> Result<Self, BoundsError> {
        let bounds = Self {
            linf,
            k,
            t_anchor: Bounds { min: 0.0, max: 1.0 },
            c: Bounds::fixed(0.0),
            ts: Bounds::fixed(0.0),
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check every range before a search starts.
    pub fn validate(&self) -> Result<(), BoundsError> {
        for (name, b) in PARAMETER_NAMES.iter().zip(self.to_vec()) {
            if !b.is_finite() {
                return Err(BoundsError::NonFinite {
                    name,
                    min: b.min,
                    max: b.max,
                });
            }
            if b.min > b.max {
                return Err(BoundsError::InvalidNamedBounds {
                    name,
                    min: b.min,
                    max: b.max,
                });
            }
        }
        if self.linf.min <= 0.0 || self.k.min <= 0.0 {
            let (name, b) = if self.linf.min <= 0.0 {
                ("Linf", self.linf)
            } else {
                ("K", self.k)
            };
            return Err(BoundsError::OutOfDomain {
                name,
                allowed: "(0, inf)",
                min: b.min,
                max: b.max,
            });
        }
        for (name, b) in [("t_anchor", self.t_anchor), ("ts", self.ts)] {
            if b.min < 0.0 || b.max > 1.0 {
                return Err(BoundsError::OutOfDomain {
                    name,
                    allowed: "[0, 1]",
                    min: b.min,
                    max: b.max,
                });
            }
        }
        if self.c.min < 0.0 {
            return Err(BoundsError::OutOfDomain {
                name: "C",
                allowed: "[0, inf)",
                min: self.c.min,
                max: self.c.max,
            });
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<Bounds> {
        vec![self.linf, self.k, self.t_anchor, self.c, self.ts]
    }

    /// Turn an encoded candidate into growth parameters, clamping each
    /// coordinate into its range.
    pub fn decode(&self, x: &[f64]) -> GrowthParameters {
        let b = self.to_vec();
        let t_anchor = b[2].clamp(x[2]);
        GrowthParameters {
            linf: b[0].clamp(x[0]),
            k: b[1].clamp(x[1]),
            // the anchor is a phase, so an upper bound of 1 means just below 1
            t_anchor: if t_anchor >= 1.0 { 0.0 } else { t_anchor },
            c: b[3].clamp(x[3]),
            ts: b[4].clamp(x[4]),
        }
    }

    /// Centre of the box, used as the default starting candidate.
    pub fn centre(&self) -> Vec<f64> {
        self.to_vec().iter().map(Bounds::midpoint).collect()
    }
}
