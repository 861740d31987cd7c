//! Length-frequency data container.
//!
//! A [`LengthFrequency`] holds length-class midpoints, sampling times (as
//! decimal years) and a counts matrix with one row per length class and one
//! column per sampling date. Construction validates everything; afterwards
//! the sample is immutable input to the restructuring and scoring code.

use chrono::{Datelike, NaiveDate};
use ndarray::{Array2, Axis};
use serde::Serialize;

use crate::error::{ElefanError, Result};

/// Relative tolerance when checking that length classes are evenly spaced.
const BIN_WIDTH_RTOL: f64 = 1e-6;

/// Length-frequency sample: counts by length class and sampling date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthFrequency {
    midpoints: Vec<f64>,
    dates: Vec<f64>,
    catch: Array2<f64>,
    bin_width: f64,
}

impl LengthFrequency {
    /// Create a sample from midpoints, decimal-year dates and counts.
    ///
    /// # Arguments
    ///
    /// * `midpoints` - Ascending, evenly spaced length-class midpoints (at least two)
    /// * `dates` - Non-decreasing sampling times in decimal years
    /// * `catch` - Counts, shape `(midpoints.len(), dates.len())`
    pub fn new(midpoints: Vec<f64>, dates: Vec<f64>, catch: Array2<f64>) -> Result<Self> {
        if midpoints.len() < 2 {
            return Err(ElefanError::InvalidInput(format!(
                "at least two length classes are required, got {}",
                midpoints.len()
            )));
        }
        if dates.is_empty() {
            return Err(ElefanError::InvalidInput(
                "at least one sampling date is required".to_string(),
            ));
        }
        if catch.dim() != (midpoints.len(), dates.len()) {
            return Err(ElefanError::InvalidInput(format!(
                "catch matrix has shape {:?}, expected ({}, {})",
                catch.dim(),
                midpoints.len(),
                dates.len()
            )));
        }
        if midpoints.iter().chain(dates.iter()).any(|v| !v.is_finite()) {
            return Err(ElefanError::InvalidInput(
                "midpoints and dates must be finite".to_string(),
            ));
        }
        if let Some(i) = midpoints.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ElefanError::InvalidInput(format!(
                "length classes must be strictly ascending (class {} = {}, class {} = {})",
                i,
                midpoints[i],
                i + 1,
                midpoints[i + 1]
            )));
        }
        if let Some(j) = dates.windows(2).position(|w| w[1] < w[0]) {
            return Err(ElefanError::InvalidInput(format!(
                "sampling dates must be ascending (date {} = {}, date {} = {})",
                j,
                dates[j],
                j + 1,
                dates[j + 1]
            )));
        }
        if catch.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Err(ElefanError::InvalidInput(
                "counts must be finite and non-negative".to_string(),
            ));
        }

        let expected = midpoints[1] - midpoints[0];
        for (i, w) in midpoints.windows(2).enumerate() {
            let width = w[1] - w[0];
            if (width - expected).abs() > BIN_WIDTH_RTOL * expected.abs() {
                return Err(ElefanError::InvalidBinSize {
                    index: i + 1,
                    width,
                    expected,
                });
            }
        }

        Ok(Self {
            midpoints,
            dates,
            catch,
            bin_width: expected,
        })
    }

    /// Create a sample from calendar sampling dates.
    pub fn from_calendar_dates(
        midpoints: Vec<f64>,
        dates: &[NaiveDate],
        catch: Array2<f64>,
    ) -> Result<Self> {
        let decimal = dates.iter().map(|d| date_to_decimal_year(*d)).collect();
        Self::new(midpoints, decimal, catch)
    }

    pub fn midpoints(&self) -> &[f64] {
        &self.midpoints
    }

    /// Sampling times in decimal years.
    pub fn dates(&self) -> &[f64] {
        &self.dates
    }

    pub fn catch(&self) -> &Array2<f64> {
        &self.catch
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn n_lengths(&self) -> usize {
        self.midpoints.len()
    }

    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    /// Lower edge of the first length class.
    pub fn lower_edge(&self) -> f64 {
        self.midpoints[0] - 0.5 * self.bin_width
    }

    /// Index of the class whose half-open interval `[mid - w/2, mid + w/2)`
    /// contains `length`, if any.
    pub fn bin_index(&self, length: f64) -> Option<usize> {
        if !length.is_finite() {
            return None;
        }
        let pos = ((length - self.lower_edge()) / self.bin_width).floor();
        if pos < 0.0 || pos >= self.midpoints.len() as f64 {
            None
        } else {
            Some(pos as usize)
        }
    }

    /// Copy of the sample with sampling date `j` removed.
    pub fn without_date(&self, j: usize) -> Result<Self> {
        if j >= self.dates.len() {
            return Err(ElefanError::InvalidInput(format!(
                "date index {} out of range for {} dates",
                j,
                self.dates.len()
            )));
        }
        if self.dates.len() == 1 {
            return Err(ElefanError::InvalidInput(
                "cannot remove the only sampling date".to_string(),
            ));
        }
        let keep: Vec<usize> = (0..self.dates.len()).filter(|&c| c != j).collect();
        let dates = keep.iter().map(|&c| self.dates[c]).collect();
        let catch = self.catch.select(Axis(1), &keep);
        Self::new(self.midpoints.clone(), dates, catch)
    }
}

/// Convert a calendar date to a decimal year (`2020-01-01` -> `2020.0`).
pub fn date_to_decimal_year(date: NaiveDate) -> f64 {
    let year = date.year();
    year as f64 + date.ordinal0() as f64 / days_in_year(year) as f64
}

/// Convert a decimal year back to the calendar date it falls on.
pub fn decimal_year_to_date(t: f64) -> Option<NaiveDate> {
    if !t.is_finite() {
        return None;
    }
    let year = t.floor() as i32;
    let days = days_in_year(year);
    let ordinal0 = ((t - year as f64) * days as f64).round() as u32;
    NaiveDate::from_yo_opt(year, ordinal0.min(days - 1) + 1)
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn sample() -> LengthFrequency {
        LengthFrequency::new(
            vec![5.0, 7.0, 9.0],
            vec![2020.1, 2020.5],
            array![[1.0, 0.0], [3.0, 2.0], [0.0, 4.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_bin_width_and_index() {
        let lfq = sample();
        assert_eq!(lfq.bin_width(), 2.0);
        assert_eq!(lfq.bin_index(4.0), Some(0));
        assert_eq!(lfq.bin_index(5.99), Some(0));
        assert_eq!(lfq.bin_index(6.0), Some(1));
        assert_eq!(lfq.bin_index(9.99), Some(2));
        assert_eq!(lfq.bin_index(10.0), None);
        assert_eq!(lfq.bin_index(3.9), None);
        assert_eq!(lfq.bin_index(f64::NAN), None);
    }

    #[test]
    fn test_non_uniform_bins_rejected() {
        let err = LengthFrequency::new(
            vec![1.0, 2.0, 4.0],
            vec![2020.0],
            Array2::zeros((3, 1)),
        )
        .unwrap_err();
        assert!(matches!(err, ElefanError::InvalidBinSize { index: 2, .. }));
    }

    #[test]
    fn test_shape_and_order_checks() {
        assert!(matches!(
            LengthFrequency::new(vec![1.0, 2.0], vec![2020.0], Array2::zeros((3, 1))),
            Err(ElefanError::InvalidInput(_))
        ));
        assert!(matches!(
            LengthFrequency::new(vec![2.0, 1.0], vec![2020.0], Array2::zeros((2, 1))),
            Err(ElefanError::InvalidInput(_))
        ));
        assert!(matches!(
            LengthFrequency::new(vec![1.0, 2.0], vec![2021.0, 2020.0], Array2::zeros((2, 2))),
            Err(ElefanError::InvalidInput(_))
        ));
        assert!(matches!(
            LengthFrequency::new(vec![1.0, 2.0], vec![2020.0], array![[1.0], [-1.0]]),
            Err(ElefanError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_without_date() {
        let lfq = sample().without_date(0).unwrap();
        assert_eq!(lfq.dates(), &[2020.5]);
        assert_eq!(lfq.catch(), &array![[0.0], [2.0], [4.0]]);
        assert!(lfq.without_date(0).is_err());
    }

    #[test]
    fn test_decimal_year_round_trip() {
        let d = NaiveDate::from_ymd_opt(2020, 7, 1).unwrap();
        let t = date_to_decimal_year(d);
        assert_relative_eq!(t, 2020.0 + 182.0 / 366.0, epsilon = 1e-12);
        assert_eq!(decimal_year_to_date(t), Some(d));
        assert_eq!(
            date_to_decimal_year(NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()),
            2019.0
        );
    }
}
