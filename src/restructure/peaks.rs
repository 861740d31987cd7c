//! Peak clustering on the restructured surface.
//!
//! A peak is a connected group of cells with a positive restructured score.
//! Labels are positive integers; `0` marks cells that belong to no peak.
//! Labels are assigned in column-major scan order (date by date, small to
//! large lengths), so the numbering is stable for a given surface.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::Range;

/// Neighbourhood used when grouping positive cells into peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Adjacent length classes within one sampling date.
    #[default]
    Column,

    /// 4-neighbourhood: adjacent length classes, and the same length class on
    /// adjacent sampling dates.
    Grid,
}

/// Contiguous runs of strictly positive values.
pub fn positive_runs(values: &[f64]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, v) in values.iter().enumerate() {
        match (start, *v > 0.0) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..values.len());
    }
    runs
}

/// Zero out peaks whose positive mass is below `min_fraction` of the
/// strongest peak in the same column. Returns the number of peaks removed.
pub fn suppress_minor_peaks(column: &mut [f64], min_fraction: f64) -> usize {
    let runs = positive_runs(column);
    let masses: Vec<f64> = runs
        .iter()
        .map(|r| column[r.clone()].iter().sum())
        .collect();
    let strongest = masses.iter().cloned().fold(0.0, f64::max);
    let threshold = min_fraction * strongest;

    let mut removed = 0;
    for (run, mass) in runs.into_iter().zip(masses) {
        if mass < threshold {
            column[run].iter_mut().for_each(|v| *v = 0.0);
            removed += 1;
        }
    }
    removed
}

/// Label positive cells of `scores` (rows = length classes, columns = dates).
///
/// Returns the label matrix and the number of peaks found.
pub fn label_peaks(scores: &Array2<f64>, connectivity: Connectivity) -> (Array2<usize>, usize) {
    let (n_len, n_dates) = scores.dim();
    let mut labels = Array2::<usize>::zeros((n_len, n_dates));
    let mut next = 0;

    for j in 0..n_dates {
        for i in 0..n_len {
            if scores[[i, j]] <= 0.0 || labels[[i, j]] != 0 {
                continue;
            }
            next += 1;
            labels[[i, j]] = next;

            let mut queue = VecDeque::from([(i, j)]);
            while let Some((r, c)) = queue.pop_front() {
                let mut neighbours = Vec::with_capacity(4);
                if r > 0 {
                    neighbours.push((r - 1, c));
                }
                if r + 1 < n_len {
                    neighbours.push((r + 1, c));
                }
                if connectivity == Connectivity::Grid {
                    if c > 0 {
                        neighbours.push((r, c - 1));
                    }
                    if c + 1 < n_dates {
                        neighbours.push((r, c + 1));
                    }
                }
                for (nr, nc) in neighbours {
                    if scores[[nr, nc]] > 0.0 && labels[[nr, nc]] == 0 {
                        labels[[nr, nc]] = next;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }
    }

    (labels, next)
}

/// Largest score inside each peak; entry `id - 1` belongs to label `id`.
pub fn peak_maxima(scores: &Array2<f64>, labels: &Array2<usize>, n_peaks: usize) -> Vec<f64> {
    let mut maxima = vec![0.0_f64; n_peaks];
    for (score, &label) in scores.iter().zip(labels.iter()) {
        if label > 0 {
            let slot = &mut maxima[label - 1];
            *slot = slot.max(*score);
        }
    }
    maxima
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_positive_runs() {
        let runs = positive_runs(&[0.5, 0.2, -1.0, 0.0, 0.3, -0.2, 0.1]);
        assert_eq!(runs, vec![0..2, 4..5, 6..7]);
        assert!(positive_runs(&[-1.0, 0.0]).is_empty());
    }

    #[test]
    fn test_suppress_minor_peaks() {
        let mut col = vec![1.0, 2.0, -1.0, 0.1, -0.5, 0.5];
        let removed = suppress_minor_peaks(&mut col, 0.1);
        assert_eq!(removed, 1);
        assert_eq!(col, vec![1.0, 2.0, -1.0, 0.0, -0.5, 0.5]);
    }

    #[test]
    fn test_column_labelling() {
        let scores = array![[1.0, 0.5], [0.2, -1.0], [-1.0, 0.3], [0.4, 0.3]];
        let (labels, n) = label_peaks(&scores, Connectivity::Column);
        assert_eq!(n, 4);
        assert_eq!(labels, array![[1, 3], [1, 0], [0, 4], [2, 4]]);
        assert_eq!(peak_maxima(&scores, &labels, n), vec![1.0, 0.4, 0.5, 0.3]);
    }

    #[test]
    fn test_grid_labelling_joins_dates() {
        let scores = array![[1.0, 0.5], [0.2, -1.0], [-1.0, 0.3], [0.4, 0.3]];
        let (labels, n) = label_peaks(&scores, Connectivity::Grid);
        assert_eq!(n, 2);
        assert_eq!(labels, array![[1, 1], [1, 0], [0, 2], [2, 2]]);
        assert_eq!(peak_maxima(&scores, &labels, n), vec![1.0, 0.4]);
    }
}
