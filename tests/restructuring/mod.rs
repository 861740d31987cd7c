//! Tests for the restructuring of length-frequency counts.

use crate::test_helpers::{random_sample, synthetic_sample, true_parameters};
use elefan_rs::error::ElefanError;
use elefan_rs::lfq::LengthFrequency;
use elefan_rs::restructure::{restructure, Connectivity, RestructureConfig};
use ndarray::{array, Array2};

#[test]
fn test_asp_bounds_every_score() {
    for seed in 0..10 {
        let lfq = random_sample(seed, 40, 6);
        for config in [
            RestructureConfig::default(),
            RestructureConfig::new().with_ma(7).with_addl_sqrt(true),
            RestructureConfig::new().with_connectivity(Connectivity::Grid),
        ] {
            let surface = match restructure(&lfq, &config) {
                Ok(s) => s,
                Err(ElefanError::DegenerateSurface) => continue,
                Err(e) => panic!("unexpected error {}", e),
            };
            let max = surface.rcounts().iter().cloned().fold(f64::MIN, f64::max);
            assert!(surface.asp() >= 0.0);
            assert!(surface.asp() >= max - 1e-12, "seed {}", seed);
            assert!(surface.rcounts().iter().all(|v| v.is_finite()));
        }
    }
}

#[test]
fn test_peak_labels_cover_positive_cells() {
    let surface = restructure(&random_sample(3, 30, 4), &RestructureConfig::default()).unwrap();
    for ((i, j), &v) in surface.rcounts().indexed_iter() {
        let label = surface.peaks_mat()[[i, j]];
        if v > 0.0 {
            assert!(label >= 1 && label <= surface.n_peaks());
            assert!(surface.peak_max(label).unwrap() >= v);
        } else {
            assert_eq!(label, 0);
        }
    }
}

#[test]
fn test_spikes_become_separate_peaks() {
    let lfq = synthetic_sample(&true_parameters());
    let surface = restructure(&lfq, &RestructureConfig::default()).unwrap();
    let spikes = lfq.catch().iter().filter(|&&c| c > 0.0).count();
    assert_eq!(surface.n_peaks(), spikes);
    assert!(surface.require_complete().is_ok());
}

#[test]
fn test_single_empty_date_is_degenerate() {
    let lfq = LengthFrequency::new(vec![1.0, 3.0, 5.0, 7.0], vec![2020.5], Array2::zeros((4, 1)))
        .unwrap();
    let err = restructure(&lfq, &RestructureConfig::default()).unwrap_err();
    assert!(matches!(err, ElefanError::DegenerateSurface));
}

#[test]
fn test_empty_date_among_others_is_skipped() {
    let lfq = LengthFrequency::new(
        vec![1.0, 3.0, 5.0, 7.0, 9.0],
        vec![2020.2, 2020.5],
        array![[0.0, 0.0], [10.0, 0.0], [0.0, 0.0], [3.0, 0.0], [0.0, 0.0]],
    )
    .unwrap();
    let surface = restructure(&lfq, &RestructureConfig::default()).unwrap();
    assert_eq!(surface.degenerate_columns(), &[1]);
    assert!(surface.rcounts().column(1).iter().all(|&v| v == 0.0));
    assert!(matches!(
        surface.require_complete(),
        Err(ElefanError::DegenerateColumn { column: 1 })
    ));
}

#[test]
fn test_non_uniform_bins_are_rejected() {
    let err = LengthFrequency::new(
        vec![1.0, 3.0, 6.0],
        vec![2020.0],
        array![[1.0], [2.0], [3.0]],
    )
    .unwrap_err();
    assert!(matches!(err, ElefanError::InvalidBinSize { .. }));
}

#[test]
fn test_even_window_is_rejected() {
    let err = restructure(&random_sample(1, 10, 2), &RestructureConfig::new().with_ma(4)).unwrap_err();
    assert!(matches!(err, ElefanError::InvalidInput(_)));
}
