//! Tests for the leave-one-date-out jackknife.

use crate::test_helpers::{synthetic_sample, true_parameters};
use elefan_rs::elefan::ElefanConfig;
use elefan_rs::global_opt::{CancelToken, GridScan, SearchControl, Termination};
use std::thread;
use std::time::Duration;
use elefan_rs::uncertainty::{jackknife, JackknifeConfig};

#[test]
fn test_jackknife_on_noise_free_sample() {
    let lfq = synthetic_sample(&true_parameters());
    let config = JackknifeConfig::new(ElefanConfig::new(GridScan::new(
        vec![45.0, 50.0, 55.0],
        vec![0.2, 0.3, 0.4],
    )));
    let r = jackknife(&lfq, &config, &SearchControl::new()).unwrap();

    assert_eq!(r.runs.len(), lfq.n_dates());
    assert_eq!(r.successful(), lfq.n_dates());

    // dropping one month never moves the best cell of a noise-free sample
    let linf = r.parameter("Linf").unwrap();
    let k = r.parameter("K").unwrap();
    assert_eq!(linf.mean, 50.0);
    assert_eq!(linf.std_error, 0.0);
    assert!((k.mean - 0.3).abs() < 1e-12);
    assert!(k.lower <= k.upper);
}

#[test]
fn test_wider_quantile_gives_wider_interval() {
    let lfq = synthetic_sample(&true_parameters());
    let base = ElefanConfig::new(GridScan::new(vec![40.0, 50.0], vec![0.3, 0.5]));
    let narrow = jackknife(&lfq, &JackknifeConfig::new(base.clone()).with_z(1.0), &SearchControl::new())
        .unwrap();
    let wide = jackknife(&lfq, &JackknifeConfig::new(base).with_z(3.0), &SearchControl::new())
        .unwrap();

    for (n, w) in narrow.summary.iter().zip(&wide.summary) {
        assert_eq!(n.name, w.name);
        assert_eq!(n.mean, w.mean);
        assert!(w.upper - w.lower >= n.upper - n.lower);
    }
}

#[test]
fn test_fits_interrupted_by_cancel_are_not_counted() {
    let lfq = synthetic_sample(&true_parameters());
    let config = JackknifeConfig::new(ElefanConfig::new(GridScan::from_ranges(
        (30.0, 70.0, 60),
        (0.1, 1.0, 60),
    )));
    let token = CancelToken::new();
    let control = SearchControl::new().with_cancel_token(token.clone());

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        token.cancel();
    });
    let r = jackknife(&lfq, &config, &control).unwrap();
    canceller.join().unwrap();

    assert!(r.cancelled);
    assert_eq!(r.runs.len(), lfq.n_dates());
    assert!(r.successful() < lfq.n_dates());
    for run in &r.runs {
        if let Some(outcome) = &run.outcome {
            assert_ne!(outcome.termination, Termination::Cancelled);
        }
    }
    if r.successful() < 2 {
        assert!(r.summary.is_empty());
    }
}
