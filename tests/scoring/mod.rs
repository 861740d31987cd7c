//! Tests for curve scoring and anchor search on restructured data.

use crate::test_helpers::{approx_eq, synthetic_sample, true_parameters};
use elefan_rs::anchor::{best_anchor, AnchorPolicy, GrowthShape};
use elefan_rs::error::ElefanError;
use elefan_rs::parameters::{seasonal_vbgf, GrowthParameters};
use elefan_rs::restructure::{restructure, RestructureConfig, RestructuredSurface};
use elefan_rs::vbgf::{evaluate, score_from_esp, EvaluationOptions};

fn synthetic_surface() -> RestructuredSurface {
    restructure(&synthetic_sample(&true_parameters()), &RestructureConfig::default()).unwrap()
}

#[test]
fn test_true_curve_explains_every_peak() {
    let surface = synthetic_surface();
    let fit = evaluate(&surface, &true_parameters(), &EvaluationOptions::default()).unwrap();
    assert!(approx_eq(fit.esp, surface.asp(), 1e-9));
    assert_eq!(fit.score, 1.0);
}

#[test]
fn test_flagging_out_never_exceeds_asp() {
    let surface = synthetic_surface();
    for &(linf, k, t) in &[(50.0, 0.3, 0.2), (40.0, 0.5, 0.7), (58.0, 0.2, 0.0), (45.0, 0.35, 0.15)] {
        let p = GrowthParameters::new(linf, k, t);
        let flagged = evaluate(&surface, &p, &EvaluationOptions::default()).unwrap();
        let unflagged =
            evaluate(&surface, &p, &EvaluationOptions::new().with_flagging_out(false)).unwrap();
        assert!(flagged.esp <= surface.asp() + 1e-9);
        assert!(flagged.score <= 1.0);
        assert!(unflagged.esp >= flagged.esp - 1e-12);
    }
}

#[test]
fn test_score_is_monotone_in_esp() {
    let asp = 7.5;
    let mut previous = 0.0;
    for i in 0..=100 {
        let score = score_from_esp(asp * i as f64 / 100.0, asp).unwrap();
        assert!(score >= previous);
        previous = score;
    }
    assert_eq!(score_from_esp(asp, asp).unwrap(), 1.0);
    assert_eq!(score_from_esp(0.0, asp).unwrap(), 0.1);
    assert!(matches!(
        score_from_esp(1.0, 0.0),
        Err(ElefanError::DegenerateSurface)
    ));
}

#[test]
fn test_zero_amplitude_ignores_summer_point() {
    let surface = synthetic_surface();
    let a = GrowthParameters::seasonal(48.0, 0.32, 0.3, 0.0, 0.1);
    let b = GrowthParameters::seasonal(48.0, 0.32, 0.3, 0.0, 0.9);
    for t in [2020.1, 2020.6, 2021.3] {
        assert_eq!(seasonal_vbgf(&a, t, 2019.3), seasonal_vbgf(&b, t, 2019.3));
    }
    let fa = evaluate(&surface, &a, &EvaluationOptions::default()).unwrap();
    let fb = evaluate(&surface, &b, &EvaluationOptions::default()).unwrap();
    assert_eq!(fa, fb);
}

#[test]
fn test_curve_outside_length_range_scores_minimum() {
    let surface = synthetic_surface();
    // every cohort stays in the first length class, which holds no peak
    let tiny = GrowthParameters::new(0.5, 0.3, 0.2);
    let fit = evaluate(&surface, &tiny, &EvaluationOptions::default()).unwrap();
    assert_eq!(fit.esp, 0.0);
    assert_eq!(fit.score, 0.1);
}

#[test]
fn test_fixed_agemax_is_respected() {
    let surface = synthetic_surface();
    let fit = evaluate(
        &surface,
        &true_parameters(),
        &EvaluationOptions::new().with_agemax(3),
    )
    .unwrap();
    assert_eq!(fit.agemax, 3);
    // cohorts older than three years are no longer followed
    assert!(fit.esp < surface.asp());
}

#[test]
fn test_anchor_always_in_unit_interval() {
    let surface = synthetic_surface();
    let options = EvaluationOptions::default();
    let policies = [
        AnchorPolicy::default(),
        AnchorPolicy::CrossMax,
        AnchorPolicy::Cross {
            date_index: 5,
            length: 21.0,
        },
    ];
    for policy in &policies {
        for &(linf, k) in &[(40.0, 0.2), (50.0, 0.3), (60.0, 0.5), (55.0, 1.2)] {
            let a = best_anchor(&surface, &GrowthShape::new(linf, k), &options, policy).unwrap();
            assert!((0.0..1.0).contains(&a.t_anchor), "{:?} gave {}", policy, a.t_anchor);
            assert!(a.fit.score >= 0.1 && a.fit.score <= 1.0);
        }
    }
}

#[test]
fn test_optimised_anchor_recovers_truth() {
    let surface = synthetic_surface();
    let a = best_anchor(
        &surface,
        &GrowthShape::new(50.0, 0.3),
        &EvaluationOptions::default(),
        &AnchorPolicy::default(),
    )
    .unwrap();
    assert_eq!(a.fit.score, 1.0);
    assert!(a.converged);
}
