//! Tests for the global search strategies on a synthetic sample.

use crate::test_helpers::{approx_eq, synthetic_sample, true_parameters};
use elefan_rs::error::ElefanError;
use elefan_rs::global_opt::{
    GeneticAlgorithm, GridScan, SearchControl, SearchStrategy, SimulatedAnnealing, Termination,
};
use elefan_rs::parameters::{GrowthParameters, SearchBounds};
use elefan_rs::problem::{ElefanProblem, GrowthObjective, WORST_SCORE};
use elefan_rs::restructure::{restructure, RestructureConfig};
use elefan_rs::vbgf::{evaluate, EvaluationOptions};

fn synthetic_problem() -> ElefanProblem {
    let lfq = synthetic_sample(&true_parameters());
    ElefanProblem::new(restructure(&lfq, &RestructureConfig::default()).unwrap())
}

fn scan() -> GridScan {
    GridScan::new(
        vec![40.0, 45.0, 50.0, 55.0, 60.0],
        vec![0.1, 0.2, 0.3, 0.4, 0.5],
    )
}

fn bounds() -> SearchBounds {
    SearchBounds::from_low_up([40.0, 0.1, 0.0, 0.0, 0.0], [60.0, 0.6, 1.0, 0.0, 0.0]).unwrap()
}

#[test]
fn test_grid_scan_recovers_true_growth() {
    let problem = synthetic_problem();
    let r = scan().search(&problem, &SearchControl::new()).unwrap();

    assert_eq!(r.termination, Termination::Completed);
    assert!((r.par.linf - 50.0).abs() <= 5.0 + 1e-9);
    assert!((r.par.k - 0.3).abs() <= 0.1 + 1e-9);
    assert!(r.rn_max >= 0.95);
    assert!((0.0..1.0).contains(&r.par.t_anchor));
    assert!(approx_eq(r.phi_l, r.par.phi_l(), 1e-12));
}

#[test]
fn test_grid_scan_is_deterministic() {
    let problem = synthetic_problem();
    let a = scan().search(&problem, &SearchControl::new()).unwrap();
    let b = scan().search(&problem, &SearchControl::new()).unwrap();
    assert_eq!(a.par, b.par);
    assert_eq!(a.rn_max, b.rn_max);
    assert_eq!(a.score_surface, b.score_surface);
}

#[test]
fn test_best_cell_round_trips_through_evaluator() {
    let problem = synthetic_problem();
    let r = scan().search(&problem, &SearchControl::new()).unwrap();
    let surface = r.score_surface.as_ref().unwrap();

    let row = surface.k.iter().position(|&k| k == r.par.k).unwrap();
    let col = surface.linf.iter().position(|&l| l == r.par.linf).unwrap();
    let recorded = surface.esp[[row, col]];

    let again = evaluate(problem.surface(), &r.par, &EvaluationOptions::default()).unwrap();
    assert!(approx_eq(again.esp, recorded, 1e-9));
    assert!(approx_eq(r.esp, recorded, 1e-9));
    assert_eq!(surface.score[[row, col]], r.rn_max);
}

#[test]
fn test_tiny_k_cells_score_worst_without_stalling() {
    let problem = synthetic_problem();
    let scan = GridScan::new(vec![45.0, 50.0], vec![1e-7, 0.3]);
    let start = std::time::Instant::now();
    let r = scan.search(&problem, &SearchControl::new()).unwrap();

    assert!(start.elapsed().as_secs() < 30);
    let surface = r.score_surface.as_ref().unwrap();
    assert_eq!(surface.score[[0, 0]], WORST_SCORE);
    assert_eq!(surface.score[[0, 1]], WORST_SCORE);
    assert_eq!(r.par.k, 0.3);
    assert!(r.agemax <= 100);
}

#[test]
fn test_annealing_without_time_returns_start() {
    let problem = synthetic_problem();
    let start = GrowthParameters::new(45.0, 0.25, 0.5);
    let r = SimulatedAnnealing::new(bounds())
        .with_time_budget(0.0)
        .with_initial(start)
        .search(&problem, &SearchControl::new())
        .unwrap();

    assert_eq!(r.termination, Termination::TimeBudget);
    assert_eq!(r.rn_max, problem.score(&start));
    assert_eq!(r.par, start);
}

#[test]
fn test_annealing_best_never_decreases() {
    let problem = synthetic_problem();
    let r = SimulatedAnnealing::new(bounds())
        .with_time_budget(600.0)
        .with_max_iterations(300)
        .with_seed(17)
        .search(&problem, &SearchControl::new())
        .unwrap();

    for pair in r.trace.windows(2) {
        assert!(pair[1].best >= pair[0].best);
        assert!(pair[1].best >= pair[1].mean);
    }
    assert_eq!(r.trace.last().unwrap().best, r.rn_max);
    assert!(bounds().linf.is_within_bounds(r.par.linf));
}

#[test]
fn test_genetic_best_never_decreases() {
    let problem = synthetic_problem();
    let r = GeneticAlgorithm::new(bounds())
        .with_population(20, 15)
        .with_seed(17)
        .search(&problem, &SearchControl::new())
        .unwrap();

    assert_eq!(r.trace.len(), 15);
    for pair in r.trace.windows(2) {
        assert!(pair[1].best >= pair[0].best);
    }
    assert_eq!(r.trace.last().unwrap().best, r.rn_max);
    assert_eq!(r.par.c, 0.0);
}

#[test]
fn test_inverted_bounds_fail_before_search() {
    let problem = synthetic_problem();
    let mut inverted = bounds();
    std::mem::swap(&mut inverted.linf.min, &mut inverted.linf.max);

    let err = SimulatedAnnealing::new(inverted)
        .search(&problem, &SearchControl::new())
        .unwrap_err();
    assert!(matches!(err, ElefanError::BoundsViolation(_)));

    let err = GeneticAlgorithm::new(inverted)
        .search(&problem, &SearchControl::new())
        .unwrap_err();
    assert!(matches!(err, ElefanError::BoundsViolation(_)));

    assert!(SearchBounds::from_low_up([60.0, 0.1, 0.0, 0.0, 0.0], [40.0, 1.0, 1.0, 1.0, 1.0])
        .is_err());
}
