//! End-to-end tests of the ELEFAN pipeline.

use crate::test_helpers::{midpoints, synthetic_sample, true_parameters};
use chrono::NaiveDate;
use elefan_rs::error::ElefanError;
use elefan_rs::global_opt::CancelToken;
use elefan_rs::lfq::{date_to_decimal_year, LengthFrequency};
use elefan_rs::{fit, ElefanConfig, GridScan, SearchControl, Strategy, Termination};
use ndarray::Array2;

#[test]
fn test_fit_from_json_config_file() {
    let json = r#"{
        "restructure": { "ma": 5 },
        "evaluation": { "flagging_out": true },
        "anchor": { "method": "optimise", "grid_points": 20 },
        "strategy": {
            "method": "grid_scan",
            "linf": [45.0, 50.0, 55.0],
            "k": [0.2, 0.3, 0.4]
        }
    }"#;
    let path = std::env::temp_dir().join(format!("elefan-config-{}.json", std::process::id()));
    std::fs::write(&path, json).unwrap();
    let config = ElefanConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(config.strategy, Strategy::GridScan(_)));

    let result = fit(&synthetic_sample(&true_parameters()), &config, &SearchControl::new()).unwrap();
    assert_eq!(result.par().linf, 50.0);
    assert_eq!(result.par().k, 0.3);
    assert_eq!(result.rn_max(), 1.0);
    assert!(result.esp() <= result.asp() + 1e-9);
    assert!(result.ncohort() > 0);
    assert!(result.agemax() >= 1);
}

#[test]
fn test_curve_family_follows_best_fit() {
    let config = ElefanConfig::new(GridScan::k_scan(50.0, vec![0.2, 0.3, 0.4]));
    let result = fit(&synthetic_sample(&true_parameters()), &config, &SearchControl::new()).unwrap();

    let family = result.curve_family();
    let last = *result.surface().sample().dates().last().unwrap();
    let paths = family.trajectories(0.05, last);
    assert_eq!(paths.len(), family.ncohort());
    for path in &paths {
        assert!(path.lengths.iter().all(|&l| (0.0..50.0).contains(&l)));
    }
}

#[test]
fn test_calendar_dates_match_decimal_years() {
    let dates = [
        NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2021, 7, 2).unwrap(),
    ];
    let mut catch = Array2::zeros((midpoints().len(), 2));
    catch[[4, 0]] = 30.0;
    catch[[9, 1]] = 20.0;
    let lfq = LengthFrequency::from_calendar_dates(midpoints(), &dates, catch).unwrap();

    assert_eq!(lfq.dates()[0], 2021.0);
    assert_eq!(lfq.dates()[1], date_to_decimal_year(dates[1]));
    assert!(lfq.dates()[1] > 2021.49 && lfq.dates()[1] < 2021.51);
}

#[test]
fn test_all_zero_single_date_is_degenerate() {
    let lfq = LengthFrequency::new(midpoints(), vec![2020.5], Array2::zeros((30, 1))).unwrap();
    let config = ElefanConfig::new(GridScan::new(vec![50.0], vec![0.3]));
    let err = fit(&lfq, &config, &SearchControl::new()).unwrap_err();
    assert!(matches!(err, ElefanError::DegenerateSurface));
}

#[test]
fn test_cancelled_fit_is_not_an_error() {
    let token = CancelToken::new();
    token.cancel();
    let control = SearchControl::new().with_cancel_token(token);
    let config = ElefanConfig::new(GridScan::new(vec![45.0, 50.0], vec![0.3]));

    let result = fit(&synthetic_sample(&true_parameters()), &config, &control).unwrap();
    assert_eq!(result.result().termination, Termination::Cancelled);
    assert!(!result.result().termination.is_converged());
}

#[test]
fn test_inverted_bounds_in_config_are_rejected() {
    let json = r#"{
        "strategy": {
            "method": "simulated_annealing",
            "sa_time": 1.0,
            "bounds": {
                "linf": { "min": 60.0, "max": 40.0 },
                "k": { "min": 0.1, "max": 1.0 },
                "t_anchor": { "min": 0.0, "max": 1.0 },
                "c": { "min": 0.0, "max": 0.0 },
                "ts": { "min": 0.0, "max": 0.0 }
            }
        }
    }"#;
    let config = ElefanConfig::from_json_str(json).unwrap();
    let err = fit(&synthetic_sample(&true_parameters()), &config, &SearchControl::new()).unwrap_err();
    assert!(matches!(err, ElefanError::BoundsViolation(_)));
}
