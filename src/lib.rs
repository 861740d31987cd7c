//! # elefan-rs
//!
//! `elefan-rs` estimates von Bertalanffy growth parameters of fish
//! populations from length-frequency data with the ELEFAN method
//! (ELectronic LEngth Frequency ANalysis).
//!
//! The library provides:
//! - A validated length-frequency container with date conversion helpers
//! - Restructuring of raw counts into peak/trough scores (ASP, peak clusters)
//! - Scoring of seasonal VBGF cohort families (ESP, `Rn`)
//! - Anchor-time search (golden section, or forcing the curve through a bin)
//! - Grid scan, simulated annealing and genetic algorithm search strategies
//! - Leave-one-date-out jackknife of the estimates
//!
//! ## Basic Usage
//!
//! ```
//! use elefan_rs::{fit, ElefanConfig, GridScan, LengthFrequency, SearchControl};
//! use ndarray::array;
//!
//! let lfq = LengthFrequency::new(
//!     vec![1.0, 3.0, 5.0, 7.0, 9.0, 11.0],
//!     vec![2020.3, 2020.8],
//!     array![[0.0, 0.0], [50.0, 0.0], [0.0, 0.0], [0.0, 40.0], [0.0, 0.0], [0.0, 0.0]],
//! )
//! .unwrap();
//!
//! let config = ElefanConfig::new(GridScan::new(vec![15.0, 20.0], vec![0.5, 1.0]));
//! let result = fit(&lfq, &config, &SearchControl::new()).unwrap();
//! assert!(result.rn_max() <= 1.0);
//! ```

// Public modules
pub mod error;

// Growth parameters and search bounds
pub mod parameters;

// Data and scoring
pub mod lfq;
pub mod restructure;
pub mod vbgf;
pub mod anchor;
pub mod problem;

// Search
pub mod global_opt;
pub mod elefan;

// Resampling
pub mod uncertainty;

// Re-exports for convenience
pub use error::{ElefanError, Result};

pub use anchor::{AnchorFit, AnchorPolicy, GrowthShape};
pub use elefan::{fit, ElefanConfig, ElefanFit, Strategy};
pub use global_opt::{
    CancelToken, GeneticAlgorithm, GridScan, SearchControl, SearchResult, SearchStrategy,
    SimulatedAnnealing, Termination,
};
pub use lfq::LengthFrequency;
pub use parameters::{Bounds, GrowthParameters, SearchBounds};
pub use problem::{ElefanProblem, GrowthObjective};
pub use restructure::{restructure, RestructureConfig, RestructuredSurface};
pub use vbgf::{evaluate, CurveFit, EvaluationOptions};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
