//! # Growth Parameters
//!
//! Von Bertalanffy growth parameters ([`GrowthParameters`]) and the named
//! search box ([`SearchBounds`]) that the global search drivers explore.
//!
//! ## Example Usage
//!
//! ```rust
//! use elefan_rs::parameters::{GrowthParameters, SearchBounds};
//!
//! let par = GrowthParameters::new(50.0, 0.3, 0.2);
//! assert!((par.phi_l() - (0.3f64.log10() + 2.0 * 50f64.log10())).abs() < 1e-12);
//!
//! let bounds = SearchBounds::from_low_up(
//!     [40.0, 0.1, 0.0, 0.0, 0.0],
//!     [60.0, 1.0, 1.0, 1.0, 1.0],
//! ).unwrap();
//! assert!(bounds.validate().is_ok());
//! ```

pub mod bounds;
pub mod growth;

// Re-export key types
pub use bounds::{Bounds, BoundsError, SearchBounds, PARAMETER_NAMES};
pub use growth::{seasonal_vbgf, GrowthParameters, MAX_AGEMAX};
