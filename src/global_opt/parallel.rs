//! Parallel candidate evaluation.
//!
//! Candidates are independent, read-only evaluations of the same objective,
//! so populations and grid cells are scored with Rayon. Results always come
//! back in input order.

use rayon::prelude::*;

use crate::anchor::{AnchorFit, GrowthShape};
use crate::error::Result;
use crate::parameters::SearchBounds;
use crate::problem::GrowthObjective;

use super::score_point;

/// Score every encoded point of a population in parallel.
///
/// Failed evaluations score [`WORST_SCORE`](crate::problem::WORST_SCORE)
/// instead of aborting the population.
pub fn evaluate_population_parallel<O: GrowthObjective>(
    objective: &O,
    bounds: &SearchBounds,
    population: &[Vec<f64>],
) -> Vec<f64> {
    population
        .par_iter()
        .map(|point| score_point(objective, bounds, point))
        .collect()
}

/// Choose the anchor for every shape in parallel.
///
/// `skip` is consulted once before each shape; skipped shapes yield `None`.
pub fn fit_shapes_parallel<O, S>(
    objective: &O,
    shapes: &[GrowthShape],
    skip: S,
) -> Vec<Option<Result<AnchorFit>>>
where
    O: GrowthObjective,
    S: Fn() -> bool + Sync,
{
    shapes
        .par_iter()
        .map(|shape| {
            if skip() {
                None
            } else {
                Some(objective.fit_shape(shape))
            }
        })
        .collect()
}
