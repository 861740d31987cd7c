//! Real-valued genetic algorithm over `(Linf, K, t_anchor, C, ts)`.
//!
//! Each generation is scored in parallel, then bred with linear-rank
//! selection, local arithmetic crossover and uniform single-gene mutation.
//! The best individuals of a generation survive unchanged into the next one
//! (elitism), so the best score can only grow from one generation to the
//! next.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ElefanError, Result};
use crate::global_opt::progress::Progress;
use crate::global_opt::{
    clip_to_bounds, create_population, encode, evaluate_population_parallel, SearchControl,
    SearchResult, SearchStrategy, Termination, TraceEntry,
};
use crate::parameters::{Bounds, GrowthParameters, SearchBounds};
use crate::problem::GrowthObjective;

/// Selection pressure of linear-rank selection (best gets `SP / n`).
const SELECTION_PRESSURE: f64 = 1.5;

fn default_pop_size() -> usize {
    50
}

fn default_max_iter() -> usize {
    100
}

fn default_pcrossover() -> f64 {
    0.8
}

fn default_pmutation() -> f64 {
    0.1
}

/// Genetic algorithm search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticAlgorithm {
    /// Search bounds (`low_par` / `up_par`)
    pub bounds: SearchBounds,

    /// Individuals per generation
    #[serde(default = "default_pop_size")]
    pub pop_size: usize,

    /// Number of generations, the initial one included
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// Stop after this many generations without improvement (default: never)
    #[serde(default)]
    pub run: Option<usize>,

    /// Probability that a selected pair is recombined
    #[serde(default = "default_pcrossover")]
    pub pcrossover: f64,

    /// Probability that an individual has one gene redrawn
    #[serde(default = "default_pmutation")]
    pub pmutation: f64,

    /// Survivors per generation (default: 5% of the population, at least 1)
    #[serde(default)]
    pub elitism: Option<usize>,

    /// Individual placed in the first population
    #[serde(default)]
    pub initial: Option<GrowthParameters>,

    #[serde(default)]
    pub seed: Option<u64>,
}

impl GeneticAlgorithm {
    /// Create a new genetic algorithm with default tuning.
    pub fn new(bounds: SearchBounds) -> Self {
        Self {
            bounds,
            pop_size: default_pop_size(),
            max_iter: default_max_iter(),
            run: None,
            pcrossover: default_pcrossover(),
            pmutation: default_pmutation(),
            elitism: None,
            initial: None,
            seed: None,
        }
    }

    /// Set population size and generation count.
    ///
    /// # Arguments
    ///
    /// * `pop_size` - Individuals per generation
    /// * `max_iter` - Number of generations
    pub fn with_population(mut self, pop_size: usize, max_iter: usize) -> Self {
        self.pop_size = pop_size;
        self.max_iter = max_iter;
        self
    }

    pub fn with_run(mut self, run: usize) -> Self {
        self.run = Some(run);
        self
    }

    pub fn with_rates(mut self, pcrossover: f64, pmutation: f64) -> Self {
        self.pcrossover = pcrossover;
        self.pmutation = pmutation;
        self
    }

    pub fn with_elitism(mut self, elitism: usize) -> Self {
        self.elitism = Some(elitism);
        self
    }

    pub fn with_initial(mut self, initial: GrowthParameters) -> Self {
        self.initial = Some(initial);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of survivors per generation.
    pub fn elite_count(&self) -> usize {
        self.elitism.unwrap_or_else(|| {
            ((self.pop_size as f64 * 0.05).round() as usize).max(1)
        })
    }

    fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        if self.pop_size < 2 {
            return Err(ElefanError::InvalidParameter(format!(
                "population size must be at least 2, got {}",
                self.pop_size
            )));
        }
        if self.max_iter == 0 {
            return Err(ElefanError::InvalidParameter(
                "maxiter must be at least 1".to_string(),
            ));
        }
        for (name, p) in [("pcrossover", self.pcrossover), ("pmutation", self.pmutation)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ElefanError::InvalidParameter(format!(
                    "{} must lie in [0, 1], got {}",
                    name, p
                )));
            }
        }
        if self.elite_count() >= self.pop_size {
            return Err(ElefanError::InvalidParameter(format!(
                "elitism {} leaves no room for offspring in a population of {}",
                self.elite_count(),
                self.pop_size
            )));
        }
        Ok(())
    }

    /// Linear-rank selection with replacement.
    fn select(
        &self,
        population: &[Vec<f64>],
        fitness: &[f64],
        rng: &mut impl Rng,
    ) -> Result<Vec<Vec<f64>>> {
        let n = population.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));

        // rank 1 is the worst individual
        let mut weights = vec![0.0; n];
        for (rank, &i) in order.iter().enumerate() {
            weights[i] = (2.0 - SELECTION_PRESSURE) / n as f64
                + 2.0 * rank as f64 * (SELECTION_PRESSURE - 1.0) / (n * (n - 1)) as f64;
        }
        let dist = WeightedIndex::new(&weights).map_err(|e| {
            ElefanError::FunctionEvaluation(format!("selection weights: {}", e))
        })?;
        Ok((0..n).map(|_| population[dist.sample(rng)].clone()).collect())
    }

    /// Local arithmetic crossover of consecutive pairs.
    fn crossover(&self, offspring: &mut [Vec<f64>], rng: &mut impl Rng) {
        for pair in offspring.chunks_exact_mut(2) {
            if rng.gen::<f64>() >= self.pcrossover {
                continue;
            }
            let (left, right) = pair.split_at_mut(1);
            for (x, y) in left[0].iter_mut().zip(right[0].iter_mut()) {
                let a: f64 = rng.gen();
                let (p1, p2) = (*x, *y);
                *x = a * p1 + (1.0 - a) * p2;
                *y = a * p2 + (1.0 - a) * p1;
            }
        }
    }

    /// Redraw one free gene uniformly within its bounds.
    fn mutate(&self, offspring: &mut [Vec<f64>], bounds: &[Bounds], rng: &mut impl Rng) {
        let free: Vec<usize> = (0..bounds.len())
            .filter(|&j| !bounds[j].is_fixed())
            .collect();
        if free.is_empty() {
            return;
        }
        for individual in offspring.iter_mut() {
            if rng.gen::<f64>() < self.pmutation {
                let j = free[rng.gen_range(0..free.len())];
                individual[j] = rng.gen_range(bounds[j].min..=bounds[j].max);
            }
        }
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

impl SearchStrategy for GeneticAlgorithm {
    fn name(&self) -> &'static str {
        "genetic algorithm"
    }

    fn search<O: GrowthObjective>(
        &self,
        objective: &O,
        control: &SearchControl,
    ) -> Result<SearchResult> {
        self.validate()?;

        let bounds = self.bounds.to_vec();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let elites = self.elite_count();

        let mut population = create_population(&bounds, self.pop_size, &mut rng);
        if let Some(initial) = &self.initial {
            population[0] = clip_to_bounds(&encode(initial), &bounds);
        }
        let mut fitness = evaluate_population_parallel(objective, &self.bounds, &population);
        let mut evaluations = population.len();

        let mut best = population[0].clone();
        let mut best_score = f64::NEG_INFINITY;
        let mut stalled = 0;
        let mut trace = Vec::with_capacity(self.max_iter);
        let progress = Progress::new(self.max_iter as u64, control.progress, "genetic algorithm");

        let mut generation = 0;
        let termination = loop {
            let i = argmax(&fitness);
            if fitness[i] > best_score {
                best = population[i].clone();
                best_score = fitness[i];
                stalled = 0;
                debug!(generation, score = best_score, "genetic algorithm improved");
            } else {
                stalled += 1;
            }
            let mean = fitness.iter().sum::<f64>() / fitness.len() as f64;
            trace.push(TraceEntry {
                iteration: generation,
                mean,
                best: best_score,
            });
            progress.inc();
            generation += 1;

            if generation >= self.max_iter {
                break Termination::IterationLimit;
            }
            if self.run.map_or(false, |run| stalled >= run) {
                break Termination::Stalled;
            }
            if control.is_cancelled() {
                break Termination::Cancelled;
            }

            let mut order: Vec<usize> = (0..population.len()).collect();
            order.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));
            let survivors: Vec<(Vec<f64>, f64)> = order[..elites]
                .iter()
                .map(|&i| (population[i].clone(), fitness[i]))
                .collect();

            let mut offspring = self.select(&population, &fitness, &mut rng)?;
            self.crossover(&mut offspring, &mut rng);
            self.mutate(&mut offspring, &bounds, &mut rng);
            let offspring: Vec<Vec<f64>> = offspring
                .iter()
                .map(|x| clip_to_bounds(x, &bounds))
                .collect();

            let mut offspring_fitness =
                evaluate_population_parallel(objective, &self.bounds, &offspring);
            evaluations += offspring.len();

            // survivors replace the weakest offspring
            let mut population_next = offspring;
            let mut weakest: Vec<usize> = (0..population_next.len()).collect();
            weakest.sort_by(|&a, &b| offspring_fitness[a].total_cmp(&offspring_fitness[b]));
            for (&slot, (point, score)) in weakest.iter().zip(survivors) {
                population_next[slot] = point;
                offspring_fitness[slot] = score;
            }

            population = population_next;
            fitness = offspring_fitness;
        };
        progress.finish();

        let result = SearchResult::from_best(
            objective,
            self.bounds.decode(&best),
            best_score,
            trace,
            generation,
            evaluations,
            termination,
        );
        info!(
            generations = generation,
            rn_max = result.rn_max,
            linf = result.par.linf,
            k = result.par.k,
            termination = termination.description(),
            "genetic algorithm finished"
        );
        Ok(result)
    }
}
