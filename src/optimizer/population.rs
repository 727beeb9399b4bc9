use super::crossover::breed;
use super::mutation::{mutate, MutationParams};
use super::selection::{elitism, select_parents};
use super::Evaluator;
use crate::config::Config;
use crate::error::KfResult;
use crate::individual::{IdAllocator, Individual, Lineage};
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Operator settings for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneticParams {
    pub tournament_size: usize,
    pub crossover_bias: f64,
    pub offspring_per_crossover: usize,
    pub mutation: MutationParams,
}

impl GeneticParams {
    pub fn from_config(config: &Config, mutation: MutationParams) -> Self {
        Self {
            tournament_size: config.search.tournament_size,
            crossover_bias: config.search.crossover_bias,
            offspring_per_crossover: config.search.offspring_per_crossover.max(1),
            mutation,
        }
    }
}

/// Consecutive generations without a strictly better best-known fitness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stagnation {
    #[serde(with = "crate::util::non_finite_as_null")]
    pub best: f64,
    pub counter: usize,
    pub limit: usize,
}

impl Stagnation {
    pub fn new(limit: usize) -> Self {
        Self {
            best: f64::INFINITY,
            counter: 0,
            limit,
        }
    }

    /// Seeds the best-known fitness without counting a generation.
    pub fn observe_initial(&mut self, best: f64) {
        if best < self.best {
            self.best = best;
        }
    }

    /// Returns true if the generation improved on the best known.
    pub fn update(&mut self, best: f64) -> bool {
        if best < self.best {
            self.best = best;
            self.counter = 0;
            true
        } else {
            self.counter += 1;
            false
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.counter >= self.limit
    }
}

/// The current generation, kept sorted by fitness after every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub generation: usize,
    individuals: Vec<Individual>,
}

impl Population {
    pub fn new(generation: usize, mut individuals: Vec<Individual>) -> Self {
        individuals.sort_by(|a, b| a.cmp_fitness(b));
        Self {
            generation,
            individuals,
        }
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn into_individuals(self) -> Vec<Individual> {
        self.individuals
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn best(&self) -> Option<&Individual> {
        self.individuals.first()
    }

    pub fn best_fitness(&self) -> f64 {
        self.best().map_or(f64::INFINITY, |b| b.rank_key())
    }

    pub fn max_id(&self) -> Option<u64> {
        self.individuals.iter().map(|i| i.id()).max()
    }

    /// Applies a phase boundary. Shrinking truncates; growing returns unscored
    /// mutated clones of the best individuals that the caller must evaluate and
    /// hand back through [`Population::absorb`].
    pub fn resize(
        &mut self,
        target: usize,
        params: &GeneticParams,
        ids: &mut IdAllocator,
        rng: &mut Rng,
    ) -> Vec<Individual> {
        let current = self.individuals.len();
        if target < current {
            info!("📉 Population shrinks {} → {}", current, target);
            self.individuals.truncate(target);
            return Vec::new();
        }
        if target == current || current == 0 {
            return Vec::new();
        }

        info!("📈 Population grows {} → {}", current, target);
        (0..target - current)
            .map(|i| {
                let source = &self.individuals[i % current];
                Individual::new(
                    ids.next_id(),
                    mutate(source.chromosome(), &params.mutation, rng),
                    self.generation,
                    vec![source.id()],
                    source.lineage(),
                )
            })
            .collect()
    }

    /// Adds already-scored individuals and re-sorts.
    pub fn absorb(&mut self, scored: Vec<Individual>) {
        self.individuals.extend(scored);
        self.individuals.sort_by(|a, b| a.cmp_fitness(b));
    }

    /// Tournament-selected parents, `k` offspring per pair, each mutated.
    pub fn offspring(
        &self,
        count: usize,
        generation: usize,
        params: &GeneticParams,
        ids: &mut IdAllocator,
        rng: &mut Rng,
    ) -> Vec<Individual> {
        if self.individuals.is_empty() || count == 0 {
            return Vec::new();
        }
        let k = params.offspring_per_crossover;
        let pairs = count.div_ceil(k);
        let pool = select_parents(&self.individuals, pairs * 2, params.tournament_size, rng);

        let mut children = Vec::with_capacity(pairs * k);
        for pair in pool.chunks(2) {
            let (a, b) = match pair {
                [a, b] => (*a, *b),
                [a] => (*a, *a),
                _ => continue,
            };
            for chromosome in breed(a, b, k, params.crossover_bias, rng) {
                children.push(Individual::new(
                    ids.next_id(),
                    mutate(&chromosome, &params.mutation, rng),
                    generation,
                    vec![a.id(), b.id()],
                    Lineage::inherit(a.lineage(), b.lineage()),
                ));
            }
        }
        children.truncate(count);
        children
    }

    /// Runs one generation: phase resize, breeding, evaluation, elitist survival.
    ///
    /// Returns every individual evaluated during the step.
    pub fn step<E: Evaluator + ?Sized>(
        &mut self,
        generation: usize,
        target: usize,
        params: &GeneticParams,
        evaluator: &mut E,
        ids: &mut IdAllocator,
        rng: &mut Rng,
    ) -> KfResult<Vec<Individual>> {
        self.generation = generation;
        let mut evaluated = Vec::new();

        let grown = self.resize(target, params, ids, rng);
        if !grown.is_empty() {
            let grown = evaluator.evaluate(grown)?;
            evaluated.extend(grown.iter().cloned());
            self.absorb(grown);
        }

        let children = self.offspring(target, generation, params, ids, rng);
        let children = evaluator.evaluate(children)?;
        evaluated.extend(children.iter().cloned());
        debug!(
            "generation {}: {} offspring evaluated",
            generation,
            children.len()
        );

        let parents = std::mem::take(&mut self.individuals);
        self.individuals = elitism(parents, children, target);
        Ok(evaluated)
    }
}
