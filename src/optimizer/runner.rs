use super::initialization::initial_population;
use super::mutation::MutationParams;
use super::phases::{Phase, PhaseSchedule};
use super::population::{GeneticParams, Population, Stagnation};
use crate::chromosome::{CharacterSet, LayerBounds};
use crate::config::Config;
use crate::dispatch::{
    CancelToken, CoordinatorOptions, EvaluationCoordinator, EvaluationStats, InProcessQueue,
    JobQueue,
};
use crate::error::{KeyForgeError, KfResult};
use crate::individual::{IdAllocator, Individual};
use crate::layouts::all_layouts;
use crate::scorer::{FitnessScorer, FitnessWeights};
use crate::state::{RunState, RunStatus};
use crate::util::{hash_parts, unix_timestamp};
use fastrand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Snapshot handed to a [`ProgressCallback`] after every generation.
#[derive(Debug, Clone)]
pub struct GenerationReport<'a> {
    pub generation: usize,
    pub population: &'a [Individual],
    pub best_fitness: f64,
    pub stagnant_generations: usize,
    pub stats: EvaluationStats,
}

/// A trait for receiving updates during a run.
/// Boolean return value indicates if the search should continue (true) or stop (false).
pub trait ProgressCallback: Send + Sync {
    fn on_generation(&self, report: &GenerationReport<'_>) -> bool;
}

/// Callback that only logs.
pub struct LogProgress;

impl ProgressCallback for LogProgress {
    fn on_generation(&self, _report: &GenerationReport<'_>) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: RunStatus,
    pub best: Option<Individual>,
    pub stats: EvaluationStats,
    pub state: RunState,
}

impl RunResult {
    fn from_state(state: RunState) -> Self {
        Self {
            status: state.status,
            best: state.best().cloned(),
            stats: state.stats,
            state,
        }
    }
}

/// Drives generations through an [`EvaluationCoordinator`] and snapshots state.
pub struct RunController<Q: JobQueue = InProcessQueue> {
    config: Config,
    charset: CharacterSet,
    bounds: LayerBounds,
    genetic: GeneticParams,
    coordinator: EvaluationCoordinator<Q>,
    dataset_id: String,
    state_path: Option<PathBuf>,
}

pub fn new_run_id(config: &Config, dataset_id: &str) -> String {
    let config_json = serde_json::to_string(config).unwrap_or_default();
    let nonce = format!("{}-{}", unix_timestamp(), fastrand::u64(..));
    hash_parts(&[&config_json, dataset_id, &nonce])[..16].to_string()
}

impl RunController<InProcessQueue> {
    /// Validates the configuration and starts an in-process evaluation pool.
    pub fn new(
        config: Config,
        scorer: Arc<FitnessScorer>,
        dataset_id: &str,
        cancel: CancelToken,
    ) -> KfResult<Self> {
        if scorer.datasets().get(dataset_id).is_none() {
            return Err(KeyForgeError::Config(format!(
                "dataset '{}' is not registered",
                dataset_id
            )));
        }
        let run_id = new_run_id(&config, dataset_id);
        let options = CoordinatorOptions {
            workers: config.search.workers,
            job_timeout: config.search.job_timeout(),
            ..Default::default()
        };
        let coordinator = EvaluationCoordinator::in_process(
            scorer.clone(),
            &run_id,
            dataset_id,
            FitnessWeights::from(&config.fitness),
            options,
            cancel,
        )?;
        Self::with_coordinator(config, &scorer, dataset_id, coordinator)
    }
}

impl<Q: JobQueue> RunController<Q> {
    pub fn with_coordinator(
        config: Config,
        scorer: &FitnessScorer,
        dataset_id: &str,
        coordinator: EvaluationCoordinator<Q>,
    ) -> KfResult<Self> {
        config.validate(scorer.geometry())?;
        let charset = config.search.charset()?;
        let bounds = config.layer_bounds(scorer.geometry())?;
        let mutation = MutationParams {
            probability: config.search.mutation_probability,
            layer_change_probability: config.search.layer_change_probability,
            bounds,
        };
        let genetic = GeneticParams::from_config(&config, mutation);

        Ok(Self {
            config,
            charset,
            bounds,
            genetic,
            coordinator,
            dataset_id: dataset_id.to_string(),
            state_path: None,
        })
    }

    /// Snapshot the run state to `path` at every generation boundary.
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = Some(path.into());
        self
    }

    pub fn run_id(&self) -> &str {
        self.coordinator.run_id()
    }

    fn rng(&self, offset: usize) -> Rng {
        match self.config.search.seed {
            Some(seed) => Rng::with_seed(seed.wrapping_add(offset as u64)),
            None => Rng::new(),
        }
    }

    /// Fresh run: seed, evaluate generation 0, then every configured phase.
    pub fn run<CB: ProgressCallback>(mut self, callback: &CB) -> KfResult<RunResult> {
        let schedule = PhaseSchedule::new(self.config.search.phases()?);
        info!(
            "🚀 Run {}: {} generations, avg population {:.1}",
            self.run_id(),
            schedule.total_iterations(),
            schedule.average_population()
        );

        let mut ids = IdAllocator::new();
        let mut rng = self.rng(0);
        let seeds = if self.config.search.skip_heuristics {
            Vec::new()
        } else {
            all_layouts()
        };
        let initial = initial_population(
            &self.charset,
            self.config.search.num_layers,
            schedule.initial_population(),
            &seeds,
            &mut ids,
            &mut rng,
        );

        let scored = self.coordinator.evaluate(initial)?;
        let population = Population::new(0, scored.clone());
        let mut stagnation = Stagnation::new(self.config.search.stagnant_limit);
        stagnation.observe_initial(population.best_fitness());
        info!(
            "🌱 Generation 0 evaluated: best {:.5}",
            population.best_fitness()
        );

        let state = RunState {
            run_id: self.run_id().to_string(),
            parent_run: None,
            config: self.config.clone(),
            dataset_id: self.dataset_id.clone(),
            generation: 0,
            ids,
            window: self.coordinator.window(),
            stagnation,
            status: RunStatus::Running,
            stats: self.coordinator.stats(),
            population: population.individuals().to_vec(),
            history: scored,
        };
        self.persist(&state);

        self.drive(state, population, &schedule, rng, callback)
    }

    /// Continues `prior` for `extra_generations` more generations at the final
    /// population size of the current configuration.
    pub fn resume<CB: ProgressCallback>(
        mut self,
        prior: RunState,
        extra_generations: usize,
        callback: &CB,
    ) -> KfResult<RunResult> {
        self.check_compatible(&prior)?;

        let start = prior.generation;
        let size = self
            .config
            .search
            .phases()?
            .last()
            .map_or(self.config.search.population_size, |p| p.max_population);
        let schedule = PhaseSchedule::new(vec![Phase::new(extra_generations, size)]);
        info!(
            "⏩ Continuing run {} from generation {} for {} generations",
            prior.run_id, start, extra_generations
        );

        self.coordinator.set_window(prior.window);
        let rng = self.rng(start + 1);
        let ids = IdAllocator::resume_after(prior.max_id());

        let (scored, unscored): (Vec<_>, Vec<_>) =
            prior.population.into_iter().partition(|i| i.is_scored());
        let mut history = prior.history;
        let mut individuals = scored;
        if !unscored.is_empty() {
            let rescored = self.coordinator.evaluate(unscored)?;
            history.extend(rescored.iter().cloned());
            individuals.extend(rescored);
        }
        let population = Population::new(start, individuals);

        let mut stagnation = Stagnation::new(self.config.search.stagnant_limit);
        stagnation.observe_initial(prior.stagnation.best.min(population.best_fitness()));

        let state = RunState {
            run_id: self.run_id().to_string(),
            parent_run: Some(prior.run_id),
            config: self.config.clone(),
            dataset_id: self.dataset_id.clone(),
            generation: start,
            ids,
            window: self.coordinator.window(),
            stagnation,
            status: RunStatus::Running,
            stats: self.coordinator.stats(),
            population: population.individuals().to_vec(),
            history,
        };

        self.drive(state, population, &schedule, rng, callback)
    }

    fn check_compatible(&self, prior: &RunState) -> KfResult<()> {
        if prior.population.is_empty() {
            return Err(KeyForgeError::ContinuationMismatch(
                "prior run has an empty population".into(),
            ));
        }
        if prior.dataset_id != self.dataset_id {
            return Err(KeyForgeError::ContinuationMismatch(format!(
                "prior run used dataset {}, this one {}",
                prior.dataset_id, self.dataset_id
            )));
        }
        // Stored fitness is only comparable under the scoring that produced it.
        if prior.config.fitness != self.config.fitness {
            return Err(KeyForgeError::ContinuationMismatch(format!(
                "fitness weights changed from {:?} to {:?}",
                prior.config.fitness, self.config.fitness
            )));
        }
        if prior.config.simulation != self.config.simulation {
            return Err(KeyForgeError::ContinuationMismatch(
                "simulation parameters differ from the prior run".into(),
            ));
        }
        for ind in &prior.population {
            ind.chromosome()
                .validate(&self.charset, self.bounds)
                .map_err(|e| {
                    KeyForgeError::ContinuationMismatch(format!(
                        "individual {}: {}",
                        ind.id(),
                        e
                    ))
                })?;
        }
        Ok(())
    }

    fn drive<CB: ProgressCallback>(
        mut self,
        mut state: RunState,
        mut population: Population,
        schedule: &PhaseSchedule,
        mut rng: Rng,
        callback: &CB,
    ) -> KfResult<RunResult> {
        let offset = state.generation;
        let started = Instant::now();
        let mut status = RunStatus::Completed;

        for step in 1..=schedule.total_iterations() {
            let Some(target) = schedule.population_for(step) else {
                break;
            };
            let generation = offset + step;

            let evaluated = match population.step(
                generation,
                target,
                &self.genetic,
                &mut self.coordinator,
                &mut state.ids,
                &mut rng,
            ) {
                Ok(evaluated) => evaluated,
                Err(KeyForgeError::Cancelled) => {
                    warn!(
                        "🛑 Run {} cancelled during generation {}; keeping generation {}",
                        state.run_id, generation, state.generation
                    );
                    status = RunStatus::Cancelled;
                    break;
                }
                Err(e) => return Err(e),
            };

            state.history.extend(evaluated);
            let best = population.best_fitness();
            let improved = state.stagnation.update(best);
            state.generation = generation;
            state.population = population.individuals().to_vec();
            state.stats = self.coordinator.stats();
            self.persist(&state);

            info!(
                "🧬 Gen {:>4} | pop {:>4} | best {:.5}{} | stagnant {}/{}",
                generation,
                population.len(),
                best,
                if improved { " ⭐" } else { "" },
                state.stagnation.counter,
                state.stagnation.limit
            );

            let report = GenerationReport {
                generation,
                population: population.individuals(),
                best_fitness: best,
                stagnant_generations: state.stagnation.counter,
                stats: state.stats,
            };
            if !callback.on_generation(&report) {
                info!("⏹️  Stopped by progress callback");
                status = RunStatus::Cancelled;
                break;
            }
            if state.stagnation.is_exhausted() {
                info!(
                    "💤 No improvement for {} generations, stopping",
                    state.stagnation.limit
                );
                status = RunStatus::Stagnated;
                break;
            }
        }

        state.status = status;
        state.stats = self.coordinator.stats();
        self.persist(&state);

        let stats = state.stats;
        info!(
            "🏁 Run {} {} after {:.1}s: {} jobs, {} failures, {} retries, {} cache hits",
            state.run_id,
            status,
            started.elapsed().as_secs_f32(),
            stats.jobs,
            stats.failures,
            stats.retries,
            stats.cache_hits
        );
        self.coordinator.shutdown();
        Ok(RunResult::from_state(state))
    }

    fn persist(&self, state: &RunState) {
        if let Some(path) = &self.state_path {
            if let Err(e) = state.save(path) {
                error!("❌ Failed to save run state to {}: {}", path.display(), e);
            }
        }
    }
}
