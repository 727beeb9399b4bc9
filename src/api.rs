use crate::chromosome::Chromosome;
use crate::config::Config;
use crate::corpus::{Dataset, DatasetRegistry};
use crate::dispatch::CancelToken;
use crate::error::{EvalError, KeyForgeError, KfResult};
use crate::geometry::KeyboardGeometry;
use crate::optimizer::runner::LogProgress;
use crate::optimizer::{ProgressCallback, RunController, RunResult};
use crate::scorer::{
    FitnessCache, FitnessMode, FitnessResult, FitnessScorer, FitnessWeights, NormalizationWindow,
};
use crate::state::RunState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Where a run keeps its artifacts and how it can be stopped.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run state snapshot, rewritten every generation.
    pub state_path: Option<PathBuf>,
    /// Fitness cache loaded before and saved after the run.
    pub cache_path: Option<PathBuf>,
    pub cancel: CancelToken,
}

/// Parameters of a continuation.
#[derive(Debug, Clone, Default)]
pub struct ContinueOptions {
    pub generations: usize,
    /// Replaces the prior run's configuration. Fitness weights and simulation
    /// parameters must match the prior run.
    pub config: Option<Config>,
}

fn build_scorer(
    config: &Config,
    geometry: KeyboardGeometry,
    dataset: Dataset,
    cache_path: Option<&PathBuf>,
) -> KfResult<Arc<FitnessScorer>> {
    let scorer = FitnessScorer::new(
        geometry,
        &config.simulation,
        DatasetRegistry::with(dataset),
    )?;

    let scorer = match cache_path.filter(|p| p.exists()) {
        Some(path) => match FitnessCache::load(path) {
            Ok(cache) => {
                info!("♻️  Loaded {} cached fitness values", cache.len());
                scorer.with_cache(Arc::new(cache))
            }
            Err(e) => {
                warn!("⚠️  Ignoring unreadable cache {}: {}", path.display(), e);
                scorer
            }
        },
        None => scorer,
    };
    Ok(Arc::new(scorer))
}

fn save_cache(scorer: &FitnessScorer, options: &RunOptions) {
    if let Some(path) = &options.cache_path {
        if let Err(e) = scorer.cache().save(path) {
            warn!("⚠️  Could not save fitness cache: {}", e);
        }
    }
}

/// Runs a fresh optimization to completion.
///
/// Blocking: the evaluation pool drives its own tokio runtime, so calling this
/// from any thread with a tokio context (including `spawn_blocking`) returns
/// [`KeyForgeError::Runtime`]. Async callers should run it on a dedicated
/// `std::thread` and await the join.
pub fn run(
    config: Config,
    geometry: KeyboardGeometry,
    dataset: Dataset,
    options: RunOptions,
) -> KfResult<RunResult> {
    run_with_progress(config, geometry, dataset, options, &LogProgress)
}

pub fn run_with_progress<CB: ProgressCallback>(
    config: Config,
    geometry: KeyboardGeometry,
    dataset: Dataset,
    options: RunOptions,
    callback: &CB,
) -> KfResult<RunResult> {
    config.validate(&geometry)?;
    let dataset_id = dataset.id.clone();
    let scorer = build_scorer(&config, geometry, dataset, options.cache_path.as_ref())?;

    let mut controller =
        RunController::new(config, scorer.clone(), &dataset_id, options.cancel.clone())?;
    if let Some(path) = &options.state_path {
        controller = controller.persist_to(path);
    }

    let result = controller.run(callback);
    save_cache(&scorer, &options);
    result
}

/// Continues a persisted run. Generation numbering and ids pick up where it stopped.
pub fn continue_run(
    prior: RunState,
    extra: ContinueOptions,
    geometry: KeyboardGeometry,
    dataset: Dataset,
    options: RunOptions,
) -> KfResult<RunResult> {
    continue_run_with_progress(prior, extra, geometry, dataset, options, &LogProgress)
}

pub fn continue_run_with_progress<CB: ProgressCallback>(
    prior: RunState,
    extra: ContinueOptions,
    geometry: KeyboardGeometry,
    dataset: Dataset,
    options: RunOptions,
    callback: &CB,
) -> KfResult<RunResult> {
    let config = extra.config.unwrap_or_else(|| prior.config.clone());
    if let Err(e) = config.validate(&geometry) {
        return Err(match e {
            KeyForgeError::Config(msg) => KeyForgeError::ContinuationMismatch(msg),
            other => other,
        });
    }
    let dataset_id = dataset.id.clone();
    let scorer = build_scorer(&config, geometry, dataset, options.cache_path.as_ref())?;

    let mut controller =
        RunController::new(config, scorer.clone(), &dataset_id, options.cancel.clone())?;
    if let Some(path) = &options.state_path {
        controller = controller.persist_to(path);
    }

    let result = controller.resume(prior, extra.generations, callback);
    save_cache(&scorer, &options);
    result
}

/// Scores one chromosome outside any run.
///
/// Without a window the unit window is used, so fitness is the weighted sum of
/// raw distance and time.
pub fn score_layout(
    chromosome: &Chromosome,
    geometry: KeyboardGeometry,
    dataset: Dataset,
    config: &Config,
    window: Option<NormalizationWindow>,
) -> KfResult<FitnessResult> {
    let dataset_id = dataset.id.clone();
    let scorer = FitnessScorer::new(
        geometry,
        &config.simulation,
        DatasetRegistry::with(dataset),
    )?;
    let mode = FitnessMode::new(
        FitnessWeights::from(&config.fitness),
        window.unwrap_or_else(NormalizationWindow::unit),
    );
    scorer
        .score(chromosome, &dataset_id, &mode)
        .map_err(|e| match e {
            EvalError::InvalidChromosome(msg) => KeyForgeError::InvalidChromosome(msg),
            other => KeyForgeError::Runtime(other.to_string()),
        })
}
