pub mod job;
pub mod queue;
pub mod worker;

pub use self::job::{EvalJob, EvalTask, JobId, JobOutcome, JobResult, QueuedJob};
pub use self::queue::{InProcessQueue, JobQueue};
pub use self::worker::{JobExecutor, WorkerPool};

use crate::error::{EvalError, KeyForgeError, KfResult};
use crate::individual::Individual;
use crate::optimizer::Evaluator;
use crate::scorer::{
    FitnessMode, FitnessResult, FitnessScorer, FitnessWeights, Measurement, NormalizationWindow,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Cooperative cancellation shared between a caller and a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStats {
    pub jobs: u64,
    pub failures: u64,
    pub retries: u64,
    pub timeouts: u64,
    pub cache_hits: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorOptions {
    pub workers: usize,
    pub job_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            job_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(2),
        }
    }
}

struct Pending {
    job: EvalJob,
    job_id: JobId,
}

enum Resolution {
    Scored(FitnessResult),
    Measured(Measurement),
    Failed,
}

/// Turns batches of unscored individuals into scored ones through a [`JobQueue`].
///
/// `evaluate` is a hard barrier: it returns only when every individual has a
/// result, a failure (+inf) or the run was cancelled. The first batch it sees
/// calibrates the normalization window, which is then frozen for the run.
pub struct EvaluationCoordinator<Q: JobQueue = InProcessQueue> {
    runtime: Runtime,
    queue: Arc<Q>,
    scorer: Arc<FitnessScorer>,
    pool: WorkerPool,
    run_id: String,
    dataset_id: String,
    weights: FitnessWeights,
    window: Option<NormalizationWindow>,
    options: CoordinatorOptions,
    cancel: CancelToken,
    stats: EvaluationStats,
    cache_hits_at_start: u64,
}

impl EvaluationCoordinator<InProcessQueue> {
    pub fn in_process(
        scorer: Arc<FitnessScorer>,
        run_id: &str,
        dataset_id: &str,
        weights: FitnessWeights,
        options: CoordinatorOptions,
        cancel: CancelToken,
    ) -> KfResult<Self> {
        let executor: Arc<dyn JobExecutor> = scorer.clone();
        Self::new(
            Arc::new(InProcessQueue::new()),
            scorer,
            executor,
            run_id,
            dataset_id,
            weights,
            options,
            cancel,
        )
    }
}

impl<Q: JobQueue> EvaluationCoordinator<Q> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<Q>,
        scorer: Arc<FitnessScorer>,
        executor: Arc<dyn JobExecutor>,
        run_id: &str,
        dataset_id: &str,
        weights: FitnessWeights,
        options: CoordinatorOptions,
        cancel: CancelToken,
    ) -> KfResult<Self> {
        // The owned runtime can neither block_on nor drop inside another tokio context.
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(KeyForgeError::Runtime(
                "the evaluation coordinator cannot start inside a tokio runtime; \
                 run it on a dedicated std::thread"
                    .into(),
            ));
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(options.workers.clamp(1, 4))
            .thread_name("keyforge-dispatch")
            .enable_all()
            .build()?;
        let pool = WorkerPool::spawn(
            runtime.handle(),
            queue.clone(),
            executor,
            options.workers,
            options.job_timeout,
        )?;
        info!(
            "🧵 Evaluation pool ready: {} workers, {:?} job timeout",
            pool.size(),
            options.job_timeout
        );
        let cache_hits_at_start = scorer.cache().stats().hits;

        Ok(Self {
            runtime,
            queue,
            scorer,
            pool,
            run_id: run_id.to_string(),
            dataset_id: dataset_id.to_string(),
            weights,
            window: None,
            options,
            cancel,
            stats: EvaluationStats::default(),
            cache_hits_at_start,
        })
    }

    /// Resumes with a window calibrated by an earlier run.
    pub fn set_window(&mut self, window: Option<NormalizationWindow>) {
        self.window = window;
    }

    pub fn window(&self) -> Option<NormalizationWindow> {
        self.window
    }

    pub fn mode(&self) -> Option<FitnessMode> {
        self.window.map(|w| FitnessMode::new(self.weights, w))
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stats(&self) -> EvaluationStats {
        EvaluationStats {
            cache_hits: self
                .scorer
                .cache()
                .stats()
                .hits
                .saturating_sub(self.cache_hits_at_start),
            ..self.stats
        }
    }

    pub fn evaluate(&mut self, batch: Vec<Individual>) -> KfResult<Vec<Individual>> {
        if batch.is_empty() {
            return Ok(batch);
        }
        if self.cancel.is_cancelled() {
            self.queue.retire_run(&self.run_id);
            return Err(KeyForgeError::Cancelled);
        }

        let task = match self.mode() {
            Some(mode) => EvalTask::Score(mode),
            None => EvalTask::Measure,
        };

        let mut pending: HashMap<u64, Pending> = HashMap::with_capacity(batch.len());
        for ind in &batch {
            if pending.contains_key(&ind.id()) {
                continue;
            }
            let job = EvalJob::for_individual(&self.run_id, ind, &self.dataset_id, task);
            let job_id = self.queue.enqueue(job.clone());
            self.stats.jobs += 1;
            pending.insert(ind.id(), Pending { job, job_id });
        }

        let resolved = self.runtime.block_on(await_batch(
            &*self.queue,
            &self.run_id,
            &self.options,
            &self.cancel,
            &mut self.stats,
            pending,
        ))?;

        let resolved = match task {
            EvalTask::Measure => self.calibrate(&batch, resolved),
            EvalTask::Score(_) => resolved
                .into_iter()
                .map(|(id, r)| {
                    let result = match r {
                        Resolution::Scored(r) => r,
                        _ => FitnessResult::failed(),
                    };
                    (id, result)
                })
                .collect(),
        };

        Ok(batch
            .into_iter()
            .map(|ind| {
                let result = resolved
                    .get(&ind.id())
                    .copied()
                    .unwrap_or_else(FitnessResult::failed);
                ind.scored(result)
            })
            .collect())
    }

    /// Freezes the window on this batch's measurements and scores it after the barrier.
    fn calibrate(
        &mut self,
        batch: &[Individual],
        resolved: HashMap<u64, Resolution>,
    ) -> HashMap<u64, FitnessResult> {
        let measurements: Vec<Measurement> = resolved
            .values()
            .filter_map(|r| match r {
                Resolution::Measured(m) => Some(*m),
                _ => None,
            })
            .collect();

        let Some(window) = NormalizationWindow::calibrate(&measurements) else {
            warn!("⚠️  Calibration batch produced no usable measurements");
            return HashMap::new();
        };
        info!(
            "📏 Normalization window frozen: distance [{:.2}, {:.2}], time [{:.3}, {:.3}]",
            window.distance.min, window.distance.max, window.time.min, window.time.max
        );
        self.window = Some(window);
        let mode = FitnessMode::new(self.weights, window);

        let mut out = HashMap::with_capacity(resolved.len());
        for ind in batch {
            if let Some(Resolution::Measured(m)) = resolved.get(&ind.id()) {
                let result = mode.combine(*m);
                self.scorer
                    .record(ind.chromosome(), &self.dataset_id, &mode, result);
                out.insert(ind.id(), result);
            }
        }
        out
    }

    pub fn shutdown(self) {
        self.queue.close();
        self.pool.abort();
        self.runtime.shutdown_background();
    }
}

impl<Q: JobQueue> Evaluator for EvaluationCoordinator<Q> {
    fn evaluate(&mut self, batch: Vec<Individual>) -> KfResult<Vec<Individual>> {
        EvaluationCoordinator::evaluate(self, batch)
    }
}

async fn await_batch<Q: JobQueue>(
    queue: &Q,
    run_id: &str,
    options: &CoordinatorOptions,
    cancel: &CancelToken,
    stats: &mut EvaluationStats,
    mut pending: HashMap<u64, Pending>,
) -> KfResult<HashMap<u64, Resolution>> {
    let mut resolved = HashMap::with_capacity(pending.len());
    let watchdog = options.job_timeout * 2;
    let mut last_progress = Instant::now();

    while !pending.is_empty() {
        for result in queue.poll_results(run_id) {
            // Results of superseded attempts are ignored.
            let current = pending
                .get(&result.individual_id)
                .is_some_and(|p| p.job_id == result.job_id);
            if !current {
                continue;
            }
            last_progress = Instant::now();

            match result.outcome {
                JobOutcome::Scored(r) => {
                    pending.remove(&result.individual_id);
                    resolved.insert(result.individual_id, Resolution::Scored(r));
                }
                JobOutcome::Measured(m) => {
                    pending.remove(&result.individual_id);
                    resolved.insert(result.individual_id, Resolution::Measured(m));
                }
                JobOutcome::Failed(EvalError::TimedOut(_)) => {
                    on_timeout(queue, stats, result.individual_id, &mut pending, &mut resolved);
                }
                JobOutcome::Failed(e) => {
                    warn!(
                        "❌ Individual {} penalized with +inf: {}",
                        result.individual_id, e
                    );
                    stats.failures += 1;
                    pending.remove(&result.individual_id);
                    resolved.insert(result.individual_id, Resolution::Failed);
                }
            }
        }

        if pending.is_empty() {
            break;
        }

        if cancel.is_cancelled() {
            warn!("🛑 Run {} cancelled with {} jobs pending", run_id, pending.len());
            queue.retire_run(run_id);
            return Err(KeyForgeError::Cancelled);
        }

        if last_progress.elapsed() >= watchdog {
            warn!(
                "⏱️  No results for {:?}; treating {} pending jobs as unavailable",
                watchdog,
                pending.len()
            );
            let stuck: Vec<u64> = pending.keys().copied().collect();
            for id in stuck {
                on_timeout(queue, stats, id, &mut pending, &mut resolved);
            }
            last_progress = Instant::now();
        }

        tokio::time::sleep(options.poll_interval).await;
    }

    Ok(resolved)
}

/// Retry once, then give up on the individual.
fn on_timeout<Q: JobQueue>(
    queue: &Q,
    stats: &mut EvaluationStats,
    individual_id: u64,
    pending: &mut HashMap<u64, Pending>,
    resolved: &mut HashMap<u64, Resolution>,
) {
    let Some(p) = pending.get_mut(&individual_id) else {
        return;
    };
    stats.timeouts += 1;
    if p.job.attempt == 0 {
        let retry = p.job.retry();
        p.job_id = queue.enqueue(retry.clone());
        p.job = retry;
        stats.retries += 1;
        stats.jobs += 1;
        warn!("🔁 Individual {} timed out, retrying", individual_id);
    } else {
        warn!(
            "❌ Individual {} timed out twice, penalized with +inf",
            individual_id
        );
        stats.failures += 1;
        pending.remove(&individual_id);
        resolved.insert(individual_id, Resolution::Failed);
    }
}
